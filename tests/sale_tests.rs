use pos_portal::{
    AppError, MemoryRepository,
    models::{
        CreateCategoryRequest, CreateCustomerRequest, CreateProductRequest, FinalizeSaleRequest,
        Product, SaleLineRequest,
    },
    repository::Repository,
};
use std::sync::Arc;

// --- TEST UTILITIES ---

async fn seed_product(repo: &MemoryRepository, name: &str, stock: i32) -> Product {
    let category_id = match repo.list_categories().await.unwrap().first() {
        Some(category) => category.id,
        None => {
            repo.create_category(CreateCategoryRequest { name: "General".to_string() })
                .await
                .unwrap()
                .id
        }
    };

    repo.create_product(CreateProductRequest {
        name: name.to_string(),
        category_id,
        price: 250,
        cost_price: 100,
        stock_quantity: stock,
        ..CreateProductRequest::default()
    })
    .await
    .unwrap()
}

fn line(product_id: i32, quantity: i32) -> SaleLineRequest {
    SaleLineRequest {
        product_id,
        quantity,
        unit_price: 250,
        ..SaleLineRequest::default()
    }
}

fn sale(customer_id: Option<i32>, items: Vec<SaleLineRequest>) -> FinalizeSaleRequest {
    let total_amount = items.iter().map(|l| l.subtotal().unwrap()).sum();
    FinalizeSaleRequest {
        customer_id,
        payment_method: "cash".to_string(),
        tax_amount: 0,
        total_amount,
        items,
    }
}

async fn stock_of(repo: &MemoryRepository, id: i32) -> i32 {
    repo.get_product(id).await.unwrap().unwrap().stock_quantity
}

// --- TESTS ---

#[tokio::test]
async fn test_finalize_sale_decrements_stock_and_records_items() {
    let repo = MemoryRepository::new();
    let widget = seed_product(&repo, "Widget", 5).await;

    let recorded = repo
        .finalize_sale(9, sale(None, vec![line(widget.id, 3)]))
        .await
        .unwrap();

    assert_eq!(recorded.user_id, 9);
    assert_eq!(recorded.items.len(), 1);
    assert_eq!(recorded.items[0].quantity, 3);
    assert_eq!(recorded.items[0].subtotal, 750);
    assert_eq!(recorded.total_amount, 750);
    assert_eq!(stock_of(&repo, widget.id).await, 2);
}

#[tokio::test]
async fn test_insufficient_stock_aborts_without_side_effects() {
    let repo = MemoryRepository::new();
    let widget = seed_product(&repo, "Widget", 3).await;
    let gadget = seed_product(&repo, "Gadget", 10).await;

    let err = repo
        .finalize_sale(1, sale(None, vec![line(gadget.id, 1), line(widget.id, 5)]))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InsufficientStock { .. }));
    assert_eq!(
        err.to_string(),
        "Not enough stock for product Widget. Available: 3, Requested: 5"
    );

    // Nothing was written: stock, sales and customers are untouched.
    assert_eq!(stock_of(&repo, widget.id).await, 3);
    assert_eq!(stock_of(&repo, gadget.id).await, 10);
    assert!(repo.list_sales().await.unwrap().is_empty());
    assert!(repo.list_customers().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_duplicate_lines_are_checked_against_combined_quantity() {
    let repo = MemoryRepository::new();
    let widget = seed_product(&repo, "Widget", 3).await;

    let err = repo
        .finalize_sale(1, sale(None, vec![line(widget.id, 2), line(widget.id, 2)]))
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Not enough stock for product Widget. Available: 3, Requested: 4"
    );
    assert_eq!(stock_of(&repo, widget.id).await, 3);
}

#[tokio::test]
async fn test_out_of_range_amounts_leave_store_usable() {
    let repo = MemoryRepository::new();
    let widget = seed_product(&repo, "Widget", 5).await;
    let gadget = seed_product(&repo, "Gadget", 5).await;

    let huge = SaleLineRequest { unit_price: i64::MAX, ..line(gadget.id, 2) };
    let req = FinalizeSaleRequest {
        customer_id: None,
        payment_method: "cash".to_string(),
        tax_amount: 0,
        total_amount: 0,
        items: vec![line(widget.id, 1), huge],
    };

    let err = repo.finalize_sale(1, req).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // No stock moved and the store still answers.
    assert_eq!(stock_of(&repo, widget.id).await, 5);
    assert_eq!(stock_of(&repo, gadget.id).await, 5);
    assert!(repo.list_sales().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_and_deleted_products_cannot_be_sold() {
    let repo = MemoryRepository::new();
    let widget = seed_product(&repo, "Widget", 3).await;

    let err = repo.finalize_sale(1, sale(None, vec![line(999, 1)])).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    repo.delete_product(widget.id).await.unwrap();
    let err = repo
        .finalize_sale(1, sale(None, vec![line(widget.id, 1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_sale_without_customer_creates_numbered_walk_in() {
    let repo = MemoryRepository::new();
    let widget = seed_product(&repo, "Widget", 10).await;

    let first = repo.finalize_sale(1, sale(None, vec![line(widget.id, 1)])).await.unwrap();
    // An unknown customer id falls back to a walk-in too.
    let second = repo
        .finalize_sale(1, sale(Some(4242), vec![line(widget.id, 1)]))
        .await
        .unwrap();

    let first_customer = repo.get_customer(first.customer_id).await.unwrap().unwrap();
    let second_customer = repo.get_customer(second.customer_id).await.unwrap().unwrap();
    assert_eq!(first_customer.name, "Walk-in #1");
    assert_eq!(second_customer.name, "Walk-in #2");
}

#[tokio::test]
async fn test_sale_with_known_customer_updates_purchase_total() {
    let repo = MemoryRepository::new();
    let widget = seed_product(&repo, "Widget", 10).await;
    let customer = repo
        .create_customer(CreateCustomerRequest {
            name: "Dana Smith".to_string(),
            ..CreateCustomerRequest::default()
        })
        .await
        .unwrap();

    repo.finalize_sale(1, sale(Some(customer.id), vec![line(widget.id, 2)])).await.unwrap();
    repo.finalize_sale(1, sale(Some(customer.id), vec![line(widget.id, 1)])).await.unwrap();

    let summaries = repo.list_customers().await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].customer.id, customer.id);
    assert_eq!(summaries[0].total_purchases, 750);
}

#[tokio::test]
async fn test_discount_amount_is_per_unit_times_quantity() {
    let repo = MemoryRepository::new();
    let widget = seed_product(&repo, "Widget", 10).await;

    let mut discounted = line(widget.id, 4);
    discounted.discount = 25;
    discounted.subtotal = Some(900);

    let recorded = repo.finalize_sale(1, sale(None, vec![discounted])).await.unwrap();
    assert_eq!(recorded.discount_amount, 100);
    assert_eq!(recorded.items[0].subtotal, 900);
}

#[tokio::test]
async fn test_concurrent_sales_never_oversell() {
    let repo = Arc::new(MemoryRepository::new());
    let widget_id = seed_product(&repo, "Widget", 5).await.id;

    let handles: Vec<_> = (0..12)
        .map(|_| {
            let repo = Arc::clone(&repo);
            tokio::spawn(async move { repo.finalize_sale(1, sale(None, vec![line(widget_id, 1)])).await })
        })
        .collect();

    let mut succeeded = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            succeeded += 1;
        }
    }

    assert_eq!(succeeded, 5);
    assert_eq!(stock_of(&repo, widget_id).await, 0);
    assert_eq!(repo.list_sales().await.unwrap().len(), 5);
}

#[tokio::test]
async fn test_list_sales_newest_first() {
    let repo = MemoryRepository::new();
    let widget = seed_product(&repo, "Widget", 10).await;

    let first = repo.finalize_sale(1, sale(None, vec![line(widget.id, 1)])).await.unwrap();
    let second = repo.finalize_sale(1, sale(None, vec![line(widget.id, 1)])).await.unwrap();

    let ids: Vec<i32> = repo.list_sales().await.unwrap().iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
}
