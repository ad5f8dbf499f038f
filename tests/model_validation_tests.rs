use pos_portal::{
    AppError,
    models::{
        CreateCustomerRequest, CreateDriverRequest, CreateProductRequest, CreateUserRequest,
        DeliveryStatus, FinalizeSaleRequest, LoginRequest, SaleLineRequest, UpdateCategoryRequest,
        UpdateDeliveryRequest, UpdateDriverRequest, UpdateProductRequest, UpdateSupplierRequest,
        UpdateUserRequest,
    },
    permissions::Role,
};

fn is_validation<T: std::fmt::Debug>(result: Result<T, AppError>) -> bool {
    matches!(result, Err(AppError::Validation(_)))
}

#[test]
fn test_login_request_requires_both_fields() {
    let missing: LoginRequest = serde_json::from_str(r#"{"username":"a"}"#).unwrap();
    assert!(is_validation(missing.validate()));

    let complete = LoginRequest {
        username: "a".into(),
        password: "b".into(),
    };
    assert!(complete.validate().is_ok());
}

#[test]
fn test_create_user_role_must_be_known() {
    let mut req = CreateUserRequest {
        username: "newbie".into(),
        password: "hunter22".into(),
        full_name: "New Bie".into(),
        role: "STOCK_MANAGER".into(),
    };
    assert_eq!(req.validate().unwrap(), Role::StockManager);

    req.role = "stock_manager".into();
    let err = req.validate().unwrap_err();
    assert!(err.to_string().contains("Allowed: ADMIN, MANAGER, CASHIER"));

    req.role = "CASHIER".into();
    req.password = "short".into();
    assert!(is_validation(req.validate()));
}

#[test]
fn test_create_product_rejects_negative_amounts() {
    let base = CreateProductRequest {
        name: "Tea".into(),
        category_id: 1,
        price: 100,
        cost_price: 50,
        stock_quantity: 3,
        ..CreateProductRequest::default()
    };
    assert!(base.validate().is_ok());

    let negative_price = CreateProductRequest { price: -1, ..base.clone() };
    assert!(is_validation(negative_price.validate()));

    let no_category = CreateProductRequest { category_id: 0, ..base.clone() };
    assert!(is_validation(no_category.validate()));

    let negative_stock = CreateProductRequest { stock_quantity: -2, ..base };
    assert!(is_validation(negative_stock.validate()));
}

#[test]
fn test_update_product_cannot_be_empty() {
    assert!(is_validation(UpdateProductRequest::default().validate()));

    let partial: UpdateProductRequest = serde_json::from_str(r#"{"stockQuantity": 12}"#).unwrap();
    assert!(partial.validate().is_ok());
    assert_eq!(partial.stock_quantity, Some(12));
}

#[test]
fn test_customer_contact_formats() {
    let ok = CreateCustomerRequest {
        name: "Dana".into(),
        email: Some("dana@example.com".into()),
        phone: Some("+44 20 7946 0958".into()),
        address: Some("221B Baker Street".into()),
    };
    assert!(ok.validate().is_ok());

    let bad_email = CreateCustomerRequest { email: Some("dana.example.com".into()), ..ok.clone() };
    assert!(is_validation(bad_email.validate()));

    let bad_phone = CreateCustomerRequest { phone: Some("123".into()), ..ok.clone() };
    assert!(is_validation(bad_phone.validate()));

    let short_address = CreateCustomerRequest { address: Some("Flat 1".into()), ..ok };
    assert!(is_validation(short_address.validate()));
}

#[test]
fn test_walk_in_detection_ignores_case_and_padding() {
    for name in ["walk-in", "Walk-In", "  WALK-IN "] {
        let req = CreateCustomerRequest { name: name.into(), ..CreateCustomerRequest::default() };
        assert!(req.is_walk_in(), "{name}");
    }
    let req = CreateCustomerRequest { name: "Walker".into(), ..CreateCustomerRequest::default() };
    assert!(!req.is_walk_in());
}

#[test]
fn test_sale_line_subtotal_defaults_to_price_times_quantity() {
    let line = SaleLineRequest {
        product_id: 1,
        quantity: 3,
        unit_price: 199,
        ..SaleLineRequest::default()
    };
    assert_eq!(line.subtotal().unwrap(), 597);

    let explicit = SaleLineRequest { subtotal: Some(500), ..line };
    assert_eq!(explicit.subtotal().unwrap(), 500);
}

#[test]
fn test_sale_amounts_out_of_range_are_rejected() {
    let huge = SaleLineRequest {
        product_id: 2,
        quantity: 2,
        unit_price: i64::MAX,
        ..SaleLineRequest::default()
    };
    assert!(is_validation(huge.subtotal()));

    let req = FinalizeSaleRequest {
        payment_method: "cash".into(),
        items: vec![
            SaleLineRequest { product_id: 1, quantity: 1, unit_price: 100, ..SaleLineRequest::default() },
            huge.clone(),
        ],
        ..FinalizeSaleRequest::default()
    };
    assert!(is_validation(req.validate()));

    let discounted = FinalizeSaleRequest {
        items: vec![SaleLineRequest {
            product_id: 3,
            quantity: 3,
            unit_price: 10,
            discount: i64::MAX / 2,
            ..SaleLineRequest::default()
        }],
        ..req
    };
    assert!(is_validation(discounted.discount_amount()));
    assert!(is_validation(discounted.validate()));
}

#[test]
fn test_finalize_sale_request_from_camel_case_json() {
    let req: FinalizeSaleRequest = serde_json::from_str(
        r#"{
            "customerId": 4,
            "paymentMethod": "cash",
            "taxAmount": 15,
            "totalAmount": 315,
            "items": [{ "productId": 9, "quantity": 2, "unitPrice": 150, "discount": 5 }]
        }"#,
    )
    .unwrap();

    assert!(req.validate().is_ok());
    assert_eq!(req.customer_id, Some(4));
    assert_eq!(req.discount_amount().unwrap(), 10);

    let no_payment = FinalizeSaleRequest { payment_method: " ".into(), ..req };
    assert!(is_validation(no_payment.validate()));
}

#[test]
fn test_driver_phone_must_be_digits() {
    let ok = CreateDriverRequest { name: "Sam".into(), phone: "5550100".into() };
    assert!(ok.validate().is_ok());

    let dashed = CreateDriverRequest { name: "Sam".into(), phone: "555-0100".into() };
    assert!(is_validation(dashed.validate()));
}

#[test]
fn test_delivery_status_whitelist() {
    let update: UpdateDeliveryRequest = serde_json::from_str(r#"{"status":"delivered"}"#).unwrap();
    assert_eq!(update.status, Some(DeliveryStatus::Delivered));

    assert!(serde_json::from_str::<UpdateDeliveryRequest>(r#"{"status":"lost"}"#).is_err());
    assert!(serde_json::from_str::<UpdateDeliveryRequest>(r#"{"status":"Delivered"}"#).is_err());
}

#[test]
fn test_partial_updates_reject_empty_bodies_and_bad_status() {
    assert!(is_validation(UpdateCategoryRequest::default().validate()));
    assert!(is_validation(UpdateSupplierRequest::default().validate()));
    assert!(is_validation(UpdateDriverRequest::default().validate()));
    assert!(is_validation(UpdateUserRequest::default().validate()));

    let archived = UpdateCategoryRequest { status: Some("ARCHIVED".into()), ..UpdateCategoryRequest::default() };
    assert!(is_validation(archived.validate()));
    let inactive = UpdateCategoryRequest { status: Some("INACTIVE".into()), ..UpdateCategoryRequest::default() };
    assert!(inactive.validate().is_ok());
}

#[test]
fn test_update_user_parses_optional_role() {
    let no_role = UpdateUserRequest { full_name: Some("Jo Doe".into()), ..UpdateUserRequest::default() };
    assert_eq!(no_role.validate().unwrap(), None);

    let role = UpdateUserRequest { role: Some("STOCK_MANAGER".into()), ..UpdateUserRequest::default() };
    assert_eq!(role.validate().unwrap(), Some(Role::StockManager));

    let short_password = UpdateUserRequest { password: Some("abc".into()), ..UpdateUserRequest::default() };
    assert!(is_validation(short_password.validate()));
}

#[test]
fn test_update_driver_phone_must_be_digits() {
    let dashed = UpdateDriverRequest { phone: Some("555-0100".into()), ..UpdateDriverRequest::default() };
    assert!(is_validation(dashed.validate()));
    let blank_name = UpdateDriverRequest { name: Some("  ".into()), ..UpdateDriverRequest::default() };
    assert!(is_validation(blank_name.validate()));
    let ok = UpdateDriverRequest { phone: Some("5550100".into()), ..UpdateDriverRequest::default() };
    assert!(ok.validate().is_ok());
}
