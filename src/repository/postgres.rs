use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;

use super::{Repository, product_not_found, walk_in_name};
use crate::{
    error::{AppError, AppResult},
    models::{
        Category, CreateCategoryRequest, CreateCustomerRequest, CreateDeliveryRequest,
        CreateDriverRequest, CreateProductRequest, CreateSupplierRequest, Customer,
        CustomerHistory, CustomerSummary, Delivery, DeliveryStatus, Driver, FinalizeSaleRequest,
        NewUser, Product, STATUS_INACTIVE, Sale, SaleHistoryEntry, SaleItem, SaleLineRequest,
        Supplier, SupplierDetail, UpdateCategoryRequest, UpdateCustomerRequest,
        UpdateDeliveryRequest, UpdateDriverRequest, UpdateProductRequest, UpdateSupplierRequest,
        User, UserChanges, UserRecord, WALK_IN_PREFIX,
    },
};

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
/// Schema lives in `migrations/`.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn driver_exists(&self, driver_id: i32) -> AppResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM drivers WHERE id = $1 AND is_deleted = false)",
        )
        .bind(driver_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn check_product_refs(&self, category_id: Option<i32>, supplier_id: Option<i32>) -> AppResult<()> {
        if let Some(category_id) = category_id {
            let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
                .bind(category_id)
                .fetch_one(&self.pool)
                .await?;
            if !exists {
                return Err(AppError::Validation(
                    "Category not found. Please create a category first.".into(),
                ));
            }
        }
        if let Some(supplier_id) = supplier_id {
            let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM suppliers WHERE id = $1)")
                .bind(supplier_id)
                .fetch_one(&self.pool)
                .await?;
            if !exists {
                return Err(AppError::Validation(
                    "Supplier not found. Please create a supplier first.".into(),
                ));
            }
        }
        Ok(())
    }

    // Fills `items` on every sale with one query.
    async fn load_items(&self, sales: &mut [Sale]) -> AppResult<()> {
        let ids: Vec<i32> = sales.iter().map(|s| s.id).collect();
        let items = sqlx::query_as::<_, SaleItem>(
            r#"SELECT id, sale_id, product_id, quantity, unit_price, discount, subtotal
               FROM sale_items
               WHERE sale_id = ANY($1)
               ORDER BY id"#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_sale: HashMap<i32, Vec<SaleItem>> = HashMap::new();
        for item in items {
            by_sale.entry(item.sale_id).or_default().push(item);
        }
        for sale in sales.iter_mut() {
            sale.items = by_sale.remove(&sale.id).unwrap_or_default();
        }
        Ok(())
    }
}

/// Translates constraint violations into client errors. Constraint names are the
/// ones declared in `migrations/0001_init.sql`; anything else stays a database error.
fn constraint_error(err: sqlx::Error) -> AppError {
    let sqlx::Error::Database(db_err) = &err else {
        return AppError::Database(err);
    };

    if db_err.is_unique_violation() {
        return match db_err.constraint() {
            Some("users_username_key") => AppError::Conflict("username already in use".into()),
            Some("categories_name_key") => AppError::Conflict("Category already exists".into()),
            Some("suppliers_name_key") => AppError::Conflict("Supplier already exists".into()),
            Some("products_name_key" | "products_barcode_key") => {
                AppError::Conflict("Product already exists".into())
            }
            Some("customers_email_key") => {
                AppError::Conflict("Customer with given email already exists".into())
            }
            Some("customers_phone_key") => {
                AppError::Conflict("Customer with given phone number already exists".into())
            }
            Some("drivers_phone_key") => {
                AppError::Validation("Driver with this phone already exists".into())
            }
            Some("deliveries_sale_id_key") => {
                AppError::Validation("Delivery already exists for this sale".into())
            }
            _ => AppError::Conflict("Record already exists".into()),
        };
    }

    if db_err.is_foreign_key_violation() {
        return match db_err.constraint() {
            Some("deliveries_customer_id_fkey") => AppError::Validation("Customer not found".into()),
            Some("deliveries_driver_id_fkey") => AppError::Validation("Driver not found".into()),
            _ => AppError::Validation("Referenced record does not exist".into()),
        };
    }

    AppError::Database(err)
}

async fn insert_walk_in(conn: &mut PgConnection) -> Result<Customer, sqlx::Error> {
    let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM customers WHERE name LIKE $1")
        .bind(format!("{WALK_IN_PREFIX}%"))
        .fetch_one(&mut *conn)
        .await?;

    sqlx::query_as::<_, Customer>(
        r#"INSERT INTO customers (name)
           VALUES ($1)
           RETURNING id, name, email, phone, address, status"#,
    )
    .bind(walk_in_name(existing))
    .fetch_one(&mut *conn)
    .await
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, full_name, password_hash, role, status FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, username, full_name, role, status FROM users WHERE status = 'ACTIVE' ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"INSERT INTO users (username, full_name, password_hash, role)
               VALUES ($1, $2, $3, $4)
               RETURNING id, username, full_name, role, status"#,
        )
        .bind(&user.username)
        .bind(&user.full_name)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(constraint_error)
    }

    async fn get_user(&self, id: i32) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, full_name, role, status FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn update_user(&self, id: i32, changes: UserChanges) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"UPDATE users
               SET username = COALESCE($2, username),
                   full_name = COALESCE($3, full_name),
                   password_hash = COALESCE($4, password_hash),
                   role = COALESCE($5, role),
                   status = COALESCE($6, status)
               WHERE id = $1
               RETURNING id, username, full_name, role, status"#,
        )
        .bind(id)
        .bind(changes.username)
        .bind(changes.full_name)
        .bind(changes.password_hash)
        .bind(changes.role.map(|role| role.as_str()))
        .bind(changes.status)
        .fetch_optional(&self.pool)
        .await
        .map_err(constraint_error)
    }

    async fn deactivate_user(&self, id: i32) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET status = $2 WHERE id = $1 RETURNING id, username, full_name, role, status",
        )
        .bind(id)
        .bind(STATUS_INACTIVE)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list_categories(&self) -> AppResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>("SELECT id, name, status FROM categories ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(categories)
    }

    async fn create_category(&self, req: CreateCategoryRequest) -> AppResult<Category> {
        sqlx::query_as::<_, Category>("INSERT INTO categories (name) VALUES ($1) RETURNING id, name, status")
            .bind(req.name.trim())
            .fetch_one(&self.pool)
            .await
            .map_err(constraint_error)
    }

    async fn get_category(&self, id: i32) -> AppResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>("SELECT id, name, status FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(category)
    }

    async fn update_category(&self, id: i32, req: UpdateCategoryRequest) -> AppResult<Option<Category>> {
        sqlx::query_as::<_, Category>(
            r#"UPDATE categories
               SET name = COALESCE($2, name),
                   status = COALESCE($3, status)
               WHERE id = $1
               RETURNING id, name, status"#,
        )
        .bind(id)
        .bind(req.name.as_deref().map(str::trim))
        .bind(req.status)
        .fetch_optional(&self.pool)
        .await
        .map_err(constraint_error)
    }

    async fn deactivate_category(&self, id: i32) -> AppResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "UPDATE categories SET status = $2 WHERE id = $1 RETURNING id, name, status",
        )
        .bind(id)
        .bind(STATUS_INACTIVE)
        .fetch_optional(&self.pool)
        .await?;
        Ok(category)
    }

    async fn list_suppliers(&self) -> AppResult<Vec<Supplier>> {
        let suppliers = sqlx::query_as::<_, Supplier>(
            "SELECT id, name, contact_person, phone, email, address, status FROM suppliers ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(suppliers)
    }

    async fn create_supplier(&self, req: CreateSupplierRequest) -> AppResult<Supplier> {
        sqlx::query_as::<_, Supplier>(
            r#"INSERT INTO suppliers (name, contact_person, phone, email, address)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING id, name, contact_person, phone, email, address, status"#,
        )
        .bind(req.name.trim())
        .bind(req.contact_person)
        .bind(req.phone)
        .bind(req.email)
        .bind(req.address)
        .fetch_one(&self.pool)
        .await
        .map_err(constraint_error)
    }

    async fn get_supplier(&self, id: i32) -> AppResult<Option<SupplierDetail>> {
        let Some(supplier) = sqlx::query_as::<_, Supplier>(
            "SELECT id, name, contact_person, phone, email, address, status FROM suppliers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let products = sqlx::query_as::<_, Product>(
            r#"SELECT id, name, barcode, category_id, supplier_id, price, cost_price,
                      stock_quantity, expiry_date, status, is_deleted
               FROM products
               WHERE supplier_id = $1 AND is_deleted = false
               ORDER BY id"#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(Some(SupplierDetail { supplier, products }))
    }

    async fn update_supplier(&self, id: i32, req: UpdateSupplierRequest) -> AppResult<Option<Supplier>> {
        sqlx::query_as::<_, Supplier>(
            r#"UPDATE suppliers
               SET name = COALESCE($2, name),
                   contact_person = COALESCE($3, contact_person),
                   phone = COALESCE($4, phone),
                   email = COALESCE($5, email),
                   address = COALESCE($6, address),
                   status = COALESCE($7, status)
               WHERE id = $1
               RETURNING id, name, contact_person, phone, email, address, status"#,
        )
        .bind(id)
        .bind(req.name.as_deref().map(str::trim))
        .bind(req.contact_person)
        .bind(req.phone)
        .bind(req.email)
        .bind(req.address)
        .bind(req.status)
        .fetch_optional(&self.pool)
        .await
        .map_err(constraint_error)
    }

    async fn deactivate_supplier(&self, id: i32) -> AppResult<Option<Supplier>> {
        let supplier = sqlx::query_as::<_, Supplier>(
            r#"UPDATE suppliers SET status = $2 WHERE id = $1
               RETURNING id, name, contact_person, phone, email, address, status"#,
        )
        .bind(id)
        .bind(STATUS_INACTIVE)
        .fetch_optional(&self.pool)
        .await?;
        Ok(supplier)
    }

    async fn list_products(&self) -> AppResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"SELECT id, name, barcode, category_id, supplier_id, price, cost_price,
                      stock_quantity, expiry_date, status, is_deleted
               FROM products
               WHERE is_deleted = false
               ORDER BY id DESC"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    async fn get_product(&self, id: i32) -> AppResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"SELECT id, name, barcode, category_id, supplier_id, price, cost_price,
                      stock_quantity, expiry_date, status, is_deleted
               FROM products
               WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    async fn create_product(&self, req: CreateProductRequest) -> AppResult<Product> {
        self.check_product_refs(Some(req.category_id), req.supplier_id).await?;

        sqlx::query_as::<_, Product>(
            r#"INSERT INTO products
                   (name, barcode, category_id, supplier_id, price, cost_price,
                    stock_quantity, expiry_date, status)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, COALESCE($9, 'ACTIVE'))
               RETURNING id, name, barcode, category_id, supplier_id, price, cost_price,
                         stock_quantity, expiry_date, status, is_deleted"#,
        )
        .bind(req.name.trim())
        .bind(req.barcode)
        .bind(req.category_id)
        .bind(req.supplier_id)
        .bind(req.price)
        .bind(req.cost_price)
        .bind(req.stock_quantity)
        .bind(req.expiry_date)
        .bind(req.status)
        .fetch_one(&self.pool)
        .await
        .map_err(constraint_error)
    }

    /// update_product
    ///
    /// Partial update via `COALESCE`: absent fields keep their stored value.
    async fn update_product(&self, id: i32, req: UpdateProductRequest) -> AppResult<Option<Product>> {
        self.check_product_refs(req.category_id, req.supplier_id).await?;

        sqlx::query_as::<_, Product>(
            r#"UPDATE products
               SET name = COALESCE($2, name),
                   barcode = COALESCE($3, barcode),
                   category_id = COALESCE($4, category_id),
                   supplier_id = COALESCE($5, supplier_id),
                   price = COALESCE($6, price),
                   cost_price = COALESCE($7, cost_price),
                   stock_quantity = COALESCE($8, stock_quantity),
                   expiry_date = COALESCE($9, expiry_date),
                   status = COALESCE($10, status)
               WHERE id = $1
               RETURNING id, name, barcode, category_id, supplier_id, price, cost_price,
                         stock_quantity, expiry_date, status, is_deleted"#,
        )
        .bind(id)
        .bind(req.name)
        .bind(req.barcode)
        .bind(req.category_id)
        .bind(req.supplier_id)
        .bind(req.price)
        .bind(req.cost_price)
        .bind(req.stock_quantity)
        .bind(req.expiry_date)
        .bind(req.status)
        .fetch_optional(&self.pool)
        .await
        .map_err(constraint_error)
    }

    async fn delete_product(&self, id: i32) -> AppResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"UPDATE products SET is_deleted = true
               WHERE id = $1
               RETURNING id, name, barcode, category_id, supplier_id, price, cost_price,
                         stock_quantity, expiry_date, status, is_deleted"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    async fn list_customers(&self) -> AppResult<Vec<CustomerSummary>> {
        let customers = sqlx::query_as::<_, CustomerSummary>(
            r#"SELECT c.id, c.name, c.email, c.phone, c.address, c.status,
                      COALESCE((SELECT SUM(s.total_amount) FROM sales s WHERE s.customer_id = c.id), 0)::BIGINT
                          AS total_purchases
               FROM customers c
               WHERE c.status = 'ACTIVE'
               ORDER BY c.id DESC"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(customers)
    }

    async fn get_customer(&self, id: i32) -> AppResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT id, name, email, phone, address, status FROM customers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(customer)
    }

    async fn create_customer(&self, req: CreateCustomerRequest) -> AppResult<Customer> {
        if req.is_walk_in() {
            let mut conn = self.pool.acquire().await?;
            return Ok(insert_walk_in(&mut conn).await?);
        }

        sqlx::query_as::<_, Customer>(
            r#"INSERT INTO customers (name, email, phone, address)
               VALUES ($1, $2, $3, $4)
               RETURNING id, name, email, phone, address, status"#,
        )
        .bind(req.name.trim())
        .bind(req.email)
        .bind(req.phone)
        .bind(req.address)
        .fetch_one(&self.pool)
        .await
        .map_err(constraint_error)
    }

    async fn update_customer(&self, id: i32, req: UpdateCustomerRequest) -> AppResult<Option<Customer>> {
        sqlx::query_as::<_, Customer>(
            r#"UPDATE customers
               SET name = COALESCE($2, name),
                   email = COALESCE($3, email),
                   phone = COALESCE($4, phone),
                   address = COALESCE($5, address)
               WHERE id = $1
               RETURNING id, name, email, phone, address, status"#,
        )
        .bind(id)
        .bind(req.name)
        .bind(req.email)
        .bind(req.phone)
        .bind(req.address)
        .fetch_optional(&self.pool)
        .await
        .map_err(constraint_error)
    }

    async fn customer_history(&self, id: i32) -> AppResult<Option<CustomerHistory>> {
        let Some(customer) = self.get_customer(id).await? else {
            return Ok(None);
        };

        let mut sales = sqlx::query_as::<_, Sale>(
            r#"SELECT id, user_id, customer_id, payment_method, tax_amount, total_amount,
                      discount_amount, date
               FROM sales
               WHERE customer_id = $1
               ORDER BY date DESC, id DESC"#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        self.load_items(&mut sales).await?;

        let sale_ids: Vec<i32> = sales.iter().map(|s| s.id).collect();
        let mut deliveries: HashMap<i32, Delivery> = sqlx::query_as::<_, Delivery>(
            r#"SELECT id, sale_id, customer_id, driver_id, delivery_address, delivery_date, status
               FROM deliveries
               WHERE sale_id = ANY($1)"#,
        )
        .bind(&sale_ids)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|delivery| (delivery.sale_id, delivery))
        .collect();

        let sales = sales
            .into_iter()
            .map(|sale| {
                let delivery = deliveries.remove(&sale.id);
                SaleHistoryEntry { sale, delivery }
            })
            .collect();
        Ok(Some(CustomerHistory { customer, sales }))
    }

    /// finalize_sale
    ///
    /// Runs in one transaction. Every product on the sale is locked with
    /// `FOR UPDATE` in id order before any stock is checked, so concurrent sales
    /// of the same products serialize instead of overselling or deadlocking.
    /// Any error drops the transaction, which rolls back the walk-in customer,
    /// the sale, and earlier items.
    async fn finalize_sale(&self, user_id: i32, req: FinalizeSaleRequest) -> AppResult<Sale> {
        let subtotals = req
            .items
            .iter()
            .map(SaleLineRequest::subtotal)
            .collect::<AppResult<Vec<i64>>>()?;
        let discount_amount = req.discount_amount()?;

        let mut tx = self.pool.begin().await?;

        // 1. Resolve the customer, falling back to a new walk-in.
        let known = match req.customer_id {
            Some(id) => sqlx::query_scalar::<_, i32>("SELECT id FROM customers WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?,
            None => None,
        };
        let customer_id = match known {
            Some(id) => id,
            None => insert_walk_in(&mut tx).await?.id,
        };

        // 2. Sale header.
        let mut sale = sqlx::query_as::<_, Sale>(
            r#"INSERT INTO sales (user_id, customer_id, payment_method, tax_amount, total_amount, discount_amount)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING id, user_id, customer_id, payment_method, tax_amount, total_amount,
                         discount_amount, date"#,
        )
        .bind(user_id)
        .bind(customer_id)
        .bind(&req.payment_method)
        .bind(req.tax_amount)
        .bind(req.total_amount)
        .bind(discount_amount)
        .fetch_one(&mut *tx)
        .await?;

        // 3. Lock every product on the sale, lowest id first.
        let mut product_ids: Vec<i32> = req.items.iter().map(|line| line.product_id).collect();
        product_ids.sort_unstable();
        product_ids.dedup();
        let locked: HashMap<i32, (String, i32)> = sqlx::query_as::<_, (i32, String, i32)>(
            r#"SELECT id, name, stock_quantity FROM products
               WHERE id = ANY($1) AND is_deleted = false
               ORDER BY id
               FOR UPDATE"#,
        )
        .bind(&product_ids)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(|(id, name, stock)| (id, (name, stock)))
        .collect();

        // 4. Lines: check, record, decrement.
        let mut taken: HashMap<i32, i32> = HashMap::new();
        for (line, subtotal) in req.items.iter().zip(subtotals) {
            let (name, stock) = locked
                .get(&line.product_id)
                .ok_or_else(|| product_not_found(line.product_id))?;

            let already = taken.entry(line.product_id).or_default();
            let wanted = already.checked_add(line.quantity).ok_or_else(|| {
                AppError::Validation(format!(
                    "Quantity for product {} is out of range",
                    line.product_id
                ))
            })?;
            if *stock < wanted {
                return Err(AppError::InsufficientStock {
                    product: name.clone(),
                    available: *stock,
                    requested: wanted,
                });
            }
            *already = wanted;

            let item = sqlx::query_as::<_, SaleItem>(
                r#"INSERT INTO sale_items (sale_id, product_id, quantity, unit_price, discount, subtotal)
                   VALUES ($1, $2, $3, $4, $5, $6)
                   RETURNING id, sale_id, product_id, quantity, unit_price, discount, subtotal"#,
            )
            .bind(sale.id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price)
            .bind(line.discount)
            .bind(subtotal)
            .fetch_one(&mut *tx)
            .await?;

            sqlx::query("UPDATE products SET stock_quantity = stock_quantity - $1 WHERE id = $2")
                .bind(line.quantity)
                .bind(line.product_id)
                .execute(&mut *tx)
                .await?;

            sale.items.push(item);
        }

        tx.commit().await?;
        Ok(sale)
    }

    async fn list_sales(&self) -> AppResult<Vec<Sale>> {
        let mut sales = sqlx::query_as::<_, Sale>(
            r#"SELECT id, user_id, customer_id, payment_method, tax_amount, total_amount,
                      discount_amount, date
               FROM sales
               ORDER BY date DESC, id DESC"#,
        )
        .fetch_all(&self.pool)
        .await?;
        self.load_items(&mut sales).await?;
        Ok(sales)
    }

    async fn get_sale(&self, id: i32) -> AppResult<Option<Sale>> {
        let Some(mut sale) = sqlx::query_as::<_, Sale>(
            r#"SELECT id, user_id, customer_id, payment_method, tax_amount, total_amount,
                      discount_amount, date
               FROM sales
               WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        sale.items = sqlx::query_as::<_, SaleItem>(
            r#"SELECT id, sale_id, product_id, quantity, unit_price, discount, subtotal
               FROM sale_items
               WHERE sale_id = $1
               ORDER BY id"#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(Some(sale))
    }

    async fn list_drivers(&self) -> AppResult<Vec<Driver>> {
        let drivers = sqlx::query_as::<_, Driver>(
            "SELECT id, name, phone, is_deleted FROM drivers WHERE is_deleted = false ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(drivers)
    }

    async fn create_driver(&self, req: CreateDriverRequest) -> AppResult<Driver> {
        sqlx::query_as::<_, Driver>(
            "INSERT INTO drivers (name, phone) VALUES ($1, $2) RETURNING id, name, phone, is_deleted",
        )
        .bind(req.name.trim())
        .bind(&req.phone)
        .fetch_one(&self.pool)
        .await
        .map_err(constraint_error)
    }

    async fn update_driver(&self, id: i32, req: UpdateDriverRequest) -> AppResult<Option<Driver>> {
        sqlx::query_as::<_, Driver>(
            r#"UPDATE drivers
               SET name = COALESCE($2, name),
                   phone = COALESCE($3, phone)
               WHERE id = $1 AND is_deleted = false
               RETURNING id, name, phone, is_deleted"#,
        )
        .bind(id)
        .bind(req.name.as_deref().map(str::trim))
        .bind(req.phone)
        .fetch_optional(&self.pool)
        .await
        .map_err(constraint_error)
    }

    async fn delete_driver(&self, id: i32) -> AppResult<Option<Driver>> {
        let driver = sqlx::query_as::<_, Driver>(
            r#"UPDATE drivers SET is_deleted = true
               WHERE id = $1 AND is_deleted = false
               RETURNING id, name, phone, is_deleted"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(driver)
    }

    async fn list_deliveries(&self) -> AppResult<Vec<Delivery>> {
        let deliveries = sqlx::query_as::<_, Delivery>(
            r#"SELECT id, sale_id, customer_id, driver_id, delivery_address, delivery_date, status
               FROM deliveries
               ORDER BY id DESC"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(deliveries)
    }

    async fn create_delivery(&self, req: CreateDeliveryRequest) -> AppResult<Delivery> {
        let sale_exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM sales WHERE id = $1)")
            .bind(req.sale_id)
            .fetch_one(&self.pool)
            .await?;
        if !sale_exists {
            return Err(AppError::NotFound("Sale not found".into()));
        }
        if let Some(driver_id) = req.driver_id {
            if !self.driver_exists(driver_id).await? {
                return Err(AppError::Validation("Driver not found".into()));
            }
        }

        // The unique constraint on sale_id reports an existing delivery.
        sqlx::query_as::<_, Delivery>(
            r#"INSERT INTO deliveries (sale_id, customer_id, driver_id, delivery_address, delivery_date, status)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING id, sale_id, customer_id, driver_id, delivery_address, delivery_date, status"#,
        )
        .bind(req.sale_id)
        .bind(req.customer_id)
        .bind(req.driver_id)
        .bind(&req.delivery_address)
        .bind(req.delivery_date)
        .bind(DeliveryStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(constraint_error)
    }

    async fn update_delivery(&self, id: i32, req: UpdateDeliveryRequest) -> AppResult<Option<Delivery>> {
        if let Some(driver_id) = req.driver_id {
            if !self.driver_exists(driver_id).await? {
                return Err(AppError::Validation("Driver not found".into()));
            }
        }

        sqlx::query_as::<_, Delivery>(
            r#"UPDATE deliveries
               SET status = COALESCE($2, status),
                   driver_id = COALESCE($3, driver_id),
                   delivery_date = COALESCE($4, delivery_date),
                   delivery_address = COALESCE($5, delivery_address)
               WHERE id = $1
               RETURNING id, sale_id, customer_id, driver_id, delivery_address, delivery_date, status"#,
        )
        .bind(id)
        .bind(req.status.map(|s| s.as_str()))
        .bind(req.driver_id)
        .bind(req.delivery_date)
        .bind(req.delivery_address)
        .fetch_optional(&self.pool)
        .await
        .map_err(constraint_error)
    }
}
