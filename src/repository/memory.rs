use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::{Repository, product_not_found, walk_in_name};
use crate::{
    error::{AppError, AppResult},
    models::{
        Category, CreateCategoryRequest, CreateCustomerRequest, CreateDeliveryRequest,
        CreateDriverRequest, CreateProductRequest, CreateSupplierRequest, Customer,
        CustomerHistory, CustomerSummary, Delivery, DeliveryStatus, Driver, FinalizeSaleRequest,
        NewUser, Product, STATUS_ACTIVE, STATUS_INACTIVE, Sale, SaleHistoryEntry, SaleItem,
        SaleLineRequest, Supplier, SupplierDetail, UpdateCategoryRequest, UpdateCustomerRequest,
        UpdateDeliveryRequest, UpdateDriverRequest, UpdateProductRequest, UpdateSupplierRequest,
        User, UserChanges, UserRecord, WALK_IN_PREFIX,
    },
};

#[derive(Default)]
struct Store {
    next_id: i32,
    users: Vec<UserRecord>,
    categories: Vec<Category>,
    suppliers: Vec<Supplier>,
    products: Vec<Product>,
    customers: Vec<Customer>,
    sales: Vec<Sale>,
    drivers: Vec<Driver>,
    deliveries: Vec<Delivery>,
}

impl Store {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn create_walk_in(&mut self) -> Customer {
        let existing = self
            .customers
            .iter()
            .filter(|c| c.name.starts_with(WALK_IN_PREFIX))
            .count() as i64;
        let customer = Customer {
            id: self.next_id(),
            name: walk_in_name(existing),
            email: None,
            phone: None,
            address: None,
            status: STATUS_ACTIVE.to_string(),
        };
        self.customers.push(customer.clone());
        customer
    }

    fn check_product_refs(&self, category_id: Option<i32>, supplier_id: Option<i32>) -> AppResult<()> {
        if let Some(category_id) = category_id {
            if !self.categories.iter().any(|c| c.id == category_id) {
                return Err(AppError::Validation(
                    "Category not found. Please create a category first.".into(),
                ));
            }
        }
        if let Some(supplier_id) = supplier_id {
            if !self.suppliers.iter().any(|s| s.id == supplier_id) {
                return Err(AppError::Validation(
                    "Supplier not found. Please create a supplier first.".into(),
                ));
            }
        }
        Ok(())
    }

    fn check_product_unique(&self, id: Option<i32>, name: Option<&str>, barcode: Option<&str>) -> AppResult<()> {
        let clash = self.products.iter().filter(|p| Some(p.id) != id).any(|p| {
            name.is_some_and(|n| p.name == n)
                || barcode.is_some_and(|b| p.barcode.as_deref() == Some(b))
        });
        if clash {
            return Err(AppError::Conflict("Product already exists".into()));
        }
        Ok(())
    }

    fn check_customer_unique(&self, id: Option<i32>, email: Option<&str>, phone: Option<&str>) -> AppResult<()> {
        let others = || self.customers.iter().filter(move |c| Some(c.id) != id);
        if let Some(email) = email {
            if others().any(|c| c.email.as_deref() == Some(email)) {
                return Err(AppError::Conflict(
                    "Customer with given email already exists".into(),
                ));
            }
        }
        if let Some(phone) = phone {
            if others().any(|c| c.phone.as_deref() == Some(phone)) {
                return Err(AppError::Conflict(
                    "Customer with given phone number already exists".into(),
                ));
            }
        }
        Ok(())
    }
}

/// MemoryRepository
///
/// A `Repository` kept entirely in process memory. Backs local development without
/// a database and the integration tests.
///
/// A single mutex guards the whole store and is held for the full duration of
/// each operation, which makes every operation (sale finalization included)
/// atomic with respect to every other.
#[derive(Default)]
pub struct MemoryRepository {
    store: Mutex<Store>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> AppResult<MutexGuard<'_, Store>> {
        self.store
            .lock()
            .map_err(|_| AppError::Internal("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<UserRecord>> {
        let store = self.store()?;
        Ok(store.users.iter().find(|u| u.username == username).cloned())
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        let store = self.store()?;
        Ok(store
            .users
            .iter()
            .filter(|u| u.status == STATUS_ACTIVE)
            .cloned()
            .map(User::from)
            .collect())
    }

    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let mut store = self.store()?;
        if store.users.iter().any(|u| u.username == user.username) {
            return Err(AppError::Conflict("username already in use".into()));
        }
        let record = UserRecord {
            id: store.next_id(),
            username: user.username,
            full_name: user.full_name,
            password_hash: user.password_hash,
            role: user.role.as_str().to_string(),
            status: STATUS_ACTIVE.to_string(),
        };
        store.users.push(record.clone());
        Ok(record.into())
    }

    async fn get_user(&self, id: i32) -> AppResult<Option<User>> {
        let store = self.store()?;
        Ok(store.users.iter().find(|u| u.id == id).cloned().map(User::from))
    }

    async fn update_user(&self, id: i32, changes: UserChanges) -> AppResult<Option<User>> {
        let mut store = self.store()?;
        if let Some(username) = &changes.username {
            if store.users.iter().any(|u| u.id != id && &u.username == username) {
                return Err(AppError::Conflict("username already in use".into()));
            }
        }

        let Some(user) = store.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(full_name) = changes.full_name {
            user.full_name = full_name;
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(role) = changes.role {
            user.role = role.as_str().to_string();
        }
        if let Some(status) = changes.status {
            user.status = status;
        }
        Ok(Some(user.clone().into()))
    }

    async fn deactivate_user(&self, id: i32) -> AppResult<Option<User>> {
        let mut store = self.store()?;
        let Some(user) = store.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        user.status = STATUS_INACTIVE.to_string();
        Ok(Some(user.clone().into()))
    }

    async fn list_categories(&self) -> AppResult<Vec<Category>> {
        Ok(self.store()?.categories.clone())
    }

    async fn get_category(&self, id: i32) -> AppResult<Option<Category>> {
        let store = self.store()?;
        Ok(store.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn create_category(&self, req: CreateCategoryRequest) -> AppResult<Category> {
        let mut store = self.store()?;
        let name = req.name.trim().to_string();
        if store.categories.iter().any(|c| c.name == name) {
            return Err(AppError::Conflict("Category already exists".into()));
        }
        let category = Category {
            id: store.next_id(),
            name,
            status: STATUS_ACTIVE.to_string(),
        };
        store.categories.push(category.clone());
        Ok(category)
    }

    async fn update_category(&self, id: i32, req: UpdateCategoryRequest) -> AppResult<Option<Category>> {
        let mut store = self.store()?;
        let name = req.name.map(|name| name.trim().to_string());
        if let Some(name) = &name {
            if store.categories.iter().any(|c| c.id != id && &c.name == name) {
                return Err(AppError::Conflict("Category already exists".into()));
            }
        }

        let Some(category) = store.categories.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        if let Some(name) = name {
            category.name = name;
        }
        if let Some(status) = req.status {
            category.status = status;
        }
        Ok(Some(category.clone()))
    }

    async fn deactivate_category(&self, id: i32) -> AppResult<Option<Category>> {
        let mut store = self.store()?;
        let Some(category) = store.categories.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        category.status = STATUS_INACTIVE.to_string();
        Ok(Some(category.clone()))
    }

    async fn list_suppliers(&self) -> AppResult<Vec<Supplier>> {
        Ok(self.store()?.suppliers.clone())
    }

    async fn get_supplier(&self, id: i32) -> AppResult<Option<SupplierDetail>> {
        let store = self.store()?;
        let Some(supplier) = store.suppliers.iter().find(|s| s.id == id).cloned() else {
            return Ok(None);
        };
        let products = store
            .products
            .iter()
            .filter(|p| p.supplier_id == Some(id) && !p.is_deleted)
            .cloned()
            .collect();
        Ok(Some(SupplierDetail { supplier, products }))
    }

    async fn create_supplier(&self, req: CreateSupplierRequest) -> AppResult<Supplier> {
        let mut store = self.store()?;
        let name = req.name.trim().to_string();
        if store.suppliers.iter().any(|s| s.name == name) {
            return Err(AppError::Conflict("Supplier already exists".into()));
        }
        let supplier = Supplier {
            id: store.next_id(),
            name,
            contact_person: req.contact_person,
            phone: req.phone,
            email: req.email,
            address: req.address,
            status: STATUS_ACTIVE.to_string(),
        };
        store.suppliers.push(supplier.clone());
        Ok(supplier)
    }

    async fn update_supplier(&self, id: i32, req: UpdateSupplierRequest) -> AppResult<Option<Supplier>> {
        let mut store = self.store()?;
        let name = req.name.map(|name| name.trim().to_string());
        if let Some(name) = &name {
            if store.suppliers.iter().any(|s| s.id != id && &s.name == name) {
                return Err(AppError::Conflict("Supplier already exists".into()));
            }
        }

        let Some(supplier) = store.suppliers.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        if let Some(name) = name {
            supplier.name = name;
        }
        if let Some(contact_person) = req.contact_person {
            supplier.contact_person = Some(contact_person);
        }
        if let Some(phone) = req.phone {
            supplier.phone = Some(phone);
        }
        if let Some(email) = req.email {
            supplier.email = Some(email);
        }
        if let Some(address) = req.address {
            supplier.address = Some(address);
        }
        if let Some(status) = req.status {
            supplier.status = status;
        }
        Ok(Some(supplier.clone()))
    }

    async fn deactivate_supplier(&self, id: i32) -> AppResult<Option<Supplier>> {
        let mut store = self.store()?;
        let Some(supplier) = store.suppliers.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        supplier.status = STATUS_INACTIVE.to_string();
        Ok(Some(supplier.clone()))
    }

    async fn list_products(&self) -> AppResult<Vec<Product>> {
        let store = self.store()?;
        Ok(store.products.iter().filter(|p| !p.is_deleted).cloned().collect())
    }

    async fn get_product(&self, id: i32) -> AppResult<Option<Product>> {
        let store = self.store()?;
        Ok(store.products.iter().find(|p| p.id == id).cloned())
    }

    async fn create_product(&self, req: CreateProductRequest) -> AppResult<Product> {
        let mut store = self.store()?;
        store.check_product_refs(Some(req.category_id), req.supplier_id)?;
        let name = req.name.trim().to_string();
        store.check_product_unique(None, Some(&name), req.barcode.as_deref())?;

        let product = Product {
            id: store.next_id(),
            name,
            barcode: req.barcode,
            category_id: req.category_id,
            supplier_id: req.supplier_id,
            price: req.price,
            cost_price: req.cost_price,
            stock_quantity: req.stock_quantity,
            expiry_date: req.expiry_date,
            status: req.status.unwrap_or_else(|| STATUS_ACTIVE.to_string()),
            is_deleted: false,
        };
        store.products.push(product.clone());
        Ok(product)
    }

    async fn update_product(&self, id: i32, req: UpdateProductRequest) -> AppResult<Option<Product>> {
        let mut store = self.store()?;
        if !store.products.iter().any(|p| p.id == id) {
            return Ok(None);
        }
        store.check_product_refs(req.category_id, req.supplier_id)?;
        store.check_product_unique(Some(id), req.name.as_deref(), req.barcode.as_deref())?;

        let Some(product) = store.products.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(name) = req.name {
            product.name = name;
        }
        if let Some(barcode) = req.barcode {
            product.barcode = Some(barcode);
        }
        if let Some(category_id) = req.category_id {
            product.category_id = category_id;
        }
        if let Some(supplier_id) = req.supplier_id {
            product.supplier_id = Some(supplier_id);
        }
        if let Some(price) = req.price {
            product.price = price;
        }
        if let Some(cost_price) = req.cost_price {
            product.cost_price = cost_price;
        }
        if let Some(stock) = req.stock_quantity {
            product.stock_quantity = stock;
        }
        if let Some(expiry) = req.expiry_date {
            product.expiry_date = Some(expiry);
        }
        if let Some(status) = req.status {
            product.status = status;
        }
        Ok(Some(product.clone()))
    }

    async fn delete_product(&self, id: i32) -> AppResult<Option<Product>> {
        let mut store = self.store()?;
        Ok(store.products.iter_mut().find(|p| p.id == id).map(|product| {
            product.is_deleted = true;
            product.clone()
        }))
    }

    async fn list_customers(&self) -> AppResult<Vec<CustomerSummary>> {
        let store = self.store()?;
        let mut totals: HashMap<i32, i64> = HashMap::new();
        for sale in &store.sales {
            *totals.entry(sale.customer_id).or_default() += sale.total_amount;
        }
        Ok(store
            .customers
            .iter()
            .filter(|c| c.status == STATUS_ACTIVE)
            .map(|c| CustomerSummary {
                customer: c.clone(),
                total_purchases: totals.get(&c.id).copied().unwrap_or(0),
            })
            .collect())
    }

    async fn get_customer(&self, id: i32) -> AppResult<Option<Customer>> {
        let store = self.store()?;
        Ok(store.customers.iter().find(|c| c.id == id).cloned())
    }

    async fn create_customer(&self, req: CreateCustomerRequest) -> AppResult<Customer> {
        let mut store = self.store()?;
        if req.is_walk_in() {
            return Ok(store.create_walk_in());
        }
        store.check_customer_unique(None, req.email.as_deref(), req.phone.as_deref())?;

        let customer = Customer {
            id: store.next_id(),
            name: req.name.trim().to_string(),
            email: req.email,
            phone: req.phone,
            address: req.address,
            status: STATUS_ACTIVE.to_string(),
        };
        store.customers.push(customer.clone());
        Ok(customer)
    }

    async fn update_customer(&self, id: i32, req: UpdateCustomerRequest) -> AppResult<Option<Customer>> {
        let mut store = self.store()?;
        if !store.customers.iter().any(|c| c.id == id) {
            return Ok(None);
        }
        store.check_customer_unique(Some(id), req.email.as_deref(), req.phone.as_deref())?;

        let Some(customer) = store.customers.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        if let Some(name) = req.name {
            customer.name = name;
        }
        if let Some(email) = req.email {
            customer.email = Some(email);
        }
        if let Some(phone) = req.phone {
            customer.phone = Some(phone);
        }
        if let Some(address) = req.address {
            customer.address = Some(address);
        }
        Ok(Some(customer.clone()))
    }

    async fn customer_history(&self, id: i32) -> AppResult<Option<CustomerHistory>> {
        let store = self.store()?;
        let Some(customer) = store.customers.iter().find(|c| c.id == id).cloned() else {
            return Ok(None);
        };

        let mut sales: Vec<Sale> = store.sales.iter().filter(|s| s.customer_id == id).cloned().collect();
        sales.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        let sales = sales
            .into_iter()
            .map(|sale| {
                let delivery = store.deliveries.iter().find(|d| d.sale_id == sale.id).cloned();
                SaleHistoryEntry { sale, delivery }
            })
            .collect();
        Ok(Some(CustomerHistory { customer, sales }))
    }

    async fn finalize_sale(&self, user_id: i32, req: FinalizeSaleRequest) -> AppResult<Sale> {
        // Amounts are computed before the lock so nothing below can fail
        // once stock starts moving.
        let subtotals = req
            .items
            .iter()
            .map(SaleLineRequest::subtotal)
            .collect::<AppResult<Vec<i64>>>()?;
        let discount_amount = req.discount_amount()?;

        let mut store = self.store()?;

        // Validate every line before touching anything. Requests for the same
        // product on several lines are checked against their combined quantity.
        let mut requested: HashMap<i32, i32> = HashMap::new();
        for line in &req.items {
            let product = store
                .products
                .iter()
                .find(|p| p.id == line.product_id && !p.is_deleted)
                .ok_or_else(|| product_not_found(line.product_id))?;
            let wanted = requested.entry(product.id).or_default();
            *wanted = wanted.checked_add(line.quantity).ok_or_else(|| {
                AppError::Validation(format!(
                    "Quantity for product {} is out of range",
                    line.product_id
                ))
            })?;
            if product.stock_quantity < *wanted {
                return Err(AppError::InsufficientStock {
                    product: product.name.clone(),
                    available: product.stock_quantity,
                    requested: *wanted,
                });
            }
        }

        let customer_id = match req.customer_id {
            Some(id) if store.customers.iter().any(|c| c.id == id) => id,
            _ => store.create_walk_in().id,
        };

        let sale_id = store.next_id();
        let mut items = Vec::with_capacity(req.items.len());
        for (line, subtotal) in req.items.iter().zip(subtotals) {
            let item = SaleItem {
                id: store.next_id(),
                sale_id,
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
                discount: line.discount,
                subtotal,
            };
            if let Some(product) = store.products.iter_mut().find(|p| p.id == line.product_id) {
                product.stock_quantity -= line.quantity;
            }
            items.push(item);
        }

        let sale = Sale {
            id: sale_id,
            user_id,
            customer_id,
            payment_method: req.payment_method.clone(),
            tax_amount: req.tax_amount,
            total_amount: req.total_amount,
            discount_amount,
            date: Utc::now(),
            items,
        };
        store.sales.push(sale.clone());
        Ok(sale)
    }

    async fn list_sales(&self) -> AppResult<Vec<Sale>> {
        let store = self.store()?;
        let mut sales = store.sales.clone();
        sales.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(sales)
    }

    async fn get_sale(&self, id: i32) -> AppResult<Option<Sale>> {
        let store = self.store()?;
        Ok(store.sales.iter().find(|s| s.id == id).cloned())
    }

    async fn list_drivers(&self) -> AppResult<Vec<Driver>> {
        let store = self.store()?;
        let mut drivers: Vec<Driver> = store.drivers.iter().filter(|d| !d.is_deleted).cloned().collect();
        drivers.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(drivers)
    }

    async fn create_driver(&self, req: CreateDriverRequest) -> AppResult<Driver> {
        let mut store = self.store()?;
        if store.drivers.iter().any(|d| d.phone == req.phone) {
            return Err(AppError::Validation(
                "Driver with this phone already exists".into(),
            ));
        }
        let driver = Driver {
            id: store.next_id(),
            name: req.name.trim().to_string(),
            phone: req.phone,
            is_deleted: false,
        };
        store.drivers.push(driver.clone());
        Ok(driver)
    }

    async fn update_driver(&self, id: i32, req: UpdateDriverRequest) -> AppResult<Option<Driver>> {
        let mut store = self.store()?;
        if let Some(phone) = &req.phone {
            if store.drivers.iter().any(|d| d.id != id && &d.phone == phone) {
                return Err(AppError::Validation(
                    "Driver with this phone already exists".into(),
                ));
            }
        }

        let Some(driver) = store.drivers.iter_mut().find(|d| d.id == id && !d.is_deleted) else {
            return Ok(None);
        };
        if let Some(name) = req.name {
            driver.name = name.trim().to_string();
        }
        if let Some(phone) = req.phone {
            driver.phone = phone;
        }
        Ok(Some(driver.clone()))
    }

    async fn delete_driver(&self, id: i32) -> AppResult<Option<Driver>> {
        let mut store = self.store()?;
        let Some(driver) = store.drivers.iter_mut().find(|d| d.id == id && !d.is_deleted) else {
            return Ok(None);
        };
        driver.is_deleted = true;
        Ok(Some(driver.clone()))
    }

    async fn list_deliveries(&self) -> AppResult<Vec<Delivery>> {
        let store = self.store()?;
        let mut deliveries = store.deliveries.clone();
        deliveries.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(deliveries)
    }

    async fn create_delivery(&self, req: CreateDeliveryRequest) -> AppResult<Delivery> {
        let mut store = self.store()?;
        if !store.sales.iter().any(|s| s.id == req.sale_id) {
            return Err(AppError::NotFound("Sale not found".into()));
        }
        if store.deliveries.iter().any(|d| d.sale_id == req.sale_id) {
            return Err(AppError::Validation(
                "Delivery already exists for this sale".into(),
            ));
        }
        if !store.customers.iter().any(|c| c.id == req.customer_id) {
            return Err(AppError::Validation("Customer not found".into()));
        }
        if let Some(driver_id) = req.driver_id {
            if !store.drivers.iter().any(|d| d.id == driver_id && !d.is_deleted) {
                return Err(AppError::Validation("Driver not found".into()));
            }
        }

        let delivery = Delivery {
            id: store.next_id(),
            sale_id: req.sale_id,
            customer_id: req.customer_id,
            driver_id: req.driver_id,
            delivery_address: req.delivery_address,
            delivery_date: req.delivery_date,
            status: DeliveryStatus::Pending.as_str().to_string(),
        };
        store.deliveries.push(delivery.clone());
        Ok(delivery)
    }

    async fn update_delivery(&self, id: i32, req: UpdateDeliveryRequest) -> AppResult<Option<Delivery>> {
        let mut store = self.store()?;
        if let Some(driver_id) = req.driver_id {
            if !store.drivers.iter().any(|d| d.id == driver_id && !d.is_deleted) {
                return Err(AppError::Validation("Driver not found".into()));
            }
        }

        let Some(delivery) = store.deliveries.iter_mut().find(|d| d.id == id) else {
            return Ok(None);
        };
        if let Some(status) = req.status {
            delivery.status = status.as_str().to_string();
        }
        if let Some(driver_id) = req.driver_id {
            delivery.driver_id = Some(driver_id);
        }
        if let Some(date) = req.delivery_date {
            delivery.delivery_date = Some(date);
        }
        if let Some(address) = req.delivery_address {
            delivery.delivery_address = address;
        }
        Ok(Some(delivery.clone()))
    }
}
