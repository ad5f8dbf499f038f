use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Permission
///
/// A dot-delimited hierarchical capability identifier such as
/// `"deliveries.view.assigned"`. A trailing `.*` (or the bare `"*"`) grants the
/// prefix and everything beneath it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Permission(&'static str);

impl Permission {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Every permission string the application knows about.
pub mod perm {
    use super::Permission;

    pub const ALL: Permission = Permission::new("*");

    pub const CUSTOMERS_VIEW: Permission = Permission::new("customers.view");
    pub const CUSTOMERS_MANAGE: Permission = Permission::new("customers.manage");
    pub const PRODUCTS_VIEW: Permission = Permission::new("products.view");
    pub const PRODUCTS_MANAGE: Permission = Permission::new("products.manage");
    pub const INVENTORY_VIEW: Permission = Permission::new("inventory.view");
    pub const INVENTORY_MANAGE: Permission = Permission::new("inventory.manage");
    pub const INVENTORY_REPORT: Permission = Permission::new("inventory.report");
    pub const SALES_VIEW: Permission = Permission::new("sales.view");
    pub const SALES_CREATE: Permission = Permission::new("sales.create");
    pub const SALES_REFUND: Permission = Permission::new("sales.refund");
    pub const SALES_REPORT: Permission = Permission::new("sales.report");
    pub const REPORTS_VIEW: Permission = Permission::new("reports.view");
    pub const REPORTS_EXPORT: Permission = Permission::new("reports.export");
    pub const SUPPLIERS_MANAGE: Permission = Permission::new("suppliers.manage");
    pub const DRIVERS_VIEW: Permission = Permission::new("drivers.view");
    pub const DRIVERS_MANAGE: Permission = Permission::new("drivers.manage");
    pub const INVOICES_VIEW: Permission = Permission::new("invoices.view");
    pub const INVOICES_MANAGE: Permission = Permission::new("invoices.manage");
    pub const CATEGORIES_MANAGE: Permission = Permission::new("categories.manage");
    pub const USERS_MANAGE: Permission = Permission::new("users.manage");
    pub const SETTINGS_MANAGE: Permission = Permission::new("settings.manage");
    pub const DELIVERIES_VIEW: Permission = Permission::new("deliveries.view");
    pub const DELIVERIES_VIEW_ASSIGNED: Permission = Permission::new("deliveries.view.assigned");
    pub const DELIVERIES_MANAGE: Permission = Permission::new("deliveries.manage");
    pub const DELIVERIES_ASSIGN: Permission = Permission::new("deliveries.assign");
    pub const DELIVERIES_UPDATE: Permission = Permission::new("deliveries.update");
}

/// Role
///
/// The closed set of role identifiers a user can hold. Serialized in the
/// SCREAMING_SNAKE_CASE form stored in the database and carried in session tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Manager,
    Cashier,
    StockManager,
    DeliveryDriver,
}

const ADMIN_GRANTS: &[Permission] = &[perm::ALL];

const MANAGER_GRANTS: &[Permission] = &[
    perm::CUSTOMERS_VIEW,
    perm::CUSTOMERS_MANAGE,
    perm::PRODUCTS_VIEW,
    perm::PRODUCTS_MANAGE,
    perm::INVENTORY_VIEW,
    perm::INVENTORY_MANAGE,
    perm::INVENTORY_REPORT,
    perm::SALES_VIEW,
    perm::SALES_CREATE,
    perm::SALES_REFUND,
    perm::SALES_REPORT,
    perm::REPORTS_VIEW,
    perm::REPORTS_EXPORT,
    perm::SUPPLIERS_MANAGE,
    perm::DRIVERS_VIEW,
    perm::DRIVERS_MANAGE,
    perm::INVOICES_VIEW,
    perm::INVOICES_MANAGE,
    perm::CATEGORIES_MANAGE,
    perm::USERS_MANAGE,
    perm::SETTINGS_MANAGE,
    perm::DELIVERIES_VIEW,
    perm::DELIVERIES_MANAGE,
    perm::DELIVERIES_ASSIGN,
];

const CASHIER_GRANTS: &[Permission] = &[
    perm::SALES_CREATE,
    perm::SALES_VIEW,
    perm::SALES_REFUND,
    perm::INVOICES_MANAGE,
    perm::INVOICES_VIEW,
    perm::CUSTOMERS_VIEW,
    perm::PRODUCTS_VIEW,
    perm::DELIVERIES_VIEW,
];

const STOCK_MANAGER_GRANTS: &[Permission] = &[
    perm::INVENTORY_VIEW,
    perm::INVENTORY_MANAGE,
    perm::INVENTORY_REPORT,
    perm::PRODUCTS_VIEW,
    perm::PRODUCTS_MANAGE,
    perm::SUPPLIERS_MANAGE,
];

const DELIVERY_DRIVER_GRANTS: &[Permission] = &[
    perm::DELIVERIES_VIEW_ASSIGNED,
    perm::DELIVERIES_UPDATE,
    perm::DELIVERIES_VIEW,
];

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Manager,
        Role::Cashier,
        Role::StockManager,
        Role::DeliveryDriver,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Manager => "MANAGER",
            Role::Cashier => "CASHIER",
            Role::StockManager => "STOCK_MANAGER",
            Role::DeliveryDriver => "DELIVERY_DRIVER",
        }
    }

    /// The static permission set of this role.
    pub fn grants(&self) -> &'static [Permission] {
        match self {
            Role::Admin => ADMIN_GRANTS,
            Role::Manager => MANAGER_GRANTS,
            Role::Cashier => CASHIER_GRANTS,
            Role::StockManager => STOCK_MANAGER_GRANTS,
            Role::DeliveryDriver => DELIVERY_DRIVER_GRANTS,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role '{}'", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// can_access
///
/// Decides whether `role` is authorized for `requested`. Fails closed when no role
/// is present.
pub fn can_access(role: Option<Role>, requested: &str) -> bool {
    match role {
        Some(role) => grants_permission(role.grants(), requested),
        None => false,
    }
}

/// grants_permission
///
/// Hierarchical wildcard matching of `requested` against a permission set:
/// 1. the set holds `"*"`;
/// 2. the set holds `requested` exactly;
/// 3. walking ancestors from most to least specific (`a.b.c` → `a.b` → `a`), the
///    set holds the ancestor itself or the ancestor suffixed with `.*`.
pub fn grants_permission(grants: &[Permission], requested: &str) -> bool {
    let holds = |name: &str| grants.iter().any(|p| p.as_str() == name);

    if holds(perm::ALL.as_str()) || holds(requested) {
        return true;
    }

    let mut ancestor = requested;
    while let Some((parent, _)) = ancestor.rsplit_once('.') {
        if holds(parent) || holds(&format!("{parent}.*")) {
            return true;
        }
        ancestor = parent;
    }

    false
}

/// Same as [`can_access`] for an untyped role name, as carried in a session token.
/// Unknown role names hold no permissions.
pub fn resolve(role_name: Option<&str>, requested: &str) -> bool {
    let role = role_name.and_then(|name| name.parse::<Role>().ok());
    can_access(role, requested)
}
