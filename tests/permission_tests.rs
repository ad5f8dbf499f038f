use pos_portal::permissions::{
    Permission, Role, can_access, grants_permission, perm, resolve,
};

#[test]
fn test_admin_wildcard_grants_everything() {
    for requested in ["users.manage", "sales.refund", "anything.at.all", "x"] {
        assert!(can_access(Some(Role::Admin), requested), "{requested}");
    }
}

#[test]
fn test_missing_role_is_denied() {
    assert!(!can_access(None, "sales.view"));
    assert!(!resolve(None, "sales.view"));
}

#[test]
fn test_unknown_role_name_is_denied() {
    assert!(!resolve(Some("SUPERUSER"), "sales.view"));
    // Role names are case-sensitive.
    assert!(!resolve(Some("admin"), "sales.view"));
}

#[test]
fn test_cashier_can_sell_but_not_manage_users() {
    assert!(resolve(Some("CASHIER"), "sales.create"));
    assert!(resolve(Some("CASHIER"), "sales.refund"));
    assert!(!resolve(Some("CASHIER"), "users.manage"));
    assert!(!resolve(Some("CASHIER"), "products.manage"));
}

#[test]
fn test_delivery_driver_permissions() {
    let driver = Some(Role::DeliveryDriver);
    assert!(can_access(driver, "deliveries.view"));
    assert!(can_access(driver, "deliveries.update"));
    assert!(!can_access(driver, "deliveries.manage"));
    assert!(!can_access(driver, "settings.manage"));
}

#[test]
fn test_ancestor_grant_covers_descendants() {
    // DELIVERY_DRIVER holds `deliveries.view`, an ancestor of this request.
    assert!(can_access(Some(Role::DeliveryDriver), "deliveries.view.assigned.today"));

    const SET: &[Permission] = &[Permission::new("reports")];
    assert!(grants_permission(SET, "reports.view"));
    assert!(grants_permission(SET, "reports.export.csv"));
    assert!(!grants_permission(SET, "sales.report"));
}

#[test]
fn test_ancestor_wildcard_grant_covers_descendants() {
    const SET: &[Permission] = &[Permission::new("inventory.*")];
    assert!(grants_permission(SET, "inventory.view"));
    assert!(grants_permission(SET, "inventory.report.monthly"));
    // The wildcard covers children, not unrelated prefixes.
    assert!(!grants_permission(SET, "inventoryx.view"));
}

#[test]
fn test_more_specific_grant_does_not_cover_parent() {
    const SET: &[Permission] = &[Permission::new("sales.view")];
    assert!(!grants_permission(SET, "sales"));
    assert!(!grants_permission(SET, "sales.create"));
}

#[test]
fn test_empty_set_grants_nothing() {
    assert!(!grants_permission(&[], "sales.view"));
    assert!(grants_permission(&[perm::ALL], ""));
}

#[test]
fn test_role_round_trip_and_display() {
    for role in Role::ALL {
        assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        assert_eq!(role.to_string(), role.as_str());
    }
    assert!("GUEST".parse::<Role>().is_err());
}

#[test]
fn test_every_role_but_admin_lacks_wildcard() {
    for role in Role::ALL.into_iter().filter(|r| *r != Role::Admin) {
        assert!(
            !role.grants().contains(&perm::ALL),
            "{role} must not hold the wildcard"
        );
    }
}
