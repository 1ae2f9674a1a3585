//! Admin index

use axum::Json;
use serde::Serialize;

use crate::middleware::CurrentUser;

#[derive(Debug, Serialize)]
pub struct AdminResource {
    pub name: &'static str,
    pub path: &'static str,
}

#[derive(Debug, Serialize)]
pub struct AdminSection {
    pub name: &'static str,
    pub resources: Vec<AdminResource>,
}

#[derive(Debug, Serialize)]
pub struct AdminIndex {
    pub username: String,
    pub is_superuser: bool,
    pub sections: Vec<AdminSection>,
}

macro_rules! section {
    ($name:expr, [$(($label:expr, $path:expr)),* $(,)?]) => {
        AdminSection {
            name: $name,
            resources: vec![$(AdminResource { name: $label, path: $path }),*],
        }
    };
}

fn registered_sections() -> Vec<AdminSection> {
    vec![
        section!("Catalog", [
            ("Locations", "/admin/locations"),
            ("Vendors", "/admin/vendors"),
            ("Items", "/admin/items"),
        ]),
        section!("Procurement", [
            ("Purchase orders", "/admin/purchase-orders"),
            ("Purchase order lines", "/admin/purchase-order-lines"),
        ]),
        section!("Planning", [
            ("Component demands", "/admin/component-demands"),
            ("Consumption outputs", "/admin/consumption-outputs"),
            ("Inventory reconciliations", "/admin/inventory-reconciliations"),
        ]),
        section!("Sales", [
            ("Customers", "/admin/customers"),
            ("Sales orders", "/admin/sales-orders"),
            ("Sales order items", "/admin/sales-order-items"),
        ]),
        section!("Fulfillment", [
            ("Shipments", "/admin/shipments"),
            ("Invoices", "/admin/invoices"),
        ]),
    ]
}

/// List the registered admin resources
pub async fn admin_index(CurrentUser(user): CurrentUser) -> Json<AdminIndex> {
    Json(AdminIndex {
        username: user.username,
        is_superuser: user.is_superuser,
        sections: registered_sections(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_resource_is_under_admin() {
        let sections = registered_sections();
        let count: usize = sections.iter().map(|s| s.resources.len()).sum();
        assert_eq!(count, 13);
        for resource in sections.iter().flat_map(|s| &s.resources) {
            assert!(resource.path.starts_with("/admin/"));
            assert!(!resource.path.ends_with('/'));
        }
    }
}
