//! Business logic services for the ERP backend

pub mod auth;
pub mod catalog;
pub mod fulfillment;
pub mod planning;
pub mod procurement;
pub mod sales;
pub mod stock;

pub use auth::AuthService;
pub use catalog::CatalogService;
pub use fulfillment::FulfillmentService;
pub use planning::PlanningService;
pub use procurement::ProcurementService;
pub use sales::SalesService;

#[cfg(test)]
mod stock_flow_tests;
