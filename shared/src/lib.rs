//! Shared types and domain logic for the ERP backend
//!
//! This crate holds everything that does not touch the database: the stock
//! ledger arithmetic, profit/loss aggregation, order status enumerations and
//! field validations used by the backend services.

pub mod ledger;
pub mod models;
pub mod types;
pub mod validation;

pub use ledger::*;
pub use models::*;
pub use types::*;
pub use validation::*;
