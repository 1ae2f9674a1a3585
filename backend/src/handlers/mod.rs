//! HTTP request handlers

pub mod admin;
pub mod auth;
pub mod catalog;
pub mod fulfillment;
pub mod health;
pub mod planning;
pub mod procurement;
pub mod sales;

pub use admin::*;
pub use auth::*;
pub use catalog::*;
pub use fulfillment::*;
pub use health::*;
pub use planning::*;
pub use procurement::*;
pub use sales::*;
