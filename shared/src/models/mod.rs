//! Domain models shared between the backend services and tests

mod planning;
mod procurement;
mod sales;

pub use planning::*;
pub use procurement::*;
pub use sales::*;
