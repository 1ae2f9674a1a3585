//! Procurement models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Status of a purchase order.
///
/// Stored only. Transitions are made by an administrator and have no side
/// effects on stock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseOrderStatus {
    #[default]
    Pending,
    Approved,
    Received,
    Cancelled,
}

impl PurchaseOrderStatus {
    pub const ALL: [PurchaseOrderStatus; 4] = [
        PurchaseOrderStatus::Pending,
        PurchaseOrderStatus::Approved,
        PurchaseOrderStatus::Received,
        PurchaseOrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseOrderStatus::Pending => "pending",
            PurchaseOrderStatus::Approved => "approved",
            PurchaseOrderStatus::Received => "received",
            PurchaseOrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for PurchaseOrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PurchaseOrderStatus::Pending => write!(f, "Pending"),
            PurchaseOrderStatus::Approved => write!(f, "Approved"),
            PurchaseOrderStatus::Received => write!(f, "Received"),
            PurchaseOrderStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for PurchaseOrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PurchaseOrderStatus::Pending),
            "approved" => Ok(PurchaseOrderStatus::Approved),
            "received" => Ok(PurchaseOrderStatus::Received),
            "cancelled" => Ok(PurchaseOrderStatus::Cancelled),
            other => Err(format!("unknown purchase order status: {}", other)),
        }
    }
}

/// Value of a purchase-order line (quantity received at a rate)
pub fn purchase_line_total(quantity: i32, rate: Decimal) -> Decimal {
    rate * Decimal::from(quantity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in PurchaseOrderStatus::ALL {
            assert_eq!(status.as_str().parse::<PurchaseOrderStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_unknown_status_rejected() {
        assert!("shipped".parse::<PurchaseOrderStatus>().is_err());
        assert!("Pending".parse::<PurchaseOrderStatus>().is_err());
    }

    #[test]
    fn test_default_status_is_pending() {
        assert_eq!(PurchaseOrderStatus::default(), PurchaseOrderStatus::Pending);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&PurchaseOrderStatus::Cancelled).unwrap();
        assert_eq!(json, "\"cancelled\"");
    }

    #[test]
    fn test_purchase_line_total() {
        assert_eq!(
            purchase_line_total(4, Decimal::new(1250, 2)),
            Decimal::new(5000, 2)
        );
    }
}
