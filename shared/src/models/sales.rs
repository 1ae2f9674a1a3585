//! Sales models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Amounts of one sales line item used for profit/loss
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLine {
    pub quantity: i32,
    /// Selling price per unit
    pub unit_price: Decimal,
    /// Item price frozen when the line was first saved
    pub cost_price: Decimal,
}

impl SaleLine {
    pub fn new(quantity: i32, unit_price: Decimal, cost_price: Decimal) -> Self {
        Self {
            quantity,
            unit_price,
            cost_price,
        }
    }

    pub fn total_selling_price(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    pub fn total_cost_price(&self) -> Decimal {
        self.cost_price * Decimal::from(self.quantity)
    }

    /// Selling revenue minus cost revenue; negative for a loss
    pub fn profit(&self) -> Decimal {
        self.total_selling_price() - self.total_cost_price()
    }
}

/// Profit and loss aggregated over the line items of a sales order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitLoss {
    /// Sum of the positive line profits
    pub total_profit: Decimal,
    /// Sum of the absolute values of the negative line profits
    pub total_loss: Decimal,
    pub total_cost: Decimal,
    pub total_revenue: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_profit() {
        let line = SaleLine::new(3, Decimal::new(700, 2), Decimal::new(500, 2));
        assert_eq!(line.total_selling_price(), Decimal::new(2100, 2));
        assert_eq!(line.total_cost_price(), Decimal::new(1500, 2));
        assert_eq!(line.profit(), Decimal::new(600, 2));
    }

    #[test]
    fn test_line_loss_is_negative_profit() {
        let line = SaleLine::new(2, Decimal::new(400, 2), Decimal::new(500, 2));
        assert_eq!(line.profit(), Decimal::new(-200, 2));
    }

    #[test]
    fn test_zero_quantity_line() {
        let line = SaleLine::new(0, Decimal::new(700, 2), Decimal::new(500, 2));
        assert_eq!(line.profit(), Decimal::ZERO);
        assert_eq!(line.total_cost_price(), Decimal::ZERO);
    }
}
