//! Stock ledger arithmetic
//!
//! Each function takes the item as read under a row lock and returns the stock
//! quantity to write back. Errors are returned before anything is written, so
//! a rejected operation never changes stock.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::models::{ProfitLoss, SaleLine};

/// Stock ledger errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Not enough stock for {item}. Available: {available}")]
    OutOfStock {
        item: String,
        available: i32,
        requested: i32,
    },

    #[error("Cannot remove {quantity} of {item}: only {available} on hand")]
    InsufficientStock {
        item: String,
        available: i32,
        quantity: i32,
    },

    #[error("Quantity cannot be negative: {0}")]
    NegativeQuantity(i32),

    #[error("Stock quantity for {0} is out of range")]
    Overflow(String),
}

/// An item's name, current price and on-hand quantity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockSnapshot {
    pub name: String,
    pub price: Decimal,
    pub on_hand: i32,
}

/// The persisted state of a sales line item before an edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviousSale {
    pub quantity: i32,
    pub cost_price: Decimal,
}

/// Outcome of committing a sales line item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleCommit {
    /// Stock to write back to the item
    pub on_hand: i32,
    /// Cost price to store on the line item
    pub cost_price: Decimal,
    /// Quantity taken from stock by this save (negative when an edit lowers it)
    pub diff: i32,
}

fn ensure_non_negative(quantity: i32) -> Result<(), LedgerError> {
    if quantity < 0 {
        return Err(LedgerError::NegativeQuantity(quantity));
    }
    Ok(())
}

fn apply_delta(item: &StockSnapshot, delta: i32) -> Result<i32, LedgerError> {
    let next = item
        .on_hand
        .checked_add(delta)
        .ok_or_else(|| LedgerError::Overflow(item.name.clone()))?;

    if next < 0 {
        return Err(LedgerError::InsufficientStock {
            item: item.name.clone(),
            available: item.on_hand,
            quantity: -delta,
        });
    }
    Ok(next)
}

/// Add a newly received purchase-order line to stock
pub fn receive(item: &StockSnapshot, quantity: i32) -> Result<i32, LedgerError> {
    ensure_non_negative(quantity)?;
    apply_delta(item, quantity)
}

/// Apply an edited purchase-order line quantity
pub fn revise_receipt(
    item: &StockSnapshot,
    previous_quantity: i32,
    quantity: i32,
) -> Result<i32, LedgerError> {
    ensure_non_negative(quantity)?;
    apply_delta(item, quantity - previous_quantity)
}

/// Take a deleted purchase-order line back out of stock
pub fn remove_receipt(item: &StockSnapshot, quantity: i32) -> Result<i32, LedgerError> {
    ensure_non_negative(quantity)?;
    apply_delta(item, -quantity)
}

/// Validate and apply a new or edited sales line item.
///
/// The requested quantity is checked against the current stock. A new line
/// freezes the item's current price as its cost price; an edit keeps the
/// previous cost price and only takes the difference from stock.
pub fn commit_sale(
    item: &StockSnapshot,
    previous: Option<&PreviousSale>,
    quantity: i32,
) -> Result<SaleCommit, LedgerError> {
    ensure_non_negative(quantity)?;

    if quantity > item.on_hand {
        return Err(LedgerError::OutOfStock {
            item: item.name.clone(),
            available: item.on_hand,
            requested: quantity,
        });
    }

    let (previous_quantity, cost_price) = match previous {
        Some(prev) => (prev.quantity, prev.cost_price),
        None => (0, item.price),
    };

    let diff = quantity - previous_quantity;
    let on_hand = item
        .on_hand
        .checked_sub(diff)
        .ok_or_else(|| LedgerError::Overflow(item.name.clone()))?;

    Ok(SaleCommit {
        on_hand,
        cost_price,
        diff,
    })
}

/// Return a deleted sales line item's quantity to stock
pub fn reverse_sale(item: &StockSnapshot, quantity: i32) -> Result<i32, LedgerError> {
    ensure_non_negative(quantity)?;
    apply_delta(item, quantity)
}

/// Aggregate profit and loss over the line items of one order
pub fn compute_profit_loss<'a, I>(lines: I) -> ProfitLoss
where
    I: IntoIterator<Item = &'a SaleLine>,
{
    lines.into_iter().fold(ProfitLoss::default(), |mut acc, line| {
        let profit = line.profit();
        if profit > Decimal::ZERO {
            acc.total_profit += profit;
        } else if profit < Decimal::ZERO {
            acc.total_loss += profit.abs();
        }
        acc.total_cost += line.total_cost_price();
        acc.total_revenue += line.total_selling_price();
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(on_hand: i32, price: Decimal) -> StockSnapshot {
        StockSnapshot {
            name: "Widget".to_string(),
            price,
            on_hand,
        }
    }

    fn dollars(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    #[test]
    fn test_receive_adds_quantity() {
        assert_eq!(receive(&item(4, dollars(500)), 6), Ok(10));
        assert_eq!(receive(&item(4, dollars(500)), 0), Ok(4));
    }

    #[test]
    fn test_receive_rejects_negative_quantity() {
        assert_eq!(
            receive(&item(4, dollars(500)), -1),
            Err(LedgerError::NegativeQuantity(-1))
        );
    }

    #[test]
    fn test_receive_overflow() {
        assert!(matches!(
            receive(&item(i32::MAX, dollars(500)), 1),
            Err(LedgerError::Overflow(_))
        ));
    }

    #[test]
    fn test_revise_receipt_applies_difference() {
        assert_eq!(revise_receipt(&item(10, dollars(500)), 4, 7), Ok(13));
        assert_eq!(revise_receipt(&item(10, dollars(500)), 7, 4), Ok(7));
    }

    #[test]
    fn test_revise_receipt_cannot_drive_stock_negative() {
        // 8 received, 6 sold since: lowering the receipt to 1 would leave -1
        let result = revise_receipt(&item(2, dollars(500)), 8, 1);
        assert_eq!(
            result,
            Err(LedgerError::InsufficientStock {
                item: "Widget".to_string(),
                available: 2,
                quantity: 7,
            })
        );
    }

    #[test]
    fn test_remove_receipt() {
        assert_eq!(remove_receipt(&item(10, dollars(500)), 10), Ok(0));
        assert!(matches!(
            remove_receipt(&item(3, dollars(500)), 5),
            Err(LedgerError::InsufficientStock { .. })
        ));
    }

    #[test]
    fn test_new_sale_freezes_current_price() {
        let commit = commit_sale(&item(10, dollars(500)), None, 3).unwrap();
        assert_eq!(commit.on_hand, 7);
        assert_eq!(commit.cost_price, dollars(500));
        assert_eq!(commit.diff, 3);
    }

    #[test]
    fn test_edit_keeps_cost_price_after_price_change() {
        let previous = PreviousSale {
            quantity: 3,
            cost_price: dollars(500),
        };
        // Item price has since moved to 9.00
        let commit = commit_sale(&item(7, dollars(900)), Some(&previous), 5).unwrap();
        assert_eq!(commit.on_hand, 5);
        assert_eq!(commit.cost_price, dollars(500));
        assert_eq!(commit.diff, 2);
    }

    #[test]
    fn test_edit_lowering_quantity_returns_stock() {
        let previous = PreviousSale {
            quantity: 5,
            cost_price: dollars(500),
        };
        let commit = commit_sale(&item(5, dollars(500)), Some(&previous), 1).unwrap();
        assert_eq!(commit.on_hand, 9);
        assert_eq!(commit.diff, -4);
    }

    #[test]
    fn test_sale_exceeding_stock_is_rejected() {
        let result = commit_sale(&item(2, dollars(500)), None, 3);
        assert_eq!(
            result,
            Err(LedgerError::OutOfStock {
                item: "Widget".to_string(),
                available: 2,
                requested: 3,
            })
        );
    }

    #[test]
    fn test_out_of_stock_message() {
        let err = commit_sale(&item(2, dollars(500)), None, 3).unwrap_err();
        assert_eq!(err.to_string(), "Not enough stock for Widget. Available: 2");
    }

    #[test]
    fn test_edit_checks_new_quantity_against_current_stock() {
        // 3 already sold, 7 left: raising to 8 is rejected even though only 5 more are taken
        let previous = PreviousSale {
            quantity: 3,
            cost_price: dollars(500),
        };
        assert!(matches!(
            commit_sale(&item(7, dollars(500)), Some(&previous), 8),
            Err(LedgerError::OutOfStock { .. })
        ));
    }

    #[test]
    fn test_selling_entire_stock() {
        let commit = commit_sale(&item(4, dollars(500)), None, 4).unwrap();
        assert_eq!(commit.on_hand, 0);
    }

    #[test]
    fn test_reverse_sale() {
        assert_eq!(reverse_sale(&item(5, dollars(500)), 5), Ok(10));
    }

    #[test]
    fn test_worked_example() {
        let widget = item(10, dollars(500));
        let created = commit_sale(&widget, None, 3).unwrap();
        assert_eq!(created.on_hand, 7);
        assert_eq!(created.cost_price, dollars(500));

        let line = SaleLine::new(3, dollars(700), created.cost_price);
        assert_eq!(compute_profit_loss([&line]).total_profit, dollars(600));

        let previous = PreviousSale {
            quantity: 3,
            cost_price: created.cost_price,
        };
        let edited = commit_sale(&item(created.on_hand, dollars(500)), Some(&previous), 5).unwrap();
        assert_eq!(edited.on_hand, 5);

        let restored = reverse_sale(&item(edited.on_hand, dollars(500)), 5).unwrap();
        assert_eq!(restored, 10);
    }

    #[test]
    fn test_profit_loss_partitions_lines() {
        let lines = vec![
            SaleLine::new(3, dollars(700), dollars(500)), // +6.00
            SaleLine::new(2, dollars(400), dollars(500)), // -2.00
            SaleLine::new(1, dollars(500), dollars(500)), // 0
        ];
        let pl = compute_profit_loss(&lines);
        assert_eq!(pl.total_profit, dollars(600));
        assert_eq!(pl.total_loss, dollars(200));
        assert_eq!(pl.total_cost, dollars(2500));
        assert_eq!(pl.total_revenue, dollars(2800));
        assert_eq!(pl.total_profit - pl.total_loss, dollars(400));
    }

    #[test]
    fn test_profit_loss_of_empty_order() {
        let pl = compute_profit_loss(&Vec::<SaleLine>::new());
        assert_eq!(pl, ProfitLoss::default());
    }
}
