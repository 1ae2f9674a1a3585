//! Stock ledger persistence
//!
//! Every function runs on a connection inside the caller's transaction, next
//! to the write that triggers it. The item row is locked with `FOR UPDATE`
//! before it is read, so concurrent receipts and sales of the same item are
//! serialized and the arithmetic in `shared::ledger` always sees the latest
//! stock.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use shared::ledger::{self, LedgerError, PreviousSale, SaleCommit, StockSnapshot};
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// An item reference and quantity taken from a line item
#[derive(Debug, Clone, Copy, FromRow)]
pub struct StockLine {
    pub item_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, FromRow)]
struct LockedItemRow {
    name: String,
    price: Decimal,
    stock_quantity: i32,
}

/// Lock an item row for the rest of the transaction and read its stock
pub async fn lock_item(conn: &mut PgConnection, item_id: Uuid) -> AppResult<StockSnapshot> {
    let row = sqlx::query_as::<_, LockedItemRow>(
        "SELECT name, price, stock_quantity FROM items WHERE id = $1 FOR UPDATE",
    )
    .bind(item_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound("Item".to_string()))?;

    Ok(StockSnapshot {
        name: row.name,
        price: row.price,
        on_hand: row.stock_quantity,
    })
}

async fn write_on_hand(conn: &mut PgConnection, item_id: Uuid, on_hand: i32) -> AppResult<()> {
    sqlx::query("UPDATE items SET stock_quantity = $1, updated_at = NOW() WHERE id = $2")
        .bind(on_hand)
        .bind(item_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Add a new purchase-order line to its item's stock
pub async fn receive_stock(conn: &mut PgConnection, item_id: Uuid, quantity: i32) -> AppResult<i32> {
    let item = lock_item(conn, item_id).await?;
    let on_hand = ledger::receive(&item, quantity)?;
    write_on_hand(conn, item_id, on_hand).await?;

    tracing::info!(%item_id, quantity, on_hand, "Stock received");
    Ok(on_hand)
}

/// Apply an edited purchase-order line quantity
pub async fn revise_receipt(
    conn: &mut PgConnection,
    item_id: Uuid,
    previous_quantity: i32,
    quantity: i32,
) -> AppResult<i32> {
    let item = lock_item(conn, item_id).await?;
    let on_hand = ledger::revise_receipt(&item, previous_quantity, quantity)?;
    write_on_hand(conn, item_id, on_hand).await?;

    tracing::info!(%item_id, previous_quantity, quantity, on_hand, "Receipt revised");
    Ok(on_hand)
}

/// Take a deleted purchase-order line back out of stock
pub async fn remove_receipt(conn: &mut PgConnection, item_id: Uuid, quantity: i32) -> AppResult<i32> {
    let item = lock_item(conn, item_id).await?;
    let on_hand = ledger::remove_receipt(&item, quantity)?;
    write_on_hand(conn, item_id, on_hand).await?;

    tracing::info!(%item_id, quantity, on_hand, "Receipt removed");
    Ok(on_hand)
}

fn in_lock_order(a: Uuid, b: Uuid) -> [Uuid; 2] {
    if a <= b {
        [a, b]
    } else {
        [b, a]
    }
}

/// Move a purchase-order line from one item to another.
///
/// Both items are locked in id order before either is changed, so two
/// crossing moves cannot deadlock.
pub async fn move_receipt(
    conn: &mut PgConnection,
    from_item: Uuid,
    from_quantity: i32,
    to_item: Uuid,
    to_quantity: i32,
) -> AppResult<()> {
    for item_id in in_lock_order(from_item, to_item) {
        lock_item(conn, item_id).await?;
    }

    remove_receipt(conn, from_item, from_quantity).await?;
    receive_stock(conn, to_item, to_quantity).await?;
    Ok(())
}

/// Validate and apply a new (`previous = None`) or edited sales line item
pub async fn commit_sale(
    conn: &mut PgConnection,
    item_id: Uuid,
    previous: Option<PreviousSale>,
    quantity: i32,
) -> AppResult<SaleCommit> {
    let item = lock_item(conn, item_id).await?;
    let commit = match ledger::commit_sale(&item, previous.as_ref(), quantity) {
        Ok(commit) => commit,
        Err(err) => {
            tracing::warn!(%item_id, quantity, available = item.on_hand, "Sale rejected: {}", err);
            return Err(err.into());
        }
    };
    write_on_hand(conn, item_id, commit.on_hand).await?;

    tracing::info!(%item_id, quantity, diff = commit.diff, on_hand = commit.on_hand, "Sale committed");
    Ok(commit)
}

/// Return a deleted sales line item's quantity to stock
pub async fn reverse_sale(conn: &mut PgConnection, item_id: Uuid, quantity: i32) -> AppResult<i32> {
    let item = lock_item(conn, item_id).await?;
    let on_hand = ledger::reverse_sale(&item, quantity)?;
    write_on_hand(conn, item_id, on_hand).await?;

    tracing::info!(%item_id, quantity, on_hand, "Sale reversed");
    Ok(on_hand)
}

/// Sum quantities per item, ordered by item id.
///
/// Locking items in a fixed order keeps two bulk reversals from deadlocking.
fn totals_by_item(lines: &[StockLine]) -> Result<BTreeMap<Uuid, i32>, LedgerError> {
    let mut totals = BTreeMap::new();
    for line in lines {
        let total = totals.entry(line.item_id).or_insert(0i32);
        *total = total
            .checked_add(line.quantity)
            .ok_or_else(|| LedgerError::Overflow(line.item_id.to_string()))?;
    }
    Ok(totals)
}

/// Return the quantities of many deleted sales lines to stock
pub async fn reverse_sales(conn: &mut PgConnection, lines: &[StockLine]) -> AppResult<()> {
    for (item_id, quantity) in totals_by_item(lines)? {
        reverse_sale(conn, item_id, quantity).await?;
    }
    Ok(())
}

/// Take the quantities of many deleted purchase-order lines out of stock
pub async fn remove_receipts(conn: &mut PgConnection, lines: &[StockLine]) -> AppResult<()> {
    for (item_id, quantity) in totals_by_item(lines)? {
        remove_receipt(conn, item_id, quantity).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals_by_item_merges_and_orders() {
        let a = Uuid::from_u128(2);
        let b = Uuid::from_u128(1);
        let lines = [
            StockLine { item_id: a, quantity: 3 },
            StockLine { item_id: b, quantity: 4 },
            StockLine { item_id: a, quantity: 5 },
        ];

        let totals: Vec<(Uuid, i32)> = totals_by_item(&lines).unwrap().into_iter().collect();
        assert_eq!(totals, vec![(b, 4), (a, 8)]);
    }

    #[test]
    fn test_crossing_moves_lock_in_the_same_order() {
        let low = Uuid::from_u128(1);
        let high = Uuid::from_u128(9);
        assert_eq!(in_lock_order(low, high), [low, high]);
        assert_eq!(in_lock_order(high, low), [low, high]);
    }

    #[test]
    fn test_totals_by_item_empty() {
        assert!(totals_by_item(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_totals_by_item_overflow_is_an_error() {
        let item_id = Uuid::from_u128(7);
        let lines = [
            StockLine { item_id, quantity: i32::MAX },
            StockLine { item_id, quantity: 1 },
        ];

        assert_eq!(
            totals_by_item(&lines),
            Err(LedgerError::Overflow(item_id.to_string()))
        );
    }
}
