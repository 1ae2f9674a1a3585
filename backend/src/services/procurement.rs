//! Procurement service for purchase orders and received line items
//!
//! Writing a purchase-order line moves the item's stock in the same
//! transaction: creation receives the quantity, an edit applies the
//! difference, and deletion (of the line or of anything that cascades to it)
//! takes the quantity back out.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{purchase_line_total, PurchaseOrderStatus};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::stock::{self, StockLine};

/// Procurement service for managing purchase orders
#[derive(Clone)]
pub struct ProcurementService {
    db: PgPool,
}

/// A purchase order placed with a vendor
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseOrder {
    pub id: Uuid,
    pub order_number: String,
    pub vendor_id: Uuid,
    pub order_date: NaiveDate,
    pub delivery_date: Option<NaiveDate>,
    pub status: PurchaseOrderStatus,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct PurchaseOrderRow {
    id: Uuid,
    order_number: String,
    vendor_id: Uuid,
    order_date: NaiveDate,
    delivery_date: Option<NaiveDate>,
    status: String,
    total_amount: Decimal,
    created_at: DateTime<Utc>,
}

impl From<PurchaseOrderRow> for PurchaseOrder {
    fn from(row: PurchaseOrderRow) -> Self {
        Self {
            id: row.id,
            order_number: row.order_number,
            vendor_id: row.vendor_id,
            order_date: row.order_date,
            delivery_date: row.delivery_date,
            // The status column is CHECK-constrained to known values
            status: row.status.parse().unwrap_or_default(),
            total_amount: row.total_amount,
            created_at: row.created_at,
        }
    }
}

/// A purchase-order line item: a quantity of an item received at a rate
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PurchaseOrderLine {
    pub id: Uuid,
    pub purchase_order_id: Uuid,
    pub item_id: Uuid,
    pub quantity: i32,
    pub rate: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Line with the item name and value, for the order detail view
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseOrderLineView {
    #[serde(flatten)]
    pub line: PurchaseOrderLine,
    pub item_name: String,
    pub line_total: Decimal,
}

#[derive(Debug, FromRow)]
struct LineWithItemRow {
    id: Uuid,
    purchase_order_id: Uuid,
    item_id: Uuid,
    quantity: i32,
    rate: Decimal,
    created_at: DateTime<Utc>,
    item_name: String,
}

/// Purchase order with its line items
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseOrderDetail {
    #[serde(flatten)]
    pub order: PurchaseOrder,
    pub lines: Vec<PurchaseOrderLineView>,
    /// Sum of quantity × rate over the lines
    pub lines_total: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePurchaseOrderInput {
    pub order_number: String,
    pub vendor_id: Uuid,
    pub order_date: NaiveDate,
    pub delivery_date: Option<NaiveDate>,
    pub status: Option<PurchaseOrderStatus>,
    pub total_amount: Option<Decimal>,
    /// Lines received together with the order
    #[validate]
    #[serde(default)]
    pub lines: Vec<OrderLineInput>,
}

/// A line given inline when creating a purchase order
#[derive(Debug, Deserialize, Validate)]
pub struct OrderLineInput {
    pub item_id: Uuid,
    #[validate(range(min = 0))]
    pub quantity: i32,
    pub rate: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePurchaseOrderInput {
    pub order_number: Option<String>,
    pub vendor_id: Option<Uuid>,
    pub order_date: Option<NaiveDate>,
    pub delivery_date: Option<NaiveDate>,
    pub status: Option<PurchaseOrderStatus>,
    pub total_amount: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePurchaseOrderLineInput {
    pub purchase_order_id: Uuid,
    pub item_id: Uuid,
    #[validate(range(min = 0))]
    pub quantity: i32,
    pub rate: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePurchaseOrderLineInput {
    pub item_id: Option<Uuid>,
    #[validate(range(min = 0))]
    pub quantity: Option<i32>,
    pub rate: Option<Decimal>,
}

/// Filter for listing purchase-order lines
#[derive(Debug, Default, Deserialize)]
pub struct PurchaseOrderLineFilter {
    pub purchase_order_id: Option<Uuid>,
    pub item_id: Option<Uuid>,
}

const ORDER_COLUMNS: &str =
    "id, order_number, vendor_id, order_date, delivery_date, status, total_amount, created_at";
const LINE_COLUMNS: &str = "id, purchase_order_id, item_id, quantity, rate, created_at";

fn check_order_number(order_number: Option<&str>) -> AppResult<()> {
    if let Some(number) = order_number {
        shared::validate_order_number(number).map_err(|m| AppError::invalid("order_number", m))?;
    }
    Ok(())
}

fn check_total(total: Option<Decimal>) -> AppResult<()> {
    if let Some(total) = total {
        shared::validate_total(total).map_err(|m| AppError::invalid("total_amount", m))?;
    }
    Ok(())
}

fn check_rate(rate: Option<Decimal>) -> AppResult<()> {
    if let Some(rate) = rate {
        shared::validate_price(rate).map_err(|m| AppError::invalid("rate", m))?;
    }
    Ok(())
}

fn check_dates(order_date: NaiveDate, delivery_date: Option<NaiveDate>) -> AppResult<()> {
    if let Some(delivery) = delivery_date {
        if delivery < order_date {
            return Err(AppError::invalid(
                "delivery_date",
                "Delivery date cannot be before the order date",
            ));
        }
    }
    Ok(())
}

/// Insert a line and receive its quantity, inside the caller's transaction
async fn insert_line(
    conn: &mut PgConnection,
    purchase_order_id: Uuid,
    item_id: Uuid,
    quantity: i32,
    rate: Decimal,
) -> AppResult<PurchaseOrderLine> {
    // Hold the order so a concurrent delete cannot cascade this line unreversed
    sqlx::query_scalar::<_, Uuid>("SELECT id FROM purchase_orders WHERE id = $1 FOR KEY SHARE")
        .bind(purchase_order_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| {
            AppError::InvalidReference("purchase_order_lines_purchase_order_id_fkey".to_string())
        })?;

    let line = sqlx::query_as::<_, PurchaseOrderLine>(&format!(
        r#"
        INSERT INTO purchase_order_lines (purchase_order_id, item_id, quantity, rate)
        VALUES ($1, $2, $3, $4)
        RETURNING {}
        "#,
        LINE_COLUMNS
    ))
    .bind(purchase_order_id)
    .bind(item_id)
    .bind(quantity)
    .bind(rate)
    .fetch_one(&mut *conn)
    .await?;

    stock::receive_stock(conn, item_id, quantity).await?;
    Ok(line)
}

impl ProcurementService {
    /// Create a new ProcurementService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    // ========================================================================
    // Purchase orders
    // ========================================================================

    /// List purchase orders, newest first, optionally by status
    pub async fn list_purchase_orders(
        &self,
        status: Option<PurchaseOrderStatus>,
    ) -> AppResult<Vec<PurchaseOrder>> {
        let rows = sqlx::query_as::<_, PurchaseOrderRow>(&format!(
            r#"
            SELECT {}
            FROM purchase_orders
            WHERE ($1::TEXT IS NULL OR status = $1)
            ORDER BY order_date DESC, created_at DESC
            "#,
            ORDER_COLUMNS
        ))
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(PurchaseOrder::from).collect())
    }

    async fn fetch_order(&self, order_id: Uuid) -> AppResult<PurchaseOrder> {
        let row = sqlx::query_as::<_, PurchaseOrderRow>(&format!(
            "SELECT {} FROM purchase_orders WHERE id = $1",
            ORDER_COLUMNS
        ))
        .bind(order_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase order".to_string()))?;

        Ok(row.into())
    }

    /// Get a purchase order with its lines
    pub async fn get_purchase_order(&self, order_id: Uuid) -> AppResult<PurchaseOrderDetail> {
        let order = self.fetch_order(order_id).await?;

        let rows = sqlx::query_as::<_, LineWithItemRow>(
            r#"
            SELECT l.id, l.purchase_order_id, l.item_id, l.quantity, l.rate, l.created_at,
                   i.name AS item_name
            FROM purchase_order_lines l
            JOIN items i ON i.id = l.item_id
            WHERE l.purchase_order_id = $1
            ORDER BY l.created_at
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.db)
        .await?;

        let lines: Vec<PurchaseOrderLineView> = rows
            .into_iter()
            .map(|r| PurchaseOrderLineView {
                line_total: purchase_line_total(r.quantity, r.rate),
                item_name: r.item_name,
                line: PurchaseOrderLine {
                    id: r.id,
                    purchase_order_id: r.purchase_order_id,
                    item_id: r.item_id,
                    quantity: r.quantity,
                    rate: r.rate,
                    created_at: r.created_at,
                },
            })
            .collect();

        let lines_total = lines.iter().map(|l| l.line_total).sum();

        Ok(PurchaseOrderDetail {
            order,
            lines,
            lines_total,
        })
    }

    /// Create a purchase order and receive any inline lines
    pub async fn create_purchase_order(
        &self,
        input: CreatePurchaseOrderInput,
    ) -> AppResult<PurchaseOrderDetail> {
        input.validate()?;
        check_order_number(Some(&input.order_number))?;
        check_total(input.total_amount)?;
        check_dates(input.order_date, input.delivery_date)?;
        for line in &input.lines {
            check_rate(Some(line.rate))?;
        }

        let status = input.status.unwrap_or_default();
        let mut tx = self.db.begin().await?;

        let order_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO purchase_orders (order_number, vendor_id, order_date, delivery_date, status, total_amount)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&input.order_number)
        .bind(input.vendor_id)
        .bind(input.order_date)
        .bind(input.delivery_date)
        .bind(status.as_str())
        .bind(input.total_amount.unwrap_or(Decimal::ZERO))
        .fetch_one(&mut *tx)
        .await?;

        for line in &input.lines {
            insert_line(&mut tx, order_id, line.item_id, line.quantity, line.rate).await?;
        }

        tx.commit().await?;

        tracing::info!(
            %order_id,
            order_number = %input.order_number,
            lines = input.lines.len(),
            "Purchase order created"
        );
        self.get_purchase_order(order_id).await
    }

    /// Update purchase order fields. Status changes have no stock effect.
    pub async fn update_purchase_order(
        &self,
        order_id: Uuid,
        input: UpdatePurchaseOrderInput,
    ) -> AppResult<PurchaseOrder> {
        check_order_number(input.order_number.as_deref())?;
        check_total(input.total_amount)?;

        let existing = self.fetch_order(order_id).await?;
        let order_date = input.order_date.unwrap_or(existing.order_date);
        let delivery_date = input.delivery_date.or(existing.delivery_date);
        check_dates(order_date, delivery_date)?;

        let row = sqlx::query_as::<_, PurchaseOrderRow>(&format!(
            r#"
            UPDATE purchase_orders
            SET order_number = COALESCE($1, order_number),
                vendor_id = COALESCE($2, vendor_id),
                order_date = $3,
                delivery_date = $4,
                status = COALESCE($5, status),
                total_amount = COALESCE($6, total_amount)
            WHERE id = $7
            RETURNING {}
            "#,
            ORDER_COLUMNS
        ))
        .bind(&input.order_number)
        .bind(input.vendor_id)
        .bind(order_date)
        .bind(delivery_date)
        .bind(input.status.map(|s| s.as_str()))
        .bind(input.total_amount)
        .bind(order_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase order".to_string()))?;

        let order = PurchaseOrder::from(row);
        if order.status != existing.status {
            tracing::info!(
                %order_id,
                from = %existing.status,
                to = %order.status,
                "Purchase order status changed"
            );
        }
        Ok(order)
    }

    /// Delete a purchase order, taking its received lines back out of stock
    pub async fn delete_purchase_order(&self, order_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        sqlx::query_scalar::<_, Uuid>("SELECT id FROM purchase_orders WHERE id = $1 FOR UPDATE")
            .bind(order_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Purchase order".to_string()))?;

        let lines = sqlx::query_as::<_, StockLine>(
            r#"
            SELECT item_id, quantity
            FROM purchase_order_lines
            WHERE purchase_order_id = $1
            ORDER BY id
            FOR UPDATE
            "#,
        )
        .bind(order_id)
        .fetch_all(&mut *tx)
        .await?;

        stock::remove_receipts(&mut tx, &lines).await?;

        let result = sqlx::query("DELETE FROM purchase_orders WHERE id = $1")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Purchase order".to_string()));
        }

        tx.commit().await?;
        tracing::info!(%order_id, lines = lines.len(), "Purchase order deleted");
        Ok(())
    }

    // ========================================================================
    // Purchase-order lines
    // ========================================================================

    pub async fn list_lines(
        &self,
        filter: PurchaseOrderLineFilter,
    ) -> AppResult<Vec<PurchaseOrderLine>> {
        let lines = sqlx::query_as::<_, PurchaseOrderLine>(&format!(
            r#"
            SELECT {}
            FROM purchase_order_lines
            WHERE ($1::UUID IS NULL OR purchase_order_id = $1)
              AND ($2::UUID IS NULL OR item_id = $2)
            ORDER BY created_at DESC
            "#,
            LINE_COLUMNS
        ))
        .bind(filter.purchase_order_id)
        .bind(filter.item_id)
        .fetch_all(&self.db)
        .await?;
        Ok(lines)
    }

    pub async fn get_line(&self, line_id: Uuid) -> AppResult<PurchaseOrderLine> {
        sqlx::query_as::<_, PurchaseOrderLine>(&format!(
            "SELECT {} FROM purchase_order_lines WHERE id = $1",
            LINE_COLUMNS
        ))
        .bind(line_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase order line".to_string()))
    }

    /// Record a received line and add its quantity to stock
    pub async fn create_line(
        &self,
        input: CreatePurchaseOrderLineInput,
    ) -> AppResult<PurchaseOrderLine> {
        input.validate()?;
        check_rate(Some(input.rate))?;

        let mut tx = self.db.begin().await?;
        let line = insert_line(
            &mut tx,
            input.purchase_order_id,
            input.item_id,
            input.quantity,
            input.rate,
        )
        .await?;
        tx.commit().await?;

        Ok(line)
    }

    /// Edit a line, moving stock by the change in quantity.
    ///
    /// Moving the line to another item takes the old quantity out of the old
    /// item and receives the new quantity on the new one.
    pub async fn update_line(
        &self,
        line_id: Uuid,
        input: UpdatePurchaseOrderLineInput,
    ) -> AppResult<PurchaseOrderLine> {
        input.validate()?;
        check_rate(input.rate)?;

        let mut tx = self.db.begin().await?;

        let previous = sqlx::query_as::<_, PurchaseOrderLine>(&format!(
            "SELECT {} FROM purchase_order_lines WHERE id = $1 FOR UPDATE",
            LINE_COLUMNS
        ))
        .bind(line_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase order line".to_string()))?;

        let item_id = input.item_id.unwrap_or(previous.item_id);
        let quantity = input.quantity.unwrap_or(previous.quantity);

        if item_id == previous.item_id {
            stock::revise_receipt(&mut tx, item_id, previous.quantity, quantity).await?;
        } else {
            stock::move_receipt(&mut tx, previous.item_id, previous.quantity, item_id, quantity)
                .await?;
        }

        let line = sqlx::query_as::<_, PurchaseOrderLine>(&format!(
            r#"
            UPDATE purchase_order_lines
            SET item_id = $1, quantity = $2, rate = COALESCE($3, rate)
            WHERE id = $4
            RETURNING {}
            "#,
            LINE_COLUMNS
        ))
        .bind(item_id)
        .bind(quantity)
        .bind(input.rate)
        .bind(line_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(line)
    }

    /// Delete a line and take its quantity back out of stock
    pub async fn delete_line(&self, line_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let removed = sqlx::query_as::<_, StockLine>(
            "DELETE FROM purchase_order_lines WHERE id = $1 RETURNING item_id, quantity",
        )
        .bind(line_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase order line".to_string()))?;

        stock::remove_receipt(&mut tx, removed.item_id, removed.quantity).await?;

        tx.commit().await?;
        tracing::info!(%line_id, "Purchase order line deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_before_order_date_rejected() {
        let order = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let early = NaiveDate::from_ymd_opt(2024, 5, 9).unwrap();
        let late = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();

        assert!(check_dates(order, Some(early)).is_err());
        assert!(check_dates(order, Some(late)).is_ok());
        assert!(check_dates(order, Some(order)).is_ok());
        assert!(check_dates(order, None).is_ok());
    }

    #[test]
    fn test_order_number_checked_when_present() {
        assert!(check_order_number(None).is_ok());
        assert!(check_order_number(Some("PO-1")).is_ok());
        assert!(matches!(
            check_order_number(Some("PO 1")),
            Err(AppError::Validation { field, .. }) if field == "order_number"
        ));
    }

    #[test]
    fn test_row_status_parsed() {
        let row = PurchaseOrderRow {
            id: Uuid::nil(),
            order_number: "PO-7".to_string(),
            vendor_id: Uuid::nil(),
            order_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            delivery_date: None,
            status: "received".to_string(),
            total_amount: Decimal::ZERO,
            created_at: Utc::now(),
        };
        assert_eq!(PurchaseOrder::from(row).status, PurchaseOrderStatus::Received);
    }

    #[test]
    fn test_create_input_defaults_to_no_lines() {
        let input: CreatePurchaseOrderInput = serde_json::from_value(serde_json::json!({
            "order_number": "PO-1",
            "vendor_id": Uuid::nil(),
            "order_date": "2024-05-01"
        }))
        .unwrap();
        assert!(input.lines.is_empty());
        assert!(input.status.is_none());
    }
}
