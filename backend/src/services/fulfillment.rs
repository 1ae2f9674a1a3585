//! Fulfillment service: the shipment and invoice attached to a sales order
//!
//! Each sales order has at most one of each; a second one is rejected by the
//! unique constraint and surfaces as a duplicate entry.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct FulfillmentService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Shipment {
    pub id: Uuid,
    pub sales_order_id: Uuid,
    pub shipment_date: NaiveDate,
    pub tracking_number: String,
    pub carrier: String,
    pub delivered: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateShipmentInput {
    pub sales_order_id: Uuid,
    pub shipment_date: NaiveDate,
    #[validate(length(max = 100))]
    pub tracking_number: Option<String>,
    #[validate(length(max = 100))]
    pub carrier: Option<String>,
    pub delivered: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateShipmentInput {
    pub shipment_date: Option<NaiveDate>,
    #[validate(length(max = 100))]
    pub tracking_number: Option<String>,
    #[validate(length(max = 100))]
    pub carrier: Option<String>,
    pub delivered: Option<bool>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Invoice {
    pub id: Uuid,
    pub sales_order_id: Uuid,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub total_amount: Decimal,
    pub paid: bool,
    pub remarks: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateInvoiceInput {
    pub sales_order_id: Uuid,
    pub due_date: NaiveDate,
    pub total_amount: Decimal,
    pub paid: Option<bool>,
    pub remarks: Option<String>,
}

/// Invoice edits. The invoice date is fixed at creation.
#[derive(Debug, Deserialize)]
pub struct UpdateInvoiceInput {
    pub due_date: Option<NaiveDate>,
    pub total_amount: Option<Decimal>,
    pub paid: Option<bool>,
    pub remarks: Option<String>,
}

/// Filter shared by the shipment and invoice lists
#[derive(Debug, Default, Deserialize)]
pub struct FulfillmentFilter {
    pub sales_order_id: Option<Uuid>,
    pub delivered: Option<bool>,
    pub paid: Option<bool>,
}

const SHIPMENT_COLUMNS: &str =
    "id, sales_order_id, shipment_date, tracking_number, carrier, delivered, created_at";
const INVOICE_COLUMNS: &str =
    "id, sales_order_id, invoice_date, due_date, total_amount, paid, remarks, created_at";

fn check_total(total: Option<Decimal>) -> AppResult<()> {
    if let Some(total) = total {
        shared::validate_total(total).map_err(|m| AppError::invalid("total_amount", m))?;
    }
    Ok(())
}

impl FulfillmentService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    // ========================================================================
    // Shipments
    // ========================================================================

    pub async fn list_shipments(&self, filter: FulfillmentFilter) -> AppResult<Vec<Shipment>> {
        let shipments = sqlx::query_as::<_, Shipment>(&format!(
            r#"
            SELECT {}
            FROM shipments
            WHERE ($1::UUID IS NULL OR sales_order_id = $1)
              AND ($2::BOOLEAN IS NULL OR delivered = $2)
            ORDER BY shipment_date DESC
            "#,
            SHIPMENT_COLUMNS
        ))
        .bind(filter.sales_order_id)
        .bind(filter.delivered)
        .fetch_all(&self.db)
        .await?;
        Ok(shipments)
    }

    pub async fn get_shipment(&self, shipment_id: Uuid) -> AppResult<Shipment> {
        sqlx::query_as::<_, Shipment>(&format!(
            "SELECT {} FROM shipments WHERE id = $1",
            SHIPMENT_COLUMNS
        ))
        .bind(shipment_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Shipment".to_string()))
    }

    pub async fn create_shipment(&self, input: CreateShipmentInput) -> AppResult<Shipment> {
        input.validate()?;

        let shipment = sqlx::query_as::<_, Shipment>(&format!(
            r#"
            INSERT INTO shipments (sales_order_id, shipment_date, tracking_number, carrier, delivered)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            SHIPMENT_COLUMNS
        ))
        .bind(input.sales_order_id)
        .bind(input.shipment_date)
        .bind(input.tracking_number.unwrap_or_default())
        .bind(input.carrier.unwrap_or_default())
        .bind(input.delivered.unwrap_or(false))
        .fetch_one(&self.db)
        .await?;

        tracing::info!(
            shipment_id = %shipment.id,
            sales_order_id = %shipment.sales_order_id,
            "Shipment created"
        );
        Ok(shipment)
    }

    pub async fn update_shipment(
        &self,
        shipment_id: Uuid,
        input: UpdateShipmentInput,
    ) -> AppResult<Shipment> {
        input.validate()?;

        let shipment = sqlx::query_as::<_, Shipment>(&format!(
            r#"
            UPDATE shipments
            SET shipment_date = COALESCE($1, shipment_date),
                tracking_number = COALESCE($2, tracking_number),
                carrier = COALESCE($3, carrier),
                delivered = COALESCE($4, delivered)
            WHERE id = $5
            RETURNING {}
            "#,
            SHIPMENT_COLUMNS
        ))
        .bind(input.shipment_date)
        .bind(&input.tracking_number)
        .bind(&input.carrier)
        .bind(input.delivered)
        .bind(shipment_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Shipment".to_string()))?;

        if input.delivered == Some(true) {
            tracing::info!(%shipment_id, "Shipment marked delivered");
        }
        Ok(shipment)
    }

    pub async fn delete_shipment(&self, shipment_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM shipments WHERE id = $1")
            .bind(shipment_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Shipment".to_string()));
        }
        Ok(())
    }

    // ========================================================================
    // Invoices
    // ========================================================================

    pub async fn list_invoices(&self, filter: FulfillmentFilter) -> AppResult<Vec<Invoice>> {
        let invoices = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            SELECT {}
            FROM invoices
            WHERE ($1::UUID IS NULL OR sales_order_id = $1)
              AND ($2::BOOLEAN IS NULL OR paid = $2)
            ORDER BY invoice_date DESC, created_at DESC
            "#,
            INVOICE_COLUMNS
        ))
        .bind(filter.sales_order_id)
        .bind(filter.paid)
        .fetch_all(&self.db)
        .await?;
        Ok(invoices)
    }

    pub async fn get_invoice(&self, invoice_id: Uuid) -> AppResult<Invoice> {
        sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {} FROM invoices WHERE id = $1",
            INVOICE_COLUMNS
        ))
        .bind(invoice_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Invoice".to_string()))
    }

    pub async fn create_invoice(&self, input: CreateInvoiceInput) -> AppResult<Invoice> {
        check_total(Some(input.total_amount))?;

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            INSERT INTO invoices (sales_order_id, due_date, total_amount, paid, remarks)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            INVOICE_COLUMNS
        ))
        .bind(input.sales_order_id)
        .bind(input.due_date)
        .bind(input.total_amount)
        .bind(input.paid.unwrap_or(false))
        .bind(input.remarks.unwrap_or_default())
        .fetch_one(&self.db)
        .await?;

        tracing::info!(
            invoice_id = %invoice.id,
            sales_order_id = %invoice.sales_order_id,
            total = %invoice.total_amount,
            "Invoice created"
        );
        Ok(invoice)
    }

    pub async fn update_invoice(
        &self,
        invoice_id: Uuid,
        input: UpdateInvoiceInput,
    ) -> AppResult<Invoice> {
        check_total(input.total_amount)?;

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            UPDATE invoices
            SET due_date = COALESCE($1, due_date),
                total_amount = COALESCE($2, total_amount),
                paid = COALESCE($3, paid),
                remarks = COALESCE($4, remarks)
            WHERE id = $5
            RETURNING {}
            "#,
            INVOICE_COLUMNS
        ))
        .bind(input.due_date)
        .bind(input.total_amount)
        .bind(input.paid)
        .bind(&input.remarks)
        .bind(invoice_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Invoice".to_string()))?;

        if input.paid == Some(true) {
            tracing::info!(%invoice_id, "Invoice marked paid");
        }
        Ok(invoice)
    }

    pub async fn delete_invoice(&self, invoice_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM invoices WHERE id = $1")
            .bind(invoice_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Invoice".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoice_total_limited_to_twelve_digits() {
        assert!(check_total(Some(Decimal::new(999_999_999_999, 2))).is_ok());
        assert!(matches!(
            check_total(Some(Decimal::new(1_000_000_000_000, 2))),
            Err(AppError::Validation { field, .. }) if field == "total_amount"
        ));
        assert!(check_total(None).is_ok());
    }

    #[test]
    fn test_tracking_number_length() {
        let input = CreateShipmentInput {
            sales_order_id: Uuid::nil(),
            shipment_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            tracking_number: Some("X".repeat(101)),
            carrier: None,
            delivered: None,
        };
        assert!(input.validate().is_err());
    }
}
