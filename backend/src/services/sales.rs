//! Sales service for customers, sales orders and their line items
//!
//! Line items go through the stock ledger: a save checks the requested
//! quantity against stock and takes the difference, a delete puts the
//! quantity back. Deleting an order or a customer puts back every line that
//! the database cascade is about to remove.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::ledger::{compute_profit_loss, PreviousSale};
use shared::{format_currency, month_lookups, MonthLookup, ProfitLoss, SaleLine, YearMonth};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::stock::{self, StockLine};

/// Sales service for managing customers and sales orders
#[derive(Clone)]
pub struct SalesService {
    db: PgPool,
    currency_symbol: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCustomerInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCustomerInput {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SalesOrder {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub order_date: NaiveDate,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Sales order list row with cost and profit columns
#[derive(Debug, Clone, Serialize)]
pub struct SalesOrderListEntry {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub order_date: NaiveDate,
    pub total_amount: Decimal,
    #[serde(flatten)]
    pub profit_loss: ProfitLoss,
    pub display: SalesOrderDisplay,
}

/// Currency-formatted money columns for the list view
#[derive(Debug, Clone, Serialize)]
pub struct SalesOrderDisplay {
    pub total_cost: String,
    pub total_amount: String,
    pub total_profit: String,
    pub total_loss: String,
}

#[derive(Debug, FromRow)]
struct OrderWithCustomerRow {
    id: Uuid,
    customer_id: Uuid,
    customer_name: String,
    order_date: NaiveDate,
    total_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SalesOrderItem {
    pub id: Uuid,
    pub sales_order_id: Uuid,
    pub item_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub cost_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SalesOrderItem {
    fn sale_line(&self) -> SaleLine {
        SaleLine::new(self.quantity, self.unit_price, self.cost_price)
    }
}

/// Line item with its derived totals, for the order detail view
#[derive(Debug, Clone, Serialize)]
pub struct SalesOrderItemView {
    #[serde(flatten)]
    pub line: SalesOrderItem,
    pub item_name: String,
    pub total_selling_price: Decimal,
    pub total_cost_price: Decimal,
    pub profit: Decimal,
}

#[derive(Debug, FromRow)]
struct LineWithItemRow {
    #[sqlx(flatten)]
    line: SalesOrderItem,
    item_name: String,
}

/// Sales order with its lines and profit/loss
#[derive(Debug, Clone, Serialize)]
pub struct SalesOrderDetail {
    #[serde(flatten)]
    pub order: SalesOrder,
    pub customer_name: String,
    pub lines: Vec<SalesOrderItemView>,
    #[serde(flatten)]
    pub profit_loss: ProfitLoss,
}

#[derive(Debug, Deserialize)]
pub struct CreateSalesOrderInput {
    pub customer_id: Uuid,
    pub total_amount: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSalesOrderInput {
    pub customer_id: Option<Uuid>,
    pub total_amount: Option<Decimal>,
}

/// Filter for the sales order list
#[derive(Debug, Default, Deserialize)]
pub struct SalesOrderFilter {
    pub order_month: Option<YearMonth>,
    pub customer_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSalesOrderItemInput {
    pub sales_order_id: Uuid,
    pub item_id: Uuid,
    #[validate(range(min = 0))]
    pub quantity: i32,
    pub unit_price: Option<Decimal>,
}

/// Line item edits. The item itself cannot be changed.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSalesOrderItemInput {
    pub item_id: Option<Uuid>,
    #[validate(range(min = 0))]
    pub quantity: Option<i32>,
    pub unit_price: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SalesOrderItemFilter {
    pub sales_order_id: Option<Uuid>,
    pub item_id: Option<Uuid>,
}

const CUSTOMER_COLUMNS: &str = "id, name, email, phone, address, created_at";
const ORDER_COLUMNS: &str = "id, customer_id, order_date, total_amount, created_at";
const LINE_COLUMNS: &str =
    "id, sales_order_id, item_id, quantity, unit_price, cost_price, created_at, updated_at";

fn check_phone(phone: Option<&str>) -> AppResult<()> {
    if let Some(phone) = phone {
        shared::validate_phone(phone, 15).map_err(|m| AppError::invalid("phone", m))?;
    }
    Ok(())
}

fn check_email(email: Option<&str>) -> AppResult<()> {
    match email {
        Some(email) if !email.is_empty() => {
            shared::validate_email(email).map_err(|m| AppError::invalid("email", m))
        }
        _ => Ok(()),
    }
}

fn check_order_total(total: Option<Decimal>) -> AppResult<()> {
    if let Some(total) = total {
        shared::validate_price(total).map_err(|m| AppError::invalid("total_amount", m))?;
    }
    Ok(())
}

fn check_unit_price(price: Option<Decimal>) -> AppResult<()> {
    if let Some(price) = price {
        shared::validate_price(price).map_err(|m| AppError::invalid("unit_price", m))?;
    }
    Ok(())
}

fn ensure_same_item(previous: Uuid, requested: Option<Uuid>) -> AppResult<()> {
    match requested {
        Some(item_id) if item_id != previous => Err(AppError::invalid(
            "item_id",
            "The item of a sales line cannot be changed; delete the line and add a new one",
        )),
        _ => Ok(()),
    }
}

fn item_view(line: SalesOrderItem, item_name: String) -> SalesOrderItemView {
    let sale = line.sale_line();
    SalesOrderItemView {
        total_selling_price: sale.total_selling_price(),
        total_cost_price: sale.total_cost_price(),
        profit: sale.profit(),
        item_name,
        line,
    }
}

/// Hold a sales order for the rest of the transaction so it cannot be
/// deleted while a line is written under it
async fn hold_order(conn: &mut PgConnection, order_id: Uuid) -> AppResult<()> {
    sqlx::query_scalar::<_, Uuid>("SELECT id FROM sales_orders WHERE id = $1 FOR KEY SHARE")
        .bind(order_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::InvalidReference("sales_order_items_sales_order_id_fkey".to_string()))?;
    Ok(())
}

/// Lock the given orders and their lines, returning the lines' quantities.
///
/// The order locks keep new lines out and the line locks wait for edits in
/// flight, so the quantities read here are exactly what the cascade removes.
async fn lock_order_lines(conn: &mut PgConnection, order_ids: &[Uuid]) -> AppResult<Vec<StockLine>> {
    sqlx::query("SELECT id FROM sales_orders WHERE id = ANY($1) ORDER BY id FOR UPDATE")
        .bind(order_ids)
        .execute(&mut *conn)
        .await?;

    let lines = sqlx::query_as::<_, StockLine>(
        r#"
        SELECT item_id, quantity
        FROM sales_order_items
        WHERE sales_order_id = ANY($1)
        ORDER BY id
        FOR UPDATE
        "#,
    )
    .bind(order_ids)
    .fetch_all(&mut *conn)
    .await?;

    Ok(lines)
}

impl SalesService {
    /// Create a new SalesService instance
    pub fn new(db: PgPool, currency_symbol: impl Into<String>) -> Self {
        Self {
            db,
            currency_symbol: currency_symbol.into(),
        }
    }

    fn display(&self, total_amount: Decimal, pl: &ProfitLoss) -> SalesOrderDisplay {
        SalesOrderDisplay {
            total_cost: format_currency(&self.currency_symbol, pl.total_cost),
            total_amount: format_currency(&self.currency_symbol, total_amount),
            total_profit: format_currency(&self.currency_symbol, pl.total_profit),
            total_loss: format_currency(&self.currency_symbol, pl.total_loss),
        }
    }

    // ========================================================================
    // Customers
    // ========================================================================

    pub async fn list_customers(&self) -> AppResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {} FROM customers ORDER BY name",
            CUSTOMER_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(customers)
    }

    pub async fn get_customer(&self, customer_id: Uuid) -> AppResult<Customer> {
        sqlx::query_as::<_, Customer>(&format!(
            "SELECT {} FROM customers WHERE id = $1",
            CUSTOMER_COLUMNS
        ))
        .bind(customer_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer".to_string()))
    }

    pub async fn create_customer(&self, input: CreateCustomerInput) -> AppResult<Customer> {
        input.validate()?;
        check_email(input.email.as_deref())?;
        check_phone(input.phone.as_deref())?;

        let customer = sqlx::query_as::<_, Customer>(&format!(
            r#"
            INSERT INTO customers (name, email, phone, address)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            CUSTOMER_COLUMNS
        ))
        .bind(&input.name)
        .bind(input.email.unwrap_or_default())
        .bind(input.phone.unwrap_or_default())
        .bind(input.address.unwrap_or_default())
        .fetch_one(&self.db)
        .await?;

        tracing::info!(customer_id = %customer.id, "Customer created");
        Ok(customer)
    }

    pub async fn update_customer(
        &self,
        customer_id: Uuid,
        input: UpdateCustomerInput,
    ) -> AppResult<Customer> {
        input.validate()?;
        check_email(input.email.as_deref())?;
        check_phone(input.phone.as_deref())?;

        sqlx::query_as::<_, Customer>(&format!(
            r#"
            UPDATE customers
            SET name = COALESCE($1, name),
                email = COALESCE($2, email),
                phone = COALESCE($3, phone),
                address = COALESCE($4, address)
            WHERE id = $5
            RETURNING {}
            "#,
            CUSTOMER_COLUMNS
        ))
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(customer_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer".to_string()))
    }

    /// Delete a customer, returning the stock of every line of every order
    pub async fn delete_customer(&self, customer_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        // Locking the customer keeps new orders out
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM customers WHERE id = $1 FOR UPDATE")
            .bind(customer_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Customer".to_string()))?;

        let order_ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM sales_orders WHERE customer_id = $1 ORDER BY id FOR UPDATE",
        )
        .bind(customer_id)
        .fetch_all(&mut *tx)
        .await?;

        let lines = lock_order_lines(&mut tx, &order_ids).await?;

        stock::reverse_sales(&mut tx, &lines).await?;

        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(customer_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Customer".to_string()));
        }

        tx.commit().await?;
        tracing::info!(%customer_id, lines = lines.len(), "Customer deleted");
        Ok(())
    }

    // ========================================================================
    // Sales orders
    // ========================================================================

    /// List sales orders with cost, profit and loss, newest first
    pub async fn list_sales_orders(
        &self,
        filter: SalesOrderFilter,
    ) -> AppResult<Vec<SalesOrderListEntry>> {
        let (from, until) = match filter.order_month {
            Some(month) => (Some(month.first_day()), Some(month.next_first_day())),
            None => (None, None),
        };

        let orders = sqlx::query_as::<_, OrderWithCustomerRow>(
            r#"
            SELECT o.id, o.customer_id, c.name AS customer_name, o.order_date, o.total_amount
            FROM sales_orders o
            JOIN customers c ON c.id = o.customer_id
            WHERE ($1::DATE IS NULL OR o.order_date >= $1)
              AND ($2::DATE IS NULL OR o.order_date < $2)
              AND ($3::UUID IS NULL OR o.customer_id = $3)
            ORDER BY o.order_date DESC, o.created_at DESC
            "#,
        )
        .bind(from)
        .bind(until)
        .bind(filter.customer_id)
        .fetch_all(&self.db)
        .await?;

        let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let lines = sqlx::query_as::<_, SalesOrderItem>(&format!(
            "SELECT {} FROM sales_order_items WHERE sales_order_id = ANY($1)",
            LINE_COLUMNS
        ))
        .bind(&order_ids)
        .fetch_all(&self.db)
        .await?;

        let mut lines_by_order: HashMap<Uuid, Vec<SaleLine>> = HashMap::new();
        for line in &lines {
            lines_by_order
                .entry(line.sales_order_id)
                .or_default()
                .push(line.sale_line());
        }

        let entries = orders
            .into_iter()
            .map(|order| {
                let profit_loss = lines_by_order
                    .get(&order.id)
                    .map(compute_profit_loss)
                    .unwrap_or_default();
                SalesOrderListEntry {
                    display: self.display(order.total_amount, &profit_loss),
                    id: order.id,
                    customer_id: order.customer_id,
                    customer_name: order.customer_name,
                    order_date: order.order_date,
                    total_amount: order.total_amount,
                    profit_loss,
                }
            })
            .collect();

        Ok(entries)
    }

    /// Months that have at least one order, for the order-month filter
    pub async fn order_months(&self) -> AppResult<Vec<MonthLookup>> {
        let dates = sqlx::query_scalar::<_, NaiveDate>(
            "SELECT DISTINCT date_trunc('month', order_date)::DATE FROM sales_orders",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(month_lookups(dates))
    }

    async fn fetch_order(&self, order_id: Uuid) -> AppResult<SalesOrder> {
        sqlx::query_as::<_, SalesOrder>(&format!(
            "SELECT {} FROM sales_orders WHERE id = $1",
            ORDER_COLUMNS
        ))
        .bind(order_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Sales order".to_string()))
    }

    /// Get a sales order with its lines and profit/loss
    pub async fn get_sales_order(&self, order_id: Uuid) -> AppResult<SalesOrderDetail> {
        let order = self.fetch_order(order_id).await?;

        let customer_name =
            sqlx::query_scalar::<_, String>("SELECT name FROM customers WHERE id = $1")
                .bind(order.customer_id)
                .fetch_one(&self.db)
                .await?;

        let rows = sqlx::query_as::<_, LineWithItemRow>(
            r#"
            SELECT l.id, l.sales_order_id, l.item_id, l.quantity, l.unit_price, l.cost_price,
                   l.created_at, l.updated_at, i.name AS item_name
            FROM sales_order_items l
            JOIN items i ON i.id = l.item_id
            WHERE l.sales_order_id = $1
            ORDER BY l.created_at
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.db)
        .await?;

        let sale_lines: Vec<SaleLine> = rows.iter().map(|r| r.line.sale_line()).collect();
        let profit_loss = compute_profit_loss(&sale_lines);
        let lines = rows
            .into_iter()
            .map(|r| item_view(r.line, r.item_name))
            .collect();

        Ok(SalesOrderDetail {
            order,
            customer_name,
            lines,
            profit_loss,
        })
    }

    pub async fn create_sales_order(&self, input: CreateSalesOrderInput) -> AppResult<SalesOrder> {
        check_order_total(input.total_amount)?;

        let order = sqlx::query_as::<_, SalesOrder>(&format!(
            r#"
            INSERT INTO sales_orders (customer_id, order_date, total_amount)
            VALUES ($1, CURRENT_DATE, $2)
            RETURNING {}
            "#,
            ORDER_COLUMNS
        ))
        .bind(input.customer_id)
        .bind(input.total_amount.unwrap_or(Decimal::ZERO))
        .fetch_one(&self.db)
        .await?;

        tracing::info!(order_id = %order.id, customer_id = %order.customer_id, "Sales order created");
        Ok(order)
    }

    /// Update the customer or total. The order date is fixed at creation.
    pub async fn update_sales_order(
        &self,
        order_id: Uuid,
        input: UpdateSalesOrderInput,
    ) -> AppResult<SalesOrder> {
        check_order_total(input.total_amount)?;

        sqlx::query_as::<_, SalesOrder>(&format!(
            r#"
            UPDATE sales_orders
            SET customer_id = COALESCE($1, customer_id),
                total_amount = COALESCE($2, total_amount)
            WHERE id = $3
            RETURNING {}
            "#,
            ORDER_COLUMNS
        ))
        .bind(input.customer_id)
        .bind(input.total_amount)
        .bind(order_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Sales order".to_string()))
    }

    /// Delete a sales order, returning each line's quantity to stock once
    pub async fn delete_sales_order(&self, order_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let lines = lock_order_lines(&mut tx, &[order_id]).await?;

        stock::reverse_sales(&mut tx, &lines).await?;

        let result = sqlx::query("DELETE FROM sales_orders WHERE id = $1")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Sales order".to_string()));
        }

        tx.commit().await?;
        tracing::info!(%order_id, lines = lines.len(), "Sales order deleted");
        Ok(())
    }

    // ========================================================================
    // Sales order items
    // ========================================================================

    pub async fn list_items(&self, filter: SalesOrderItemFilter) -> AppResult<Vec<SalesOrderItem>> {
        let lines = sqlx::query_as::<_, SalesOrderItem>(&format!(
            r#"
            SELECT {}
            FROM sales_order_items
            WHERE ($1::UUID IS NULL OR sales_order_id = $1)
              AND ($2::UUID IS NULL OR item_id = $2)
            ORDER BY created_at DESC
            "#,
            LINE_COLUMNS
        ))
        .bind(filter.sales_order_id)
        .bind(filter.item_id)
        .fetch_all(&self.db)
        .await?;
        Ok(lines)
    }

    pub async fn get_item(&self, line_id: Uuid) -> AppResult<SalesOrderItemView> {
        let row = sqlx::query_as::<_, LineWithItemRow>(
            r#"
            SELECT l.id, l.sales_order_id, l.item_id, l.quantity, l.unit_price, l.cost_price,
                   l.created_at, l.updated_at, i.name AS item_name
            FROM sales_order_items l
            JOIN items i ON i.id = l.item_id
            WHERE l.id = $1
            "#,
        )
        .bind(line_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Sales order item".to_string()))?;

        Ok(item_view(row.line, row.item_name))
    }

    /// Sell an item: check stock, freeze the cost price and take the quantity
    pub async fn create_item(&self, input: CreateSalesOrderItemInput) -> AppResult<SalesOrderItem> {
        input.validate()?;
        check_unit_price(input.unit_price)?;

        let mut tx = self.db.begin().await?;

        hold_order(&mut tx, input.sales_order_id).await?;
        let commit = stock::commit_sale(&mut tx, input.item_id, None, input.quantity).await?;

        let line = sqlx::query_as::<_, SalesOrderItem>(&format!(
            r#"
            INSERT INTO sales_order_items (sales_order_id, item_id, quantity, unit_price, cost_price)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            LINE_COLUMNS
        ))
        .bind(input.sales_order_id)
        .bind(input.item_id)
        .bind(input.quantity)
        .bind(input.unit_price.unwrap_or(Decimal::ZERO))
        .bind(commit.cost_price)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(line)
    }

    /// Edit a line's quantity or selling price, moving stock by the difference
    pub async fn update_item(
        &self,
        line_id: Uuid,
        input: UpdateSalesOrderItemInput,
    ) -> AppResult<SalesOrderItem> {
        input.validate()?;
        check_unit_price(input.unit_price)?;

        let mut tx = self.db.begin().await?;

        let previous = sqlx::query_as::<_, SalesOrderItem>(&format!(
            "SELECT {} FROM sales_order_items WHERE id = $1 FOR UPDATE",
            LINE_COLUMNS
        ))
        .bind(line_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Sales order item".to_string()))?;

        ensure_same_item(previous.item_id, input.item_id)?;

        let quantity = input.quantity.unwrap_or(previous.quantity);
        let commit = stock::commit_sale(
            &mut tx,
            previous.item_id,
            Some(PreviousSale {
                quantity: previous.quantity,
                cost_price: previous.cost_price,
            }),
            quantity,
        )
        .await?;

        let line = sqlx::query_as::<_, SalesOrderItem>(&format!(
            r#"
            UPDATE sales_order_items
            SET quantity = $1,
                unit_price = COALESCE($2, unit_price),
                cost_price = $3,
                updated_at = NOW()
            WHERE id = $4
            RETURNING {}
            "#,
            LINE_COLUMNS
        ))
        .bind(quantity)
        .bind(input.unit_price)
        .bind(commit.cost_price)
        .bind(line_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(line)
    }

    /// Delete a line and return its quantity to stock
    pub async fn delete_item(&self, line_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let removed = sqlx::query_as::<_, StockLine>(
            "DELETE FROM sales_order_items WHERE id = $1 RETURNING item_id, quantity",
        )
        .bind(line_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Sales order item".to_string()))?;

        stock::reverse_sale(&mut tx, removed.item_id, removed.quantity).await?;

        tx.commit().await?;
        tracing::info!(%line_id, "Sales order item deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn money(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    fn line(quantity: i32, unit_price: Decimal, cost_price: Decimal) -> SalesOrderItem {
        SalesOrderItem {
            id: Uuid::nil(),
            sales_order_id: Uuid::nil(),
            item_id: Uuid::nil(),
            quantity,
            unit_price,
            cost_price,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_item_view_derives_totals() {
        let view = item_view(line(3, money(700), money(500)), "Bolt".to_string());
        assert_eq!(view.total_selling_price, money(2100));
        assert_eq!(view.total_cost_price, money(1500));
        assert_eq!(view.profit, money(600));
        assert_eq!(view.item_name, "Bolt");
    }

    #[test]
    fn test_item_change_rejected() {
        let item = Uuid::from_u128(1);
        assert!(ensure_same_item(item, None).is_ok());
        assert!(ensure_same_item(item, Some(item)).is_ok());
        assert!(matches!(
            ensure_same_item(item, Some(Uuid::from_u128(2))),
            Err(AppError::Validation { field, .. }) if field == "item_id"
        ));
    }

    #[test]
    fn test_empty_customer_email_allowed() {
        assert!(check_email(None).is_ok());
        assert!(check_email(Some("")).is_ok());
        assert!(check_email(Some("a@example.com")).is_ok());
        assert!(check_email(Some("not-an-email")).is_err());
    }

    #[test]
    fn test_filter_parses_order_month() {
        let filter: SalesOrderFilter =
            serde_json::from_value(serde_json::json!({ "order_month": "2024-05" })).unwrap();
        let month = filter.order_month.unwrap();
        assert_eq!(month.first_day(), NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(month.next_first_day(), NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
    }
}
