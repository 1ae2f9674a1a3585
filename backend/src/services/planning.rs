//! Planning records: component demand, consumption and stock reconciliation
//!
//! These are kept for reference only and never move stock.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::reconciliation_variance;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct PlanningService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ComponentDemand {
    pub id: Uuid,
    pub item_id: Uuid,
    pub demand_date: NaiveDate,
    pub quantity_required: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateComponentDemandInput {
    pub item_id: Uuid,
    pub demand_date: NaiveDate,
    #[validate(range(min = 0))]
    pub quantity_required: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateComponentDemandInput {
    pub item_id: Option<Uuid>,
    pub demand_date: Option<NaiveDate>,
    #[validate(range(min = 0))]
    pub quantity_required: Option<i32>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ConsumptionOutput {
    pub id: Uuid,
    pub item_id: Uuid,
    pub consumed_date: NaiveDate,
    pub quantity_used: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateConsumptionOutputInput {
    pub item_id: Uuid,
    pub consumed_date: NaiveDate,
    #[validate(range(min = 0))]
    pub quantity_used: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateConsumptionOutputInput {
    pub item_id: Option<Uuid>,
    pub consumed_date: Option<NaiveDate>,
    #[validate(range(min = 0))]
    pub quantity_used: Option<i32>,
}

#[derive(Debug, Clone, FromRow)]
struct ReconciliationRow {
    id: Uuid,
    item_id: Uuid,
    reconciled_date: NaiveDate,
    actual_quantity: i32,
    system_quantity: i32,
    remarks: String,
    created_at: DateTime<Utc>,
}

/// A stock count compared with the recorded quantity
#[derive(Debug, Clone, Serialize)]
pub struct InventoryReconciliation {
    pub id: Uuid,
    pub item_id: Uuid,
    pub reconciled_date: NaiveDate,
    pub actual_quantity: i32,
    pub system_quantity: i32,
    /// Counted minus recorded; negative means shrinkage
    pub variance: i64,
    pub remarks: String,
    pub created_at: DateTime<Utc>,
}

impl From<ReconciliationRow> for InventoryReconciliation {
    fn from(row: ReconciliationRow) -> Self {
        Self {
            variance: reconciliation_variance(row.actual_quantity, row.system_quantity),
            id: row.id,
            item_id: row.item_id,
            reconciled_date: row.reconciled_date,
            actual_quantity: row.actual_quantity,
            system_quantity: row.system_quantity,
            remarks: row.remarks,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReconciliationInput {
    pub item_id: Uuid,
    #[validate(range(min = 0))]
    pub actual_quantity: i32,
    /// Defaults to the item's current stock
    #[validate(range(min = 0))]
    pub system_quantity: Option<i32>,
    pub remarks: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateReconciliationInput {
    #[validate(range(min = 0))]
    pub actual_quantity: Option<i32>,
    #[validate(range(min = 0))]
    pub system_quantity: Option<i32>,
    pub remarks: Option<String>,
}

/// Restricts planning lists to one item
#[derive(Debug, Default, Deserialize)]
pub struct ItemFilter {
    pub item_id: Option<Uuid>,
}

const DEMAND_COLUMNS: &str = "id, item_id, demand_date, quantity_required, created_at";
const CONSUMPTION_COLUMNS: &str = "id, item_id, consumed_date, quantity_used, created_at";
const RECONCILIATION_COLUMNS: &str =
    "id, item_id, reconciled_date, actual_quantity, system_quantity, remarks, created_at";

impl PlanningService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    // ========================================================================
    // Component demand
    // ========================================================================

    pub async fn list_demands(&self, filter: ItemFilter) -> AppResult<Vec<ComponentDemand>> {
        let demands = sqlx::query_as::<_, ComponentDemand>(&format!(
            r#"
            SELECT {}
            FROM component_demands
            WHERE ($1::UUID IS NULL OR item_id = $1)
            ORDER BY demand_date DESC
            "#,
            DEMAND_COLUMNS
        ))
        .bind(filter.item_id)
        .fetch_all(&self.db)
        .await?;
        Ok(demands)
    }

    pub async fn get_demand(&self, demand_id: Uuid) -> AppResult<ComponentDemand> {
        sqlx::query_as::<_, ComponentDemand>(&format!(
            "SELECT {} FROM component_demands WHERE id = $1",
            DEMAND_COLUMNS
        ))
        .bind(demand_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Component demand".to_string()))
    }

    pub async fn create_demand(&self, input: CreateComponentDemandInput) -> AppResult<ComponentDemand> {
        input.validate()?;

        let demand = sqlx::query_as::<_, ComponentDemand>(&format!(
            r#"
            INSERT INTO component_demands (item_id, demand_date, quantity_required)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            DEMAND_COLUMNS
        ))
        .bind(input.item_id)
        .bind(input.demand_date)
        .bind(input.quantity_required)
        .fetch_one(&self.db)
        .await?;
        Ok(demand)
    }

    pub async fn update_demand(
        &self,
        demand_id: Uuid,
        input: UpdateComponentDemandInput,
    ) -> AppResult<ComponentDemand> {
        input.validate()?;

        sqlx::query_as::<_, ComponentDemand>(&format!(
            r#"
            UPDATE component_demands
            SET item_id = COALESCE($1, item_id),
                demand_date = COALESCE($2, demand_date),
                quantity_required = COALESCE($3, quantity_required)
            WHERE id = $4
            RETURNING {}
            "#,
            DEMAND_COLUMNS
        ))
        .bind(input.item_id)
        .bind(input.demand_date)
        .bind(input.quantity_required)
        .bind(demand_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Component demand".to_string()))
    }

    pub async fn delete_demand(&self, demand_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM component_demands WHERE id = $1")
            .bind(demand_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Component demand".to_string()));
        }
        Ok(())
    }

    // ========================================================================
    // Consumption
    // ========================================================================

    pub async fn list_consumption(&self, filter: ItemFilter) -> AppResult<Vec<ConsumptionOutput>> {
        let outputs = sqlx::query_as::<_, ConsumptionOutput>(&format!(
            r#"
            SELECT {}
            FROM consumption_outputs
            WHERE ($1::UUID IS NULL OR item_id = $1)
            ORDER BY consumed_date DESC
            "#,
            CONSUMPTION_COLUMNS
        ))
        .bind(filter.item_id)
        .fetch_all(&self.db)
        .await?;
        Ok(outputs)
    }

    pub async fn get_consumption(&self, output_id: Uuid) -> AppResult<ConsumptionOutput> {
        sqlx::query_as::<_, ConsumptionOutput>(&format!(
            "SELECT {} FROM consumption_outputs WHERE id = $1",
            CONSUMPTION_COLUMNS
        ))
        .bind(output_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Consumption output".to_string()))
    }

    pub async fn create_consumption(
        &self,
        input: CreateConsumptionOutputInput,
    ) -> AppResult<ConsumptionOutput> {
        input.validate()?;

        let output = sqlx::query_as::<_, ConsumptionOutput>(&format!(
            r#"
            INSERT INTO consumption_outputs (item_id, consumed_date, quantity_used)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            CONSUMPTION_COLUMNS
        ))
        .bind(input.item_id)
        .bind(input.consumed_date)
        .bind(input.quantity_used)
        .fetch_one(&self.db)
        .await?;
        Ok(output)
    }

    pub async fn update_consumption(
        &self,
        output_id: Uuid,
        input: UpdateConsumptionOutputInput,
    ) -> AppResult<ConsumptionOutput> {
        input.validate()?;

        sqlx::query_as::<_, ConsumptionOutput>(&format!(
            r#"
            UPDATE consumption_outputs
            SET item_id = COALESCE($1, item_id),
                consumed_date = COALESCE($2, consumed_date),
                quantity_used = COALESCE($3, quantity_used)
            WHERE id = $4
            RETURNING {}
            "#,
            CONSUMPTION_COLUMNS
        ))
        .bind(input.item_id)
        .bind(input.consumed_date)
        .bind(input.quantity_used)
        .bind(output_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Consumption output".to_string()))
    }

    pub async fn delete_consumption(&self, output_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM consumption_outputs WHERE id = $1")
            .bind(output_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Consumption output".to_string()));
        }
        Ok(())
    }

    // ========================================================================
    // Reconciliation
    // ========================================================================

    pub async fn list_reconciliations(
        &self,
        filter: ItemFilter,
    ) -> AppResult<Vec<InventoryReconciliation>> {
        let rows = sqlx::query_as::<_, ReconciliationRow>(&format!(
            r#"
            SELECT {}
            FROM inventory_reconciliations
            WHERE ($1::UUID IS NULL OR item_id = $1)
            ORDER BY reconciled_date DESC, created_at DESC
            "#,
            RECONCILIATION_COLUMNS
        ))
        .bind(filter.item_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(InventoryReconciliation::from).collect())
    }

    pub async fn get_reconciliation(&self, reconciliation_id: Uuid) -> AppResult<InventoryReconciliation> {
        let row = sqlx::query_as::<_, ReconciliationRow>(&format!(
            "SELECT {} FROM inventory_reconciliations WHERE id = $1",
            RECONCILIATION_COLUMNS
        ))
        .bind(reconciliation_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Inventory reconciliation".to_string()))?;
        Ok(row.into())
    }

    /// Record a stock count. Without a system quantity the item's current
    /// stock is used.
    pub async fn create_reconciliation(
        &self,
        input: CreateReconciliationInput,
    ) -> AppResult<InventoryReconciliation> {
        input.validate()?;

        let row = sqlx::query_as::<_, ReconciliationRow>(&format!(
            r#"
            INSERT INTO inventory_reconciliations (item_id, actual_quantity, system_quantity, remarks)
            SELECT i.id, $2, COALESCE($3, i.stock_quantity), $4
            FROM items i
            WHERE i.id = $1
            RETURNING {}
            "#,
            RECONCILIATION_COLUMNS
        ))
        .bind(input.item_id)
        .bind(input.actual_quantity)
        .bind(input.system_quantity)
        .bind(input.remarks.unwrap_or_default())
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Item".to_string()))?;

        let reconciliation = InventoryReconciliation::from(row);
        if reconciliation.variance != 0 {
            tracing::warn!(
                item_id = %reconciliation.item_id,
                variance = reconciliation.variance,
                "Stock count differs from recorded quantity"
            );
        }
        Ok(reconciliation)
    }

    pub async fn update_reconciliation(
        &self,
        reconciliation_id: Uuid,
        input: UpdateReconciliationInput,
    ) -> AppResult<InventoryReconciliation> {
        input.validate()?;

        let row = sqlx::query_as::<_, ReconciliationRow>(&format!(
            r#"
            UPDATE inventory_reconciliations
            SET actual_quantity = COALESCE($1, actual_quantity),
                system_quantity = COALESCE($2, system_quantity),
                remarks = COALESCE($3, remarks)
            WHERE id = $4
            RETURNING {}
            "#,
            RECONCILIATION_COLUMNS
        ))
        .bind(input.actual_quantity)
        .bind(input.system_quantity)
        .bind(&input.remarks)
        .bind(reconciliation_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Inventory reconciliation".to_string()))?;
        Ok(row.into())
    }

    pub async fn delete_reconciliation(&self, reconciliation_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM inventory_reconciliations WHERE id = $1")
            .bind(reconciliation_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Inventory reconciliation".to_string()));
        }
        Ok(())
    }
}
