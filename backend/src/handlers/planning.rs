//! Planning HTTP handlers: component demand, consumption and reconciliation

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::error::AppError;
use crate::services::planning::{
    CreateComponentDemandInput, CreateConsumptionOutputInput, CreateReconciliationInput,
    ItemFilter, PlanningService, UpdateComponentDemandInput, UpdateConsumptionOutputInput,
    UpdateReconciliationInput,
};
use crate::AppState;

// ============================================================================
// Component demands
// ============================================================================

pub async fn list_component_demands(
    State(state): State<AppState>,
    Query(filter): Query<ItemFilter>,
) -> Result<impl IntoResponse, AppError> {
    let service = PlanningService::new(state.db.clone());
    let demands = service.list_demands(filter).await?;
    Ok(Json(serde_json::json!({ "component_demands": demands })))
}

pub async fn get_component_demand(
    State(state): State<AppState>,
    Path(demand_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let service = PlanningService::new(state.db.clone());
    Ok(Json(service.get_demand(demand_id).await?))
}

pub async fn create_component_demand(
    State(state): State<AppState>,
    Json(input): Json<CreateComponentDemandInput>,
) -> Result<impl IntoResponse, AppError> {
    let service = PlanningService::new(state.db.clone());
    Ok((StatusCode::CREATED, Json(service.create_demand(input).await?)))
}

pub async fn update_component_demand(
    State(state): State<AppState>,
    Path(demand_id): Path<Uuid>,
    Json(input): Json<UpdateComponentDemandInput>,
) -> Result<impl IntoResponse, AppError> {
    let service = PlanningService::new(state.db.clone());
    Ok(Json(service.update_demand(demand_id, input).await?))
}

pub async fn delete_component_demand(
    State(state): State<AppState>,
    Path(demand_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let service = PlanningService::new(state.db.clone());
    service.delete_demand(demand_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Consumption outputs
// ============================================================================

pub async fn list_consumption_outputs(
    State(state): State<AppState>,
    Query(filter): Query<ItemFilter>,
) -> Result<impl IntoResponse, AppError> {
    let service = PlanningService::new(state.db.clone());
    let outputs = service.list_consumption(filter).await?;
    Ok(Json(serde_json::json!({ "consumption_outputs": outputs })))
}

pub async fn get_consumption_output(
    State(state): State<AppState>,
    Path(output_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let service = PlanningService::new(state.db.clone());
    Ok(Json(service.get_consumption(output_id).await?))
}

pub async fn create_consumption_output(
    State(state): State<AppState>,
    Json(input): Json<CreateConsumptionOutputInput>,
) -> Result<impl IntoResponse, AppError> {
    let service = PlanningService::new(state.db.clone());
    Ok((StatusCode::CREATED, Json(service.create_consumption(input).await?)))
}

pub async fn update_consumption_output(
    State(state): State<AppState>,
    Path(output_id): Path<Uuid>,
    Json(input): Json<UpdateConsumptionOutputInput>,
) -> Result<impl IntoResponse, AppError> {
    let service = PlanningService::new(state.db.clone());
    Ok(Json(service.update_consumption(output_id, input).await?))
}

pub async fn delete_consumption_output(
    State(state): State<AppState>,
    Path(output_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let service = PlanningService::new(state.db.clone());
    service.delete_consumption(output_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Inventory reconciliations
// ============================================================================

pub async fn list_reconciliations(
    State(state): State<AppState>,
    Query(filter): Query<ItemFilter>,
) -> Result<impl IntoResponse, AppError> {
    let service = PlanningService::new(state.db.clone());
    let reconciliations = service.list_reconciliations(filter).await?;
    Ok(Json(serde_json::json!({ "inventory_reconciliations": reconciliations })))
}

pub async fn get_reconciliation(
    State(state): State<AppState>,
    Path(reconciliation_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let service = PlanningService::new(state.db.clone());
    Ok(Json(service.get_reconciliation(reconciliation_id).await?))
}

pub async fn create_reconciliation(
    State(state): State<AppState>,
    Json(input): Json<CreateReconciliationInput>,
) -> Result<impl IntoResponse, AppError> {
    let service = PlanningService::new(state.db.clone());
    Ok((StatusCode::CREATED, Json(service.create_reconciliation(input).await?)))
}

pub async fn update_reconciliation(
    State(state): State<AppState>,
    Path(reconciliation_id): Path<Uuid>,
    Json(input): Json<UpdateReconciliationInput>,
) -> Result<impl IntoResponse, AppError> {
    let service = PlanningService::new(state.db.clone());
    Ok(Json(service.update_reconciliation(reconciliation_id, input).await?))
}

pub async fn delete_reconciliation(
    State(state): State<AppState>,
    Path(reconciliation_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let service = PlanningService::new(state.db.clone());
    service.delete_reconciliation(reconciliation_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
