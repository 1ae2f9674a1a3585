//! Procurement HTTP handlers: purchase orders and their lines

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use shared::PurchaseOrderStatus;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::services::procurement::{
    CreatePurchaseOrderInput, CreatePurchaseOrderLineInput, ProcurementService,
    PurchaseOrderLineFilter, UpdatePurchaseOrderInput, UpdatePurchaseOrderLineInput,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PurchaseOrderQuery {
    pub status: Option<String>,
}

fn parse_status(status: Option<&str>) -> Result<Option<PurchaseOrderStatus>, AppError> {
    match status {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|m: String| AppError::invalid("status", m)),
    }
}

// ============================================================================
// Purchase orders
// ============================================================================

pub async fn list_purchase_orders(
    State(state): State<AppState>,
    Query(query): Query<PurchaseOrderQuery>,
) -> Result<impl IntoResponse, AppError> {
    let status = parse_status(query.status.as_deref())?;
    let service = ProcurementService::new(state.db.clone());
    let orders = service.list_purchase_orders(status).await?;
    Ok(Json(serde_json::json!({
        "purchase_orders": orders,
        "statuses": PurchaseOrderStatus::ALL,
    })))
}

pub async fn get_purchase_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let service = ProcurementService::new(state.db.clone());
    Ok(Json(service.get_purchase_order(order_id).await?))
}

pub async fn create_purchase_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreatePurchaseOrderInput>,
) -> Result<impl IntoResponse, AppError> {
    let service = ProcurementService::new(state.db.clone());
    let order = service.create_purchase_order(input).await?;
    tracing::debug!(order_id = %order.order.id, user = %user.username, "Create requested by user");
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn update_purchase_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(input): Json<UpdatePurchaseOrderInput>,
) -> Result<impl IntoResponse, AppError> {
    let service = ProcurementService::new(state.db.clone());
    Ok(Json(service.update_purchase_order(order_id, input).await?))
}

/// Delete a purchase order and take its received lines back out of stock
pub async fn delete_purchase_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let service = ProcurementService::new(state.db.clone());
    service.delete_purchase_order(order_id).await?;
    tracing::debug!(%order_id, user = %user.username, "Delete requested by user");
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Purchase order lines
// ============================================================================

pub async fn list_purchase_order_lines(
    State(state): State<AppState>,
    Query(filter): Query<PurchaseOrderLineFilter>,
) -> Result<impl IntoResponse, AppError> {
    let service = ProcurementService::new(state.db.clone());
    let lines = service.list_lines(filter).await?;
    Ok(Json(serde_json::json!({ "lines": lines })))
}

pub async fn get_purchase_order_line(
    State(state): State<AppState>,
    Path(line_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let service = ProcurementService::new(state.db.clone());
    Ok(Json(service.get_line(line_id).await?))
}

pub async fn create_purchase_order_line(
    State(state): State<AppState>,
    Json(input): Json<CreatePurchaseOrderLineInput>,
) -> Result<impl IntoResponse, AppError> {
    let service = ProcurementService::new(state.db.clone());
    let line = service.create_line(input).await?;
    Ok((StatusCode::CREATED, Json(line)))
}

pub async fn update_purchase_order_line(
    State(state): State<AppState>,
    Path(line_id): Path<Uuid>,
    Json(input): Json<UpdatePurchaseOrderLineInput>,
) -> Result<impl IntoResponse, AppError> {
    let service = ProcurementService::new(state.db.clone());
    Ok(Json(service.update_line(line_id, input).await?))
}

pub async fn delete_purchase_order_line(
    State(state): State<AppState>,
    Path(line_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let service = ProcurementService::new(state.db.clone());
    service.delete_line(line_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_filter() {
        assert_eq!(parse_status(None).unwrap(), None);
        assert_eq!(parse_status(Some("")).unwrap(), None);
        assert_eq!(
            parse_status(Some("approved")).unwrap(),
            Some(PurchaseOrderStatus::Approved)
        );
        assert!(parse_status(Some("shipped")).is_err());
    }
}
