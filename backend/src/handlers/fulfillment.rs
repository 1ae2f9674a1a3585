//! Shipment and invoice HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::services::fulfillment::{
    CreateInvoiceInput, CreateShipmentInput, FulfillmentFilter, FulfillmentService,
    UpdateInvoiceInput, UpdateShipmentInput,
};
use crate::AppState;

pub async fn list_shipments(
    State(state): State<AppState>,
    Query(filter): Query<FulfillmentFilter>,
) -> impl IntoResponse {
    let service = FulfillmentService::new(state.db.clone());

    match service.list_shipments(filter).await {
        Ok(shipments) => {
            (StatusCode::OK, Json(serde_json::json!({ "shipments": shipments }))).into_response()
        }
        Err(e) => e.into_response(),
    }
}

pub async fn get_shipment(
    State(state): State<AppState>,
    Path(shipment_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = FulfillmentService::new(state.db.clone());

    match service.get_shipment(shipment_id).await {
        Ok(shipment) => (StatusCode::OK, Json(shipment)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn create_shipment(
    State(state): State<AppState>,
    Json(input): Json<CreateShipmentInput>,
) -> impl IntoResponse {
    let service = FulfillmentService::new(state.db.clone());

    match service.create_shipment(input).await {
        Ok(shipment) => (StatusCode::CREATED, Json(shipment)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn update_shipment(
    State(state): State<AppState>,
    Path(shipment_id): Path<Uuid>,
    Json(input): Json<UpdateShipmentInput>,
) -> impl IntoResponse {
    let service = FulfillmentService::new(state.db.clone());

    match service.update_shipment(shipment_id, input).await {
        Ok(shipment) => (StatusCode::OK, Json(shipment)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn delete_shipment(
    State(state): State<AppState>,
    Path(shipment_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = FulfillmentService::new(state.db.clone());

    match service.delete_shipment(shipment_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn list_invoices(
    State(state): State<AppState>,
    Query(filter): Query<FulfillmentFilter>,
) -> impl IntoResponse {
    let service = FulfillmentService::new(state.db.clone());

    match service.list_invoices(filter).await {
        Ok(invoices) => {
            (StatusCode::OK, Json(serde_json::json!({ "invoices": invoices }))).into_response()
        }
        Err(e) => e.into_response(),
    }
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = FulfillmentService::new(state.db.clone());

    match service.get_invoice(invoice_id).await {
        Ok(invoice) => (StatusCode::OK, Json(invoice)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn create_invoice(
    State(state): State<AppState>,
    Json(input): Json<CreateInvoiceInput>,
) -> impl IntoResponse {
    let service = FulfillmentService::new(state.db.clone());

    match service.create_invoice(input).await {
        Ok(invoice) => (StatusCode::CREATED, Json(invoice)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn update_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
    Json(input): Json<UpdateInvoiceInput>,
) -> impl IntoResponse {
    let service = FulfillmentService::new(state.db.clone());

    match service.update_invoice(invoice_id, input).await {
        Ok(invoice) => (StatusCode::OK, Json(invoice)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn delete_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = FulfillmentService::new(state.db.clone());

    match service.delete_invoice(invoice_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}
