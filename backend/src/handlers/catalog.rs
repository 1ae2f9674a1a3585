//! Catalog HTTP handlers: locations, vendors and items

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::services::catalog::{
    CatalogService, CreateItemInput, CreateLocationInput, CreateVendorInput, UpdateItemInput,
    UpdateLocationInput, UpdateVendorInput,
};
use crate::AppState;

// ============================================================================
// Locations
// ============================================================================

pub async fn list_locations(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let service = CatalogService::new(state.db.clone());
    let locations = service.list_locations().await?;
    Ok(Json(serde_json::json!({ "locations": locations })))
}

pub async fn get_location(
    State(state): State<AppState>,
    Path(location_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let service = CatalogService::new(state.db.clone());
    Ok(Json(service.get_location(location_id).await?))
}

pub async fn create_location(
    State(state): State<AppState>,
    Json(input): Json<CreateLocationInput>,
) -> Result<impl IntoResponse, AppError> {
    let service = CatalogService::new(state.db.clone());
    let location = service.create_location(input).await?;
    Ok((StatusCode::CREATED, Json(location)))
}

pub async fn update_location(
    State(state): State<AppState>,
    Path(location_id): Path<Uuid>,
    Json(input): Json<UpdateLocationInput>,
) -> Result<impl IntoResponse, AppError> {
    let service = CatalogService::new(state.db.clone());
    Ok(Json(service.update_location(location_id, input).await?))
}

/// Delete a location together with its vendors, items and their orders
pub async fn delete_location(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(location_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let service = CatalogService::new(state.db.clone());
    service.delete_location(location_id).await?;
    tracing::debug!(%location_id, user = %user.username, "Delete requested by user");
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Vendors
// ============================================================================

pub async fn list_vendors(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let service = CatalogService::new(state.db.clone());
    let vendors = service.list_vendors().await?;
    Ok(Json(serde_json::json!({ "vendors": vendors })))
}

pub async fn get_vendor(
    State(state): State<AppState>,
    Path(vendor_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let service = CatalogService::new(state.db.clone());
    Ok(Json(service.get_vendor(vendor_id).await?))
}

pub async fn create_vendor(
    State(state): State<AppState>,
    Json(input): Json<CreateVendorInput>,
) -> Result<impl IntoResponse, AppError> {
    let service = CatalogService::new(state.db.clone());
    let vendor = service.create_vendor(input).await?;
    Ok((StatusCode::CREATED, Json(vendor)))
}

pub async fn update_vendor(
    State(state): State<AppState>,
    Path(vendor_id): Path<Uuid>,
    Json(input): Json<UpdateVendorInput>,
) -> Result<impl IntoResponse, AppError> {
    let service = CatalogService::new(state.db.clone());
    Ok(Json(service.update_vendor(vendor_id, input).await?))
}

pub async fn delete_vendor(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(vendor_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let service = CatalogService::new(state.db.clone());
    service.delete_vendor(vendor_id).await?;
    tracing::debug!(%vendor_id, user = %user.username, "Delete requested by user");
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Items
// ============================================================================

/// Item list with vendor name and stock on hand
pub async fn list_items(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let service = CatalogService::new(state.db.clone());
    let items = service.list_items().await?;
    Ok(Json(serde_json::json!({ "items": items })))
}

pub async fn get_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let service = CatalogService::new(state.db.clone());
    Ok(Json(service.get_item(item_id).await?))
}

pub async fn create_item(
    State(state): State<AppState>,
    Json(input): Json<CreateItemInput>,
) -> Result<impl IntoResponse, AppError> {
    let service = CatalogService::new(state.db.clone());
    let item = service.create_item(input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
    Json(input): Json<UpdateItemInput>,
) -> Result<impl IntoResponse, AppError> {
    let service = CatalogService::new(state.db.clone());
    Ok(Json(service.update_item(item_id, input).await?))
}

pub async fn delete_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(item_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let service = CatalogService::new(state.db.clone());
    service.delete_item(item_id).await?;
    tracing::debug!(%item_id, user = %user.username, "Delete requested by user");
    Ok(StatusCode::NO_CONTENT)
}
