//! Sales HTTP handlers: customers, sales orders and sales order items

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use shared::YearMonth;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::services::sales::{
    CreateCustomerInput, CreateSalesOrderInput, CreateSalesOrderItemInput, SalesOrderFilter,
    SalesOrderItemFilter, SalesService, UpdateCustomerInput, UpdateSalesOrderInput,
    UpdateSalesOrderItemInput,
};
use crate::AppState;

fn sales_service(state: &AppState) -> SalesService {
    SalesService::new(state.db.clone(), &state.config.display.currency_symbol)
}

/// Query string of the sales order list
#[derive(Debug, Default, Deserialize)]
pub struct SalesOrderQuery {
    /// Calendar month, `YYYY-MM`
    pub order_month: Option<String>,
    pub customer_id: Option<Uuid>,
}

impl SalesOrderQuery {
    fn into_filter(self) -> Result<SalesOrderFilter, AppError> {
        let order_month = match self.order_month.as_deref() {
            None | Some("") => None,
            Some(value) => Some(
                value
                    .parse::<YearMonth>()
                    .map_err(|m| AppError::invalid("order_month", m))?,
            ),
        };
        Ok(SalesOrderFilter {
            order_month,
            customer_id: self.customer_id,
        })
    }
}

// ============================================================================
// Customers
// ============================================================================

pub async fn list_customers(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let customers = sales_service(&state).list_customers().await?;
    Ok(Json(serde_json::json!({ "customers": customers })))
}

pub async fn get_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(sales_service(&state).get_customer(customer_id).await?))
}

pub async fn create_customer(
    State(state): State<AppState>,
    Json(input): Json<CreateCustomerInput>,
) -> Result<impl IntoResponse, AppError> {
    let customer = sales_service(&state).create_customer(input).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn update_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
    Json(input): Json<UpdateCustomerInput>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(sales_service(&state).update_customer(customer_id, input).await?))
}

/// Delete a customer and return the stock of all their orders
pub async fn delete_customer(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    sales_service(&state).delete_customer(customer_id).await?;
    tracing::debug!(%customer_id, user = %user.username, "Delete requested by user");
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Sales orders
// ============================================================================

/// Sales order list, optionally restricted to one month
pub async fn list_sales_orders(
    State(state): State<AppState>,
    Query(query): Query<SalesOrderQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = query.into_filter()?;
    let orders = sales_service(&state).list_sales_orders(filter).await?;
    Ok(Json(serde_json::json!({ "sales_orders": orders })))
}

/// Months available to the order-month filter
pub async fn list_order_months(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let months = sales_service(&state).order_months().await?;
    Ok(Json(serde_json::json!({ "months": months })))
}

pub async fn get_sales_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(sales_service(&state).get_sales_order(order_id).await?))
}

pub async fn create_sales_order(
    State(state): State<AppState>,
    Json(input): Json<CreateSalesOrderInput>,
) -> Result<impl IntoResponse, AppError> {
    let order = sales_service(&state).create_sales_order(input).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn update_sales_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(input): Json<UpdateSalesOrderInput>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(sales_service(&state).update_sales_order(order_id, input).await?))
}

pub async fn delete_sales_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    sales_service(&state).delete_sales_order(order_id).await?;
    tracing::debug!(%order_id, user = %user.username, "Delete requested by user");
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Sales order items
// ============================================================================

pub async fn list_sales_order_items(
    State(state): State<AppState>,
    Query(filter): Query<SalesOrderItemFilter>,
) -> Result<impl IntoResponse, AppError> {
    let lines = sales_service(&state).list_items(filter).await?;
    Ok(Json(serde_json::json!({ "sales_order_items": lines })))
}

pub async fn get_sales_order_item(
    State(state): State<AppState>,
    Path(line_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(sales_service(&state).get_item(line_id).await?))
}

pub async fn create_sales_order_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateSalesOrderItemInput>,
) -> Result<impl IntoResponse, AppError> {
    let line = sales_service(&state).create_item(input).await?;
    tracing::debug!(line_id = %line.id, user = %user.username, "Sale recorded");
    Ok((StatusCode::CREATED, Json(line)))
}

pub async fn update_sales_order_item(
    State(state): State<AppState>,
    Path(line_id): Path<Uuid>,
    Json(input): Json<UpdateSalesOrderItemInput>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(sales_service(&state).update_item(line_id, input).await?))
}

pub async fn delete_sales_order_item(
    State(state): State<AppState>,
    Path(line_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    sales_service(&state).delete_item(line_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(order_month: Option<&str>) -> SalesOrderQuery {
        SalesOrderQuery {
            order_month: order_month.map(str::to_string),
            customer_id: None,
        }
    }

    #[test]
    fn test_order_month_filter_parsed() {
        let filter = query(Some("2024-05")).into_filter().unwrap();
        assert_eq!(filter.order_month, YearMonth::new(2024, 5));
    }

    #[test]
    fn test_blank_order_month_means_all() {
        assert!(query(None).into_filter().unwrap().order_month.is_none());
        assert!(query(Some("")).into_filter().unwrap().order_month.is_none());
    }

    #[test]
    fn test_bad_order_month_is_a_field_error() {
        for bad in ["2024-13", "May", "2024"] {
            assert!(matches!(
                query(Some(bad)).into_filter(),
                Err(AppError::Validation { field, .. }) if field == "order_month"
            ));
        }
    }
}
