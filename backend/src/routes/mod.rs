//! Route definitions for the ERP backend

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::admin_auth, AppState};

/// Login, logout and health routes (public)
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::login_page).post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/health", get(handlers::health_check))
}

/// Admin routes, staff only
pub fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin", get(handlers::admin_index))
        .route("/admin/", get(handlers::admin_index))
        // Catalog
        .nest("/admin/locations", location_routes())
        .nest("/admin/vendors", vendor_routes())
        .nest("/admin/items", item_routes())
        // Procurement
        .nest("/admin/purchase-orders", purchase_order_routes())
        .nest("/admin/purchase-order-lines", purchase_order_line_routes())
        // Planning
        .nest("/admin/component-demands", component_demand_routes())
        .nest("/admin/consumption-outputs", consumption_output_routes())
        .nest("/admin/inventory-reconciliations", reconciliation_routes())
        // Sales
        .nest("/admin/customers", customer_routes())
        .nest("/admin/sales-orders", sales_order_routes())
        .nest("/admin/sales-order-items", sales_order_item_routes())
        // Fulfillment
        .nest("/admin/shipments", shipment_routes())
        .nest("/admin/invoices", invoice_routes())
        .route_layer(middleware::from_fn_with_state(state, admin_auth))
}

fn location_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_locations).post(handlers::create_location))
        .route(
            "/:location_id",
            get(handlers::get_location)
                .put(handlers::update_location)
                .delete(handlers::delete_location),
        )
}

fn vendor_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_vendors).post(handlers::create_vendor))
        .route(
            "/:vendor_id",
            get(handlers::get_vendor)
                .put(handlers::update_vendor)
                .delete(handlers::delete_vendor),
        )
}

fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_items).post(handlers::create_item))
        .route(
            "/:item_id",
            get(handlers::get_item)
                .put(handlers::update_item)
                .delete(handlers::delete_item),
        )
}

fn purchase_order_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_purchase_orders).post(handlers::create_purchase_order),
        )
        .route(
            "/:order_id",
            get(handlers::get_purchase_order)
                .put(handlers::update_purchase_order)
                .delete(handlers::delete_purchase_order),
        )
}

fn purchase_order_line_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_purchase_order_lines).post(handlers::create_purchase_order_line),
        )
        .route(
            "/:line_id",
            get(handlers::get_purchase_order_line)
                .put(handlers::update_purchase_order_line)
                .delete(handlers::delete_purchase_order_line),
        )
}

fn component_demand_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_component_demands).post(handlers::create_component_demand),
        )
        .route(
            "/:demand_id",
            get(handlers::get_component_demand)
                .put(handlers::update_component_demand)
                .delete(handlers::delete_component_demand),
        )
}

fn consumption_output_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_consumption_outputs).post(handlers::create_consumption_output),
        )
        .route(
            "/:output_id",
            get(handlers::get_consumption_output)
                .put(handlers::update_consumption_output)
                .delete(handlers::delete_consumption_output),
        )
}

fn reconciliation_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_reconciliations).post(handlers::create_reconciliation),
        )
        .route(
            "/:reconciliation_id",
            get(handlers::get_reconciliation)
                .put(handlers::update_reconciliation)
                .delete(handlers::delete_reconciliation),
        )
}

fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_customers).post(handlers::create_customer))
        .route(
            "/:customer_id",
            get(handlers::get_customer)
                .put(handlers::update_customer)
                .delete(handlers::delete_customer),
        )
}

fn sales_order_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_sales_orders).post(handlers::create_sales_order),
        )
        .route("/months", get(handlers::list_order_months))
        .route(
            "/:order_id",
            get(handlers::get_sales_order)
                .put(handlers::update_sales_order)
                .delete(handlers::delete_sales_order),
        )
}

fn sales_order_item_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_sales_order_items).post(handlers::create_sales_order_item),
        )
        .route(
            "/:line_id",
            get(handlers::get_sales_order_item)
                .put(handlers::update_sales_order_item)
                .delete(handlers::delete_sales_order_item),
        )
}

fn shipment_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_shipments).post(handlers::create_shipment))
        .route(
            "/:shipment_id",
            get(handlers::get_shipment)
                .put(handlers::update_shipment)
                .delete(handlers::delete_shipment),
        )
}

fn invoice_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_invoices).post(handlers::create_invoice))
        .route(
            "/:invoice_id",
            get(handlers::get_invoice)
                .put(handlers::update_invoice)
                .delete(handlers::delete_invoice),
        )
}
