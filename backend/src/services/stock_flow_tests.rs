//! Stock ledger tests against PostgreSQL
//!
//! These drive the services end to end on a scratch database created by
//! `sqlx::test` from `./migrations`. They need a server reachable through
//! `DATABASE_URL`, so they are ignored by default.
//! Run with: cargo test -p erp-backend -- --ignored stock_flow

use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::services::catalog::{CreateItemInput, CreateLocationInput, CreateVendorInput};
use crate::services::procurement::{CreatePurchaseOrderInput, CreatePurchaseOrderLineInput};
use crate::services::sales::{
    CreateCustomerInput, CreateSalesOrderInput, CreateSalesOrderItemInput,
    UpdateSalesOrderItemInput,
};
use crate::services::{CatalogService, ProcurementService, SalesService};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

struct Fixture {
    catalog: CatalogService,
    procurement: ProcurementService,
    sales: SalesService,
    vendor_id: Uuid,
}

impl Fixture {
    async fn new(pool: &PgPool) -> Self {
        let catalog = CatalogService::new(pool.clone());
        let location = catalog
            .create_location(CreateLocationInput {
                name: "Main warehouse".to_string(),
                address: None,
            })
            .await
            .unwrap();
        let vendor = catalog
            .create_vendor(CreateVendorInput {
                name: "Acme Supplies".to_string(),
                location_id: location.id,
                contact_email: "orders@acme.example.com".to_string(),
                phone: None,
                address: None,
            })
            .await
            .unwrap();

        Self {
            catalog,
            procurement: ProcurementService::new(pool.clone()),
            sales: SalesService::new(pool.clone(), "₹"),
            vendor_id: vendor.id,
        }
    }

    async fn item(&self, name: &str, price: &str, stock: i32) -> Uuid {
        self.catalog
            .create_item(CreateItemInput {
                name: name.to_string(),
                description: None,
                vendor_id: self.vendor_id,
                price: dec(price),
                stock_quantity: Some(stock),
            })
            .await
            .unwrap()
            .id
    }

    async fn stock(&self, item_id: Uuid) -> i32 {
        self.catalog.get_item(item_id).await.unwrap().stock_quantity
    }

    async fn order(&self) -> Uuid {
        let customer = self
            .sales
            .create_customer(CreateCustomerInput {
                name: "Ravi Traders".to_string(),
                email: None,
                phone: None,
                address: None,
            })
            .await
            .unwrap();
        self.sales
            .create_sales_order(CreateSalesOrderInput {
                customer_id: customer.id,
                total_amount: None,
            })
            .await
            .unwrap()
            .id
    }

    async fn sell(
        &self,
        order_id: Uuid,
        item_id: Uuid,
        quantity: i32,
        unit_price: &str,
    ) -> Result<Uuid, AppError> {
        self.sales
            .create_item(CreateSalesOrderItemInput {
                sales_order_id: order_id,
                item_id,
                quantity,
                unit_price: Some(dec(unit_price)),
            })
            .await
            .map(|line| line.id)
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn stock_flow_worked_example(pool: PgPool) {
    let fx = Fixture::new(&pool).await;
    let widget = fx.item("Widget", "5.00", 10).await;
    let order_id = fx.order().await;

    let stamped_today: bool =
        sqlx::query_scalar("SELECT order_date = CURRENT_DATE FROM sales_orders WHERE id = $1")
            .bind(order_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert!(stamped_today);

    let line_id = fx.sell(order_id, widget, 3, "7.00").await.unwrap();
    assert_eq!(fx.stock(widget).await, 7);

    let detail = fx.sales.get_sales_order(order_id).await.unwrap();
    assert_eq!(detail.lines[0].line.cost_price, dec("5.00"));
    assert_eq!(detail.profit_loss.total_profit, dec("6.00"));

    fx.sales
        .update_item(
            line_id,
            UpdateSalesOrderItemInput {
                item_id: None,
                quantity: Some(5),
                unit_price: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(fx.stock(widget).await, 5);

    fx.sales.delete_item(line_id).await.unwrap();
    assert_eq!(fx.stock(widget).await, 10);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn stock_flow_oversell_leaves_stock_alone(pool: PgPool) {
    let fx = Fixture::new(&pool).await;
    let widget = fx.item("Widget", "5.00", 2).await;
    let order_id = fx.order().await;

    let result = fx.sell(order_id, widget, 3, "7.00").await;

    assert!(matches!(result, Err(AppError::OutOfStock { available: 2, .. })));
    assert_eq!(fx.stock(widget).await, 2);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn stock_flow_order_delete_restores_each_line_once(pool: PgPool) {
    let fx = Fixture::new(&pool).await;
    let widget = fx.item("Widget", "5.00", 10).await;
    let gadget = fx.item("Gadget", "2.50", 6).await;
    let order_id = fx.order().await;

    fx.sell(order_id, widget, 2, "6.00").await.unwrap();
    fx.sell(order_id, widget, 3, "6.00").await.unwrap();
    fx.sell(order_id, gadget, 4, "3.00").await.unwrap();
    assert_eq!(fx.stock(widget).await, 5);
    assert_eq!(fx.stock(gadget).await, 2);

    fx.sales.delete_sales_order(order_id).await.unwrap();

    assert_eq!(fx.stock(widget).await, 10);
    assert_eq!(fx.stock(gadget).await, 6);
    assert!(matches!(
        fx.sales.get_sales_order(order_id).await,
        Err(AppError::NotFound(_))
    ));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn stock_flow_cost_price_frozen_after_price_change(pool: PgPool) {
    let fx = Fixture::new(&pool).await;
    let widget = fx.item("Widget", "5.00", 10).await;
    let order_id = fx.order().await;
    let line_id = fx.sell(order_id, widget, 1, "7.00").await.unwrap();

    sqlx::query("UPDATE items SET price = 9.00 WHERE id = $1")
        .bind(widget)
        .execute(&pool)
        .await
        .unwrap();
    let line = fx
        .sales
        .update_item(
            line_id,
            UpdateSalesOrderItemInput {
                item_id: None,
                quantity: Some(2),
                unit_price: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(line.cost_price, dec("5.00"));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn stock_flow_sold_receipt_cannot_be_removed(pool: PgPool) {
    let fx = Fixture::new(&pool).await;
    let widget = fx.item("Widget", "5.00", 0).await;
    let po = fx
        .procurement
        .create_purchase_order(CreatePurchaseOrderInput {
            order_number: "PO-2024-001".to_string(),
            vendor_id: fx.vendor_id,
            order_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            delivery_date: None,
            status: None,
            total_amount: None,
            lines: Vec::new(),
        })
        .await
        .unwrap();
    let receipt = fx
        .procurement
        .create_line(CreatePurchaseOrderLineInput {
            purchase_order_id: po.order.id,
            item_id: widget,
            quantity: 5,
            rate: dec("4.00"),
        })
        .await
        .unwrap();
    assert_eq!(fx.stock(widget).await, 5);

    let order_id = fx.order().await;
    fx.sell(order_id, widget, 4, "7.00").await.unwrap();

    let result = fx.procurement.delete_line(receipt.id).await;
    assert!(matches!(result, Err(AppError::InsufficientStock(_))));
    assert_eq!(fx.stock(widget).await, 1);

    let result = fx.procurement.delete_purchase_order(po.order.id).await;
    assert!(matches!(result, Err(AppError::InsufficientStock(_))));
    assert_eq!(fx.stock(widget).await, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn stock_flow_line_waits_for_order_delete(pool: PgPool) {
    let fx = Fixture::new(&pool).await;
    let widget = fx.item("Widget", "5.00", 10).await;
    let order_id = fx.order().await;

    // Take the order lock the way an order delete does, then try to sell into it
    let mut deleting = pool.begin().await.unwrap();
    sqlx::query("SELECT id FROM sales_orders WHERE id = $1 FOR UPDATE")
        .bind(order_id)
        .execute(&mut *deleting)
        .await
        .unwrap();

    let sales = fx.sales.clone();
    let sale = tokio::spawn(async move {
        sales
            .create_item(CreateSalesOrderItemInput {
                sales_order_id: order_id,
                item_id: widget,
                quantity: 3,
                unit_price: None,
            })
            .await
    });

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!sale.is_finished(), "sale must wait for the order lock");

    sqlx::query("DELETE FROM sales_orders WHERE id = $1")
        .bind(order_id)
        .execute(&mut *deleting)
        .await
        .unwrap();
    deleting.commit().await.unwrap();

    let result = sale.await.unwrap();
    assert!(matches!(result, Err(AppError::InvalidReference(_))));
    assert_eq!(fx.stock(widget).await, 10);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn stock_flow_concurrent_sale_and_order_delete_conserve_stock(pool: PgPool) {
    let fx = Fixture::new(&pool).await;
    let widget = fx.item("Widget", "5.00", 100).await;

    for _ in 0..10 {
        let order_id = fx.order().await;
        fx.sell(order_id, widget, 1, "6.00").await.unwrap();

        let sales = fx.sales.clone();
        let sale = tokio::spawn(async move {
            sales
                .create_item(CreateSalesOrderItemInput {
                    sales_order_id: order_id,
                    item_id: widget,
                    quantity: 2,
                    unit_price: None,
                })
                .await
        });
        let sales = fx.sales.clone();
        let delete = tokio::spawn(async move { sales.delete_sales_order(order_id).await });

        let _ = sale.await.unwrap();
        delete.await.unwrap().unwrap();

        // Whatever the interleaving, nothing may be left sold on a deleted order
        let sold: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM sales_order_items WHERE item_id = $1",
        )
        .bind(widget)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(sold, 0);
        assert_eq!(fx.stock(widget).await, 100);
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn stock_flow_customer_delete_restores_all_orders(pool: PgPool) {
    let fx = Fixture::new(&pool).await;
    let widget = fx.item("Widget", "5.00", 10).await;

    let first = fx.order().await;
    fx.sell(first, widget, 2, "6.00").await.unwrap();
    let customer_id = fx.sales.get_sales_order(first).await.unwrap().order.customer_id;
    let second = fx
        .sales
        .create_sales_order(CreateSalesOrderInput {
            customer_id,
            total_amount: None,
        })
        .await
        .unwrap()
        .id;
    fx.sell(second, widget, 5, "6.00").await.unwrap();
    assert_eq!(fx.stock(widget).await, 3);

    fx.sales.delete_customer(customer_id).await.unwrap();

    assert_eq!(fx.stock(widget).await, 10);
}
