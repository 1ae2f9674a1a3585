//! Catalog service for locations, vendors and items

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::stock::{self, StockLine};

/// Catalog service for managing reference data
#[derive(Clone)]
pub struct CatalogService {
    db: PgPool,
}

/// A warehouse or vendor location
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Location {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateLocationInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateLocationInput {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub address: Option<String>,
}

/// A supplier of items
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Vendor {
    pub id: Uuid,
    pub name: String,
    pub location_id: Uuid,
    pub contact_email: String,
    pub phone: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateVendorInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub location_id: Uuid,
    #[validate(email)]
    pub contact_email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateVendorInput {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub location_id: Option<Uuid>,
    #[validate(email)]
    pub contact_email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// A stocked item
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub vendor_id: Uuid,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Item list row: name, vendor, price and stock on hand
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ItemListEntry {
    pub id: Uuid,
    pub name: String,
    pub vendor_id: Uuid,
    pub vendor_name: String,
    pub price: Decimal,
    pub stock_quantity: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateItemInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub description: Option<String>,
    pub vendor_id: Uuid,
    pub price: Decimal,
    /// Opening stock; later changes go through receipts and sales
    #[validate(range(min = 0))]
    pub stock_quantity: Option<i32>,
}

/// Item edits. Stock is not editable here.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateItemInput {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub vendor_id: Option<Uuid>,
    pub price: Option<Decimal>,
}

const LOCATION_COLUMNS: &str = "id, name, address, created_at";
const VENDOR_COLUMNS: &str = "id, name, location_id, contact_email, phone, address, created_at";
const ITEM_COLUMNS: &str =
    "id, name, description, vendor_id, price, stock_quantity, created_at, updated_at";

fn check_phone(phone: Option<&str>) -> AppResult<()> {
    if let Some(phone) = phone {
        shared::validate_phone(phone, 20).map_err(|m| AppError::invalid("phone", m))?;
    }
    Ok(())
}

fn check_price(price: Option<Decimal>) -> AppResult<()> {
    if let Some(price) = price {
        shared::validate_price(price).map_err(|m| AppError::invalid("price", m))?;
    }
    Ok(())
}

/// Lock everything a vendor delete cascades through and return the receipts
/// that must leave stock: lines of the vendors' purchase orders whose item
/// belongs to some other vendor and so survives the delete.
///
/// The vendor rows must already be locked by the caller.
async fn lock_surviving_receipts(
    conn: &mut PgConnection,
    vendor_ids: &[Uuid],
) -> AppResult<Vec<StockLine>> {
    sqlx::query("SELECT id FROM items WHERE vendor_id = ANY($1) ORDER BY id FOR UPDATE")
        .bind(vendor_ids)
        .execute(&mut *conn)
        .await?;

    sqlx::query("SELECT id FROM purchase_orders WHERE vendor_id = ANY($1) ORDER BY id FOR UPDATE")
        .bind(vendor_ids)
        .execute(&mut *conn)
        .await?;

    sqlx::query(
        r#"
        SELECT id FROM purchase_order_lines
        WHERE purchase_order_id IN (SELECT id FROM purchase_orders WHERE vendor_id = ANY($1))
        ORDER BY id
        FOR UPDATE
        "#,
    )
    .bind(vendor_ids)
    .execute(&mut *conn)
    .await?;

    let receipts = sqlx::query_as::<_, StockLine>(
        r#"
        SELECT l.item_id, l.quantity
        FROM purchase_order_lines l
        JOIN purchase_orders po ON po.id = l.purchase_order_id
        JOIN items i ON i.id = l.item_id
        WHERE po.vendor_id = ANY($1) AND NOT (i.vendor_id = ANY($1))
        "#,
    )
    .bind(vendor_ids)
    .fetch_all(&mut *conn)
    .await?;

    Ok(receipts)
}

impl CatalogService {
    /// Create a new CatalogService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    // ========================================================================
    // Locations
    // ========================================================================

    pub async fn list_locations(&self) -> AppResult<Vec<Location>> {
        let locations = sqlx::query_as::<_, Location>(&format!(
            "SELECT {} FROM locations ORDER BY name",
            LOCATION_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(locations)
    }

    pub async fn get_location(&self, location_id: Uuid) -> AppResult<Location> {
        sqlx::query_as::<_, Location>(&format!(
            "SELECT {} FROM locations WHERE id = $1",
            LOCATION_COLUMNS
        ))
        .bind(location_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Location".to_string()))
    }

    pub async fn create_location(&self, input: CreateLocationInput) -> AppResult<Location> {
        input.validate()?;

        let location = sqlx::query_as::<_, Location>(&format!(
            "INSERT INTO locations (name, address) VALUES ($1, $2) RETURNING {}",
            LOCATION_COLUMNS
        ))
        .bind(&input.name)
        .bind(input.address.unwrap_or_default())
        .fetch_one(&self.db)
        .await?;

        tracing::info!(location_id = %location.id, "Location created");
        Ok(location)
    }

    pub async fn update_location(
        &self,
        location_id: Uuid,
        input: UpdateLocationInput,
    ) -> AppResult<Location> {
        input.validate()?;

        sqlx::query_as::<_, Location>(&format!(
            r#"
            UPDATE locations
            SET name = COALESCE($1, name), address = COALESCE($2, address)
            WHERE id = $3
            RETURNING {}
            "#,
            LOCATION_COLUMNS
        ))
        .bind(&input.name)
        .bind(&input.address)
        .bind(location_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Location".to_string()))
    }

    /// Delete a location together with its vendors and their items.
    ///
    /// Purchase orders of those vendors go too; lines that received items of
    /// vendors elsewhere are taken back out of stock first.
    pub async fn delete_location(&self, location_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        sqlx::query_scalar::<_, Uuid>("SELECT id FROM locations WHERE id = $1 FOR UPDATE")
            .bind(location_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Location".to_string()))?;

        let vendor_ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM vendors WHERE location_id = $1 ORDER BY id FOR UPDATE",
        )
        .bind(location_id)
        .fetch_all(&mut *tx)
        .await?;

        let surviving_receipts = lock_surviving_receipts(&mut tx, &vendor_ids).await?;

        stock::remove_receipts(&mut tx, &surviving_receipts).await?;

        let result = sqlx::query("DELETE FROM locations WHERE id = $1")
            .bind(location_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Location".to_string()));
        }

        tx.commit().await?;
        tracing::info!(%location_id, "Location deleted");
        Ok(())
    }

    // ========================================================================
    // Vendors
    // ========================================================================

    pub async fn list_vendors(&self) -> AppResult<Vec<Vendor>> {
        let vendors = sqlx::query_as::<_, Vendor>(&format!(
            "SELECT {} FROM vendors ORDER BY name",
            VENDOR_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(vendors)
    }

    pub async fn get_vendor(&self, vendor_id: Uuid) -> AppResult<Vendor> {
        sqlx::query_as::<_, Vendor>(&format!("SELECT {} FROM vendors WHERE id = $1", VENDOR_COLUMNS))
            .bind(vendor_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Vendor".to_string()))
    }

    pub async fn create_vendor(&self, input: CreateVendorInput) -> AppResult<Vendor> {
        input.validate()?;
        check_phone(input.phone.as_deref())?;

        let vendor = sqlx::query_as::<_, Vendor>(&format!(
            r#"
            INSERT INTO vendors (name, location_id, contact_email, phone, address)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            VENDOR_COLUMNS
        ))
        .bind(&input.name)
        .bind(input.location_id)
        .bind(&input.contact_email)
        .bind(input.phone.unwrap_or_default())
        .bind(input.address.unwrap_or_default())
        .fetch_one(&self.db)
        .await?;

        tracing::info!(vendor_id = %vendor.id, "Vendor created");
        Ok(vendor)
    }

    pub async fn update_vendor(&self, vendor_id: Uuid, input: UpdateVendorInput) -> AppResult<Vendor> {
        input.validate()?;
        check_phone(input.phone.as_deref())?;

        sqlx::query_as::<_, Vendor>(&format!(
            r#"
            UPDATE vendors
            SET name = COALESCE($1, name),
                location_id = COALESCE($2, location_id),
                contact_email = COALESCE($3, contact_email),
                phone = COALESCE($4, phone),
                address = COALESCE($5, address)
            WHERE id = $6
            RETURNING {}
            "#,
            VENDOR_COLUMNS
        ))
        .bind(&input.name)
        .bind(input.location_id)
        .bind(&input.contact_email)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(vendor_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Vendor".to_string()))
    }

    /// Delete a vendor together with its items and purchase orders.
    ///
    /// Lines of those purchase orders that received other vendors' items are
    /// taken back out of stock first.
    pub async fn delete_vendor(&self, vendor_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        sqlx::query_scalar::<_, Uuid>("SELECT id FROM vendors WHERE id = $1 FOR UPDATE")
            .bind(vendor_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Vendor".to_string()))?;

        let surviving_receipts = lock_surviving_receipts(&mut tx, &[vendor_id]).await?;

        stock::remove_receipts(&mut tx, &surviving_receipts).await?;

        let result = sqlx::query("DELETE FROM vendors WHERE id = $1")
            .bind(vendor_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Vendor".to_string()));
        }

        tx.commit().await?;
        tracing::info!(%vendor_id, "Vendor deleted");
        Ok(())
    }

    // ========================================================================
    // Items
    // ========================================================================

    /// List items with their vendor name and stock on hand
    pub async fn list_items(&self) -> AppResult<Vec<ItemListEntry>> {
        let items = sqlx::query_as::<_, ItemListEntry>(
            r#"
            SELECT i.id, i.name, i.vendor_id, v.name AS vendor_name, i.price, i.stock_quantity
            FROM items i
            JOIN vendors v ON v.id = i.vendor_id
            ORDER BY i.name
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(items)
    }

    pub async fn get_item(&self, item_id: Uuid) -> AppResult<Item> {
        sqlx::query_as::<_, Item>(&format!("SELECT {} FROM items WHERE id = $1", ITEM_COLUMNS))
            .bind(item_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Item".to_string()))
    }

    pub async fn create_item(&self, input: CreateItemInput) -> AppResult<Item> {
        input.validate()?;
        check_price(Some(input.price))?;

        let item = sqlx::query_as::<_, Item>(&format!(
            r#"
            INSERT INTO items (name, description, vendor_id, price, stock_quantity)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            ITEM_COLUMNS
        ))
        .bind(&input.name)
        .bind(input.description.unwrap_or_default())
        .bind(input.vendor_id)
        .bind(input.price)
        .bind(input.stock_quantity.unwrap_or(0))
        .fetch_one(&self.db)
        .await?;

        tracing::info!(item_id = %item.id, stock_quantity = item.stock_quantity, "Item created");
        Ok(item)
    }

    /// Update item details. A price change does not touch the cost price of
    /// sales lines already recorded.
    pub async fn update_item(&self, item_id: Uuid, input: UpdateItemInput) -> AppResult<Item> {
        input.validate()?;
        check_price(input.price)?;

        sqlx::query_as::<_, Item>(&format!(
            r#"
            UPDATE items
            SET name = COALESCE($1, name),
                description = COALESCE($2, description),
                vendor_id = COALESCE($3, vendor_id),
                price = COALESCE($4, price),
                updated_at = NOW()
            WHERE id = $5
            RETURNING {}
            "#,
            ITEM_COLUMNS
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.vendor_id)
        .bind(input.price)
        .bind(item_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Item".to_string()))
    }

    /// Delete an item. Its purchase and sales lines go with it.
    pub async fn delete_item(&self, item_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(item_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Item".to_string()));
        }

        tracing::info!(%item_id, "Item deleted");
        Ok(())
    }
}
