//! Stock ledger
//!
//! The only code that writes `quantity_on_hand`. Every primitive takes the
//! caller's open connection (normally `&mut *tx`) so callers compose several
//! primitives into one atomic unit. Rows are locked with `SELECT … FOR UPDATE`
//! before the new level is computed through [`StockLevel`], and each change
//! appends one `stock_movements` row.
//!
//! Lock order within one unit: warehouse rows before store rows, and
//! ascending product id within each. Submission takes every warehouse row up
//! front through [`lock_available`]; returns do the same before releasing
//! anything from the store, and [`reverse_transfer`] credits the warehouse
//! before debiting the store.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::{
    LocationKind, MovementKind, MovementRef, StockLevel, StockMovement, StoreStock,
    WarehouseStock,
};
use sqlx::{FromRow, PgConnection, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Catalog entry as the ledger needs it
#[derive(Debug, Clone, FromRow)]
pub struct CatalogProduct {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub category: Option<String>,
    pub purchase_price: Decimal,
    pub selling_price: Option<Decimal>,
}

#[derive(Debug, FromRow)]
struct MovementRow {
    id: Uuid,
    business_id: Uuid,
    product_id: Uuid,
    location_kind: String,
    location_id: Uuid,
    kind: String,
    quantity: i32,
    balance_after: i32,
    reference_type: String,
    reference: String,
    actor_id: Uuid,
    created_at: DateTime<Utc>,
}

impl TryFrom<MovementRow> for StockMovement {
    type Error = AppError;

    fn try_from(row: MovementRow) -> Result<Self, Self::Error> {
        let location_kind = LocationKind::parse(&row.location_kind).ok_or_else(|| {
            AppError::Internal(format!("unknown location kind {}", row.location_kind))
        })?;
        let kind = MovementKind::parse(&row.kind)
            .ok_or_else(|| AppError::Internal(format!("unknown movement kind {}", row.kind)))?;

        Ok(StockMovement {
            id: row.id,
            business_id: row.business_id,
            product_id: row.product_id,
            location_kind,
            location_id: row.location_id,
            kind,
            quantity: row.quantity,
            balance_after: row.balance_after,
            reference_type: row.reference_type,
            reference: row.reference,
            actor_id: row.actor_id,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct WarehouseStockRow {
    warehouse_id: Uuid,
    product_id: Uuid,
    product_code: String,
    product_name: String,
    quantity_on_hand: i32,
    quantity_reserved: i32,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct StoreStockRow {
    store_id: Uuid,
    product_id: Uuid,
    product_code: String,
    product_name: String,
    category: Option<String>,
    purchase_price: Decimal,
    selling_price: Option<Decimal>,
    quantity_on_hand: i32,
    updated_at: DateTime<Utc>,
}

// ============================================================================
// Lookups
// ============================================================================

/// Load a catalog product or fail with `UnknownProduct`
pub async fn catalog_product(
    conn: &mut PgConnection,
    business_id: Uuid,
    product_id: Uuid,
) -> AppResult<CatalogProduct> {
    sqlx::query_as::<_, CatalogProduct>(
        r#"
        SELECT id, code, name, category, purchase_price, selling_price
        FROM products
        WHERE id = $1 AND business_id = $2
        "#,
    )
    .bind(product_id)
    .bind(business_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(AppError::UnknownProduct(product_id))
}

/// Warehouse name, failing with `UnknownLocation`
pub async fn ensure_warehouse(
    conn: &mut PgConnection,
    business_id: Uuid,
    warehouse_id: Uuid,
) -> AppResult<String> {
    sqlx::query_scalar::<_, String>("SELECT name FROM warehouses WHERE id = $1 AND business_id = $2")
        .bind(warehouse_id)
        .bind(business_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(AppError::UnknownLocation(warehouse_id))
}

/// Store code, failing with `UnknownLocation`
pub async fn ensure_store(
    conn: &mut PgConnection,
    business_id: Uuid,
    store_id: Uuid,
) -> AppResult<String> {
    sqlx::query_scalar::<_, String>("SELECT code FROM stores WHERE id = $1 AND business_id = $2")
        .bind(store_id)
        .bind(business_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(AppError::UnknownLocation(store_id))
}

/// Lock the warehouse rows of `product_ids` and report what each can give.
///
/// Products without a stock row are absent from the map.
pub async fn lock_available(
    conn: &mut PgConnection,
    business_id: Uuid,
    warehouse_id: Uuid,
    product_ids: &[Uuid],
) -> AppResult<HashMap<Uuid, i64>> {
    let rows = sqlx::query_as::<_, (Uuid, i32, i32)>(
        r#"
        SELECT product_id, quantity_on_hand, quantity_reserved
        FROM warehouse_stock
        WHERE warehouse_id = $1 AND business_id = $2 AND product_id = ANY($3)
        ORDER BY product_id
        FOR UPDATE
        "#,
    )
    .bind(warehouse_id)
    .bind(business_id)
    .bind(product_ids)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(product_id, on_hand, reserved)| (product_id, (on_hand - reserved) as i64))
        .collect())
}

// ============================================================================
// Primitives
// ============================================================================

/// Debit the warehouse row for `product_id`
pub async fn withdraw_from_warehouse(
    conn: &mut PgConnection,
    business_id: Uuid,
    warehouse_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    reference: &MovementRef,
) -> AppResult<StockLevel> {
    let product = catalog_product(conn, business_id, product_id).await?;

    let row = sqlx::query_as::<_, (i32, i32)>(
        r#"
        SELECT quantity_on_hand, quantity_reserved
        FROM warehouse_stock
        WHERE warehouse_id = $1 AND product_id = $2 AND business_id = $3
        FOR UPDATE
        "#,
    )
    .bind(warehouse_id)
    .bind(product_id)
    .bind(business_id)
    .fetch_optional(&mut *conn)
    .await?;

    let level = match row {
        Some((on_hand, reserved)) => StockLevel::new(on_hand, reserved)
            .map_err(|e| AppError::from_stock(&product.code, e))?,
        None => {
            ensure_warehouse(conn, business_id, warehouse_id).await?;
            StockLevel::empty()
        }
    };
    let after = level
        .withdraw(quantity)
        .map_err(|e| AppError::from_stock(&product.code, e))?;

    write_warehouse_level(conn, warehouse_id, product_id, after).await?;
    record_movement(
        conn,
        business_id,
        product_id,
        MovementKind::WarehouseOut,
        warehouse_id,
        quantity,
        after.on_hand,
        reference,
    )
    .await?;

    Ok(after)
}

/// Credit the warehouse row, creating it if the product never had one
pub async fn restore_to_warehouse(
    conn: &mut PgConnection,
    business_id: Uuid,
    warehouse_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    reference: &MovementRef,
) -> AppResult<StockLevel> {
    let product = catalog_product(conn, business_id, product_id).await?;
    ensure_warehouse(conn, business_id, warehouse_id).await?;

    sqlx::query(
        r#"
        INSERT INTO warehouse_stock (warehouse_id, product_id, business_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (warehouse_id, product_id) DO NOTHING
        "#,
    )
    .bind(warehouse_id)
    .bind(product_id)
    .bind(business_id)
    .execute(&mut *conn)
    .await?;

    let (on_hand, reserved) = sqlx::query_as::<_, (i32, i32)>(
        r#"
        SELECT quantity_on_hand, quantity_reserved
        FROM warehouse_stock
        WHERE warehouse_id = $1 AND product_id = $2
        FOR UPDATE
        "#,
    )
    .bind(warehouse_id)
    .bind(product_id)
    .fetch_one(&mut *conn)
    .await?;

    let after = StockLevel::new(on_hand, reserved)
        .and_then(|level| level.deposit(quantity))
        .map_err(|e| AppError::from_stock(&product.code, e))?;

    write_warehouse_level(conn, warehouse_id, product_id, after).await?;
    record_movement(
        conn,
        business_id,
        product_id,
        MovementKind::WarehouseIn,
        warehouse_id,
        quantity,
        after.on_hand,
        reference,
    )
    .await?;

    Ok(after)
}

/// Create or refresh the store's product row without touching its quantity.
///
/// An existing row keeps its quantity and selling price; category is filled
/// in when the store has none and the purchase price follows the shipment.
pub async fn upsert_store_product(
    conn: &mut PgConnection,
    business_id: Uuid,
    store_id: Uuid,
    product: &CatalogProduct,
    purchase_price: Decimal,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO store_stock (
            business_id, store_id, product_id, product_code, product_name,
            category, purchase_price, selling_price, quantity_on_hand
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0)
        ON CONFLICT (store_id, product_code) DO UPDATE
        SET product_id = EXCLUDED.product_id,
            category = COALESCE(store_stock.category, EXCLUDED.category),
            purchase_price = EXCLUDED.purchase_price,
            updated_at = NOW()
        "#,
    )
    .bind(business_id)
    .bind(store_id)
    .bind(product.id)
    .bind(&product.code)
    .bind(&product.name)
    .bind(&product.category)
    .bind(purchase_price)
    .bind(product.selling_price)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Credit the store's row, creating it on first receipt
pub async fn receive_into_store(
    conn: &mut PgConnection,
    business_id: Uuid,
    store_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    reference: &MovementRef,
) -> AppResult<StockLevel> {
    let product = catalog_product(conn, business_id, product_id).await?;
    ensure_store(conn, business_id, store_id).await?;

    sqlx::query(
        r#"
        INSERT INTO store_stock (
            business_id, store_id, product_id, product_code, product_name,
            category, purchase_price, selling_price, quantity_on_hand
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0)
        ON CONFLICT (store_id, product_code) DO NOTHING
        "#,
    )
    .bind(business_id)
    .bind(store_id)
    .bind(product.id)
    .bind(&product.code)
    .bind(&product.name)
    .bind(&product.category)
    .bind(product.purchase_price)
    .bind(product.selling_price)
    .execute(&mut *conn)
    .await?;

    let on_hand = lock_store_row(conn, store_id, &product.code)
        .await?
        .unwrap_or(0);
    let after = StockLevel::new(on_hand, 0)
        .and_then(|level| level.deposit(quantity))
        .map_err(|e| AppError::from_stock(&product.code, e))?;

    write_store_level(conn, store_id, &product.code, after).await?;
    record_movement(
        conn,
        business_id,
        product_id,
        MovementKind::StoreIn,
        store_id,
        quantity,
        after.on_hand,
        reference,
    )
    .await?;

    Ok(after)
}

/// Debit the store's row for `product_id`
pub async fn release_from_store(
    conn: &mut PgConnection,
    business_id: Uuid,
    store_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    reference: &MovementRef,
) -> AppResult<StockLevel> {
    let product = catalog_product(conn, business_id, product_id).await?;
    ensure_store(conn, business_id, store_id).await?;

    let level = match lock_store_row(conn, store_id, &product.code).await? {
        Some(on_hand) => {
            StockLevel::new(on_hand, 0).map_err(|e| AppError::from_stock(&product.code, e))?
        }
        None => StockLevel::empty(),
    };
    let after = level
        .withdraw(quantity)
        .map_err(|e| AppError::from_stock(&product.code, e))?;

    write_store_level(conn, store_id, &product.code, after).await?;
    record_movement(
        conn,
        business_id,
        product_id,
        MovementKind::StoreOut,
        store_id,
        quantity,
        after.on_hand,
        reference,
    )
    .await?;

    Ok(after)
}

/// Warehouse to store in one step
pub async fn transfer_stock(
    conn: &mut PgConnection,
    business_id: Uuid,
    warehouse_id: Uuid,
    store_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    reference: &MovementRef,
) -> AppResult<()> {
    withdraw_from_warehouse(conn, business_id, warehouse_id, product_id, quantity, reference).await?;
    receive_into_store(conn, business_id, store_id, product_id, quantity, reference).await?;
    Ok(())
}

/// Store back to warehouse in one step, warehouse row first
pub async fn reverse_transfer(
    conn: &mut PgConnection,
    business_id: Uuid,
    warehouse_id: Uuid,
    store_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    reference: &MovementRef,
) -> AppResult<()> {
    restore_to_warehouse(conn, business_id, warehouse_id, product_id, quantity, reference).await?;
    release_from_store(conn, business_id, store_id, product_id, quantity, reference).await?;
    Ok(())
}

async fn lock_store_row(
    conn: &mut PgConnection,
    store_id: Uuid,
    product_code: &str,
) -> AppResult<Option<i32>> {
    let on_hand = sqlx::query_scalar::<_, i32>(
        r#"
        SELECT quantity_on_hand
        FROM store_stock
        WHERE store_id = $1 AND product_code = $2
        FOR UPDATE
        "#,
    )
    .bind(store_id)
    .bind(product_code)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(on_hand)
}

async fn write_warehouse_level(
    conn: &mut PgConnection,
    warehouse_id: Uuid,
    product_id: Uuid,
    level: StockLevel,
) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE warehouse_stock
        SET quantity_on_hand = $1, quantity_reserved = $2, updated_at = NOW()
        WHERE warehouse_id = $3 AND product_id = $4
        "#,
    )
    .bind(level.on_hand)
    .bind(level.reserved)
    .bind(warehouse_id)
    .bind(product_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn write_store_level(
    conn: &mut PgConnection,
    store_id: Uuid,
    product_code: &str,
    level: StockLevel,
) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE store_stock
        SET quantity_on_hand = $1, updated_at = NOW()
        WHERE store_id = $2 AND product_code = $3
        "#,
    )
    .bind(level.on_hand)
    .bind(store_id)
    .bind(product_code)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn record_movement(
    conn: &mut PgConnection,
    business_id: Uuid,
    product_id: Uuid,
    kind: MovementKind,
    location_id: Uuid,
    quantity: i32,
    balance_after: i32,
    reference: &MovementRef,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO stock_movements (
            business_id, product_id, location_kind, location_id, kind,
            quantity, balance_after, reference_type, reference, actor_id
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(business_id)
    .bind(product_id)
    .bind(kind.location().as_str())
    .bind(location_id)
    .bind(kind.as_str())
    .bind(quantity)
    .bind(balance_after)
    .bind(reference.reference_type.as_str())
    .bind(&reference.reference)
    .bind(reference.actor_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

// ============================================================================
// Reads
// ============================================================================

/// Read side of the ledger
#[derive(Clone)]
pub struct LedgerService {
    db: PgPool,
}

impl LedgerService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Warehouse levels, optionally for one product
    pub async fn warehouse_levels(
        &self,
        business_id: Uuid,
        warehouse_id: Uuid,
        product_id: Option<Uuid>,
    ) -> AppResult<Vec<WarehouseStock>> {
        let rows = sqlx::query_as::<_, WarehouseStockRow>(
            r#"
            SELECT ws.warehouse_id, ws.product_id, p.code AS product_code, p.name AS product_name,
                   ws.quantity_on_hand, ws.quantity_reserved, ws.updated_at
            FROM warehouse_stock ws
            JOIN products p ON p.id = ws.product_id
            WHERE ws.business_id = $1 AND ws.warehouse_id = $2
              AND ($3::uuid IS NULL OR ws.product_id = $3)
            ORDER BY p.code
            "#,
        )
        .bind(business_id)
        .bind(warehouse_id)
        .bind(product_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| WarehouseStock {
                warehouse_id: r.warehouse_id,
                product_id: r.product_id,
                product_code: r.product_code,
                product_name: r.product_name,
                quantity_on_hand: r.quantity_on_hand,
                quantity_reserved: r.quantity_reserved,
                updated_at: r.updated_at,
            })
            .collect())
    }

    /// Every product row held by one store
    pub async fn store_levels(&self, business_id: Uuid, store_id: Uuid) -> AppResult<Vec<StoreStock>> {
        let mut conn = self.db.acquire().await?;
        ensure_store(&mut conn, business_id, store_id).await?;

        let rows = sqlx::query_as::<_, StoreStockRow>(
            r#"
            SELECT store_id, product_id, product_code, product_name, category,
                   purchase_price, selling_price, quantity_on_hand, updated_at
            FROM store_stock
            WHERE business_id = $1 AND store_id = $2
            ORDER BY product_code
            "#,
        )
        .bind(business_id)
        .bind(store_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| StoreStock {
                store_id: r.store_id,
                product_id: r.product_id,
                product_code: r.product_code,
                product_name: r.product_name,
                category: r.category,
                purchase_price: r.purchase_price,
                selling_price: r.selling_price,
                quantity_on_hand: r.quantity_on_hand,
                updated_at: r.updated_at,
            })
            .collect())
    }

    /// Movement log for a batch, return or record id, oldest first
    pub async fn movements(&self, business_id: Uuid, reference: &str) -> AppResult<Vec<StockMovement>> {
        let rows = sqlx::query_as::<_, MovementRow>(
            r#"
            SELECT id, business_id, product_id, location_kind, location_id, kind,
                   quantity, balance_after, reference_type, reference, actor_id, created_at
            FROM stock_movements
            WHERE business_id = $1 AND reference = $2
            ORDER BY created_at, id
            "#,
        )
        .bind(business_id)
        .bind(reference)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(StockMovement::try_from).collect()
    }
}
