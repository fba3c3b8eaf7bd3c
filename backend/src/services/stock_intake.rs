//! Stock-intake service
//!
//! Every mutation runs in one transaction: the affected product rows are
//! locked, the intake is resolved with `shared::stock`, and the product
//! counters are rewritten from the resolved record. Edits revert the stored
//! resolution before applying the new one, so counters stay consistent even
//! when an intake moves to a different product.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::product::{Product, PRODUCT_COLUMNS};
use shared::stock::{apply_intake, resolve_intake, revert_intake, IntakeInput, ResolvedIntake, StockCounters};

/// Stock-intake service
#[derive(Clone)]
pub struct StockIntakeService {
    db: PgPool,
}

/// Stock-intake row, served as-is by the JSON API
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StockIntake {
    pub id: Uuid,
    pub product_id: Option<Uuid>,
    pub quantity: Decimal,
    pub total_weight: Decimal,
    pub single_weight: Decimal,
    pub received_by: Option<String>,
    pub notes: Option<String>,
    pub received_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StockIntake {
    /// The resolution stored on this row, for counter reverts
    pub fn resolution(&self) -> ResolvedIntake {
        ResolvedIntake {
            quantity: self.quantity,
            total_weight: self.total_weight,
            single_weight: self.single_weight,
        }
    }
}

/// Intake with its product joined in. `product` is null for intakes that
/// outlived their product.
#[derive(Debug, Clone, Serialize)]
pub struct StockIntakeRecord {
    #[serde(flatten)]
    pub intake: StockIntake,
    pub product: Option<Product>,
}

/// Input for recording an intake
#[derive(Debug, Clone, Default)]
pub struct CreateIntake {
    pub product_id: Uuid,
    pub quantity: Option<Decimal>,
    pub total_weight: Option<Decimal>,
    pub received_by: Option<String>,
    pub notes: Option<String>,
    pub received_at: Option<DateTime<Utc>>,
    /// Also update the product's reorder threshold
    pub min_stock_level: Option<Decimal>,
}

/// Input for editing an intake. Absent quantity and weight re-resolve the
/// stored quantity against the (possibly different) target product.
#[derive(Debug, Clone, Default)]
pub struct UpdateIntake {
    pub product_id: Option<Uuid>,
    pub quantity: Option<Decimal>,
    pub total_weight: Option<Decimal>,
    pub received_by: Option<String>,
    pub notes: Option<String>,
    pub received_at: Option<DateTime<Utc>>,
    pub min_stock_level: Option<Decimal>,
}

const INTAKE_COLUMNS: &str = "id, product_id, quantity, total_weight, single_weight, \
     received_by, notes, received_at, created_at, updated_at";

/// Join row for list/get queries
#[derive(Debug, FromRow)]
struct IntakeJoinRow {
    id: Uuid,
    product_id: Option<Uuid>,
    quantity: Decimal,
    total_weight: Decimal,
    single_weight: Decimal,
    received_by: Option<String>,
    notes: Option<String>,
    received_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    p_id: Option<Uuid>,
    p_name: Option<String>,
    p_sku: Option<String>,
    p_code: Option<String>,
    p_price: Option<Decimal>,
    p_quantity: Option<Decimal>,
    p_stock_quantity: Option<Decimal>,
    p_stock_weight: Option<Decimal>,
    p_location: Option<String>,
    p_weight: Option<Decimal>,
    p_min_stock_level: Option<Decimal>,
    p_created_at: Option<DateTime<Utc>>,
    p_updated_at: Option<DateTime<Utc>>,
}

impl IntakeJoinRow {
    fn into_record(self) -> StockIntakeRecord {
        let product = match (
            self.p_id,
            self.p_name,
            self.p_sku,
            self.p_price,
            self.p_quantity,
            self.p_stock_quantity,
            self.p_stock_weight,
            self.p_min_stock_level,
            self.p_created_at,
            self.p_updated_at,
        ) {
            (
                Some(id),
                Some(name),
                Some(sku),
                Some(price),
                Some(quantity),
                Some(stock_quantity),
                Some(stock_weight),
                Some(min_stock_level),
                Some(created_at),
                Some(updated_at),
            ) => Some(Product {
                id,
                name,
                sku,
                code: self.p_code,
                price,
                quantity,
                stock_quantity,
                stock_weight,
                location: self.p_location,
                weight: self.p_weight,
                min_stock_level,
                created_at,
                updated_at,
            }),
            _ => None,
        };

        StockIntakeRecord {
            intake: StockIntake {
                id: self.id,
                product_id: self.product_id,
                quantity: self.quantity,
                total_weight: self.total_weight,
                single_weight: self.single_weight,
                received_by: self.received_by,
                notes: self.notes,
                received_at: self.received_at,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            product,
        }
    }
}

fn join_query(filter: &str) -> String {
    format!(
        r#"
        SELECT si.id, si.product_id, si.quantity, si.total_weight, si.single_weight,
               si.received_by, si.notes, si.received_at, si.created_at, si.updated_at,
               p.id AS p_id, p.name AS p_name, p.sku AS p_sku, p.code AS p_code,
               p.price AS p_price, p.quantity AS p_quantity,
               p.stock_quantity AS p_stock_quantity, p.stock_weight AS p_stock_weight,
               p.location AS p_location, p.weight AS p_weight,
               p.min_stock_level AS p_min_stock_level,
               p.created_at AS p_created_at, p.updated_at AS p_updated_at
        FROM stock_intakes si
        LEFT JOIN products p ON p.id = si.product_id
        {}
        "#,
        filter
    )
}

impl StockIntakeService {
    /// Create a new StockIntakeService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List all intakes with their products, newest first
    pub async fn list(&self) -> AppResult<Vec<StockIntakeRecord>> {
        let rows = sqlx::query_as::<_, IntakeJoinRow>(&join_query(
            "ORDER BY si.created_at DESC",
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(IntakeJoinRow::into_record).collect())
    }

    /// Fetch one intake with its product
    pub async fn get(&self, id: Uuid) -> AppResult<StockIntakeRecord> {
        let row = sqlx::query_as::<_, IntakeJoinRow>(&join_query("WHERE si.id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Stock intake".to_string()))?;

        Ok(row.into_record())
    }

    /// Record an intake and bump the product counters
    pub async fn create(&self, input: CreateIntake) -> AppResult<StockIntakeRecord> {
        let mut tx = self.db.begin().await?;

        let mut product = Self::product_for_update(&mut tx, input.product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let resolved = resolve_intake(
            IntakeInput {
                quantity: input.quantity,
                total_weight: input.total_weight,
            },
            product.weight,
        )?;

        let intake = sqlx::query_as::<_, StockIntake>(&format!(
            r#"
            INSERT INTO stock_intakes (product_id, quantity, total_weight, single_weight,
                                       received_by, notes, received_at)
            VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, NOW()))
            RETURNING {}
            "#,
            INTAKE_COLUMNS
        ))
        .bind(product.id)
        .bind(resolved.quantity)
        .bind(resolved.total_weight)
        .bind(resolved.single_weight)
        .bind(&input.received_by)
        .bind(&input.notes)
        .bind(input.received_at)
        .fetch_one(&mut *tx)
        .await?;

        let counters = apply_intake(product.counters(), &resolved);
        let min_stock_level = input.min_stock_level.unwrap_or(product.min_stock_level);
        Self::store_counters(&mut tx, product.id, counters, min_stock_level).await?;

        tx.commit().await?;

        tracing::debug!(
            intake_id = %intake.id,
            product_id = %product.id,
            quantity = %resolved.quantity,
            total_weight = %resolved.total_weight,
            "stock intake recorded"
        );

        product = Self::with_counters(product, counters, min_stock_level);
        Ok(StockIntakeRecord {
            intake,
            product: Some(product),
        })
    }

    /// Edit an intake: revert the stored resolution, re-resolve against the
    /// target product, apply.
    pub async fn update(&self, id: Uuid, input: UpdateIntake) -> AppResult<StockIntakeRecord> {
        let mut tx = self.db.begin().await?;

        let existing = sqlx::query_as::<_, StockIntake>(&format!(
            "SELECT {} FROM stock_intakes WHERE id = $1 FOR UPDATE",
            INTAKE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock intake".to_string()))?;

        // Give the old product its counters back before anything else
        if let Some(old_id) = existing.product_id {
            if let Some(old_product) = Self::product_for_update(&mut tx, old_id).await? {
                let reverted = revert_intake(old_product.counters(), &existing.resolution());
                Self::store_counters(&mut tx, old_id, reverted, old_product.min_stock_level)
                    .await?;
            }
        }

        let target_id = input
            .product_id
            .or(existing.product_id)
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let mut product = Self::product_for_update(&mut tx, target_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        // Weight-only input means a weight-based re-resolution; otherwise the
        // stored quantity carries over when no new one is given.
        let effective = if input.quantity.is_none() && input.total_weight.is_some() {
            IntakeInput {
                quantity: None,
                total_weight: input.total_weight,
            }
        } else {
            IntakeInput {
                quantity: input.quantity.or(Some(existing.quantity)),
                total_weight: input.total_weight,
            }
        };
        let resolved = resolve_intake(effective, product.weight)?;

        let intake = sqlx::query_as::<_, StockIntake>(&format!(
            r#"
            UPDATE stock_intakes
            SET product_id = $2,
                quantity = $3,
                total_weight = $4,
                single_weight = $5,
                received_by = COALESCE($6, received_by),
                notes = COALESCE($7, notes),
                received_at = COALESCE($8, received_at),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            INTAKE_COLUMNS
        ))
        .bind(id)
        .bind(product.id)
        .bind(resolved.quantity)
        .bind(resolved.total_weight)
        .bind(resolved.single_weight)
        .bind(&input.received_by)
        .bind(&input.notes)
        .bind(input.received_at)
        .fetch_one(&mut *tx)
        .await?;

        let counters = apply_intake(product.counters(), &resolved);
        let min_stock_level = input.min_stock_level.unwrap_or(product.min_stock_level);
        Self::store_counters(&mut tx, product.id, counters, min_stock_level).await?;

        tx.commit().await?;

        product = Self::with_counters(product, counters, min_stock_level);
        Ok(StockIntakeRecord {
            intake,
            product: Some(product),
        })
    }

    /// Delete an intake, reverting its contribution to the counters
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let existing = sqlx::query_as::<_, StockIntake>(&format!(
            "SELECT {} FROM stock_intakes WHERE id = $1 FOR UPDATE",
            INTAKE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock intake".to_string()))?;

        if let Some(product_id) = existing.product_id {
            if let Some(product) = Self::product_for_update(&mut tx, product_id).await? {
                let reverted = revert_intake(product.counters(), &existing.resolution());
                Self::store_counters(&mut tx, product_id, reverted, product.min_stock_level)
                    .await?;
            }
        }

        sqlx::query("DELETE FROM stock_intakes WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Lock and fetch a product row inside the current transaction
    async fn product_for_update(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> AppResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE id = $1 FOR UPDATE",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(product)
    }

    /// Write the counters (and threshold) back to a product row
    async fn store_counters(
        tx: &mut Transaction<'_, Postgres>,
        product_id: Uuid,
        counters: StockCounters,
        min_stock_level: Decimal,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE products
            SET quantity = $2,
                stock_quantity = $3,
                stock_weight = $4,
                min_stock_level = $5,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(product_id)
        .bind(counters.quantity)
        .bind(counters.stock_quantity)
        .bind(counters.stock_weight)
        .bind(min_stock_level)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    fn with_counters(
        mut product: Product,
        counters: StockCounters,
        min_stock_level: Decimal,
    ) -> Product {
        product.quantity = counters.quantity;
        product.stock_quantity = counters.stock_quantity;
        product.stock_weight = counters.stock_weight;
        product.min_stock_level = min_stock_level;
        product
    }
}
