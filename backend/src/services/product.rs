//! Product catalog service
//!
//! Products carry three running counters (quantity, stock quantity, stock
//! weight) that only the stock-intake service mutates. Product edits touch
//! the descriptive fields and leave the counters alone.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::stock::StockCounters;
use shared::validation::{validate_product_name, validate_sku};

/// Product service
#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
}

/// Product record, served as-is by the JSON API
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub sku: String,
    pub code: Option<String>,
    pub price: Decimal,
    pub quantity: Decimal,
    pub stock_quantity: Decimal,
    pub stock_weight: Decimal,
    pub location: Option<String>,
    pub weight: Option<Decimal>,
    pub min_stock_level: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// The running counters, for intake reconciliation
    pub fn counters(&self) -> StockCounters {
        StockCounters {
            quantity: self.quantity,
            stock_quantity: self.stock_quantity,
            stock_weight: self.stock_weight,
        }
    }
}

/// Input for creating a product
#[derive(Debug, Clone, Default)]
pub struct NewProduct {
    pub name: String,
    pub sku: String,
    pub code: Option<String>,
    pub price: Option<Decimal>,
    pub quantity: Option<Decimal>,
    pub stock_quantity: Option<Decimal>,
    pub stock_weight: Option<Decimal>,
    pub location: Option<String>,
    pub weight: Option<Decimal>,
    pub min_stock_level: Option<Decimal>,
}

/// Partial update of a product's descriptive fields.
///
/// `weight` is doubly optional: `Some(None)` clears the unit weight while
/// `None` leaves it untouched.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub code: Option<String>,
    pub price: Option<Decimal>,
    pub quantity: Option<Decimal>,
    pub location: Option<String>,
    pub weight: Option<Option<Decimal>>,
    pub min_stock_level: Option<Decimal>,
}

/// Product at or below its reorder threshold
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LowStockProduct {
    pub id: Uuid,
    pub name: String,
    pub sku: String,
    pub quantity: Decimal,
    pub min_stock_level: Decimal,
    pub location: Option<String>,
}

pub(crate) const PRODUCT_COLUMNS: &str = "id, name, sku, code, price, quantity, stock_quantity, \
     stock_weight, location, weight, min_stock_level, created_at, updated_at";

impl ProductService {
    /// Create a new ProductService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List all products, newest first
    pub async fn list(&self) -> AppResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products ORDER BY created_at DESC",
            PRODUCT_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(products)
    }

    /// Fetch one product
    pub async fn get(&self, id: Uuid) -> AppResult<Product> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE id = $1",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        Ok(product)
    }

    /// Sum of the quantity counter over the whole catalog
    pub async fn total_quantity(&self) -> AppResult<Decimal> {
        let total = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(quantity), 0) FROM products",
        )
        .fetch_one(&self.db)
        .await?;

        Ok(total)
    }

    /// Create a product
    pub async fn create(&self, input: NewProduct) -> AppResult<Product> {
        validate_product_name(&input.name).map_err(|msg| AppError::Validation {
            field: "name".to_string(),
            message: msg.to_string(),
        })?;
        validate_sku(&input.sku).map_err(|msg| AppError::Validation {
            field: "sku".to_string(),
            message: msg.to_string(),
        })?;

        let existing =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products WHERE sku = $1")
                .bind(&input.sku)
                .fetch_one(&self.db)
                .await?;

        if existing > 0 {
            return Err(AppError::DuplicateEntry("SKU".to_string()));
        }

        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (name, sku, code, price, quantity, stock_quantity,
                                  stock_weight, location, weight, min_stock_level)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(&input.name)
        .bind(&input.sku)
        .bind(&input.code)
        .bind(input.price.unwrap_or(Decimal::ZERO))
        .bind(input.quantity.unwrap_or(Decimal::ZERO))
        .bind(input.stock_quantity.unwrap_or(Decimal::ZERO))
        .bind(input.stock_weight.unwrap_or(Decimal::ZERO))
        .bind(&input.location)
        .bind(input.weight)
        .bind(input.min_stock_level.unwrap_or_else(|| Decimal::from(10)))
        .fetch_one(&self.db)
        .await?;

        Ok(product)
    }

    /// Apply a partial update to a product's descriptive fields
    pub async fn update(&self, id: Uuid, changes: ProductChanges) -> AppResult<Product> {
        if let Some(name) = &changes.name {
            validate_product_name(name).map_err(|msg| AppError::Validation {
                field: "name".to_string(),
                message: msg.to_string(),
            })?;
        }
        if let Some(sku) = &changes.sku {
            validate_sku(sku).map_err(|msg| AppError::Validation {
                field: "sku".to_string(),
                message: msg.to_string(),
            })?;

            let taken = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM products WHERE sku = $1 AND id <> $2",
            )
            .bind(sku)
            .bind(id)
            .fetch_one(&self.db)
            .await?;

            if taken > 0 {
                return Err(AppError::DuplicateEntry("SKU".to_string()));
            }
        }

        let set_weight = changes.weight.is_some();
        let weight = changes.weight.flatten();

        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
            SET name = COALESCE($2, name),
                sku = COALESCE($3, sku),
                code = COALESCE($4, code),
                price = COALESCE($5, price),
                quantity = COALESCE($6, quantity),
                location = COALESCE($7, location),
                min_stock_level = COALESCE($8, min_stock_level),
                weight = CASE WHEN $9 THEN $10 ELSE weight END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.sku)
        .bind(&changes.code)
        .bind(changes.price)
        .bind(changes.quantity)
        .bind(&changes.location)
        .bind(changes.min_stock_level)
        .bind(set_weight)
        .bind(weight)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        Ok(product)
    }

    /// Delete a product. Intake history rows are orphaned, not removed.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }

        Ok(())
    }

    /// Products at or below their reorder threshold, lowest first
    pub async fn low_stock_products(&self) -> AppResult<Vec<LowStockProduct>> {
        let products = sqlx::query_as::<_, LowStockProduct>(
            r#"
            SELECT id, name, sku, quantity, min_stock_level, location
            FROM products
            WHERE quantity <= min_stock_level
            ORDER BY quantity ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(products)
    }

    /// Count of products at or below their reorder threshold
    pub async fn low_stock_count(&self) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM products WHERE quantity <= min_stock_level",
        )
        .fetch_one(&self.db)
        .await?;

        Ok(count)
    }
}
