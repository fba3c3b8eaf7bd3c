//! Product handlers
//!
//! `/products/data/*` is the JSON API; `/products` plus `/:id/edit` and
//! `/:id/delete` are the form endpoints behind the server-rendered pages.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::handlers::{optional_text, redirect_found, NumberField, Payload};
use crate::services::product::{NewProduct, Product, ProductChanges};
use crate::services::{barcode, export, ProductService};
use crate::AppState;

/// Create / edit body. Forms post every field as text; JSON clients may use
/// numbers or strings interchangeably.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    pub name: String,
    pub sku: String,
    pub code: Option<String>,
    pub price: Option<NumberField>,
    pub quantity: Option<NumberField>,
    pub location: Option<String>,
    pub weight: Option<NumberField>,
    pub min_stock_level: Option<NumberField>,
}

/// Partial JSON update. `weight: null` clears the unit weight; an absent
/// `weight` leaves it alone.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub code: Option<String>,
    pub price: Option<NumberField>,
    pub quantity: Option<NumberField>,
    pub location: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub weight: Option<Option<NumberField>>,
    pub min_stock_level: Option<NumberField>,
}

/// List all products, newest first
pub async fn list_products(State(state): State<AppState>) -> AppResult<Json<Vec<Product>>> {
    let products = ProductService::new(state.db.clone()).list().await?;
    Ok(Json(products))
}

/// Fetch one product
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Product>> {
    let product = ProductService::new(state.db.clone()).get(id).await?;
    Ok(Json(product))
}

/// Sum of the `quantity` counter over all products
pub async fn total_quantity(State(state): State<AppState>) -> AppResult<Json<serde_json::Value>> {
    let total = ProductService::new(state.db.clone()).total_quantity().await?;
    Ok(Json(serde_json::json!({ "totalQuantity": total })))
}

/// Create a product. Forms land back on the product list; JSON clients get
/// the created product with a 201.
pub async fn create_product(
    State(state): State<AppState>,
    payload: Payload<ProductPayload>,
) -> AppResult<Response> {
    let is_form = payload.is_form();
    let body = payload.into_inner();

    let created = match build_new_product(body) {
        Ok(input) => ProductService::new(state.db.clone()).create(input).await,
        Err(err) => Err(err),
    };

    match created {
        Ok(product) if is_form => {
            tracing::info!(sku = %product.sku, "product created");
            Ok(redirect_found("/products"))
        }
        Ok(product) => {
            tracing::info!(sku = %product.sku, "product created");
            Ok((StatusCode::CREATED, Json(product)).into_response())
        }
        Err(err) if is_form => Ok(product_form_error("Error creating product", err)),
        Err(err) => Err(err),
    }
}

/// Partial update over JSON. Stock counters are not touched here.
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateProductRequest>,
) -> AppResult<Json<Product>> {
    let weight = match body.weight {
        None => None,
        Some(None) => Some(None),
        Some(Some(field)) => match NumberField::parse(Some(field), "weight", "Invalid weight")? {
            Some(value) => Some(Some(value)),
            None => Some(None),
        },
    };

    let changes = ProductChanges {
        name: body.name.map(|name| name.trim().to_string()),
        sku: body.sku.map(|sku| sku.trim().to_string()),
        code: optional_text(body.code),
        price: NumberField::parse(body.price, "price", "Invalid price")?,
        quantity: NumberField::parse(body.quantity, "quantity", "Invalid quantity")?,
        location: optional_text(body.location),
        weight,
        min_stock_level: NumberField::parse(
            body.min_stock_level,
            "minStockLevel",
            "Invalid minimum stock level",
        )?,
    };

    let product = ProductService::new(state.db.clone()).update(id, changes).await?;
    Ok(Json(product))
}

/// Delete a product. Intakes that reference it are orphaned, not removed.
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    ProductService::new(state.db.clone()).delete(id).await?;
    Ok(Json(serde_json::json!({ "message": "Product deleted" })))
}

/// Full update from the edit form; an emptied weight clears the unit weight
pub async fn edit_product_form(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Form(body): Form<ProductPayload>,
) -> AppResult<Response> {
    let changes = match build_product_edit(body) {
        Ok(changes) => changes,
        Err(err) => return Ok(product_form_error("Error updating product", err)),
    };

    match ProductService::new(state.db.clone()).update(id, changes).await {
        Ok(_) => Ok(redirect_found("/products")),
        Err(err) => Ok(product_form_error("Error updating product", err)),
    }
}

/// Form delete; lands back on the list even when the product is already gone
pub async fn delete_product_form(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    match ProductService::new(state.db.clone()).delete(id).await {
        Ok(()) | Err(AppError::NotFound(_)) => Ok(redirect_found("/products")),
        Err(err) => Err(err),
    }
}

/// Download the product list as CSV
pub async fn export_products_csv(State(state): State<AppState>) -> AppResult<Response> {
    let products = ProductService::new(state.db.clone()).list().await?;
    let csv_data = export::products_csv(&products)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"products.csv\"",
            ),
        ],
        csv_data,
    )
        .into_response())
}

/// Download the product list as PDF
pub async fn export_products_pdf(State(state): State<AppState>) -> AppResult<Response> {
    let products = ProductService::new(state.db.clone()).list().await?;
    let pdf = export::products_pdf(&products)?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"products.pdf\"",
            ),
        ],
        pdf,
    )
        .into_response())
}

/// Code 128 barcode of the product SKU as PNG
pub async fn product_barcode(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let product = ProductService::new(state.db.clone()).get(id).await?;
    let png = barcode::sku_barcode_png(&product.sku)?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

fn build_new_product(body: ProductPayload) -> AppResult<NewProduct> {
    Ok(NewProduct {
        name: body.name.trim().to_string(),
        sku: body.sku.trim().to_string(),
        code: optional_text(body.code),
        price: NumberField::parse(body.price, "price", "Invalid price")?,
        quantity: NumberField::parse(body.quantity, "quantity", "Invalid quantity")?,
        stock_quantity: None,
        stock_weight: None,
        location: optional_text(body.location),
        weight: NumberField::parse(body.weight, "weight", "Invalid weight")?,
        min_stock_level: NumberField::parse(
            body.min_stock_level,
            "minStockLevel",
            "Invalid minimum stock level",
        )?,
    })
}

fn build_product_edit(body: ProductPayload) -> AppResult<ProductChanges> {
    Ok(ProductChanges {
        name: Some(body.name.trim().to_string()),
        sku: Some(body.sku.trim().to_string()),
        code: optional_text(body.code),
        price: NumberField::parse(body.price, "price", "Invalid price")?,
        quantity: NumberField::parse(body.quantity, "quantity", "Invalid quantity")?,
        location: optional_text(body.location),
        weight: Some(NumberField::parse(body.weight, "weight", "Invalid weight")?),
        min_stock_level: NumberField::parse(
            body.min_stock_level,
            "minStockLevel",
            "Invalid minimum stock level",
        )?,
    })
}

/// Form-flavored product failures answer plain text, keeping the browser on
/// an error page instead of a JSON body
fn product_form_error(context: &str, err: AppError) -> Response {
    match &err {
        AppError::Validation { message, .. } => {
            (StatusCode::BAD_REQUEST, format!("{}: {}", context, message)).into_response()
        }
        AppError::ValidationError(message) => {
            (StatusCode::BAD_REQUEST, format!("{}: {}", context, message)).into_response()
        }
        AppError::DuplicateEntry(field) => (
            StatusCode::BAD_REQUEST,
            format!("{}: a record with this {} already exists", context, field),
        )
            .into_response(),
        AppError::NotFound(resource) => {
            (StatusCode::BAD_REQUEST, format!("{} not found", resource)).into_response()
        }
        _ => {
            tracing::error!("Error: {:?}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
        }
    }
}

/// Distinguishes an absent field (leave unchanged) from an explicit null
/// (clear the value)
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn update_weight_distinguishes_null_from_absent() {
        let absent: UpdateProductRequest = serde_json::from_str(r#"{"name": "Bolts"}"#).unwrap();
        assert!(absent.weight.is_none());

        let null: UpdateProductRequest = serde_json::from_str(r#"{"weight": null}"#).unwrap();
        assert!(matches!(null.weight, Some(None)));

        let set: UpdateProductRequest = serde_json::from_str(r#"{"weight": 2.5}"#).unwrap();
        match set.weight {
            Some(Some(NumberField::Number(value))) => {
                assert_eq!(value, Decimal::from_str("2.5").unwrap())
            }
            other => panic!("unexpected weight: {:?}", other),
        }
    }

    #[test]
    fn payload_accepts_camel_case_and_string_numbers() {
        let body: ProductPayload = serde_json::from_str(
            r#"{"name": "Bolts", "sku": "WH-001", "quantity": "25", "minStockLevel": 5}"#,
        )
        .unwrap();

        let input = build_new_product(body).unwrap();
        assert_eq!(input.quantity, Some(Decimal::from(25)));
        assert_eq!(input.min_stock_level, Some(Decimal::from(5)));
    }

    #[test]
    fn edit_form_with_empty_weight_clears_it() {
        let body: ProductPayload = serde_json::from_str(
            r#"{"name": "Bolts", "sku": "WH-001", "weight": ""}"#,
        )
        .unwrap();

        let changes = build_product_edit(body).unwrap();
        assert_eq!(changes.weight, Some(None));
    }

    #[test]
    fn bad_quantity_is_rejected_with_field_error() {
        let body: ProductPayload = serde_json::from_str(
            r#"{"name": "Bolts", "sku": "WH-001", "quantity": "many"}"#,
        )
        .unwrap();

        match build_new_product(body) {
            Err(AppError::Validation { field, message }) => {
                assert_eq!(field, "quantity");
                assert_eq!(message, "Invalid quantity");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
