//! Stock-intake handlers
//!
//! Create and update accept both form posts and JSON. Whatever the flavor,
//! the reconciliation itself lives in the stock-intake service; handlers
//! normalize the input, pick the response shape, and publish events.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::events::StockEvent;
use crate::handlers::{optional_text, redirect_found, NumberField, Payload};
use crate::middleware::CurrentUser;
use crate::services::product::{LowStockProduct, Product};
use crate::services::stock_intake::{CreateIntake, StockIntakeRecord, UpdateIntake};
use crate::services::{ProductService, StockIntakeService};
use crate::AppState;
use shared::stock::is_low_stock;

/// Intake body. JSON clients say `productId`/`totalWeight`; the forms post
/// `product`/`weight`, so both spellings are accepted.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakePayload {
    #[serde(alias = "product")]
    pub product_id: Option<String>,
    pub quantity: Option<NumberField>,
    #[serde(alias = "weight")]
    pub total_weight: Option<NumberField>,
    pub received_by: Option<String>,
    pub notes: Option<String>,
    pub received_at: Option<DateTime<Utc>>,
    pub min_stock_level: Option<NumberField>,
}

/// List intakes with their products, newest first
pub async fn list_intakes(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<StockIntakeRecord>>> {
    let intakes = StockIntakeService::new(state.db.clone()).list().await?;
    Ok(Json(intakes))
}

/// Fetch one intake with its product
pub async fn get_intake(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<StockIntakeRecord>> {
    let record = StockIntakeService::new(state.db.clone()).get(id).await?;
    Ok(Json(record))
}

/// Record an intake. Forms land back on the intake list; JSON clients get
/// the stored record (with resolution and joined product) and a 201.
pub async fn create_intake(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Payload<IntakePayload>,
) -> AppResult<Response> {
    let is_form = payload.is_form();
    let body = payload.into_inner();

    let created = match build_create(body, &user.email) {
        Ok(input) => StockIntakeService::new(state.db.clone()).create(input).await,
        Err(err) => Err(err),
    };

    match created {
        Ok(record) => {
            publish_mutation(
                &state,
                StockEvent::StockIntakeCreated(record.clone()),
                record.product.as_ref(),
            )
            .await;

            if is_form {
                Ok(redirect_found("/stock-intake"))
            } else {
                Ok((StatusCode::CREATED, Json(record)).into_response())
            }
        }
        Err(err) if is_form => Ok(intake_form_error(err)),
        Err(err) => Err(err),
    }
}

/// Edit an intake (revert-then-reapply). JSON bodies may change any field;
/// the edit form is weight-based.
pub async fn update_intake(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Payload<IntakePayload>,
) -> AppResult<Response> {
    let is_form = payload.is_form();
    let body = payload.into_inner();

    let input = if is_form {
        match build_form_update(body) {
            Ok(input) => input,
            Err(err) => return Ok(intake_form_error(err)),
        }
    } else {
        build_api_update(body)?
    };

    match StockIntakeService::new(state.db.clone()).update(id, input).await {
        Ok(record) => {
            publish_mutation(
                &state,
                StockEvent::StockIntakeUpdated(record.clone()),
                record.product.as_ref(),
            )
            .await;

            if is_form {
                Ok(redirect_found("/stock-intake"))
            } else {
                Ok(Json(record).into_response())
            }
        }
        Err(err) if is_form => Ok(intake_form_error(err)),
        Err(err) => Err(err),
    }
}

/// Delete an intake from the list page, reverting its counters
pub async fn delete_intake_form(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let service = StockIntakeService::new(state.db.clone());

    let record = match service.get(id).await {
        Ok(record) => record,
        Err(err) => return Ok(intake_form_error(err)),
    };

    if let Err(err) = service.delete(id).await {
        return Ok(intake_form_error(err));
    }

    state.events.publish(StockEvent::StockIntakeDeleted { id });
    alert_after_delete(&state, record.intake.product_id).await;

    Ok(redirect_found("/stock-intake"))
}

/// Number of products at or below their reorder threshold
pub async fn low_stock_count(State(state): State<AppState>) -> AppResult<Json<serde_json::Value>> {
    let count = ProductService::new(state.db.clone()).low_stock_count().await?;
    Ok(Json(serde_json::json!({ "count": count })))
}

/// The products at or below their reorder threshold, lowest first
pub async fn low_stock_products(
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    let products = ProductService::new(state.db.clone())
        .low_stock_products()
        .await?;
    Ok(Json(serde_json::json!({ "products": products })))
}

fn build_create(body: IntakePayload, session_email: &str) -> AppResult<CreateIntake> {
    let product_id = parse_product_id(body.product_id.as_deref())?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

    Ok(CreateIntake {
        product_id,
        quantity: NumberField::parse(body.quantity, "quantity", "Invalid quantity")?,
        total_weight: NumberField::parse(body.total_weight, "totalWeight", "Invalid total weight")?,
        received_by: optional_text(body.received_by).or_else(|| Some(session_email.to_string())),
        notes: optional_text(body.notes),
        received_at: body.received_at,
        min_stock_level: NumberField::parse(
            body.min_stock_level,
            "minStockLevel",
            "Invalid minimum stock level",
        )?,
    })
}

/// The edit form posts a product and a total weight; the weight must be
/// positive and the quantity is always re-derived from it.
fn build_form_update(body: IntakePayload) -> AppResult<UpdateIntake> {
    let product_id = parse_product_id(body.product_id.as_deref())?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

    let total_weight =
        NumberField::parse(body.total_weight, "totalWeight", "Invalid total weight")?;
    let total_weight = match total_weight {
        Some(value) if value > Decimal::ZERO => value,
        _ => {
            return Err(AppError::Validation {
                field: "totalWeight".to_string(),
                message: "Invalid total weight".to_string(),
            })
        }
    };

    Ok(UpdateIntake {
        product_id: Some(product_id),
        quantity: None,
        total_weight: Some(total_weight),
        received_by: optional_text(body.received_by),
        notes: optional_text(body.notes),
        received_at: None,
        min_stock_level: None,
    })
}

fn build_api_update(body: IntakePayload) -> AppResult<UpdateIntake> {
    Ok(UpdateIntake {
        product_id: parse_product_id(body.product_id.as_deref())?,
        quantity: NumberField::parse(body.quantity, "quantity", "Invalid quantity")?,
        total_weight: NumberField::parse(body.total_weight, "totalWeight", "Invalid total weight")?,
        received_by: optional_text(body.received_by),
        notes: optional_text(body.notes),
        received_at: body.received_at,
        min_stock_level: NumberField::parse(
            body.min_stock_level,
            "minStockLevel",
            "Invalid minimum stock level",
        )?,
    })
}

/// Product references arrive as strings from both JSON and forms. Empty
/// means "not provided"; anything else must be a UUID.
fn parse_product_id(raw: Option<&str>) -> AppResult<Option<Uuid>> {
    match raw {
        None => Ok(None),
        Some(text) if text.trim().is_empty() => Ok(None),
        Some(text) => Uuid::parse_str(text.trim())
            .map(Some)
            .map_err(|_| AppError::Validation {
                field: "productId".to_string(),
                message: "Invalid product ID format".to_string(),
            }),
    }
}

/// Publish the mutation itself, then the low-stock follow-ups
async fn publish_mutation(state: &AppState, event: StockEvent, product: Option<&Product>) {
    state.events.publish(event);
    alert_low_stock(state, product).await;
}

/// Deletes revert counters, so the affected product is refetched before the
/// low-stock check
async fn alert_after_delete(state: &AppState, product_id: Option<Uuid>) {
    let product = match product_id {
        Some(id) => ProductService::new(state.db.clone()).get(id).await.ok(),
        None => None,
    };
    alert_low_stock(state, product.as_ref()).await;
}

/// Dashboard follow-ups: the current low-stock count after every mutation,
/// plus a product notification when the mutated product is at or below its
/// threshold. Failures here are logged, never surfaced; the mutation has
/// already committed.
async fn alert_low_stock(state: &AppState, product: Option<&Product>) {
    match ProductService::new(state.db.clone()).low_stock_count().await {
        Ok(count) => state.events.publish(StockEvent::LowStockAlert { count }),
        Err(err) => tracing::warn!("Low stock count failed: {:?}", err),
    }

    if let Some(product) = product {
        if is_low_stock(product.quantity, product.min_stock_level) {
            state.events.publish(StockEvent::LowStockNotification {
                product: LowStockProduct {
                    id: product.id,
                    name: product.name.clone(),
                    sku: product.sku.clone(),
                    quantity: product.quantity,
                    min_stock_level: product.min_stock_level,
                    location: product.location.clone(),
                },
            });
        }
    }
}

/// Form-flavored failures answer plain text with the statuses the pages
/// expect: a missing intake is a 404, everything else user-caused is a 400
fn intake_form_error(err: AppError) -> Response {
    match &err {
        AppError::NotFound(resource) if resource == "Stock intake" => {
            (StatusCode::NOT_FOUND, "Stock intake not found").into_response()
        }
        AppError::NotFound(resource) => {
            (StatusCode::BAD_REQUEST, format!("{} not found", resource)).into_response()
        }
        AppError::Validation { message, .. } => {
            (StatusCode::BAD_REQUEST, message.clone()).into_response()
        }
        AppError::ValidationError(message) => {
            (StatusCode::BAD_REQUEST, message.clone()).into_response()
        }
        _ => {
            tracing::error!("Error: {:?}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
        }
    }
}
