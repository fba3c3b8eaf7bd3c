//! HTTP handlers
//!
//! Pages and the JSON API share most mutation endpoints: HTML forms post
//! urlencoded bodies and expect 302 redirects, API clients send JSON and
//! expect status codes. [`Payload`] decodes either flavor and remembers
//! which one arrived so handlers can branch the response.

pub mod admin;
pub mod auth;
pub mod health;
pub mod pages;
pub mod products;
pub mod stock_intake;
pub mod ws;

pub use admin::*;
pub use auth::*;
pub use health::*;
pub use pages::*;
pub use products::*;
pub use stock_intake::*;
pub use ws::*;

use axum::{
    extract::{FromRequest, Request},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// A request body arriving either as JSON or as an HTML form post
pub enum Payload<T> {
    Json(T),
    Form(T),
}

impl<T> Payload<T> {
    pub fn is_form(&self) -> bool {
        matches!(self, Payload::Form(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Payload::Json(body) | Payload::Form(body) => body,
        }
    }
}

#[axum::async_trait]
impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.contains("application/json"))
            .unwrap_or(false);

        if is_json {
            let Json(body) = Json::<T>::from_request(req, state)
                .await
                .map_err(|err| AppError::ValidationError(err.to_string()))?;
            Ok(Payload::Json(body))
        } else {
            let Form(body) = Form::<T>::from_request(req, state)
                .await
                .map_err(|err| AppError::ValidationError(err.to_string()))?;
            Ok(Payload::Form(body))
        }
    }
}

/// A numeric field that may arrive as a JSON number, a JSON string, or an
/// HTML form value. Untouched form inputs post the empty string, which
/// counts as "not provided".
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumberField {
    Number(Decimal),
    Text(String),
}

impl NumberField {
    /// Resolve an optional numeric field, rejecting unparseable text with a
    /// field-scoped validation error.
    pub fn parse(
        value: Option<Self>,
        field: &'static str,
        invalid: &'static str,
    ) -> AppResult<Option<Decimal>> {
        match value {
            None => Ok(None),
            Some(NumberField::Number(number)) => Ok(Some(number)),
            Some(NumberField::Text(text)) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                trimmed
                    .parse::<Decimal>()
                    .map(Some)
                    .map_err(|_| AppError::Validation {
                        field: field.to_string(),
                        message: invalid.to_string(),
                    })
            }
        }
    }
}

/// Plain 302 redirect for form posts (`Redirect::to` answers 303 See Other)
pub(crate) fn redirect_found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Form text fields: trim, and treat the empty string as absent
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[derive(Debug, Deserialize)]
    struct Probe {
        quantity: Option<NumberField>,
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn number_field_accepts_json_numbers() {
        let probe: Probe = serde_json::from_str(r#"{"quantity": 12.5}"#).unwrap();
        let parsed = NumberField::parse(probe.quantity, "quantity", "Invalid quantity").unwrap();
        assert_eq!(parsed, Some(dec("12.5")));
    }

    #[test]
    fn number_field_accepts_numeric_strings() {
        let probe: Probe = serde_json::from_str(r#"{"quantity": "7"}"#).unwrap();
        let parsed = NumberField::parse(probe.quantity, "quantity", "Invalid quantity").unwrap();
        assert_eq!(parsed, Some(dec("7")));
    }

    #[test]
    fn empty_form_value_counts_as_absent() {
        let probe: Probe = serde_json::from_str(r#"{"quantity": ""}"#).unwrap();
        let parsed = NumberField::parse(probe.quantity, "quantity", "Invalid quantity").unwrap();
        assert_eq!(parsed, None);
    }

    #[test]
    fn missing_field_counts_as_absent() {
        let probe: Probe = serde_json::from_str("{}").unwrap();
        let parsed = NumberField::parse(probe.quantity, "quantity", "Invalid quantity").unwrap();
        assert_eq!(parsed, None);
    }

    #[test]
    fn garbage_text_is_a_field_error() {
        let probe: Probe = serde_json::from_str(r#"{"quantity": "lots"}"#).unwrap();
        let err = NumberField::parse(probe.quantity, "quantity", "Invalid quantity").unwrap_err();
        match err {
            AppError::Validation { field, message } => {
                assert_eq!(field, "quantity");
                assert_eq!(message, "Invalid quantity");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn optional_text_drops_blank_values() {
        assert_eq!(optional_text(Some("  ".to_string())), None);
        assert_eq!(optional_text(Some("".to_string())), None);
        assert_eq!(
            optional_text(Some(" Aisle 3 ".to_string())),
            Some("Aisle 3".to_string())
        );
        assert_eq!(optional_text(None), None);
    }

    #[test]
    fn redirect_found_sets_location_and_302() {
        let response = redirect_found("/products");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/products"
        );
    }
}
