//! Server-rendered page shells
//!
//! Pages are static HTML that fetch their data from the JSON endpoints
//! client-side; the shells are compiled into the binary.

use axum::{
    extract::Path,
    response::{Html, Response},
};
use uuid::Uuid;

use crate::handlers::redirect_found;

/// The root bounces to the dashboard (which bounces to login without a
/// session)
pub async fn home() -> Response {
    redirect_found("/dashboard")
}

pub async fn login_page() -> Html<&'static str> {
    Html(include_str!("../../pages/login.html"))
}

pub async fn register_page() -> Html<&'static str> {
    Html(include_str!("../../pages/register.html"))
}

pub async fn dashboard_page() -> Html<&'static str> {
    Html(include_str!("../../pages/dashboard.html"))
}

pub async fn products_page() -> Html<&'static str> {
    Html(include_str!("../../pages/products/index.html"))
}

pub async fn product_new_page() -> Html<&'static str> {
    Html(include_str!("../../pages/products/new.html"))
}

/// Detail shell; the id is validated here and read back out of the URL by
/// the page script
pub async fn product_show_page(Path(_id): Path<Uuid>) -> Html<&'static str> {
    Html(include_str!("../../pages/products/show.html"))
}

pub async fn product_edit_page(Path(_id): Path<Uuid>) -> Html<&'static str> {
    Html(include_str!("../../pages/products/edit.html"))
}

pub async fn stock_intake_page() -> Html<&'static str> {
    Html(include_str!("../../pages/stock-intake/index.html"))
}

pub async fn stock_intake_new_page() -> Html<&'static str> {
    Html(include_str!("../../pages/stock-intake/new.html"))
}

pub async fn stock_intake_edit_page(Path(_id): Path<Uuid>) -> Html<&'static str> {
    Html(include_str!("../../pages/stock-intake/edit.html"))
}
