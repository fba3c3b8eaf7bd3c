//! Route definitions for the Warehouse Inventory Tracker
//!
//! Three rings: public (health, auth pages, login/register), session-gated
//! (pages, data API, websocket) and admin-gated (user management). The
//! session layer runs before the admin layer.

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{
    handlers,
    middleware::{require_admin, session_auth},
    AppState,
};

/// Create all application routes
pub fn app_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        // Public surface
        .route("/", get(handlers::home))
        .route("/health", get(handlers::health_check))
        .route(
            "/login",
            get(handlers::login_page).post(handlers::login),
        )
        .route(
            "/register",
            get(handlers::register_page).post(handlers::register),
        )
        .route("/logout", get(handlers::logout))
        // Session-gated surface
        .merge(protected_routes(state))
        // Admin surface
        .nest("/admin", admin_routes(state))
}

/// Pages, data API and the event feed (session required)
fn protected_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(handlers::dashboard_page))
        .route("/me", get(handlers::me))
        .route("/ws", get(handlers::ws_feed))
        .nest("/products", product_routes())
        .nest("/stock-intake", stock_intake_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), session_auth))
}

/// Product pages, data API, form posts, export and barcode
fn product_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::products_page).post(handlers::create_product),
        )
        .route("/new", get(handlers::product_new_page))
        .route("/data", get(handlers::list_products))
        .route("/data/total-quantity", get(handlers::total_quantity))
        .route("/data/:id", get(handlers::get_product))
        .route("/export/csv", get(handlers::export_products_csv))
        .route("/export/pdf", get(handlers::export_products_pdf))
        .route(
            "/:id",
            get(handlers::product_show_page)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route(
            "/:id/edit",
            get(handlers::product_edit_page).post(handlers::edit_product_form),
        )
        .route("/:id/delete", post(handlers::delete_product_form))
        .route("/:id/barcode", get(handlers::product_barcode))
}

/// Stock-intake pages, data API and form posts
fn stock_intake_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::stock_intake_page).post(handlers::create_intake),
        )
        .route("/new", get(handlers::stock_intake_new_page))
        .route("/data", get(handlers::list_intakes))
        .route("/data/low-stock/count", get(handlers::low_stock_count))
        .route(
            "/data/low-stock/products",
            get(handlers::low_stock_products),
        )
        .route(
            "/data/:id",
            get(handlers::get_intake).put(handlers::update_intake),
        )
        .route("/:id", put(handlers::update_intake))
        .route("/:id/edit", get(handlers::stock_intake_edit_page))
        .route("/:id/update", post(handlers::update_intake))
        .route("/:id/delete", post(handlers::delete_intake_form))
}

/// User management (admin role required)
fn admin_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route(
            "/users/:id",
            put(handlers::update_user).delete(handlers::delete_user),
        )
        // route_layer runs the last-added layer first: the session layer
        // resolves the user, then the role gate checks it
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), session_auth))
}
