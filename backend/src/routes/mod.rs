//! Route definitions for the batch inventory server

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/batches", batch_routes())
        .nest("/stocks", stock_routes())
        .nest("/branches", branch_routes())
        .nest("/products", product_routes())
        .route("/transfers", post(handlers::transfer_stock))
        .nest("/notifications", notification_routes())
}

/// Batch registry routes
fn batch_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_batches).post(handlers::register_batch),
        )
        // static segments are matched ahead of `/:batch_id`
        .route("/expiring", get(handlers::list_expiring_batches))
        .route("/expired", get(handlers::list_expired_batches))
        .route(
            "/expired/deactivate",
            post(handlers::deactivate_expired_batches),
        )
        .route(
            "/:batch_id",
            get(handlers::get_batch).put(handlers::update_batch),
        )
        .route("/:batch_id/deactivate", post(handlers::deactivate_batch))
        .route("/:batch_id/availability", get(handlers::get_availability))
        .route("/:batch_id/stocks", get(handlers::list_batch_stocks))
}

/// Allocation ledger routes
fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::allocate_stock))
        .route("/low", get(handlers::list_low_stock))
        .route(
            "/:stock_id",
            put(handlers::adjust_stock).delete(handlers::release_stock),
        )
        .route("/:stock_id/minimum", put(handlers::update_minimum_stock))
}

/// Per-branch read routes
fn branch_routes() -> Router<AppState> {
    Router::new()
        .route("/:branch_id/stocks", get(handlers::list_branch_stocks))
        .route("/:branch_id/holdings", get(handlers::get_branch_holdings))
}

/// Per-product read routes
fn product_routes() -> Router<AppState> {
    Router::new().route("/:product_id/stocks", get(handlers::list_product_stocks))
}

/// Expiration notification routes
fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/expiring", get(handlers::get_expiring_notifications))
        .route("/expiring/stock", get(handlers::get_expiring_stock))
}
