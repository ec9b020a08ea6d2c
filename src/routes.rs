//! HTTP routes

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{self, AppState};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Inbound notifications
        .route("/callback", post(handlers::moneropay_callback))
        .route("/lws-hook", post(handlers::lws_hook))
        // POS surface
        .route("/pos/transactions", post(handlers::create_transaction))
        .route("/pos/transactions/:id", get(handlers::get_transaction))
        .route(
            "/pos/transactions/:id/updates",
            get(handlers::transaction_updates),
        )
        .with_state(state)
}
