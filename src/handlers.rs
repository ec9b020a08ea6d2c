//! HTTP handlers
//!
//! Thin adapters between axum and the reconciliation service: extract the
//! credential, enforce a per-request deadline, map `ServiceError` onto the
//! wire. Business rules live in `services::callback_service`.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tokio::time::timeout;

use crate::api::moneropay::ReceiveStatus;
use crate::models::LwsHookPayload;
use crate::services::{status_feed, CallbackService};
use crate::store::TransactionStore;
use crate::utils::ServiceError;

/// Deadline applied to every inbound notification handler.
const REQUEST_DEADLINE: Duration = Duration::from_secs(10);

/// How long the live-status endpoint waits for an update before 204.
const UPDATE_POLL_WAIT: Duration = Duration::from_secs(25);

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CallbackService>,
    pub store: Arc<dyn TransactionStore>,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServiceError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ServiceError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({
            "success": false,
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

fn bearer_token(headers: &HeaderMap) -> &str {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .unwrap_or("")
}

async fn with_deadline<F>(fut: F) -> Result<(), ServiceError>
where
    F: std::future::Future<Output = Result<(), ServiceError>>,
{
    timeout(REQUEST_DEADLINE, fut)
        .await
        .map_err(|_| ServiceError::Internal("request deadline exceeded".to_string()))?
}

pub async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// `POST /callback` — signed notification from MoneroPay
pub async fn moneropay_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ReceiveStatus>,
) -> Result<StatusCode, ServiceError> {
    let token = bearer_token(&headers).to_string();
    with_deadline(state.service.handle_callback(&token, &payload)).await?;
    Ok(StatusCode::OK)
}

/// `POST /lws-hook` — heuristic notification from the wallet scanner
pub async fn lws_hook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<LwsHookPayload>,
) -> Result<StatusCode, ServiceError> {
    let token = bearer_token(&headers).to_string();
    with_deadline(state.service.handle_lws_hook(&token, &payload)).await?;
    Ok(StatusCode::OK)
}

#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    pub amount: i64,
    #[serde(default)]
    pub required_confirmations: i64,
    #[serde(default)]
    pub sub_address: Option<String>,
}

/// `POST /pos/transactions` — checkout flow opens a pending charge
pub async fn create_transaction(
    State(state): State<AppState>,
    Json(req): Json<CreateTransactionRequest>,
) -> Result<Response, ServiceError> {
    if req.amount <= 0 {
        return Err(ServiceError::InvalidPayload(
            "amount must be positive".to_string(),
        ));
    }
    if req.required_confirmations < 0 {
        return Err(ServiceError::InvalidPayload(
            "required_confirmations must not be negative".to_string(),
        ));
    }

    let transaction = state
        .store
        .create_transaction(req.amount, req.required_confirmations, req.sub_address)
        .await?;

    Ok((StatusCode::CREATED, Json(transaction)).into_response())
}

/// `GET /pos/transactions/{id}`
pub async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Response, ServiceError> {
    let transaction = state
        .store
        .find_transaction_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("transaction {} not found", id)))?;

    Ok(Json(transaction).into_response())
}

/// `GET /pos/transactions/{id}/updates` — long-poll the live-status feed
pub async fn transaction_updates(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Response, ServiceError> {
    // 404 rather than waiting forever on an id that will never update.
    state
        .store
        .find_transaction_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("transaction {} not found", id)))?;

    let mut receiver = status_feed::subscribe(id).await;
    match timeout(UPDATE_POLL_WAIT, receiver.recv()).await {
        Ok(Some(updated)) => Ok(Json(updated).into_response()),
        _ => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}
