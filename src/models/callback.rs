//! Inbound hook payloads
//!
//! The LWS wallet scanner posts one of two shapes: flat fields at the top
//! level, or a nested `tx_info` object with overlapping fields. Flat fields
//! take priority when non-zero/non-empty; the nested ones are fallback.
//! Normalization happens in `services::callback_service::resolve_hook_fields`.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Notification from the lightweight wallet-scanning service.
///
/// Carries no merchant transaction id; correlation is by amount + recency.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LwsHookPayload {
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub event_id: String,
    #[serde(default)]
    pub payment_id: String,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub confirmations: i64,
    #[serde(default)]
    pub height: Option<i64>,
    #[serde(default)]
    pub tx_hash: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tx_info: Option<LwsTxInfo>,
}

/// Nested transfer-info shape some LWS builds emit instead of flat fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LwsTxInfo {
    #[serde(default)]
    pub block: Option<i64>,
    #[serde(default)]
    pub amount: i64,
    /// Unix seconds; zero means absent.
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub tx_hash: String,
    #[serde(default)]
    pub payment_id: String,
    #[serde(default)]
    pub unlock_time: i64,
}
