//! MoneroPay wire types
//!
//! `ReceiveStatus` doubles as the normalized observation fed to the
//! reconciliation merger: the periodic sweep gets it from
//! `GET /receive/{address}`, the processor callback posts the same shape,
//! and the LWS hook path synthesizes one from its flat/nested payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {0}: {1}")]
    Status(u16, String),
}

/// Aggregate status of a receive address.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReceiveStatus {
    pub amount: ReceiveAmount,
    #[serde(default)]
    pub complete: bool,
    #[serde(default)]
    pub transactions: Vec<TransferStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReceiveAmount {
    pub expected: i64,
    pub covered: Covered,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Covered {
    pub total: i64,
    pub unlocked: i64,
}

/// One observed on-chain transfer toward the address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferStatus {
    pub amount: i64,
    pub confirmations: i64,
    #[serde(default)]
    pub double_spend_seen: bool,
    #[serde(default)]
    pub fee: i64,
    #[serde(default)]
    pub height: i64,
    pub timestamp: DateTime<Utc>,
    pub tx_hash: String,
    #[serde(default)]
    pub unlock_time: i64,
    #[serde(default)]
    pub locked: bool,
}
