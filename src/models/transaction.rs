//! Transaction models

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A point-of-sale charge awaiting settlement.
///
/// `accepted` and `confirmed` are derived flags, recomputed from scratch on
/// every reconciliation merge rather than patched incrementally.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Transaction {
    pub id: u64,
    /// Expected total in atomic units (piconero).
    pub amount: i64,
    /// Confirmation threshold for the `accepted` flag.
    pub required_confirmations: i64,
    /// Receive subaddress; `None` until the checkout flow assigns one.
    pub sub_address: Option<String>,
    pub accepted: bool,
    pub confirmed: bool,
    pub created_at: DateTime<Utc>,
    /// Observed on-chain sub-payments, one per distinct tx hash.
    #[sqlx(skip)]
    pub sub_transactions: Vec<SubTransaction>,
}

/// One observed on-chain transfer toward a transaction.
///
/// `tx_hash` is the natural key: re-observing the same hash updates the row
/// in place instead of inserting a duplicate.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SubTransaction {
    pub id: u64,
    pub transaction_id: u64,
    pub amount: i64,
    pub confirmations: i64,
    pub double_spend_seen: bool,
    pub fee: i64,
    pub height: i64,
    pub timestamp: DateTime<Utc>,
    pub tx_hash: String,
    pub unlock_time: i64,
    pub locked: bool,
}
