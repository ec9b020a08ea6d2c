//! Payment reconciliation core
//!
//! Three entry points feed the same merge: the periodic confirmation sweep,
//! the signed MoneroPay callback, and the heuristic LWS wallet hook. All of
//! them serialize on `merge_lock`, so no two merges interleave regardless of
//! which transaction they touch.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::api::moneropay::{Covered, ReceiveAmount, ReceiveStatus, StatusSource, TransferStatus};
use crate::models::{LwsHookPayload, SubTransaction, Transaction};
use crate::services::status_feed;
use crate::store::TransactionStore;
use crate::utils::{Config, ServiceError};

/// Fixed finality threshold, independent of a transaction's
/// `required_confirmations`.
const FINALITY_CONFIRMATIONS: i64 = 10;

/// Deadline for a single status query during a sweep.
const STATUS_CALL_TIMEOUT: Duration = Duration::from_secs(8);

/// Deadline for one whole sweep pass; partial completion is expected.
const SWEEP_PASS_TIMEOUT: Duration = Duration::from_secs(20);

/// Replay/matching window for the LWS hook, which correlates purely by
/// amount and recency. Widening it trades false negatives for false
/// positives.
const HOOK_MATCH_WINDOW_SECS: i64 = 60;

/// Claims embedded in the MoneroPay callback JWT.
#[derive(Debug, Serialize, Deserialize)]
struct CallbackClaims {
    transaction_id: u64,
}

pub struct CallbackService {
    store: Arc<dyn TransactionStore>,
    status_source: Arc<dyn StatusSource>,
    config: Arc<Config>,
    /// Exclusive reconciliation critical section. Held for the full sweep
    /// pass and for the full duration of each notification handler.
    merge_lock: Mutex<()>,
}

impl CallbackService {
    pub fn new(
        store: Arc<dyn TransactionStore>,
        status_source: Arc<dyn StatusSource>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            store,
            status_source,
            config,
            merge_lock: Mutex::new(()),
        }
    }

    /// Spawn the confirmation sweep: one pass immediately, then on the
    /// configured interval until the shutdown signal fires.
    pub fn start_confirmation_checker(
        self: Arc<Self>,
        mut shutdown: watch::Receiver<bool>,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.config.sweep_interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        // Dropping the pass on timeout also releases the
                        // merge lock.
                        if timeout(SWEEP_PASS_TIMEOUT, self.check_unconfirmed_transactions())
                            .await
                            .is_err()
                        {
                            warn!("sweep: pass exceeded {:?}, will resume next tick", SWEEP_PASS_TIMEOUT);
                        }
                    }
                    _ = shutdown.changed() => {
                        debug!("confirmation checker stopping");
                        return;
                    }
                }
            }
        })
    }

    /// One sweep pass over every unconfirmed transaction. Best effort: a
    /// failing lookup or merge skips that transaction and continues.
    async fn check_unconfirmed_transactions(&self) {
        let _guard = self.merge_lock.lock().await;

        let unconfirmed = match self.store.find_unconfirmed_transactions().await {
            Ok(transactions) => transactions,
            Err(e) => {
                warn!("sweep: failed to list unconfirmed transactions: {}", e);
                return;
            }
        };

        for transaction in unconfirmed {
            // Not yet assigned a receive address by the checkout flow
            let Some(address) = transaction.sub_address.as_deref() else {
                continue;
            };

            let status = match timeout(
                STATUS_CALL_TIMEOUT,
                self.status_source.receive_status(address),
            )
            .await
            {
                Ok(Ok(status)) => status,
                Ok(Err(e)) => {
                    debug!("sweep: status query failed for transaction {}: {}", transaction.id, e);
                    continue;
                }
                Err(_) => {
                    debug!("sweep: status query timed out for transaction {}", transaction.id);
                    continue;
                }
            };

            if let Err(e) = self.process_transaction(transaction.id, &status).await {
                warn!("sweep: merge failed for transaction {}: {}", transaction.id, e);
            }
        }
    }

    /// Authenticated MoneroPay callback: verify the JWT, extract the
    /// transaction id claim and merge the reported status.
    pub async fn handle_callback(
        &self,
        token: &str,
        payload: &ReceiveStatus,
    ) -> Result<(), ServiceError> {
        let _guard = self.merge_lock.lock().await;

        let transaction_id = self.verify_callback_token(token)?;
        self.process_transaction(transaction_id, payload).await
    }

    fn verify_callback_token(&self, token: &str) -> Result<u64, ServiceError> {
        if token.is_empty() {
            return Err(ServiceError::Unauthenticated(
                "callback token is required".to_string(),
            ));
        }

        // MoneroPay signs with HS256 and sets no registered claims.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims = Default::default();

        let data = decode::<CallbackClaims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_moneropay_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| ServiceError::Unauthenticated(format!("invalid callback token: {}", e)))?;

        Ok(data.claims.transaction_id)
    }

    /// Heuristic LWS wallet hook. Carries no transaction id; correlation is
    /// by exact amount within the recency window, and any ambiguity is a
    /// hard rejection rather than a best-guess pick.
    pub async fn handle_lws_hook(
        &self,
        token: &str,
        payload: &LwsHookPayload,
    ) -> Result<(), ServiceError> {
        let _guard = self.merge_lock.lock().await;

        if token.is_empty() || token != self.config.lws_hook_token {
            warn!("lws-hook: invalid token");
            return Err(ServiceError::Unauthenticated(
                "invalid LWS hook token".to_string(),
            ));
        }

        let now = Utc::now();
        let resolved = resolve_hook_fields(payload, now);

        if resolved.amount == 0 || resolved.tx_hash.is_empty() {
            warn!(
                "lws-hook: missing amount/tx_hash (amount={}, tx_hash={:?})",
                resolved.amount, resolved.tx_hash
            );
            return Err(ServiceError::InvalidPayload(
                "amount and tx_hash are required".to_string(),
            ));
        }

        if now.signed_duration_since(resolved.timestamp) > ChronoDuration::seconds(HOOK_MATCH_WINDOW_SECS) {
            warn!("lws-hook: stale payload ts={} now={}", resolved.timestamp, now);
            return Err(ServiceError::Unauthenticated(
                "stale LWS payload".to_string(),
            ));
        }

        let since = now - ChronoDuration::seconds(HOOK_MATCH_WINDOW_SECS);
        let candidates = self
            .store
            .find_recent_pending_by_amount(resolved.amount, since)
            .await
            .map_err(|e| {
                warn!("lws-hook: store error resolving by amount: {}", e);
                ServiceError::Unauthenticated(
                    "unable to resolve transaction for LWS hook".to_string(),
                )
            })?;

        if candidates.len() != 1 {
            warn!(
                "lws-hook: ambiguous candidates for amount={} count={}",
                resolved.amount,
                candidates.len()
            );
            return Err(ServiceError::Unauthenticated(
                "unable to uniquely resolve transaction for LWS hook".to_string(),
            ));
        }
        let transaction_id = candidates[0].id;

        let status = ReceiveStatus {
            amount: ReceiveAmount {
                expected: resolved.amount,
                covered: Covered {
                    total: resolved.amount,
                    unlocked: 0,
                },
            },
            complete: false,
            transactions: vec![TransferStatus {
                amount: resolved.amount,
                confirmations: payload.confirmations,
                double_spend_seen: false,
                fee: 0,
                height: resolved.height,
                timestamp: resolved.timestamp,
                tx_hash: resolved.tx_hash,
                unlock_time: 0,
                locked: payload.confirmations == 0,
            }],
        };

        self.process_transaction(transaction_id, &status).await
    }

    /// The reconciliation merge. Upserts every observed transfer by tx hash,
    /// re-derives the acceptance flags from scratch and persists the result.
    ///
    /// A store failure partway leaves earlier upserts committed; re-delivery
    /// of the same observation converges because the merge is idempotent.
    async fn process_transaction(
        &self,
        transaction_id: u64,
        status: &ReceiveStatus,
    ) -> Result<(), ServiceError> {
        let transaction = self
            .store
            .find_transaction_by_id(transaction_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("transaction {} not found", transaction_id))
            })?;

        for transfer in &status.transactions {
            let existing = transaction
                .sub_transactions
                .iter()
                .find(|sub| sub.tx_hash == transfer.tx_hash);

            let sub = SubTransaction {
                id: existing.map(|sub| sub.id).unwrap_or(0),
                transaction_id: transaction.id,
                amount: transfer.amount,
                confirmations: transfer.confirmations,
                double_spend_seen: transfer.double_spend_seen,
                fee: transfer.fee,
                height: transfer.height,
                timestamp: transfer.timestamp,
                tx_hash: transfer.tx_hash.clone(),
                unlock_time: transfer.unlock_time,
                locked: transfer.locked,
            };

            if existing.is_some() {
                self.store.update_sub_transaction(&sub).await?;
            } else {
                self.store.create_sub_transaction(&sub).await?;
            }
        }

        // Re-read so the flag derivation sees the upserts above rather than
        // the pre-merge snapshot.
        let mut transaction = self
            .store
            .find_transaction_by_id(transaction_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "transaction {} not found after update",
                    transaction_id
                ))
            })?;

        transaction.accepted = is_accepted(&transaction, status);
        transaction.confirmed = is_confirmed(&transaction, status);

        self.store.update_transaction(&transaction).await?;

        // Fire-and-forget: the live-status feed must never block the merge.
        let updated = transaction.clone();
        tokio::spawn(async move {
            status_feed::notify_transaction_update(updated.id, updated).await;
        });

        Ok(())
    }
}

/// Recomputed from scratch on every merge; not sticky, so reduced reported
/// coverage can revoke it.
fn is_accepted(transaction: &Transaction, status: &ReceiveStatus) -> bool {
    transaction
        .sub_transactions
        .iter()
        .all(|sub| sub.confirmations >= transaction.required_confirmations)
        && status.amount.covered.total >= transaction.amount
}

/// Uses the fixed finality threshold and the unlocked covered amount,
/// independent of `required_confirmations`.
fn is_confirmed(transaction: &Transaction, status: &ReceiveStatus) -> bool {
    transaction
        .sub_transactions
        .iter()
        .all(|sub| sub.confirmations >= FINALITY_CONFIRMATIONS)
        && status.amount.covered.unlocked >= transaction.amount
}

struct ResolvedHook {
    amount: i64,
    tx_hash: String,
    timestamp: DateTime<Utc>,
    height: i64,
}

/// Normalize the two LWS payload shapes into one observation. Flat fields
/// win when non-zero/non-empty; the nested `tx_info` is fallback.
fn resolve_hook_fields(payload: &LwsHookPayload, received_at: DateTime<Utc>) -> ResolvedHook {
    let mut amount = payload.amount;
    let mut tx_hash = payload.tx_hash.clone();
    let mut timestamp = received_at;

    if let Some(info) = &payload.tx_info {
        if amount == 0 {
            amount = info.amount;
        }
        if tx_hash.is_empty() {
            tx_hash = info.tx_hash.clone();
        }
        if info.timestamp > 0 {
            timestamp = DateTime::from_timestamp(info.timestamp, 0).unwrap_or(received_at);
        }
    }
    if let Some(flat_ts) = payload.timestamp {
        timestamp = flat_ts;
    }

    let height = payload
        .height
        .or_else(|| payload.tx_info.as_ref().and_then(|info| info.block))
        .unwrap_or(0);

    ResolvedHook {
        amount,
        tx_hash,
        timestamp,
        height,
    }
}
