//! Transaction store contract and its MySQL implementation
//!
//! The reconciliation service talks to storage through `TransactionStore` so
//! tests can substitute an in-memory store. `MySqlStore` delegates to the
//! query functions in `crate::db`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlPool;
use thiserror::Error;

use crate::db;
use crate::models::{SubTransaction, Transaction};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Query(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Query(err.to_string())
    }
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn find_transaction_by_id(&self, id: u64) -> Result<Option<Transaction>, StoreError>;

    async fn create_transaction(
        &self,
        amount: i64,
        required_confirmations: i64,
        sub_address: Option<String>,
    ) -> Result<Transaction, StoreError>;

    /// Persists the transaction row, including the derived flags.
    /// Sub-transaction rows are upserted individually before this call;
    /// partial application on failure is accepted and healed by re-delivery.
    async fn update_transaction(&self, transaction: &Transaction) -> Result<(), StoreError>;

    async fn find_unconfirmed_transactions(&self) -> Result<Vec<Transaction>, StoreError>;

    async fn find_recent_pending_by_amount(
        &self,
        amount: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, StoreError>;

    async fn create_sub_transaction(&self, sub: &SubTransaction) -> Result<u64, StoreError>;

    async fn update_sub_transaction(&self, sub: &SubTransaction) -> Result<(), StoreError>;

    async fn delete_pending_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError>;
}

pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionStore for MySqlStore {
    async fn find_transaction_by_id(&self, id: u64) -> Result<Option<Transaction>, StoreError> {
        Ok(db::transaction::find_transaction_by_id(&self.pool, id).await?)
    }

    async fn create_transaction(
        &self,
        amount: i64,
        required_confirmations: i64,
        sub_address: Option<String>,
    ) -> Result<Transaction, StoreError> {
        Ok(db::transaction::create_transaction(
            &self.pool,
            amount,
            required_confirmations,
            sub_address.as_deref(),
        )
        .await?)
    }

    async fn update_transaction(&self, transaction: &Transaction) -> Result<(), StoreError> {
        Ok(db::transaction::update_transaction(&self.pool, transaction).await?)
    }

    async fn find_unconfirmed_transactions(&self) -> Result<Vec<Transaction>, StoreError> {
        Ok(db::transaction::find_unconfirmed_transactions(&self.pool).await?)
    }

    async fn find_recent_pending_by_amount(
        &self,
        amount: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, StoreError> {
        Ok(db::transaction::find_recent_pending_by_amount(&self.pool, amount, since).await?)
    }

    async fn create_sub_transaction(&self, sub: &SubTransaction) -> Result<u64, StoreError> {
        Ok(db::sub_transaction::create_sub_transaction(&self.pool, sub).await?)
    }

    async fn update_sub_transaction(&self, sub: &SubTransaction) -> Result<(), StoreError> {
        Ok(db::sub_transaction::update_sub_transaction(&self.pool, sub).await?)
    }

    async fn delete_pending_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        Ok(db::transaction::delete_pending_before(&self.pool, cutoff).await?)
    }
}
