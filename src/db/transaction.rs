use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlPool;

use crate::db::sub_transaction;
use crate::models::Transaction;

/// Fetch a transaction with its sub-transactions attached
pub async fn find_transaction_by_id(
    pool: &MySqlPool,
    id: u64,
) -> Result<Option<Transaction>, sqlx::Error> {
    let row = sqlx::query_as::<_, Transaction>(
        "SELECT id, amount, required_confirmations, sub_address, accepted, confirmed, created_at \
         FROM transaction WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    let Some(mut transaction) = row else {
        return Ok(None);
    };

    transaction.sub_transactions = sub_transaction::find_by_transaction(pool, id).await?;

    Ok(Some(transaction))
}

/// Create a pending transaction; returns it with the generated id and timestamp
pub async fn create_transaction(
    pool: &MySqlPool,
    amount: i64,
    required_confirmations: i64,
    sub_address: Option<&str>,
) -> Result<Transaction, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO transaction (amount, required_confirmations, sub_address) VALUES (?, ?, ?)",
    )
    .bind(amount)
    .bind(required_confirmations)
    .bind(sub_address)
    .execute(pool)
    .await?;

    let id = result.last_insert_id();
    find_transaction_by_id(pool, id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

/// Persist derived flags and address for an existing transaction
pub async fn update_transaction(
    pool: &MySqlPool,
    transaction: &Transaction,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE transaction SET sub_address = ?, accepted = ?, confirmed = ? WHERE id = ?",
    )
    .bind(transaction.sub_address.as_deref())
    .bind(transaction.accepted)
    .bind(transaction.confirmed)
    .bind(transaction.id)
    .execute(pool)
    .await?;

    Ok(())
}

/// All transactions not yet confirmed, oldest first (sweep working set)
pub async fn find_unconfirmed_transactions(
    pool: &MySqlPool,
) -> Result<Vec<Transaction>, sqlx::Error> {
    sqlx::query_as::<_, Transaction>(
        "SELECT id, amount, required_confirmations, sub_address, accepted, confirmed, created_at \
         FROM transaction WHERE confirmed = 0 ORDER BY created_at ASC",
    )
    .fetch_all(pool)
    .await
}

/// Pending transactions of an exact amount created since `since`
///
/// Correlation query for the LWS hook, which carries no transaction id.
pub async fn find_recent_pending_by_amount(
    pool: &MySqlPool,
    amount: i64,
    since: DateTime<Utc>,
) -> Result<Vec<Transaction>, sqlx::Error> {
    sqlx::query_as::<_, Transaction>(
        "SELECT id, amount, required_confirmations, sub_address, accepted, confirmed, created_at \
         FROM transaction \
         WHERE amount = ? AND accepted = 0 AND confirmed = 0 AND created_at >= ?",
    )
    .bind(amount)
    .bind(since)
    .fetch_all(pool)
    .await
}

/// Delete unconfirmed transactions older than `cutoff`, cascading to their
/// sub-transactions in one database transaction. Returns the number removed.
pub async fn delete_pending_before(
    pool: &MySqlPool,
    cutoff: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let ids: Vec<(u64,)> = sqlx::query_as(
        "SELECT id FROM transaction WHERE confirmed = 0 AND created_at < ?",
    )
    .bind(cutoff)
    .fetch_all(&mut *tx)
    .await?;

    if ids.is_empty() {
        tx.commit().await?;
        return Ok(0);
    }

    let mut removed = 0u64;
    for (id,) in &ids {
        sqlx::query("DELETE FROM sub_transaction WHERE transaction_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let res = sqlx::query("DELETE FROM transaction WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        removed += res.rows_affected();
    }

    tx.commit().await?;

    Ok(removed)
}
