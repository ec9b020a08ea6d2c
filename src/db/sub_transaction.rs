use sqlx::mysql::MySqlPool;

use crate::models::SubTransaction;

/// All sub-transactions of a transaction, oldest observation first
pub async fn find_by_transaction(
    pool: &MySqlPool,
    transaction_id: u64,
) -> Result<Vec<SubTransaction>, sqlx::Error> {
    sqlx::query_as::<_, SubTransaction>(
        "SELECT id, transaction_id, amount, confirmations, double_spend_seen, fee, height, \
                timestamp, tx_hash, unlock_time, locked \
         FROM sub_transaction WHERE transaction_id = ? ORDER BY id ASC",
    )
    .bind(transaction_id)
    .fetch_all(pool)
    .await
}

/// Insert a newly observed transfer; returns the generated id
pub async fn create_sub_transaction(
    pool: &MySqlPool,
    sub: &SubTransaction,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO sub_transaction \
         (transaction_id, amount, confirmations, double_spend_seen, fee, height, timestamp, \
          tx_hash, unlock_time, locked) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(sub.transaction_id)
    .bind(sub.amount)
    .bind(sub.confirmations)
    .bind(sub.double_spend_seen)
    .bind(sub.fee)
    .bind(sub.height)
    .bind(sub.timestamp)
    .bind(&sub.tx_hash)
    .bind(sub.unlock_time)
    .bind(sub.locked)
    .execute(pool)
    .await?;

    Ok(result.last_insert_id())
}

/// Overwrite the mutable fields of an existing observation (last write wins)
pub async fn update_sub_transaction(
    pool: &MySqlPool,
    sub: &SubTransaction,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE sub_transaction SET amount = ?, confirmations = ?, double_spend_seen = ?, \
         fee = ?, height = ?, timestamp = ?, unlock_time = ?, locked = ? WHERE id = ?",
    )
    .bind(sub.amount)
    .bind(sub.confirmations)
    .bind(sub.double_spend_seen)
    .bind(sub.fee)
    .bind(sub.height)
    .bind(sub.timestamp)
    .bind(sub.unlock_time)
    .bind(sub.locked)
    .bind(sub.id)
    .execute(pool)
    .await?;

    Ok(())
}
