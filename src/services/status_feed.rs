//! Live-status feed for POS terminals
//!
//! After every successful reconciliation merge the service pushes the updated
//! transaction here. Delivery is best-effort: subscribers that are gone or too
//! slow are skipped, and the merge never waits on them.

use std::collections::HashMap;

use lazy_static::lazy_static;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use crate::models::Transaction;

const SUBSCRIBER_BUFFER: usize = 16;

lazy_static! {
    static ref SUBSCRIBERS: Mutex<HashMap<u64, Vec<mpsc::Sender<Transaction>>>> =
        Mutex::new(HashMap::new());
}

/// Register a subscriber for updates to one transaction
pub async fn subscribe(transaction_id: u64) -> mpsc::Receiver<Transaction> {
    let (sender, receiver) = mpsc::channel(SUBSCRIBER_BUFFER);
    SUBSCRIBERS
        .lock()
        .await
        .entry(transaction_id)
        .or_default()
        .push(sender);
    receiver
}

/// Deliver an updated transaction to its subscribers, best effort
pub async fn notify_transaction_update(transaction_id: u64, transaction: Transaction) {
    let mut subscribers = SUBSCRIBERS.lock().await;
    let Some(senders) = subscribers.get_mut(&transaction_id) else {
        return;
    };

    senders.retain(|sender| !sender.is_closed());
    for sender in senders.iter() {
        if sender.try_send(transaction.clone()).is_err() {
            debug!("status feed: dropped update for transaction {}", transaction_id);
        }
    }

    if senders.is_empty() {
        subscribers.remove(&transaction_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_transaction(id: u64) -> Transaction {
        Transaction {
            id,
            amount: 1_000_000,
            required_confirmations: 1,
            sub_address: Some("addr".to_string()),
            accepted: false,
            confirmed: false,
            created_at: Utc::now(),
            sub_transactions: vec![],
        }
    }

    #[tokio::test]
    async fn test_subscriber_receives_update() {
        let mut receiver = subscribe(9001).await;

        notify_transaction_update(9001, sample_transaction(9001)).await;

        let update = receiver.try_recv().expect("expected an update");
        assert_eq!(update.id, 9001);
    }

    #[tokio::test]
    async fn test_notify_without_subscribers_is_noop() {
        notify_transaction_update(9002, sample_transaction(9002)).await;
    }

    #[tokio::test]
    async fn test_closed_subscribers_are_pruned() {
        let receiver = subscribe(9003).await;
        drop(receiver);

        notify_transaction_update(9003, sample_transaction(9003)).await;

        assert!(!SUBSCRIBERS.lock().await.contains_key(&9003));
    }
}
