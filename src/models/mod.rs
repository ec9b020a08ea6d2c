//! Data models shared across the service and HTTP layers
//!
//! Domain entities mirror the MySQL schema in `migrations/create_tables.sql`;
//! payload structs mirror the JSON bodies the hook endpoints receive.

pub mod callback;
pub mod transaction;

pub use callback::{LwsHookPayload, LwsTxInfo};
pub use transaction::{SubTransaction, Transaction};
