pub mod client;
pub mod models;

pub use client::{MoneroPayClient, StatusSource};
pub use models::{ApiError, Covered, ReceiveAmount, ReceiveStatus, TransferStatus};
