use thiserror::Error;

use crate::store::StoreError;

/// Failure taxonomy surfaced by the reconciliation service.
///
/// Notification-path errors are returned to the caller; sweep-path errors are
/// logged and swallowed so one bad lookup never stalls the loop.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_maps_to_internal() {
        let err: ServiceError = StoreError::Query("connection reset".to_string()).into();
        assert!(matches!(err, ServiceError::Internal(_)));
    }
}
