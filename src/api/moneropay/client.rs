use async_trait::async_trait;
use reqwest::Client as HttpClient;

use super::models::{ApiError, ReceiveStatus};

/// Read-only view of the external payment processor's receive status.
///
/// The sweep and the hook handlers consume this instead of the concrete
/// client so tests can stub the external source.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn receive_status(&self, address: &str) -> Result<ReceiveStatus, ApiError>;
}

/// MoneroPay API client
pub struct MoneroPayClient {
    http_client: HttpClient,
    base_url: String,
}

impl MoneroPayClient {
    /// Create a new client against the given MoneroPay base URL
    pub fn new(base_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl StatusSource for MoneroPayClient {
    async fn receive_status(&self, address: &str) -> Result<ReceiveStatus, ApiError> {
        let url = format!("{}/receive/{}", self.base_url, address);

        let response = self.http_client.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status(status.as_u16(), body));
        }

        Ok(response.json::<ReceiveStatus>().await?)
    }
}
