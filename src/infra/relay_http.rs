use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::{
    infra::{config::RelayConfig, error::AppError},
    usecases::contracts::{RelayClient, RelayError},
};

const RELAY_PATH: &str = "/iOSMessage";
const CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Serialize)]
struct RelayPayload<'a> {
    user_id: &'a str,
    message: &'a str,
}

/// Posts batched messages to the relay endpoint over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRelayClient {
    http: reqwest::Client,
}

impl HttpRelayClient {
    pub fn new(config: &RelayConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(AppError::HttpClientBuild)?;

        Ok(Self { http })
    }
}

pub fn relay_url(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), RELAY_PATH)
}

#[async_trait]
impl RelayClient for HttpRelayClient {
    async fn post_batch(
        &self,
        base_url: &str,
        user_id: &str,
        message: &str,
    ) -> Result<(), RelayError> {
        let response = self
            .http
            .post(relay_url(base_url))
            .json(&RelayPayload { user_id, message })
            .send()
            .await
            .map_err(|e| RelayError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        Err(RelayError::Rejected {
            status: status.as_u16(),
            reason: status
                .canonical_reason()
                .map(ToOwned::to_owned)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
        })
    }
}
