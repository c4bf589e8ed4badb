//! Analytics API client.
//!
//! Session resolution is the one call that must succeed (no session, no
//! booth). Counter recording is strictly fire-and-forget: a dead analytics
//! backend must never stall or fail the media pipeline.

use std::time::Duration;

use tracing::{debug, warn};

use booth_models::{AccessId, CounterField, SessionParams};

use crate::error::{KioskError, KioskResult};

/// HTTP client for the analytics API.
#[derive(Clone)]
pub struct TransactionClient {
    http: reqwest::Client,
    base_url: String,
}

impl TransactionClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .expect("reqwest client");
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Resolve the encrypted QR query into session parameters.
    ///
    /// The server decrypts, validates, generates the access id, and records
    /// the visit; a 400 here means "show the scan-to-begin screen".
    pub async fn resolve_session(&self, raw_query: &str) -> KioskResult<SessionParams> {
        let url = format!("{}/session?{}", self.base_url, raw_query);
        let response = self.http.get(&url).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::BAD_REQUEST {
            return Err(KioskError::ScanToBegin);
        }
        if !status.is_success() {
            return Err(KioskError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let params = response.json::<SessionParams>().await?;
        debug!(access_id = params.access_id.as_str(), "Session resolved");
        Ok(params)
    }

    /// Increment one counter. Errors are returned for tests; production
    /// paths go through `record_detached`.
    pub async fn record(&self, access_id: &AccessId, field: CounterField) -> KioskResult<()> {
        let url = format!("{}/updateTransaction", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({
                "accessId": access_id,
                "field": field.wire_name(),
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(KioskError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }

    /// Fire-and-forget counter increment: spawned, logged on failure,
    /// never awaited by the pipeline.
    pub fn record_detached(&self, access_id: &AccessId, field: CounterField) {
        let client = self.clone();
        let access_id = access_id.clone();
        tokio::spawn(async move {
            if let Err(e) = client.record(&access_id, field).await {
                warn!(field = field.wire_name(), "Transaction logging failed: {e}");
            }
        });
    }
}
