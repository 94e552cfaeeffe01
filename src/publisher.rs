//! One best-effort publish cycle.
//!
//! `acquire backend -> monitoring api -> statistics -> encode -> POST`.
//! Every stage that can fail ends the cycle with a single warning; nothing
//! escapes [`Publish::publish`].
use std::future::Future;

use parking_lot::RwLock;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, StatusCode, Url};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::MonitorConfig;
use crate::error::MonitorError;
use crate::statistics::{Payload, StatisticsSnapshot};
use crate::storage::BackendSource;

pub const STATISTICS_PATH: &str = "/api/statistics";
pub const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

/// Status the collector answers with when it accepted a snapshot.
pub const EXPECTED_STATUS: StatusCode = StatusCode::CREATED;

/// Something the scheduler can drive once per cycle.
pub trait Publish: Send + Sync {
    /// Run one cycle. Must not panic on collaborator failures and must not block past cancellation.
    fn publish(&self, cancel: &CancellationToken) -> impl Future<Output = ()> + Send;

    /// Release owned resources. Safe to call more than once.
    fn close(&self);
}

#[derive(Debug, Error)]
enum TransmitError {
    #[error("http client has been closed")]
    Closed,
    #[error("request cancelled")]
    Cancelled,
    #[error(transparent)]
    Request(#[from] reqwest::Error),
}

// ---------- StatisticsPublisher ----------

pub struct StatisticsPublisher<B> {
    backend: B,
    client: RwLock<Option<Client>>,
    endpoint: Url,
    name: Option<String>,
}

impl<B: BackendSource> StatisticsPublisher<B> {
    /// Build a publisher with its own HTTP client.
    pub fn new(backend: B, config: &MonitorConfig) -> Result<Self, MonitorError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            headers.insert(API_KEY_HEADER, HeaderValue::from_str(key)?);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        Self::with_client(backend, client, &config.base_url, config.name.clone())
    }

    /// Use a pre-built client. `base_url` is resolved against [`STATISTICS_PATH`].
    pub fn with_client(
        backend: B,
        client: Client,
        base_url: &str,
        name: Option<String>,
    ) -> Result<Self, MonitorError> {
        let endpoint = statistics_endpoint(base_url)?;
        Ok(Self {
            backend,
            client: RwLock::new(Some(client)),
            endpoint,
            name,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn is_closed(&self) -> bool {
        self.client.read().is_none()
    }

    /// Stages 1-3. `None` means the cycle is over and a warning has been logged.
    fn fetch_statistics(&self) -> Option<StatisticsSnapshot> {
        let Some(storage) = self.backend.current() else {
            warn!("Job storage is not initialized. Statistics will not be published.");
            return None;
        };

        let api = match storage.monitoring_api() {
            Ok(Some(api)) => api,
            Ok(None) => {
                warn!("Job storage did not return a monitoring API. Statistics will not be published.");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Job storage failed to return a monitoring API. Statistics will not be published.");
                return None;
            }
        };

        match api.statistics() {
            Ok(Some(statistics)) => Some(statistics),
            Ok(None) => {
                warn!("Monitoring API did not return statistics. Statistics will not be published.");
                None
            }
            Err(e) => {
                warn!(error = %e, "Monitoring API failed to return statistics. Statistics will not be published.");
                None
            }
        }
    }

    async fn transmit(&self, body: String, cancel: &CancellationToken) -> Result<StatusCode, TransmitError> {
        // Clone out of the lock: the guard must not live across an await.
        let client = self.client.read().clone().ok_or(TransmitError::Closed)?;

        let request = client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send();

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TransmitError::Cancelled),
            res = request => Ok(res?.status()),
        }
    }
}

impl<B: BackendSource> Publish for StatisticsPublisher<B> {
    async fn publish(&self, cancel: &CancellationToken) {
        let Some(statistics) = self.fetch_statistics() else {
            return;
        };

        let body = match Payload::new(self.name.as_deref(), statistics).to_json() {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "Failed to encode statistics. Statistics will not be published.");
                return;
            }
        };

        match self.transmit(body, cancel).await {
            Ok(status) if status == EXPECTED_STATUS => {
                debug!(endpoint = %self.endpoint, "Statistics published");
            }
            Ok(status) => {
                warn!(status = status.as_u16(), "Failed to post statistics. Status code: {}", status);
            }
            Err(e) => {
                warn!(error = %e, "Failed to post statistics.");
            }
        }
    }

    fn close(&self) {
        if self.client.write().take().is_some() {
            debug!("Statistics publisher closed");
        }
    }
}

fn statistics_endpoint(base_url: &str) -> Result<Url, MonitorError> {
    let invalid = |reason: String| MonitorError::InvalidUrl {
        url: base_url.to_string(),
        reason,
    };

    let base = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
    if base.cannot_be_a_base() {
        return Err(invalid("not a base url".to_string()));
    }
    base.join(STATISTICS_PATH).map_err(|e| invalid(e.to_string()))
}
