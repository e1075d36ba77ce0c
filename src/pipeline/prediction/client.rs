use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use futures_util::future::BoxFuture;

use super::wire::{self, PredictRequest};
use super::{FeaturePayload, PredictionError};
use crate::config::BackendConfig;
use crate::models::{ApiStatus, DiagnosisType, PredictionResult};

/// Access to the remote prediction service.
///
/// One call to `predict` is exactly one HTTP request: no retries.
pub trait PredictionApi: Send + Sync {
    fn predict<'a>(
        &'a self,
        diagnosis: DiagnosisType,
        payload: &'a FeaturePayload,
    ) -> BoxFuture<'a, Result<PredictionResult, PredictionError>>;

    /// Reachability probe for the status indicator. Never fails.
    fn check_health(&self) -> BoxFuture<'_, ApiStatus>;

    fn base_url(&self) -> &str;
}

// ═══════════════════════════════════════════════════════════
// HttpPredictionClient
// ═══════════════════════════════════════════════════════════

/// HTTP client for the prediction backend.
pub struct HttpPredictionClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpPredictionClient {
    /// Build a client from explicit backend settings.
    ///
    /// Only the connect phase is time-limited.
    pub fn new(config: &BackendConfig) -> Result<Self, PredictionError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| PredictionError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> PredictionError {
        if e.is_connect() {
            PredictionError::Transport(format!("connection to {} failed", self.base_url))
        } else if e.is_timeout() {
            PredictionError::Transport(format!("{} timed out", self.base_url))
        } else {
            PredictionError::Transport(e.to_string())
        }
    }
}

impl PredictionApi for HttpPredictionClient {
    fn predict<'a>(
        &'a self,
        diagnosis: DiagnosisType,
        payload: &'a FeaturePayload,
    ) -> BoxFuture<'a, Result<PredictionResult, PredictionError>> {
        Box::pin(async move {
            let url = format!("{}{}", self.base_url, diagnosis.endpoint());
            tracing::debug!(
                %diagnosis,
                fields = payload.len(),
                filled = payload.filled(),
                "Sending prediction request"
            );

            let response = self
                .client
                .post(&url)
                .json(&PredictRequest::for_diagnosis(diagnosis, payload))
                .send()
                .await
                .map_err(|e| self.transport_error(e))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = wire::server_message(status.as_u16(), &body);
                tracing::warn!(%diagnosis, status = status.as_u16(), "Prediction backend returned error");
                return Err(PredictionError::Server {
                    status: status.as_u16(),
                    message,
                });
            }

            let body = response
                .bytes()
                .await
                .map_err(|e| PredictionError::ResponseParsing(e.to_string()))?;
            wire::parse_response(diagnosis, &body)
        })
    }

    fn check_health(&self) -> BoxFuture<'_, ApiStatus> {
        Box::pin(async move {
            let url = format!("{}/", self.base_url);
            match self.client.get(&url).send().await {
                Ok(response) if response.status().is_success() => ApiStatus::Online,
                Ok(response) => {
                    tracing::debug!(status = response.status().as_u16(), "Backend health check non-2xx");
                    ApiStatus::Offline
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Backend health check failed");
                    ApiStatus::Offline
                }
            }
        })
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

// ═══════════════════════════════════════════════════════════
// MockPredictionClient
// ═══════════════════════════════════════════════════════════

/// Scripted failure for `MockPredictionClient`.
#[derive(Debug, Clone)]
pub enum MockFailure {
    Offline,
    Server { status: u16, message: String },
}

/// Mock prediction client for testing: returns a configurable outcome,
/// counts calls and records every payload it receives.
pub struct MockPredictionClient {
    outcome: Result<PredictionResult, MockFailure>,
    health: ApiStatus,
    delay: Option<Duration>,
    calls: AtomicUsize,
    payloads: Mutex<Vec<(DiagnosisType, FeaturePayload)>>,
}

impl MockPredictionClient {
    pub fn new(result: PredictionResult) -> Self {
        Self {
            outcome: Ok(result),
            health: ApiStatus::Online,
            delay: None,
            calls: AtomicUsize::new(0),
            payloads: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(failure: MockFailure) -> Self {
        let health = match failure {
            MockFailure::Offline => ApiStatus::Offline,
            MockFailure::Server { .. } => ApiStatus::Online,
        };
        Self {
            outcome: Err(failure),
            health,
            delay: None,
            calls: AtomicUsize::new(0),
            payloads: Mutex::new(Vec::new()),
        }
    }

    /// Hold every `predict` call open for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_health(mut self, health: ApiStatus) -> Self {
        self.health = health;
        self
    }

    /// Number of `predict` calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn payloads(&self) -> Vec<(DiagnosisType, FeaturePayload)> {
        self.payloads.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl PredictionApi for MockPredictionClient {
    fn predict<'a>(
        &'a self,
        diagnosis: DiagnosisType,
        payload: &'a FeaturePayload,
    ) -> BoxFuture<'a, Result<PredictionResult, PredictionError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut seen) = self.payloads.lock() {
                seen.push((diagnosis, payload.clone()));
            }
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match &self.outcome {
                Ok(result) => Ok(result.clone()),
                Err(MockFailure::Offline) => {
                    Err(PredictionError::Transport("mock backend offline".into()))
                }
                Err(MockFailure::Server { status, message }) => Err(PredictionError::Server {
                    status: *status,
                    message: message.clone(),
                }),
            }
        })
    }

    fn check_health(&self) -> BoxFuture<'_, ApiStatus> {
        let health = self.health;
        Box::pin(async move { health })
    }

    fn base_url(&self) -> &str {
        "http://mock.invalid"
    }
}
