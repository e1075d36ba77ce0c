//! Application state shared by every request handler.
//!
//! Built once at startup from an `AppConfig`, a prediction client and a
//! result store, then wrapped in `Arc`. The form session sits behind a
//! `Mutex` that is never held across an `.await`.

use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use crate::config::AppConfig;
use crate::form::FormSession;
use crate::models::{ApiStatus, StoredResult};
use crate::pipeline::prediction::{HttpPredictionClient, PredictionApi, PredictionError};
use crate::prediction_service::PredictionService;
use crate::session_bridge::{self, ResultStore, StoreError};

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

pub struct CoreState {
    pub config: AppConfig,
    client: Arc<dyn PredictionApi>,
    /// The form currently being filled in.
    form: Mutex<FormSession>,
    results: Box<dyn ResultStore>,
    predictions: PredictionService,
    /// Last observed backend reachability.
    api_status: RwLock<ApiStatus>,
}

impl CoreState {
    /// Assemble state from explicit parts.
    pub fn new(
        config: AppConfig,
        client: Arc<dyn PredictionApi>,
        results: Box<dyn ResultStore>,
    ) -> Self {
        Self {
            config,
            client,
            form: Mutex::new(FormSession::default()),
            results,
            predictions: PredictionService::new(),
            api_status: RwLock::new(ApiStatus::Unknown),
        }
    }

    /// Production wiring: HTTP client and the configured result store.
    pub fn from_config(config: AppConfig) -> Result<Self, CoreError> {
        let client = HttpPredictionClient::new(&config.backend)?;
        let results = session_bridge::open_store(&config)?;
        Ok(Self::new(config, Arc::new(client), results))
    }

    pub fn client(&self) -> &dyn PredictionApi {
        self.client.as_ref()
    }

    pub fn predictions(&self) -> &PredictionService {
        &self.predictions
    }

    pub fn lock_form(&self) -> Result<MutexGuard<'_, FormSession>, CoreError> {
        self.form.lock().map_err(|_| CoreError::LockPoisoned)
    }

    // ── Session bridge ──────────────────────────────────────

    pub fn store_result(&self, result: &StoredResult) -> Result<(), CoreError> {
        Ok(self.results.store(result)?)
    }

    pub fn stored_result(&self) -> Result<Option<StoredResult>, CoreError> {
        Ok(self.results.retrieve()?)
    }

    pub fn clear_result(&self) -> Result<(), CoreError> {
        Ok(self.results.clear()?)
    }

    // ── Backend status ──────────────────────────────────────

    pub fn api_status(&self) -> ApiStatus {
        self.api_status
            .read()
            .map(|status| *status)
            .unwrap_or(ApiStatus::Unknown)
    }

    pub fn set_api_status(&self, status: ApiStatus) {
        if let Ok(mut current) = self.api_status.write() {
            let previous = *current;
            if previous != status {
                tracing::info!(from = %previous, to = %status, "Backend status changed");
            }
            *current = status;
        }
    }

    /// Probe the backend once and record the outcome.
    pub async fn refresh_api_status(&self) -> ApiStatus {
        let status = self.client.check_health().await;
        self.set_api_status(status);
        status
    }
}

// ═══════════════════════════════════════════════════════════
// Error types
// ═══════════════════════════════════════════════════════════

/// Errors from CoreState operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("Result store error: {0}")]
    Store(#[from] StoreError),
    #[error("Prediction client setup failed: {0}")]
    Client(#[from] PredictionError),
}

#[cfg(test)]
pub(crate) fn mock_state(client: Arc<dyn PredictionApi>) -> CoreState {
    CoreState::new(
        AppConfig::default(),
        client,
        Box::new(session_bridge::MemoryResultStore::new()),
    )
}
