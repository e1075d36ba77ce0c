//! Single-flight gate for prediction requests.
//!
//! At most one prediction is in flight at any time. A second submit while
//! one is running is refused immediately rather than queued, and the
//! running request stays observable through `current_request()`.
//!
//! The guard is `Send`, so it can be held across `.await` points inside
//! request handlers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use serde::Serialize;
use uuid::Uuid;

use crate::models::DiagnosisType;

/// Snapshot of the prediction currently in flight.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveRequest {
    pub request_id: Uuid,
    pub diagnosis: DiagnosisType,
    /// When the request started (ISO 8601).
    pub started_at: String,
}

// ═══════════════════════════════════════════════════════════
// PredictionService
// ═══════════════════════════════════════════════════════════

pub struct PredictionService {
    busy: AtomicBool,
    current: Mutex<Option<ActiveRequest>>,
}

impl PredictionService {
    pub fn new() -> Self {
        Self {
            busy: AtomicBool::new(false),
            current: Mutex::new(None),
        }
    }

    /// Claim the gate without waiting.
    ///
    /// Returns `None` if another prediction is already running.
    pub fn try_begin(&self, diagnosis: DiagnosisType) -> Option<PredictionGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;

        let request = ActiveRequest {
            request_id: Uuid::new_v4(),
            diagnosis,
            started_at: chrono::Utc::now().to_rfc3339(),
        };
        let request_id = request.request_id;
        if let Ok(mut current) = self.current.lock() {
            *current = Some(request);
        }
        tracing::debug!(%request_id, %diagnosis, "Prediction gate acquired");

        Some(PredictionGuard {
            service: self,
            request_id,
        })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// What is running right now, if anything.
    pub fn current_request(&self) -> Option<ActiveRequest> {
        self.current.lock().ok()?.clone()
    }

    fn release(&self) {
        if let Ok(mut current) = self.current.lock() {
            *current = None;
        }
        self.busy.store(false, Ordering::Release);
    }
}

impl Default for PredictionService {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════
// PredictionGuard, RAII in-flight token
// ═══════════════════════════════════════════════════════════

/// Dropping the guard reopens the gate, on success, failure or cancellation.
pub struct PredictionGuard<'a> {
    service: &'a PredictionService,
    request_id: Uuid,
}

impl PredictionGuard<'_> {
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }
}

impl Drop for PredictionGuard<'_> {
    fn drop(&mut self) {
        self.service.release();
        tracing::debug!(request_id = %self.request_id, "Prediction gate released");
    }
}
