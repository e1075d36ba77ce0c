//! Submission flow: validate → normalize → predict → store.
//!
//! Validation failures never reach the network. The single-flight gate is
//! claimed only after the payload is valid, so a bad form never blocks a
//! good one.
//!
//! The predict and store steps run in their own task. A caller that goes
//! away mid-request (browser closed, connection dropped) does not cancel
//! them: the backend call completes and its result is still stored.

use std::sync::Arc;

use crate::core_state::{CoreError, CoreState};
use crate::form::RawFormState;
use crate::models::{ApiStatus, DiagnosisType, StoredResult};

use super::{normalize, FeaturePayload, PredictionError};

/// Run one prediction for `raw` and store the result.
///
/// Returns `InFlight` immediately if another prediction is pending.
pub async fn submit(
    core: &Arc<CoreState>,
    diagnosis: DiagnosisType,
    raw: &RawFormState,
) -> Result<StoredResult, PredictionError> {
    let payload = normalize(diagnosis, raw)?;

    let core = Arc::clone(core);
    let task = tokio::spawn(async move { predict_and_store(&core, diagnosis, payload).await });
    task.await.map_err(|e| {
        tracing::error!(%diagnosis, error = %e, "Prediction task failed");
        PredictionError::TaskFailed(e.to_string())
    })?
}

async fn predict_and_store(
    core: &CoreState,
    diagnosis: DiagnosisType,
    payload: FeaturePayload,
) -> Result<StoredResult, PredictionError> {
    let guard = core.predictions().try_begin(diagnosis).ok_or_else(|| {
        tracing::info!(%diagnosis, "Submission refused, prediction already in flight");
        PredictionError::InFlight
    })?;
    tracing::info!(
        request_id = %guard.request_id(),
        %diagnosis,
        filled = payload.filled(),
        "Submitting prediction"
    );

    let outcome = core.client().predict(diagnosis, &payload).await;
    match &outcome {
        Ok(_) => core.set_api_status(ApiStatus::Online),
        Err(PredictionError::Transport(reason)) => {
            tracing::warn!(request_id = %guard.request_id(), %reason, "Prediction backend unreachable");
            core.set_api_status(ApiStatus::Offline);
        }
        Err(e) => {
            tracing::warn!(request_id = %guard.request_id(), error = %e, "Prediction failed");
        }
    }
    let result = outcome?;

    let stored = StoredResult::new(diagnosis, result);
    core.store_result(&stored).map_err(|e| match e {
        CoreError::Store(store) => PredictionError::Store(store),
        _ => PredictionError::LockPoisoned,
    })?;

    tracing::info!(
        request_id = %guard.request_id(),
        prediction = stored.result.prediction,
        risk_level = %stored.result.risk_level,
        "Prediction stored"
    );
    Ok(stored)
}

/// Submit the active form session.
///
/// On success the form is emptied, unless it was edited, reset or restarted
/// while the request was pending. On failure it is left untouched so the
/// user can correct or retry.
pub async fn submit_form(core: &Arc<CoreState>) -> Result<StoredResult, PredictionError> {
    let (session_id, diagnosis, raw) = {
        let form = core.lock_form().map_err(|_| PredictionError::LockPoisoned)?;
        form.check_submittable()?;
        (form.id(), form.diagnosis(), form.raw().clone())
    };

    let stored = submit(core, diagnosis, &raw).await?;

    let mut form = core.lock_form().map_err(|_| PredictionError::LockPoisoned)?;
    if form.id() == session_id && *form.raw() == raw {
        form.reset();
    } else {
        tracing::debug!(%session_id, "Form changed while pending, keeping it");
    }
    Ok(stored)
}
