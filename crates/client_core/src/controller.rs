use shared::domain::SubmitMode;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::{
    backend::BackendApi,
    error::ClientError,
    session::{SelectOutcome, SubmitRequest, UploadSession},
    types::{AnalysisResult, ControllerSnapshot, FileCandidate},
};

/// Owns the upload/result state machine and issues the requests that drive
/// it. Every mutation is published to [`UploadResultController::subscribe`]
/// receivers.
pub struct UploadResultController<B> {
    backend: B,
    session: UploadSession,
    updates: watch::Sender<ControllerSnapshot>,
}

impl<B: BackendApi> UploadResultController<B> {
    pub fn new(backend: B) -> Self {
        let session = UploadSession::new();
        let (updates, _) = watch::channel(session.snapshot());
        Self {
            backend,
            session,
            updates,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ControllerSnapshot> {
        self.updates.subscribe()
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        self.session.snapshot()
    }

    /// Applies a file selection, then fires the automatic Initial submission
    /// when the selection made one due.
    pub async fn select_file(&mut self, candidate: FileCandidate) -> SelectOutcome {
        let outcome = self.session.select_file(candidate);
        self.publish();
        if let SelectOutcome::Accepted(id) = outcome {
            info!(selection = id.0, "score selected");
        }
        self.run_auto_trigger().await;
        outcome
    }

    /// Submits the current selection once if it has not been auto-submitted
    /// yet. Returns whether a submission was started.
    pub async fn run_auto_trigger(&mut self) -> bool {
        let Some(id) = self.session.pending_auto_submit() else {
            return false;
        };
        self.session.mark_auto_submitted(id);
        info!(selection = id.0, "auto-submitting new selection");
        self.submit(SubmitMode::Initial).await;
        true
    }

    pub async fn submit(&mut self, mode: SubmitMode) {
        let Some(request) = self.session.begin_submit(mode) else {
            return;
        };
        self.publish();

        let backend = &self.backend;
        let mut in_flight = InFlight {
            session: &mut self.session,
            updates: &self.updates,
            mode,
            outcome: None,
        };
        let outcome = match request {
            SubmitRequest::Initial(file) => backend.process_music(&file).await,
            SubmitRequest::Regenerate => backend.regenerate().await,
        };
        match &outcome {
            Ok(result) => info!(
                mode = mode.label(),
                title = result.display_title(),
                style = result.display_visualization_type(),
                "analysis received"
            ),
            Err(err) => warn!(mode = mode.label(), "analysis request failed: {err}"),
        }
        in_flight.outcome = Some(outcome);
    }

    pub async fn regenerate(&mut self) {
        self.submit(SubmitMode::Regenerate).await;
    }

    fn publish(&self) {
        self.updates.send_replace(self.session.snapshot());
    }
}

/// Settles the session when dropped, so the loading flag is reset on every
/// exit path, including a submit future dropped mid-request.
struct InFlight<'a> {
    session: &'a mut UploadSession,
    updates: &'a watch::Sender<ControllerSnapshot>,
    mode: SubmitMode,
    outcome: Option<Result<AnalysisResult, ClientError>>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let outcome = self.outcome.take().unwrap_or_else(|| {
            warn!(mode = self.mode.label(), "submit dropped before its request settled");
            Err(ClientError::Cancelled)
        });
        self.session.settle(self.mode, outcome);
        self.updates.send_replace(self.session.snapshot());
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
