//! Synchronous upload/result state and its transition rules. No I/O happens
//! here; [`crate::controller::UploadResultController`] drives the requests.

use std::sync::Arc;

use shared::domain::{SelectionId, SubmitMode};
use tracing::{debug, warn};

use crate::{
    error::ClientError,
    types::{
        AnalysisResult, ControllerSnapshot, FileCandidate, ProcessingState, SelectedFile,
    },
};

pub const REJECTION_MESSAGE: &str =
    "File must be a PDF. Please select your sheet music file again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    Accepted(SelectionId),
    Rejected,
}

/// The single outbound request a submission resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitRequest {
    Initial(SelectedFile),
    Regenerate,
}

#[derive(Debug, Default)]
pub struct UploadSession {
    selected_file: Option<SelectedFile>,
    result: Option<AnalysisResult>,
    is_loading: bool,
    in_flight: Option<SubmitMode>,
    error_message: Option<String>,
    next_selection: u64,
    auto_submitted: Option<SelectionId>,
}

impl UploadSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select_file(&mut self, candidate: FileCandidate) -> SelectOutcome {
        if !candidate.is_pdf() {
            debug!(
                file = %candidate.name,
                media_type = ?candidate.media_type,
                "rejected non-pdf selection"
            );
            self.selected_file = None;
            self.error_message = Some(REJECTION_MESSAGE.to_string());
            return SelectOutcome::Rejected;
        }

        self.next_selection += 1;
        let id = SelectionId(self.next_selection);
        self.selected_file = Some(SelectedFile {
            id,
            name: candidate.name,
            media_type: candidate.media_type.unwrap_or_default(),
            bytes: Arc::from(candidate.bytes),
        });
        self.result = None;
        self.error_message = None;
        SelectOutcome::Accepted(id)
    }

    /// The selection that is due for its one automatic submission, if any.
    pub fn pending_auto_submit(&self) -> Option<SelectionId> {
        if self.is_loading || self.result.is_some() {
            return None;
        }
        let id = self.selected_file.as_ref()?.id;
        (self.auto_submitted != Some(id)).then_some(id)
    }

    pub fn mark_auto_submitted(&mut self, id: SelectionId) {
        self.auto_submitted = Some(id);
    }

    /// Enters the loading state and returns the request to issue. `None` for
    /// an Initial submission without a file, or while another is in flight.
    pub fn begin_submit(&mut self, mode: SubmitMode) -> Option<SubmitRequest> {
        if self.is_loading {
            warn!(mode = mode.label(), "submit ignored: a request is already in flight");
            return None;
        }
        let request = match mode {
            SubmitMode::Initial => SubmitRequest::Initial(self.selected_file.clone()?),
            SubmitMode::Regenerate => SubmitRequest::Regenerate,
        };
        self.is_loading = true;
        self.in_flight = Some(mode);
        self.error_message = None;
        Some(request)
    }

    pub fn settle(&mut self, mode: SubmitMode, outcome: Result<AnalysisResult, ClientError>) {
        match outcome {
            Ok(result) => {
                self.result = Some(result);
            }
            Err(err) => {
                if mode == SubmitMode::Initial {
                    self.selected_file = None;
                }
                self.error_message = Some(err.user_message(mode));
            }
        }
        self.is_loading = false;
        self.in_flight = None;
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.selected_file.as_ref()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn in_flight(&self) -> Option<SubmitMode> {
        self.in_flight
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// A failed regeneration keeps its result, so `HasResult` may carry an
    /// error message as an overlay.
    pub fn processing_state(&self) -> ProcessingState {
        if self.is_loading {
            ProcessingState::Loading
        } else if self.pending_auto_submit().is_some() {
            ProcessingState::PendingAuto
        } else if self.result.is_some() {
            ProcessingState::HasResult
        } else if self.error_message.is_some() {
            ProcessingState::Error
        } else {
            ProcessingState::Idle
        }
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            state: self.processing_state(),
            selected_file: self.selected_file.as_ref().map(SelectedFile::summary),
            result: self.result.clone(),
            is_loading: self.is_loading,
            in_flight: self.in_flight,
            error_message: self.error_message.clone(),
        }
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
