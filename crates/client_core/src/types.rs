use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use shared::{
    domain::{SelectionId, SubmitMode, PDF_MEDIA_TYPE},
    protocol::AnalysisPayload,
};

use crate::error::ClientError;

pub const DEFAULT_TITLE: &str = "Score";
pub const DEFAULT_VISUALIZATION_TYPE: &str = "Abstract";
pub const DEFAULT_NARRATION: &str = "Narrative not available.";
pub const IMAGE_UNAVAILABLE: &str = "Image not available";

/// A file the user picked, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    pub name: String,
    pub media_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl FileCandidate {
    pub fn new(name: impl Into<String>, media_type: Option<&str>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.map(str::to_string),
            bytes,
        }
    }

    pub fn is_pdf(&self) -> bool {
        self.media_type.as_deref() == Some(PDF_MEDIA_TYPE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub id: SelectionId,
    pub name: String,
    pub media_type: String,
    pub bytes: Arc<[u8]>,
}

impl SelectedFile {
    pub fn summary(&self) -> SelectedFileSummary {
        SelectedFileSummary {
            id: self.id,
            name: self.name.clone(),
            size_bytes: self.bytes.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedFileSummary {
    pub id: SelectionId,
    pub name: String,
    pub size_bytes: usize,
}

/// A successful analysis. Only ever replaced wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub title: Option<String>,
    pub visualization_type: Option<String>,
    pub image_base64: Option<String>,
    pub narration: Option<String>,
    pub disclaimer: Option<String>,
    pub prompt_name: Option<String>,
}

impl AnalysisResult {
    /// A blank `error` field counts as absent.
    pub fn from_payload(payload: AnalysisPayload) -> Result<Self, ClientError> {
        if let Some(error) = payload.error.filter(|error| !error.trim().is_empty()) {
            return Err(ClientError::Application(error));
        }
        Ok(Self {
            title: payload.title,
            visualization_type: payload.visualization_type,
            image_base64: payload.image_base64,
            narration: payload.narration,
            disclaimer: payload.disclaimer,
            prompt_name: payload.prompt_name,
        })
    }

    pub fn display_title(&self) -> &str {
        non_empty(&self.title).unwrap_or(DEFAULT_TITLE)
    }

    pub fn display_visualization_type(&self) -> &str {
        non_empty(&self.visualization_type).unwrap_or(DEFAULT_VISUALIZATION_TYPE)
    }

    pub fn display_narration(&self) -> &str {
        non_empty(&self.narration).unwrap_or(DEFAULT_NARRATION)
    }

    pub fn disclaimer(&self) -> Option<&str> {
        non_empty(&self.disclaimer)
    }

    pub fn has_image(&self) -> bool {
        non_empty(&self.image_base64).is_some()
    }

    /// Decoded image bytes (PNG as emitted by the backend), if any.
    pub fn decode_image(&self) -> Result<Option<Vec<u8>>, ClientError> {
        let Some(encoded) = non_empty(&self.image_base64) else {
            return Ok(None);
        };
        let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        STANDARD
            .decode(compact.as_bytes())
            .map(Some)
            .map_err(|err| ClientError::Malformed(format!("invalid image_base64 payload: {err}")))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|text| !text.trim().is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingState {
    Idle,
    PendingAuto,
    Loading,
    HasResult,
    Error,
}

/// What the view layer gets to see after every controller mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControllerSnapshot {
    pub state: ProcessingState,
    pub selected_file: Option<SelectedFileSummary>,
    pub result: Option<AnalysisResult>,
    pub is_loading: bool,
    pub in_flight: Option<SubmitMode>,
    pub error_message: Option<String>,
}

impl Default for ControllerSnapshot {
    fn default() -> Self {
        Self {
            state: ProcessingState::Idle,
            selected_file: None,
            result: None,
            is_loading: false,
            in_flight: None,
            error_message: None,
        }
    }
}

impl ControllerSnapshot {
    pub fn loading_message(&self) -> &'static str {
        self.in_flight
            .unwrap_or(SubmitMode::Initial)
            .loading_message()
    }

    pub fn can_regenerate(&self) -> bool {
        self.result.is_some() && !self.is_loading
    }

    pub fn can_upload(&self) -> bool {
        !self.is_loading
    }
}
