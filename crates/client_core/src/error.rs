use shared::domain::SubmitMode;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("server responded with status {status}")]
    Status { status: u16, message: Option<String> },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("backend reported an error: {0}")]
    Application(String),
    #[error("invalid base url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("request was cancelled before it settled")]
    Cancelled,
}

impl ClientError {
    /// Text embedded into the user-facing failure message.
    pub fn detail(&self, mode: SubmitMode) -> String {
        match self {
            Self::Transport(message) | Self::Malformed(message) | Self::Application(message) => {
                message.clone()
            }
            Self::Status {
                message: Some(message),
                ..
            } => message.clone(),
            Self::Status { message: None, .. } => {
                format!("Server error during {}", mode.activity())
            }
            Self::InvalidBaseUrl { .. } => self.to_string(),
            Self::Cancelled => "request was cancelled".to_string(),
        }
    }

    pub fn user_message(&self, mode: SubmitMode) -> String {
        let detail = self.detail(mode);
        format!("Processing failed: {}.", detail.trim_end().trim_end_matches('.'))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Status {
                status: status.as_u16(),
                message: None,
            }
        } else {
            Self::Transport(err.to_string())
        }
    }
}
