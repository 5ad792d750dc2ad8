//! Backend-to-UI events and error modeling for the desktop GUI.

use client_core::{ControllerSnapshot, TriviaUpdate};

use crate::media::DecodedVisualization;

pub enum UiEvent {
    Info(String),
    Error(UiError),
    StateChanged(ControllerSnapshot),
    Trivia(TriviaUpdate),
    VisualizationDecoded(Option<DecodedVisualization>),
    VisualizationFailed { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Validation,
    Transport,
    Server,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    FileAccess,
    General,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("must be a pdf")
            || message_lower.contains("invalid")
            || message_lower.contains("malformed")
            || message_lower.contains("not found")
        {
            UiErrorCategory::Validation
        } else if message_lower.contains("timed out")
            || message_lower.contains("timeout")
            || message_lower.contains("connection")
            || message_lower.contains("transport")
            || message_lower.contains("error sending request")
            || message_lower.contains("dns")
        {
            UiErrorCategory::Transport
        } else if message_lower.contains("server error")
            || message_lower.contains("status")
            || message_lower.contains("backend reported")
        {
            UiErrorCategory::Server
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub fn err_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::Validation => "Validation",
        UiErrorCategory::Transport => "Connection",
        UiErrorCategory::Server => "Server",
        UiErrorCategory::Unknown => "Unexpected",
    }
}
