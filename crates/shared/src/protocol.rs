use serde::{Deserialize, Serialize};

pub const PROCESS_MUSIC_PATH: &str = "api/process-music";
pub const REGENERATE_PATH: &str = "api/regenerate";
pub const TRIVIA_PATH: &str = "api/trivia";

/// Multipart field carrying the score bytes on `POST /api/process-music`.
pub const UPLOAD_FIELD_NAME: &str = "file";

/// Response body shared by `/api/process-music` and `/api/regenerate`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visualization_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disclaimer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `POST /api/regenerate` body. Serializes to `{}`: the server reuses the
/// analysis of the last upload and picks a different style.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegenerateRequest {}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TriviaResponse {
    pub trivia: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regenerate_request_is_an_empty_object() {
        let body = serde_json::to_string(&RegenerateRequest::default()).expect("serialize");
        assert_eq!(body, "{}");
    }

    #[test]
    fn analysis_payload_tolerates_missing_and_null_fields() {
        let payload: AnalysisPayload =
            serde_json::from_str(r#"{"title":"Nocturne","narration":null,"status":200}"#)
                .expect("parse");
        assert_eq!(payload.title.as_deref(), Some("Nocturne"));
        assert!(payload.narration.is_none());
        assert!(payload.error.is_none());
    }
}
