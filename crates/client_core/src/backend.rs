use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, Response,
};
use shared::protocol::{
    AnalysisPayload, RegenerateRequest, TriviaResponse, PROCESS_MUSIC_PATH, REGENERATE_PATH,
    TRIVIA_PATH, UPLOAD_FIELD_NAME,
};
use tracing::{info, warn};
use url::Url;

use crate::{
    config::Settings,
    error::ClientError,
    types::{AnalysisResult, SelectedFile},
};

/// The three endpoints of the analysis backend.
#[async_trait]
pub trait BackendApi: Send + Sync {
    async fn process_music(&self, file: &SelectedFile) -> Result<AnalysisResult, ClientError>;
    async fn regenerate(&self) -> Result<AnalysisResult, ClientError>;
    async fn trivia(&self) -> Result<String, ClientError>;
}

#[async_trait]
impl<T> BackendApi for Arc<T>
where
    T: BackendApi + ?Sized,
{
    async fn process_music(&self, file: &SelectedFile) -> Result<AnalysisResult, ClientError> {
        (**self).process_music(file).await
    }

    async fn regenerate(&self) -> Result<AnalysisResult, ClientError> {
        (**self).regenerate().await
    }

    async fn trivia(&self) -> Result<String, ClientError> {
        (**self).trivia().await
    }
}

pub struct HttpBackend {
    http: Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::build(base_url, Client::builder())
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, ClientError> {
        Self::build(
            &settings.base_url,
            Client::builder().timeout(Duration::from_secs(settings.request_timeout_secs)),
        )
    }

    fn build(base_url: &str, builder: reqwest::ClientBuilder) -> Result<Self, ClientError> {
        let base_url = normalize_base_url(base_url)?;
        let http = builder
            .build()
            .map_err(|err| ClientError::Transport(format!("failed to build http client: {err}")))?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|err| ClientError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: err.to_string(),
            })
    }
}

#[async_trait]
impl BackendApi for HttpBackend {
    async fn process_music(&self, file: &SelectedFile) -> Result<AnalysisResult, ClientError> {
        let url = self.endpoint(PROCESS_MUSIC_PATH)?;
        info!(
            endpoint = %url,
            file = %file.name,
            bytes = file.bytes.len(),
            "uploading score for analysis"
        );
        let part = Part::bytes(file.bytes.to_vec())
            .file_name(file.name.clone())
            .mime_str(&file.media_type)
            .map_err(|err| ClientError::Transport(format!("invalid upload media type: {err}")))?;
        let form = Form::new().part(UPLOAD_FIELD_NAME, part);

        let response = self.http.post(url).multipart(form).send().await?;
        decode_analysis_response(response).await
    }

    async fn regenerate(&self) -> Result<AnalysisResult, ClientError> {
        let url = self.endpoint(REGENERATE_PATH)?;
        info!(endpoint = %url, "requesting another visual style");
        let response = self
            .http
            .post(url)
            .json(&RegenerateRequest::default())
            .send()
            .await?;
        decode_analysis_response(response).await
    }

    async fn trivia(&self) -> Result<String, ClientError> {
        let url = self.endpoint(TRIVIA_PATH)?;
        let body: TriviaResponse = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(body.trivia)
    }
}

/// Non-2xx statuses surface the body's `error` text when the body has one.
async fn decode_analysis_response(response: Response) -> Result<AnalysisResult, ClientError> {
    let status = response.status();
    let body = response.bytes().await?;
    let payload = serde_json::from_slice::<AnalysisPayload>(&body);

    if !status.is_success() {
        let message = payload
            .ok()
            .and_then(|payload| payload.error)
            .filter(|error| !error.trim().is_empty());
        warn!(status = status.as_u16(), ?message, "analysis request failed");
        return Err(ClientError::Status {
            status: status.as_u16(),
            message,
        });
    }

    let payload = payload.map_err(|err| {
        ClientError::Malformed(format!("invalid analysis response payload: {err}"))
    })?;
    AnalysisResult::from_payload(payload)
}

/// Requires http(s) and forces a trailing slash so endpoint paths join
/// below any path prefix instead of replacing its last segment.
pub fn normalize_base_url(raw: &str) -> Result<Url, ClientError> {
    let invalid = |reason: String| ClientError::InvalidBaseUrl {
        url: raw.to_string(),
        reason,
    };

    let mut url = Url::parse(raw.trim()).map_err(|err| invalid(err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("url cannot be used as a base".to_string()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

#[cfg(test)]
#[path = "tests/backend_tests.rs"]
mod tests;
