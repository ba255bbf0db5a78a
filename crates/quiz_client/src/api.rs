use std::time::Duration;

use chrono::{DateTime, Utc};
use quiz_logging::{quiz_debug, quiz_warn};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::{ApiError, FailureKind, UploadReceipt, VideoUpload};

/// Connection and polling parameters for one backend.
///
/// Always passed explicitly; two clients built from different settings can
/// talk to different backends side by side.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub api_base_url: String,
    pub connect_timeout: Duration,
    /// Applies to status, transcription and question requests.
    pub request_timeout: Duration,
    pub upload_timeout: Duration,
    pub health_timeout: Duration,
    /// Wait before every status check.
    pub poll_interval: Duration,
    /// Extra wait after a status check failed.
    pub retry_backoff: Duration,
    /// Give up polling after this long. `None` polls until a terminal phase.
    pub max_poll_duration: Option<Duration>,
    /// Give up after this many consecutive failed status checks.
    pub max_transient_failures: Option<u32>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            upload_timeout: Duration::from_secs(600),
            health_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(2000),
            retry_backoff: Duration::from_millis(1000),
            max_poll_duration: None,
            max_transient_failures: None,
        }
    }
}

impl ApiSettings {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: base_url.into(),
            ..Self::default()
        }
    }
}

/// Transcription document as served by `/api/transcription/file/{id}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TranscriptionRecord {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub segments: Option<Vec<SegmentRecord>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentRecord {
    pub segment_index: u32,
    pub start_time: f64,
    pub end_time: f64,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub question: String,
    #[serde(default)]
    pub options: Vec<OptionRecord>,
    /// Only present on the per-transcription listing.
    #[serde(default)]
    pub segment_index: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionRecord {
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: UploadedFile,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadedFile {
    id: String,
    #[serde(default)]
    uploaded_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(default)]
    status: String,
}

/// The backend's HTTP surface.
#[async_trait::async_trait]
pub trait VideoApi: Send + Sync {
    /// `POST /api/files/upload`
    async fn upload(&self, upload: &VideoUpload) -> Result<UploadReceipt, ApiError>;

    /// `GET /api/files/{id}`; returns the raw phase tag.
    async fn file_status(&self, job_id: &str) -> Result<String, ApiError>;

    /// `GET /api/transcription/file/{video_id}`
    async fn transcription(&self, video_id: &str) -> Result<TranscriptionRecord, ApiError>;

    /// `GET /api/questions/transcription/{id}/segment/{index}`
    async fn segment_questions(
        &self,
        transcription_id: &str,
        segment_index: u32,
    ) -> Result<Vec<QuestionRecord>, ApiError>;

    /// `GET /api/questions/transcription/{id}`
    async fn transcription_questions(
        &self,
        transcription_id: &str,
    ) -> Result<Vec<QuestionRecord>, ApiError>;

    /// `GET /health`; any failure counts as unhealthy.
    async fn health(&self) -> bool;
}

#[derive(Debug, Clone)]
pub struct ReqwestApi {
    settings: ApiSettings,
    base_url: String,
    client: reqwest::Client,
}

impl ReqwestApi {
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        let parsed = url::Url::parse(&settings.api_base_url)
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if parsed.cannot_be_a_base() {
            return Err(ApiError::new(
                FailureKind::InvalidUrl,
                format!("{} cannot be used as a base url", settings.api_base_url),
            ));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;
        let base_url = settings.api_base_url.trim_end_matches('/').to_string();
        Ok(Self {
            settings,
            base_url,
            client,
        })
    }

    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    fn endpoint(&self, path: &str) -> Result<reqwest::Url, ApiError> {
        let raw = format!("{}{}", self.base_url, path);
        reqwest::Url::parse(&raw)
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        quiz_debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        decode_body(response).await
    }

    /// Question listings that are not JSON arrays count as empty.
    async fn get_question_list(&self, path: &str) -> Result<Vec<QuestionRecord>, ApiError> {
        let value: serde_json::Value = self.get_json(path).await?;
        if !value.is_array() {
            quiz_debug!("question listing at {} is not an array", path);
            return Ok(Vec::new());
        }
        serde_json::from_value(value)
            .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))
    }
}

#[async_trait::async_trait]
impl VideoApi for ReqwestApi {
    async fn upload(&self, upload: &VideoUpload) -> Result<UploadReceipt, ApiError> {
        let url = self.endpoint("/api/files/upload")?;
        // The payload is shared with the multipart body, not copied into it.
        let body = reqwest::Body::from(upload.bytes.clone());
        let part = Part::stream_with_length(body, upload.size())
            .file_name(upload.filename.clone())
            .mime_str(&upload.mime_type)
            .map_err(|err| ApiError::new(FailureKind::InvalidRequest, err.to_string()))?;
        let form = Form::new().part("video", part);

        quiz_debug!("POST {} ({} bytes)", url, upload.size());
        let response = self
            .client
            .post(url)
            .timeout(self.settings.upload_timeout)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let body: UploadResponse = decode_body(response).await?;

        let uploaded_at = body.file.uploaded_at.as_deref().and_then(|raw| {
            match DateTime::parse_from_rfc3339(raw) {
                Ok(ts) => Some(ts.with_timezone(&Utc)),
                Err(err) => {
                    quiz_warn!("Ignoring unparseable uploadedAt {:?}: {}", raw, err);
                    None
                }
            }
        });
        Ok(UploadReceipt {
            job_id: body.file.id,
            uploaded_at,
        })
    }

    async fn file_status(&self, job_id: &str) -> Result<String, ApiError> {
        let body: StatusResponse = self.get_json(&format!("/api/files/{job_id}")).await?;
        Ok(body.status)
    }

    async fn transcription(&self, video_id: &str) -> Result<TranscriptionRecord, ApiError> {
        self.get_json(&format!("/api/transcription/file/{video_id}"))
            .await
    }

    async fn segment_questions(
        &self,
        transcription_id: &str,
        segment_index: u32,
    ) -> Result<Vec<QuestionRecord>, ApiError> {
        self.get_question_list(&format!(
            "/api/questions/transcription/{transcription_id}/segment/{segment_index}"
        ))
        .await
    }

    async fn transcription_questions(
        &self,
        transcription_id: &str,
    ) -> Result<Vec<QuestionRecord>, ApiError> {
        self.get_question_list(&format!("/api/questions/transcription/{transcription_id}"))
            .await
    }

    async fn health(&self) -> bool {
        let url = match self.endpoint("/health") {
            Ok(url) => url,
            Err(err) => {
                quiz_warn!("API health check failed: {}", err);
                return false;
            }
        };
        match self
            .client
            .get(url)
            .timeout(self.settings.health_timeout)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                quiz_warn!("API health check failed: {}", map_reqwest_error(err));
                false
            }
        }
    }
}

async fn decode_body<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::new(
            FailureKind::HttpStatus(status.as_u16()),
            status.to_string(),
        ));
    }
    let bytes = response.bytes().await.map_err(map_reqwest_error)?;
    serde_json::from_slice(&bytes)
        .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ApiError::new(FailureKind::Decode, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}
