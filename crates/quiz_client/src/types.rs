use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use quiz_core::{ProcessingProgress, Question, Segment, VideoSummary};

/// Server-side job identifier (also the video id once accepted).
pub type JobId = String;

/// Caller-side correlation number for engine commands.
pub type RequestId = u64;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Progress {
        request_id: RequestId,
        progress: ProcessingProgress,
    },
    HealthChecked {
        healthy: bool,
    },
    VideoProcessed {
        request_id: RequestId,
        result: Result<VideoHandle, ClientError>,
    },
    SegmentsLoaded {
        video_id: String,
        result: Result<Vec<Segment>, ClientError>,
    },
    QuestionsLoaded {
        segment_id: String,
        questions: Vec<Question>,
    },
    ExportWritten {
        result: Result<PathBuf, ClientError>,
    },
}

/// The payload of one upload call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoUpload {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Bytes,
    /// Where the bytes were read from, if they came from disk.
    pub source: Option<PathBuf>,
}

impl VideoUpload {
    pub fn from_bytes(
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
            source: None,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Locally resolvable reference for playing back an accepted video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackSource {
    File(PathBuf),
    Memory(Bytes),
}

/// An accepted, fully processed video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoHandle {
    pub id: JobId,
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub playback: PlaybackSource,
    pub uploaded_at: DateTime<Utc>,
}

impl VideoHandle {
    pub fn summary(&self) -> VideoSummary {
        VideoSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            size: self.size,
            mime_type: self.mime_type.clone(),
            uploaded_at: self.uploaded_at.to_rfc3339(),
        }
    }
}

/// What the ingestion endpoint hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub job_id: JobId,
    pub uploaded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ApiError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    InvalidRequest,
    HttpStatus(u16),
    Timeout,
    Network,
    Decode,
    MissingTranscription,
    InvalidSegmentId,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::InvalidRequest => write!(f, "invalid request"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "malformed response body"),
            FailureKind::MissingTranscription => write!(f, "transcription not found"),
            FailureKind::InvalidSegmentId => write!(f, "invalid segment id"),
        }
    }
}

/// Every failure a caller of this crate can observe.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error("failed to read video {path:?}: {message}")]
    ReadFailed { path: PathBuf, message: String },
    #[error("file upload failed: {0}")]
    UploadFailed(ApiError),
    #[error("status polling gave up after {attempts} failed checks: {last}")]
    TransientPollError { attempts: u32, last: ApiError },
    #[error("processing did not finish within {elapsed:?}")]
    PollTimeout { elapsed: Duration },
    #[error("processing failed on server for job {job_id}")]
    ProcessingFailed { job_id: JobId },
    #[error("failed to fetch transcript segments: {0}")]
    SegmentFetchFailed(ApiError),
    #[error("failed to fetch questions: {0}")]
    QuestionFetchFailed(ApiError),
    #[error("failed to export questions: {0}")]
    ExportFailed(String),
}
