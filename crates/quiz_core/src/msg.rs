use crate::{ExportFormat, ProcessingProgress, Question, Segment};

/// A file the user picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: String,
    pub name: String,
    pub size: u64,
    pub mime_type: String,
}

/// The parts of an accepted video the session needs to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoSummary {
    pub id: String,
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    /// RFC 3339 upload timestamp.
    pub uploaded_at: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Result of a backend liveness check.
    HealthChecked(bool),
    /// User picked a video file.
    FileSelected(SelectedFile),
    /// Lifecycle progress for the in-flight upload.
    Progress(ProcessingProgress),
    /// Upload/poll finished.
    VideoProcessed(Result<VideoSummary, String>),
    /// Transcript segments of `video_id` arrived.
    SegmentsLoaded {
        video_id: String,
        result: Result<Vec<Segment>, String>,
    },
    /// Questions for one segment arrived (empty on failure).
    QuestionsLoaded {
        segment_id: String,
        questions: Vec<Question>,
    },
    /// Playback position moved.
    VideoTimeUpdated(f64),
    /// User clicked a segment.
    SegmentSelected(String),
    /// User asked for all questions of the video.
    ExportAllRequested(ExportFormat),
    /// User asked for the questions of one segment.
    ExportSegmentRequested(String),
    /// Export finished with the written location or an error text.
    ExportFinished(Result<String, String>),
    /// Start over with a new video.
    ResetRequested,
    /// Fallback for placeholder wiring.
    NoOp,
}
