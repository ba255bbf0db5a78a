use std::collections::{BTreeMap, VecDeque};

use crate::view_model::{AppViewModel, QuestionView, SegmentRowView};
use crate::{ProcessingProgress, Question, Segment, SelectedFile, VideoSummary};

/// Only MP4 uploads are accepted.
pub const ACCEPTED_MIME_TYPE: &str = "video/mp4";
/// 500 MiB upload ceiling.
pub const MAX_UPLOAD_BYTES: u64 = 500 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Unknown,
    Connected,
    Disconnected,
}

/// Session state for one viewer: at most one video at a time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    connection: ConnectionState,
    progress: ProcessingProgress,
    video: Option<VideoSummary>,
    segments: Vec<Segment>,
    segments_loading: bool,
    questions: BTreeMap<String, Vec<Question>>,
    pending_question_loads: VecDeque<String>,
    questions_in_flight: Option<String>,
    active_segment: Option<String>,
    current_time: f64,
    last_export: Option<String>,
    notices: Vec<String>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        let segments = self
            .segments
            .iter()
            .map(|segment| {
                let questions = self
                    .questions
                    .get(&segment.id)
                    .map(|list| list.iter().map(QuestionView::from).collect())
                    .unwrap_or_default();
                SegmentRowView {
                    id: segment.id.clone(),
                    clock_range: segment.clock_range(),
                    minute_range: segment.minute_range(),
                    text: segment.text.clone(),
                    is_active: self.active_segment.as_deref() == Some(segment.id.as_str()),
                    loading_questions: self.is_loading_questions(&segment.id),
                    questions,
                }
            })
            .collect();

        AppViewModel {
            connection: self.connection,
            progress: self.progress.clone(),
            video: self.video.clone(),
            segments,
            active_segment: self.active_segment.clone(),
            current_time: self.current_time,
            loading_segments: self.segments_loading,
            total_questions: self.questions.values().map(Vec::len).sum(),
            last_export: self.last_export.clone(),
            settled: self.is_settled(),
            dirty: self.dirty,
        }
    }

    /// Returns whether the state changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Takes user-facing notices queued by `update`.
    pub fn drain_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn progress(&self) -> &ProcessingProgress {
        &self.progress
    }

    pub fn video(&self) -> Option<&VideoSummary> {
        self.video.as_ref()
    }

    pub fn segment(&self, segment_id: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id == segment_id)
    }

    pub fn questions_for(&self, segment_id: &str) -> &[Question] {
        self.questions
            .get(segment_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Nothing is in flight: either the transcript is fully loaded or the
    /// upload failed.
    pub fn is_settled(&self) -> bool {
        if self.progress.status == crate::ProcessingStatus::Error {
            return true;
        }
        self.video.is_some()
            && !self.segments_loading
            && self.questions_in_flight.is_none()
            && self.pending_question_loads.is_empty()
    }

    fn is_loading_questions(&self, segment_id: &str) -> bool {
        self.questions_in_flight.as_deref() == Some(segment_id)
            || self.pending_question_loads.iter().any(|id| id == segment_id)
    }

    pub(crate) fn push_notice(&mut self, notice: impl Into<String>) {
        self.notices.push(notice.into());
        self.dirty = true;
    }

    pub(crate) fn set_connection(&mut self, connection: ConnectionState) {
        self.connection = connection;
        self.dirty = true;
    }

    /// Why a file cannot be uploaded right now, if it cannot.
    pub(crate) fn upload_rejection(&self, file: &SelectedFile) -> Option<&'static str> {
        if self.connection != ConnectionState::Connected {
            return Some("API server is not connected. Please check your backend server.");
        }
        if !self.progress.status.accepts_new_upload() {
            return Some("A video is already being processed.");
        }
        if !file.mime_type.contains(ACCEPTED_MIME_TYPE) {
            return Some("Invalid file type. Please upload an MP4 video file.");
        }
        if file.size > MAX_UPLOAD_BYTES {
            return Some("File is too large. Maximum size is 500MB.");
        }
        None
    }

    pub(crate) fn begin_upload(&mut self) {
        let connection = self.connection;
        *self = Self {
            connection,
            progress: ProcessingProgress::upload_started(),
            ..Self::default()
        };
        self.dirty = true;
    }

    pub(crate) fn set_progress(&mut self, progress: ProcessingProgress) {
        self.progress = progress;
        self.dirty = true;
    }

    pub(crate) fn accept_video(&mut self, video: VideoSummary) -> String {
        let id = video.id.clone();
        self.video = Some(video);
        self.segments_loading = true;
        self.dirty = true;
        id
    }

    /// Stores segments, activates the first one and returns the first
    /// question load to issue.
    pub(crate) fn set_segments(&mut self, segments: Vec<Segment>) -> Option<String> {
        self.active_segment = segments.first().map(|s| s.id.clone());
        self.pending_question_loads = segments.iter().map(|s| s.id.clone()).collect();
        self.segments = segments;
        self.dirty = true;
        self.next_question_load()
    }

    pub(crate) fn fail_segments(&mut self) {
        self.segments_loading = false;
        self.dirty = true;
    }

    /// Records questions for a segment and returns the next load to issue.
    /// Returns `None` without touching state for unknown segments.
    pub(crate) fn store_questions(
        &mut self,
        segment_id: String,
        questions: Vec<Question>,
    ) -> Option<String> {
        if self.segment(&segment_id).is_none() {
            return None;
        }
        if self.questions_in_flight.as_deref() == Some(segment_id.as_str()) {
            self.questions_in_flight = None;
        }
        self.pending_question_loads.retain(|id| *id != segment_id);
        self.questions.insert(segment_id, questions);
        self.dirty = true;
        if self.questions_in_flight.is_some() {
            return None;
        }
        self.next_question_load()
    }

    fn next_question_load(&mut self) -> Option<String> {
        let next = self.pending_question_loads.pop_front();
        self.questions_in_flight = next.clone();
        if next.is_none() {
            self.segments_loading = false;
        }
        next
    }

    pub(crate) fn set_time(&mut self, time: f64) {
        self.current_time = time;
        let containing = self
            .segments
            .iter()
            .find(|s| s.contains(time))
            .map(|s| s.id.clone());
        if let Some(id) = containing {
            if self.active_segment.as_ref() != Some(&id) {
                self.active_segment = Some(id);
            }
        }
        self.dirty = true;
    }

    pub(crate) fn select_segment(&mut self, segment_id: &str) -> bool {
        let Some(start) = self.segment(segment_id).map(|s| s.start_time) else {
            return false;
        };
        self.active_segment = Some(segment_id.to_string());
        self.current_time = start;
        self.dirty = true;
        true
    }

    pub(crate) fn set_last_export(&mut self, location: String) {
        self.last_export = Some(location);
        self.dirty = true;
    }

    pub(crate) fn reset(&mut self) {
        let connection = self.connection;
        *self = Self {
            connection,
            dirty: true,
            ..Self::default()
        };
    }
}
