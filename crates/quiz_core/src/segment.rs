/// Joins a video id and a segment index into a segment id.
pub const SEGMENT_ID_SEPARATOR: &str = "_segment_";

/// Builds the `{video_id}_segment_{index}` correlation key.
///
/// The backend has no join key between transcript segments and questions;
/// every consumer must build ids through this function.
pub fn segment_id(video_id: &str, segment_index: u32) -> String {
    format!("{video_id}{SEGMENT_ID_SEPARATOR}{segment_index}")
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SegmentIdError {
    #[error("invalid segment id format: {0}")]
    InvalidFormat(String),
}

/// Splits a segment id back into `(video_id, segment_index)`.
pub fn parse_segment_id(id: &str) -> Result<(String, u32), SegmentIdError> {
    let parts: Vec<&str> = id.split(SEGMENT_ID_SEPARATOR).collect();
    let [video_id, index] = parts.as_slice() else {
        return Err(SegmentIdError::InvalidFormat(id.to_string()));
    };
    let index = index
        .parse::<u32>()
        .map_err(|_| SegmentIdError::InvalidFormat(id.to_string()))?;
    Ok(((*video_id).to_string(), index))
}

/// A timed slice of the transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub id: String,
    pub video_id: String,
    pub start_time: f64,
    pub end_time: f64,
    pub text: String,
}

impl Segment {
    pub fn new(
        video_id: &str,
        segment_index: u32,
        start_time: f64,
        end_time: f64,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: segment_id(video_id, segment_index),
            video_id: video_id.to_string(),
            start_time,
            end_time,
            text: text.into(),
        }
    }

    /// Half-open containment: `start <= time < end`.
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start_time && time < self.end_time
    }

    /// `m:ss - m:ss`
    pub fn clock_range(&self) -> String {
        format!("{} - {}", format_clock(self.start_time), format_clock(self.end_time))
    }

    /// `{start}-{end} minutes`, both floored to whole minutes.
    pub fn minute_range(&self) -> String {
        format!(
            "{}-{} minutes",
            whole_minutes(self.start_time),
            whole_minutes(self.end_time)
        )
    }

    pub fn minute_bounds(&self) -> (u64, u64) {
        (whole_minutes(self.start_time), whole_minutes(self.end_time))
    }
}

fn whole_minutes(seconds: f64) -> u64 {
    (seconds.max(0.0) / 60.0).floor() as u64
}

fn format_clock(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let minutes = (seconds / 60.0).floor() as u64;
    let remaining = (seconds % 60.0).floor() as u64;
    format!("{minutes}:{remaining:02}")
}

/// A multiple-choice question attached to one segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: String,
    pub segment_id: String,
    pub question: String,
    pub options: Vec<String>,
    /// Index of the correct option; `None` when no option is flagged.
    pub correct_answer: Option<usize>,
}

impl Question {
    pub fn correct_answer_text(&self) -> Option<&str> {
        self.correct_answer
            .and_then(|index| self.options.get(index))
            .map(String::as_str)
    }
}
