//! Lecture quiz core: processing-status model, progress projection and the
//! pure viewer state machine.
mod effect;
mod msg;
mod projector;
mod segment;
mod state;
mod status;
mod update;
mod view_model;

pub use effect::{Effect, ExportFormat};
pub use msg::{Msg, SelectedFile, VideoSummary};
pub use projector::{ProgressProjector, ServerPhase, ServerReportedError};
pub use segment::{
    parse_segment_id, segment_id, Question, Segment, SegmentIdError, SEGMENT_ID_SEPARATOR,
};
pub use state::{AppState, ConnectionState, ACCEPTED_MIME_TYPE, MAX_UPLOAD_BYTES};
pub use status::{ProcessingProgress, ProcessingStatus};
pub use update::update;
pub use view_model::{AppViewModel, QuestionView, SegmentRowView};
