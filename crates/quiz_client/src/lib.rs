//! Lecture quiz client: backend HTTP calls, the upload/poll lifecycle,
//! transcript and question retrieval, and question export.
mod api;
mod client;
mod engine;
mod export;
mod filename;
mod persist;
mod process;
mod retrieval;
mod types;

pub use api::{
    ApiSettings, OptionRecord, QuestionRecord, ReqwestApi, SegmentRecord, TranscriptionRecord,
    VideoApi,
};
pub use client::LectureClient;
pub use engine::{ChannelProgressSink, EngineCommand, EngineConfig, EngineHandle};
pub use export::{
    export_mcqs, format_timestamp, questions_to_csv, questions_to_json, segment_questions_to_json,
    system_clock, write_export, Clock, ExportedQuestion, QuestionsExport, SegmentQuestionsExport,
    CSV_HEADER,
};
pub use filename::{all_questions_filename, segment_export_filename};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use process::{guess_mime_type, process_video, read_video, ProgressSink};
pub use retrieval::{
    all_questions, questions_by_segment, segment_questions, transcript_segments,
    try_segment_questions,
};
pub use types::{
    ApiError, ClientError, EngineEvent, FailureKind, JobId, PlaybackSource, RequestId,
    UploadReceipt, VideoHandle, VideoUpload,
};
