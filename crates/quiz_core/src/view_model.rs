use crate::{ConnectionState, ProcessingProgress, Question, VideoSummary};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub connection: ConnectionState,
    pub progress: ProcessingProgress,
    pub video: Option<VideoSummary>,
    pub segments: Vec<SegmentRowView>,
    pub active_segment: Option<String>,
    pub current_time: f64,
    pub loading_segments: bool,
    pub total_questions: usize,
    pub last_export: Option<String>,
    pub settled: bool,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentRowView {
    pub id: String,
    pub clock_range: String,
    pub minute_range: String,
    pub text: String,
    pub is_active: bool,
    pub loading_questions: bool,
    pub questions: Vec<QuestionView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer_text: Option<String>,
}

impl From<&Question> for QuestionView {
    fn from(question: &Question) -> Self {
        Self {
            id: question.id.clone(),
            question: question.question.clone(),
            options: question.options.clone(),
            correct_answer_text: question.correct_answer_text().map(str::to_string),
        }
    }
}
