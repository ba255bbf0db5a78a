use crate::{Question, Segment};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    CheckHealth,
    ProcessVideo { path: String },
    LoadSegments { video_id: String },
    LoadQuestions { segment_id: String },
    ExportAll { video_id: String, format: ExportFormat },
    ExportSegment {
        video_id: String,
        segment: Segment,
        questions: Vec<Question>,
    },
}
