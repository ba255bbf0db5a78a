use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use quiz_core::{ExportFormat, Question, Segment};
use quiz_logging::quiz_info;
use serde::{Deserialize, Serialize};

use crate::persist::AtomicFileWriter;
use crate::retrieval::all_questions;
use crate::{ClientError, VideoApi};

pub const CSV_HEADER: &str =
    "Question ID,Question,Option A,Option B,Option C,Option D,Correct Answer";

/// CSV rows always carry exactly this many option columns.
const CSV_OPTION_COLUMNS: usize = 4;

/// Source of the `exportedAt` timestamp.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedQuestion {
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: Option<usize>,
    pub correct_answer_text: Option<String>,
}

impl From<&Question> for ExportedQuestion {
    fn from(question: &Question) -> Self {
        Self {
            id: question.id.clone(),
            question: question.question.clone(),
            options: question.options.clone(),
            correct_answer: question.correct_answer,
            correct_answer_text: question.correct_answer_text().map(str::to_string),
        }
    }
}

/// JSON document for all questions of a video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionsExport {
    pub video_id: String,
    pub exported_at: String,
    pub total_questions: usize,
    pub questions: Vec<ExportedQuestion>,
}

/// JSON document for the questions of one segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentQuestionsExport {
    pub video_id: String,
    pub segment_id: String,
    pub time_range: String,
    pub exported_at: String,
    pub questions: Vec<ExportedQuestion>,
}

/// ISO-8601 UTC with millisecond precision, e.g. `2024-01-01T00:00:00.000Z`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn questions_to_json(
    video_id: &str,
    questions: &[Question],
    exported_at: DateTime<Utc>,
) -> Result<String, ClientError> {
    let document = QuestionsExport {
        video_id: video_id.to_string(),
        exported_at: format_timestamp(exported_at),
        total_questions: questions.len(),
        questions: questions.iter().map(ExportedQuestion::from).collect(),
    };
    serde_json::to_string_pretty(&document)
        .map_err(|err| ClientError::ExportFailed(err.to_string()))
}

pub fn segment_questions_to_json(
    video_id: &str,
    segment: &Segment,
    questions: &[Question],
    exported_at: DateTime<Utc>,
) -> Result<String, ClientError> {
    let document = SegmentQuestionsExport {
        video_id: video_id.to_string(),
        segment_id: segment.id.clone(),
        time_range: segment.minute_range(),
        exported_at: format_timestamp(exported_at),
        questions: questions.iter().map(ExportedQuestion::from).collect(),
    };
    serde_json::to_string_pretty(&document)
        .map_err(|err| ClientError::ExportFailed(err.to_string()))
}

pub fn questions_to_csv(questions: &[Question]) -> String {
    let mut csv = String::with_capacity(CSV_HEADER.len() + 1 + questions.len() * 128);
    csv.push_str(CSV_HEADER);
    csv.push('\n');

    for question in questions {
        let mut fields = Vec::with_capacity(2 + CSV_OPTION_COLUMNS + 1);
        fields.push(bare_or_quoted(&question.id));
        fields.push(quoted(&question.question));
        for column in 0..CSV_OPTION_COLUMNS {
            let option = question.options.get(column).map(String::as_str).unwrap_or("");
            fields.push(quoted(option));
        }
        fields.push(answer_letter(question.correct_answer));

        csv.push_str(&fields.join(","));
        csv.push('\n');
    }
    csv
}

/// Fetches every question of a video and renders it in `format`.
pub async fn export_mcqs(
    api: &dyn VideoApi,
    video_id: &str,
    format: ExportFormat,
    clock: &Clock,
) -> Result<String, ClientError> {
    let questions = all_questions(api, video_id).await;
    quiz_info!(
        "Exporting {} questions for {} as {:?}",
        questions.len(),
        video_id,
        format
    );
    match format {
        ExportFormat::Json => questions_to_json(video_id, &questions, clock()),
        ExportFormat::Csv => Ok(questions_to_csv(&questions)),
    }
}

/// Writes a rendered export into `dir`.
pub fn write_export(dir: &Path, filename: &str, content: &str) -> Result<PathBuf, ClientError> {
    AtomicFileWriter::new(dir)
        .write(filename, content)
        .map_err(|err| ClientError::ExportFailed(err.to_string()))
}

fn quoted(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn bare_or_quoted(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        quoted(field)
    } else {
        field.to_string()
    }
}

fn answer_letter(correct_answer: Option<usize>) -> String {
    match correct_answer {
        Some(index) if index < 26 => char::from(b'A' + index as u8).to_string(),
        _ => String::new(),
    }
}
