use chrono::{DateTime, Utc};
use quiz_core::{AppViewModel, ConnectionState, ProcessingProgress, QuestionView, SegmentRowView};

const BAR_WIDTH: usize = 20;

/// One status line: connection, progress bar and message.
pub fn status_line(view: &AppViewModel) -> String {
    let connection = match view.connection {
        ConnectionState::Unknown => "API ?",
        ConnectionState::Connected => "API up",
        ConnectionState::Disconnected => "API down",
    };
    format!("{connection} | {}", progress_line(&view.progress))
}

pub fn progress_line(progress: &ProcessingProgress) -> String {
    let filled = usize::from(progress.progress) * BAR_WIDTH / 100;
    format!(
        "[{}{}] {:>3}% {}",
        "#".repeat(filled),
        ".".repeat(BAR_WIDTH - filled),
        progress.progress,
        progress.display_message()
    )
}

/// Full transcript listing with the questions of every segment.
pub fn transcript(view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(video) = &view.video {
        lines.push(format!(
            "Video {} ({}, {}) uploaded {}",
            video.id,
            video.name,
            format_size(video.size),
            format_uploaded_at(&video.uploaded_at)
        ));
    }
    lines.push(format!(
        "{} segments, {} questions",
        view.segments.len(),
        view.total_questions
    ));
    for segment in &view.segments {
        lines.push(String::new());
        lines.extend(segment_lines(segment));
    }
    lines
}

fn segment_lines(segment: &SegmentRowView) -> Vec<String> {
    let marker = if segment.is_active { '>' } else { ' ' };
    let mut lines = vec![format!(
        "{marker} [{}] {} ({})",
        segment.clock_range, segment.text, segment.id
    )];
    if segment.loading_questions {
        lines.push("    loading questions...".to_string());
    } else if segment.questions.is_empty() {
        lines.push("    No questions available for this segment".to_string());
    }
    for (number, question) in segment.questions.iter().enumerate() {
        lines.extend(question_lines(number + 1, question));
    }
    lines
}

fn question_lines(number: usize, question: &QuestionView) -> Vec<String> {
    let mut lines = vec![format!("    {number}. {}", question.question)];
    for (index, option) in question.options.iter().enumerate() {
        lines.push(format!("       {}) {option}", option_letter(index)));
    }
    if let Some(answer) = &question.correct_answer_text {
        lines.push(format!("       Answer: {answer}"));
    }
    lines
}

fn option_letter(index: usize) -> char {
    u8::try_from(index)
        .ok()
        .filter(|i| *i < 26)
        .map(|i| char::from(b'A' + i))
        .unwrap_or('?')
}

fn format_size(bytes: u64) -> String {
    format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
}

fn format_uploaded_at(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(at) => at.with_timezone(&Utc).format("%Y-%m-%d %H:%M UTC").to_string(),
        Err(_) => raw.to_string(),
    }
}
