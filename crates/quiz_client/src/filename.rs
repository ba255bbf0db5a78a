use quiz_core::{ExportFormat, Segment};

/// `all_questions.{json|csv}`
pub fn all_questions_filename(format: ExportFormat) -> String {
    format!("all_questions.{}", format.extension())
}

/// `questions_segment_{start}-{end}.json`, bounds in whole minutes.
pub fn segment_export_filename(segment: &Segment) -> String {
    let (start, end) = segment.minute_bounds();
    format!("questions_segment_{start}-{end}.json")
}
