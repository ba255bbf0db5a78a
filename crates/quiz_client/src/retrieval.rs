use std::collections::BTreeMap;

use quiz_core::{parse_segment_id, segment_id, Question, Segment};
use quiz_logging::{quiz_debug, quiz_error, quiz_warn};

use crate::api::QuestionRecord;
use crate::{ApiError, ClientError, FailureKind, VideoApi};

/// Fetches the transcript of a video as segments.
///
/// Failures propagate as `SegmentFetchFailed`; a transcript without segments
/// yields an empty list.
pub async fn transcript_segments(
    api: &dyn VideoApi,
    video_id: &str,
) -> Result<Vec<Segment>, ClientError> {
    let record = api.transcription(video_id).await.map_err(|err| {
        quiz_error!("Error fetching transcript segments for {}: {}", video_id, err);
        ClientError::SegmentFetchFailed(err)
    })?;

    let segments = record
        .segments
        .unwrap_or_default()
        .into_iter()
        .map(|s| Segment::new(video_id, s.segment_index, s.start_time, s.end_time, s.text))
        .collect::<Vec<_>>();
    quiz_debug!("Video {} has {} transcript segments", video_id, segments.len());
    Ok(segments)
}

/// Questions for one segment, or the typed failure.
pub async fn try_segment_questions(
    api: &dyn VideoApi,
    segment_id: &str,
) -> Result<Vec<Question>, ClientError> {
    let (video_id, segment_index) = parse_segment_id(segment_id).map_err(|err| {
        ClientError::QuestionFetchFailed(ApiError::new(
            FailureKind::InvalidSegmentId,
            err.to_string(),
        ))
    })?;
    let transcription_id = transcription_id(api, &video_id)
        .await
        .map_err(ClientError::QuestionFetchFailed)?;
    let records = api
        .segment_questions(&transcription_id, segment_index)
        .await
        .map_err(ClientError::QuestionFetchFailed)?;
    Ok(records
        .into_iter()
        .map(|record| to_question(record, segment_id.to_string()))
        .collect())
}

/// Questions for one segment. Failures are logged and come back as an empty
/// list so that one bad segment does not block the others.
pub async fn segment_questions(api: &dyn VideoApi, segment_id: &str) -> Vec<Question> {
    match try_segment_questions(api, segment_id).await {
        Ok(questions) => questions,
        Err(err) => {
            quiz_warn!("Error fetching questions for {}: {}", segment_id, err);
            Vec::new()
        }
    }
}

/// Questions for every segment, fetched one after another.
pub async fn questions_by_segment(
    api: &dyn VideoApi,
    segments: &[Segment],
) -> BTreeMap<String, Vec<Question>> {
    let mut by_segment = BTreeMap::new();
    for segment in segments {
        let questions = segment_questions(api, &segment.id).await;
        by_segment.insert(segment.id.clone(), questions);
    }
    by_segment
}

/// Every question of a video, each tagged with its segment id.
/// Failures are logged and come back as an empty list.
pub async fn all_questions(api: &dyn VideoApi, video_id: &str) -> Vec<Question> {
    let result = async {
        let transcription_id = transcription_id(api, video_id).await?;
        api.transcription_questions(&transcription_id).await
    }
    .await;

    match result {
        Ok(records) => records
            .into_iter()
            .map(|record| {
                let id = segment_id(video_id, record.segment_index.unwrap_or_default());
                to_question(record, id)
            })
            .collect(),
        Err(err) => {
            quiz_warn!("Error fetching all questions for {}: {}", video_id, err);
            Vec::new()
        }
    }
}

async fn transcription_id(api: &dyn VideoApi, video_id: &str) -> Result<String, ApiError> {
    api.transcription(video_id)
        .await?
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::new(FailureKind::MissingTranscription, video_id.to_string()))
}

fn to_question(record: QuestionRecord, segment_id: String) -> Question {
    let correct_answer = record.options.iter().position(|opt| opt.is_correct);
    Question {
        id: record.id,
        segment_id,
        question: record.question,
        options: record.options.into_iter().map(|opt| opt.text).collect(),
        correct_answer,
    }
}
