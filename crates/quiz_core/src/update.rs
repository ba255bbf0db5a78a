use crate::state::ConnectionState;
use crate::{AppState, Effect, Msg, ProcessingProgress, ProcessingStatus};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::HealthChecked(healthy) => {
            if healthy {
                state.set_connection(ConnectionState::Connected);
            } else {
                state.set_connection(ConnectionState::Disconnected);
                state.push_notice(
                    "Unable to connect to API server. Please ensure the backend is running.",
                );
            }
            Vec::new()
        }
        Msg::FileSelected(file) => {
            if let Some(reason) = state.upload_rejection(&file) {
                state.push_notice(reason);
                return (state, Vec::new());
            }
            state.begin_upload();
            vec![Effect::ProcessVideo { path: file.path }]
        }
        Msg::Progress(progress) => {
            // Late ticks from an abandoned upload must not resurrect it.
            if state.progress().status != ProcessingStatus::Idle {
                state.set_progress(progress);
            }
            Vec::new()
        }
        Msg::VideoProcessed(Ok(video)) => {
            if state.progress().status == ProcessingStatus::Idle {
                return (state, Vec::new());
            }
            let video_id = state.accept_video(video);
            vec![Effect::LoadSegments { video_id }]
        }
        Msg::VideoProcessed(Err(_)) => {
            if state.progress().status == ProcessingStatus::Idle {
                return (state, Vec::new());
            }
            state.set_progress(ProcessingProgress::new(
                ProcessingStatus::Error,
                0,
                "An error occurred while processing the video.",
            ));
            state.push_notice("Failed to process the video. Please try again.");
            Vec::new()
        }
        Msg::SegmentsLoaded { video_id, result } => {
            // Transcripts of a video that was reset or replaced are dropped.
            if state.video().map(|v| v.id.as_str()) != Some(video_id.as_str()) {
                return (state, Vec::new());
            }
            match result {
                Ok(segments) => match state.set_segments(segments) {
                    Some(segment_id) => vec![Effect::LoadQuestions { segment_id }],
                    None => Vec::new(),
                },
                Err(_) => {
                    state.fail_segments();
                    state.push_notice("Failed to load transcript. Please try again.");
                    Vec::new()
                }
            }
        }
        Msg::QuestionsLoaded {
            segment_id,
            questions,
        } => match state.store_questions(segment_id, questions) {
            Some(segment_id) => vec![Effect::LoadQuestions { segment_id }],
            None => Vec::new(),
        },
        Msg::VideoTimeUpdated(time) => {
            state.set_time(time);
            Vec::new()
        }
        Msg::SegmentSelected(segment_id) => {
            state.select_segment(&segment_id);
            Vec::new()
        }
        Msg::ExportAllRequested(format) => match state.video() {
            Some(video) => vec![Effect::ExportAll {
                video_id: video.id.clone(),
                format,
            }],
            None => Vec::new(),
        },
        Msg::ExportSegmentRequested(segment_id) => export_segment(&mut state, &segment_id),
        Msg::ExportFinished(Ok(location)) => {
            state.push_notice(format!("Questions exported to {location}"));
            state.set_last_export(location);
            Vec::new()
        }
        Msg::ExportFinished(Err(reason)) => {
            state.push_notice(format!("Failed to export questions: {reason}"));
            Vec::new()
        }
        Msg::ResetRequested => {
            state.reset();
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn export_segment(state: &mut AppState, segment_id: &str) -> Vec<Effect> {
    let Some(video_id) = state.video().map(|v| v.id.clone()) else {
        return Vec::new();
    };
    let Some(segment) = state.segment(segment_id).cloned() else {
        state.push_notice(format!("Unknown segment {segment_id}"));
        return Vec::new();
    };
    let questions = state.questions_for(segment_id).to_vec();
    if questions.is_empty() {
        state.push_notice("No questions available for this segment");
        return Vec::new();
    }
    vec![Effect::ExportSegment {
        video_id,
        segment,
        questions,
    }]
}
