use pretty_assertions::assert_eq;
use quiz_core::{
    ProcessingProgress, ProcessingStatus, ProgressProjector, ServerPhase, ServerReportedError,
};

fn phases(raw: &[&str]) -> Vec<ServerPhase> {
    raw.iter().map(|p| ServerPhase::parse(p)).collect()
}

fn run(raw: &[&str]) -> (Vec<ProcessingProgress>, Option<ServerReportedError>) {
    let mut projector = ProgressProjector::new();
    let mut emitted = Vec::new();
    for phase in phases(raw) {
        match projector.project(&phase) {
            Ok(progress) => emitted.push(progress),
            Err(err) => return (emitted, Some(err)),
        }
    }
    (emitted, None)
}

fn pairs(emitted: &[ProcessingProgress]) -> Vec<(ProcessingStatus, u8)> {
    emitted.iter().map(|p| (p.status, p.progress)).collect()
}

#[test]
fn known_phases_map_to_fixed_checkpoints() {
    let (emitted, err) = run(&["uploaded", "transcribing", "generating", "completed"]);
    assert!(err.is_none());
    assert_eq!(
        pairs(&emitted),
        vec![
            (ProcessingStatus::Processing, 10),
            (ProcessingStatus::Transcribing, 40),
            (ProcessingStatus::Generating, 70),
            (ProcessingStatus::Complete, 100),
        ]
    );
    assert_eq!(emitted[0].message.as_deref(), Some("Processing video..."));
    assert_eq!(emitted[3].message.as_deref(), Some("Processing complete!"));
}

#[test]
fn error_phase_is_a_failure_not_a_tuple() {
    let (emitted, err) = run(&["uploaded", "error"]);
    assert_eq!(pairs(&emitted), vec![(ProcessingStatus::Processing, 10)]);
    assert_eq!(err, Some(ServerReportedError));
}

#[test]
fn unknown_phase_advances_in_steps_and_keeps_last_status() {
    let (emitted, _) = run(&["transcribing", "diarizing", "diarizing"]);
    assert_eq!(
        pairs(&emitted),
        vec![
            (ProcessingStatus::Transcribing, 40),
            (ProcessingStatus::Transcribing, 45),
            (ProcessingStatus::Transcribing, 50),
        ]
    );
    assert_eq!(
        emitted[1].message.as_deref(),
        Some("Processing in progress...")
    );
}

#[test]
fn unknown_phase_before_any_known_phase_reports_processing() {
    let (emitted, _) = run(&["queued"]);
    assert_eq!(pairs(&emitted), vec![(ProcessingStatus::Processing, 5)]);
}

#[test]
fn unknown_phase_is_capped_at_95() {
    let mut raw = vec!["generating"];
    raw.extend(std::iter::repeat("postprocessing").take(20));
    let (emitted, _) = run(&raw);
    assert_eq!(emitted.last().map(|p| p.progress), Some(95));
    assert!(emitted.iter().all(|p| p.status == ProcessingStatus::Generating));
}

#[test]
fn unknown_phase_stays_below_next_checkpoint() {
    let mut raw = vec!["transcribing"];
    raw.extend(std::iter::repeat("aligning").take(20));
    raw.push("generating");
    let (emitted, _) = run(&raw);
    let before_generating = emitted[emitted.len() - 2].progress;
    assert!(before_generating < 70, "got {before_generating}");
    assert_eq!(emitted.last().map(|p| p.progress), Some(70));
}

#[test]
fn progress_never_decreases_for_any_phase_sequence() {
    let sequences: &[&[&str]] = &[
        &["uploaded", "uploaded", "transcribing", "generating", "completed"],
        &["queued", "queued", "queued", "uploaded", "completed"],
        &["transcribing", "uploaded", "generating", "transcribing", "completed"],
        &["uploaded", "x", "x", "x", "x", "x", "x", "x", "transcribing", "y", "generating"],
        &["generating", "z", "z", "z", "z", "z", "z", "z", "z", "z", "z", "completed", "z"],
        &["completed", "uploaded"],
    ];
    for raw in sequences {
        let (emitted, _) = run(raw);
        for window in emitted.windows(2) {
            assert!(
                window[1].progress >= window[0].progress,
                "progress went backwards in {raw:?}: {:?}",
                pairs(&emitted)
            );
        }
    }
}

#[test]
fn complete_is_emitted_iff_sequence_ends_with_completed() {
    let sequences: &[&[&str]] = &[
        &["uploaded", "transcribing", "completed"],
        &["uploaded", "transcribing", "generating"],
        &["completed"],
        &["queued", "generating"],
    ];
    for raw in sequences {
        let (emitted, _) = run(raw);
        let ends_completed = raw.last() == Some(&"completed");
        let saw_complete = emitted
            .iter()
            .any(|p| p.status == ProcessingStatus::Complete);
        assert_eq!(saw_complete, ends_completed, "sequence {raw:?}");
    }
}

#[test]
fn regressing_phase_repeats_current_tuple() {
    let (emitted, _) = run(&["generating", "uploaded"]);
    assert_eq!(emitted[0], emitted[1]);
}
