use crate::{ProcessingProgress, ProcessingStatus};

/// Increment applied for each poll that reports a phase we do not know.
const UNKNOWN_PHASE_STEP: u8 = 5;
/// Unknown phases never push progress past this value.
const UNKNOWN_PHASE_CAP: u8 = 95;

/// Job phase as reported by the backend status endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerPhase {
    Uploaded,
    Transcribing,
    Generating,
    Completed,
    Error,
    Unknown(String),
}

impl ServerPhase {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "uploaded" => ServerPhase::Uploaded,
            "transcribing" => ServerPhase::Transcribing,
            "generating" => ServerPhase::Generating,
            "completed" => ServerPhase::Completed,
            "error" => ServerPhase::Error,
            other => ServerPhase::Unknown(other.to_string()),
        }
    }

    fn checkpoint(&self) -> Option<(ProcessingStatus, u8, &'static str)> {
        match self {
            ServerPhase::Uploaded => {
                Some((ProcessingStatus::Processing, 10, "Processing video..."))
            }
            ServerPhase::Transcribing => {
                Some((ProcessingStatus::Transcribing, 40, "Transcribing audio..."))
            }
            ServerPhase::Generating => {
                Some((ProcessingStatus::Generating, 70, "Generating questions..."))
            }
            ServerPhase::Completed => {
                Some((ProcessingStatus::Complete, 100, "Processing complete!"))
            }
            ServerPhase::Error | ServerPhase::Unknown(_) => None,
        }
    }
}

/// The backend reported its job-level `error` phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("processing failed on server")]
pub struct ServerReportedError;

/// Maps server phases onto `(status, progress, message)` tuples.
///
/// One projector belongs to one upload attempt. Emitted progress never
/// decreases and the status never moves back to an earlier phase.
#[derive(Debug, Clone)]
pub struct ProgressProjector {
    current: ProcessingProgress,
}

impl Default for ProgressProjector {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressProjector {
    pub fn new() -> Self {
        Self {
            current: ProcessingProgress {
                status: ProcessingStatus::Processing,
                progress: 0,
                message: None,
            },
        }
    }

    /// The last tuple handed out (or the initial processing bucket).
    pub fn current(&self) -> &ProcessingProgress {
        &self.current
    }

    pub fn project(
        &mut self,
        phase: &ServerPhase,
    ) -> Result<ProcessingProgress, ServerReportedError> {
        if *phase == ServerPhase::Error {
            return Err(ServerReportedError);
        }

        let next = match phase.checkpoint() {
            Some((status, _, _)) if rank(status) < rank(self.current.status) => {
                self.current.clone()
            }
            Some((status, checkpoint, message)) => ProcessingProgress::new(
                status,
                checkpoint.max(self.current.progress),
                message,
            ),
            None => {
                let ceiling = unknown_phase_ceiling(self.current.status);
                let advanced = self
                    .current
                    .progress
                    .saturating_add(UNKNOWN_PHASE_STEP)
                    .min(ceiling)
                    .max(self.current.progress);
                ProcessingProgress::new(
                    self.current.status,
                    advanced,
                    "Processing in progress...",
                )
            }
        };

        self.current = next.clone();
        Ok(next)
    }
}

fn rank(status: ProcessingStatus) -> u8 {
    match status {
        ProcessingStatus::Idle => 0,
        ProcessingStatus::Uploading => 0,
        ProcessingStatus::Processing => 1,
        ProcessingStatus::Transcribing => 2,
        ProcessingStatus::Generating => 3,
        ProcessingStatus::Complete => 4,
        ProcessingStatus::Error => 4,
    }
}

// Stay strictly below the checkpoint of the phase that follows.
fn unknown_phase_ceiling(status: ProcessingStatus) -> u8 {
    let next_checkpoint = match status {
        ProcessingStatus::Idle | ProcessingStatus::Uploading | ProcessingStatus::Processing => 40,
        ProcessingStatus::Transcribing => 70,
        _ => 100,
    };
    (next_checkpoint - 1).min(UNKNOWN_PHASE_CAP)
}
