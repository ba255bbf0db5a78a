/// Client-visible processing status.
///
/// A superset of the server phases: `Idle` and `Uploading` only exist on the
/// client side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProcessingStatus {
    #[default]
    Idle,
    Uploading,
    Processing,
    Transcribing,
    Generating,
    Complete,
    Error,
}

impl ProcessingStatus {
    /// Indicator text shown next to the progress bar.
    pub fn label(self) -> &'static str {
        match self {
            ProcessingStatus::Idle => "Waiting to start...",
            ProcessingStatus::Uploading => "Uploading video...",
            ProcessingStatus::Processing => "Processing video...",
            ProcessingStatus::Transcribing => "Transcribing audio...",
            ProcessingStatus::Generating => "Generating questions...",
            ProcessingStatus::Complete => "Process completed!",
            ProcessingStatus::Error => "Error occurred",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ProcessingStatus::Complete | ProcessingStatus::Error)
    }

    /// Whether a new upload may be started from this status.
    pub fn accepts_new_upload(self) -> bool {
        matches!(self, ProcessingStatus::Idle | ProcessingStatus::Error)
    }
}

/// One atomic `(status, progress, message)` update.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessingProgress {
    pub status: ProcessingStatus,
    /// Percentage in `0..=100`.
    pub progress: u8,
    pub message: Option<String>,
}

impl ProcessingProgress {
    pub fn new(status: ProcessingStatus, progress: u8, message: impl Into<String>) -> Self {
        Self {
            status,
            progress: progress.min(100),
            message: Some(message.into()),
        }
    }

    pub fn upload_started() -> Self {
        Self::new(ProcessingStatus::Uploading, 0, "Starting upload...")
    }

    pub fn upload_finished() -> Self {
        Self::new(ProcessingStatus::Uploading, 100, "Upload complete")
    }

    pub fn failed() -> Self {
        Self::new(
            ProcessingStatus::Error,
            0,
            "Processing failed. Please try again.",
        )
    }

    /// Message to display: the explicit one, or the status label.
    pub fn display_message(&self) -> &str {
        self.message
            .as_deref()
            .unwrap_or_else(|| self.status.label())
    }
}
