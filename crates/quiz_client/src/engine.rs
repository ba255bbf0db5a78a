use std::io;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use quiz_core::{ExportFormat, ProcessingProgress, Question, Segment};
use quiz_logging::{quiz_debug, quiz_warn};

use crate::export::{segment_questions_to_json, system_clock, write_export, Clock};
use crate::filename::{all_questions_filename, segment_export_filename};
use crate::process::{read_video, ProgressSink};
use crate::{ClientError, EngineEvent, LectureClient, RequestId};

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    CheckHealth,
    ProcessVideo {
        request_id: RequestId,
        path: PathBuf,
    },
    LoadSegments {
        video_id: String,
    },
    LoadQuestions {
        segment_id: String,
    },
    ExportAll {
        video_id: String,
        format: ExportFormat,
    },
    ExportSegment {
        video_id: String,
        segment: Segment,
        questions: Vec<Question>,
    },
}

#[derive(Clone)]
pub struct EngineConfig {
    /// Where export files are written.
    pub output_dir: PathBuf,
    pub clock: Clock,
}

impl EngineConfig {
    pub fn default_with_output(output_dir: PathBuf) -> Self {
        Self {
            output_dir,
            clock: system_clock(),
        }
    }
}

/// Runs client calls on a background runtime and reports back over a
/// channel, so synchronous callers never block on I/O.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(client: LectureClient, config: EngineConfig) -> io::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Runtime::new()?;
        let client = Arc::new(client);
        let config = Arc::new(config);

        thread::spawn(move || {
            while let Ok(command) = cmd_rx.recv() {
                let client = client.clone();
                let config = config.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    handle_command(&client, &config, command, event_tx).await;
                });
            }
            quiz_debug!("Engine command channel closed");
        });

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            quiz_warn!("Engine worker is gone; command dropped");
        }
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

/// Forwards lifecycle progress of one request into the event channel.
pub struct ChannelProgressSink {
    request_id: RequestId,
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(request_id: RequestId, tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { request_id, tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, progress: ProcessingProgress) {
        let _ = self.tx.send(EngineEvent::Progress {
            request_id: self.request_id,
            progress,
        });
    }
}

async fn handle_command(
    client: &LectureClient,
    config: &EngineConfig,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let event = match command {
        EngineCommand::CheckHealth => EngineEvent::HealthChecked {
            healthy: client.health().await,
        },
        EngineCommand::ProcessVideo { request_id, path } => {
            let sink = ChannelProgressSink::new(request_id, event_tx.clone());
            let result = match read_video(&path).await {
                Ok(upload) => client.submit(upload, &sink).await,
                Err(err) => {
                    sink.emit(ProcessingProgress::failed());
                    Err(err)
                }
            };
            EngineEvent::VideoProcessed { request_id, result }
        }
        EngineCommand::LoadSegments { video_id } => {
            let result = client.transcript_segments(&video_id).await;
            EngineEvent::SegmentsLoaded { video_id, result }
        }
        EngineCommand::LoadQuestions { segment_id } => {
            let questions = client.segment_questions(&segment_id).await;
            EngineEvent::QuestionsLoaded {
                segment_id,
                questions,
            }
        }
        EngineCommand::ExportAll { video_id, format } => {
            let result = match client.export(&video_id, format, &config.clock).await {
                Ok(content) => write_export(
                    &config.output_dir,
                    &all_questions_filename(format),
                    &content,
                ),
                Err(err) => Err(err),
            };
            EngineEvent::ExportWritten { result }
        }
        EngineCommand::ExportSegment {
            video_id,
            segment,
            questions,
        } => {
            let result = export_segment(config, &video_id, &segment, &questions);
            EngineEvent::ExportWritten { result }
        }
    };
    let _ = event_tx.send(event);
}

fn export_segment(
    config: &EngineConfig,
    video_id: &str,
    segment: &Segment,
    questions: &[Question],
) -> Result<PathBuf, ClientError> {
    let content = segment_questions_to_json(video_id, segment, questions, (config.clock)())?;
    write_export(
        &config.output_dir,
        &segment_export_filename(segment),
        &content,
    )
}
