use std::path::PathBuf;
use std::time::Duration;

use quiz_client::{EngineCommand, EngineEvent, EngineHandle, PlaybackSource, RequestId};
use quiz_core::{Effect, Msg};
use quiz_logging::{quiz_info, quiz_warn};

/// Turns session effects into engine commands and engine events back into
/// session messages.
pub struct EffectRunner {
    engine: EngineHandle,
    next_request: RequestId,
    /// Progress from any other request is stale.
    active_request: Option<RequestId>,
    playback: Option<PlaybackSource>,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self {
            engine,
            next_request: 1,
            active_request: None,
            playback: None,
        }
    }

    pub fn enqueue(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            let command = self.command_for(effect);
            self.engine.send(command);
        }
    }

    /// Sends a command that has no session effect behind it.
    pub fn send_direct(&self, command: EngineCommand) {
        self.engine.send(command);
    }

    /// Waits up to `timeout` for the next engine event, mapped to a message.
    /// `None` means nothing arrived; `Some(Msg::NoOp)` means it was dropped.
    pub fn next_msg(&mut self, timeout: Duration) -> Option<Msg> {
        let event = self.engine.recv_timeout(timeout)?;
        Some(self.msg_for(event))
    }

    pub fn playback(&self) -> Option<&PlaybackSource> {
        self.playback.as_ref()
    }

    fn command_for(&mut self, effect: Effect) -> EngineCommand {
        match effect {
            Effect::CheckHealth => EngineCommand::CheckHealth,
            Effect::ProcessVideo { path } => {
                let request_id = self.next_request;
                self.next_request += 1;
                self.active_request = Some(request_id);
                self.playback = None;
                quiz_info!("ProcessVideo request_id={} path={}", request_id, path);
                EngineCommand::ProcessVideo {
                    request_id,
                    path: PathBuf::from(path),
                }
            }
            Effect::LoadSegments { video_id } => EngineCommand::LoadSegments { video_id },
            Effect::LoadQuestions { segment_id } => EngineCommand::LoadQuestions { segment_id },
            Effect::ExportAll { video_id, format } => EngineCommand::ExportAll { video_id, format },
            Effect::ExportSegment {
                video_id,
                segment,
                questions,
            } => EngineCommand::ExportSegment {
                video_id,
                segment,
                questions,
            },
        }
    }

    fn msg_for(&mut self, event: EngineEvent) -> Msg {
        match event {
            EngineEvent::HealthChecked { healthy } => Msg::HealthChecked(healthy),
            EngineEvent::Progress {
                request_id,
                progress,
            } => {
                if self.active_request != Some(request_id) {
                    return Msg::NoOp;
                }
                Msg::Progress(progress)
            }
            EngineEvent::VideoProcessed { request_id, result } => {
                if self.active_request != Some(request_id) {
                    return Msg::NoOp;
                }
                self.active_request = None;
                match result {
                    Ok(handle) => {
                        let summary = handle.summary();
                        self.playback = Some(handle.playback);
                        Msg::VideoProcessed(Ok(summary))
                    }
                    Err(err) => {
                        quiz_warn!("Video request {} failed: {}", request_id, err);
                        Msg::VideoProcessed(Err(err.to_string()))
                    }
                }
            }
            EngineEvent::SegmentsLoaded { video_id, result } => {
                let result = result.map_err(|err| {
                    quiz_warn!("Transcript for {} failed: {}", video_id, err);
                    err.to_string()
                });
                Msg::SegmentsLoaded { video_id, result }
            }
            EngineEvent::QuestionsLoaded {
                segment_id,
                questions,
            } => Msg::QuestionsLoaded {
                segment_id,
                questions,
            },
            EngineEvent::ExportWritten { result } => Msg::ExportFinished(
                result
                    .map(|path| path.display().to_string())
                    .map_err(|err| err.to_string()),
            ),
        }
    }
}
