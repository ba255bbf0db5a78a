use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use quiz_client::{guess_mime_type, EngineCommand, PlaybackSource};
use quiz_core::{
    update, AppState, AppViewModel, ConnectionState, Effect, ExportFormat, Msg, ProcessingStatus,
    SelectedFile,
};
use quiz_logging::{quiz_debug, quiz_info};

use crate::render;
use crate::runner::EffectRunner;

const EVENT_WAIT: Duration = Duration::from_millis(100);

/// Options of the `process` command once the video has been picked.
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    pub export: Option<ExportFormat>,
    pub segment_exports: bool,
    pub seek: Option<f64>,
}

/// Drives the session state machine from engine events and prints what
/// changed.
pub struct Session<W: Write> {
    state: AppState,
    runner: EffectRunner,
    out: W,
    last_status: Option<String>,
    pending_exports: usize,
    failed_exports: usize,
}

impl<W: Write> Session<W> {
    pub fn new(runner: EffectRunner, out: W) -> Self {
        Self {
            state: AppState::new(),
            runner,
            out,
            last_status: None,
            pending_exports: 0,
            failed_exports: 0,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Checks the backend and records the result in the session.
    pub fn check_health(&mut self) -> Result<bool> {
        self.run_effects(vec![Effect::CheckHealth]);
        self.pump_until(|s| s.state.connection() != ConnectionState::Unknown)?;
        Ok(self.state.connection() == ConnectionState::Connected)
    }

    /// Uploads `path`, follows processing and loads every segment's questions.
    pub fn process(&mut self, path: &Path, options: &ProcessOptions) -> Result<()> {
        if !self.check_health()? {
            bail!("API server is not reachable");
        }

        let file = selected_file(path)?;
        self.dispatch(Msg::FileSelected(file))?;
        if self.state.progress().status == ProcessingStatus::Idle {
            bail!("{} was not accepted for upload", path.display());
        }

        self.pump_until(|s| s.state.is_settled())?;
        if self.state.progress().status == ProcessingStatus::Error {
            bail!("processing of {} failed", path.display());
        }

        if let Some(time) = options.seek {
            self.dispatch(Msg::VideoTimeUpdated(time))?;
        }
        let view = self.state.view();
        for line in render::transcript(&view) {
            writeln!(self.out, "{line}")?;
        }
        if let Some(playback) = self.runner.playback() {
            writeln!(self.out, "Playback: {}", describe_playback(playback))?;
        }

        if let Some(format) = options.export {
            self.dispatch(Msg::ExportAllRequested(format))?;
        }
        if options.segment_exports {
            for segment in view.segments.iter().filter(|s| !s.questions.is_empty()) {
                self.dispatch(Msg::ExportSegmentRequested(segment.id.clone()))?;
            }
        }
        self.finish_exports()
    }

    /// Exports every question of an already processed video.
    pub fn export(&mut self, video_id: &str, format: ExportFormat) -> Result<()> {
        self.pending_exports += 1;
        self.runner.send_direct(EngineCommand::ExportAll {
            video_id: video_id.to_string(),
            format,
        });
        self.finish_exports()
    }

    fn finish_exports(&mut self) -> Result<()> {
        self.pump_until(|s| s.pending_exports == 0)?;
        if self.failed_exports > 0 {
            bail!("{} export(s) failed", self.failed_exports);
        }
        Ok(())
    }

    pub fn dispatch(&mut self, msg: Msg) -> Result<()> {
        match &msg {
            Msg::ExportFinished(result) => {
                self.pending_exports = self.pending_exports.saturating_sub(1);
                if result.is_err() {
                    self.failed_exports += 1;
                }
            }
            Msg::NoOp => return Ok(()),
            _ => {}
        }

        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let notices = state.drain_notices();
        let view = state.view();
        let was_dirty = state.consume_dirty();
        self.state = state;

        for notice in notices {
            quiz_info!("{}", notice);
            writeln!(self.out, "{notice}")?;
        }
        if was_dirty {
            self.render_status(&view)?;
        }
        self.run_effects(effects);
        Ok(())
    }

    fn run_effects(&mut self, effects: Vec<Effect>) {
        self.pending_exports += effects
            .iter()
            .filter(|e| matches!(e, Effect::ExportAll { .. } | Effect::ExportSegment { .. }))
            .count();
        self.runner.enqueue(effects);
    }

    fn pump_until(&mut self, done: impl Fn(&Self) -> bool) -> Result<()> {
        while !done(self) {
            if let Some(msg) = self.runner.next_msg(EVENT_WAIT) {
                quiz_debug!("msg {:?}", msg);
                self.dispatch(msg)?;
            }
        }
        Ok(())
    }

    /// Prints the status line when it differs from the last one printed.
    fn render_status(&mut self, view: &AppViewModel) -> Result<()> {
        let line = render::status_line(view);
        if self.last_status.as_deref() != Some(line.as_str()) {
            writeln!(self.out, "{line}")?;
            self.last_status = Some(line);
        }
        Ok(())
    }
}

/// Describes a local video the way the session expects it.
pub fn selected_file(path: &Path) -> Result<SelectedFile> {
    let metadata =
        fs::metadata(path).with_context(|| format!("reading {}", path.display()))?;
    if !metadata.is_file() {
        bail!("{} is not a file", path.display());
    }
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(SelectedFile {
        path: path.display().to_string(),
        name,
        size: metadata.len(),
        mime_type: guess_mime_type(path).to_string(),
    })
}

fn describe_playback(playback: &PlaybackSource) -> String {
    match playback {
        PlaybackSource::File(path) => path.display().to_string(),
        PlaybackSource::Memory(bytes) => format!("in memory ({} bytes)", bytes.len()),
    }
}
