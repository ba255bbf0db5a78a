use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use quiz_client::{EngineConfig, EngineHandle, LectureClient};
use quiz_core::ExportFormat;
use quiz_logging::{level_from_verbosity, quiz_info};

use crate::app::{ProcessOptions, Session};
use crate::config::{AppConfig, API_URL_ENV};
use crate::logging::{LogDestination, DEFAULT_LOG_FILE};
use crate::runner::EffectRunner;

mod app;
mod config;
mod logging;
mod render;
mod runner;

/// Export format as spelled on the command line.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliFormat {
    Json,
    Csv,
}

impl From<CliFormat> for ExportFormat {
    fn from(cli: CliFormat) -> Self {
        match cli {
            CliFormat::Json => ExportFormat::Json,
            CliFormat::Csv => ExportFormat::Csv,
        }
    }
}

#[derive(Parser)]
#[command(name = "lecture-quiz", version)]
#[command(about = "Upload lecture videos, follow processing and collect the generated quiz questions")]
struct Cli {
    /// Backend base url. Overrides LECTURE_QUIZ_API_URL and the config file.
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// RON config file (default: ./lecture_quiz.ron when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also write logs to a file
    #[arg(long, global = true, num_args = 0..=1, default_missing_value = DEFAULT_LOG_FILE)]
    log_file: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check that the backend is reachable
    Health,
    /// Upload a video, wait for processing and print its questions
    Process {
        /// MP4 file to upload
        file: PathBuf,

        /// Export all questions when done
        #[arg(long, value_enum)]
        export: Option<CliFormat>,

        /// Write one JSON file per segment that has questions
        #[arg(long)]
        segment_exports: bool,

        /// Mark the segment playing at this many seconds
        #[arg(long)]
        seek: Option<f64>,

        /// Directory for export files
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Export all questions of an already processed video
    Export {
        video_id: String,

        #[arg(short, long, value_enum, default_value = "json")]
        format: CliFormat,

        /// Directory for export files
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::initialize(
        LogDestination::from_log_file(cli.log_file),
        level_from_verbosity(cli.verbose),
    );

    let config = AppConfig::load(cli.config.as_deref())?;
    let settings = config.api_settings(std::env::var(API_URL_ENV).ok(), cli.api_url);
    quiz_info!("Using API at {}", settings.api_base_url);

    let output = match &cli.command {
        Command::Process { output, .. } | Command::Export { output, .. } => output.clone(),
        Command::Health => None,
    };
    let output_dir = config.output_dir(output);

    let base_url = settings.api_base_url.clone();
    let client = LectureClient::new(settings)
        .with_context(|| format!("invalid API url {base_url}"))?;
    let engine = EngineHandle::new(client, EngineConfig::default_with_output(output_dir))
        .context("starting background engine")?;
    let mut session = Session::new(EffectRunner::new(engine), io::stdout());

    match cli.command {
        Command::Health => {
            if !session.check_health()? {
                anyhow::bail!("API server at {base_url} is not reachable");
            }
            println!("API server at {base_url} is up");
        }
        Command::Process {
            file,
            export,
            segment_exports,
            seek,
            ..
        } => {
            let options = ProcessOptions {
                export: export.map(ExportFormat::from),
                segment_exports,
                seek,
            };
            session.process(&file, &options)?;
        }
        Command::Export {
            video_id, format, ..
        } => {
            session.export(&video_id, format.into())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn process_flags_parse() {
        let cli = Cli::parse_from([
            "lecture-quiz",
            "--api-url",
            "http://backend:5000",
            "process",
            "week1.mp4",
            "--export",
            "csv",
            "--segment-exports",
            "-o",
            "exports",
        ]);
        assert_eq!(cli.api_url.as_deref(), Some("http://backend:5000"));
        match cli.command {
            Command::Process {
                file,
                export,
                segment_exports,
                output,
                ..
            } => {
                assert_eq!(file, PathBuf::from("week1.mp4"));
                assert!(matches!(export, Some(CliFormat::Csv)));
                assert!(segment_exports);
                assert_eq!(output, Some(PathBuf::from("exports")));
            }
            _ => panic!("expected process"),
        }
    }

    #[test]
    fn bare_log_file_flag_uses_default_name() {
        let cli = Cli::parse_from(["lecture-quiz", "health", "--log-file"]);
        assert_eq!(cli.log_file, Some(PathBuf::from(DEFAULT_LOG_FILE)));
    }
}
