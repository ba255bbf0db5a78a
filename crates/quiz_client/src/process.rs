use std::path::Path;

use chrono::Utc;
use quiz_core::{ProcessingProgress, ProcessingStatus, ProgressProjector, ServerPhase};
use quiz_logging::{quiz_debug, quiz_error, quiz_info, quiz_warn};

use crate::{
    ApiSettings, ClientError, PlaybackSource, UploadReceipt, VideoApi, VideoHandle, VideoUpload,
};

/// Receives lifecycle progress for one upload.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, progress: ProcessingProgress);
}

impl<F> ProgressSink for F
where
    F: Fn(ProcessingProgress) + Send + Sync,
{
    fn emit(&self, progress: ProcessingProgress) {
        self(progress)
    }
}

/// Reads a video from disk, guessing its MIME type from the extension.
pub async fn read_video(path: &Path) -> Result<VideoUpload, ClientError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|err| ClientError::ReadFailed {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    Ok(VideoUpload {
        filename,
        mime_type: guess_mime_type(path).to_string(),
        bytes: bytes.into(),
        source: Some(path.to_path_buf()),
    })
}

pub fn guess_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("mp4") | Some("m4v") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mov") => "video/quicktime",
        Some("mkv") => "video/x-matroska",
        Some("avi") => "video/x-msvideo",
        _ => "application/octet-stream",
    }
}

/// Uploads one video and follows the server job until it completes.
///
/// Every failure path emits a final `error` progress before returning, so a
/// sink-only consumer always reaches a terminal state.
pub async fn process_video(
    api: &dyn VideoApi,
    upload: VideoUpload,
    settings: &ApiSettings,
    sink: &dyn ProgressSink,
) -> Result<VideoHandle, ClientError> {
    match run_lifecycle(api, &upload, settings, sink).await {
        Ok(receipt) => {
            let uploaded_at = receipt.uploaded_at.unwrap_or_else(|| {
                quiz_warn!("Upload response for job {} had no uploadedAt", receipt.job_id);
                Utc::now()
            });
            let playback = match upload.source {
                Some(path) => PlaybackSource::File(path),
                None => PlaybackSource::Memory(upload.bytes.clone()),
            };
            Ok(VideoHandle {
                id: receipt.job_id,
                size: upload.bytes.len() as u64,
                name: upload.filename,
                mime_type: upload.mime_type,
                playback,
                uploaded_at,
            })
        }
        Err(err) => {
            quiz_error!("Error processing video {}: {}", upload.filename, err);
            sink.emit(ProcessingProgress::failed());
            Err(err)
        }
    }
}

async fn run_lifecycle(
    api: &dyn VideoApi,
    upload: &VideoUpload,
    settings: &ApiSettings,
    sink: &dyn ProgressSink,
) -> Result<UploadReceipt, ClientError> {
    sink.emit(ProcessingProgress::upload_started());
    let receipt = api.upload(upload).await.map_err(ClientError::UploadFailed)?;
    quiz_info!(
        "Uploaded {} ({} bytes) as job {}",
        upload.filename,
        upload.size(),
        receipt.job_id
    );
    sink.emit(ProcessingProgress::upload_finished());

    poll_until_complete(api, &receipt.job_id, settings, sink).await?;
    Ok(receipt)
}

async fn poll_until_complete(
    api: &dyn VideoApi,
    job_id: &str,
    settings: &ApiSettings,
    sink: &dyn ProgressSink,
) -> Result<(), ClientError> {
    let started = tokio::time::Instant::now();
    let mut projector = ProgressProjector::new();
    let mut consecutive_failures: u32 = 0;

    loop {
        tokio::time::sleep(settings.poll_interval).await;

        match api.file_status(job_id).await {
            Ok(raw) => {
                consecutive_failures = 0;
                let phase = ServerPhase::parse(&raw);
                if let ServerPhase::Unknown(tag) = &phase {
                    quiz_debug!("Job {} reported unknown phase {:?}", job_id, tag);
                }
                let progress = projector.project(&phase).map_err(|_| {
                    ClientError::ProcessingFailed {
                        job_id: job_id.to_string(),
                    }
                })?;
                let complete = progress.status == ProcessingStatus::Complete;
                sink.emit(progress);
                if complete {
                    quiz_info!("Job {} completed", job_id);
                    return Ok(());
                }
            }
            Err(err) => {
                consecutive_failures += 1;
                quiz_warn!(
                    "Error polling status for job {} (failure {}): {}",
                    job_id,
                    consecutive_failures,
                    err
                );
                if settings
                    .max_transient_failures
                    .is_some_and(|limit| consecutive_failures >= limit)
                {
                    return Err(ClientError::TransientPollError {
                        attempts: consecutive_failures,
                        last: err,
                    });
                }
                tokio::time::sleep(settings.retry_backoff).await;
            }
        }

        if let Some(limit) = settings.max_poll_duration {
            let elapsed = started.elapsed();
            if elapsed >= limit {
                return Err(ClientError::PollTimeout { elapsed });
            }
        }
    }
}
