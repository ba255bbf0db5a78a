use std::collections::BTreeMap;
use std::sync::Arc;

use quiz_core::{ExportFormat, Question, Segment};

use crate::export::{export_mcqs, Clock};
use crate::process::{process_video, ProgressSink};
use crate::retrieval;
use crate::{ApiError, ApiSettings, ClientError, ReqwestApi, VideoApi, VideoHandle, VideoUpload};

/// Caller-facing surface of the backend: lifecycle, retrieval and export.
///
/// Holds no per-upload state; concurrent `submit` calls each run their own
/// polling loop.
#[derive(Clone)]
pub struct LectureClient {
    api: Arc<dyn VideoApi>,
    settings: ApiSettings,
}

impl LectureClient {
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        let api = ReqwestApi::new(settings.clone())?;
        Ok(Self::with_api(Arc::new(api), settings))
    }

    pub fn with_api(api: Arc<dyn VideoApi>, settings: ApiSettings) -> Self {
        Self { api, settings }
    }

    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    pub async fn health(&self) -> bool {
        self.api.health().await
    }

    pub async fn submit(
        &self,
        upload: VideoUpload,
        sink: &dyn ProgressSink,
    ) -> Result<VideoHandle, ClientError> {
        process_video(self.api.as_ref(), upload, &self.settings, sink).await
    }

    pub async fn transcript_segments(&self, video_id: &str) -> Result<Vec<Segment>, ClientError> {
        retrieval::transcript_segments(self.api.as_ref(), video_id).await
    }

    pub async fn segment_questions(&self, segment_id: &str) -> Vec<Question> {
        retrieval::segment_questions(self.api.as_ref(), segment_id).await
    }

    pub async fn questions_by_segment(
        &self,
        segments: &[Segment],
    ) -> BTreeMap<String, Vec<Question>> {
        retrieval::questions_by_segment(self.api.as_ref(), segments).await
    }

    pub async fn all_questions(&self, video_id: &str) -> Vec<Question> {
        retrieval::all_questions(self.api.as_ref(), video_id).await
    }

    pub async fn export(
        &self,
        video_id: &str,
        format: ExportFormat,
        clock: &Clock,
    ) -> Result<String, ClientError> {
        export_mcqs(self.api.as_ref(), video_id, format, clock).await
    }
}
