use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use quiz_client::{
    read_video, ApiSettings, ClientError, FailureKind, LectureClient, PlaybackSource,
    ProgressSink, VideoUpload,
};
use quiz_core::{ProcessingProgress, ProcessingStatus};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

#[derive(Default)]
struct TestSink {
    events: Arc<Mutex<Vec<ProcessingProgress>>>,
}

impl TestSink {
    fn new() -> Self {
        Self::default()
    }

    fn take(&self) -> Vec<ProcessingProgress> {
        self.events.lock().unwrap().drain(..).collect()
    }

    fn pairs(&self) -> Vec<(ProcessingStatus, u8)> {
        self.take()
            .into_iter()
            .map(|p| (p.status, p.progress))
            .collect()
    }
}

impl ProgressSink for TestSink {
    fn emit(&self, progress: ProcessingProgress) {
        self.events.lock().unwrap().push(progress);
    }
}

/// Replays responses in order, repeating the last one forever.
struct Sequence {
    responses: Vec<ResponseTemplate>,
    next: AtomicUsize,
}

impl Sequence {
    fn new(responses: Vec<ResponseTemplate>) -> Self {
        Self {
            responses,
            next: AtomicUsize::new(0),
        }
    }

    fn statuses(statuses: &[&str]) -> Self {
        Self::new(statuses.iter().map(|s| status(s)).collect())
    }
}

impl Respond for Sequence {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let index = self.next.fetch_add(1, Ordering::SeqCst);
        self.responses[index.min(self.responses.len() - 1)].clone()
    }
}

fn status(phase: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "_id": "job-1", "status": phase }))
}

fn fast_settings(server: &MockServer) -> ApiSettings {
    ApiSettings {
        poll_interval: Duration::from_millis(5),
        retry_backoff: Duration::from_millis(5),
        ..ApiSettings::with_base_url(server.uri())
    }
}

fn upload() -> VideoUpload {
    VideoUpload::from_bytes("lecture.mp4", "video/mp4", b"fake video bytes".to_vec())
}

async fn mount_upload(server: &MockServer, job_id: &str) {
    Mock::given(method("POST"))
        .and(path("/api/files/upload"))
        .and(body_string_contains("name=\"video\""))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "message": "File uploaded successfully",
            "file": {
                "id": job_id,
                "originalName": "lecture.mp4",
                "uploadedAt": "2024-05-01T10:00:00.000Z"
            }
        })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_status(server: &MockServer, job_id: &str, sequence: Sequence) {
    Mock::given(method("GET"))
        .and(path(format!("/api/files/{job_id}")))
        .respond_with(sequence)
        .mount(server)
        .await;
}

#[tokio::test]
async fn full_lifecycle_reports_checkpoints_in_order() {
    quiz_logging::initialize_for_tests();
    let server = MockServer::start().await;
    mount_upload(&server, "job-1").await;
    mount_status(
        &server,
        "job-1",
        Sequence::statuses(&["uploaded", "transcribing", "generating", "completed"]),
    )
    .await;

    let client = LectureClient::new(fast_settings(&server)).unwrap();
    let sink = TestSink::new();
    let handle = client.submit(upload(), &sink).await.expect("processed");

    assert_eq!(
        sink.pairs(),
        vec![
            (ProcessingStatus::Uploading, 0),
            (ProcessingStatus::Uploading, 100),
            (ProcessingStatus::Processing, 10),
            (ProcessingStatus::Transcribing, 40),
            (ProcessingStatus::Generating, 70),
            (ProcessingStatus::Complete, 100),
        ]
    );
    assert_eq!(handle.id, "job-1");
    assert_eq!(handle.name, "lecture.mp4");
    assert_eq!(handle.size, 16);
    assert_eq!(handle.mime_type, "video/mp4");
    assert_eq!(
        handle.uploaded_at,
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
    );
    assert_eq!(
        handle.playback,
        PlaybackSource::Memory(b"fake video bytes".to_vec().into())
    );
}

#[tokio::test]
async fn server_error_phase_fails_with_final_error_tuple() {
    quiz_logging::initialize_for_tests();
    let server = MockServer::start().await;
    mount_upload(&server, "job-2").await;
    mount_status(&server, "job-2", Sequence::statuses(&["uploaded", "error"])).await;

    let client = LectureClient::new(fast_settings(&server)).unwrap();
    let sink = TestSink::new();
    let err = client.submit(upload(), &sink).await.unwrap_err();

    assert_eq!(
        err,
        ClientError::ProcessingFailed {
            job_id: "job-2".to_string()
        }
    );
    let events = sink.take();
    let last = events.last().unwrap();
    assert_eq!((last.status, last.progress), (ProcessingStatus::Error, 0));
    assert!(events.iter().all(|p| p.status != ProcessingStatus::Complete));
}

#[tokio::test]
async fn failed_upload_is_not_retried_and_never_polls() {
    quiz_logging::initialize_for_tests();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/files/upload"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(status("completed"))
        .expect(0)
        .mount(&server)
        .await;

    let client = LectureClient::new(fast_settings(&server)).unwrap();
    let sink = TestSink::new();
    let err = client.submit(upload(), &sink).await.unwrap_err();

    match err {
        ClientError::UploadFailed(api) => assert_eq!(api.kind, FailureKind::HttpStatus(500)),
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(
        sink.pairs(),
        vec![(ProcessingStatus::Uploading, 0), (ProcessingStatus::Error, 0)]
    );
}

#[tokio::test]
async fn transient_status_failures_are_retried() {
    quiz_logging::initialize_for_tests();
    let server = MockServer::start().await;
    mount_upload(&server, "job-3").await;
    mount_status(
        &server,
        "job-3",
        Sequence::new(vec![
            ResponseTemplate::new(503),
            ResponseTemplate::new(200).set_body_string("not json"),
            status("transcribing"),
            ResponseTemplate::new(500),
            status("completed"),
        ]),
    )
    .await;

    let client = LectureClient::new(fast_settings(&server)).unwrap();
    let sink = TestSink::new();
    let handle = client.submit(upload(), &sink).await.expect("processed");

    assert_eq!(handle.id, "job-3");
    assert_eq!(
        sink.pairs(),
        vec![
            (ProcessingStatus::Uploading, 0),
            (ProcessingStatus::Uploading, 100),
            (ProcessingStatus::Transcribing, 40),
            (ProcessingStatus::Complete, 100),
        ]
    );
}

#[tokio::test]
async fn unknown_phases_advance_progress() {
    quiz_logging::initialize_for_tests();
    let server = MockServer::start().await;
    mount_upload(&server, "job-4").await;
    mount_status(
        &server,
        "job-4",
        Sequence::statuses(&["queued", "queued", "completed"]),
    )
    .await;

    let client = LectureClient::new(fast_settings(&server)).unwrap();
    let sink = TestSink::new();
    client.submit(upload(), &sink).await.expect("processed");

    let polled: Vec<_> = sink.pairs().into_iter().skip(2).collect();
    assert_eq!(
        polled,
        vec![
            (ProcessingStatus::Processing, 5),
            (ProcessingStatus::Processing, 10),
            (ProcessingStatus::Complete, 100),
        ]
    );
}

#[tokio::test]
async fn bounded_retries_surface_transient_error() {
    quiz_logging::initialize_for_tests();
    let server = MockServer::start().await;
    mount_upload(&server, "job-5").await;
    mount_status(
        &server,
        "job-5",
        Sequence::new(vec![ResponseTemplate::new(502)]),
    )
    .await;

    let settings = ApiSettings {
        max_transient_failures: Some(3),
        ..fast_settings(&server)
    };
    let client = LectureClient::new(settings).unwrap();
    let sink = TestSink::new();
    let err = client.submit(upload(), &sink).await.unwrap_err();

    match err {
        ClientError::TransientPollError { attempts, last } => {
            assert_eq!(attempts, 3);
            assert_eq!(last.kind, FailureKind::HttpStatus(502));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(sink.take().last().map(|p| p.status), Some(ProcessingStatus::Error));
}

#[tokio::test]
async fn bounded_duration_surfaces_timeout() {
    quiz_logging::initialize_for_tests();
    let server = MockServer::start().await;
    mount_upload(&server, "job-6").await;
    mount_status(&server, "job-6", Sequence::statuses(&["transcribing"])).await;

    let settings = ApiSettings {
        max_poll_duration: Some(Duration::from_millis(40)),
        ..fast_settings(&server)
    };
    let client = LectureClient::new(settings).unwrap();
    let sink = TestSink::new();
    let err = client.submit(upload(), &sink).await.unwrap_err();

    assert!(matches!(err, ClientError::PollTimeout { .. }), "{err:?}");
    assert_eq!(sink.take().last(), Some(&ProcessingProgress::failed()));
}

#[tokio::test]
async fn uploads_from_disk_play_back_from_disk() {
    quiz_logging::initialize_for_tests();
    let server = MockServer::start().await;
    mount_upload(&server, "job-7").await;
    mount_status(&server, "job-7", Sequence::statuses(&["completed"])).await;

    let temp = tempfile::TempDir::new().unwrap();
    let video_path = temp.path().join("week1.mp4");
    std::fs::write(&video_path, b"0123456789").unwrap();

    let upload = read_video(&video_path).await.unwrap();
    assert_eq!(upload.filename, "week1.mp4");
    assert_eq!(upload.mime_type, "video/mp4");

    let client = LectureClient::new(fast_settings(&server)).unwrap();
    let handle = client
        .submit(upload, &|_progress: ProcessingProgress| {})
        .await
        .unwrap();
    assert_eq!(handle.size, 10);
    assert_eq!(handle.playback, PlaybackSource::File(video_path));
}

#[tokio::test]
async fn upload_body_carries_the_whole_payload_with_a_known_length() {
    quiz_logging::initialize_for_tests();
    let server = MockServer::start().await;
    mount_upload(&server, "job-8").await;
    mount_status(&server, "job-8", Sequence::statuses(&["completed"])).await;

    let client = LectureClient::new(fast_settings(&server)).unwrap();
    client
        .submit(upload(), &|_progress: ProcessingProgress| {})
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let sent = requests
        .iter()
        .find(|r| r.url.path() == "/api/files/upload")
        .expect("upload request");
    let body = String::from_utf8_lossy(&sent.body);
    assert!(body.contains("filename=\"lecture.mp4\""), "{body}");
    assert!(body.contains("fake video bytes"), "{body}");
    let length = sent
        .headers
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    assert_eq!(length, Some(sent.body.len()));
}

#[tokio::test]
async fn missing_video_file_is_reported() {
    let temp = tempfile::TempDir::new().unwrap();
    let err = read_video(&temp.path().join("absent.mp4")).await.unwrap_err();
    assert!(matches!(err, ClientError::ReadFailed { .. }));
}

#[tokio::test]
async fn independent_clients_target_their_own_backends() {
    quiz_logging::initialize_for_tests();
    let first = MockServer::start().await;
    let second = MockServer::start().await;
    mount_upload(&first, "job-a").await;
    mount_status(&first, "job-a", Sequence::statuses(&["generating", "completed"])).await;
    mount_upload(&second, "job-b").await;
    mount_status(&second, "job-b", Sequence::statuses(&["uploaded", "completed"])).await;

    let client_a = LectureClient::new(fast_settings(&first)).unwrap();
    let client_b = LectureClient::new(fast_settings(&second)).unwrap();
    let sink_a = TestSink::new();
    let sink_b = TestSink::new();

    let (a, b) = tokio::join!(
        client_a.submit(upload(), &sink_a),
        client_b.submit(upload(), &sink_b)
    );

    assert_eq!(a.unwrap().id, "job-a");
    assert_eq!(b.unwrap().id, "job-b");
    assert!(sink_a
        .pairs()
        .contains(&(ProcessingStatus::Generating, 70)));
    assert!(sink_b
        .pairs()
        .contains(&(ProcessingStatus::Processing, 10)));
}
