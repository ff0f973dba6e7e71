use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use vidchat_gateway::{
    BackendGateway, ChatRequest, FailureKind, GatewayConfig, GatewayError, HttpGateway,
    Operation, ProgressCallback, TransferProgress, UploadPayload,
};

#[derive(Debug, Clone, PartialEq)]
struct ReceivedPart {
    field: String,
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

#[derive(Clone, Default)]
struct Recorded {
    bodies: Arc<Mutex<Vec<Value>>>,
    uploads: Arc<Mutex<Vec<ReceivedPart>>>,
}

async fn spawn_backend(router: Router) -> GatewayConfig {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve test backend");
    });
    GatewayConfig::new(format!("http://{addr}/"))
}

fn gateway(config: GatewayConfig) -> HttpGateway {
    HttpGateway::new(config).expect("build gateway")
}

fn ignore_progress() -> ProgressCallback {
    Arc::new(|_| {})
}

async fn record_upload(State(recorded): State<Recorded>, mut multipart: Multipart) -> Json<Value> {
    while let Some(field) = multipart.next_field().await.expect("multipart field") {
        let field_name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.expect("field bytes").to_vec();
        recorded.uploads.lock().expect("uploads lock").push(ReceivedPart {
            field: field_name,
            file_name,
            content_type,
            bytes,
        });
    }
    Json(json!({ "success": true, "filename": "abc_clip.mp4" }))
}

async fn record_json(State(recorded): State<Recorded>, Json(body): Json<Value>) -> Json<Value> {
    recorded.bodies.lock().expect("bodies lock").push(body);
    Json(json!({
        "success": true,
        "transcript_text": "one two three",
        "transcript_segments": [
            { "start": 0.0, "end": 1.5, "text": "one" },
            { "start": 1.5, "end": 3.0, "text": "two three" }
        ],
        "frames": ["save/clip/frame_00_00_00.png", { "timestamp": 10, "path": "b.png" }]
    }))
}

#[tokio::test]
async fn upload_sends_file_field_and_reports_progress() {
    let recorded = Recorded::default();
    let config = spawn_backend(
        Router::new()
            .route("/api/upload", post(record_upload))
            .with_state(recorded.clone()),
    )
    .await;

    let seen = Arc::new(Mutex::new(Vec::<TransferProgress>::new()));
    let sink = seen.clone();
    let on_progress: ProgressCallback =
        Arc::new(move |progress| sink.lock().expect("progress lock").push(progress));

    let bytes = vec![7_u8; 200 * 1024];
    let receipt = gateway(config)
        .upload(
            UploadPayload {
                file_name: "clip.mp4".to_string(),
                mime_type: "video/mp4".to_string(),
                bytes: bytes.clone(),
            },
            on_progress,
        )
        .await
        .expect("upload succeeds");

    assert_eq!(receipt.server_filename, "abc_clip.mp4");

    let uploads = recorded.uploads.lock().expect("uploads lock");
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].field, "file");
    assert_eq!(uploads[0].file_name.as_deref(), Some("clip.mp4"));
    assert_eq!(uploads[0].content_type.as_deref(), Some("video/mp4"));
    assert_eq!(uploads[0].bytes, bytes);

    let seen = seen.lock().expect("progress lock");
    assert!(!seen.is_empty());
    assert!(seen.windows(2).all(|pair| pair[0].sent_bytes <= pair[1].sent_bytes));
    let last = seen.last().expect("final progress");
    assert_eq!(last.sent_bytes, last.total_bytes);
    assert_eq!(last.total_bytes, bytes.len() as u64);
}

#[tokio::test]
async fn upload_without_reported_type_uses_extension() {
    let recorded = Recorded::default();
    let config = spawn_backend(
        Router::new()
            .route("/api/upload", post(record_upload))
            .with_state(recorded.clone()),
    )
    .await;

    let receipt = gateway(config)
        .upload(
            UploadPayload {
                file_name: "clip.mkv".to_string(),
                mime_type: String::new(),
                bytes: b"matroska".to_vec(),
            },
            ignore_progress(),
        )
        .await
        .expect("file accepted by extension still uploads");

    assert_eq!(receipt.server_filename, "abc_clip.mp4");
    let uploads = recorded.uploads.lock().expect("uploads lock");
    assert_eq!(
        uploads.as_slice(),
        [ReceivedPart {
            field: "file".to_string(),
            file_name: Some("clip.mkv".to_string()),
            content_type: Some("video/x-matroska".to_string()),
            bytes: b"matroska".to_vec(),
        }]
    );
}

#[tokio::test]
async fn empty_upload_still_reaches_backend() {
    let recorded = Recorded::default();
    let config = spawn_backend(
        Router::new()
            .route("/api/upload", post(record_upload))
            .with_state(recorded.clone()),
    )
    .await;

    gateway(config)
        .upload(
            UploadPayload {
                file_name: "clip.mp4".to_string(),
                mime_type: "video/mp4".to_string(),
                bytes: Vec::new(),
            },
            ignore_progress(),
        )
        .await
        .expect("empty body uploads");

    let uploads = recorded.uploads.lock().expect("uploads lock");
    assert_eq!(uploads.len(), 1);
    assert!(uploads[0].bytes.is_empty());
}

#[tokio::test]
async fn upload_without_filename_is_a_protocol_error() {
    let config = spawn_backend(Router::new().route(
        "/api/upload",
        post(|| async { Json(json!({ "success": true, "filepath": "/tmp/x.mp4" })) }),
    ))
    .await;

    let error = gateway(config)
        .upload(
            UploadPayload {
                file_name: "clip.mp4".to_string(),
                mime_type: "video/mp4".to_string(),
                bytes: b"data".to_vec(),
            },
            ignore_progress(),
        )
        .await
        .expect_err("missing filename must fail");

    assert_eq!(error.kind(), FailureKind::Protocol);
    assert_eq!(error.operation(), Some(Operation::Upload));
}

#[tokio::test]
async fn process_posts_filename_and_decodes_artifacts() {
    let recorded = Recorded::default();
    let config = spawn_backend(
        Router::new()
            .route("/api/process", post(record_json))
            .with_state(recorded.clone()),
    )
    .await;

    let processed = gateway(config)
        .process("abc_clip.mp4")
        .await
        .expect("process succeeds");

    assert_eq!(
        recorded.bodies.lock().expect("bodies lock").as_slice(),
        &[json!({ "filename": "abc_clip.mp4" })]
    );
    assert_eq!(processed.transcript_text, "one two three");
    assert_eq!(processed.transcript_segments.len(), 2);
    assert_eq!(processed.frames.len(), 2);
    assert_eq!(processed.frames[0].timestamp, Some(0.0));
    assert_eq!(processed.frames[1].timestamp, Some(10.0));
    assert_eq!(processed.summary, None);
}

#[tokio::test]
async fn process_without_transcript_is_a_protocol_error() {
    let config = spawn_backend(Router::new().route(
        "/api/process",
        post(|| async { Json(json!({ "success": true, "transcript_file": "x.txt" })) }),
    ))
    .await;

    let error = gateway(config)
        .process("abc_clip.mp4")
        .await
        .expect_err("missing transcript must fail");
    assert_eq!(error.kind(), FailureKind::Protocol);
}

#[tokio::test]
async fn failure_status_keeps_status_and_body_text() {
    let config = spawn_backend(Router::new().route(
        "/api/summary",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "model offline") }),
    ))
    .await;

    let error = gateway(config)
        .summarize("abc_clip.mp4")
        .await
        .expect_err("500 must fail");

    match error {
        GatewayError::Server {
            status,
            body,
            operation,
            ..
        } => {
            assert_eq!(status, 500);
            assert_eq!(body, "model offline");
            assert_eq!(operation, Operation::Summary);
        }
        other => panic!("expected server error, got {other:?}"),
    }
}

#[tokio::test]
async fn summary_returns_text() {
    let config = spawn_backend(Router::new().route(
        "/api/summary",
        post(|| async { Json(json!({ "summary": "A short talk." })) }),
    ))
    .await;

    let summary = gateway(config)
        .summarize("abc_clip.mp4")
        .await
        .expect("summary succeeds");
    assert_eq!(summary, "A short talk.");
}

#[tokio::test]
async fn chat_sends_message_and_context() {
    let recorded = Recorded::default();
    let config = spawn_backend(
        Router::new()
            .route(
                "/api/chat",
                post(
                    |State(recorded): State<Recorded>, Json(body): Json<Value>| async move {
                        recorded.bodies.lock().expect("bodies lock").push(body);
                        Json(json!({ "reply": "It is about rust." }))
                    },
                ),
            )
            .with_state(recorded.clone()),
    )
    .await;

    let reply = gateway(config)
        .chat(ChatRequest::new("what is it about?", "a summary"))
        .await
        .expect("chat succeeds");

    assert_eq!(reply.reply.as_deref(), Some("It is about rust."));
    assert_eq!(
        recorded.bodies.lock().expect("bodies lock").as_slice(),
        &[json!({ "message": "what is it about?", "context": "a summary" })]
    );
}

#[tokio::test]
async fn chat_without_reply_field_is_not_an_error() {
    let config = spawn_backend(
        Router::new().route("/api/chat", post(|| async { Json(json!({ "ok": true })) })),
    )
    .await;

    let reply = gateway(config)
        .chat(ChatRequest::new("hi there", ""))
        .await
        .expect("chat succeeds");
    assert_eq!(reply.reply, None);
}

#[tokio::test]
async fn non_json_success_body_is_a_parse_error() {
    let config = spawn_backend(
        Router::new().route("/api/chat", post(|| async { "<html>proxy page</html>" })),
    )
    .await;

    let error = gateway(config)
        .chat(ChatRequest::new("hi there", ""))
        .await
        .expect_err("html must not parse");
    assert_eq!(error.kind(), FailureKind::Parse);
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind scratch listener");
    let addr = listener.local_addr().expect("scratch address");
    drop(listener);

    let error = gateway(GatewayConfig::new(format!("http://{addr}")))
        .summarize("abc_clip.mp4")
        .await
        .expect_err("closed port must fail");
    assert_eq!(error.kind(), FailureKind::Transport);
}
