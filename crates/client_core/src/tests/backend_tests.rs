use std::sync::Mutex;

use anyhow::Result;
use axum::{
    extract::{Multipart, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;

use super::*;
use crate::{controller::UploadResultController, types::FileCandidate, SelectionId, SubmitMode};

const NOCTURNE_JSON: &str = r#"{
    "title": "Nocturne",
    "visualization_type": "Abstract",
    "image_base64": "iVBORw==",
    "narration": "A <strong>gentle</strong> opening",
    "prompt_name": "abstract_3d_ribbon_score",
    "status": 200
}"#;

const WATERCOLOR_JSON: &str = r#"{
    "title": "Nocturne",
    "visualization_type": "Watercolor Flow Prompt",
    "image_base64": "R0lGODlh",
    "narration": "Colors swell as the melody climbs",
    "disclaimer": "Visualization may not be pixel-for-pixel consistent across runs."
}"#;

#[derive(Clone, Copy)]
struct Script {
    process: (StatusCode, &'static str),
    regenerate: (StatusCode, &'static str),
    trivia: (StatusCode, &'static str),
}

impl Default for Script {
    fn default() -> Self {
        Self {
            process: (StatusCode::OK, NOCTURNE_JSON),
            regenerate: (StatusCode::OK, WATERCOLOR_JSON),
            trivia: (
                StatusCode::OK,
                r#"{"trivia":"Haydn's Surprise Symphony wakes dozing listeners."}"#,
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ReceivedPart {
    name: Option<String>,
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

#[derive(Clone)]
struct ServerState {
    script: Script,
    uploads: Arc<Mutex<Vec<ReceivedPart>>>,
    regenerate_bodies: Arc<Mutex<Vec<(Option<String>, String)>>>,
}

fn json_reply((status, body): (StatusCode, &'static str)) -> Response {
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

async fn handle_process_music(
    State(state): State<ServerState>,
    mut multipart: Multipart,
) -> Response {
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().map(str::to_string);
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        state.uploads.lock().expect("uploads lock").push(ReceivedPart {
            name,
            file_name,
            content_type,
            bytes,
        });
    }
    json_reply(state.script.process)
}

async fn handle_regenerate(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    state
        .regenerate_bodies
        .lock()
        .expect("regenerate lock")
        .push((content_type, body));
    json_reply(state.script.regenerate)
}

async fn handle_trivia(State(state): State<ServerState>) -> Response {
    json_reply(state.script.trivia)
}

async fn spawn_backend(script: Script) -> Result<(String, ServerState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = ServerState {
        script,
        uploads: Arc::new(Mutex::new(Vec::new())),
        regenerate_bodies: Arc::new(Mutex::new(Vec::new())),
    };
    let app = Router::new()
        .route("/api/process-music", post(handle_process_music))
        .route("/api/regenerate", post(handle_regenerate))
        .route("/api/trivia", get(handle_trivia))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), state))
}

fn selected_pdf(name: &str, bytes: &[u8]) -> SelectedFile {
    SelectedFile {
        id: SelectionId(1),
        name: name.to_string(),
        media_type: "application/pdf".to_string(),
        bytes: Arc::from(bytes),
    }
}

#[tokio::test]
async fn process_music_uploads_pdf_as_file_field() {
    let (server_url, state) = spawn_backend(Script::default()).await.expect("spawn server");
    let backend = HttpBackend::new(&server_url).expect("backend");

    let result = backend
        .process_music(&selected_pdf("score.pdf", b"%PDF-1.7 nocturne"))
        .await
        .expect("process");

    assert_eq!(
        state.uploads.lock().expect("uploads lock").clone(),
        vec![ReceivedPart {
            name: Some("file".into()),
            file_name: Some("score.pdf".into()),
            content_type: Some("application/pdf".into()),
            bytes: b"%PDF-1.7 nocturne".to_vec(),
        }]
    );
    assert_eq!(result.title.as_deref(), Some("Nocturne"));
    assert_eq!(result.visualization_type.as_deref(), Some("Abstract"));
    assert_eq!(
        result.narration.as_deref(),
        Some("A <strong>gentle</strong> opening")
    );
    assert_eq!(result.prompt_name.as_deref(), Some("abstract_3d_ribbon_score"));
    assert_eq!(result.disclaimer, None);
    assert_eq!(
        result.decode_image().expect("image"),
        Some(vec![0x89, b'P', b'N', b'G'])
    );
}

#[tokio::test]
async fn regenerate_posts_empty_json_object() {
    let (server_url, state) = spawn_backend(Script::default()).await.expect("spawn server");
    let backend = HttpBackend::new(&server_url).expect("backend");

    let result = backend.regenerate().await.expect("regenerate");

    assert_eq!(
        state.regenerate_bodies.lock().expect("regenerate lock").clone(),
        vec![(Some("application/json".to_string()), "{}".to_string())]
    );
    assert_eq!(
        result.visualization_type.as_deref(),
        Some("Watercolor Flow Prompt")
    );
    assert!(result.disclaimer().is_some());
}

#[tokio::test]
async fn error_field_on_success_status_is_a_failure() {
    let (server_url, _state) = spawn_backend(Script {
        process: (
            StatusCode::OK,
            r#"{"title":"Nocturne","error":"Failed to extract structured musical features."}"#,
        ),
        ..Script::default()
    })
    .await
    .expect("spawn server");
    let backend = HttpBackend::new(&server_url).expect("backend");

    let err = backend
        .process_music(&selected_pdf("score.pdf", b"%PDF"))
        .await
        .expect_err("must fail");

    assert_eq!(
        err,
        ClientError::Application("Failed to extract structured musical features.".into())
    );
}

#[tokio::test]
async fn non_success_status_surfaces_server_message() {
    let (server_url, _state) = spawn_backend(Script {
        regenerate: (
            StatusCode::BAD_REQUEST,
            r#"{"error":"No music data found. Please upload a file first."}"#,
        ),
        ..Script::default()
    })
    .await
    .expect("spawn server");
    let backend = HttpBackend::new(&server_url).expect("backend");

    let err = backend.regenerate().await.expect_err("must fail");

    assert_eq!(
        err,
        ClientError::Status {
            status: 400,
            message: Some("No music data found. Please upload a file first.".into()),
        }
    );
}

#[tokio::test]
async fn non_success_status_without_json_uses_generic_phrase() {
    let (server_url, _state) = spawn_backend(Script {
        process: (StatusCode::BAD_GATEWAY, "<html>upstream down</html>"),
        ..Script::default()
    })
    .await
    .expect("spawn server");
    let backend = HttpBackend::new(&server_url).expect("backend");

    let err = backend
        .process_music(&selected_pdf("score.pdf", b"%PDF"))
        .await
        .expect_err("must fail");

    assert_eq!(
        err.user_message(SubmitMode::Initial),
        "Processing failed: Server error during processing."
    );
}

#[tokio::test]
async fn success_status_with_non_json_body_is_malformed() {
    let (server_url, _state) = spawn_backend(Script {
        regenerate: (StatusCode::OK, "not json"),
        ..Script::default()
    })
    .await
    .expect("spawn server");
    let backend = HttpBackend::new(&server_url).expect("backend");

    let err = backend.regenerate().await.expect_err("must fail");

    assert!(matches!(err, ClientError::Malformed(_)), "unexpected error: {err:?}");
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_failure() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let backend = HttpBackend::new(&format!("http://{addr}")).expect("backend");

    let err = backend.regenerate().await.expect_err("must fail");

    assert!(matches!(err, ClientError::Transport(_)), "unexpected error: {err:?}");
}

#[tokio::test]
async fn trivia_reads_text_and_reports_failures() {
    let (server_url, _state) = spawn_backend(Script::default()).await.expect("spawn server");
    let backend = HttpBackend::new(&server_url).expect("backend");
    assert_eq!(
        backend.trivia().await.expect("trivia"),
        "Haydn's Surprise Symphony wakes dozing listeners."
    );

    let (failing_url, _state) = spawn_backend(Script {
        trivia: (StatusCode::SERVICE_UNAVAILABLE, r#"{"trivia":""}"#),
        ..Script::default()
    })
    .await
    .expect("spawn server");
    let failing = HttpBackend::new(&failing_url).expect("backend");
    assert!(failing.trivia().await.is_err());
}

#[tokio::test]
async fn controller_drives_both_endpoints_over_http() {
    let (server_url, state) = spawn_backend(Script::default()).await.expect("spawn server");
    let mut controller =
        UploadResultController::new(HttpBackend::new(&server_url).expect("backend"));

    controller
        .select_file(FileCandidate::new(
            "score.pdf",
            Some("application/pdf"),
            b"%PDF-1.7".to_vec(),
        ))
        .await;
    assert_eq!(
        controller
            .snapshot()
            .result
            .as_ref()
            .and_then(|result| result.title.as_deref()),
        Some("Nocturne")
    );

    controller.regenerate().await;

    let snapshot = controller.snapshot();
    assert_eq!(state.uploads.lock().expect("uploads lock").len(), 1);
    assert_eq!(state.regenerate_bodies.lock().expect("regenerate lock").len(), 1);
    assert_eq!(
        snapshot
            .result
            .as_ref()
            .map(|result| result.display_visualization_type()),
        Some("Watercolor Flow Prompt")
    );
    assert!(!snapshot.is_loading);
}

#[test]
fn base_url_keeps_path_prefix() {
    let url = normalize_base_url("https://scores.example.com/app").expect("url");
    assert_eq!(
        url.join(REGENERATE_PATH).expect("join").as_str(),
        "https://scores.example.com/app/api/regenerate"
    );
    let root = normalize_base_url("http://127.0.0.1:5000").expect("url");
    assert_eq!(
        root.join(PROCESS_MUSIC_PATH).expect("join").as_str(),
        "http://127.0.0.1:5000/api/process-music"
    );
}

#[test]
fn base_url_rejects_non_http_schemes() {
    assert!(matches!(
        normalize_base_url("ftp://scores.example.com"),
        Err(ClientError::InvalidBaseUrl { .. })
    ));
    assert!(matches!(
        normalize_base_url("not a url"),
        Err(ClientError::InvalidBaseUrl { .. })
    ));
}
