//! HTTP API server for integration with other systems.
//!
//! Serves one session: upload a document, pick a language, ask, listen.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::PustakaError;
use crate::ingest::UploadedDocument;
use crate::language::InteractionLanguage;
use crate::rag::Answer;
use crate::session::{IngestOutcome, Session};
use crate::vector_store::IndexedDocument;
use crate::voice::PlaybackState;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

/// Uploads larger than this are rejected.
const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Shared application state.
type AppState = Arc<Mutex<Session>>;

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let session = Session::from_settings(&settings)?;
    let app = router(Arc::new(Mutex::new(session)));

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Pustaka API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Upload document", "PUT  /documents/{filename}");
    Output::kv("Current document", "GET  /documents");
    Output::kv("Set language", "PUT  /language");
    Output::kv("Ask", "POST /ask");
    Output::kv("Transcribe question", "POST /voice");
    Output::kv("Hear answer", "POST /speech/hear");
    Output::kv("Stop hearing", "POST /speech/stop");
    Output::kv("Playback state", "GET  /speech");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/documents", get(current_document))
        .route("/documents/{filename}", put(upload_document))
        .route("/language", put(set_language))
        .route("/ask", post(ask))
        .route("/voice", post(voice))
        .route("/speech", get(speech_state))
        .route("/speech/hear", post(hear))
        .route("/speech/stop", post(stop))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Serialize)]
struct DocumentResponse {
    language: InteractionLanguage,
    document: Option<IndexedDocument>,
    preview: Option<String>,
}

#[derive(Deserialize, Serialize)]
struct LanguageRequest {
    language: InteractionLanguage,
}

#[derive(Deserialize)]
struct AskRequest {
    question: String,
    #[serde(default)]
    language: Option<InteractionLanguage>,
}

#[derive(Serialize)]
struct AskResponse {
    /// `null` when the question was blank or no document is loaded.
    answer: Option<Answer>,
}

#[derive(Deserialize)]
struct VoiceQuery {
    #[serde(default = "default_audio_filename")]
    filename: String,
}

fn default_audio_filename() -> String {
    "question.wav".to_string()
}

#[derive(Serialize)]
struct VoiceResponse {
    language: InteractionLanguage,
    /// `null` when nothing was said.
    text: Option<String>,
}

#[derive(Serialize)]
struct SpeechResponse {
    state: PlaybackState,
    #[serde(skip_serializing_if = "Option::is_none")]
    started: Option<bool>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(e: PustakaError) -> Response {
    let status = match &e {
        PustakaError::InvalidInput(_)
        | PustakaError::Ingest(_)
        | PustakaError::Extraction(_)
        | PustakaError::Zip(_)
        | PustakaError::Xml(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PustakaError::ToolNotFound(_) => StatusCode::SERVICE_UNAVAILABLE,
        PustakaError::Embedding(_)
        | PustakaError::Model(_)
        | PustakaError::Translation(_)
        | PustakaError::Transcription(_)
        | PustakaError::Http(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!("Request failed: {}", e);
    }
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn current_document(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.lock().await;
    Json(DocumentResponse {
        language: session.language(),
        document: session.document().cloned(),
        preview: session.preview().map(str::to_string),
    })
}

async fn upload_document(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    body: Bytes,
) -> Response {
    let upload = UploadedDocument::new(filename, body.to_vec());
    let mut session = state.lock().await;
    match session.load_document(upload).await {
        Ok(outcome @ IngestOutcome::Indexed { .. }) => Json(outcome).into_response(),
        Ok(outcome @ IngestOutcome::Unsupported { .. }) => {
            (StatusCode::UNSUPPORTED_MEDIA_TYPE, Json(outcome)).into_response()
        }
        Err(e) => error_response(e),
    }
}

async fn set_language(
    State(state): State<AppState>,
    Json(req): Json<LanguageRequest>,
) -> impl IntoResponse {
    state.lock().await.set_language(req.language);
    Json(req)
}

async fn ask(State(state): State<AppState>, Json(req): Json<AskRequest>) -> Response {
    let mut session = state.lock().await;
    if let Some(language) = req.language {
        session.set_language(language);
    }
    match session.ask(&req.question).await {
        Ok(answer) => Json(AskResponse { answer }).into_response(),
        Err(e) => error_response(e),
    }
}

async fn voice(
    State(state): State<AppState>,
    Query(query): Query<VoiceQuery>,
    body: Bytes,
) -> Response {
    let session = state.lock().await;
    match session.transcribe_bytes(&query.filename, body.to_vec()).await {
        Ok(text) => Json(VoiceResponse {
            language: session.language(),
            text,
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn speech_state(State(state): State<AppState>) -> impl IntoResponse {
    Json(SpeechResponse {
        state: state.lock().await.playback_state(),
        started: None,
    })
}

async fn hear(State(state): State<AppState>) -> Response {
    let mut session = state.lock().await;
    // Replacing a running playback joins its thread.
    match tokio::task::block_in_place(|| session.hear()) {
        Ok(started) => Json(SpeechResponse {
            state: session.playback_state(),
            started: Some(started),
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn stop(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.lock().await;
    session.stop_hearing();
    Json(SpeechResponse {
        state: session.playback_state(),
        started: None,
    })
}
