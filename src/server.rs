//! HTTP server exposing the upload and query endpoints.
//!
//! Routes mirror the service contract: `POST /upload/` takes a multipart
//! batch of PDFs, `POST /query` takes an urlencoded form with the
//! question, `GET /health` answers liveness probes. Errors come back as
//! `{"detail": ...}` with 400 for rejected uploads and 500 for
//! processing or remote failures.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::error::AskPdfError;
use crate::openai::OpenAiClient;
use crate::pinecone::PineconeClient;
use crate::pipeline::{Pipeline, UploadedFile};

#[derive(Clone)]
struct AppState {
    pipeline: Arc<Pipeline>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub file_count: usize,
    pub files: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct QueryForm {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub reply: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

/// Build the application router around a ready pipeline.
pub fn router(pipeline: Arc<Pipeline>) -> Router {
    Router::new()
        .route("/upload/", post(upload_handler))
        .route("/query", post(query_handler))
        .route("/health", get(health_check))
        // Uploads can exceed axum's default 2 MB body cap
        .layer(DefaultBodyLimit::disable())
        .with_state(AppState { pipeline })
}

/// Run the server: validate settings, construct the remote clients,
/// provision the index, then bind and serve until ctrl-c.
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    crate::logging::init_with_config(&settings.logging);
    settings.validate()?;

    let openai = Arc::new(OpenAiClient::new(&settings.openai));
    let pinecone = PineconeClient::new(&settings.pinecone);
    let index = Arc::new(
        pinecone
            .ensure_index(settings.openai.embedding_dimension)
            .await?,
    );
    let pipeline = Arc::new(Pipeline::new(
        openai.clone(),
        index,
        openai,
        &settings,
    ));

    let bind = format!("{}:{}", settings.server.host, settings.server.port);
    crate::log_event!("http", "starting", "askpdf server on {bind}");

    let app = router(pipeline);
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    eprintln!("askpdf server listening on http://{bind}");
    eprintln!("Press Ctrl+C to stop the server");

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            result?;
        }
        _ = shutdown_signal() => {
            eprintln!("Shutting down HTTP server...");
        }
    }

    eprintln!("HTTP server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to listen for ctrl+c");
    eprintln!("Received shutdown signal");
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

async fn upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, (StatusCode, Json<ErrorBody>)> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(e.to_string()))?
    {
        if field.name() != Some("files") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| bad_request(e.to_string()))?;
        files.push(UploadedFile {
            filename,
            bytes: bytes.to_vec(),
        });
    }

    if files.is_empty() {
        return Err(bad_request("No files provided."));
    }

    state
        .pipeline
        .ingest(&files)
        .await
        .map_err(error_response)?;

    let names: Vec<String> = files.into_iter().map(|f| f.filename).collect();
    Ok(Json(UploadResponse {
        message: "PDFs uploaded, text extracted, and saved to the DB successfully.".to_string(),
        file_count: names.len(),
        files: names,
    }))
}

async fn query_handler(
    State(state): State<AppState>,
    Form(form): Form<QueryForm>,
) -> Result<Json<QueryResponse>, (StatusCode, Json<ErrorBody>)> {
    let reply = state
        .pipeline
        .answer(&form.query)
        .await
        .map_err(error_response)?;
    Ok(Json(QueryResponse { reply }))
}

fn bad_request(detail: impl Into<String>) -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            detail: detail.into(),
        }),
    )
}

fn error_response(err: AskPdfError) -> (StatusCode, Json<ErrorBody>) {
    let status = if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        tracing::error!("request failed: {err}");
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (
        status,
        Json(ErrorBody {
            detail: err.to_string(),
        }),
    )
}
