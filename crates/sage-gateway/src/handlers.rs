use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::response::IntoResponse;
use chrono::Utc;
use tracing::{info, warn};

use sage_rag::{Answer, HistoryTurn, IngestReport, SearchHit, document_id};

use crate::error::ApiError;
use crate::state::AppState;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

fn default_max_sources() -> usize {
    3
}

fn default_max_results() -> usize {
    10
}

#[derive(serde::Deserialize)]
pub(crate) struct AskRequest {
    pub question: String,
    #[serde(default)]
    pub conversation_history: Vec<HistoryTurn>,
    #[serde(default = "default_max_sources")]
    pub max_sources: usize,
}

#[derive(serde::Deserialize)]
pub(crate) struct SearchRequest {
    pub query: String,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

#[derive(serde::Serialize)]
pub(crate) struct SearchResponse {
    total: usize,
    results: Vec<SearchHit>,
}

#[derive(serde::Serialize)]
pub(crate) struct UploadResponse {
    message: &'static str,
    document_id: String,
    filename: String,
    chunk_count: usize,
    total_characters: usize,
}

#[derive(serde::Serialize)]
struct DocumentInfo {
    id: String,
    filename: String,
    upload_date: String,
    size_bytes: u64,
    size_mb: f64,
}

#[derive(serde::Serialize)]
pub(crate) struct ListResponse {
    total_documents: usize,
    documents: Vec<DocumentInfo>,
}

#[derive(serde::Serialize)]
pub(crate) struct DeleteResponse {
    message: &'static str,
    document_id: String,
    chunks_removed: usize,
}

pub(crate) async fn root_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "sage",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
    }))
}

pub(crate) async fn ask_handler(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<Answer>, ApiError> {
    let answer = state
        .engine
        .answer(&req.question, &req.conversation_history, req.max_sources)
        .await?;
    Ok(Json(answer))
}

pub(crate) async fn search_handler(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let results = state.engine.search(&req.query, req.max_results).await?;
    Ok(Json(SearchResponse {
        total: results.len(),
        results,
    }))
}

pub(crate) async fn upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("malformed multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let filename = field
                .file_name()
                .map(ToString::to_string)
                .ok_or_else(|| ApiError::bad_request("file field has no filename"))?;
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("failed to read upload: {e}")))?;
            upload = Some((filename, bytes.to_vec()));
        }
    }
    let (filename, bytes) =
        upload.ok_or_else(|| ApiError::bad_request("missing 'file' field in upload"))?;
    if !filename.to_ascii_lowercase().ends_with(".pdf") {
        return Err(ApiError::bad_request("only PDF files are supported"));
    }

    let doc_id = document_id(&bytes);
    let path = state.uploads.save(&bytes, &doc_id, &filename).await?;
    let source = path.to_string_lossy().into_owned();

    let report: IngestReport = match state.pipeline.ingest(bytes, &filename, &source).await {
        Ok(report) => report,
        Err(e) => {
            // Do not leave unprocessable files behind.
            if let Err(rm) = tokio::fs::remove_file(&path).await {
                warn!(path = %path.display(), "failed to clean up rejected upload: {rm}");
            }
            return Err(e.into());
        }
    };

    info!(
        document_id = report.document_id,
        filename, report.chunk_count, "document uploaded"
    );
    Ok(Json(UploadResponse {
        message: "Document uploaded and processed successfully",
        document_id: report.document_id,
        filename,
        chunk_count: report.chunk_count,
        total_characters: report.total_characters,
    }))
}

pub(crate) async fn list_handler(
    State(state): State<AppState>,
) -> Result<Json<ListResponse>, ApiError> {
    let documents: Vec<DocumentInfo> = state
        .uploads
        .list()
        .await?
        .into_iter()
        .map(|d| DocumentInfo {
            id: d.id,
            filename: d.filename,
            upload_date: d.uploaded.to_rfc3339(),
            size_bytes: d.size_bytes,
            size_mb: (d.size_bytes as f64 / BYTES_PER_MB * 100.0).round() / 100.0,
        })
        .collect();
    Ok(Json(ListResponse {
        total_documents: documents.len(),
        documents,
    }))
}

pub(crate) async fn delete_handler(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    if state.uploads.find(&document_id).await?.is_none() {
        return Err(ApiError::not_found(format!(
            "document not found: {document_id}"
        )));
    }

    // Chunks go first so a failure here never orphans index entries.
    let chunk_ids = state.index.document_chunk_ids(&document_id).await.map_err(sage_rag::RagError::from)?;
    let chunks_removed = chunk_ids.len();
    state.index.delete(chunk_ids).await.map_err(sage_rag::RagError::from)?;
    state.uploads.remove(&document_id).await?;

    info!(document_id, chunks_removed, "document deleted");
    Ok(Json(DeleteResponse {
        message: "Document deleted successfully",
        document_id,
        chunks_removed,
    }))
}

pub(crate) async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut status = "healthy";
    let mut services = serde_json::Map::new();

    match state.model.list_models().await {
        Ok(models) => {
            services.insert(
                "ollama".into(),
                serde_json::json!({ "status": "connected", "models": models }),
            );
        }
        Err(e) => {
            status = "degraded";
            services.insert(
                "ollama".into(),
                serde_json::json!({ "status": "disconnected", "error": e.to_string() }),
            );
        }
    }

    match state.index.count().await {
        Ok(chunks) => {
            services.insert(
                "vector_store".into(),
                serde_json::json!({ "status": "connected", "chunks": chunks }),
            );
        }
        Err(e) => {
            status = "degraded";
            services.insert(
                "vector_store".into(),
                serde_json::json!({ "status": "error", "error": e.to_string() }),
            );
        }
    }

    Json(serde_json::json!({
        "status": status,
        "timestamp": Utc::now().to_rfc3339(),
        "uptime_secs": state.started_at.elapsed().as_secs(),
        "services": services,
    }))
}
