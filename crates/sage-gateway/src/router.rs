use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{
    ask_handler, delete_handler, health_handler, list_handler, root_handler, search_handler,
    upload_handler,
};
use super::state::AppState;

pub(crate) fn build_router(state: AppState, max_body_size: usize) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/api/health", get(health_handler))
        .route("/api/chat/ask", post(ask_handler))
        .route("/api/chat/search", post(search_handler))
        .route("/api/documents/upload", post(upload_handler))
        .route("/api/documents", get(list_handler))
        .route("/api/documents/{document_id}", delete(delete_handler))
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use sage_llm::GenerateOptions;
    use sage_llm::mock::MockModel;
    use sage_memory::{ChunkMetadata, ChunkRecord, InMemoryIndex, VectorIndex};
    use sage_rag::{
        AnswerEngine, ChunkerConfig, IngestionPipeline, NO_DOCUMENTS_ANSWER, UploadStore,
    };

    use super::*;

    const MAX_BODY: usize = 1_048_576;

    struct Fixture {
        app: Router,
        model: Arc<MockModel>,
        index: Arc<InMemoryIndex>,
        uploads: UploadStore,
        _dir: tempfile::TempDir,
    }

    fn fixture_with_model(model: MockModel) -> Fixture {
        let model = Arc::new(model);
        let index = Arc::new(InMemoryIndex::new());
        let dir = tempfile::tempdir().unwrap();
        let uploads = UploadStore::new(dir.path());

        let engine = Arc::new(AnswerEngine::new(
            model.clone() as Arc<dyn sage_llm::ModelClient>,
            index.clone() as Arc<dyn VectorIndex>,
            GenerateOptions::default(),
        ));
        let pipeline = Arc::new(IngestionPipeline::new(
            model.clone() as Arc<dyn sage_llm::ModelClient>,
            index.clone() as Arc<dyn VectorIndex>,
            ChunkerConfig::default(),
        ));
        let state = AppState::new(
            engine,
            pipeline,
            uploads.clone(),
            index.clone() as Arc<dyn VectorIndex>,
            model.clone() as Arc<dyn sage_llm::ModelClient>,
        );
        Fixture {
            app: build_router(state, MAX_BODY),
            model,
            index,
            uploads,
            _dir: dir,
        }
    }

    fn fixture() -> Fixture {
        fixture_with_model(MockModel::default())
    }

    async fn seed_chunk(index: &InMemoryIndex, document_id: &str) {
        index
            .upsert(vec![ChunkRecord {
                id: format!("{document_id}-0"),
                vector: vec![1.0, 0.0, 0.0, 0.0],
                text: "The cell is the basic unit of life.".into(),
                metadata: ChunkMetadata {
                    document_id: document_id.into(),
                    filename: "bio.pdf".into(),
                    chunk_index: 0,
                    total_chunks: 1,
                    source: "data/uploads/bio.pdf".into(),
                },
            }])
            .await
            .unwrap();
    }

    fn json_post(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    }

    fn multipart_upload(uri: &str, filename: &str, data: &[u8]) -> Request<Body> {
        let boundary = "sageboundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\ncontent-disposition: form-data; name=\"file\"; \
                 filename=\"{filename}\"\r\ncontent-type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn root_reports_service_info() {
        let f = fixture();
        let resp = f
            .app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let json = body_json(resp).await;
        assert_eq!(json["name"], "sage");
        assert_eq!(json["status"], "running");
    }

    #[tokio::test]
    async fn health_reports_services() {
        let f = fixture();
        let resp = f
            .app
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let json = body_json(resp).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["services"]["ollama"]["status"], "connected");
        assert_eq!(json["services"]["vector_store"]["status"], "connected");
        assert_eq!(json["services"]["vector_store"]["chunks"], 0);
    }

    #[tokio::test]
    async fn health_degrades_when_model_endpoint_is_down() {
        let f = fixture_with_model(MockModel::failing_list());
        let resp = f
            .app
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let json = body_json(resp).await;
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["services"]["ollama"]["status"], "disconnected");
    }

    #[tokio::test]
    async fn ask_rejects_blank_question() {
        let f = fixture();
        let resp = f
            .app
            .oneshot(json_post("/api/chat/ask", serde_json::json!({"question": "  "})))
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let json = body_json(resp).await;
        assert_eq!(json["error"], "validation");
    }

    #[tokio::test]
    async fn ask_with_empty_index_returns_canned_answer() {
        let f = fixture();
        let resp = f
            .app
            .oneshot(json_post(
                "/api/chat/ask",
                serde_json::json!({"question": "what is a cell?"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let json = body_json(resp).await;
        assert_eq!(json["answer"], NO_DOCUMENTS_ANSWER);
        assert_eq!(json["confidence"], "none");
        assert_eq!(f.model.generate_calls(), 0);
    }

    #[tokio::test]
    async fn ask_returns_answer_with_sources() {
        let f = fixture_with_model(MockModel::with_response("Cells are the unit of life."));
        seed_chunk(&f.index, "doc1").await;

        let resp = f
            .app
            .oneshot(json_post(
                "/api/chat/ask",
                serde_json::json!({
                    "question": "what is a cell?",
                    "conversation_history": [{"role": "user", "content": "hi"}],
                }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let json = body_json(resp).await;
        assert_eq!(json["answer"], "Cells are the unit of life.");
        assert_eq!(json["confidence"], "high");
        assert_eq!(json["sources"][0]["filename"], "bio.pdf");
        assert_eq!(json["sources"][0]["relevance_score"], 1.0);
    }

    #[tokio::test]
    async fn search_returns_hits() {
        let f = fixture();
        seed_chunk(&f.index, "doc1").await;

        let resp = f
            .app
            .oneshot(json_post(
                "/api/chat/search",
                serde_json::json!({"query": "cell"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let json = body_json(resp).await;
        assert_eq!(json["total"], 1);
        assert_eq!(json["results"][0]["filename"], "bio.pdf");
        assert_eq!(f.model.generate_calls(), 0);
    }

    #[tokio::test]
    async fn upload_rejects_non_pdf_filename() {
        let f = fixture();
        let resp = f
            .app
            .oneshot(multipart_upload("/api/documents/upload", "notes.txt", b"hi"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let json = body_json(resp).await;
        assert_eq!(json["error"], "validation");
    }

    #[tokio::test]
    async fn upload_without_file_field_is_rejected() {
        let f = fixture();
        let boundary = "sageboundary";
        let body = format!(
            "--{boundary}\r\ncontent-disposition: form-data; name=\"other\"\r\n\r\nvalue\r\n--{boundary}--\r\n"
        );
        let req = Request::builder()
            .method("POST")
            .uri("/api/documents/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();
        let resp = f.app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), 400);
    }

    #[tokio::test]
    async fn failed_extraction_cleans_up_stored_file() {
        let f = fixture();
        let resp = f
            .app
            .oneshot(multipart_upload(
                "/api/documents/upload",
                "broken.pdf",
                b"this is not a pdf",
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), 500);
        let json = body_json(resp).await;
        assert_eq!(json["error"], "extraction");
        assert!(f.uploads.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_is_empty_without_uploads() {
        let f = fixture();
        let resp = f
            .app
            .oneshot(
                Request::builder()
                    .uri("/api/documents")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let json = body_json(resp).await;
        assert_eq!(json["total_documents"], 0);
    }

    #[tokio::test]
    async fn delete_unknown_document_is_404() {
        let f = fixture();
        let resp = f
            .app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/documents/nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
        let json = body_json(resp).await;
        assert_eq!(json["error"], "not_found");
    }

    #[tokio::test]
    async fn delete_removes_chunks_and_file() {
        let f = fixture();
        f.uploads.save(b"pdf bytes", "doc1", "bio.pdf").await.unwrap();
        seed_chunk(&f.index, "doc1").await;

        let resp = f
            .app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/documents/doc1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let json = body_json(resp).await;
        assert_eq!(json["chunks_removed"], 1);
        assert_eq!(f.index.count().await.unwrap(), 0);
        assert!(f.uploads.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let model = Arc::new(MockModel::default());
        let index = Arc::new(InMemoryIndex::new());
        let dir = tempfile::tempdir().unwrap();
        let uploads = UploadStore::new(dir.path());
        let engine = Arc::new(AnswerEngine::new(
            model.clone() as Arc<dyn sage_llm::ModelClient>,
            index.clone() as Arc<dyn VectorIndex>,
            GenerateOptions::default(),
        ));
        let pipeline = Arc::new(IngestionPipeline::new(
            model.clone() as Arc<dyn sage_llm::ModelClient>,
            index.clone() as Arc<dyn VectorIndex>,
            ChunkerConfig::default(),
        ));
        let state = AppState::new(
            engine,
            pipeline,
            uploads,
            index as Arc<dyn VectorIndex>,
            model as Arc<dyn sage_llm::ModelClient>,
        );
        let app = build_router(state, 64);

        let resp = app
            .oneshot(json_post(
                "/api/chat/ask",
                serde_json::json!({"question": "a".repeat(256)}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), 413);
    }
}
