use std::sync::Arc;
use std::time::Instant;

use sage_llm::ModelClient;
use sage_memory::VectorIndex;
use sage_rag::{AnswerEngine, IngestionPipeline, UploadStore};

/// Shared handles behind every request handler.
#[derive(Clone)]
pub struct AppState {
    pub(crate) engine: Arc<AnswerEngine>,
    pub(crate) pipeline: Arc<IngestionPipeline>,
    pub(crate) uploads: UploadStore,
    pub(crate) index: Arc<dyn VectorIndex>,
    pub(crate) model: Arc<dyn ModelClient>,
    pub(crate) started_at: Instant,
}

impl AppState {
    #[must_use]
    pub fn new(
        engine: Arc<AnswerEngine>,
        pipeline: Arc<IngestionPipeline>,
        uploads: UploadStore,
        index: Arc<dyn VectorIndex>,
        model: Arc<dyn ModelClient>,
    ) -> Self {
        Self {
            engine,
            pipeline,
            uploads,
            index,
            model,
            started_at: Instant::now(),
        }
    }
}
