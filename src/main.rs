use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;

use sage_gateway::{AppState, GatewayServer};
use sage_llm::{GenerateOptions, ModelClient, OllamaClient};
use sage_memory::{QdrantIndex, VectorIndex};
use sage_rag::{AnswerEngine, ChunkerConfig, IngestionPipeline, UploadStore};

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "sage", version, about = "Study-assistant backend over local models")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "config/default.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    let model: Arc<dyn ModelClient> = Arc::new(
        OllamaClient::new(
            &config.llm.base_url,
            config.llm.chat_model.clone(),
            config.llm.embedding_model.clone(),
        )
        .with_timeouts(
            Duration::from_secs(config.llm.embed_timeout_secs),
            Duration::from_secs(config.llm.generate_timeout_secs),
        ),
    );

    match model.list_models().await {
        Ok(models) => tracing::info!(count = models.len(), "ollama reachable"),
        Err(e) => tracing::warn!("ollama health check failed: {e}"),
    }

    let index: Arc<dyn VectorIndex> =
        Arc::new(QdrantIndex::new(&config.index.url, config.index.collection.clone())?);
    index.ensure_ready(config.index.vector_size).await?;
    tracing::info!(
        collection = config.index.collection,
        vector_size = config.index.vector_size,
        "vector index ready"
    );

    let chunker = ChunkerConfig {
        chunk_size: config.ingest.chunk_size,
        overlap: config.ingest.overlap,
        min_chunk_len: config.ingest.min_chunk_len,
    };
    let pipeline = Arc::new(IngestionPipeline::new(
        Arc::clone(&model),
        Arc::clone(&index),
        chunker,
    ));
    let engine = Arc::new(AnswerEngine::new(
        Arc::clone(&model),
        Arc::clone(&index),
        GenerateOptions {
            temperature: config.llm.temperature,
            num_predict: None,
        },
    ));
    let uploads = UploadStore::new(&config.ingest.upload_dir);

    let state = AppState::new(engine, pipeline, uploads, index, model);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e:#}");
            return;
        }
        tracing::info!("received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    GatewayServer::new(&config.server.host, config.server.port, state, shutdown_rx)
        .with_max_body_size(config.server.max_upload_bytes)
        .serve()
        .await?;

    Ok(())
}
