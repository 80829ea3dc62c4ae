use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub index: IndexConfig,
    pub ingest: IngestConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8000,
            max_upload_bytes: 52_428_800,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LlmConfig {
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub temperature: f32,
    pub embed_timeout_secs: u64,
    pub generate_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".into(),
            chat_model: "qwen3:8b".into(),
            embedding_model: "nomic-embed-text".into(),
            temperature: 0.7,
            embed_timeout_secs: 30,
            generate_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndexConfig {
    pub url: String,
    pub collection: String,
    pub vector_size: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6334".into(),
            collection: "sage_documents".into(),
            vector_size: 768,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngestConfig {
    pub chunk_size: usize,
    pub overlap: usize,
    pub min_chunk_len: usize,
    pub upload_dir: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 200,
            min_chunk_len: 50,
            upload_dir: "data/uploads".into(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SAGE_SERVER_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = std::env::var("SAGE_SERVER_PORT")
            && let Ok(port) = v.parse::<u16>()
        {
            self.server.port = port;
        }
        if let Ok(v) = std::env::var("SAGE_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("SAGE_LLM_CHAT_MODEL") {
            self.llm.chat_model = v;
        }
        if let Ok(v) = std::env::var("SAGE_LLM_EMBEDDING_MODEL") {
            self.llm.embedding_model = v;
        }
        if let Ok(v) = std::env::var("SAGE_QDRANT_URL") {
            self.index.url = v;
        }
        if let Ok(v) = std::env::var("SAGE_QDRANT_COLLECTION") {
            self.index.collection = v;
        }
        if let Ok(v) = std::env::var("SAGE_VECTOR_SIZE")
            && let Ok(size) = v.parse::<u64>()
        {
            self.index.vector_size = size;
        }
        if let Ok(v) = std::env::var("SAGE_UPLOAD_DIR") {
            self.ingest.upload_dir = v;
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.ingest.chunk_size == 0 {
            anyhow::bail!("ingest.chunk_size must be positive");
        }
        if self.ingest.overlap >= self.ingest.chunk_size {
            anyhow::bail!(
                "ingest.overlap ({}) must be smaller than ingest.chunk_size ({})",
                self.ingest.overlap,
                self.ingest.chunk_size
            );
        }
        if self.index.vector_size == 0 {
            anyhow::bail!("index.vector_size must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn nonexistent_path_uses_defaults() {
        let config = Config::load(Path::new("/does/not/exist.toml")).unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.llm.embedding_model, "nomic-embed-text");
        assert_eq!(config.index.collection, "sage_documents");
        assert_eq!(config.ingest.chunk_size, 1000);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 9001\n\n[ingest]\nchunk_size = 500\noverlap = 100").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.port, 9001);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.ingest.chunk_size, 500);
        assert_eq!(config.ingest.min_chunk_len, 50);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nprot = 9001").unwrap();
        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk_size() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[ingest]\nchunk_size = 100\noverlap = 100").unwrap();
        assert!(Config::load(file.path()).is_err());
    }
}
