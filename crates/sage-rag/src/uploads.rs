//! On-disk storage for uploaded PDFs.
//!
//! Files are stored flat under one directory, named
//! `{timestamp}_{document_id}_{original_name}` so a directory listing is
//! enough to reconstruct what was uploaded and when.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

use crate::error::RagError;

const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S";

/// One stored upload, reconstructed from its filename and fs metadata.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub id: String,
    pub filename: String,
    pub uploaded: DateTime<Utc>,
    pub size_bytes: u64,
    pub path: PathBuf,
}

/// Flat-directory store for uploaded files.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes the uploaded bytes to disk and returns the stored path.
    ///
    /// `original` is reduced to its final path component, so a client-supplied
    /// name can never escape the upload directory.
    pub async fn save(
        &self,
        bytes: &[u8],
        document_id: &str,
        original: &str,
    ) -> Result<PathBuf, RagError> {
        tokio::fs::create_dir_all(&self.root).await?;
        let original = Path::new(original)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.pdf");
        let stamp = Utc::now().format(TIMESTAMP_FORMAT);
        let path = self.root.join(format!("{stamp}_{document_id}_{original}"));
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }

    /// All stored documents, newest first. Files whose names do not follow
    /// the store's naming scheme are skipped with a warning.
    pub async fn list(&self) -> Result<Vec<StoredDocument>, RagError> {
        let mut docs = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(docs),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            match parse_stored_name(name) {
                Some((uploaded, id, filename)) => {
                    let meta = entry.metadata().await?;
                    docs.push(StoredDocument {
                        id: id.to_string(),
                        filename: filename.to_string(),
                        uploaded,
                        size_bytes: meta.len(),
                        path: entry.path(),
                    });
                }
                None => warn!(name, "skipping file with unrecognized name"),
            }
        }
        docs.sort_by(|a, b| b.uploaded.cmp(&a.uploaded).then(b.filename.cmp(&a.filename)));
        Ok(docs)
    }

    /// Looks a document up by id.
    pub async fn find(&self, document_id: &str) -> Result<Option<StoredDocument>, RagError> {
        Ok(self.list().await?.into_iter().find(|d| d.id == document_id))
    }

    /// Deletes a stored document's file.
    pub async fn remove(&self, document_id: &str) -> Result<StoredDocument, RagError> {
        let doc = self
            .find(document_id)
            .await?
            .ok_or_else(|| RagError::NotFound(document_id.to_string()))?;
        tokio::fs::remove_file(&doc.path).await?;
        Ok(doc)
    }
}

fn parse_stored_name(name: &str) -> Option<(DateTime<Utc>, &str, &str)> {
    let mut parts = name.splitn(3, '_');
    let stamp = parts.next()?;
    let id = parts.next()?;
    let filename = parts.next()?;
    if id.is_empty() || filename.is_empty() {
        return None;
    }
    let naive = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()?;
    Some((naive.and_utc(), id, filename))
}
