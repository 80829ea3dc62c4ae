//! Qdrant-backed implementation of [`VectorIndex`].

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    Condition, CountPointsBuilder, CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter,
    PointId, PointStruct, PointsIdsList, ScoredPoint, ScrollPointsBuilder, SearchPointsBuilder,
    UpsertPointsBuilder, VectorParamsBuilder, value::Kind,
};
use serde_json::json;

use crate::error::IndexError;
use crate::index::{ChunkMetadata, ChunkRecord, ScoredChunk, VectorIndex, clamp_distance};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Chunk store in a single Qdrant collection with cosine vectors.
#[derive(Clone)]
pub struct QdrantIndex {
    client: Qdrant,
    collection: String,
}

impl std::fmt::Debug for QdrantIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QdrantIndex")
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

impl QdrantIndex {
    /// Connect to Qdrant at `url`, storing chunks in `collection`.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be constructed.
    pub fn new(url: &str, collection: impl Into<String>) -> Result<Self, IndexError> {
        let client = Qdrant::from_url(url)
            .build()
            .map_err(|e| IndexError::Connection(e.to_string()))?;
        Ok(Self {
            client,
            collection: collection.into(),
        })
    }

    fn record_to_point(record: ChunkRecord) -> Result<PointStruct, IndexError> {
        let payload: HashMap<String, qdrant_client::qdrant::Value> =
            serde_json::from_value(json!({
                "document_id": record.metadata.document_id,
                "filename": record.metadata.filename,
                "chunk_index": record.metadata.chunk_index,
                "total_chunks": record.metadata.total_chunks,
                "source": record.metadata.source,
                "text": record.text,
            }))?;
        Ok(PointStruct::new(record.id, record.vector, payload))
    }

    fn point_to_chunk(point: ScoredPoint) -> Option<ScoredChunk> {
        let payload = payload_to_json(&point.payload);
        let text = payload.get("text")?.as_str()?.to_owned();
        let metadata = ChunkMetadata {
            document_id: payload.get("document_id")?.as_str()?.to_owned(),
            filename: payload.get("filename")?.as_str()?.to_owned(),
            chunk_index: usize::try_from(payload.get("chunk_index")?.as_i64()?).ok()?,
            total_chunks: usize::try_from(payload.get("total_chunks")?.as_i64()?).ok()?,
            source: payload.get("source")?.as_str()?.to_owned(),
        };
        Some(ScoredChunk {
            id: point_id_to_string(point.id),
            text,
            metadata,
            // Cosine similarity from Qdrant; callers see normalized distance.
            distance: clamp_distance(1.0 - point.score),
        })
    }
}

fn payload_to_json(
    payload: &HashMap<String, qdrant_client::qdrant::Value>,
) -> HashMap<String, serde_json::Value> {
    payload
        .iter()
        .filter_map(|(k, v)| {
            let json_val = match v.kind.as_ref()? {
                Kind::StringValue(s) => serde_json::Value::String(s.clone()),
                Kind::IntegerValue(i) => serde_json::Value::Number((*i).into()),
                Kind::DoubleValue(d) => {
                    serde_json::Number::from_f64(*d).map(serde_json::Value::Number)?
                }
                Kind::BoolValue(b) => serde_json::Value::Bool(*b),
                _ => return None,
            };
            Some((k.clone(), json_val))
        })
        .collect()
}

fn point_id_to_string(id: Option<PointId>) -> String {
    match id.and_then(|pid| pid.point_id_options) {
        Some(qdrant_client::qdrant::point_id::PointIdOptions::Uuid(u)) => u,
        Some(qdrant_client::qdrant::point_id::PointIdOptions::Num(n)) => n.to_string(),
        None => String::new(),
    }
}

impl VectorIndex for QdrantIndex {
    fn ensure_ready(&self, vector_size: u64) -> BoxFuture<'_, Result<(), IndexError>> {
        Box::pin(async move {
            let exists = self
                .client
                .collection_exists(&self.collection)
                .await
                .map_err(|e| IndexError::Collection(e.to_string()))?;
            if exists {
                return Ok(());
            }
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.collection)
                        .vectors_config(VectorParamsBuilder::new(vector_size, Distance::Cosine)),
                )
                .await
                .map_err(|e| IndexError::Collection(e.to_string()))?;
            tracing::info!(collection = %self.collection, vector_size, "created Qdrant collection");
            Ok(())
        })
    }

    fn upsert(&self, records: Vec<ChunkRecord>) -> BoxFuture<'_, Result<(), IndexError>> {
        Box::pin(async move {
            if records.is_empty() {
                return Ok(());
            }
            let points: Vec<PointStruct> = records
                .into_iter()
                .map(Self::record_to_point)
                .collect::<Result<_, _>>()?;
            self.client
                .upsert_points(UpsertPointsBuilder::new(&self.collection, points))
                .await
                .map_err(|e| IndexError::Upsert(e.to_string()))?;
            Ok(())
        })
    }

    fn query(
        &self,
        vector: Vec<f32>,
        limit: usize,
    ) -> BoxFuture<'_, Result<Vec<ScoredChunk>, IndexError>> {
        Box::pin(async move {
            let results = self
                .client
                .search_points(
                    SearchPointsBuilder::new(&self.collection, vector, limit as u64)
                        .with_payload(true),
                )
                .await
                .map_err(|e| IndexError::Query(e.to_string()))?;
            let mut chunks: Vec<ScoredChunk> = results
                .result
                .into_iter()
                .filter_map(Self::point_to_chunk)
                .collect();
            // Qdrant returns best-score-first; make ascending distance explicit.
            chunks.sort_by(|a, b| {
                a.distance
                    .partial_cmp(&b.distance)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            Ok(chunks)
        })
    }

    fn document_chunk_ids(
        &self,
        document_id: &str,
    ) -> BoxFuture<'_, Result<Vec<String>, IndexError>> {
        let document_id = document_id.to_owned();
        Box::pin(async move {
            let filter = Filter::must([Condition::matches("document_id", document_id)]);
            let mut ids = Vec::new();
            let mut offset: Option<PointId> = None;

            loop {
                let mut builder = ScrollPointsBuilder::new(&self.collection)
                    .filter(filter.clone())
                    .with_payload(false)
                    .with_vectors(false)
                    .limit(100);
                if let Some(ref off) = offset {
                    builder = builder.offset(off.clone());
                }

                let response = self
                    .client
                    .scroll(builder)
                    .await
                    .map_err(|e| IndexError::Scroll(e.to_string()))?;

                ids.extend(
                    response
                        .result
                        .into_iter()
                        .map(|p| point_id_to_string(p.id)),
                );

                match response.next_page_offset {
                    Some(next) => offset = Some(next),
                    None => break,
                }
            }

            Ok(ids)
        })
    }

    fn delete(&self, ids: Vec<String>) -> BoxFuture<'_, Result<(), IndexError>> {
        Box::pin(async move {
            if ids.is_empty() {
                return Ok(());
            }
            let ids: Vec<PointId> = ids.into_iter().map(PointId::from).collect();
            self.client
                .delete_points(
                    DeletePointsBuilder::new(&self.collection).points(PointsIdsList { ids }),
                )
                .await
                .map_err(|e| IndexError::Delete(e.to_string()))?;
            Ok(())
        })
    }

    fn count(&self) -> BoxFuture<'_, Result<u64, IndexError>> {
        Box::pin(async move {
            let response = self
                .client
                .count(CountPointsBuilder::new(&self.collection).exact(true))
                .await
                .map_err(|e| IndexError::Count(e.to_string()))?;
            Ok(response.result.map_or(0, |r| r.count))
        })
    }
}
