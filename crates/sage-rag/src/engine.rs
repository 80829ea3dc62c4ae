//! Retrieval-grounded answering.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use sage_llm::{GenerateOptions, ModelClient};
use sage_memory::{ScoredChunk, VectorIndex};

use crate::error::RagError;
use crate::prompts::{HistoryTurn, build_answer_prompt};

/// Returned verbatim when a question arrives before any document was indexed.
pub const NO_DOCUMENTS_ANSWER: &str = "I don't have any documents uploaded yet. \
    Please upload some study materials first so I can help answer your questions.";

const PREVIEW_CHARS: usize = 200;

/// How well the retrieved context supported the answer, judged from the
/// average relevance of the cited chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    None,
    Low,
    Medium,
    High,
}

impl Confidence {
    #[must_use]
    pub fn from_avg_relevance(avg: f64) -> Self {
        if avg > 0.7 {
            Self::High
        } else if avg > 0.4 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// One cited chunk in an answer.
#[derive(Debug, Clone, Serialize)]
pub struct SourceRef {
    pub filename: String,
    pub chunk_index: usize,
    pub relevance_score: f64,
    pub preview: String,
}

/// A generated answer with its supporting sources.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<SourceRef>,
    pub confidence: Confidence,
}

/// One search result when retrieving without generation.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub text: String,
    pub filename: String,
    pub chunk_index: usize,
    pub relevance_score: f64,
}

/// Answers questions against the indexed corpus.
pub struct AnswerEngine {
    model: Arc<dyn ModelClient>,
    index: Arc<dyn VectorIndex>,
    options: GenerateOptions,
}

impl AnswerEngine {
    #[must_use]
    pub fn new(
        model: Arc<dyn ModelClient>,
        index: Arc<dyn VectorIndex>,
        options: GenerateOptions,
    ) -> Self {
        Self {
            model,
            index,
            options,
        }
    }

    /// Embeds the question, retrieves the `max_sources` closest chunks, and
    /// generates an answer grounded in them.
    ///
    /// When nothing is retrieved the engine returns [`NO_DOCUMENTS_ANSWER`]
    /// without calling the generation model at all.
    pub async fn answer(
        &self,
        question: &str,
        history: &[HistoryTurn],
        max_sources: usize,
    ) -> Result<Answer, RagError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(RagError::validation("question must not be empty"));
        }

        debug!(max_sources, "embedding question");
        let vector = self.model.embed(question).await?;
        let chunks = self.index.query(vector, max_sources).await?;

        if chunks.is_empty() {
            return Ok(Answer {
                answer: NO_DOCUMENTS_ANSWER.to_string(),
                sources: Vec::new(),
                confidence: Confidence::None,
            });
        }

        let prompt = build_answer_prompt(question, &chunks, history);
        let answer = self.model.generate(&prompt, self.options).await?;

        let sources: Vec<SourceRef> = chunks
            .iter()
            .map(|c| SourceRef {
                filename: c.metadata.filename.clone(),
                chunk_index: c.metadata.chunk_index,
                relevance_score: relevance(c),
                preview: preview(&c.text),
            })
            .collect();
        let avg = sources.iter().map(|s| s.relevance_score).sum::<f64>() / sources.len() as f64;
        let confidence = Confidence::from_avg_relevance(avg);
        info!(sources = sources.len(), ?confidence, "answer generated");

        Ok(Answer {
            answer,
            sources,
            confidence,
        })
    }

    /// Retrieval without generation, for exploring the corpus directly.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, RagError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(RagError::validation("query must not be empty"));
        }

        let vector = self.model.embed(query).await?;
        let chunks = self.index.query(vector, limit).await?;
        Ok(chunks
            .into_iter()
            .map(|c| SearchHit {
                relevance_score: relevance(&c),
                filename: c.metadata.filename,
                chunk_index: c.metadata.chunk_index,
                text: c.text,
            })
            .collect())
    }
}

/// Similarity rounded to two decimals. Distances are already clamped to
/// [0, 1], so this lands in [0, 1] too.
fn relevance(chunk: &ScoredChunk) -> f64 {
    (f64::from(1.0 - chunk.distance) * 100.0).round() / 100.0
}

fn preview(text: &str) -> String {
    if text.chars().count() > PREVIEW_CHARS {
        let cut: String = text.chars().take(PREVIEW_CHARS).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}
