//! Prompt assembly for grounded answering.

use serde::{Deserialize, Serialize};

use sage_memory::ScoredChunk;

/// Instructions prepended to every answer prompt. The model is told to stay
/// inside the retrieved context rather than answer from its own weights.
pub const SYSTEM_PROMPT: &str = "You are an AI tutor helping students study from their own materials.

Your role is to:
- Explain concepts clearly and step-by-step
- Use simple language that students can understand
- Provide examples to illustrate concepts
- Break down complex topics into manageable parts
- Be encouraging and supportive

IMPORTANT RULES:
- Only answer using the provided document context
- If the answer is not in the documents, clearly say \"I don't have information about that in the uploaded documents\"
- Do not make up information or use external knowledge
- Always cite which document or section your answer comes from
- If you're unsure, express that uncertainty

Be patient, clear, and helpful. Your goal is to help students learn and understand.";

/// One prior exchange in a conversation, as supplied by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub role: String,
    pub content: String,
}

/// Builds the full generation prompt: system instructions, retrieved chunks
/// tagged with their source document, the last three history turns, and the
/// question itself.
#[must_use]
pub fn build_answer_prompt(
    question: &str,
    chunks: &[ScoredChunk],
    history: &[HistoryTurn],
) -> String {
    let context_text = chunks
        .iter()
        .map(|c| format!("[Document: {}]\n{}", c.metadata.filename, c.text))
        .collect::<Vec<_>>()
        .join("\n\n");

    let mut history_text = String::new();
    if !history.is_empty() {
        history_text.push_str("\n\nPrevious conversation:\n");
        let skip = history.len().saturating_sub(3);
        for turn in &history[skip..] {
            history_text.push_str(&capitalize(&turn.role));
            history_text.push_str(": ");
            history_text.push_str(&turn.content);
            history_text.push('\n');
        }
    }

    format!(
        "{SYSTEM_PROMPT}\n\nDOCUMENT CONTEXT:\n{context_text}\n{history_text}\n\nSTUDENT QUESTION:\n{question}\n\nANSWER:\n"
    )
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use sage_memory::ChunkMetadata;

    use super::*;

    fn chunk(filename: &str, text: &str) -> ScoredChunk {
        ScoredChunk {
            id: "id".into(),
            text: text.into(),
            metadata: ChunkMetadata {
                document_id: "doc".into(),
                filename: filename.into(),
                chunk_index: 0,
                total_chunks: 1,
                source: "src".into(),
            },
            distance: 0.1,
        }
    }

    #[test]
    fn prompt_tags_chunks_with_their_document() {
        let chunks = vec![chunk("bio.pdf", "Cells divide."), chunk("chem.pdf", "Atoms bond.")];
        let prompt = build_answer_prompt("How do cells divide?", &chunks, &[]);

        assert!(prompt.starts_with(SYSTEM_PROMPT));
        assert!(prompt.contains("[Document: bio.pdf]\nCells divide."));
        assert!(prompt.contains("[Document: chem.pdf]\nAtoms bond."));
        assert!(prompt.contains("STUDENT QUESTION:\nHow do cells divide?"));
        assert!(prompt.ends_with("ANSWER:\n"));
        assert!(!prompt.contains("Previous conversation"));
    }

    #[test]
    fn history_is_capped_at_last_three_turns() {
        let history: Vec<HistoryTurn> = (0..5)
            .map(|i| HistoryTurn {
                role: if i % 2 == 0 { "user".into() } else { "assistant".into() },
                content: format!("turn {i}"),
            })
            .collect();
        let prompt = build_answer_prompt("q", &[chunk("a.pdf", "t")], &history);

        assert!(prompt.contains("Previous conversation:"));
        assert!(!prompt.contains("turn 0"));
        assert!(!prompt.contains("turn 1"));
        assert!(prompt.contains("User: turn 2"));
        assert!(prompt.contains("Assistant: turn 3"));
        assert!(prompt.contains("User: turn 4"));
    }
}
