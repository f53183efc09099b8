//! In-memory document retriever keyed by conversation.

use super::chunker::TextChunker;
use async_trait::async_trait;
use council_application::ContextRetriever;
use council_domain::ContextDocument;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Errors raised while attaching a document
#[derive(Error, Debug)]
pub enum AttachError {
    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} contains no text")]
    Empty(String),
}

#[derive(Debug, Clone)]
struct Chunk {
    source: String,
    text: String,
    terms: HashSet<String>,
}

/// Ranks attached document chunks by term overlap with the query.
///
/// Score is the number of distinct shared terms divided by the geometric
/// mean of both term-set sizes, so long chunks do not win by size alone.
/// Chunks sharing no term with the query are never returned.
pub struct LocalDocumentRetriever {
    chunker: TextChunker,
    chunks: RwLock<HashMap<String, Vec<Chunk>>>,
}

impl LocalDocumentRetriever {
    pub fn new(chunker: TextChunker) -> Self {
        Self {
            chunker,
            chunks: RwLock::new(HashMap::new()),
        }
    }

    /// Chunk `text` and attach it to a conversation. Returns the chunk count.
    pub async fn add_document(
        &self,
        conversation_id: &str,
        source: &str,
        text: &str,
    ) -> Result<usize, AttachError> {
        let chunks: Vec<Chunk> = self
            .chunker
            .split(text)
            .into_iter()
            .map(|text| Chunk {
                source: source.to_string(),
                terms: terms(&text),
                text,
            })
            .collect();
        if chunks.is_empty() {
            return Err(AttachError::Empty(source.to_string()));
        }

        let count = chunks.len();
        self.chunks
            .write()
            .await
            .entry(conversation_id.to_string())
            .or_default()
            .extend(chunks);
        info!("Attached {} ({} chunks) to {}", source, count, conversation_id);
        Ok(count)
    }

    /// Read a UTF-8 text file and attach it under its file name.
    pub async fn add_file(&self, conversation_id: &str, path: &Path) -> Result<usize, AttachError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| AttachError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let text = String::from_utf8_lossy(&bytes);
        let source = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.add_document(conversation_id, &source, &text).await
    }

    /// Detach every chunk of `source`. Returns whether anything was removed.
    pub async fn remove_source(&self, conversation_id: &str, source: &str) -> bool {
        let mut all = self.chunks.write().await;
        let Some(chunks) = all.get_mut(conversation_id) else {
            return false;
        };
        let before = chunks.len();
        chunks.retain(|chunk| chunk.source != source);
        before != chunks.len()
    }

    /// Distinct sources attached to a conversation, in attach order.
    pub async fn sources(&self, conversation_id: &str) -> Vec<String> {
        let all = self.chunks.read().await;
        let mut seen = HashSet::new();
        all.get(conversation_id)
            .into_iter()
            .flatten()
            .filter(|chunk| seen.insert(chunk.source.clone()))
            .map(|chunk| chunk.source.clone())
            .collect()
    }
}

impl Default for LocalDocumentRetriever {
    fn default() -> Self {
        Self::new(TextChunker::default())
    }
}

#[async_trait]
impl ContextRetriever for LocalDocumentRetriever {
    async fn search(&self, conversation_id: &str, query: &str, k: usize) -> Vec<ContextDocument> {
        let query_terms = terms(query);
        if query_terms.is_empty() || k == 0 {
            return Vec::new();
        }

        let all = self.chunks.read().await;
        let Some(chunks) = all.get(conversation_id) else {
            return Vec::new();
        };

        let mut scored: Vec<(f32, &Chunk)> = chunks
            .iter()
            .filter_map(|chunk| {
                let shared = chunk.terms.intersection(&query_terms).count();
                if shared == 0 {
                    return None;
                }
                let norm = ((chunk.terms.len() * query_terms.len()) as f32).sqrt();
                Some((shared as f32 / norm, chunk))
            })
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(k);

        debug!(
            "Retrieved {} of {} chunks for {}",
            scored.len(),
            chunks.len(),
            conversation_id
        );

        scored
            .into_iter()
            .map(|(score, chunk)| {
                ContextDocument::new(chunk.source.clone(), chunk.text.clone()).with_score(score)
            })
            .collect()
    }
}

/// Lowercased alphanumeric words of two or more characters.
fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.chars().count() > 1)
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_best_matching_chunk_first() {
        let retriever = LocalDocumentRetriever::default();
        retriever
            .add_document("c1", "pets.md", "Cats purr and dogs bark.")
            .await
            .unwrap();
        retriever
            .add_document("c1", "rust.md", "Rust ownership rules prevent data races.")
            .await
            .unwrap();

        let docs = retriever.search("c1", "How does Rust ownership work?", 3).await;

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source, "rust.md");
        assert!(docs[0].score.unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_results_are_scoped_to_conversation() {
        let retriever = LocalDocumentRetriever::default();
        retriever
            .add_document("c1", "notes.md", "tokio runtime internals")
            .await
            .unwrap();

        assert!(retriever.search("c2", "tokio runtime", 3).await.is_empty());
        assert_eq!(retriever.search("c1", "tokio runtime", 3).await.len(), 1);
    }

    #[tokio::test]
    async fn test_top_k_limits_results() {
        let retriever = LocalDocumentRetriever::new(TextChunker::new(20, 0));
        let text = "council answer ".repeat(20);
        let count = retriever.add_document("c", "long.txt", &text).await.unwrap();
        assert!(count > 3);

        assert_eq!(retriever.search("c", "council", 3).await.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_document_is_rejected() {
        let retriever = LocalDocumentRetriever::default();
        assert!(matches!(
            retriever.add_document("c", "blank.md", "  \n").await,
            Err(AttachError::Empty(_))
        ));
    }

    #[tokio::test]
    async fn test_add_file_and_remove_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guide.md");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "Semaphores bound concurrency.").unwrap();

        let retriever = LocalDocumentRetriever::default();
        retriever.add_file("c", &path).await.unwrap();
        assert_eq!(retriever.sources("c").await, vec!["guide.md".to_string()]);

        assert!(retriever.remove_source("c", "guide.md").await);
        assert!(!retriever.remove_source("c", "guide.md").await);
        assert!(retriever.search("c", "semaphores", 3).await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let retriever = LocalDocumentRetriever::default();
        let result = retriever
            .add_file("c", Path::new("/definitely/not/here.md"))
            .await;
        assert!(matches!(result, Err(AttachError::Io { .. })));
    }
}
