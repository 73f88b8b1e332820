//! Documentation retrieval: chunk the corpus, embed every chunk once, answer
//! queries by cosine similarity against the stored vectors.

mod chunking;
mod corpus;
mod index;
mod prompt;
mod retriever;
mod store;
#[cfg(test)]
mod tests;

use serde::Serialize;

use crate::semantic::EmbeddingModelConfig;

pub use chunking::{ChunkingConfig, chunk_document};
pub use corpus::load_corpus_dir;
pub use index::build_index;
pub use prompt::{DEFAULT_CONCISENESS, build_chat_prompt};
pub use retriever::query;
pub use store::{
    INDEX_DB_SCHEMA_VERSION, IndexBuildManifest, load_index, save_index, store_counts,
    write_model_lock,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusDocument {
    pub source_id: String,
    pub text: String,
}

impl CorpusDocument {
    pub fn new(source_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentChunk {
    pub chunk_id: String,
    pub source_id: String,
    pub ordinal: usize,
    pub text: String,
    pub text_hash: String,
    #[serde(skip)]
    pub embedding: Vec<f32>,
}

/// Chunks in insertion order plus the embedding model that produced their vectors.
#[derive(Debug, Clone)]
pub struct DocumentIndex {
    model: EmbeddingModelConfig,
    chunks: Vec<DocumentChunk>,
    built_at: String,
}

impl DocumentIndex {
    pub(crate) fn from_parts(
        model: EmbeddingModelConfig,
        chunks: Vec<DocumentChunk>,
        built_at: String,
    ) -> Self {
        Self {
            model,
            chunks,
            built_at,
        }
    }

    pub fn model(&self) -> &EmbeddingModelConfig {
        &self.model
    }

    pub fn chunks(&self) -> &[DocumentChunk] {
        &self.chunks
    }

    pub fn built_at(&self) -> &str {
        &self.built_at
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn source_count(&self) -> usize {
        let mut sources = self
            .chunks
            .iter()
            .map(|chunk| chunk.source_id.as_str())
            .collect::<Vec<&str>>();
        sources.dedup();
        sources.len()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RetrievalHit<'a> {
    pub rank: usize,
    pub similarity: f64,
    pub chunk: &'a DocumentChunk,
}

#[derive(Debug, Clone, Serialize)]
pub struct RetrievalResult<'a> {
    pub model_id: String,
    pub hits: Vec<RetrievalHit<'a>>,
}

impl RetrievalResult<'_> {
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }
}
