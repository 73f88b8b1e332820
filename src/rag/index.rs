use std::time::Instant;

use tracing::{debug, info};

use crate::error::{CoreError, CoreResult};
use crate::semantic::EmbeddingProvider;
use crate::util::{now_utc_string, sha256_hex};

use super::{ChunkingConfig, CorpusDocument, DocumentChunk, DocumentIndex, chunk_document};

/// Chunks and embeds the whole corpus. Any provider failure discards the partial work.
pub fn build_index(
    corpus: &[CorpusDocument],
    provider: &dyn EmbeddingProvider,
    chunking: &ChunkingConfig,
) -> CoreResult<DocumentIndex> {
    chunking.validate()?;
    let model = provider.model().clone();
    let started = Instant::now();

    let mut chunks = Vec::<DocumentChunk>::new();
    for document in corpus {
        let pieces = chunk_document(&document.text, chunking)?;
        debug!(source = %document.source_id, chunks = pieces.len(), "document chunked");

        for (ordinal, text) in pieces.into_iter().enumerate() {
            let embedding = provider.embed(&text).map_err(|err| match err {
                CoreError::Embedding(reason) => CoreError::Embedding(format!(
                    "{}#{ordinal}: {reason}",
                    document.source_id
                )),
                other => other,
            })?;
            if embedding.len() != model.dimensions {
                return Err(CoreError::Embedding(format!(
                    "{}#{ordinal}: provider returned {} dims, model '{}' declares {}",
                    document.source_id,
                    embedding.len(),
                    model.model_id,
                    model.dimensions
                )));
            }

            chunks.push(DocumentChunk {
                chunk_id: format!("{}#{ordinal}", document.source_id),
                source_id: document.source_id.clone(),
                ordinal,
                text_hash: sha256_hex(&text),
                text,
                embedding,
            });
        }
    }

    info!(
        model_id = %model.model_id,
        sources = corpus.len(),
        chunks = chunks.len(),
        duration_ms = started.elapsed().as_millis() as u64,
        "document index built"
    );

    Ok(DocumentIndex::from_parts(model, chunks, now_utc_string()))
}
