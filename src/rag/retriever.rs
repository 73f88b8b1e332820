use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::semantic::{EmbeddingProvider, cosine_similarity};

use super::{DocumentIndex, RetrievalHit, RetrievalResult};

/// Top-`k` chunks by cosine similarity; equal similarities keep insertion order.
pub fn query<'a>(
    index: &'a DocumentIndex,
    provider: &dyn EmbeddingProvider,
    query_text: &str,
    k: usize,
) -> CoreResult<RetrievalResult<'a>> {
    if k == 0 {
        return Err(CoreError::InvalidArgument(
            "k must be a positive integer".to_string(),
        ));
    }

    let index_model = index.model();
    let query_model = provider.model();
    if index_model.model_id != query_model.model_id
        || index_model.dimensions != query_model.dimensions
    {
        return Err(CoreError::EmbeddingModelMismatch {
            index_model: index_model.model_id.clone(),
            index_dim: index_model.dimensions,
            query_model: query_model.model_id.clone(),
            query_dim: query_model.dimensions,
        });
    }

    let query_embedding = provider.embed(query_text)?;

    let mut scored = index
        .chunks()
        .iter()
        .enumerate()
        .map(|(position, chunk)| {
            (
                position,
                cosine_similarity(&query_embedding, &chunk.embedding),
                chunk,
            )
        })
        .collect::<Vec<_>>();

    scored.sort_by(|(left_position, left_score, _), (right_position, right_score, _)| {
        right_score
            .total_cmp(left_score)
            .then(left_position.cmp(right_position))
    });
    scored.truncate(k);

    debug!(
        model_id = %index_model.model_id,
        k,
        returned = scored.len(),
        top_similarity = scored.first().map(|(_, score, _)| *score).unwrap_or_default(),
        "retrieval completed"
    );

    Ok(RetrievalResult {
        model_id: index_model.model_id.clone(),
        hits: scored
            .into_iter()
            .enumerate()
            .map(|(rank, (_, similarity, chunk))| RetrievalHit {
                rank: rank + 1,
                similarity,
                chunk,
            })
            .collect(),
    })
}
