use thiserror::Error;

pub type CoreResult<T> = std::result::Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("failed to load catalog from {source_name}: {reason}")]
    DataLoad { source_name: String, reason: String },

    #[error("questionnaire is missing required field `{field}`")]
    IncompleteResponse { field: &'static str },

    #[error("embedding provider failed: {0}")]
    Embedding(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("failed to compile pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error(
        "embedding model mismatch: index built with '{index_model}' ({index_dim} dims), query uses '{query_model}' ({query_dim} dims)"
    )]
    EmbeddingModelMismatch {
        index_model: String,
        index_dim: usize,
        query_model: String,
        query_dim: usize,
    },
}

impl CoreError {
    pub fn data_load(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DataLoad {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }
}
