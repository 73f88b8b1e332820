use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{CoreError, CoreResult};

pub const DEFAULT_MODEL_ID: &str = "local-hash-v1";
pub const DEFAULT_MODEL_NAME: &str = "token-hash-with-concepts";
pub const DEFAULT_EMBEDDING_DIM: usize = 384;
pub const DEFAULT_NORMALIZATION: &str = "l2";
pub const DEFAULT_BACKEND: &str = "local-hash";

const CONCEPT_WEIGHT: f32 = 3.0;

const STOPWORDS: &[&str] = &[
    "a", "about", "an", "and", "are", "as", "at", "be", "by", "can", "do", "does", "for", "from",
    "how", "i", "in", "is", "it", "its", "me", "my", "of", "on", "or", "the", "this", "to", "we",
    "what", "when", "which", "with", "you", "your",
];

/// Related surface terms folded onto one shared feature so paraphrases land near each other.
const CONCEPTS: &[(&str, &[&str])] = &[
    (
        "cost",
        &[
            "afford", "affordable", "billing", "budget", "cheap", "cheaper", "cost", "costs",
            "dollar", "dollars", "expensive", "fee", "fees", "paid", "pay", "plan", "plans",
            "price", "priced", "prices", "pricing", "subscription", "subscriptions",
        ],
    ),
    (
        "ranking",
        &[
            "arena", "best", "elo", "leaderboard", "rank", "ranked", "ranking", "rankings",
            "rating", "score", "scores", "top", "vote", "votes",
        ],
    ),
    (
        "data",
        &["data", "dataset", "datasets", "source", "sources", "csv", "lmarena", "lmsys"],
    ),
    (
        "recommend",
        &[
            "choose", "pick", "recommend", "recommendation", "recommendations", "recommended",
            "select", "suggest", "suggestion",
        ],
    ),
    (
        "privacy",
        &["confidential", "data-protection", "personal", "privacy", "private", "security"],
    ),
    (
        "image",
        &["image", "images", "photo", "photos", "picture", "pictures", "visual", "vision"],
    ),
    (
        "code",
        &["code", "coding", "debug", "debugging", "developer", "programming", "webdev"],
    ),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingModelConfig {
    pub model_id: String,
    pub model_name: String,
    pub dimensions: usize,
    pub normalization: String,
    pub backend: String,
}

impl EmbeddingModelConfig {
    pub fn fingerprint(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}",
            self.model_id, self.model_name, self.dimensions, self.normalization, self.backend
        )
    }
}

pub fn resolve_model_config(model_id: &str) -> EmbeddingModelConfig {
    let trimmed = model_id.trim();
    let resolved_id = if trimmed.is_empty() {
        DEFAULT_MODEL_ID
    } else {
        trimmed
    };

    let model_name = if resolved_id == DEFAULT_MODEL_ID {
        DEFAULT_MODEL_NAME
    } else {
        resolved_id
    };

    EmbeddingModelConfig {
        model_id: resolved_id.to_string(),
        model_name: model_name.to_string(),
        dimensions: DEFAULT_EMBEDDING_DIM,
        normalization: DEFAULT_NORMALIZATION.to_string(),
        backend: DEFAULT_BACKEND.to_string(),
    }
}

/// Produces one vector per text. Index build and query must go through the same model.
pub trait EmbeddingProvider: Send + Sync {
    fn model(&self) -> &EmbeddingModelConfig;

    fn embed(&self, text: &str) -> CoreResult<Vec<f32>>;
}

#[derive(Debug, Clone)]
pub struct LocalHashEmbedder {
    model: EmbeddingModelConfig,
}

impl LocalHashEmbedder {
    pub fn new(model: EmbeddingModelConfig) -> Self {
        Self { model }
    }
}

impl Default for LocalHashEmbedder {
    fn default() -> Self {
        Self::new(resolve_model_config(DEFAULT_MODEL_ID))
    }
}

impl EmbeddingProvider for LocalHashEmbedder {
    fn model(&self) -> &EmbeddingModelConfig {
        &self.model
    }

    fn embed(&self, text: &str) -> CoreResult<Vec<f32>> {
        if self.model.dimensions == 0 {
            return Err(CoreError::Embedding(format!(
                "model '{}' has zero dimensions",
                self.model.model_id
            )));
        }
        Ok(embed_text_local(text, self.model.dimensions))
    }
}

pub fn normalize_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<&str>>().join(" ")
}

pub fn embed_text_local(payload: &str, dimensions: usize) -> Vec<f32> {
    let dims = dimensions.max(8);
    let mut vector = vec![0_f32; dims];
    let features = tokenize_payload(payload);

    if features.is_empty() {
        return vector;
    }

    for (feature, boost) in features {
        let hash = stable_hash(&feature);
        let index = (hash as usize) % dims;
        let sign = if (hash >> 63) & 1 == 0 { 1.0 } else { -1.0 };
        let weight = 1.0 + (((hash >> 48) & 0xFF) as f32 / 255.0);
        vector[index] += sign * weight * boost;
    }

    normalize_vector(&mut vector);
    vector
}

pub fn cosine_similarity(left: &[f32], right: &[f32]) -> f64 {
    if left.len() != right.len() || left.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0_f64;
    let mut left_norm = 0.0_f64;
    let mut right_norm = 0.0_f64;
    for (left_value, right_value) in left.iter().zip(right.iter()) {
        let (l, r) = (f64::from(*left_value), f64::from(*right_value));
        dot += l * r;
        left_norm += l * l;
        right_norm += r * r;
    }

    if left_norm <= 0.0 || right_norm <= 0.0 {
        return 0.0;
    }

    dot / (left_norm.sqrt() * right_norm.sqrt())
}

pub fn encode_embedding_blob(values: &[f32]) -> Vec<u8> {
    let mut out = Vec::<u8>::with_capacity(values.len() * 4);
    for value in values {
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

pub fn decode_embedding_blob(blob: &[u8], expected_dim: usize) -> Option<Vec<f32>> {
    if expected_dim == 0 || blob.len() != expected_dim.saturating_mul(4) {
        return None;
    }

    let out = blob
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect::<Vec<f32>>();

    (out.len() == expected_dim).then_some(out)
}

/// Stable across builds: first eight bytes of the SHA-256 digest.
fn stable_hash(value: &str) -> u64 {
    let digest = Sha256::digest(value.as_bytes());
    let mut prefix = [0_u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(prefix)
}

fn concept_for(word: &str) -> Option<&'static str> {
    CONCEPTS
        .iter()
        .find(|(_, members)| members.contains(&word))
        .map(|(concept, _)| *concept)
}

fn tokenize_payload(payload: &str) -> Vec<(String, f32)> {
    let normalized = normalize_whitespace(payload);
    if normalized.is_empty() {
        return Vec::new();
    }

    let words = normalized
        .split(' ')
        .map(|value| {
            value
                .chars()
                .filter(|character| character.is_ascii_alphanumeric() || *character == '-')
                .collect::<String>()
                .trim_matches('-')
                .to_ascii_lowercase()
        })
        .filter(|value| !value.is_empty())
        .filter(|value| !STOPWORDS.contains(&value.as_str()))
        .collect::<Vec<String>>();

    let mut features = Vec::<(String, f32)>::with_capacity(words.len() * 3);
    for (index, word) in words.iter().enumerate() {
        features.push((format!("w:{word}"), 1.0));
        if let Some(concept) = concept_for(word) {
            features.push((format!("c:{concept}"), CONCEPT_WEIGHT));
        }
        if let Some(next) = words.get(index + 1) {
            features.push((format!("b:{word}_{next}"), 1.0));
        }
    }
    features
}

fn normalize_vector(values: &mut [f32]) {
    let squared_norm = values
        .iter()
        .map(|value| f64::from(*value) * f64::from(*value))
        .sum::<f64>();

    if squared_norm <= 0.0 {
        return;
    }

    let norm = squared_norm.sqrt() as f32;
    if norm == 0.0 {
        return;
    }

    for value in values {
        *value /= norm;
    }
}
