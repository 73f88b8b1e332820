use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::model::{ModelTypePreference, Priority, UseCase, VisualAiType};
use crate::rag::DEFAULT_CONCISENESS;
use crate::recommend::UnknownPricePolicy;

#[derive(Parser, Debug)]
#[command(
    name = "pickllm",
    version,
    about = "Leaderboard-driven LLM recommendations and documentation retrieval"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Recommend(RecommendArgs),
    Classify(ClassifyArgs),
    Index(IndexArgs),
    Chat(ChatArgs),
    Status(StatusArgs),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum UnknownPriceMode {
    MostExpensive,
    Free,
}

impl From<UnknownPriceMode> for UnknownPricePolicy {
    fn from(value: UnknownPriceMode) -> Self {
        match value {
            UnknownPriceMode::MostExpensive => Self::AssumeMostExpensive,
            UnknownPriceMode::Free => Self::AssumeFree,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct RecommendArgs {
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Questionnaire answers as submitted by the form (JSON, snake_case tokens).
    #[arg(long, conflicts_with = "use_case")]
    pub answers: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub use_case: Option<UseCase>,

    #[arg(long, value_enum)]
    pub visual_ai_type: Option<VisualAiType>,

    #[arg(long, value_enum, default_value_t = ModelTypePreference::NoPreference)]
    pub model_type: ModelTypePreference,

    #[arg(long, value_enum, default_value_t = Priority::BetterPerformance)]
    pub priority: Priority,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long, default_value_t = 0.6)]
    pub cost_blend_perf_weight: f64,

    #[arg(long, default_value_t = 0.4)]
    pub cost_blend_cost_weight: f64,

    #[arg(long, value_enum, default_value_t = UnknownPriceMode::MostExpensive)]
    pub unknown_price: UnknownPriceMode,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ClassifyArgs {
    #[arg(long, required_unless_present = "response")]
    pub description: Option<String>,

    /// Raw completion text to map back onto a use case.
    #[arg(long, conflicts_with = "description")]
    pub response: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct IndexArgs {
    #[arg(long, default_value = "docs")]
    pub docs_dir: PathBuf,

    #[arg(long, default_value = ".cache/pickllm")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long, default_value = "local-hash-v1")]
    pub model_id: String,

    #[arg(long, default_value_t = 800)]
    pub chunk_chars: usize,

    #[arg(long, default_value_t = 160)]
    pub chunk_overlap: usize,

    #[arg(long)]
    pub model_lock_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ChatArgs {
    #[arg(long, default_value = ".cache/pickllm")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long, default_value = "local-hash-v1")]
    pub model_id: String,

    #[arg(long)]
    pub query: String,

    #[arg(short = 'k', long, default_value_t = 2)]
    pub k: usize,

    #[arg(long, default_value = DEFAULT_CONCISENESS)]
    pub conciseness: String,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    #[arg(long, default_value = ".cache/pickllm")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}

pub fn index_db_path(cache_root: &std::path::Path, db_path: Option<&PathBuf>) -> PathBuf {
    db_path
        .cloned()
        .unwrap_or_else(|| cache_root.join("pickllm_index.sqlite"))
}
