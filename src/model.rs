use std::collections::{BTreeMap, BTreeSet};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Modality {
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "vision")]
    Vision,
    #[serde(rename = "image")]
    Image,
    #[serde(rename = "image-edit")]
    ImageEdit,
    #[serde(rename = "webdev")]
    WebDev,
}

impl Modality {
    pub const ALL: [Modality; 5] = [
        Self::Text,
        Self::Vision,
        Self::Image,
        Self::ImageEdit,
        Self::WebDev,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Vision => "vision",
            Self::Image => "image",
            Self::ImageEdit => "image-edit",
            Self::WebDev => "webdev",
        }
    }

    /// Leaderboard file holding this modality's arena table.
    pub fn leaderboard_file(self) -> String {
        format!("lmarena_{}.csv", self.as_str())
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Vision => "image understanding",
            Self::Image => "image generation",
            Self::ImageEdit => "image editing",
            Self::WebDev => "web development",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum License {
    OpenWeight,
    Proprietary,
}

impl License {
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("proprietary") {
            Self::Proprietary
        } else {
            Self::OpenWeight
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::OpenWeight => "Open weights",
            Self::Proprietary => "Proprietary",
        }
    }
}

/// Listed price for a model. `Usd` is the summed prompt, completion and image price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "usd", rename_all = "snake_case")]
pub enum Pricing {
    Free,
    Usd(f64),
    Unknown,
}

impl Pricing {
    pub fn describe(self) -> String {
        match self {
            Self::Free => "free (open weights)".to_string(),
            Self::Usd(value) => format!("${value}"),
            Self::Unknown => "unknown".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Vision,
    ImageGeneration,
    ImageEditing,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub supports_vision: bool,
    pub supports_image_gen: bool,
    pub supports_image_edit: bool,
}

impl Capabilities {
    pub fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::Vision => self.supports_vision,
            Capability::ImageGeneration => self.supports_image_gen,
            Capability::ImageEditing => self.supports_image_edit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaScore {
    pub score: f64,
    pub confidence_interval: Option<String>,
    pub votes: u64,
}

/// One leaderboard entry, merged across every modality table it appears in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub name: String,
    pub organization: String,
    pub license: License,
    pub scores: BTreeMap<Modality, ArenaScore>,
    pub votes: u64,
    pub knowledge_cutoff: Option<String>,
    pub pricing: Pricing,
    pub url: Option<String>,
    pub capabilities: Capabilities,
}

impl ModelRecord {
    pub fn score(&self, modality: Modality) -> Option<f64> {
        self.scores.get(&modality).map(|value| value.score)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum UseCase {
    ConversationalKnowledge,
    ProductivityInformation,
    CreativeContent,
    TechnicalDeveloper,
    AdvancedAutomation,
    VisualAi,
}

impl UseCase {
    pub const ALL: [UseCase; 6] = [
        Self::ConversationalKnowledge,
        Self::ProductivityInformation,
        Self::CreativeContent,
        Self::TechnicalDeveloper,
        Self::AdvancedAutomation,
        Self::VisualAi,
    ];

    pub fn token(self) -> &'static str {
        match self {
            Self::ConversationalKnowledge => "conversational_knowledge",
            Self::ProductivityInformation => "productivity_information",
            Self::CreativeContent => "creative_content",
            Self::TechnicalDeveloper => "technical_developer",
            Self::AdvancedAutomation => "advanced_automation",
            Self::VisualAi => "visual_ai",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|value| value.token() == token)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::ConversationalKnowledge => "Conversational & Knowledge",
            Self::ProductivityInformation => "Productivity & Information",
            Self::CreativeContent => "Creative Content",
            Self::TechnicalDeveloper => "Technical & Developer",
            Self::AdvancedAutomation => "Advanced Automation",
            Self::VisualAi => "Visual AI",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::ConversationalKnowledge => {
                "Chatbots, Q&A, virtual assistants, customer support, knowledge retrieval"
            }
            Self::ProductivityInformation => {
                "Document processing, summarization, email drafting, data organization"
            }
            Self::CreativeContent => {
                "Writing, marketing copy, social media content, story generation"
            }
            Self::TechnicalDeveloper => {
                "Code generation, debugging, technical docs, programming help"
            }
            Self::AdvancedAutomation => {
                "Multi-step workflows, agent orchestration, API integration"
            }
            Self::VisualAi => "Image understanding/generation/editing, visual content creation",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum VisualAiType {
    ImageUnderstanding,
    ImageGeneration,
    ImageEditing,
}

impl VisualAiType {
    pub fn label(self) -> &'static str {
        match self {
            Self::ImageUnderstanding => "Image Understanding",
            Self::ImageGeneration => "Image Generation",
            Self::ImageEditing => "Image Editing",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ModelTypePreference {
    OpenOnly,
    ProprietaryOnlyEnterprise,
    #[default]
    NoPreference,
}

impl ModelTypePreference {
    pub fn label(self) -> &'static str {
        match self {
            Self::OpenOnly => "Open-weight models only",
            Self::ProprietaryOnlyEnterprise => "Proprietary/Enterprise models only",
            Self::NoPreference => "No preference on model type",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    #[default]
    BetterPerformance,
    LowerCost,
}

impl Priority {
    pub fn label(self) -> &'static str {
        match self {
            Self::BetterPerformance => "Better performance",
            Self::LowerCost => "Lower cost",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionnaireResponse {
    pub use_case: UseCase,
    #[serde(default)]
    pub visual_ai_type: Option<VisualAiType>,
    #[serde(default)]
    pub model_type: ModelTypePreference,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseConstraint {
    Any,
    OpenOnly,
    ProprietaryOnly,
}

impl LicenseConstraint {
    pub fn allows(self, license: License) -> bool {
        match self {
            Self::Any => true,
            Self::OpenOnly => license == License::OpenWeight,
            Self::ProprietaryOnly => license == License::Proprietary,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySpec {
    pub modalities: BTreeSet<Modality>,
    pub required_capabilities: BTreeSet<Capability>,
    pub license: LicenseConstraint,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedCandidate {
    pub rank: usize,
    pub score: f64,
    pub perf_norm: f64,
    pub cost_norm: f64,
    pub record: ModelRecord,
}

/// Outcome of one recommendation request. `NoMatch` is a valid answer, not a failure.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Recommendation {
    Ranked { candidates: Vec<RankedCandidate> },
    NoMatch { category: CategorySpec },
}
