use crate::model::{QuestionnaireResponse, RankedCandidate};

pub const EXPLANATION_SYSTEM_MESSAGE: &str = "You are an AI assistant helping users understand LLM recommendations. Provide clear, concise explanations in 2-3 paragraphs.";

pub fn build_explanation_prompt(
    candidates: &[RankedCandidate],
    response: &QuestionnaireResponse,
) -> String {
    let mut prompt = String::new();

    prompt.push_str("A user is looking for LLM recommendations based on the following requirements:\n\n");
    prompt.push_str(&format!("**Use Case**: {}\n", response.use_case.label()));
    if let Some(visual_ai_type) = response.visual_ai_type {
        prompt.push_str(&format!("**Visual AI Type**: {}\n", visual_ai_type.label()));
    }
    prompt.push_str(&format!("**Model Preference**: {}\n", response.model_type.label()));
    prompt.push_str(&format!("**Priority**: {}\n", response.priority.label()));
    if let Some(description) = response
        .description
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
    {
        prompt.push_str(&format!("**In their own words**: \"{description}\"\n"));
    }

    prompt.push_str(&format!(
        "\nBased on their requirements, we recommended these top {} models from the LMArena leaderboard:\n\n",
        candidates.len()
    ));
    for candidate in candidates {
        let record = &candidate.record;
        let organization = if record.organization.is_empty() {
            "an unknown organization"
        } else {
            record.organization.as_str()
        };
        prompt.push_str(&format!(
            "{}. {} by {}\n   - License: {}\n   - Knowledge Cutoff: {}\n   - Pricing: {}\n",
            candidate.rank,
            record.name,
            organization,
            record.license.label(),
            record.knowledge_cutoff.as_deref().unwrap_or("N/A"),
            record.pricing.describe()
        ));
    }

    prompt.push_str(
        "
Please write a 3-paragraph explanation following this structure:

**Paragraph 1**: Summarize the user's needs in natural language, personalized to their use case and model preference.

**Paragraph 2**: Briefly introduce the recommended models by name and organization. Do not mention arena scores or vote counts; they are already shown in the result cards.

**Paragraph 3**: For each model, write 2-3 sentences on what makes it a good fit for this use case, as a bulleted list where each bullet starts with the model name in bold.

Keep the whole answer under 300 words, in a friendly and concise tone. Avoid repeating data already visible in the cards.",
    );

    prompt
}

/// Static explanation served when the completion call fails.
pub fn fallback_explanation(response: &QuestionnaireResponse) -> String {
    format!(
        "Based on your requirement for {}, we've selected the top-performing models from the LMArena leaderboard. These models have been tested through thousands of community evaluations, so they meet a high bar for real-world performance.\n\n\
The recommended models are ranked by how they compare head-to-head in blind tests, weighted by your priority ({}). Each has substantial community validation through voting.\n\n\
These rankings follow the latest leaderboard data, so the recommendations track current performance and community feedback.",
        response.use_case.label(),
        response.priority.label().to_ascii_lowercase(),
    )
}
