use super::RetrievalResult;

pub const DEFAULT_CONCISENESS: &str = "Answer user questions in a conversational, concise way (2-3 sentences max). Be helpful and warm, but keep responses brief and to the point.";

const SYSTEM_INSTRUCTION: &str = "You are a friendly assistant for PickLLM, a platform that helps users discover and compare large language models.";

/// Instruction, then delimited context, then the user's question. The context section
/// is always present, including when retrieval found nothing.
pub fn build_chat_prompt(query_text: &str, result: &RetrievalResult<'_>, conciseness: &str) -> String {
    let mut prompt = String::new();

    prompt.push_str(SYSTEM_INSTRUCTION);
    prompt.push('\n');
    let conciseness = conciseness.trim();
    if !conciseness.is_empty() {
        prompt.push_str(conciseness);
        prompt.push('\n');
    }

    prompt.push_str("\nRelevant context from PickLLM documentation:\n");
    if result.is_empty() {
        prompt.push_str("[no relevant documentation was found for this question]\n");
    } else {
        for hit in &result.hits {
            prompt.push_str(&format!(
                "<<< context {} | source: {} >>>\n{}\n<<< end context {} >>>\n",
                hit.rank,
                hit.chunk.source_id,
                hit.chunk.text.trim(),
                hit.rank
            ));
        }
    }

    prompt.push_str(&format!("\nQuestion: {}\n", query_text.trim()));

    prompt.push_str("\nInstructions:\n- Answer directly and concisely.\n");
    if result.is_empty() {
        prompt.push_str(
            "- No documentation matched this question: say politely that you don't have relevant information about it.\n",
        );
    } else {
        prompt.push_str("- Use the context provided to give accurate information.\n");
        prompt.push_str(
            "- If the context doesn't contain the answer, politely say you don't have that specific information.\n",
        );
    }
    prompt.push_str("- Keep your response under 3 sentences when possible.");

    prompt
}
