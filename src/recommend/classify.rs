use std::sync::OnceLock;

use regex::Regex;

use crate::error::CoreResult;
use crate::model::UseCase;

pub(super) fn special_token_pattern() -> CoreResult<&'static Regex> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    if let Some(pattern) = PATTERN.get() {
        return Ok(pattern);
    }
    let compiled = Regex::new(r"<\|[^|>]*\|>|<｜[^｜>]*｜>")?;
    Ok(PATTERN.get_or_init(|| compiled))
}

pub fn build_classification_prompt(description: &str) -> String {
    let categories = UseCase::ALL
        .iter()
        .map(|use_case| format!("- {}: {}", use_case.token(), use_case.description()))
        .collect::<Vec<String>>()
        .join("\n");

    format!(
        "Classify this use case into exactly one category.\n\n\
Description: \"{}\"\n\n\
Categories:\n{categories}\n\n\
Return ONLY the category name, nothing else.",
        description.trim()
    )
}

/// Maps a completion's answer back onto a use case. Anything unrecognized is `None`.
pub fn parse_classification(raw: &str) -> CoreResult<Option<UseCase>> {
    let stripped = special_token_pattern()?.replace_all(raw, "");

    let token = stripped
        .trim()
        .trim_matches(|character: char| {
            character == '"' || character == '\'' || character == '`' || character == '.'
        })
        .trim()
        .to_ascii_lowercase()
        .replace(['-', ' '], "_");

    Ok(UseCase::from_token(&token))
}
