use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::error::{CoreError, CoreResult};

pub const DEFAULT_TARGET_CHARS: usize = 800;
pub const DEFAULT_OVERLAP_CHARS: usize = 160;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChunkingConfig {
    pub target_chars: usize,
    pub overlap_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            target_chars: DEFAULT_TARGET_CHARS,
            overlap_chars: DEFAULT_OVERLAP_CHARS,
        }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if self.target_chars == 0 {
            return Err(CoreError::InvalidArgument(
                "chunk target size must be positive".to_string(),
            ));
        }
        if self.overlap_chars >= self.target_chars {
            return Err(CoreError::InvalidArgument(format!(
                "chunk overlap ({}) must be smaller than the target size ({})",
                self.overlap_chars, self.target_chars
            )));
        }
        Ok(())
    }
}

pub(super) fn heading_pattern() -> CoreResult<&'static Regex> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    if let Some(pattern) = PATTERN.get() {
        return Ok(pattern);
    }
    let compiled = Regex::new(r"(?m)^## \S.*$")?;
    Ok(PATTERN.get_or_init(|| compiled))
}

/// Splits markdown on level-2 headings. Each heading stays with the text below it;
/// text before the first heading is its own section.
pub fn split_sections(text: &str) -> CoreResult<Vec<String>> {
    let mut bounds = vec![0];
    bounds.extend(
        heading_pattern()?
            .find_iter(text)
            .map(|found| found.start())
            .filter(|start| *start > 0),
    );
    bounds.push(text.len());

    Ok(bounds
        .windows(2)
        .map(|pair| text[pair[0]..pair[1]].trim())
        .filter(|section| !section.is_empty())
        .map(str::to_string)
        .collect())
}

/// Section split followed by size-bounded windows that overlap on word boundaries.
pub fn chunk_document(text: &str, config: &ChunkingConfig) -> CoreResult<Vec<String>> {
    Ok(split_sections(text)?
        .into_iter()
        .flat_map(|section| window_section(&section, config))
        .collect())
}

fn window_section(section: &str, config: &ChunkingConfig) -> Vec<String> {
    let words = section.split_whitespace().collect::<Vec<&str>>();
    if words.is_empty() {
        return Vec::new();
    }

    if section.chars().count() <= config.target_chars {
        return vec![section.to_string()];
    }

    let mut windows = Vec::new();
    let mut start = 0usize;
    loop {
        let mut end = start;
        let mut length = 0usize;
        while end < words.len() {
            let added = words[end].chars().count() + usize::from(end > start);
            if end > start && length + added > config.target_chars {
                break;
            }
            length += added;
            end += 1;
        }

        windows.push(words[start..end].join(" "));
        if end >= words.len() {
            break;
        }

        let mut next_start = end;
        let mut overlap = 0usize;
        while next_start > start + 1 {
            let added = words[next_start - 1].chars().count() + 1;
            if overlap + added > config.overlap_chars {
                break;
            }
            overlap += added;
            next_start -= 1;
        }
        start = next_start;
    }

    windows
}
