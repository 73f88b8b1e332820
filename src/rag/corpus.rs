use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use super::CorpusDocument;

/// Collects every `.md`/`.mdx` file under `root`, sorted by relative path.
pub fn load_corpus_dir(root: &Path) -> Result<Vec<CorpusDocument>> {
    if !root.is_dir() {
        bail!("documentation directory not found: {}", root.display());
    }

    let mut paths = discover_documents(root)?;
    paths.sort();

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        let raw = fs::read(&path)
            .with_context(|| format!("failed to read document: {}", path.display()))?;
        let text = String::from_utf8_lossy(&raw);
        let body = strip_front_matter(&text);
        if body.trim().is_empty() {
            warn!(path = %path.display(), "skipping empty document");
            continue;
        }

        let source_id = path
            .strip_prefix(root)
            .unwrap_or(&path)
            .components()
            .map(|component| component.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<String>>()
            .join("/");
        debug!(source = %source_id, bytes = raw.len(), "document loaded");
        documents.push(CorpusDocument::new(source_id, body));
    }

    Ok(documents)
}

fn discover_documents(root: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));
    for entry in walker {
        let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
        if entry.file_type().is_file() && is_markdown(entry.path()) {
            found.push(entry.into_path());
        }
    }

    Ok(found)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md") || ext.eq_ignore_ascii_case("mdx"))
}

/// Drops a leading `---` YAML block; documents without one pass through unchanged.
pub(super) fn strip_front_matter(text: &str) -> String {
    let trimmed = text.trim_start_matches('\u{feff}');
    let Some(rest) = trimmed
        .strip_prefix("---\n")
        .or_else(|| trimmed.strip_prefix("---\r\n"))
    else {
        return trimmed.to_string();
    };

    let mut offset = 0usize;
    for line in rest.split_inclusive('\n') {
        offset += line.len();
        if line.trim_end() == "---" {
            return rest[offset..].to_string();
        }
    }

    trimmed.to_string()
}
