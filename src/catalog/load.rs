use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, warn};

use crate::error::{CoreError, CoreResult};
use crate::model::{ArenaScore, Capabilities, License, Modality, ModelRecord, Pricing};
use crate::util::now_utc_string;

use super::{Catalog, CatalogSource};

const REQUIRED_COLUMNS: [&str; 3] = ["model", "arena_score", "license"];

struct ColumnMap {
    model: usize,
    arena_score: usize,
    license: usize,
    organization: Option<usize>,
    confidence_interval: Option<usize>,
    votes: Option<usize>,
    knowledge_cutoff: Option<usize>,
    pricing: Option<usize>,
    url: Option<usize>,
}

impl ColumnMap {
    fn from_headers(source_name: &str, headers: &StringRecord) -> CoreResult<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|header| header.trim().eq_ignore_ascii_case(name))
        };

        let missing = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|column| find(*column).is_none())
            .collect::<Vec<&str>>();
        if !missing.is_empty() {
            return Err(CoreError::data_load(
                source_name,
                format!("missing required column(s): {}", missing.join(", ")),
            ));
        }

        Ok(Self {
            model: find("model").unwrap_or_default(),
            arena_score: find("arena_score").unwrap_or_default(),
            license: find("license").unwrap_or_default(),
            organization: find("organization"),
            confidence_interval: find("95_pct_ci"),
            votes: find("votes"),
            knowledge_cutoff: find("knowledge_cutoff"),
            pricing: find("pricing"),
            url: find("url"),
        })
    }
}

/// Loads every modality leaderboard present in `dir`. Absent files are skipped; a
/// present file that is malformed fails the whole load.
pub fn load_dir(dir: &Path) -> CoreResult<Catalog> {
    let source_name = dir.display().to_string();
    if !dir.is_dir() {
        return Err(CoreError::data_load(
            source_name,
            "catalog directory does not exist",
        ));
    }

    let mut tables = Vec::new();
    for modality in Modality::ALL {
        let path = dir.join(modality.leaderboard_file());
        if !path.is_file() {
            warn!(path = %path.display(), modality = modality.as_str(), "leaderboard file missing");
            continue;
        }

        let file = File::open(&path).map_err(|err| {
            CoreError::data_load(path.display().to_string(), format!("failed to open: {err}"))
        })?;
        tables.push((modality, path.display().to_string(), file));
    }

    if tables.is_empty() {
        return Err(CoreError::data_load(
            source_name,
            "no leaderboard files found",
        ));
    }

    load_tables(tables)
}

pub fn load_tables<R: Read>(tables: Vec<(Modality, String, R)>) -> CoreResult<Catalog> {
    let mut merged = BTreeMap::<String, ModelRecord>::new();
    let mut sources = Vec::with_capacity(tables.len());

    for (modality, source_name, reader) in tables {
        let rows = read_table(modality, &source_name, reader, &mut merged)?;
        debug!(source = %source_name, modality = modality.as_str(), rows, "leaderboard table parsed");
        sources.push(CatalogSource {
            modality,
            source: source_name,
            rows,
        });
    }

    if merged.is_empty() {
        return Err(CoreError::data_load(
            sources
                .iter()
                .map(|value| value.source.as_str())
                .collect::<Vec<&str>>()
                .join(", "),
            "leaderboard tables contain no model rows",
        ));
    }

    Ok(Catalog {
        records: merged.into_values().collect(),
        sources,
        loaded_at: now_utc_string(),
    })
}

fn read_table<R: Read>(
    modality: Modality,
    source_name: &str,
    reader: R,
    merged: &mut BTreeMap<String, ModelRecord>,
) -> CoreResult<usize> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|err| CoreError::data_load(source_name, format!("unreadable header: {err}")))?
        .clone();
    let columns = ColumnMap::from_headers(source_name, &headers)?;

    let mut rows = 0usize;
    for (index, row) in csv_reader.records().enumerate() {
        let line = index + 2;
        let row = row.map_err(|err| {
            CoreError::data_load(source_name, format!("line {line}: malformed row: {err}"))
        })?;

        let name = field(&row, Some(columns.model)).ok_or_else(|| {
            CoreError::data_load(source_name, format!("line {line}: empty model name"))
        })?;
        let score = field(&row, Some(columns.arena_score))
            .and_then(|value| value.parse::<f64>().ok())
            .filter(|value| value.is_finite())
            .ok_or_else(|| {
                CoreError::data_load(
                    source_name,
                    format!("line {line}: invalid arena_score for '{name}'"),
                )
            })?;
        let license_raw = field(&row, Some(columns.license)).ok_or_else(|| {
            CoreError::data_load(source_name, format!("line {line}: empty license for '{name}'"))
        })?;
        let license = License::parse(license_raw);

        let votes = match field(&row, columns.votes) {
            Some(raw) => parse_votes(raw).ok_or_else(|| {
                CoreError::data_load(
                    source_name,
                    format!("line {line}: invalid votes '{raw}' for '{name}'"),
                )
            })?,
            None => 0,
        };

        let arena = ArenaScore {
            score,
            confidence_interval: field(&row, columns.confidence_interval).map(str::to_string),
            votes,
        };
        let pricing = parse_pricing(field(&row, columns.pricing), license);

        let record = merged
            .entry(name.to_string())
            .or_insert_with(|| ModelRecord {
                name: name.to_string(),
                organization: String::new(),
                license,
                scores: BTreeMap::new(),
                votes: 0,
                knowledge_cutoff: None,
                pricing,
                url: None,
                capabilities: Capabilities::default(),
            });

        if record.organization.is_empty() {
            if let Some(organization) = field(&row, columns.organization) {
                record.organization = organization.to_string();
            }
        }
        if record.knowledge_cutoff.is_none() {
            record.knowledge_cutoff = field(&row, columns.knowledge_cutoff).map(str::to_string);
        }
        if record.url.is_none() {
            record.url = field(&row, columns.url).map(str::to_string);
        }
        if matches!(pricing, Pricing::Usd(_)) && !matches!(record.pricing, Pricing::Usd(_)) {
            record.pricing = pricing;
        }

        record.votes = record.votes.max(votes);
        record.scores.insert(modality, arena);
        match modality {
            Modality::Vision => record.capabilities.supports_vision = true,
            Modality::Image => record.capabilities.supports_image_gen = true,
            Modality::ImageEdit => record.capabilities.supports_image_edit = true,
            Modality::Text | Modality::WebDev => {}
        }

        rows += 1;
    }

    Ok(rows)
}

fn field(row: &StringRecord, index: Option<usize>) -> Option<&str> {
    index
        .and_then(|value| row.get(value))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .filter(|value| !value.eq_ignore_ascii_case("nan") && !value.eq_ignore_ascii_case("n/a"))
}

fn parse_votes(raw: &str) -> Option<u64> {
    let cleaned = raw.replace(',', "");
    if let Ok(value) = cleaned.parse::<u64>() {
        return Some(value);
    }

    cleaned
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0)
        .map(|value| value.round() as u64)
}

fn parse_pricing(raw: Option<&str>, license: License) -> Pricing {
    let listed = raw
        .map(|value| value.trim_start_matches('$'))
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|value| value.is_finite() && *value >= 0.0);

    match (listed, license) {
        (Some(value), _) => Pricing::Usd(value),
        (None, License::OpenWeight) => Pricing::Free,
        (None, License::Proprietary) => Pricing::Unknown,
    }
}
