use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use crate::cli::{IndexArgs, index_db_path};
use crate::rag::{
    ChunkingConfig, INDEX_DB_SCHEMA_VERSION, IndexBuildManifest, build_index, load_corpus_dir,
    save_index, write_model_lock,
};
use crate::semantic::{EmbeddingProvider, LocalHashEmbedder, resolve_model_config};
use crate::util::{ensure_directory, now_utc_string, utc_compact_string, write_json_pretty};

pub fn run(args: IndexArgs) -> Result<()> {
    let started = Instant::now();
    let run_id = format!("index-{}", utc_compact_string(Utc::now()));
    let manifest_dir = args.cache_root.join("manifests");
    ensure_directory(&manifest_dir)?;

    let db_path = index_db_path(&args.cache_root, args.db_path.as_ref());
    let lock_path = args
        .model_lock_path
        .clone()
        .unwrap_or_else(|| manifest_dir.join("embedding_model.lock.json"));
    let chunking = ChunkingConfig {
        target_chars: args.chunk_chars,
        overlap_chars: args.chunk_overlap,
    };
    let provider = LocalHashEmbedder::new(resolve_model_config(&args.model_id));

    info!(
        run_id = %run_id,
        docs_dir = %args.docs_dir.display(),
        db_path = %db_path.display(),
        model_id = %provider.model().model_id,
        "index build started"
    );

    let corpus = load_corpus_dir(&args.docs_dir)?;
    let index = build_index(&corpus, &provider, &chunking)
        .with_context(|| format!("failed to build index for run {run_id}"))?;

    let mut warnings = Vec::<String>::new();
    if index.is_empty() {
        warn!(docs_dir = %args.docs_dir.display(), "index contains no chunks");
        warnings.push(format!("no markdown content under {}", args.docs_dir.display()));
    }
    save_index(&index, &db_path)?;
    write_model_lock(index.model(), &lock_path)?;

    let model = index.model();
    let manifest = IndexBuildManifest {
        manifest_version: 1,
        run_id: run_id.clone(),
        generated_at: now_utc_string(),
        corpus_root: args.docs_dir.display().to_string(),
        db_path: db_path.display().to_string(),
        db_schema_version: INDEX_DB_SCHEMA_VERSION.to_string(),
        model_id: model.model_id.clone(),
        model_name: model.model_name.clone(),
        embedding_dim: model.dimensions,
        normalization: model.normalization.clone(),
        backend: model.backend.clone(),
        chunk_target_chars: chunking.target_chars,
        chunk_overlap_chars: chunking.overlap_chars,
        source_count: index.source_count(),
        chunk_count: index.len(),
        duration_ms: started.elapsed().as_millis(),
        status: "completed".to_string(),
        warnings,
    };
    let manifest_path = manifest_dir.join(format!("{run_id}.json"));
    write_json_pretty(&manifest_path, &manifest)?;

    info!(
        run_id = %run_id,
        sources = manifest.source_count,
        chunks = manifest.chunk_count,
        lock = %lock_path.display(),
        manifest = %manifest_path.display(),
        duration_ms = manifest.duration_ms,
        "index build completed"
    );

    Ok(())
}
