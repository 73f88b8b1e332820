use std::path::Path;

use anyhow::{Context, Result, bail};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use tracing::info;

use crate::semantic::{EmbeddingModelConfig, decode_embedding_blob, encode_embedding_blob};
use crate::util::{ensure_parent_directory, now_utc_string, sha256_hex, write_json_pretty};

use super::{DocumentChunk, DocumentIndex};

pub const INDEX_DB_SCHEMA_VERSION: &str = "0.1.0";

#[derive(Debug, Serialize)]
pub struct IndexBuildManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub generated_at: String,
    pub corpus_root: String,
    pub db_path: String,
    pub db_schema_version: String,
    pub model_id: String,
    pub model_name: String,
    pub embedding_dim: usize,
    pub normalization: String,
    pub backend: String,
    pub chunk_target_chars: usize,
    pub chunk_overlap_chars: usize,
    pub source_count: usize,
    pub chunk_count: usize,
    pub duration_ms: u128,
    pub status: String,
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
struct EmbeddingModelLock {
    manifest_version: u32,
    model_id: String,
    model_name: String,
    embedding_dim: usize,
    normalization: String,
    runtime_backend: String,
    created_at: String,
    checksum: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexStoreCounts {
    pub model_id: Option<String>,
    pub built_at: Option<String>,
    pub chunks: i64,
    pub embeddings: i64,
}

fn open_index_connection(db_path: &Path) -> Result<Connection> {
    let connection = Connection::open(db_path)
        .with_context(|| format!("failed to open index database: {}", db_path.display()))?;

    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL for index")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL for index")?;

    Ok(connection)
}

fn ensure_index_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS index_meta(
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS embedding_models(
              model_id TEXT PRIMARY KEY,
              backend TEXT NOT NULL,
              model_name TEXT NOT NULL,
              dimensions INTEGER NOT NULL,
              normalization TEXT NOT NULL,
              created_at TEXT NOT NULL,
              config_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS chunks(
              chunk_id TEXT PRIMARY KEY,
              seq INTEGER NOT NULL UNIQUE,
              source_id TEXT NOT NULL,
              ordinal INTEGER NOT NULL,
              text TEXT NOT NULL,
              text_hash TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS chunk_embeddings(
              chunk_id TEXT NOT NULL,
              model_id TEXT NOT NULL,
              embedding BLOB NOT NULL,
              embedding_dim INTEGER NOT NULL,
              text_hash TEXT NOT NULL,
              generated_at TEXT NOT NULL,
              PRIMARY KEY(chunk_id, model_id)
            );
            ",
        )
        .context("failed to create index schema")
}

/// Replaces the stored index in a single transaction.
pub fn save_index(index: &DocumentIndex, db_path: &Path) -> Result<()> {
    ensure_parent_directory(db_path)?;
    let mut connection = open_index_connection(db_path)?;
    ensure_index_schema(&connection)?;

    let model = index.model();
    let generated_at = now_utc_string();
    let config_json = serde_json::to_string(model).context("failed to serialize model config")?;

    let tx = connection.transaction()?;
    tx.execute("DELETE FROM chunk_embeddings", [])?;
    tx.execute("DELETE FROM chunks", [])?;
    tx.execute("DELETE FROM index_meta", [])?;
    tx.execute(
        "
        INSERT INTO embedding_models(model_id, backend, model_name, dimensions, normalization, created_at, config_json)
        VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT(model_id) DO UPDATE SET
          backend=excluded.backend,
          model_name=excluded.model_name,
          dimensions=excluded.dimensions,
          normalization=excluded.normalization,
          config_json=excluded.config_json
        ",
        params![
            model.model_id,
            model.backend,
            model.model_name,
            model.dimensions as i64,
            model.normalization,
            generated_at,
            config_json,
        ],
    )?;

    {
        let mut insert_chunk = tx.prepare(
            "INSERT INTO chunks(chunk_id, seq, source_id, ordinal, text, text_hash) VALUES(?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        let mut insert_embedding = tx.prepare(
            "INSERT INTO chunk_embeddings(chunk_id, model_id, embedding, embedding_dim, text_hash, generated_at) VALUES(?1, ?2, ?3, ?4, ?5, ?6)",
        )?;

        for (seq, chunk) in index.chunks().iter().enumerate() {
            insert_chunk
                .execute(params![
                    chunk.chunk_id,
                    seq as i64,
                    chunk.source_id,
                    chunk.ordinal as i64,
                    chunk.text,
                    chunk.text_hash,
                ])
                .with_context(|| format!("failed to insert chunk {}", chunk.chunk_id))?;
            insert_embedding.execute(params![
                chunk.chunk_id,
                model.model_id,
                encode_embedding_blob(&chunk.embedding),
                chunk.embedding.len() as i64,
                chunk.text_hash,
                generated_at,
            ])?;
        }
    }

    for (key, value) in [
        ("schema_version", INDEX_DB_SCHEMA_VERSION),
        ("active_model_id", model.model_id.as_str()),
        ("built_at", index.built_at()),
    ] {
        tx.execute(
            "INSERT INTO index_meta(key, value) VALUES(?1, ?2)",
            params![key, value],
        )?;
    }
    tx.commit().context("failed to commit index")?;

    info!(
        path = %db_path.display(),
        model_id = %model.model_id,
        chunks = index.len(),
        "document index persisted"
    );
    Ok(())
}

pub fn load_index(db_path: &Path) -> Result<DocumentIndex> {
    if !db_path.is_file() {
        bail!(
            "index database not found: {} (run `pickllm index` first)",
            db_path.display()
        );
    }
    let connection = open_index_connection(db_path)?;

    let model_id = read_meta(&connection, "active_model_id")?
        .with_context(|| format!("index at {} has no active model", db_path.display()))?;
    let built_at = read_meta(&connection, "built_at")?.unwrap_or_default();

    let model = connection
        .query_row(
            "SELECT model_id, model_name, dimensions, normalization, backend FROM embedding_models WHERE model_id = ?1",
            [&model_id],
            |row| {
                Ok(EmbeddingModelConfig {
                    model_id: row.get(0)?,
                    model_name: row.get(1)?,
                    dimensions: row.get::<_, i64>(2)? as usize,
                    normalization: row.get(3)?,
                    backend: row.get(4)?,
                })
            },
        )
        .optional()?
        .with_context(|| format!("embedding model '{model_id}' is not registered"))?;

    let mut statement = connection.prepare(
        "
        SELECT c.chunk_id, c.source_id, c.ordinal, c.text, c.text_hash, ce.embedding, ce.embedding_dim
        FROM chunks c
        JOIN chunk_embeddings ce ON ce.chunk_id = c.chunk_id AND ce.model_id = ?1
        ORDER BY c.seq ASC
        ",
    )?;
    let mut rows = statement.query([&model.model_id])?;

    let mut chunks = Vec::<DocumentChunk>::new();
    while let Some(row) = rows.next()? {
        let chunk_id: String = row.get(0)?;
        let row_dim = row.get::<_, i64>(6)? as usize;
        let blob = row.get::<_, Vec<u8>>(5)?;
        let Some(embedding) = decode_embedding_blob(&blob, model.dimensions)
            .filter(|_| row_dim == model.dimensions)
        else {
            bail!(
                "chunk {chunk_id} has a {row_dim}-dim embedding, model '{}' declares {}",
                model.model_id,
                model.dimensions
            );
        };

        chunks.push(DocumentChunk {
            chunk_id,
            source_id: row.get(1)?,
            ordinal: row.get::<_, i64>(2)? as usize,
            text: row.get(3)?,
            text_hash: row.get(4)?,
            embedding,
        });
    }

    let stored_chunks: i64 = connection.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
    if stored_chunks as usize != chunks.len() {
        bail!(
            "index at {} is incomplete: {} chunks, {} embeddings for model '{}'",
            db_path.display(),
            stored_chunks,
            chunks.len(),
            model.model_id
        );
    }

    Ok(DocumentIndex::from_parts(model, chunks, built_at))
}

pub fn store_counts(db_path: &Path) -> Result<IndexStoreCounts> {
    let connection = open_index_connection(db_path)?;
    ensure_index_schema(&connection)?;

    let chunks = connection.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
    let embeddings =
        connection.query_row("SELECT COUNT(*) FROM chunk_embeddings", [], |row| row.get(0))?;

    Ok(IndexStoreCounts {
        model_id: read_meta(&connection, "active_model_id")?,
        built_at: read_meta(&connection, "built_at")?,
        chunks,
        embeddings,
    })
}

fn read_meta(connection: &Connection, key: &str) -> Result<Option<String>> {
    let value = connection
        .query_row(
            "SELECT value FROM index_meta WHERE key = ?1 LIMIT 1",
            [key],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(value)
}

/// Records the model an index was built with, so a later query can detect skew.
pub fn write_model_lock(model: &EmbeddingModelConfig, lock_path: &Path) -> Result<()> {
    let lock = EmbeddingModelLock {
        manifest_version: 1,
        model_id: model.model_id.clone(),
        model_name: model.model_name.clone(),
        embedding_dim: model.dimensions,
        normalization: model.normalization.clone(),
        runtime_backend: model.backend.clone(),
        created_at: now_utc_string(),
        checksum: sha256_hex(&model.fingerprint()),
    };

    write_json_pretty(lock_path, &lock)
}
