use std::io::{self, Write};

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::cli::{ChatArgs, index_db_path};
use crate::rag::{RetrievalResult, build_chat_prompt, load_index, query};
use crate::semantic::{LocalHashEmbedder, resolve_model_config};
use crate::util::write_json_stdout;

#[derive(Debug, Serialize)]
struct ChatOutput<'a> {
    query: &'a str,
    k: usize,
    retrieval: &'a RetrievalResult<'a>,
    prompt: &'a str,
}

pub fn run(args: ChatArgs) -> Result<()> {
    let db_path = index_db_path(&args.cache_root, args.db_path.as_ref());
    let index = load_index(&db_path)?;
    let provider = LocalHashEmbedder::new(resolve_model_config(&args.model_id));

    let result = query(&index, &provider, &args.query, args.k)?;
    let prompt = build_chat_prompt(&args.query, &result, &args.conciseness);
    info!(
        db_path = %db_path.display(),
        model_id = %result.model_id,
        hits = result.len(),
        "chat prompt assembled"
    );

    if args.json {
        return write_json_stdout(&ChatOutput {
            query: &args.query,
            k: args.k,
            retrieval: &result,
            prompt: &prompt,
        });
    }

    let mut output = io::BufWriter::new(io::stdout().lock());
    writeln!(output, "Query: {}", args.query)?;
    writeln!(output, "Retrieved: {} (k={})", result.len(), args.k)?;
    for hit in &result.hits {
        writeln!(
            output,
            "{}.\t{}\tsimilarity={:.4}",
            hit.rank, hit.chunk.chunk_id, hit.similarity
        )?;
    }
    writeln!(output, "\n--- prompt ---\n{prompt}")?;
    output.flush()?;
    Ok(())
}
