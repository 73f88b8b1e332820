use anyhow::Result;
use tracing::{info, warn};

use crate::catalog::load_dir;
use crate::cli::{StatusArgs, index_db_path};
use crate::model::Modality;
use crate::rag::store_counts;
use crate::util::sha256_file;

pub fn run(args: StatusArgs) -> Result<()> {
    let db_path = index_db_path(&args.cache_root, args.db_path.as_ref());

    info!(
        data_dir = %args.data_dir.display(),
        cache_root = %args.cache_root.display(),
        "status requested"
    );

    for modality in Modality::ALL {
        let path = args.data_dir.join(modality.leaderboard_file());
        if path.is_file() {
            let sha256 = sha256_file(&path)?;
            info!(
                modality = modality.as_str(),
                path = %path.display(),
                sha256 = %sha256,
                "leaderboard file present"
            );
        } else {
            warn!(modality = modality.as_str(), path = %path.display(), "leaderboard file missing");
        }
    }

    match load_dir(&args.data_dir) {
        Ok(catalog) => {
            for modality in Modality::ALL {
                info!(
                    modality = modality.as_str(),
                    models = catalog.count_with(modality),
                    "catalog modality"
                );
            }
            info!(
                records = catalog.record_count(),
                sources = catalog.sources().len(),
                loaded_at = %catalog.loaded_at(),
                "catalog status"
            );
        }
        Err(err) => warn!(error = %err, "catalog unavailable"),
    }

    if db_path.exists() {
        let counts = store_counts(&db_path)?;
        info!(
            path = %db_path.display(),
            model_id = %counts.model_id.unwrap_or_default(),
            built_at = %counts.built_at.unwrap_or_default(),
            chunks = counts.chunks,
            embeddings = counts.embeddings,
            "index status"
        );
    } else {
        warn!(path = %db_path.display(), "index database missing");
    }

    Ok(())
}
