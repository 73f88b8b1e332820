mod classify;
mod filter;
mod mapper;
mod prompt;
mod scoring;
#[cfg(test)]
mod tests;

use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::error::CoreResult;
use crate::model::{QuestionnaireResponse, Recommendation};

pub use classify::{build_classification_prompt, parse_classification};
pub use filter::filter;
pub use mapper::map_to_category;
pub use prompt::{EXPLANATION_SYSTEM_MESSAGE, build_explanation_prompt, fallback_explanation};
pub use scoring::{BlendWeights, ScoringPolicy, UnknownPricePolicy, rank};

/// Runs mapper, filter and ranker over one catalog snapshot.
pub fn recommend(
    catalog: &Catalog,
    response: &QuestionnaireResponse,
    policy: &ScoringPolicy,
) -> CoreResult<Recommendation> {
    policy.validate()?;
    let category = map_to_category(response)?;

    let pool = filter(catalog.all_records(), &category);
    debug!(
        use_case = response.use_case.token(),
        catalog = catalog.record_count(),
        pool = pool.len(),
        "capability filter applied"
    );

    if pool.is_empty() {
        info!(use_case = response.use_case.token(), "no models matched the questionnaire");
        return Ok(Recommendation::NoMatch { category });
    }

    let candidates = rank(&pool, &category.modalities, response.priority, policy);
    info!(
        use_case = response.use_case.token(),
        priority = response.priority.label(),
        returned = candidates.len(),
        "recommendation ranked"
    );

    Ok(Recommendation::Ranked { candidates })
}
