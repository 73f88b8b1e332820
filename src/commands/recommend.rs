use std::fs;
use std::io::{self, Write};

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::{info, warn};

use crate::catalog;
use crate::cli::RecommendArgs;
use crate::model::{QuestionnaireResponse, RankedCandidate, Recommendation};
use crate::recommend::{
    BlendWeights, EXPLANATION_SYSTEM_MESSAGE, ScoringPolicy, build_explanation_prompt,
    fallback_explanation, recommend,
};
use crate::util::write_json_stdout;

#[derive(Debug, Serialize)]
struct RecommendOutput<'a> {
    catalog_loaded_at: &'a str,
    response: &'a QuestionnaireResponse,
    policy: &'a ScoringPolicy,
    recommendation: &'a Recommendation,
    explanation_system_message: Option<&'static str>,
    explanation_prompt: Option<String>,
    fallback_explanation: String,
}

pub fn run(args: RecommendArgs) -> Result<()> {
    let response = read_response(&args)?;
    let policy = ScoringPolicy {
        lower_cost: BlendWeights {
            perf: args.cost_blend_perf_weight,
            cost: args.cost_blend_cost_weight,
        },
        unknown_price: args.unknown_price.into(),
        ..ScoringPolicy::default()
    };

    let store = catalog::init_global(&args.data_dir).with_context(|| {
        format!("failed to load leaderboard catalog from {}", args.data_dir.display())
    })?;
    let snapshot = store.snapshot();
    info!(
        data_dir = %args.data_dir.display(),
        records = snapshot.record_count(),
        loaded_at = %snapshot.loaded_at(),
        "catalog ready"
    );

    let recommendation = recommend(&snapshot, &response, &policy)?;
    let explanation_prompt = match &recommendation {
        Recommendation::Ranked { candidates } => {
            Some(build_explanation_prompt(candidates, &response))
        }
        Recommendation::NoMatch { category } => {
            warn!(
                use_case = response.use_case.token(),
                modalities = ?category.modalities,
                license = ?category.license,
                "no catalog model satisfies the questionnaire"
            );
            None
        }
    };

    if args.json {
        return write_json_stdout(&RecommendOutput {
            catalog_loaded_at: snapshot.loaded_at(),
            response: &response,
            policy: &policy,
            recommendation: &recommendation,
            explanation_system_message: explanation_prompt
                .as_ref()
                .map(|_| EXPLANATION_SYSTEM_MESSAGE),
            explanation_prompt,
            fallback_explanation: fallback_explanation(&response),
        });
    }

    match &recommendation {
        Recommendation::Ranked { candidates } => {
            write_text_recommendation(candidates, explanation_prompt.as_deref())
        }
        Recommendation::NoMatch { .. } => {
            let mut output = io::BufWriter::new(io::stdout().lock());
            writeln!(
                output,
                "No models match this combination of use case and model type. Try relaxing the model type preference."
            )?;
            output.flush()?;
            Ok(())
        }
    }
}

fn read_response(args: &RecommendArgs) -> Result<QuestionnaireResponse> {
    if let Some(path) = &args.answers {
        let raw =
            fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let response: QuestionnaireResponse = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse questionnaire answers {}", path.display()))?;
        return Ok(response);
    }

    let Some(use_case) = args.use_case else {
        bail!("either --use-case or --answers is required");
    };

    Ok(QuestionnaireResponse {
        use_case,
        visual_ai_type: args.visual_ai_type,
        model_type: args.model_type,
        priority: args.priority,
        description: args.description.clone(),
    })
}

fn write_text_recommendation(
    candidates: &[RankedCandidate],
    explanation_prompt: Option<&str>,
) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    writeln!(output, "Recommendations: {}", candidates.len())?;
    for candidate in candidates {
        let record = &candidate.record;
        writeln!(
            output,
            "{}.\t{}\t{}\t{}",
            candidate.rank,
            record.name,
            if record.organization.is_empty() {
                "-"
            } else {
                record.organization.as_str()
            },
            record.license.label()
        )?;
        writeln!(
            output,
            "\tscore={:.4} perf_norm={:.4} cost_norm={:.4} votes={} pricing={}",
            candidate.score,
            candidate.perf_norm,
            candidate.cost_norm,
            record.votes,
            record.pricing.describe()
        )?;
        for (modality, arena) in &record.scores {
            writeln!(
                output,
                "\t{}: {:.1}{}",
                modality.label(),
                arena.score,
                arena
                    .confidence_interval
                    .as_deref()
                    .map(|ci| format!(" ({ci})"))
                    .unwrap_or_default()
            )?;
        }
    }

    if let Some(prompt) = explanation_prompt {
        writeln!(output, "\n--- explanation system message ---\n{EXPLANATION_SYSTEM_MESSAGE}")?;
        writeln!(output, "--- explanation prompt ---\n{prompt}")?;
    }

    output.flush()?;
    Ok(())
}
