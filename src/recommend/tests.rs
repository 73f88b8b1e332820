use std::collections::{BTreeMap, BTreeSet};

use super::classify::special_token_pattern;
use super::scoring::{MAX_RECOMMENDATIONS, PoolStats};
use super::*;
use crate::catalog::load_tables;
use crate::error::CoreError;
use crate::model::{
    ArenaScore, Capabilities, Capability, License, LicenseConstraint, Modality,
    ModelTypePreference, ModelRecord, Pricing, Priority, UseCase, VisualAiType,
};

fn record(name: &str, modality: Modality, score: f64, votes: u64, pricing: Pricing) -> ModelRecord {
    let license = if matches!(pricing, Pricing::Free) {
        License::OpenWeight
    } else {
        License::Proprietary
    };
    let mut scores = BTreeMap::new();
    scores.insert(
        modality,
        ArenaScore {
            score,
            confidence_interval: None,
            votes,
        },
    );
    ModelRecord {
        name: name.to_string(),
        organization: "Acme".to_string(),
        license,
        scores,
        votes,
        knowledge_cutoff: None,
        pricing,
        url: None,
        capabilities: Capabilities {
            supports_vision: modality == Modality::Vision,
            supports_image_gen: modality == Modality::Image,
            supports_image_edit: modality == Modality::ImageEdit,
        },
    }
}

fn response(use_case: UseCase) -> QuestionnaireResponse {
    QuestionnaireResponse {
        use_case,
        visual_ai_type: None,
        model_type: ModelTypePreference::NoPreference,
        priority: Priority::BetterPerformance,
        description: None,
    }
}

fn text_only() -> BTreeSet<Modality> {
    BTreeSet::from([Modality::Text])
}

#[test]
fn non_visual_use_cases_never_need_a_subtype() {
    for use_case in UseCase::ALL
        .into_iter()
        .filter(|value| *value != UseCase::VisualAi)
    {
        let category = map_to_category(&response(use_case)).unwrap();
        assert_eq!(category.modalities.len(), 1);
        assert!(category.required_capabilities.is_empty());
    }

    let developer = map_to_category(&response(UseCase::TechnicalDeveloper)).unwrap();
    assert!(developer.modalities.contains(&Modality::WebDev));
}

#[test]
fn visual_ai_without_subtype_is_incomplete() {
    let err = map_to_category(&response(UseCase::VisualAi)).unwrap_err();
    assert!(matches!(
        err,
        CoreError::IncompleteResponse {
            field: "visual_ai_type"
        }
    ));
}

#[test]
fn visual_ai_subtypes_map_to_their_modality_and_capability() {
    let cases = [
        (VisualAiType::ImageUnderstanding, Modality::Vision, Capability::Vision),
        (VisualAiType::ImageGeneration, Modality::Image, Capability::ImageGeneration),
        (VisualAiType::ImageEditing, Modality::ImageEdit, Capability::ImageEditing),
    ];

    for (subtype, modality, capability) in cases {
        let mut answers = response(UseCase::VisualAi);
        answers.visual_ai_type = Some(subtype);
        answers.model_type = ModelTypePreference::OpenOnly;

        let category = map_to_category(&answers).unwrap();
        assert_eq!(category.modalities, BTreeSet::from([modality]));
        assert_eq!(category.required_capabilities, BTreeSet::from([capability]));
        assert_eq!(category.license, LicenseConstraint::OpenOnly);
    }
}

#[test]
fn filter_applies_modality_capability_and_license() {
    let records = vec![
        record("open-text", Modality::Text, 1200.0, 10, Pricing::Free),
        record("closed-text", Modality::Text, 1300.0, 10, Pricing::Usd(2.0)),
        record("closed-vision", Modality::Vision, 1100.0, 10, Pricing::Usd(1.0)),
    ];

    let mut answers = response(UseCase::CreativeContent);
    answers.model_type = ModelTypePreference::ProprietaryOnlyEnterprise;
    let category = map_to_category(&answers).unwrap();
    let passed = filter(&records, &category)
        .into_iter()
        .map(|value| value.name.as_str())
        .collect::<Vec<&str>>();
    assert_eq!(passed, vec!["closed-text"]);

    answers.use_case = UseCase::VisualAi;
    answers.visual_ai_type = Some(VisualAiType::ImageUnderstanding);
    let category = map_to_category(&answers).unwrap();
    assert_eq!(filter(&records, &category).len(), 1);

    answers.visual_ai_type = Some(VisualAiType::ImageEditing);
    let category = map_to_category(&answers).unwrap();
    assert!(filter(&records, &category).is_empty());
}

#[test]
fn rank_output_is_bounded_and_non_increasing() {
    let records = (0..7_u32)
        .map(|index| {
            record(
                &format!("model-{index}"),
                Modality::Text,
                1000.0 + f64::from(index * 37 % 5) * 10.0,
                u64::from(index),
                Pricing::Usd(f64::from(index)),
            )
        })
        .collect::<Vec<ModelRecord>>();
    let pool = records.iter().collect::<Vec<&ModelRecord>>();

    for priority in [Priority::BetterPerformance, Priority::LowerCost] {
        for size in 0..=pool.len() {
            let ranked = rank(&pool[..size], &text_only(), priority, &ScoringPolicy::default());
            assert!(ranked.len() <= MAX_RECOMMENDATIONS);
            assert!(ranked.len() <= size);
            assert!(ranked.windows(2).all(|pair| pair[0].score >= pair[1].score));
            assert!(
                ranked
                    .iter()
                    .enumerate()
                    .all(|(index, candidate)| candidate.rank == index + 1)
            );
        }
    }
}

#[test]
fn small_pools_are_not_padded() {
    let records = vec![
        record("solo", Modality::Text, 1200.0, 5, Pricing::Free),
        record("duo", Modality::Text, 1100.0, 5, Pricing::Free),
    ];
    let pool = records.iter().collect::<Vec<&ModelRecord>>();
    let ranked = rank(&pool, &text_only(), Priority::BetterPerformance, &ScoringPolicy::default());
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].record.name, "solo");
    assert_eq!(ranked[0].perf_norm, 1.0);
    assert_eq!(ranked[1].perf_norm, 0.0);
}

#[test]
fn equal_scores_break_ties_by_votes_then_name() {
    let records = vec![
        record("zeta", Modality::Text, 1200.0, 50, Pricing::Free),
        record("beta", Modality::Text, 1200.0, 10, Pricing::Free),
        record("alpha", Modality::Text, 1200.0, 10, Pricing::Free),
    ];
    let pool = records.iter().collect::<Vec<&ModelRecord>>();

    let ranked = rank(&pool, &text_only(), Priority::LowerCost, &ScoringPolicy::default());
    let names = ranked
        .iter()
        .map(|candidate| candidate.record.name.as_str())
        .collect::<Vec<&str>>();
    assert_eq!(names, vec!["zeta", "alpha", "beta"]);
    assert!(ranked.iter().all(|candidate| candidate.score == ranked[0].score));
}

#[test]
fn performance_priority_follows_arena_order() {
    let records = vec![
        record("model-a", Modality::Text, 0.9, 1, Pricing::Usd(10.0)),
        record("model-b", Modality::Text, 0.5, 1, Pricing::Usd(1.0)),
        record("model-c", Modality::Text, 0.2, 1, Pricing::Usd(5.0)),
    ];
    let pool = records.iter().collect::<Vec<&ModelRecord>>();

    let ranked = rank(&pool, &text_only(), Priority::BetterPerformance, &ScoringPolicy::default());
    let names = ranked
        .iter()
        .map(|candidate| candidate.record.name.as_str())
        .collect::<Vec<&str>>();
    assert_eq!(names, vec!["model-a", "model-b", "model-c"]);
}

#[test]
fn lower_cost_priority_uses_the_sixty_forty_blend() {
    let records = vec![
        record("model-a", Modality::Text, 0.9, 1, Pricing::Usd(10.0)),
        record("model-b", Modality::Text, 0.5, 1, Pricing::Usd(1.0)),
        record("model-c", Modality::Text, 0.2, 1, Pricing::Usd(5.0)),
    ];
    let pool = records.iter().collect::<Vec<&ModelRecord>>();

    let perf = |score: f64| (score - 0.2) / (0.9 - 0.2);
    let cost = |price: f64| 1.0 - (price - 1.0) / (10.0 - 1.0);
    let expected_a = 0.6 * perf(0.9) + 0.4 * cost(10.0);
    let expected_b = 0.6 * perf(0.5) + 0.4 * cost(1.0);
    let expected_c = 0.6 * perf(0.2) + 0.4 * cost(5.0);
    assert!(expected_b > expected_a && expected_a > expected_c);

    let ranked = rank(&pool, &text_only(), Priority::LowerCost, &ScoringPolicy::default());
    let names = ranked
        .iter()
        .map(|candidate| candidate.record.name.as_str())
        .collect::<Vec<&str>>();
    assert_eq!(names, vec!["model-b", "model-a", "model-c"]);
    assert!((ranked[0].score - expected_b).abs() < 1e-12);
    assert!((ranked[1].score - expected_a).abs() < 1e-12);
    assert!((ranked[2].score - expected_c).abs() < 1e-12);
}

#[test]
fn unknown_prices_count_as_most_expensive_by_default() {
    let records = vec![
        record("listed", Modality::Text, 1000.0, 1, Pricing::Usd(4.0)),
        record("free", Modality::Text, 1000.0, 1, Pricing::Free),
        record("unlisted", Modality::Text, 1000.0, 1, Pricing::Unknown),
    ];
    let pool = records.iter().collect::<Vec<&ModelRecord>>();

    let policy = ScoringPolicy::default();
    let stats = PoolStats::observe(&pool, &text_only(), &policy);
    assert_eq!(stats.cost_norm(&records[1]), 1.0);
    assert_eq!(stats.cost_norm(&records[2]), 0.0);

    let lenient = ScoringPolicy {
        unknown_price: UnknownPricePolicy::AssumeFree,
        ..ScoringPolicy::default()
    };
    let stats = PoolStats::observe(&pool, &text_only(), &lenient);
    assert_eq!(stats.cost_norm(&records[2]), 1.0);
}

#[test]
fn invalid_weights_are_rejected() {
    let policy = ScoringPolicy {
        lower_cost: BlendWeights {
            perf: -0.1,
            cost: 0.4,
        },
        ..ScoringPolicy::default()
    };
    assert!(matches!(policy.validate(), Err(CoreError::InvalidArgument(_))));
}

#[test]
fn recommend_reports_no_match_instead_of_failing() {
    let table: &'static [u8] = b"model,organization,license,arena_score,votes\nclosed,Acme,Proprietary,1300,10\n";
    let catalog = load_tables(vec![(Modality::Text, "text.csv".to_string(), table)]).unwrap();

    let mut answers = response(UseCase::ConversationalKnowledge);
    answers.model_type = ModelTypePreference::OpenOnly;
    let outcome = recommend(&catalog, &answers, &ScoringPolicy::default()).unwrap();
    assert!(matches!(outcome, Recommendation::NoMatch { .. }));

    answers.model_type = ModelTypePreference::NoPreference;
    let outcome = recommend(&catalog, &answers, &ScoringPolicy::default()).unwrap();
    match outcome {
        Recommendation::Ranked { candidates } => assert_eq!(candidates[0].record.name, "closed"),
        Recommendation::NoMatch { .. } => panic!("expected a ranked outcome"),
    }
}

#[test]
fn explanation_prompt_names_every_candidate_and_the_use_case() {
    let records = vec![
        record("gemini-2.5-pro", Modality::Text, 1400.0, 9, Pricing::Usd(3.0)),
        record("llama-4", Modality::Text, 1300.0, 9, Pricing::Free),
    ];
    let pool = records.iter().collect::<Vec<&ModelRecord>>();
    let ranked = rank(&pool, &text_only(), Priority::BetterPerformance, &ScoringPolicy::default());

    let mut answers = response(UseCase::ConversationalKnowledge);
    answers.description = Some("a support bot for our shop".to_string());
    let prompt = build_explanation_prompt(&ranked, &answers);

    assert!(prompt.contains("gemini-2.5-pro"));
    assert!(prompt.contains("llama-4"));
    assert!(prompt.contains(UseCase::ConversationalKnowledge.label()));
    assert!(!prompt.contains("conversational_knowledge"));
    assert!(prompt.contains("a support bot for our shop"));
    assert!(prompt.contains("concise"));
    assert!(prompt.contains("under 300 words"));
}

#[test]
fn fallback_explanation_mentions_the_use_case() {
    let text = fallback_explanation(&response(UseCase::CreativeContent));
    assert!(text.contains("Creative Content"));
}

#[test]
fn classification_prompt_lists_every_category() {
    let prompt = build_classification_prompt("  I need to summarize contracts ");
    for use_case in UseCase::ALL {
        assert!(prompt.contains(use_case.token()));
    }
    assert!(prompt.contains("\"I need to summarize contracts\""));
}

#[test]
fn classification_parsing_tolerates_model_noise() {
    assert_eq!(
        parse_classification("<|im_start|> technical_developer <|im_end|>\n").unwrap(),
        Some(UseCase::TechnicalDeveloper)
    );
    assert_eq!(
        parse_classification("<｜begin▁of▁sentence｜>\"Visual_AI\".").unwrap(),
        Some(UseCase::VisualAi)
    );
    assert_eq!(
        parse_classification("creative-content").unwrap(),
        Some(UseCase::CreativeContent)
    );
    assert_eq!(parse_classification("gardening").unwrap(), None);
}

#[test]
fn special_token_pattern_compiles_once() {
    let first = special_token_pattern().unwrap();
    let second = special_token_pattern().unwrap();
    assert!(std::ptr::eq(first, second));
    assert!(first.is_match("<|im_end|>"));
}

#[test]
fn explanation_prompt_lists_candidate_details_line_by_line() {
    let records = vec![record("gemini-2.5-pro", Modality::Text, 1400.0, 9, Pricing::Usd(3.0))];
    let pool = records.iter().collect::<Vec<&ModelRecord>>();
    let ranked = rank(&pool, &text_only(), Priority::BetterPerformance, &ScoringPolicy::default());

    let prompt = build_explanation_prompt(&ranked, &response(UseCase::CreativeContent));
    assert!(prompt.contains(
        "1. gemini-2.5-pro by Acme\n   - License: Proprietary\n   - Knowledge Cutoff: N/A\n   - Pricing: $3\n"
    ));
    assert!(prompt.contains("**Priority**: Better performance\n"));
}
