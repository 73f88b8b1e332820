use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::model::{Modality, ModelRecord, Pricing, Priority, RankedCandidate};

pub const MAX_RECOMMENDATIONS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BlendWeights {
    pub perf: f64,
    pub cost: f64,
}

/// How a model without a listed price enters the cost normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownPricePolicy {
    #[default]
    AssumeMostExpensive,
    AssumeFree,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoringPolicy {
    pub performance: BlendWeights,
    pub lower_cost: BlendWeights,
    pub unknown_price: UnknownPricePolicy,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            performance: BlendWeights {
                perf: 1.0,
                cost: 0.0,
            },
            lower_cost: BlendWeights {
                perf: 0.6,
                cost: 0.4,
            },
            unknown_price: UnknownPricePolicy::default(),
        }
    }
}

impl ScoringPolicy {
    pub fn weights(&self, priority: Priority) -> BlendWeights {
        match priority {
            Priority::BetterPerformance => self.performance,
            Priority::LowerCost => self.lower_cost,
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        for (label, weights) in [
            ("performance", self.performance),
            ("lower_cost", self.lower_cost),
        ] {
            let valid = [weights.perf, weights.cost]
                .iter()
                .all(|value| value.is_finite() && *value >= 0.0);
            if !valid || weights.perf + weights.cost <= 0.0 {
                return Err(CoreError::InvalidArgument(format!(
                    "{label} weights must be non-negative with a positive sum"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub perf_norm: f64,
    pub cost_norm: f64,
    pub final_score: f64,
}

#[derive(Debug, Clone, Copy)]
struct Range {
    min: f64,
    max: f64,
}

impl Range {
    fn over(values: impl Iterator<Item = f64>) -> Option<Self> {
        values.fold(None, |acc, value| match acc {
            None => Some(Self {
                min: value,
                max: value,
            }),
            Some(range) => Some(Self {
                min: range.min.min(value),
                max: range.max.max(value),
            }),
        })
    }

    fn is_degenerate(self) -> bool {
        self.max - self.min <= f64::EPSILON
    }

    /// Min-max rescale into 0..=1; a degenerate range maps everything to 1.
    fn rescale(self, value: f64) -> f64 {
        if self.is_degenerate() {
            return 1.0;
        }
        ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }
}

/// Normalization bounds observed over one candidate pool.
#[derive(Debug, Clone)]
pub struct PoolStats {
    modalities: Vec<(Modality, Range)>,
    cost: Option<Range>,
    unknown_cost: f64,
}

impl PoolStats {
    pub fn observe(
        pool: &[&ModelRecord],
        modalities: &BTreeSet<Modality>,
        policy: &ScoringPolicy,
    ) -> Self {
        let modality_ranges = modalities
            .iter()
            .filter_map(|modality| {
                Range::over(pool.iter().filter_map(|record| record.score(*modality)))
                    .map(|range| (*modality, range))
            })
            .collect::<Vec<(Modality, Range)>>();

        let listed_max = pool
            .iter()
            .filter_map(|record| listed_cost(record.pricing))
            .fold(None, |acc: Option<f64>, value| Some(acc.map_or(value, |max| max.max(value))));
        let unknown_cost = match policy.unknown_price {
            UnknownPricePolicy::AssumeMostExpensive => listed_max.unwrap_or(0.0),
            UnknownPricePolicy::AssumeFree => 0.0,
        };

        let cost = Range::over(
            pool.iter()
                .map(|record| listed_cost(record.pricing).unwrap_or(unknown_cost)),
        );

        Self {
            modalities: modality_ranges,
            cost,
            unknown_cost,
        }
    }

    pub fn perf_norm(&self, record: &ModelRecord) -> f64 {
        if self.modalities.is_empty() {
            return 0.0;
        }

        let total = self
            .modalities
            .iter()
            .map(|(modality, range)| {
                record
                    .score(*modality)
                    .map(|score| range.rescale(score))
                    .unwrap_or(0.0)
            })
            .sum::<f64>();
        total / self.modalities.len() as f64
    }

    /// Cheapest in the pool scores 1, most expensive scores 0.
    pub fn cost_norm(&self, record: &ModelRecord) -> f64 {
        let Some(range) = self.cost.filter(|range| !range.is_degenerate()) else {
            return 1.0;
        };
        let cost = listed_cost(record.pricing).unwrap_or(self.unknown_cost);
        1.0 - range.rescale(cost)
    }

    pub fn score(
        &self,
        record: &ModelRecord,
        priority: Priority,
        policy: &ScoringPolicy,
    ) -> ScoreBreakdown {
        let weights = policy.weights(priority);
        let perf_norm = self.perf_norm(record);
        let cost_norm = self.cost_norm(record);
        ScoreBreakdown {
            perf_norm,
            cost_norm,
            final_score: weights.perf * perf_norm + weights.cost * cost_norm,
        }
    }
}

fn listed_cost(pricing: Pricing) -> Option<f64> {
    match pricing {
        Pricing::Free => Some(0.0),
        Pricing::Usd(value) => Some(value),
        Pricing::Unknown => None,
    }
}

/// Orders the pool by final score, then votes (descending), then name (ascending),
/// and keeps at most [`MAX_RECOMMENDATIONS`].
pub fn rank(
    pool: &[&ModelRecord],
    modalities: &BTreeSet<Modality>,
    priority: Priority,
    policy: &ScoringPolicy,
) -> Vec<RankedCandidate> {
    let stats = PoolStats::observe(pool, modalities, policy);

    let mut scored = pool
        .iter()
        .map(|record| (stats.score(record, priority, policy), *record))
        .collect::<Vec<(ScoreBreakdown, &ModelRecord)>>();

    scored.sort_by(|(left_score, left), (right_score, right)| {
        right_score
            .final_score
            .total_cmp(&left_score.final_score)
            .then(right.votes.cmp(&left.votes))
            .then(left.name.cmp(&right.name))
    });
    scored.truncate(MAX_RECOMMENDATIONS);

    scored
        .into_iter()
        .enumerate()
        .map(|(index, (breakdown, record))| RankedCandidate {
            rank: index + 1,
            score: breakdown.final_score,
            perf_norm: breakdown.perf_norm,
            cost_norm: breakdown.cost_norm,
            record: record.clone(),
        })
        .collect()
}
