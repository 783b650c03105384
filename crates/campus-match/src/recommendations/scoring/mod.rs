mod probability;
mod tiering;

pub use tiering::{classify, TierDecision, TierInputs, TierRule};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::domain::{Candidate, StudentProfile};
use super::tables::InstitutionTables;

/// Stateless scorer that turns authoritative rates into a personalized
/// probability and a tier for one student.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    tables: Arc<InstitutionTables>,
}

impl ScoringEngine {
    pub fn new(tables: Arc<InstitutionTables>) -> Self {
        Self { tables }
    }

    /// Scores a candidate's admit rate without touching the candidate.
    /// `None` when the admit rate is unknown.
    pub fn assess(&self, candidate: &Candidate, profile: &StudentProfile) -> Option<Assessment> {
        let admit_rate = candidate.admit_rate.filter(|rate| rate.is_finite())?;
        let estimate = probability::estimate(admit_rate, profile, candidate.sat_bands);
        let key = self.tables.key_for(&candidate.name);
        let decision = classify(
            TierInputs {
                key: &key,
                probability: estimate.probability,
                admit_rate,
                gpa: profile.gpa_or_default(),
            },
            &self.tables,
        );

        Some(Assessment {
            probability: estimate.probability,
            decision,
            adjustments: estimate.adjustments,
        })
    }

    /// Applies [`assess`](Self::assess) in place. Candidates without an admit
    /// rate pass through unchanged and stay unscored.
    pub fn score(&self, candidate: &mut Candidate, profile: &StudentProfile) -> bool {
        match self.assess(candidate, profile) {
            Some(assessment) => {
                debug!(
                    name = %candidate.name,
                    probability = assessment.probability,
                    tier = assessment.decision.tier.label(),
                    rule = assessment.decision.rule.summary(),
                    "scored candidate"
                );
                candidate.admission_probability = Some(assessment.probability);
                candidate.tier = assessment.decision.tier;
                candidate.scored = true;
                true
            }
            None => false,
        }
    }
}

/// Multiplicative factor the probability engine applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentFactor {
    Gpa,
    Rigor,
    StandardizedTest,
    SelectivityCap,
}

/// Discrete contribution to a probability, allowing transparent audits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    pub factor: AdjustmentFactor,
    pub multiplier: f64,
    pub notes: String,
}

/// Scoring output: the personalized number, the tier decision and its trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub probability: u8,
    pub decision: TierDecision,
    pub adjustments: Vec<Adjustment>,
}
