use serde::{Deserialize, Serialize};

use super::super::domain::Tier;
use super::super::normalizer::NameKey;
use super::super::tables::InstitutionTables;

const SELECTIVE_GPA_CEILING: f64 = 3.7;
const REACH_ADMIT_RATE: f64 = 0.25;
const SAFETY_ADMIT_RATE_FLOOR: f64 = 0.50;
const SAFETY_GPA_FLOOR: f64 = 3.5;
const SAFETY_PROBABILITY: u8 = 80;
const MATCH_PROBABILITY: u8 = 30;

/// Rule that settled a tier, kept for audit logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierRule {
    MostSelectiveForGpa,
    LowAdmitRate,
    Probability,
    SelectiveSafetyDowngrade,
    GpaSafetyDowngrade,
    MostSelectiveNeverSafety,
    FlagshipMatchCap,
    LowProbabilityReach,
}

impl TierRule {
    pub fn summary(self) -> &'static str {
        match self {
            TierRule::MostSelectiveForGpa => "most selective institution for a GPA at or below 3.7",
            TierRule::LowAdmitRate => "admit rate below 25%",
            TierRule::Probability => "personalized probability band",
            TierRule::SelectiveSafetyDowngrade => {
                "admits at most half its applicants, so never a safety"
            }
            TierRule::GpaSafetyDowngrade => "GPA at or below 3.5 cannot count on a safety",
            TierRule::MostSelectiveNeverSafety => "most selective institutions are never safeties",
            TierRule::FlagshipMatchCap => "flagship capped at match",
            TierRule::LowProbabilityReach => "probability below 30% is always a reach",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierDecision {
    pub tier: Tier,
    pub rule: TierRule,
}

/// Inputs the ordered tier rules consult.
#[derive(Debug, Clone, Copy)]
pub struct TierInputs<'a> {
    pub key: &'a NameKey,
    pub probability: u8,
    pub admit_rate: f64,
    pub gpa: f64,
}

/// Ordered override rules. Terminal reach rules come first; every later rule
/// can only tighten the provisional tier.
pub fn classify(inputs: TierInputs<'_>, tables: &InstitutionTables) -> TierDecision {
    let most_selective = tables.is_most_selective(inputs.key);

    if most_selective && inputs.gpa <= SELECTIVE_GPA_CEILING {
        return decided(Tier::Reach, TierRule::MostSelectiveForGpa);
    }

    if inputs.admit_rate < REACH_ADMIT_RATE {
        return decided(Tier::Reach, TierRule::LowAdmitRate);
    }

    let mut decision = decided(provisional_tier(inputs.probability), TierRule::Probability);

    if decision.tier == Tier::Safety {
        if inputs.admit_rate <= SAFETY_ADMIT_RATE_FLOOR {
            decision = decided(Tier::Match, TierRule::SelectiveSafetyDowngrade);
        } else if inputs.gpa <= SAFETY_GPA_FLOOR {
            decision = decided(Tier::Match, TierRule::GpaSafetyDowngrade);
        }
    }

    if decision.tier == Tier::Safety && most_selective {
        decision = decided(Tier::Match, TierRule::MostSelectiveNeverSafety);
    }

    if decision.tier == Tier::Safety && tables.is_match_capped(inputs.key) {
        decision = decided(Tier::Match, TierRule::FlagshipMatchCap);
    }

    if inputs.probability < MATCH_PROBABILITY && decision.tier != Tier::Reach {
        decision = decided(Tier::Reach, TierRule::LowProbabilityReach);
    }

    decision
}

fn provisional_tier(probability: u8) -> Tier {
    if probability >= SAFETY_PROBABILITY {
        Tier::Safety
    } else if probability >= MATCH_PROBABILITY {
        Tier::Match
    } else {
        Tier::Reach
    }
}

fn decided(tier: Tier, rule: TierRule) -> TierDecision {
    TierDecision { tier, rule }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decide(name: &str, probability: u8, admit_rate: f64, gpa: f64) -> TierDecision {
        let tables = InstitutionTables::default();
        let key = tables.key_for(name);
        classify(
            TierInputs {
                key: &key,
                probability,
                admit_rate,
                gpa,
            },
            &tables,
        )
    }

    #[test]
    fn most_selective_beats_a_high_probability() {
        let decision = decide("Stanford", 85, 0.60, 3.5);
        assert_eq!(decision.tier, Tier::Reach);
        assert_eq!(decision.rule, TierRule::MostSelectiveForGpa);
    }

    #[test]
    fn low_admit_rate_is_always_reach() {
        let decision = decide("Tufts University", 90, 0.10, 4.6);
        assert_eq!(decision.tier, Tier::Reach);
        assert_eq!(decision.rule, TierRule::LowAdmitRate);
    }

    #[test]
    fn probability_bands_drive_the_provisional_tier() {
        assert_eq!(decide("Example College", 85, 0.80, 4.0).tier, Tier::Safety);
        assert_eq!(decide("Example College", 79, 0.80, 4.0).tier, Tier::Match);
        assert_eq!(decide("Example College", 30, 0.80, 4.0).tier, Tier::Match);
        assert_eq!(decide("Example College", 29, 0.80, 4.0).tier, Tier::Reach);
    }

    #[test]
    fn half_admit_rate_never_yields_a_safety() {
        let decision = decide("Example College", 90, 0.50, 4.2);
        assert_eq!(decision.tier, Tier::Match);
        assert_eq!(decision.rule, TierRule::SelectiveSafetyDowngrade);
    }

    #[test]
    fn modest_gpa_never_yields_a_safety() {
        let decision = decide("Example College", 90, 0.80, 3.5);
        assert_eq!(decision.tier, Tier::Match);
        assert_eq!(decision.rule, TierRule::GpaSafetyDowngrade);
    }

    #[test]
    fn strong_students_still_never_get_selective_safeties() {
        let decision = decide("Rice University", 90, 0.60, 4.2);
        assert_eq!(decision.tier, Tier::Match);
        assert_eq!(decision.rule, TierRule::MostSelectiveNeverSafety);
    }

    #[test]
    fn named_flagships_are_capped_at_match() {
        let decision = decide("UW-Madison", 88, 0.55, 4.1);
        assert_eq!(decision.tier, Tier::Match);
        assert_eq!(decision.rule, TierRule::FlagshipMatchCap);

        assert_eq!(decide("Ohio State University", 88, 0.55, 4.1).tier, Tier::Safety);
    }
}
