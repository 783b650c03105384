use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::balancer::{tier_counts, BalancerSettings, PoolBalancer};
use super::domain::{Candidate, Constraints, StudentProfile, Tier};
use super::instructions::InstructionBuilder;
use super::reference::ReferenceDataset;
use super::sources::{CandidateSource, FillRequest, StatisticsLookup};
use super::tables::InstitutionTables;

/// Inbound recommendation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    #[serde(default)]
    pub profile: StudentProfile,
    #[serde(default)]
    pub constraints: Constraints,
    #[serde(default)]
    pub per_tier: Option<usize>,
    /// Pre-generated candidates. Without a seed the service asks the
    /// generative source for one.
    #[serde(default)]
    pub seed: Option<Vec<Candidate>>,
}

/// Balanced pool plus the bookkeeping callers display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationResponse {
    pub recommendations: Vec<Candidate>,
    pub per_tier: usize,
    pub counts: BTreeMap<Tier, usize>,
    pub shortfall: bool,
    pub fill_rounds: usize,
    pub backfilled: usize,
    pub generated_at: DateTime<Utc>,
}

impl RecommendationResponse {
    pub fn tier(&self, tier: Tier) -> impl Iterator<Item = &Candidate> {
        self.recommendations
            .iter()
            .filter(move |candidate| candidate.tier == tier)
    }
}

/// Error raised before any balancing happens.
#[derive(Debug, thiserror::Error)]
pub enum RecommendationError {
    #[error("per_tier must be between 1 and {max} (found {found})")]
    InvalidPerTier { max: usize, found: usize },
}

const MAX_PER_TIER: usize = 10;

/// Service composing the balancer with its collaborators.
pub struct RecommendationService {
    balancer: PoolBalancer,
    source: Arc<dyn CandidateSource>,
    default_per_tier: usize,
}

impl RecommendationService {
    pub fn new(
        tables: Arc<InstitutionTables>,
        reference: Arc<ReferenceDataset>,
        source: Arc<dyn CandidateSource>,
        lookup: Option<Arc<dyn StatisticsLookup>>,
        settings: BalancerSettings,
        default_per_tier: usize,
    ) -> Self {
        let balancer = PoolBalancer::new(tables, reference, source.clone(), lookup, settings);
        Self {
            balancer,
            source,
            default_per_tier: default_per_tier.max(1),
        }
    }

    pub fn default_per_tier(&self) -> usize {
        self.default_per_tier
    }

    pub fn balancer(&self) -> &PoolBalancer {
        &self.balancer
    }

    pub async fn recommend(
        &self,
        request: RecommendationRequest,
    ) -> Result<RecommendationResponse, RecommendationError> {
        let per_tier = request.per_tier.unwrap_or(self.default_per_tier);
        if per_tier == 0 || per_tier > MAX_PER_TIER {
            return Err(RecommendationError::InvalidPerTier {
                max: MAX_PER_TIER,
                found: per_tier,
            });
        }

        let seed = match request.seed {
            Some(seed) => seed,
            None => self.initial_seed(&request.profile, &request.constraints, per_tier).await,
        };

        let balanced = self
            .balancer
            .balance(seed, &request.profile, &request.constraints, per_tier)
            .await;

        let counts = tier_counts(&balanced.candidates);
        let shortfall = balanced.candidates.len() < per_tier * 3;
        info!(
            per_tier,
            produced = balanced.candidates.len(),
            shortfall,
            "recommendations ready"
        );

        Ok(RecommendationResponse {
            recommendations: balanced.candidates,
            per_tier,
            counts,
            shortfall,
            fill_rounds: balanced.fill_rounds,
            backfilled: balanced.backfilled,
            generated_at: Utc::now(),
        })
    }

    /// First generative call: `per_tier` for each tier plus one spare round's worth.
    async fn initial_seed(
        &self,
        profile: &StudentProfile,
        constraints: &Constraints,
        per_tier: usize,
    ) -> Vec<Candidate> {
        let builder = Tier::ordered()
            .into_iter()
            .fold(InstructionBuilder::new(), |builder, tier| {
                builder.request(tier, per_tier)
            })
            .request(Tier::Match, per_tier)
            .constraints(constraints);
        let request = FillRequest {
            instructions: builder.build(),
            student_summary: profile.summary(),
            count: builder.total(),
        };

        match self.source.request_candidates(&request).await {
            Ok(seed) => seed,
            Err(error) => {
                warn!(error = %error, "initial candidate request failed; starting from an empty seed");
                Vec::new()
            }
        }
    }
}
