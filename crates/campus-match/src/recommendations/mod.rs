//! Candidate pool classification and balancing.
//!
//! Raw candidates from a generative source are corrected against curated
//! tables and the reference dataset, scored for one student, classified into
//! reach/match/safety, filtered by hard constraints and balanced into an
//! even pool with bounded re-generation rounds and a deterministic backfill.

pub mod balancer;
pub mod clients;
pub(crate) mod correction;
pub(crate) mod dedup;
pub(crate) mod display;
pub mod domain;
pub(crate) mod enrichment;
pub(crate) mod filter;
pub(crate) mod geography;
pub mod instructions;
pub mod normalizer;
pub mod reference;
pub mod router;
pub mod scoring;
pub mod service;
pub mod sources;
pub mod tables;

#[cfg(test)]
mod tests;

pub use balancer::{assemble, tier_counts, BalancedPool, BalancerSettings, PoolBalancer};
pub use clients::{ChatCompletionSource, ScorecardLookup};
pub use correction::MetadataCorrector;
pub use dedup::dedup_candidates;
pub use display::{fnv1a64, normalize_display};
pub use domain::{
    Candidate, Constraints, Region, SatBands, SizeCategory, StudentProfile, TestingPolicy, Tier,
};
pub use enrichment::{enrich_candidates, EnrichmentReport, EnrichmentSettings};
pub use filter::{ConstraintMiss, HardFilterGate};
pub use normalizer::{normalize_name, NameKey};
pub use reference::{DatasetError, ReferenceDataset, ReferenceInstitution};
pub use router::recommendation_router;
pub use scoring::{Adjustment, AdjustmentFactor, Assessment, ScoringEngine, TierDecision, TierRule};
pub use service::{
    RecommendationError, RecommendationRequest, RecommendationResponse, RecommendationService,
};
pub use sources::{
    CandidateSource, DisabledSource, FillRequest, InstitutionStats, SourceError, StatisticsLookup,
};
pub use tables::{InstitutionTables, TableEntries};
