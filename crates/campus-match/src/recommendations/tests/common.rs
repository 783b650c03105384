use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::recommendations::balancer::{BalancerSettings, PoolBalancer};
use crate::recommendations::domain::{Candidate, StudentProfile, Tier};
use crate::recommendations::reference::ReferenceDataset;
use crate::recommendations::service::RecommendationService;
use crate::recommendations::sources::{
    CandidateSource, FillRequest, InstitutionStats, SourceError, StatisticsLookup,
};
use crate::recommendations::tables::InstitutionTables;

/// Replays one scripted response per call, then returns nothing.
#[derive(Default)]
pub(super) struct ScriptedSource {
    rounds: Mutex<VecDeque<Result<Vec<Candidate>, SourceError>>>,
    requests: Mutex<Vec<FillRequest>>,
}

impl ScriptedSource {
    pub(super) fn with_rounds(rounds: Vec<Result<Vec<Candidate>, SourceError>>) -> Self {
        Self {
            rounds: Mutex::new(rounds.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn requests(&self) -> Vec<FillRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl CandidateSource for ScriptedSource {
    async fn request_candidates(&self, request: &FillRequest) -> Result<Vec<Candidate>, SourceError> {
        self.requests.lock().expect("requests lock").push(request.clone());
        self.rounds
            .lock()
            .expect("rounds lock")
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Produces one never-seen safety candidate per call, forever.
#[derive(Default)]
pub(super) struct EndlessSource {
    calls: Mutex<usize>,
}

impl EndlessSource {
    pub(super) fn calls(&self) -> usize {
        *self.calls.lock().expect("calls lock")
    }
}

#[async_trait]
impl CandidateSource for EndlessSource {
    async fn request_candidates(&self, _request: &FillRequest) -> Result<Vec<Candidate>, SourceError> {
        let mut calls = self.calls.lock().expect("calls lock");
        *calls += 1;
        Ok(vec![unscored(&format!("Endless College {}", *calls), Tier::Safety, 86)])
    }
}

/// Fixed statistics keyed by raw name.
#[derive(Default)]
pub(super) struct StaticLookup {
    stats: HashMap<String, InstitutionStats>,
}

impl StaticLookup {
    pub(super) fn with_rate(mut self, name: &str, admit_rate: f64, state: &str) -> Self {
        self.stats.insert(
            name.to_string(),
            InstitutionStats {
                admit_rate: Some(admit_rate),
                state: Some(state.to_string()),
                ..InstitutionStats::default()
            },
        );
        self
    }
}

#[async_trait]
impl StatisticsLookup for StaticLookup {
    async fn lookup(&self, name: &str) -> Result<Option<InstitutionStats>, SourceError> {
        Ok(self.stats.get(name).cloned())
    }
}

pub(super) fn tables() -> Arc<InstitutionTables> {
    Arc::new(InstitutionTables::default())
}

pub(super) fn empty_reference() -> Arc<ReferenceDataset> {
    Arc::new(ReferenceDataset::default())
}

pub(super) fn bundled_reference() -> Arc<ReferenceDataset> {
    Arc::new(ReferenceDataset::bundled(&InstitutionTables::default()).expect("bundled dataset"))
}

pub(super) fn balancer(
    source: Arc<dyn CandidateSource>,
    lookup: Option<Arc<dyn StatisticsLookup>>,
    reference: Arc<ReferenceDataset>,
) -> PoolBalancer {
    PoolBalancer::new(tables(), reference, source, lookup, BalancerSettings::default())
}

pub(super) fn service(
    source: Arc<dyn CandidateSource>,
    reference: Arc<ReferenceDataset>,
) -> RecommendationService {
    RecommendationService::new(
        tables(),
        reference,
        source,
        None,
        BalancerSettings::default(),
        3,
    )
}

pub(super) fn unscored(name: &str, tier: Tier, probability: u8) -> Candidate {
    Candidate::new(name, tier).with_probability(probability)
}

pub(super) fn strong_profile() -> StudentProfile {
    StudentProfile {
        gpa_weighted: Some(3.9),
        rigor_score: Some(75.0),
        sat_total: Some(1450),
        act_composite: None,
    }
}

/// 2 reach, 5 match, 1 safety; none of the names are in the curated tables.
pub(super) fn skewed_seed() -> Vec<Candidate> {
    vec![
        unscored("Alder College", Tier::Reach, 12),
        unscored("Birch College", Tier::Reach, 22),
        unscored("Cedar College", Tier::Match, 35),
        unscored("Dogwood College", Tier::Match, 42),
        unscored("Elm College", Tier::Match, 50),
        unscored("Fir College", Tier::Match, 61),
        unscored("Ginkgo College", Tier::Match, 74),
        unscored("Hazel College", Tier::Safety, 88),
    ]
}

pub(super) fn assert_in_band(candidates: &[Candidate]) {
    for candidate in candidates {
        let probability = candidate
            .admission_probability
            .expect("every output carries a probability");
        assert!(
            candidate.tier.accepts(probability),
            "{} shows {probability} under {:?}",
            candidate.name,
            candidate.tier
        );
    }
}

pub(super) fn assert_unique_keys(candidates: &[Candidate]) {
    let tables = InstitutionTables::default();
    let mut keys = HashSet::new();
    for candidate in candidates {
        assert!(
            keys.insert(tables.key_for(&candidate.name)),
            "duplicate key for {}",
            candidate.name
        );
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
