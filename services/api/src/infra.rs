use campus_match::config::AppConfig;
use campus_match::error::AppError;
use campus_match::recommendations::{
    BalancerSettings, CandidateSource, ChatCompletionSource, DisabledSource, InstitutionTables,
    ReferenceDataset, RecommendationService, Region, ScorecardLookup, SizeCategory,
    StatisticsLookup, TestingPolicy,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Generation calls return a whole batch at once, so they get more room
/// than a single statistics lookup.
const GENERATOR_TIMEOUT: Duration = Duration::from_secs(45);

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Wires tables, reference data and the configured adapters into a service.
pub(crate) fn build_recommendation_service(
    config: &AppConfig,
) -> Result<RecommendationService, AppError> {
    let engine = &config.engine;

    let tables = match engine.tables_path.as_deref() {
        Some(path) => InstitutionTables::from_json_path(path)?,
        None => InstitutionTables::default(),
    };
    let reference = match engine.reference_dataset.as_deref() {
        Some(path) => ReferenceDataset::from_path(path, &tables)?,
        None => ReferenceDataset::bundled(&tables)?,
    };
    info!(institutions = reference.len(), "reference dataset loaded");

    let source: Arc<dyn CandidateSource> = match config.sources.generator.as_ref() {
        Some(generator) => {
            info!(model = %generator.model, "generative candidate source enabled");
            Arc::new(ChatCompletionSource::new(generator, GENERATOR_TIMEOUT)?)
        }
        None => {
            warn!("GENERATOR_BASE_URL not set; relying on seeds and reference data");
            Arc::new(DisabledSource)
        }
    };

    let lookup: Option<Arc<dyn StatisticsLookup>> = match config.sources.scorecard.as_ref() {
        Some(scorecard) => Some(Arc::new(ScorecardLookup::new(
            scorecard,
            engine.lookup_timeout,
        )?)),
        None => None,
    };

    Ok(RecommendationService::new(
        Arc::new(tables),
        Arc::new(reference),
        source,
        lookup,
        BalancerSettings::from(engine),
        engine.per_tier,
    ))
}

pub(crate) fn parse_region(raw: &str) -> Result<Region, String> {
    Region::parse(raw).ok_or_else(|| {
        format!("unknown region '{raw}' (expected Northeast, Southeast, Midwest, Southwest or West)")
    })
}

pub(crate) fn parse_size(raw: &str) -> Result<SizeCategory, String> {
    SizeCategory::parse(raw).ok_or_else(|| {
        format!("unknown size '{raw}' (expected very_small, small, medium, large or very_large)")
    })
}

pub(crate) fn parse_testing_policy(raw: &str) -> Result<TestingPolicy, String> {
    TestingPolicy::parse(raw)
        .ok_or_else(|| format!("unknown testing policy '{raw}' (expected required, optional or blind)"))
}
