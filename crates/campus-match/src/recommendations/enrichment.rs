use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, warn};

use super::domain::Candidate;
use super::sources::{SourceError, StatisticsLookup};

/// Limits for one enrichment fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrichmentSettings {
    pub lookup_timeout: Duration,
    pub budget: Duration,
    pub concurrency: usize,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            lookup_timeout: Duration::from_millis(4_000),
            budget: Duration::from_millis(12_000),
            concurrency: 8,
        }
    }
}

/// Tally of a fan-out, logged by the balancer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichmentReport {
    pub requested: usize,
    pub enriched: usize,
    pub unavailable: usize,
    pub failed: usize,
    pub budget_exhausted: bool,
}

/// Looks up authoritative statistics for every unscored candidate that has
/// no admit rate yet. Lookups run concurrently, each under its own timeout,
/// and the whole step stops at the budget keeping whatever already arrived.
/// Any failure leaves the candidate's prior values untouched.
pub async fn enrich_candidates(
    candidates: &mut [Candidate],
    lookup: &dyn StatisticsLookup,
    settings: EnrichmentSettings,
) -> EnrichmentReport {
    let pending: Vec<(usize, String)> = candidates
        .iter()
        .enumerate()
        .filter(|(_, candidate)| !candidate.is_scored() && candidate.admit_rate.is_none())
        .map(|(position, candidate)| (position, candidate.name.clone()))
        .collect();

    let mut report = EnrichmentReport {
        requested: pending.len(),
        ..EnrichmentReport::default()
    };
    if pending.is_empty() {
        return report;
    }

    let per_lookup = settings.lookup_timeout;
    let timeout_ms = u64::try_from(per_lookup.as_millis()).unwrap_or(u64::MAX);
    let deadline = Instant::now() + settings.budget;

    let mut results = stream::iter(pending)
        .map(|(position, name)| async move {
            let outcome = match timeout(per_lookup, lookup.lookup(&name)).await {
                Ok(result) => result,
                Err(_) => Err(SourceError::Timeout(timeout_ms)),
            };
            (position, name, outcome)
        })
        .buffer_unordered(settings.concurrency.max(1));

    loop {
        let next = match timeout_at(deadline, results.next()).await {
            Ok(next) => next,
            Err(_) => {
                report.budget_exhausted = true;
                warn!(
                    budget_ms = u64::try_from(settings.budget.as_millis()).unwrap_or(u64::MAX),
                    completed = report.enriched + report.unavailable + report.failed,
                    requested = report.requested,
                    "enrichment budget exhausted; continuing with partial results"
                );
                break;
            }
        };

        let Some((position, name, outcome)) = next else {
            break;
        };

        match outcome {
            Ok(Some(stats)) => {
                if stats.apply_to(&mut candidates[position]) {
                    report.enriched += 1;
                } else {
                    report.unavailable += 1;
                }
            }
            Ok(None) => {
                debug!(name = %name, "no authoritative statistics found");
                report.unavailable += 1;
            }
            Err(error) => {
                warn!(name = %name, error = %error, "statistics lookup failed");
                report.failed += 1;
            }
        }
    }

    report
}
