use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::correction::MetadataCorrector;
use super::dedup::dedup_candidates;
use super::display::normalize_display;
use super::domain::{Candidate, Constraints, StudentProfile, Tier};
use super::enrichment::{enrich_candidates, EnrichmentSettings};
use super::filter::HardFilterGate;
use super::instructions::InstructionBuilder;
use super::normalizer::NameKey;
use super::reference::ReferenceDataset;
use super::scoring::ScoringEngine;
use super::sources::{CandidateSource, FillRequest, StatisticsLookup};
use super::tables::InstitutionTables;
use crate::config::EngineConfig;

/// Round and fan-out limits for one balancing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalancerSettings {
    pub max_fill_rounds: usize,
    pub enrichment: EnrichmentSettings,
}

impl Default for BalancerSettings {
    fn default() -> Self {
        Self {
            max_fill_rounds: 2,
            enrichment: EnrichmentSettings::default(),
        }
    }
}

impl From<&EngineConfig> for BalancerSettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            max_fill_rounds: config.max_fill_rounds,
            enrichment: EnrichmentSettings {
                lookup_timeout: config.lookup_timeout,
                budget: config.enrichment_budget,
                concurrency: config.lookup_concurrency.max(1),
            },
        }
    }
}

/// Result of a balancing run with the bookkeeping the service reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalancedPool {
    pub candidates: Vec<Candidate>,
    pub fill_rounds: usize,
    pub backfilled: usize,
}

/// Per-tier counts of a candidate list.
pub fn tier_counts(candidates: &[Candidate]) -> BTreeMap<Tier, usize> {
    let mut counts: BTreeMap<Tier, usize> = Tier::ordered().into_iter().map(|tier| (tier, 0)).collect();
    for candidate in candidates {
        *counts.entry(candidate.tier).or_insert(0) += 1;
    }
    counts
}

/// Drives correction, scoring, filtering and bounded re-generation until each
/// tier holds `per_tier` candidates, then assembles the final pool.
pub struct PoolBalancer {
    tables: Arc<InstitutionTables>,
    reference: Arc<ReferenceDataset>,
    source: Arc<dyn CandidateSource>,
    lookup: Option<Arc<dyn StatisticsLookup>>,
    scoring: ScoringEngine,
    settings: BalancerSettings,
}

/// Identities touched during one run. Every raw name goes into the exclusion
/// list; every key blocks a later duplicate even if it was filtered out.
#[derive(Default)]
struct SeenSet {
    names: Vec<String>,
    raw: HashSet<String>,
    keys: HashSet<NameKey>,
}

impl SeenSet {
    fn record_name(&mut self, name: &str) {
        let trimmed = name.trim();
        if !trimmed.is_empty() && self.raw.insert(trimmed.to_string()) {
            self.names.push(trimmed.to_string());
        }
    }
}

impl PoolBalancer {
    pub fn new(
        tables: Arc<InstitutionTables>,
        reference: Arc<ReferenceDataset>,
        source: Arc<dyn CandidateSource>,
        lookup: Option<Arc<dyn StatisticsLookup>>,
        settings: BalancerSettings,
    ) -> Self {
        let scoring = ScoringEngine::new(tables.clone());
        Self {
            tables,
            reference,
            source,
            lookup,
            scoring,
            settings,
        }
    }

    pub fn tables(&self) -> &InstitutionTables {
        &self.tables
    }

    pub fn settings(&self) -> BalancerSettings {
        self.settings
    }

    /// Balanced, display-normalized pool of `3 * per_tier` candidates when
    /// enough eligible institutions exist, otherwise the best obtainable set.
    pub async fn build_recommendation_pool(
        &self,
        seed: Vec<Candidate>,
        profile: &StudentProfile,
        constraints: &Constraints,
        per_tier: usize,
    ) -> Vec<Candidate> {
        self.balance(seed, profile, constraints, per_tier)
            .await
            .candidates
    }

    pub async fn balance(
        &self,
        seed: Vec<Candidate>,
        profile: &StudentProfile,
        constraints: &Constraints,
        per_tier: usize,
    ) -> BalancedPool {
        if per_tier == 0 {
            return BalancedPool {
                candidates: Vec::new(),
                fill_rounds: 0,
                backfilled: 0,
            };
        }

        let target = per_tier * 3;
        let gate = HardFilterGate::new(constraints);
        let mut seen = SeenSet::default();

        let seed_len = seed.len();
        let fresh = self.admit_new(seed, &mut seen);
        let mut pool = self.process(fresh, profile, &gate).await;
        debug!(
            seed = seed_len,
            usable = pool.len(),
            constraints = %constraints,
            "processed seed candidates"
        );

        if pool.len() < target {
            self.top_up_from_reference(&mut pool, target, profile, &gate, &mut seen);
        }

        let mut fill_rounds = 0;
        while fill_rounds < self.settings.max_fill_rounds {
            let counts = tier_counts(&pool);
            let deficits: Vec<(Tier, usize)> = Tier::ordered()
                .into_iter()
                .filter_map(|tier| {
                    let have = counts.get(&tier).copied().unwrap_or(0);
                    (have < per_tier).then(|| (tier, per_tier - have + 1))
                })
                .collect();
            if deficits.is_empty() {
                break;
            }

            fill_rounds += 1;
            let builder = deficits
                .iter()
                .fold(InstructionBuilder::new(), |builder, (tier, count)| {
                    builder.request(*tier, *count)
                })
                .exclude(seen.names.iter().map(String::as_str))
                .constraints(constraints);
            let request = FillRequest {
                instructions: builder.build(),
                student_summary: profile.summary(),
                count: builder.total(),
            };

            info!(
                round = fill_rounds,
                requested = request.count,
                excluded = seen.names.len(),
                "requesting candidates for deficient tiers"
            );

            let batch = match self.source.request_candidates(&request).await {
                Ok(batch) => batch,
                Err(error) => {
                    warn!(round = fill_rounds, error = %error, "candidate source failed; assembling current pool");
                    break;
                }
            };

            let fresh = self.admit_new(batch, &mut seen);
            let newcomers = self.process(fresh, profile, &gate).await;
            if newcomers.is_empty() {
                info!(round = fill_rounds, "round produced no usable candidates; assembling current pool");
                break;
            }

            debug!(round = fill_rounds, added = newcomers.len(), "merged new candidates");
            let corrector = MetadataCorrector::new(&self.tables);
            let combined = pool
                .into_iter()
                .chain(newcomers)
                .map(|candidate| corrector.correct(candidate))
                .collect();
            pool = dedup_candidates(combined, &self.tables);
        }

        let (mut candidates, backfilled) = assemble(pool, per_tier);
        normalize_display(&mut candidates, &self.tables);

        if candidates.len() < target {
            warn!(
                produced = candidates.len(),
                target,
                "could not fill every tier; returning best available pool"
            );
        }
        info!(
            produced = candidates.len(),
            fill_rounds,
            backfilled,
            "recommendation pool assembled"
        );

        BalancedPool {
            candidates,
            fill_rounds,
            backfilled,
        }
    }

    /// Records raw names, applies reference data and correction, then drops
    /// anything whose key was already seen in this run.
    fn admit_new(&self, batch: Vec<Candidate>, seen: &mut SeenSet) -> Vec<Candidate> {
        let corrector = MetadataCorrector::new(&self.tables);
        let prepared: Vec<Candidate> = batch
            .into_iter()
            .filter(|candidate| !candidate.name.trim().is_empty())
            .map(|mut candidate| {
                seen.record_name(&candidate.name);
                self.reference.apply_reference(&mut candidate, &self.tables);
                corrector.correct(candidate)
            })
            .collect();

        dedup_candidates(prepared, &self.tables)
            .into_iter()
            .filter(|candidate| seen.keys.insert(self.tables.key_for(&candidate.name)))
            .collect()
    }

    /// Enrichment, scoring of anything unscored, then the hard filter.
    async fn process(
        &self,
        mut batch: Vec<Candidate>,
        profile: &StudentProfile,
        gate: &HardFilterGate<'_>,
    ) -> Vec<Candidate> {
        if batch.is_empty() {
            return batch;
        }

        if let Some(lookup) = &self.lookup {
            let report = enrich_candidates(&mut batch, lookup.as_ref(), self.settings.enrichment).await;
            if report.requested > 0 {
                debug!(
                    requested = report.requested,
                    enriched = report.enriched,
                    unavailable = report.unavailable,
                    failed = report.failed,
                    budget_exhausted = report.budget_exhausted,
                    "enrichment finished"
                );
                // Enriched state and enrollment feed region and size.
                let corrector = MetadataCorrector::new(&self.tables);
                batch = batch.into_iter().map(|candidate| corrector.correct(candidate)).collect();
            }
        }

        for candidate in batch.iter_mut().filter(|candidate| !candidate.is_scored()) {
            if !self.scoring.score(candidate, profile) {
                debug!(name = %candidate.name, "admit rate unavailable; keeping suggested tier");
            }
        }

        gate.apply(batch)
    }

    /// Adds eligible reference institutions round-robin across tiers, in
    /// dataset order, until the pool reaches `target`.
    fn top_up_from_reference(
        &self,
        pool: &mut Vec<Candidate>,
        target: usize,
        profile: &StudentProfile,
        gate: &HardFilterGate<'_>,
        seen: &mut SeenSet,
    ) {
        let corrector = MetadataCorrector::new(&self.tables);
        let mut queues: BTreeMap<Tier, VecDeque<Candidate>> = BTreeMap::new();
        for candidate in self.reference.fallback_candidates(&seen.keys) {
            let mut candidate = corrector.correct(candidate);
            self.scoring.score(&mut candidate, profile);
            if gate.admits(&candidate) {
                queues.entry(candidate.tier).or_default().push_back(candidate);
            }
        }

        let before = pool.len();
        'fill: while pool.len() < target {
            let mut progressed = false;
            for tier in Tier::ordered() {
                if pool.len() >= target {
                    break 'fill;
                }
                if let Some(candidate) = queues.get_mut(&tier).and_then(|queue| queue.pop_front()) {
                    seen.record_name(&candidate.name);
                    seen.keys.insert(self.tables.key_for(&candidate.name));
                    pool.push(candidate);
                    progressed = true;
                }
            }
            if !progressed {
                break;
            }
        }

        if pool.len() > before {
            debug!(added = pool.len() - before, "topped up pool from reference dataset");
        }
    }
}

/// Sorts each tier, takes the first `per_tier`, then backfills short tiers
/// with the unused candidate closest to the tier midpoint. Returns the pool
/// in reach, match, safety order and the number of reassigned candidates.
pub fn assemble(pool: Vec<Candidate>, per_tier: usize) -> (Vec<Candidate>, usize) {
    let mut used = vec![false; pool.len()];
    let mut chosen: BTreeMap<Tier, Vec<usize>> = BTreeMap::new();

    for tier in Tier::ordered() {
        let mut members: Vec<usize> = (0..pool.len()).filter(|&i| pool[i].tier == tier).collect();
        // stable sorts keep pool order among ties
        match tier {
            Tier::Safety => members.sort_by_key(|&i| std::cmp::Reverse(pool[i].ordering_probability())),
            Tier::Reach | Tier::Match => members.sort_by_key(|&i| pool[i].ordering_probability()),
        }
        let taken: Vec<usize> = members.into_iter().take(per_tier).collect();
        for &i in &taken {
            used[i] = true;
        }
        chosen.insert(tier, taken);
    }

    let mut reassigned: Vec<(usize, Tier)> = Vec::new();
    for tier in Tier::ordered() {
        let midpoint = i16::from(tier.midpoint());
        let slots = chosen.entry(tier).or_default();
        while slots.len() < per_tier {
            let closest = (0..pool.len())
                .filter(|&i| !used[i])
                .min_by_key(|&i| ((i16::from(pool[i].ordering_probability()) - midpoint).abs(), i));
            let Some(i) = closest else {
                break;
            };
            used[i] = true;
            slots.push(i);
            reassigned.push((i, tier));
        }
    }

    let backfilled = reassigned.len();
    let mut slots: Vec<Option<Candidate>> = pool.into_iter().map(Some).collect();
    for (i, tier) in reassigned {
        if let Some(candidate) = slots[i].as_mut() {
            debug!(
                name = %candidate.name,
                from = candidate.tier.label(),
                to = tier.label(),
                "backfilled candidate into short tier"
            );
            candidate.tier = tier;
        }
    }

    let ordered = Tier::ordered()
        .into_iter()
        .flat_map(|tier| chosen.remove(&tier).unwrap_or_default())
        .filter_map(|i| slots[i].take())
        .collect();

    (ordered, backfilled)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(tier: Tier, probability: u8, name: &str) -> Candidate {
        Candidate::new(name, tier).with_probability(probability)
    }

    #[test]
    fn assembly_sorts_each_tier() {
        let pool = vec![
            named(Tier::Reach, 25, "Reach A"),
            named(Tier::Reach, 10, "Reach B"),
            named(Tier::Safety, 82, "Safety A"),
            named(Tier::Safety, 93, "Safety B"),
            named(Tier::Match, 60, "Match A"),
            named(Tier::Match, 35, "Match B"),
        ];

        let (assembled, backfilled) = assemble(pool, 2);
        let names: Vec<_> = assembled.iter().map(|c| c.name.as_str()).collect();

        assert_eq!(backfilled, 0);
        assert_eq!(
            names,
            vec!["Reach B", "Reach A", "Match B", "Match A", "Safety B", "Safety A"]
        );
    }

    #[test]
    fn backfill_borrows_the_closest_to_the_midpoint() {
        let pool = vec![
            named(Tier::Reach, 12, "Reach A"),
            named(Tier::Match, 31, "Match A"),
            named(Tier::Match, 50, "Match B"),
            named(Tier::Match, 70, "Match C"),
            named(Tier::Match, 78, "Match D"),
            named(Tier::Safety, 88, "Safety A"),
        ];

        let (assembled, backfilled) = assemble(pool, 2);

        assert_eq!(assembled.len(), 6);
        assert_eq!(backfilled, 2);
        let counts = tier_counts(&assembled);
        assert!(counts.values().all(|count| *count == 2));

        // Match keeps its two lowest; reach borrows 70 (closest to 20 of the
        // leftovers 70 and 78), safety then borrows 78.
        let names_in = |tier: Tier| -> Vec<&str> {
            assembled
                .iter()
                .filter(|c| c.tier == tier)
                .map(|c| c.name.as_str())
                .collect()
        };
        let reach = names_in(Tier::Reach);
        let safety = names_in(Tier::Safety);
        assert_eq!(reach, vec!["Reach A", "Match C"]);
        assert_eq!(safety, vec!["Safety A", "Match D"]);
    }

    #[test]
    fn unscored_candidates_sort_at_their_midpoint() {
        let pool = vec![
            named(Tier::Match, 70, "Scored"),
            Candidate::new("Unscored", Tier::Match),
        ];
        let (assembled, backfilled) = assemble(pool, 1);

        // 45 sorts ahead of 70, so the scored one is left over and borrowed.
        assert_eq!(backfilled, 1);
        assert_eq!(assembled.len(), 2);
        assert_eq!(assembled[0].name, "Scored");
        assert_eq!(assembled[0].tier, Tier::Reach);
        assert_eq!(assembled[1].name, "Unscored");
        assert_eq!(assembled[1].tier, Tier::Match);
    }

    #[test]
    fn short_pools_are_returned_whole() {
        let pool = vec![named(Tier::Match, 50, "Only")];
        let (assembled, backfilled) = assemble(pool, 3);
        assert_eq!(assembled.len(), 1);
        assert_eq!(backfilled, 0);
    }

    #[test]
    fn zero_per_tier_yields_nothing() {
        let pool = vec![named(Tier::Match, 50, "Only")];
        let (assembled, _) = assemble(pool, 0);
        assert!(assembled.is_empty());
    }
}
