use std::collections::HashSet;

use super::domain::Candidate;
use super::normalizer::NameKey;
use super::tables::InstitutionTables;

/// Keeps the first candidate of every normalized-key group. Input order is
/// priority order, so a later duplicate is always the one dropped.
pub fn dedup_candidates(candidates: Vec<Candidate>, tables: &InstitutionTables) -> Vec<Candidate> {
    let mut seen: HashSet<NameKey> = HashSet::with_capacity(candidates.len());
    candidates
        .into_iter()
        .filter(|candidate| seen.insert(tables.key_for(&candidate.name)))
        .collect()
}
