use std::collections::BTreeSet;

use super::domain::{Candidate, Constraints};

/// Dimension a candidate failed, reported for debug logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintMiss {
    Size,
    Region,
    TestingPolicy,
}

impl ConstraintMiss {
    pub fn label(self) -> &'static str {
        match self {
            ConstraintMiss::Size => "size",
            ConstraintMiss::Region => "region",
            ConstraintMiss::TestingPolicy => "testing policy",
        }
    }
}

/// Hard user constraints applied to corrected candidates only.
#[derive(Debug, Clone, Copy)]
pub struct HardFilterGate<'a> {
    constraints: &'a Constraints,
}

impl<'a> HardFilterGate<'a> {
    pub fn new(constraints: &'a Constraints) -> Self {
        Self { constraints }
    }

    /// First failing dimension, or `None` when the candidate survives.
    /// An unknown value never satisfies a non-empty dimension.
    pub fn check(&self, candidate: &Candidate) -> Option<ConstraintMiss> {
        if !allows(&self.constraints.sizes, candidate.size_category) {
            return Some(ConstraintMiss::Size);
        }
        if !allows(&self.constraints.regions, candidate.region) {
            return Some(ConstraintMiss::Region);
        }
        if !allows(&self.constraints.testing_policies, candidate.testing_policy) {
            return Some(ConstraintMiss::TestingPolicy);
        }
        None
    }

    pub fn admits(&self, candidate: &Candidate) -> bool {
        self.check(candidate).is_none()
    }

    pub fn apply(&self, candidates: Vec<Candidate>) -> Vec<Candidate> {
        if self.constraints.is_open() {
            return candidates;
        }
        candidates
            .into_iter()
            .filter(|candidate| match self.check(candidate) {
                Some(miss) => {
                    tracing::debug!(name = %candidate.name, dimension = miss.label(), "filtered candidate");
                    false
                }
                None => true,
            })
            .collect()
    }
}

fn allows<T: Ord>(allowed: &BTreeSet<T>, value: Option<T>) -> bool {
    allowed.is_empty() || value.map_or(false, |value| allowed.contains(&value))
}
