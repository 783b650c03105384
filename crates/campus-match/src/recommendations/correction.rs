use std::sync::OnceLock;

use regex::Regex;

use super::domain::{Candidate, SizeCategory, TestingPolicy};
use super::geography;
use super::normalizer::NameKey;
use super::tables::InstitutionTables;

fn university_of_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:the )?university of (?P<rest>.+)$").expect("static regex compiles")
    })
}

fn state_university_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<state>.+?) state university\b").expect("static regex compiles")
    })
}

/// Overwrites the fields a generative source cannot be trusted with:
/// size category, region and testing policy. Applying it twice yields the
/// same candidate as applying it once.
#[derive(Debug, Clone, Copy)]
pub struct MetadataCorrector<'a> {
    tables: &'a InstitutionTables,
}

impl<'a> MetadataCorrector<'a> {
    pub fn new(tables: &'a InstitutionTables) -> Self {
        Self { tables }
    }

    pub fn correct(&self, mut candidate: Candidate) -> Candidate {
        let key = self.tables.key_for(&candidate.name);

        if let Some(size) = SizeCategory::from_enrollment(candidate.enrollment) {
            candidate.size_category = Some(size);
        }

        let state = self
            .curated_state(&key)
            .or_else(|| candidate.state.as_deref().and_then(geography::canonical_code))
            .or_else(|| inferred_state(&key));
        if let Some(code) = state {
            candidate.state = Some(code.to_string());
            if let Some(region) = geography::region_for_state(code) {
                candidate.region = Some(region);
            }
        }

        if self.tables.requires_tests(&key) {
            candidate.testing_policy = Some(TestingPolicy::Required);
        }

        candidate
    }

    /// State from the curated override table. Beats any supplied state.
    fn curated_state(&self, key: &NameKey) -> Option<&'static str> {
        self.tables
            .state_override(key)
            .and_then(geography::canonical_code)
    }

    /// Alias table first, then name patterns, then any state name in the text.
    pub fn infer_state(&self, key: &NameKey) -> Option<&'static str> {
        self.curated_state(key).or_else(|| inferred_state(key))
    }
}

fn inferred_state(key: &NameKey) -> Option<&'static str> {
    pattern_state(key.as_str()).or_else(|| substring_state(key.as_str()))
}

fn pattern_state(name: &str) -> Option<&'static str> {
    if let Some(rest) = university_of_pattern()
        .captures(name)
        .and_then(|caps| caps.name("rest"))
    {
        let rest = rest.as_str();
        let matched = geography::names_longest_first()
            .into_iter()
            .find(|state| rest == *state || rest.starts_with(&format!("{state} ")));
        if let Some(state) = matched {
            return geography::code_for_name(state);
        }
    }

    state_university_pattern()
        .captures(name)
        .and_then(|caps| caps.name("state"))
        .and_then(|state| geography::code_for_name(state.as_str()))
}

fn substring_state(name: &str) -> Option<&'static str> {
    let padded = format!(" {name} ");
    geography::names_longest_first()
        .into_iter()
        .find(|state| padded.contains(&format!(" {state} ")))
        .and_then(geography::code_for_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommendations::domain::{Region, Tier};

    fn corrector_fixture() -> InstitutionTables {
        InstitutionTables::default()
    }

    #[test]
    fn size_category_is_rederived_from_enrollment() {
        let tables = corrector_fixture();
        let corrector = MetadataCorrector::new(&tables);
        let mut candidate = Candidate::new("Example College", Tier::Match).with_enrollment(1_999);
        candidate.size_category = Some(SizeCategory::VeryLarge);

        let corrected = corrector.correct(candidate);
        assert_eq!(corrected.size_category, Some(SizeCategory::VerySmall));
    }

    #[test]
    fn zero_enrollment_leaves_size_untouched() {
        let tables = corrector_fixture();
        let corrector = MetadataCorrector::new(&tables);
        let mut candidate = Candidate::new("Example College", Tier::Match);
        candidate.size_category = Some(SizeCategory::Medium);

        let corrected = corrector.correct(candidate);
        assert_eq!(corrected.size_category, Some(SizeCategory::Medium));
    }

    #[test]
    fn region_comes_from_alias_table_before_name_text() {
        let tables = corrector_fixture();
        let corrector = MetadataCorrector::new(&tables);

        let washu = corrector.correct(
            Candidate::new("Washington University in St. Louis", Tier::Reach)
                .with_region(Region::West),
        );
        assert_eq!(washu.region, Some(Region::Midwest));
        assert_eq!(washu.state.as_deref(), Some("MO"));

        let miami = corrector.correct(
            Candidate::new("Miami University", Tier::Match).with_region(Region::Southeast),
        );
        assert_eq!(miami.region, Some(Region::Midwest));
    }

    #[test]
    fn region_patterns_prefer_compound_state_names() {
        let tables = corrector_fixture();
        let corrector = MetadataCorrector::new(&tables);

        let unc = corrector.correct(Candidate::new(
            "University of North Carolina Wilmington",
            Tier::Match,
        ));
        assert_eq!(unc.state.as_deref(), Some("NC"));
        assert_eq!(unc.region, Some(Region::Southeast));

        let wvu = corrector.correct(Candidate::new("West Virginia University", Tier::Safety));
        assert_eq!(wvu.state.as_deref(), Some("WV"));

        let osu = corrector.correct(Candidate::new("Oregon State University", Tier::Match));
        assert_eq!(osu.region, Some(Region::West));

        let ark = corrector.correct(Candidate::new("University of Arkansas", Tier::Safety));
        assert_eq!(ark.state.as_deref(), Some("AR"));
    }

    #[test]
    fn explicit_state_wins_over_inference() {
        let tables = corrector_fixture();
        let corrector = MetadataCorrector::new(&tables);
        let mut candidate = Candidate::new("Texas Christian University", Tier::Match);
        candidate.state = Some("tx".to_string());
        candidate.region = Some(Region::Midwest);

        let corrected = corrector.correct(candidate);
        assert_eq!(corrected.state.as_deref(), Some("TX"));
        assert_eq!(corrected.region, Some(Region::Southwest));
    }

    #[test]
    fn curated_state_beats_a_supplied_state() {
        let tables = corrector_fixture();
        let corrector = MetadataCorrector::new(&tables);
        let mut candidate = Candidate::new("Miami University", Tier::Match);
        candidate.state = Some("FL".to_string());
        candidate.region = Some(Region::Southeast);

        let corrected = corrector.correct(candidate);
        assert_eq!(corrected.state.as_deref(), Some("OH"));
        assert_eq!(corrected.region, Some(Region::Midwest));
        assert_eq!(corrector.correct(corrected.clone()), corrected);
    }

    #[test]
    fn unmatched_region_is_left_unchanged() {
        let tables = corrector_fixture();
        let corrector = MetadataCorrector::new(&tables);
        let candidate = Candidate::new("Harvey Mudd College", Tier::Reach).with_region(Region::West);

        let corrected = corrector.correct(candidate);
        assert_eq!(corrected.region, Some(Region::West));
        assert!(corrected.state.is_none());
    }

    #[test]
    fn curated_institutions_are_forced_to_test_required() {
        let tables = corrector_fixture();
        let corrector = MetadataCorrector::new(&tables);
        let candidate =
            Candidate::new("MIT", Tier::Reach).with_testing_policy(TestingPolicy::Optional);

        let corrected = corrector.correct(candidate);
        assert_eq!(corrected.testing_policy, Some(TestingPolicy::Required));

        let other = corrector.correct(
            Candidate::new("Bates College", Tier::Match).with_testing_policy(TestingPolicy::Optional),
        );
        assert_eq!(other.testing_policy, Some(TestingPolicy::Optional));
    }

    #[test]
    fn correction_is_idempotent() {
        let tables = corrector_fixture();
        let corrector = MetadataCorrector::new(&tables);
        let candidate = Candidate::new("University of Colorado Boulder", Tier::Match)
            .with_enrollment(38_000)
            .with_region(Region::Midwest)
            .with_testing_policy(TestingPolicy::Blind);

        let once = corrector.correct(candidate);
        let twice = corrector.correct(once.clone());
        assert_eq!(once, twice);
        assert_eq!(once.region, Some(Region::West));
        assert_eq!(once.size_category, Some(SizeCategory::VeryLarge));
    }
}
