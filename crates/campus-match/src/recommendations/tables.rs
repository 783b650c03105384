use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::Deserialize;

use super::normalizer::{normalize_name, NameKey};
use crate::config::ConfigError;

/// Curated, immutable lookup data the engine consults. Built once per process
/// and shared read-only; every key is stored in normalized form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstitutionTables {
    aliases: BTreeMap<String, String>,
    state_overrides: BTreeMap<String, String>,
    most_selective: BTreeSet<String>,
    test_required: BTreeSet<String>,
    match_capped: BTreeSet<String>,
}

/// Raw file shape accepted by [`InstitutionTables::from_json_path`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TableEntries {
    pub aliases: BTreeMap<String, String>,
    pub state_overrides: BTreeMap<String, String>,
    pub most_selective: Vec<String>,
    pub test_required: Vec<String>,
    pub match_capped: Vec<String>,
}

impl InstitutionTables {
    pub fn from_entries(entries: TableEntries) -> Self {
        let aliases: BTreeMap<String, String> = entries
            .aliases
            .into_iter()
            .map(|(alias, canonical)| (normalize_name(&alias), normalize_name(&canonical)))
            .filter(|(alias, canonical)| !alias.is_empty() && !canonical.is_empty())
            .collect();

        let canonical = |raw: &str| -> String {
            let normalized = normalize_name(raw);
            aliases.get(&normalized).cloned().unwrap_or(normalized)
        };

        let state_overrides = entries
            .state_overrides
            .iter()
            .map(|(name, state)| (canonical(name), state.trim().to_ascii_uppercase()))
            .collect();
        let most_selective = entries.most_selective.iter().map(|n| canonical(n)).collect();
        let test_required = entries.test_required.iter().map(|n| canonical(n)).collect();
        let match_capped = entries.match_capped.iter().map(|n| canonical(n)).collect();

        Self {
            aliases,
            state_overrides,
            most_selective,
            test_required,
            match_capped,
        }
    }

    /// Loads tables from a JSON document, replacing the built-in data wholesale.
    pub fn from_json_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|err| ConfigError::Tables {
            path: path.to_path_buf(),
            detail: err.to_string(),
        })?;
        let entries: TableEntries =
            serde_json::from_str(&raw).map_err(|err| ConfigError::Tables {
                path: path.to_path_buf(),
                detail: err.to_string(),
            })?;
        Ok(Self::from_entries(entries))
    }

    /// Canonical comparison key: normalized text with aliases resolved.
    pub fn key_for(&self, name: &str) -> NameKey {
        let normalized = normalize_name(name);
        let resolved = self.aliases.get(&normalized).cloned().unwrap_or(normalized);
        NameKey::from_normalized(resolved)
    }

    pub fn state_override(&self, key: &NameKey) -> Option<&str> {
        self.state_overrides.get(key.as_str()).map(String::as_str)
    }

    pub fn is_most_selective(&self, key: &NameKey) -> bool {
        self.most_selective.contains(key.as_str())
    }

    pub fn requires_tests(&self, key: &NameKey) -> bool {
        self.test_required.contains(key.as_str())
    }

    /// Flagships that may never be presented as a safety. Deliberately a
    /// short named list, not a threshold.
    pub fn is_match_capped(&self, key: &NameKey) -> bool {
        self.match_capped.contains(key.as_str())
    }
}

impl Default for InstitutionTables {
    fn default() -> Self {
        Self::from_entries(curated_entries())
    }
}

fn curated_entries() -> TableEntries {
    let aliases = [
        ("MIT", "Massachusetts Institute of Technology"),
        ("Caltech", "California Institute of Technology"),
        ("Cal Tech", "California Institute of Technology"),
        ("UCLA", "University of California, Los Angeles"),
        ("UC Berkeley", "University of California, Berkeley"),
        ("Berkeley", "University of California, Berkeley"),
        ("Cal", "University of California, Berkeley"),
        ("UCSD", "University of California, San Diego"),
        ("UC San Diego", "University of California, San Diego"),
        ("UCSB", "University of California, Santa Barbara"),
        ("UC Santa Barbara", "University of California, Santa Barbara"),
        ("UCI", "University of California, Irvine"),
        ("UC Irvine", "University of California, Irvine"),
        ("UC Davis", "University of California, Davis"),
        ("USC", "University of Southern California"),
        ("NYU", "New York University"),
        ("CMU", "Carnegie Mellon University"),
        ("Carnegie Mellon", "Carnegie Mellon University"),
        ("UPenn", "University of Pennsylvania"),
        ("Penn", "University of Pennsylvania"),
        ("JHU", "Johns Hopkins University"),
        ("Johns Hopkins", "Johns Hopkins University"),
        ("UChicago", "University of Chicago"),
        ("WashU", "Washington University in St. Louis"),
        ("Washington University in Saint Louis", "Washington University in St. Louis"),
        ("UNC", "University of North Carolina at Chapel Hill"),
        ("UNC Chapel Hill", "University of North Carolina at Chapel Hill"),
        ("University of North Carolina", "University of North Carolina at Chapel Hill"),
        ("UVA", "University of Virginia"),
        ("UMich", "University of Michigan"),
        ("University of Michigan-Ann Arbor", "University of Michigan"),
        ("Georgia Tech", "Georgia Institute of Technology"),
        ("UT Austin", "University of Texas at Austin"),
        ("UIUC", "University of Illinois Urbana-Champaign"),
        ("University of Illinois at Urbana-Champaign", "University of Illinois Urbana-Champaign"),
        ("UW Madison", "University of Wisconsin-Madison"),
        ("UW-Madison", "University of Wisconsin-Madison"),
        ("Wisconsin", "University of Wisconsin-Madison"),
        ("Penn State", "Pennsylvania State University"),
        ("BU", "Boston University"),
        ("BC", "Boston College"),
        ("RPI", "Rensselaer Polytechnic Institute"),
        ("WPI", "Worcester Polytechnic Institute"),
        ("BYU", "Brigham Young University"),
        ("ASU", "Arizona State University"),
        ("UF", "University of Florida"),
        ("FSU", "Florida State University"),
        ("UMD", "University of Maryland"),
        ("UMass Amherst", "University of Massachusetts Amherst"),
        ("Columbia", "Columbia University"),
        ("Harvard", "Harvard University"),
        ("Stanford", "Stanford University"),
        ("Yale", "Yale University"),
        ("Princeton", "Princeton University"),
        ("Brown", "Brown University"),
        ("Cornell", "Cornell University"),
        ("Dartmouth", "Dartmouth College"),
        ("Duke", "Duke University"),
        ("Northwestern", "Northwestern University"),
        ("Rice", "Rice University"),
        ("Vanderbilt", "Vanderbilt University"),
        ("Notre Dame", "University of Notre Dame"),
        ("Georgetown", "Georgetown University"),
    ];

    let state_overrides = [
        ("Massachusetts Institute of Technology", "MA"),
        ("Harvard University", "MA"),
        ("Tufts University", "MA"),
        ("Boston University", "MA"),
        ("Boston College", "MA"),
        ("Yale University", "CT"),
        ("Princeton University", "NJ"),
        ("Columbia University", "NY"),
        ("Cornell University", "NY"),
        ("Dartmouth College", "NH"),
        ("Brown University", "RI"),
        ("Stanford University", "CA"),
        ("California Institute of Technology", "CA"),
        ("University of Southern California", "CA"),
        ("Northwestern University", "IL"),
        ("University of Chicago", "IL"),
        ("University of Notre Dame", "IN"),
        ("Purdue University", "IN"),
        ("Duke University", "NC"),
        ("Wake Forest University", "NC"),
        ("Vanderbilt University", "TN"),
        ("Emory University", "GA"),
        ("Georgia Institute of Technology", "GA"),
        ("Rice University", "TX"),
        ("Tulane University", "LA"),
        ("Carnegie Mellon University", "PA"),
        ("University of Pennsylvania", "PA"),
        ("Johns Hopkins University", "MD"),
        ("Georgetown University", "DC"),
        ("George Washington University", "DC"),
        ("Washington and Lee University", "VA"),
        ("Washington University in St. Louis", "MO"),
        ("Miami University", "OH"),
        ("University of Miami", "FL"),
        ("Brigham Young University", "UT"),
        ("Rensselaer Polytechnic Institute", "NY"),
        ("Worcester Polytechnic Institute", "MA"),
        ("New York University", "NY"),
    ];

    let most_selective = [
        "Harvard University",
        "Stanford University",
        "Massachusetts Institute of Technology",
        "Yale University",
        "Princeton University",
        "California Institute of Technology",
        "Columbia University",
        "University of Pennsylvania",
        "Brown University",
        "Dartmouth College",
        "Cornell University",
        "University of Chicago",
        "Duke University",
        "Northwestern University",
        "Johns Hopkins University",
        "Rice University",
        "Vanderbilt University",
    ];

    let test_required = [
        "Massachusetts Institute of Technology",
        "California Institute of Technology",
        "Harvard University",
        "Yale University",
        "Dartmouth College",
        "Brown University",
        "Stanford University",
        "University of Pennsylvania",
        "Cornell University",
        "Georgetown University",
        "Johns Hopkins University",
        "University of Texas at Austin",
        "Purdue University",
        "Georgia Institute of Technology",
        "University of Florida",
        "Florida State University",
        "University of Georgia",
    ];

    let match_capped = ["University of Texas at Austin", "University of Wisconsin-Madison"];

    TableEntries {
        aliases: pairs(&aliases),
        state_overrides: pairs(&state_overrides),
        most_selective: strings(&most_selective),
        test_required: strings(&test_required),
        match_capped: strings(&match_capped),
    }
}

fn pairs(values: &[(&str, &str)]) -> BTreeMap<String, String> {
    values
        .iter()
        .map(|(left, right)| (left.to_string(), right.to_string()))
        .collect()
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}
