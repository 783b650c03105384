use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use super::domain::{Candidate, SatBands, TestingPolicy, Tier};
use super::normalizer::NameKey;
use super::tables::InstitutionTables;

const BUNDLED_DATASET: &str = include_str!("../../data/reference_institutions.csv");

/// Curated institution row with authoritative attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceInstitution {
    pub name: String,
    pub url: String,
    pub state: Option<String>,
    pub enrollment: u32,
    pub admit_rate: Option<f64>,
    pub testing_policy: Option<TestingPolicy>,
    pub sat_bands: Option<SatBands>,
}

impl ReferenceInstitution {
    /// Tier hint from the population admit rate. The scoring pass replaces it.
    fn suggested_tier(&self) -> Tier {
        match self.admit_rate {
            Some(rate) if rate < 0.25 => Tier::Reach,
            Some(rate) if rate < 0.60 => Tier::Match,
            Some(_) => Tier::Safety,
            None => Tier::Match,
        }
    }

    pub fn to_candidate(&self) -> Candidate {
        let mut candidate = Candidate::new(self.name.clone(), self.suggested_tier())
            .with_enrollment(self.enrollment);
        candidate.url = self.url.clone();
        candidate.state = self.state.clone();
        candidate.admit_rate = self.admit_rate;
        candidate.testing_policy = self.testing_policy;
        candidate.sat_bands = self.sat_bands;
        candidate.rationale = "Drawn from the curated reference list.".to_string();
        candidate
    }
}

#[derive(Debug, Deserialize)]
struct ReferenceRow {
    name: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    enrollment: Option<u32>,
    #[serde(default)]
    admit_rate: Option<f64>,
    #[serde(default)]
    testing_policy: Option<String>,
    #[serde(default)]
    sat_25: Option<u16>,
    #[serde(default)]
    sat_75: Option<u16>,
}

/// Immutable reference dataset indexed by canonical name key.
#[derive(Debug, Clone, Default)]
pub struct ReferenceDataset {
    rows: Vec<ReferenceInstitution>,
    keys: Vec<NameKey>,
    index: HashMap<NameKey, usize>,
}

impl ReferenceDataset {
    /// Dataset compiled into the crate.
    pub fn bundled(tables: &InstitutionTables) -> Result<Self, DatasetError> {
        Self::from_reader(BUNDLED_DATASET.as_bytes(), tables)
    }

    pub fn from_path(path: &Path, tables: &InstitutionTables) -> Result<Self, DatasetError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, tables)
    }

    /// Parses CSV rows. Later rows sharing a key with an earlier one are ignored.
    pub fn from_reader<R: Read>(reader: R, tables: &InstitutionTables) -> Result<Self, DatasetError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut dataset = Self::default();
        for (position, record) in csv_reader.deserialize::<ReferenceRow>().enumerate() {
            let row = record?;
            // header occupies line 1
            let line = position + 2;
            let institution = validate(row, line)?;
            let key = tables.key_for(&institution.name);
            if dataset.index.contains_key(&key) {
                tracing::debug!(name = %institution.name, line, "skipping duplicate reference row");
                continue;
            }
            dataset.index.insert(key.clone(), dataset.rows.len());
            dataset.keys.push(key);
            dataset.rows.push(institution);
        }

        tracing::debug!(rows = dataset.rows.len(), "loaded reference dataset");
        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn find(&self, key: &NameKey) -> Option<&ReferenceInstitution> {
        self.index.get(key).map(|position| &self.rows[*position])
    }

    /// Overwrites the candidate's trusted fields with the matching row, if any.
    pub fn apply_reference(&self, candidate: &mut Candidate, tables: &InstitutionTables) -> bool {
        let key = tables.key_for(&candidate.name);
        let Some(row) = self.find(&key) else {
            return false;
        };

        if row.enrollment > 0 {
            candidate.enrollment = row.enrollment;
        }
        if row.admit_rate.is_some() {
            candidate.admit_rate = row.admit_rate;
        }
        if row.testing_policy.is_some() {
            candidate.testing_policy = row.testing_policy;
        }
        if row.state.is_some() {
            candidate.state = row.state.clone();
        }
        if row.sat_bands.is_some() {
            candidate.sat_bands = row.sat_bands;
        }
        if candidate.url.trim().is_empty() {
            candidate.url = row.url.clone();
        }
        true
    }

    /// Rows whose keys are not in `exclude`, as candidates in dataset order.
    pub fn fallback_candidates(&self, exclude: &HashSet<NameKey>) -> Vec<Candidate> {
        self.rows
            .iter()
            .zip(&self.keys)
            .filter(|(_, key)| !exclude.contains(*key))
            .map(|(row, _)| row.to_candidate())
            .collect()
    }
}

fn validate(row: ReferenceRow, line: usize) -> Result<ReferenceInstitution, DatasetError> {
    let name = row.name.trim().to_string();
    if name.is_empty() {
        return Err(DatasetError::InvalidRow {
            line,
            detail: "missing institution name".to_string(),
        });
    }

    if let Some(rate) = row.admit_rate {
        if !(0.0..=1.0).contains(&rate) {
            return Err(DatasetError::InvalidRow {
                line,
                detail: format!("admit rate {rate} outside 0-1"),
            });
        }
    }

    let sat_bands = match (row.sat_25, row.sat_75) {
        (Some(p25), Some(p75)) => Some(SatBands::new(p25, p75).ok_or_else(|| {
            DatasetError::InvalidRow {
                line,
                detail: format!("invalid SAT bands {p25}-{p75}"),
            }
        })?),
        _ => None,
    };

    Ok(ReferenceInstitution {
        name,
        url: row.url,
        state: row
            .state
            .map(|state| state.trim().to_ascii_uppercase())
            .filter(|state| !state.is_empty()),
        enrollment: row.enrollment.unwrap_or(0),
        admit_rate: row.admit_rate,
        testing_policy: row.testing_policy.as_deref().and_then(TestingPolicy::parse),
        sat_bands,
    })
}

/// Failure loading the reference dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to read reference dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse reference dataset: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid reference row on line {line}: {detail}")]
    InvalidRow { line: usize, detail: String },
}
