use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::domain::{Candidate, SatBands};

/// One request to the generative source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FillRequest {
    pub instructions: String,
    pub student_summary: String,
    pub count: usize,
}

/// Authoritative statistics for one institution. Every field is optional;
/// absent values leave the candidate's prior data in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstitutionStats {
    pub admit_rate: Option<f64>,
    pub sat_bands: Option<SatBands>,
    pub enrollment: Option<u32>,
    pub state: Option<String>,
}

impl InstitutionStats {
    /// Copies known values onto the candidate. Returns true when anything changed.
    pub fn apply_to(&self, candidate: &mut Candidate) -> bool {
        let before = (
            candidate.admit_rate,
            candidate.sat_bands,
            candidate.enrollment,
            candidate.state.clone(),
        );

        if let Some(rate) = self.admit_rate.filter(|rate| (0.0..=1.0).contains(rate)) {
            candidate.admit_rate = Some(rate);
        }
        if let Some(bands) = self.sat_bands {
            candidate.sat_bands = Some(bands);
        }
        if let Some(enrollment) = self.enrollment.filter(|enrollment| *enrollment > 0) {
            candidate.enrollment = enrollment;
        }
        if let Some(state) = self.state.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            candidate.state = Some(state.to_ascii_uppercase());
        }

        before
            != (
                candidate.admit_rate,
                candidate.sat_bands,
                candidate.enrollment,
                candidate.state.clone(),
            )
    }
}

/// Generative recommendation source. Output is untrusted.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    async fn request_candidates(&self, request: &FillRequest) -> Result<Vec<Candidate>, SourceError>;
}

/// Authoritative per-institution statistics.
#[async_trait]
pub trait StatisticsLookup: Send + Sync {
    async fn lookup(&self, name: &str) -> Result<Option<InstitutionStats>, SourceError>;
}

/// Failure talking to an external collaborator.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed payload: {0}")]
    Malformed(String),
    #[error("timed out after {0} ms")]
    Timeout(u64),
}

impl From<reqwest::Error> for SourceError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            SourceError::Timeout(0)
        } else {
            SourceError::Transport(value.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(value: serde_json::Error) -> Self {
        SourceError::Malformed(value.to_string())
    }
}

/// Stand-in used when no generator is configured; always yields nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSource;

#[async_trait]
impl CandidateSource for DisabledSource {
    async fn request_candidates(&self, request: &FillRequest) -> Result<Vec<Candidate>, SourceError> {
        tracing::debug!(count = request.count, "candidate source disabled; returning no candidates");
        Ok(Vec::new())
    }
}
