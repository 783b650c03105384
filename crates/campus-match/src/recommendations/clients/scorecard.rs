use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::ScorecardConfig;
use crate::recommendations::domain::SatBands;
use crate::recommendations::normalizer::normalize_name;
use crate::recommendations::sources::{InstitutionStats, SourceError, StatisticsLookup};

const NAME: &str = "school.name";
const STATE: &str = "school.state";
const ADMIT_RATE: &str = "latest.admissions.admission_rate.overall";
const SIZE: &str = "latest.student.size";
const SAT_READING_25: &str = "latest.admissions.sat_scores.25th_percentile.critical_reading";
const SAT_MATH_25: &str = "latest.admissions.sat_scores.25th_percentile.math";
const SAT_READING_75: &str = "latest.admissions.sat_scores.75th_percentile.critical_reading";
const SAT_MATH_75: &str = "latest.admissions.sat_scores.75th_percentile.math";

/// College Scorecard `schools` endpoint.
#[derive(Debug, Clone)]
pub struct ScorecardLookup {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl ScorecardLookup {
    pub fn new(config: &ScorecardConfig, timeout: Duration) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/schools", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
        })
    }

    fn fields() -> String {
        [
            NAME,
            STATE,
            ADMIT_RATE,
            SIZE,
            SAT_READING_25,
            SAT_MATH_25,
            SAT_READING_75,
            SAT_MATH_75,
        ]
        .join(",")
    }
}

#[async_trait]
impl StatisticsLookup for ScorecardLookup {
    async fn lookup(&self, name: &str) -> Result<Option<InstitutionStats>, SourceError> {
        let fields = Self::fields();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("school.name", name),
                ("fields", fields.as_str()),
                ("per_page", "5"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await?;
        Ok(parse_stats(&body, name))
    }
}

/// Picks the result whose name normalizes like `requested` and extracts the
/// statistics the engine uses. `school.name` is a fuzzy search, so a response
/// with no normalized match means the institution is unknown.
pub fn parse_stats(body: &Value, requested: &str) -> Option<InstitutionStats> {
    let results = body.get("results")?.as_array()?;
    let wanted = normalize_name(requested);
    let row = results.iter().find(|row| {
        row.get(NAME)
            .and_then(Value::as_str)
            .is_some_and(|name| normalize_name(name) == wanted)
    })?;

    let number = |key: &str| row.get(key).and_then(Value::as_f64);
    let sat_total = |reading: &str, math: &str| -> Option<u16> {
        let total = number(reading)? + number(math)?;
        (total.is_finite() && total > 0.0 && total <= 1600.0).then(|| total.round() as u16)
    };

    let sat_bands = match (
        sat_total(SAT_READING_25, SAT_MATH_25),
        sat_total(SAT_READING_75, SAT_MATH_75),
    ) {
        (Some(p25), Some(p75)) => SatBands::new(p25, p75),
        _ => None,
    };

    Some(InstitutionStats {
        admit_rate: number(ADMIT_RATE).filter(|rate| (0.0..=1.0).contains(rate)),
        sat_bands,
        enrollment: number(SIZE)
            .filter(|size| size.is_finite() && *size > 0.0)
            .map(|size| size.min(f64::from(u32::MAX)) as u32),
        state: row
            .get(STATE)
            .and_then(Value::as_str)
            .map(|state| state.trim().to_ascii_uppercase())
            .filter(|state| !state.is_empty()),
    })
}
