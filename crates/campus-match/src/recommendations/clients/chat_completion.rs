use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::GeneratorConfig;
use crate::recommendations::domain::{Candidate, Region, TestingPolicy, Tier};
use crate::recommendations::sources::{CandidateSource, FillRequest, SourceError};

const SYSTEM_PROMPT: &str = "You are a college admissions counselor. Recommend real, accredited \
four-year institutions in the United States. Follow every instruction exactly and answer with \
JSON only.";

/// OpenAI-compatible chat-completions endpoint used as the generative source.
#[derive(Debug, Clone)]
pub struct ChatCompletionSource {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl ChatCompletionSource {
    pub fn new(config: &GeneratorConfig, timeout: Duration) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    fn payload(&self, request: &FillRequest) -> Value {
        json!({
            "model": self.model,
            "temperature": 0.2,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                {
                    "role": "user",
                    "content": format!("{}\n\n{}", request.student_summary, request.instructions),
                },
            ],
        })
    }
}

#[async_trait]
impl CandidateSource for ChatCompletionSource {
    async fn request_candidates(&self, request: &FillRequest) -> Result<Vec<Candidate>, SourceError> {
        let mut call = self.client.post(&self.endpoint).json(&self.payload(request));
        if let Some(key) = &self.api_key {
            call = call.bearer_auth(key);
        }

        let response = call.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let completion: Value = response.json().await?;
        let content = completion
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| SourceError::Malformed("completion has no message content".to_string()))?;

        let candidates = parse_candidates(content)?;
        tracing::debug!(
            requested = request.count,
            received = candidates.len(),
            "generative source responded"
        );
        Ok(candidates)
    }
}

#[derive(Debug, Deserialize)]
struct GeneratedBatch {
    #[serde(default)]
    candidates: Vec<GeneratedCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeneratedCandidate {
    #[serde(default)]
    name: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    tier: String,
    #[serde(default)]
    enrollment: Option<f64>,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    testing_policy: Option<String>,
    /// Display-only. Kept for candidates that never get an admit rate and
    /// normalized into the final tier's band before it is shown.
    #[serde(default)]
    admission_probability: Option<f64>,
    #[serde(default)]
    rationale: String,
}

/// Parses the `{"candidates": [...]}` body a generator returns. Entries with
/// no name or an unrecognized tier are skipped. Region and testing policy are
/// kept as best-available values for correction to override. Statistics the
/// generator volunteers beyond enrollment are dropped; authoritative data
/// fills them.
pub fn parse_candidates(content: &str) -> Result<Vec<Candidate>, SourceError> {
    let batch: GeneratedBatch = serde_json::from_str(strip_code_fence(content))?;

    let candidates = batch
        .candidates
        .into_iter()
        .filter_map(|generated| {
            let name = generated.name.trim();
            if name.is_empty() {
                return None;
            }
            let Some(tier) = Tier::parse(&generated.tier) else {
                tracing::debug!(name, tier = %generated.tier, "skipping candidate with unknown tier");
                return None;
            };

            let mut candidate = Candidate::new(name, tier);
            candidate.url = generated.url.trim().to_string();
            candidate.rationale = generated.rationale.trim().to_string();
            candidate.enrollment = generated
                .enrollment
                .filter(|value| value.is_finite() && *value > 0.0)
                .map(|value| value.min(f64::from(u32::MAX)) as u32)
                .unwrap_or(0);
            candidate.region = generated.region.as_deref().and_then(Region::parse);
            candidate.testing_policy = generated
                .testing_policy
                .as_deref()
                .and_then(TestingPolicy::parse);
            candidate.admission_probability = generated
                .admission_probability
                .filter(|value| value.is_finite())
                .map(|value| value.clamp(1.0, 95.0).round() as u8);
            Some(candidate)
        })
        .collect();

    Ok(candidates)
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.strip_prefix("json").unwrap_or(rest);
    body.strip_suffix("```").unwrap_or(body).trim()
}
