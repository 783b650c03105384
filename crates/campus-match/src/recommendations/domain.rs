use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Admission-likelihood tier a recommendation is presented under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Reach,
    Match,
    Safety,
}

impl Tier {
    pub const fn ordered() -> [Self; 3] {
        [Self::Reach, Self::Match, Self::Safety]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Reach => "Reach",
            Self::Match => "Match",
            Self::Safety => "Safety",
        }
    }

    /// Probability the backfill pass aims for when it borrows a candidate.
    pub const fn midpoint(self) -> u8 {
        match self {
            Self::Reach => 20,
            Self::Match => 45,
            Self::Safety => 80,
        }
    }

    /// Inclusive range a replacement display value is drawn from.
    pub const fn display_band(self) -> (u8, u8) {
        match self {
            Self::Reach => (5, 29),
            Self::Match => (30, 79),
            Self::Safety => (80, 95),
        }
    }

    /// Inclusive range of probabilities consistent with this tier. Wider than
    /// `display_band` at the bottom: a computed reach of 1-4% is shown as is.
    pub const fn consistent_range(self) -> (u8, u8) {
        match self {
            Self::Reach => (1, 29),
            Self::Match => (30, 79),
            Self::Safety => (80, 95),
        }
    }

    pub fn accepts(self, probability: u8) -> bool {
        let (low, high) = self.consistent_range();
        (low..=high).contains(&probability)
    }

    /// Lenient parse of source wording ("Target" and "Likely" included).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "reach" | "stretch" => Some(Self::Reach),
            "match" | "target" => Some(Self::Match),
            "safety" | "likely" => Some(Self::Safety),
            _ => None,
        }
    }
}

/// US census-style regions used for geographic constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Region {
    Northeast,
    Southeast,
    Midwest,
    Southwest,
    West,
}

impl Region {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Northeast => "Northeast",
            Self::Southeast => "Southeast",
            Self::Midwest => "Midwest",
            Self::Southwest => "Southwest",
            Self::West => "West",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "northeast" => Some(Self::Northeast),
            "southeast" | "south" => Some(Self::Southeast),
            "midwest" => Some(Self::Midwest),
            "southwest" => Some(Self::Southwest),
            "west" | "westcoast" => Some(Self::West),
            _ => None,
        }
    }
}

/// Enrollment bands. Always derived from `enrollment`, never trusted from a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeCategory {
    VerySmall,
    Small,
    Medium,
    Large,
    VeryLarge,
}

impl SizeCategory {
    /// Bands an enrollment count. Zero means unknown and yields `None`.
    pub fn from_enrollment(enrollment: u32) -> Option<Self> {
        match enrollment {
            0 => None,
            1..=1_999 => Some(Self::VerySmall),
            2_000..=5_000 => Some(Self::Small),
            5_001..=15_000 => Some(Self::Medium),
            15_001..=30_000 => Some(Self::Large),
            _ => Some(Self::VeryLarge),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::VerySmall => "very small (under 2,000 students)",
            Self::Small => "small (2,000-5,000 students)",
            Self::Medium => "medium (5,000-15,000 students)",
            Self::Large => "large (15,000-30,000 students)",
            Self::VeryLarge => "very large (over 30,000 students)",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "very_small" | "micro" => Some(Self::VerySmall),
            "small" => Some(Self::Small),
            "medium" => Some(Self::Medium),
            "large" => Some(Self::Large),
            "very_large" | "huge" => Some(Self::VeryLarge),
            _ => None,
        }
    }
}

/// Standardized-testing admission policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestingPolicy {
    Optional,
    Required,
    Blind,
}

impl TestingPolicy {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Optional => "test-optional",
            Self::Required => "test-required",
            Self::Blind => "test-blind",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let lowered = raw.trim().to_ascii_lowercase();
        if lowered.contains("blind") || lowered.contains("free") {
            Some(Self::Blind)
        } else if lowered.contains("optional") || lowered.contains("flexible") {
            Some(Self::Optional)
        } else if lowered.contains("required") || lowered.contains("mandatory") {
            Some(Self::Required)
        } else {
            None
        }
    }
}

/// Institution-reported 25th/75th percentile SAT totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SatBands {
    pub p25: u16,
    pub p75: u16,
}

impl SatBands {
    /// Rejects inverted or out-of-scale bands.
    pub fn new(p25: u16, p75: u16) -> Option<Self> {
        if p25 == 0 || p25 > p75 || p75 > 1600 {
            return None;
        }
        Some(Self { p25, p75 })
    }

    pub fn midpoint(&self) -> f64 {
        (f64::from(self.p25) + f64::from(self.p75)) / 2.0
    }
}

/// A proposed institution recommendation moving through the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    #[serde(default)]
    pub url: String,
    pub tier: Tier,
    #[serde(default)]
    pub region: Option<Region>,
    #[serde(default)]
    pub size_category: Option<SizeCategory>,
    #[serde(default)]
    pub enrollment: u32,
    #[serde(default)]
    pub testing_policy: Option<TestingPolicy>,
    #[serde(default)]
    pub admission_probability: Option<u8>,
    #[serde(default)]
    pub rationale: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admit_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sat_bands: Option<SatBands>,
    #[serde(skip)]
    pub(crate) scored: bool,
}

impl Candidate {
    pub fn new(name: impl Into<String>, tier: Tier) -> Self {
        Self {
            name: name.into(),
            url: String::new(),
            tier,
            region: None,
            size_category: None,
            enrollment: 0,
            testing_policy: None,
            admission_probability: None,
            rationale: String::new(),
            state: None,
            admit_rate: None,
            sat_bands: None,
            scored: false,
        }
    }

    pub fn with_probability(mut self, probability: u8) -> Self {
        self.admission_probability = Some(probability);
        self
    }

    pub fn with_enrollment(mut self, enrollment: u32) -> Self {
        self.enrollment = enrollment;
        self
    }

    pub fn with_admit_rate(mut self, admit_rate: f64) -> Self {
        self.admit_rate = Some(admit_rate);
        self
    }

    pub fn with_region(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }

    pub fn with_testing_policy(mut self, policy: TestingPolicy) -> Self {
        self.testing_policy = Some(policy);
        self
    }

    /// True once the probability engine has produced this candidate's number.
    pub fn is_scored(&self) -> bool {
        self.scored
    }

    /// Probability used for ordering; unscored candidates sit at their tier's midpoint.
    pub(crate) fn ordering_probability(&self) -> u8 {
        self.admission_probability
            .unwrap_or_else(|| self.tier.midpoint())
    }
}

/// Student academic profile. Every field is optional; the engine defaults the gaps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentProfile {
    #[serde(default)]
    pub gpa_weighted: Option<f64>,
    #[serde(default)]
    pub rigor_score: Option<f64>,
    #[serde(default)]
    pub sat_total: Option<u16>,
    #[serde(default)]
    pub act_composite: Option<u8>,
}

impl StudentProfile {
    pub const DEFAULT_GPA: f64 = 3.0;
    pub const DEFAULT_RIGOR: f64 = 50.0;

    pub fn gpa_or_default(&self) -> f64 {
        self.gpa_weighted
            .filter(|gpa| gpa.is_finite())
            .map(|gpa| gpa.clamp(0.0, 5.0))
            .unwrap_or(Self::DEFAULT_GPA)
    }

    pub fn rigor_or_default(&self) -> f64 {
        self.rigor_score
            .filter(|rigor| rigor.is_finite())
            .map(|rigor| rigor.clamp(0.0, 100.0))
            .unwrap_or(Self::DEFAULT_RIGOR)
    }

    /// Plain-language one-liner handed to the generative source.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        match self.gpa_weighted {
            Some(gpa) => parts.push(format!("weighted GPA {gpa:.2}")),
            None => parts.push("GPA not provided".to_string()),
        }
        if let Some(rigor) = self.rigor_score {
            parts.push(format!("course rigor {rigor:.0}/100"));
        }
        if let Some(sat) = self.sat_total {
            parts.push(format!("SAT {sat}"));
        }
        if let Some(act) = self.act_composite {
            parts.push(format!("ACT {act}"));
        }
        if self.sat_total.is_none() && self.act_composite.is_none() {
            parts.push("no standardized test scores".to_string());
        }
        format!("Student profile: {}.", parts.join(", "))
    }
}

/// User-selected hard filters. An empty set leaves that dimension open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraints {
    #[serde(default)]
    pub sizes: BTreeSet<SizeCategory>,
    #[serde(default)]
    pub regions: BTreeSet<Region>,
    #[serde(default)]
    pub testing_policies: BTreeSet<TestingPolicy>,
}

impl Constraints {
    pub fn is_open(&self) -> bool {
        self.sizes.is_empty() && self.regions.is_empty() && self.testing_policies.is_empty()
    }
}

impl fmt::Display for Constraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_open() {
            return write!(f, "no constraints");
        }
        let mut parts = Vec::new();
        if !self.sizes.is_empty() {
            let sizes: Vec<_> = self.sizes.iter().map(|size| format!("{size:?}")).collect();
            parts.push(format!("sizes={}", sizes.join("|")));
        }
        if !self.regions.is_empty() {
            let regions: Vec<_> = self.regions.iter().map(|region| region.label()).collect();
            parts.push(format!("regions={}", regions.join("|")));
        }
        if !self.testing_policies.is_empty() {
            let policies: Vec<_> = self
                .testing_policies
                .iter()
                .map(|policy| policy.label())
                .collect();
            parts.push(format!("testing={}", policies.join("|")));
        }
        write!(f, "{}", parts.join(" "))
    }
}
