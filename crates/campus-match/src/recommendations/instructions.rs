use std::collections::BTreeMap;
use std::fmt::Write as _;

use super::domain::{Constraints, SizeCategory, Tier};

const RESPONSE_SHAPE: &str = r#"Respond with JSON only, shaped as {"candidates": [{"name": "...", "url": "...", "tier": "reach|match|safety", "enrollment": 0, "region": "Northeast|Southeast|Midwest|Southwest|West", "testing_policy": "required|optional|blind", "rationale": "..."}]}."#;

/// Plain-language instructions for one generative fill request.
#[derive(Debug, Clone, Default)]
pub struct InstructionBuilder<'a> {
    deficits: BTreeMap<Tier, usize>,
    exclusions: Vec<&'a str>,
    constraints: Option<&'a Constraints>,
}

impl<'a> InstructionBuilder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(mut self, tier: Tier, count: usize) -> Self {
        if count > 0 {
            *self.deficits.entry(tier).or_insert(0) += count;
        }
        self
    }

    pub fn exclude<I>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.exclusions.extend(names);
        self
    }

    pub fn constraints(mut self, constraints: &'a Constraints) -> Self {
        self.constraints = Some(constraints);
        self
    }

    pub fn total(&self) -> usize {
        self.deficits.values().sum()
    }

    pub fn build(&self) -> String {
        let mut text = String::new();

        if self.deficits.is_empty() {
            text.push_str("Recommend additional colleges and universities for this student.\n");
        } else {
            let wanted: Vec<String> = self
                .deficits
                .iter()
                .map(|(tier, count)| format!("{count} {} school{}", tier.label().to_lowercase(), plural(*count)))
                .collect();
            let _ = writeln!(text, "Recommend {} for this student.", wanted.join(", "));
        }

        if let Some(constraints) = self.constraints {
            for line in constraint_lines(constraints) {
                let _ = writeln!(text, "{line}");
            }
        }

        if !self.exclusions.is_empty() {
            let _ = writeln!(
                text,
                "Do not include any of these institutions: {}.",
                self.exclusions.join("; ")
            );
        }

        text.push_str("Use each institution's full official name and never repeat an institution.\n");
        text.push_str(RESPONSE_SHAPE);
        text
    }
}

/// Hard constraints as sentences, one per non-empty dimension.
pub fn constraint_lines(constraints: &Constraints) -> Vec<String> {
    let mut lines = Vec::new();
    if !constraints.regions.is_empty() {
        let regions: Vec<_> = constraints.regions.iter().map(|region| region.label()).collect();
        lines.push(format!(
            "Only include institutions located in these regions: {}.",
            regions.join(", ")
        ));
    }
    if !constraints.sizes.is_empty() {
        let sizes: Vec<_> = constraints
            .sizes
            .iter()
            .map(|size: &SizeCategory| size.label())
            .collect();
        lines.push(format!(
            "Only include institutions with these undergraduate sizes: {}.",
            sizes.join(", ")
        ));
    }
    if !constraints.testing_policies.is_empty() {
        let policies: Vec<_> = constraints
            .testing_policies
            .iter()
            .map(|policy| policy.label())
            .collect();
        lines.push(format!(
            "Only include institutions with these testing policies: {}.",
            policies.join(", ")
        ));
    }
    lines
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommendations::domain::{Region, TestingPolicy};

    #[test]
    fn renders_deficits_constraints_and_exclusions() {
        let constraints = Constraints {
            regions: [Region::West].into_iter().collect(),
            testing_policies: [TestingPolicy::Optional].into_iter().collect(),
            ..Constraints::default()
        };
        let builder = InstructionBuilder::new()
            .request(Tier::Safety, 2)
            .request(Tier::Reach, 1)
            .exclude(["Reed College", "UCLA"])
            .constraints(&constraints);

        let text = builder.build();

        assert_eq!(builder.total(), 3);
        assert!(text.contains("Recommend 1 reach school, 2 safety schools"));
        assert!(text.contains("Only include institutions located in these regions: West."));
        assert!(text.contains("test-optional"));
        assert!(text.contains("Do not include any of these institutions: Reed College; UCLA."));
        assert!(text.contains(r#"{"candidates""#));
    }

    #[test]
    fn open_constraints_add_no_lines() {
        assert!(constraint_lines(&Constraints::default()).is_empty());
        let text = InstructionBuilder::new().request(Tier::Match, 0).build();
        assert!(text.starts_with("Recommend additional colleges"));
        assert!(!text.contains("Only include"));
    }
}
