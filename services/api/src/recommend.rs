use crate::infra::{build_recommendation_service, parse_region, parse_size, parse_testing_policy};
use campus_match::config::AppConfig;
use campus_match::error::AppError;
use campus_match::recommendations::{
    Constraints, RecommendationRequest, RecommendationResponse, Region, SizeCategory,
    StudentProfile, TestingPolicy, Tier,
};
use campus_match::telemetry;
use clap::Args;

#[derive(Args, Debug, Default)]
pub(crate) struct RecommendArgs {
    /// Weighted GPA on a 0-5 scale
    #[arg(long)]
    pub(crate) gpa: Option<f64>,
    /// Course rigor score (0-100)
    #[arg(long)]
    pub(crate) rigor: Option<f64>,
    /// SAT total (400-1600)
    #[arg(long)]
    pub(crate) sat: Option<u16>,
    /// ACT composite (1-36), converted when no SAT is given
    #[arg(long)]
    pub(crate) act: Option<u8>,
    /// Restrict to a region; repeat for several
    #[arg(long, value_parser = parse_region)]
    pub(crate) region: Vec<Region>,
    /// Restrict to a size band; repeat for several
    #[arg(long, value_parser = parse_size)]
    pub(crate) size: Vec<SizeCategory>,
    /// Restrict to a testing policy; repeat for several
    #[arg(long, value_parser = parse_testing_policy)]
    pub(crate) testing: Vec<TestingPolicy>,
    /// Recommendations per tier (defaults to RECS_PER_TIER)
    #[arg(long)]
    pub(crate) per_tier: Option<usize>,
}

impl RecommendArgs {
    fn into_request(self) -> RecommendationRequest {
        RecommendationRequest {
            profile: StudentProfile {
                gpa_weighted: self.gpa,
                rigor_score: self.rigor,
                sat_total: self.sat,
                act_composite: self.act,
            },
            constraints: Constraints {
                sizes: self.size.into_iter().collect(),
                regions: self.region.into_iter().collect(),
                testing_policies: self.testing.into_iter().collect(),
            },
            per_tier: self.per_tier,
            seed: None,
        }
    }
}

pub(crate) async fn run_recommend(args: RecommendArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let service = build_recommendation_service(&config)?;
    let response = service.recommend(args.into_request()).await?;

    print!("{}", render_recommendations(&response));
    Ok(())
}

fn render_recommendations(response: &RecommendationResponse) -> String {
    let mut out = format!(
        "College recommendations ({} per tier, generated {})\n",
        response.per_tier,
        response.generated_at.format("%Y-%m-%d %H:%M UTC")
    );

    for tier in Tier::ordered() {
        let count = response.counts.get(&tier).copied().unwrap_or(0);
        out.push_str(&format!("\n{} ({}/{})\n", tier.label(), count, response.per_tier));
        for candidate in response.tier(tier) {
            let probability = candidate
                .admission_probability
                .map(|value| format!("{value:>2}%"))
                .unwrap_or_else(|| " --".to_string());
            let region = candidate.region.map(Region::label).unwrap_or("unknown region");
            let size = candidate
                .size_category
                .map(SizeCategory::label)
                .unwrap_or("size unknown");
            out.push_str(&format!(
                "  {probability}  {} [{region}, {size}]\n",
                candidate.name
            ));
        }
    }

    if response.shortfall {
        out.push_str(&format!(
            "\nOnly {} recommendations could be assembled after {} fill round(s).\n",
            response.recommendations.len(),
            response.fill_rounds
        ));
    }
    out
}
