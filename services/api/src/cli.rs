use crate::recommend::{run_recommend, RecommendArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use campus_match::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Campus Match",
    about = "Serve or print tier-balanced college recommendations",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Build one balanced recommendation list and print it grouped by tier
    Recommend(RecommendArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Recommend(args) => run_recommend(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_match::recommendations::{Region, TestingPolicy};

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["campus-match-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn recommend_collects_repeated_constraints() {
        let cli = Cli::try_parse_from([
            "campus-match-api",
            "recommend",
            "--gpa",
            "3.7",
            "--region",
            "west",
            "--region",
            "Northeast",
            "--testing",
            "optional",
            "--per-tier",
            "2",
        ])
        .expect("parses");

        let Some(Command::Recommend(args)) = cli.command else {
            panic!("expected recommend command");
        };
        assert_eq!(args.gpa, Some(3.7));
        assert_eq!(args.region, vec![Region::West, Region::Northeast]);
        assert_eq!(args.testing, vec![TestingPolicy::Optional]);
        assert_eq!(args.per_tier, Some(2));
    }

    #[test]
    fn unknown_region_is_rejected() {
        let result = Cli::try_parse_from(["campus-match-api", "recommend", "--region", "atlantis"]);
        assert!(result.is_err());
    }
}
