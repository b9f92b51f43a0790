use crate::report::{run_report, ReportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use housing_shortfall::error::AppError;
use housing_shortfall::estimate::DemolitionRatio;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Housing Shortfall Estimator",
    about = "Estimate the national housing shortfall and serve the breakdown over HTTP",
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
    /// Print the shortfall narrative (or JSON) for the configured scenario
    Report(ReportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    #[command(flatten)]
    pub(crate) inputs: ScenarioArgs,
}

/// Replacements for the built-in reference inputs.
#[derive(Args, Debug, Default, Clone)]
pub(crate) struct ScenarioArgs {
    /// JSON scenario replacing the built-in 2024 reference scenario
    #[arg(long)]
    pub(crate) scenario: Option<PathBuf>,
    /// CSV of `age,population` rows replacing the scenario's age distribution
    #[arg(long)]
    pub(crate) age_distribution: Option<PathBuf>,
    /// Fixed demolition ratio in [0, 1) used for years without published net completions
    #[arg(long, value_parser = parse_demolition_ratio)]
    pub(crate) demolition_ratio: Option<DemolitionRatio>,
}

pub(crate) fn parse_demolition_ratio(raw: &str) -> Result<DemolitionRatio, String> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|err| format!("failed to parse '{raw}' as a number ({err})"))?;
    DemolitionRatio::new(value).map_err(|err| err.to_string())
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Report(args) => run_report(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn report_accepts_scenario_overrides() {
        let cli = Cli::try_parse_from([
            "housing-shortfall",
            "report",
            "--demolition-ratio",
            "0.2",
            "--json",
        ])
        .expect("arguments parse");

        match cli.command {
            Some(Command::Report(args)) => {
                assert!(args.json);
                let ratio = args.inputs.demolition_ratio.expect("ratio parsed");
                assert_eq!(ratio.value(), 0.2);
            }
            other => panic!("expected report command, got {other:?}"),
        }
    }

    #[test]
    fn demolition_ratio_must_be_below_one() {
        assert!(parse_demolition_ratio("0.12").is_ok());
        assert!(parse_demolition_ratio("1").is_err());
        assert!(parse_demolition_ratio("lots").is_err());
    }
}
