use crate::cli::ScenarioArgs;
use crate::infra::resolve_scenario;
use clap::Args;
use housing_shortfall::config::AppConfig;
use housing_shortfall::error::AppError;
use housing_shortfall::estimate::AdjustmentInputs;
use housing_shortfall::telemetry;
use housing_shortfall::ShortfallReport;
use std::fmt;

const MILLION: f64 = 1e6;

#[derive(Args, Debug, Default)]
pub(crate) struct ReportArgs {
    #[command(flatten)]
    pub(crate) inputs: ScenarioArgs,
    /// Emit the full report as JSON instead of the narrative
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let scenario = resolve_scenario(&config.scenario, &args.inputs)?;
    let report = scenario.evaluate()?;

    if args.json {
        let body = serde_json::to_string_pretty(&report)
            .map_err(|err| AppError::Io(std::io::Error::other(err)))?;
        println!("{body}");
    } else {
        println!("{}", Narrative::new(&report, &scenario.adjustments));
    }
    Ok(())
}

/// Plain-language walk through a report, figures in millions.
pub(crate) struct Narrative<'a> {
    report: &'a ShortfallReport,
    inputs: &'a AdjustmentInputs,
}

impl<'a> Narrative<'a> {
    pub(crate) fn new(report: &'a ShortfallReport, inputs: &'a AdjustmentInputs) -> Self {
        Self { report, inputs }
    }
}

impl fmt::Display for Narrative<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;
        let result = &report.shortfall;
        let date = report.reference_date.format("%-d %B %Y");

        writeln!(f, "Housing shortfall estimate: {}", report.scenario)?;
        writeln!(f)?;
        writeln!(
            f,
            "With satisfactory living arrangements, the number of households that would be formed as of {date} is: {} million",
            millions(result.required_households)
        )?;
        writeln!(
            f,
            "The number of dwellings physically present as of {date} is: {} million",
            millions(result.available_dwellings)
        )?;
        writeln!(
            f,
            "  (demolition ratio {:.4}, population {})",
            report.demolition_ratio, report.total_population
        )?;
        writeln!(f)?;

        writeln!(
            f,
            "{} dwellings (caravans, cabins, houseboats, improvised homes, tents) are not suitable for permanent habitation and are subtracted.",
            self.inputs.unsuitable_dwellings
        )?;
        writeln!(
            f,
            "This leaves usable dwellings of: {} million",
            millions(result.usable_dwellings)
        )?;
        writeln!(f)?;

        writeln!(
            f,
            "A healthy rental market needs a {:.1}% vacancy rate on the {:.1}% of households that rent.",
            self.inputs.healthy_vacancy_rate * 100.0,
            self.inputs.renting_fraction * 100.0
        )?;
        writeln!(
            f,
            "This adds {} million, giving homes needed of: {} million",
            millions(result.adjustments.rental_vacancy_buffer),
            millions(result.required_households_adjusted)
        )?;
        writeln!(f)?;

        writeln!(
            f,
            "A healthy sales market needs {} months of homes on the market; there were {} property transfers in the year.",
            self.inputs.months_of_inventory, self.inputs.annual_property_transfers
        )?;
        writeln!(
            f,
            "This adds {} million, giving homes needed of: {} million",
            millions(result.adjustments.sale_inventory_buffer),
            millions(result.total_required)
        )?;
        writeln!(f)?;

        if result.is_shortage() {
            writeln!(
                f,
                "This means there would be a shortage of: {} million homes",
                millions(result.shortage())
            )?;
        } else {
            writeln!(
                f,
                "Usable dwellings exceed the homes needed by: {} million",
                millions(result.net_shortfall)
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "This is a lower bound: it ignores whether existing homes are in suitable locations or of an appropriate type, both of which would increase the shortage."
        )
    }
}

fn millions(value: f64) -> String {
    format!("{:.3}", value / MILLION)
}
