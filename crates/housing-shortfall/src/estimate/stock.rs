use super::domain::{checked_total, EstimationError, EstimationStage, ValidationError, YearFraction};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

const STAGE: EstimationStage = EstimationStage::DwellingStock;

/// Census dwelling count and how far through its year the count was taken.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CensusBaseline {
    pub date: NaiveDate,
    pub dwelling_count: u64,
    pub elapsed: YearFraction,
}

impl CensusBaseline {
    pub fn new(date: NaiveDate, dwelling_count: u64) -> Self {
        Self {
            date,
            dwelling_count,
            elapsed: YearFraction::of_date(date),
        }
    }

    pub fn with_elapsed(mut self, elapsed: YearFraction) -> Self {
        self.elapsed = elapsed;
        self
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }
}

/// Date at which the stock is queried.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceDate {
    pub date: NaiveDate,
    pub elapsed: YearFraction,
}

impl ReferenceDate {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            elapsed: YearFraction::of_date(date),
        }
    }

    pub fn with_elapsed(mut self, elapsed: YearFraction) -> Self {
        self.elapsed = elapsed;
        self
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }
}

/// Share of gross completions that replace demolished stock.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct DemolitionRatio(f64);

impl DemolitionRatio {
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NonFinite {
                field: "demolition ratio",
                value,
            });
        }
        if !(0.0..1.0).contains(&value) {
            return Err(ValidationError::DemolitionRatioOutOfRange { value });
        }
        Ok(Self(value))
    }

    pub fn from_observation(observation: &DemolitionObservation) -> Result<Self, ValidationError> {
        let DemolitionObservation { year, gross, net } = *observation;
        if gross == 0 {
            return Err(ValidationError::ZeroGrossCompletions { year });
        }
        if net > gross {
            return Err(ValidationError::NetExceedsGross { year, gross, net });
        }
        Self::new((gross - net) as f64 / gross as f64)
    }

    pub const fn value(self) -> f64 {
        self.0
    }

    pub fn net_construction_ratio(self) -> f64 {
        1.0 - self.0
    }
}

impl TryFrom<f64> for DemolitionRatio {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DemolitionRatio> for f64 {
    fn from(value: DemolitionRatio) -> Self {
        value.0
    }
}

/// A year in which both gross and net completions were published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemolitionObservation {
    pub year: i32,
    pub gross: u64,
    pub net: u64,
}

/// Where the demolition ratio comes from.
///
/// An observed year is assumed to be representative of every year that only
/// publishes gross completions. `Fixed` lets a scenario override that.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemolitionAssumption {
    Observed(DemolitionObservation),
    Fixed(DemolitionRatio),
}

impl DemolitionAssumption {
    pub fn ratio(&self) -> Result<DemolitionRatio, ValidationError> {
        match self {
            DemolitionAssumption::Observed(observation) => {
                DemolitionRatio::from_observation(observation)
            }
            DemolitionAssumption::Fixed(ratio) => Ok(*ratio),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Completions {
    /// Gross dwellings completed in each quarter, before demolitions.
    QuarterlyGross([u64; 4]),
    /// Net additions published directly; no demolition ratio applies.
    PublishedNet(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnualConstruction {
    pub year: i32,
    pub completions: Completions,
}

impl AnnualConstruction {
    pub fn quarterly_gross(year: i32, quarters: [u64; 4]) -> Self {
        Self {
            year,
            completions: Completions::QuarterlyGross(quarters),
        }
    }

    pub fn published_net(year: i32, net: u64) -> Self {
        Self {
            year,
            completions: Completions::PublishedNet(net),
        }
    }

    pub fn net_construction(&self, ratio: DemolitionRatio) -> Result<f64, ValidationError> {
        match self.completions {
            Completions::QuarterlyGross(quarters) => {
                let gross = checked_total("quarterly gross completions", quarters)?;
                Ok(gross as f64 * ratio.net_construction_ratio())
            }
            Completions::PublishedNet(net) => Ok(net as f64),
        }
    }
}

/// Construction figures ordered by strictly increasing year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<AnnualConstruction>", into = "Vec<AnnualConstruction>")]
pub struct ConstructionSeries(Vec<AnnualConstruction>);

impl ConstructionSeries {
    pub fn new(entries: Vec<AnnualConstruction>) -> Result<Self, ValidationError> {
        for pair in entries.windows(2) {
            if pair[1].year <= pair[0].year {
                return Err(ValidationError::UnorderedConstructionYears {
                    previous: pair[0].year,
                    next: pair[1].year,
                });
            }
        }
        Ok(Self(entries))
    }

    pub fn entries(&self) -> &[AnnualConstruction] {
        &self.0
    }

    pub fn year(&self, year: i32) -> Option<&AnnualConstruction> {
        self.0.iter().find(|entry| entry.year == year)
    }
}

impl TryFrom<Vec<AnnualConstruction>> for ConstructionSeries {
    type Error = ValidationError;

    fn try_from(value: Vec<AnnualConstruction>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ConstructionSeries> for Vec<AnnualConstruction> {
    fn from(value: ConstructionSeries) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StockPoint {
    pub date: NaiveDate,
    pub dwelling_count: f64,
    /// Net construction credited between the previous point and this one.
    pub net_construction_applied: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DwellingStockTimeline {
    pub baseline: CensusBaseline,
    pub points: Vec<StockPoint>,
}

impl DwellingStockTimeline {
    /// Stock at the reference date; the last point of the timeline.
    pub fn at_target(&self) -> f64 {
        self.points
            .last()
            .map(|point| point.dwelling_count)
            .unwrap_or(self.baseline.dwelling_count as f64)
    }

    pub fn year_end(&self, year: i32) -> Option<f64> {
        let year_end = NaiveDate::from_ymd_opt(year, 12, 31)?;
        self.points
            .iter()
            .find(|point| point.date == year_end)
            .map(|point| point.dwelling_count)
    }
}

fn year_end_date(year: i32) -> Result<NaiveDate, ValidationError> {
    NaiveDate::from_ymd_opt(year, 12, 31).ok_or(ValidationError::DateOutOfRange { year })
}

/// Rolls a census dwelling count forward through net construction.
#[derive(Debug, Clone)]
pub struct DwellingStockProjector {
    baseline: CensusBaseline,
    series: ConstructionSeries,
    demolition_ratio: DemolitionRatio,
}

impl DwellingStockProjector {
    pub fn new(
        baseline: CensusBaseline,
        series: ConstructionSeries,
        demolition_ratio: DemolitionRatio,
    ) -> Self {
        Self {
            baseline,
            series,
            demolition_ratio,
        }
    }

    pub fn demolition_ratio(&self) -> DemolitionRatio {
        self.demolition_ratio
    }

    pub fn project(&self, target: ReferenceDate) -> Result<DwellingStockTimeline, EstimationError> {
        self.build_timeline(target).map_err(|err| STAGE.invalid(err))
    }

    fn annual_net(&self, year: i32) -> Result<f64, ValidationError> {
        self.series
            .year(year)
            .ok_or(ValidationError::MissingConstructionYear { year })?
            .net_construction(self.demolition_ratio)
    }

    fn build_timeline(&self, target: ReferenceDate) -> Result<DwellingStockTimeline, ValidationError> {
        let baseline_year = self.baseline.year();
        let target_year = target.year();
        if target_year < baseline_year
            || (target_year == baseline_year && target.elapsed < self.baseline.elapsed)
        {
            return Err(ValidationError::TargetBeforeBaseline {
                baseline: self.baseline.date,
                target: target.date,
            });
        }

        let mut points = Vec::with_capacity((target_year - baseline_year + 1) as usize);
        let baseline_count = self.baseline.dwelling_count as f64;

        if target_year == baseline_year {
            let applied = self.annual_net(baseline_year)?
                * (target.elapsed.value() - self.baseline.elapsed.value());
            points.push(StockPoint {
                date: target.date,
                dwelling_count: baseline_count + applied,
                net_construction_applied: applied,
            });
            return Ok(DwellingStockTimeline {
                baseline: self.baseline,
                points,
            });
        }

        let first_year = self.annual_net(baseline_year)? * self.baseline.elapsed.remaining();
        let mut stock = baseline_count + first_year;
        points.push(StockPoint {
            date: year_end_date(baseline_year)?,
            dwelling_count: stock,
            net_construction_applied: first_year,
        });
        debug!(year = baseline_year, stock, "projected first year-end stock");

        for year in (baseline_year + 1)..target_year {
            let net = self.annual_net(year)?;
            stock += net;
            points.push(StockPoint {
                date: year_end_date(year)?,
                dwelling_count: stock,
                net_construction_applied: net,
            });
            debug!(year, stock, "projected year-end stock");
        }

        let partial = self.annual_net(target_year)? * target.elapsed.value();
        points.push(StockPoint {
            date: target.date,
            dwelling_count: stock + partial,
            net_construction_applied: partial,
        });

        Ok(DwellingStockTimeline {
            baseline: self.baseline,
            points,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    fn fraction(value: f64) -> YearFraction {
        YearFraction::new(value).expect("valid fraction")
    }

    fn baseline() -> CensusBaseline {
        CensusBaseline::new(date(2021, 8, 10), 1_000_000).with_elapsed(fraction(0.6))
    }

    fn series() -> ConstructionSeries {
        ConstructionSeries::new(vec![
            AnnualConstruction::quarterly_gross(2021, [250, 250, 250, 250]),
            AnnualConstruction::quarterly_gross(2022, [500, 500, 500, 500]),
            AnnualConstruction::published_net(2023, 3_000),
        ])
        .expect("ordered series")
    }

    #[test]
    fn ratio_identity_holds_for_observation() {
        let ratio = DemolitionRatio::from_observation(&DemolitionObservation {
            year: 2024,
            gross: 177_000,
            net: 155_000,
        })
        .expect("valid observation");
        assert!((ratio.value() - 22_000.0 / 177_000.0).abs() < 1e-15);
        assert_eq!(ratio.value() + ratio.net_construction_ratio(), 1.0);
    }

    #[test]
    fn observation_rejects_net_above_gross_and_zero_gross() {
        let inverted = DemolitionObservation {
            year: 2024,
            gross: 100,
            net: 120,
        };
        assert!(matches!(
            DemolitionRatio::from_observation(&inverted),
            Err(ValidationError::NetExceedsGross { .. })
        ));

        let empty = DemolitionObservation {
            year: 2024,
            gross: 0,
            net: 0,
        };
        assert!(matches!(
            DemolitionRatio::from_observation(&empty),
            Err(ValidationError::ZeroGrossCompletions { year: 2024 })
        ));
    }

    #[test]
    fn demolition_ratio_must_stay_below_one() {
        assert!(DemolitionRatio::new(0.0).is_ok());
        assert!(matches!(
            DemolitionRatio::new(1.0),
            Err(ValidationError::DemolitionRatioOutOfRange { .. })
        ));
    }

    #[test]
    fn series_rejects_unordered_years() {
        let result = ConstructionSeries::new(vec![
            AnnualConstruction::published_net(2022, 10),
            AnnualConstruction::published_net(2022, 10),
        ]);
        assert!(matches!(
            result,
            Err(ValidationError::UnorderedConstructionYears {
                previous: 2022,
                next: 2022
            })
        ));
    }

    #[test]
    fn projection_applies_partial_first_and_last_years() {
        let ratio = DemolitionRatio::new(0.5).expect("valid ratio");
        let projector = DwellingStockProjector::new(baseline(), series(), ratio);
        let target = ReferenceDate::new(date(2023, 6, 30)).with_elapsed(fraction(0.5));

        let timeline = projector.project(target).expect("projection succeeds");

        // 2021: 1000 gross * 0.5 net * 0.4 remaining; 2022: 2000 * 0.5; 2023: 3000 * 0.5.
        assert_eq!(timeline.points.len(), 3);
        assert_eq!(timeline.year_end(2021), Some(1_000_200.0));
        assert_eq!(timeline.year_end(2022), Some(1_001_200.0));
        assert_eq!(timeline.at_target(), 1_002_700.0);
    }

    #[test]
    fn projection_within_baseline_year_uses_both_fractions() {
        let ratio = DemolitionRatio::new(0.0).expect("valid ratio");
        let projector = DwellingStockProjector::new(baseline(), series(), ratio);
        let target = ReferenceDate::new(date(2021, 11, 30)).with_elapsed(fraction(0.9));

        let timeline = projector.project(target).expect("projection succeeds");

        assert_eq!(timeline.points.len(), 1);
        assert!((timeline.at_target() - 1_000_300.0).abs() < 1e-6);
    }

    #[test]
    fn projection_reports_missing_years() {
        let ratio = DemolitionRatio::new(0.1).expect("valid ratio");
        let projector = DwellingStockProjector::new(baseline(), series(), ratio);
        let target = ReferenceDate::new(date(2024, 6, 30));

        let err = projector.project(target).expect_err("2024 is missing");
        assert_eq!(
            err,
            EstimationError::Validation {
                stage: EstimationStage::DwellingStock,
                source: ValidationError::MissingConstructionYear { year: 2024 },
            }
        );
    }

    #[test]
    fn projection_rejects_target_before_baseline() {
        let ratio = DemolitionRatio::new(0.1).expect("valid ratio");
        let projector = DwellingStockProjector::new(baseline(), series(), ratio);
        let target = ReferenceDate::new(date(2021, 2, 1));

        match projector.project(target) {
            Err(EstimationError::Validation {
                source: ValidationError::TargetBeforeBaseline { .. },
                ..
            }) => {}
            other => panic!("expected target-before-baseline error, got {other:?}"),
        }
    }

    #[test]
    fn stock_never_decreases_with_non_negative_increments() {
        let ratio = DemolitionRatio::new(0.2).expect("valid ratio");
        let projector = DwellingStockProjector::new(baseline(), series(), ratio);
        let target = ReferenceDate::new(date(2023, 9, 30));

        let timeline = projector.project(target).expect("projection succeeds");
        let counts: Vec<f64> = timeline.points.iter().map(|p| p.dwelling_count).collect();

        assert!(counts[0] >= baseline().dwelling_count as f64);
        assert!(counts.windows(2).all(|pair| pair[1] >= pair[0]));
    }

    #[test]
    fn quarterly_sums_beyond_u64_are_rejected() {
        let ratio = DemolitionRatio::new(0.1).expect("valid ratio");
        let series = ConstructionSeries::new(vec![
            AnnualConstruction::quarterly_gross(2021, [u64::MAX, 1, 0, 0]),
            AnnualConstruction::published_net(2022, 10),
        ])
        .expect("ordered series");
        let projector = DwellingStockProjector::new(baseline(), series, ratio);

        let err = projector
            .project(ReferenceDate::new(date(2022, 6, 30)))
            .expect_err("2021 gross overflows");
        assert_eq!(
            err,
            EstimationError::Validation {
                stage: EstimationStage::DwellingStock,
                source: ValidationError::Overflow {
                    field: "quarterly gross completions"
                },
            }
        );
    }

    #[test]
    fn year_end_outside_calendar_is_not_a_missing_year() {
        assert_eq!(
            year_end_date(i32::MAX),
            Err(ValidationError::DateOutOfRange { year: i32::MAX })
        );
        assert_eq!(year_end_date(2023), Ok(date(2023, 12, 31)));
    }

    #[test]
    fn assumption_deserializes_fixed_override() {
        let assumption: DemolitionAssumption =
            serde_json::from_str(r#"{"fixed":0.2}"#).expect("assumption parses");
        let ratio = assumption.ratio().expect("ratio resolves");
        assert_eq!(ratio.value(), 0.2);
    }
}
