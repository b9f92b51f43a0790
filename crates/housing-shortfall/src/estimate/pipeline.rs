use super::brackets::{AgeBracket, AgeBracketAggregator, AgeDistribution};
use super::domain::{EstimationError, EstimationStage};
use super::households::{
    HouseholdDemand, HouseholdDemandEstimator, HouseholdSizeConstants, HouseholdSizeTables,
    PropensityTable,
};
use super::shortfall::{AdjustmentInputs, ShortfallAdjuster, ShortfallResult};
use super::stock::{
    CensusBaseline, ConstructionSeries, DemolitionAssumption, DemolitionRatio,
    DwellingStockProjector, DwellingStockTimeline, ReferenceDate,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Every input of one shortfall estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub label: String,
    pub baseline: CensusBaseline,
    pub target: ReferenceDate,
    pub construction: ConstructionSeries,
    pub demolition: DemolitionAssumption,
    pub age_distribution: AgeDistribution,
    pub propensities: PropensityTable,
    pub household_sizes: HouseholdSizeTables,
    pub adjustments: AdjustmentInputs,
}

impl Scenario {
    pub fn with_demolition_ratio(mut self, ratio: DemolitionRatio) -> Self {
        self.demolition = DemolitionAssumption::Fixed(ratio);
        self
    }

    pub fn with_age_distribution(mut self, distribution: AgeDistribution) -> Self {
        self.age_distribution = distribution;
        self
    }

    /// Runs every stage in order. The first failing stage aborts the run.
    pub fn evaluate(&self) -> Result<ShortfallReport, EstimationError> {
        let demolition_ratio = self
            .demolition
            .ratio()
            .map_err(|err| EstimationStage::DwellingStock.invalid(err))?;
        let projector = DwellingStockProjector::new(
            self.baseline,
            self.construction.clone(),
            demolition_ratio,
        );
        let stock = projector.project(self.target)?;
        let available_dwellings = stock.at_target();
        debug!(
            demolition_ratio = demolition_ratio.value(),
            available_dwellings, "dwelling stock projected"
        );

        let population = AgeBracketAggregator::aggregate(self.age_distribution.counts())?;
        debug!(total = population.total(), "population bracketed");

        let household_sizes = HouseholdSizeConstants::from_tables(&self.household_sizes)?;
        let demand = HouseholdDemandEstimator::new(&self.propensities, household_sizes)
            .estimate(&population)?;

        let shortfall = ShortfallAdjuster::adjust(
            available_dwellings,
            demand.total_households,
            &self.adjustments,
        )?;
        info!(
            scenario = %self.label,
            net_shortfall = shortfall.net_shortfall,
            "housing shortfall estimated"
        );

        Ok(ShortfallReport {
            scenario: self.label.clone(),
            reference_date: self.target.date,
            demolition_ratio: demolition_ratio.value(),
            net_construction_ratio: demolition_ratio.net_construction_ratio(),
            stock,
            total_population: population.total(),
            brackets: population.brackets().to_vec(),
            propensity_survey_year: self.propensities.survey_year,
            household_sizes,
            household_demand: demand,
            shortfall,
        })
    }
}

/// Everything a reporting layer needs without recomputing anything.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShortfallReport {
    pub scenario: String,
    pub reference_date: NaiveDate,
    pub demolition_ratio: f64,
    pub net_construction_ratio: f64,
    pub stock: DwellingStockTimeline,
    pub total_population: u64,
    pub brackets: Vec<AgeBracket>,
    pub propensity_survey_year: u16,
    pub household_sizes: HouseholdSizeConstants,
    pub household_demand: HouseholdDemand,
    pub shortfall: ShortfallResult,
}
