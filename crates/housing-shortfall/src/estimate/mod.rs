//! Dwelling supply and household demand estimation.
//!
//! Four stages run strictly forward: stock projection, age bracketing,
//! household demand, then the market adjustments that produce the shortfall.

mod brackets;
pub mod domain;
mod households;
mod pipeline;
mod shortfall;
mod stock;

pub use brackets::{
    AgeBracket, AgeBracketAggregator, AgeDistribution, BracketedPopulation, BRACKET_COUNT,
    SINGLE_YEAR_AGES,
};
pub use domain::{EstimationError, EstimationStage, ShapeMismatchError, ValidationError, YearFraction};
pub use households::{
    CategoryDemand, DivisorRule, HouseholdCategory, HouseholdDemand, HouseholdDemandEstimator,
    HouseholdSizeConstants, HouseholdSizeTable, HouseholdSizeTables, PropensityTable,
};
pub use pipeline::{Scenario, ShortfallReport};
pub use shortfall::{AdjustmentInputs, Adjustments, ShortfallAdjuster, ShortfallResult};
pub use stock::{
    AnnualConstruction, CensusBaseline, Completions, ConstructionSeries, DemolitionAssumption,
    DemolitionObservation, DemolitionRatio, DwellingStockProjector, DwellingStockTimeline,
    ReferenceDate, StockPoint,
};
