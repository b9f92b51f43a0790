use super::domain::{
    ensure_finite, ensure_fraction, ensure_non_negative, EstimationError, EstimationStage,
    ValidationError,
};
use serde::{Deserialize, Serialize};

const STAGE: EstimationStage = EstimationStage::ShortfallAdjustment;
const MONTHS_PER_YEAR: f64 = 12.0;

/// Market allowances applied on top of raw household demand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentInputs {
    /// Caravans, tents, improvised homes and similar dwellings not fit for permanent habitation.
    pub unsuitable_dwellings: u64,
    pub renting_fraction: f64,
    pub healthy_vacancy_rate: f64,
    pub annual_property_transfers: u64,
    /// Months of sales that should sit on the market as vacant inventory.
    pub months_of_inventory: f64,
}

impl AdjustmentInputs {
    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_fraction("renting fraction", self.renting_fraction)?;
        ensure_fraction("healthy vacancy rate", self.healthy_vacancy_rate)?;
        ensure_non_negative("months of inventory", self.months_of_inventory)?;
        Ok(())
    }

    pub fn months_inventory_fraction(&self) -> f64 {
        self.months_of_inventory / MONTHS_PER_YEAR
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Adjustments {
    pub uninhabitable: f64,
    pub rental_vacancy_buffer: f64,
    pub sale_inventory_buffer: f64,
}

/// Supply against demand, with every intermediate kept for reporting.
///
/// `net_shortfall` is usable supply minus total requirement: a negative value
/// is a shortage of homes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShortfallResult {
    pub available_dwellings: f64,
    pub usable_dwellings: f64,
    pub required_households: f64,
    pub adjustments: Adjustments,
    pub required_households_adjusted: f64,
    pub total_required: f64,
    pub net_shortfall: f64,
}

impl ShortfallResult {
    pub fn is_shortage(&self) -> bool {
        self.net_shortfall < 0.0
    }

    /// Homes missing from the usable stock, or zero when supply covers demand.
    pub fn shortage(&self) -> f64 {
        if self.is_shortage() {
            -self.net_shortfall
        } else {
            0.0
        }
    }
}

pub struct ShortfallAdjuster;

impl ShortfallAdjuster {
    pub fn adjust(
        available_dwellings: f64,
        required_households: f64,
        inputs: &AdjustmentInputs,
    ) -> Result<ShortfallResult, EstimationError> {
        Self::checked(available_dwellings, required_households, inputs)
            .map_err(|err| STAGE.invalid(err))
    }

    fn checked(
        available_dwellings: f64,
        required_households: f64,
        inputs: &AdjustmentInputs,
    ) -> Result<ShortfallResult, ValidationError> {
        let available_dwellings = ensure_finite("available dwellings", available_dwellings)?;
        let required_households = ensure_non_negative("required households", required_households)?;
        inputs.validate()?;

        let uninhabitable = inputs.unsuitable_dwellings as f64;
        let usable_dwellings = available_dwellings - uninhabitable;

        let rental_vacancy_buffer =
            required_households * inputs.renting_fraction * inputs.healthy_vacancy_rate;
        let required_households_adjusted = required_households + rental_vacancy_buffer;

        let sale_inventory_buffer =
            inputs.annual_property_transfers as f64 * inputs.months_inventory_fraction();
        let total_required = required_households_adjusted + sale_inventory_buffer;

        Ok(ShortfallResult {
            available_dwellings,
            usable_dwellings,
            required_households,
            adjustments: Adjustments {
                uninhabitable,
                rental_vacancy_buffer,
                sale_inventory_buffer,
            },
            required_households_adjusted,
            total_required,
            net_shortfall: usable_dwellings - total_required,
        })
    }
}
