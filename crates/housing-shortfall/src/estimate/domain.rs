use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stages of the estimation pipeline, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimationStage {
    DwellingStock,
    AgeBrackets,
    HouseholdDemand,
    ShortfallAdjustment,
}

impl EstimationStage {
    pub const fn label(self) -> &'static str {
        match self {
            Self::DwellingStock => "Dwelling stock projection",
            Self::AgeBrackets => "Age bracket aggregation",
            Self::HouseholdDemand => "Household demand estimation",
            Self::ShortfallAdjustment => "Shortfall adjustment",
        }
    }

    pub(crate) fn invalid(self, source: ValidationError) -> EstimationError {
        EstimationError::Validation {
            stage: self,
            source,
        }
    }

    pub(crate) fn mismatch(self, source: ShapeMismatchError) -> EstimationError {
        EstimationError::ShapeMismatch {
            stage: self,
            source,
        }
    }
}

impl fmt::Display for EstimationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Malformed or out-of-range input values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must be a finite number (found {value})")]
    NonFinite { field: &'static str, value: f64 },
    #[error("{field} must not be negative (found {value})")]
    Negative { field: &'static str, value: f64 },
    #[error("{field} must lie within [0, 1] (found {value})")]
    FractionOutOfRange { field: &'static str, value: f64 },
    #[error("demolition ratio must lie within [0, 1) (found {value})")]
    DemolitionRatioOutOfRange { value: f64 },
    #[error("demolition observation for {year} needs gross completions above zero")]
    ZeroGrossCompletions { year: i32 },
    #[error("demolition observation for {year}: net completions {net} exceed gross completions {gross}")]
    NetExceedsGross { year: i32, gross: u64, net: u64 },
    #[error("construction series must be strictly ordered by year ({previous} followed by {next})")]
    UnorderedConstructionYears { previous: i32, next: i32 },
    #[error("construction series has no entry for {year}")]
    MissingConstructionYear { year: i32 },
    #[error("31 December {year} falls outside the supported calendar")]
    DateOutOfRange { year: i32 },
    #[error("target date {target} precedes census baseline {baseline}")]
    TargetBeforeBaseline {
        baseline: NaiveDate,
        target: NaiveDate,
    },
    #[error("{table} household size table has no households")]
    EmptyHouseholdSizeTable { table: &'static str },
    #[error("{table} household size table lists an invalid household size of {size}")]
    InvalidHouseholdSize { table: &'static str, size: u8 },
    #[error("{field} exceed the supported integer range")]
    Overflow { field: &'static str },
}

/// Dimension disagreements between tables that must line up.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShapeMismatchError {
    #[error("age distribution must hold {expected} single-year counts, found {found}")]
    AgeDistribution { expected: usize, found: usize },
    #[error("propensity row for {category} has {found} columns, expected {expected}")]
    PropensityColumns {
        category: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("propensity table has no row for {category}")]
    MissingPropensityRow { category: &'static str },
}

/// Failure of a single pipeline stage. The whole run is abandoned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EstimationError {
    #[error("{stage} rejected its input: {source}")]
    Validation {
        stage: EstimationStage,
        #[source]
        source: ValidationError,
    },
    #[error("{stage} received mismatched tables: {source}")]
    ShapeMismatch {
        stage: EstimationStage,
        #[source]
        source: ShapeMismatchError,
    },
}

impl EstimationError {
    pub fn stage(&self) -> EstimationStage {
        match self {
            EstimationError::Validation { stage, .. }
            | EstimationError::ShapeMismatch { stage, .. } => *stage,
        }
    }
}

/// Portion of a calendar year that has elapsed at some date, within [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct YearFraction(f64);

impl YearFraction {
    pub const START: Self = Self(0.0);
    pub const END: Self = Self(1.0);

    pub fn new(value: f64) -> Result<Self, ValidationError> {
        ensure_fraction("elapsed year fraction", value).map(Self)
    }

    /// Days elapsed before `date` divided by the length of its year.
    pub fn of_date(date: NaiveDate) -> Self {
        let days_in_year = if date.leap_year() { 366.0 } else { 365.0 };
        Self(f64::from(date.ordinal0()) / days_in_year)
    }

    pub const fn value(self) -> f64 {
        self.0
    }

    pub fn remaining(self) -> f64 {
        1.0 - self.0
    }
}

impl TryFrom<f64> for YearFraction {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<YearFraction> for f64 {
    fn from(value: YearFraction) -> Self {
        value.0
    }
}

pub(crate) fn ensure_finite(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ValidationError::NonFinite { field, value })
    }
}

pub(crate) fn ensure_non_negative(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    let value = ensure_finite(field, value)?;
    if value < 0.0 {
        return Err(ValidationError::Negative { field, value });
    }
    Ok(value)
}

/// Sums counts without wrapping.
pub(crate) fn checked_total<I>(field: &'static str, values: I) -> Result<u64, ValidationError>
where
    I: IntoIterator<Item = u64>,
{
    values
        .into_iter()
        .try_fold(0_u64, u64::checked_add)
        .ok_or(ValidationError::Overflow { field })
}

pub(crate) fn ensure_fraction(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    let value = ensure_finite(field, value)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(ValidationError::FractionOutOfRange { field, value });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_fraction_rejects_values_outside_unit_interval() {
        assert!(YearFraction::new(0.6).is_ok());
        assert!(YearFraction::new(1.0).is_ok());
        assert!(matches!(
            YearFraction::new(1.2),
            Err(ValidationError::FractionOutOfRange { .. })
        ));
        assert!(matches!(
            YearFraction::new(f64::NAN),
            Err(ValidationError::NonFinite { .. })
        ));
    }

    #[test]
    fn year_fraction_of_date_counts_elapsed_days() {
        let census = NaiveDate::from_ymd_opt(2021, 8, 10).expect("valid census date");
        let fraction = YearFraction::of_date(census).value();
        assert!((fraction - 221.0 / 365.0).abs() < 1e-12);

        let new_year = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date");
        assert_eq!(YearFraction::of_date(new_year), YearFraction::START);
    }

    #[test]
    fn year_fraction_deserializes_through_validation() {
        let parsed: YearFraction = serde_json::from_str("0.5").expect("fraction parses");
        assert_eq!(parsed.value(), 0.5);
        assert!(serde_json::from_str::<YearFraction>("-0.1").is_err());
    }

    #[test]
    fn checked_total_reports_overflow() {
        assert_eq!(checked_total("counts", [1, 2, 3]), Ok(6));
        assert_eq!(
            checked_total("counts", [u64::MAX, 1]),
            Err(ValidationError::Overflow { field: "counts" })
        );
    }

    #[test]
    fn estimation_error_names_failing_stage() {
        let err = EstimationStage::HouseholdDemand.mismatch(ShapeMismatchError::PropensityColumns {
            category: "Male lone person",
            expected: 18,
            found: 17,
        });
        assert_eq!(err.stage(), EstimationStage::HouseholdDemand);
        assert!(err.to_string().starts_with("Household demand estimation"));
    }
}
