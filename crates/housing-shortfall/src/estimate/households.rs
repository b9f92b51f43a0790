use super::brackets::{BracketedPopulation, BRACKET_COUNT};
use super::domain::{
    checked_total, ensure_non_negative, EstimationError, EstimationStage, ShapeMismatchError,
    ValidationError,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

const STAGE: EstimationStage = EstimationStage::HouseholdDemand;

/// Living arrangements that form a household of their own.
///
/// Children, dependants and other non-householder rows of the source survey are
/// not represented: they never create demand for an additional dwelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HouseholdCategory {
    PartneredWithChildren,
    PartneredWithoutChildren,
    MaleSingleParent,
    FemaleSingleParent,
    RelatedOtherFamily,
    UnrelatedOtherFamily,
    MaleLonePerson,
    FemaleLonePerson,
}

impl HouseholdCategory {
    pub const fn ordered() -> [Self; 8] {
        [
            Self::PartneredWithChildren,
            Self::PartneredWithoutChildren,
            Self::MaleSingleParent,
            Self::FemaleSingleParent,
            Self::RelatedOtherFamily,
            Self::UnrelatedOtherFamily,
            Self::MaleLonePerson,
            Self::FemaleLonePerson,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::PartneredWithChildren => "Partnered, with children",
            Self::PartneredWithoutChildren => "Partnered, without children",
            Self::MaleSingleParent => "Male single parent",
            Self::FemaleSingleParent => "Female single parent",
            Self::RelatedOtherFamily => "Related, other family",
            Self::UnrelatedOtherFamily => "Unrelated, other family",
            Self::MaleLonePerson => "Male lone person",
            Self::FemaleLonePerson => "Female lone person",
        }
    }

    pub const fn divisor_rule(self) -> DivisorRule {
        match self {
            Self::PartneredWithChildren | Self::PartneredWithoutChildren => DivisorRule::Couple,
            Self::MaleSingleParent
            | Self::FemaleSingleParent
            | Self::MaleLonePerson
            | Self::FemaleLonePerson => DivisorRule::SingleHouseholder,
            Self::RelatedOtherFamily | Self::UnrelatedOtherFamily => DivisorRule::GroupHousehold,
        }
    }
}

/// How many people in a category share one household.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DivisorRule {
    Couple,
    SingleHouseholder,
    /// Both other-family categories use the group household average.
    GroupHousehold,
}

impl DivisorRule {
    pub fn people_per_household(self, sizes: &HouseholdSizeConstants) -> f64 {
        match self {
            DivisorRule::Couple => 2.0,
            DivisorRule::SingleHouseholder => 1.0,
            DivisorRule::GroupHousehold => sizes.group_household,
        }
    }
}

/// Survey percentages of each age bracket living in each category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropensityTable {
    pub survey_year: u16,
    pub rows: BTreeMap<HouseholdCategory, Vec<f64>>,
}

impl PropensityTable {
    pub fn new(survey_year: u16, rows: BTreeMap<HouseholdCategory, Vec<f64>>) -> Self {
        Self { survey_year, rows }
    }

    /// Every category must be present with one non-negative percentage per bracket.
    /// No upper bound is enforced.
    pub fn validate(&self) -> Result<(), EstimationError> {
        for category in HouseholdCategory::ordered() {
            let row = self.rows.get(&category).ok_or_else(|| {
                STAGE.mismatch(ShapeMismatchError::MissingPropensityRow {
                    category: category.label(),
                })
            })?;
            if row.len() != BRACKET_COUNT {
                return Err(STAGE.mismatch(ShapeMismatchError::PropensityColumns {
                    category: category.label(),
                    expected: BRACKET_COUNT,
                    found: row.len(),
                }));
            }
            for &percentage in row {
                ensure_non_negative("propensity percentage", percentage)
                    .map_err(|err| STAGE.invalid(err))?;
            }
        }
        Ok(())
    }

    pub fn row(&self, category: HouseholdCategory) -> Option<&[f64]> {
        self.rows.get(&category).map(Vec::as_slice)
    }
}

/// Count of households by number of occupants, from a census profile.
///
/// The largest size stands for "that many or more"; the weighted mean treats
/// those households as exactly that size, which slightly understates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseholdSizeTable {
    pub counts_by_size: BTreeMap<u8, u64>,
    /// Total printed in the source table, used instead of the summed counts
    /// when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_total: Option<u64>,
}

impl HouseholdSizeTable {
    pub fn new(counts_by_size: BTreeMap<u8, u64>) -> Self {
        Self {
            counts_by_size,
            published_total: None,
        }
    }

    pub fn with_published_total(mut self, total: u64) -> Self {
        self.published_total = Some(total);
        self
    }

    pub fn average_size(&self, table: &'static str) -> Result<f64, ValidationError> {
        if self.counts_by_size.contains_key(&0) {
            return Err(ValidationError::InvalidHouseholdSize { table, size: 0 });
        }

        let people = self
            .counts_by_size
            .iter()
            .try_fold(0_u64, |acc, (&size, &count)| {
                u64::from(size)
                    .checked_mul(count)
                    .and_then(|occupants| acc.checked_add(occupants))
            })
            .ok_or(ValidationError::Overflow {
                field: "household size table occupants",
            })?;
        let households = match self.published_total {
            Some(total) => total,
            None => checked_total(
                "household size table counts",
                self.counts_by_size.values().copied(),
            )?,
        };

        if households == 0 {
            return Err(ValidationError::EmptyHouseholdSizeTable { table });
        }
        Ok(people as f64 / households as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseholdSizeTables {
    pub other_family: HouseholdSizeTable,
    pub group_household: HouseholdSizeTable,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HouseholdSizeConstants {
    pub other_family: f64,
    pub group_household: f64,
}

impl HouseholdSizeConstants {
    pub fn from_tables(tables: &HouseholdSizeTables) -> Result<Self, EstimationError> {
        let other_family = tables
            .other_family
            .average_size("other family")
            .map_err(|err| STAGE.invalid(err))?;
        let group_household = tables
            .group_household
            .average_size("group")
            .map_err(|err| STAGE.invalid(err))?;
        Ok(Self {
            other_family,
            group_household,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategoryDemand {
    pub category: HouseholdCategory,
    pub label: &'static str,
    pub people: f64,
    pub households: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HouseholdDemand {
    pub total_households: f64,
    pub by_category: Vec<CategoryDemand>,
}

/// Turns bracket populations into required households.
#[derive(Debug, Clone)]
pub struct HouseholdDemandEstimator<'a> {
    propensities: &'a PropensityTable,
    sizes: HouseholdSizeConstants,
}

impl<'a> HouseholdDemandEstimator<'a> {
    pub fn new(propensities: &'a PropensityTable, sizes: HouseholdSizeConstants) -> Self {
        Self {
            propensities,
            sizes,
        }
    }

    pub fn estimate(&self, population: &BracketedPopulation) -> Result<HouseholdDemand, EstimationError> {
        self.propensities.validate()?;

        let categories = HouseholdCategory::ordered();
        let mut rows = Vec::with_capacity(categories.len());
        for category in categories {
            let row = self.propensities.row(category).ok_or_else(|| {
                STAGE.mismatch(ShapeMismatchError::MissingPropensityRow {
                    category: category.label(),
                })
            })?;
            let divisor = category.divisor_rule().people_per_household(&self.sizes);
            rows.push((category, row, divisor));
        }

        let mut people = [0.0_f64; 8];
        let mut households = [0.0_f64; 8];
        let mut total_households = 0.0;

        // Bracket-major accumulation keeps the running total in source order.
        for (bracket, bracket_population) in population.populations().enumerate() {
            let bracket_population = bracket_population as f64;
            for (index, (_, row, divisor)) in rows.iter().enumerate() {
                let residents = row[bracket] / 100.0 * bracket_population;
                let formed = residents / divisor;
                people[index] += residents;
                households[index] += formed;
                total_households += formed;
            }
        }

        let by_category = rows
            .iter()
            .enumerate()
            .map(|(index, (category, _, _))| CategoryDemand {
                category: *category,
                label: category.label(),
                people: people[index],
                households: households[index],
            })
            .collect();

        debug!(
            total_households,
            survey_year = self.propensities.survey_year,
            "estimated household demand"
        );

        Ok(HouseholdDemand {
            total_households,
            by_category,
        })
    }
}
