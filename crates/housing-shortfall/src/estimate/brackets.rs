use super::domain::{checked_total, EstimationError, EstimationStage, ShapeMismatchError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Single-year ages 0 through 99 plus the "100+" entry.
pub const SINGLE_YEAR_AGES: usize = 101;
/// Seventeen five-year brackets (0-4 .. 80-84) plus "85+".
pub const BRACKET_COUNT: usize = 18;

const BRACKET_WIDTH: usize = 5;
const OPEN_BRACKET_START: usize = 85;

/// Population by completed years of age; index 100 holds everyone aged 100 or over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u64>", into = "Vec<u64>")]
pub struct AgeDistribution(Vec<u64>);

impl AgeDistribution {
    pub fn new(counts: Vec<u64>) -> Result<Self, ShapeMismatchError> {
        if counts.len() != SINGLE_YEAR_AGES {
            return Err(ShapeMismatchError::AgeDistribution {
                expected: SINGLE_YEAR_AGES,
                found: counts.len(),
            });
        }
        Ok(Self(counts))
    }

    pub fn counts(&self) -> &[u64] {
        &self.0
    }
}

impl TryFrom<Vec<u64>> for AgeDistribution {
    type Error = ShapeMismatchError;

    fn try_from(value: Vec<u64>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AgeDistribution> for Vec<u64> {
    fn from(value: AgeDistribution) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AgeBracket {
    pub start: u8,
    /// Inclusive upper age; `None` for the open-ended final bracket.
    pub end: Option<u8>,
    pub population: u64,
}

impl AgeBracket {
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for AgeBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "{}-{}", self.start, end),
            None => write!(f, "{}+", self.start),
        }
    }
}

/// Population collapsed into the propensity table's column layout.
///
/// Only built by [`AgeBracketAggregator`], so it always holds
/// [`BRACKET_COUNT`] brackets whose total fits in a `u64`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BracketedPopulation(Vec<AgeBracket>);

impl BracketedPopulation {
    pub fn brackets(&self) -> &[AgeBracket] {
        &self.0
    }

    pub fn populations(&self) -> impl Iterator<Item = u64> + '_ {
        self.0.iter().map(|bracket| bracket.population)
    }

    pub fn total(&self) -> u64 {
        self.populations().sum()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

pub struct AgeBracketAggregator;

impl AgeBracketAggregator {
    /// Sums single-year counts into brackets. Integer sums, so nothing is lost.
    pub fn aggregate(counts: &[u64]) -> Result<BracketedPopulation, EstimationError> {
        let stage = EstimationStage::AgeBrackets;
        if counts.len() != SINGLE_YEAR_AGES {
            return Err(stage.mismatch(ShapeMismatchError::AgeDistribution {
                expected: SINGLE_YEAR_AGES,
                found: counts.len(),
            }));
        }
        // Every bracket sum is bounded by the grand total.
        checked_total("population counts", counts.iter().copied())
            .map_err(|err| stage.invalid(err))?;
        Ok(bracket_counts(counts))
    }
}

fn bracket_counts(counts: &[u64]) -> BracketedPopulation {
    let mut brackets: Vec<AgeBracket> = counts[..OPEN_BRACKET_START]
        .chunks(BRACKET_WIDTH)
        .enumerate()
        .map(|(index, chunk)| {
            let start = index * BRACKET_WIDTH;
            AgeBracket {
                start: start as u8,
                end: Some((start + BRACKET_WIDTH - 1) as u8),
                population: chunk.iter().sum(),
            }
        })
        .collect();

    brackets.push(AgeBracket {
        start: OPEN_BRACKET_START as u8,
        end: None,
        population: counts[OPEN_BRACKET_START..].iter().sum(),
    });

    BracketedPopulation(brackets)
}
