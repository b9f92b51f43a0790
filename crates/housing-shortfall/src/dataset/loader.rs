use crate::estimate::{AgeDistribution, Scenario, ShapeMismatchError, SINGLE_YEAR_AGES};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

const OPEN_AGE_LABELS: [&str; 2] = ["100+", "100"];

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid scenario JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid age distribution CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("age distribution row {row}: expected age {expected}, found '{found}'")]
    UnexpectedAge {
        row: usize,
        expected: String,
        found: String,
    },
    #[error(transparent)]
    Shape(#[from] ShapeMismatchError),
}

pub fn load_scenario<P: AsRef<Path>>(path: P) -> Result<Scenario, DatasetError> {
    let file = std::fs::File::open(path)?;
    scenario_from_reader(file)
}

pub fn scenario_from_reader<R: Read>(reader: R) -> Result<Scenario, DatasetError> {
    Ok(serde_json::from_reader(reader)?)
}

pub fn load_age_distribution<P: AsRef<Path>>(path: P) -> Result<AgeDistribution, DatasetError> {
    let file = std::fs::File::open(path)?;
    age_distribution_from_csv(file)
}

/// Reads `age,population` rows covering 0..=99 then `100+`, in order.
pub fn age_distribution_from_csv<R: Read>(reader: R) -> Result<AgeDistribution, DatasetError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut counts = Vec::with_capacity(SINGLE_YEAR_AGES);

    for (row, record) in csv_reader.deserialize::<AgeRow>().enumerate() {
        let AgeRow { age, population } = record?;
        let expected = counts.len();
        if !age_matches(&age, expected) {
            return Err(DatasetError::UnexpectedAge {
                row: row + 1,
                expected: expected_label(expected),
                found: age,
            });
        }
        counts.push(population);
    }

    Ok(AgeDistribution::new(counts)?)
}

#[derive(Debug, Deserialize)]
struct AgeRow {
    age: String,
    population: u64,
}

fn age_matches(label: &str, expected: usize) -> bool {
    if expected == SINGLE_YEAR_AGES - 1 {
        return OPEN_AGE_LABELS.contains(&label);
    }
    label.parse::<usize>().is_ok_and(|age| age == expected)
}

fn expected_label(expected: usize) -> String {
    if expected >= SINGLE_YEAR_AGES - 1 {
        OPEN_AGE_LABELS[0].to_string()
    } else {
        expected.to_string()
    }
}
