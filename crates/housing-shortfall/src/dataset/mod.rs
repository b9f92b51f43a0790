//! Built-in reference inputs and loaders for caller-supplied ones.

mod loader;
mod reference;

pub use loader::{
    age_distribution_from_csv, load_age_distribution, load_scenario, scenario_from_reader,
    DatasetError,
};
pub use reference::reference_2024;
