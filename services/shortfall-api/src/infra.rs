use crate::cli::ScenarioArgs;
use housing_shortfall::config::ScenarioConfig;
use housing_shortfall::dataset::{load_age_distribution, load_scenario};
use housing_shortfall::error::AppError;
use housing_shortfall::{reference_2024, Scenario};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) scenario: Arc<Scenario>,
}

/// Resolves the scenario to evaluate. Command-line paths win over the
/// environment, and both fall back to the built-in 2024 reference inputs.
pub(crate) fn resolve_scenario(
    config: &ScenarioConfig,
    overrides: &ScenarioArgs,
) -> Result<Scenario, AppError> {
    let scenario_path = overrides
        .scenario
        .as_ref()
        .or(config.scenario_path.as_ref());
    let mut scenario = match scenario_path {
        Some(path) => {
            info!(path = %path.display(), "loading scenario");
            load_scenario(path)?
        }
        None => reference_2024(),
    };

    let age_path = overrides
        .age_distribution
        .as_ref()
        .or(config.age_distribution_csv.as_ref());
    if let Some(path) = age_path {
        info!(path = %path.display(), "loading age distribution");
        scenario = scenario.with_age_distribution(load_age_distribution(path)?);
    }

    if let Some(ratio) = overrides.demolition_ratio {
        scenario = scenario.with_demolition_ratio(ratio);
    }

    Ok(scenario)
}

#[cfg(test)]
mod tests {
    use super::*;
    use housing_shortfall::estimate::{DemolitionAssumption, DemolitionRatio};
    use std::path::PathBuf;

    #[test]
    fn falls_back_to_reference_scenario() {
        let scenario = resolve_scenario(&ScenarioConfig::default(), &ScenarioArgs::default())
            .expect("reference scenario resolves");
        assert_eq!(scenario, reference_2024());
    }

    #[test]
    fn demolition_override_replaces_observation() {
        let overrides = ScenarioArgs {
            demolition_ratio: Some(DemolitionRatio::new(0.1).expect("valid ratio")),
            ..ScenarioArgs::default()
        };
        let scenario = resolve_scenario(&ScenarioConfig::default(), &overrides)
            .expect("scenario resolves");
        assert!(matches!(
            scenario.demolition,
            DemolitionAssumption::Fixed(ratio) if ratio.value() == 0.1
        ));
    }

    #[test]
    fn missing_scenario_file_is_a_dataset_error() {
        let config = ScenarioConfig {
            scenario_path: Some(PathBuf::from("/nonexistent/scenario.json")),
            age_distribution_csv: None,
        };
        match resolve_scenario(&config, &ScenarioArgs::default()) {
            Err(AppError::Dataset(_)) => {}
            other => panic!("expected dataset error, got {other:?}"),
        }
    }
}
