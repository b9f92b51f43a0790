use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use housing_shortfall::error::AppError;
use housing_shortfall::estimate::{AgeDistribution, DemolitionRatio};
use housing_shortfall::{Scenario, ShortfallReport};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

/// Overrides applied to the served scenario for a single evaluation.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ShortfallRequest {
    /// Replaces the served scenario entirely.
    #[serde(default)]
    pub(crate) scenario: Option<Scenario>,
    #[serde(default)]
    pub(crate) demolition_ratio: Option<DemolitionRatio>,
    #[serde(default)]
    pub(crate) age_distribution: Option<AgeDistribution>,
}

pub(crate) fn router() -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route(
            "/api/v1/shortfall",
            get(shortfall_endpoint).post(shortfall_override_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn shortfall_endpoint(
    Extension(state): Extension<AppState>,
) -> Result<Json<ShortfallReport>, AppError> {
    Ok(Json(state.scenario.evaluate()?))
}

pub(crate) async fn shortfall_override_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<ShortfallRequest>,
) -> Result<Json<ShortfallReport>, AppError> {
    let ShortfallRequest {
        scenario,
        demolition_ratio,
        age_distribution,
    } = payload;

    let mut scenario = scenario.unwrap_or_else(|| state.scenario.as_ref().clone());
    if let Some(ratio) = demolition_ratio {
        scenario = scenario.with_demolition_ratio(ratio);
    }
    if let Some(distribution) = age_distribution {
        scenario = scenario.with_age_distribution(distribution);
    }
    debug!(scenario = %scenario.label, "evaluating caller-supplied scenario");

    Ok(Json(scenario.evaluate()?))
}
