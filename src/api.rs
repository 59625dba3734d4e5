// src/api.rs

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use metrics::counter;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::batch::RecordBatch;
use crate::config::AppConfig;
use crate::decision::{decide, Verdict};
use crate::model::ModelGateway;
use crate::report::{Report, ReportBuilder, ViewMode};
use crate::schema::ManualRecord;
use crate::threshold::{self, ThresholdResolution};

/// Handlers map failures to plain (status, message) responses.
type ApiError = (StatusCode, String);

#[derive(Clone)]
pub struct AppState {
    gateway: Arc<ModelGateway>,
    report: ReportBuilder,
    default_threshold: f64,
}

impl AppState {
    pub fn new(gateway: Arc<ModelGateway>, config: &AppConfig) -> Self {
        Self {
            gateway,
            report: ReportBuilder::new(config.report.histogram_bins),
            default_threshold: config.scoring.default_threshold,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/batch", post(score_batch))
        .route("/api/predict", post(predict))
        .route("/debug/model", get(model_info))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Threshold inputs shared by both scoring endpoints: optional slider value
/// (defaults to the configured threshold) and the free-text override.
#[derive(serde::Deserialize)]
pub struct ScoreParams {
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub threshold_text: Option<String>,
    #[serde(default)]
    pub view: Option<ViewMode>,
}

fn resolve_threshold(
    state: &AppState,
    slider: Option<f64>,
    text: Option<&str>,
) -> ThresholdResolution {
    let slider = slider.unwrap_or(state.default_threshold).clamp(0.0, 1.0);
    threshold::resolve(slider, text)
}

/// Score an uploaded delimited file and assemble the full report.
async fn score_batch(
    State(state): State<AppState>,
    Query(params): Query<ScoreParams>,
    body: String,
) -> Result<Json<Report>, ApiError> {
    let digest = anon_digest(body.as_bytes());

    let batch = RecordBatch::from_csv(&body)
        .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, format!("upload rejected: {e:#}")))?;

    let resolution =
        resolve_threshold(&state, params.threshold, params.threshold_text.as_deref());

    let matrix = batch
        .feature_matrix(state.gateway.schema())
        .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, format!("upload rejected: {e:#}")))?;

    let probabilities = state.gateway.score_batch(&matrix);
    let decisions = decide(&probabilities, resolution.value);
    let view = params.view.unwrap_or_default();
    let report = state
        .report
        .build(&batch, &probabilities, &decisions, resolution, view);

    counter!("batches_scored_total").increment(1);
    counter!("records_scored_total").increment(batch.len() as u64);
    // Never log uploaded content, only a short digest.
    info!(
        upload = %digest,
        rows = batch.len(),
        threshold = resolution.value,
        source = ?resolution.source,
        positives = report.counts.positive,
        "batch scored"
    );

    Ok(Json(report))
}

#[derive(serde::Deserialize)]
pub struct PredictRequest {
    pub record: ManualRecord,
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub threshold_text: Option<String>,
}

#[derive(serde::Serialize)]
pub struct PredictResponse {
    pub verdict: Verdict,
    pub threshold: ThresholdResolution,
    pub message: String,
}

/// Score one manually entered record. Invoked explicitly by the form's
/// submit button, never per keystroke.
async fn predict(
    State(state): State<AppState>,
    Json(req): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, ApiError> {
    req.record
        .validate()
        .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, format!("invalid record: {e}")))?;

    let resolution = resolve_threshold(&state, req.threshold, req.threshold_text.as_deref());

    // A schema the form cannot satisfy is a deployment problem, not a user error.
    let row = req
        .record
        .to_feature_row(state.gateway.schema())
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}")))?;

    let probability = state.gateway.score_one(&row);
    let verdict = Verdict::new(probability, resolution.value);
    let message = if verdict.decision.is_positive() {
        format!("Alta probabilidade de compra (score {probability:.2})")
    } else {
        format!("Baixa probabilidade de compra (score {probability:.2})")
    };

    counter!("records_scored_total").increment(1);
    info!(
        threshold = resolution.value,
        source = ?resolution.source,
        decision = verdict.decision.as_bit(),
        "manual record scored"
    );

    Ok(Json(PredictResponse {
        verdict,
        threshold: resolution,
        message,
    }))
}

#[derive(serde::Serialize)]
struct ModelInfo {
    features: Vec<String>,
    default_threshold: f64,
}

async fn model_info(State(state): State<AppState>) -> Json<ModelInfo> {
    Json(ModelInfo {
        features: state.gateway.schema().names().map(str::to_string).collect(),
        default_threshold: state.default_threshold,
    })
}

/// Short hex digest for logging upload identity without logging content.
fn anon_digest(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
