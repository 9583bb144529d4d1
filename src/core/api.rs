//! HTTP API over the pure core, for browser-based renderers
//!
//! Endpoints:
//! - GET  /health    - Health check
//! - POST /target    - Random target angle and point
//! - POST /partner   - Both stages of the partner estimate
//! - POST /arc       - Minor arc between two angles, optional membership test
//! - POST /influence - Influence ratio

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

use crate::config::ExperimentConfig;
use crate::core::geometry::minor_arc;
use crate::core::influence::influence_ratio;
use crate::core::partner::PartnerModel;
use crate::types::{Condition, ConfidenceLevel, PartnerResponse, Point};
use crate::{Error, CONFIDENCE_LIMIT};

/// App state
pub struct AppState {
    pub config: ExperimentConfig,
    pub model: PartnerModel,
    pub requests: AtomicU64,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub conditions: Vec<Condition>,
    pub requests_served: u64,
}

/// Target request
#[derive(Debug, Default, Deserialize)]
pub struct TargetRequest {
    pub seed: Option<u64>,
}

/// Target response
#[derive(Debug, Serialize)]
pub struct TargetResponse {
    pub angle: f64,
    pub point: Point,
}

/// Partner request
#[derive(Debug, Deserialize)]
pub struct PartnerRequest {
    pub participant_angle: f64,
    pub confidence: Option<u8>,
    pub condition: String,
    pub transition_lambda: Option<f64>,
    pub seed: Option<u64>,
}

/// Arc request
#[derive(Debug, Deserialize)]
pub struct ArcRequest {
    pub angle1: f64,
    pub angle2: f64,
    pub candidate: Option<f64>,
}

/// Arc response
#[derive(Debug, Serialize)]
pub struct ArcResponse {
    pub min_angle: f64,
    pub max_angle: f64,
    pub span: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contains: Option<bool>,
}

/// Influence request
#[derive(Debug, Deserialize)]
pub struct InfluenceRequest {
    pub initial: f64,
    #[serde(rename = "final")]
    pub final_angle: f64,
    pub partner: f64,
}

/// Influence response
#[derive(Debug, Serialize)]
pub struct InfluenceResponse {
    pub ratio: f64,
}

/// Error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(e: Error) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse { error: e.to_string() }),
    )
}

/// Create the API router
pub fn create_router(config: ExperimentConfig) -> Result<Router, Error> {
    config.validate()?;
    let model = config.partner_model()?;
    let state = Arc::new(AppState {
        config,
        model,
        requests: AtomicU64::new(0),
    });

    Ok(Router::new()
        .route("/health", get(health))
        .route("/target", post(target))
        .route("/partner", post(partner))
        .route("/arc", post(arc))
        .route("/influence", post(influence))
        .with_state(state))
}

fn request_rng(seed: Option<u64>) -> StdRng {
    StdRng::seed_from_u64(seed.unwrap_or_else(rand::random))
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        conditions: state.config.conditions.clone(),
        requests_served: state.requests.load(Ordering::Relaxed),
    })
}

/// Random target on the circle
async fn target(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TargetRequest>,
) -> Json<TargetResponse> {
    state.requests.fetch_add(1, Ordering::Relaxed);
    let mut rng = request_rng(req.seed);
    let (point, angle) = state.config.circle.random_point(&mut rng);
    Json(TargetResponse { angle, point })
}

/// Partner estimate; the condition is validated before the model runs
async fn partner(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PartnerRequest>,
) -> Result<Json<PartnerResponse>, ApiError> {
    state.requests.fetch_add(1, Ordering::Relaxed);
    let condition: Condition = req.condition.parse().map_err(bad_request)?;
    let confidence = req
        .confidence
        .map(|c| ConfidenceLevel::new(c, CONFIDENCE_LIMIT))
        .transpose()
        .map_err(bad_request)?;
    let lambda = req.transition_lambda.unwrap_or(state.config.transition_lambda);

    let mut rng = request_rng(req.seed);
    let response = state
        .model
        .respond(req.participant_angle, confidence, condition, lambda, &mut rng)
        .map_err(bad_request)?;

    Ok(Json(response))
}

/// Minor arc and optional membership
async fn arc(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ArcRequest>,
) -> Json<ArcResponse> {
    state.requests.fetch_add(1, Ordering::Relaxed);
    let arc = minor_arc(req.angle1, req.angle2);
    Json(ArcResponse {
        min_angle: arc.min_angle,
        max_angle: arc.max_angle,
        span: arc.span(),
        contains: req.candidate.map(|c| arc.contains(c)),
    })
}

/// Influence ratio
async fn influence(
    State(state): State<Arc<AppState>>,
    Json(req): Json<InfluenceRequest>,
) -> Json<InfluenceResponse> {
    state.requests.fetch_add(1, Ordering::Relaxed);
    Json(InfluenceResponse {
        ratio: influence_ratio(req.initial, req.final_angle, req.partner),
    })
}

/// Run the API server
pub async fn run_server(addr: &str, config: ExperimentConfig) -> Result<(), Box<dyn std::error::Error>> {
    let router = create_router(config)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API listening");
    println!("Visual estimate API running on {}", addr);
    println!("  GET  /health     - Health check");
    println!("  POST /target     - Random target");
    println!("  POST /partner    - Partner estimate");
    println!("  POST /arc        - Minor arc / membership");
    println!("  POST /influence  - Influence ratio");
    axum::serve(listener, router).await?;
    Ok(())
}
