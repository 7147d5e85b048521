//! HTTP API for the model server
//!
//! Domain routes live under `/api`; `/healthz`, `/readyz`, and `/metrics`
//! serve probes and Prometheus exposition. Request bodies are validated
//! structurally so missing required fields surface as field-level error
//! maps rather than deserialization failures.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::Deserialize;
use serde_json::json;
use server_lib::{
    health::{components, ComponentHealth, ComponentStatus},
    model, Engine, EngineError, Features, HealthRegistry, Label, ServerMetrics,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Engine,
    pub health: HealthRegistry,
    pub metrics: ServerMetrics,
}

impl AppState {
    pub fn new(engine: Engine, health: HealthRegistry, metrics: ServerMetrics) -> Self {
        Self {
            engine,
            health,
            metrics,
        }
    }

    /// Count the error before handing it back to the transport
    fn reject(&self, err: EngineError) -> ApiError {
        self.metrics.inc_request_error(err.kind());
        ApiError(err)
    }
}

/// Transport wrapper mapping engine errors to HTTP responses
#[derive(Debug)]
pub struct ApiError(pub EngineError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match &self.0 {
            EngineError::Validation(detail) => json!({ "message": detail }),
            EngineError::Contract(message) | EngineError::Operation(message) => {
                json!({ "message": message })
            }
        };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct InitRequest {
    flavor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelQuery {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PredictRequest {
    features: Option<Features>,
    id: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct LearnRequest {
    ground_truth: Option<Label>,
    features: Option<Features>,
    id: Option<serde_json::Value>,
}

/// Stringify a caller-supplied id token; `42` and `"42"` are the same id
fn id_token(id: &serde_json::Value) -> Result<String, EngineError> {
    match id {
        serde_json::Value::String(s) => Ok(s.clone()),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Bool(b) => Ok(b.to_string()),
        _ => Err(EngineError::validation("Id must be a scalar value.")),
    }
}

async fn init(
    State(state): State<Arc<AppState>>,
    Json(request): Json<InitRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = request
        .flavor
        .ok_or_else(|| state.reject(EngineError::missing_field("flavor")))?;
    let flavor = state
        .engine
        .init(&name)
        .await
        .map_err(|err| state.reject(err))?;

    state.metrics.clear_model_info();
    state.metrics.set_pending_samples(0);
    state
        .health
        .update(components::MODEL, ComponentHealth::degraded("No active model."))
        .await;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "created", "flavor": flavor })),
    ))
}

async fn set_model(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ModelQuery>,
    blob: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let candidate = model::decode(&blob).map_err(|err| state.reject(err))?;
    let name = state
        .engine
        .install_model(query.name, candidate)
        .await
        .map_err(|err| state.reject(err))?;

    if let Some(flavor) = state.engine.flavor().await {
        state.metrics.set_model_info(&name, flavor.as_str());
    }
    state
        .health
        .update(components::MODEL, ComponentHealth::healthy())
        .await;

    Ok((StatusCode::CREATED, Json(json!({ "name": name }))))
}

async fn get_model(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let blob = state
        .engine
        .export_model()
        .await
        .map_err(|err| state.reject(err))?;
    Ok((
        StatusCode::OK,
        [("content-type", "application/octet-stream")],
        blob,
    ))
}

async fn delete_model(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ModelQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let name = query
        .name
        .ok_or_else(|| state.reject(EngineError::missing_field("name")))?;
    state
        .engine
        .delete_model(&name)
        .await
        .map_err(|err| state.reject(err))?;

    state.metrics.clear_model_info();
    state
        .health
        .update(components::MODEL, ComponentHealth::degraded("No active model."))
        .await;

    Ok((StatusCode::OK, Json(json!({ "status": "ok" }))))
}

async fn predict(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PredictRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let features = request
        .features
        .ok_or_else(|| state.reject(EngineError::missing_field("features")))?;
    let id = request
        .id
        .as_ref()
        .map(id_token)
        .transpose()
        .map_err(|err| state.reject(err))?;

    let start = Instant::now();
    let outcome = state
        .engine
        .predict(&features, id.as_deref())
        .await
        .map_err(|err| state.reject(err))?;
    state
        .metrics
        .observe_predict_latency(start.elapsed().as_secs_f64());
    state.metrics.inc_predictions();
    state
        .metrics
        .set_pending_samples(state.engine.pending_samples().await as i64);

    let (status_code, status) = if outcome.created {
        (StatusCode::CREATED, "created")
    } else {
        (StatusCode::OK, "ok")
    };
    Ok((
        status_code,
        Json(json!({ "prediction": outcome.prediction, "status": status })),
    ))
}

async fn learn(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LearnRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ground_truth = request
        .ground_truth
        .ok_or_else(|| state.reject(EngineError::missing_field("ground_truth")))?;
    let id = request
        .id
        .as_ref()
        .map(id_token)
        .transpose()
        .map_err(|err| state.reject(err))?;

    let start = Instant::now();
    state
        .engine
        .learn(&ground_truth, request.features, id.as_deref())
        .await
        .map_err(|err| state.reject(err))?;
    state
        .metrics
        .observe_learn_latency(start.elapsed().as_secs_f64());
    state.metrics.inc_learns();
    state
        .metrics
        .set_pending_samples(state.engine.pending_samples().await as i64);

    Ok((StatusCode::CREATED, Json(json!({ "status": "created" }))))
}

async fn metric(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let report = state
        .engine
        .metric_report()
        .await
        .map_err(|err| state.reject(err))?;
    Ok(Json(report))
}

async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.engine.status().await)
}

/// Health check - 200 while at least partially operational, 503 otherwise
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health.health().await;
    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status_code, Json(health))
}

async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health.readiness().await;
    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn prometheus_metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .unwrap_or_default();
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/init", post(init))
        .route(
            "/api/model",
            post(set_model).get(get_model).delete(delete_model),
        )
        .route("/api/predict", post(predict))
        .route("/api/learn", post(learn))
        .route("/api/metric", get(metric))
        .route("/api/status", get(status))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(prometheus_metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(bind_addr: &str, port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("{bind_addr}:{port}");
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
