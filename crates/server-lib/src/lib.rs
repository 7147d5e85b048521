//! Core library for the online-learning model server
//!
//! This crate provides:
//! - The flavor registry and per-flavor metric defaults
//! - The pluggable model contract and capability validator
//! - The single logical store (flavor, model, metric, pending samples)
//! - The predict/learn orchestration engine
//! - Health checks and Prometheus metrics

pub mod engine;
pub mod error;
pub mod flavor;
pub mod health;
pub mod metrics;
pub mod model;
pub mod observability;
pub mod store;
pub mod types;

pub use engine::{Engine, EngineStatus, PredictOutcome};
pub use error::{EngineError, ErrorDetail, MISSING_FIELD};
pub use flavor::{Flavor, ALLOWED_FLAVORS};
pub use health::{ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse};
pub use metrics::{Metric, MetricReport};
pub use model::{Capabilities, Learner, ModelArtifact};
pub use observability::ServerMetrics;
pub use types::{Distribution, Features, Label, Prediction};
