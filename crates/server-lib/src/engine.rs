//! Predict/learn orchestration engine
//!
//! Mediates every request against the store's current state. All
//! operations run under one store-wide lock so each caller observes
//! fully-old or fully-new state, never a mix; a predict-with-id and a
//! learn-with-the-same-id cannot interleave between lookup and deletion.

use crate::error::EngineError;
use crate::flavor::Flavor;
use crate::metrics::MetricReport;
use crate::model::{self, Learner};
use crate::store::Store;
use crate::types::{Features, Label, Prediction};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

const NO_MODEL: &str = "You first need to provide a model.";
const NO_FLAVOR: &str = "You first need to set a flavor.";
const NO_FEATURES: &str = "No features are stored and none were provided.";

/// Result of a predict call
#[derive(Debug, Clone, PartialEq)]
pub struct PredictOutcome {
    pub prediction: Prediction,
    /// True when a pending sample was created for a supplied id
    pub created: bool,
}

/// Point-in-time view of the engine for status reporting
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub flavor: Option<Flavor>,
    pub model: Option<String>,
    pub pending_samples: usize,
    pub metric: Option<MetricReport>,
}

/// Cloneable handle over the single-owner store
#[derive(Clone, Default)]
pub struct Engine {
    store: Arc<RwLock<Store>>,
}

impl Engine {
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(Store::new())),
        }
    }

    /// Configure (or reconfigure) the flavor. Destructive: clears the
    /// model, the metric, and every pending sample in one unit.
    pub async fn init(&self, flavor_name: &str) -> Result<Flavor, EngineError> {
        let flavor = Flavor::parse(flavor_name)?;
        let mut store = self.store.write().await;
        store.set_flavor(flavor);
        info!(flavor = %flavor, "Flavor configured, derived state reset");
        Ok(flavor)
    }

    pub async fn flavor(&self) -> Option<Flavor> {
        self.store.read().await.flavor()
    }

    /// Install a candidate model after checking the capability contract.
    /// The previous model is replaced only when validation passes.
    pub async fn install_model(
        &self,
        name: Option<String>,
        candidate: Box<dyn Learner>,
    ) -> Result<String, EngineError> {
        let mut store = self.store.write().await;
        let flavor = store.flavor().ok_or_else(|| EngineError::operation(NO_FLAVOR))?;
        model::validate(candidate.as_ref(), flavor)?;
        let name = store.set_model(name, candidate);
        info!(model = %name, flavor = %flavor, "Model installed");
        Ok(name)
    }

    pub async fn model_name(&self) -> Option<String> {
        self.store
            .read()
            .await
            .model()
            .map(|named| named.name.clone())
    }

    /// Serialize the active model for download
    pub async fn export_model(&self) -> Result<Vec<u8>, EngineError> {
        let store = self.store.read().await;
        let named = store.model().ok_or_else(|| EngineError::operation(NO_MODEL))?;
        model::encode(named.model.as_ref())
    }

    /// Remove the named active model
    pub async fn delete_model(&self, name: &str) -> Result<(), EngineError> {
        let mut store = self.store.write().await;
        let matches = store.model().is_some_and(|named| named.name == name);
        if !matches {
            return Err(EngineError::validation(format!("No model named '{name}'.")));
        }
        store.remove_model();
        info!(model = %name, "Model deleted");
        Ok(())
    }

    /// Run a prediction. With an id, the features are cached as a pending
    /// sample (overwriting any stale entry) and the outcome is marked
    /// created; without one, nothing is mutated.
    pub async fn predict(
        &self,
        features: &Features,
        id: Option<&str>,
    ) -> Result<PredictOutcome, EngineError> {
        let mut store = self.store.write().await;
        let prediction = run_model(&store, features)?;

        let created = match id {
            Some(id) => {
                store.put_pending(id, features.clone());
                debug!(id = %id, "Pending sample cached");
                true
            }
            None => false,
        };

        Ok(PredictOutcome {
            prediction,
            created,
        })
    }

    /// Consume ground truth: resolve features (cached by id first, inline
    /// second), score the current prediction into the metric, then fit the
    /// model. Lookup, deletion, scoring, and fit happen under one lock.
    pub async fn learn(
        &self,
        ground_truth: &Label,
        features: Option<Features>,
        id: Option<&str>,
    ) -> Result<(), EngineError> {
        let mut store = self.store.write().await;
        if store.model().is_none() {
            return Err(EngineError::operation(NO_MODEL));
        }

        // Cached features win by lookup success, not by inline presence.
        let resolved = match id {
            Some(id) => store.take_pending(id).or(features),
            None => features,
        };
        let features = resolved.ok_or_else(|| EngineError::operation(NO_FEATURES))?;

        let y_pred = run_model(&store, &features)?;
        if let Some(metric) = store.metric_mut() {
            metric.update(&y_pred, ground_truth);
        }
        if let Some(named) = store.model_mut() {
            named.model.fit_one(&features, ground_truth);
        }

        debug!(id = ?id, "Model updated from ground truth");
        Ok(())
    }

    pub async fn metric_report(&self) -> Result<MetricReport, EngineError> {
        let store = self.store.read().await;
        store
            .metric()
            .map(|metric| metric.report())
            .ok_or_else(|| EngineError::operation(NO_FLAVOR))
    }

    pub async fn pending_samples(&self) -> usize {
        self.store.read().await.pending_count()
    }

    /// Whether a pending sample exists for `id`
    pub async fn has_pending(&self, id: &str) -> bool {
        self.store.read().await.get_pending(id).is_some()
    }

    pub async fn status(&self) -> EngineStatus {
        let store = self.store.read().await;
        EngineStatus {
            flavor: store.flavor(),
            model: store.model().map(|named| named.name.clone()),
            pending_samples: store.pending_count(),
            metric: store.metric().map(|metric| metric.report()),
        }
    }
}

/// Flavor-appropriate prediction from the active model; fails when no
/// model is installed.
fn run_model(store: &Store, features: &Features) -> Result<Prediction, EngineError> {
    let named = store.model().ok_or_else(|| EngineError::operation(NO_MODEL))?;
    let flavor = store.flavor().ok_or_else(|| EngineError::operation(NO_FLAVOR))?;
    model::prediction_for(flavor, named.model.as_ref(), features)
        .ok_or_else(|| EngineError::operation("Model did not produce a prediction."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LinearRegression, LogisticRegression};

    fn features(pairs: &[(&str, f64)]) -> Features {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect()
    }

    async fn active_engine(flavor: &str, model: Box<dyn Learner>) -> Engine {
        let engine = Engine::new();
        engine.init(flavor).await.unwrap();
        engine.install_model(None, model).await.unwrap();
        engine
    }

    #[tokio::test]
    async fn init_resets_all_derived_state() {
        let engine = active_engine(
            "binary-classification",
            Box::new(LogisticRegression::default()),
        )
        .await;
        engine
            .predict(&features(&[("x", 1.0)]), Some("42"))
            .await
            .unwrap();
        engine
            .learn(&Label::Bool(true), Some(features(&[("x", 1.0)])), None)
            .await
            .unwrap();

        engine.init("regression").await.unwrap();

        let status = engine.status().await;
        assert_eq!(status.flavor, Some(Flavor::Regression));
        assert!(status.model.is_none());
        assert_eq!(status.pending_samples, 0);
        let metric = status.metric.unwrap();
        assert_eq!(metric.kind, "mse");
        assert_eq!(metric.n, 0);
    }

    #[tokio::test]
    async fn install_requires_a_flavor() {
        let engine = Engine::new();
        let err = engine
            .install_model(None, Box::new(LinearRegression::default()))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "You first need to set a flavor.");
    }

    #[tokio::test]
    async fn failed_contract_keeps_previous_model() {
        let engine = active_engine(
            "binary-classification",
            Box::new(LogisticRegression::default()),
        )
        .await;
        let frozen = crate::model::ModelArtifact::Frozen(Box::new(
            crate::model::ModelArtifact::LogisticRegression(LogisticRegression::default()),
        ));
        let err = engine
            .install_model(Some("frozen".to_string()), frozen.into_learner())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Model does not implement fit_one.");
        assert_eq!(engine.model_name().await.as_deref(), Some("model-1"));
    }

    #[tokio::test]
    async fn predict_without_model_fails() {
        let engine = Engine::new();
        engine.init("regression").await.unwrap();
        let err = engine.predict(&Features::new(), None).await.unwrap_err();
        assert_eq!(err.to_string(), "You first need to provide a model.");
    }

    #[tokio::test]
    async fn predict_without_id_creates_nothing() {
        let engine = active_engine("regression", Box::new(LinearRegression::default())).await;
        let outcome = engine.predict(&Features::new(), None).await.unwrap();
        assert!(!outcome.created);
        assert_eq!(engine.pending_samples().await, 0);
    }

    #[tokio::test]
    async fn predict_with_id_caches_the_features() {
        let engine = active_engine("regression", Box::new(LinearRegression::default())).await;
        let outcome = engine
            .predict(&features(&[("x", 1.0)]), Some("90210"))
            .await
            .unwrap();
        assert!(outcome.created);
        assert!(engine.has_pending("90210").await);
    }

    #[tokio::test]
    async fn learn_without_model_fails() {
        let engine = Engine::new();
        engine.init("regression").await.unwrap();
        let err = engine
            .learn(&Label::Float(1.0), Some(Features::new()), None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "You first need to provide a model.");
    }

    #[tokio::test]
    async fn learn_without_features_or_id_fails() {
        let engine = active_engine("regression", Box::new(LinearRegression::default())).await;
        let err = engine.learn(&Label::Float(1.0), None, None).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "No features are stored and none were provided."
        );
    }

    #[tokio::test]
    async fn learn_consumes_the_pending_sample_once() {
        let engine = active_engine(
            "binary-classification",
            Box::new(LogisticRegression::default()),
        )
        .await;
        engine
            .predict(&features(&[("x", 1.0)]), Some("42"))
            .await
            .unwrap();

        engine.learn(&Label::Bool(true), None, Some("42")).await.unwrap();

        assert!(!engine.has_pending("42").await);
        let metric = engine.metric_report().await.unwrap();
        assert_eq!(metric.n, 1);

        // A second learn with the same id has no cached features left.
        let err = engine
            .learn(&Label::Bool(true), None, Some("42"))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "No features are stored and none were provided."
        );
    }

    #[tokio::test]
    async fn cached_features_beat_inline_features() {
        let engine = active_engine("regression", Box::new(LinearRegression::default())).await;
        engine
            .predict(&features(&[("x", 1.0)]), Some("7"))
            .await
            .unwrap();

        // Inline features are ignored because the lookup succeeds.
        engine
            .learn(
                &Label::Float(5.0),
                Some(features(&[("x", 100.0)])),
                Some("7"),
            )
            .await
            .unwrap();
        assert!(!engine.has_pending("7").await);

        // The cached {"x": 1} was used for the fit, so the weight on x
        // moved by lr * err * 1, far less than it would under x = 100.
        let blob = engine.export_model().await.unwrap();
        let text = String::from_utf8(blob).unwrap();
        let artifact: serde_json::Value = serde_json::from_str(&text).unwrap();
        let weight = artifact["params"]["weights"]["x"].as_f64().unwrap();
        assert!(weight.abs() < 1.0, "weight was {weight}");
    }

    #[tokio::test]
    async fn learn_with_unknown_id_falls_back_to_inline_features() {
        let engine = active_engine("regression", Box::new(LinearRegression::default())).await;
        engine
            .learn(
                &Label::Float(1.0),
                Some(features(&[("x", 1.0)])),
                Some("never-predicted"),
            )
            .await
            .unwrap();
        let metric = engine.metric_report().await.unwrap();
        assert_eq!(metric.n, 1);
    }

    #[tokio::test]
    async fn metric_reflects_prequential_scoring() {
        let engine = active_engine("regression", Box::new(LinearRegression::default())).await;
        // Untrained model predicts 0.0, so the first residual is exactly y.
        engine
            .learn(&Label::Float(3.0), Some(features(&[("x", 1.0)])), None)
            .await
            .unwrap();
        let metric = engine.metric_report().await.unwrap();
        assert_eq!(metric.kind, "mse");
        assert!((metric.value - 9.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn delete_model_requires_matching_name() {
        let engine = active_engine("regression", Box::new(LinearRegression::default())).await;
        let err = engine.delete_model("other").await.unwrap_err();
        assert_eq!(err.to_string(), "No model named 'other'.");

        engine.delete_model("model-1").await.unwrap();
        assert!(engine.model_name().await.is_none());
    }

    #[tokio::test]
    async fn metric_report_requires_a_flavor() {
        let engine = Engine::new();
        let err = engine.metric_report().await.unwrap_err();
        assert_eq!(err.to_string(), "You first need to set a flavor.");
    }
}
