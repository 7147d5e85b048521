//! Model blob serialization
//!
//! The transport uploads and downloads models as opaque byte blobs. A blob
//! is a JSON-encoded [`ModelArtifact`]; decoding validates size and format
//! before the capability validator ever sees the candidate.

use super::{Capabilities, Learner, LinearRegression, LogisticRegression};
use crate::error::EngineError;
use crate::types::{Distribution, Features, Label, Prediction};
use serde::{Deserialize, Serialize};

/// Upper bound on accepted model payloads
pub const MAX_BLOB_BYTES: usize = 1024 * 1024;

/// Serialized form of a hosted model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", content = "params", rename_all = "kebab-case")]
pub enum ModelArtifact {
    LinearRegression(LinearRegression),
    LogisticRegression(LogisticRegression),
    /// Inference-only export; carries no fit capability and is therefore
    /// rejected at installation time by the capability validator.
    Frozen(Box<ModelArtifact>),
}

impl ModelArtifact {
    pub fn into_learner(self) -> Box<dyn Learner> {
        match self {
            ModelArtifact::LinearRegression(model) => Box::new(model),
            ModelArtifact::LogisticRegression(model) => Box::new(model),
            ModelArtifact::Frozen(inner) => Box::new(FrozenModel::new(inner.into_learner())),
        }
    }
}

/// Decode an uploaded blob into a candidate model
pub fn decode(blob: &[u8]) -> Result<Box<dyn Learner>, EngineError> {
    if blob.is_empty() {
        return Err(EngineError::validation("Model payload is empty."));
    }
    if blob.len() > MAX_BLOB_BYTES {
        return Err(EngineError::validation(format!(
            "Model payload exceeds {MAX_BLOB_BYTES} bytes."
        )));
    }
    let artifact: ModelArtifact = serde_json::from_slice(blob)
        .map_err(|err| EngineError::validation(format!("Unrecognized model payload: {err}.")))?;
    Ok(artifact.into_learner())
}

/// Encode the active model for download
pub fn encode(model: &dyn Learner) -> Result<Vec<u8>, EngineError> {
    serde_json::to_vec(&model.snapshot())
        .map_err(|err| EngineError::validation(format!("Model could not be serialized: {err}.")))
}

/// Wrapper around an inference-only model export. Prediction operations
/// delegate to the wrapped model; the fit capability is masked off.
#[derive(Debug)]
pub struct FrozenModel {
    inner: Box<dyn Learner>,
}

impl FrozenModel {
    pub fn new(inner: Box<dyn Learner>) -> Self {
        Self { inner }
    }
}

impl Learner for FrozenModel {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            fit_one: false,
            ..self.inner.capabilities()
        }
    }

    fn fit_one(&mut self, _features: &Features, _ground_truth: &Label) {}

    fn predict_one(&self, features: &Features) -> Option<Prediction> {
        self.inner.predict_one(features)
    }

    fn predict_proba_one(&self, features: &Features) -> Option<Distribution> {
        self.inner.predict_proba_one(features)
    }

    fn snapshot(&self) -> ModelArtifact {
        ModelArtifact::Frozen(Box::new(self.inner.snapshot()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_trained_model() {
        let mut model = LogisticRegression::default();
        let features: Features = [("x".to_string(), 1.0)].into_iter().collect();
        model.fit_one(&features, &Label::Bool(true));

        let blob = encode(&model).unwrap();
        let decoded = decode(&blob).unwrap();

        assert_eq!(decoded.snapshot(), ModelArtifact::LogisticRegression(model));
    }

    #[test]
    fn empty_blob_is_rejected() {
        let err = decode(b"").unwrap_err();
        assert_eq!(err.to_string(), "Model payload is empty.");
    }

    #[test]
    fn garbage_blob_is_rejected() {
        let err = decode(b"not a model").unwrap_err();
        assert_eq!(err.kind(), "validation");
        assert!(err.to_string().starts_with("Unrecognized model payload:"));
    }

    #[test]
    fn frozen_export_masks_fit_capability() {
        let blob =
            serde_json::to_vec(&ModelArtifact::Frozen(Box::new(ModelArtifact::LogisticRegression(
                LogisticRegression::default(),
            ))))
            .unwrap();
        let model = decode(&blob).unwrap();
        let caps = model.capabilities();
        assert!(!caps.fit_one);
        assert!(caps.predict_one && caps.predict_proba_one);
        // Predictions still work through the wrapper.
        assert!(model.predict_one(&Features::new()).is_some());
    }
}
