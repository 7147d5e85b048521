//! Pluggable model contract
//!
//! A model is an opaque value behind the [`Learner`] trait. What it can do
//! is advertised structurally through [`Capabilities`] and checked once at
//! installation time; output shape is trusted at call time.

mod codec;
mod linear;

pub use codec::{decode, encode, FrozenModel, ModelArtifact, MAX_BLOB_BYTES};
pub use linear::{LinearRegression, LogisticRegression};

use crate::error::EngineError;
use crate::flavor::Flavor;
use crate::types::{Distribution, Features, Label, Prediction};

/// Structural capability advertisement for a candidate model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Incremental fit from a single observation
    pub fit_one: bool,
    /// Point prediction
    pub predict_one: bool,
    /// Probability distribution over labels
    pub predict_proba_one: bool,
}

/// Contract every hosted model satisfies
pub trait Learner: Send + Sync + std::fmt::Debug {
    /// Which operations this model actually implements
    fn capabilities(&self) -> Capabilities;

    /// Update internal state from one observation
    fn fit_one(&mut self, features: &Features, ground_truth: &Label);

    /// Point prediction, `None` when unsupported
    fn predict_one(&self, features: &Features) -> Option<Prediction>;

    /// Probability distribution, `None` when unsupported
    fn predict_proba_one(&self, features: &Features) -> Option<Distribution>;

    /// Serializable export of the current state
    fn snapshot(&self) -> ModelArtifact;
}

/// Check a candidate model against the capability contract for a flavor.
///
/// Rules are checked in order: the incremental-fit operation first, then at
/// least one prediction operation appropriate to the flavor (point
/// prediction for regression, point or probability for classification).
pub fn validate(model: &dyn Learner, flavor: Flavor) -> Result<(), EngineError> {
    let caps = model.capabilities();

    if !caps.fit_one {
        return Err(EngineError::contract("Model does not implement fit_one."));
    }

    let can_predict = if flavor.is_classification() {
        caps.predict_one || caps.predict_proba_one
    } else {
        caps.predict_one
    };
    if !can_predict {
        return Err(EngineError::contract(
            "Model does not implement predict_one or predict_proba_one.",
        ));
    }

    Ok(())
}

/// Flavor-appropriate prediction: scalar for regression; distribution when
/// the model supports it, else point label, for classification.
pub fn prediction_for(
    flavor: Flavor,
    model: &dyn Learner,
    features: &Features,
) -> Option<Prediction> {
    if flavor.is_classification() && model.capabilities().predict_proba_one {
        model.predict_proba_one(features).map(Prediction::Proba)
    } else {
        model.predict_one(features)
    }
}
