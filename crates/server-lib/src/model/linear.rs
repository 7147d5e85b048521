//! Built-in incremental linear models
//!
//! Single-pass SGD learners with sparse weight maps. Features absent from
//! an observation are treated as zero, and unseen feature names grow the
//! weight map on first update.

use super::{Capabilities, Learner, ModelArtifact};
use crate::types::{Distribution, Features, Label, Prediction};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const DEFAULT_LEARNING_RATE: f64 = 0.01;

fn dot(weights: &BTreeMap<String, f64>, features: &Features) -> f64 {
    features
        .iter()
        .map(|(name, value)| weights.get(name).copied().unwrap_or(0.0) * value)
        .sum()
}

fn sigmoid(raw: f64) -> f64 {
    1.0 / (1.0 + (-raw).exp())
}

/// Linear regression fitted by SGD on squared loss
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    pub weights: BTreeMap<String, f64>,
    pub intercept: f64,
    pub learning_rate: f64,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self {
            weights: BTreeMap::new(),
            intercept: 0.0,
            learning_rate: DEFAULT_LEARNING_RATE,
        }
    }
}

impl LinearRegression {
    fn raw(&self, features: &Features) -> f64 {
        dot(&self.weights, features) + self.intercept
    }
}

impl Learner for LinearRegression {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            fit_one: true,
            predict_one: true,
            predict_proba_one: false,
        }
    }

    fn fit_one(&mut self, features: &Features, ground_truth: &Label) {
        let Some(target) = ground_truth.as_f64() else {
            return;
        };
        let error = target - self.raw(features);
        let step = self.learning_rate * error;
        for (name, value) in features {
            *self.weights.entry(name.clone()).or_insert(0.0) += step * value;
        }
        self.intercept += step;
    }

    fn predict_one(&self, features: &Features) -> Option<Prediction> {
        Some(Prediction::Scalar(self.raw(features)))
    }

    fn predict_proba_one(&self, _features: &Features) -> Option<Distribution> {
        None
    }

    fn snapshot(&self) -> ModelArtifact {
        ModelArtifact::LinearRegression(self.clone())
    }
}

/// Binary logistic regression fitted by SGD on log loss
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub weights: BTreeMap<String, f64>,
    pub intercept: f64,
    pub learning_rate: f64,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self {
            weights: BTreeMap::new(),
            intercept: 0.0,
            learning_rate: DEFAULT_LEARNING_RATE,
        }
    }
}

impl LogisticRegression {
    fn proba_true(&self, features: &Features) -> f64 {
        sigmoid(dot(&self.weights, features) + self.intercept)
    }
}

impl Learner for LogisticRegression {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            fit_one: true,
            predict_one: true,
            predict_proba_one: true,
        }
    }

    fn fit_one(&mut self, features: &Features, ground_truth: &Label) {
        let Some(target) = ground_truth.as_f64() else {
            return;
        };
        // Gradient of the log loss: p - y
        let gradient = self.proba_true(features) - target.clamp(0.0, 1.0);
        let step = self.learning_rate * gradient;
        for (name, value) in features {
            *self.weights.entry(name.clone()).or_insert(0.0) -= step * value;
        }
        self.intercept -= step;
    }

    fn predict_one(&self, features: &Features) -> Option<Prediction> {
        let label = self.proba_true(features) >= 0.5;
        Some(Prediction::Label(Label::Bool(label)))
    }

    fn predict_proba_one(&self, features: &Features) -> Option<Distribution> {
        let p = self.proba_true(features);
        let mut dist = Distribution::new();
        dist.insert("true".to_string(), p);
        dist.insert("false".to_string(), 1.0 - p);
        Some(dist)
    }

    fn snapshot(&self) -> ModelArtifact {
        ModelArtifact::LogisticRegression(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(pairs: &[(&str, f64)]) -> Features {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect()
    }

    #[test]
    fn linear_regression_converges_on_a_line() {
        let mut model = LinearRegression::default();
        // y = 2x, a few hundred passes over a handful of points
        for _ in 0..500 {
            for x in [1.0, 2.0, 3.0] {
                model.fit_one(&features(&[("x", x)]), &Label::Float(2.0 * x));
            }
        }
        let Some(Prediction::Scalar(pred)) = model.predict_one(&features(&[("x", 4.0)])) else {
            panic!("expected scalar prediction");
        };
        assert!((pred - 8.0).abs() < 0.5, "prediction was {pred}");
    }

    #[test]
    fn untrained_linear_regression_predicts_zero() {
        let model = LinearRegression::default();
        assert_eq!(
            model.predict_one(&Features::new()),
            Some(Prediction::Scalar(0.0))
        );
    }

    #[test]
    fn logistic_regression_separates_signed_inputs() {
        let mut model = LogisticRegression::default();
        for _ in 0..500 {
            model.fit_one(&features(&[("x", 1.0)]), &Label::Bool(true));
            model.fit_one(&features(&[("x", -1.0)]), &Label::Bool(false));
        }
        assert_eq!(
            model.predict_one(&features(&[("x", 2.0)])),
            Some(Prediction::Label(Label::Bool(true)))
        );
        assert_eq!(
            model.predict_one(&features(&[("x", -2.0)])),
            Some(Prediction::Label(Label::Bool(false)))
        );
    }

    #[test]
    fn logistic_distribution_sums_to_one() {
        let model = LogisticRegression::default();
        let dist = model.predict_proba_one(&features(&[("x", 1.0)])).unwrap();
        let total: f64 = dist.values().sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!(dist.contains_key("true") && dist.contains_key("false"));
    }

    #[test]
    fn text_ground_truth_leaves_weights_untouched() {
        let mut model = LinearRegression::default();
        model.fit_one(&features(&[("x", 1.0)]), &Label::Text("spam".to_string()));
        assert!(model.weights.is_empty());
        assert_eq!(model.intercept, 0.0);
    }
}
