//! Running performance metrics
//!
//! One accumulator is bound to the configured flavor and updated
//! prequentially on every learn call: the model's current prediction is
//! scored against the incoming ground truth before the model is fitted.

use crate::types::{Label, Prediction};
use serde::{Deserialize, Serialize};

/// Incrementally updated performance metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Metric {
    Mse { sum_squared_error: f64, n: u64 },
    Accuracy { correct: u64, n: u64 },
}

/// Read-only view exposed to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricReport {
    pub kind: String,
    pub value: f64,
    pub n: u64,
}

impl Metric {
    pub fn mse() -> Self {
        Metric::Mse {
            sum_squared_error: 0.0,
            n: 0,
        }
    }

    pub fn accuracy() -> Self {
        Metric::Accuracy { correct: 0, n: 0 }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Metric::Mse { .. } => "mse",
            Metric::Accuracy { .. } => "accuracy",
        }
    }

    /// Score one prediction against the ground truth. Observations the
    /// metric cannot score (e.g. a text label under MSE) are skipped.
    pub fn update(&mut self, y_pred: &Prediction, y_true: &Label) {
        match self {
            Metric::Mse {
                sum_squared_error,
                n,
            } => {
                let (Prediction::Scalar(pred), Some(truth)) = (y_pred, y_true.as_f64()) else {
                    return;
                };
                let residual = truth - pred;
                *sum_squared_error += residual * residual;
                *n += 1;
            }
            Metric::Accuracy { correct, n } => {
                let Some(pred) = y_pred.as_label_string() else {
                    return;
                };
                if pred == y_true.to_string() {
                    *correct += 1;
                }
                *n += 1;
            }
        }
    }

    /// Current metric value; 0.0 before any observation
    pub fn value(&self) -> f64 {
        match self {
            Metric::Mse {
                sum_squared_error,
                n,
            } => {
                if *n == 0 {
                    0.0
                } else {
                    sum_squared_error / *n as f64
                }
            }
            Metric::Accuracy { correct, n } => {
                if *n == 0 {
                    0.0
                } else {
                    *correct as f64 / *n as f64
                }
            }
        }
    }

    pub fn observations(&self) -> u64 {
        match self {
            Metric::Mse { n, .. } | Metric::Accuracy { n, .. } => *n,
        }
    }

    pub fn report(&self) -> MetricReport {
        MetricReport {
            kind: self.kind().to_string(),
            value: self.value(),
            n: self.observations(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Distribution;

    #[test]
    fn mse_accumulates_squared_residuals() {
        let mut metric = Metric::mse();
        metric.update(&Prediction::Scalar(1.0), &Label::Float(3.0));
        metric.update(&Prediction::Scalar(2.0), &Label::Float(2.0));
        assert_eq!(metric.observations(), 2);
        assert!((metric.value() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn mse_skips_unscorable_ground_truth() {
        let mut metric = Metric::mse();
        metric.update(&Prediction::Scalar(1.0), &Label::Text("spam".to_string()));
        assert_eq!(metric.observations(), 0);
    }

    #[test]
    fn accuracy_counts_label_matches() {
        let mut metric = Metric::accuracy();
        metric.update(&Prediction::Label(Label::Bool(true)), &Label::Bool(true));
        metric.update(&Prediction::Label(Label::Bool(false)), &Label::Bool(true));
        assert_eq!(metric.observations(), 2);
        assert!((metric.value() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn accuracy_scores_distribution_by_argmax() {
        let mut dist = Distribution::new();
        dist.insert("true".to_string(), 0.7);
        dist.insert("false".to_string(), 0.3);
        let mut metric = Metric::accuracy();
        metric.update(&Prediction::Proba(dist), &Label::Bool(true));
        assert_eq!(metric.observations(), 1);
        assert!((metric.value() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn fresh_metrics_report_zero() {
        let report = Metric::accuracy().report();
        assert_eq!(report.kind, "accuracy");
        assert_eq!(report.value, 0.0);
        assert_eq!(report.n, 0);
    }
}
