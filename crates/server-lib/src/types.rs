//! Core wire-facing value types
//!
//! Feature maps, ground-truth labels, and predictions as they cross the
//! transport boundary. Labels and predictions deserialize untagged so the
//! JSON forms stay plain (`true`, `3`, `"spam"`, `{"x": 1.0}`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A named feature vector
pub type Features = BTreeMap<String, f64>;

/// A probability distribution over stringified labels
pub type Distribution = BTreeMap<String, f64>;

/// A ground-truth value or predicted label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Label {
    /// Numeric view, used by regression scoring; booleans map to 0/1
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Label::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Label::Int(i) => Some(*i as f64),
            Label::Float(f) => Some(*f),
            Label::Text(_) => None,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Bool(b) => write!(f, "{b}"),
            Label::Int(i) => write!(f, "{i}"),
            Label::Float(v) => write!(f, "{v}"),
            Label::Text(s) => f.write_str(s),
        }
    }
}

/// A flavor-shaped prediction: scalar for regression, label or
/// distribution for classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Prediction {
    Scalar(f64),
    Label(Label),
    Proba(Distribution),
}

impl Prediction {
    /// Canonical label form for accuracy scoring: the label itself, or the
    /// argmax of a distribution.
    pub fn as_label_string(&self) -> Option<String> {
        match self {
            Prediction::Scalar(v) => Some(v.to_string()),
            Prediction::Label(label) => Some(label.to_string()),
            Prediction::Proba(dist) => dist
                .iter()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(label, _)| label.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_deserialize_untagged() {
        assert_eq!(serde_json::from_str::<Label>("true").unwrap(), Label::Bool(true));
        assert_eq!(serde_json::from_str::<Label>("3").unwrap(), Label::Int(3));
        assert_eq!(serde_json::from_str::<Label>("1.5").unwrap(), Label::Float(1.5));
        assert_eq!(
            serde_json::from_str::<Label>("\"spam\"").unwrap(),
            Label::Text("spam".to_string())
        );
    }

    #[test]
    fn proba_argmax_picks_highest_mass() {
        let mut dist = Distribution::new();
        dist.insert("ham".to_string(), 0.2);
        dist.insert("spam".to_string(), 0.8);
        let pred = Prediction::Proba(dist);
        assert_eq!(pred.as_label_string().as_deref(), Some("spam"));
    }

    #[test]
    fn bool_label_is_numeric_zero_or_one() {
        assert_eq!(Label::Bool(true).as_f64(), Some(1.0));
        assert_eq!(Label::Bool(false).as_f64(), Some(0.0));
        assert_eq!(Label::Text("x".to_string()).as_f64(), None);
    }
}
