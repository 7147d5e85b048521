//! Problem flavors and the registry of allowed values
//!
//! The flavor fixes the shape of a prediction (scalar, label, or
//! probability distribution) and the metric the server accumulates.

use crate::error::EngineError;
use crate::metrics::Metric;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The class of prediction problem hosted by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Flavor {
    #[serde(rename = "regression")]
    Regression,
    #[serde(rename = "binary-classification")]
    BinaryClassification,
    #[serde(rename = "multiclass-classification")]
    MulticlassClassification,
}

/// Allowed flavor names, sorted, as they appear on the wire
pub const ALLOWED_FLAVORS: &[&str] = &[
    "binary-classification",
    "multiclass-classification",
    "regression",
];

impl Flavor {
    /// Parse a wire name, failing with a message that enumerates the
    /// allowed set verbatim.
    pub fn parse(name: &str) -> Result<Flavor, EngineError> {
        match name {
            "regression" => Ok(Flavor::Regression),
            "binary-classification" => Ok(Flavor::BinaryClassification),
            "multiclass-classification" => Ok(Flavor::MulticlassClassification),
            _ => Err(EngineError::validation(allowed_flavors_message())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Flavor::Regression => "regression",
            Flavor::BinaryClassification => "binary-classification",
            Flavor::MulticlassClassification => "multiclass-classification",
        }
    }

    /// Whether predictions are labels/distributions rather than scalars
    pub fn is_classification(&self) -> bool {
        !matches!(self, Flavor::Regression)
    }

    /// Fresh metric accumulator for this flavor
    pub fn default_metric(&self) -> Metric {
        match self {
            Flavor::Regression => Metric::mse(),
            Flavor::BinaryClassification | Flavor::MulticlassClassification => Metric::accuracy(),
        }
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn allowed_flavors_message() -> String {
    let quoted: Vec<String> = ALLOWED_FLAVORS.iter().map(|f| format!("'{f}'")).collect();
    format!("Allowed flavors are {}.", quoted.join(", "))
}
