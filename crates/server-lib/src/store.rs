//! Single logical key-value store
//!
//! One store per process holds the configured flavor, the active model,
//! the metric accumulator, and pending samples keyed `#<id>`. Exactly one
//! flavor, model, and metric exist at any time; setting the flavor
//! cascades and clears everything derived from it as one unit.

use crate::flavor::Flavor;
use crate::metrics::Metric;
use crate::model::Learner;
use crate::types::Features;
use std::collections::HashMap;

/// Prefix reserved for pending-sample keys
pub const PENDING_PREFIX: &str = "#";

/// Key under which a pending sample for `id` is stored
pub fn pending_key(id: &str) -> String {
    format!("{PENDING_PREFIX}{id}")
}

/// The active model together with its caller-visible name
pub struct NamedModel {
    pub name: String,
    pub model: Box<dyn Learner>,
}

/// Process-wide mutable state, single-owner; callers serialize access
pub struct Store {
    flavor: Option<Flavor>,
    model: Option<NamedModel>,
    metric: Option<Metric>,
    pending: HashMap<String, Features>,
    models_added: u64,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self {
            flavor: None,
            model: None,
            metric: None,
            pending: HashMap::new(),
            models_added: 0,
        }
    }

    pub fn flavor(&self) -> Option<Flavor> {
        self.flavor
    }

    /// Configure the flavor. Destructive: resets the metric to the flavor
    /// default, clears the active model, clears all pending samples.
    pub fn set_flavor(&mut self, flavor: Flavor) {
        self.flavor = Some(flavor);
        self.metric = Some(flavor.default_metric());
        self.model = None;
        self.pending.clear();
    }

    pub fn model(&self) -> Option<&NamedModel> {
        self.model.as_ref()
    }

    pub fn model_mut(&mut self) -> Option<&mut NamedModel> {
        self.model.as_mut()
    }

    /// Install a model, replacing any previous one. Picks a default name
    /// when none is given and returns the name in effect.
    pub fn set_model(&mut self, name: Option<String>, model: Box<dyn Learner>) -> String {
        self.models_added += 1;
        let name = name.unwrap_or_else(|| format!("model-{}", self.models_added));
        self.model = Some(NamedModel {
            name: name.clone(),
            model,
        });
        name
    }

    /// Drop the active model reference; returns the removed name
    pub fn remove_model(&mut self) -> Option<String> {
        self.model.take().map(|named| named.name)
    }

    pub fn metric(&self) -> Option<&Metric> {
        self.metric.as_ref()
    }

    pub fn metric_mut(&mut self) -> Option<&mut Metric> {
        self.metric.as_mut()
    }

    /// Cache features awaiting ground truth, overwriting a stale entry
    /// under the same id.
    pub fn put_pending(&mut self, id: &str, features: Features) {
        self.pending.insert(pending_key(id), features);
    }

    pub fn get_pending(&self, id: &str) -> Option<&Features> {
        self.pending.get(&pending_key(id))
    }

    /// Remove and return the pending sample for `id` (read-once)
    pub fn take_pending(&mut self, id: &str) -> Option<Features> {
        self.pending.remove(&pending_key(id))
    }

    /// Idempotent: deleting a nonexistent pending sample is a no-op
    pub fn delete_pending(&mut self, id: &str) {
        self.pending.remove(&pending_key(id));
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
