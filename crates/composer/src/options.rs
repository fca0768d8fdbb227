//! Per-path merge options

use std::collections::BTreeMap;
use types::ArrayStrategy;

/// Sequences of loader rules, merged with [`ArrayStrategy::Smart`] by [`MergeOptions::with_smart_rules`]
pub const SMART_RULE_PATHS: [&str; 2] = ["module.rules", "module.loaders"];

/// Array strategies keyed by dotted field path
///
/// Paths without a rule use [`ArrayStrategy::Append`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOptions {
    rules: BTreeMap<String, ArrayStrategy>,
}

impl MergeOptions {
    /// Create options with no rules
    pub fn new() -> Self {
        Self::default()
    }

    /// Build options from `(path, strategy)` pairs; later pairs win
    pub fn from_rules<I, S>(rules: I) -> Self
    where
        I: IntoIterator<Item = (S, ArrayStrategy)>,
        S: Into<String>,
    {
        Self {
            rules: rules.into_iter().map(|(path, strategy)| (path.into(), strategy)).collect(),
        }
    }

    /// Builder-style rule setter
    pub fn with_rule(mut self, path: impl Into<String>, strategy: ArrayStrategy) -> Self {
        self.set_rule(path, strategy);
        self
    }

    pub fn set_rule(&mut self, path: impl Into<String>, strategy: ArrayStrategy) {
        self.rules.insert(path.into(), strategy);
    }

    /// Use [`ArrayStrategy::Smart`] for the loader rule lists that have no rule yet
    pub fn with_smart_rules(mut self) -> Self {
        for path in SMART_RULE_PATHS {
            self.rules.entry(path.to_string()).or_insert(ArrayStrategy::Smart);
        }
        self
    }

    /// Strategy used for the sequence at `path`
    pub fn strategy_for(&self, path: &str) -> ArrayStrategy {
        self.rules.get(path).copied().unwrap_or_default()
    }

    pub fn rules(&self) -> impl Iterator<Item = (&str, ArrayStrategy)> {
        self.rules.iter().map(|(path, strategy)| (path.as_str(), *strategy))
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
