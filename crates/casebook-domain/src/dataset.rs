//! Marginals snapshots

use crate::error::DistributionError;
use crate::ids::ScenarioKey;
use crate::node::{NodeDefinition, NodeRef};
use std::collections::HashSet;

/// Snapshot of a node's per-state probabilities under one scenario
///
/// Immutable once built. `generation` records the scenario's observation
/// generation at the time the marginals were computed or loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSet {
    scenario: ScenarioKey,
    node: NodeRef,
    generation: u64,
    entries: Vec<(String, f64)>,
}

impl DataSet {
    /// Build a data set after validating the distribution against the node
    ///
    /// Entry order is kept exactly as given.
    ///
    /// # Errors
    /// Returns error if the list is empty, a state is unknown or repeated,
    /// a probability is outside [0, 1], or the total differs from 1 by more
    /// than `tolerance`.
    pub fn new(
        scenario: ScenarioKey,
        node: NodeRef,
        definition: &NodeDefinition,
        generation: u64,
        entries: Vec<(String, f64)>,
        tolerance: f64,
    ) -> Result<Self, DistributionError> {
        validate_distribution(definition, &entries, tolerance)?;

        Ok(Self {
            scenario,
            node,
            generation,
            entries,
        })
    }

    /// Scenario these marginals belong to
    pub fn scenario(&self) -> ScenarioKey {
        self.scenario
    }

    /// Node these marginals describe
    pub fn node(&self) -> &NodeRef {
        &self.node
    }

    /// Observation generation the marginals were computed at
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// `(state, probability)` pairs in their original order
    pub fn entries(&self) -> &[(String, f64)] {
        &self.entries
    }

    /// Probability of one state, if listed
    pub fn probability(&self, state: &str) -> Option<f64> {
        self.entries.iter().find(|(id, _)| id == state).map(|(_, p)| *p)
    }

    /// State with the highest probability (first one wins on ties)
    pub fn most_likely(&self) -> Option<&str> {
        self.entries
            .iter()
            .fold(None::<&(String, f64)>, |best, entry| match best {
                Some(b) if b.1 >= entry.1 => Some(b),
                _ => Some(entry),
            })
            .map(|(id, _)| id.as_str())
    }
}

/// Check a distribution against a node's declared states
pub fn validate_distribution(
    definition: &NodeDefinition,
    entries: &[(String, f64)],
    tolerance: f64,
) -> Result<(), DistributionError> {
    let node = definition.id();
    if entries.is_empty() {
        return Err(DistributionError::Empty(node.to_string()));
    }

    let mut seen = HashSet::new();
    let mut total = 0.0;

    for (state, probability) in entries {
        if definition.states().get(state).is_none() {
            return Err(DistributionError::UnknownState {
                state: state.clone(),
                node: node.to_string(),
            });
        }
        if !seen.insert(state.as_str()) {
            return Err(DistributionError::DuplicateState {
                state: state.clone(),
                node: node.to_string(),
            });
        }
        if !probability.is_finite() || *probability < 0.0 || *probability > 1.0 + tolerance {
            return Err(DistributionError::InvalidProbability {
                state: state.clone(),
                value: *probability,
            });
        }
        total += probability;
    }

    if (total - 1.0).abs() > tolerance {
        return Err(DistributionError::BadTotal {
            node: node.to_string(),
            total,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-6;

    fn node() -> NodeDefinition {
        NodeDefinition::labelled("weather", ["sun", "rain", "snow"]).unwrap()
    }

    fn entries(pairs: &[(&str, f64)]) -> Vec<(String, f64)> {
        pairs.iter().map(|(s, p)| (s.to_string(), *p)).collect()
    }

    #[test]
    fn test_valid_dataset_keeps_order() {
        let ds = DataSet::new(
            ScenarioKey::new(),
            NodeRef::new("net", "weather"),
            &node(),
            3,
            entries(&[("snow", 0.1), ("sun", 0.6), ("rain", 0.3)]),
            TOL,
        )
        .unwrap();

        assert_eq!(ds.entries()[0].0, "snow");
        assert_eq!(ds.generation(), 3);
        assert_eq!(ds.probability("sun"), Some(0.6));
        assert_eq!(ds.most_likely(), Some("sun"));
    }

    #[test]
    fn test_total_within_tolerance() {
        let ok = validate_distribution(&node(), &entries(&[("sun", 0.5), ("rain", 0.5000004)]), TOL);
        assert!(ok.is_ok());

        let bad = validate_distribution(&node(), &entries(&[("sun", 0.5), ("rain", 0.49)]), TOL);
        assert!(matches!(bad, Err(DistributionError::BadTotal { .. })));
    }

    #[test]
    fn test_invalid_entries() {
        let unknown = validate_distribution(&node(), &entries(&[("fog", 1.0)]), TOL);
        assert!(matches!(unknown, Err(DistributionError::UnknownState { .. })));

        let duplicate = validate_distribution(&node(), &entries(&[("sun", 0.5), ("sun", 0.5)]), TOL);
        assert!(matches!(duplicate, Err(DistributionError::DuplicateState { .. })));

        let negative = validate_distribution(&node(), &entries(&[("sun", -0.5), ("rain", 1.5)]), TOL);
        assert!(matches!(negative, Err(DistributionError::InvalidProbability { .. })));

        let empty = validate_distribution(&node(), &[], TOL);
        assert!(matches!(empty, Err(DistributionError::Empty(_))));
    }
}
