//! Error types for scenario and model operations

use crate::registry::RegistryError;
use casebook_domain::{NodeRef, ObservationError};
use thiserror::Error;

/// Result type alias for scenario operations
pub type Result<T> = std::result::Result<T, ScenarioError>;

/// Errors surfaced by scenario operations
///
/// Every failed call leaves the scenario exactly as it was before the call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScenarioError {
    /// Scenario id already taken within the Model
    #[error("Identifier conflict: `{0}` is already in use")]
    IdentifierConflict(String),

    /// Scenario id is empty
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Node belongs to a different Model than the scenario
    #[error("Node {0} belongs to a different model")]
    CrossModelReference(NodeRef),

    /// Referenced node does not exist in the Model
    #[error("Node {0} does not exist")]
    UnknownNode(NodeRef),

    /// Referenced state does not exist on the node
    #[error("State `{state}` does not exist in node `{node}`")]
    UnknownState {
        /// Requested state
        state: String,
        /// Node id
        node: String,
    },

    /// Parallel arrays of states and weights differ in length
    #[error("Got {states} states but {weights} weights")]
    ArityMismatch {
        /// Number of states
        states: usize,
        /// Number of weights
        weights: usize,
    },

    /// Soft weight is negative or all weights are zero
    #[error("Invalid weight: {0}")]
    InvalidWeight(String),

    /// Bulk evidence JSON is missing fields or fails validation
    #[error("Malformed evidence: {0}")]
    MalformedEvidence(String),

    /// Bulk marginals JSON is missing fields or fails validation
    #[error("Malformed marginals: {0}")]
    MalformedMarginals(String),

    /// No marginals cached for the node
    #[error("No marginals for node {0}")]
    NoMarginals(NodeRef),

    /// Value type is incompatible with the node kind
    #[error("Unsupported observation type: {0}")]
    UnsupportedObservationType(String),

    /// Inference engine reported a failure
    #[error("Inference error: {0}")]
    Inference(String),
}

impl From<ObservationError> for ScenarioError {
    fn from(err: ObservationError) -> Self {
        match err {
            ObservationError::UnknownState { state, node } => ScenarioError::UnknownState { state, node },
            ObservationError::ArityMismatch { states, weights } => {
                ScenarioError::ArityMismatch { states, weights }
            }
            ObservationError::InvalidWeight(msg) => ScenarioError::InvalidWeight(msg),
            ObservationError::UnsupportedType { node, reason } => {
                ScenarioError::UnsupportedObservationType(format!("node `{}`: {}", node, reason))
            }
        }
    }
}

impl From<RegistryError> for ScenarioError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Conflict(id) => ScenarioError::IdentifierConflict(id),
            RegistryError::InvalidId(msg) => ScenarioError::InvalidIdentifier(msg),
            RegistryError::NotRegistered(id) => {
                ScenarioError::InvalidIdentifier(format!("`{}` is not registered", id))
            }
        }
    }
}

/// Errors raised by Model operations on networks and nodes
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Id taken by another entity of the Model
    #[error("Identifier conflict: `{0}` is already in use")]
    IdentifierConflict(String),

    /// Id rejected by the registry
    #[error("Registry error: {0}")]
    Registry(String),

    /// Network not part of the Model
    #[error("Network `{0}` does not exist")]
    UnknownNetwork(String),

    /// Node not part of the network
    #[error("Node {0} does not exist")]
    UnknownNode(NodeRef),
}

impl From<RegistryError> for ModelError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Conflict(id) => ModelError::IdentifierConflict(id),
            other => ModelError::Registry(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observation_errors_map_one_to_one() {
        let err: ScenarioError = ObservationError::ArityMismatch { states: 2, weights: 3 }.into();
        assert_eq!(err, ScenarioError::ArityMismatch { states: 2, weights: 3 });

        let err: ScenarioError = ObservationError::UnsupportedType {
            node: "n".to_string(),
            reason: "boolean value".to_string(),
        }
        .into();
        assert!(matches!(err, ScenarioError::UnsupportedObservationType(_)));
    }

    #[test]
    fn test_registry_conflict_maps_to_identifier_conflict() {
        let err: ScenarioError = RegistryError::Conflict("base".to_string()).into();
        assert_eq!(err, ScenarioError::IdentifierConflict("base".to_string()));

        let err: ModelError = RegistryError::Conflict("net".to_string()).into();
        assert_eq!(err, ModelError::IdentifierConflict("net".to_string()));
    }
}
