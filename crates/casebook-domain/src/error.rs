//! Domain error types

use thiserror::Error;

/// Errors raised while building node and network definitions
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DefinitionError {
    /// A state catalog must declare at least one state
    #[error("State catalog is empty")]
    EmptyCatalog,

    /// Two states in one catalog share an id
    #[error("Duplicate state id: {0}")]
    DuplicateState(String),

    /// Two nodes in one network share an id
    #[error("Duplicate node id `{node}` in network `{network}`")]
    DuplicateNode {
        /// Network id
        network: String,
        /// Offending node id
        node: String,
    },

    /// Identifier is empty or otherwise unusable
    #[error("Invalid identifier: {0}")]
    InvalidId(String),

    /// Interval bounds are malformed or overlap another interval
    #[error("Invalid interval state `{state}`: {issue}")]
    InvalidInterval {
        /// State id
        state: String,
        /// Description of the issue
        issue: String,
    },

    /// Declared states do not fit the node kind
    #[error("Node `{node}` does not fit its kind: {reason}")]
    KindMismatch {
        /// Node id
        node: String,
        /// Description of the mismatch
        reason: String,
    },

    /// Point value is not finite
    #[error("Invalid point state `{0}`: value must be finite")]
    InvalidPoint(String),
}

/// Errors raised while resolving or normalizing an observation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ObservationError {
    /// Referenced state does not exist on the node
    #[error("State `{state}` does not exist in node `{node}`")]
    UnknownState {
        /// Requested state id (or numeric value rendered as text)
        state: String,
        /// Node id
        node: String,
    },

    /// States and weights have different lengths
    #[error("Got {states} states but {weights} weights")]
    ArityMismatch {
        /// Number of states supplied
        states: usize,
        /// Number of weights supplied
        weights: usize,
    },

    /// Weight is negative, not finite, repeated, or all weights are zero
    #[error("Invalid weight: {0}")]
    InvalidWeight(String),

    /// Value cannot be an observation for this kind of node
    #[error("Unsupported observation for node `{node}`: {reason}")]
    UnsupportedType {
        /// Node id
        node: String,
        /// Description of the mismatch
        reason: String,
    },
}

/// Errors raised while validating a marginal distribution
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DistributionError {
    /// Distribution lists no states
    #[error("Distribution for `{0}` is empty")]
    Empty(String),

    /// State is not declared on the node
    #[error("State `{state}` does not exist in node `{node}`")]
    UnknownState {
        /// State id
        state: String,
        /// Node id
        node: String,
    },

    /// State listed more than once
    #[error("State `{state}` appears more than once for node `{node}`")]
    DuplicateState {
        /// State id
        state: String,
        /// Node id
        node: String,
    },

    /// Probability is not a finite number in [0, 1]
    #[error("Probability {value} for state `{state}` is outside [0, 1]")]
    InvalidProbability {
        /// State id
        state: String,
        /// Offending value
        value: f64,
    },

    /// Probabilities do not sum to one
    #[error("Probabilities for `{node}` sum to {total}, expected 1")]
    BadTotal {
        /// Node id
        node: String,
        /// Actual sum
        total: f64,
    },
}
