//! Trait definitions for external interactions
//!
//! The inference algorithm lives outside this workspace. These types define
//! only the shapes exchanged with it.

use crate::node::{NetworkDefinition, NodeRef};
use crate::observation::Observation;
use std::sync::Arc;

/// Everything an engine needs to compute marginals for one scenario
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    /// Networks of the model, in registration order
    pub networks: Vec<Arc<NetworkDefinition>>,

    /// Current observations of the scenario, ordered by node
    pub observations: Vec<(NodeRef, Observation)>,
}

impl InferenceRequest {
    /// Observation on a node, if any
    pub fn observation(&self, node: &NodeRef) -> Option<&Observation> {
        self.observations
            .iter()
            .find(|(r, _)| r == node)
            .map(|(_, obs)| obs)
    }
}

/// Marginal distribution for one node as produced by an engine
#[derive(Debug, Clone, PartialEq)]
pub struct MarginalEstimate {
    /// Node the distribution describes
    pub node: NodeRef,

    /// `(state, probability)` pairs
    pub entries: Vec<(String, f64)>,
}

/// Trait for belief propagation engines
///
/// Implemented outside this workspace. The scenario layer validates every
/// estimate before caching it.
pub trait InferenceEngine {
    /// Error type for inference failures
    type Error: std::fmt::Display;

    /// Compute marginals for the observations in `request`
    fn infer(&self, request: &InferenceRequest) -> Result<Vec<MarginalEstimate>, Self::Error>;
}
