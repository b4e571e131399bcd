//! Casebook Domain Layer
//!
//! Value objects shared by the scenario subsystem. Nothing here locks,
//! performs I/O, or knows about JSON.
//!
//! ## Key Concepts
//!
//! - **Node definitions**: a node's kind and its ordered state catalog
//! - **Node reference**: the `(network id, node id)` pair evidence is keyed by
//! - **Observation**: hard (one state) or soft (normalized weights) evidence
//! - **DataSet**: a snapshot of a node's marginals under one scenario
//! - **InferenceEngine**: the seam to the external belief propagation engine

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dataset;
pub mod error;
pub mod ids;
pub mod node;
pub mod observation;
pub mod state;
pub mod traits;

// Re-exports for convenience
pub use dataset::DataSet;
pub use error::{DefinitionError, DistributionError, ObservationError};
pub use ids::{ModelId, ScenarioKey};
pub use node::{NetworkDefinition, NodeDefinition, NodeKind, NodeRef};
pub use observation::{HardObservation, HardValue, Observation, SoftObservation};
pub use state::{State, StateCatalog, StateValue};
pub use traits::{InferenceEngine, InferenceRequest, MarginalEstimate};
