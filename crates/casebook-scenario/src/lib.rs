//! Casebook Scenario Subsystem
//!
//! Evidence scenarios over the networks of a Model: named, independent sets
//! of hard and soft observations, plus the marginals cached for them.
//!
//! ## Components
//!
//! - **Model**: owns networks, the identifier registry and the scenario factory
//! - **Scenario**: observations and marginals for one what-if case
//! - **Exchange**: JSON import and export of evidence and marginals
//! - **Config**: validation tolerances, loadable from TOML
//!
//! ## Invalidation
//!
//! Any observation change clears every cached marginal of that scenario.
//! Marginals come back through [`Scenario::load_marginals`] or
//! [`Scenario::calculate`].
//!
//! ## Threading
//!
//! Renames and creation are serialized by the Model's registry. A single
//! scenario is not internally synchronized.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod exchange;
pub mod model;
pub mod registry;
pub mod scenario;

pub use config::{ConfigError, EvidenceConfig};
pub use error::{ModelError, Result, ScenarioError};
pub use model::{Model, Node};
pub use registry::{EntityKey, IdentifierRegistry, RegistryError};
pub use scenario::Scenario;
