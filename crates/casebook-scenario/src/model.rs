//! The Model: owner of networks, the identifier registry and scenarios

use crate::config::EvidenceConfig;
use crate::error::{ModelError, Result};
use crate::registry::{EntityKey, IdentifierRegistry, RegistryError};
use crate::scenario::Scenario;
use casebook_domain::{ModelId, NetworkDefinition, NodeDefinition, NodeKind, NodeRef, StateCatalog};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

struct ModelInner {
    id: ModelId,
    config: EvidenceConfig,
    registry: IdentifierRegistry,
    networks: RwLock<Vec<Arc<NetworkDefinition>>>,
}

/// Container of networks and scenarios
///
/// `Model` is a handle: clones share the same networks and registry, which
/// is how every scenario stays bound to the model that created it.
///
/// # Examples
///
/// ```
/// use casebook_domain::{NetworkDefinition, NodeDefinition};
/// use casebook_scenario::Model;
///
/// let model = Model::new();
/// let network = NetworkDefinition::new("net").unwrap()
///     .with_node(NodeDefinition::boolean("alarm").unwrap()).unwrap();
/// model.add_network(network).unwrap();
///
/// let mut scenario = model.create_scenario("burglary").unwrap();
/// let alarm = model.node("net", "alarm").unwrap();
/// scenario.set_observation_hard(&alarm, true).unwrap();
/// assert!(scenario.has_observation(&alarm).unwrap());
/// ```
#[derive(Clone)]
pub struct Model {
    inner: Arc<ModelInner>,
}

impl Model {
    /// Create an empty model with default configuration
    pub fn new() -> Self {
        Self::with_config(EvidenceConfig::default())
    }

    /// Create an empty model with the given configuration
    pub fn with_config(config: EvidenceConfig) -> Self {
        let id = ModelId::new();
        info!("Created model {}", id);
        Self {
            inner: Arc::new(ModelInner {
                id,
                config,
                registry: IdentifierRegistry::new(),
                networks: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Identity of this model
    pub fn id(&self) -> ModelId {
        self.inner.id
    }

    /// Evidence configuration
    pub fn config(&self) -> &EvidenceConfig {
        &self.inner.config
    }

    /// The identifier registry shared by this model's entities
    pub fn registry(&self) -> &IdentifierRegistry {
        &self.inner.registry
    }

    /// Add a network, registering its id
    ///
    /// # Errors
    /// `IdentifierConflict` if the id is taken by any entity of this model
    pub fn add_network(&self, network: NetworkDefinition) -> std::result::Result<(), ModelError> {
        self.inner.registry.register(network.id(), EntityKey::Network)?;
        info!("Added network `{}` with {} nodes", network.id(), network.nodes().count());

        self.inner
            .networks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(network));
        Ok(())
    }

    /// Look up a network by id
    pub fn network(&self, id: &str) -> Option<Arc<NetworkDefinition>> {
        self.inner
            .networks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|n| n.id() == id)
            .cloned()
    }

    /// All networks, in the order they were added
    pub fn networks(&self) -> Vec<Arc<NetworkDefinition>> {
        self.inner
            .networks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Ids of all networks, in the order they were added
    pub fn network_ids(&self) -> Vec<String> {
        self.networks().iter().map(|n| n.id().to_string()).collect()
    }

    /// Handle to a node of this model
    ///
    /// # Errors
    /// `UnknownNetwork` or `UnknownNode` if nothing matches
    pub fn node(&self, network: &str, node: &str) -> std::result::Result<Node, ModelError> {
        let net = self
            .network(network)
            .ok_or_else(|| ModelError::UnknownNetwork(network.to_string()))?;
        let definition = net
            .node(node)
            .cloned()
            .ok_or_else(|| ModelError::UnknownNode(NodeRef::new(network, node)))?;

        Ok(Node {
            model: self.inner.id,
            network: net,
            definition,
        })
    }

    /// Handle to a node by reference
    pub fn node_by_ref(&self, node: &NodeRef) -> std::result::Result<Node, ModelError> {
        self.node(&node.network, &node.node)
    }

    /// Create a scenario bound to this model
    ///
    /// # Errors
    /// `IdentifierConflict` if `id` is already taken
    pub fn create_scenario(&self, id: impl Into<String>) -> Result<Scenario> {
        Scenario::create(self.clone(), id.into())
    }

    /// Ids of every live scenario, sorted
    pub fn scenario_ids(&self) -> Vec<String> {
        self.inner.registry.scenario_ids()
    }

    /// Check if a scenario id is registered
    pub fn has_scenario(&self, id: &str) -> bool {
        matches!(self.inner.registry.lookup(id), Some(EntityKey::Scenario(_)))
    }

    /// Remove a scenario from this model, releasing its id
    ///
    /// Hands the scenario back untouched if it belongs to another model.
    pub fn remove_scenario(&self, scenario: Scenario) -> std::result::Result<(), Scenario> {
        if scenario.model().id() != self.id() {
            return Err(scenario);
        }
        scenario.remove();
        Ok(())
    }

    /// Registry-guarded rename of a contained entity
    pub(crate) fn rename_entity(
        &self,
        old: &str,
        new: &str,
        key: EntityKey,
    ) -> std::result::Result<(), RegistryError> {
        self.inner.registry.rename(old, new, key)
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("id", &self.inner.id)
            .field("networks", &self.network_ids())
            .field("scenarios", &self.scenario_ids())
            .finish()
    }
}

/// Handle to a node of a specific model
///
/// Carries the owning model's id so scenarios can reject nodes from other
/// models.
#[derive(Debug, Clone)]
pub struct Node {
    model: ModelId,
    network: Arc<NetworkDefinition>,
    definition: Arc<NodeDefinition>,
}

impl Node {
    /// Model this node belongs to
    pub fn model_id(&self) -> ModelId {
        self.model
    }

    /// Network id
    pub fn network_id(&self) -> &str {
        self.network.id()
    }

    /// Node id
    pub fn id(&self) -> &str {
        self.definition.id()
    }

    /// Node kind
    pub fn kind(&self) -> NodeKind {
        self.definition.kind()
    }

    /// Declared states
    pub fn states(&self) -> &StateCatalog {
        self.definition.states()
    }

    /// Full node definition
    pub fn definition(&self) -> &NodeDefinition {
        &self.definition
    }

    /// `(network id, node id)` reference
    pub fn node_ref(&self) -> NodeRef {
        NodeRef::new(self.network.id(), self.definition.id())
    }
}
