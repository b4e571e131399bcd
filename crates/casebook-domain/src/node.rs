//! Node and network definitions
//!
//! This is the read side of the network layer: enough to know which nodes
//! exist, what kind they are, and which states they declare.

use crate::error::DefinitionError;
use crate::state::{StateCatalog, StateValue};
use std::fmt;
use std::sync::Arc;

/// Declared value domain of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Two states, `False` and `True`
    Boolean,

    /// Unordered labels
    Labelled,

    /// Ordered labels
    Ranked,

    /// Discrete states carrying numeric point values
    DiscreteReal,

    /// Numeric intervals
    ContinuousInterval,
}

impl NodeKind {
    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Boolean => "boolean",
            NodeKind::Labelled => "labelled",
            NodeKind::Ranked => "ranked",
            NodeKind::DiscreteReal => "discrete_real",
            NodeKind::ContinuousInterval => "continuous_interval",
        }
    }

    /// Parse a kind from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "boolean" => Some(NodeKind::Boolean),
            "labelled" => Some(NodeKind::Labelled),
            "ranked" => Some(NodeKind::Ranked),
            "discrete_real" => Some(NodeKind::DiscreteReal),
            "continuous_interval" => Some(NodeKind::ContinuousInterval),
            _ => None,
        }
    }

    fn accepts(&self, value: StateValue) -> bool {
        matches!(
            (self, value),
            (NodeKind::Boolean | NodeKind::Labelled | NodeKind::Ranked, StateValue::Label)
                | (NodeKind::DiscreteReal, StateValue::Point(_))
                | (NodeKind::ContinuousInterval, StateValue::Interval { .. })
        )
    }
}

impl std::str::FromStr for NodeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid node kind: {}", s))
    }
}

/// Identity of a node for evidence purposes: (network id, node id)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeRef {
    /// Network id
    pub network: String,
    /// Node id within the network
    pub node: String,
}

impl NodeRef {
    /// Create a new node reference
    pub fn new(network: impl Into<String>, node: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            node: node.into(),
        }
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.node)
    }
}

/// A node: id, kind and state catalog
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDefinition {
    id: String,
    kind: NodeKind,
    states: StateCatalog,
}

impl NodeDefinition {
    /// Create a node, checking that the catalog fits the kind
    ///
    /// # Errors
    /// Returns error if the id is empty, a state does not match the kind,
    /// or a boolean node does not declare exactly two states.
    pub fn new(id: impl Into<String>, kind: NodeKind, states: StateCatalog) -> Result<Self, DefinitionError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DefinitionError::InvalidId("node id cannot be empty".to_string()));
        }

        if let Some(state) = states.iter().find(|s| !kind.accepts(s.value())) {
            return Err(DefinitionError::KindMismatch {
                node: id,
                reason: format!("state `{}` is not valid for a {} node", state.id(), kind.as_str()),
            });
        }

        if kind == NodeKind::Boolean && states.len() != 2 {
            return Err(DefinitionError::KindMismatch {
                node: id,
                reason: "boolean nodes declare exactly two states".to_string(),
            });
        }

        Ok(Self {
            id,
            kind,
            states,
        })
    }

    /// Boolean node with the standard `False`/`True` states
    pub fn boolean(id: impl Into<String>) -> Result<Self, DefinitionError> {
        Self::new(id, NodeKind::Boolean, StateCatalog::boolean())
    }

    /// Labelled node
    pub fn labelled<I, S>(id: impl Into<String>, labels: I) -> Result<Self, DefinitionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(id, NodeKind::Labelled, StateCatalog::labels(labels)?)
    }

    /// Ranked node, states listed from lowest to highest rank
    pub fn ranked<I, S>(id: impl Into<String>, labels: I) -> Result<Self, DefinitionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(id, NodeKind::Ranked, StateCatalog::labels(labels)?)
    }

    /// Discrete real node with numeric point states
    pub fn discrete_real<I, S>(id: impl Into<String>, points: I) -> Result<Self, DefinitionError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self::new(id, NodeKind::DiscreteReal, StateCatalog::points(points)?)
    }

    /// Continuous node discretised into intervals
    pub fn continuous<I, S>(id: impl Into<String>, intervals: I) -> Result<Self, DefinitionError>
    where
        I: IntoIterator<Item = (S, f64, f64)>,
        S: Into<String>,
    {
        Self::new(id, NodeKind::ContinuousInterval, StateCatalog::intervals(intervals)?)
    }

    /// Node id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Node kind
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Declared states
    pub fn states(&self) -> &StateCatalog {
        &self.states
    }
}

/// A network: an id and its nodes
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkDefinition {
    id: String,
    nodes: Vec<Arc<NodeDefinition>>,
}

impl NetworkDefinition {
    /// Create an empty network
    pub fn new(id: impl Into<String>) -> Result<Self, DefinitionError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DefinitionError::InvalidId("network id cannot be empty".to_string()));
        }
        Ok(Self { id, nodes: Vec::new() })
    }

    /// Add a node
    ///
    /// # Errors
    /// Returns error if a node with the same id already exists
    pub fn add_node(&mut self, node: NodeDefinition) -> Result<(), DefinitionError> {
        if self.node(node.id()).is_some() {
            return Err(DefinitionError::DuplicateNode {
                network: self.id.clone(),
                node: node.id().to_string(),
            });
        }
        self.nodes.push(Arc::new(node));
        Ok(())
    }

    /// Builder form of [`add_node`](Self::add_node)
    pub fn with_node(mut self, node: NodeDefinition) -> Result<Self, DefinitionError> {
        self.add_node(node)?;
        Ok(self)
    }

    /// Network id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Look up a node by id
    pub fn node(&self, id: &str) -> Option<&Arc<NodeDefinition>> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Arc<NodeDefinition>> {
        self.nodes.iter()
    }

    /// Reference to one of this network's nodes
    pub fn node_ref(&self, node: &NodeDefinition) -> NodeRef {
        NodeRef::new(self.id.clone(), node.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        for kind in [
            NodeKind::Boolean,
            NodeKind::Labelled,
            NodeKind::Ranked,
            NodeKind::DiscreteReal,
            NodeKind::ContinuousInterval,
        ] {
            assert_eq!(NodeKind::parse(kind.as_str()), Some(kind));
        }
        assert!("nonsense".parse::<NodeKind>().is_err());
    }

    #[test]
    fn test_kind_must_match_states() {
        let catalog = StateCatalog::labels(["a", "b"]).unwrap();
        let result = NodeDefinition::new("n", NodeKind::ContinuousInterval, catalog);
        assert!(matches!(result, Err(DefinitionError::KindMismatch { .. })));
    }

    #[test]
    fn test_boolean_requires_two_states() {
        let catalog = StateCatalog::labels(["yes", "no", "maybe"]).unwrap();
        assert!(NodeDefinition::new("b", NodeKind::Boolean, catalog).is_err());
    }

    #[test]
    fn test_duplicate_node_rejected() {
        let mut network = NetworkDefinition::new("net").unwrap();
        network.add_node(NodeDefinition::boolean("alarm").unwrap()).unwrap();
        let result = network.add_node(NodeDefinition::boolean("alarm").unwrap());
        assert!(matches!(result, Err(DefinitionError::DuplicateNode { .. })));
    }

    #[test]
    fn test_node_ref_display_and_order() {
        let a = NodeRef::new("net", "a");
        let b = NodeRef::new("net", "b");
        assert_eq!(a.to_string(), "net/a");
        assert!(a < b);
    }
}
