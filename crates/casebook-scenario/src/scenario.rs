//! Scenario: one named set of evidence and its cached marginals
//!
//! A scenario is not internally synchronized. Only renames go through the
//! Model's registry lock; callers must serialize writes to one scenario.

use crate::error::{Result, ScenarioError};
use crate::exchange;
use crate::model::{Model, Node};
use crate::registry::EntityKey;
use casebook_domain::{
    DataSet, HardObservation, HardValue, InferenceEngine, InferenceRequest, MarginalEstimate, NodeRef,
    Observation, ScenarioKey, SoftObservation,
};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Named, independent set of observations applied to a Model's networks
///
/// Observations and marginals are keyed by `(network id, node id)`. Every
/// successful observation change bumps the generation and clears all cached
/// marginals, since their dependence on evidence is only known to the
/// inference engine.
#[derive(Debug)]
pub struct Scenario {
    model: Model,
    key: ScenarioKey,
    id: String,
    observations: BTreeMap<NodeRef, Observation>,
    marginals: BTreeMap<NodeRef, DataSet>,
    generation: u64,
}

impl Scenario {
    pub(crate) fn create(model: Model, id: String) -> Result<Self> {
        let key = ScenarioKey::new();
        model.registry().register(&id, EntityKey::Scenario(key))?;
        info!("Created scenario `{}` ({})", id, key);

        Ok(Self {
            model,
            key,
            id,
            observations: BTreeMap::new(),
            marginals: BTreeMap::new(),
            generation: 0,
        })
    }

    /// Current id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Stable key, unaffected by renames
    pub fn key(&self) -> ScenarioKey {
        self.key
    }

    /// Model this scenario belongs to
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Rename the scenario
    ///
    /// The registry swaps the old id for the new one under its lock, so no
    /// observer ever sees both ids or neither.
    ///
    /// # Errors
    /// `IdentifierConflict` if another entity of the Model holds `new_id`;
    /// the current id is kept.
    pub fn set_id(&mut self, new_id: impl Into<String>) -> Result<()> {
        let new_id = new_id.into();
        self.model
            .rename_entity(&self.id, &new_id, EntityKey::Scenario(self.key))?;

        info!("Renamed scenario `{}` to `{}`", self.id, new_id);
        self.id = new_id;
        Ok(())
    }

    /// Remove the scenario from its Model, releasing its id
    pub fn remove(self) {
        if self.model.registry().unregister(&self.id, EntityKey::Scenario(self.key)) {
            info!("Removed scenario `{}`", self.id);
        }
    }

    /// Observation generation; increases on every observation change
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn check_node(&self, node: &Node) -> Result<NodeRef> {
        if node.model_id() != self.model.id() {
            return Err(ScenarioError::CrossModelReference(node.node_ref()));
        }
        Ok(node.node_ref())
    }

    fn invalidate(&mut self) {
        self.generation += 1;
        if !self.marginals.is_empty() {
            debug!(
                "Scenario `{}`: cleared {} cached marginals",
                self.id,
                self.marginals.len()
            );
            self.marginals.clear();
        }
    }

    fn store_observation(&mut self, node: NodeRef, observation: Observation) {
        debug!("Scenario `{}`: {} evidence on {}", self.id, observation.kind_str(), node);
        self.observations.insert(node, observation);
        self.invalidate();
    }

    /// Set hard evidence on a node
    ///
    /// The value may be a state id, a number (resolved against numeric
    /// states) or a boolean (boolean nodes only).
    ///
    /// # Errors
    /// - `CrossModelReference` if the node belongs to another Model
    /// - `UnknownState` if no declared state matches
    /// - `UnsupportedObservationType` if the value cannot apply to the node's kind
    pub fn set_observation_hard(&mut self, node: &Node, value: impl Into<HardValue>) -> Result<()> {
        let node_ref = self.check_node(node)?;
        let hard = HardObservation::resolve(
            node.definition(),
            &value.into(),
            self.model.config().point_tolerance,
        )?;

        self.store_observation(node_ref, Observation::Hard(hard));
        Ok(())
    }

    /// Set soft evidence from parallel slices of states and weights
    ///
    /// Weights are normalized to sum to 1; unlisted states get weight 0.
    ///
    /// # Errors
    /// `CrossModelReference`, `ArityMismatch`, `UnknownState` or `InvalidWeight`
    pub fn set_observation_soft<S: AsRef<str>>(
        &mut self,
        node: &Node,
        states: &[S],
        weights: &[f64],
    ) -> Result<()> {
        let node_ref = self.check_node(node)?;
        let soft = SoftObservation::from_parallel(node.definition(), states, weights)?;

        self.store_observation(node_ref, Observation::Soft(soft));
        Ok(())
    }

    /// Set soft evidence from `(state, weight)` pairs
    ///
    /// # Errors
    /// `CrossModelReference`, `UnknownState` or `InvalidWeight`
    pub fn set_observation_soft_weights<I, K>(&mut self, node: &Node, weights: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let node_ref = self.check_node(node)?;
        let soft = SoftObservation::normalize(node.definition(), weights)?;

        self.store_observation(node_ref, Observation::Soft(soft));
        Ok(())
    }

    /// Remove the observation on a node, if any
    ///
    /// Cached marginals are cleared even when there was nothing to remove.
    pub fn clear_observation(&mut self, node: &Node) -> Result<()> {
        let node_ref = self.check_node(node)?;
        if self.observations.remove(&node_ref).is_some() {
            debug!("Scenario `{}`: cleared evidence on {}", self.id, node_ref);
        }
        self.invalidate();
        Ok(())
    }

    /// Remove every observation
    pub fn clear_observations(&mut self) {
        debug!(
            "Scenario `{}`: cleared all {} observations",
            self.id,
            self.observations.len()
        );
        self.observations.clear();
        self.invalidate();
    }

    /// Check if a node has evidence
    pub fn has_observation(&self, node: &Node) -> Result<bool> {
        let node_ref = self.check_node(node)?;
        Ok(self.observations.contains_key(&node_ref))
    }

    /// Detached copy of a node's observation
    pub fn get_observation(&self, node: &Node) -> Result<Option<Observation>> {
        let node_ref = self.check_node(node)?;
        Ok(self.observations.get(&node_ref).cloned())
    }

    /// Detached copy of every observation, ordered by node
    pub fn observations(&self) -> Vec<(NodeRef, Observation)> {
        self.observations
            .iter()
            .map(|(node, obs)| (node.clone(), obs.clone()))
            .collect()
    }

    /// Number of nodes with evidence
    pub fn observation_count(&self) -> usize {
        self.observations.len()
    }

    /// Replace all observations with a JSON evidence array
    ///
    /// The whole batch is resolved before anything changes. On any error
    /// the scenario is left exactly as it was.
    ///
    /// # Errors
    /// `MalformedEvidence` for shape problems or repeated nodes,
    /// `UnknownNode` for nodes outside the Model, otherwise the same
    /// errors as the single-node setters.
    pub fn set_observations(&mut self, json: &Value) -> Result<()> {
        let batch = match exchange::parse_evidence(&self.model, json) {
            Ok(batch) => batch,
            Err(e) => {
                warn!("Scenario `{}`: rejected evidence batch: {}", self.id, e);
                return Err(e);
            }
        };

        self.observations = batch.into_iter().collect();
        self.invalidate();
        info!(
            "Scenario `{}`: loaded {} observations",
            self.id,
            self.observations.len()
        );
        Ok(())
    }

    /// Parse a JSON string and apply it with [`set_observations`](Self::set_observations)
    pub fn set_observations_str(&mut self, json: &str) -> Result<()> {
        let value: Value = serde_json::from_str(json).map_err(|e| {
            warn!("Scenario `{}`: evidence is not valid JSON: {}", self.id, e);
            ScenarioError::MalformedEvidence(format!("JSON parse error: {}", e))
        })?;
        self.set_observations(&value)
    }

    /// Export observations in the evidence format accepted by
    /// [`set_observations`](Self::set_observations)
    pub fn observations_to_json(&self) -> Value {
        exchange::evidence_to_json(&self.observations)
    }

    /// Cached marginals for a node
    ///
    /// # Errors
    /// `CrossModelReference` if the node belongs to another Model,
    /// `NoMarginals` if nothing is cached since the last observation change
    pub fn marginals(&self, node: &Node) -> Result<DataSet> {
        let node_ref = self.check_node(node)?;
        self.marginals
            .get(&node_ref)
            .cloned()
            .ok_or(ScenarioError::NoMarginals(node_ref))
    }

    /// Every cached data set, ordered by node
    pub fn all_marginals(&self) -> Vec<DataSet> {
        self.marginals.values().cloned().collect()
    }

    /// Replace the marginal cache with an externally computed snapshot
    ///
    /// # Errors
    /// `MalformedMarginals` for shape problems, nodes outside the Model,
    /// unknown or repeated states, and totals outside the configured tolerance
    pub fn load_marginals(&mut self, json: &Value) -> Result<()> {
        let stored = exchange::parse_marginals(json).and_then(|estimates| self.store_marginals(estimates));
        match stored {
            Ok(count) => {
                info!("Scenario `{}`: loaded marginals for {} nodes", self.id, count);
                Ok(())
            }
            Err(e) => {
                warn!("Scenario `{}`: rejected marginals: {}", self.id, e);
                Err(e)
            }
        }
    }

    /// Parse a JSON string and apply it with [`load_marginals`](Self::load_marginals)
    pub fn load_marginals_str(&mut self, json: &str) -> Result<()> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| ScenarioError::MalformedMarginals(format!("JSON parse error: {}", e)))?;
        self.load_marginals(&value)
    }

    /// Export cached marginals in the format accepted by
    /// [`load_marginals`](Self::load_marginals)
    pub fn marginals_to_json(&self) -> Value {
        exchange::marginals_to_json(self.marginals.values())
    }

    /// Validate estimates and atomically replace the marginal cache
    ///
    /// Returns the number of nodes now cached.
    ///
    /// # Errors
    /// `MalformedMarginals` if any estimate is invalid; the cache is unchanged.
    pub fn store_marginals(&mut self, estimates: Vec<MarginalEstimate>) -> Result<usize> {
        let tolerance = self.model.config().marginal_tolerance;
        let mut cache = BTreeMap::new();

        for estimate in estimates {
            let node = self.model.node_by_ref(&estimate.node).map_err(|_| {
                ScenarioError::MalformedMarginals(format!("node {} does not exist", estimate.node))
            })?;
            if cache.contains_key(&estimate.node) {
                return Err(ScenarioError::MalformedMarginals(format!(
                    "node {} appears more than once",
                    estimate.node
                )));
            }

            let dataset = DataSet::new(
                self.key,
                estimate.node.clone(),
                node.definition(),
                self.generation,
                estimate.entries,
                tolerance,
            )
            .map_err(|e| ScenarioError::MalformedMarginals(format!("node {}: {}", estimate.node, e)))?;
            cache.insert(estimate.node, dataset);
        }

        self.marginals = cache;
        Ok(self.marginals.len())
    }

    /// Run an inference engine on the current observations and cache its output
    ///
    /// # Errors
    /// `Inference` if the engine fails, `MalformedMarginals` if its output
    /// does not fit the Model.
    pub fn calculate<E: InferenceEngine>(&mut self, engine: &E) -> Result<usize> {
        let request = InferenceRequest {
            networks: self.model.networks(),
            observations: self.observations(),
        };
        debug!(
            "Scenario `{}`: running inference with {} observations",
            self.id,
            request.observations.len()
        );

        let estimates = engine.infer(&request).map_err(|e| {
            warn!("Scenario `{}`: inference failed: {}", self.id, e);
            ScenarioError::Inference(e.to_string())
        })?;

        let count = self.store_marginals(estimates)?;
        info!("Scenario `{}`: computed marginals for {} nodes", self.id, count);
        Ok(count)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use casebook_domain::{NetworkDefinition, NodeDefinition};
    use proptest::prelude::*;
    use serde_json::json;

    const STATES: [&str; 4] = ["a", "b", "c", "d"];

    fn model() -> Model {
        let mut network = NetworkDefinition::new("net").unwrap();
        for i in 0..4 {
            network
                .add_node(NodeDefinition::labelled(format!("n{}", i), STATES).unwrap())
                .unwrap();
        }
        let model = Model::new();
        model.add_network(network).unwrap();
        model
    }

    proptest! {
        /// Property: a batch with one bad entry leaves the previous observations in place
        #[test]
        fn test_rejected_batch_changes_nothing(
            existing in 0usize..4,
            valid in proptest::collection::btree_set(0usize..4, 0..4),
            bad_position in 0usize..5,
        ) {
            let model = model();
            let node = model.node("net", &format!("n{}", existing)).unwrap();
            let mut scenario = model.create_scenario("s").unwrap();
            scenario.set_observation_hard(&node, "a").unwrap();
            let before = scenario.observations();
            let generation = scenario.generation();

            let mut batch: Vec<Value> = valid
                .iter()
                .map(|i| json!({ "network": "net", "node": format!("n{}", i), "kind": "hard", "value": "b" }))
                .collect();
            let position = bad_position.min(batch.len());
            batch.insert(position, json!({ "network": "net", "node": "n0", "kind": "soft" }));

            prop_assert!(scenario.set_observations(&Value::Array(batch)).is_err());
            prop_assert_eq!(scenario.observations(), before);
            prop_assert_eq!(scenario.generation(), generation);
        }

        /// Property: loaded marginals come back in the order they were given
        #[test]
        fn test_marginals_keep_order(
            order in Just(STATES.to_vec()).prop_shuffle(),
            raw in proptest::collection::vec(0.01f64..1.0, 4),
        ) {
            let model = model();
            let node = model.node("net", "n2").unwrap();
            let mut scenario = model.create_scenario("s").unwrap();

            let total: f64 = raw.iter().sum();
            let pairs: Vec<Value> = order
                .iter()
                .zip(&raw)
                .map(|(state, w)| json!({ "state": state, "probability": w / total }))
                .collect();
            scenario.load_marginals(&json!({ "net": { "n2": pairs } })).unwrap();

            let dataset = scenario.marginals(&node).unwrap();
            let states: Vec<&str> = dataset.entries().iter().map(|(s, _)| s.as_str()).collect();
            prop_assert_eq!(states, order);
        }
    }
}
