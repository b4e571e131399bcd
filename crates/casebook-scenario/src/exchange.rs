//! JSON exchange formats for evidence and marginals
//!
//! Evidence is an array of entries:
//!
//! ```json
//! [
//!   { "network": "net", "node": "weather", "kind": "hard", "value": "rain" },
//!   { "network": "net", "node": "temp", "kind": "hard", "value": 21.5 },
//!   { "network": "net", "node": "alarm", "kind": "soft",
//!     "value": [ { "state": "True", "weight": 3 }, { "state": "False", "weight": 1 } ] }
//! ]
//! ```
//!
//! Marginals are nested by network then node, each holding an ordered list:
//!
//! ```json
//! { "net": { "weather": [ { "state": "sun", "probability": 0.7 },
//!                         { "state": "rain", "probability": 0.3 } ] } }
//! ```
//!
//! Unknown fields are ignored everywhere. Parsing only checks shape and
//! resolves values against the Model; callers apply the result.

use crate::error::{Result, ScenarioError};
use crate::model::Model;
use casebook_domain::{
    DataSet, HardObservation, HardValue, MarginalEstimate, NodeRef, Observation, SoftObservation,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashSet;

/// One `{state, weight}` pair of a soft observation
#[derive(Debug, Deserialize)]
struct WeightEntry {
    state: String,
    weight: f64,
}

/// One `{state, probability}` pair of a marginal distribution
#[derive(Debug, Deserialize)]
struct ProbabilityEntry {
    state: String,
    probability: f64,
}

fn malformed_evidence(idx: usize, reason: impl std::fmt::Display) -> ScenarioError {
    ScenarioError::MalformedEvidence(format!("entry {}: {}", idx, reason))
}

fn required_str<'a>(obj: &'a Map<String, Value>, field: &str) -> std::result::Result<&'a str, String> {
    obj.get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("missing or invalid '{}'", field))
}

/// Parse and resolve a whole evidence batch
///
/// Nothing is applied here; the caller swaps in the result only when every
/// entry resolved.
pub fn parse_evidence(model: &Model, json: &Value) -> Result<Vec<(NodeRef, Observation)>> {
    let entries = json
        .as_array()
        .ok_or_else(|| ScenarioError::MalformedEvidence("expected a JSON array".to_string()))?;

    let mut seen = HashSet::new();
    let mut parsed = Vec::with_capacity(entries.len());

    for (idx, entry) in entries.iter().enumerate() {
        let (node_ref, observation) = parse_evidence_entry(model, idx, entry)?;
        if !seen.insert(node_ref.clone()) {
            return Err(malformed_evidence(idx, format!("node {} appears more than once", node_ref)));
        }
        parsed.push((node_ref, observation));
    }

    Ok(parsed)
}

fn parse_evidence_entry(model: &Model, idx: usize, entry: &Value) -> Result<(NodeRef, Observation)> {
    let obj = entry
        .as_object()
        .ok_or_else(|| malformed_evidence(idx, "not a JSON object"))?;

    let network = required_str(obj, "network").map_err(|e| malformed_evidence(idx, e))?;
    let node = required_str(obj, "node").map_err(|e| malformed_evidence(idx, e))?;
    let kind = required_str(obj, "kind").map_err(|e| malformed_evidence(idx, e))?;
    let value = obj
        .get("value")
        .ok_or_else(|| malformed_evidence(idx, "missing 'value'"))?;

    let node_ref = NodeRef::new(network, node);
    let handle = model
        .node(network, node)
        .map_err(|_| ScenarioError::UnknownNode(node_ref.clone()))?;
    let definition = handle.definition();

    let observation = match kind {
        "hard" => {
            let hard_value = match value {
                Value::String(state) => HardValue::State(state.clone()),
                Value::Bool(flag) => HardValue::Bool(*flag),
                Value::Number(number) => number
                    .as_f64()
                    .map(HardValue::Number)
                    .ok_or_else(|| malformed_evidence(idx, "number out of range"))?,
                _ => {
                    return Err(malformed_evidence(
                        idx,
                        "hard 'value' must be a string, number or boolean",
                    ))
                }
            };
            let hard = HardObservation::resolve(definition, &hard_value, model.config().point_tolerance)?;
            Observation::Hard(hard)
        }
        "soft" => {
            let pairs = value
                .as_array()
                .ok_or_else(|| malformed_evidence(idx, "soft 'value' must be an array"))?;

            let mut weights = Vec::with_capacity(pairs.len());
            for pair in pairs {
                let WeightEntry { state, weight } = WeightEntry::deserialize(pair)
                    .map_err(|e| malformed_evidence(idx, format!("invalid weight entry: {}", e)))?;
                weights.push((state, weight));
            }
            Observation::Soft(SoftObservation::normalize(definition, weights)?)
        }
        other => return Err(malformed_evidence(idx, format!("unknown kind '{}'", other))),
    };

    Ok((node_ref, observation))
}

/// Export observations as an evidence array
///
/// Soft entries list every declared state with its normalized weight. Hard
/// entries carry the numeric value when one was given, otherwise the state id.
pub fn evidence_to_json<'a, I>(observations: I) -> Value
where
    I: IntoIterator<Item = (&'a NodeRef, &'a Observation)>,
{
    let entries = observations
        .into_iter()
        .map(|(node, observation)| {
            let value = match observation {
                Observation::Hard(hard) => match hard.value() {
                    Some(number) => json!(number),
                    None => json!(hard.state_id()),
                },
                Observation::Soft(soft) => Value::Array(
                    soft.weights()
                        .iter()
                        .map(|(state, weight)| json!({ "state": state, "weight": weight }))
                        .collect(),
                ),
            };

            json!({
                "network": node.network,
                "node": node.node,
                "kind": observation.kind_str(),
                "value": value,
            })
        })
        .collect();

    Value::Array(entries)
}

/// Parse a marginals object into per-node estimates
///
/// Only the shape is checked here. States and totals are validated when the
/// estimates are stored.
pub fn parse_marginals(json: &Value) -> Result<Vec<MarginalEstimate>> {
    let networks = json
        .as_object()
        .ok_or_else(|| ScenarioError::MalformedMarginals("expected a JSON object keyed by network".to_string()))?;

    let mut estimates = Vec::new();
    for (network, nodes) in networks {
        let nodes = nodes
            .as_object()
            .ok_or_else(|| ScenarioError::MalformedMarginals(format!("network '{}' must map node ids to lists", network)))?;

        for (node, pairs) in nodes {
            let node_ref = NodeRef::new(network.as_str(), node.as_str());
            let pairs = pairs
                .as_array()
                .ok_or_else(|| ScenarioError::MalformedMarginals(format!("{} must be a list", node_ref)))?;

            let mut entries = Vec::with_capacity(pairs.len());
            for pair in pairs {
                let ProbabilityEntry { state, probability } = ProbabilityEntry::deserialize(pair)
                    .map_err(|e| ScenarioError::MalformedMarginals(format!("{}: invalid probability entry: {}", node_ref, e)))?;
                entries.push((state, probability));
            }

            estimates.push(MarginalEstimate {
                node: node_ref,
                entries,
            });
        }
    }

    Ok(estimates)
}

/// Export data sets as a marginals object
pub fn marginals_to_json<'a, I>(datasets: I) -> Value
where
    I: IntoIterator<Item = &'a DataSet>,
{
    let mut networks = Map::new();
    for dataset in datasets {
        let pairs: Vec<Value> = dataset
            .entries()
            .iter()
            .map(|(state, probability)| json!({ "state": state, "probability": probability }))
            .collect();

        let nodes = networks
            .entry(dataset.node().network.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(nodes) = nodes {
            nodes.insert(dataset.node().node.clone(), Value::Array(pairs));
        }
    }
    Value::Object(networks)
}
