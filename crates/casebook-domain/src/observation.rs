//! Observation model - hard and soft evidence on a single node
//!
//! Observations are built only through the resolving constructors below, so
//! a stored observation always refers to declared states and a soft
//! observation is always normalized over the node's full catalog.

use crate::error::ObservationError;
use crate::node::{NodeDefinition, NodeKind};
use std::collections::HashMap;

/// Caller-supplied value for a hard observation, before resolution
#[derive(Debug, Clone, PartialEq)]
pub enum HardValue {
    /// A state id
    State(String),

    /// A numeric value (continuous and discrete real nodes)
    Number(f64),

    /// A boolean value (boolean nodes)
    Bool(bool),
}

impl From<&str> for HardValue {
    fn from(value: &str) -> Self {
        HardValue::State(value.to_string())
    }
}

impl From<String> for HardValue {
    fn from(value: String) -> Self {
        HardValue::State(value)
    }
}

impl From<f64> for HardValue {
    fn from(value: f64) -> Self {
        HardValue::Number(value)
    }
}

impl From<bool> for HardValue {
    fn from(value: bool) -> Self {
        HardValue::Bool(value)
    }
}

/// Certainty that a node is in one state
#[derive(Debug, Clone, PartialEq)]
pub struct HardObservation {
    state: String,
    value: Option<f64>,
}

impl HardObservation {
    /// Resolve a value against a node's state catalog
    ///
    /// `point_tolerance` is used to match numbers against discrete real states.
    ///
    /// # Errors
    /// - `UnknownState` if no declared state matches
    /// - `UnsupportedType` if the value cannot apply to this kind of node
    pub fn resolve(
        node: &NodeDefinition,
        value: &HardValue,
        point_tolerance: f64,
    ) -> Result<Self, ObservationError> {
        let unknown = |state: String| ObservationError::UnknownState {
            state,
            node: node.id().to_string(),
        };
        let unsupported = |reason: String| ObservationError::UnsupportedType {
            node: node.id().to_string(),
            reason,
        };

        if let HardValue::Number(number) = value {
            if !number.is_finite() {
                return Err(unsupported(format!("{} is not a finite number", number)));
            }
        }

        let states = node.states();

        match (node.kind(), value) {
            (kind, HardValue::State(id)) => match states.get(id) {
                Some(state) => Ok(Self::state(state.id())),
                // Numeric nodes also take the value as text
                None => match id.trim().parse::<f64>() {
                    Ok(number)
                        if number.is_finite()
                            && matches!(kind, NodeKind::DiscreteReal | NodeKind::ContinuousInterval) =>
                    {
                        Self::resolve(node, &HardValue::Number(number), point_tolerance)
                    }
                    _ => Err(unknown(id.clone())),
                },
            },

            (NodeKind::Boolean, HardValue::Bool(flag)) => {
                let state = states
                    .state_at(usize::from(*flag))
                    .ok_or_else(|| unknown(flag.to_string()))?;
                Ok(Self::state(state.id()))
            }
            (_, HardValue::Bool(_)) => Err(unsupported(format!(
                "boolean value given for a {} node",
                node.kind().as_str()
            ))),

            (NodeKind::Boolean, HardValue::Number(number)) => Err(unsupported(format!(
                "numeric value {} given for a boolean node",
                number
            ))),
            (NodeKind::Labelled | NodeKind::Ranked, HardValue::Number(number)) => {
                // A numeric value is only accepted when a label spells it exactly
                let text = number.to_string();
                let state = states.get(&text).ok_or_else(|| {
                    unsupported(format!("numeric value {} matches no state label", number))
                })?;
                Ok(Self::state(state.id()))
            }
            (NodeKind::DiscreteReal, HardValue::Number(number)) => {
                let state = states
                    .locate_point(*number, point_tolerance)
                    .ok_or_else(|| unknown(number.to_string()))?;
                Ok(Self {
                    state: state.id().to_string(),
                    value: Some(*number),
                })
            }
            (NodeKind::ContinuousInterval, HardValue::Number(number)) => {
                let state = states.locate(*number).ok_or_else(|| unknown(number.to_string()))?;
                Ok(Self {
                    state: state.id().to_string(),
                    value: Some(*number),
                })
            }
        }
    }

    fn state(id: &str) -> Self {
        Self {
            state: id.to_string(),
            value: None,
        }
    }

    /// Selected state id
    pub fn state_id(&self) -> &str {
        &self.state
    }

    /// Numeric value, when the observation was given as a number
    pub fn value(&self) -> Option<f64> {
        self.value
    }
}

/// Partial belief expressed as normalized weights over a node's states
#[derive(Debug, Clone, PartialEq)]
pub struct SoftObservation {
    /// Every declared state in catalog order; sums to 1.0
    weights: Vec<(String, f64)>,
}

impl SoftObservation {
    /// Build from parallel arrays of states and weights
    ///
    /// # Errors
    /// `ArityMismatch` if the arrays differ in length, otherwise as
    /// [`normalize`](Self::normalize).
    pub fn from_parallel<S: AsRef<str>>(
        node: &NodeDefinition,
        states: &[S],
        weights: &[f64],
    ) -> Result<Self, ObservationError> {
        if states.len() != weights.len() {
            return Err(ObservationError::ArityMismatch {
                states: states.len(),
                weights: weights.len(),
            });
        }

        Self::normalize(node, states.iter().zip(weights.iter().copied()))
    }

    /// Build from `(state, weight)` pairs, dividing each weight by the total
    ///
    /// States not mentioned get weight 0.
    ///
    /// # Errors
    /// - `UnknownState` if a state is not declared on the node
    /// - `InvalidWeight` if a weight is negative or not finite, a state is
    ///   weighted twice, or every weight is zero
    ///
    /// # Examples
    ///
    /// ```
    /// use casebook_domain::{NodeDefinition, SoftObservation};
    ///
    /// let node = NodeDefinition::labelled("weather", ["sun", "rain", "snow"]).unwrap();
    /// let soft = SoftObservation::normalize(&node, [("sun", 3.0), ("rain", 1.0)]).unwrap();
    ///
    /// assert_eq!(soft.weight("sun"), 0.75);
    /// assert_eq!(soft.weight("snow"), 0.0);
    /// ```
    pub fn normalize<I, K>(node: &NodeDefinition, weights: I) -> Result<Self, ObservationError>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let catalog = node.states();
        let mut supplied: HashMap<usize, f64> = HashMap::new();

        for (state, weight) in weights {
            let state = state.as_ref();
            let position = catalog
                .position(state)
                .ok_or_else(|| ObservationError::UnknownState {
                    state: state.to_string(),
                    node: node.id().to_string(),
                })?;

            if !weight.is_finite() || weight < 0.0 {
                return Err(ObservationError::InvalidWeight(format!(
                    "weight {} for state `{}` must be a non-negative number",
                    weight, state
                )));
            }

            if supplied.insert(position, weight).is_some() {
                return Err(ObservationError::InvalidWeight(format!(
                    "state `{}` is weighted more than once",
                    state
                )));
            }
        }

        let largest = supplied.values().copied().fold(0.0, f64::max);
        if largest <= 0.0 {
            return Err(ObservationError::InvalidWeight(
                "at least one weight must be greater than zero".to_string(),
            ));
        }

        // A sum of finite weights can still overflow; rescale by the largest then
        let mut scale = 1.0;
        let mut total: f64 = supplied.values().sum();
        if !total.is_finite() {
            scale = largest;
            total = supplied.values().map(|w| w / scale).sum();
        }
        let weights = catalog
            .iter()
            .enumerate()
            .map(|(idx, state)| {
                let weight = supplied.get(&idx).copied().unwrap_or(0.0);
                (state.id().to_string(), weight / scale / total)
            })
            .collect();

        Ok(Self { weights })
    }

    /// Normalized weight of every declared state, in catalog order
    pub fn weights(&self) -> &[(String, f64)] {
        &self.weights
    }

    /// Normalized weight of one state (0 for states that are not declared)
    pub fn weight(&self, state: &str) -> f64 {
        self.weights
            .iter()
            .find(|(id, _)| id == state)
            .map(|(_, w)| *w)
            .unwrap_or(0.0)
    }

}

/// Evidence asserted on a single node
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// Exact state
    Hard(HardObservation),

    /// Weighted distribution over states
    Soft(SoftObservation),
}

impl Observation {
    /// Wire name of the observation kind
    pub fn kind_str(&self) -> &'static str {
        match self {
            Observation::Hard(_) => "hard",
            Observation::Soft(_) => "soft",
        }
    }

    /// Hard view, if this is a hard observation
    pub fn as_hard(&self) -> Option<&HardObservation> {
        match self {
            Observation::Hard(hard) => Some(hard),
            Observation::Soft(_) => None,
        }
    }

    /// Soft view, if this is a soft observation
    pub fn as_soft(&self) -> Option<&SoftObservation> {
        match self {
            Observation::Hard(_) => None,
            Observation::Soft(soft) => Some(soft),
        }
    }

    /// Weight this observation puts on a state
    ///
    /// Hard observations put all weight on the selected state.
    pub fn weight_of(&self, state: &str) -> f64 {
        match self {
            Observation::Hard(hard) => {
                if hard.state == state {
                    1.0
                } else {
                    0.0
                }
            }
            Observation::Soft(soft) => soft.weight(state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-9;

    fn weather() -> NodeDefinition {
        NodeDefinition::labelled("weather", ["sun", "rain", "snow"]).unwrap()
    }

    fn temperature() -> NodeDefinition {
        NodeDefinition::continuous("temp", [("cold", -50.0, 10.0), ("mild", 10.0, 25.0), ("hot", 25.0, 60.0)])
            .unwrap()
    }

    #[test]
    fn test_hard_by_state_id() {
        let hard = HardObservation::resolve(&weather(), &"rain".into(), TOL).unwrap();
        assert_eq!(hard.state_id(), "rain");
        assert_eq!(hard.value(), None);
    }

    #[test]
    fn test_hard_unknown_state() {
        let result = HardObservation::resolve(&weather(), &"fog".into(), TOL);
        assert!(matches!(result, Err(ObservationError::UnknownState { .. })));
    }

    #[test]
    fn test_hard_number_on_labelled_node() {
        let result = HardObservation::resolve(&weather(), &2.5.into(), TOL);
        assert!(matches!(result, Err(ObservationError::UnsupportedType { .. })));

        let scores = NodeDefinition::ranked("score", ["1", "2", "3"]).unwrap();
        let hard = HardObservation::resolve(&scores, &2.0.into(), TOL).unwrap();
        assert_eq!(hard.state_id(), "2");
    }

    #[test]
    fn test_hard_boolean() {
        let alarm = NodeDefinition::boolean("alarm").unwrap();
        let yes = HardObservation::resolve(&alarm, &true.into(), TOL).unwrap();
        let no = HardObservation::resolve(&alarm, &false.into(), TOL).unwrap();
        let by_id = HardObservation::resolve(&alarm, &"True".into(), TOL).unwrap();

        assert_eq!(yes.state_id(), "True");
        assert_eq!(no.state_id(), "False");
        assert_eq!(by_id, yes);

        let numeric = HardObservation::resolve(&alarm, &1.0.into(), TOL);
        assert!(matches!(numeric, Err(ObservationError::UnsupportedType { .. })));
    }

    #[test]
    fn test_hard_bool_on_labelled_node() {
        let result = HardObservation::resolve(&weather(), &true.into(), TOL);
        assert!(matches!(result, Err(ObservationError::UnsupportedType { .. })));
    }

    #[test]
    fn test_hard_continuous_value() {
        let hard = HardObservation::resolve(&temperature(), &10.0.into(), TOL).unwrap();
        assert_eq!(hard.state_id(), "mild");
        assert_eq!(hard.value(), Some(10.0));

        let out_of_range = HardObservation::resolve(&temperature(), &100.0.into(), TOL);
        assert!(matches!(out_of_range, Err(ObservationError::UnknownState { .. })));

        let nan = HardObservation::resolve(&temperature(), &f64::NAN.into(), TOL);
        assert!(matches!(nan, Err(ObservationError::UnsupportedType { .. })));
    }

    #[test]
    fn test_hard_discrete_real_value() {
        let dice = NodeDefinition::discrete_real("dice", [("one", 1.0), ("two", 2.0)]).unwrap();
        let hard = HardObservation::resolve(&dice, &2.0.into(), TOL).unwrap();
        assert_eq!(hard.state_id(), "two");

        let miss = HardObservation::resolve(&dice, &1.5.into(), TOL);
        assert!(matches!(miss, Err(ObservationError::UnknownState { .. })));
    }

    #[test]
    fn test_soft_normalizes_and_fills_missing_states() {
        let soft = SoftObservation::from_parallel(&weather(), &["sun", "rain"], &[2.0, 6.0]).unwrap();
        assert_eq!(
            soft.weights(),
            &[
                ("sun".to_string(), 0.25),
                ("rain".to_string(), 0.75),
                ("snow".to_string(), 0.0),
            ]
        );
    }

    #[test]
    fn test_soft_arity_mismatch() {
        let result = SoftObservation::from_parallel(&weather(), &["sun", "rain"], &[1.0]);
        assert_eq!(result, Err(ObservationError::ArityMismatch { states: 2, weights: 1 }));
    }

    #[test]
    fn test_soft_invalid_weights() {
        let negative = SoftObservation::normalize(&weather(), [("sun", -1.0), ("rain", 2.0)]);
        assert!(matches!(negative, Err(ObservationError::InvalidWeight(_))));

        let zeros = SoftObservation::normalize(&weather(), [("sun", 0.0), ("rain", 0.0)]);
        assert!(matches!(zeros, Err(ObservationError::InvalidWeight(_))));

        let empty = SoftObservation::normalize(&weather(), Vec::<(&str, f64)>::new());
        assert!(matches!(empty, Err(ObservationError::InvalidWeight(_))));

        let repeated = SoftObservation::normalize(&weather(), [("sun", 1.0), ("sun", 1.0)]);
        assert!(matches!(repeated, Err(ObservationError::InvalidWeight(_))));

        let infinite = SoftObservation::normalize(&weather(), [("sun", f64::INFINITY)]);
        assert!(matches!(infinite, Err(ObservationError::InvalidWeight(_))));
    }

    #[test]
    fn test_soft_huge_weights_still_normalize() {
        let soft = SoftObservation::from_parallel(&weather(), &["sun", "rain"], &[f64::MAX, f64::MAX]).unwrap();
        assert_eq!(soft.weight("sun"), 0.5);
        assert_eq!(soft.weight("rain"), 0.5);
        assert_eq!(soft.weight("snow"), 0.0);

        let lopsided = SoftObservation::normalize(&weather(), [("sun", f64::MAX), ("snow", f64::MAX / 4.0)]).unwrap();
        let total: f64 = lopsided.weights().iter().map(|(_, w)| w).sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert_eq!(lopsided.weight("snow"), 0.2);
    }

    #[test]
    fn test_hard_numeric_text_on_numeric_nodes() {
        let hard = HardObservation::resolve(&temperature(), &"12.5".into(), TOL).unwrap();
        assert_eq!(hard.state_id(), "mild");
        assert_eq!(hard.value(), Some(12.5));

        let by_id = HardObservation::resolve(&temperature(), &"hot".into(), TOL).unwrap();
        assert_eq!(by_id.value(), None);

        let dice = NodeDefinition::discrete_real("dice", [("one", 1.0), ("two", 2.0)]).unwrap();
        let point = HardObservation::resolve(&dice, &" 2 ".into(), TOL).unwrap();
        assert_eq!(point.state_id(), "two");
        assert_eq!(point.value(), Some(2.0));

        let out_of_range = HardObservation::resolve(&temperature(), &"99".into(), TOL);
        assert!(matches!(out_of_range, Err(ObservationError::UnknownState { .. })));

        // Labelled nodes never parse text
        let labelled = HardObservation::resolve(&weather(), &"1.0".into(), TOL);
        assert!(matches!(labelled, Err(ObservationError::UnknownState { .. })));
    }

    #[test]
    fn test_soft_unknown_state() {
        let result = SoftObservation::normalize(&weather(), [("fog", 1.0)]);
        assert!(matches!(result, Err(ObservationError::UnknownState { .. })));
    }

    #[test]
    fn test_weight_of() {
        let hard = Observation::Hard(HardObservation::resolve(&weather(), &"sun".into(), TOL).unwrap());
        assert_eq!(hard.weight_of("sun"), 1.0);
        assert_eq!(hard.weight_of("rain"), 0.0);
        assert_eq!(hard.kind_str(), "hard");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn node() -> NodeDefinition {
        NodeDefinition::labelled("n", ["s0", "s1", "s2", "s3", "s4", "s5"]).unwrap()
    }

    proptest! {
        /// Property: stored soft weights sum to 1 and cover every declared state
        #[test]
        fn test_soft_weights_sum_to_one(
            raw in proptest::collection::vec(0.0f64..1000.0, 1..=6)
                .prop_filter("needs a positive weight", |w| w.iter().any(|x| *x > 0.0))
        ) {
            let node = node();
            let states: Vec<String> = (0..raw.len()).map(|i| format!("s{}", i)).collect();
            let soft = SoftObservation::from_parallel(&node, &states, &raw).unwrap();

            let total: f64 = soft.weights().iter().map(|(_, w)| w).sum();
            prop_assert!((total - 1.0).abs() < 1e-9, "total was {}", total);
            prop_assert_eq!(soft.weights().len(), 6);

            for i in raw.len()..6 {
                prop_assert_eq!(soft.weight(&format!("s{}", i)), 0.0);
            }
        }

        /// Property: weights near the top of the f64 range still sum to 1
        #[test]
        fn test_soft_huge_weights_sum_to_one(
            raw in proptest::collection::vec(f64::MAX / 8.0..f64::MAX, 2..=6)
        ) {
            let node = node();
            let states: Vec<String> = (0..raw.len()).map(|i| format!("s{}", i)).collect();
            let soft = SoftObservation::from_parallel(&node, &states, &raw).unwrap();

            let total: f64 = soft.weights().iter().map(|(_, w)| w).sum();
            prop_assert!((total - 1.0).abs() < 1e-9, "total was {}", total);
            prop_assert!(soft.weights().iter().all(|(_, w)| w.is_finite()));
        }

        /// Property: scaling all weights leaves the stored distribution unchanged
        #[test]
        fn test_soft_scale_invariant(
            raw in proptest::collection::vec(0.1f64..100.0, 6),
            scale in 0.5f64..50.0,
        ) {
            let node = node();
            let states: Vec<String> = (0..6).map(|i| format!("s{}", i)).collect();
            let scaled: Vec<f64> = raw.iter().map(|w| w * scale).collect();

            let a = SoftObservation::from_parallel(&node, &states, &raw).unwrap();
            let b = SoftObservation::from_parallel(&node, &states, &scaled).unwrap();

            for ((_, wa), (_, wb)) in a.weights().iter().zip(b.weights()) {
                prop_assert!((wa - wb).abs() < 1e-9);
            }
        }
    }
}
