//! State catalogs - the ordered set of states a node declares

use crate::error::DefinitionError;
use std::collections::HashSet;

/// What a state stands for
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StateValue {
    /// Plain label (labelled, ranked and boolean nodes)
    Label,

    /// Single numeric value (discrete real nodes)
    Point(f64),

    /// Numeric range (continuous nodes)
    ///
    /// Lower bound is inclusive and upper bound exclusive, except for the
    /// highest interval of a catalog which is closed on both ends.
    Interval {
        /// Lower bound, may be `-inf`
        lower: f64,
        /// Upper bound, may be `+inf`
        upper: f64,
    },
}

/// A single declared state
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    id: String,
    value: StateValue,
}

impl State {
    /// Create a new state
    pub fn new(id: impl Into<String>, value: StateValue) -> Self {
        Self {
            id: id.into(),
            value,
        }
    }

    /// State id (its short description)
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Value the state stands for
    pub fn value(&self) -> StateValue {
        self.value
    }
}

/// Ordered, non-empty set of states with unique ids
///
/// The catalog is authoritative for every validity check made against a node.
#[derive(Debug, Clone, PartialEq)]
pub struct StateCatalog {
    states: Vec<State>,
    /// Index of the interval whose upper bound is inclusive
    closed_upper: Option<usize>,
}

impl StateCatalog {
    /// Build a catalog from arbitrary states
    ///
    /// # Errors
    /// Returns error if the catalog is empty, an id is empty or repeated,
    /// or numeric states are malformed.
    pub fn from_states(states: Vec<State>) -> Result<Self, DefinitionError> {
        if states.is_empty() {
            return Err(DefinitionError::EmptyCatalog);
        }

        let mut seen = HashSet::new();
        for state in &states {
            if state.id.trim().is_empty() {
                return Err(DefinitionError::InvalidId("state id cannot be empty".to_string()));
            }
            if !seen.insert(state.id.as_str()) {
                return Err(DefinitionError::DuplicateState(state.id.clone()));
            }
            match state.value {
                StateValue::Label => {}
                StateValue::Point(value) => {
                    if !value.is_finite() {
                        return Err(DefinitionError::InvalidPoint(state.id.clone()));
                    }
                }
                StateValue::Interval { lower, upper } => {
                    if lower.is_nan() || upper.is_nan() || lower >= upper {
                        return Err(DefinitionError::InvalidInterval {
                            state: state.id.clone(),
                            issue: format!("lower bound {} must be less than upper bound {}", lower, upper),
                        });
                    }
                }
            }
        }

        let closed_upper = Self::check_intervals(&states)?;

        Ok(Self {
            states,
            closed_upper,
        })
    }

    /// The two-state catalog of a boolean node: `False` then `True`
    pub fn boolean() -> Self {
        Self {
            states: vec![
                State::new("False", StateValue::Label),
                State::new("True", StateValue::Label),
            ],
            closed_upper: None,
        }
    }

    /// Catalog of plain labels, in the given order
    pub fn labels<I, S>(labels: I) -> Result<Self, DefinitionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_states(
            labels
                .into_iter()
                .map(|label| State::new(label, StateValue::Label))
                .collect(),
        )
    }

    /// Catalog of numeric point states
    pub fn points<I, S>(points: I) -> Result<Self, DefinitionError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self::from_states(
            points
                .into_iter()
                .map(|(id, value)| State::new(id, StateValue::Point(value)))
                .collect(),
        )
    }

    /// Catalog of numeric intervals
    ///
    /// # Examples
    ///
    /// ```
    /// use casebook_domain::StateCatalog;
    ///
    /// let catalog = StateCatalog::intervals([
    ///     ("low", 0.0, 10.0),
    ///     ("high", 10.0, 20.0),
    /// ]).unwrap();
    ///
    /// assert_eq!(catalog.locate(10.0).unwrap().id(), "high");
    /// assert_eq!(catalog.locate(20.0).unwrap().id(), "high");
    /// assert!(catalog.locate(20.5).is_none());
    /// ```
    pub fn intervals<I, S>(intervals: I) -> Result<Self, DefinitionError>
    where
        I: IntoIterator<Item = (S, f64, f64)>,
        S: Into<String>,
    {
        Self::from_states(
            intervals
                .into_iter()
                .map(|(id, lower, upper)| State::new(id, StateValue::Interval { lower, upper }))
                .collect(),
        )
    }

    /// Reject overlapping intervals and find the one closed at its upper bound
    fn check_intervals(states: &[State]) -> Result<Option<usize>, DefinitionError> {
        let mut intervals: Vec<(usize, f64, f64)> = states
            .iter()
            .enumerate()
            .filter_map(|(idx, state)| match state.value {
                StateValue::Interval { lower, upper } => Some((idx, lower, upper)),
                _ => None,
            })
            .collect();

        if intervals.is_empty() {
            return Ok(None);
        }

        intervals.sort_by(|a, b| a.1.total_cmp(&b.1));

        for pair in intervals.windows(2) {
            let (prev_idx, _, prev_upper) = pair[0];
            let (next_idx, next_lower, _) = pair[1];
            if prev_upper > next_lower {
                return Err(DefinitionError::InvalidInterval {
                    state: states[next_idx].id.clone(),
                    issue: format!("overlaps interval `{}`", states[prev_idx].id),
                });
            }
        }

        Ok(intervals.last().map(|(idx, _, _)| *idx))
    }

    /// Number of states
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Always false for a constructed catalog
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Iterate states in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &State> {
        self.states.iter()
    }

    /// State ids in declaration order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.states.iter().map(|s| s.id.as_str())
    }

    /// Look up a state by id
    pub fn get(&self, id: &str) -> Option<&State> {
        self.states.iter().find(|s| s.id == id)
    }

    /// Position of a state in declaration order
    pub fn position(&self, id: &str) -> Option<usize> {
        self.states.iter().position(|s| s.id == id)
    }

    /// State at a given position
    pub fn state_at(&self, index: usize) -> Option<&State> {
        self.states.get(index)
    }

    /// Find the interval containing `value`
    ///
    /// Intervals are `[lower, upper)` except the highest one, which is
    /// `[lower, upper]`. NaN never matches.
    pub fn locate(&self, value: f64) -> Option<&State> {
        if value.is_nan() {
            return None;
        }

        self.states.iter().enumerate().find_map(|(idx, state)| match state.value {
            StateValue::Interval { lower, upper } => {
                let below_upper = value < upper || (self.closed_upper == Some(idx) && value <= upper);
                (value >= lower && below_upper).then_some(state)
            }
            _ => None,
        })
    }

    /// Find the point state equal to `value` within `tolerance`
    pub fn locate_point(&self, value: f64, tolerance: f64) -> Option<&State> {
        if !value.is_finite() {
            return None;
        }

        self.states.iter().find(|state| match state.value {
            StateValue::Point(point) => (point - value).abs() <= tolerance,
            _ => false,
        })
    }
}
