//! Opaque keys for models and scenarios

use std::fmt;

macro_rules! uuid_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u128);

        impl $name {
            /// Generate a new UUIDv7-based key
            pub fn new() -> Self {
                Self(uuid::Uuid::now_v7().as_u128())
            }

            /// Create a key from a raw u128 value
            pub fn from_value(value: u128) -> Self {
                Self(value)
            }

            /// Parse a key from its UUID string form
            pub fn from_string(s: &str) -> Result<Self, String> {
                uuid::Uuid::parse_str(s)
                    .map(|u| Self(u.as_u128()))
                    .map_err(|e| format!("Invalid {} string: {}", stringify!($name), e))
            }

            /// Get the raw u128 value
            pub fn value(&self) -> u128 {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", uuid::Uuid::from_u128(self.0))
            }
        }
    };
}

uuid_key!(
    /// Identity of a Model, compared when checking that a node and a
    /// scenario belong to the same model
    ///
    /// # Examples
    ///
    /// ```
    /// use casebook_domain::ModelId;
    ///
    /// let a = ModelId::new();
    /// let b = ModelId::new();
    /// assert_ne!(a, b);
    /// ```
    ModelId
);

uuid_key!(
    /// Stable identity of a scenario
    ///
    /// Unlike the human-readable scenario id, the key never changes on
    /// rename, so cached data sets stay tagged with the right scenario.
    ScenarioKey
);
