//! ResourceId value object for remote identifiers.
//!
//! Organizations and integrations are both addressed by opaque ids assigned
//! by the remote service. The only rule enforced locally is that an id is
//! never empty, which is what lets the verifier treat an empty id in state as
//! "not set".

use super::ValidationError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A validated remote identifier.
///
/// ```rust
/// use snyk_acctest::resource::ResourceId;
///
/// let id = ResourceId::new("0b6a4d6f-1b0f-4a1e-9f63-0b0c8e2c6a11").unwrap();
/// assert_eq!(id.as_str(), "0b6a4d6f-1b0f-4a1e-9f63-0b0c8e2c6a11");
/// assert!(ResourceId::new("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(String);

impl ResourceId {
    /// Create a new ResourceId, rejecting the empty string.
    ///
    /// Ids read back from state or from the remote service go through this
    /// constructor, so an empty id never reaches a lookup.
    ///
    /// # Arguments
    ///
    /// * `value` - The id assigned by the remote service
    ///
    /// # Returns
    ///
    /// * `Ok(ResourceId)` - If the value is non-empty
    /// * `Err(ValidationError::EmptyId)` - If the value is empty
    ///
    /// # Examples
    ///
    /// ```rust
    /// use snyk_acctest::resource::{ResourceId, ValidationError};
    ///
    /// fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let id = ResourceId::new("org-123")?;
    ///     assert_eq!(id.to_string(), "org-123");
    ///     assert_eq!(ResourceId::new(""), Err(ValidationError::EmptyId));
    ///     Ok(())
    /// }
    /// ```
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ValidationError::EmptyId);
        }
        Ok(Self(value))
    }

    /// Generate a fresh random id, as the remote service would assign one.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq<str> for ResourceId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ResourceId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Serialize for ResourceId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}

impl TryFrom<String> for ResourceId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ResourceId {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
