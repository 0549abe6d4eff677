//! User types

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Unique user identifier (identity provider subject)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Create a new random user ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a user ID from a string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for UserId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Read-only projection of the identity provider's user record.
///
/// Never cached by this subsystem: it is always resolved live from an
/// access token. Provider fields beyond `id` and `email` are kept verbatim
/// in `extra` and flattened back out on serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Provider user ID
    pub id: UserId,
    /// Primary email address
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: String,
    /// Remaining provider fields (role, metadata, timestamps, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AuthUser {
    /// Create a user projection with no extra fields
    pub fn new(id: UserId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            extra: Map::new(),
        }
    }

    /// Look up a provider field that is not modelled explicitly
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }
}

/// Phone-only provider accounts report `"email": null`
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
