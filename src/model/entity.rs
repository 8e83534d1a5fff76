use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// One record of a resource: field name to JSON value.
///
/// Nested entities (a user's address, its geo coordinates) are plain nested
/// objects, embedded by value.
pub type Entity = Map<String, Value>;

/// Identifier of a persisted entity, as it appears in a URL path segment.
///
/// Fixtures use numeric ids, but a backend may hand out string ids, so both
/// JSON numbers and strings are accepted and normalized to their textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Reads an id out of a JSON value. Empty strings and non-scalar values
    /// are not ids.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(Self(n.to_string())),
            Value::String(s) if !s.is_empty() => Some(Self(s.clone())),
            _ => None,
        }
    }

    /// Reads the `id` field of an entity.
    pub fn of(entity: &Entity) -> Option<Self> {
        entity.get("id").and_then(Self::from_value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The id as JSON, numeric when it parses as an integer.
    pub fn to_value(&self) -> Value {
        match self.0.parse::<u64>() {
            Ok(n) => Value::from(n),
            Err(_) => Value::String(self.0.clone()),
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        EntityId::from_value(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("not an entity id: {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_and_string_ids_normalize() {
        assert_eq!(EntityId::from_value(&json!(49)), Some(EntityId::from(49)));
        assert_eq!(EntityId::from_value(&json!("49")), Some(EntityId::from(49)));
        assert_eq!(EntityId::from_value(&json!("")), None);
        assert_eq!(EntityId::from_value(&json!(null)), None);
    }

    #[test]
    fn test_to_value_prefers_numbers() {
        assert_eq!(EntityId::from(3).to_value(), json!(3));
        assert_eq!(EntityId::from("abc").to_value(), json!("abc"));
    }
}
