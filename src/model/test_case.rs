use super::{Entity, EntityId, ResourceName};
use serde::{Deserialize, Serialize};

/// A parameterized create/update/delete bundle exercised against one resource.
///
/// Loaded once per run from the test-case file and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub resource: ResourceName,

    /// Label used in reports. Defaults to `<resource>#<index>`.
    #[serde(default)]
    pub name: Option<String>,

    /// Entity fields to submit on create. Any `id` here is stripped.
    pub create: Entity,

    /// Full replacement payload. Its `id` names the record to update.
    pub update: Entity,

    /// A fixture id that exists and may be deleted.
    pub id_to_delete: EntityId,

    /// An id guaranteed absent from the backend.
    pub not_existing_id: EntityId,

    /// Existing id used to provoke a duplicate-id create. Defaults to the
    /// resource's first fixture id.
    #[serde(default)]
    pub duplicate_id: Option<EntityId>,
}

impl TestCase {
    /// The id the `update` payload targets.
    pub fn update_id(&self) -> Option<EntityId> {
        EntityId::of(&self.update)
    }

    /// Report label: the explicit `name`, or `<resource>#<index>`.
    pub fn label(&self, index: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("{}#{index}", self.resource))
    }

    /// The `create` payload without an `id`.
    pub fn create_payload(&self) -> Entity {
        let mut payload = self.create.clone();
        payload.remove("id");
        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserializes_camel_case_fields() {
        let case: TestCase = serde_json::from_value(json!({
            "resource": "albums",
            "create": { "id": 7, "userId": 1, "title": "title" },
            "update": { "id": 3, "userId": 1, "title": "updated" },
            "idToDelete": 10,
            "notExistingId": 333
        }))
        .unwrap();

        assert_eq!(case.resource, ResourceName::Albums);
        assert_eq!(case.update_id(), Some(EntityId::from(3)));
        assert_eq!(case.id_to_delete, EntityId::from(10));
        assert_eq!(case.not_existing_id, EntityId::from(333));
        assert!(case.duplicate_id.is_none());
        assert!(!case.create_payload().contains_key("id"));
    }
}
