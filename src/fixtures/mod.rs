//! # Fixture Store
//!
//! Loads the baseline dataset and the test-case table once per run and serves
//! read-only lookups for the rest of it.
//!
//! - **Dataset**: a JSON object with one array per resource name, each entry a
//!   fully populated entity including `id`. The same document feeds the
//!   seeding utility.
//! - **Test cases**: a JSON array of mappings tagged with `resource`
//!   (see [`TestCase`]).
//!
//! Both documents are validated against the resource schemas and against each
//! other at load time, so the verifier can rely on, for example, `idToDelete`
//! naming a seeded record and `notExistingId` naming nothing.

pub mod error;

pub use error::*;

use crate::model::{Entity, EntityId, FieldKind, FieldSpec, ResourceName, TestCase};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::{debug, info};

/// Read-only baseline dataset plus parameterized test cases.
#[derive(Debug, Clone)]
pub struct FixtureStore {
    records: BTreeMap<ResourceName, Vec<Entity>>,
    cases: BTreeMap<ResourceName, Vec<TestCase>>,
}

impl FixtureStore {
    /// Reads and validates both documents from disk.
    pub fn load(
        dataset_path: impl AsRef<Path>,
        cases_path: impl AsRef<Path>,
    ) -> Result<Self, FixtureError> {
        let dataset = read(dataset_path.as_ref())?;
        let cases = read(cases_path.as_ref())?;
        Self::from_json(&dataset, &cases)
    }

    /// Parses and validates both documents from strings.
    pub fn from_json(dataset: &str, cases: &str) -> Result<Self, FixtureError> {
        let records = parse_dataset(dataset)?;
        let cases: Vec<TestCase> =
            serde_json::from_str(cases).map_err(|source| FixtureError::Parse {
                what: "test cases",
                source,
            })?;

        let mut grouped: BTreeMap<ResourceName, Vec<TestCase>> = BTreeMap::new();
        for case in cases {
            grouped.entry(case.resource).or_default().push(case);
        }

        let store = Self {
            records,
            cases: grouped,
        };
        store.validate()?;

        info!(
            records = store.records.values().map(Vec::len).sum::<usize>(),
            cases = store.cases.values().map(Vec::len).sum::<usize>(),
            "Fixtures loaded"
        );
        Ok(store)
    }

    /// Resources in the order the suite visits them.
    pub fn resources(&self) -> impl Iterator<Item = ResourceName> + '_ {
        ResourceName::ALL
            .into_iter()
            .filter(|resource| self.records.contains_key(resource))
    }

    /// The canonical "known good" read target of a resource.
    ///
    /// Always `Some` for the six resources once the store has loaded.
    pub fn first_of(&self, resource: ResourceName) -> Option<&Entity> {
        self.records(resource).first()
    }

    pub fn records(&self, resource: ResourceName) -> &[Entity] {
        self.records.get(&resource).map_or(&[], Vec::as_slice)
    }

    pub fn find(&self, resource: ResourceName, id: &EntityId) -> Option<&Entity> {
        self.records(resource)
            .iter()
            .find(|record| EntityId::of(record).as_ref() == Some(id))
    }

    pub fn contains(&self, resource: ResourceName, id: &EntityId) -> bool {
        self.find(resource, id).is_some()
    }

    pub fn test_cases_for(&self, resource: ResourceName) -> &[TestCase] {
        self.cases.get(&resource).map_or(&[], Vec::as_slice)
    }

    /// The whole dataset in its on-disk shape, for seeding.
    pub fn dataset(&self) -> &BTreeMap<ResourceName, Vec<Entity>> {
        &self.records
    }

    fn validate(&self) -> Result<(), FixtureError> {
        for resource in ResourceName::ALL {
            let spec = resource.spec();
            let records = self.records(resource);
            if records.is_empty() {
                return Err(FixtureError::Empty(resource));
            }

            let mut seen = HashSet::new();
            for (index, record) in records.iter().enumerate() {
                check_shape(spec.fields, record, "").map_err(|field| FixtureError::Shape {
                    resource,
                    context: format!("fixture #{index}"),
                    field,
                })?;
                let id = EntityId::of(record).ok_or_else(|| FixtureError::Shape {
                    resource,
                    context: format!("fixture #{index}"),
                    field: "id".to_string(),
                })?;
                if !seen.insert(id.clone()) {
                    return Err(FixtureError::DuplicateId(resource, id));
                }
            }

            self.validate_cases(resource)?;
        }

        for resource in self.cases.keys() {
            debug!(%resource, cases = self.test_cases_for(*resource).len(), "Validated test cases");
        }
        Ok(())
    }

    fn validate_cases(&self, resource: ResourceName) -> Result<(), FixtureError> {
        let spec = resource.spec();
        let first_id = self.first_of(resource).and_then(EntityId::of);
        let mut deleted = HashSet::new();

        for (index, case) in self.test_cases_for(resource).iter().enumerate() {
            let label = case.label(index);
            let invalid = |reason: String| FixtureError::InvalidCase {
                resource,
                case: label.clone(),
                reason,
            };

            let payload_fields: Vec<FieldSpec> = spec.payload_fields().copied().collect();
            check_shape(&payload_fields, &case.create, "").map_err(|field| {
                FixtureError::Shape {
                    resource,
                    context: format!("{label} create payload"),
                    field,
                }
            })?;
            check_shape(spec.fields, &case.update, "").map_err(|field| FixtureError::Shape {
                resource,
                context: format!("{label} update payload"),
                field,
            })?;

            let update_id = case
                .update_id()
                .ok_or_else(|| invalid("update payload has no id".to_string()))?;
            if !self.contains(resource, &update_id) {
                return Err(invalid(format!("update id {update_id} is not a fixture")));
            }
            if !self.contains(resource, &case.id_to_delete) {
                return Err(invalid(format!(
                    "idToDelete {} is not a fixture",
                    case.id_to_delete
                )));
            }
            if self.contains(resource, &case.not_existing_id) {
                return Err(invalid(format!(
                    "notExistingId {} exists in the fixtures",
                    case.not_existing_id
                )));
            }
            if first_id.as_ref() == Some(&case.id_to_delete) {
                return Err(invalid(
                    "idToDelete must not be the first fixture, it is the read oracle".to_string(),
                ));
            }
            if case.id_to_delete == update_id {
                return Err(invalid("idToDelete equals the update id".to_string()));
            }
            if deleted.contains(&update_id) {
                return Err(invalid(format!(
                    "update id {update_id} is deleted by an earlier case"
                )));
            }
            if let Some(duplicate) = &case.duplicate_id {
                if !self.contains(resource, duplicate) {
                    return Err(invalid(format!("duplicateId {duplicate} is not a fixture")));
                }
                if deleted.contains(duplicate) {
                    return Err(invalid(format!(
                        "duplicateId {duplicate} is deleted by an earlier case"
                    )));
                }
            }
            if !deleted.insert(case.id_to_delete.clone()) {
                return Err(invalid(format!(
                    "idToDelete {} is already deleted by an earlier case",
                    case.id_to_delete
                )));
            }
        }
        Ok(())
    }
}

fn read(path: &Path) -> Result<String, FixtureError> {
    std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn parse_dataset(dataset: &str) -> Result<BTreeMap<ResourceName, Vec<Entity>>, FixtureError> {
    let document: Map<String, Value> =
        serde_json::from_str(dataset).map_err(|source| FixtureError::Parse {
            what: "dataset",
            source,
        })?;

    let mut records = BTreeMap::new();
    for (name, entries) in document {
        let resource: ResourceName = name
            .parse()
            .map_err(|_| FixtureError::UnknownResource(name.clone()))?;
        let entries: Vec<Entity> =
            serde_json::from_value(entries).map_err(|source| FixtureError::Parse {
                what: "dataset",
                source,
            })?;
        records.insert(resource, entries);
    }
    Ok(records)
}

/// Checks that `entity` carries every field in `fields`, descending into
/// nested objects. Returns the dotted path of the first offending field.
pub fn check_shape(fields: &[FieldSpec], entity: &Entity, prefix: &str) -> Result<(), String> {
    for field in fields {
        let path = if prefix.is_empty() {
            field.name.to_string()
        } else {
            format!("{prefix}.{}", field.name)
        };
        match (field.kind, entity.get(field.name)) {
            (_, None) => return Err(path),
            (FieldKind::Scalar, Some(_)) => {}
            (FieldKind::Nested(inner), Some(Value::Object(nested))) => {
                check_shape(inner, nested, &path)?
            }
            (FieldKind::Nested(_), Some(_)) => return Err(path),
        }
    }
    Ok(())
}
