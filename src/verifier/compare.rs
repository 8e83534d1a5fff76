//! Deep field comparison between a submitted entity and what the backend
//! returned.

use crate::model::Entity;
use serde_json::Value;

/// Compares every field of `expected` against `actual`, descending into
/// nested objects. Fields only `actual` carries (server-assigned ones such as
/// `id` on create) are ignored.
///
/// Returns one human-readable line per mismatch, keyed by dotted path.
pub fn diff(expected: &Entity, actual: &Value) -> Vec<String> {
    let mut mismatches = Vec::new();
    diff_into(expected, actual, "", false, &mut mismatches);
    mismatches
}

/// Like [`diff`], but a field `actual` carries at any depth that `expected`
/// lacks is a mismatch too.
pub fn diff_exact(expected: &Entity, actual: &Value) -> Vec<String> {
    let mut mismatches = Vec::new();
    diff_into(expected, actual, "", true, &mut mismatches);
    mismatches
}

fn diff_into(expected: &Entity, actual: &Value, prefix: &str, exact: bool, out: &mut Vec<String>) {
    let Some(actual) = actual.as_object() else {
        let at = if prefix.is_empty() { "entity" } else { prefix };
        out.push(format!("{at}: expected an object, got {actual}"));
        return;
    };
    let path_of = |name: &str| {
        if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}.{name}")
        }
    };

    for (name, want) in expected {
        let path = path_of(name);
        match (want, actual.get(name)) {
            (_, None) => out.push(format!("{path}: missing, expected {want}")),
            (Value::Object(want), Some(got)) => diff_into(want, got, &path, exact, out),
            (want, Some(got)) if want != got => {
                out.push(format!("{path}: expected {want}, got {got}"))
            }
            _ => {}
        }
    }

    if exact {
        for (name, got) in actual {
            if !expected.contains_key(name) {
                out.push(format!("{}: unexpected, got {got}", path_of(name)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entity(value: Value) -> Entity {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_extra_server_fields_are_ignored() {
        let expected = entity(json!({ "userId": 1, "title": "title" }));
        let actual = json!({ "id": 51, "userId": 1, "title": "title" });
        assert!(diff(&expected, &actual).is_empty());
    }

    #[test]
    fn test_reports_nested_paths() {
        let expected = entity(json!({
            "name": "name",
            "address": { "city": "city", "geo": { "lat": "lat", "lng": "lng" } }
        }));
        let actual = json!({
            "name": "name",
            "address": { "city": "town", "geo": { "lat": "lat" } }
        });

        let mismatches = diff(&expected, &actual);
        assert_eq!(
            mismatches,
            vec![
                r#"address.city: expected "city", got "town""#.to_string(),
                r#"address.geo.lng: missing, expected "lng""#.to_string(),
            ]
        );
    }

    #[test]
    fn test_types_must_match_exactly() {
        let expected = entity(json!({ "userId": 1 }));
        assert_eq!(diff(&expected, &json!({ "userId": "1" })).len(), 1);
        assert_eq!(diff(&expected, &json!(null)).len(), 1);
    }

    #[test]
    fn test_exact_diff_flags_extra_fields_at_any_depth() {
        let expected = entity(json!({ "id": 1, "address": { "city": "city" } }));
        let actual = json!({ "id": 1, "extra": true, "address": { "city": "city", "zip": "z" } });

        assert!(diff(&expected, &actual).is_empty());
        assert_eq!(
            diff_exact(&expected, &actual),
            vec![
                r#"address.zip: unexpected, got "z""#.to_string(),
                "extra: unexpected, got true".to_string(),
            ]
        );
        assert!(diff_exact(&expected, &json!({ "id": 1, "address": { "city": "city" } })).is_empty());
    }
}
