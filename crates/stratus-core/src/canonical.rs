use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::Result;
use crate::grant::PermissionGrant;

/// Order-independent identity of a permission grant.
///
/// Key equality is the sole definition of grant equality: two grants with
/// equal keys are the same permission regardless of how their fields or
/// array elements were ordered at the source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Compute the canonical key of a grant.
///
/// The grant is serialized with its `category` tag, then normalized
/// (object keys sorted alphabetically at every depth, array elements
/// sorted) and re-serialized deterministically. Wildcard scopes are plain
/// literals here; no subsumption is inferred.
pub fn canonical_key(grant: &PermissionGrant) -> Result<CanonicalKey> {
    let value = serde_json::to_value(grant)?;
    Ok(CanonicalKey(canonical_json(value)))
}

/// Deterministic serialization of an arbitrary JSON value: object keys
/// sorted recursively, array elements sorted by their own canonical form.
pub fn canonical_json(value: Value) -> String {
    normalize(value).to_string()
}

fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> = map
                .into_iter()
                .map(|(key, inner)| (key, normalize(inner)))
                .collect();
            Value::Object(sorted.into_iter().collect())
        }
        Value::Array(items) => {
            let mut items: Vec<Value> = items.into_iter().map(normalize).collect();
            items.sort_by_cached_key(|item| item.to_string());
            Value::Array(items)
        }
        other => other,
    }
}
