//! Tolerant decode adapters for model output.
//!
//! Generative models drift from the JSON contract in predictable ways:
//! PascalCase field names, numbers as strings, a bare string where an array
//! was asked for. These adapters absorb each drift explicitly at the
//! deserialization boundary so the tolerance is testable in isolation.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Every wire-level field name this service understands. Used to rewrite
/// case-drifted keys back to their canonical form before parsing.
const CANONICAL_KEYS: &[&str] = &[
    "id",
    "workOrderNumber",
    "machineId",
    "machineName",
    "faultType",
    "severity",
    "rootCause",
    "recommendedActions",
    "diagnosedAt",
    "title",
    "description",
    "type",
    "priority",
    "status",
    "assignedTo",
    "notes",
    "estimatedDuration",
    "partsUsed",
    "tasks",
    "createdAt",
    "updatedAt",
    "faultId",
    "partId",
    "partNumber",
    "quantity",
    "sequence",
    "estimatedDurationMinutes",
    "requiredSkills",
    "safetyNotes",
];

/// Recursively rewrite object keys that case-insensitively match a known
/// field name to that field's canonical spelling. Unknown keys are left
/// alone; an existing canonical key is never clobbered.
pub fn canonicalize_keys(value: &mut Value) {
    match value {
        Value::Object(map) => {
            let keys: Vec<String> = map.keys().cloned().collect();
            for key in keys {
                let canonical = CANONICAL_KEYS
                    .iter()
                    .find(|c| c.eq_ignore_ascii_case(&key) && **c != key);
                if let Some(canonical) = canonical {
                    if let Some(inner) = map.remove(&key) {
                        map.entry(canonical.to_string()).or_insert(inner);
                    }
                }
            }
            for inner in map.values_mut() {
                canonicalize_keys(inner);
            }
        }
        Value::Array(items) => {
            for inner in items {
                canonicalize_keys(inner);
            }
        }
        _ => {}
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrList {
    One(String),
    Many(Vec<String>),
}

/// Accept either `"welding"` or `["welding", ...]` for a string list.
/// `null` (and absent, via `#[serde(default)]`) becomes an empty list;
/// empty strings are dropped.
pub fn string_or_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<StringOrList>::deserialize(deserializer)? {
        None => Ok(Vec::new()),
        Some(StringOrList::One(s)) => {
            if s.is_empty() {
                Ok(Vec::new())
            } else {
                Ok(vec![s])
            }
        }
        Some(StringOrList::Many(items)) => {
            Ok(items.into_iter().filter(|s| !s.is_empty()).collect())
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IntOrString {
    Int(i64),
    Str(String),
}

fn parse_int<E: serde::de::Error>(value: Option<IntOrString>, null_default: i64) -> Result<i64, E> {
    match value {
        None => Ok(null_default),
        Some(IntOrString::Int(n)) => Ok(n),
        Some(IntOrString::Str(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|e| E::custom(format!("invalid integer string {s:?}: {e}"))),
    }
}

/// Accept `90` or `"90"` for an integer field. `null` becomes 0.
pub fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    parse_int(Option::<IntOrString>::deserialize(deserializer)?, 0)
}

/// Quantity variant of [`lenient_i64`]: `null` becomes 1.
pub fn lenient_quantity<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    parse_int(Option::<IntOrString>::deserialize(deserializer)?, 1)
}
