use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const ID_FIELD: &str = "id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(i64);

impl SubjectId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl From<i64> for SubjectId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Read,
    Write,
    Create,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Read,
        Operation::Write,
        Operation::Create,
        Operation::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Read => "read",
            Operation::Write => "write",
            Operation::Create => "create",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown operation '{0}' (expected read, write, create or delete)")]
pub struct UnknownOperation(pub String);

impl FromStr for Operation {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Operation::Read),
            "write" => Ok(Operation::Write),
            "create" => Ok(Operation::Create),
            "delete" => Ok(Operation::Delete),
            other => Err(UnknownOperation(other.to_string())),
        }
    }
}

/// Field values of the object being authorized.
///
/// Existing objects carry an `id` field; objects that are about to be created
/// usually don't. Parent-chain resolution reads owner columns (e.g. `owner_id`)
/// from here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entity {
    fields: BTreeMap<String, Value>,
}

impl Entity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(self, id: i64) -> Self {
        self.with_field(ID_FIELD, id)
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn id(&self) -> Option<i64> {
        self.object_id(ID_FIELD)
    }

    /// Reads `name` as an object id. Integers, integral floats (`20.0`) and
    /// numeric strings resolve; null, missing, fractional and non-numeric
    /// values yield `None`.
    pub fn object_id(&self, name: &str) -> Option<i64> {
        self.fields.get(name).and_then(value_as_object_id)
    }

    pub(crate) fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.fields.retain(|name, _| keep(name));
    }
}

impl FromIterator<(String, Value)> for Entity {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

fn value_as_object_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().and_then(|v| i64::try_from(v).ok()))
            .or_else(|| n.as_f64().and_then(integral_f64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn integral_f64(v: f64) -> Option<i64> {
    #[allow(clippy::cast_possible_truncation)]
    (v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64).then(|| v as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn operation_round_trips_through_str() {
        for op in Operation::ALL {
            assert_eq!(op.as_str().parse::<Operation>().unwrap(), op);
        }
    }

    #[test]
    fn operation_rejects_custom_names() {
        let err = "approve".parse::<Operation>().unwrap_err();
        assert_eq!(err, UnknownOperation("approve".to_string()));
        assert!(err.to_string().contains("approve"));
    }

    #[test]
    fn operation_deserializes_lowercase() {
        let op: Operation = serde_json::from_value(json!("delete")).unwrap();
        assert_eq!(op, Operation::Delete);
    }

    #[test]
    fn entity_id_is_absent_for_new_objects() {
        let entity = Entity::new().with_field("owner_id", 20);
        assert_eq!(entity.id(), None);
        assert_eq!(entity.object_id("owner_id"), Some(20));
    }

    #[test]
    fn entity_object_id_accepts_numeric_strings() {
        let entity = Entity::new().with_field("owner_id", " 42 ");
        assert_eq!(entity.object_id("owner_id"), Some(42));
    }

    #[test]
    fn entity_object_id_accepts_integral_floats() {
        let entity = Entity::new()
            .with_field("owner_id", 20.0)
            .with_field("building_id", 20.5);

        assert_eq!(entity.object_id("owner_id"), Some(20));
        assert_eq!(entity.object_id("building_id"), None);
    }

    #[test]
    fn entity_object_id_ignores_null_and_garbage() {
        let entity = Entity::new()
            .with_field("owner_id", Value::Null)
            .with_field("building_id", "north wing")
            .with_field("flag", true);

        assert_eq!(entity.object_id("owner_id"), None);
        assert_eq!(entity.object_id("building_id"), None);
        assert_eq!(entity.object_id("flag"), None);
        assert_eq!(entity.object_id("missing"), None);
    }

    #[test]
    fn entity_deserializes_from_plain_object() {
        let entity: Entity =
            serde_json::from_value(json!({"id": 10, "owner_id": 20, "name": "floor plan"}))
                .unwrap();

        assert_eq!(entity.id(), Some(10));
        assert_eq!(entity.object_id("owner_id"), Some(20));
        assert_eq!(entity.get("name"), Some(&json!("floor plan")));
        assert_eq!(entity.len(), 3);
    }

    #[test]
    fn subject_id_displays_raw_value() {
        assert_eq!(SubjectId::new(100).to_string(), "100");
        assert_eq!(SubjectId::from(7).value(), 7);
    }
}
