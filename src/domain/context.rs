//! Run context
//!
//! A context is the flat key/value record a workflow instance accumulates while
//! its sources are loaded. Later writes to an existing key replace the earlier
//! value silently.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Accumulated field values for one branch of a workflow run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context(Map<String, Value>);

impl Context {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    /// Shallow-merge `record` into a copy of this context
    pub fn merged_with(&self, record: &Context) -> Context {
        let mut merged = self.clone();
        for (key, value) in record.iter() {
            merged.0.insert(key.clone(), value.clone());
        }
        merged
    }

    /// Copy of this context with one extra field
    pub fn with_field(&self, key: impl Into<String>, value: Value) -> Context {
        let mut merged = self.clone();
        merged.0.insert(key.into(), value);
        merged
    }

    /// Whether `field` holds `expected`
    ///
    /// Strings compare verbatim; numbers and booleans compare by their textual
    /// form. A missing key or a null/array/object value never matches.
    pub fn field_matches(&self, field: &str, expected: &str) -> bool {
        match self.0.get(field) {
            Some(Value::String(s)) => s == expected,
            Some(Value::Number(n)) => n.to_string() == expected,
            Some(Value::Bool(b)) => b.to_string() == expected,
            _ => false,
        }
    }
}

impl From<Map<String, Value>> for Context {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Context> for Value {
    fn from(context: Context) -> Self {
        Value::Object(context.0)
    }
}

impl TryFrom<Value> for Context {
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx(value: Value) -> Context {
        Context::try_from(value).unwrap()
    }

    #[test]
    fn test_merge_overwrites_existing_keys() {
        let base = ctx(json!({"name": "Ada", "id": 0}));
        let record = ctx(json!({"id": 7, "city": "London"}));

        let merged = base.merged_with(&record);

        assert_eq!(merged, ctx(json!({"name": "Ada", "id": 7, "city": "London"})));
        // Original untouched
        assert_eq!(base.get("id"), Some(&json!(0)));
    }

    #[test]
    fn test_with_field() {
        let base = ctx(json!({"a": 1}));
        let extended = base.with_field("rows", json!([]));

        assert_eq!(extended.len(), 2);
        assert_eq!(extended.get("rows"), Some(&json!([])));
        assert_eq!(base.len(), 1);
    }

    #[test]
    fn test_field_matches() {
        let context = ctx(json!({
            "status": "approved",
            "count": 3,
            "flag": true,
            "empty": null,
            "list": ["approved"]
        }));

        assert!(context.field_matches("status", "approved"));
        assert!(!context.field_matches("status", "Approved"));
        assert!(context.field_matches("count", "3"));
        assert!(context.field_matches("flag", "true"));
        assert!(!context.field_matches("empty", ""));
        assert!(!context.field_matches("list", "approved"));
        assert!(!context.field_matches("missing", "approved"));
    }

    #[test]
    fn test_try_from_non_object() {
        assert!(Context::try_from(json!([1, 2])).is_err());
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let context: Context = [("name", json!("Ada"))].into_iter().collect();
        assert_eq!(serde_json::to_string(&context).unwrap(), r#"{"name":"Ada"}"#);
    }
}
