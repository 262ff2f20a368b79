//! Inputs supplied when a run is triggered

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use serde_json::Value;

use crate::domain::Context;

/// Definition name to uploaded file path
pub type UploadMapping = HashMap<String, PathBuf>;

/// A submitted form value
#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    Field(Value),
    /// Binary upload, never part of the context
    Upload(PathBuf),
}

/// Submitted form data keyed by field name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormData(BTreeMap<String, FormValue>);

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, FormValue::Field(value.into()));
        self
    }

    pub fn with_upload(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.insert(name, FormValue::Upload(path.into()));
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FormValue) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&FormValue> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FormValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The run's starting context, with uploads removed
    pub fn initial_context(&self) -> Context {
        self.0
            .iter()
            .filter_map(|(name, value)| match value {
                FormValue::Field(value) => Some((name.clone(), value.clone())),
                FormValue::Upload(_) => None,
            })
            .collect()
    }
}

impl FromIterator<(String, FormValue)> for FormData {
    fn from_iter<T: IntoIterator<Item = (String, FormValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_initial_context_strips_uploads() {
        let form = FormData::new()
            .with_field("client_id", json!(12))
            .with_field("region", "north")
            .with_upload("Clients", "/tmp/clients.csv");

        let context = form.initial_context();

        assert_eq!(form.len(), 3);
        assert_eq!(context.len(), 2);
        assert_eq!(context.get("client_id"), Some(&json!(12)));
        assert!(!context.contains_key("Clients"));
    }

    #[test]
    fn test_empty_form() {
        assert!(FormData::new().initial_context().is_empty());
    }
}
