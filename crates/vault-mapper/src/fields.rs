//! Typed access to key/value properties.

use std::collections::BTreeMap;

use serde_json::Value;
use vault_graph::Properties;

use crate::error::MappingError;

/// Builds a properties map, skipping absent optional values.
#[derive(Default)]
pub(crate) struct PropertiesWriter {
    props: Properties,
}

impl PropertiesWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn text(mut self, key: &str, value: &str) -> Self {
        self.props.insert(key.into(), Value::String(value.into()));
        self
    }

    pub(crate) fn opt_text(self, key: &str, value: Option<&String>) -> Self {
        match value {
            Some(v) => self.text(key, v),
            None => self,
        }
    }

    pub(crate) fn list(mut self, key: &str, values: &[String]) -> Self {
        if !values.is_empty() {
            let items = values.iter().cloned().map(Value::String).collect();
            self.props.insert(key.into(), Value::Array(items));
        }
        self
    }

    pub(crate) fn map(mut self, key: &str, values: &BTreeMap<String, String>) -> Self {
        if !values.is_empty() {
            let items = values
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            self.props.insert(key.into(), Value::Object(items));
        }
        self
    }

    pub(crate) fn finish(self) -> Properties {
        self.props
    }
}

/// Reads typed fields out of a properties map.
pub(crate) struct PropertiesReader<'a> {
    props: &'a Properties,
}

impl<'a> PropertiesReader<'a> {
    pub(crate) fn new(props: &'a Properties) -> Self {
        Self { props }
    }

    pub(crate) fn text(&self, key: &str) -> Result<String, MappingError> {
        self.opt_text(key)?
            .ok_or_else(|| MappingError::MissingField(key.into()))
    }

    pub(crate) fn opt_text(&self, key: &str) -> Result<Option<String>, MappingError> {
        match self.props.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(invalid(key, "string", other)),
        }
    }

    pub(crate) fn list(&self, key: &str) -> Result<Vec<String>, MappingError> {
        match self.props.get(key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    other => Err(invalid(key, "string list", other)),
                })
                .collect(),
            Some(other) => Err(invalid(key, "string list", other)),
        }
    }

    pub(crate) fn map(&self, key: &str) -> Result<BTreeMap<String, String>, MappingError> {
        match self.props.get(key) {
            None | Some(Value::Null) => Ok(BTreeMap::new()),
            Some(Value::Object(items)) => items
                .iter()
                .map(|(k, v)| match v {
                    Value::String(s) => Ok((k.clone(), s.clone())),
                    other => Err(invalid(key, "string map", other)),
                })
                .collect(),
            Some(other) => Err(invalid(key, "string map", other)),
        }
    }
}

fn invalid(key: &str, expected: &str, found: &Value) -> MappingError {
    MappingError::InvalidField {
        field: key.into(),
        reason: format!("expected {expected}, found {found}"),
    }
}
