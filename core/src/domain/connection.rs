// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Connection Specifications
//!
//! Value types describing one named database connection as it appears in the
//! configuration tree:
//!
//! | Key | Meaning |
//! |-----|---------|
//! | `adapter` | Driver kind handed to the `AdapterFactory` (required) |
//! | `default` | Marks the connection as the registry default |
//! | `isDefaultTableAdapter` | Legacy alias of `default` |
//! | anything else | Forwarded verbatim to the factory as `ConnectionParams` |
//!
//! The policy keys are split off when a spec is built, so a factory only ever
//! sees the remaining parameters.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Configuration value objects for the connection registry

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Borrow;
use std::fmt;

pub const ADAPTER_KEY: &str = "adapter";
pub const DEFAULT_KEY: &str = "default";
pub const DEFAULT_TABLE_ADAPTER_KEY: &str = "isDefaultTableAdapter";

/// Name under which a connection is configured and looked up
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ConnectionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ConnectionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ConnectionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Driver-specific parameters, in configuration order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionParams(IndexMap<String, Value>);

impl ConnectionParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String view of a parameter. Numbers and booleans are rendered, so
    /// `port: 5432` and `port: "5432"` read the same.
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One entry of the configuration tree.
///
/// Deserializes from a flat mapping; `adapter`, `default` and
/// `isDefaultTableAdapter` are pulled out, everything else lands in
/// [`ConnectionParams`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "IndexMap<String, Value>", into = "IndexMap<String, Value>")]
pub struct ConnectionSpec {
    adapter: Option<String>,
    default: Option<Value>,
    default_table_adapter: Option<Value>,
    params: ConnectionParams,
}

impl ConnectionSpec {
    pub fn new(adapter: impl Into<String>) -> Self {
        Self {
            adapter: Some(adapter.into()),
            ..Self::default()
        }
    }

    /// Set a key the way the configuration tree would, routing policy keys
    /// away from the parameter set.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        match key {
            ADAPTER_KEY => {
                self.adapter = match value {
                    Value::String(s) => Some(s),
                    Value::Null => None,
                    other => Some(other.to_string()),
                }
            }
            DEFAULT_KEY => self.default = Some(value),
            DEFAULT_TABLE_ADAPTER_KEY => self.default_table_adapter = Some(value),
            _ => {
                self.params.insert(key, value);
            }
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn with_default(self, default: bool) -> Self {
        self.with(DEFAULT_KEY, default)
    }

    pub fn adapter(&self) -> Option<&str> {
        self.adapter.as_deref()
    }

    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    /// True when either `default` or `isDefaultTableAdapter` is truthy
    pub fn is_default(&self) -> bool {
        self.default.as_ref().is_some_and(is_truthy)
            || self.default_table_adapter.as_ref().is_some_and(is_truthy)
    }

    /// Drop both default markers
    pub fn clear_default(&mut self) {
        self.default = None;
        self.default_table_adapter = None;
    }
}

impl From<IndexMap<String, Value>> for ConnectionSpec {
    fn from(map: IndexMap<String, Value>) -> Self {
        let mut spec = ConnectionSpec::default();
        for (key, value) in map {
            spec.set(&key, value);
        }
        spec
    }
}

impl From<ConnectionSpec> for IndexMap<String, Value> {
    fn from(spec: ConnectionSpec) -> Self {
        let mut map = IndexMap::with_capacity(spec.params.len() + 3);
        if let Some(adapter) = spec.adapter {
            map.insert(ADAPTER_KEY.to_string(), Value::String(adapter));
        }
        map.extend(spec.params.0);
        if let Some(default) = spec.default {
            map.insert(DEFAULT_KEY.to_string(), default);
        }
        if let Some(alias) = spec.default_table_adapter {
            map.insert(DEFAULT_TABLE_ADAPTER_KEY.to_string(), alias);
        }
        map
    }
}

/// The configuration tree: connection id to spec, in declaration order
pub type ConnectionTree = IndexMap<ConnectionId, ConnectionSpec>;

/// Boolean-like interpretation of a configuration value.
///
/// Accepts `true`, non-zero numbers, and the strings `1`, `true`, `yes`, `on`
/// (case-insensitive). Sequences and mappings are never true.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Value::Array(_) | Value::Object(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_policy_keys_are_split_from_params() {
        let spec: ConnectionSpec = serde_yaml::from_str(
            r#"
adapter: pdo_mysql
host: localhost
username: webuser
default: true
isDefaultTableAdapter: false
dbname: db1
"#,
        )
        .unwrap();

        assert_eq!(spec.adapter(), Some("pdo_mysql"));
        assert!(spec.is_default());
        let keys: Vec<&str> = spec.params().keys().collect();
        assert_eq!(keys, vec!["host", "username", "dbname"]);
        assert!(!spec.params().contains_key(ADAPTER_KEY));
        assert!(!spec.params().contains_key(DEFAULT_KEY));
        assert!(!spec.params().contains_key(DEFAULT_TABLE_ADAPTER_KEY));
    }

    #[test]
    fn test_missing_adapter_is_preserved_as_none() {
        let spec: ConnectionSpec = serde_yaml::from_str("host: localhost").unwrap();
        assert_eq!(spec.adapter(), None);
        assert_eq!(spec.params().get_str("host").as_deref(), Some("localhost"));
    }

    #[test]
    fn test_legacy_alias_marks_default() {
        let spec = ConnectionSpec::new("sqlite").with(DEFAULT_TABLE_ADAPTER_KEY, true);
        assert!(spec.is_default());

        let spec = ConnectionSpec::new("sqlite")
            .with_default(false)
            .with(DEFAULT_TABLE_ADAPTER_KEY, true);
        assert!(spec.is_default());

        let mut spec = ConnectionSpec::new("sqlite").with_default(true);
        spec.clear_default();
        assert!(!spec.is_default());
    }

    #[test]
    fn test_truthiness() {
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!("Yes")));
        assert!(is_truthy(&json!("1")));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("0")));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&Value::Null));
        assert!(!is_truthy(&json!([false])));
        assert!(!is_truthy(&json!([true])));
        assert!(!is_truthy(&json!({"enabled": true})));
    }

    #[test]
    fn test_collection_flag_does_not_promote() {
        let yaml = "adapter: sqlite\ndefault: [false]\nisDefaultTableAdapter: {enabled: 1}";
        let spec: ConnectionSpec = serde_yaml::from_str(yaml).unwrap();
        assert!(!spec.is_default());
    }

    #[test]
    fn test_param_string_view() {
        let spec = ConnectionSpec::new("postgres")
            .with("port", 5432)
            .with("ssl", true);
        assert_eq!(spec.params().get_str("port").as_deref(), Some("5432"));
        assert_eq!(spec.params().get_str("ssl").as_deref(), Some("true"));
        assert_eq!(spec.params().get_str("missing"), None);
    }

    #[test]
    fn test_serializes_back_to_flat_mapping() {
        let spec = ConnectionSpec::new("pdo_pgsql")
            .with("host", "example.com")
            .with_default(true);
        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(
            value,
            json!({"adapter": "pdo_pgsql", "host": "example.com", "default": true})
        );
    }
}
