//! Opaque record representation.
//!
//! The engine never interprets a record's schema. A record is a key→value
//! map with a handful of well-known top-level keys (`id`, `record_number`,
//! `status`, `created_by`) and one reserved nested sub-map, `data`, holding
//! the application's custom fields. Rule conditions and notification
//! templates address fields by name; lookup checks `data` first, then the
//! top level.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::id::{RecordId, UserId};

/// Reserved key of the custom-field sub-map.
pub const DATA_KEY: &str = "data";

/// A record under evaluation, treated as an opaque key→value map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Look up a field by name: the nested `data` sub-map wins, then the
    /// top level. Returns `None` for absent fields.
    pub fn field(&self, name: &str) -> Option<&Value> {
        if let Some(Value::Object(data)) = self.0.get(DATA_KEY) {
            if let Some(v) = data.get(name) {
                return Some(v);
            }
        }
        self.0.get(name)
    }

    /// Look up a field and coerce it to a string slice.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(Value::as_str)
    }

    /// The custom-field sub-map, if present.
    pub fn data(&self) -> Option<&Map<String, Value>> {
        match self.0.get(DATA_KEY) {
            Some(Value::Object(data)) => Some(data),
            _ => None,
        }
    }

    /// Set a top-level key (used for e.g. mirroring the workflow status).
    pub fn set_top_level(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Set a custom field, creating the `data` sub-map when absent.
    pub fn set_data_field(&mut self, key: impl Into<String>, value: Value) {
        let data = self
            .0
            .entry(DATA_KEY)
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(map) = data {
            map.insert(key.into(), value);
        }
    }

    /// Remove a custom field (field-access masking).
    pub fn remove_data_field(&mut self, key: &str) -> Option<Value> {
        match self.0.get_mut(DATA_KEY) {
            Some(Value::Object(map)) => map.remove(key),
            _ => None,
        }
    }

    /// Look up a well-known top-level key, ignoring the `data` sub-map.
    fn top_level_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    pub fn id(&self) -> Option<RecordId> {
        self.top_level_str("id").and_then(|s| s.parse().ok())
    }

    /// The record's creator, when the `created_by` key holds a user id.
    pub fn created_by(&self) -> Option<UserId> {
        self.top_level_str("created_by").and_then(|s| s.parse().ok())
    }

    pub fn status(&self) -> Option<&str> {
        self.top_level_str("status")
    }

    pub fn record_number(&self) -> Option<&str> {
        self.top_level_str("record_number")
    }
}
