//! A single post ("toot") as returned by the server.
//!
//! The record is kept verbatim; only the `id` field carries meaning here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Post(Map<String, Value>);

impl From<Map<String, Value>> for Post {
    fn from(fields: Map<String, Value>) -> Self {
        Post(fields)
    }
}

impl Post {
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Mastodon sends ids as decimal strings, but plain numbers are accepted too.
    pub fn id(&self) -> Option<String> {
        match self.0.get(crate::DEFAULT_ID_FIELD)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Copy of the record with top level `*_at` timestamps rewritten as ISO-8601 UTC.
    /// Everything else is passed through untouched.
    pub fn to_export_json(&self) -> Value {
        let fields = self
            .0
            .iter()
            .map(|(key, value)| {
                let value = match value {
                    Value::String(s) if key.ends_with("_at") => normalize_datetime(s)
                        .map(Value::String)
                        .unwrap_or_else(|| value.clone()),
                    _ => value.clone(),
                };
                (key.clone(), value)
            })
            .collect();
        Value::Object(fields)
    }
}

fn normalize_datetime(raw: &str) -> Option<String> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).to_rfc3339())
}

/// Renders a field as a CSV cell. Nested values become compact JSON text.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        nested => nested.to_string(),
    }
}
