use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A raw row from the tabular store: opaque record id plus a free-form
/// field map, exactly as the Airtable REST API returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
    #[serde(
        rename = "createdTime",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub created_time: Option<DateTime<Utc>>,
}

impl Record {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self { id: id.into(), fields, created_time: None }
    }

    pub fn value(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Scalar string field; returns None for arrays, numbers and blanks.
    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// Field as a list of strings. Linked-record fields arrive as arrays of
    /// record ids; a bare string is treated as a single-element list.
    pub fn str_list(&self, field: &str) -> Vec<String> {
        match self.fields.get(field) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
            _ => vec![],
        }
    }

    /// First entry of a linked-record field, when only one link is expected.
    pub fn first_link(&self, field: &str) -> Option<String> {
        self.str_list(field).into_iter().next()
    }

    pub fn f64_field(&self, field: &str) -> Option<f64> {
        self.fields.get(field).and_then(Value::as_f64)
    }

    pub fn bool_field(&self, field: &str) -> Option<bool> {
        self.fields.get(field).and_then(Value::as_bool)
    }
}

/// Whether a value already looks like a store record id (`rec` followed by
/// 14 alphanumerics), as opposed to free text that still needs resolution.
pub fn is_record_id(value: &str) -> bool {
    value.len() == 17
        && value.starts_with("rec")
        && value[3..].chars().all(|c| c.is_ascii_alphanumeric())
}
