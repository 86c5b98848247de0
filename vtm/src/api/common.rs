//! Wire types shared by every configuration resource

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Error document returned by the configuration API on failure
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
#[error("{error_id}: {error_text}")]
pub struct VtmError {
    pub error_id: String,
    pub error_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_info: Option<Value>,
}

/// Wrap sections into a `{"properties": {...}}` document
pub fn properties_document(sections: Map<String, Value>) -> Value {
    let mut doc = Map::new();
    doc.insert("properties".to_string(), Value::Object(sections));
    Value::Object(doc)
}

/// Borrow `properties.<section>` from a remote document
pub fn section<'a>(document: &'a Value, name: &str) -> Option<&'a Map<String, Value>> {
    document
        .get("properties")
        .and_then(|p| p.get(name))
        .and_then(Value::as_object)
}
