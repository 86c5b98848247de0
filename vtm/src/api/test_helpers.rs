//! In-memory configuration API for resource tests

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Mutex;

use super::{ApiError, ConfigApi};

#[derive(Debug, Clone, PartialEq)]
pub enum Method {
    Create,
    Get,
    Update,
    Delete,
    PutText,
    GetText,
}

#[derive(Debug, Clone)]
pub struct Call {
    pub method: Method,
    pub type_name: String,
    pub name: String,
    pub payload: Option<Value>,
    pub body: Option<String>,
}

/// Stores documents like the appliance does and records every call
///
/// Updates merge field by field into the stored sections, so a payload that
/// omits a field leaves its stored value alone.
#[derive(Default)]
pub struct RecordingApi {
    documents: Mutex<HashMap<(String, String), Value>>,
    texts: Mutex<HashMap<(String, String), String>>,
    calls: Mutex<Vec<Call>>,
    fail_next: Mutex<Option<u16>>,
}

fn not_found(type_name: &str, name: &str) -> ApiError {
    ApiError::ApiError {
        status: 404,
        message: format!("{}/{} does not exist", type_name, name),
        details: None,
    }
}

fn merge_sections(stored: &mut Value, payload: &Value) {
    let incoming = match payload.get("properties").and_then(Value::as_object) {
        Some(p) => p,
        None => return,
    };
    if !stored.get("properties").map(Value::is_object).unwrap_or(false) {
        *stored = serde_json::json!({"properties": {}});
    }
    if let Some(props) = stored.get_mut("properties").and_then(Value::as_object_mut) {
        for (section, fields) in incoming {
            let target = props
                .entry(section.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if let (Some(target), Some(fields)) = (target.as_object_mut(), fields.as_object()) {
                for (k, v) in fields {
                    target.insert(k.clone(), v.clone());
                }
            }
        }
    }
}

impl RecordingApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a stored document
    pub fn seed(&self, type_name: &str, name: &str, document: Value) {
        self.documents
            .lock()
            .unwrap()
            .insert((type_name.to_string(), name.to_string()), document);
    }

    pub fn seed_text(&self, type_name: &str, name: &str, body: &str) {
        self.texts
            .lock()
            .unwrap()
            .insert((type_name.to_string(), name.to_string()), body.to_string());
    }

    /// Make the next call fail with the given HTTP status
    pub fn fail_next(&self, status: u16) {
        *self.fail_next.lock().unwrap() = Some(status);
    }

    pub fn document(&self, type_name: &str, name: &str) -> Option<Value> {
        self.documents
            .lock()
            .unwrap()
            .get(&(type_name.to_string(), name.to_string()))
            .cloned()
    }

    pub fn text(&self, type_name: &str, name: &str) -> Option<String> {
        self.texts
            .lock()
            .unwrap()
            .get(&(type_name.to_string(), name.to_string()))
            .cloned()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, method: Method) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    /// Payload of the most recent update call
    pub fn last_update(&self) -> Option<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|c| c.method == Method::Update)
            .and_then(|c| c.payload.clone())
    }

    pub fn last_create(&self) -> Option<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|c| c.method == Method::Create)
            .and_then(|c| c.payload.clone())
    }

    fn record(
        &self,
        method: Method,
        type_name: &str,
        name: &str,
        payload: Option<&Value>,
        body: Option<&str>,
    ) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(Call {
            method,
            type_name: type_name.to_string(),
            name: name.to_string(),
            payload: payload.cloned(),
            body: body.map(str::to_string),
        });
        match self.fail_next.lock().unwrap().take() {
            Some(status) => Err(ApiError::ApiError {
                status,
                message: format!("injected failure {}", status),
                details: None,
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ConfigApi for RecordingApi {
    async fn create(&self, type_name: &str, name: &str, payload: &Value) -> Result<Value, ApiError> {
        self.record(Method::Create, type_name, name, Some(payload), None)?;
        let mut stored = serde_json::json!({"properties": {}});
        merge_sections(&mut stored, payload);
        self.seed(type_name, name, stored.clone());
        Ok(stored)
    }

    async fn get(&self, type_name: &str, name: &str) -> Result<Value, ApiError> {
        self.record(Method::Get, type_name, name, None, None)?;
        self.document(type_name, name)
            .ok_or_else(|| not_found(type_name, name))
    }

    async fn update(&self, type_name: &str, name: &str, payload: &Value) -> Result<Value, ApiError> {
        self.record(Method::Update, type_name, name, Some(payload), None)?;
        let mut docs = self.documents.lock().unwrap();
        let stored = docs
            .get_mut(&(type_name.to_string(), name.to_string()))
            .ok_or_else(|| not_found(type_name, name))?;
        merge_sections(stored, payload);
        Ok(stored.clone())
    }

    async fn delete(&self, type_name: &str, name: &str) -> Result<(), ApiError> {
        self.record(Method::Delete, type_name, name, None, None)?;
        let key = (type_name.to_string(), name.to_string());
        let removed_doc = self.documents.lock().unwrap().remove(&key);
        let removed_text = self.texts.lock().unwrap().remove(&key);
        if removed_doc.is_none() && removed_text.is_none() {
            return Err(not_found(type_name, name));
        }
        Ok(())
    }

    async fn put_text(&self, type_name: &str, name: &str, body: &str) -> Result<(), ApiError> {
        self.record(Method::PutText, type_name, name, None, Some(body))?;
        self.seed_text(type_name, name, body);
        Ok(())
    }

    async fn get_text(&self, type_name: &str, name: &str) -> Result<String, ApiError> {
        self.record(Method::GetText, type_name, name, None, None)?;
        self.text(type_name, name)
            .ok_or_else(|| not_found(type_name, name))
    }
}

/// Declarative value from a JSON literal
pub fn dynamic(json: Value) -> tfplug::DynamicValue {
    tfplug::DynamicValue::new(serde_json::from_value(json).unwrap())
}

/// Configure `resource` against `api`
pub async fn configure<R: tfplug::ResourceWithConfigure>(
    resource: &mut R,
    api: std::sync::Arc<RecordingApi>,
) {
    let data: std::sync::Arc<dyn std::any::Any + Send + Sync> =
        std::sync::Arc::new(crate::provider_data::VtmProviderData::with_api(api));
    let response = resource
        .configure(tfplug::resource::ConfigureResourceRequest {
            provider_data: Some(data),
        })
        .await;
    assert!(response.diagnostics.is_empty());
}

/// A non-empty value for every writable field, distinct per field
pub fn sample_fields(
    fields: &[crate::util::FieldSpec],
    seed: usize,
) -> HashMap<String, tfplug::Dynamic> {
    use crate::util::FieldKind;
    use tfplug::Dynamic;

    let mut out = HashMap::new();
    for (i, field) in fields.iter().enumerate().filter(|(_, f)| !f.read_only) {
        let text = |tag: &str| Dynamic::String(format!("{}-{}-{}", tag, field.name, seed));
        let value = match field.kind {
            FieldKind::String => text("s"),
            FieldKind::Bool => Dynamic::Bool(true),
            FieldKind::Int => Dynamic::Number((seed * 100 + i + 1) as f64),
            // Reverse order, so a sorted read would show up
            FieldKind::StringList => Dynamic::List(vec![text("z"), text("a")]),
            FieldKind::StringSet => Dynamic::Set(vec![text("a"), text("b")]),
            FieldKind::Table(table) => {
                let rows = (0..2)
                    .map(|row| Dynamic::Map(sample_fields(table.fields, seed * 10 + row)))
                    .collect();
                if table.ordered {
                    Dynamic::List(rows)
                } else {
                    Dynamic::Set(rows)
                }
            }
        };
        out.insert(field.name.to_string(), value);
    }
    out
}

/// Every section of `layout` filled with sample values, blocks wrapped
pub fn sample_root(layout: &crate::resources::lifecycle::ResourceLayout) -> tfplug::DynamicValue {
    use tfplug::Dynamic;

    let mut root = HashMap::new();
    for (i, section) in layout.sections.iter().enumerate() {
        let values = sample_fields(section.fields, i);
        match section.block {
            Some(block) => {
                root.insert(block.to_string(), Dynamic::List(vec![Dynamic::Map(values)]));
            }
            None => root.extend(values),
        }
    }
    root.insert("name".to_string(), Dynamic::String("sample".to_string()));
    tfplug::DynamicValue::from_map(root)
}

/// flatten then expand reproduces every writable field of every section
pub fn assert_layout_round_trips(layout: &crate::resources::lifecycle::ResourceLayout) {
    use crate::util::{expand_from_remote, flatten_to_remote};

    for (i, section) in layout.sections.iter().enumerate() {
        let values = sample_fields(section.fields, i);
        let remote = flatten_to_remote(&values, section).unwrap();
        let back = expand_from_remote(&remote, section, None).unwrap();
        assert_eq!(back, values, "section {}", section.remote);
    }
}

/// Changing any single field sends that field, or its whole section, plus
/// the always-sent fields and nothing else
pub fn assert_single_field_updates(layout: &crate::resources::lifecycle::ResourceLayout) {
    use crate::util::{build_update_payload, Granularity};
    use std::collections::BTreeSet;
    use tfplug::ChangeSet;

    let root = sample_root(layout);
    for changed in layout.sections {
        for field in changed.fields.iter().filter(|f| !f.read_only) {
            let path = changed.path_of(field);
            let payload = build_update_payload(&root, layout.sections, &ChangeSet::from_paths([&path]))
                .unwrap()
                .unwrap_or_else(|| panic!("no update for {}", path));
            let properties = payload["properties"].as_object().unwrap();

            for section in layout.sections {
                let mut want: BTreeSet<&str> = BTreeSet::new();
                if section.granularity == Granularity::Field {
                    want.extend(
                        section
                            .fields
                            .iter()
                            .filter(|f| f.always_sent && !f.read_only)
                            .map(|f| f.remote),
                    );
                }
                if std::ptr::eq(*section, *changed) {
                    match section.granularity {
                        Granularity::Field => {
                            want.insert(field.remote);
                        }
                        Granularity::Section => want.extend(
                            section.fields.iter().filter(|f| !f.read_only).map(|f| f.remote),
                        ),
                    }
                }

                let got: BTreeSet<&str> = properties
                    .get(section.remote)
                    .and_then(Value::as_object)
                    .map(|fields| fields.keys().map(String::as_str).collect())
                    .unwrap_or_default();
                assert_eq!(got, want, "changing {} touched {}", path, section.remote);
            }
        }
    }
}
