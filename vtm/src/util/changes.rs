//! Change-tracking payload builders
//!
//! Create sends everything configured. Update sends the always-sent fields
//! plus whatever the change set names, at the granularity each section's
//! endpoint applies partial updates.

use serde_json::{Map, Value};
use std::collections::HashMap;
use tfplug::{ChangeSet, Dynamic, DynamicValue, TfplugError};

use super::section::{
    block_instance, empty_json, field_to_json, flatten_block, Granularity, SectionSpec,
};
use crate::api::common::properties_document;

type Result<T> = std::result::Result<T, TfplugError>;

fn root_of(config: &DynamicValue) -> Result<HashMap<String, Dynamic>> {
    match &config.value {
        Dynamic::Map(m) => Ok(m.clone()),
        Dynamic::Null => Ok(HashMap::new()),
        other => Err(TfplugError::type_mismatch("object", other.type_name())),
    }
}

fn merge_section(properties: &mut Map<String, Value>, remote: &str, fields: Map<String, Value>) {
    match properties.get_mut(remote).and_then(Value::as_object_mut) {
        Some(existing) => existing.extend(fields),
        None => {
            properties.insert(remote.to_string(), Value::Object(fields));
        }
    }
}

/// Full document for a create: every configured field, defaults included
pub fn build_create_payload(config: &DynamicValue, sections: &[&SectionSpec]) -> Result<Value> {
    let root = root_of(config)?;
    let mut properties = Map::new();
    for section in sections {
        let fields = flatten_block(&root, section)?;
        if fields.is_empty() {
            continue;
        }
        merge_section(&mut properties, section.remote, fields);
    }
    Ok(properties_document(properties))
}

/// Minimal document for an update, or None when nothing changed
///
/// Always-sent fields ride along with any real change but never cause an
/// update on their own. A changed field whose value was removed is sent as
/// the empty value of its kind; a changed section is written in full, so a
/// removed block clears every field it governs.
pub fn build_update_payload(
    config: &DynamicValue,
    sections: &[&SectionSpec],
    changes: &ChangeSet,
) -> Result<Option<Value>> {
    let root = root_of(config)?;
    let mut properties = Map::new();
    let mut changed_any = false;

    for section in sections {
        let (fields, changed) = match section.granularity {
            Granularity::Field => field_changes(&root, section, changes)?,
            Granularity::Section => section_changes(&root, section, changes)?,
        };
        changed_any |= changed;
        if !fields.is_empty() {
            merge_section(&mut properties, section.remote, fields);
        }
    }

    if !changed_any {
        tracing::debug!("no changed fields, update payload is empty");
        return Ok(None);
    }
    Ok(Some(properties_document(properties)))
}

fn field_changes(
    root: &HashMap<String, Dynamic>,
    section: &SectionSpec,
    changes: &ChangeSet,
) -> Result<(Map<String, Value>, bool)> {
    let empty = HashMap::new();
    let values = match section.block {
        Some(block) => block_instance(root, block)?.unwrap_or(&empty),
        None => root,
    };

    let mut out = Map::new();
    let mut changed = false;
    for field in section.fields.iter().filter(|f| !f.read_only) {
        let field_changed = changes.has_change(&section.path_of(field));
        if !field_changed && !field.always_sent {
            continue;
        }
        changed |= field_changed;

        let value = values.get(field.name).unwrap_or(&Dynamic::Null);
        match field_to_json(value, field)? {
            Some(json) => {
                out.insert(field.remote.to_string(), json);
            }
            None if field_changed => {
                out.insert(field.remote.to_string(), empty_json(field.kind));
            }
            None => {}
        }
    }

    if changed {
        tracing::debug!(
            section = section.remote,
            fields = ?out.keys().collect::<Vec<_>>(),
            "sending changed fields"
        );
    }
    Ok((out, changed))
}

fn section_changes(
    root: &HashMap<String, Dynamic>,
    section: &SectionSpec,
    changes: &ChangeSet,
) -> Result<(Map<String, Value>, bool)> {
    let changed = match section.block {
        Some(block) => changes.has_change(block),
        None => section
            .fields
            .iter()
            .any(|f| !f.read_only && changes.has_change(f.name)),
    };
    if !changed {
        return Ok((Map::new(), false));
    }

    let empty = HashMap::new();
    let values = match section.block {
        Some(block) => block_instance(root, block)?,
        None => Some(root),
    };
    if values.is_none() {
        tracing::debug!(section = section.remote, "block removed, clearing every field");
    }
    let values = values.unwrap_or(&empty);

    // Removed fields are written as the empty value of their kind
    let mut out = Map::new();
    for field in section.fields.iter().filter(|f| !f.read_only) {
        let value = values.get(field.name).unwrap_or(&Dynamic::Null);
        let json = field_to_json(value, field)?.unwrap_or_else(|| empty_json(field.kind));
        out.insert(field.remote.to_string(), json);
    }
    tracing::debug!(section = section.remote, "re-sending whole section");
    Ok((out, true))
}
