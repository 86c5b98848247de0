//! Section assemblers
//!
//! Every remote section is described once by a static `SectionSpec` table:
//! which declarative attribute feeds which remote field, with what shape.
//! `flatten_to_remote` and `expand_from_remote` are driven entirely by those
//! tables, so a table is also the name-translation map for its section.

use serde_json::{Map, Value};
use std::collections::HashMap;
use tfplug::{Dynamic, TfplugError};

use super::convert;

type Result<T> = std::result::Result<T, TfplugError>;

/// Shape of one field on both sides of the mapping
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    String,
    Bool,
    Int,
    /// Order-significant list of strings
    StringList,
    /// Unordered collection of strings
    StringSet,
    /// Array of records
    Table(&'static TableSpec),
}

#[derive(Debug)]
pub struct TableSpec {
    pub fields: &'static [FieldSpec],
    /// Field identifying a row across reads
    pub key: Option<&'static str>,
    /// Ordered tables are lists, the rest are sets
    pub ordered: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub remote: &'static str,
    pub kind: FieldKind,
    /// Computed by the remote; read but never sent
    pub read_only: bool,
    /// Sent on every update whether changed or not
    pub always_sent: bool,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            remote: name,
            kind,
            read_only: false,
            always_sent: false,
        }
    }

    pub const fn string(name: &'static str) -> Self {
        Self::new(name, FieldKind::String)
    }

    pub const fn bool(name: &'static str) -> Self {
        Self::new(name, FieldKind::Bool)
    }

    pub const fn int(name: &'static str) -> Self {
        Self::new(name, FieldKind::Int)
    }

    pub const fn list(name: &'static str) -> Self {
        Self::new(name, FieldKind::StringList)
    }

    pub const fn set(name: &'static str) -> Self {
        Self::new(name, FieldKind::StringSet)
    }

    pub const fn table(name: &'static str, table: &'static TableSpec) -> Self {
        Self::new(name, FieldKind::Table(table))
    }

    /// Remote name when it differs from the declarative one
    pub const fn remote(self, remote: &'static str) -> Self {
        let mut field = self;
        field.remote = remote;
        field
    }

    pub const fn read_only(self) -> Self {
        let mut field = self;
        field.read_only = true;
        field
    }

    pub const fn always_sent(self) -> Self {
        let mut field = self;
        field.always_sent = true;
        field
    }
}

/// Granularity at which the remote applies a partial update of a section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// Only changed fields are sent; omitted fields are left alone
    Field,
    /// Any change re-sends the whole section
    Section,
}

#[derive(Debug)]
pub struct SectionSpec {
    /// Declarative single-instance block, or None for top-level attributes
    pub block: Option<&'static str>,
    pub remote: &'static str,
    pub fields: &'static [FieldSpec],
    pub granularity: Granularity,
}

impl SectionSpec {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn remote_field(&self, remote: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.remote == remote)
    }

    /// ChangeSet path of a field in this section
    pub fn path_of(&self, field: &FieldSpec) -> String {
        match self.block {
            Some(block) => format!("{}.{}", block, field.name),
            None => field.name.to_string(),
        }
    }
}

/// The instance of a single-instance block, if one is configured
pub fn block_instance<'a>(
    root: &'a HashMap<String, Dynamic>,
    block: &str,
) -> Result<Option<&'a HashMap<String, Dynamic>>> {
    match root.get(block) {
        None | Some(Dynamic::Null) | Some(Dynamic::Unknown) => Ok(None),
        Some(Dynamic::Map(m)) => Ok(Some(m)),
        Some(Dynamic::List(items)) | Some(Dynamic::Set(items)) => match items.as_slice() {
            [] => Ok(None),
            [Dynamic::Map(m)] => Ok(Some(m)),
            [other] => Err(TfplugError::type_mismatch(
                format!("{} block", block),
                other.type_name(),
            )),
            _ => Err(TfplugError::type_mismatch(
                format!("a single {} block", block),
                format!("{} blocks", items.len()),
            )),
        },
        Some(other) => Err(TfplugError::type_mismatch(
            format!("{} block", block),
            other.type_name(),
        )),
    }
}

/// Remote fields governed by `section`, read from its declarative values
///
/// Absent, null and unknown values are omitted, as are read-only fields.
pub fn flatten_to_remote(
    values: &HashMap<String, Dynamic>,
    section: &SectionSpec,
) -> Result<Map<String, Value>> {
    flatten_fields(values, section.fields)
}

/// Flatten a section from the resource root, resolving its block if any
///
/// An absent block yields an empty map: the caller omits the section.
pub fn flatten_block(
    root: &HashMap<String, Dynamic>,
    section: &SectionSpec,
) -> Result<Map<String, Value>> {
    match section.block {
        None => flatten_to_remote(root, section),
        Some(block) => match block_instance(root, block)? {
            Some(values) => flatten_to_remote(values, section),
            None => Ok(Map::new()),
        },
    }
}

fn flatten_fields(
    values: &HashMap<String, Dynamic>,
    fields: &[FieldSpec],
) -> Result<Map<String, Value>> {
    let mut out = Map::new();
    for field in fields.iter().filter(|f| !f.read_only) {
        if let Some(value) = values.get(field.name) {
            if let Some(json) = field_to_json(value, field)? {
                out.insert(field.remote.to_string(), json);
            }
        }
    }
    Ok(out)
}

/// JSON for one declarative value; None when the value is absent
pub fn field_to_json(value: &Dynamic, field: &FieldSpec) -> Result<Option<Value>> {
    if value.is_absent() {
        return Ok(None);
    }
    let json = match field.kind {
        FieldKind::String => convert::string_to_json(value)?,
        FieldKind::Bool => convert::bool_to_json(value)?,
        FieldKind::Int => convert::int_to_json(value)?,
        FieldKind::StringList | FieldKind::StringSet => convert::strings_to_json(value)?,
        FieldKind::Table(table) => {
            let rows = value.elements().ok_or_else(|| {
                TfplugError::type_mismatch(format!("{} rows", field.name), value.type_name())
            })?;
            let mut out = Vec::with_capacity(rows.len());
            for row in rows {
                let row = row.as_map().ok_or_else(|| {
                    TfplugError::type_mismatch(format!("{} row", field.name), row.type_name())
                })?;
                out.push(Value::Object(flatten_fields(row, table.fields)?));
            }
            Value::Array(out)
        }
    };
    Ok(Some(json))
}

/// The value a cleared field is sent as
pub fn empty_json(kind: FieldKind) -> Value {
    match kind {
        FieldKind::String => Value::String(String::new()),
        FieldKind::Bool => Value::Bool(false),
        FieldKind::Int => Value::from(0),
        FieldKind::StringList | FieldKind::StringSet | FieldKind::Table(_) => {
            Value::Array(Vec::new())
        }
    }
}

/// Declarative values for `section` from its remote JSON
///
/// A field the remote omits keeps its `prior` value, or stays unset when
/// there is none. When a `prior` is given, a field it leaves unset also stays
/// unset if the remote holds only the empty value of its kind. Remote fields
/// without a table entry are skipped.
pub fn expand_from_remote(
    remote: &Map<String, Value>,
    section: &SectionSpec,
    prior: Option<&HashMap<String, Dynamic>>,
) -> Result<HashMap<String, Dynamic>> {
    for name in remote.keys() {
        if section.remote_field(name).is_none() {
            tracing::debug!(
                section = section.remote,
                field = %name,
                "ignoring remote field with no declarative counterpart"
            );
        }
    }
    expand_fields(remote, section.fields, prior)
}

/// Expand a section into the value of its declarative block
///
/// Returns the value to store under the block name (a one-element list), or
/// the attributes to merge into the root for top-level sections.
pub fn expand_block(
    remote: Option<&Map<String, Value>>,
    section: &SectionSpec,
    prior_root: &HashMap<String, Dynamic>,
) -> Result<HashMap<String, Dynamic>> {
    let empty = Map::new();
    let remote = remote.unwrap_or(&empty);

    match section.block {
        None => expand_from_remote(remote, section, Some(prior_root)),
        Some(block) => {
            let prior = block_instance(prior_root, block)?;
            if remote.is_empty() || (prior.is_none() && is_cleared(remote, section)) {
                // Nothing to learn; keep whatever the prior state held
                let mut out = HashMap::new();
                if let Some(value) = prior_root.get(block) {
                    out.insert(block.to_string(), value.clone());
                }
                return Ok(out);
            }
            let values = expand_from_remote(remote, section, prior)?;
            let mut out = HashMap::new();
            out.insert(
                block.to_string(),
                Dynamic::List(vec![Dynamic::Map(values)]),
            );
            Ok(out)
        }
    }
}

/// True when no writable field of the section holds a non-empty value
fn is_cleared(remote: &Map<String, Value>, section: &SectionSpec) -> bool {
    section
        .fields
        .iter()
        .filter(|f| !f.read_only)
        .all(|f| match remote.get(f.remote) {
            None | Some(Value::Null) => true,
            Some(json) => *json == empty_json(f.kind),
        })
}

fn expand_fields(
    remote: &Map<String, Value>,
    fields: &[FieldSpec],
    prior: Option<&HashMap<String, Dynamic>>,
) -> Result<HashMap<String, Dynamic>> {
    let mut out = HashMap::new();
    for field in fields {
        let prior_value = prior.and_then(|p| p.get(field.name));
        let unset_in_prior = prior.is_some() && prior_value.map_or(true, Dynamic::is_absent);
        match remote.get(field.remote) {
            Some(json) if unset_in_prior && *json == empty_json(field.kind) => {
                if let Some(value) = prior_value {
                    out.insert(field.name.to_string(), value.clone());
                }
            }
            Some(json) => {
                out.insert(field.name.to_string(), json_to_field(json, field, prior_value)?);
            }
            None => {
                if let Some(value) = prior_value {
                    out.insert(field.name.to_string(), value.clone());
                }
            }
        }
    }
    Ok(out)
}

fn json_to_field(json: &Value, field: &FieldSpec, prior: Option<&Dynamic>) -> Result<Dynamic> {
    if json.is_null() {
        return Ok(Dynamic::Null);
    }
    match field.kind {
        FieldKind::String => convert::string_value(json),
        FieldKind::Bool => convert::bool_value(json),
        FieldKind::Int => convert::int_value(json),
        FieldKind::StringList => convert::string_list_value(json),
        FieldKind::StringSet => convert::string_set_value(json),
        FieldKind::Table(table) => expand_table(json, field.name, table, prior),
    }
}

fn row_key(row: &HashMap<String, Dynamic>, key: &str) -> Option<String> {
    match row.get(key) {
        Some(Dynamic::String(s)) => Some(s.clone()),
        Some(Dynamic::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn expand_table(
    json: &Value,
    name: &str,
    table: &TableSpec,
    prior: Option<&Dynamic>,
) -> Result<Dynamic> {
    let rows = json
        .as_array()
        .ok_or_else(|| TfplugError::type_mismatch(format!("{} rows", name), convert::json_type(json)))?;

    let prior_rows: Vec<&HashMap<String, Dynamic>> = prior
        .and_then(Dynamic::elements)
        .map(|items| items.iter().filter_map(Dynamic::as_map).collect())
        .unwrap_or_default();

    let mut expanded = Vec::with_capacity(rows.len());
    for row in rows {
        let row = row.as_object().ok_or_else(|| {
            TfplugError::type_mismatch(format!("{} row", name), convert::json_type(row))
        })?;

        // The matching prior row supplies values for fields the remote omits
        let matching_prior = table.key.and_then(|key| {
            let remote_key = table
                .fields
                .iter()
                .find(|f| f.name == key)
                .map_or(key, |f| f.remote);
            let id = row.get(remote_key).and_then(Value::as_str)?;
            prior_rows
                .iter()
                .find(|p| row_key(p, key).as_deref() == Some(id))
                .copied()
        });
        expanded.push(expand_fields(row, table.fields, matching_prior)?);
    }

    match (table.key, table.ordered) {
        (Some(key), true) => {
            // Stable sort into the prior order; rows with unknown keys follow
            // in remote order
            let position = |row: &HashMap<String, Dynamic>| {
                row_key(row, key)
                    .and_then(|id| {
                        prior_rows
                            .iter()
                            .position(|p| row_key(p, key).as_deref() == Some(id.as_str()))
                    })
                    .unwrap_or(usize::MAX)
            };
            expanded.sort_by_key(|row| position(row));
        }
        (Some(key), false) => {
            expanded.sort_by(|a, b| row_key(a, key).cmp(&row_key(b, key)));
        }
        (None, _) => {}
    }

    let rows = expanded.into_iter().map(Dynamic::Map).collect();
    Ok(if table.ordered {
        Dynamic::List(rows)
    } else {
        Dynamic::Set(rows)
    })
}

/// Check that a table translates names one to one, nested tables included
pub fn check_translation(fields: &[FieldSpec]) -> std::result::Result<(), String> {
    for (i, field) in fields.iter().enumerate() {
        for other in &fields[i + 1..] {
            if field.name == other.name {
                return Err(format!("declarative name {} is used twice", field.name));
            }
            if field.remote == other.remote {
                return Err(format!("remote name {} is used twice", field.remote));
            }
        }
        if let FieldKind::Table(table) = field.kind {
            if let Some(key) = table.key {
                if !table.fields.iter().any(|f| f.name == key) {
                    return Err(format!("{} is keyed by missing field {}", field.name, key));
                }
            }
            check_translation(table.fields)?;
        }
    }
    Ok(())
}
