//! Schemas: attribute and block declarations with their builders
//!
//! A schema also applies its defaults and validates configuration against
//! itself, so resources never hand-roll either.

use crate::changeset::ChangeSet;
use crate::error::TfplugError;
use crate::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use std::collections::HashMap;
use std::sync::Arc;

/// Value type of an attribute
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    String,
    Number, // Always f64
    Bool,
    List(Box<AttributeType>),               // Ordered, allows duplicates
    Set(Box<AttributeType>),                // Unordered, no duplicates
    Map(Box<AttributeType>),                // String keys only
    Object(HashMap<String, AttributeType>), // Fixed structure
}

impl AttributeType {
    pub fn list_of_strings() -> Self {
        AttributeType::List(Box::new(AttributeType::String))
    }

    pub fn set_of_strings() -> Self {
        AttributeType::Set(Box::new(AttributeType::String))
    }

    /// Shallow shape check of a known value against this type
    pub fn accepts(&self, value: &Dynamic) -> bool {
        match (self, value) {
            (_, Dynamic::Null) | (_, Dynamic::Unknown) => true,
            (AttributeType::String, Dynamic::String(_)) => true,
            (AttributeType::Number, Dynamic::Number(_)) => true,
            (AttributeType::Bool, Dynamic::Bool(_)) => true,
            (AttributeType::List(inner), Dynamic::List(items))
            | (AttributeType::Set(inner), Dynamic::Set(items))
            | (AttributeType::Set(inner), Dynamic::List(items)) => {
                items.iter().all(|item| inner.accepts(item))
            }
            (AttributeType::Map(inner), Dynamic::Map(entries)) => {
                entries.values().all(|item| inner.accepts(item))
            }
            (AttributeType::Object(fields), Dynamic::Map(entries)) => entries
                .iter()
                .all(|(k, v)| fields.get(k).is_some_and(|t| t.accepts(v))),
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Schema {
    /// Bumped when the state layout changes
    pub version: i64,
    pub block: Block,
}

#[derive(Debug, Clone)]
pub struct Block {
    pub attributes: Vec<Attribute>,
    pub block_types: Vec<NestedBlock>,
    pub description: String,
    pub deprecated: bool,
}

#[derive(Clone)]
pub struct Attribute {
    pub name: String,
    pub r#type: AttributeType,
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    /// Changing the value forces the resource to be recreated
    pub requires_replace: bool,
    pub validators: Vec<Arc<dyn Validator>>,
    pub default: Option<Dynamic>,
}

// Manual Debug implementation since validators don't implement Debug
impl std::fmt::Debug for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("type", &self.r#type)
            .field("required", &self.required)
            .field("optional", &self.optional)
            .field("computed", &self.computed)
            .field("sensitive", &self.sensitive)
            .field("requires_replace", &self.requires_replace)
            .field(
                "validators",
                &format!("{} validators", self.validators.len()),
            )
            .field("default", &self.default)
            .finish()
    }
}

/// A block type declared inside another block
#[derive(Debug, Clone)]
pub struct NestedBlock {
    pub type_name: String,
    pub block: Block,
    pub nesting: NestingMode,
    pub min_items: i64,
    pub max_items: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NestingMode {
    Invalid,
    Single,
    List,
    Set,
    Map,
    Group,
}

/// Check run against one configured attribute value before any remote call
pub trait Validator: Send + Sync {
    fn description(&self) -> String;
    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse;
}

pub struct ValidatorRequest {
    pub config_value: DynamicValue,
    pub path: AttributePath,
}

#[derive(Default)]
pub struct ValidatorResponse {
    pub diagnostics: Vec<Diagnostic>,
}

impl Block {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn nested_block(&self, name: &str) -> Option<&NestedBlock> {
        self.block_types.iter().find(|b| b.type_name == name)
    }

    /// Fill unset optional attributes with their defaults, including inside
    /// every instance of every nested block
    pub fn apply_defaults(&self, values: &mut HashMap<String, Dynamic>) {
        for attr in &self.attributes {
            if let Some(default) = &attr.default {
                let unset = values.get(&attr.name).map_or(true, |v| matches!(v, Dynamic::Null));
                if unset {
                    values.insert(attr.name.clone(), default.clone());
                }
            }
        }

        for nested in &self.block_types {
            match values.get_mut(&nested.type_name) {
                Some(Dynamic::List(items)) | Some(Dynamic::Set(items)) => {
                    for item in items.iter_mut() {
                        if let Dynamic::Map(inner) = item {
                            nested.block.apply_defaults(inner);
                        }
                    }
                }
                Some(Dynamic::Map(inner)) => nested.block.apply_defaults(inner),
                _ => {}
            }
        }
    }

    /// Collect every violation in the configuration rather than stopping at
    /// the first one
    pub fn validate(&self, config: &DynamicValue) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let empty = HashMap::new();
        let root = config.root_map().unwrap_or(&empty);
        self.validate_map(root, &AttributePath::root(), &mut diagnostics);
        diagnostics
    }

    fn validate_map(
        &self,
        values: &HashMap<String, Dynamic>,
        prefix: &AttributePath,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        for attr in &self.attributes {
            let path = prefix.clone().attribute(&attr.name);
            let value = values.get(&attr.name).unwrap_or(&Dynamic::Null);

            if matches!(value, Dynamic::Null) {
                if attr.required {
                    diagnostics.push(required_diagnostic(&attr.name, path));
                }
                continue;
            }
            if matches!(value, Dynamic::Unknown) {
                continue;
            }
            if !attr.r#type.accepts(value) {
                diagnostics.push(
                    Diagnostic::error(
                        format!("Invalid value for {}", path),
                        TfplugError::type_mismatch(
                            format!("{:?}", attr.r#type).to_lowercase(),
                            value.type_name(),
                        )
                        .to_string(),
                    )
                    .with_attribute(path),
                );
                continue;
            }

            for validator in &attr.validators {
                let response = validator.validate(ValidatorRequest {
                    config_value: DynamicValue::new(value.clone()),
                    path: path.clone(),
                });
                diagnostics.extend(response.diagnostics);
            }
        }

        for nested in &self.block_types {
            let path = prefix.clone().attribute(&nested.type_name);
            let items: &[Dynamic] = match values.get(&nested.type_name) {
                Some(Dynamic::List(items)) | Some(Dynamic::Set(items)) => items,
                Some(single @ Dynamic::Map(_)) => std::slice::from_ref(single),
                _ => &[],
            };

            if items.is_empty() && nested.min_items > 0 {
                diagnostics.push(required_diagnostic(&nested.type_name, path.clone()));
            }
            if nested.max_items > 0 && items.len() as i64 > nested.max_items {
                diagnostics.push(
                    Diagnostic::error(
                        format!("Too many {} blocks", nested.type_name),
                        format!(
                            "No more than {} \"{}\" blocks are allowed",
                            nested.max_items, nested.type_name
                        ),
                    )
                    .with_attribute(path.clone()),
                );
            }

            for (idx, item) in items.iter().enumerate() {
                if let Dynamic::Map(inner) = item {
                    nested
                        .block
                        .validate_map(inner, &path.clone().index(idx as i64), diagnostics);
                }
            }
        }
    }

    /// Changed attributes that can only be applied by recreating the resource
    pub fn requires_replace(&self, changes: &ChangeSet) -> Vec<AttributePath> {
        self.attributes
            .iter()
            .filter(|a| a.requires_replace && changes.has_change(&a.name))
            .map(|a| AttributePath::new(&a.name))
            .collect()
    }
}

fn required_diagnostic(name: &str, path: AttributePath) -> Diagnostic {
    Diagnostic::error(
        TfplugError::RequiredFieldNotSet(name.to_string()).to_string(),
        format!("The argument \"{}\" is required, but no definition was found.", path),
    )
    .with_attribute(path)
}

pub struct AttributeBuilder {
    attribute: Attribute,
}

impl AttributeBuilder {
    pub fn new(name: &str, type_: AttributeType) -> Self {
        Self {
            attribute: Attribute {
                name: name.to_string(),
                r#type: type_,
                description: String::new(),
                required: false,
                optional: false,
                computed: false,
                sensitive: false,
                requires_replace: false,
                validators: Vec::new(),
                default: None,
            },
        }
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.attribute.description = desc.to_string();
        self
    }

    pub fn required(mut self) -> Self {
        self.attribute.required = true;
        self.attribute.optional = false;
        self
    }

    pub fn optional(mut self) -> Self {
        self.attribute.optional = true;
        self.attribute.required = false;
        self
    }

    pub fn computed(mut self) -> Self {
        self.attribute.computed = true;
        self
    }

    /// Redacted in plan output
    pub fn sensitive(mut self) -> Self {
        self.attribute.sensitive = true;
        self
    }

    /// Changing this attribute forces a new resource
    pub fn requires_replace(mut self) -> Self {
        self.attribute.requires_replace = true;
        self
    }

    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.attribute.validators.push(Arc::new(validator));
        self
    }

    pub fn default(mut self, value: Dynamic) -> Self {
        self.attribute.default = Some(value);
        self
    }

    pub fn default_string(self, value: &str) -> Self {
        self.default(Dynamic::String(value.to_string()))
    }

    pub fn default_number(self, value: f64) -> Self {
        self.default(Dynamic::Number(value))
    }

    pub fn default_bool(self, value: bool) -> Self {
        self.default(Dynamic::Bool(value))
    }

    pub fn build(self) -> Attribute {
        self.attribute
    }
}

/// NestedBlockBuilder provides fluent API for nested blocks
pub struct NestedBlockBuilder {
    nested: NestedBlock,
}

impl NestedBlockBuilder {
    pub fn new(type_name: &str, nesting: NestingMode) -> Self {
        Self {
            nested: NestedBlock {
                type_name: type_name.to_string(),
                block: Block {
                    attributes: Vec::new(),
                    block_types: Vec::new(),
                    description: String::new(),
                    deprecated: false,
                },
                nesting,
                min_items: 0,
                max_items: 0,
            },
        }
    }

    /// A list block holding at most one instance
    pub fn single(type_name: &str) -> Self {
        Self::new(type_name, NestingMode::List).max_items(1)
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.nested.block.description = desc.to_string();
        self
    }

    pub fn min_items(mut self, min: i64) -> Self {
        self.nested.min_items = min;
        self
    }

    pub fn max_items(mut self, max: i64) -> Self {
        self.nested.max_items = max;
        self
    }

    pub fn attribute(mut self, attr: Attribute) -> Self {
        self.nested.block.attributes.push(attr);
        self
    }

    pub fn block(mut self, block: NestedBlock) -> Self {
        self.nested.block.block_types.push(block);
        self
    }

    pub fn build(self) -> NestedBlock {
        self.nested
    }
}

pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self {
            schema: Schema {
                version: 0,
                block: Block {
                    attributes: Vec::new(),
                    block_types: Vec::new(),
                    description: String::new(),
                    deprecated: false,
                },
            },
        }
    }

    pub fn version(mut self, version: i64) -> Self {
        self.schema.version = version;
        self
    }

    pub fn attribute(mut self, attr: Attribute) -> Self {
        self.schema.block.attributes.push(attr);
        self
    }

    pub fn block(mut self, block: NestedBlock) -> Self {
        self.schema.block.block_types.push(block);
        self
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.schema.block.description = desc.to_string();
        self
    }

    pub fn build(self) -> Schema {
        self.schema
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}
