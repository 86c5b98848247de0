//! Schema attributes derived from section tables
//!
//! Resources with long, regular field lists declare each field once in a
//! `SectionSpec` and build their schema from it. `Customize` receives the
//! dotted path of every attribute (`ssl.ocsp_issuers.nonce`) and attaches
//! validators, defaults and descriptions.

use tfplug::schema::{
    Attribute, AttributeBuilder, AttributeType, NestedBlock, NestedBlockBuilder, NestingMode,
};

use crate::util::{FieldKind, FieldSpec, SectionSpec};

pub type Customize = fn(&str, AttributeBuilder) -> AttributeBuilder;

pub fn attribute_type(kind: FieldKind) -> Option<AttributeType> {
    match kind {
        FieldKind::String => Some(AttributeType::String),
        FieldKind::Bool => Some(AttributeType::Bool),
        FieldKind::Int => Some(AttributeType::Number),
        FieldKind::StringList => Some(AttributeType::list_of_strings()),
        FieldKind::StringSet => Some(AttributeType::set_of_strings()),
        FieldKind::Table(_) => None,
    }
}

fn join(prefix: Option<&str>, name: &str) -> String {
    match prefix {
        Some(p) => format!("{}.{}", p, name),
        None => name.to_string(),
    }
}

/// Attributes and table blocks for `fields`
///
/// Read-only fields become computed attributes; the key of a table is
/// required in every row.
pub fn field_schema(
    prefix: Option<&str>,
    fields: &[FieldSpec],
    key: Option<&str>,
    customize: Customize,
) -> (Vec<Attribute>, Vec<NestedBlock>) {
    let mut attributes = Vec::new();
    let mut blocks = Vec::new();

    for field in fields {
        let path = join(prefix, field.name);
        match (field.kind, attribute_type(field.kind)) {
            (FieldKind::Table(table), _) => {
                let nesting = if table.ordered {
                    NestingMode::List
                } else {
                    NestingMode::Set
                };
                let (inner_attrs, inner_blocks) =
                    field_schema(Some(&path), table.fields, table.key, customize);
                let mut builder = NestedBlockBuilder::new(field.name, nesting);
                for attr in inner_attrs {
                    builder = builder.attribute(attr);
                }
                for block in inner_blocks {
                    builder = builder.block(block);
                }
                blocks.push(builder.build());
            }
            (_, Some(r#type)) => {
                let builder = AttributeBuilder::new(field.name, r#type);
                let builder = if key == Some(field.name) {
                    builder.required()
                } else if field.read_only {
                    builder.computed()
                } else {
                    builder.optional()
                };
                attributes.push(customize(&path, builder).build());
            }
            (_, None) => {}
        }
    }

    (attributes, blocks)
}

/// Single-instance block for a section that lives under its own block name
pub fn section_block(section: &SectionSpec, customize: Customize) -> Option<NestedBlock> {
    let block = section.block?;
    let (attributes, blocks) = field_schema(Some(block), section.fields, None, customize);
    let mut builder = NestedBlockBuilder::single(block);
    for attr in attributes {
        builder = builder.attribute(attr);
    }
    for nested in blocks {
        builder = builder.block(nested);
    }
    Some(builder.build())
}
