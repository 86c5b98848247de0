//! Mapping between declarative attribute values and remote documents

pub mod changes;
pub mod convert;
pub mod section;

pub use changes::{build_create_payload, build_update_payload};
pub use convert::to_string_array;
pub use section::{
    expand_block, expand_from_remote, flatten_block, flatten_to_remote, FieldKind, FieldSpec,
    Granularity, SectionSpec, TableSpec,
};
