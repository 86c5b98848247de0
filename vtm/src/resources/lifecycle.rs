//! Create/Read/Update/Delete for resources stored as properties documents
//!
//! A resource describes itself with a `ResourceLayout`; the functions here do
//! the rest. Identity is always the `name` attribute.

use serde_json::Value;
use std::collections::HashMap;
use tfplug::resource::{
    CreateResourceRequest, CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ReadResourceRequest, ReadResourceResponse, UpdateResourceRequest, UpdateResourceResponse,
};
use tfplug::schema::Schema;
use tfplug::types::{has_errors, AttributePath, Diagnostic, Dynamic, DynamicValue};
use tfplug::TfplugError;

use crate::api::common::section;
use crate::api::{ApiError, ConfigApi};
use crate::util::{build_create_payload, build_update_payload, expand_block, SectionSpec};

pub struct ResourceLayout {
    pub type_name: &'static str,
    /// Collection path under `config/active`
    pub api_path: &'static str,
    pub sections: &'static [&'static SectionSpec],
}

pub fn not_configured() -> Diagnostic {
    Diagnostic::error(
        "Provider not configured",
        "Provider data was not properly configured",
    )
}

pub fn resource_name(state: &DynamicValue) -> Option<String> {
    state
        .get_string(&AttributePath::new("name"))
        .ok()
        .filter(|n| !n.is_empty())
}

pub fn remote_error(op: &str, type_name: &str, name: &str, err: &ApiError) -> Diagnostic {
    Diagnostic::error(
        format!("Failed to {} {}", op, type_name),
        format!("{} '{}': {}", type_name, name, err),
    )
}

fn conversion_error(op: &str, type_name: &str, name: &str, err: &TfplugError) -> Diagnostic {
    Diagnostic::error(
        format!("Failed to {} {}", op, type_name),
        format!("{} '{}': {}", type_name, name, err),
    )
}

/// Apply schema defaults and collect every validation error
pub fn prepare(schema: &Schema, mut config: DynamicValue) -> (DynamicValue, Vec<Diagnostic>) {
    if let Dynamic::Map(values) = &mut config.value {
        schema.block.apply_defaults(values);
    }
    let diagnostics = schema.block.validate(&config);
    (config, diagnostics)
}

/// Declarative state from a fetched document
///
/// Fields the remote omits keep their value from `prior`.
pub fn expand_document(
    document: &Value,
    layout: &ResourceLayout,
    name: &str,
    prior: &DynamicValue,
) -> Result<DynamicValue, TfplugError> {
    let empty = HashMap::new();
    let prior_root = prior.root_map().unwrap_or(&empty);

    let mut state = prior_root.clone();
    for spec in layout.sections {
        let values = expand_block(section(document, spec.remote), spec, prior_root)?;
        state.extend(values);
    }
    state.insert("name".to_string(), Dynamic::String(name.to_string()));
    Ok(DynamicValue::from_map(state))
}

/// Fetch and expand; `Ok(None)` when the object does not exist
pub async fn read_state(
    api: &dyn ConfigApi,
    layout: &ResourceLayout,
    name: &str,
    prior: &DynamicValue,
) -> Result<Option<DynamicValue>, Diagnostic> {
    match api.get(layout.api_path, name).await {
        Ok(document) => expand_document(&document, layout, name, prior)
            .map(Some)
            .map_err(|e| conversion_error("read", layout.type_name, name, &e)),
        Err(e) if e.is_not_found() => {
            tracing::info!(
                "{} '{}' no longer exists, clearing it from state",
                layout.type_name,
                name
            );
            Ok(None)
        }
        Err(e) => Err(remote_error("read", layout.type_name, name, &e)),
    }
}

pub async fn create(
    api: &dyn ConfigApi,
    layout: &ResourceLayout,
    schema: &Schema,
    request: CreateResourceRequest,
) -> CreateResourceResponse {
    let (planned, mut diagnostics) = prepare(schema, request.planned_state);
    if has_errors(&diagnostics) {
        return CreateResourceResponse {
            new_state: planned,
            diagnostics,
        };
    }

    let name = match resource_name(&planned) {
        Some(name) => name,
        None => {
            diagnostics.push(
                Diagnostic::from(TfplugError::RequiredFieldNotSet("name".to_string()))
                    .with_attribute(AttributePath::new("name")),
            );
            return CreateResourceResponse {
                new_state: planned,
                diagnostics,
            };
        }
    };

    let payload = match build_create_payload(&planned, layout.sections) {
        Ok(payload) => payload,
        Err(e) => {
            diagnostics.push(conversion_error("create", layout.type_name, &name, &e));
            return CreateResourceResponse {
                new_state: planned,
                diagnostics,
            };
        }
    };

    tracing::info!("Creating {} '{}'", layout.type_name, name);
    if let Err(e) = api.create(layout.api_path, &name, &payload).await {
        diagnostics.push(remote_error("create", layout.type_name, &name, &e));
        return CreateResourceResponse {
            new_state: planned,
            diagnostics,
        };
    }

    let new_state = finish_with_read(api, layout, &name, planned, &mut diagnostics).await;
    CreateResourceResponse {
        new_state,
        diagnostics,
    }
}

pub async fn read(
    api: &dyn ConfigApi,
    layout: &ResourceLayout,
    request: ReadResourceRequest,
) -> ReadResourceResponse {
    let name = match resource_name(&request.current_state) {
        Some(name) => name,
        None => {
            return ReadResourceResponse {
                new_state: Some(request.current_state),
                diagnostics: vec![Diagnostic::error(
                    format!("Failed to read {}", layout.type_name),
                    "State has no name",
                )],
            }
        }
    };

    tracing::debug!("Reading {} '{}'", layout.type_name, name);
    match read_state(api, layout, &name, &request.current_state).await {
        Ok(new_state) => ReadResourceResponse {
            new_state,
            diagnostics: vec![],
        },
        Err(diagnostic) => ReadResourceResponse {
            new_state: Some(request.current_state),
            diagnostics: vec![diagnostic],
        },
    }
}

pub async fn update(
    api: &dyn ConfigApi,
    layout: &ResourceLayout,
    schema: &Schema,
    request: UpdateResourceRequest,
) -> UpdateResourceResponse {
    let (planned, mut diagnostics) = prepare(schema, request.planned_state);
    if has_errors(&diagnostics) {
        return UpdateResourceResponse {
            new_state: request.prior_state,
            diagnostics,
        };
    }

    let name = match resource_name(&request.prior_state).or_else(|| resource_name(&planned)) {
        Some(name) => name,
        None => {
            diagnostics.push(Diagnostic::error(
                format!("Failed to update {}", layout.type_name),
                "State has no name",
            ));
            return UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics,
            };
        }
    };

    let payload = match build_update_payload(&planned, layout.sections, &request.changes) {
        Ok(Some(payload)) => payload,
        Ok(None) => {
            tracing::debug!(
                "No changes for {} '{}', skipping update",
                layout.type_name,
                name
            );
            return UpdateResourceResponse {
                new_state: planned,
                diagnostics,
            };
        }
        Err(e) => {
            diagnostics.push(conversion_error("update", layout.type_name, &name, &e));
            return UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics,
            };
        }
    };

    tracing::info!("Updating {} '{}'", layout.type_name, name);
    if let Err(e) = api.update(layout.api_path, &name, &payload).await {
        diagnostics.push(remote_error("update", layout.type_name, &name, &e));
        return UpdateResourceResponse {
            new_state: request.prior_state,
            diagnostics,
        };
    }

    let new_state = finish_with_read(api, layout, &name, planned, &mut diagnostics).await;
    UpdateResourceResponse {
        new_state,
        diagnostics,
    }
}

pub async fn delete(
    api: &dyn ConfigApi,
    type_name: &str,
    api_path: &str,
    request: DeleteResourceRequest,
) -> DeleteResourceResponse {
    let name = match resource_name(&request.prior_state) {
        Some(name) => name,
        None => {
            return DeleteResourceResponse {
                diagnostics: vec![Diagnostic::error(
                    format!("Failed to delete {}", type_name),
                    "State has no name",
                )],
            }
        }
    };

    tracing::info!("Deleting {} '{}'", type_name, name);
    let diagnostics = match api.delete(api_path, &name).await {
        Ok(()) => vec![],
        Err(e) if e.is_not_found() => {
            tracing::debug!("{} '{}' was already deleted", type_name, name);
            vec![]
        }
        Err(e) => vec![remote_error("delete", type_name, &name, &e)],
    };
    DeleteResourceResponse { diagnostics }
}

/// Read back after a write; the written config is the prior for omitted fields
async fn finish_with_read(
    api: &dyn ConfigApi,
    layout: &ResourceLayout,
    name: &str,
    written: DynamicValue,
    diagnostics: &mut Vec<Diagnostic>,
) -> DynamicValue {
    match read_state(api, layout, name, &written).await {
        Ok(Some(state)) => state,
        Ok(None) => {
            diagnostics.push(Diagnostic::error(
                format!("Failed to read {}", layout.type_name),
                format!(
                    "{} '{}' was not found right after it was written",
                    layout.type_name, name
                ),
            ));
            written
        }
        Err(diagnostic) => {
            diagnostics.push(diagnostic);
            written
        }
    }
}
