//! Create/Read/Update for resources stored as a raw text body
//!
//! Zone files and TrafficScript rules have no properties document; the whole
//! object is one attribute sent as `application/octet-stream`.

use tfplug::resource::{
    CreateResourceRequest, CreateResourceResponse, ReadResourceRequest, ReadResourceResponse,
    UpdateResourceRequest, UpdateResourceResponse,
};
use tfplug::schema::Schema;
use tfplug::types::{has_errors, AttributePath, Diagnostic, Dynamic, DynamicValue};
use tfplug::TfplugError;

use super::lifecycle::{prepare, remote_error, resource_name};
use crate::api::ConfigApi;

pub struct TextLayout {
    pub type_name: &'static str,
    pub api_path: &'static str,
    /// Attribute holding the body
    pub attribute: &'static str,
    pub encode: fn(&Dynamic) -> Result<String, TfplugError>,
    pub decode: fn(&str) -> Dynamic,
}

fn body_of(layout: &TextLayout, state: &DynamicValue) -> Result<String, Diagnostic> {
    let value = state
        .get(&AttributePath::new(layout.attribute))
        .unwrap_or(&Dynamic::Null);
    (layout.encode)(value).map_err(|e| {
        Diagnostic::error(format!("Invalid {}", layout.attribute), e.to_string())
            .with_attribute(AttributePath::new(layout.attribute))
    })
}

fn with_body(layout: &TextLayout, name: &str, body: &str, prior: &DynamicValue) -> DynamicValue {
    let mut state = prior.clone();
    if !matches!(state.value, Dynamic::Map(_)) {
        state = DynamicValue::object();
    }
    if let Dynamic::Map(root) = &mut state.value {
        root.insert("name".to_string(), Dynamic::String(name.to_string()));
        root.insert(layout.attribute.to_string(), (layout.decode)(body));
    }
    state
}

async fn write_and_read(
    api: &dyn ConfigApi,
    layout: &TextLayout,
    op: &str,
    name: &str,
    body: &str,
    written: &DynamicValue,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<DynamicValue> {
    tracing::info!(op, "Writing {} '{}' ({} bytes)", layout.type_name, name, body.len());
    if let Err(e) = api.put_text(layout.api_path, name, body).await {
        diagnostics.push(remote_error(op, layout.type_name, name, &e));
        return None;
    }
    match api.get_text(layout.api_path, name).await {
        Ok(stored) => Some(with_body(layout, name, &stored, written)),
        Err(e) => {
            diagnostics.push(remote_error("read", layout.type_name, name, &e));
            Some(written.clone())
        }
    }
}

pub async fn create(
    api: &dyn ConfigApi,
    layout: &TextLayout,
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

    let Some(name) = resource_name(&planned) else {
        diagnostics.push(
            Diagnostic::from(TfplugError::RequiredFieldNotSet("name".to_string()))
                .with_attribute(AttributePath::new("name")),
        );
        return CreateResourceResponse {
            new_state: planned,
            diagnostics,
        };
    };

    let body = match body_of(layout, &planned) {
        Ok(body) => body,
        Err(diagnostic) => {
            diagnostics.push(diagnostic);
            return CreateResourceResponse {
                new_state: planned,
                diagnostics,
            };
        }
    };

    let new_state = write_and_read(api, layout, "create", &name, &body, &planned, &mut diagnostics)
        .await
        .unwrap_or(planned);
    CreateResourceResponse {
        new_state,
        diagnostics,
    }
}

pub async fn read(
    api: &dyn ConfigApi,
    layout: &TextLayout,
    request: ReadResourceRequest,
) -> ReadResourceResponse {
    let Some(name) = resource_name(&request.current_state) else {
        return ReadResourceResponse {
            new_state: Some(request.current_state),
            diagnostics: vec![Diagnostic::error(
                format!("Failed to read {}", layout.type_name),
                "State has no name",
            )],
        };
    };

    match api.get_text(layout.api_path, &name).await {
        Ok(body) => ReadResourceResponse {
            new_state: Some(with_body(layout, &name, &body, &request.current_state)),
            diagnostics: vec![],
        },
        Err(e) if e.is_not_found() => {
            tracing::info!(
                "{} '{}' no longer exists, clearing it from state",
                layout.type_name,
                name
            );
            ReadResourceResponse {
                new_state: None,
                diagnostics: vec![],
            }
        }
        Err(e) => ReadResourceResponse {
            new_state: Some(request.current_state),
            diagnostics: vec![remote_error("read", layout.type_name, &name, &e)],
        },
    }
}

pub async fn update(
    api: &dyn ConfigApi,
    layout: &TextLayout,
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

    if !request.changes.has_change(layout.attribute) {
        tracing::debug!("{} body unchanged, skipping update", layout.type_name);
        return UpdateResourceResponse {
            new_state: planned,
            diagnostics,
        };
    }

    let Some(name) = resource_name(&request.prior_state).or_else(|| resource_name(&planned))
    else {
        diagnostics.push(Diagnostic::error(
            format!("Failed to update {}", layout.type_name),
            "State has no name",
        ));
        return UpdateResourceResponse {
            new_state: request.prior_state,
            diagnostics,
        };
    };

    let body = match body_of(layout, &planned) {
        Ok(body) => body,
        Err(diagnostic) => {
            diagnostics.push(diagnostic);
            return UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics,
            };
        }
    };

    match write_and_read(api, layout, "update", &name, &body, &planned, &mut diagnostics).await {
        Some(new_state) => UpdateResourceResponse {
            new_state,
            diagnostics,
        },
        None => UpdateResourceResponse {
            new_state: request.prior_state,
            diagnostics,
        },
    }
}
