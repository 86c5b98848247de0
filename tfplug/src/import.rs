//! Import helpers for simplifying resource import implementations

use crate::resource::{ImportResourceStateRequest, ImportResourceStateResponse, ImportedResource};
use crate::types::{AttributePath, Diagnostic, DynamicValue};

/// Sets the import ID to a specific attribute in state
///
/// This is useful for resources whose identity is a single attribute; the
/// engine follows up with a read that fills in everything else.
///
/// Example: ID "web-vs" -> state.name = "web-vs"
pub fn import_state_passthrough_id(
    attr_path: AttributePath,
    request: &ImportResourceStateRequest,
) -> ImportResourceStateResponse {
    let mut response = ImportResourceStateResponse {
        imported_resources: Vec::new(),
        diagnostics: Vec::new(),
    };

    if request.id.is_empty() {
        response.diagnostics.push(
            Diagnostic::error(
                "Missing import ID",
                format!("An ID is required to import {}", request.type_name),
            )
            .with_attribute(attr_path),
        );
        return response;
    }

    let mut state = DynamicValue::object();
    if let Err(e) = state.set_string(&attr_path, request.id.clone()) {
        response.diagnostics.push(
            Diagnostic::error(
                format!("Failed to set import ID: {}", e),
                format!(
                    "Could not set attribute '{}' to value '{}'",
                    attr_path, request.id
                ),
            )
            .with_attribute(attr_path),
        );
        return response;
    }

    response.imported_resources.push(ImportedResource {
        type_name: request.type_name.clone(),
        state,
    });
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_sets_identity_attribute() {
        let request = ImportResourceStateRequest {
            type_name: "vtm_rule".to_string(),
            id: "redirect".to_string(),
        };
        let response = import_state_passthrough_id(AttributePath::new("name"), &request);

        assert!(response.diagnostics.is_empty());
        assert_eq!(response.imported_resources.len(), 1);
        assert_eq!(
            response.imported_resources[0]
                .state
                .get_string(&AttributePath::new("name"))
                .unwrap(),
            "redirect"
        );
    }

    #[test]
    fn empty_id_is_rejected() {
        let request = ImportResourceStateRequest {
            type_name: "vtm_rule".to_string(),
            id: String::new(),
        };
        let response = import_state_passthrough_id(AttributePath::new("name"), &request);
        assert!(response.imported_resources.is_empty());
        assert_eq!(response.diagnostics[0].summary, "Missing import ID");
    }
}
