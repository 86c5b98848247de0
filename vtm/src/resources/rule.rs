//! TrafficScript rule resource
//!
//! The rule body is declared as a list of lines and stored as one text
//! document.

use async_trait::async_trait;
use tfplug::import_state_passthrough_id;
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceMetadataRequest, ResourceMetadataResponse,
    ResourceSchemaRequest, ResourceSchemaResponse, ResourceWithConfigure,
    ResourceWithImportState, UpdateResourceRequest, UpdateResourceResponse,
    ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{AttributePath, Dynamic};
use tfplug::TfplugError;

use super::lifecycle;
use super::text::{self, TextLayout};
use crate::provider_data::{configure_resource, VtmProviderData};
use crate::util::to_string_array;

pub const TYPE_NAME: &str = "vtm_rule";

fn join_lines(value: &Dynamic) -> Result<String, TfplugError> {
    Ok(to_string_array(value)?.join("\n"))
}

fn split_lines(body: &str) -> Dynamic {
    Dynamic::List(
        body.lines()
            .map(|line| Dynamic::String(line.to_string()))
            .collect(),
    )
}

pub static LAYOUT: TextLayout = TextLayout {
    type_name: TYPE_NAME,
    api_path: "rules",
    attribute: "rule",
    encode: join_lines,
    decode: split_lines,
};

#[derive(Default)]
pub struct RuleResource {
    provider_data: Option<VtmProviderData>,
}

impl RuleResource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema_static() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Manages a TrafficScript rule")
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Name of the rule")
                    .required()
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("rule", AttributeType::list_of_strings())
                    .description("The TrafficScript source, one element per line")
                    .required()
                    .build(),
            )
            .build()
    }
}

#[async_trait]
impl Resource for RuleResource {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    async fn metadata(&self, _request: ResourceMetadataRequest) -> ResourceMetadataResponse {
        ResourceMetadataResponse {
            type_name: self.type_name().to_string(),
        }
    }

    async fn schema(&self, _request: ResourceSchemaRequest) -> ResourceSchemaResponse {
        ResourceSchemaResponse {
            schema: Self::schema_static(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        let (_, diagnostics) = lifecycle::prepare(&Self::schema_static(), request.config);
        ValidateResourceConfigResponse { diagnostics }
    }

    async fn create(&self, request: CreateResourceRequest) -> CreateResourceResponse {
        match &self.provider_data {
            Some(data) => {
                text::create(data.client.as_ref(), &LAYOUT, &Self::schema_static(), request).await
            }
            None => CreateResourceResponse {
                new_state: request.planned_state,
                diagnostics: vec![lifecycle::not_configured()],
            },
        }
    }

    async fn read(&self, request: ReadResourceRequest) -> ReadResourceResponse {
        match &self.provider_data {
            Some(data) => text::read(data.client.as_ref(), &LAYOUT, request).await,
            None => ReadResourceResponse {
                new_state: Some(request.current_state),
                diagnostics: vec![lifecycle::not_configured()],
            },
        }
    }

    async fn update(&self, request: UpdateResourceRequest) -> UpdateResourceResponse {
        match &self.provider_data {
            Some(data) => {
                text::update(data.client.as_ref(), &LAYOUT, &Self::schema_static(), request).await
            }
            None => UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics: vec![lifecycle::not_configured()],
            },
        }
    }

    async fn delete(&self, request: DeleteResourceRequest) -> DeleteResourceResponse {
        match &self.provider_data {
            Some(data) => {
                lifecycle::delete(data.client.as_ref(), TYPE_NAME, LAYOUT.api_path, request).await
            }
            None => DeleteResourceResponse {
                diagnostics: vec![lifecycle::not_configured()],
            },
        }
    }
}

#[async_trait]
impl ResourceWithConfigure for RuleResource {
    async fn configure(&mut self, request: ConfigureResourceRequest) -> ConfigureResourceResponse {
        configure_resource(TYPE_NAME, request, &mut self.provider_data)
    }
}

#[async_trait]
impl ResourceWithImportState for RuleResource {
    async fn import_state(
        &self,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        import_state_passthrough_id(AttributePath::new("name"), &request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_helpers::{configure, dynamic, Method, RecordingApi};
    use serde_json::json;
    use std::sync::Arc;
    use tfplug::types::{has_errors, ClientCapabilities};

    fn rule(ip: &str) -> tfplug::DynamicValue {
        dynamic(json!({
            "name": "block-ip",
            "rule": [
                format!("if( string.ipmaskmatch( request.getremoteip(), \"{}\" ) ){{", ip),
                "\tconnection.discard();",
                "}"
            ]
        }))
    }

    async fn resource_with(api: Arc<RecordingApi>) -> RuleResource {
        let mut resource = RuleResource::new();
        configure(&mut resource, api).await;
        resource
    }

    #[tokio::test]
    async fn lines_are_joined_and_split_back() {
        let api = Arc::new(RecordingApi::new());
        let resource = resource_with(api.clone()).await;

        let planned = rule("10.1.11.13");
        let response = resource
            .create(CreateResourceRequest {
                type_name: TYPE_NAME.to_string(),
                planned_state: planned.clone(),
                config: planned,
            })
            .await;
        assert!(response.diagnostics.is_empty());

        let body = api.text("rules", "block-ip").unwrap();
        assert_eq!(body.lines().count(), 3);
        assert!(body.starts_with("if( string.ipmaskmatch"));
        assert!(body.ends_with("\tconnection.discard();\n}"));

        let lines = response.new_state.get_list(&AttributePath::new("rule")).unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], Dynamic::String("\tconnection.discard();".to_string()));
    }

    #[tokio::test]
    async fn update_rewrites_the_body() {
        let api = Arc::new(RecordingApi::new());
        let resource = resource_with(api.clone()).await;
        let prior = rule("10.1.11.13");
        api.seed_text("rules", "block-ip", &join_lines(&prior.value.as_map().unwrap()["rule"]).unwrap());

        let response = resource
            .update(UpdateResourceRequest::from_states(
                TYPE_NAME,
                prior,
                rule("192.168.11.13"),
            ))
            .await;
        assert!(response.diagnostics.is_empty());
        assert!(api
            .text("rules", "block-ip")
            .unwrap()
            .contains("192.168.11.13"));
    }

    #[tokio::test]
    async fn unchanged_body_is_not_sent() {
        let api = Arc::new(RecordingApi::new());
        let resource = resource_with(api.clone()).await;

        let response = resource
            .update(UpdateResourceRequest::from_states(
                TYPE_NAME,
                rule("10.1.11.13"),
                rule("10.1.11.13"),
            ))
            .await;
        assert!(response.diagnostics.is_empty());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn rule_without_name_is_rejected_locally() {
        let api = Arc::new(RecordingApi::new());
        let resource = resource_with(api.clone()).await;
        let planned = dynamic(json!({"rule": ["}"]}));

        let response = resource
            .create(CreateResourceRequest {
                type_name: TYPE_NAME.to_string(),
                planned_state: planned.clone(),
                config: planned,
            })
            .await;
        assert!(has_errors(&response.diagnostics));
        assert_eq!(api.count(Method::PutText), 0);
    }

    #[tokio::test]
    async fn vanished_rule_is_dropped_from_state() {
        let api = Arc::new(RecordingApi::new());
        let resource = resource_with(api).await;
        let response = resource
            .read(ReadResourceRequest {
                type_name: TYPE_NAME.to_string(),
                current_state: rule("10.1.11.13"),
                client_capabilities: ClientCapabilities::default(),
            })
            .await;
        assert!(response.diagnostics.is_empty());
        assert!(response.new_state.is_none());
    }
}
