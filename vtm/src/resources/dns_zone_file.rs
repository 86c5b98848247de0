//! DNS zone file resource, stored verbatim as text

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

pub const TYPE_NAME: &str = "vtm_dns_zone_file";

fn zone_text(value: &Dynamic) -> Result<String, TfplugError> {
    match value {
        Dynamic::String(s) => Ok(s.clone()),
        other => Err(TfplugError::type_mismatch("string", other.type_name())),
    }
}

fn zone_value(body: &str) -> Dynamic {
    Dynamic::String(body.to_string())
}

pub static LAYOUT: TextLayout = TextLayout {
    type_name: TYPE_NAME,
    api_path: "dns_server/zone_files",
    attribute: "dns_zone_config",
    encode: zone_text,
    decode: zone_value,
};

#[derive(Default)]
pub struct DnsZoneFileResource {
    provider_data: Option<VtmProviderData>,
}

impl DnsZoneFileResource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema_static() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Manages a DNS zone file served by the built-in DNS server")
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Name of the zone file")
                    .required()
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("dns_zone_config", AttributeType::String)
                    .description("Zone file contents in BIND format")
                    .required()
                    .build(),
            )
            .build()
    }
}

#[async_trait]
impl Resource for DnsZoneFileResource {
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
impl ResourceWithConfigure for DnsZoneFileResource {
    async fn configure(&mut self, request: ConfigureResourceRequest) -> ConfigureResourceResponse {
        configure_resource(TYPE_NAME, request, &mut self.provider_data)
    }
}

#[async_trait]
impl ResourceWithImportState for DnsZoneFileResource {
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

    const ZONE: &str = "$TTL 3600\n\
        @\t30\tIN\tSOA\tns1.example.com. hostmaster.example.com. (01 3600 300 1209600 30)\n\
        @\t30\tIN\tNS\tns1.example.com.\n\
        ns1\t30\tIN\tA\t10.0.0.2\n";

    #[tokio::test]
    async fn zone_text_is_stored_verbatim() {
        let api = Arc::new(RecordingApi::new());
        let mut resource = DnsZoneFileResource::new();
        configure(&mut resource, api.clone()).await;

        let planned = dynamic(json!({"name": "example.com.db", "dns_zone_config": ZONE}));
        let response = resource
            .create(CreateResourceRequest {
                type_name: TYPE_NAME.to_string(),
                planned_state: planned.clone(),
                config: planned,
            })
            .await;
        assert!(response.diagnostics.is_empty());
        assert_eq!(api.text("dns_server/zone_files", "example.com.db").unwrap(), ZONE);
        assert_eq!(
            response
                .new_state
                .get_string(&AttributePath::new("dns_zone_config"))
                .unwrap(),
            ZONE
        );
    }

    #[tokio::test]
    async fn missing_body_is_a_validation_error() {
        let api = Arc::new(RecordingApi::new());
        let mut resource = DnsZoneFileResource::new();
        configure(&mut resource, api.clone()).await;

        let planned = dynamic(json!({"name": "example.com.db"}));
        let response = resource
            .create(CreateResourceRequest {
                type_name: TYPE_NAME.to_string(),
                planned_state: planned.clone(),
                config: planned,
            })
            .await;
        assert!(response.diagnostics[0]
            .summary
            .contains("required field is not set"));
        assert_eq!(api.count(Method::PutText), 0);
    }

    #[tokio::test]
    async fn delete_of_missing_file_succeeds() {
        let api = Arc::new(RecordingApi::new());
        let mut resource = DnsZoneFileResource::new();
        configure(&mut resource, api).await;

        let response = resource
            .delete(DeleteResourceRequest {
                type_name: TYPE_NAME.to_string(),
                prior_state: dynamic(json!({"name": "gone.db"})),
            })
            .await;
        assert!(response.diagnostics.is_empty());
    }
}
