//! DNS zone resource

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
use tfplug::types::AttributePath;

use super::lifecycle::{self, ResourceLayout};
use crate::provider_data::{configure_resource, VtmProviderData};
use crate::util::{FieldSpec, Granularity, SectionSpec};

pub const TYPE_NAME: &str = "vtm_dns_zone";

pub static BASIC: SectionSpec = SectionSpec {
    block: None,
    remote: "basic",
    fields: &[FieldSpec::string("origin"), FieldSpec::string("zone_file")],
    granularity: Granularity::Field,
};

pub static LAYOUT: ResourceLayout = ResourceLayout {
    type_name: TYPE_NAME,
    api_path: "dns_server/zones",
    sections: &[&BASIC],
};

#[derive(Default)]
pub struct DnsZoneResource {
    provider_data: Option<VtmProviderData>,
}

impl DnsZoneResource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema_static() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Manages a zone of the built-in DNS server")
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Name of the DNS zone")
                    .required()
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("origin", AttributeType::String)
                    .description("The domain origin of this zone")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("zone_file", AttributeType::String)
                    .description("The zone file holding the records of this zone")
                    .required()
                    .build(),
            )
            .build()
    }
}

#[async_trait]
impl Resource for DnsZoneResource {
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
                lifecycle::create(
                    data.client.as_ref(),
                    &LAYOUT,
                    &Self::schema_static(),
                    request,
                )
                .await
            }
            None => CreateResourceResponse {
                new_state: request.planned_state,
                diagnostics: vec![lifecycle::not_configured()],
            },
        }
    }

    async fn read(&self, request: ReadResourceRequest) -> ReadResourceResponse {
        match &self.provider_data {
            Some(data) => lifecycle::read(data.client.as_ref(), &LAYOUT, request).await,
            None => ReadResourceResponse {
                new_state: Some(request.current_state),
                diagnostics: vec![lifecycle::not_configured()],
            },
        }
    }

    async fn update(&self, request: UpdateResourceRequest) -> UpdateResourceResponse {
        match &self.provider_data {
            Some(data) => {
                lifecycle::update(
                    data.client.as_ref(),
                    &LAYOUT,
                    &Self::schema_static(),
                    request,
                )
                .await
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
impl ResourceWithConfigure for DnsZoneResource {
    async fn configure(&mut self, request: ConfigureResourceRequest) -> ConfigureResourceResponse {
        configure_resource(TYPE_NAME, request, &mut self.provider_data)
    }
}

#[async_trait]
impl ResourceWithImportState for DnsZoneResource {
    async fn import_state(
        &self,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        import_state_passthrough_id(AttributePath::new("name"), &request)
    }
}
