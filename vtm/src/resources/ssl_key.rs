//! SSL client and server key resources
//!
//! Both kinds share one schema and differ only in the collection they live
//! in. The appliance never returns the private key, so reads keep the value
//! already in state.

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

pub const CLIENT_TYPE_NAME: &str = "vtm_ssl_client_key";
pub const SERVER_TYPE_NAME: &str = "vtm_ssl_server_key";

pub static BASIC: SectionSpec = SectionSpec {
    block: None,
    remote: "basic",
    fields: &[
        FieldSpec::string("note"),
        FieldSpec::string("private"),
        FieldSpec::string("public"),
        FieldSpec::string("request"),
    ],
    granularity: Granularity::Field,
};

pub static CLIENT_LAYOUT: ResourceLayout = ResourceLayout {
    type_name: CLIENT_TYPE_NAME,
    api_path: "ssl/client_keys",
    sections: &[&BASIC],
};

pub static SERVER_LAYOUT: ResourceLayout = ResourceLayout {
    type_name: SERVER_TYPE_NAME,
    api_path: "ssl/server_keys",
    sections: &[&BASIC],
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SslKeyKind {
    Client,
    Server,
}

impl SslKeyKind {
    fn layout(self) -> &'static ResourceLayout {
        match self {
            SslKeyKind::Client => &CLIENT_LAYOUT,
            SslKeyKind::Server => &SERVER_LAYOUT,
        }
    }
}

pub struct SslKeyResource {
    kind: SslKeyKind,
    provider_data: Option<VtmProviderData>,
}

impl SslKeyResource {
    pub fn new(kind: SslKeyKind) -> Self {
        Self {
            kind,
            provider_data: None,
        }
    }

    pub fn client() -> Self {
        Self::new(SslKeyKind::Client)
    }

    pub fn server() -> Self {
        Self::new(SslKeyKind::Server)
    }

    pub fn schema_static() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Manages an SSL key pair with its certificate")
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Name of the key pair")
                    .required()
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("note", AttributeType::String)
                    .description("Notes for this certificate")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("private", AttributeType::String)
                    .description("Private key for certificate")
                    .required()
                    .sensitive()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("public", AttributeType::String)
                    .description("Public certificate")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("request", AttributeType::String)
                    .description("Certificate signing request")
                    .required()
                    .build(),
            )
            .build()
    }
}

#[async_trait]
impl Resource for SslKeyResource {
    fn type_name(&self) -> &str {
        self.kind.layout().type_name
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
                    self.kind.layout(),
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
            Some(data) => lifecycle::read(data.client.as_ref(), self.kind.layout(), request).await,
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
                    self.kind.layout(),
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
        let layout = self.kind.layout();
        match &self.provider_data {
            Some(data) => {
                lifecycle::delete(data.client.as_ref(), layout.type_name, layout.api_path, request)
                    .await
            }
            None => DeleteResourceResponse {
                diagnostics: vec![lifecycle::not_configured()],
            },
        }
    }
}

#[async_trait]
impl ResourceWithConfigure for SslKeyResource {
    async fn configure(&mut self, request: ConfigureResourceRequest) -> ConfigureResourceResponse {
        configure_resource(self.kind.layout().type_name, request, &mut self.provider_data)
    }
}

#[async_trait]
impl ResourceWithImportState for SslKeyResource {
    async fn import_state(
        &self,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        import_state_passthrough_id(AttributePath::new("name"), &request)
    }
}
