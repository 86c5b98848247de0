//! GLB service resource

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
use tfplug::schema::{
    AttributeBuilder, AttributeType, NestedBlockBuilder, NestingMode, Schema, SchemaBuilder,
};
use tfplug::types::AttributePath;
use tfplug::validator::{IntRangeValidator, StringInValidator};

use super::lifecycle::{self, ResourceLayout};
use crate::provider_data::{configure_resource, VtmProviderData};
use crate::util::{FieldSpec, Granularity, SectionSpec, TableSpec};

pub const TYPE_NAME: &str = "vtm_glb";

static LOCATION_SETTINGS: TableSpec = TableSpec {
    fields: &[
        FieldSpec::string("location"),
        FieldSpec::int("weight"),
        FieldSpec::list("ip_addresses").remote("ips"),
        FieldSpec::list("monitors"),
    ],
    key: Some("location"),
    ordered: false,
};

static DNSSEC_KEYS: TableSpec = TableSpec {
    fields: &[FieldSpec::string("domain"), FieldSpec::list("ssl_keys")],
    key: Some("domain"),
    ordered: false,
};

pub static BASIC: SectionSpec = SectionSpec {
    block: None,
    remote: "basic",
    fields: &[
        FieldSpec::string("algorithm"),
        FieldSpec::bool("all_monitors_needed"),
        FieldSpec::bool("auto_recovery"),
        FieldSpec::bool("chained_auto_failback"),
        FieldSpec::list("chained_location_order"),
        FieldSpec::bool("disable_on_failure"),
        FieldSpec::table("dns_sec_keys", &DNSSEC_KEYS).remote("dnssec_keys"),
        FieldSpec::set("domains"),
        FieldSpec::bool("enabled"),
        FieldSpec::int("geo_effect"),
        FieldSpec::set("last_resort_response"),
        FieldSpec::set("location_draining"),
        FieldSpec::table("location_settings", &LOCATION_SETTINGS),
        FieldSpec::bool("return_ips_on_fail"),
        FieldSpec::list("rules"),
        FieldSpec::int("ttl"),
    ],
    granularity: Granularity::Field,
};

pub static LOG: SectionSpec = SectionSpec {
    block: None,
    remote: "log",
    fields: &[
        FieldSpec::bool("logging_enabled").remote("enabled"),
        FieldSpec::string("log_file_name").remote("filename"),
        FieldSpec::string("log_format").remote("format"),
    ],
    granularity: Granularity::Field,
};

pub static LAYOUT: ResourceLayout = ResourceLayout {
    type_name: TYPE_NAME,
    api_path: "glb_services",
    sections: &[&BASIC, &LOG],
};

fn flag(name: &str, description: &str) -> tfplug::schema::Attribute {
    AttributeBuilder::new(name, AttributeType::Bool)
        .description(description)
        .optional()
        .default_bool(false)
        .build()
}

fn strings(name: &str, r#type: AttributeType, description: &str) -> tfplug::schema::Attribute {
    AttributeBuilder::new(name, r#type)
        .description(description)
        .optional()
        .build()
}

#[derive(Default)]
pub struct GlbResource {
    provider_data: Option<VtmProviderData>,
}

impl GlbResource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema_static() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Manages a global load balancing service")
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Unique name of the GLB")
                    .required()
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("algorithm", AttributeType::String)
                    .description("GLB Algorithm")
                    .optional()
                    .computed()
                    .validator(
                        StringInValidator::new(&[
                            "chained",
                            "geo",
                            "hybrid",
                            "load",
                            "round_robin",
                            "weighted_random",
                        ])
                        .message(
                            "algorithm must be one of chained, geo, hybrid, load, round_robin or weighted_random",
                        ),
                    )
                    .build(),
            )
            .attribute(flag(
                "all_monitors_needed",
                "Whether all assigned monitors in a location need to be working",
            ))
            .attribute(flag(
                "auto_recovery",
                "Whether the last location to fail will be available once it recovers",
            ))
            .attribute(flag("chained_auto_failback", "Whether automatic failback is enabled"))
            .attribute(flag(
                "disable_on_failure",
                "Locations which recover from a failure will be disabled",
            ))
            .attribute(flag("enabled", "Whether the GLB service is enabled or not"))
            .attribute(flag(
                "return_ips_on_fail",
                "Whether to return all IPs or none during a failure of all locations",
            ))
            .attribute(
                AttributeBuilder::new("geo_effect", AttributeType::Number)
                    .description(
                        "How important the client's location is when deciding which location to use",
                    )
                    .optional()
                    .default_number(50.0)
                    .validator(IntRangeValidator::new(0, 100).message(
                        "geo_effect must be a whole number between 0 and 100 (percentage)",
                    ))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("ttl", AttributeType::Number)
                    .description("The TTL for the DNS records handled by the GLB service")
                    .optional()
                    .default_number(-1.0)
                    .build(),
            )
            .attribute(strings(
                "chained_location_order",
                AttributeType::list_of_strings(),
                "Locations the GLB service operates in and the order in which locations fail",
            ))
            .attribute(strings(
                "rules",
                AttributeType::list_of_strings(),
                "Response rules to be applied to the GLB service",
            ))
            .attribute(strings(
                "domains",
                AttributeType::set_of_strings(),
                "FQDNs which should be used with this GLB service",
            ))
            .attribute(strings(
                "last_resort_response",
                AttributeType::set_of_strings(),
                "The response to send when all locations fail",
            ))
            .attribute(strings(
                "location_draining",
                AttributeType::set_of_strings(),
                "Locations which are draining. No requests will be sent to these locations",
            ))
            .block(
                NestedBlockBuilder::new("location_settings", NestingMode::Set)
                    .description("Location specific settings")
                    .attribute(
                        AttributeBuilder::new("location", AttributeType::String)
                            .description("Location which the settings apply to")
                            .required()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("weight", AttributeType::Number)
                            .description(
                                "Weight given to this location by the weighted random algorithm",
                            )
                            .optional()
                            .validator(IntRangeValidator::new(1, 100))
                            .build(),
                    )
                    .attribute(strings(
                        "ip_addresses",
                        AttributeType::list_of_strings(),
                        "IP addresses in the location",
                    ))
                    .attribute(strings(
                        "monitors",
                        AttributeType::list_of_strings(),
                        "Monitors used in the location",
                    ))
                    .build(),
            )
            .block(
                NestedBlockBuilder::new("dns_sec_keys", NestingMode::Set)
                    .description("Maps keys to domains")
                    .attribute(
                        AttributeBuilder::new("domain", AttributeType::String)
                            .description("Domain related to associated keys")
                            .required()
                            .build(),
                    )
                    .attribute(strings(
                        "ssl_keys",
                        AttributeType::list_of_strings(),
                        "Keys for the associated domain",
                    ))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("logging_enabled", AttributeType::Bool)
                    .description("Whether or not to log connections to this GLB service")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("log_file_name", AttributeType::String)
                    .description("File to log to")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("log_format", AttributeType::String)
                    .description("Format to use in the log file")
                    .optional()
                    .computed()
                    .build(),
            )
            .build()
    }
}

#[async_trait]
impl Resource for GlbResource {
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
impl ResourceWithConfigure for GlbResource {
    async fn configure(&mut self, request: ConfigureResourceRequest) -> ConfigureResourceResponse {
        configure_resource(TYPE_NAME, request, &mut self.provider_data)
    }
}

#[async_trait]
impl ResourceWithImportState for GlbResource {
    async fn import_state(
        &self,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        import_state_passthrough_id(AttributePath::new("name"), &request)
    }
}

#[cfg(test)]
#[path = "./glb_test.rs"]
mod glb_test;
