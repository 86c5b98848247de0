//! Virtual server resource
//!
//! The field tables below are the whole mapping: the schema, the payload
//! builders and the read-back all derive from them. Top-level attributes are
//! sent field by field. Each block is re-sent whole when anything in it
//! changes.

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
use tfplug::validator::{IntRangeValidator, StringInValidator};

use super::fields::{field_schema, section_block};
use super::lifecycle::{self, ResourceLayout};
use crate::provider_data::{configure_resource, VtmProviderData};
use crate::util::{FieldSpec, Granularity, SectionSpec, TableSpec};

pub const TYPE_NAME: &str = "vtm_virtual_server";

pub const PROTOCOLS: &[&str] = &[
    "client_first",
    "dns",
    "dns_tcp",
    "ftp",
    "http",
    "https",
    "imaps",
    "imapv2",
    "imapv3",
    "imapv4",
    "ldap",
    "ldaps",
    "pop3",
    "pop3s",
    "rtsp",
    "server_first",
    "siptcp",
    "sipudp",
    "smtp",
    "ssl",
    "stream",
    "telnet",
    "udp",
    "udpstreaming",
];

pub static BASIC: SectionSpec = SectionSpec {
    block: None,
    remote: "basic",
    fields: &[
        FieldSpec::bool("add_cluster_ip"),
        FieldSpec::bool("add_x_forwarded_for"),
        FieldSpec::bool("add_x_forwarded_proto"),
        FieldSpec::bool("autodetect_upgrade_headers"),
        FieldSpec::string("bandwidth_class"),
        FieldSpec::bool("close_with_rst"),
        FieldSpec::list("completionrules"),
        FieldSpec::int("connect_timeout"),
        FieldSpec::bool("enabled"),
        FieldSpec::string("error_file"),
        FieldSpec::bool("expect_starttls"),
        FieldSpec::bool("ftp_force_server_secure"),
        FieldSpec::list("glb_services"),
        FieldSpec::bool("listen_on_any"),
        FieldSpec::list("listen_on_hosts"),
        FieldSpec::list("listen_on_traffic_ips"),
        FieldSpec::string("note"),
        FieldSpec::string("pool"),
        FieldSpec::int("port"),
        FieldSpec::string("protection_class"),
        FieldSpec::string("protocol"),
        FieldSpec::bool("proxy_close"),
        FieldSpec::list("request_rules"),
        FieldSpec::list("response_rules"),
        FieldSpec::string("slm_class"),
        FieldSpec::bool("so_nagle"),
        FieldSpec::string("ssl_client_cert_headers"),
        FieldSpec::bool("ssl_decrypt"),
        FieldSpec::string("ssl_honor_fallback_scsv"),
        FieldSpec::bool("transparent"),
    ],
    granularity: Granularity::Field,
};

static PROFILES: TableSpec = TableSpec {
    fields: &[FieldSpec::string("name"), FieldSpec::list("urls")],
    key: Some("name"),
    ordered: true,
};

pub static APTIMIZER: SectionSpec = SectionSpec {
    block: Some("aptimizer"),
    remote: "aptimizer",
    fields: &[
        FieldSpec::bool("enabled"),
        FieldSpec::table("profile", &PROFILES),
    ],
    granularity: Granularity::Section,
};

pub static CONNECTION: SectionSpec = SectionSpec {
    block: Some("vs_connection"),
    remote: "connection",
    fields: &[
        FieldSpec::bool("keepalive"),
        FieldSpec::int("keepalive_timeout"),
        FieldSpec::int("max_client_buffer"),
        FieldSpec::int("max_server_buffer"),
        FieldSpec::int("max_transaction_duration"),
        FieldSpec::string("server_first_banner"),
        FieldSpec::int("timeout"),
    ],
    granularity: Granularity::Section,
};

pub static COOKIE: SectionSpec = SectionSpec {
    block: Some("cookie"),
    remote: "cookie",
    fields: &[
        FieldSpec::string("domain"),
        FieldSpec::string("new_domain"),
        FieldSpec::string("path_regex"),
        FieldSpec::string("path_replace"),
        FieldSpec::string("secure"),
    ],
    granularity: Granularity::Section,
};

pub static DNS: SectionSpec = SectionSpec {
    block: Some("dns"),
    remote: "dns",
    fields: &[
        FieldSpec::bool("edns_client_subnet"),
        FieldSpec::int("edns_udpsize"),
        FieldSpec::int("max_udpsize"),
        FieldSpec::string("rrset_order"),
        FieldSpec::bool("verbose"),
        FieldSpec::list("zones"),
    ],
    granularity: Granularity::Section,
};

pub static FTP: SectionSpec = SectionSpec {
    block: Some("ftp"),
    remote: "ftp",
    fields: &[
        FieldSpec::int("data_source_port"),
        FieldSpec::bool("force_client_secure"),
        FieldSpec::int("port_range_high"),
        FieldSpec::int("port_range_low"),
        FieldSpec::bool("ssl_data"),
    ],
    granularity: Granularity::Section,
};

pub static GZIP: SectionSpec = SectionSpec {
    block: Some("gzip"),
    remote: "gzip",
    fields: &[
        FieldSpec::int("compress_level"),
        FieldSpec::bool("enabled"),
        FieldSpec::string("etag_rewrite"),
        FieldSpec::list("include_mime"),
        FieldSpec::int("max_size"),
        FieldSpec::int("min_size"),
        FieldSpec::bool("no_size"),
    ],
    granularity: Granularity::Section,
};

pub static HTTP: SectionSpec = SectionSpec {
    block: Some("http"),
    remote: "http",
    fields: &[
        FieldSpec::string("chunk_overhead_forwarding"),
        FieldSpec::string("location_regex"),
        FieldSpec::string("location_replace"),
        FieldSpec::string("location_rewrite"),
        FieldSpec::string("mime_default"),
        FieldSpec::bool("mime_detect"),
    ],
    granularity: Granularity::Section,
};

pub static HTTP2: SectionSpec = SectionSpec {
    block: Some("http2"),
    remote: "http2",
    fields: &[
        FieldSpec::int("connect_timeout"),
        FieldSpec::int("data_frame_size"),
        FieldSpec::bool("enabled"),
        FieldSpec::int("header_table_size"),
        FieldSpec::list("headers_index_blacklist"),
        FieldSpec::bool("headers_index_default"),
        FieldSpec::list("headers_index_whitelist"),
        FieldSpec::int("idle_timeout_no_streams"),
        FieldSpec::int("idle_timeout_open_streams"),
        FieldSpec::int("max_concurrent_streams"),
        FieldSpec::int("max_frame_size"),
        FieldSpec::int("max_header_padding"),
        FieldSpec::bool("merge_cookie_headers"),
        FieldSpec::int("stream_window_size"),
    ],
    granularity: Granularity::Section,
};

pub static LOG: SectionSpec = SectionSpec {
    block: Some("log"),
    remote: "log",
    fields: &[
        FieldSpec::bool("client_connection_failures"),
        FieldSpec::bool("enabled"),
        FieldSpec::string("format"),
        FieldSpec::bool("save_all"),
        FieldSpec::bool("server_connection_failures"),
        FieldSpec::bool("session_persistence_verbose"),
        FieldSpec::bool("ssl_failures"),
    ],
    granularity: Granularity::Section,
};

pub static RECENT_CONNECTIONS: SectionSpec = SectionSpec {
    block: Some("recent_connections"),
    remote: "recent_connections",
    fields: &[FieldSpec::bool("enabled"), FieldSpec::bool("save_all")],
    granularity: Granularity::Section,
};

pub static REQUEST_TRACING: SectionSpec = SectionSpec {
    block: Some("request_tracing"),
    remote: "request_tracing",
    fields: &[FieldSpec::bool("enabled"), FieldSpec::bool("trace_io")],
    granularity: Granularity::Section,
};

pub static RTSP: SectionSpec = SectionSpec {
    block: Some("rtsp"),
    remote: "rtsp",
    fields: &[
        FieldSpec::int("streaming_port_range_high"),
        FieldSpec::int("streaming_port_range_low"),
        FieldSpec::int("streaming_timeout"),
    ],
    granularity: Granularity::Section,
};

pub static SIP: SectionSpec = SectionSpec {
    block: Some("sip"),
    remote: "sip",
    fields: &[
        FieldSpec::string("dangerous_requests"),
        FieldSpec::bool("follow_route"),
        FieldSpec::int("max_connection_mem"),
        FieldSpec::string("mode"),
        FieldSpec::bool("rewrite_uri"),
        FieldSpec::int("streaming_port_range_high"),
        FieldSpec::int("streaming_port_range_low"),
        FieldSpec::int("streaming_timeout"),
        FieldSpec::bool("timeout_messages"),
        FieldSpec::int("transaction_timeout"),
    ],
    granularity: Granularity::Section,
};

static OCSP_ISSUERS: TableSpec = TableSpec {
    fields: &[
        FieldSpec::string("issuer"),
        FieldSpec::bool("aia"),
        FieldSpec::string("nonce"),
        FieldSpec::string("required"),
        FieldSpec::string("responder_cert"),
        FieldSpec::string("signer"),
        FieldSpec::string("url"),
    ],
    key: Some("issuer"),
    ordered: true,
};

static HOST_MAPPING: TableSpec = TableSpec {
    fields: &[
        FieldSpec::string("host"),
        FieldSpec::string("certificate"),
        FieldSpec::list("alt_certificates"),
    ],
    key: Some("host"),
    ordered: true,
};

pub static SSL: SectionSpec = SectionSpec {
    block: Some("ssl"),
    remote: "ssl",
    fields: &[
        FieldSpec::bool("add_http_headers"),
        FieldSpec::list("client_cert_cas"),
        FieldSpec::list("elliptic_curves"),
        FieldSpec::list("issued_certs_never_expire"),
        FieldSpec::bool("ocsp_enable"),
        FieldSpec::table("ocsp_issuers", &OCSP_ISSUERS),
        FieldSpec::int("ocsp_max_response_age"),
        FieldSpec::bool("ocsp_stapling"),
        FieldSpec::int("ocsp_time_tolerance"),
        FieldSpec::int("ocsp_timeout"),
        FieldSpec::bool("prefer_sslv3"),
        FieldSpec::string("request_client_cert"),
        FieldSpec::bool("send_close_alerts"),
        FieldSpec::list("server_cert_alt_certificates"),
        FieldSpec::string("server_cert_default"),
        FieldSpec::table("ssl_server_cert_host_mapping", &HOST_MAPPING)
            .remote("server_cert_host_mapping"),
        FieldSpec::string("signature_algorithms"),
        FieldSpec::string("ssl_ciphers"),
        FieldSpec::string("ssl_support_ssl2"),
        FieldSpec::string("ssl_support_ssl3"),
        FieldSpec::string("ssl_support_tls1"),
        FieldSpec::string("ssl_support_tls1_1"),
        FieldSpec::string("ssl_support_tls1_2"),
        FieldSpec::bool("trust_magic"),
    ],
    granularity: Granularity::Section,
};

pub static SYSLOG: SectionSpec = SectionSpec {
    block: Some("syslog"),
    remote: "syslog",
    fields: &[
        FieldSpec::bool("enabled"),
        FieldSpec::string("format"),
        FieldSpec::string("ip_end_point"),
        FieldSpec::int("msg_len_limit"),
    ],
    granularity: Granularity::Section,
};

pub static UDP: SectionSpec = SectionSpec {
    block: Some("udp"),
    remote: "udp",
    fields: &[
        FieldSpec::bool("end_point_persistence"),
        FieldSpec::bool("port_smp"),
        FieldSpec::int("response_datagrams_expected"),
        FieldSpec::int("timeout"),
    ],
    granularity: Granularity::Section,
};

pub static WEB_CACHE: SectionSpec = SectionSpec {
    block: Some("web_cache"),
    remote: "web_cache",
    fields: &[
        FieldSpec::string("control_out"),
        FieldSpec::bool("enabled"),
        FieldSpec::int("error_page_time"),
        FieldSpec::int("max_time"),
        FieldSpec::int("refresh_time"),
    ],
    granularity: Granularity::Section,
};

pub static LAYOUT: ResourceLayout = ResourceLayout {
    type_name: TYPE_NAME,
    api_path: "virtual_servers",
    sections: &[
        &BASIC,
        &APTIMIZER,
        &CONNECTION,
        &COOKIE,
        &DNS,
        &FTP,
        &GZIP,
        &HTTP,
        &HTTP2,
        &LOG,
        &RECENT_CONNECTIONS,
        &REQUEST_TRACING,
        &RTSP,
        &SIP,
        &SSL,
        &SYSLOG,
        &UDP,
        &WEB_CACHE,
    ],
};

fn one_of(allowed: &[&str], message: &str) -> StringInValidator {
    StringInValidator::new(allowed).message(message)
}

fn within(min: i64, max: i64, message: &str) -> IntRangeValidator {
    IntRangeValidator::new(min, max).message(message)
}

const SSL_SUPPORT: &[&str] = &["use_default", "disabled", "enabled"];
const SSL_SUPPORT_MESSAGE: &str = "must be one of use_default, disabled or enabled";

fn customize(path: &str, attr: AttributeBuilder) -> AttributeBuilder {
    match path {
        "port" => attr
            .description("The port on which to listen for incoming connections")
            .validator(within(1, 65535, "port must be a value within 1-65535")),
        "pool" => attr.description("The default pool to use for traffic"),
        "protocol" => attr
            .description("The protocol that the virtual server is using")
            .validator(StringInValidator::new(PROTOCOLS)),
        "ssl_client_cert_headers" => attr.validator(one_of(
            &["all", "none", "simple"],
            "SSL Client Cert Header must be one of all, none or simple",
        )),
        "ssl_honor_fallback_scsv" => attr.validator(one_of(
            &["disabled", "enabled", "use_default"],
            "SSL Honor Fallback SCSV must be one of disabled, enabled or use_default",
        )),
        "vs_connection.max_client_buffer" | "vs_connection.max_server_buffer" => attr.validator(
            within(1024, 16777216, "buffer size must be within 1024-16777216"),
        ),
        "cookie.domain" => attr.validator(one_of(
            &["no_rewrite", "set_to_named", "set_to_request"],
            "Cookie Domain must be one of no_rewrite, set_to_named or set_to_request",
        )),
        "cookie.secure" => attr.validator(one_of(
            &["no_modify", "set_secure", "unset_secure"],
            "Cookie Secure must be one of no_modify, set_secure or unset_secure",
        )),
        "dns.rrset_order" => attr.validator(one_of(
            &["cyclic", "fixed"],
            "DNS RRSET Order must be one of cyclic or fixed",
        )),
        "gzip.compress_level" => {
            attr.validator(within(1, 9, "Compression level must be a value within 1-9"))
        }
        "gzip.etag_rewrite" => attr.validator(one_of(
            &["delete", "ignore", "weaken", "wrap"],
            "ETag Rewrite must be one of delete, ignore, weaken or wrap",
        )),
        "http.chunk_overhead_forwarding" => attr.validator(one_of(
            &["lazy", "eager"],
            "Chunk Overhead Forwarding must be one of lazy or eager",
        )),
        "http.location_rewrite" => attr.validator(one_of(
            &["always", "if_host_matches", "never"],
            "Location Rewrite must be one of always, if_host_matches or never",
        )),
        "http2.data_frame_size" => attr.validator(within(
            100,
            16777206,
            "data_frame_size must be a value within 100-16777206",
        )),
        "http2.header_table_size" => attr.validator(within(
            4096,
            1048576,
            "header_table_size must be a value within 4096-1048576",
        )),
        "http2.max_frame_size" => attr.validator(within(
            16384,
            16777215,
            "max_frame_size must be a value within 16384-16777215",
        )),
        "sip.dangerous_requests" => attr.validator(one_of(
            &["forbid", "forward", "node"],
            "Dangerous requests action must be one of forbid, forward or node",
        )),
        "sip.mode" => attr.validator(one_of(
            &["full_gateway", "route", "sip_gateway"],
            "SIP mode must be one of full_gateway, route or sip_gateway",
        )),
        "ssl.ocsp_issuers.nonce" => {
            attr.validator(one_of(&["off", "on", "strict"], "must be one of off, on or strict"))
        }
        "ssl.ocsp_issuers.required" => attr.validator(one_of(
            &["none", "optional", "strict"],
            "must be one of none, optional, strict",
        )),
        "ssl.request_client_cert" => attr.validator(one_of(
            &["dont_request", "request", "require"],
            "SSL Request Client Cert must be one of dont_request, request or require",
        )),
        "ssl.ssl_support_ssl2"
        | "ssl.ssl_support_ssl3"
        | "ssl.ssl_support_tls1"
        | "ssl.ssl_support_tls1_1"
        | "ssl.ssl_support_tls1_2" => attr.validator(one_of(SSL_SUPPORT, SSL_SUPPORT_MESSAGE)),
        "syslog.msg_len_limit" => attr.validator(within(
            480,
            65535,
            "msg_len_limit must be a value within 480-65535",
        )),
        _ => attr,
    }
}

#[derive(Default)]
pub struct VirtualServerResource {
    provider_data: Option<VtmProviderData>,
}

impl VirtualServerResource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema_static() -> Schema {
        let mut builder = SchemaBuilder::new()
            .version(0)
            .description("Manages a vTM virtual server")
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Name of the virtual server")
                    .required()
                    .requires_replace()
                    .build(),
            );

        let (attributes, blocks) = field_schema(None, BASIC.fields, None, customize);
        for attr in attributes {
            builder = builder.attribute(attr);
        }
        for block in blocks {
            builder = builder.block(block);
        }
        for section in &LAYOUT.sections[1..] {
            if let Some(block) = section_block(section, customize) {
                builder = builder.block(block);
            }
        }
        builder.build()
    }
}

#[async_trait]
impl Resource for VirtualServerResource {
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
        let Some(data) = &self.provider_data else {
            return CreateResourceResponse {
                new_state: request.planned_state,
                diagnostics: vec![lifecycle::not_configured()],
            };
        };
        lifecycle::create(
            data.client.as_ref(),
            &LAYOUT,
            &Self::schema_static(),
            request,
        )
        .await
    }

    async fn read(&self, request: ReadResourceRequest) -> ReadResourceResponse {
        let Some(data) = &self.provider_data else {
            return ReadResourceResponse {
                new_state: Some(request.current_state),
                diagnostics: vec![lifecycle::not_configured()],
            };
        };
        lifecycle::read(data.client.as_ref(), &LAYOUT, request).await
    }

    async fn update(&self, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let Some(data) = &self.provider_data else {
            return UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics: vec![lifecycle::not_configured()],
            };
        };
        lifecycle::update(
            data.client.as_ref(),
            &LAYOUT,
            &Self::schema_static(),
            request,
        )
        .await
    }

    async fn delete(&self, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let Some(data) = &self.provider_data else {
            return DeleteResourceResponse {
                diagnostics: vec![lifecycle::not_configured()],
            };
        };
        lifecycle::delete(data.client.as_ref(), TYPE_NAME, LAYOUT.api_path, request).await
    }
}

#[async_trait]
impl ResourceWithConfigure for VirtualServerResource {
    async fn configure(&mut self, request: ConfigureResourceRequest) -> ConfigureResourceResponse {
        configure_resource(TYPE_NAME, request, &mut self.provider_data)
    }
}

#[async_trait]
impl ResourceWithImportState for VirtualServerResource {
    async fn import_state(
        &self,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        import_state_passthrough_id(AttributePath::new("name"), &request)
    }
}

#[cfg(test)]
#[path = "./virtual_server_test.rs"]
mod virtual_server_test;
