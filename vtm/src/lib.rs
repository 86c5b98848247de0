//! Terraform provider for the vTM traffic manager configuration API

pub mod api;
pub mod provider_data;
pub mod resources;
pub mod util;

pub use provider_data::VtmProviderData;

use async_trait::async_trait;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tfplug::provider::{
    ConfigureProviderRequest, ConfigureProviderResponse, ProviderSchemaResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use tfplug::{Provider, ResourceFactory, ResourceWithConfigure};

use resources::{
    dns_zone, dns_zone_file, glb, rule, ssl_key, traffic_manager, virtual_server,
};

pub const DEFAULT_API_VERSION: &str = "3.8";

pub struct VtmProvider {
    provider_data: Option<Arc<VtmProviderData>>,
}

impl Default for VtmProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl VtmProvider {
    pub fn new() -> Self {
        Self {
            provider_data: None,
        }
    }

    pub fn schema_static() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Configuration of the vTM REST API connection")
            .attribute(
                AttributeBuilder::new("server", AttributeType::String)
                    .description("Base URL of the REST API, e.g. https://vtm:9070")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("username", AttributeType::String)
                    .description("REST API user")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("password", AttributeType::String)
                    .description("REST API password")
                    .optional()
                    .sensitive()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("api_version", AttributeType::String)
                    .description("REST API version")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("insecure", AttributeType::Bool)
                    .description("Accept invalid TLS certificates")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("timeout", AttributeType::Number)
                    .description("Per-request timeout in seconds")
                    .optional()
                    .build(),
            )
            .build()
    }
}

fn config_string(config: &DynamicValue, name: &str, env: &str) -> Option<String> {
    config
        .get(&AttributePath::new(name))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .or_else(|| std::env::var(env).ok())
        .filter(|s| !s.is_empty())
}

fn config_bool(config: &DynamicValue, name: &str, env: &str) -> Option<bool> {
    match config.get(&AttributePath::new(name)) {
        Some(Dynamic::Bool(b)) => Some(*b),
        _ => std::env::var(env).ok().and_then(|v| v.parse::<bool>().ok()),
    }
}

fn config_seconds(config: &DynamicValue, name: &str, env: &str) -> Option<u64> {
    match config.get(&AttributePath::new(name)) {
        Some(Dynamic::Number(n)) if *n >= 1.0 => Some(*n as u64),
        _ => std::env::var(env)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|n| *n > 0),
    }
}

fn required(name: &str, env: &str) -> Diagnostic {
    Diagnostic::error(
        format!(
            "{} is required (set in provider config or {} env var)",
            name, env
        ),
        "",
    )
    .with_attribute(AttributePath::new(name))
}

fn factory<R>(make: fn() -> R) -> ResourceFactory
where
    R: ResourceWithConfigure + 'static,
{
    Box::new(move || Box::new(make()) as Box<dyn ResourceWithConfigure>)
}

#[async_trait]
impl Provider for VtmProvider {
    fn type_name(&self) -> &str {
        "vtm"
    }

    async fn schema(&self) -> ProviderSchemaResponse {
        ProviderSchemaResponse {
            schema: Self::schema_static(),
            diagnostics: vec![],
        }
    }

    async fn configure(&mut self, request: ConfigureProviderRequest) -> ConfigureProviderResponse {
        let config = request.config;
        let server = config_string(&config, "server", "VTM_SERVER");
        let username = config_string(&config, "username", "VTM_USERNAME");
        let password = config_string(&config, "password", "VTM_PASSWORD");
        let api_version = config_string(&config, "api_version", "VTM_API_VERSION")
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());
        let insecure = config_bool(&config, "insecure", "VTM_INSECURE").unwrap_or(false);

        let mut diagnostics = vec![];
        if server.is_none() {
            diagnostics.push(required("server", "VTM_SERVER"));
        }
        if username.is_none() {
            diagnostics.push(required("username", "VTM_USERNAME"));
        }
        if password.is_none() {
            diagnostics.push(required("password", "VTM_PASSWORD"));
        }

        let (Some(server), Some(username), Some(password)) = (server, username, password) else {
            return ConfigureProviderResponse {
                provider_data: None,
                diagnostics,
            };
        };

        let mut retry_config = api::RetryConfig::default();
        if let Some(timeout) = config_seconds(&config, "timeout", "VTM_TIMEOUT") {
            retry_config.timeout_seconds = timeout;
        }

        match api::Client::with_config(
            &server,
            &username,
            &password,
            &api_version,
            insecure,
            retry_config,
        ) {
            Ok(client) => {
                tracing::info!(
                    "Configured vTM provider for {} (API {}, insecure={})",
                    server,
                    api_version,
                    insecure
                );
                let data = Arc::new(VtmProviderData::new(client));
                self.provider_data = Some(data.clone());
                ConfigureProviderResponse {
                    provider_data: Some(data as Arc<dyn Any + Send + Sync>),
                    diagnostics,
                }
            }
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    "Failed to create API client",
                    e.to_string(),
                ));
                ConfigureProviderResponse {
                    provider_data: None,
                    diagnostics,
                }
            }
        }
    }

    fn resources(&self) -> HashMap<String, ResourceFactory> {
        let mut resources = HashMap::new();
        resources.insert(
            traffic_manager::TYPE_NAME.to_string(),
            factory(traffic_manager::TrafficManagerResource::new),
        );
        resources.insert(
            virtual_server::TYPE_NAME.to_string(),
            factory(virtual_server::VirtualServerResource::new),
        );
        resources.insert(glb::TYPE_NAME.to_string(), factory(glb::GlbResource::new));
        resources.insert(
            dns_zone::TYPE_NAME.to_string(),
            factory(dns_zone::DnsZoneResource::new),
        );
        resources.insert(
            dns_zone_file::TYPE_NAME.to_string(),
            factory(dns_zone_file::DnsZoneFileResource::new),
        );
        resources.insert(rule::TYPE_NAME.to_string(), factory(rule::RuleResource::new));
        resources.insert(
            ssl_key::CLIENT_TYPE_NAME.to_string(),
            factory(ssl_key::SslKeyResource::client),
        );
        resources.insert(
            ssl_key::SERVER_TYPE_NAME.to_string(),
            factory(ssl_key::SslKeyResource::server),
        );
        resources
    }
}

/// Route tracing output to the test harness; safe to call more than once
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use serde_json::json;
    use serial_test::serial;
    use tfplug::Resource;

    const VARS: &[&str] = &[
        "VTM_SERVER",
        "VTM_USERNAME",
        "VTM_PASSWORD",
        "VTM_API_VERSION",
        "VTM_INSECURE",
        "VTM_TIMEOUT",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    fn config(value: serde_json::Value) -> ConfigureProviderRequest {
        ConfigureProviderRequest {
            config: DynamicValue::new(serde_json::from_value(value).unwrap()),
        }
    }

    #[tokio::test]
    #[serial]
    async fn provider_configures_successfully_with_env_vars() {
        clear_env();
        std::env::set_var("VTM_SERVER", "https://localhost:9070");
        std::env::set_var("VTM_USERNAME", "admin");
        std::env::set_var("VTM_PASSWORD", "secret");
        std::env::set_var("VTM_INSECURE", "true");

        let mut provider = VtmProvider::new();
        let response = provider.configure(config(json!({}))).await;
        assert!(response.diagnostics.is_empty());
        assert!(response.provider_data.is_some());
        assert!(provider.provider_data.is_some());

        clear_env();
    }

    #[tokio::test]
    #[serial]
    async fn provider_block_overrides_env_vars() {
        clear_env();
        std::env::set_var("VTM_SERVER", "not a url");

        let mut provider = VtmProvider::new();
        let response = provider
            .configure(config(json!({
                "server": "https://vtm:9070",
                "username": "admin",
                "password": "secret",
                "timeout": 5
            })))
            .await;
        assert!(response.diagnostics.is_empty());

        clear_env();
    }

    #[tokio::test]
    #[serial]
    async fn provider_configure_requires_server() {
        clear_env();
        std::env::set_var("VTM_USERNAME", "admin");
        std::env::set_var("VTM_PASSWORD", "secret");

        let mut provider = VtmProvider::new();
        let response = provider.configure(config(json!({}))).await;
        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(
            response.diagnostics[0].summary,
            "server is required (set in provider config or VTM_SERVER env var)"
        );
        assert!(response.provider_data.is_none());

        clear_env();
    }

    #[tokio::test]
    #[serial]
    async fn provider_reports_every_missing_credential() {
        clear_env();

        let mut provider = VtmProvider::new();
        let response = provider.configure(config(json!({}))).await;
        assert_eq!(response.diagnostics.len(), 3);
        assert!(response.diagnostics[1]
            .summary
            .contains("username is required"));
        assert!(response.diagnostics[2]
            .summary
            .contains("password is required"));
    }

    #[tokio::test]
    #[serial]
    async fn invalid_server_url_is_a_diagnostic() {
        clear_env();

        let mut provider = VtmProvider::new();
        let response = provider
            .configure(config(json!({
                "server": "ftp://vtm",
                "username": "admin",
                "password": "secret"
            })))
            .await;
        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(response.diagnostics[0].summary, "Failed to create API client");
        assert!(provider.provider_data.is_none());
    }

    #[test]
    #[serial]
    fn env_values_that_do_not_parse_are_ignored() {
        clear_env();
        std::env::set_var("VTM_INSECURE", "yes please");
        std::env::set_var("VTM_TIMEOUT", "-3");

        let empty = DynamicValue::object();
        assert_eq!(config_bool(&empty, "insecure", "VTM_INSECURE"), None);
        assert_eq!(config_seconds(&empty, "timeout", "VTM_TIMEOUT"), None);

        clear_env();
    }

    #[test]
    fn every_resource_type_has_a_factory() {
        let provider = VtmProvider::new();
        let resources = provider.resources();
        assert_eq!(resources.len(), 8);
        for (type_name, make) in &resources {
            assert!(type_name.starts_with("vtm_"));
            assert_eq!(make().type_name(), type_name);
        }
    }

    #[test]
    fn password_is_sensitive() {
        let provider = VtmProvider::new();
        let schema = tokio_test::block_on(provider.schema()).schema;
        assert!(schema.block.attribute("password").unwrap().sensitive);
        assert!(!schema.block.attribute("server").unwrap().required);
    }
}
