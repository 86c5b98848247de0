//! Provider data handed to every resource

use crate::api::{Client, ConfigApi};
use std::sync::Arc;
use tfplug::resource::{ConfigureResourceRequest, ConfigureResourceResponse};
use tfplug::types::Diagnostic;

#[derive(Clone)]
pub struct VtmProviderData {
    pub client: Arc<dyn ConfigApi>,
}

impl VtmProviderData {
    pub fn new(client: Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Wrap any configuration API implementation
    pub fn with_api(api: Arc<dyn ConfigApi>) -> Self {
        Self { client: api }
    }
}

/// Downcast the provider data of a configure request into `slot`
pub(crate) fn configure_resource(
    type_name: &str,
    request: ConfigureResourceRequest,
    slot: &mut Option<VtmProviderData>,
) -> ConfigureResourceResponse {
    let mut diagnostics = vec![];

    match request.provider_data {
        Some(data) => match data.downcast_ref::<VtmProviderData>() {
            Some(provider_data) => {
                *slot = Some(provider_data.clone());
                tracing::debug!("Configured {} with provider data", type_name);
            }
            None => {
                tracing::error!("Failed to downcast provider data for {}", type_name);
                diagnostics.push(Diagnostic::error(
                    "Invalid provider data",
                    "Failed to extract VtmProviderData from provider data",
                ));
            }
        },
        None => {
            tracing::warn!("No provider data provided to {}", type_name);
            diagnostics.push(Diagnostic::error(
                "No provider data",
                "No provider data was provided to the resource",
            ));
        }
    }

    ConfigureResourceResponse { diagnostics }
}
