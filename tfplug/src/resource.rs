//! Managed resources
//!
//! A resource answers the engine's lifecycle calls for one resource type.
//! Configure and import are separate traits so a resource only opts into
//! what it supports.

use crate::changeset::ChangeSet;
use crate::schema::Schema;
use crate::types::{ClientCapabilities, Diagnostic, DynamicValue};
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

/// Lifecycle of one resource type
#[async_trait]
pub trait Resource: Send + Sync {
    /// Constant type name such as `vtm_virtual_server`; equal to the key the
    /// provider registers the factory under
    fn type_name(&self) -> &str;

    async fn metadata(&self, request: ResourceMetadataRequest) -> ResourceMetadataResponse;

    async fn schema(&self, request: ResourceSchemaRequest) -> ResourceSchemaResponse;

    /// Local checks only; every violation is reported, not just the first
    async fn validate(
        &self,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse;

    /// The returned state includes computed attributes
    async fn create(&self, request: CreateResourceRequest) -> CreateResourceResponse;

    /// `new_state: None` tells the engine the object is gone
    async fn read(&self, request: ReadResourceRequest) -> ReadResourceResponse;

    /// `changes` holds the attribute paths that differ from `prior_state`
    async fn update(&self, request: UpdateResourceRequest) -> UpdateResourceResponse;

    /// Deleting an object that is already gone succeeds
    async fn delete(&self, request: DeleteResourceRequest) -> DeleteResourceResponse;
}

// Request/Response types for Resource trait

pub struct ResourceMetadataRequest;

pub struct ResourceMetadataResponse {
    pub type_name: String,
}

pub struct ResourceSchemaRequest;

pub struct ResourceSchemaResponse {
    pub schema: Schema,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct ValidateResourceConfigRequest {
    pub type_name: String,
    pub config: DynamicValue,
    pub client_capabilities: ClientCapabilities,
}

pub struct ValidateResourceConfigResponse {
    pub diagnostics: Vec<Diagnostic>,
}

pub struct CreateResourceRequest {
    pub type_name: String,
    pub planned_state: DynamicValue,
    pub config: DynamicValue,
}

pub struct CreateResourceResponse {
    pub new_state: DynamicValue,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct ReadResourceRequest {
    pub type_name: String,
    pub current_state: DynamicValue,
    pub client_capabilities: ClientCapabilities,
}

pub struct ReadResourceResponse {
    /// None clears the resource identity so the engine plans a recreate
    pub new_state: Option<DynamicValue>,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct UpdateResourceRequest {
    pub type_name: String,
    pub prior_state: DynamicValue,
    pub planned_state: DynamicValue,
    pub config: DynamicValue,
    pub changes: ChangeSet,
}

impl UpdateResourceRequest {
    /// Build a request with the change set derived from the two states
    pub fn from_states(type_name: &str, prior_state: DynamicValue, config: DynamicValue) -> Self {
        let changes = ChangeSet::between(&prior_state, &config);
        Self {
            type_name: type_name.to_string(),
            prior_state,
            planned_state: config.clone(),
            config,
            changes,
        }
    }
}

pub struct UpdateResourceResponse {
    pub new_state: DynamicValue,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct DeleteResourceRequest {
    pub type_name: String,
    pub prior_state: DynamicValue,
}

pub struct DeleteResourceResponse {
    pub diagnostics: Vec<Diagnostic>,
}

/// Receives the provider's shared data right after the factory builds the
/// resource
#[async_trait]
pub trait ResourceWithConfigure: Resource {
    async fn configure(&mut self, request: ConfigureResourceRequest) -> ConfigureResourceResponse;
}

pub struct ConfigureResourceRequest {
    /// `ConfigureProviderResponse::provider_data`, unchanged
    pub provider_data: Option<Arc<dyn Any + Send + Sync>>,
}

pub struct ConfigureResourceResponse {
    pub diagnostics: Vec<Diagnostic>,
}

/// Adopt an existing remote object by id
#[async_trait]
pub trait ResourceWithImportState: Resource {
    /// Produce enough state for the read that follows
    async fn import_state(
        &self,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse;
}

pub struct ImportResourceStateRequest {
    pub type_name: String,
    pub id: String,
}

pub struct ImportResourceStateResponse {
    pub imported_resources: Vec<ImportedResource>,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct ImportedResource {
    pub type_name: String,
    pub state: DynamicValue,
}
