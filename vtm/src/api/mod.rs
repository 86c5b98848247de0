//! vTM REST configuration API
//!
//! Every managed object lives at
//! `{server}/api/tm/{version}/config/active/{type}/{name}`. Structured objects
//! are `{"properties": {section: {field: value}}}` documents; rules and zone
//! files are plain text bodies.

use async_trait::async_trait;
use serde_json::Value;

pub mod client;
pub mod common;
pub mod error;

#[cfg(test)]
pub mod test_helpers;

pub use client::{Client, RetryConfig};
pub use common::VtmError;
pub use error::ApiError;

/// The configuration API as seen by resources
///
/// `type_name` is the collection path under `config/active`, for example
/// `virtual_servers` or `dns_server/zones`.
#[async_trait]
pub trait ConfigApi: Send + Sync {
    /// Create an object and return the document the remote stored
    async fn create(&self, type_name: &str, name: &str, payload: &Value) -> Result<Value, ApiError>;

    /// Fetch an object; a missing object is `ApiError::ApiError { status: 404, .. }`
    async fn get(&self, type_name: &str, name: &str) -> Result<Value, ApiError>;

    /// Apply a partial document; sections and fields it omits keep their values
    async fn update(&self, type_name: &str, name: &str, payload: &Value) -> Result<Value, ApiError>;

    async fn delete(&self, type_name: &str, name: &str) -> Result<(), ApiError>;

    /// Store a text object (rule body, zone file)
    async fn put_text(&self, type_name: &str, name: &str, body: &str) -> Result<(), ApiError>;

    async fn get_text(&self, type_name: &str, name: &str) -> Result<String, ApiError>;
}
