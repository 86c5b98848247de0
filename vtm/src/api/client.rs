use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use super::common::VtmError;
use super::error::ApiError;
use super::ConfigApi;

/// vTM configuration API client
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    config_root: String,
    username: String,
    password: String,
    retry_config: RetryConfig,
}

#[derive(Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub timeout_seconds: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 10000,
            timeout_seconds: 30,
        }
    }
}

impl Client {
    /// Create a new API client with default retry configuration
    pub fn new(
        server: &str,
        username: &str,
        password: &str,
        api_version: &str,
        insecure: bool,
    ) -> Result<Self, ApiError> {
        Self::with_config(
            server,
            username,
            password,
            api_version,
            insecure,
            RetryConfig::default(),
        )
    }

    /// Create a new API client with custom retry configuration
    pub fn with_config(
        server: &str,
        username: &str,
        password: &str,
        api_version: &str,
        insecure: bool,
        retry_config: RetryConfig,
    ) -> Result<Self, ApiError> {
        let parsed = url::Url::parse(server)
            .map_err(|e| ApiError::InvalidEndpoint(format!("{}: {}", server, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::InvalidEndpoint(format!(
                "{}: scheme must be http or https",
                server
            )));
        }

        let http_client = reqwest::Client::builder()
            .danger_accept_invalid_certs(insecure)
            .timeout(Duration::from_secs(retry_config.timeout_seconds))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let config_root = format!(
            "{}/api/tm/{}/config/active",
            server.trim_end_matches('/'),
            api_version
        );

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                config_root,
                username: username.to_string(),
                password: password.to_string(),
                retry_config,
            }),
        })
    }

    /// Full URL of one configuration object; the object name is percent-encoded
    pub fn object_url(&self, type_name: &str, name: &str) -> String {
        format!(
            "{}/{}/{}",
            self.inner.config_root,
            type_name.trim_matches('/'),
            urlencoding::encode(name)
        )
    }

    async fn put_json(&self, type_name: &str, name: &str, payload: &Value) -> Result<Value, ApiError> {
        let url = self.object_url(type_name, name);
        let body = self
            .execute_with_retry(
                || async {
                    tracing::debug!("PUT request to: {}", url);
                    self.inner
                        .http_client
                        .put(&url)
                        .basic_auth(&self.inner.username, Some(&self.inner.password))
                        .json(payload)
                        .send()
                        .await
                },
                &url,
            )
            .await?;
        parse_json(&body)
    }

    /// Execute request with retry logic, returning the body of a 2xx response
    async fn execute_with_retry<F, Fut>(&self, request_fn: F, path: &str) -> Result<String, ApiError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
    {
        let mut attempt = 0;
        let mut last_error = None;

        while attempt <= self.inner.retry_config.max_retries {
            if attempt > 0 {
                let backoff = std::cmp::min(
                    self.inner.retry_config.initial_backoff_ms * (2_u64.pow(attempt - 1)),
                    self.inner.retry_config.max_backoff_ms,
                );
                tracing::debug!(
                    "Retrying request to {} after {}ms (attempt {})",
                    path,
                    backoff,
                    attempt
                );
                tokio::time::sleep(Duration::from_millis(backoff)).await;
            }

            match request_fn().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let text = response.text().await?;
                        tracing::debug!("API response body: {}", text);
                        return Ok(text);
                    }

                    if status == reqwest::StatusCode::UNAUTHORIZED {
                        return Err(ApiError::AuthError);
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
                    {
                        tracing::warn!("{} answered {}, will retry", path, status);
                        last_error = Some(Self::error_from_response(response).await);
                    } else {
                        return Err(Self::error_from_response(response).await);
                    }
                }
                Err(e) => {
                    if e.is_timeout() {
                        last_error =
                            Some(ApiError::Timeout(self.inner.retry_config.timeout_seconds));
                    } else if e.is_connect() {
                        last_error = Some(ApiError::ServiceUnavailable);
                    } else {
                        return Err(ApiError::RequestError(e));
                    }
                }
            }

            attempt += 1;
        }

        Err(last_error.unwrap_or(ApiError::ServiceUnavailable))
    }

    /// Turn a non-success response into an ApiError with the remote detail
    async fn error_from_response(response: reqwest::Response) -> ApiError {
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        let details = serde_json::from_str::<VtmError>(&text).ok().map(Box::new);
        let message = match &details {
            Some(d) => d.error_text.clone(),
            None => text,
        };

        ApiError::ApiError {
            status,
            message,
            details,
        }
    }
}

fn parse_json(text: &str) -> Result<Value, ApiError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text).map_err(|e| {
        tracing::error!("Failed to deserialize response: {}, body: {}", e, text);
        ApiError::ParseError(format!("Failed to parse response: {}", e))
    })
}

#[async_trait]
impl ConfigApi for Client {
    async fn create(&self, type_name: &str, name: &str, payload: &Value) -> Result<Value, ApiError> {
        self.put_json(type_name, name, payload).await
    }

    async fn get(&self, type_name: &str, name: &str) -> Result<Value, ApiError> {
        let url = self.object_url(type_name, name);
        let body = self
            .execute_with_retry(
                || async {
                    tracing::debug!("GET request to: {}", url);
                    self.inner
                        .http_client
                        .get(&url)
                        .basic_auth(&self.inner.username, Some(&self.inner.password))
                        .send()
                        .await
                },
                &url,
            )
            .await?;
        parse_json(&body)
    }

    async fn update(&self, type_name: &str, name: &str, payload: &Value) -> Result<Value, ApiError> {
        self.put_json(type_name, name, payload).await
    }

    async fn delete(&self, type_name: &str, name: &str) -> Result<(), ApiError> {
        let url = self.object_url(type_name, name);
        self.execute_with_retry(
            || async {
                tracing::debug!("DELETE request to: {}", url);
                self.inner
                    .http_client
                    .delete(&url)
                    .basic_auth(&self.inner.username, Some(&self.inner.password))
                    .send()
                    .await
            },
            &url,
        )
        .await
        .map(|_| ())
    }

    async fn put_text(&self, type_name: &str, name: &str, body: &str) -> Result<(), ApiError> {
        let url = self.object_url(type_name, name);
        self.execute_with_retry(
            || async {
                tracing::debug!("PUT (raw) request to: {}", url);
                self.inner
                    .http_client
                    .put(&url)
                    .basic_auth(&self.inner.username, Some(&self.inner.password))
                    .header(CONTENT_TYPE, "application/octet-stream")
                    .body(body.to_string())
                    .send()
                    .await
            },
            &url,
        )
        .await
        .map(|_| ())
    }

    async fn get_text(&self, type_name: &str, name: &str) -> Result<String, ApiError> {
        let url = self.object_url(type_name, name);
        self.execute_with_retry(
            || async {
                tracing::debug!("GET (raw) request to: {}", url);
                self.inner
                    .http_client
                    .get(&url)
                    .basic_auth(&self.inner.username, Some(&self.inner.password))
                    .header(reqwest::header::ACCEPT, "application/octet-stream")
                    .send()
                    .await
            },
            &url,
        )
        .await
    }
}
