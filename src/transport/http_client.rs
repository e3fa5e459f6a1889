//! reqwest transport for the registration request
//!
//! Failures are translated into [`ServiceError`] messages that the
//! classifier keys on: `Request failed with status code N` for HTTP errors,
//! `getaddrinfo ENOTFOUND host` for DNS failures and `connect ECONNREFUSED
//! host` for refused connections. Any other failure keeps reqwest's own text
//! with the request URL stripped, so the tool id in the query string never
//! reaches the classifier.

use crate::core::error::ServiceError;
use crate::core::traits::{RegistrationClient, RegistrationRequest};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use std::error::Error as StdError;
use std::io;
use tracing::debug;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// HTTP client posting registrations with reqwest
#[derive(Debug, Clone)]
pub struct HttpRegistrationClient {
    client: Client,
}

impl HttpRegistrationClient {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self::with_client(client))
    }

    /// Wrap an already configured client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

/// Decode a response body; non-JSON text is kept as a JSON string
fn decode_body(text: &str) -> Option<Value> {
    if text.trim().is_empty() {
        return None;
    }
    Some(serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())))
}

/// Full text of an error and all of its sources
fn error_chain(error: &(dyn StdError + 'static)) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

fn is_dns_failure(chain: &str) -> bool {
    let lower = chain.to_lowercase();
    lower.contains("dns error") || lower.contains("failed to lookup address")
}

/// Whether the error or one of its sources is a refused TCP connection
fn is_connection_refused(error: &(dyn StdError + 'static)) -> bool {
    let mut source = Some(error);
    while let Some(cause) = source {
        if let Some(io_error) = cause.downcast_ref::<io::Error>() {
            if io_error.kind() == io::ErrorKind::ConnectionRefused {
                return true;
            }
        }
        source = cause.source();
    }
    false
}

fn host_of(url: &Url) -> String {
    match (url.host_str(), url.port_or_known_default()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        _ => String::new(),
    }
}

fn to_service_error(error: reqwest::Error) -> ServiceError {
    let host = error.url().map(host_of).unwrap_or_default();
    let connect = error.is_connect();
    let error = error.without_url();
    let chain = error_chain(&error);

    if connect && is_dns_failure(&chain) {
        return ServiceError::new(format!("getaddrinfo ENOTFOUND {} ({})", host, chain));
    }
    if connect && is_connection_refused(&error) {
        return ServiceError::new(format!("connect ECONNREFUSED {} ({})", host, chain));
    }
    ServiceError::new(chain)
}

#[async_trait]
impl RegistrationClient for HttpRegistrationClient {
    async fn post(&self, request: &RegistrationRequest) -> Result<Value, ServiceError> {
        debug!(endpoint = %request.endpoint, bytes = request.body.len(), "posting registration");

        let mut builder = self.client.post(&request.endpoint);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .body(request.body.clone())
            .send()
            .await
            .map_err(to_service_error)?;

        let status = response.status();
        let text = response.text().await.map_err(to_service_error)?;
        debug!(status = status.as_u16(), "registration response received");

        let body = decode_body(&text);
        if status.is_success() {
            Ok(body.unwrap_or(Value::Null))
        } else {
            Err(ServiceError::status(status.as_u16(), body))
        }
    }
}
