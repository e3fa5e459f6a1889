//! Core traits for package registration
//!
//! The registration step never touches process globals. Reading inputs,
//! reporting to the pipeline and sending the HTTP request are capabilities
//! handed to it through the traits below.

use crate::core::error::{RegistrationError, ServiceError};
use async_trait::async_trait;
use serde_json::Value;

/// Source of step inputs (workflow `with:` values, CLI flags, ...)
pub trait ConfigReader: Send + Sync {
    /// Read an input by name
    ///
    /// Returns an empty string for an unset optional input. A required input
    /// that is unset or blank yields [`RegistrationError::MissingInput`].
    ///
    /// # Examples
    ///
    /// ```
    /// use sn_package_registration::core::{ConfigReader, MapConfigReader};
    ///
    /// let reader = MapConfigReader::from_pairs([("tool-id", " abc ")]);
    /// assert_eq!(reader.get("tool-id", true).unwrap(), "abc");
    /// assert_eq!(reader.get("devops-integration-token", false).unwrap(), "");
    /// assert!(reader.get("instance-url", true).is_err());
    /// ```
    fn get(&self, name: &str, required: bool) -> Result<String, RegistrationError>;
}

/// Sink for everything the step tells the pipeline
pub trait Reporter: Send + Sync {
    /// Record a failure; the run ends with a failing exit status
    fn fail(&self, message: &str);

    /// Diagnostic output, hidden unless step debugging is enabled
    fn debug(&self, message: &str);

    /// Regular log output
    fn info(&self, message: &str);

    /// Ask the pipeline to redact `secret` from all later output
    ///
    /// Default implementation does nothing.
    fn mask(&self, _secret: &str) {}
}

/// Outbound request to the registration endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationRequest {
    pub endpoint: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RegistrationRequest {
    /// Look up a header value by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// HTTP transport used to deliver the registration
#[async_trait]
pub trait RegistrationClient: Send + Sync {
    /// POST the request once
    ///
    /// Returns the decoded response body (JSON `null` when the body is
    /// empty) or the failure in a form the classifier understands.
    async fn post(&self, request: &RegistrationRequest) -> Result<Value, ServiceError>;
}
