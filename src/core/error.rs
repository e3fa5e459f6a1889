//! Error handling for package registration
//!
//! This module provides the failure taxonomy of a registration run with
//! recovery guidance, using the thiserror crate for ergonomic error handling.
//! The `Display` text of each variant is the exact message surfaced to the
//! pipeline.

use serde::Serialize;
use thiserror::Error;

/// Prefix of every rejection message reported for HTTP 400/404 responses
pub const REJECTED_PREFIX: &str = "[ServiceNow DevOps] Package Registration is not Successful. ";

/// Suffix appended after each rejection reason
pub const REJECTED_SUFFIX: &str = " Please provide valid inputs.";

/// Main error type for package registration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    // Configuration errors
    #[error("Input required and not supplied: {name}")]
    MissingInput { name: String },

    #[error("Input {name} could not be read: {message}")]
    InvalidInput { name: String, message: String },

    // Parse errors
    #[error("Failed parsing artifacts {message}")]
    ArtifactsParse { message: String },

    #[error("Exception parsing github context {message}")]
    ContextParse { message: String },

    #[error("Exception setting the payload to register package {message}")]
    PayloadBuild { message: String },

    // Authentication-configuration errors
    #[error(
        "Either secret token or integration username, password is needed for integration user authentication"
    )]
    CredentialsMissing,

    #[error(
        "For Basic Auth, Username and Password is mandatory for integration user authentication"
    )]
    BasicAuthIncomplete,

    // Transport / service errors
    #[error("ServiceNow Instance URL is NOT valid. Please correct the URL and try again.")]
    InvalidInstanceUrl,

    #[error(
        "Invalid username and password or Invalid token and toolid. Please correct the input parameters and try again."
    )]
    Unauthorized,

    /// `reasons` already carries the per-reason suffix
    #[error("{}{}", REJECTED_PREFIX, .reasons)]
    Rejected { reasons: String },

    #[error("ServiceNow Package is NOT created. Please check ServiceNow logs for more details.")]
    NotCreated,
}

impl RegistrationError {
    /// Build a rejection from the reasons returned by the service, in order
    pub fn rejected<I, S>(reasons: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let reasons = reasons
            .into_iter()
            .map(|reason| format!("{}{}", reason.as_ref(), REJECTED_SUFFIX))
            .collect::<String>();
        Self::Rejected { reasons }
    }

    /// Whether this error stems from the step configuration rather than the service
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::MissingInput { .. }
                | Self::InvalidInput { .. }
                | Self::ArtifactsParse { .. }
                | Self::ContextParse { .. }
                | Self::PayloadBuild { .. }
                | Self::CredentialsMissing
                | Self::BasicAuthIncomplete
        )
    }

    /// Whether the run stops when this error is reported
    ///
    /// A malformed pipeline context is recorded as a failure but the
    /// registration request is still attempted.
    pub fn aborts_run(&self) -> bool {
        !matches!(self, Self::ContextParse { .. })
    }

    /// Get suggested actions for this error
    pub fn suggested_actions(&self) -> Vec<&'static str> {
        match self {
            Self::MissingInput { .. } => vec!["Add the input to the workflow step `with:` block"],
            Self::InvalidInput { .. } => vec!["Check the runner environment for the input value"],
            Self::ArtifactsParse { .. } => vec![
                "Pass artifacts as a JSON array string",
                "Validate the JSON, for example with jq",
            ],
            Self::ContextParse { .. } => vec!["Pass `${{ toJSON(github) }}` as context-github"],
            Self::PayloadBuild { .. } => vec!["Pass a JSON object as context-github"],
            Self::CredentialsMissing => vec![
                "Set devops-integration-token for token authentication",
                "Or set devops-integration-user-name and devops-integration-user-password",
            ],
            Self::BasicAuthIncomplete => {
                vec!["Set both devops-integration-user-name and devops-integration-user-password"]
            }
            Self::InvalidInstanceUrl => vec![
                "Check instance-url points at a reachable ServiceNow instance",
                "Check the runner has network access to the instance",
            ],
            Self::Unauthorized => vec![
                "Check the integration user credentials",
                "Check the token matches the tool-id",
            ],
            Self::Rejected { .. } => vec!["Correct the reported inputs and re-run the job"],
            Self::NotCreated => vec!["Check the ServiceNow system logs for the request"],
        }
    }

    /// Get error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingInput { .. } => "MISSING_INPUT",
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::ArtifactsParse { .. } => "ARTIFACTS_PARSE",
            Self::ContextParse { .. } => "CONTEXT_PARSE",
            Self::PayloadBuild { .. } => "PAYLOAD_BUILD",
            Self::CredentialsMissing => "CREDENTIALS_MISSING",
            Self::BasicAuthIncomplete => "BASIC_AUTH_INCOMPLETE",
            Self::InvalidInstanceUrl => "INVALID_INSTANCE_URL",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Rejected { .. } => "REJECTED",
            Self::NotCreated => "NOT_CREATED",
        }
    }
}

/// Failure of the outbound registration request, as seen by the classifier
///
/// `message` uses fixed forms (`Request failed with status code 401`,
/// `connect ECONNREFUSED host`, `getaddrinfo ENOTFOUND host`) that the
/// classifier matches on.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("{message}")]
pub struct ServiceError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

impl ServiceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            body: None,
        }
    }

    /// Failure carrying an HTTP status and the decoded response body
    pub fn status(status: u16, body: Option<serde_json::Value>) -> Self {
        Self {
            message: format!("Request failed with status code {}", status),
            status: Some(status),
            body,
        }
    }
}
