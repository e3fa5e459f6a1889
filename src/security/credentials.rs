//! Authentication scheme selection and secret masking
//!
//! The registration service accepts either an integration token (v2 API) or
//! integration user Basic Auth (v1 API). Secrets are kept in `secrecy`
//! wrappers and only exposed when the `Authorization` header is built.

use crate::core::error::RegistrationError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;

const REGISTRATION_PATH: &str = "devops/package/registration";

/// Version of the registration API selected by the auth scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiVersion {
    V1,
    V2,
}

impl ApiVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V1 => "v1",
            Self::V2 => "v2",
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credentials for one registration request
#[derive(Debug)]
pub enum AuthContext {
    TokenAuth {
        tool_id: String,
        token: SecretString,
    },
    BasicAuth {
        username: String,
        password: SecretString,
    },
}

impl AuthContext {
    /// Pick the auth scheme from the optional credential inputs
    ///
    /// A token wins over username/password. Username and password must come
    /// together.
    ///
    /// # Examples
    ///
    /// ```
    /// use secrecy::SecretString;
    /// use sn_package_registration::security::{ApiVersion, AuthContext};
    ///
    /// let auth = AuthContext::select(
    ///     "tool-1",
    ///     &SecretString::new("t0k3n".into()),
    ///     "",
    ///     &SecretString::new("".into()),
    /// )
    /// .unwrap();
    /// assert_eq!(auth.api_version(), ApiVersion::V2);
    /// ```
    pub fn select(
        tool_id: &str,
        token: &SecretString,
        username: &str,
        password: &SecretString,
    ) -> Result<Self, RegistrationError> {
        let token = token.expose_secret();
        let password = password.expose_secret();

        if token.is_empty() && username.is_empty() && password.is_empty() {
            return Err(RegistrationError::CredentialsMissing);
        }

        if !token.is_empty() {
            return Ok(Self::TokenAuth {
                tool_id: tool_id.to_string(),
                token: SecretString::new(token.into()),
            });
        }

        if !username.is_empty() && !password.is_empty() {
            return Ok(Self::BasicAuth {
                username: username.to_string(),
                password: SecretString::new(password.into()),
            });
        }

        Err(RegistrationError::BasicAuthIncomplete)
    }

    pub fn api_version(&self) -> ApiVersion {
        match self {
            Self::TokenAuth { .. } => ApiVersion::V2,
            Self::BasicAuth { .. } => ApiVersion::V1,
        }
    }

    /// Registration endpoint for this scheme
    ///
    /// `instance_url` is expected to be normalized already.
    pub fn endpoint(&self, instance_url: &str, tool_id: &str) -> String {
        format!(
            "{}/api/sn_devops/{}/{}?orchestrationToolId={}",
            instance_url,
            self.api_version(),
            REGISTRATION_PATH,
            tool_id
        )
    }

    /// Value of the `Authorization` header
    pub fn authorization(&self) -> String {
        match self {
            Self::TokenAuth { tool_id, token } => {
                format!("sn_devops.DevOpsToken {}:{}", tool_id, token.expose_secret())
            }
            Self::BasicAuth { username, password } => {
                let credentials = format!("{}:{}", username, password.expose_secret());
                format!("Basic {}", STANDARD.encode(credentials))
            }
        }
    }

    /// Full header set sent with the registration request
    pub fn headers(&self) -> Vec<(String, String)> {
        vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Accept".to_string(), "application/json".to_string()),
            ("Authorization".to_string(), self.authorization()),
        ]
    }

    /// Secret values that must never show up in logs
    ///
    /// The encoded Basic credentials are included since they are as good as
    /// the password.
    pub fn secrets(&self) -> Vec<String> {
        match self {
            Self::TokenAuth { token, .. } => vec![token.expose_secret().to_string()],
            Self::BasicAuth { password, .. } => {
                let header = self.authorization();
                let encoded = header.trim_start_matches("Basic ").to_string();
                vec![password.expose_secret().to_string(), encoded]
            }
        }
    }

    /// Short description safe for logging
    pub fn describe(&self) -> String {
        match self {
            Self::TokenAuth { tool_id, token } => format!(
                "token auth (tool {}, token {})",
                tool_id,
                mask_secret(token.expose_secret())
            ),
            Self::BasicAuth { username, .. } => format!("basic auth (user {})", username),
        }
    }
}

/// Masks a secret for safe logging
///
/// Shows only the first 3 and last 3 characters for identification purposes.
/// Secrets shorter than 10 characters are fully masked as "****".
///
/// # Examples
///
/// ```
/// use sn_package_registration::security::mask_secret;
///
/// assert_eq!(mask_secret("abcdef123456"), "abc...456");
/// assert_eq!(mask_secret("short"), "****");
/// ```
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() < 10 {
        return "****".to_string();
    }

    let prefix: String = chars[..3].iter().collect();
    let suffix: String = chars[chars.len() - 3..].iter().collect();
    format!("{}...{}", prefix, suffix)
}

/// Replaces known secrets in free text before it is logged
#[derive(Default)]
pub struct SecretMasker {
    patterns: Vec<(Regex, String)>,
}

impl SecretMasker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Masker for all secrets of an auth context
    pub fn for_auth(auth: &AuthContext) -> Self {
        let mut masker = Self::new();
        for secret in auth.secrets() {
            masker.add(&secret);
        }
        masker
    }

    /// Register a secret; empty values are ignored
    pub fn add(&mut self, secret: &str) {
        if secret.is_empty() {
            return;
        }
        if let Ok(regex) = Regex::new(&regex::escape(secret)) {
            self.patterns.push((regex, mask_secret(secret)));
        }
    }

    pub fn mask(&self, text: &str) -> String {
        let mut masked = text.to_string();
        for (regex, replacement) in &self.patterns {
            masked = regex
                .replace_all(&masked, replacement.as_str())
                .to_string();
        }
        masked
    }
}
