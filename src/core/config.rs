//! Step inputs and where they come from
//!
//! Inputs are looked up by their workflow name (`instance-url`, `tool-id`,
//! ...). The GitHub Actions runner exposes them as `INPUT_<NAME>` environment
//! variables; CLI flags can override them for local runs.
//!
//! Priority (high to low):
//! 1. CLI flags
//! 2. Environment variables

use crate::core::error::RegistrationError;
use crate::core::traits::ConfigReader;
use secrecy::SecretString;
use std::collections::HashMap;
use std::env;

pub const INSTANCE_URL: &str = "instance-url";
pub const TOOL_ID: &str = "tool-id";
pub const USERNAME: &str = "devops-integration-user-name";
pub const PASSWORD: &str = "devops-integration-user-password";
pub const PACKAGE_NAME: &str = "package-name";
pub const JOB_NAME: &str = "job-name";
pub const TOKEN: &str = "devops-integration-token";
pub const ARTIFACTS: &str = "artifacts";
pub const CONTEXT_GITHUB: &str = "context-github";

/// Enforce `required` on the raw value, then trim it
///
/// A whitespace-only value counts as supplied and resolves to `""`.
fn resolve(name: &str, raw: Option<&str>, required: bool) -> Result<String, RegistrationError> {
    let raw = raw.unwrap_or_default();
    if required && raw.is_empty() {
        return Err(RegistrationError::MissingInput {
            name: name.to_string(),
        });
    }
    Ok(raw.trim().to_string())
}

/// Environment variable name the runner uses for an input
///
/// # Examples
///
/// ```
/// use sn_package_registration::core::config::env_key;
///
/// assert_eq!(env_key("instance-url"), "INPUT_INSTANCE-URL");
/// assert_eq!(env_key("my input"), "INPUT_MY_INPUT");
/// ```
pub fn env_key(name: &str) -> String {
    format!("INPUT_{}", name.replace(' ', "_").to_uppercase())
}

type EnvLookup = dyn Fn(&str) -> Result<String, env::VarError> + Send + Sync;

/// Reads inputs from `INPUT_*` environment variables
pub struct EnvConfigReader {
    lookup: Box<EnvLookup>,
}

impl Default for EnvConfigReader {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvConfigReader {
    /// Reader backed by the process environment
    pub fn new() -> Self {
        Self::with_lookup(|key| env::var(key))
    }

    /// Reader backed by a custom lookup function
    pub fn with_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Result<String, env::VarError> + Send + Sync + 'static,
    {
        Self {
            lookup: Box::new(lookup),
        }
    }
}

impl ConfigReader for EnvConfigReader {
    fn get(&self, name: &str, required: bool) -> Result<String, RegistrationError> {
        match (self.lookup)(&env_key(name)) {
            Ok(value) => resolve(name, Some(&value), required),
            Err(env::VarError::NotPresent) => resolve(name, None, required),
            Err(e @ env::VarError::NotUnicode(_)) => Err(RegistrationError::InvalidInput {
                name: name.to_string(),
                message: e.to_string(),
            }),
        }
    }
}

/// Reads inputs from an in-memory map (CLI flags, tests)
#[derive(Debug, Clone, Default)]
pub struct MapConfigReader {
    values: HashMap<String, String>,
}

impl MapConfigReader {
    pub fn new(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }
}

impl ConfigReader for MapConfigReader {
    fn get(&self, name: &str, required: bool) -> Result<String, RegistrationError> {
        resolve(name, self.values.get(name).map(String::as_str), required)
    }
}

/// Chain of readers; the first one that supplies the input wins
pub struct LayeredConfigReader {
    layers: Vec<Box<dyn ConfigReader>>,
}

impl LayeredConfigReader {
    /// Layers are given highest priority first
    pub fn new(layers: Vec<Box<dyn ConfigReader>>) -> Self {
        Self { layers }
    }
}

impl ConfigReader for LayeredConfigReader {
    fn get(&self, name: &str, required: bool) -> Result<String, RegistrationError> {
        for layer in &self.layers {
            match layer.get(name, true) {
                Ok(value) => return Ok(value),
                Err(RegistrationError::MissingInput { .. }) => continue,
                Err(e) => return Err(e),
            }
        }
        resolve(name, None, required)
    }
}

/// Trim the instance URL and drop a single trailing slash
///
/// # Examples
///
/// ```
/// use sn_package_registration::core::config::normalize_instance_url;
///
/// assert_eq!(normalize_instance_url(" https://x.example.com/ "), "https://x.example.com");
/// assert_eq!(normalize_instance_url("https://x.example.com//"), "https://x.example.com/");
/// ```
pub fn normalize_instance_url(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed.strip_suffix('/').unwrap_or(trimmed).to_string()
}

/// Inputs read before the artifacts are parsed
///
/// The pipeline context is read later by the step, after the artifacts
/// parsed successfully.
#[derive(Debug)]
pub struct RegistrationInputs {
    pub instance_url: String,
    pub tool_id: String,
    pub username: String,
    pub password: SecretString,
    pub package_name: String,
    pub job_name: String,
    pub token: SecretString,
    pub artifacts: String,
}

impl RegistrationInputs {
    /// Read all inputs in workflow order, failing on the first missing one
    pub fn read(reader: &dyn ConfigReader) -> Result<Self, RegistrationError> {
        let instance_url = reader.get(INSTANCE_URL, true)?;
        let tool_id = reader.get(TOOL_ID, true)?;
        let username = reader.get(USERNAME, false)?;
        let password = SecretString::new(reader.get(PASSWORD, false)?.into());
        let package_name = reader.get(PACKAGE_NAME, true)?;
        let job_name = reader.get(JOB_NAME, true)?;
        let token = SecretString::new(reader.get(TOKEN, false)?.into());
        let artifacts = reader.get(ARTIFACTS, true)?;

        Ok(Self {
            instance_url,
            tool_id,
            username,
            password,
            package_name,
            job_name,
            token,
            artifacts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn required_inputs() -> MapConfigReader {
        MapConfigReader::from_pairs([
            (INSTANCE_URL, "https://x.example.com/"),
            (TOOL_ID, "tool-1"),
            (PACKAGE_NAME, "pkg"),
            (JOB_NAME, "build"),
            (ARTIFACTS, "[]"),
        ])
    }

    #[test]
    fn test_normalize_strips_one_trailing_slash() {
        assert_eq!(
            normalize_instance_url("https://x.example.com/"),
            "https://x.example.com"
        );
        assert_eq!(
            normalize_instance_url("https://x.example.com"),
            "https://x.example.com"
        );
        assert_eq!(
            normalize_instance_url("https://x.example.com//"),
            "https://x.example.com/"
        );
    }

    #[test]
    fn test_normalize_trims_before_stripping() {
        assert_eq!(
            normalize_instance_url("  https://x.example.com/\n"),
            "https://x.example.com"
        );
    }

    #[test]
    fn test_env_key_uppercases_and_replaces_spaces() {
        assert_eq!(env_key("tool-id"), "INPUT_TOOL-ID");
        assert_eq!(env_key("context github"), "INPUT_CONTEXT_GITHUB");
    }

    #[test]
    fn test_env_reader_trims_values() {
        let reader = EnvConfigReader::with_lookup(|key| match key {
            "INPUT_TOOL-ID" => Ok("  tool-1 \n".to_string()),
            _ => Err(env::VarError::NotPresent),
        });

        assert_eq!(reader.get(TOOL_ID, true).unwrap(), "tool-1");
        assert_eq!(reader.get(TOKEN, false).unwrap(), "");
    }

    #[test]
    fn test_env_reader_required_empty_is_missing() {
        let reader = EnvConfigReader::with_lookup(|_| Ok(String::new()));

        let err = reader.get(INSTANCE_URL, true).unwrap_err();
        assert_eq!(
            err,
            RegistrationError::MissingInput {
                name: INSTANCE_URL.to_string()
            }
        );
    }

    #[test]
    fn test_required_whitespace_counts_as_supplied() {
        let reader = EnvConfigReader::with_lookup(|_| Ok("   ".to_string()));
        assert_eq!(reader.get(INSTANCE_URL, true).unwrap(), "");

        let map = MapConfigReader::from_pairs([(JOB_NAME, " \n")]);
        assert_eq!(map.get(JOB_NAME, true).unwrap(), "");
    }

    #[test]
    fn test_layered_reader_stops_at_supplied_blank() {
        let cli = MapConfigReader::from_pairs([(TOOL_ID, "  ")]);
        let env = MapConfigReader::from_pairs([(TOOL_ID, "from-env")]);
        let reader = LayeredConfigReader::new(vec![Box::new(cli), Box::new(env)]);

        assert_eq!(reader.get(TOOL_ID, true).unwrap(), "");
    }

    #[test]
    fn test_layered_reader_propagates_read_errors() {
        let broken = EnvConfigReader::with_lookup(|_| {
            Err(env::VarError::NotUnicode(std::ffi::OsString::from("x")))
        });
        let env = MapConfigReader::from_pairs([(TOOL_ID, "from-env")]);
        let reader = LayeredConfigReader::new(vec![Box::new(broken), Box::new(env)]);

        assert!(matches!(
            reader.get(TOOL_ID, true),
            Err(RegistrationError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_layered_reader_prefers_first_non_empty() {
        let cli = MapConfigReader::from_pairs([(TOOL_ID, "from-cli"), (JOB_NAME, "")]);
        let env = MapConfigReader::from_pairs([(TOOL_ID, "from-env"), (JOB_NAME, "deploy")]);
        let reader = LayeredConfigReader::new(vec![Box::new(cli), Box::new(env)]);

        assert_eq!(reader.get(TOOL_ID, true).unwrap(), "from-cli");
        assert_eq!(reader.get(JOB_NAME, true).unwrap(), "deploy");
        assert!(reader.get(PACKAGE_NAME, true).is_err());
        assert_eq!(reader.get(USERNAME, false).unwrap(), "");
    }

    #[test]
    fn test_read_inputs_keeps_optional_values_empty() {
        let inputs = RegistrationInputs::read(&required_inputs()).unwrap();

        assert_eq!(inputs.instance_url, "https://x.example.com/");
        assert_eq!(inputs.username, "");
        assert_eq!(inputs.password.expose_secret(), "");
        assert_eq!(inputs.token.expose_secret(), "");
        assert_eq!(inputs.artifacts, "[]");
    }

    #[test]
    fn test_read_inputs_reports_first_missing_input() {
        let mut reader = required_inputs();
        reader.insert(TOOL_ID, "");
        reader.insert(JOB_NAME, "");

        let err = RegistrationInputs::read(&reader).unwrap_err();
        assert_eq!(err.to_string(), "Input required and not supplied: tool-id");
    }
}
