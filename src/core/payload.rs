//! Registration payload and the pipeline context it is derived from

use crate::core::error::RegistrationError;
use serde::Serialize;
use serde_json::Value;

/// Pipeline context handed to the step as `context-github`
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineContext {
    /// Valid JSON
    Parsed(Value),
    /// Raw input that failed to parse; every field reads as missing
    Unparsed(String),
}

impl PipelineContext {
    /// Parse the raw context
    ///
    /// On failure the raw text is kept alongside the error so the run can go
    /// on with an empty context.
    pub fn parse(raw: &str) -> Result<Self, (Self, RegistrationError)> {
        serde_json::from_str::<Value>(raw).map(Self::Parsed).map_err(|e| {
            (
                Self::Unparsed(raw.to_string()),
                RegistrationError::ContextParse {
                    message: e.to_string(),
                },
            )
        })
    }

    /// Look up a top-level field
    ///
    /// A `null` context has no fields to read and is an error; any other
    /// non-object context simply has none.
    pub fn field(&self, name: &str) -> Result<Option<&Value>, RegistrationError> {
        match self {
            Self::Parsed(Value::Null) => Err(RegistrationError::PayloadBuild {
                message: format!("cannot read '{}' of a null pipeline context", name),
            }),
            Self::Parsed(Value::Object(map)) => Ok(map.get(name)),
            Self::Parsed(_) | Self::Unparsed(_) => Ok(None),
        }
    }

    fn text(&self, name: &str) -> Result<String, RegistrationError> {
        self.field(name).map(interpolate)
    }
}

/// Render a JSON value the way a template string would
///
/// Missing values read `undefined`, arrays are comma-joined and objects
/// collapse to `[object Object]`.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use sn_package_registration::core::payload::interpolate;
///
/// assert_eq!(interpolate(Some(&json!("main"))), "main");
/// assert_eq!(interpolate(Some(&json!(42))), "42");
/// assert_eq!(interpolate(None), "undefined");
/// ```
pub fn interpolate(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(Value::Null) => "null".to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) if !n.is_i64() && !n.is_u64() => f.to_string(),
            _ => n.to_string(),
        },
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => interpolate(Some(other)),
            })
            .collect::<Vec<_>>()
            .join(","),
        Some(Value::Object(_)) => "[object Object]".to_string(),
    }
}

/// Truthiness of a JSON value as a dynamic language would see it
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Body of the package registration request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationPayload {
    pub name: String,
    pub artifacts: Value,
    pub pipeline_name: String,
    pub stage_name: String,
    pub task_execution_number: String,
    pub branch_name: String,
}

impl RegistrationPayload {
    pub fn build(
        package_name: &str,
        job_name: &str,
        artifacts: Value,
        context: &PipelineContext,
    ) -> Result<Self, RegistrationError> {
        let pipeline_name = format!(
            "{}/{}",
            context.text("repository")?,
            context.text("workflow")?
        );
        let task_execution_number = format!(
            "{}/attempts/{}",
            context.text("run_id")?,
            context.text("run_attempt")?
        );
        let branch_name = context.text("ref_name")?;

        Ok(Self {
            name: package_name.to_string(),
            artifacts,
            pipeline_name,
            stage_name: job_name.to_string(),
            task_execution_number,
            branch_name,
        })
    }

    pub fn to_json(&self) -> Result<String, RegistrationError> {
        serde_json::to_string(self).map_err(|e| RegistrationError::PayloadBuild {
            message: e.to_string(),
        })
    }
}

/// Parse the `artifacts` input
pub fn parse_artifacts(raw: &str) -> Result<Value, RegistrationError> {
    serde_json::from_str(raw).map_err(|e| RegistrationError::ArtifactsParse {
        message: e.to_string(),
    })
}
