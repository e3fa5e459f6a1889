//! Package Registration Step - registers a package with ServiceNow DevOps
//!
//! Runs the whole registration as one linear flow:
//! - Input acquisition and JSON parsing
//! - Payload construction from the pipeline context
//! - Auth scheme and endpoint selection
//! - A single POST to the registration API
//! - Classification of any failure into one pipeline-facing message

use crate::core::config::{CONTEXT_GITHUB, RegistrationInputs, normalize_instance_url};
use crate::core::error::{RegistrationError, ServiceError};
use crate::core::payload::{PipelineContext, RegistrationPayload, parse_artifacts};
use crate::core::safe_json::to_string_with_cycle_guard;
use crate::core::traits::{ConfigReader, RegistrationClient, RegistrationRequest, Reporter};
use crate::orchestration::failure::classify;
use crate::security::credentials::{ApiVersion, AuthContext, SecretMasker};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Options controlling a registration run
#[derive(Debug, Clone, Default)]
pub struct RegistrationOptions {
    /// Build and log the request but do not send it
    pub dry_run: bool,
}

/// Outcome of one registration run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistrationReport {
    pub success: bool,
    pub endpoint: Option<String>,
    pub api_version: Option<ApiVersion>,
    /// Whether the POST was attempted
    pub dispatched: bool,
    /// Failure messages reported to the pipeline, in order
    pub failures: Vec<String>,
    /// Suggested actions for the reported failures
    pub hints: Vec<String>,
    pub duration: u64,
}

/// The registration step with its injected capabilities
pub struct PackageRegistrationStep {
    config: Arc<dyn ConfigReader>,
    reporter: Arc<dyn Reporter>,
    client: Arc<dyn RegistrationClient>,
    options: RegistrationOptions,
}

impl PackageRegistrationStep {
    pub fn new(
        config: Arc<dyn ConfigReader>,
        reporter: Arc<dyn Reporter>,
        client: Arc<dyn RegistrationClient>,
    ) -> Self {
        Self {
            config,
            reporter,
            client,
            options: RegistrationOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RegistrationOptions) -> Self {
        self.options = options;
        self
    }

    /// Run the registration
    ///
    /// Never returns an error: every failure is reported through the
    /// [`Reporter`] and listed in the returned report.
    pub async fn run(&self) -> RegistrationReport {
        let start_time = Instant::now();
        let mut report = RegistrationReport::default();

        if let Err(error) = self.execute(&mut report).await {
            self.report_failure(&mut report, &error);
        }

        report.success = report.failures.is_empty();
        report.duration = start_time.elapsed().as_millis() as u64;
        report
    }

    fn report_failure(&self, report: &mut RegistrationReport, error: &RegistrationError) {
        let message = error.to_string();
        warn!(
            code = error.code(),
            config = error.is_config_error(),
            aborts = error.aborts_run(),
            "{}",
            message
        );
        self.reporter.fail(&message);
        report.failures.push(message);
        report.hints.extend(
            error
                .suggested_actions()
                .into_iter()
                .map(|action| action.to_string()),
        );
    }

    async fn execute(&self, report: &mut RegistrationReport) -> Result<(), RegistrationError> {
        let inputs = RegistrationInputs::read(self.config.as_ref())?;
        let artifacts = parse_artifacts(&inputs.artifacts)?;

        let raw_context = self.config.get(CONTEXT_GITHUB, true)?;
        let context = match PipelineContext::parse(&raw_context) {
            Ok(context) => context,
            Err((context, error)) => {
                self.report_failure(report, &error);
                context
            }
        };

        let instance_url = normalize_instance_url(&inputs.instance_url);
        let payload = RegistrationPayload::build(
            &inputs.package_name,
            &inputs.job_name,
            artifacts,
            &context,
        )?;
        let body = payload.to_json()?;
        self.reporter
            .info(&format!("payload to register package: {}", body));

        let auth = AuthContext::select(
            &inputs.tool_id,
            &inputs.token,
            &inputs.username,
            &inputs.password,
        )?;
        for secret in auth.secrets() {
            self.reporter.mask(&secret);
        }
        let masker = SecretMasker::for_auth(&auth);

        let endpoint = auth.endpoint(&instance_url, &inputs.tool_id);
        info!(endpoint = %endpoint, auth = %auth.describe(), "registering package");
        report.endpoint = Some(endpoint.clone());
        report.api_version = Some(auth.api_version());

        let request = RegistrationRequest {
            endpoint,
            headers: auth.headers(),
            body,
        };

        if self.options.dry_run {
            self.reporter
                .info("dry run: registration request was not sent");
            return Ok(());
        }

        report.dispatched = true;
        match self.client.post(&request).await {
            Ok(response) => {
                debug!(response = %masker.mask(&response.to_string()), "package registered");
                Ok(())
            }
            Err(error) => self.handle_service_error(&error, &masker),
        }
    }

    fn handle_service_error(
        &self,
        error: &ServiceError,
        masker: &SecretMasker,
    ) -> Result<(), RegistrationError> {
        let dump = serde_json::to_value(error)
            .map(|value| to_string_with_cycle_guard(&value))
            .unwrap_or_else(|_| error.message.clone());
        self.reporter.debug(&masker.mask(&format!(
            "[ServiceNow DevOps] Package Registration, Error: {}",
            dump
        )));

        let classification = classify(error);
        if let Some(response) = classification.response_dump {
            self.reporter.debug(&masker.mask(&format!(
                "[ServiceNow DevOps] Package Registration, Response data :{}",
                response
            )));
        }

        match classification.failure {
            Some(failure) => Err(failure),
            None => {
                warn!(status = ?error.status, "registration rejected without a recognizable reason");
                Ok(())
            }
        }
    }
}
