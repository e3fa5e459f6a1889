//! ServiceNow DevOps package registration step
//!
//! Reads the step inputs from `INPUT_*` environment variables (as set by the
//! GitHub Actions runner), optionally overridden by flags.

use anyhow::{Context, Result};
use clap::Parser;
use sn_package_registration::core::config::{
    ARTIFACTS, CONTEXT_GITHUB, INSTANCE_URL, JOB_NAME, PACKAGE_NAME, PASSWORD, TOKEN, TOOL_ID,
    USERNAME,
};
use sn_package_registration::{
    ActionsReporter, EnvConfigReader, HttpRegistrationClient, LayeredConfigReader,
    MapConfigReader, PackageRegistrationStep, RegistrationOptions,
};
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Register a package with ServiceNow DevOps
#[derive(Parser)]
#[command(name = "sn-package-registration")]
#[command(version)]
#[command(about = "Register a package artifact with ServiceNow DevOps", long_about = None)]
struct Cli {
    /// ServiceNow instance URL
    #[arg(long)]
    instance_url: Option<String>,

    /// Orchestration tool id
    #[arg(long)]
    tool_id: Option<String>,

    /// Integration user name (Basic Auth)
    #[arg(long)]
    devops_integration_user_name: Option<String>,

    /// Integration user password (Basic Auth)
    #[arg(long)]
    devops_integration_user_password: Option<String>,

    /// Integration token (token auth)
    #[arg(long)]
    devops_integration_token: Option<String>,

    /// Package name
    #[arg(long)]
    package_name: Option<String>,

    /// Job (stage) name
    #[arg(long)]
    job_name: Option<String>,

    /// Artifacts as a JSON array
    #[arg(long)]
    artifacts: Option<String>,

    /// GitHub context as a JSON object
    #[arg(long)]
    context_github: Option<String>,

    /// Build and log the request without sending it
    #[arg(long)]
    dry_run: bool,

    /// Enable debug diagnostics on stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Inputs given as flags, keyed by their workflow name
    fn overrides(&self) -> MapConfigReader {
        let flags = [
            (INSTANCE_URL, &self.instance_url),
            (TOOL_ID, &self.tool_id),
            (USERNAME, &self.devops_integration_user_name),
            (PASSWORD, &self.devops_integration_user_password),
            (TOKEN, &self.devops_integration_token),
            (PACKAGE_NAME, &self.package_name),
            (JOB_NAME, &self.job_name),
            (ARTIFACTS, &self.artifacts),
            (CONTEXT_GITHUB, &self.context_github),
        ];

        MapConfigReader::from_pairs(
            flags
                .into_iter()
                .filter_map(|(name, value)| value.clone().map(|v| (name, v))),
        )
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    match run().await {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("::error::{:#}", e);
            process::exit(1);
        }
    }
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = LayeredConfigReader::new(vec![
        Box::new(cli.overrides()),
        Box::new(EnvConfigReader::new()),
    ]);
    let reporter = Arc::new(ActionsReporter::stdout());
    let client = HttpRegistrationClient::new().context("Failed to create HTTP client")?;

    let step = PackageRegistrationStep::new(Arc::new(config), reporter.clone(), Arc::new(client))
        .with_options(RegistrationOptions {
            dry_run: cli.dry_run,
        });

    let report = step.run().await;
    tracing::debug!(
        success = report.success,
        dispatched = report.dispatched,
        duration_ms = report.duration,
        "registration finished"
    );

    if !report.hints.is_empty() {
        eprintln!("Suggested actions:");
        for hint in &report.hints {
            eprintln!("  - {}", hint);
        }
    }

    Ok(reporter.exit_code())
}
