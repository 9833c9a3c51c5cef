//! Berth - Portainer stack deployment for CI pipelines
//!
//! Usage:
//!   berth --branch main --commit $SHA --stack-name web ...
//!
//! Every option can also be supplied through its `BERTH_*` environment
//! variable. Exits 0 when the stack was reconciled, 1 on any failure.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use berth_core::config::{DEFAULT_COMPOSE_FILE, DeployMode, DeployOptions, load_compose_file};
use berth_core::deploy::{DeployReport, deploy};
use berth_core::stack::StackOutcome;

#[derive(Parser)]
#[command(name = "berth", version)]
#[command(about = "Pull release images and reconcile a Portainer stack", long_about = None)]
struct Cli {
    /// Branch being deployed
    #[arg(long, env = "BERTH_BRANCH")]
    branch: String,

    /// Commit hash being deployed (first 8 characters end up in the tag)
    #[arg(long, env = "BERTH_COMMIT")]
    commit: Option<String>,

    /// Base URL of the Portainer instance
    #[arg(long, env = "BERTH_PORTAINER_URL")]
    portainer_url: String,

    /// Portainer username
    #[arg(long, env = "BERTH_USERNAME")]
    username: String,

    /// Portainer password
    #[arg(long, env = "BERTH_PASSWORD", hide_env_values = true)]
    password: String,

    /// Comma-separated images to pull before deploying
    #[arg(long, env = "BERTH_IMAGES", default_value = "")]
    images: String,

    /// Stack to create or update
    #[arg(long, env = "BERTH_STACK_NAME")]
    stack_name: String,

    /// Portainer endpoint hosting the stack
    #[arg(long, env = "BERTH_ENDPOINT_NAME")]
    endpoint_name: String,

    /// Extra stack environment as a JSON object
    #[arg(long, env = "BERTH_STACK_ENV")]
    stack_env: Option<String>,

    /// Compose file describing the stack
    #[arg(long, env = "BERTH_COMPOSE_FILE", default_value = DEFAULT_COMPOSE_FILE)]
    compose_file: PathBuf,

    /// Deploy to a standalone Docker host instead of a swarm
    #[arg(
        long,
        env = "BERTH_STANDALONE",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    standalone: bool,

    /// Re-pull images when updating an existing stack
    #[arg(
        long,
        env = "BERTH_FORCE_PULL",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    force_pull: bool,

    /// Per-request timeout in seconds
    #[arg(long, env = "BERTH_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Summary format
    #[arg(short, long, env = "BERTH_FORMAT", default_value = "text")]
    format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable summary
    #[default]
    Text,
    /// Machine-readable JSON
    Json,
}

impl Cli {
    fn deploy_options(&self) -> Result<DeployOptions> {
        let mut options =
            DeployOptions::new(&self.portainer_url, &self.stack_name, &self.endpoint_name)?
                .with_credentials(&self.username, &self.password)
                .with_revision(&self.branch, self.commit.as_deref().unwrap_or_default())
                .with_images(&self.images)
                .with_compose_file(&self.compose_file)
                .with_mode(DeployMode::from_standalone(self.standalone))
                .with_force_pull(self.force_pull);

        if let Some(json) = &self.stack_env {
            options = options.with_stack_env_json(json)?;
        }
        if let Some(secs) = self.timeout_secs {
            options = options.with_timeout(Duration::from_secs(secs));
        }
        Ok(options)
    }
}

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "berth=info,berth_core=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version are not failures
            let code = if err.use_stderr() { 1 } else { 0 };
            let _ = err.print();
            return ExitCode::from(code);
        }
    };

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("deployment failed: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let options = cli.deploy_options()?;
    let compose = load_compose_file(&options.compose_file)?;

    let runtime = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    let report = runtime.block_on(deploy(&options, &compose))?;

    print_report(cli.format, &report)
}

fn print_report(format: OutputFormat, report: &DeployReport) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(report)
                .context("Failed to serialize deployment report")?;
            println!("{json}");
        }
        OutputFormat::Text => {
            let action = match report.stack {
                StackOutcome::Created { .. } => "Created",
                StackOutcome::Updated { .. } => "Updated",
            };
            match report.stack.id() {
                Some(id) => println!(
                    "{action} stack '{}' (id {id}) on endpoint {}",
                    report.stack_name, report.endpoint_id
                ),
                None => println!(
                    "{action} stack '{}' on endpoint {}",
                    report.stack_name, report.endpoint_id
                ),
            }
            println!("Release tag: {}", report.release_tag);
            if report.pulled_images.is_empty() {
                println!("Images pulled: none");
            } else {
                println!("Images pulled:");
                for image in &report.pulled_images {
                    println!("  {image}");
                }
            }
        }
    }
    Ok(())
}
