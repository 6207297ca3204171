//! vmprov CLI - Main Entry Point
//!
//! Creates compute instances from a fixed profile, terminal prompts or a
//! JSON file, then optionally resizes the boot disk and suspends them.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use vmprov_cli::commands::{create, disk, instance};
use vmprov_cli::output::{self, print_error, print_info};
use vmprov_common::ProviderConfig;

/// vmprov - compute instance provisioning
#[derive(Parser)]
#[command(name = "vmprov")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value_os_t = vmprov_common::default_config_path())]
    config: PathBuf,

    /// Project ID
    #[arg(long, env = "VMPROV_PROJECT", global = true)]
    project: Option<String>,

    /// Zone
    #[arg(long, env = "VMPROV_ZONE", global = true)]
    zone: Option<String>,

    /// Service-account key file
    #[arg(long, env = "GOOGLE_APPLICATION_CREDENTIALS", global = true)]
    credentials: Option<PathBuf>,

    /// Operation wait timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Compute API endpoint
    #[arg(long, env = "VMPROV_API_ENDPOINT", global = true, hide = true)]
    api_endpoint: Option<String>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an instance, optionally resizing its disk and suspending it
    Create(create::CreateArgs),

    /// Resize a zonal disk
    ResizeDisk(disk::ResizeDiskArgs),

    /// Suspend a running instance
    Suspend(instance::SuspendArgs),
}

impl Cli {
    /// Load the configuration file and layer flags and environment on top
    fn provider_config(&self) -> vmprov_common::Result<ProviderConfig> {
        let mut config = ProviderConfig::load(&self.config)?;
        if let Some(project) = &self.project {
            config.project = Some(project.clone());
        }
        if let Some(zone) = &self.zone {
            config.zone = zone.clone();
        }
        if let Some(credentials) = &self.credentials {
            config.credentials = Some(credentials.clone());
        }
        if let Some(timeout) = self.timeout {
            config.operation_timeout_secs = timeout;
        }
        if let Some(endpoint) = &self.api_endpoint {
            config.api_endpoint = endpoint.clone();
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        print_error(&format!("{:#}", e));
        let auth_failure = e
            .downcast_ref::<vmprov_common::Error>()
            .is_some_and(|err| err.is_auth());
        if auth_failure {
            print_info(
                "Set GOOGLE_OAUTH_ACCESS_TOKEN or point GOOGLE_APPLICATION_CREDENTIALS at a service-account key",
            );
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.provider_config()?;
    tracing::debug!(
        version = vmprov_common::VERSION,
        config = %cli.config.display(),
        zone = %config.zone,
        "Configuration loaded"
    );

    match cli.command {
        Commands::Create(args) => create::execute(args, &config, cli.format).await?,
        Commands::ResizeDisk(args) => disk::execute(args, &config, cli.format).await?,
        Commands::Suspend(args) => instance::suspend(args, &config, cli.format).await?,
    }

    Ok(())
}
