//! `RustKey` CLI - Command-line interface for the `RustKey` keychain reader
//!
//! Provides commands for looking up stored passwords and inspecting which
//! secret store backends are usable on this host.

use clap::{Parser, Subcommand, ValueEnum};
use rustkey_core::secret::{desktop_hint, select_candidates};
use rustkey_core::{read_password, BackendRegistry, KeyringError};
use secrecy::ExposeSecret;

/// `RustKey` command-line interface for reading stored passwords
#[derive(Parser)]
#[command(name = "rustkey-cli")]
#[command(author, version, about = "RustKey command-line interface")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Look up a stored password
    #[command(about = "Look up the password stored for an application key")]
    Lookup {
        /// Key (account name) the password was stored under
        key: String,

        /// Application name that stored the password
        #[arg(short, long)]
        app: String,

        /// Human-readable application name (defaults to the app name)
        #[arg(short, long)]
        display_name: Option<String>,

        /// Output format for the looked-up secret
        #[arg(short, long, default_value = "text", value_enum)]
        format: OutputFormat,
    },

    /// Show detected backends and the candidate order for this host
    #[command(about = "List usable secret store backends")]
    Backends {
        /// Output format for the backend list
        #[arg(short, long, default_value = "text", value_enum)]
        format: OutputFormat,
    },
}

/// Output format for command results
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    /// Plain text
    Text,
    /// Output as JSON
    Json,
}

/// Errors surfaced by CLI command handlers
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Password lookup failure
    #[error("Lookup error: {0}")]
    Lookup(#[from] KeyringError),

    /// Output serialization failure
    #[error("Output error: {0}")]
    Output(String),
}

impl CliError {
    /// Maps errors to process exit codes
    pub const fn exit_code(&self) -> i32 {
        match self {
            // A key that resolves to no or multiple items exits with 2
            Self::Lookup(KeyringError::Cardinality { .. }) => 2,
            Self::Lookup(_) | Self::Output(_) => 1,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Lookup {
            key,
            app,
            display_name,
            format,
        } => cmd_lookup(&app, display_name.as_deref(), &key, format).await,
        Commands::Backends { format } => cmd_backends(format).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}

/// Password lookup command handler
async fn cmd_lookup(
    app: &str,
    display_name: Option<&str>,
    key: &str,
    format: OutputFormat,
) -> Result<(), CliError> {
    let display_name = display_name.unwrap_or(app);
    let secret = read_password(app, display_name, key).await?;

    match format {
        OutputFormat::Text => println!("{}", secret.expose_secret()),
        OutputFormat::Json => {
            let value = serde_json::json!({
                "app": app,
                "key": key,
                "password": secret.expose_secret(),
            });
            let rendered = serde_json::to_string_pretty(&value)
                .map_err(|e| CliError::Output(format!("Failed to serialize to JSON: {e}")))?;
            println!("{rendered}");
        }
    }
    Ok(())
}

/// Backend listing command handler
async fn cmd_backends(format: OutputFormat) -> Result<(), CliError> {
    let registry = BackendRegistry::detect().await;
    let detected = registry.backend_types();
    let candidates = select_candidates(std::env::consts::OS, desktop_hint().as_deref());

    match format {
        OutputFormat::Text => {
            println!("Candidate order for {}:", std::env::consts::OS);
            for backend in &candidates {
                let status = if registry.contains(*backend) {
                    "detected"
                } else {
                    "unavailable"
                };
                println!("  {backend} ({status})");
            }
        }
        OutputFormat::Json => {
            let value = serde_json::json!({
                "os": std::env::consts::OS,
                "candidates": candidates,
                "detected": detected,
            });
            let rendered = serde_json::to_string_pretty(&value)
                .map_err(|e| CliError::Output(format!("Failed to serialize to JSON: {e}")))?;
            println!("{rendered}");
        }
    }
    Ok(())
}
