// crates/piwigo-mock-cli/src/main.rs
// ============================================================================
// Module: Piwigo Mock CLI Entry Point
// Description: Command dispatcher for the mock Piwigo server.
// Purpose: Start the mock server or provision certificate material.
// Dependencies: clap, piwigo-mock-config, piwigo-mock-server, thiserror, tokio.
// ============================================================================

//! ## Overview
//! `piwigo-mock` loads `piwigo-mock.toml` (or an explicit `--config`), applies
//! command-line overrides, and serves until terminated. The `generate-cert`
//! subcommand writes fresh certificate material without starting a listener.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use piwigo_mock_config::ConnectionMode;
use piwigo_mock_config::MockServerConfig;
use piwigo_mock_server::CertificateRequest;
use piwigo_mock_server::MockServer;
use piwigo_mock_server::generate_certificate;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "piwigo-mock",
    about = "Mock Piwigo web-service endpoint for client integration tests",
    disable_help_subcommand = true,
    disable_version_flag = true,
    args_conflicts_with_subcommands = true
)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue)]
    show_version: bool,
    /// Server options used when no subcommand is given.
    #[command(flatten)]
    serve: ServeArgs,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Options for serving requests.
#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Optional config file path (defaults to piwigo-mock.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Listening port (overrides `server.port`).
    #[arg(long, value_name = "PORT")]
    port: Option<u16>,
    /// Serve over TLS with a freshly generated self-signed certificate.
    #[arg(long, action = ArgAction::SetTrue)]
    ssl: bool,
    /// Serve each connection on its own task.
    #[arg(long, action = ArgAction::SetTrue)]
    concurrent: bool,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a new self-signed certificate and key, then exit.
    GenerateCert(GenerateCertCommand),
}

/// Arguments for `generate-cert`.
#[derive(Args, Debug)]
struct GenerateCertCommand {
    /// Optional config file path supplying subject and validity.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Certificate output path (overrides `tls.cert_path`).
    #[arg(long, value_name = "PATH")]
    cert: Option<PathBuf>,
    /// Private key output path (overrides `tls.key_path`).
    #[arg(long, value_name = "PATH")]
    key: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&format!("piwigo-mock {version}"))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    match cli.command {
        Some(Commands::GenerateCert(command)) => command_generate_cert(command).await,
        None => command_serve(cli.serve).await,
    }
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Serves requests until the process is terminated.
async fn command_serve(args: ServeArgs) -> CliResult<ExitCode> {
    let mut config = load_config(args.config.as_deref())?;
    apply_serve_overrides(&mut config, &args);

    let server = MockServer::from_config(config)
        .map_err(|err| CliError::new(format!("failed to start server: {err}")))?;
    server.serve().await.map_err(|err| CliError::new(format!("server failed: {err}")))?;

    Ok(ExitCode::SUCCESS)
}

/// Applies command-line overrides on top of file configuration.
fn apply_serve_overrides(config: &mut MockServerConfig, args: &ServeArgs) {
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.ssl {
        config.server.tls = true;
    }
    if args.concurrent {
        config.server.connection_mode = ConnectionMode::Concurrent;
    }
}

// ============================================================================
// SECTION: Certificate Command
// ============================================================================

/// Generates and writes certificate material.
async fn command_generate_cert(command: GenerateCertCommand) -> CliResult<ExitCode> {
    let mut config = load_config(command.config.as_deref())?;
    if let Some(cert) = command.cert {
        config.tls.cert_path = cert.display().to_string();
    }
    if let Some(key) = command.key {
        config.tls.key_path = key.display().to_string();
    }
    config.validate().map_err(|err| CliError::new(format!("invalid config: {err}")))?;

    let request = CertificateRequest::from_config(&config.tls);
    let material = tokio::task::spawn_blocking(move || generate_certificate(&request))
        .await
        .map_err(|err| CliError::new(format!("certificate generation join failed: {err}")))?
        .map_err(|err| CliError::new(format!("certificate generation failed: {err}")))?;
    material
        .write_pem_files(Path::new(&config.tls.cert_path), Path::new(&config.tls.key_path))
        .map_err(|err| CliError::new(err.to_string()))?;

    write_stdout_line(&format!(
        "Wrote certificate to {} and key to {}",
        config.tls.cert_path, config.tls.key_path
    ))
    .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Loads configuration from the resolved path.
fn load_config(path: Option<&Path>) -> CliResult<MockServerConfig> {
    MockServerConfig::load(path)
        .map_err(|err| CliError::new(format!("Failed to load config: {err}")))
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}

// ============================================================================
// SECTION: Tests
// ============================================================================
