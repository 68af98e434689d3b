//! mdprint CLI - Markdown to two-column print PDF.
//!
//! Modes:
//! - `mdprint PATH`: convert a Markdown file, or every stale file in a directory
//! - `mdprint PATH --watch`: convert, then reconvert on change
//! - `mdprint DIR --serve [HOST:]PORT`: browse and preview with live reload

mod commands;
mod error;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use mdprint_config::{CliSettings, Config};
use mdprint_pipeline::{Converter, Printer};
use tracing_subscriber::EnvFilter;

use commands::ConvertOptions;
use commands::serve::ListenAddr;
use error::CliError;
use output::Output;

/// Convert Markdown into print-optimized two-column PDFs.
#[derive(Parser)]
#[command(name = "mdprint", version, about)]
struct Cli {
    /// Markdown file or directory.
    path: PathBuf,

    /// Keep running and reconvert files as they change.
    #[arg(short, long, conflicts_with = "serve")]
    watch: bool,

    /// Reconvert even when the PDF is up to date.
    #[arg(short, long)]
    force: bool,

    /// Only convert files directly inside the directory.
    #[arg(long)]
    no_recursive: bool,

    /// Also write the intermediate HTML next to each PDF.
    #[arg(long)]
    debug: bool,

    /// Send each written PDF to the system printer.
    #[arg(long)]
    print: bool,

    /// Serve a live preview instead of converting.
    #[arg(long, value_name = "[HOST:]PORT", num_args = 0..=1, default_missing_value = "")]
    serve: Option<String>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Open the preview in a browser.
    #[arg(long, requires = "serve")]
    open: bool,

    /// Path to configuration file (default: auto-discover mdprint.toml).
    #[arg(short, long, env = "MDPRINT_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = run(cli, &output);
    if let Err(err) = &result {
        output.error(&err.to_string());
    }
    exit_code(&result)
}

fn exit_code(result: &Result<(), CliError>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

fn run(cli: Cli, output: &Output) -> Result<(), CliError> {
    let listen = cli.serve.as_deref().map(ListenAddr::parse).transpose()?;

    let (serve_host, serve_port) = listen
        .map(|addr| (addr.host, addr.port))
        .unwrap_or_default();
    let cli_settings = CliSettings {
        host: cli.host.or(serve_host),
        port: cli.port.or(serve_port),
        debounce_ms: None,
    };
    let config = Config::load(cli.config.as_deref(), Some(&cli_settings))?;
    if let Some(path) = &config.config_path {
        tracing::info!(path = %path.display(), "Loaded configuration");
    }

    commands::convert::check_target(&cli.path)?;
    let converter = Converter::from_config(&config)?.write_html(cli.debug);
    let recursive = !cli.no_recursive;

    if cli.serve.is_some() {
        let runtime = tokio::runtime::Runtime::new()?;
        return runtime.block_on(commands::serve::run(
            converter,
            &cli.path,
            &config,
            recursive,
            cli.open,
            output,
        ));
    }

    let options = ConvertOptions {
        force: cli.force,
        recursive,
        printer: cli.print.then(Printer::new),
    };

    if cli.watch {
        return commands::watch::run(
            &converter,
            &cli.path,
            config.watch.debounce(),
            &options,
            output,
        );
    }

    let report = commands::convert::run(&converter, &cli.path, &options, output)?;
    commands::convert::check_report(&report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_serve_without_value() {
        let cli = Cli::try_parse_from(["mdprint", "docs", "--serve"]).unwrap();
        assert_eq!(cli.serve.as_deref(), Some(""));
    }

    #[test]
    fn test_serve_with_address() {
        let cli = Cli::try_parse_from(["mdprint", "docs", "--serve", "0.0.0.0:8000", "--open"]).unwrap();
        assert_eq!(cli.serve.as_deref(), Some("0.0.0.0:8000"));
        assert!(cli.open);
    }

    #[test]
    fn test_open_requires_serve() {
        assert!(Cli::try_parse_from(["mdprint", "docs", "--open"]).is_err());
    }

    #[test]
    fn test_failed_conversions_exit_nonzero() {
        assert_eq!(exit_code(&Ok(())), ExitCode::SUCCESS);
        assert_eq!(exit_code(&Err(CliError::Failed(1))), ExitCode::FAILURE);
    }

    #[test]
    fn test_watch_conflicts_with_serve() {
        assert!(Cli::try_parse_from(["mdprint", "docs", "--watch", "--serve", "8000"]).is_err());
    }
}
