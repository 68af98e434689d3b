//! Serve mode: browse and preview a directory with live reload.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use mdprint_config::Config;
use mdprint_diagrams::{DiagramMode, ExternalCommand};
use mdprint_pipeline::Converter;
use mdprint_server::{ServerConfig, run_server};

use crate::error::CliError;
use crate::output::Output;

/// Listen address parsed from `--serve [HOST:]PORT`.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ListenAddr {
    pub(crate) host: Option<String>,
    pub(crate) port: Option<u16>,
}

impl ListenAddr {
    /// Parse `PORT`, `HOST:PORT`, or `HOST:` (an empty value keeps both defaults).
    pub(crate) fn parse(value: &str) -> Result<Self, CliError> {
        let (host, port) = match value.rsplit_once(':') {
            Some((host, port)) => (Some(host), port),
            None => (None, value),
        };
        let port = if port.is_empty() {
            None
        } else {
            Some(port.parse::<u16>().map_err(|_| {
                CliError::Validation(format!("invalid port in --serve {value:?}"))
            })?)
        };
        Ok(Self {
            host: host.filter(|h| !h.is_empty()).map(str::to_owned),
            port,
        })
    }
}

/// Serve `root` until Ctrl-C.
pub(crate) async fn run(
    converter: Converter,
    root: &Path,
    config: &Config,
    recursive: bool,
    open: bool,
    output: &Output,
) -> Result<(), CliError> {
    if !root.is_dir() {
        return Err(CliError::Validation(format!(
            "--serve needs a directory: {}",
            root.display()
        )));
    }

    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        root: root.to_path_buf(),
        debounce: config.watch.debounce(),
        recursive,
    };
    let converter = Arc::new(converter.diagram_mode(DiagramMode::ClientSideMermaid));

    run_server(server_config, converter, |url| {
        output.highlight("Serving", &format!("{} at {url}", root.display()));
        output.info("Press Ctrl-C to stop");
        if open {
            open_browser(url);
        }
    })
    .await?;

    output.info("Server stopped");
    Ok(())
}

/// Launch the system browser in the background.
fn open_browser(url: &str) {
    let program = if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(windows) {
        "explorer"
    } else {
        "xdg-open"
    };
    let command = ExternalCommand::new(program)
        .arg(url)
        .timeout(Duration::from_secs(10));
    std::thread::spawn(move || {
        if let Err(e) = command.run() {
            tracing::warn!(error = %e, "Cannot open browser");
        }
    });
}
