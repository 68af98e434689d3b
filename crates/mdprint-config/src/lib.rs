//! Configuration management for mdprint.
//!
//! Parses `mdprint.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Command Expansion
//!
//! External tool commands support shell-style expansion:
//!
//! - `~/bin/mmdc` - expands to the user's home directory
//! - `$VAR/mmdc` or `${VAR}/mmdc` - expands to the value of VAR, errors if unset
//!
//! Expanded fields:
//! - `pdf.command`
//! - `diagrams.mermaid_command`
//! - `diagrams.svgbob_command`

mod expand;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override watch debounce window.
    pub debounce_ms: Option<u64>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "mdprint.toml";

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Print layout thresholds.
    pub layout: LayoutConfig,
    /// PDF rendering engine configuration.
    pub pdf: PdfConfig,
    /// External diagram tool configuration.
    pub diagrams: DiagramsConfig,
    /// Watch mode configuration.
    pub watch: WatchConfig,
    /// Serve mode configuration.
    pub server: ServerConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Print layout configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Tables with at most this many columns stay within one print column.
    pub narrow_table_max_columns: usize,
    /// Lists with more items than this are split into groups of this size.
    pub list_split_threshold: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            narrow_table_max_columns: 3,
            list_split_threshold: 20,
        }
    }
}

/// PDF rendering engine configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Rendering engine executable.
    pub command: String,
    /// Maximum time a single rendering may take.
    pub timeout_secs: u64,
    /// Extra stylesheet appended after the built-in print CSS.
    pub stylesheet: Option<PathBuf>,
    /// Syntax highlighting theme for code blocks.
    pub highlight_theme: String,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            command: "weasyprint".to_owned(),
            timeout_secs: 120,
            stylesheet: None,
            highlight_theme: "InspiredGitHub".to_owned(),
        }
    }
}

impl PdfConfig {
    /// Rendering timeout as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Diagram tool configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DiagramsConfig {
    /// Whether diagram blocks are rendered at all.
    ///
    /// When disabled, diagram blocks are highlighted as ordinary code.
    pub enabled: bool,
    /// Mermaid CLI executable.
    pub mermaid_command: String,
    /// Svgbob executable used for ASCII diagrams.
    pub svgbob_command: String,
    /// Maximum time a single diagram may take to render.
    pub timeout_secs: u64,
}

impl Default for DiagramsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mermaid_command: "mmdc".to_owned(),
            svgbob_command: "svgbob_cli".to_owned(),
            timeout_secs: 30,
        }
    }
}

impl DiagramsConfig {
    /// Diagram timeout as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Watch mode configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Window in which repeated events for one path collapse into one.
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: 500 }
    }
}

impl WatchConfig {
    /// Debounce window as a [`Duration`].
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 7979,
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`pdf.command`").
        field: String,
        /// Error message.
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a numeric field to be positive.
fn require_positive(value: u64, field: &str) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Validation(format!(
            "{field} must be greater than 0"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `mdprint.toml` in current directory and parents,
    /// falling back to defaults when none is found.
    ///
    /// CLI settings are applied after loading, allowing CLI arguments to take
    /// precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(debounce_ms) = settings.debounce_ms {
            self.watch.debounce_ms = debounce_ms;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_commands()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file and after CLI overrides.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.layout.narrow_table_max_columns == 0 {
            return Err(ConfigError::Validation(
                "layout.narrow_table_max_columns must be greater than 0".to_owned(),
            ));
        }
        if self.layout.list_split_threshold == 0 {
            return Err(ConfigError::Validation(
                "layout.list_split_threshold must be greater than 0".to_owned(),
            ));
        }

        require_non_empty(&self.pdf.command, "pdf.command")?;
        require_positive(self.pdf.timeout_secs, "pdf.timeout_secs")?;

        require_non_empty(&self.diagrams.mermaid_command, "diagrams.mermaid_command")?;
        require_non_empty(&self.diagrams.svgbob_command, "diagrams.svgbob_command")?;
        require_positive(self.diagrams.timeout_secs, "diagrams.timeout_secs")?;

        require_non_empty(&self.server.host, "server.host")?;

        Ok(())
    }

    /// Expand home directory and environment references in tool commands.
    fn expand_commands(&mut self) -> Result<(), ConfigError> {
        self.pdf.command = expand::expand_command(&self.pdf.command, "pdf.command")?;
        self.diagrams.mermaid_command =
            expand::expand_command(&self.diagrams.mermaid_command, "diagrams.mermaid_command")?;
        self.diagrams.svgbob_command =
            expand::expand_command(&self.diagrams.svgbob_command, "diagrams.svgbob_command")?;
        Ok(())
    }

    /// Resolve relative paths against the config file's directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        if let Some(stylesheet) = &self.pdf.stylesheet
            && stylesheet.is_relative()
        {
            self.pdf.stylesheet = Some(config_dir.join(stylesheet));
        }
    }
}
