//! PDF rendering engine capability.

use std::path::Path;
use std::time::Duration;

use mdprint_diagrams::ExternalCommand;

use crate::error::EngineError;

/// Turns an HTML document and stylesheet into PDF bytes.
///
/// Paper size, margins, columns, and page counters all come from the
/// stylesheet; the engine only lays out what it is given.
pub trait PdfEngine: Send + Sync {
    /// Render `html` styled by `stylesheet`.
    ///
    /// Relative resources (images) resolve against `base_dir`.
    fn render(&self, html: &str, stylesheet: &str, base_dir: &Path) -> Result<Vec<u8>, EngineError>;
}

/// Default engine executable.
pub const DEFAULT_PDF_COMMAND: &str = "weasyprint";

/// Renders PDFs by spawning WeasyPrint.
///
/// Runs `weasyprint <input.html> <output.pdf> -s <style.css> -u <base-dir>`
/// inside a temporary directory that is removed afterwards.
#[derive(Debug, Clone)]
pub struct WeasyPrintEngine {
    command: String,
    timeout: Duration,
}

impl Default for WeasyPrintEngine {
    fn default() -> Self {
        Self {
            command: DEFAULT_PDF_COMMAND.to_owned(),
            timeout: Duration::from_secs(120),
        }
    }
}

impl WeasyPrintEngine {
    /// Create an engine with the default command and timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the executable.
    #[must_use]
    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    /// Set the per-document timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl PdfEngine for WeasyPrintEngine {
    fn render(&self, html: &str, stylesheet: &str, base_dir: &Path) -> Result<Vec<u8>, EngineError> {
        let workdir = tempfile::Builder::new().prefix("mdprint-pdf").tempdir()?;
        let input = workdir.path().join("document.html");
        let css = workdir.path().join("print.css");
        let output = workdir.path().join("document.pdf");
        std::fs::write(&input, html)?;
        std::fs::write(&css, stylesheet)?;

        let result = ExternalCommand::new(&self.command)
            .arg(&input)
            .arg(&output)
            .arg("-s")
            .arg(&css)
            .arg("-u")
            .arg(base_dir)
            .timeout(self.timeout)
            .run()?;
        if !result.stderr.is_empty() {
            tracing::debug!(stderr = %result.stderr, "PDF engine diagnostics");
        }

        match std::fs::read(&output) {
            Ok(pdf) if !pdf.is_empty() => Ok(pdf),
            Ok(_) => Err(EngineError::NoOutput {
                program: self.command.clone(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(EngineError::NoOutput {
                program: self.command.clone(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdprint_diagrams::CommandError;

    #[test]
    fn test_missing_engine() {
        let engine = WeasyPrintEngine::new().command("mdprint-missing-weasyprint");
        let err = engine
            .render("<html></html>", "", Path::new("."))
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Tool(CommandError::NotInstalled { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_engine_without_output() {
        let engine = WeasyPrintEngine::new().command("true");
        let err = engine
            .render("<html></html>", "", Path::new("."))
            .unwrap_err();
        assert!(matches!(err, EngineError::NoOutput { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_engine_failure_is_reported() {
        let engine = WeasyPrintEngine::new().command("false");
        let err = engine
            .render("<html></html>", "", Path::new("."))
            .unwrap_err();
        assert!(matches!(err, EngineError::Tool(CommandError::Failed { .. })));
    }
}
