//! Sending finished PDFs to the system printer.

use std::path::Path;
use std::time::Duration;

use mdprint_diagrams::{CommandError, ExternalCommand};

/// Default print spooler command.
pub const DEFAULT_PRINT_COMMAND: &str = "lpr";

/// Submits PDFs to a print spooler.
#[derive(Debug, Clone)]
pub struct Printer {
    command: String,
    timeout: Duration,
}

impl Default for Printer {
    fn default() -> Self {
        Self {
            command: DEFAULT_PRINT_COMMAND.to_owned(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl Printer {
    /// Create a printer using `lpr`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the spooler command.
    #[must_use]
    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    /// Submit `pdf` for printing.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] if the spooler is missing or rejects the job.
    pub fn print(&self, pdf: &Path) -> Result<(), CommandError> {
        ExternalCommand::new(&self.command)
            .arg(pdf)
            .timeout(self.timeout)
            .run()?;
        tracing::info!(path = %pdf.display(), command = %self.command, "Sent to printer");
        Ok(())
    }
}
