//! Diagram rendering capability and its command-line implementation.

use std::path::PathBuf;
use std::time::Duration;

use crate::command::{CommandError, ExternalCommand};
use crate::language::DiagramKind;

/// Reason a diagram could not be rendered.
///
/// Always recoverable: callers substitute a placeholder and continue.
#[derive(Debug, thiserror::Error)]
pub enum RenderUnavailable {
    #[error("diagram source is empty")]
    EmptySource,
    #[error(transparent)]
    Tool(#[from] CommandError),
    #[error("`{program}` produced no output file")]
    NoOutput { program: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A rendered diagram ready for embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDiagram {
    /// Image bytes.
    pub data: Vec<u8>,
    /// MIME type of `data`.
    pub mime: &'static str,
}

impl RenderedDiagram {
    /// Wrap SVG bytes.
    #[must_use]
    pub fn svg(data: Vec<u8>) -> Self {
        Self {
            data,
            mime: "image/svg+xml",
        }
    }
}

/// Renders diagram source into an image.
///
/// Implementations must be pure functions of `(kind, source)`.
pub trait DiagramRenderer: Send + Sync {
    /// Render one diagram.
    fn render(&self, kind: DiagramKind, source: &str) -> Result<RenderedDiagram, RenderUnavailable>;
}

/// Renders diagrams by spawning the Mermaid CLI or svgbob.
///
/// Each call writes the source to a temporary directory, runs the tool as
/// `tool <input> -o <output>`, and reads back the SVG. The directory is
/// removed when the call returns, whatever the outcome.
#[derive(Debug, Clone)]
pub struct CommandDiagramRenderer {
    mermaid_command: String,
    svgbob_command: String,
    timeout: Duration,
}

impl Default for CommandDiagramRenderer {
    fn default() -> Self {
        Self {
            mermaid_command: "mmdc".to_owned(),
            svgbob_command: "svgbob_cli".to_owned(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl CommandDiagramRenderer {
    /// Create a renderer using the default tool names.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the Mermaid CLI executable.
    #[must_use]
    pub fn mermaid_command(mut self, command: impl Into<String>) -> Self {
        self.mermaid_command = command.into();
        self
    }

    /// Set the svgbob executable.
    #[must_use]
    pub fn svgbob_command(mut self, command: impl Into<String>) -> Self {
        self.svgbob_command = command.into();
        self
    }

    /// Set the per-diagram timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn program(&self, kind: DiagramKind) -> &str {
        match kind {
            DiagramKind::Mermaid => &self.mermaid_command,
            DiagramKind::Ascii => &self.svgbob_command,
        }
    }
}

impl DiagramRenderer for CommandDiagramRenderer {
    fn render(&self, kind: DiagramKind, source: &str) -> Result<RenderedDiagram, RenderUnavailable> {
        if source.trim().is_empty() {
            return Err(RenderUnavailable::EmptySource);
        }

        let workdir = tempfile::Builder::new().prefix("mdprint-diagram").tempdir()?;
        let input: PathBuf = workdir
            .path()
            .join(format!("diagram.{}", kind.input_extension()));
        let output = workdir.path().join("diagram.svg");
        std::fs::write(&input, source)?;

        let program = self.program(kind);
        ExternalCommand::new(program)
            .args(kind.tool_args(&input, &output))
            .timeout(self.timeout)
            .run()?;

        match std::fs::read(&output) {
            Ok(data) if !data.is_empty() => Ok(RenderedDiagram::svg(data)),
            Ok(_) => Err(RenderUnavailable::NoOutput {
                program: program.to_owned(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(RenderUnavailable::NoOutput {
                    program: program.to_owned(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_source_rejected() {
        let renderer = CommandDiagramRenderer::new();
        let err = renderer.render(DiagramKind::Mermaid, "  \n").unwrap_err();
        assert!(matches!(err, RenderUnavailable::EmptySource));
    }

    #[test]
    fn test_missing_tool_is_unavailable() {
        let renderer = CommandDiagramRenderer::new().mermaid_command("mdprint-missing-mmdc");
        let err = renderer
            .render(DiagramKind::Mermaid, "graph TD; A-->B")
            .unwrap_err();
        assert!(matches!(
            err,
            RenderUnavailable::Tool(CommandError::NotInstalled { .. })
        ));
        assert!(err.to_string().contains("mdprint-missing-mmdc"));
    }

    #[cfg(unix)]
    #[test]
    fn test_tool_without_output_file() {
        // `true` accepts any arguments and writes nothing.
        let renderer = CommandDiagramRenderer::new().svgbob_command("true");
        let err = renderer.render(DiagramKind::Ascii, "+--+\n|  |\n+--+").unwrap_err();
        assert!(matches!(err, RenderUnavailable::NoOutput { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_tool_writes_output() {
        // `sh <input> -o <output>` runs the diagram source as a script with
        // the output path in `$2`.
        let renderer = CommandDiagramRenderer::new().svgbob_command("sh");
        let diagram = renderer
            .render(DiagramKind::Ascii, "printf '<svg/>' > \"$2\"\n")
            .unwrap();
        assert_eq!(diagram.data, b"<svg/>");
        assert_eq!(diagram.mime, "image/svg+xml");
    }
}
