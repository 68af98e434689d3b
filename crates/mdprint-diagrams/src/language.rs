//! Supported diagram kinds.

use std::fmt;
use std::path::Path;

/// Diagram kinds recognized in fenced code blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagramKind {
    /// Mermaid, rendered with the Mermaid CLI.
    Mermaid,
    /// ASCII art, rendered with svgbob.
    Ascii,
}

impl DiagramKind {
    /// Parse a fence language tag.
    ///
    /// Returns None if the tag is not a diagram language.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mermaid" => Some(Self::Mermaid),
            "ascii" | "bob" | "svgbob" => Some(Self::Ascii),
            _ => None,
        }
    }

    /// Canonical name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Mermaid => "mermaid",
            Self::Ascii => "ascii",
        }
    }

    /// File extension used for the temporary input file.
    #[must_use]
    pub fn input_extension(self) -> &'static str {
        match self {
            Self::Mermaid => "mmd",
            Self::Ascii => "bob",
        }
    }

    /// Command-line arguments for rendering `input` into `output`.
    #[must_use]
    pub fn tool_args<'a>(self, input: &'a Path, output: &'a Path) -> Vec<&'a std::ffi::OsStr> {
        match self {
            Self::Mermaid => vec![
                "-i".as_ref(),
                input.as_os_str(),
                "-o".as_ref(),
                output.as_os_str(),
                "-b".as_ref(),
                "transparent".as_ref(),
            ],
            Self::Ascii => vec![input.as_os_str(), "-o".as_ref(), output.as_os_str()],
        }
    }
}

impl fmt::Display for DiagramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
