//! Diagram rendering via external command-line tools.
//!
//! Fenced code blocks tagged `mermaid`, `ascii`, `bob`, or `svgbob` are
//! rendered to SVG by spawning the Mermaid CLI or svgbob, and embedded as
//! data URIs. Rendering is best-effort: when a tool is missing, fails, or
//! times out, the block is shown as highlighted source with a warning.
//!
//! # Architecture
//!
//! - [`DiagramRenderer`]: capability trait, `(kind, source) -> image | failure`
//! - [`CommandDiagramRenderer`]: implementation spawning the external tools
//! - [`DiagramProcessor`]: [`CodeBlockProcessor`](mdprint_renderer::CodeBlockProcessor)
//!   that extracts diagram blocks and substitutes the results
//! - [`ExternalCommand`]: subprocess runner with a timeout, shared with the
//!   PDF engine

mod command;
mod language;
mod processor;
mod renderer;

pub use command::{CommandError, CommandOutput, ExternalCommand};
pub use language::DiagramKind;
pub use processor::{DiagramMode, DiagramProcessor};
pub use renderer::{CommandDiagramRenderer, DiagramRenderer, RenderUnavailable, RenderedDiagram};
