//! Markdown to print-optimized HTML.
//!
//! This crate turns Markdown into the HTML handed to a PDF engine:
//!
//! - [`MarkdownRenderer`] parses Markdown with pulldown-cmark and splits it
//!   into top-level [`Block`]s, offering fenced code to [`CodeBlockProcessor`]s
//!   and highlighting the rest with syntect.
//! - [`PrintLayout`] classifies blocks (keep-together, narrow/wide tables)
//!   and wraps them for the two-column print stylesheet.
//! - [`assemble_document`] adds the running header and footer built from
//!   [`DocumentMetadata`].
//!
//! # Example
//!
//! ```
//! use mdprint_renderer::{MarkdownRenderer, PrintLayout};
//!
//! let mut renderer = MarkdownRenderer::new().with_layout(PrintLayout::new(3, 20));
//! let result = renderer.render_markdown("# Hello\n\n**Bold** text").unwrap();
//! assert_eq!(result.title.as_deref(), Some("Hello"));
//! ```

mod block;
mod code_block;
mod document;
mod error;
mod front_matter;
mod highlight;
mod layout;
mod renderer;
mod util;

pub use block::{Block, BlockKind, KeepTogether, TableWidth};
pub use code_block::{CodeBlockProcessor, ExtractedCodeBlock, ProcessResult};
pub use document::{DocumentMetadata, PRINT_STYLESHEET, assemble_document};
pub use error::RenderError;
pub use front_matter::FrontMatter;
pub use highlight::{DEFAULT_THEME, Highlighter};
pub use layout::{DEFAULT_LIST_SPLIT_THRESHOLD, DEFAULT_NARROW_TABLE_MAX_COLUMNS, PrintLayout};
pub use renderer::{MarkdownRenderer, RenderResult, extract_title};
pub use util::escape_html;
