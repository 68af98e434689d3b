//! Full HTML document assembly.
//!
//! Wraps the laid-out body with the running header and footer the print
//! stylesheet places in the page margins. Page numbers come from CSS counters.

use std::fmt::Write;
use std::path::Path;

use chrono::NaiveDateTime;

use crate::util::escape_html;

/// Built-in print stylesheet.
pub const PRINT_STYLESHEET: &str = include_str!("../assets/print.css");

/// Format of the generation timestamp shown in the footer.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Metadata placed in the running header and footer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentMetadata {
    /// Document title.
    pub title: String,
    /// Source file name, e.g. `notes.md`.
    pub source_name: String,
    /// Wall-clock time of the conversion.
    pub generated_at: NaiveDateTime,
}

impl DocumentMetadata {
    /// Build metadata for `source`, falling back to the file stem when no
    /// title was extracted.
    #[must_use]
    pub fn for_source(source: &Path, title: Option<String>, generated_at: NaiveDateTime) -> Self {
        let source_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let title = title.filter(|t| !t.is_empty()).unwrap_or_else(|| {
            source
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        });
        Self {
            title,
            source_name,
            generated_at,
        }
    }
}

/// Assemble a complete HTML document around a laid-out body.
///
/// The stylesheet is normally handed to the PDF engine separately; pass
/// `inline_css` to embed it for standalone viewing.
#[must_use]
pub fn assemble_document(body: &str, meta: &DocumentMetadata, inline_css: Option<&str>) -> String {
    let title = escape_html(&meta.title);
    let source = escape_html(&meta.source_name);
    let generated = meta.generated_at.format(TIMESTAMP_FORMAT).to_string();
    let created = meta.generated_at.format("%Y-%m-%dT%H:%M:%S");

    let mut html = String::with_capacity(body.len() + 1024);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n");
    html.push_str("<meta name=\"generator\" content=\"mdprint\">\n");
    let _ = writeln!(html, "<meta name=\"dcterms.created\" content=\"{created}\">");
    let _ = writeln!(html, "<meta name=\"source\" content=\"{source}\">");
    let _ = writeln!(html, "<title>{title}</title>");
    if let Some(css) = inline_css {
        let _ = writeln!(html, "<style>\n{css}\n</style>");
    }
    html.push_str("</head>\n<body>\n");
    let _ = writeln!(
        html,
        "<header class=\"running-header\"><span class=\"doc-title\">{title}</span></header>"
    );
    let _ = writeln!(
        html,
        "<footer class=\"running-footer\"><span class=\"source-name\">{source}</span><span class=\"generated-at\">{generated}</span></footer>"
    );
    html.push_str("<article>\n");
    html.push_str(body);
    html.push_str("</article>\n</body>\n</html>\n");
    html
}
