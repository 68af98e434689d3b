//! Syntax highlighting for code blocks using syntect.
//!
//! Output uses inline styles, so the print stylesheet needs no theme rules.

use std::fmt::Write;
use std::sync::LazyLock;

use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

use crate::escape_html;

/// Theme used when none is configured.
pub const DEFAULT_THEME: &str = "InspiredGitHub";

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

/// Renders code blocks as highlighted `<pre>` elements.
#[derive(Clone, Debug)]
pub struct Highlighter {
    theme: String,
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new(DEFAULT_THEME)
    }
}

impl Highlighter {
    /// Create a highlighter using the named syntect theme.
    ///
    /// Unknown themes render plain escaped code.
    #[must_use]
    pub fn new(theme: impl Into<String>) -> Self {
        Self {
            theme: theme.into(),
        }
    }

    /// Render a complete code block.
    #[must_use]
    pub fn code_block(&self, language: &str, source: &str) -> String {
        let mut html = String::with_capacity(source.len() * 2 + 64);
        if language.is_empty() {
            html.push_str("<pre class=\"code\"><code>");
        } else {
            let _ = write!(
                html,
                "<pre class=\"code\"><code class=\"language-{}\">",
                escape_html(language)
            );
        }
        html.push_str(&self.highlight(language, source));
        html.push_str("</code></pre>\n");
        html
    }

    /// Highlight source into styled spans without the surrounding `<pre>`.
    ///
    /// Falls back to escaped text when the language or theme is unknown.
    #[must_use]
    pub fn highlight(&self, language: &str, source: &str) -> String {
        let Some(theme) = THEME_SET.themes.get(&self.theme) else {
            return escape_html(source);
        };
        let Some(syntax) = SYNTAX_SET
            .find_syntax_by_token(language)
            .or_else(|| SYNTAX_SET.find_syntax_by_extension(language))
        else {
            return escape_html(source);
        };

        match highlighted_html_for_string(source, &SYNTAX_SET, syntax, theme) {
            Ok(html) => extract_inner_content(&html).to_owned(),
            Err(e) => {
                tracing::debug!(language, error = %e, "Highlighting failed, using plain text");
                escape_html(source)
            }
        }
    }
}

/// Strip syntect's `<pre style="...">` wrapper, keeping the spans.
fn extract_inner_content(html: &str) -> &str {
    let start = html.find('>').map_or(0, |i| i + 1);
    let end = html.rfind("</pre>").unwrap_or(html.len());
    html.get(start..end).unwrap_or(html)
}
