//! Pluggable processing of fenced code blocks.

use std::collections::HashMap;

/// Outcome of offering a code block to a [`CodeBlockProcessor`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProcessResult {
    /// Emit this placeholder now; the processor replaces it in `post_process`.
    Placeholder(String),
    /// Emit this HTML verbatim in place of the code block.
    Inline(String),
    /// Not handled; the next processor (or the highlighter) gets the block.
    PassThrough,
}

/// A code block captured by a processor for deferred rendering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractedCodeBlock {
    /// Position of the block among all code blocks in the document.
    pub index: usize,
    /// Language tag from the fence info string.
    pub language: String,
    /// Raw block content.
    pub source: String,
    /// `key=value` attributes following the language tag.
    pub attrs: HashMap<String, String>,
}

/// Hook for custom handling of fenced code blocks.
///
/// Processors are consulted in registration order for every code block,
/// including blocks nested inside lists and blockquotes.
pub trait CodeBlockProcessor: Send {
    /// Inspect a code block and decide how it is emitted.
    fn process(
        &mut self,
        language: &str,
        attrs: &HashMap<String, String>,
        source: &str,
        index: usize,
    ) -> ProcessResult;

    /// Replace placeholders in the laid-out document body.
    fn post_process(&mut self, _html: &mut String) {}

    /// Code blocks extracted so far.
    fn extracted(&self) -> &[ExtractedCodeBlock] {
        &[]
    }

    /// Non-fatal problems encountered while processing.
    fn warnings(&self) -> &[String] {
        &[]
    }
}

/// Split a fence info string into its language tag and attributes.
///
/// `"mermaid theme=dark"` yields `("mermaid", {"theme": "dark"})`.
/// Bare words after the language are kept as attributes with empty values.
pub(crate) fn parse_fence_info(info: &str) -> (String, HashMap<String, String>) {
    let mut parts = info.split_whitespace();
    let language = parts.next().unwrap_or_default().to_owned();
    let attrs = parts
        .map(|part| match part.split_once('=') {
            Some((key, value)) => (key.to_owned(), value.trim_matches('"').to_owned()),
            None => (part.to_owned(), String::new()),
        })
        .collect();
    (language, attrs)
}
