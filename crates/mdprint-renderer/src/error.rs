//! Rendering error types.

/// Error produced while turning Markdown into HTML.
///
/// The Markdown grammar itself accepts any input; failures come from the
/// structured parts of a document.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Front matter is not valid YAML.
    #[error("invalid front matter: {0}")]
    FrontMatter(#[source] serde_yaml::Error),
    /// Front matter is valid YAML but not a key/value mapping.
    #[error("invalid front matter: expected a mapping of keys to values")]
    FrontMatterShape,
}
