//! HTTP request handlers.

pub(crate) mod events;
pub(crate) mod files;
pub(crate) mod image;
pub(crate) mod pages;
pub(crate) mod preview;

use serde::Deserialize;

/// Query string naming a file relative to the served root.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct PathQuery {
    #[serde(default)]
    pub(crate) path: String,
}
