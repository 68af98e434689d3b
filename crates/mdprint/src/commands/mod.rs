//! CLI command implementations.

pub(crate) mod convert;
pub(crate) mod serve;
pub(crate) mod watch;

pub(crate) use convert::ConvertOptions;
