//! Per-file outcomes and batch aggregation.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::ConvertError;

/// Why a file was not converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The PDF is at least as new as the source.
    UpToDate,
    /// The source disappeared before it could be read.
    Vanished,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::UpToDate => "up to date",
            Self::Vanished => "source vanished",
        })
    }
}

/// Result of converting one file.
#[derive(Debug)]
pub enum ConversionOutcome {
    /// The PDF was written.
    Written {
        /// Output path.
        target: PathBuf,
        /// Recoverable problems, such as diagrams shown as source.
        warnings: Vec<String>,
    },
    /// Nothing was written.
    Skipped(SkipReason),
    /// Conversion failed; no output was left behind.
    Failed(ConvertError),
}

impl ConversionOutcome {
    /// Whether the outcome is `Written`.
    #[must_use]
    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written { .. })
    }

    /// Whether the outcome is `Failed`.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Outcomes of a batch conversion, in processing order.
#[derive(Debug, Default)]
pub struct BatchReport {
    entries: Vec<(PathBuf, ConversionOutcome)>,
}

impl BatchReport {
    pub(crate) fn push(&mut self, path: PathBuf, outcome: ConversionOutcome) {
        self.entries.push((path, outcome));
    }

    /// All entries.
    #[must_use]
    pub fn entries(&self) -> &[(PathBuf, ConversionOutcome)] {
        &self.entries
    }

    /// Number of PDFs written.
    #[must_use]
    pub fn written(&self) -> usize {
        self.entries.iter().filter(|(_, o)| o.is_written()).count()
    }

    /// Number of files skipped.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, o)| matches!(o, ConversionOutcome::Skipped(_)))
            .count()
    }

    /// Failed files with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (&Path, &ConvertError)> {
        self.entries.iter().filter_map(|(path, outcome)| match outcome {
            ConversionOutcome::Failed(e) => Some((path.as_path(), e)),
            _ => None,
        })
    }

    /// Number of files that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures().count()
    }

    /// Whether any file failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.entries.iter().any(|(_, o)| o.is_failed())
    }

    /// Total number of files processed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no files were processed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
