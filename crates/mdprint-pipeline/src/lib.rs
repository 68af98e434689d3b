//! Markdown to print PDF conversion.
//!
//! [`Converter::convert`] runs one file through the whole pipeline:
//!
//! 1. Staleness check on modification times (no content read)
//! 2. Read the source (a vanished file is skipped)
//! 3. Render Markdown to laid-out HTML, substituting diagrams
//! 4. Assemble the document with running header and footer
//! 5. Render to PDF through a [`PdfEngine`]
//! 6. Write the PDF atomically next to the source
//!
//! Batch conversion aggregates per-file [`ConversionOutcome`]s into a
//! [`BatchReport`]; one failure never stops the rest.

mod converter;
mod engine;
mod error;
mod outcome;
mod print;

pub use converter::{Clock, Converter, RenderedDocument};
pub use engine::{DEFAULT_PDF_COMMAND, PdfEngine, WeasyPrintEngine};
pub use error::{ConvertError, EngineError};
pub use outcome::{BatchReport, ConversionOutcome, SkipReason};
pub use print::{DEFAULT_PRINT_COMMAND, Printer};
