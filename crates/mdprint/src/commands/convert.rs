//! One-shot conversion of a file or directory.

use std::path::Path;

use mdprint_pipeline::{BatchReport, ConversionOutcome, Converter, Printer, SkipReason};
use mdprint_storage::{Scanner, is_markdown};

use crate::error::CliError;
use crate::output::Output;

/// Options shared by one-shot and watch conversions.
pub(crate) struct ConvertOptions {
    /// Reconvert even when the PDF is up to date.
    pub(crate) force: bool,
    /// Include subdirectories when converting a directory.
    pub(crate) recursive: bool,
    /// Send written PDFs to this printer.
    pub(crate) printer: Option<Printer>,
}

impl ConvertOptions {
    pub(crate) fn scanner(&self) -> Scanner {
        Scanner::new().recursive(self.recursive)
    }
}

/// Reject single-file targets that are not Markdown.
pub(crate) fn check_target(path: &Path) -> Result<(), CliError> {
    if !path.exists() {
        return Err(CliError::NotFound(path.to_path_buf()));
    }
    if path.is_file() && !is_markdown(path) {
        return Err(CliError::Validation(format!(
            "not a Markdown file: {} (expected a .md file or a directory)",
            path.display()
        )));
    }
    Ok(())
}

/// Convert `path` (a Markdown file or a directory) and print a summary.
pub(crate) fn run(
    converter: &Converter,
    path: &Path,
    options: &ConvertOptions,
    output: &Output,
) -> Result<BatchReport, CliError> {
    let on_outcome =
        |source: &Path, outcome: &ConversionOutcome| report_outcome(source, outcome, options, output);

    let report = if path.is_dir() {
        converter.convert_all(path, options.force, &options.scanner(), on_outcome)?
    } else {
        converter.convert_files(&[path.to_path_buf()], options.force, on_outcome)
    };

    print_summary(&report, output);
    Ok(report)
}

/// Report one outcome as it happens, printing the PDF if requested.
pub(crate) fn report_outcome(
    source: &Path,
    outcome: &ConversionOutcome,
    options: &ConvertOptions,
    output: &Output,
) {
    match outcome {
        ConversionOutcome::Written { target, warnings } => {
            output.success(
                "Converted",
                &format!("{} -> {}", source.display(), target.display()),
            );
            for warning in warnings {
                output.warning(&format!("{}: {warning}", source.display()));
            }
            if let Some(printer) = &options.printer {
                match printer.print(target) {
                    Ok(()) => output.success("Printed", &target.display().to_string()),
                    Err(e) => output.warning(&format!("cannot print {}: {e}", target.display())),
                }
            }
        }
        ConversionOutcome::Skipped(SkipReason::UpToDate) => {
            tracing::info!(path = %source.display(), "Up to date");
        }
        ConversionOutcome::Skipped(reason) => {
            output.highlight("Skipped", &format!("{} ({reason})", source.display()));
        }
        ConversionOutcome::Failed(err) => {
            output.error(&format!("{}: {err}", source.display()));
        }
    }
}

/// Turn a batch with failures into an error so the process exits non-zero.
pub(crate) fn check_report(report: &BatchReport) -> Result<(), CliError> {
    if report.has_failures() {
        return Err(CliError::Failed(report.failed()));
    }
    Ok(())
}

fn print_summary(report: &BatchReport, output: &Output) {
    let summary = summary_line(report);
    if report.has_failures() {
        output.error(&summary);
        for (path, err) in report.failures() {
            output.info(&format!("  {}: {err}", path.display()));
        }
    } else {
        output.highlight("Finished", &summary);
    }
}

fn summary_line(report: &BatchReport) -> String {
    format!(
        "{} written, {} skipped, {} failed",
        report.written(),
        report.skipped(),
        report.failed()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Arc;
    use std::time::{Duration, SystemTime};

    use mdprint_pipeline::{EngineError, PdfEngine};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    struct FakeEngine;

    impl PdfEngine for FakeEngine {
        fn render(&self, _html: &str, _css: &str, _base: &Path) -> Result<Vec<u8>, EngineError> {
            Ok(b"%PDF-1.7".to_vec())
        }
    }

    fn options(force: bool) -> ConvertOptions {
        ConvertOptions {
            force,
            recursive: true,
            printer: None,
        }
    }

    #[test]
    fn test_check_target() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.md"), "# A\n").unwrap();
        fs::write(tmp.path().join("a.txt"), "A").unwrap();

        assert!(check_target(&tmp.path().join("a.md")).is_ok());
        assert!(check_target(tmp.path()).is_ok());
        assert!(matches!(
            check_target(&tmp.path().join("a.txt")),
            Err(CliError::Validation(_))
        ));
        assert!(matches!(
            check_target(&tmp.path().join("missing.md")),
            Err(CliError::NotFound(_))
        ));
    }

    #[test]
    fn test_run_directory() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();
        fs::write(tmp.path().join("a.md"), "# A\n").unwrap();
        fs::write(tmp.path().join("sub/b.md"), "# B\n").unwrap();
        let converter = Converter::new(Arc::new(FakeEngine));
        let output = Output::new();

        let report = run(&converter, tmp.path(), &options(false), &output).unwrap();
        assert_eq!(summary_line(&report), "2 written, 0 skipped, 0 failed");
        assert!(tmp.path().join("sub/b.pdf").exists());

        let report = run(&converter, tmp.path(), &options(false), &output).unwrap();
        assert_eq!(summary_line(&report), "0 written, 2 skipped, 0 failed");

        let report = run(&converter, tmp.path(), &options(true), &output).unwrap();
        assert_eq!(report.written(), 2);
    }

    #[test]
    fn test_run_non_recursive() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();
        fs::write(tmp.path().join("a.md"), "# A\n").unwrap();
        fs::write(tmp.path().join("sub/b.md"), "# B\n").unwrap();
        let converter = Converter::new(Arc::new(FakeEngine));
        let options = ConvertOptions {
            recursive: false,
            ..options(false)
        };

        let report = run(&converter, tmp.path(), &options, &Output::new()).unwrap();
        assert_eq!(report.written(), 1);
        assert!(!tmp.path().join("sub/b.pdf").exists());
    }

    #[test]
    fn test_run_single_file_with_failure() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("bad.md");
        fs::write(&source, "---\ntitle: [unclosed\n---\n# Bad\n").unwrap();
        let converter = Converter::new(Arc::new(FakeEngine));

        let report = run(&converter, &source, &options(false), &Output::new()).unwrap();
        assert!(report.has_failures());
        assert_eq!(summary_line(&report), "0 written, 0 skipped, 1 failed");
    }

    #[test]
    fn test_mixed_batch_fails_check() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.md"), "# A\n").unwrap();
        fs::write(tmp.path().join("b.md"), "# B\n").unwrap();
        fs::write(tmp.path().join("b.pdf"), "%PDF-1.7").unwrap();
        fs::File::options()
            .write(true)
            .open(tmp.path().join("b.pdf"))
            .unwrap()
            .set_modified(SystemTime::now() + Duration::from_secs(60))
            .unwrap();
        fs::write(tmp.path().join("c.md"), [0xff, 0xfe]).unwrap();
        let converter = Converter::new(Arc::new(FakeEngine));

        let report = run(&converter, tmp.path(), &options(false), &Output::new()).unwrap();
        assert_eq!(summary_line(&report), "1 written, 1 skipped, 1 failed");
        assert!(matches!(check_report(&report), Err(CliError::Failed(1))));
    }

    #[test]
    fn test_clean_batch_passes_check() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.md"), "# A\n").unwrap();
        let converter = Converter::new(Arc::new(FakeEngine));

        let report = run(&converter, tmp.path(), &options(false), &Output::new()).unwrap();
        assert!(check_report(&report).is_ok());
    }
}
