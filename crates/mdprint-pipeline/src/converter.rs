//! Single-file and batch conversion.

use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDateTime;
use mdprint_config::Config;
use mdprint_diagrams::{CommandDiagramRenderer, DiagramMode, DiagramProcessor, DiagramRenderer};
use mdprint_renderer::{
    DocumentMetadata, Highlighter, MarkdownRenderer, PRINT_STYLESHEET, PrintLayout, RenderError,
    RenderResult, assemble_document,
};
use mdprint_storage::{Freshness, ScanError, Scanner, staleness};

use crate::engine::{PdfEngine, WeasyPrintEngine};
use crate::error::ConvertError;
use crate::outcome::{BatchReport, ConversionOutcome, SkipReason};

/// Source of the generation timestamp.
pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// A fully assembled HTML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    /// Complete document handed to the PDF engine.
    pub html: String,
    /// Laid-out body only.
    pub body: String,
    /// Title shown in the running header.
    pub title: String,
    /// Header and footer metadata the document was assembled with.
    pub metadata: DocumentMetadata,
    /// Recoverable problems encountered while rendering.
    pub warnings: Vec<String>,
}

/// Converts Markdown files to two-column print PDFs.
///
/// One file converts fully before the next begins. The converter holds no
/// per-file state, so it can be shared between threads.
pub struct Converter {
    engine: Arc<dyn PdfEngine>,
    diagrams: Option<Arc<dyn DiagramRenderer>>,
    diagram_mode: DiagramMode,
    layout: PrintLayout,
    highlighter: Highlighter,
    stylesheet: String,
    write_html: bool,
    clock: Clock,
}

impl Converter {
    /// Create a converter rendering through `engine`, without diagram support.
    #[must_use]
    pub fn new(engine: Arc<dyn PdfEngine>) -> Self {
        Self {
            engine,
            diagrams: None,
            diagram_mode: DiagramMode::default(),
            layout: PrintLayout::default(),
            highlighter: Highlighter::default(),
            stylesheet: PRINT_STYLESHEET.to_owned(),
            write_html: false,
            clock: Arc::new(local_now),
        }
    }

    /// Create a converter from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::Io`] if the configured extra stylesheet cannot be read.
    pub fn from_config(config: &Config) -> Result<Self, ConvertError> {
        let engine = WeasyPrintEngine::new()
            .command(&config.pdf.command)
            .timeout(config.pdf.timeout());

        let mut converter = Self::new(Arc::new(engine))
            .layout(PrintLayout::new(
                config.layout.narrow_table_max_columns,
                config.layout.list_split_threshold,
            ))
            .highlighter(Highlighter::new(&config.pdf.highlight_theme));

        if config.diagrams.enabled {
            let renderer = CommandDiagramRenderer::new()
                .mermaid_command(&config.diagrams.mermaid_command)
                .svgbob_command(&config.diagrams.svgbob_command)
                .timeout(config.diagrams.timeout());
            converter = converter.diagrams(Some(Arc::new(renderer)));
        }

        if let Some(path) = &config.pdf.stylesheet {
            let css = fs::read_to_string(path).map_err(|source| ConvertError::Io {
                path: path.clone(),
                source,
            })?;
            converter = converter.extra_stylesheet(&css);
        }

        Ok(converter)
    }

    /// Set the diagram renderer; `None` leaves diagram blocks as code.
    #[must_use]
    pub fn diagrams(mut self, renderer: Option<Arc<dyn DiagramRenderer>>) -> Self {
        self.diagrams = renderer;
        self
    }

    /// Set where diagrams are rendered.
    #[must_use]
    pub fn diagram_mode(mut self, mode: DiagramMode) -> Self {
        self.diagram_mode = mode;
        self
    }

    /// Set the print layout thresholds.
    #[must_use]
    pub fn layout(mut self, layout: PrintLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Set the code highlighter.
    #[must_use]
    pub fn highlighter(mut self, highlighter: Highlighter) -> Self {
        self.highlighter = highlighter;
        self
    }

    /// Append CSS after the built-in print stylesheet.
    #[must_use]
    pub fn extra_stylesheet(mut self, css: &str) -> Self {
        self.stylesheet.push('\n');
        self.stylesheet.push_str(css);
        self
    }

    /// Also write the intermediate HTML next to each PDF.
    #[must_use]
    pub fn write_html(mut self, enabled: bool) -> Self {
        self.write_html = enabled;
        self
    }

    /// Set the clock used for the generation timestamp.
    #[must_use]
    pub fn clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Stylesheet handed to the PDF engine.
    #[must_use]
    pub fn stylesheet(&self) -> &str {
        &self.stylesheet
    }

    fn create_renderer(&self) -> MarkdownRenderer {
        let mut renderer = MarkdownRenderer::new()
            .with_gfm(true)
            .with_layout(self.layout)
            .with_highlighter(self.highlighter.clone());

        if let Some(diagrams) = &self.diagrams {
            let processor = DiagramProcessor::new(Arc::clone(diagrams))
                .highlighter(self.highlighter.clone())
                .mode(self.diagram_mode);
            renderer = renderer.with_processor(processor);
        }

        renderer
    }

    /// Render Markdown to the laid-out body.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] for malformed front matter.
    pub fn render_body(&self, markdown: &str) -> Result<RenderResult, RenderError> {
        self.create_renderer().render_markdown(markdown)
    }

    /// Render Markdown from `source` to a complete HTML document.
    ///
    /// Output depends only on the input and the clock.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] for malformed front matter.
    pub fn render_html(&self, source: &Path, markdown: &str) -> Result<RenderedDocument, RenderError> {
        let result = self.render_body(markdown)?;
        let meta = DocumentMetadata::for_source(source, result.title, (self.clock)());
        let html = assemble_document(&result.html, &meta, None);
        Ok(RenderedDocument {
            html,
            body: result.html,
            title: meta.title.clone(),
            metadata: meta,
            warnings: result.warnings,
        })
    }

    /// Convert `source` to a PDF next to it.
    ///
    /// Unless `force` is set, an output at least as new as the source is left
    /// alone without reading the source. A source that vanished is skipped.
    /// The PDF is written atomically, so a failure never leaves a truncated
    /// file in place.
    pub fn convert(&self, source: &Path, force: bool) -> ConversionOutcome {
        let target = staleness::target_path(source);

        match staleness::check(source, &target, force) {
            Ok(Freshness::UpToDate) => {
                tracing::debug!(path = %source.display(), "PDF up to date");
                return ConversionOutcome::Skipped(SkipReason::UpToDate);
            }
            Ok(freshness) => {
                tracing::debug!(path = %source.display(), ?freshness, "Converting");
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return ConversionOutcome::Skipped(SkipReason::Vanished);
            }
            Err(source_err) => {
                return ConversionOutcome::Failed(ConvertError::Io {
                    path: source.to_path_buf(),
                    source: source_err,
                });
            }
        }

        match self.convert_to(source, &target) {
            Ok(Some(warnings)) => {
                tracing::info!(path = %target.display(), "PDF written");
                ConversionOutcome::Written { target, warnings }
            }
            Ok(None) => ConversionOutcome::Skipped(SkipReason::Vanished),
            Err(e) => {
                tracing::warn!(path = %source.display(), error = %e, "Conversion failed");
                ConversionOutcome::Failed(e)
            }
        }
    }

    /// Read, render, and write. `Ok(None)` means the source vanished.
    fn convert_to(&self, source: &Path, target: &Path) -> Result<Option<Vec<String>>, ConvertError> {
        let bytes = match fs::read(source) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ConvertError::Io {
                    path: source.to_path_buf(),
                    source: e,
                });
            }
        };

        let markdown = String::from_utf8(bytes).map_err(|e| ConvertError::Parse {
            path: source.to_path_buf(),
            message: format!("not valid UTF-8 ({e})"),
        })?;

        let document = self
            .render_html(source, &markdown)
            .map_err(|e| ConvertError::Parse {
                path: source.to_path_buf(),
                message: e.to_string(),
            })?;

        if self.write_html {
            // Standalone copy for a browser, so the stylesheet goes inline.
            let html_path = source.with_extension("html");
            let debug_html =
                assemble_document(&document.body, &document.metadata, Some(&self.stylesheet));
            if let Err(e) = write_atomic(&html_path, debug_html.as_bytes()) {
                tracing::warn!(path = %html_path.display(), error = %e, "Failed to write debug HTML");
            }
        }

        let base_dir = source.parent().unwrap_or(Path::new("."));
        let pdf = self
            .engine
            .render(&document.html, &self.stylesheet, base_dir)
            .map_err(|e| ConvertError::Render {
                path: source.to_path_buf(),
                source: e,
            })?;

        write_atomic(target, &pdf).map_err(|e| ConvertError::Io {
            path: target.to_path_buf(),
            source: e,
        })?;

        Ok(Some(document.warnings))
    }

    /// Convert `files` in order, reporting each outcome as it happens.
    ///
    /// A failed file does not stop the batch.
    pub fn convert_files<F>(&self, files: &[PathBuf], force: bool, mut on_outcome: F) -> BatchReport
    where
        F: FnMut(&Path, &ConversionOutcome),
    {
        let mut report = BatchReport::default();
        for file in files {
            let outcome = self.convert(file, force);
            on_outcome(file, &outcome);
            report.push(file.clone(), outcome);
        }
        report
    }

    /// Convert every Markdown file `scanner` finds under `root`.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] if the root cannot be scanned.
    pub fn convert_all<F>(
        &self,
        root: &Path,
        force: bool,
        scanner: &Scanner,
        on_outcome: F,
    ) -> Result<BatchReport, ScanError>
    where
        F: FnMut(&Path, &ConversionOutcome),
    {
        let files = scanner.scan(root)?;
        tracing::info!(root = %root.display(), files = files.len(), "Converting directory");
        Ok(self.convert_files(&files, force, on_outcome))
    }
}

/// Write `bytes` to a temporary file in the target's directory, then rename
/// it over the target.
fn write_atomic(target: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut tmp = tempfile::Builder::new()
        .prefix(".mdprint-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}
