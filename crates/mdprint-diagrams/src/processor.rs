//! Code block processor for diagram languages.
//!
//! This module provides [`DiagramProcessor`], which implements the
//! [`CodeBlockProcessor`] trait for extracting diagram code blocks during rendering.

use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use mdprint_renderer::{
    CodeBlockProcessor, ExtractedCodeBlock, Highlighter, ProcessResult, escape_html,
};
use rayon::prelude::*;
use uuid::Uuid;

use crate::language::DiagramKind;
use crate::renderer::{DiagramRenderer, RenderUnavailable, RenderedDiagram};

/// Where diagrams are turned into images.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DiagramMode {
    /// Render every diagram with the configured [`DiagramRenderer`].
    #[default]
    Render,
    /// Leave Mermaid to the browser (`<pre class="mermaid">`); render the rest.
    ClientSideMermaid,
}

/// Code block processor for diagram languages.
///
/// Extracts diagram code blocks and replaces them with placeholders during
/// rendering. Placeholders are replaced in `post_process()` with an embedded
/// image on success, or with the highlighted source and a visible warning
/// when the renderer is unavailable. A failed diagram never fails the document.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use mdprint_diagrams::{CommandDiagramRenderer, DiagramProcessor};
/// use mdprint_renderer::MarkdownRenderer;
///
/// let processor = DiagramProcessor::new(Arc::new(CommandDiagramRenderer::new()));
/// let mut renderer = MarkdownRenderer::new().with_processor(processor);
///
/// // render_markdown() auto-calls post_process() on all processors
/// let result = renderer.render_markdown("```mermaid\ngraph TD; A-->B\n```")?;
/// ```
pub struct DiagramProcessor {
    renderer: Arc<dyn DiagramRenderer>,
    highlighter: Highlighter,
    mode: DiagramMode,
    extracted: Vec<ExtractedCodeBlock>,
    warnings: Vec<String>,
    /// Makes placeholders unguessable, so Markdown text can never match one.
    nonce: String,
}

impl DiagramProcessor {
    /// Create a processor that renders with `renderer`.
    #[must_use]
    pub fn new(renderer: Arc<dyn DiagramRenderer>) -> Self {
        Self {
            renderer,
            highlighter: Highlighter::default(),
            mode: DiagramMode::default(),
            extracted: Vec::new(),
            warnings: Vec::new(),
            nonce: Uuid::new_v4().simple().to_string(),
        }
    }

    /// Set the highlighter used for fallback source listings.
    #[must_use]
    pub fn highlighter(mut self, highlighter: Highlighter) -> Self {
        self.highlighter = highlighter;
        self
    }

    /// Set the rendering mode.
    #[must_use]
    pub fn mode(mut self, mode: DiagramMode) -> Self {
        self.mode = mode;
        self
    }

    fn placeholder(&self, index: usize) -> String {
        format!("{{{{DIAGRAM_{}_{index}}}}}", self.nonce)
    }

    fn fallback_html(&self, block: &ExtractedCodeBlock, kind: DiagramKind, reason: &str) -> String {
        let mut html = String::from("<div class=\"diagram-fallback\">\n");
        let _ = writeln!(
            html,
            "<p class=\"diagram-warning\">\u{26a0} {kind} diagram could not be rendered: {}</p>",
            escape_html(reason)
        );
        html.push_str(&self.highlighter.code_block(&block.language, &block.source));
        html.push_str("</div>");
        html
    }
}

/// Embed a rendered diagram as an expandable figure.
fn figure_html(
    diagram: &RenderedDiagram,
    kind: DiagramKind,
    attrs: &HashMap<String, String>,
) -> String {
    let caption = attrs.get("caption").filter(|c| !c.is_empty());
    let alt = caption.map_or_else(|| format!("{kind} diagram"), |c| escape_html(c));

    let mut html = String::with_capacity(diagram.data.len() * 4 / 3 + 160);
    let _ = write!(
        html,
        "<figure class=\"diagram expandable\" data-kind=\"{kind}\"><img src=\"data:{};base64,{}\" alt=\"{alt}\">",
        diagram.mime,
        STANDARD.encode(&diagram.data)
    );
    if let Some(caption) = caption {
        let _ = write!(html, "<figcaption>{}</figcaption>", escape_html(caption));
    }
    html.push_str("</figure>");
    html
}

impl CodeBlockProcessor for DiagramProcessor {
    fn process(
        &mut self,
        language: &str,
        attrs: &HashMap<String, String>,
        source: &str,
        index: usize,
    ) -> ProcessResult {
        let Some(kind) = DiagramKind::parse(language) else {
            return ProcessResult::PassThrough;
        };

        if self.mode == DiagramMode::ClientSideMermaid && kind == DiagramKind::Mermaid {
            return ProcessResult::Inline(format!(
                "<pre class=\"mermaid\">{}</pre>\n",
                escape_html(source)
            ));
        }

        self.extracted.push(ExtractedCodeBlock {
            index,
            language: language.to_owned(),
            source: source.to_owned(),
            attrs: attrs.clone(),
        });
        ProcessResult::Placeholder(self.placeholder(index))
    }

    fn post_process(&mut self, html: &mut String) {
        if self.extracted.is_empty() {
            return;
        }

        let renderer = &self.renderer;
        let results: Vec<(DiagramKind, Result<RenderedDiagram, RenderUnavailable>)> = self
            .extracted
            .par_iter()
            .map(|block| {
                let kind = DiagramKind::parse(&block.language).unwrap_or(DiagramKind::Mermaid);
                (kind, renderer.render(kind, &block.source))
            })
            .collect();

        let mut warnings = Vec::new();
        for (block, (kind, result)) in self.extracted.iter().zip(results) {
            let replacement = match result {
                Ok(diagram) => figure_html(&diagram, kind, &block.attrs),
                Err(e) => {
                    tracing::warn!(
                        kind = %kind,
                        index = block.index,
                        error = %e,
                        "Diagram rendering unavailable, showing source"
                    );
                    warnings.push(format!("{kind} diagram #{}: {e}", block.index));
                    self.fallback_html(block, kind, &e.to_string())
                }
            };
            *html = html.replacen(&self.placeholder(block.index), &replacement, 1);
        }
        self.warnings.extend(warnings);
    }

    fn extracted(&self) -> &[ExtractedCodeBlock] {
        &self.extracted
    }

    fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandError;
    use mdprint_renderer::{BlockKind, MarkdownRenderer};
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// Renders every diagram to a fixed SVG and records the calls.
    #[derive(Default)]
    struct FakeRenderer {
        calls: Mutex<Vec<(DiagramKind, String)>>,
    }

    impl DiagramRenderer for FakeRenderer {
        fn render(
            &self,
            kind: DiagramKind,
            source: &str,
        ) -> Result<RenderedDiagram, RenderUnavailable> {
            self.calls
                .lock()
                .unwrap()
                .push((kind, source.to_owned()));
            Ok(RenderedDiagram::svg(b"<svg/>".to_vec()))
        }
    }

    /// Behaves as if the tool were not installed.
    struct MissingToolRenderer;

    impl DiagramRenderer for MissingToolRenderer {
        fn render(
            &self,
            _kind: DiagramKind,
            _source: &str,
        ) -> Result<RenderedDiagram, RenderUnavailable> {
            Err(RenderUnavailable::Tool(CommandError::NotInstalled {
                program: "mmdc".to_owned(),
            }))
        }
    }

    fn render_with(renderer: Arc<dyn DiagramRenderer>, markdown: &str) -> mdprint_renderer::RenderResult {
        MarkdownRenderer::new()
            .with_processor(DiagramProcessor::new(renderer))
            .render_markdown(markdown)
            .unwrap()
    }

    #[test]
    fn test_non_diagram_passes_through() {
        let mut processor = DiagramProcessor::new(Arc::new(FakeRenderer::default()));
        let result = processor.process("rust", &HashMap::new(), "fn main() {}", 0);
        assert_eq!(result, ProcessResult::PassThrough);
        assert!(processor.extracted().is_empty());
    }

    #[test]
    fn test_diagram_rendered_as_figure() {
        let fake = Arc::new(FakeRenderer::default());
        let result = render_with(
            Arc::clone(&fake) as Arc<dyn DiagramRenderer>,
            "```mermaid\ngraph TD; A-->B\n```\n",
        );

        assert_eq!(result.blocks[0].kind, BlockKind::Diagram);
        assert!(result.html.contains(
            "<figure class=\"diagram expandable\" data-kind=\"mermaid\"><img src=\"data:image/svg+xml;base64,PHN2Zy8+\" alt=\"mermaid diagram\"></figure>"
        ));
        assert!(result.html.contains("keep-together diagram-block"));
        assert!(!result.html.contains("{{DIAGRAM_"));
        assert!(result.warnings.is_empty());
        assert_eq!(
            *fake.calls.lock().unwrap(),
            vec![(DiagramKind::Mermaid, "graph TD; A-->B\n".to_owned())]
        );
    }

    #[test]
    fn test_ascii_alias_uses_ascii_kind() {
        let fake = Arc::new(FakeRenderer::default());
        render_with(
            Arc::clone(&fake) as Arc<dyn DiagramRenderer>,
            "```bob\n+--+\n```\n",
        );
        assert_eq!(fake.calls.lock().unwrap()[0].0, DiagramKind::Ascii);
    }

    #[test]
    fn test_caption_attribute() {
        let result = render_with(
            Arc::new(FakeRenderer::default()),
            "```mermaid caption=Flow\ngraph TD; A-->B\n```\n",
        );
        assert!(result.html.contains("alt=\"Flow\""));
        assert!(result.html.contains("<figcaption>Flow</figcaption>"));
    }

    #[test]
    fn test_missing_renderer_falls_back_to_source() {
        let result = render_with(
            Arc::new(MissingToolRenderer),
            "Before\n\n```mermaid\ngraph TD; A-->B\n```\n\nAfter\n",
        );

        assert!(result.html.contains("<div class=\"diagram-fallback\">"));
        assert!(result.html.contains("\u{26a0} mermaid diagram could not be rendered"));
        assert!(result.html.contains("graph TD; A--&gt;B"));
        assert!(result.html.contains("<p>After</p>"));
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("mmdc"));
    }

    #[test]
    fn test_multiple_diagrams_each_substituted() {
        let result = render_with(
            Arc::new(FakeRenderer::default()),
            "```mermaid\nA\n```\n\n```rust\nlet x = 1;\n```\n\n```svgbob\n-->\n```\n",
        );
        assert_eq!(result.html.matches("<figure class=\"diagram expandable\"").count(), 2);
        assert!(result.html.contains("data-kind=\"ascii\""));
        assert!(result.html.contains("class=\"language-rust\""));
    }

    #[test]
    fn test_literal_placeholder_text_is_kept() {
        let result = render_with(
            Arc::new(FakeRenderer::default()),
            "Write `{{DIAGRAM_0}}` or {{DIAGRAM_0}} here.\n\n```mermaid\nA\n```\n",
        );
        assert!(result.html.contains("<code>{{DIAGRAM_0}}</code> or {{DIAGRAM_0}} here."));
        assert_eq!(result.html.matches("<figure class=\"diagram expandable\"").count(), 1);
    }

    #[test]
    fn test_placeholders_differ_between_processors() {
        let mut first = DiagramProcessor::new(Arc::new(FakeRenderer::default()));
        let mut second = DiagramProcessor::new(Arc::new(FakeRenderer::default()));
        let a = first.process("mermaid", &HashMap::new(), "A", 0);
        let b = second.process("mermaid", &HashMap::new(), "A", 0);
        assert_ne!(a, b);
    }

    #[test]
    fn test_client_side_mermaid() {
        let fake = Arc::new(FakeRenderer::default());
        let processor = DiagramProcessor::new(Arc::clone(&fake) as Arc<dyn DiagramRenderer>)
            .mode(DiagramMode::ClientSideMermaid);
        let result = MarkdownRenderer::new()
            .with_processor(processor)
            .render_markdown("```mermaid\nA-->B\n```\n\n```ascii\n-->\n```\n")
            .unwrap();

        assert!(result.html.contains("<pre class=\"mermaid\">A--&gt;B\n</pre>"));
        assert_eq!(fake.calls.lock().unwrap().len(), 1);
    }
}
