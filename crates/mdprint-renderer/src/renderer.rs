//! Markdown to block structure renderer.
//!
//! Parses Markdown with pulldown-cmark, splits the event stream into
//! top-level [`Block`]s, applies the [`PrintLayout`], and runs code block
//! processors over the laid-out body.

use std::fmt::Write;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd, html};

use crate::block::{Block, BlockKind};
use crate::code_block::{CodeBlockProcessor, ProcessResult, parse_fence_info};
use crate::error::RenderError;
use crate::front_matter::FrontMatter;
use crate::highlight::Highlighter;
use crate::layout::PrintLayout;
use crate::util::SlugGenerator;

/// Result of rendering a Markdown document.
#[derive(Clone, Debug)]
pub struct RenderResult {
    /// Laid-out document body with processor placeholders resolved.
    pub html: String,
    /// Top-level blocks in document order.
    pub blocks: Vec<Block>,
    /// Text of the first level-1 heading, or the front matter title.
    pub title: Option<String>,
    /// Front matter, if the document starts with one.
    pub front_matter: Option<FrontMatter>,
    /// Non-fatal problems reported by processors.
    pub warnings: Vec<String>,
}

/// Markdown renderer producing print-layout HTML.
///
/// # Code Block Processors
///
/// Custom code block processing can be added via [`with_processor`](Self::with_processor).
/// Processors are checked in order; the first returning a non-`PassThrough` result wins.
/// Unclaimed code blocks are syntax highlighted.
pub struct MarkdownRenderer {
    processors: Vec<Box<dyn CodeBlockProcessor>>,
    highlighter: Highlighter,
    layout: PrintLayout,
    gfm: bool,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Mutable state for one render pass.
#[derive(Default)]
struct Pass {
    title: Option<String>,
    slugs: SlugGenerator,
    code_block_index: usize,
}

impl MarkdownRenderer {
    /// Create a renderer with GFM extensions and the default layout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            processors: Vec::new(),
            highlighter: Highlighter::default(),
            layout: PrintLayout::default(),
            gfm: true,
        }
    }

    /// Set the print layout policy.
    #[must_use]
    pub fn with_layout(mut self, layout: PrintLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Set the syntax highlighter for unclaimed code blocks.
    #[must_use]
    pub fn with_highlighter(mut self, highlighter: Highlighter) -> Self {
        self.highlighter = highlighter;
        self
    }

    /// Enable or disable GitHub Flavored Markdown features.
    ///
    /// GFM is enabled by default. When enabled, the parser supports:
    /// - Tables
    /// - Strikethrough (`~~text~~`)
    /// - Task lists (`- [ ] item`)
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    /// Add a code block processor.
    #[must_use]
    pub fn with_processor<P: CodeBlockProcessor + 'static>(mut self, processor: P) -> Self {
        self.processors.push(Box::new(processor));
        self
    }

    /// Get parser options based on GFM configuration.
    ///
    /// Smart punctuation and front matter are always enabled.
    #[must_use]
    pub fn parser_options(&self) -> Options {
        let base = Options::ENABLE_SMART_PUNCTUATION | Options::ENABLE_YAML_STYLE_METADATA_BLOCKS;
        if self.gfm {
            base | Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_GFM
        } else {
            base
        }
    }

    /// Create a configured parser for the given markdown text.
    #[must_use]
    pub fn create_parser<'a>(&self, markdown: &'a str) -> Parser<'a> {
        Parser::new_ext(markdown, self.parser_options())
    }

    /// The layout policy in use.
    #[must_use]
    pub fn layout(&self) -> &PrintLayout {
        &self.layout
    }

    /// Render markdown text into laid-out HTML.
    ///
    /// Automatically calls `post_process` on all registered processors
    /// to replace placeholders with rendered content.
    pub fn render_markdown(&mut self, markdown: &str) -> Result<RenderResult, RenderError> {
        let events: Vec<Event<'_>> = self.create_parser(markdown).collect();
        let mut pass = Pass::default();
        let mut blocks = Vec::new();
        let mut front_matter = None;

        let mut i = 0;
        while i < events.len() {
            match &events[i] {
                Event::Start(_) => {
                    let end = matching_end(&events, i);
                    let slice = &events[i..=end];
                    if let Event::Start(Tag::MetadataBlock(_)) = &events[i]
                        && blocks.is_empty()
                        && front_matter.is_none()
                    {
                        let parsed = FrontMatter::parse(&collect_text(slice))?;
                        if let Some(table) = parsed.to_html() {
                            blocks.push(Block::new(BlockKind::FrontMatter, table));
                        }
                        front_matter = Some(parsed);
                    } else {
                        blocks.push(self.build_block(slice, &mut pass));
                    }
                    i = end + 1;
                }
                Event::Rule => {
                    blocks.push(Block::new(BlockKind::HorizontalRule, "<hr />\n"));
                    i += 1;
                }
                _ => {
                    let mut html = String::new();
                    html::push_html(&mut html, std::iter::once(events[i].clone()));
                    blocks.push(Block::new(BlockKind::Html, html));
                    i += 1;
                }
            }
        }

        let mut body = self.layout.render(&blocks);
        for processor in &mut self.processors {
            processor.post_process(&mut body);
        }

        let title = front_matter
            .as_ref()
            .and_then(FrontMatter::title)
            .map(str::to_owned)
            .or(pass.title);

        Ok(RenderResult {
            html: body,
            blocks,
            title,
            front_matter,
            warnings: self.processor_warnings(),
        })
    }

    /// Collect warnings from all processors.
    fn processor_warnings(&self) -> Vec<String> {
        self.processors
            .iter()
            .flat_map(|p| p.warnings())
            .cloned()
            .collect()
    }

    /// Build one top-level block from a balanced `Start..End` event slice.
    fn build_block(&mut self, slice: &[Event<'_>], pass: &mut Pass) -> Block {
        let Event::Start(tag) = &slice[0] else {
            return Block::new(BlockKind::Html, self.render_events(slice, pass));
        };
        let inner = &slice[1..slice.len() - 1];

        match tag {
            Tag::Paragraph => Block::new(BlockKind::Paragraph, self.render_events(slice, pass)),
            Tag::Heading { level, .. } => self.heading(*level, inner, pass),
            Tag::CodeBlock(kind) => {
                let (html, is_diagram) = self.code_block(kind, inner, pass);
                let kind = if is_diagram {
                    BlockKind::Diagram
                } else {
                    BlockKind::CodeBlock
                };
                Block::new(kind, html)
            }
            Tag::List(start) => {
                let items = self.list_items(inner, pass);
                Block::new(
                    BlockKind::List {
                        ordered: start.is_some(),
                        start: start.unwrap_or(1),
                        items,
                    },
                    "",
                )
            }
            Tag::Table(alignments) => Block::new(
                BlockKind::Table {
                    columns: alignments.len(),
                },
                self.render_events(slice, pass),
            ),
            Tag::BlockQuote(_) => Block::new(BlockKind::Blockquote, self.render_events(slice, pass)),
            _ => Block::new(BlockKind::Html, self.render_events(slice, pass)),
        }
    }

    fn heading(&mut self, level: HeadingLevel, inner: &[Event<'_>], pass: &mut Pass) -> Block {
        let level_num = heading_level_to_num(level);
        let text = collect_text(inner);
        if level == HeadingLevel::H1 && pass.title.is_none() && !text.trim().is_empty() {
            pass.title = Some(text.trim().to_owned());
        }
        let id = pass.slugs.slug(&text);
        let content = self.render_events(inner, pass);

        let mut html = String::with_capacity(content.len() + 32);
        let _ = writeln!(html, "<h{level_num} id=\"{id}\">{content}</h{level_num}>");
        Block::new(BlockKind::Heading { level: level_num }, html)
    }

    /// Render each `<li>` of a list separately.
    fn list_items(&mut self, inner: &[Event<'_>], pass: &mut Pass) -> Vec<String> {
        let mut items = Vec::new();
        let mut i = 0;
        while i < inner.len() {
            if let Event::Start(Tag::Item) = &inner[i] {
                let end = matching_end(inner, i);
                items.push(self.render_events(&inner[i..=end], pass));
                i = end + 1;
            } else {
                i += 1;
            }
        }
        items
    }

    /// Render a code block, offering it to processors first.
    ///
    /// Returns the HTML and whether a processor deferred it as a placeholder.
    fn code_block(
        &mut self,
        kind: &CodeBlockKind<'_>,
        inner: &[Event<'_>],
        pass: &mut Pass,
    ) -> (String, bool) {
        let info = match kind {
            CodeBlockKind::Fenced(info) => info.as_ref(),
            CodeBlockKind::Indented => "",
        };
        let (language, attrs) = parse_fence_info(info);
        let source = collect_text(inner);
        let index = pass.code_block_index;
        pass.code_block_index += 1;

        for processor in &mut self.processors {
            match processor.process(&language, &attrs, &source, index) {
                ProcessResult::Placeholder(placeholder) => return (placeholder, true),
                ProcessResult::Inline(html) => return (html, false),
                ProcessResult::PassThrough => {}
            }
        }

        (self.highlighter.code_block(&language, &source), false)
    }

    /// Render an event slice to HTML.
    ///
    /// Nested code blocks and headings are handled here so that processors,
    /// highlighting, anchors, and title extraction apply at any depth.
    fn render_events(&mut self, slice: &[Event<'_>], pass: &mut Pass) -> String {
        let mut events: Vec<Event<'_>> = Vec::with_capacity(slice.len());
        let mut i = 0;
        while i < slice.len() {
            match &slice[i] {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let end = matching_end(slice, i);
                    let (html, _) = self.code_block(kind, &slice[i + 1..end], pass);
                    events.push(Event::Html(html.into()));
                    i = end + 1;
                }
                Event::Start(Tag::Heading { level, .. }) => {
                    let end = matching_end(slice, i);
                    let block = self.heading(*level, &slice[i + 1..end], pass);
                    events.push(Event::Html(block.html.into()));
                    i = end + 1;
                }
                event => {
                    events.push(event.clone());
                    i += 1;
                }
            }
        }

        let mut out = String::new();
        html::push_html(&mut out, events.into_iter());
        out
    }
}

/// Index of the `End` event balancing the `Start` at `start`.
///
/// Returns the last index if the stream is unbalanced.
fn matching_end(events: &[Event<'_>], start: usize) -> usize {
    let mut depth = 0usize;
    for (offset, event) in events[start..].iter().enumerate() {
        match event {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return start + offset;
                }
            }
            _ => {}
        }
    }
    events.len() - 1
}

/// Concatenated plain text of an event slice.
fn collect_text(events: &[Event<'_>]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(t),
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            Event::End(TagEnd::Paragraph) => text.push('\n'),
            _ => {}
        }
    }
    text
}

fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Title of a Markdown document without rendering it.
///
/// Uses the same rule as [`MarkdownRenderer::render_markdown`]: a front
/// matter `title` wins over the first level-1 heading. Malformed front matter
/// is ignored here.
#[must_use]
pub fn extract_title(markdown: &str) -> Option<String> {
    let options = Options::ENABLE_YAML_STYLE_METADATA_BLOCKS;
    let events: Vec<Event<'_>> = Parser::new_ext(markdown, options).collect();

    if let Some(Event::Start(Tag::MetadataBlock(_))) = events.first() {
        let end = matching_end(&events, 0);
        if let Some(title) = FrontMatter::parse(&collect_text(&events[1..end]))
            .ok()
            .as_ref()
            .and_then(FrontMatter::title)
        {
            return Some(title.to_owned());
        }
    }

    events
        .iter()
        .enumerate()
        .filter(|(_, e)| matches!(e, Event::Start(Tag::Heading { level: HeadingLevel::H1, .. })))
        .map(|(start, _)| {
            let end = matching_end(&events, start);
            collect_text(&events[start + 1..end]).trim().to_owned()
        })
        .find(|title| !title.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::TableWidth;
    use crate::code_block::ExtractedCodeBlock;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn render(markdown: &str) -> RenderResult {
        MarkdownRenderer::new().render_markdown(markdown).unwrap()
    }

    fn kinds(result: &RenderResult) -> Vec<&BlockKind> {
        result.blocks.iter().map(|b| &b.kind).collect()
    }

    #[test]
    fn test_basic_paragraph() {
        let result = render("Hello");
        assert_eq!(result.html, "<div class=\"keep-together\">\n<p>Hello</p>\n</div>\n");
    }

    #[test]
    fn test_block_kinds() {
        let markdown = "# Title\n\nText\n\n```rust\nfn main() {}\n```\n\n- a\n- b\n\n> quote\n\n***\n\n| a | b |\n|---|---|\n| 1 | 2 |\n";
        let result = render(markdown);
        assert_eq!(
            kinds(&result),
            vec![
                &BlockKind::Heading { level: 1 },
                &BlockKind::Paragraph,
                &BlockKind::CodeBlock,
                &BlockKind::List {
                    ordered: false,
                    start: 1,
                    items: vec!["<li>a</li>\n".to_owned(), "<li>b</li>\n".to_owned()],
                },
                &BlockKind::Blockquote,
                &BlockKind::HorizontalRule,
                &BlockKind::Table { columns: 2 },
            ]
        );
    }

    #[test]
    fn test_title_from_first_h1_kept_in_body() {
        let result = render("Intro text\n\n# Part 1: Introduction\n\n# Part 2\n");
        assert_eq!(result.title.as_deref(), Some("Part 1: Introduction"));
        assert!(
            result
                .html
                .contains("<h1 id=\"part-1-introduction\">Part 1: Introduction</h1>")
        );
    }

    #[test]
    fn test_empty_h1_skipped_for_title() {
        let markdown = "#\n\ntext\n\n# Real Title\n";
        let result = render(markdown);
        assert_eq!(result.title.as_deref(), Some("Real Title"));
        assert_eq!(extract_title(markdown).as_deref(), Some("Real Title"));
        assert_eq!(extract_title("# \n"), None);
    }

    #[test]
    fn test_no_h1_no_title() {
        let result = render("## Only a subheading\n\ntext");
        assert_eq!(result.title, None);
    }

    #[test]
    fn test_h1_nested_in_blockquote_is_title() {
        let result = render("> # Quoted Title\n\n# Later\n");
        assert_eq!(result.title.as_deref(), Some("Quoted Title"));
    }

    #[test]
    fn test_title_with_inline_code() {
        let result = render("# Using `cargo` today\n");
        assert_eq!(result.title.as_deref(), Some("Using cargo today"));
        assert!(result.html.contains("<code>cargo</code>"));
    }

    #[test]
    fn test_heading_wrapped_keep_with_next() {
        let result = render("## Setup\n");
        assert_eq!(
            result.html,
            "<div class=\"keep-together keep-with-next\">\n<h2 id=\"setup\">Setup</h2>\n</div>\n"
        );
    }

    #[test]
    fn test_table_width_in_output() {
        let narrow = render("| a | b | c |\n|---|---|---|\n| 1 | 2 | 3 |\n");
        let wide = render("| a | b | c | d |\n|---|---|---|---|\n| 1 | 2 | 3 | 4 |\n");
        assert!(narrow.html.contains("<table class=\"narrow\">"));
        assert!(wide.html.contains("<table class=\"wide\">"));
        assert_eq!(
            MarkdownRenderer::new().layout().table_width(3),
            TableWidth::Narrow
        );
    }

    #[test]
    fn test_code_block_highlighted_and_atomic() {
        let result = render("```rust\nfn main() {}\n```\n");
        assert!(
            result
                .html
                .starts_with("<div class=\"keep-together\">\n<pre class=\"code\"><code class=\"language-rust\">")
        );
    }

    #[test]
    fn test_long_list_split_into_groups() {
        let markdown: String = (1..=50).map(|i| format!("- item {i}\n")).collect();
        let mut renderer = MarkdownRenderer::new().with_layout(PrintLayout::new(3, 20));
        let result = renderer.render_markdown(&markdown).unwrap();
        assert_eq!(result.html.matches("list-group").count(), 3);
    }

    #[test]
    fn test_ordered_list_start() {
        let result = render("3. three\n4. four\n");
        assert!(matches!(
            result.blocks[0].kind,
            BlockKind::List {
                ordered: true,
                start: 3,
                ..
            }
        ));
        assert!(result.html.contains("<ol start=\"3\">"));
    }

    #[test]
    fn test_smart_punctuation() {
        let result = render("\"quoted\" -- dash");
        assert!(result.html.contains("\u{201c}quoted\u{201d}"));
        assert!(result.html.contains('\u{2013}'));
    }

    #[test]
    fn test_front_matter() {
        let result = render("---\ntitle: From Meta\nauthor: Ann\n---\n\n# Heading\n");
        assert_eq!(result.title.as_deref(), Some("From Meta"));
        assert_eq!(result.blocks[0].kind, BlockKind::FrontMatter);
        assert!(result.html.contains("<th>author</th><td>Ann</td>"));
        assert_eq!(
            result.front_matter.as_ref().and_then(|fm| fm.get("author")),
            Some("Ann")
        );
    }

    #[test]
    fn test_invalid_front_matter_is_error() {
        let result = MarkdownRenderer::new().render_markdown("---\ntitle: [oops\n---\n\nBody\n");
        assert!(matches!(result, Err(RenderError::FrontMatter(_))));
    }

    #[test]
    fn test_render_is_deterministic() {
        let markdown = "# T\n\n| a | b | c | d |\n|---|---|---|---|\n| 1 | 2 | 3 | 4 |\n\n```python\nprint(1)\n```\n";
        assert_eq!(render(markdown).html, render(markdown).html);
    }

    #[test]
    fn test_duplicate_heading_ids() {
        let result = render("## Notes\n\n## Notes\n");
        assert!(result.html.contains("<h2 id=\"notes\">"));
        assert!(result.html.contains("<h2 id=\"notes-1\">"));
    }

    // Code block processor tests

    struct PlaceholderProcessor {
        extracted: Vec<ExtractedCodeBlock>,
    }

    impl PlaceholderProcessor {
        fn new() -> Self {
            Self {
                extracted: Vec::new(),
            }
        }
    }

    impl CodeBlockProcessor for PlaceholderProcessor {
        fn process(
            &mut self,
            language: &str,
            attrs: &HashMap<String, String>,
            source: &str,
            index: usize,
        ) -> ProcessResult {
            if language == "diagram" {
                self.extracted.push(ExtractedCodeBlock {
                    index,
                    language: language.to_owned(),
                    source: source.to_owned(),
                    attrs: attrs.clone(),
                });
                ProcessResult::Placeholder(format!("{{{{DIAGRAM_{index}}}}}"))
            } else {
                ProcessResult::PassThrough
            }
        }

        fn post_process(&mut self, html: &mut String) {
            for block in &self.extracted {
                *html = html.replace(
                    &format!("{{{{DIAGRAM_{}}}}}", block.index),
                    &format!("<img alt=\"diagram {}\">", block.index),
                );
            }
        }

        fn extracted(&self) -> &[ExtractedCodeBlock] {
            &self.extracted
        }

        fn warnings(&self) -> &[String] {
            &[]
        }
    }

    struct WarningProcessor(Vec<String>);

    impl CodeBlockProcessor for WarningProcessor {
        fn process(
            &mut self,
            _language: &str,
            _attrs: &HashMap<String, String>,
            _source: &str,
            _index: usize,
        ) -> ProcessResult {
            ProcessResult::PassThrough
        }

        fn warnings(&self) -> &[String] {
            &self.0
        }
    }

    #[test]
    fn test_processor_placeholder_becomes_diagram_block() {
        let mut renderer = MarkdownRenderer::new().with_processor(PlaceholderProcessor::new());
        let result = renderer
            .render_markdown("Text\n\n```diagram\nA -> B\n```\n")
            .unwrap();

        assert_eq!(result.blocks[1].kind, BlockKind::Diagram);
        assert_eq!(result.blocks[1].html, "{{DIAGRAM_0}}");
        assert!(
            result
                .html
                .contains("<div class=\"keep-together diagram-block\">\n<img alt=\"diagram 0\">\n</div>")
        );
    }

    #[test]
    fn test_processor_sees_nested_blocks() {
        let mut renderer = MarkdownRenderer::new().with_processor(PlaceholderProcessor::new());
        let result = renderer
            .render_markdown("- item\n\n  ```diagram\n  X\n  ```\n")
            .unwrap();
        assert!(result.html.contains("<img alt=\"diagram 0\">"));
    }

    #[test]
    fn test_processor_passthrough_highlights() {
        let mut renderer = MarkdownRenderer::new().with_processor(PlaceholderProcessor::new());
        let result = renderer.render_markdown("```rust\nfn main() {}\n```\n").unwrap();
        assert_eq!(result.blocks[0].kind, BlockKind::CodeBlock);
        assert!(result.html.contains("class=\"language-rust\""));
    }

    #[test]
    fn test_render_result_includes_warnings() {
        let mut renderer =
            MarkdownRenderer::new().with_processor(WarningProcessor(vec!["careful".to_owned()]));
        let result = renderer.render_markdown("text").unwrap();
        assert_eq!(result.warnings, vec!["careful".to_owned()]);
    }

    #[test]
    fn test_gfm_disabled() {
        let mut renderer = MarkdownRenderer::new().with_gfm(false);
        let result = renderer.render_markdown("| a |\n|---|\n| 1 |\n").unwrap();
        assert!(!result.html.contains("<table"));
    }

    #[test]
    fn test_extract_title() {
        assert_eq!(extract_title("Intro\n\n# Main *Title*\n\n# Second\n").as_deref(), Some("Main Title"));
        assert_eq!(
            extract_title("---\ntitle: From YAML\n---\n\n# Heading\n").as_deref(),
            Some("From YAML")
        );
        assert_eq!(extract_title("## Only H2\n").as_deref(), None);
        assert_eq!(extract_title("---\ntitle: [bad\n---\n\n# Fallback\n").as_deref(), Some("Fallback"));
    }
}
