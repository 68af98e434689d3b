//! Print layout classification and wrapping.
//!
//! Assigns every [`Block`] its keep-together and table width classification
//! and serializes the blocks into the document body. Break avoidance is
//! expressed as wrapper elements carrying the `keep-together` class, which
//! the print stylesheet maps to `break-inside: avoid`.

use std::fmt::Write;

use crate::block::{Block, BlockKind, KeepTogether, TableWidth};

/// Default inclusive column limit for narrow tables.
pub const DEFAULT_NARROW_TABLE_MAX_COLUMNS: usize = 3;

/// Default number of items above which a list may split.
pub const DEFAULT_LIST_SPLIT_THRESHOLD: usize = 20;

/// Print layout policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrintLayout {
    narrow_table_max_columns: usize,
    list_split_threshold: usize,
}

impl Default for PrintLayout {
    fn default() -> Self {
        Self::new(
            DEFAULT_NARROW_TABLE_MAX_COLUMNS,
            DEFAULT_LIST_SPLIT_THRESHOLD,
        )
    }
}

impl PrintLayout {
    /// Create a layout policy. Thresholds below 1 are raised to 1.
    #[must_use]
    pub fn new(narrow_table_max_columns: usize, list_split_threshold: usize) -> Self {
        Self {
            narrow_table_max_columns: narrow_table_max_columns.max(1),
            list_split_threshold: list_split_threshold.max(1),
        }
    }

    /// Keep-together classification of a block.
    #[must_use]
    pub fn keep_together(&self, block: &Block) -> KeepTogether {
        match &block.kind {
            BlockKind::List { items, .. } if items.len() > self.list_split_threshold => {
                KeepTogether::ItemGroups(self.list_split_threshold)
            }
            BlockKind::Table { .. } | BlockKind::Blockquote | BlockKind::Html => {
                KeepTogether::Splittable
            }
            _ => KeepTogether::Atomic,
        }
    }

    /// Width classification of a table with `columns` columns.
    ///
    /// The threshold is inclusive: a table with exactly the configured
    /// number of columns is narrow.
    #[must_use]
    pub fn table_width(&self, columns: usize) -> TableWidth {
        if columns <= self.narrow_table_max_columns {
            TableWidth::Narrow
        } else {
            TableWidth::Wide
        }
    }

    /// Serialize blocks into the document body.
    #[must_use]
    pub fn render(&self, blocks: &[Block]) -> String {
        let mut out = String::with_capacity(blocks.iter().map(|b| b.html.len() + 48).sum());
        for block in blocks {
            self.render_block(block, &mut out);
        }
        out
    }

    fn render_block(&self, block: &Block, out: &mut String) {
        match &block.kind {
            BlockKind::List {
                ordered,
                start,
                items,
            } => self.render_list(*ordered, *start, items, out),
            BlockKind::Table { columns } => {
                let class = self.table_width(*columns).class();
                out.push_str(&block.html.replacen(
                    "<table>",
                    &format!("<table class=\"{class}\">"),
                    1,
                ));
            }
            BlockKind::Heading { .. } => wrap(&block.html, "keep-together keep-with-next", out),
            BlockKind::Diagram => wrap(&block.html, "keep-together diagram-block", out),
            BlockKind::Blockquote | BlockKind::Html => out.push_str(&block.html),
            BlockKind::Paragraph
            | BlockKind::CodeBlock
            | BlockKind::HorizontalRule
            | BlockKind::FrontMatter => wrap(&block.html, "keep-together", out),
        }
    }

    fn render_list(&self, ordered: bool, start: u64, items: &[String], out: &mut String) {
        if items.len() <= self.list_split_threshold {
            out.push_str("<div class=\"keep-together\">\n");
            push_list(ordered, start, false, items, out);
            out.push_str("</div>\n");
            return;
        }

        let mut number = start;
        for (i, group) in items.chunks(self.list_split_threshold).enumerate() {
            out.push_str("<div class=\"keep-together list-group\">\n");
            push_list(ordered, number, i > 0, group, out);
            out.push_str("</div>\n");
            number += group.len() as u64;
        }
    }
}

fn wrap(html: &str, class: &str, out: &mut String) {
    let _ = writeln!(out, "<div class=\"{class}\">");
    out.push_str(html);
    if !html.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("</div>\n");
}

fn push_list(ordered: bool, start: u64, continued: bool, items: &[String], out: &mut String) {
    let tag = if ordered { "ol" } else { "ul" };
    out.push('<');
    out.push_str(tag);
    if ordered && start != 1 {
        let _ = write!(out, " start=\"{start}\"");
    }
    if continued {
        out.push_str(" class=\"continued\"");
    }
    out.push_str(">\n");
    for item in items {
        out.push_str(item);
    }
    let _ = writeln!(out, "</{tag}>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn list(ordered: bool, count: usize) -> Block {
        Block::new(
            BlockKind::List {
                ordered,
                start: 1,
                items: (1..=count).map(|i| format!("<li>item {i}</li>\n")).collect(),
            },
            "",
        )
    }

    fn table(columns: usize) -> Block {
        Block::new(
            BlockKind::Table { columns },
            "<table><thead><tr><th>a</th></tr></thead></table>\n",
        )
    }

    #[test]
    fn test_table_width_boundary() {
        let layout = PrintLayout::default();
        assert_eq!(layout.table_width(1), TableWidth::Narrow);
        assert_eq!(layout.table_width(3), TableWidth::Narrow);
        assert_eq!(layout.table_width(4), TableWidth::Wide);
        assert_eq!(layout.table_width(12), TableWidth::Wide);
    }

    #[test]
    fn test_table_width_custom_threshold() {
        let layout = PrintLayout::new(5, 20);
        assert_eq!(layout.table_width(5), TableWidth::Narrow);
        assert_eq!(layout.table_width(6), TableWidth::Wide);
    }

    #[test]
    fn test_table_class_applied() {
        let layout = PrintLayout::default();
        let narrow = layout.render(&[table(3)]);
        let wide = layout.render(&[table(4)]);
        assert!(narrow.starts_with("<table class=\"narrow\">"));
        assert!(wide.starts_with("<table class=\"wide\">"));
    }

    #[test]
    fn test_keep_together_classification() {
        let layout = PrintLayout::default();
        assert_eq!(
            layout.keep_together(&Block::new(BlockKind::Paragraph, "<p>x</p>")),
            KeepTogether::Atomic
        );
        assert_eq!(
            layout.keep_together(&Block::new(BlockKind::CodeBlock, "<pre></pre>")),
            KeepTogether::Atomic
        );
        assert_eq!(
            layout.keep_together(&Block::new(BlockKind::Diagram, "{{DIAGRAM_0}}")),
            KeepTogether::Atomic
        );
        assert_eq!(layout.keep_together(&table(2)), KeepTogether::Splittable);
        assert_eq!(layout.keep_together(&list(false, 20)), KeepTogether::Atomic);
        assert_eq!(
            layout.keep_together(&list(false, 21)),
            KeepTogether::ItemGroups(20)
        );
    }

    #[test]
    fn test_paragraph_wrapped_atomic() {
        let layout = PrintLayout::default();
        let html = layout.render(&[Block::new(BlockKind::Paragraph, "<p>Hello</p>\n")]);
        assert_eq!(html, "<div class=\"keep-together\">\n<p>Hello</p>\n</div>\n");
    }

    #[test]
    fn test_short_list_single_group() {
        let layout = PrintLayout::default();
        let html = layout.render(&[list(false, 3)]);
        assert_eq!(
            html,
            "<div class=\"keep-together\">\n<ul>\n<li>item 1</li>\n<li>item 2</li>\n<li>item 3</li>\n</ul>\n</div>\n"
        );
    }

    #[test]
    fn test_long_list_splits_at_item_boundaries() {
        let layout = PrintLayout::new(3, 20);
        let html = layout.render(&[list(false, 50)]);

        let groups: Vec<&str> = html
            .split("<div class=\"keep-together list-group\">")
            .skip(1)
            .collect();
        assert_eq!(groups.len(), 3);
        for group in &groups {
            assert_eq!(group.matches("<li>").count(), group.matches("</li>").count());
        }
        assert_eq!(groups[0].matches("<li>").count(), 20);
        assert_eq!(groups[2].matches("<li>").count(), 10);
    }

    #[test]
    fn test_ordered_list_groups_continue_numbering() {
        let layout = PrintLayout::new(3, 2);
        let html = layout.render(&[list(true, 5)]);
        assert!(html.contains("<ol>\n<li>item 1</li>"));
        assert!(html.contains("<ol start=\"3\" class=\"continued\">\n<li>item 3</li>"));
        assert!(html.contains("<ol start=\"5\" class=\"continued\">\n<li>item 5</li>"));
    }

    #[test]
    fn test_zero_thresholds_clamped() {
        let layout = PrintLayout::new(0, 0);
        assert_eq!(layout.table_width(1), TableWidth::Narrow);
        assert_eq!(layout.keep_together(&list(false, 2)), KeepTogether::ItemGroups(1));
    }
}
