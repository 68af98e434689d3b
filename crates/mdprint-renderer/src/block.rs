//! Structural units of a rendered document.

/// Top-level structural unit of the document body.
///
/// Blocks are produced once per render and carry the HTML of their content
/// before any print layout wrapping is applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    /// What kind of content the block holds.
    pub kind: BlockKind,
    /// Rendered HTML of the block. Empty for lists, whose content lives in
    /// [`BlockKind::List::items`].
    pub html: String,
}

impl Block {
    pub(crate) fn new(kind: BlockKind, html: impl Into<String>) -> Self {
        Self {
            kind,
            html: html.into(),
        }
    }
}

/// Kind of a top-level [`Block`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    Heading {
        level: u8,
    },
    CodeBlock,
    List {
        ordered: bool,
        /// First item number for ordered lists.
        start: u64,
        /// Rendered `<li>` elements, one per item.
        items: Vec<String>,
    },
    Table {
        /// Column count taken from the header row.
        columns: usize,
    },
    Blockquote,
    Diagram,
    HorizontalRule,
    /// YAML front matter rendered as a metadata table.
    FrontMatter,
    /// Raw HTML and other block constructs passed through unchanged.
    Html,
}

/// Whether a block may be split across a column or page break.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeepTogether {
    /// Must not be split.
    Atomic,
    /// May be split anywhere the rendering engine chooses.
    Splittable,
    /// May be split only between groups of at most this many items.
    /// Each group is atomic.
    ItemGroups(usize),
}

/// Column placement of a table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableWidth {
    /// Stays within the current print column.
    Narrow,
    /// Spans both print columns.
    Wide,
}

impl TableWidth {
    /// CSS class applied to the table element.
    #[must_use]
    pub fn class(self) -> &'static str {
        match self {
            Self::Narrow => "narrow",
            Self::Wide => "wide",
        }
    }
}
