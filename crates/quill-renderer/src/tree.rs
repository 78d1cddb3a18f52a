//! Owned markdown document tree.
//!
//! Every pipeline stage consumes a [`Document`] by value and returns a new one,
//! so a tree is never shared between two transformations.

use crate::code::CodeBlockDescriptor;
use crate::directive::Directive;
use crate::severity::Severity;

/// Root of a markdown document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Document {
    /// Top-level blocks in document order.
    pub children: Vec<Node>,
}

impl Document {
    /// Create a document from top-level blocks.
    #[must_use]
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }

    /// Concatenated text of the whole document.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.write_text(&mut out);
        }
        out
    }

    /// Visit every node depth-first in document order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Node)) {
        for child in &self.children {
            child.walk(visit);
        }
    }
}

/// Stable type tag of a [`Node`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Text,
    InlineCode,
    Emphasis,
    Strong,
    Strikethrough,
    Link,
    Image,
    SoftBreak,
    HardBreak,
    Paragraph,
    Heading,
    BlockQuote,
    List,
    ListItem,
    CodeBlock,
    Table,
    TableRow,
    TableCell,
    Html,
    Rule,
    Math,
    Marker,
    Directive,
    Section,
}

impl NodeKind {
    /// Name used in diagnostics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::InlineCode => "inline-code",
            Self::Emphasis => "emphasis",
            Self::Strong => "strong",
            Self::Strikethrough => "strikethrough",
            Self::Link => "link",
            Self::Image => "image",
            Self::SoftBreak => "soft-break",
            Self::HardBreak => "hard-break",
            Self::Paragraph => "paragraph",
            Self::Heading => "heading",
            Self::BlockQuote => "blockquote",
            Self::List => "list",
            Self::ListItem => "list-item",
            Self::CodeBlock => "code-block",
            Self::Table => "table",
            Self::TableRow => "table-row",
            Self::TableCell => "table-cell",
            Self::Html => "html",
            Self::Rule => "rule",
            Self::Math => "math",
            Self::Marker => "directive-marker",
            Self::Directive => "directive",
            Self::Section => "section",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column alignment of a table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    None,
    Left,
    Center,
    Right,
}

impl From<pulldown_cmark::Alignment> for Align {
    fn from(alignment: pulldown_cmark::Alignment) -> Self {
        match alignment {
            pulldown_cmark::Alignment::None => Self::None,
            pulldown_cmark::Alignment::Left => Self::Left,
            pulldown_cmark::Alignment::Center => Self::Center,
            pulldown_cmark::Alignment::Right => Self::Right,
        }
    }
}

/// Synthetic container wrapping a heading and the content it introduces.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Section {
    /// Depth of the introducing heading (1-6).
    pub depth: u8,
    /// The heading followed by its content and nested sections.
    pub children: Vec<Node>,
}

/// A node of the markdown tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Text(String),
    InlineCode(String),
    Emphasis(Vec<Node>),
    Strong(Vec<Node>),
    Strikethrough(Vec<Node>),
    Link {
        url: String,
        title: String,
        children: Vec<Node>,
    },
    Image {
        url: String,
        title: String,
        alt: String,
    },
    SoftBreak,
    HardBreak,
    Paragraph(Vec<Node>),
    Heading {
        depth: u8,
        children: Vec<Node>,
    },
    BlockQuote {
        /// GFM alert kind (`> [!NOTE]`) recognized by the parser.
        alert: Option<Severity>,
        children: Vec<Node>,
    },
    List {
        /// Start number of an ordered list, `None` for bullets.
        start: Option<u64>,
        items: Vec<Node>,
    },
    ListItem {
        /// Task list state, if the item is a task.
        checked: Option<bool>,
        children: Vec<Node>,
    },
    CodeBlock(CodeBlockDescriptor),
    Table {
        alignments: Vec<Align>,
        rows: Vec<Node>,
    },
    TableRow {
        header: bool,
        cells: Vec<Node>,
    },
    TableCell(Vec<Node>),
    Html(String),
    Rule,
    Math {
        display: bool,
        value: String,
    },
    /// A directive marker line (`:::name`, `:::`, `::name`) not yet parsed.
    Marker {
        /// 1-based source line.
        line: usize,
        raw: String,
    },
    Directive(Directive),
    Section(Section),
}

impl Node {
    /// Type tag of this node.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Text(_) => NodeKind::Text,
            Self::InlineCode(_) => NodeKind::InlineCode,
            Self::Emphasis(_) => NodeKind::Emphasis,
            Self::Strong(_) => NodeKind::Strong,
            Self::Strikethrough(_) => NodeKind::Strikethrough,
            Self::Link { .. } => NodeKind::Link,
            Self::Image { .. } => NodeKind::Image,
            Self::SoftBreak => NodeKind::SoftBreak,
            Self::HardBreak => NodeKind::HardBreak,
            Self::Paragraph(_) => NodeKind::Paragraph,
            Self::Heading { .. } => NodeKind::Heading,
            Self::BlockQuote { .. } => NodeKind::BlockQuote,
            Self::List { .. } => NodeKind::List,
            Self::ListItem { .. } => NodeKind::ListItem,
            Self::CodeBlock(_) => NodeKind::CodeBlock,
            Self::Table { .. } => NodeKind::Table,
            Self::TableRow { .. } => NodeKind::TableRow,
            Self::TableCell(_) => NodeKind::TableCell,
            Self::Html(_) => NodeKind::Html,
            Self::Rule => NodeKind::Rule,
            Self::Math { .. } => NodeKind::Math,
            Self::Marker { .. } => NodeKind::Marker,
            Self::Directive(_) => NodeKind::Directive,
            Self::Section(_) => NodeKind::Section,
        }
    }

    /// Ordered children (empty for leaves).
    #[must_use]
    pub fn children(&self) -> &[Node] {
        match self {
            Self::Emphasis(children)
            | Self::Strong(children)
            | Self::Strikethrough(children)
            | Self::Paragraph(children)
            | Self::TableCell(children)
            | Self::Link { children, .. }
            | Self::Heading { children, .. }
            | Self::BlockQuote { children, .. }
            | Self::ListItem { children, .. } => children,
            Self::List { items, .. } => items,
            Self::Table { rows, .. } => rows,
            Self::TableRow { cells, .. } => cells,
            Self::Directive(directive) => &directive.children,
            Self::Section(section) => &section.children,
            Self::Text(_)
            | Self::InlineCode(_)
            | Self::Image { .. }
            | Self::SoftBreak
            | Self::HardBreak
            | Self::CodeBlock(_)
            | Self::Html(_)
            | Self::Rule
            | Self::Math { .. }
            | Self::Marker { .. } => &[],
        }
    }

    /// Rebuild this node with its children passed through `f`.
    ///
    /// Leaves are returned unchanged.
    #[must_use]
    pub fn map_children(self, f: &mut impl FnMut(Vec<Node>) -> Vec<Node>) -> Self {
        match self {
            Self::Emphasis(children) => Self::Emphasis(f(children)),
            Self::Strong(children) => Self::Strong(f(children)),
            Self::Strikethrough(children) => Self::Strikethrough(f(children)),
            Self::Paragraph(children) => Self::Paragraph(f(children)),
            Self::TableCell(children) => Self::TableCell(f(children)),
            Self::Link {
                url,
                title,
                children,
            } => Self::Link {
                url,
                title,
                children: f(children),
            },
            Self::Heading { depth, children } => Self::Heading {
                depth,
                children: f(children),
            },
            Self::BlockQuote { alert, children } => Self::BlockQuote {
                alert,
                children: f(children),
            },
            Self::List { start, items } => Self::List {
                start,
                items: f(items),
            },
            Self::ListItem { checked, children } => Self::ListItem {
                checked,
                children: f(children),
            },
            Self::Table { alignments, rows } => Self::Table {
                alignments,
                rows: f(rows),
            },
            Self::TableRow { header, cells } => Self::TableRow {
                header,
                cells: f(cells),
            },
            Self::Directive(mut directive) => {
                directive.children = f(directive.children);
                Self::Directive(directive)
            }
            Self::Section(Section { depth, children }) => Self::Section(Section {
                depth,
                children: f(children),
            }),
            leaf => leaf,
        }
    }

    /// Whether this node is block-level content.
    #[must_use]
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            Self::Paragraph(_)
                | Self::Heading { .. }
                | Self::BlockQuote { .. }
                | Self::List { .. }
                | Self::ListItem { .. }
                | Self::CodeBlock(_)
                | Self::Table { .. }
                | Self::TableRow { .. }
                | Self::TableCell(_)
                | Self::Rule
                | Self::Marker { .. }
                | Self::Section(_)
        ) || matches!(self, Self::Math { display: true, .. })
            || matches!(self, Self::Directive(d) if d.kind == crate::directive::DirectiveKind::Container)
    }

    /// Concatenated text content of this node and its descendants.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.write_text(&mut out);
        out
    }

    fn write_text(&self, out: &mut String) {
        if self.is_block() && !out.is_empty() && !out.ends_with(char::is_whitespace) {
            out.push(' ');
        }
        match self {
            Self::Text(text) | Self::InlineCode(text) | Self::Math { value: text, .. } => {
                out.push_str(text);
            }
            Self::Image { alt, .. } => out.push_str(alt),
            Self::CodeBlock(block) => out.push_str(&block.lines.join("\n")),
            Self::SoftBreak | Self::HardBreak => out.push(' '),
            _ => {
                for child in self.children() {
                    child.write_text(out);
                }
            }
        }
    }

    /// Visit this node and its descendants depth-first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Node)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }
}

/// Append a node, merging adjacent text nodes.
pub(crate) fn push_merged(nodes: &mut Vec<Node>, node: Node) {
    if let Node::Text(text) = &node
        && let Some(Node::Text(last)) = nodes.last_mut()
    {
        last.push_str(text);
        return;
    }
    nodes.push(node);
}
