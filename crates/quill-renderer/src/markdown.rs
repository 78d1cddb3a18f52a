//! Markdown source to [`Document`] tree.
//!
//! Parsing happens in three steps:
//!
//! 1. Split off YAML front matter.
//! 2. Isolate directive marker lines (`:::note`, `:::`, `::github{...}`) outside
//!    code fences. Each marker is replaced by a placeholder HTML comment on a
//!    line of its own so `CommonMark` can neither fold it into a paragraph nor
//!    read it as something else.
//! 3. Build the tree from `pulldown-cmark` events, turning placeholder comments
//!    back into [`Node::Marker`] nodes for the directive parser.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use crate::code::CodeBlockDescriptor;
use crate::error::PipelineError;
use crate::fence::FenceTracker;
use crate::severity::Severity;
use crate::tree::{Align, Document, Node, push_merged};

/// Front matter fields, passed through untouched.
pub type FrontMatter = serde_json::Map<String, serde_json::Value>;

const MARKER_PREFIX: &str = "<!--quill:marker:";
const MARKER_SUFFIX: &str = "-->";

/// Result of parsing one markdown source.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedMarkdown {
    pub front_matter: FrontMatter,
    pub document: Document,
}

/// Parse markdown with optional front matter.
///
/// # Errors
///
/// Returns [`PipelineError::FrontMatter`] if the front matter block is not
/// valid YAML or not a mapping.
pub fn parse_markdown(source: &str) -> Result<ParsedMarkdown, PipelineError> {
    let (front_matter, body, body_line) = split_front_matter(source)?;
    let (prepared, markers) = isolate_markers(body, body_line);
    let document = build_tree(&prepared, &markers);
    Ok(ParsedMarkdown {
        front_matter,
        document,
    })
}

/// Split a leading `---` front matter block off the source.
///
/// Returns the parsed fields, the body, and the 1-based line the body starts
/// on. A block without a closing `---` (or `...`) line is not front matter.
fn split_front_matter(source: &str) -> Result<(FrontMatter, &str, usize), PipelineError> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let Some(first_line_end) = source.find('\n') else {
        return Ok((FrontMatter::new(), source, 1));
    };
    if source[..first_line_end].trim_end() != "---" {
        return Ok((FrontMatter::new(), source, 1));
    }

    let mut offset = first_line_end + 1;
    let mut line = 2;
    while offset <= source.len() {
        let end = source[offset..]
            .find('\n')
            .map_or(source.len(), |i| offset + i);
        let text = source[offset..end].trim_end();
        if text == "---" || text == "..." {
            let yaml = &source[first_line_end + 1..offset];
            let body = source.get(end + 1..).unwrap_or("");
            return Ok((parse_front_matter(yaml)?, body, line + 1));
        }
        if end == source.len() {
            break;
        }
        offset = end + 1;
        line += 1;
    }

    Ok((FrontMatter::new(), source, 1))
}

fn parse_front_matter(yaml: &str) -> Result<FrontMatter, PipelineError> {
    if yaml.trim().is_empty() {
        return Ok(FrontMatter::new());
    }

    let value: serde_yaml::Value =
        serde_yaml::from_str(yaml).map_err(|e| PipelineError::FrontMatter {
            message: e.to_string(),
        })?;
    match serde_json::to_value(value) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(serde_json::Value::Null) => Ok(FrontMatter::new()),
        Ok(other) => Err(PipelineError::FrontMatter {
            message: format!("expected a mapping, found {}", json_type_name(&other)),
        }),
        Err(e) => Err(PipelineError::FrontMatter {
            message: e.to_string(),
        }),
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "a sequence",
        serde_json::Value::Object(_) => "a mapping",
    }
}

/// A marker line taken out of the source.
#[derive(Clone, Debug, PartialEq, Eq)]
struct IsolatedMarker {
    line: usize,
    raw: String,
}

/// Replace directive marker lines outside code fences with placeholders.
///
/// A placeholder keeps the marker line's indentation, so a marker inside a
/// list item stays inside that item.
fn isolate_markers(body: &str, first_line: usize) -> (String, Vec<IsolatedMarker>) {
    let mut out = String::with_capacity(body.len());
    let mut markers = Vec::new();
    let mut fence = FenceTracker::new();
    let mut lists = ListIndents::default();

    for (i, line) in body.lines().enumerate() {
        let (quote, rest) = split_quote_prefix(line);
        if fence.update(rest) || fence.in_fence() {
            out.push_str(line);
            out.push('\n');
            continue;
        }
        let base = lists.update(rest);
        if !is_marker_line(rest, base) {
            out.push_str(line);
            out.push('\n');
            continue;
        }

        // Blank lines around the placeholder keep the blockquote open
        let indent = &rest[..leading_spaces(rest)];
        let blank = quote.trim_end();
        out.push_str(blank);
        out.push('\n');
        out.push_str(quote);
        out.push_str(indent);
        out.push_str(MARKER_PREFIX);
        out.push_str(&markers.len().to_string());
        out.push_str(MARKER_SUFFIX);
        out.push('\n');
        out.push_str(blank);
        out.push('\n');
        markers.push(IsolatedMarker {
            line: first_line + i,
            raw: rest.trim_start().to_owned(),
        });
    }

    (out, markers)
}

/// Content columns of the list items enclosing the current line.
#[derive(Debug, Default)]
struct ListIndents(Vec<usize>);

impl ListIndents {
    /// Track one line and return the column its block content is measured from.
    ///
    /// Blank lines keep the current items open. A non-blank line closes every
    /// item whose content column lies right of its indentation.
    fn update(&mut self, line: &str) -> usize {
        if line.trim().is_empty() {
            return self.base();
        }
        let indent = leading_spaces(line);
        while self.0.last().is_some_and(|&column| column > indent) {
            self.0.pop();
        }
        let base = self.base();
        if indent - base <= 3
            && let Some(width) = list_marker_width(&line[indent..])
        {
            self.0.push(indent + width);
        }
        base
    }

    fn base(&self) -> usize {
        self.0.last().copied().unwrap_or(0)
    }
}

/// Width of a bullet or ordered list marker plus the spaces after it.
fn list_marker_width(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    let marker = match bytes.first()? {
        b'-' | b'*' | b'+' => 1,
        b'0'..=b'9' => {
            let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
            if digits > 9 || !matches!(bytes.get(digits), Some(b'.' | b')')) {
                return None;
            }
            digits + 1
        }
        _ => return None,
    };
    let spaces = bytes[marker..].iter().take_while(|&&b| b == b' ').count();
    match (spaces, bytes.len() == marker + spaces) {
        (0, false) => None,
        // An empty item or indented code after the marker: content starts one column in
        (5.., _) | (_, true) => Some(marker + 1),
        _ => Some(marker + spaces),
    }
}

fn leading_spaces(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

/// Split leading blockquote markers (`> `, `>> `) off a line.
fn split_quote_prefix(line: &str) -> (&str, &str) {
    let bytes = line.as_bytes();
    let mut end = 0;
    loop {
        let mut pos = end;
        while pos < bytes.len() && pos - end < 3 && bytes[pos] == b' ' {
            pos += 1;
        }
        if bytes.get(pos) != Some(&b'>') {
            break;
        }
        pos += 1;
        if bytes.get(pos) == Some(&b' ') {
            pos += 1;
        }
        end = pos;
    }
    line.split_at(end)
}

/// A line starting with `::` at most three spaces right of `base`.
fn is_marker_line(line: &str, base: usize) -> bool {
    let indent = leading_spaces(line);
    indent >= base && indent - base <= 3 && line[indent..].starts_with("::")
}

fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_GFM
        | Options::ENABLE_MATH
}

/// An element opened by a start event.
enum Open {
    Paragraph,
    Heading(u8),
    BlockQuote(Option<Severity>),
    CodeBlock(String),
    HtmlBlock,
    List(Option<u64>),
    Item { checked: Option<bool> },
    Table(Vec<Align>),
    TableHead,
    TableRow,
    TableCell,
    Emphasis,
    Strong,
    Strikethrough,
    Link { url: String, title: String },
    Image { url: String, title: String },
    /// Anything else: children are spliced into the parent.
    Transparent,
}

struct Frame {
    open: Open,
    children: Vec<Node>,
}

struct TreeBuilder<'m> {
    markers: &'m [IsolatedMarker],
    root: Vec<Node>,
    stack: Vec<Frame>,
}

fn build_tree(source: &str, markers: &[IsolatedMarker]) -> Document {
    let mut builder = TreeBuilder {
        markers,
        root: Vec::new(),
        stack: Vec::new(),
    };
    for event in Parser::new_ext(source, parser_options()) {
        builder.event(event);
    }
    // Unbalanced events cannot come from pulldown-cmark, but never drop content
    while !builder.stack.is_empty() {
        builder.close();
    }
    Document::new(builder.root)
}

impl TreeBuilder<'_> {
    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(_) => self.close(),
            Event::Text(text) => self.push(Node::Text(text.into_string())),
            Event::Code(code) => self.push(Node::InlineCode(code.into_string())),
            Event::InlineMath(value) => self.push(Node::Math {
                display: false,
                value: value.into_string(),
            }),
            Event::DisplayMath(value) => self.push(Node::Math {
                display: true,
                value: value.into_string(),
            }),
            Event::Html(html) | Event::InlineHtml(html) => self.push_html(&html),
            Event::SoftBreak => self.push(Node::SoftBreak),
            Event::HardBreak => self.push(Node::HardBreak),
            Event::Rule => self.push(Node::Rule),
            Event::TaskListMarker(checked) => self.mark_task(checked),
            Event::FootnoteReference(label) => self.push(Node::Text(format!("[^{}]", &*label))),
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        let open = match tag {
            Tag::Paragraph => Open::Paragraph,
            Tag::Heading { level, .. } => Open::Heading(heading_depth(level)),
            Tag::BlockQuote(kind) => Open::BlockQuote(kind.map(Severity::from)),
            Tag::CodeBlock(CodeBlockKind::Fenced(info)) => Open::CodeBlock(info.into_string()),
            Tag::CodeBlock(CodeBlockKind::Indented) => Open::CodeBlock(String::new()),
            Tag::HtmlBlock => Open::HtmlBlock,
            Tag::List(start) => Open::List(start),
            Tag::Item => Open::Item { checked: None },
            Tag::Table(alignments) => {
                Open::Table(alignments.into_iter().map(Align::from).collect())
            }
            Tag::TableHead => Open::TableHead,
            Tag::TableRow => Open::TableRow,
            Tag::TableCell => Open::TableCell,
            Tag::Emphasis => Open::Emphasis,
            Tag::Strong => Open::Strong,
            Tag::Strikethrough => Open::Strikethrough,
            Tag::Link {
                dest_url, title, ..
            } => Open::Link {
                url: dest_url.into_string(),
                title: title.into_string(),
            },
            Tag::Image {
                dest_url, title, ..
            } => Open::Image {
                url: dest_url.into_string(),
                title: title.into_string(),
            },
            _ => Open::Transparent,
        };
        self.stack.push(Frame {
            open,
            children: Vec::new(),
        });
    }

    fn close(&mut self) {
        let Some(Frame { open, children }) = self.stack.pop() else {
            return;
        };

        let node = match open {
            Open::Paragraph => unwrap_display_math(children),
            Open::Heading(depth) => Node::Heading { depth, children },
            Open::BlockQuote(alert) => Node::BlockQuote { alert, children },
            Open::CodeBlock(info) => {
                let body: String = children.iter().map(Node::text_content).collect();
                Node::CodeBlock(CodeBlockDescriptor::from_fence(&info, &body))
            }
            Open::HtmlBlock => {
                let html: String = children
                    .iter()
                    .map(|child| match child {
                        Node::Html(html) => html.as_str(),
                        _ => "",
                    })
                    .collect();
                self.html_block(html)
            }
            Open::List(start) => Node::List {
                start,
                items: children,
            },
            Open::Item { checked } => Node::ListItem { checked, children },
            Open::Table(alignments) => Node::Table {
                alignments,
                rows: children,
            },
            Open::TableHead => Node::TableRow {
                header: true,
                cells: children,
            },
            Open::TableRow => Node::TableRow {
                header: false,
                cells: children,
            },
            Open::TableCell => Node::TableCell(children),
            Open::Emphasis => Node::Emphasis(children),
            Open::Strong => Node::Strong(children),
            Open::Strikethrough => Node::Strikethrough(children),
            Open::Link { url, title } => Node::Link {
                url,
                title,
                children,
            },
            Open::Image { url, title } => {
                let alt = children.iter().map(Node::text_content).collect();
                Node::Image { url, title, alt }
            }
            Open::Transparent => {
                for child in children {
                    self.push(child);
                }
                return;
            }
        };
        self.push(node);
    }

    fn push(&mut self, node: Node) {
        let target = match self.stack.last_mut() {
            Some(frame) => &mut frame.children,
            None => &mut self.root,
        };
        push_merged(target, node);
    }

    fn push_html(&mut self, html: &str) {
        if let Some(Node::Html(last)) = self
            .stack
            .last_mut()
            .filter(|frame| matches!(frame.open, Open::HtmlBlock))
            .and_then(|frame| frame.children.last_mut())
        {
            last.push_str(html);
            return;
        }
        self.push(Node::Html(html.to_owned()));
    }

    /// Turn a completed HTML block into a marker if it is a placeholder.
    fn html_block(&self, html: String) -> Node {
        let index = html
            .trim()
            .strip_prefix(MARKER_PREFIX)
            .and_then(|rest| rest.strip_suffix(MARKER_SUFFIX))
            .and_then(|n| n.parse::<usize>().ok());
        match index.and_then(|i| self.markers.get(i)) {
            Some(marker) => Node::Marker {
                line: marker.line,
                raw: marker.raw.clone(),
            },
            None => Node::Html(html),
        }
    }

    fn mark_task(&mut self, checked: bool) {
        if let Some(Frame {
            open: Open::Item { checked: slot },
            ..
        }) = self
            .stack
            .iter_mut()
            .rev()
            .find(|frame| matches!(frame.open, Open::Item { .. }))
        {
            *slot = Some(checked);
        }
    }
}

/// A paragraph holding only display math becomes the math block itself.
fn unwrap_display_math(mut children: Vec<Node>) -> Node {
    children.retain(|child| match child {
        Node::Text(text) => !text.trim().is_empty(),
        Node::SoftBreak => false,
        _ => true,
    });
    if let [Node::Math { display: true, .. }] = children.as_slice()
        && let Some(math) = children.pop()
    {
        return math;
    }
    Node::Paragraph(children)
}

fn heading_depth(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
