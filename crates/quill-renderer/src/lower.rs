//! Markdown tree to HTML tree.
//!
//! Standard `CommonMark` lowering plus three quill-specific shapes:
//! directives become [`Placeholder`]s for the component renderer, code blocks
//! stay [`HtmlNode::CodeBlock`] for the decorators, and sections become
//! `<section>` elements.

use crate::error::PipelineError;
use crate::html::{Element, Fragment, HtmlNode, Placeholder};
use crate::tree::{Align, Document, Node};

const STAGE: &str = "lowering";

/// Lower a document to an HTML fragment.
///
/// # Errors
///
/// Returns [`PipelineError::UnexpectedNode`] if the tree still contains
/// unparsed directive markers.
pub fn lower(doc: Document) -> Result<Fragment, PipelineError> {
    Ok(Fragment::new(lower_nodes(doc.children)?))
}

fn lower_nodes(nodes: Vec<Node>) -> Result<Vec<HtmlNode>, PipelineError> {
    nodes.into_iter().map(lower_node).collect()
}

fn element(tag: &str, children: Vec<Node>) -> Result<HtmlNode, PipelineError> {
    Ok(Element::new(tag).with_children(lower_nodes(children)?).into())
}

fn lower_node(node: Node) -> Result<HtmlNode, PipelineError> {
    match node {
        Node::Text(text) => Ok(HtmlNode::Text(text)),
        Node::InlineCode(code) => Ok(Element::new("code").with_child(HtmlNode::Text(code)).into()),
        Node::Emphasis(children) => element("em", children),
        Node::Strong(children) => element("strong", children),
        Node::Strikethrough(children) => element("del", children),
        Node::Link {
            url,
            title,
            children,
        } => {
            let mut link = Element::new("a").with_attr("href", url);
            if !title.is_empty() {
                link.set_attr("title", title);
            }
            Ok(link.with_children(lower_nodes(children)?).into())
        }
        Node::Image { url, title, alt } => {
            let mut image = Element::new("img").with_attr("src", url);
            if !alt.is_empty() {
                image.set_attr("alt", alt);
            }
            if !title.is_empty() {
                image.set_attr("title", title);
            }
            Ok(image.into())
        }
        Node::SoftBreak => Ok(HtmlNode::text("\n")),
        Node::HardBreak => Ok(Element::new("br").into()),
        Node::Paragraph(children) => element("p", children),
        Node::Heading { depth, children } => element(&format!("h{depth}"), children),
        Node::BlockQuote { children, .. } => element("blockquote", children),
        Node::List { start, items } => {
            let list = match start {
                None => Element::new("ul"),
                Some(1) => Element::new("ol"),
                Some(n) => Element::new("ol").with_attr("start", n.to_string()),
            };
            Ok(list.with_children(lower_nodes(items)?).into())
        }
        Node::ListItem { checked, children } => {
            let mut item = Element::new("li");
            if let Some(checked) = checked {
                let mut checkbox = Element::new("input")
                    .with_attr("type", "checkbox")
                    .with_attr("disabled", "");
                if checked {
                    checkbox.set_attr("checked", "");
                }
                item = item.with_child(checkbox);
            }
            Ok(item.with_children(lower_nodes(children)?).into())
        }
        Node::CodeBlock(block) => Ok(HtmlNode::CodeBlock(block)),
        Node::Table { alignments, rows } => lower_table(&alignments, rows),
        Node::TableRow { cells, .. } => lower_row(&[], cells, false),
        Node::TableCell(children) => element("td", children),
        Node::Html(html) => Ok(HtmlNode::Raw(html)),
        Node::Rule => Ok(Element::new("hr").into()),
        Node::Math {
            display: false,
            value,
        } => Ok(Element::new("span")
            .with_attr("class", "math-inline")
            .with_child(HtmlNode::Text(value))
            .into()),
        Node::Math {
            display: true,
            value,
        } => Ok(Element::new("div")
            .with_attr("class", "math-display")
            .with_child(HtmlNode::Text(value))
            .into()),
        Node::Directive(directive) => Ok(HtmlNode::Placeholder(Placeholder {
            kind: directive.kind,
            name: directive.name,
            args: directive.args,
            attributes: directive.attributes,
            children: lower_nodes(directive.children)?,
        })),
        Node::Section(section) => element("section", section.children),
        node @ Node::Marker { .. } => Err(PipelineError::UnexpectedNode {
            stage: STAGE,
            kind: node.kind(),
        }),
    }
}

fn lower_table(alignments: &[Align], rows: Vec<Node>) -> Result<HtmlNode, PipelineError> {
    let mut head = Element::new("thead");
    let mut body = Element::new("tbody");

    for row in rows {
        match row {
            Node::TableRow { header, cells } => {
                let lowered = lower_row(alignments, cells, header)?;
                if header {
                    head.children.push(lowered);
                } else {
                    body.children.push(lowered);
                }
            }
            other => {
                return Err(PipelineError::UnexpectedNode {
                    stage: STAGE,
                    kind: other.kind(),
                });
            }
        }
    }

    let mut table = Element::new("table");
    if !head.children.is_empty() {
        table.children.push(head.into());
    }
    if !body.children.is_empty() {
        table.children.push(body.into());
    }
    Ok(table.into())
}

fn lower_row(alignments: &[Align], cells: Vec<Node>, header: bool) -> Result<HtmlNode, PipelineError> {
    let tag = if header { "th" } else { "td" };
    let mut row = Element::new("tr");
    for (i, cell) in cells.into_iter().enumerate() {
        let children = match cell {
            Node::TableCell(children) => children,
            other => {
                return Err(PipelineError::UnexpectedNode {
                    stage: STAGE,
                    kind: other.kind(),
                });
            }
        };
        let mut lowered = Element::new(tag);
        let align = match alignments.get(i) {
            Some(Align::Left) => Some("left"),
            Some(Align::Center) => Some("center"),
            Some(Align::Right) => Some("right"),
            Some(Align::None) | None => None,
        };
        if let Some(align) = align {
            lowered.set_attr("style", format!("text-align: {align}"));
        }
        row.children
            .push(lowered.with_children(lower_nodes(children)?).into());
    }
    Ok(row.into())
}
