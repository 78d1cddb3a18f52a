//! Directive parsing pass.
//!
//! Replaces marker nodes and inline directive syntax with [`Directive`] nodes
//! in one pass over the tree. Each sibling list keeps a stack of open
//! containers; content between an opener and its closer becomes the
//! container's children.

use super::syntax::{MarkerLine, find_inline, parse_marker};
use super::{Directive, DirectiveArgs, DirectiveKind};
use crate::tree::{Document, Node, push_merged};

/// Parse directive syntax in `doc`.
///
/// Malformed syntax stays literal. Each degradation (unclosed container,
/// stray closer, invalid marker, double-encoded callout) appends a message to
/// `warnings`.
#[must_use]
pub fn parse_directives(doc: Document, warnings: &mut Vec<String>) -> Document {
    Document::new(parse_nodes(doc.children, warnings))
}

/// A container whose closing marker has not been seen yet.
struct OpenContainer {
    colons: usize,
    name: String,
    args: DirectiveArgs,
    line: usize,
    raw: String,
    children: Vec<Node>,
}

impl OpenContainer {
    fn into_directive(self) -> Node {
        Node::Directive(Directive {
            kind: DirectiveKind::Container,
            name: self.name,
            args: self.args.labels,
            attributes: self.args.attributes,
            children: self.children,
        })
    }
}

fn parse_nodes(nodes: Vec<Node>, warnings: &mut Vec<String>) -> Vec<Node> {
    let mut root = Vec::with_capacity(nodes.len());
    let mut stack: Vec<OpenContainer> = Vec::new();

    for node in nodes {
        match node {
            Node::Marker { line, raw } => {
                handle_marker(line, raw, &mut root, &mut stack, warnings);
            }
            Node::Text(text) => {
                let target = current(&mut root, &mut stack);
                split_inline(&text, target);
            }
            other => {
                let parsed = parse_node(other, warnings);
                current(&mut root, &mut stack).push(parsed);
            }
        }
    }

    // Unclosed containers: the opener becomes literal text, content stays put
    while let Some(open) = stack.pop() {
        tracing::debug!(line = open.line, name = %open.name, "Unclosed directive container");
        warnings.push(format!(
            "line {}: directive container `{}` is never closed",
            open.line, open.name
        ));
        let target = current(&mut root, &mut stack);
        target.push(literal_paragraph(&open.raw));
        target.extend(open.children);
    }

    root
}

fn handle_marker(
    line: usize,
    raw: String,
    root: &mut Vec<Node>,
    stack: &mut Vec<OpenContainer>,
    warnings: &mut Vec<String>,
) {
    match parse_marker(&raw) {
        Some(MarkerLine::Open { colons, name, args }) => stack.push(OpenContainer {
            colons,
            name,
            args,
            line,
            raw,
            children: Vec::new(),
        }),
        Some(MarkerLine::Close { colons }) => {
            if stack.last().is_some_and(|open| colons >= open.colons) {
                if let Some(open) = stack.pop() {
                    let directive = check_double_encoding(open.into_directive(), warnings);
                    current(root, stack).push(directive);
                }
            } else {
                tracing::debug!(line, "Stray directive closer");
                warnings.push(format!("line {line}: closing `{}` has no open directive", raw.trim()));
                current(root, stack).push(literal_paragraph(&raw));
            }
        }
        Some(MarkerLine::Leaf { name, args }) => {
            let children = leaf_children(&args);
            current(root, stack).push(Node::Directive(Directive {
                kind: DirectiveKind::Leaf,
                name,
                args: args.labels,
                attributes: args.attributes,
                children,
            }));
        }
        None => {
            tracing::debug!(line, "Malformed directive marker");
            warnings.push(format!("line {line}: malformed directive `{}` kept as text", raw.trim()));
            current(root, stack).push(literal_paragraph(&raw));
        }
    }
}

/// Sibling list receiving the next node.
fn current<'a>(root: &'a mut Vec<Node>, stack: &'a mut [OpenContainer]) -> &'a mut Vec<Node> {
    match stack.last_mut() {
        Some(open) => &mut open.children,
        None => root,
    }
}

fn parse_node(node: Node, warnings: &mut Vec<String>) -> Node {
    let node = node.map_children(&mut |children| parse_nodes(children, warnings));
    match node {
        Node::Directive(directive) if directive.kind == DirectiveKind::Container => {
            check_double_encoding(Node::Directive(directive), warnings)
        }
        other => other,
    }
}

/// Flag a container whose only child is a container of the same name.
///
/// This is what a legacy callout wrapping a canonical directive looks like
/// after normalization (`> [!NOTE]` around `:::note`). Both layers are kept.
fn check_double_encoding(node: Node, warnings: &mut Vec<String>) -> Node {
    if let Node::Directive(outer) = &node
        && let [Node::Directive(inner)] = outer.children.as_slice()
        && inner.kind == DirectiveKind::Container
        && inner.name == outer.name
    {
        tracing::debug!(name = %outer.name, "Double-encoded directive");
        warnings.push(format!(
            "directive `{}` is written with both callout and directive syntax",
            outer.name
        ));
    }
    node
}

/// Split inline directives out of a text node.
fn split_inline(text: &str, out: &mut Vec<Node>) {
    let mut remaining = text;
    while let Some(found) = find_inline(remaining) {
        if found.start > 0 {
            push_merged(out, Node::Text(remaining[..found.start].to_owned()));
        }
        let children = leaf_children(&found.args);
        out.push(Node::Directive(Directive {
            kind: DirectiveKind::Leaf,
            name: found.name,
            args: found.args.labels,
            attributes: found.args.attributes,
            children,
        }));
        remaining = &remaining[found.end..];
    }
    if !remaining.is_empty() {
        push_merged(out, Node::Text(remaining.to_owned()));
    }
}

fn leaf_children(args: &DirectiveArgs) -> Vec<Node> {
    args.labels
        .first()
        .filter(|label| !label.is_empty())
        .map(|label| vec![Node::Text(label.clone())])
        .unwrap_or_default()
}

fn literal_paragraph(raw: &str) -> Node {
    Node::Paragraph(vec![Node::Text(raw.trim().to_owned())])
}
