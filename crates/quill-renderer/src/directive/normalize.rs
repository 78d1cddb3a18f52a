//! Callout normalization.
//!
//! Rewrites GitHub-style callouts into container directives so that later
//! stages only see one admonition shape:
//!
//! ```markdown
//! > [!WARNING]
//! > Do not do this
//! ```
//!
//! becomes the same tree as
//!
//! ```markdown
//! :::warning
//! Do not do this
//! :::
//! ```
//!
//! Text after the marker on the first line (`> [!TIP] Pro tip`) becomes the
//! directive label.

use std::collections::BTreeMap;

use super::{Directive, DirectiveKind};
use crate::severity::Severity;
use crate::tree::{Document, Node};

/// Rewrite callout blockquotes into container directives.
///
/// Idempotent: the output contains no callout blockquotes, so a second run
/// changes nothing. Blockquotes without a recognized marker pass through.
#[must_use]
pub fn normalize(doc: Document) -> Document {
    Document::new(normalize_nodes(doc.children))
}

fn normalize_nodes(nodes: Vec<Node>) -> Vec<Node> {
    nodes.into_iter().map(normalize_node).collect()
}

fn normalize_node(node: Node) -> Node {
    match node.map_children(&mut normalize_nodes) {
        Node::BlockQuote {
            alert: Some(severity),
            children,
        } => callout(severity, None, children),
        Node::BlockQuote {
            alert: None,
            children,
        } => match strip_marker(children) {
            Ok((severity, label, children)) => callout(severity, label, children),
            Err(children) => Node::BlockQuote {
                alert: None,
                children,
            },
        },
        other => other,
    }
}

fn callout(severity: Severity, label: Option<String>, children: Vec<Node>) -> Node {
    Node::Directive(Directive {
        kind: DirectiveKind::Container,
        name: severity.as_str().to_owned(),
        args: label.into_iter().collect(),
        attributes: BTreeMap::new(),
        children,
    })
}

/// Remove a textual `[!KIND]` marker from the start of a blockquote.
///
/// Returns the children unchanged when there is no recognized marker.
#[allow(clippy::type_complexity)]
fn strip_marker(
    mut children: Vec<Node>,
) -> Result<(Severity, Option<String>, Vec<Node>), Vec<Node>> {
    let Some(Node::Paragraph(inlines)) = children.first() else {
        return Err(children);
    };
    let Some(Node::Text(first)) = inlines.first() else {
        return Err(children);
    };
    let Some((severity, rest)) = parse_marker_text(first) else {
        return Err(children);
    };
    let rest = rest.to_owned();

    let Node::Paragraph(mut inlines) = children.remove(0) else {
        return Err(children);
    };
    inlines.remove(0);

    // The label is only taken when the whole first line is plain text
    let line_ends_here = matches!(
        inlines.first(),
        None | Some(Node::SoftBreak | Node::HardBreak)
    );
    let label = if line_ends_here {
        if !inlines.is_empty() {
            inlines.remove(0);
        }
        let rest = rest.trim();
        (!rest.is_empty()).then(|| rest.to_owned())
    } else {
        let rest = rest.trim_start();
        if !rest.is_empty() {
            inlines.insert(0, Node::Text(rest.to_owned()));
        }
        None
    };

    if !inlines.is_empty() {
        children.insert(0, Node::Paragraph(inlines));
    }
    Ok((severity, label, children))
}

/// Parse `[!KIND]` at the start of text (case-insensitive).
fn parse_marker_text(text: &str) -> Option<(Severity, &str)> {
    let inner = text.trim_start().strip_prefix("[!")?;
    let end = inner.find(']')?;
    let severity = Severity::from_name(&inner[..end])?;
    Some((severity, &inner[end + 1..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> Node {
        Node::Text(s.to_owned())
    }

    fn quote(children: Vec<Node>) -> Node {
        Node::BlockQuote {
            alert: None,
            children,
        }
    }

    fn directive(node: &Node) -> &Directive {
        match node {
            Node::Directive(d) => d,
            other => panic!("expected directive, got {other:?}"),
        }
    }

    #[test]
    fn test_gfm_alert_becomes_directive() {
        let doc = Document::new(vec![Node::BlockQuote {
            alert: Some(Severity::Warning),
            children: vec![Node::Paragraph(vec![text("Do not do this")])],
        }]);
        let out = normalize(doc);
        let d = directive(&out.children[0]);
        assert_eq!(d.kind, DirectiveKind::Container);
        assert_eq!(d.name, "warning");
        assert_eq!(d.children, vec![Node::Paragraph(vec![text("Do not do this")])]);
    }

    #[test]
    fn test_textual_marker_case_insensitive() {
        let doc = Document::new(vec![quote(vec![Node::Paragraph(vec![
            text("[!note]"),
            Node::SoftBreak,
            text("Body"),
        ])])]);
        let out = normalize(doc);
        let d = directive(&out.children[0]);
        assert_eq!(d.name, "note");
        assert!(d.args.is_empty());
        assert_eq!(d.children, vec![Node::Paragraph(vec![text("Body")])]);
    }

    #[test]
    fn test_textual_marker_with_label() {
        let doc = Document::new(vec![quote(vec![
            Node::Paragraph(vec![text("[!TIP] Pro tip")]),
            Node::Paragraph(vec![text("Body")]),
        ])]);
        let out = normalize(doc);
        let d = directive(&out.children[0]);
        assert_eq!(d.name, "tip");
        assert_eq!(d.args, vec!["Pro tip"]);
        assert_eq!(d.children, vec![Node::Paragraph(vec![text("Body")])]);
    }

    #[test]
    fn test_marker_followed_by_formatting_keeps_content() {
        let doc = Document::new(vec![quote(vec![Node::Paragraph(vec![
            text("[!NOTE] see "),
            Node::Strong(vec![text("this")]),
        ])])]);
        let out = normalize(doc);
        let d = directive(&out.children[0]);
        assert!(d.args.is_empty());
        assert_eq!(
            d.children,
            vec![Node::Paragraph(vec![
                text("see "),
                Node::Strong(vec![text("this")])
            ])]
        );
    }

    #[test]
    fn test_plain_blockquote_passes_through() {
        let doc = Document::new(vec![quote(vec![Node::Paragraph(vec![text(
            "[!UNKNOWN] nope",
        )])])]);
        assert_eq!(normalize(doc.clone()), doc);
    }

    #[test]
    fn test_nested_callouts_are_normalized() {
        let doc = Document::new(vec![Node::ListItem {
            checked: None,
            children: vec![Node::BlockQuote {
                alert: Some(Severity::Tip),
                children: vec![],
            }],
        }]);
        let out = normalize(doc);
        assert_eq!(directive(&out.children[0].children()[0]).name, "tip");
    }

    #[test]
    fn test_idempotent() {
        let doc = Document::new(vec![
            quote(vec![Node::Paragraph(vec![text("[!CAUTION]")])]),
            quote(vec![Node::Paragraph(vec![text("plain")])]),
        ]);
        let once = normalize(doc);
        let twice = normalize(once.clone());
        assert_eq!(once, twice);
    }
}
