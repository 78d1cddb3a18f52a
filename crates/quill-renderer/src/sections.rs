//! Section grouping.
//!
//! Wraps each top-level heading and the content it introduces in a
//! [`Section`], nesting sections by heading depth:
//!
//! ```text
//! H1 A, p, H2 B, p, H1 C   =>   Section(H1 A, p, Section(H2 B, p)), Section(H1 C)
//! ```
//!
//! Content before the first heading stays at the root.

use crate::tree::{Document, Node, Section};

/// Group the document's top-level nodes into nested sections.
///
/// Single pass with a stack of open sections: a heading of depth `d` closes
/// every open section of depth `>= d` and opens a new one.
#[must_use]
pub fn group_sections(doc: Document) -> Document {
    let mut root: Vec<Node> = Vec::with_capacity(doc.children.len());
    let mut open: Vec<Section> = Vec::new();

    for node in doc.children {
        if let Node::Heading { depth, .. } = node {
            while open.last().is_some_and(|section| section.depth >= depth) {
                close_section(&mut root, &mut open);
            }
            open.push(Section {
                depth,
                children: vec![node],
            });
        } else {
            match open.last_mut() {
                Some(section) => section.children.push(node),
                None => root.push(node),
            }
        }
    }

    while !open.is_empty() {
        close_section(&mut root, &mut open);
    }

    Document::new(root)
}

fn close_section(root: &mut Vec<Node>, open: &mut Vec<Section>) {
    let Some(section) = open.pop() else {
        return;
    };
    match open.last_mut() {
        Some(parent) => parent.children.push(Node::Section(section)),
        None => root.push(Node::Section(section)),
    }
}

impl Section {
    /// The heading that opened this section.
    #[must_use]
    pub fn heading(&self) -> Option<&Node> {
        self.children.first()
    }

    /// Unwrap this section and its nested sections back into a flat sequence.
    #[must_use]
    pub fn flatten(self) -> Vec<Node> {
        let mut out = Vec::new();
        flatten_into(self.children, &mut out);
        out
    }
}

/// Remove every section wrapper from a document, restoring the linear order.
#[must_use]
pub fn flatten_sections(doc: Document) -> Document {
    let mut out = Vec::with_capacity(doc.children.len());
    flatten_into(doc.children, &mut out);
    Document::new(out)
}

fn flatten_into(nodes: Vec<Node>, out: &mut Vec<Node>) {
    for node in nodes {
        match node {
            Node::Section(section) => flatten_into(section.children, out),
            other => out.push(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn heading(depth: u8, text: &str) -> Node {
        Node::Heading {
            depth,
            children: vec![Node::Text(text.to_owned())],
        }
    }

    fn para(text: &str) -> Node {
        Node::Paragraph(vec![Node::Text(text.to_owned())])
    }

    #[test]
    fn test_content_before_first_heading_stays_at_root() {
        let doc = group_sections(Document::new(vec![para("intro"), heading(2, "A")]));
        assert_eq!(doc.children[0], para("intro"));
        assert!(matches!(doc.children[1], Node::Section(Section { depth: 2, .. })));
    }

    #[test]
    fn test_nesting_mirrors_depth() {
        let doc = group_sections(Document::new(vec![
            heading(1, "A"),
            para("a"),
            heading(2, "B"),
            para("b"),
            heading(3, "C"),
            heading(2, "D"),
            heading(1, "E"),
        ]));

        assert_eq!(doc.children.len(), 2);
        let Node::Section(a) = &doc.children[0] else {
            panic!("expected section");
        };
        assert_eq!(a.children.len(), 4);
        assert_eq!(a.children[1], para("a"));
        let Node::Section(b) = &a.children[2] else {
            panic!("expected nested section");
        };
        assert_eq!(b.depth, 2);
        assert!(matches!(b.children[2], Node::Section(Section { depth: 3, .. })));
        assert!(matches!(a.children[3], Node::Section(Section { depth: 2, .. })));
    }

    #[test]
    fn test_deeper_heading_first_then_shallower() {
        let doc = group_sections(Document::new(vec![heading(3, "x"), heading(1, "y")]));
        assert_eq!(doc.children.len(), 2);
    }

    #[test]
    fn test_flatten_round_trip() {
        let nodes = vec![
            para("intro"),
            heading(2, "A"),
            para("a"),
            heading(1, "B"),
            heading(3, "C"),
            para("c"),
        ];
        let grouped = group_sections(Document::new(nodes.clone()));
        assert_eq!(flatten_sections(grouped).children, nodes);
    }

    #[test]
    fn test_section_heading() {
        let doc = group_sections(Document::new(vec![heading(1, "A")]));
        let Node::Section(section) = &doc.children[0] else {
            panic!("expected section");
        };
        assert_eq!(section.heading(), Some(&heading(1, "A")));
        assert_eq!(section.clone().flatten(), vec![heading(1, "A")]);
    }
}
