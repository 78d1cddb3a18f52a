//! Document outline for table-of-contents consumers.

use serde::Serialize;

use super::anchors::is_anchor_link;
use crate::html::{Element, Fragment, HtmlNode};

/// One heading in the outline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OutlineEntry {
    pub depth: u8,
    pub text: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<OutlineEntry>,
}

/// Collect the outline from the `<section>` structure of `fragment`.
///
/// Each section contributes one entry for its leading heading; nested
/// sections become children. Run after anchors so slugs are assigned.
#[must_use]
pub fn collect_outline(fragment: &Fragment) -> Vec<OutlineEntry> {
    collect(&fragment.children)
}

fn collect(nodes: &[HtmlNode]) -> Vec<OutlineEntry> {
    let mut entries = Vec::new();
    for node in nodes {
        match node {
            HtmlNode::Element(element) if element.tag == "section" => {
                let children = collect(&element.children);
                match leading_heading(element) {
                    Some(heading) => entries.push(OutlineEntry {
                        depth: heading.heading_depth().unwrap_or_default(),
                        text: heading_text(heading),
                        slug: heading.attr("id").unwrap_or_default().to_owned(),
                        children,
                    }),
                    None => entries.extend(children),
                }
            }
            HtmlNode::Element(element) => entries.extend(collect(&element.children)),
            HtmlNode::Placeholder(placeholder) => entries.extend(collect(&placeholder.children)),
            HtmlNode::Text(_) | HtmlNode::Raw(_) | HtmlNode::CodeBlock(_) => {}
        }
    }
    entries
}

fn leading_heading(section: &Element) -> Option<&Element> {
    section.children.iter().find_map(|child| match child {
        HtmlNode::Element(element) if element.heading_depth().is_some() => Some(element),
        _ => None,
    })
}

/// Heading text without the appended anchor link.
fn heading_text(heading: &Element) -> String {
    let mut text = String::new();
    for child in &heading.children {
        match child {
            HtmlNode::Element(element) if is_anchor_link(element) => {}
            other => text.push_str(&other.text_content()),
        }
    }
    text.trim().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postprocess::inject_anchors;
    use pretty_assertions::assert_eq;

    fn section(depth: u8, title: &str, nested: Vec<HtmlNode>) -> HtmlNode {
        Element::new("section")
            .with_child(Element::new(format!("h{depth}")).with_child(HtmlNode::text(title)))
            .with_children(nested)
            .into()
    }

    #[test]
    fn test_nested_outline() {
        let fragment = inject_anchors(Fragment::new(vec![
            section(
                1,
                "Guide",
                vec![section(2, "Install", vec![]), section(2, "Usage", vec![])],
            ),
            section(1, "FAQ", vec![]),
        ]));

        let outline = collect_outline(&fragment);

        assert_eq!(
            outline,
            vec![
                OutlineEntry {
                    depth: 1,
                    text: "Guide".to_owned(),
                    slug: "guide".to_owned(),
                    children: vec![
                        OutlineEntry {
                            depth: 2,
                            text: "Install".to_owned(),
                            slug: "install".to_owned(),
                            children: vec![],
                        },
                        OutlineEntry {
                            depth: 2,
                            text: "Usage".to_owned(),
                            slug: "usage".to_owned(),
                            children: vec![],
                        },
                    ],
                },
                OutlineEntry {
                    depth: 1,
                    text: "FAQ".to_owned(),
                    slug: "faq".to_owned(),
                    children: vec![],
                },
            ]
        );
    }

    #[test]
    fn test_content_outside_sections_is_ignored() {
        let fragment = Fragment::new(vec![
            Element::new("p").with_child(HtmlNode::text("intro")).into(),
        ]);
        assert!(collect_outline(&fragment).is_empty());
    }

    #[test]
    fn test_serializes_without_empty_children() {
        let entry = OutlineEntry {
            depth: 2,
            text: "A".to_owned(),
            slug: "a".to_owned(),
            children: vec![],
        };
        assert_eq!(
            serde_json::to_string(&entry).unwrap(),
            r#"{"depth":2,"text":"A","slug":"a"}"#
        );
    }
}
