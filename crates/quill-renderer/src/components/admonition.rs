//! Admonition boxes.
//!
//! ```html
//! <blockquote class="admonition bdm-warning">
//!   <span class="bdm-title">WARNING</span>
//!   <p>Do not do this</p>
//! </blockquote>
//! ```

use crate::directive::DirectiveKind;
use crate::html::{Element, HtmlNode, Placeholder};
use crate::severity::Severity;

/// Render an admonition directive.
///
/// The first label replaces the upper-cased severity as the title. A
/// directive with neither label nor content renders a hidden error note and
/// returns a warning.
pub(crate) fn render_admonition(
    severity: Severity,
    placeholder: Placeholder,
) -> (HtmlNode, Option<String>) {
    let label = placeholder.label().map(str::to_owned);
    let body = match placeholder.kind {
        DirectiveKind::Container => placeholder.children,
        // A leaf's children are its label
        DirectiveKind::Leaf => Vec::new(),
    };

    if label.is_none() && body.is_empty() {
        let message = format!(
            "Invalid admonition directive. (Admonition directives must be of block type \":::{0} <content> :::\")",
            severity.as_str()
        );
        let node = Element::new("div")
            .with_attr("class", "hidden")
            .with_child(HtmlNode::text(message.clone()));
        return (node.into(), Some(message));
    }

    let title = label.unwrap_or_else(|| severity.as_str().to_ascii_uppercase());
    let mut class = format!("admonition bdm-{}", severity.as_str());
    if let Some(extra) = placeholder.attributes.get("class") {
        class.push(' ');
        class.push_str(extra);
    }

    let mut blockquote = Element::new("blockquote").with_attr("class", class);
    if let Some(id) = placeholder.attributes.get("id") {
        blockquote.set_attr("id", id.clone());
    }
    let node = blockquote
        .with_child(
            Element::new("span")
                .with_attr("class", "bdm-title")
                .with_child(HtmlNode::text(title)),
        )
        .with_children(body);
    (node.into(), None)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::html::Fragment;
    use pretty_assertions::assert_eq;

    fn placeholder(kind: DirectiveKind, args: &[&str], children: Vec<HtmlNode>) -> Placeholder {
        Placeholder {
            kind,
            name: "warning".to_owned(),
            args: args.iter().map(|s| (*s).to_owned()).collect(),
            attributes: BTreeMap::new(),
            children,
        }
    }

    fn to_html(node: HtmlNode) -> String {
        Fragment::new(vec![node]).to_html()
    }

    fn para(text: &str) -> HtmlNode {
        Element::new("p").with_child(HtmlNode::text(text)).into()
    }

    #[test]
    fn test_default_title() {
        let (node, warning) = render_admonition(
            Severity::Warning,
            placeholder(DirectiveKind::Container, &[], vec![para("Do not do this")]),
        );
        assert_eq!(warning, None);
        assert_eq!(
            to_html(node),
            r#"<blockquote class="admonition bdm-warning"><span class="bdm-title">WARNING</span><p>Do not do this</p></blockquote>"#
        );
    }

    #[test]
    fn test_label_replaces_title() {
        let (node, _) = render_admonition(
            Severity::Tip,
            placeholder(DirectiveKind::Container, &["Pro tip"], vec![para("x")]),
        );
        assert!(to_html(node).contains(r#"<span class="bdm-title">Pro tip</span>"#));
    }

    #[test]
    fn test_leaf_with_label_has_title_only() {
        let (node, warning) = render_admonition(
            Severity::Note,
            placeholder(DirectiveKind::Leaf, &["Heads up"], vec![HtmlNode::text("Heads up")]),
        );
        assert_eq!(warning, None);
        assert_eq!(
            to_html(node),
            r#"<blockquote class="admonition bdm-note"><span class="bdm-title">Heads up</span></blockquote>"#
        );
    }

    #[test]
    fn test_empty_admonition_is_hidden_error() {
        let (node, warning) =
            render_admonition(Severity::Caution, placeholder(DirectiveKind::Container, &[], vec![]));
        assert!(warning.is_some());
        assert!(to_html(node).starts_with(r#"<div class="hidden">Invalid admonition directive."#));
    }

    #[test]
    fn test_id_and_class_attributes() {
        let mut p = placeholder(DirectiveKind::Container, &[], vec![para("x")]);
        p.attributes.insert("id".to_owned(), "warn-1".to_owned());
        p.attributes.insert("class".to_owned(), "wide".to_owned());
        let (node, _) = render_admonition(Severity::Warning, p);
        assert!(
            to_html(node).starts_with(r#"<blockquote class="admonition bdm-warning wide" id="warn-1">"#)
        );
    }
}
