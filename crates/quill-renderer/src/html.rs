//! Owned HTML tree produced by lowering.
//!
//! Post-processors rewrite this tree; [`Fragment::to_html`] serializes it.
//! Besides plain elements and text, the tree can hold two kinds of pending
//! nodes: [`Placeholder`] for directives awaiting the component renderer and
//! [`HtmlNode::CodeBlock`] for code blocks awaiting decoration.

use std::collections::BTreeMap;

use crate::code::CodeBlockDescriptor;
use crate::directive::DirectiveKind;

/// Elements without closing tags.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// A sequence of top-level HTML nodes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Fragment {
    pub children: Vec<HtmlNode>,
}

impl Fragment {
    #[must_use]
    pub fn new(children: Vec<HtmlNode>) -> Self {
        Self { children }
    }

    /// Serialize to an HTML string.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.write_html(&mut out);
        }
        out
    }

    /// Visit every element depth-first in document order.
    pub fn walk_elements_mut(&mut self, visit: &mut impl FnMut(&mut Element)) {
        for child in &mut self.children {
            child.walk_elements_mut(visit);
        }
    }

    /// Visit every element depth-first in document order.
    pub fn walk_elements<'a>(&'a self, visit: &mut impl FnMut(&'a Element)) {
        for child in &self.children {
            child.walk_elements(visit);
        }
    }

    /// Visit the markup of every [`HtmlNode::Raw`] node in document order.
    pub fn walk_raw_mut(&mut self, visit: &mut impl FnMut(&mut String)) {
        for child in &mut self.children {
            child.walk_raw_mut(visit);
        }
    }
}

/// An HTML node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HtmlNode {
    Element(Element),
    /// Text content, escaped on output.
    Text(String),
    /// Trusted markup, written verbatim.
    Raw(String),
    /// A directive awaiting the component renderer.
    Placeholder(Placeholder),
    /// A fenced code block awaiting the code decorators.
    CodeBlock(CodeBlockDescriptor),
}

impl HtmlNode {
    /// Shorthand for a text node.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Concatenated text of this node and its descendants.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.write_text(&mut out);
        out
    }

    fn write_text(&self, out: &mut String) {
        match self {
            Self::Element(element) => {
                for child in &element.children {
                    child.write_text(out);
                }
            }
            Self::Placeholder(placeholder) => {
                for child in &placeholder.children {
                    child.write_text(out);
                }
            }
            Self::Text(text) => out.push_str(text),
            Self::CodeBlock(block) => out.push_str(&block.source()),
            Self::Raw(_) => {}
        }
    }

    fn walk_elements_mut(&mut self, visit: &mut impl FnMut(&mut Element)) {
        match self {
            Self::Element(element) => {
                visit(element);
                for child in &mut element.children {
                    child.walk_elements_mut(visit);
                }
            }
            Self::Placeholder(placeholder) => {
                for child in &mut placeholder.children {
                    child.walk_elements_mut(visit);
                }
            }
            Self::Text(_) | Self::Raw(_) | Self::CodeBlock(_) => {}
        }
    }

    fn walk_raw_mut(&mut self, visit: &mut impl FnMut(&mut String)) {
        match self {
            Self::Raw(html) => visit(html),
            Self::Element(element) => {
                for child in &mut element.children {
                    child.walk_raw_mut(visit);
                }
            }
            Self::Placeholder(placeholder) => {
                for child in &mut placeholder.children {
                    child.walk_raw_mut(visit);
                }
            }
            Self::Text(_) | Self::CodeBlock(_) => {}
        }
    }

    fn walk_elements<'a>(&'a self, visit: &mut impl FnMut(&'a Element)) {
        match self {
            Self::Element(element) => {
                visit(element);
                for child in &element.children {
                    child.walk_elements(visit);
                }
            }
            Self::Placeholder(placeholder) => {
                for child in &placeholder.children {
                    child.walk_elements(visit);
                }
            }
            Self::Text(_) | Self::Raw(_) | Self::CodeBlock(_) => {}
        }
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Self::Element(element) => element.write_html(out),
            Self::Text(text) => out.push_str(&escape_html(text)),
            Self::Raw(html) => out.push_str(html),
            // Unrendered directives pass their content through
            Self::Placeholder(placeholder) => {
                for child in &placeholder.children {
                    child.write_html(out);
                }
            }
            Self::CodeBlock(block) => write_plain_code(block, out),
        }
    }
}

impl From<Element> for HtmlNode {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

/// An HTML element with ordered attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<HtmlNode>,
}

impl Element {
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: impl Into<HtmlNode>) -> Self {
        self.children.push(child.into());
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = HtmlNode>) -> Self {
        self.children.extend(children);
        self
    }

    /// Attribute value by name.
    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn has_attr(&self, key: &str) -> bool {
        self.attrs.iter().any(|(k, _)| k == key)
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((key, value)),
        }
    }

    /// Whether the `class` attribute contains `class`.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    /// Whether the tag is `h1` through `h6`.
    #[must_use]
    pub fn heading_depth(&self) -> Option<u8> {
        match self.tag.as_str() {
            "h1" => Some(1),
            "h2" => Some(2),
            "h3" => Some(3),
            "h4" => Some(4),
            "h5" => Some(5),
            "h6" => Some(6),
            _ => None,
        }
    }

    /// Concatenated text of the element's descendants.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.write_text(&mut out);
        }
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        for (key, value) in &self.attrs {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape_html(value));
            out.push('"');
        }
        out.push('>');

        if VOID_ELEMENTS.contains(&self.tag.as_str()) {
            return;
        }

        for child in &self.children {
            child.write_html(out);
        }
        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
    }
}

/// A directive left in the HTML tree for the component renderer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placeholder {
    pub kind: DirectiveKind,
    pub name: String,
    pub args: Vec<String>,
    pub attributes: BTreeMap<String, String>,
    /// Lowered directive content.
    pub children: Vec<HtmlNode>,
}

impl Placeholder {
    /// First bracketed label, if any.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

fn write_plain_code(block: &CodeBlockDescriptor, out: &mut String) {
    out.push_str("<pre><code");
    if let Some(lang) = &block.language {
        out.push_str(" class=\"language-");
        out.push_str(&escape_html(lang));
        out.push('"');
    }
    out.push('>');
    out.push_str(&escape_html(&block.source()));
    out.push_str("</code></pre>");
}

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a href=\"x\">'&'</a>"), "&lt;a href=&quot;x&quot;&gt;&#x27;&amp;&#x27;&lt;/a&gt;");
    }

    #[test]
    fn test_serialize_element() {
        let fragment = Fragment::new(vec![
            Element::new("p")
                .with_attr("class", "lead")
                .with_child(HtmlNode::text("a < b"))
                .with_child(Element::new("br"))
                .into(),
        ]);
        assert_eq!(fragment.to_html(), r#"<p class="lead">a &lt; b<br></p>"#);
    }

    #[test]
    fn test_raw_is_verbatim() {
        let fragment = Fragment::new(vec![HtmlNode::Raw("<b>x</b>".to_owned())]);
        assert_eq!(fragment.to_html(), "<b>x</b>");
    }

    #[test]
    fn test_placeholder_serializes_children() {
        let fragment = Fragment::new(vec![HtmlNode::Placeholder(Placeholder {
            kind: DirectiveKind::Container,
            name: "foo".to_owned(),
            args: vec![],
            attributes: BTreeMap::new(),
            children: vec![Element::new("p").with_child(HtmlNode::text("bar")).into()],
        })]);
        assert_eq!(fragment.to_html(), "<p>bar</p>");
    }

    #[test]
    fn test_undecorated_code_block() {
        let fragment = Fragment::new(vec![HtmlNode::CodeBlock(CodeBlockDescriptor::from_fence(
            "rust", "a<b\n",
        ))]);
        assert_eq!(
            fragment.to_html(),
            r#"<pre><code class="language-rust">a&lt;b</code></pre>"#
        );
    }

    #[test]
    fn test_set_attr_replaces_in_place() {
        let mut element = Element::new("img").with_attr("src", "a").with_attr("alt", "");
        element.set_attr("src", "b");
        assert_eq!(
            element.attrs,
            vec![
                ("src".to_owned(), "b".to_owned()),
                ("alt".to_owned(), String::new())
            ]
        );
    }

    #[test]
    fn test_has_class() {
        let element = Element::new("div").with_attr("class", "math-display wide");
        assert!(element.has_class("wide"));
        assert!(!element.has_class("math"));
    }

    #[test]
    fn test_walk_elements_in_order() {
        let mut fragment = Fragment::new(vec![
            Element::new("h1").into(),
            Element::new("section")
                .with_child(Element::new("h2"))
                .into(),
        ]);
        let mut tags = Vec::new();
        fragment.walk_elements_mut(&mut |element| tags.push(element.tag.clone()));
        assert_eq!(tags, vec!["h1", "section", "h2"]);
    }

    #[test]
    fn test_walk_raw_reaches_nested_markup() {
        let mut fragment = Fragment::new(vec![
            HtmlNode::Raw("<b>".to_owned()),
            Element::new("p")
                .with_child(HtmlNode::Raw("<i>".to_owned()))
                .into(),
        ]);
        fragment.walk_raw_mut(&mut |html| html.push('!'));
        assert_eq!(fragment.to_html(), "<b>!<p><i>!</p>");
    }
}
