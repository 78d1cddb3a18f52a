//! Component rendering for directive placeholders.
//!
//! Every [`Placeholder`] left by lowering is dispatched by name through a
//! [`ComponentRegistry`] to one of a closed set of components. Names the
//! registry does not know resolve to [`Component::Unrecognized`], which
//! renders the directive's children in place without a wrapper.

mod admonition;
mod card;

use std::collections::BTreeMap;

use serde::Deserialize;

pub use card::{
    CardPreview, CardResolver, CardSettings, CardStats, DEFAULT_CARD_TIMEOUT, RepoId,
    ResolveError, fallback_link, format_compact, render_card, resolve_bounded,
};

use crate::html::{Fragment, HtmlNode, Placeholder};
use crate::severity::Severity;

/// Renderer kind a directive name can be registered as.
///
/// Deserializes from `{ admonition = "note" }` or `"github-card"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentKind {
    Admonition(Severity),
    GithubCard,
}

/// Result of looking up a directive name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Component {
    Admonition(Severity),
    GithubCard,
    /// Not registered: children render in place.
    Unrecognized,
}

impl From<ComponentKind> for Component {
    fn from(kind: ComponentKind) -> Self {
        match kind {
            ComponentKind::Admonition(severity) => Self::Admonition(severity),
            ComponentKind::GithubCard => Self::GithubCard,
        }
    }
}

/// Directive name to component table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentRegistry {
    entries: BTreeMap<String, ComponentKind>,
}

impl Default for ComponentRegistry {
    /// The five severities as admonitions plus `github` as a card.
    fn default() -> Self {
        let mut entries: BTreeMap<String, ComponentKind> = Severity::ALL
            .into_iter()
            .map(|severity| {
                (
                    severity.as_str().to_owned(),
                    ComponentKind::Admonition(severity),
                )
            })
            .collect();
        entries.insert("github".to_owned(), ComponentKind::GithubCard);
        Self { entries }
    }
}

impl ComponentRegistry {
    /// Registry with no entries.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Register (or replace) a name.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, kind: ComponentKind) -> Self {
        self.entries.insert(name.into(), kind);
        self
    }

    /// Look up the component for a directive name.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Component {
        self.entries
            .get(name)
            .copied()
            .map_or(Component::Unrecognized, Component::from)
    }
}

impl FromIterator<(String, ComponentKind)> for ComponentRegistry {
    fn from_iter<I: IntoIterator<Item = (String, ComponentKind)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Replace every placeholder in `fragment` with its rendered component.
///
/// Nested placeholders render first. Degradations append to `warnings`;
/// sibling nodes are never touched.
#[must_use]
pub fn render_components(
    fragment: Fragment,
    registry: &ComponentRegistry,
    cards: Option<&CardSettings>,
    warnings: &mut Vec<String>,
) -> Fragment {
    let mut renderer = Renderer {
        registry,
        cards,
        warnings,
    };
    Fragment::new(renderer.render_nodes(fragment.children))
}

struct Renderer<'a> {
    registry: &'a ComponentRegistry,
    cards: Option<&'a CardSettings>,
    warnings: &'a mut Vec<String>,
}

impl Renderer<'_> {
    fn render_nodes(&mut self, nodes: Vec<HtmlNode>) -> Vec<HtmlNode> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            match node {
                HtmlNode::Placeholder(mut placeholder) => {
                    placeholder.children = self.render_nodes(placeholder.children);
                    self.render_placeholder(placeholder, &mut out);
                }
                HtmlNode::Element(mut element) => {
                    element.children = self.render_nodes(element.children);
                    out.push(HtmlNode::Element(element));
                }
                other => out.push(other),
            }
        }
        out
    }

    fn render_placeholder(&mut self, placeholder: Placeholder, out: &mut Vec<HtmlNode>) {
        let (node, warning) = match self.registry.resolve(&placeholder.name) {
            Component::Admonition(severity) => {
                admonition::render_admonition(severity, placeholder)
            }
            Component::GithubCard => card::render_github_card(&placeholder, self.cards),
            Component::Unrecognized => {
                tracing::debug!(name = %placeholder.name, "Unrecognized directive rendered as content");
                self.warnings.push(format!(
                    "unknown directive `{}` rendered as plain content",
                    placeholder.name
                ));
                out.extend(placeholder.children);
                return;
            }
        };
        if let Some(warning) = warning {
            self.warnings.push(warning);
        }
        out.push(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::DirectiveKind;
    use crate::html::Element;
    use pretty_assertions::assert_eq;

    fn placeholder(name: &str, children: Vec<HtmlNode>) -> HtmlNode {
        HtmlNode::Placeholder(Placeholder {
            kind: DirectiveKind::Container,
            name: name.to_owned(),
            args: vec![],
            attributes: BTreeMap::new(),
            children,
        })
    }

    fn para(text: &str) -> HtmlNode {
        Element::new("p").with_child(HtmlNode::text(text)).into()
    }

    #[test]
    fn test_default_registry() {
        let registry = ComponentRegistry::default();
        assert_eq!(registry.resolve("note"), Component::Admonition(Severity::Note));
        assert_eq!(registry.resolve("github"), Component::GithubCard);
        assert_eq!(registry.resolve("foo"), Component::Unrecognized);
    }

    #[test]
    fn test_unrecognized_renders_children_in_place() {
        let mut warnings = Vec::new();
        let fragment = Fragment::new(vec![
            para("before"),
            placeholder("foo", vec![para("bar")]),
            para("after"),
        ]);
        let out = render_components(fragment, &ComponentRegistry::default(), None, &mut warnings);
        assert_eq!(out.to_html(), "<p>before</p><p>bar</p><p>after</p>");
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_nested_components() {
        let mut warnings = Vec::new();
        let fragment = Fragment::new(vec![placeholder(
            "note",
            vec![placeholder("tip", vec![para("x")])],
        )]);
        let out = render_components(fragment, &ComponentRegistry::default(), None, &mut warnings);
        assert_eq!(
            out.to_html(),
            concat!(
                r#"<blockquote class="admonition bdm-note"><span class="bdm-title">NOTE</span>"#,
                r#"<blockquote class="admonition bdm-tip"><span class="bdm-title">TIP</span><p>x</p></blockquote>"#,
                "</blockquote>"
            )
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_custom_registration() {
        let registry = ComponentRegistry::empty()
            .with("danger", ComponentKind::Admonition(Severity::Caution));
        assert_eq!(registry.resolve("danger"), Component::Admonition(Severity::Caution));
        assert_eq!(registry.resolve("note"), Component::Unrecognized);
    }

    #[test]
    fn test_component_kind_deserialize() {
        #[derive(Deserialize)]
        struct Table {
            directives: BTreeMap<String, ComponentKind>,
        }
        let table: Table = serde_json::from_str(
            r#"{"directives": {"note": {"admonition": "note"}, "github": "github-card"}}"#,
        )
        .unwrap();
        assert_eq!(
            table.directives["note"],
            ComponentKind::Admonition(Severity::Note)
        );
        assert_eq!(table.directives["github"], ComponentKind::GithubCard);
    }
}
