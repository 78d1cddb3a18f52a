//! Presentation metadata contributed by code-block decorators.

use std::collections::{BTreeMap, BTreeSet};

/// Attribute name to value tokens. Tokens are joined with spaces on output.
pub type AttrSet = BTreeMap<String, BTreeSet<String>>;

/// A small element rendered inside the code figure (badge, button, caption).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Widget {
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    pub text: String,
}

impl Widget {
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }
}

/// Annotations for one code block.
///
/// Merging is a set union on every field, so the merged result does not
/// depend on the order decorations are combined in. Decorations never carry
/// line content, only attributes keyed by 1-based line index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Decoration {
    /// Attributes of the `<figure>` wrapper.
    pub figure: AttrSet,
    /// Attributes of individual lines, keyed by 1-based line index.
    pub lines: BTreeMap<usize, AttrSet>,
    /// Widgets keyed by the contributing decorator's name.
    pub widgets: BTreeMap<String, Widget>,
}

impl Decoration {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a token to a figure attribute.
    #[must_use]
    pub fn with_figure_attr(mut self, key: &str, value: impl Into<String>) -> Self {
        insert_token(&mut self.figure, key, value.into());
        self
    }

    /// Add a token to an attribute of line `line` (1-based).
    #[must_use]
    pub fn with_line_attr(mut self, line: usize, key: &str, value: impl Into<String>) -> Self {
        insert_token(self.lines.entry(line).or_default(), key, value.into());
        self
    }

    #[must_use]
    pub fn with_widget(mut self, name: &str, widget: Widget) -> Self {
        self.widgets.insert(name.to_owned(), widget);
        self
    }

    /// Union `other` into `self`.
    pub fn merge(&mut self, other: Self) {
        merge_attrs(&mut self.figure, other.figure);
        for (line, attrs) in other.lines {
            merge_attrs(self.lines.entry(line).or_default(), attrs);
        }
        self.widgets.extend(other.widgets);
    }

    /// Whether nothing was contributed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.figure.is_empty() && self.lines.is_empty() && self.widgets.is_empty()
    }
}

fn insert_token(attrs: &mut AttrSet, key: &str, value: String) {
    attrs.entry(key.to_owned()).or_default().insert(value);
}

fn merge_attrs(into: &mut AttrSet, from: AttrSet) {
    for (key, tokens) in from {
        into.entry(key).or_default().extend(tokens);
    }
}

/// Render an attribute set as ordered `(name, value)` pairs.
#[must_use]
pub fn attr_pairs(attrs: &AttrSet) -> Vec<(String, String)> {
    attrs
        .iter()
        .map(|(key, tokens)| {
            let value = tokens.iter().map(String::as_str).collect::<Vec<_>>().join(" ");
            (key.clone(), value)
        })
        .collect()
}
