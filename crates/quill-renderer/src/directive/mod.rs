//! Directive syntax for `CommonMark`.
//!
//! Directives mark named, attribute-bearing spans for special rendering:
//!
//! - **Inline leaf**: `:name[label]{attrs}` inside flowing text
//! - **Block leaf**: `::name[label]{attrs}` on a line of its own
//! - **Container**: `:::name[label]{attrs}` ... `:::` wrapping block content
//!
//! Two tree passes produce [`Directive`] nodes:
//!
//! 1. [`normalize`] rewrites GitHub-style callouts (`> [!NOTE]`) into container
//!    directives.
//! 2. [`parse_directives`] turns marker lines and inline syntax into directive
//!    nodes. Unknown names are kept; malformed syntax stays literal text.

mod args;
mod normalize;
mod parse;
mod syntax;

use std::collections::BTreeMap;

pub use args::{DirectiveArgs, parse_attributes};
pub use normalize::normalize;
pub use parse::parse_directives;

use crate::tree::Node;

/// Whether a directive wraps block content or stands alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    /// Self-contained directive (`::name` block or `:name` inline).
    Leaf,
    /// Block directive wrapping arbitrary content (`:::name` ... `:::`).
    Container,
}

/// A parsed directive node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Directive {
    pub kind: DirectiveKind,
    /// Bare identifier naming the directive.
    pub name: String,
    /// Bracketed labels in order (`[first][second]`).
    pub args: Vec<String>,
    /// Attributes from braces; `#id` maps to `id`, `.cls` to `class`.
    pub attributes: BTreeMap<String, String>,
    /// Container body, or the label text of a leaf.
    pub children: Vec<Node>,
}

impl Directive {
    /// First bracketed label, if any.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    /// Attribute value by key.
    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// Check if a name is a bare identifier: a letter followed by letters,
/// digits, hyphens or underscores.
pub(crate) fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_name() {
        assert!(is_valid_name("note"));
        assert!(is_valid_name("my-directive"));
        assert!(is_valid_name("directive_2"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("2fa"));
        assert!(!is_valid_name("foo@bar"));
        assert!(!is_valid_name("foo bar"));
    }
}
