//! Directive label and attribute parsing.
//!
//! Parses the `[label]{#id .class key="value"}` part of a directive.

use std::collections::BTreeMap;

/// Labels and attributes following a directive name.
///
/// # Example
///
/// ```
/// use quill_renderer::directive::DirectiveArgs;
///
/// let args = DirectiveArgs::parse(r#"[hello]{#intro .wide lang="en"}"#).unwrap();
/// assert_eq!(args.labels, vec!["hello"]);
/// assert_eq!(args.attributes.get("id").map(String::as_str), Some("intro"));
/// assert_eq!(args.attributes.get("class").map(String::as_str), Some("wide"));
/// assert_eq!(args.attributes.get("lang").map(String::as_str), Some("en"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DirectiveArgs {
    /// Contents of each `[...]` group in order.
    pub labels: Vec<String>,
    /// Attributes from the `{...}` group.
    pub attributes: BTreeMap<String, String>,
}

impl DirectiveArgs {
    /// Parse labels and attributes that make up the whole of `s`.
    ///
    /// Returns `None` if any group is unterminated or anything follows the
    /// attribute group.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let (args, consumed) = Self::parse_prefix(s)?;
        s[consumed..].trim().is_empty().then_some(args)
    }

    /// Parse labels and attributes at the start of `s`.
    ///
    /// Returns the arguments and the number of bytes consumed, or `None` if a
    /// group is malformed.
    pub(crate) fn parse_prefix(s: &str) -> Option<(Self, usize)> {
        let mut args = Self::default();
        let mut pos = 0;

        while s[pos..].starts_with('[') {
            let (label, consumed) = parse_brackets(&s[pos..])?;
            args.labels.push(label.to_owned());
            pos += consumed;
        }

        if s[pos..].starts_with('{') {
            let (inner, consumed) = parse_braces(&s[pos..])?;
            args.attributes = parse_attributes(inner)?;
            pos += consumed;
        }

        Some((args, pos))
    }
}

/// Parse a bracketed label: `[content]`, allowing nested brackets.
///
/// Returns (content, `bytes_consumed`), or `None` if unterminated.
fn parse_brackets(s: &str) -> Option<(&str, usize)> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some((&s[1..i], i + 1));
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse an attribute group: `{...}`, skipping braces inside quotes.
///
/// Returns (content, `bytes_consumed`), or `None` if unterminated.
fn parse_braces(s: &str) -> Option<(&str, usize)> {
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices().skip(1) {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '}') => return Some((&s[1..i], i + 1)),
            (None, _) => {}
        }
    }
    None
}

/// Parse attribute syntax: `#id .class key="value" key='value' key=value flag`.
///
/// Repeated keys keep the last value; classes accumulate space-separated.
/// Returns `None` for an unterminated quote or a missing key.
///
/// # Example
///
/// ```
/// use quill_renderer::directive::parse_attributes;
///
/// let attrs = parse_attributes(r#"repo="owner/name" .wide"#).unwrap();
/// assert_eq!(attrs["repo"], "owner/name");
/// assert!(parse_attributes(r#"repo="unterminated"#).is_none());
/// ```
#[must_use]
pub fn parse_attributes(s: &str) -> Option<BTreeMap<String, String>> {
    let mut attrs = BTreeMap::new();
    let mut remaining = s.trim();

    while !remaining.is_empty() {
        if let Some(rest) = remaining.strip_prefix('#') {
            let end = shorthand_end(rest);
            attrs.insert("id".to_owned(), rest[..end].to_owned());
            remaining = &rest[end..];
        } else if let Some(rest) = remaining.strip_prefix('.') {
            let end = shorthand_end(rest);
            let class = &rest[..end];
            attrs
                .entry("class".to_owned())
                .and_modify(|existing: &mut String| {
                    existing.push(' ');
                    existing.push_str(class);
                })
                .or_insert_with(|| class.to_owned());
            remaining = &rest[end..];
        } else {
            let (key, value, rest) = parse_key_value(remaining)?;
            attrs.insert(key.to_owned(), value.to_owned());
            remaining = rest;
        }
        remaining = remaining.trim_start();
    }

    Some(attrs)
}

/// End of an `#id` or `.class` shorthand.
fn shorthand_end(s: &str) -> usize {
    s.find(|c: char| c.is_whitespace() || c == '.' || c == '#')
        .unwrap_or(s.len())
}

/// Parse one `key=value` pair (or a bare `key`) from the start of `s`.
fn parse_key_value(s: &str) -> Option<(&str, &str, &str)> {
    let key_end = s
        .find(|c: char| c == '=' || c.is_whitespace())
        .unwrap_or(s.len());
    let key = &s[..key_end];
    if key.is_empty() || key.contains(['"', '\'']) {
        return None;
    }

    let Some(after_eq) = s[key_end..].strip_prefix('=') else {
        // Bare key: boolean attribute
        return Some((key, "", &s[key_end..]));
    };

    if let Some(quote) = after_eq.chars().next().filter(|c| *c == '"' || *c == '\'') {
        let quoted = &after_eq[1..];
        let end = quoted.find(quote)?;
        Some((key, &quoted[..end], &quoted[end + 1..]))
    } else {
        let end = after_eq.find(char::is_whitespace).unwrap_or(after_eq.len());
        Some((key, &after_eq[..end], &after_eq[end..]))
    }
}
