//! Fenced code block descriptor.

use std::collections::BTreeMap;

/// Language label used when a fence declares none.
pub const PLAINTEXT: &str = "plaintext";

/// Read-only description of a fenced code block.
///
/// Built once from the fence info string and body; decorators only read it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CodeBlockDescriptor {
    /// Language identifier from the fence (`None` when absent).
    pub language: Option<String>,
    /// Fence metadata after the language (`title="x" showLineNumbers=false`).
    pub meta: BTreeMap<String, String>,
    /// Source lines without trailing newlines.
    pub lines: Vec<String>,
}

impl CodeBlockDescriptor {
    /// Build a descriptor from a fence info string and the block body.
    #[must_use]
    pub fn from_fence(info: &str, body: &str) -> Self {
        let (language, meta) = parse_fence_info(info);
        Self {
            language,
            meta,
            lines: body.lines().map(str::to_owned).collect(),
        }
    }

    /// Declared language, or `plaintext`.
    #[must_use]
    pub fn language_label(&self) -> &str {
        self.language.as_deref().unwrap_or(PLAINTEXT)
    }

    /// Interpret a meta entry as a boolean flag.
    ///
    /// A bare key (`showLineNumbers`) counts as `true`.
    #[must_use]
    pub fn meta_flag(&self, key: &str) -> Option<bool> {
        match self.meta.get(key)?.as_str() {
            "true" | "" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }

    /// Code text with lines joined by newlines.
    #[must_use]
    pub fn source(&self) -> String {
        self.lines.join("\n")
    }
}

/// Parse a fence info string into language and metadata.
///
/// The first token is the language. Remaining tokens are `key=value`,
/// `key="quoted value"`, `key={braced}` or bare flags (stored as `"true"`).
pub(crate) fn parse_fence_info(info: &str) -> (Option<String>, BTreeMap<String, String>) {
    let info = info.trim();
    let (language, rest) = match info.find(char::is_whitespace) {
        Some(end) => (&info[..end], &info[end..]),
        None => (info, ""),
    };

    let mut meta = BTreeMap::new();
    let mut remaining = rest.trim_start();
    while !remaining.is_empty() {
        let key_end = remaining
            .find(|c: char| c == '=' || c.is_whitespace())
            .unwrap_or(remaining.len());
        let key = &remaining[..key_end];
        remaining = &remaining[key_end..];

        if let Some(after_eq) = remaining.strip_prefix('=') {
            let (value, rest) = split_meta_value(after_eq);
            if !key.is_empty() {
                meta.insert(key.to_owned(), value.to_owned());
            }
            remaining = rest;
        } else if !key.is_empty() {
            meta.insert(key.to_owned(), "true".to_owned());
        }
        remaining = remaining.trim_start();
    }

    let language = (!language.is_empty()).then(|| language.to_owned());
    (language, meta)
}

/// Split one meta value off the front of `s`, honoring quotes and braces.
///
/// An unterminated quote or brace takes the rest of the string.
fn split_meta_value(s: &str) -> (&str, &str) {
    let close = match s.chars().next() {
        Some('"') => Some('"'),
        Some('\'') => Some('\''),
        Some('{') => Some('}'),
        _ => None,
    };

    match close {
        Some(close) => {
            let inner = &s[1..];
            match inner.find(close) {
                Some(end) => (&inner[..end], &inner[end + 1..]),
                None => (inner, ""),
            }
        }
        None => {
            let end = s.find(char::is_whitespace).unwrap_or(s.len());
            (&s[..end], &s[end..])
        }
    }
}
