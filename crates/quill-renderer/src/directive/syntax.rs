//! Line- and span-level directive syntax.
//!
//! Recognizes marker lines (`:::name`, `:::`, `::name`) and inline leaf
//! directives (`:name[label]{attrs}`) inside text.

use super::args::DirectiveArgs;
use super::is_valid_name;

/// A recognized directive marker line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum MarkerLine {
    /// Container opener: `:::name[label]{attrs}`.
    Open {
        colons: usize,
        name: String,
        args: DirectiveArgs,
    },
    /// Container closer: three or more colons alone.
    Close { colons: usize },
    /// Block leaf: `::name[label]{attrs}`.
    Leaf { name: String, args: DirectiveArgs },
}

/// Parse a marker line. Returns `None` if the line is not valid directive syntax.
pub(crate) fn parse_marker(line: &str) -> Option<MarkerLine> {
    let trimmed = line.trim();
    let colons = trimmed.chars().take_while(|&c| c == ':').count();
    if colons < 2 {
        return None;
    }

    let after = &trimmed[colons..];
    if colons >= 3 && after.trim().is_empty() {
        return Some(MarkerLine::Close { colons });
    }

    // Containers allow a space before the name (`::: note`)
    let after = if colons >= 3 { after.trim_start() } else { after };
    let (name, args, consumed) = parse_invocation(after)?;
    if !after[consumed..].trim().is_empty() {
        return None;
    }

    Some(if colons == 2 {
        MarkerLine::Leaf { name, args }
    } else {
        MarkerLine::Open { colons, name, args }
    })
}

/// Parse `name[label]{attrs}` at the start of `s`.
///
/// Returns the name, arguments and bytes consumed.
fn parse_invocation(s: &str) -> Option<(String, DirectiveArgs, usize)> {
    let name_end = s
        .find(|c: char| c == '[' || c == '{' || c.is_whitespace())
        .unwrap_or(s.len());
    let name = &s[..name_end];
    if !is_valid_name(name) {
        return None;
    }

    let (args, consumed) = DirectiveArgs::parse_prefix(&s[name_end..])?;
    Some((name.to_owned(), args, name_end + consumed))
}

/// An inline leaf directive found in text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct InlineMatch {
    /// Byte offset of the leading colon.
    pub start: usize,
    /// Byte offset just past the directive.
    pub end: usize,
    pub name: String,
    pub args: DirectiveArgs,
}

/// Find the first well-formed inline directive in `text`.
///
/// A candidate needs a single colon not preceded by an alphanumeric
/// character, a valid name, and at least one `[...]` or `{...}` group.
/// Malformed candidates are skipped and stay literal.
pub(crate) fn find_inline(text: &str) -> Option<InlineMatch> {
    let bytes = text.as_bytes();
    for (start, _) in text.match_indices(':') {
        let prev = text[..start].chars().next_back();
        if prev.is_some_and(|c| c.is_alphanumeric() || c == ':') {
            continue;
        }
        if bytes.get(start + 1) == Some(&b':') {
            continue;
        }

        let rest = &text[start + 1..];
        let Some((name, args, consumed)) = parse_invocation(rest) else {
            continue;
        };
        let has_group = rest[name.len()..].starts_with(['[', '{']);
        if !has_group {
            continue;
        }

        return Some(InlineMatch {
            start,
            end: start + 1 + consumed,
            name,
            args,
        });
    }
    None
}
