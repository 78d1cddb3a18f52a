//! Document metadata: word count, reading time, excerpt.
//!
//! All functions are pure and total. An empty document has zero words, zero
//! reading time and an empty excerpt. Any other document takes at least one
//! minute to read, even without a single word.

use serde::Serialize;

use crate::tree::{Document, Node};

/// Default reading speed.
pub const DEFAULT_WORDS_PER_MINUTE: u32 = 200;

/// Default excerpt length in characters.
pub const DEFAULT_EXCERPT_BUDGET: usize = 200;

/// Settings for metadata extraction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetadataConfig {
    pub words_per_minute: u32,
    /// Maximum excerpt length in characters.
    pub excerpt_budget: usize,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            words_per_minute: DEFAULT_WORDS_PER_MINUTE,
            excerpt_budget: DEFAULT_EXCERPT_BUDGET,
        }
    }
}

/// Derived per-document facts, returned alongside the rendered HTML.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub reading_time_minutes: u32,
    pub excerpt: String,
    pub word_count: usize,
}

/// Compute all metadata for a document.
#[must_use]
pub fn extract_metadata(doc: &Document, config: &MetadataConfig) -> DocumentMetadata {
    let word_count = count_words(doc);
    let mut minutes = reading_time(word_count, config.words_per_minute);
    if !doc.children.is_empty() {
        minutes = minutes.max(1);
    }
    DocumentMetadata {
        reading_time_minutes: minutes,
        excerpt: extract_excerpt(doc, config.excerpt_budget),
        word_count,
    }
}

/// Count whitespace-delimited tokens in every text leaf.
#[must_use]
pub fn count_words(doc: &Document) -> usize {
    let mut words = 0;
    doc.walk(&mut |node| {
        words += match node {
            Node::Text(text) | Node::InlineCode(text) | Node::Math { value: text, .. } => {
                text.split_whitespace().count()
            }
            Node::CodeBlock(block) => block
                .lines
                .iter()
                .map(|line| line.split_whitespace().count())
                .sum(),
            _ => 0,
        };
    });
    words
}

/// Minutes needed to read `words`, rounded up.
///
/// Zero words take zero minutes; anything else takes at least one.
#[must_use]
pub fn reading_time(words: usize, words_per_minute: u32) -> u32 {
    if words == 0 {
        return 0;
    }
    let per_minute = usize::try_from(words_per_minute.max(1)).unwrap_or(usize::MAX);
    u32::try_from(words.div_ceil(per_minute))
        .unwrap_or(u32::MAX)
        .max(1)
}

/// Collect top-level paragraph text up to `<!-- more -->` or `budget` characters.
///
/// Paragraphs are joined with a single space. Text past the budget is cut
/// at the exact character limit.
#[must_use]
pub fn extract_excerpt(doc: &Document, budget: usize) -> String {
    let mut excerpt = String::new();
    let mut used = 0;

    for node in &doc.children {
        match node {
            Node::Html(html) if is_excerpt_boundary(html) => break,
            Node::Paragraph(_) => {
                let text = node.text_content();
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }

                let separator = usize::from(!excerpt.is_empty());
                if used + separator >= budget {
                    break;
                }
                if separator == 1 {
                    excerpt.push(' ');
                    used += 1;
                }

                let remaining = budget - used;
                let length = text.chars().count();
                if length > remaining {
                    excerpt.extend(text.chars().take(remaining));
                    break;
                }
                excerpt.push_str(text);
                used += length;
            }
            _ => {}
        }
    }

    excerpt
}

/// Whether an HTML node is the `<!-- more -->` boundary (case and spacing insensitive).
fn is_excerpt_boundary(html: &str) -> bool {
    html.trim()
        .strip_prefix("<!--")
        .and_then(|rest| rest.strip_suffix("-->"))
        .is_some_and(|inner| inner.trim().eq_ignore_ascii_case("more"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn para(s: &str) -> Node {
        Node::Paragraph(vec![Node::Text(s.to_owned())])
    }

    fn words(n: usize) -> Document {
        Document::new(vec![para(&vec!["word"; n].join(" "))])
    }

    #[test]
    fn test_empty_document() {
        let meta = extract_metadata(&Document::default(), &MetadataConfig::default());
        assert_eq!(meta, DocumentMetadata::default());
    }

    #[test]
    fn test_reading_time_exact_and_ceiling() {
        assert_eq!(reading_time(400, 200), 2);
        assert_eq!(reading_time(401, 200), 3);
        assert_eq!(reading_time(1, 200), 1);
        assert_eq!(reading_time(0, 200), 0);
    }

    #[test]
    fn test_count_words_across_nodes() {
        let doc = Document::new(vec![
            Node::Heading {
                depth: 1,
                children: vec![Node::Text("Two words".to_owned())],
            },
            Node::Paragraph(vec![
                Node::Text("one ".to_owned()),
                Node::InlineCode("two".to_owned()),
                Node::Strong(vec![Node::Text(" three four".to_owned())]),
            ]),
        ]);
        assert_eq!(count_words(&doc), 6);
    }

    #[test]
    fn test_metadata_for_400_words() {
        let meta = extract_metadata(&words(400), &MetadataConfig::default());
        assert_eq!(meta.word_count, 400);
        assert_eq!(meta.reading_time_minutes, 2);
    }

    #[test]
    fn test_wordless_document_takes_a_minute() {
        let doc = Document::new(vec![Node::Rule]);
        let meta = extract_metadata(&doc, &MetadataConfig::default());
        assert_eq!(meta.word_count, 0);
        assert_eq!(meta.reading_time_minutes, 1);
    }

    #[test]
    fn test_excerpt_joins_paragraphs() {
        let doc = Document::new(vec![
            para("First."),
            Node::Heading {
                depth: 2,
                children: vec![Node::Text("Skipped".to_owned())],
            },
            para("Second."),
        ]);
        assert_eq!(extract_excerpt(&doc, 200), "First. Second.");
    }

    #[test]
    fn test_excerpt_stops_at_more() {
        let doc = Document::new(vec![
            para("Intro."),
            Node::Html("<!--  MORE -->\n".to_owned()),
            para("Hidden."),
        ]);
        assert_eq!(extract_excerpt(&doc, 200), "Intro.");
    }

    #[test]
    fn test_excerpt_hard_budget() {
        let doc = Document::new(vec![para("Hello world, this is long.")]);
        assert_eq!(extract_excerpt(&doc, 11), "Hello world");
        assert_eq!(extract_excerpt(&doc, 0), "");
    }

    #[test]
    fn test_excerpt_budget_counts_chars() {
        let doc = Document::new(vec![para("héllo wörld")]);
        assert_eq!(extract_excerpt(&doc, 7), "héllo w");
    }
}
