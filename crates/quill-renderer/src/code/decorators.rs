//! Built-in code-block decorators.
//!
//! Each decorator reads only the [`CodeBlockDescriptor`] and returns its own
//! [`Decoration`]; none sees another's output.

use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use super::decoration::{Decoration, Widget};
use super::descriptor::CodeBlockDescriptor;
use super::CodeDecorator;

/// Labels the block with its language (`plaintext` when undeclared).
#[derive(Clone, Copy, Debug, Default)]
pub struct LanguageBadge;

impl CodeDecorator for LanguageBadge {
    fn name(&self) -> &'static str {
        "language-badge"
    }

    fn decorate(&self, block: &CodeBlockDescriptor) -> Decoration {
        let label = block.language_label();
        Decoration::new()
            .with_figure_attr("data-language", label)
            .with_widget(
                self.name(),
                Widget::new("span")
                    .with_attr("class", "language-badge")
                    .with_text(label),
            )
    }
}

/// Numbers each line.
///
/// On by default except for exempted languages. Fence meta
/// `showLineNumbers` / `showLineNumbers=false` overrides either way and
/// `startLineNumber=N` shifts the first number.
#[derive(Clone, Debug, Default)]
pub struct LineNumbers {
    exempt: BTreeSet<String>,
}

impl LineNumbers {
    /// Create with languages (compared case-insensitively) that default to off.
    #[must_use]
    pub fn new<I, S>(exempt: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            exempt: exempt
                .into_iter()
                .map(|lang| lang.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    fn enabled(&self, block: &CodeBlockDescriptor) -> bool {
        block.meta_flag("showLineNumbers").unwrap_or_else(|| {
            !self
                .exempt
                .contains(&block.language_label().to_ascii_lowercase())
        })
    }
}

impl CodeDecorator for LineNumbers {
    fn name(&self) -> &'static str {
        "line-numbers"
    }

    fn decorate(&self, block: &CodeBlockDescriptor) -> Decoration {
        if !self.enabled(block) {
            return Decoration::new();
        }

        let start = block
            .meta
            .get("startLineNumber")
            .and_then(|value| value.parse::<usize>().ok())
            .unwrap_or(1);

        let mut decoration = Decoration::new().with_figure_attr("class", "line-numbers");
        if start != 1 {
            decoration = decoration.with_figure_attr("data-line-start", start.to_string());
        }
        for index in 1..=block.lines.len() {
            let number = start.saturating_add(index - 1);
            decoration = decoration.with_line_attr(index, "data-line", number.to_string());
        }
        decoration
    }
}

/// Marks collapsible line ranges.
///
/// Ranges come from fence meta (`collapse={1-3, 8}`) and from `#region` /
/// `#endregion` comment markers inside the block. Marker lines stay in the
/// output and are tagged `data-region-marker`.
#[derive(Clone, Copy, Debug, Default)]
pub struct CollapsibleSections;

impl CodeDecorator for CollapsibleSections {
    fn name(&self) -> &'static str {
        "collapsible-sections"
    }

    fn decorate(&self, block: &CodeBlockDescriptor) -> Decoration {
        let line_count = block.lines.len();
        let mut sections: Vec<RangeInclusive<usize>> = block
            .meta
            .get("collapse")
            .map(|ranges| parse_line_ranges(ranges, line_count))
            .unwrap_or_default();

        let mut decoration = Decoration::new();
        let mut open: Vec<usize> = Vec::new();
        for (i, line) in block.lines.iter().enumerate() {
            let index = i + 1;
            match region_marker(line) {
                Some(RegionMarker::Start) => {
                    open.push(index);
                    decoration = decoration.with_line_attr(index, "data-region-marker", "start");
                }
                Some(RegionMarker::End) => {
                    if let Some(start) = open.pop() {
                        decoration = decoration.with_line_attr(index, "data-region-marker", "end");
                        if start + 1 < index {
                            sections.push(start + 1..=index - 1);
                        }
                    }
                }
                None => {}
            }
        }

        if sections.is_empty() {
            return decoration;
        }

        decoration = decoration.with_figure_attr("class", "has-collapsible");
        for (n, range) in sections.into_iter().enumerate() {
            let section = (n + 1).to_string();
            for index in range {
                decoration = decoration
                    .with_line_attr(index, "class", "collapsible")
                    .with_line_attr(index, "data-section", section.clone());
            }
        }
        decoration
    }
}

/// Adds a copy-to-clipboard button unless the fence says `copy=false`.
#[derive(Clone, Copy, Debug, Default)]
pub struct CopyButton;

impl CodeDecorator for CopyButton {
    fn name(&self) -> &'static str {
        "copy-button"
    }

    fn decorate(&self, block: &CodeBlockDescriptor) -> Decoration {
        if block.meta_flag("copy") == Some(false) {
            return Decoration::new();
        }
        Decoration::new().with_widget(
            self.name(),
            Widget::new("button")
                .with_attr("class", "copy-btn")
                .with_attr("type", "button")
                .with_attr("aria-label", "Copy code"),
        )
    }
}

/// Shows the fence `title="..."` as a caption.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameTitle;

impl CodeDecorator for FrameTitle {
    fn name(&self) -> &'static str {
        "frame-title"
    }

    fn decorate(&self, block: &CodeBlockDescriptor) -> Decoration {
        match block.meta.get("title").filter(|title| !title.is_empty()) {
            Some(title) => Decoration::new()
                .with_figure_attr("class", "has-title")
                .with_widget(
                    self.name(),
                    Widget::new("figcaption")
                        .with_attr("class", "frame-title")
                        .with_text(title.clone()),
                ),
            None => Decoration::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RegionMarker {
    Start,
    End,
}

/// Recognize `#region` / `#endregion` behind a line comment leader.
fn region_marker(line: &str) -> Option<RegionMarker> {
    let mut text = line.trim();
    for leader in ["//", "/*", "<!--", "--", ";", "%"] {
        if let Some(rest) = text.strip_prefix(leader) {
            text = rest.trim_start();
            break;
        }
    }
    let text = text.trim_end_matches("-->").trim_end_matches("*/").trim_end();
    let word = text.strip_prefix('#')?.trim_start();
    let keyword = word.split_whitespace().next()?;
    match keyword {
        "region" => Some(RegionMarker::Start),
        "endregion" => Some(RegionMarker::End),
        _ => None,
    }
}

/// Parse `1-3, 8` into 1-based inclusive ranges clamped to `line_count`.
///
/// Unparseable or empty entries are skipped.
fn parse_line_ranges(ranges: &str, line_count: usize) -> Vec<RangeInclusive<usize>> {
    ranges.split(',')
        .filter_map(|part| {
            let part = part.trim();
            let (start, end) = match part.split_once('-') {
                Some((a, b)) => (a.trim().parse().ok()?, b.trim().parse().ok()?),
                None => {
                    let n = part.parse().ok()?;
                    (n, n)
                }
            };
            let end = usize::min(end, line_count);
            (start >= 1 && start <= end).then_some(start..=end)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::decoration::attr_pairs;
    use pretty_assertions::assert_eq;

    fn block(info: &str, body: &str) -> CodeBlockDescriptor {
        CodeBlockDescriptor::from_fence(info, body)
    }

    fn line_attr(decoration: &Decoration, line: usize, key: &str) -> Option<String> {
        let attrs = decoration.lines.get(&line)?;
        attr_pairs(attrs)
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    #[test]
    fn test_language_badge_fallback() {
        let decoration = LanguageBadge.decorate(&block("", "x"));
        assert_eq!(decoration.widgets["language-badge"].text, "plaintext");

        let decoration = LanguageBadge.decorate(&block("rust", "x"));
        assert_eq!(decoration.widgets["language-badge"].text, "rust");
    }

    #[test]
    fn test_line_numbers_default_on() {
        let decoration = LineNumbers::new(["shellsession"]).decorate(&block("rust", "a\nb"));
        assert_eq!(line_attr(&decoration, 1, "data-line").as_deref(), Some("1"));
        assert_eq!(line_attr(&decoration, 2, "data-line").as_deref(), Some("2"));
    }

    #[test]
    fn test_line_numbers_exempt_language() {
        let decorator = LineNumbers::new(["ShellSession"]);
        assert!(decorator.decorate(&block("shellsession", "$ ls")).is_empty());
        assert!(
            !decorator
                .decorate(&block("shellsession showLineNumbers", "$ ls"))
                .is_empty()
        );
    }

    #[test]
    fn test_line_numbers_meta_override_and_start() {
        let decorator = LineNumbers::new(Vec::<String>::new());
        assert!(
            decorator
                .decorate(&block("rust showLineNumbers=false", "a"))
                .is_empty()
        );

        let decoration = decorator.decorate(&block("rust startLineNumber=10", "a\nb"));
        assert_eq!(line_attr(&decoration, 2, "data-line").as_deref(), Some("11"));
    }

    #[test]
    fn test_line_numbers_huge_start_saturates() {
        let max = usize::MAX.to_string();
        let decoration = LineNumbers::new(Vec::<String>::new())
            .decorate(&block(&format!("rust startLineNumber={max}"), "a\nb"));
        assert_eq!(line_attr(&decoration, 1, "data-line"), Some(max.clone()));
        assert_eq!(line_attr(&decoration, 2, "data-line"), Some(max));
    }

    #[test]
    fn test_collapse_meta_ranges() {
        let decoration = CollapsibleSections.decorate(&block("js collapse={1-2, 4}", "a\nb\nc\nd"));
        assert_eq!(line_attr(&decoration, 1, "class").as_deref(), Some("collapsible"));
        assert_eq!(line_attr(&decoration, 2, "data-section").as_deref(), Some("1"));
        assert_eq!(line_attr(&decoration, 3, "class"), None);
        assert_eq!(line_attr(&decoration, 4, "data-section").as_deref(), Some("2"));
    }

    #[test]
    fn test_collapse_region_comments() {
        let body = "fn main() {\n    // #region setup\n    let a = 1;\n    let b = 2;\n    // #endregion\n}";
        let decoration = CollapsibleSections.decorate(&block("rust", body));
        assert_eq!(
            line_attr(&decoration, 2, "data-region-marker").as_deref(),
            Some("start")
        );
        assert_eq!(line_attr(&decoration, 3, "class").as_deref(), Some("collapsible"));
        assert_eq!(line_attr(&decoration, 4, "class").as_deref(), Some("collapsible"));
        assert_eq!(
            line_attr(&decoration, 5, "data-region-marker").as_deref(),
            Some("end")
        );
        assert_eq!(line_attr(&decoration, 6, "class"), None);
    }

    #[test]
    fn test_unmatched_region_is_ignored() {
        let decoration = CollapsibleSections.decorate(&block("py", "# endregion\nx = 1"));
        assert!(decoration.is_empty());
    }

    #[test]
    fn test_region_marker_forms() {
        assert_eq!(region_marker("#region"), Some(RegionMarker::Start));
        assert_eq!(region_marker("# region imports"), Some(RegionMarker::Start));
        assert_eq!(region_marker("<!-- #endregion -->"), Some(RegionMarker::End));
        assert_eq!(region_marker("/* #region */"), Some(RegionMarker::Start));
        assert_eq!(region_marker("# regional office"), None);
        assert_eq!(region_marker("let region = 1;"), None);
    }

    #[test]
    fn test_parse_line_ranges_clamps_and_skips() {
        assert_eq!(parse_line_ranges("1-3, x, 9, 2-10", 5), vec![1..=3, 2..=5]);
        assert_eq!(parse_line_ranges("0-2", 5), Vec::<RangeInclusive<usize>>::new());
    }

    #[test]
    fn test_copy_button_opt_out() {
        assert!(!CopyButton.decorate(&block("rust", "x")).is_empty());
        assert!(CopyButton.decorate(&block("rust copy=false", "x")).is_empty());
    }

    #[test]
    fn test_frame_title() {
        let decoration = FrameTitle.decorate(&block(r#"rust title="main.rs""#, "x"));
        assert_eq!(decoration.widgets["frame-title"].text, "main.rs");
        assert!(FrameTitle.decorate(&block("rust", "x")).is_empty());
    }

    #[test]
    fn test_decorators_never_touch_lines() {
        let descriptor = block("rust collapse={1-2}", "a\nb\nc");
        let before = descriptor.clone();
        let _ = CollapsibleSections.decorate(&descriptor);
        let _ = LineNumbers::default().decorate(&descriptor);
        assert_eq!(descriptor, before);
    }
}
