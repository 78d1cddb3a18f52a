//! Property tests for the pipeline invariants.

use std::collections::HashSet;

use proptest::prelude::*;
use quill_renderer::code::{CodeBlockDescriptor, CodeDecorator, decorate, default_decorators};
use quill_renderer::directive::normalize;
use quill_renderer::markdown::parse_markdown;
use quill_renderer::metadata::{MetadataConfig, count_words, extract_metadata, reading_time};
use quill_renderer::postprocess::AnchorRegistry;
use quill_renderer::sections::{flatten_sections, group_sections};

/// Markdown blocks mixing headings, callouts and plain content.
fn block() -> impl Strategy<Value = String> {
    prop_oneof![
        (1usize..=6, "[a-z]{1,8}").prop_map(|(depth, text)| format!("{} {text}", "#".repeat(depth))),
        "[a-z ]{1,30}",
        (
            prop::sample::select(vec!["NOTE", "tip", "Warning", "IMPORTANT", "caution", "nope"]),
            "[a-z ]{0,10}",
            "[a-z ]{1,20}",
        )
            .prop_map(|(kind, label, body)| format!("> [!{kind}] {label}\n> {body}")),
        "[a-z]{1,10}".prop_map(|body| format!("> {body}")),
        "[a-z]{1,10}".prop_map(|body| format!("- {body}\n- {body}")),
        "[a-z]{1,10}".prop_map(|body| format!("```\n{body}\n```")),
    ]
}

fn markdown() -> impl Strategy<Value = String> {
    prop::collection::vec(block(), 0..12).prop_map(|blocks| blocks.join("\n\n"))
}

fn fence() -> impl Strategy<Value = CodeBlockDescriptor> {
    (
        prop::sample::select(vec!["", "rust", "text", "js title=\"a.js\"", "py showLineNumbers=false"]),
        prop::sample::select(vec!["", " collapse={1-2}", " startLineNumber=5", " copy=false"]),
        prop::collection::vec(
            prop::sample::select(vec!["let x = 1;", "// #region", "// #endregion", ""]),
            1..8,
        ),
    )
        .prop_map(|(info, extra, lines)| {
            CodeBlockDescriptor::from_fence(&format!("{info}{extra}"), &lines.join("\n"))
        })
}

/// The built-in decorators, reordered by `order`.
fn permuted(order: &[usize]) -> Vec<Box<dyn CodeDecorator>> {
    let mut decorators: Vec<Option<Box<dyn CodeDecorator>>> = default_decorators(&[])
        .into_iter()
        .map(Some)
        .collect();
    order
        .iter()
        .map(|&i| decorators[i].take().unwrap())
        .collect()
}

proptest! {
    #[test]
    fn prop_normalize_is_idempotent(source in markdown()) {
        let doc = parse_markdown(&source).unwrap().document;
        let once = normalize(doc);
        let twice = normalize(once.clone());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_reading_time_is_monotonic(
        words in 0usize..10_000,
        extra in 0usize..10_000,
        wpm in 1u32..1_000,
    ) {
        let base = reading_time(words, wpm);
        prop_assert!(base <= reading_time(words + extra, wpm));
        if words > 0 {
            prop_assert!(base >= 1);
        }
    }

    #[test]
    fn prop_reading_time_of_documents(source in markdown()) {
        let doc = parse_markdown(&source).unwrap().document;
        let meta = extract_metadata(&doc, &MetadataConfig::default());
        prop_assert_eq!(meta.word_count, count_words(&doc));
        prop_assert_eq!(meta.reading_time_minutes == 0, doc.children.is_empty());
    }

    #[test]
    fn prop_slugs_are_unique(headings in prop::collection::vec("[a-c ]{0,4}|[a-c]-[2-4]", 1..40)) {
        let mut registry = AnchorRegistry::new();
        let slugs: Vec<String> = headings.iter().map(|h| registry.assign(h)).collect();
        let unique: HashSet<&String> = slugs.iter().collect();
        prop_assert_eq!(unique.len(), slugs.len());
    }

    #[test]
    fn prop_sections_flatten_round_trip(source in markdown()) {
        let doc = parse_markdown(&source).unwrap().document;
        let grouped = group_sections(doc.clone());
        prop_assert_eq!(flatten_sections(grouped), doc);
    }

    #[test]
    fn prop_decorators_commute(
        block in fence(),
        order in Just(vec![0usize, 1, 2, 3, 4]).prop_shuffle(),
    ) {
        let reference = decorate(&default_decorators(&[]), &block);
        let shuffled = decorate(&permuted(&order), &block);
        prop_assert_eq!(reference, shuffled);
    }
}

#[test]
fn test_first_collision_gets_suffix_two() {
    let mut registry = AnchorRegistry::new();
    assert_eq!(registry.assign("Intro"), "intro");
    assert_eq!(registry.assign("Intro"), "intro-2");
}
