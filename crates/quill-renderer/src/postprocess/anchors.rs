//! Heading anchors.
//!
//! Gives every heading an `id` derived from its text and appends a
//! self-link:
//!
//! ```html
//! <h2 id="install">Install<a class="anchor" href="#install"><span class="anchor-icon" data-pagefind-ignore="true">#</span></a></h2>
//! ```

use std::collections::{HashMap, HashSet};

use crate::html::{Element, Fragment, HtmlNode};

/// Slug used for headings without any alphanumeric text.
const EMPTY_SLUG: &str = "heading";

/// Convert text to a URL-safe slug.
///
/// Lowercases, collapses every run of non-alphanumeric characters to a
/// single `-` and trims leading and trailing separators.
///
/// # Example
///
/// ```
/// use quill_renderer::postprocess::slugify;
///
/// assert_eq!(slugify("Hello, World!"), "hello-world");
/// assert_eq!(slugify("  --Intro--  "), "intro");
/// ```
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut pending_separator = false;

    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_separator && !result.is_empty() {
                result.push('-');
            }
            pending_separator = false;
            result.extend(c.to_lowercase());
        } else {
            pending_separator = true;
        }
    }

    result
}

/// Slugs assigned so far in one document.
///
/// Created per pass and dropped with it, so nothing carries over between
/// documents.
#[derive(Debug, Default)]
pub struct AnchorRegistry {
    assigned: HashSet<String>,
    /// Next suffix to try per base slug.
    next_suffix: HashMap<String, usize>,
}

impl AnchorRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a unique slug for heading text.
    ///
    /// The first use of a slug is returned as-is; later uses get `-2`, `-3`,
    /// and so on, skipping any suffix that is already taken.
    pub fn assign(&mut self, text: &str) -> String {
        let mut base = slugify(text);
        if base.is_empty() {
            base = EMPTY_SLUG.to_owned();
        }
        self.claim(base)
    }

    /// Register an explicit id, suffixing it if already taken.
    pub fn claim(&mut self, base: String) -> String {
        if self.assigned.insert(base.clone()) {
            return base;
        }

        let suffix = self.next_suffix.entry(base.clone()).or_insert(2);
        loop {
            let candidate = format!("{base}-{suffix}");
            *suffix += 1;
            if self.assigned.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

/// Assign ids and append anchor links to every heading, in document order.
#[must_use]
pub fn inject_anchors(mut fragment: Fragment) -> Fragment {
    let mut registry = AnchorRegistry::new();
    fragment.walk_elements_mut(&mut |element| {
        if element.heading_depth().is_none() {
            return;
        }
        let slug = match element.attr("id") {
            Some(id) => registry.claim(id.to_owned()),
            None => registry.assign(&element.text_content()),
        };
        element.set_attr("id", slug.clone());
        element.children.push(anchor_link(&slug).into());
    });
    fragment
}

fn anchor_link(slug: &str) -> Element {
    Element::new("a")
        .with_attr("class", "anchor")
        .with_attr("href", format!("#{slug}"))
        .with_child(
            Element::new("span")
                .with_attr("class", "anchor-icon")
                .with_attr("data-pagefind-ignore", "true")
                .with_child(HtmlNode::text("#")),
        )
}

/// Whether an element is an anchor link appended by [`inject_anchors`].
pub(crate) fn is_anchor_link(element: &Element) -> bool {
    element.tag == "a" && element.has_class("anchor")
}
