//! GitHub repository cards.
//!
//! `::github{repo="owner/name"}` resolves the repository through a
//! [`CardResolver`] and renders a preview card. Resolution is bounded by a
//! timeout; any failure renders a plain link to the repository instead.

use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::directive::DirectiveKind;
use crate::html::{Element, HtmlNode, Placeholder};

/// Default bound on a card lookup.
pub const DEFAULT_CARD_TIMEOUT: Duration = Duration::from_secs(3);

/// A validated `owner/name` repository identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl RepoId {
    /// Parse `owner/name`. Both parts must be non-empty and contain only
    /// ASCII letters, digits, `-`, `_` or `.`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let (owner, name) = s.trim().split_once('/')?;
        let valid = |part: &str| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        };
        (valid(owner) && valid(name)).then(|| Self {
            owner: owner.to_owned(),
            name: name.to_owned(),
        })
    }

    /// Repository page URL.
    #[must_use]
    pub fn html_url(&self) -> String {
        format!("https://github.com/{self}")
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Repository statistics. Every field is optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardStats {
    pub stars: Option<u64>,
    pub forks: Option<u64>,
    pub language: Option<String>,
    pub license: Option<String>,
}

/// Preview data for a card. Every field is optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardPreview {
    pub title: Option<String>,
    pub description: Option<String>,
    pub owner_icon: Option<String>,
    #[serde(default)]
    pub stats: CardStats,
}

/// Why a card could not be resolved.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// The resolver did not answer in time.
    #[error("Card resolution timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    /// The resolver stopped without answering.
    #[error("Card resolver stopped without a result")]
    Disconnected,
    /// The resolver reported an error.
    #[error("{0}")]
    Failed(String),
}

/// Resolves a repository identifier into preview data.
///
/// Implementations may block; callers bound the wait with [`resolve_bounded`].
pub trait CardResolver: Send + Sync {
    /// Fetch preview data for `repo`.
    ///
    /// # Errors
    ///
    /// Returns an error if the preview cannot be produced.
    fn resolve(&self, repo: &RepoId) -> Result<CardPreview, ResolveError>;
}

/// Resolve a card, giving up after `timeout`.
///
/// The lookup runs on its own thread so an unresponsive resolver cannot
/// stall the caller. A lookup that times out is abandoned; its thread exits
/// whenever the resolver returns.
///
/// # Errors
///
/// Returns [`ResolveError::Timeout`] if no answer arrives in time, or the
/// resolver's own error.
pub fn resolve_bounded(
    resolver: &Arc<dyn CardResolver>,
    repo: &RepoId,
    timeout: Duration,
) -> Result<CardPreview, ResolveError> {
    let (tx, rx) = mpsc::channel();
    let resolver = Arc::clone(resolver);
    let target = repo.clone();

    std::thread::Builder::new()
        .name(format!("card-{repo}"))
        .spawn(move || {
            // The receiver is gone after a timeout
            let _ = tx.send(resolver.resolve(&target));
        })
        .map_err(|e| ResolveError::Failed(format!("Failed to start card lookup: {e}")))?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(ResolveError::Timeout(timeout)),
        Err(RecvTimeoutError::Disconnected) => Err(ResolveError::Disconnected),
    }
}

/// A resolver plus the bound on each lookup.
#[derive(Clone)]
pub struct CardSettings {
    pub resolver: Arc<dyn CardResolver>,
    pub timeout: Duration,
}

impl CardSettings {
    #[must_use]
    pub fn new(resolver: Arc<dyn CardResolver>) -> Self {
        Self {
            resolver,
            timeout: DEFAULT_CARD_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Debug for CardSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardSettings")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Render a GitHub card directive.
///
/// Returns the node and a warning for degraded output.
pub(crate) fn render_github_card(
    placeholder: &Placeholder,
    cards: Option<&CardSettings>,
) -> (HtmlNode, Option<String>) {
    if placeholder.kind != DirectiveKind::Leaf {
        return invalid(
            "Invalid directive. (\"github\" directive must be leaf type \"::github{repo=\"owner/repo\"}\")",
        );
    }
    let Some(repo) = placeholder.attr("repo").and_then(RepoId::parse) else {
        return invalid(
            "Invalid repository. (\"repo\" attribute must be in the format \"owner/repo\")",
        );
    };

    let Some(cards) = cards else {
        tracing::debug!(repo = %repo, "Card resolution disabled, rendering link");
        return (fallback_link(&repo), None);
    };

    match resolve_bounded(&cards.resolver, &repo, cards.timeout) {
        Ok(preview) => (render_card(&repo, &preview), None),
        Err(e) => {
            tracing::warn!(repo = %repo, error = %e, "Card resolution failed, rendering link");
            (
                fallback_link(&repo),
                Some(format!("card for {repo} rendered as a link: {e}")),
            )
        }
    }
}

fn invalid(message: &str) -> (HtmlNode, Option<String>) {
    let node = Element::new("div")
        .with_attr("class", "hidden")
        .with_child(HtmlNode::text(message));
    (node.into(), Some(message.to_owned()))
}

/// Plain link used when no preview is available.
#[must_use]
pub fn fallback_link(repo: &RepoId) -> HtmlNode {
    Element::new("a")
        .with_attr("href", repo.html_url())
        .with_child(HtmlNode::text(repo.to_string()))
        .into()
}

/// Render a resolved preview card.
#[must_use]
pub fn render_card(repo: &RepoId, preview: &CardPreview) -> HtmlNode {
    let mut avatar = Element::new("div").with_attr("class", "gc-avatar");
    if let Some(icon) = &preview.owner_icon {
        avatar.set_attr("style", format!("background-image: url({icon})"));
    }

    let titlebar = div("gc-titlebar")
        .with_child(
            div("gc-titlebar-left")
                .with_child(
                    div("gc-owner")
                        .with_child(avatar)
                        .with_child(text_div("gc-user", &repo.owner)),
                )
                .with_child(text_div("gc-divider", "/"))
                .with_child(text_div("gc-repo", &repo.name)),
        )
        .with_child(div("github-logo"));

    let description = preview
        .description
        .as_deref()
        .map(strip_emoji_shortcodes)
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| "Description not set".to_owned());

    let stats = &preview.stats;
    let infobar = div("gc-infobar")
        .with_child(text_div("gc-stars", &format_compact(stats.stars.unwrap_or(0))))
        .with_child(text_div("gc-forks", &format_compact(stats.forks.unwrap_or(0))))
        .with_child(text_div(
            "gc-license",
            stats.license.as_deref().unwrap_or("no-license"),
        ))
        .with_child(
            Element::new("span")
                .with_attr("class", "gc-language")
                .with_child(HtmlNode::text(
                    stats.language.as_deref().unwrap_or("Unknown"),
                )),
        );

    let mut card = Element::new("a")
        .with_attr("class", "card-github no-styling")
        .with_attr("href", repo.html_url())
        .with_attr("target", "_blank")
        .with_attr("repo", repo.to_string());
    if let Some(title) = &preview.title {
        card.set_attr("title", title.clone());
    }
    card.with_child(titlebar)
        .with_child(text_div("gc-description", &description))
        .with_child(infobar)
        .into()
}

fn div(class: &str) -> Element {
    Element::new("div").with_attr("class", class)
}

fn text_div(class: &str, text: &str) -> Element {
    div(class).with_child(HtmlNode::text(text))
}

/// Remove `:shortcode:` emoji markers from a description.
fn strip_emoji_shortcodes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(':') {
        let after = &rest[start + 1..];
        let end = after.find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'));
        match end {
            Some(end) if end > 0 && after[end..].starts_with(':') => {
                out.push_str(&rest[..start]);
                rest = &after[end + 1..];
            }
            _ => {
                out.push_str(&rest[..=start]);
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out.trim().to_owned()
}

/// Format a count compactly: `999`, `1.2K`, `15K`, `3.4M`.
#[must_use]
pub fn format_compact(n: u64) -> String {
    const UNITS: [(u64, &str); 3] = [(1_000_000_000, "B"), (1_000_000, "M"), (1_000, "K")];
    for (scale, suffix) in UNITS {
        if n >= scale {
            // One decimal, rounded half up, trailing `.0` dropped
            let tenths = (u128::from(n) * 10 + u128::from(scale / 2)) / u128::from(scale);
            let (whole, frac) = (tenths / 10, tenths % 10);
            return if frac == 0 {
                format!("{whole}{suffix}")
            } else {
                format!("{whole}.{frac}{suffix}")
            };
        }
    }
    n.to_string()
}
