//! Admonition severity kinds.

use serde::{Deserialize, Serialize};

/// Severity of an admonition callout.
///
/// Matches the GitHub alert vocabulary (`> [!NOTE]`, `> [!TIP]`, ...), which is
/// also the set of container directive names rendered as admonitions by default.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Note,
    Tip,
    Important,
    Warning,
    Caution,
}

impl Severity {
    /// All severities in display order.
    pub const ALL: [Self; 5] = [
        Self::Note,
        Self::Tip,
        Self::Important,
        Self::Warning,
        Self::Caution,
    ];

    /// Lowercase name, used as the directive name and CSS suffix.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Tip => "tip",
            Self::Important => "important",
            Self::Warning => "warning",
            Self::Caution => "caution",
        }
    }

    /// Parse a severity name, ignoring ASCII case.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|severity| severity.as_str().eq_ignore_ascii_case(name))
    }
}

impl From<pulldown_cmark::BlockQuoteKind> for Severity {
    fn from(kind: pulldown_cmark::BlockQuoteKind) -> Self {
        use pulldown_cmark::BlockQuoteKind;
        match kind {
            BlockQuoteKind::Note => Self::Note,
            BlockQuoteKind::Tip => Self::Tip,
            BlockQuoteKind::Important => Self::Important,
            BlockQuoteKind::Warning => Self::Warning,
            BlockQuoteKind::Caution => Self::Caution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_ignores_case() {
        assert_eq!(Severity::from_name("NOTE"), Some(Severity::Note));
        assert_eq!(Severity::from_name("Warning"), Some(Severity::Warning));
        assert_eq!(Severity::from_name("danger"), None);
    }

    #[test]
    fn test_as_str_round_trips() {
        for severity in Severity::ALL {
            assert_eq!(Severity::from_name(severity.as_str()), Some(severity));
        }
    }
}
