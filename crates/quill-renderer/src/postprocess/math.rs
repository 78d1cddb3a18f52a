//! Math typesetting.
//!
//! Lowering leaves formulas in `span.math-inline` / `div.math-display`
//! holders. This pass hands each raw formula to a [`MathTypesetter`] and
//! replaces the holder's content with the result.

use crate::html::{Element, Fragment, HtmlNode, escape_html};

/// Error from a typesetter.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct MathError(pub String);

/// Turns a raw formula into HTML markup.
pub trait MathTypesetter: Send + Sync {
    /// Typeset `formula`. The returned markup is inserted verbatim.
    ///
    /// # Errors
    ///
    /// Returns an error if the formula cannot be typeset.
    fn typeset(&self, formula: &str, display: bool) -> Result<String, MathError>;
}

/// Emits escaped TeX between `\(...\)` or `\[...\]` delimiters for a
/// client-side typesetter.
#[derive(Clone, Copy, Debug, Default)]
pub struct DelimitedTypesetter;

impl MathTypesetter for DelimitedTypesetter {
    fn typeset(&self, formula: &str, display: bool) -> Result<String, MathError> {
        let formula = escape_html(formula.trim());
        Ok(if display {
            format!("\\[{formula}\\]")
        } else {
            format!("\\({formula}\\)")
        })
    }
}

/// Typeset every math holder in `fragment`.
///
/// A failed formula keeps its raw text, gains the `math-error` class and
/// adds a warning.
#[must_use]
pub fn render_math(
    mut fragment: Fragment,
    typesetter: &dyn MathTypesetter,
    warnings: &mut Vec<String>,
) -> Fragment {
    fragment.walk_elements_mut(&mut |element| {
        let display = if element.tag == "span" && element.has_class("math-inline") {
            false
        } else if element.tag == "div" && element.has_class("math-display") {
            true
        } else {
            return;
        };
        typeset_element(element, display, typesetter, warnings);
    });
    fragment
}

fn typeset_element(
    element: &mut Element,
    display: bool,
    typesetter: &dyn MathTypesetter,
    warnings: &mut Vec<String>,
) {
    let formula = element.text_content();
    match typesetter.typeset(&formula, display) {
        Ok(markup) => element.children = vec![HtmlNode::Raw(markup)],
        Err(e) => {
            tracing::debug!(formula = %formula, error = %e, "Math typesetting failed");
            warnings.push(format!("math `{formula}` left as text: {e}"));
            let class = match element.attr("class") {
                Some(class) => format!("{class} math-error"),
                None => "math-error".to_owned(),
            };
            element.set_attr("class", class);
        }
    }
}
