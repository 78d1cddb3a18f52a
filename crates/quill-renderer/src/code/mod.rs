//! Code-block decoration.
//!
//! Fenced code blocks are lowered to [`HtmlNode::CodeBlock`] and decorated as
//! the last pipeline stage. Every [`CodeDecorator`] reads the same
//! [`CodeBlockDescriptor`] and contributes a [`Decoration`]; the decorations
//! are merged and the block is rendered as a `<figure>`:
//!
//! ```html
//! <figure class="code-block line-numbers" data-language="rust">
//!   <button class="copy-btn" ...></button>
//!   <span class="language-badge">rust</span>
//!   <pre><code class="language-rust"><span class="line" data-line="1">...</span></code></pre>
//! </figure>
//! ```

mod decoration;
mod decorators;
mod descriptor;

pub use decoration::{AttrSet, Decoration, Widget, attr_pairs};
pub use decorators::{CollapsibleSections, CopyButton, FrameTitle, LanguageBadge, LineNumbers};
pub use descriptor::{CodeBlockDescriptor, PLAINTEXT};

use crate::html::{Element, Fragment, HtmlNode};

/// Contributes presentation metadata for a code block.
///
/// Implementations see only the descriptor, never another decorator's
/// output, so any set of decorators can be applied in any order.
pub trait CodeDecorator: Send + Sync {
    /// Stable name, used as the widget key.
    fn name(&self) -> &'static str;

    fn decorate(&self, block: &CodeBlockDescriptor) -> Decoration;
}

/// The built-in decorator set.
#[must_use]
pub fn default_decorators(line_numbers_exempt: &[String]) -> Vec<Box<dyn CodeDecorator>> {
    vec![
        Box::new(LanguageBadge),
        Box::new(LineNumbers::new(line_numbers_exempt)),
        Box::new(CollapsibleSections),
        Box::new(CopyButton),
        Box::new(FrameTitle),
    ]
}

/// Merge every decorator's contribution for one block.
#[must_use]
pub fn decorate(decorators: &[Box<dyn CodeDecorator>], block: &CodeBlockDescriptor) -> Decoration {
    let mut merged = Decoration::new();
    for decorator in decorators {
        merged.merge(decorator.decorate(block));
    }
    merged
}

/// Replace every pending code block in `fragment` with its decorated figure.
#[must_use]
pub fn decorate_code_blocks(fragment: Fragment, decorators: &[Box<dyn CodeDecorator>]) -> Fragment {
    Fragment::new(decorate_nodes(fragment.children, decorators))
}

fn decorate_nodes(nodes: Vec<HtmlNode>, decorators: &[Box<dyn CodeDecorator>]) -> Vec<HtmlNode> {
    nodes
        .into_iter()
        .map(|node| match node {
            HtmlNode::CodeBlock(block) => {
                let decoration = decorate(decorators, &block);
                render_figure(&block, &decoration).into()
            }
            HtmlNode::Element(mut element) => {
                element.children = decorate_nodes(element.children, decorators);
                HtmlNode::Element(element)
            }
            HtmlNode::Placeholder(mut placeholder) => {
                placeholder.children = decorate_nodes(placeholder.children, decorators);
                HtmlNode::Placeholder(placeholder)
            }
            other => other,
        })
        .collect()
}

/// Render a code block with its decoration.
#[must_use]
pub fn render_figure(block: &CodeBlockDescriptor, decoration: &Decoration) -> Element {
    let mut figure_attrs = decoration.figure.clone();
    figure_attrs
        .entry("class".to_owned())
        .or_default()
        .insert("code-block".to_owned());

    let mut figure = Element::new("figure");
    figure.attrs = attr_pairs(&figure_attrs);

    for widget in decoration.widgets.values() {
        let mut element = Element::new(widget.tag.clone());
        element.attrs = widget
            .attrs
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if !widget.text.is_empty() {
            element.children.push(HtmlNode::text(widget.text.clone()));
        }
        figure.children.push(element.into());
    }

    let mut code = Element::new("code")
        .with_attr("class", format!("language-{}", block.language_label()));
    for (i, line) in block.lines.iter().enumerate() {
        if i > 0 {
            code.children.push(HtmlNode::text("\n"));
        }
        let mut line_attrs = decoration.lines.get(&(i + 1)).cloned().unwrap_or_default();
        line_attrs
            .entry("class".to_owned())
            .or_default()
            .insert("line".to_owned());
        let mut span = Element::new("span").with_child(HtmlNode::text(line.clone()));
        span.attrs = attr_pairs(&line_attrs);
        code.children.push(span.into());
    }

    figure.with_child(Element::new("pre").with_child(code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_figure_plain() {
        let block = CodeBlockDescriptor::from_fence("rust", "let a = 1;\nlet b = 2;");
        let html = Fragment::new(vec![render_figure(&block, &Decoration::new()).into()]).to_html();
        assert_eq!(
            html,
            r#"<figure class="code-block"><pre><code class="language-rust"><span class="line">let a = 1;</span>
<span class="line">let b = 2;</span></code></pre></figure>"#
        );
    }

    #[test]
    fn test_decorated_figure_keeps_every_line() {
        let block = CodeBlockDescriptor::from_fence("rust collapse={1}", "a\nb\nc");
        let decorators = default_decorators(&[]);
        let fragment = decorate_code_blocks(
            Fragment::new(vec![HtmlNode::CodeBlock(block.clone())]),
            &decorators,
        );
        let text = fragment.children[0].text_content();
        for line in &block.lines {
            assert!(text.contains(line.as_str()));
        }
        let html = fragment.to_html();
        assert!(html.contains(r#"class="code-block has-collapsible line-numbers""#));
        assert!(html.contains(r#"<span class="language-badge">rust</span>"#));
        assert!(html.contains(r#"<span class="collapsible line" data-line="1" data-section="1">a</span>"#));
    }

    #[test]
    fn test_decorate_code_blocks_recurses() {
        let fragment = Fragment::new(vec![
            Element::new("li")
                .with_child(HtmlNode::CodeBlock(CodeBlockDescriptor::from_fence("", "x")))
                .into(),
        ]);
        let decorated = decorate_code_blocks(fragment, &default_decorators(&[]));
        let mut figures = 0;
        decorated.walk_elements(&mut |element| {
            if element.tag == "figure" {
                figures += 1;
            }
        });
        assert_eq!(figures, 1);
    }
}
