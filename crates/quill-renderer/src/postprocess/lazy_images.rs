//! Deferred image loading.

use crate::html::Fragment;

/// Attribute that opts an image out of lazy loading.
pub const NO_LAZY_ATTR: &str = "data-no-lazy";

const LAZY_ATTRS: &str = r#" loading="lazy" decoding="async""#;

/// Add `loading="lazy"` and `decoding="async"` to every `<img>`.
///
/// Images that already declare `loading` or carry `data-no-lazy` are left
/// untouched. Other images missing `alt` get an empty one. `<img>` tags in
/// raw HTML get the same treatment; the markup around them is kept verbatim.
#[must_use]
pub fn lazy_load_images(mut fragment: Fragment) -> Fragment {
    fragment.walk_elements_mut(&mut |element| {
        if element.tag != "img" || element.has_attr("loading") || element.has_attr(NO_LAZY_ATTR) {
            return;
        }
        if !element.has_attr("alt") {
            element.set_attr("alt", "");
        }
        element.set_attr("loading", "lazy");
        element.set_attr("decoding", "async");
    });
    fragment.walk_raw_mut(&mut |html| {
        if let Some(rewritten) = lazy_load_raw_images(html) {
            *html = rewritten;
        }
    });
    fragment
}

/// Rewrite `<img>` tags in raw markup. Returns `None` when nothing changed.
fn lazy_load_raw_images(html: &str) -> Option<String> {
    let mut out = String::with_capacity(html.len() + LAZY_ATTRS.len());
    let mut changed = false;
    let mut rest = html;

    while let Some(start) = rest.find('<') {
        let (before, tail) = rest.split_at(start);
        out.push_str(before);

        if let Some(comment) = tail.strip_prefix("<!--") {
            let len = comment.find("-->").map_or(tail.len(), |end| end + 7);
            out.push_str(&tail[..len]);
            rest = &tail[len..];
            continue;
        }

        let Some(tag) = scan_img_tag(tail) else {
            out.push('<');
            rest = &tail[1..];
            continue;
        };
        let opted_out = tag
            .attrs
            .iter()
            .any(|name| name == "loading" || name == NO_LAZY_ATTR);
        if opted_out {
            out.push_str(&tail[..tag.len]);
        } else {
            out.push_str(tail[..tag.close].trim_end());
            if !tag.attrs.iter().any(|name| name == "alt") {
                out.push_str(r#" alt="""#);
            }
            out.push_str(LAZY_ATTRS);
            out.push_str(&tail[tag.close..tag.len]);
            changed = true;
        }
        rest = &tail[tag.len..];
    }

    out.push_str(rest);
    changed.then_some(out)
}

/// An `<img>` start tag at the beginning of a string.
#[derive(Debug, PartialEq, Eq)]
struct ImgTag {
    /// Lowercased attribute names.
    attrs: Vec<String>,
    /// Offset of the closing `>` or `/>`.
    close: usize,
    /// Length of the whole tag.
    len: usize,
}

fn scan_img_tag(tag: &str) -> Option<ImgTag> {
    let bytes = tag.as_bytes();
    if !bytes.get(1..4)?.eq_ignore_ascii_case(b"img") {
        return None;
    }
    if !matches!(*bytes.get(4)?, b'>' | b'/') && !bytes[4].is_ascii_whitespace() {
        return None;
    }

    let mut attrs = Vec::new();
    let mut pos = 4;
    loop {
        pos += count_while(&bytes[pos..], |b| b.is_ascii_whitespace());
        match *bytes.get(pos)? {
            b'>' => {
                return Some(ImgTag {
                    attrs,
                    close: pos,
                    len: pos + 1,
                });
            }
            b'/' if bytes.get(pos + 1) == Some(&b'>') => {
                return Some(ImgTag {
                    attrs,
                    close: pos,
                    len: pos + 2,
                });
            }
            _ => {}
        }

        let name_len = count_while(&bytes[pos..], |b| {
            !b.is_ascii_whitespace() && !matches!(b, b'=' | b'>' | b'/')
        });
        if name_len == 0 {
            // Stray `/` or `=`
            pos += 1;
            continue;
        }
        attrs.push(tag[pos..pos + name_len].to_ascii_lowercase());
        pos += name_len;

        pos += count_while(&bytes[pos..], |b| b.is_ascii_whitespace());
        if bytes.get(pos) != Some(&b'=') {
            continue;
        }
        pos += 1;
        pos += count_while(&bytes[pos..], |b| b.is_ascii_whitespace());
        match *bytes.get(pos)? {
            quote @ (b'"' | b'\'') => {
                let value_len = bytes[pos + 1..].iter().position(|&b| b == quote)?;
                pos += value_len + 2;
            }
            _ => pos += count_while(&bytes[pos..], |b| !b.is_ascii_whitespace() && b != b'>'),
        }
    }
}

fn count_while(bytes: &[u8], pred: impl Fn(u8) -> bool) -> usize {
    bytes.iter().take_while(|&&b| pred(b)).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::{Element, HtmlNode};
    use pretty_assertions::assert_eq;

    fn render(image: Element) -> String {
        lazy_load_images(Fragment::new(vec![HtmlNode::Element(image)])).to_html()
    }

    #[test]
    fn test_adds_lazy_attributes() {
        let image = Element::new("img")
            .with_attr("src", "a.png")
            .with_attr("alt", "A");
        assert_eq!(
            render(image),
            r#"<img src="a.png" alt="A" loading="lazy" decoding="async">"#
        );
    }

    #[test]
    fn test_missing_alt_gets_empty_alt() {
        let image = Element::new("img").with_attr("src", "a.png");
        assert_eq!(
            render(image),
            r#"<img src="a.png" alt="" loading="lazy" decoding="async">"#
        );
    }

    #[test]
    fn test_explicit_loading_is_untouched() {
        let image = Element::new("img")
            .with_attr("src", "a.png")
            .with_attr("loading", "eager");
        assert_eq!(render(image), r#"<img src="a.png" loading="eager">"#);
    }

    #[test]
    fn test_opt_out_marker_is_untouched() {
        let image = Element::new("img")
            .with_attr("src", "a.png")
            .with_attr(NO_LAZY_ATTR, "");
        assert_eq!(render(image), r#"<img src="a.png" data-no-lazy="">"#);
    }

    fn render_raw(html: &str) -> String {
        lazy_load_images(Fragment::new(vec![HtmlNode::Raw(html.to_owned())])).to_html()
    }

    #[test]
    fn test_raw_image_gets_lazy_attributes() {
        assert_eq!(
            render_raw(r#"<img src="x.png">"#),
            r#"<img src="x.png" alt="" loading="lazy" decoding="async">"#
        );
        assert_eq!(
            render_raw(r#"<p><IMG SRC='a b.png' alt="A" /></p>"#),
            r#"<p><IMG SRC='a b.png' alt="A" loading="lazy" decoding="async"/></p>"#
        );
    }

    #[test]
    fn test_raw_image_opt_outs() {
        let eager = r#"<img src="x.png" loading="eager">"#;
        assert_eq!(render_raw(eager), eager);
        let marked = r#"<img data-no-lazy src="x.png">"#;
        assert_eq!(render_raw(marked), marked);
    }

    #[test]
    fn test_raw_markup_around_images_is_kept() {
        assert_eq!(
            render_raw(r#"<!-- <img src="c"> --><imgx><img src=u>"#),
            r#"<!-- <img src="c"> --><imgx><img src=u alt="" loading="lazy" decoding="async">"#
        );
        // Unterminated tags are not touched
        assert_eq!(render_raw(r#"<img src="x"#), r#"<img src="x"#);
    }

    #[test]
    fn test_scan_img_tag() {
        let tag = scan_img_tag(r#"<img alt="a > b" Loading=eager>rest"#).unwrap();
        assert_eq!(tag.attrs, vec!["alt", "loading"]);
        assert_eq!(tag.len, 31);
        assert_eq!(scan_img_tag("<image>"), None);
    }

    #[test]
    fn test_nested_images() {
        let fragment = Fragment::new(vec![
            Element::new("p")
                .with_child(Element::new("img").with_attr("src", "x"))
                .into(),
        ]);
        assert!(lazy_load_images(fragment).to_html().contains(r#"loading="lazy""#));
    }
}
