//! Parse entry points shared by the structural comparer and the renderer.
//!
//! Everything goes through the `scraper`/`html5ever` stack. Full documents
//! (anything that opens with `<html` or a doctype) parse with the document
//! algorithm; everything else parses as a body fragment so that snippet-style
//! output like `<div>..</div>` or `<root>..</root>` keeps its own element as
//! the effective root.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use scraper::{ElementRef, Html};

/// True when the markup looks like a complete HTML document rather than a
/// fragment.
pub(crate) fn looks_like_document(markup: &str) -> bool {
    let head = markup.trim_start();
    starts_with_ignore_case(head, "<html") || starts_with_ignore_case(head, "<!doctype")
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Parses markup with the appropriate algorithm. The parser always recovers,
/// so this cannot fail; recovery details are recorded in [`Html::errors`].
pub(crate) fn parse_markup(markup: &str) -> Html {
    if looks_like_document(markup) {
        Html::parse_document(markup)
    } else {
        Html::parse_fragment(markup)
    }
}

/// Matches an empty-element tag (`<name attrs/>`), with quoted attribute
/// values allowed to contain anything.
static EMPTY_ELEMENT_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<([A-Za-z][A-Za-z0-9:._-]*)((?:[^<>"']|"[^"]*"|'[^']*')*)/>"#)
        .expect("empty-element tag pattern is valid")
});

/// Elements whose self-closing form the HTML parser accepts as-is.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Rewrites `<item/>` as `<item></item>` so the HTML parser gives
/// empty-element tags their XML meaning. On non-void elements the parser
/// would otherwise drop the self-closing flag, record an error for it, and
/// keep the element open, turning following siblings into children.
/// Void elements are left alone.
fn expand_empty_element_tags(markup: &str) -> Cow<'_, str> {
    EMPTY_ELEMENT_TAG.replace_all(markup, |caps: &Captures| {
        let name = &caps[1];
        if VOID_ELEMENTS.contains(&name.to_ascii_lowercase().as_str()) {
            caps[0].to_string()
        } else {
            format!("<{}{}></{}>", name, caps[2].trim_end(), name)
        }
    })
}

/// Parses markup and rejects it when the parser had to repair anything.
/// This is the strict mode backing `MarkupParser::Xml`: input that is not
/// well formed fails instead of being silently fixed up. Empty-element tags
/// are valid XML and are expanded up front so they neither count as repairs
/// nor mis-parent their siblings.
pub(crate) fn parse_markup_strict(markup: &str) -> Result<Html, String> {
    let doc = parse_markup(&expand_empty_element_tags(markup));
    if doc.errors.is_empty() {
        Ok(doc)
    } else {
        Err(doc.errors.join("; "))
    }
}

/// Picks the element queries and comparisons are rooted at.
///
/// For documents that is the `<html>` element. For fragments the parser wraps
/// content in a synthetic container; when the fragment has exactly one
/// top-level element that element is the root, otherwise the container itself
/// is used so multi-rooted or text-only output still has a stable anchor.
pub(crate) fn document_root<'a>(doc: &'a Html, markup: &str) -> ElementRef<'a> {
    let container = doc.root_element();
    if looks_like_document(markup) {
        return container;
    }
    let mut elements = container.children().filter_map(ElementRef::wrap);
    match (elements.next(), elements.next()) {
        (Some(only), None) => only,
        _ => container,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_detection() {
        assert!(looks_like_document("<html><body/></html>"));
        assert!(looks_like_document("  <HTML lang=\"en\">"));
        assert!(looks_like_document("<!DOCTYPE html><html></html>"));
        assert!(!looks_like_document("<div>fragment</div>"));
        assert!(!looks_like_document("plain text"));
    }

    #[test]
    fn fragment_root_is_the_single_top_level_element() {
        let markup = "<root><item>A</item></root>";
        let doc = parse_markup(markup);
        let root = document_root(&doc, markup);
        assert_eq!(root.value().name(), "root");
    }

    #[test]
    fn multi_rooted_fragment_keeps_the_container() {
        let markup = "<p>a</p><p>b</p>";
        let doc = parse_markup(markup);
        let root = document_root(&doc, markup);
        assert_eq!(root.children().filter_map(ElementRef::wrap).count(), 2);
    }

    #[test]
    fn document_root_is_the_html_element() {
        let markup = "<html><body><p>hi</p></body></html>";
        let doc = parse_markup(markup);
        let root = document_root(&doc, markup);
        assert_eq!(root.value().name(), "html");
    }

    #[test]
    fn strict_parse_accepts_well_formed_fragments() {
        assert!(parse_markup_strict("<root><item>A</item></root>").is_ok());
    }

    #[test]
    fn strict_parse_rejects_repaired_markup() {
        // A stray end tag forces the parser to recover.
        assert!(parse_markup_strict("<root></item></root>").is_err());
    }

    #[test]
    fn strict_parse_accepts_empty_element_tags() {
        assert!(parse_markup_strict("<root><item/></root>").is_ok());
        assert!(parse_markup_strict("<root><item a=\"1\" /><item>B</item></root>").is_ok());
        assert!(parse_markup_strict("<div><br/></div>").is_ok());
    }

    #[test]
    fn expanded_empty_elements_keep_their_siblings() {
        let markup = "<root><item/><item>B</item></root>";
        let doc = parse_markup_strict(markup).unwrap();
        let root = document_root(&doc, markup);
        assert_eq!(root.children().filter_map(ElementRef::wrap).count(), 2);
    }

    #[test]
    fn empty_element_expansion_spares_void_elements() {
        assert_eq!(
            expand_empty_element_tags("<x><br/><item/></x>"),
            "<x><br/><item></item></x>"
        );
        assert_eq!(
            expand_empty_element_tags("<item a=\"1\" />"),
            "<item a=\"1\"></item>"
        );
    }
}
