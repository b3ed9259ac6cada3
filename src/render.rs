//! View rendering and subtree extraction.
//!
//! [`render`] invokes a view's rendering capability, parses the markup it
//! produced, selects elements with a path query, and hands back a
//! pretty-printed serialization of the matches for tests to compare
//! against.

use scraper::{ElementRef, Node};
use thiserror::Error;

use crate::parse;
use crate::query::{PathQuery, QueryError};

const XHTML_NS: &str = "http://www.w3.org/1999/xhtml";

/// Something that can produce markup on demand.
///
/// Views implement this directly; closures get it for free, so test doubles
/// can be written inline:
///
/// ```ignore
/// use markup_doctest_rs::render;
///
/// let view = || "<root><item>A</item></root>".to_string();
/// let output = render(&view, "//item").unwrap();
/// assert_eq!(output, "<item>A</item>\n");
/// ```
pub trait Renderable {
    fn render(&self) -> String;
}

impl<F> Renderable for F
where
    F: Fn() -> String,
{
    fn render(&self) -> String {
        self()
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    /// The path query selected zero elements.
    #[error("No elements matched by {query:?}")]
    NoMatch { query: String },
    #[error(transparent)]
    Query(#[from] QueryError),
}

/// Renders `view` and returns the pretty-printed serialization of every
/// element matched by `query`, concatenated in document order.
///
/// Pass `"."` to serialize the whole rendered tree. Empty view output is
/// returned as-is without parsing. Matching zero elements is an error so a
/// mistyped query fails loudly instead of producing an empty expectation.
pub fn render<V>(view: &V, query: &str) -> Result<String, RenderError>
where
    V: Renderable + ?Sized,
{
    let markup = view.render();
    if markup.is_empty() {
        return Ok(markup);
    }

    let path = PathQuery::parse(query)?;
    let doc = parse::parse_markup(&markup);
    let root = parse::document_root(&doc, &markup);

    let matched = path.select(root);
    if matched.is_empty() {
        return Err(RenderError::NoMatch {
            query: query.to_string(),
        });
    }

    let mut output = String::new();
    for element in matched {
        output.push_str(&serialize_pretty(element));
    }

    // Blank lines add nothing to an expectation, and self-closing tags read
    // better with a space before the end-of-tag marker.
    let output = output.replace("\n\n", "\n");
    let output = output.replace("\"/>", "\" />");

    Ok(output)
}

/// Serializes an element subtree with two-space indentation. Elements whose
/// children are all text stay on one line; mixed content is emitted verbatim
/// so meaningful whitespace survives.
pub(crate) fn serialize_pretty(element: ElementRef) -> String {
    let mut out = String::new();
    write_block(&mut out, element, 0);
    out
}

fn write_block(out: &mut String, element: ElementRef, depth: usize) {
    let pad = "  ".repeat(depth);
    let name = element.value().name();
    let attrs = attribute_list(element);

    let mut has_elements = false;
    let mut has_text = false;
    let mut has_comments = false;
    for child in element.children() {
        match child.value() {
            Node::Element(_) => has_elements = true,
            Node::Text(text) if !text.trim().is_empty() => has_text = true,
            Node::Comment(_) => has_comments = true,
            _ => {}
        }
    }

    if !has_elements && !has_text && !has_comments {
        out.push_str(&format!("{pad}<{name}{attrs}/>\n"));
        return;
    }

    if has_text && has_elements {
        // Mixed content: indenting would move whitespace around.
        out.push_str(&pad);
        write_inline(out, element);
        out.push('\n');
        return;
    }

    if has_text {
        out.push_str(&format!("{pad}<{name}{attrs}>"));
        for child in element.children() {
            if let Node::Text(text) = child.value() {
                out.push_str(&escape_text(text));
            }
        }
        out.push_str(&format!("</{name}>\n"));
        return;
    }

    out.push_str(&format!("{pad}<{name}{attrs}>\n"));
    for child in element.children() {
        match child.value() {
            Node::Comment(comment) => {
                let inner = "  ".repeat(depth + 1);
                out.push_str(&format!("{inner}<!--{}-->\n", comment.trim()));
            }
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    write_block(out, child_el, depth + 1);
                }
            }
            _ => {}
        }
    }
    out.push_str(&format!("{pad}</{name}>\n"));
}

fn write_inline(out: &mut String, element: ElementRef) {
    let name = element.value().name();
    let attrs = attribute_list(element);

    if element.children().next().is_none() {
        out.push_str(&format!("<{name}{attrs}/>"));
        return;
    }

    out.push_str(&format!("<{name}{attrs}>"));
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&escape_text(text)),
            Node::Comment(comment) => out.push_str(&format!("<!--{}-->", &**comment)),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    write_inline(out, child_el);
                }
            }
            _ => {}
        }
    }
    out.push_str(&format!("</{name}>"));
}

fn attribute_list(element: ElementRef) -> String {
    let mut out = String::new();
    for (name, value) in element.value().attrs() {
        // The default-namespace declaration is an artifact of XHTML input,
        // not something expectations should have to repeat.
        if name == "xmlns" && value == XHTML_NS {
            continue;
        }
        out.push_str(&format!(" {name}=\"{}\"", escape_attr(value)));
    }
    out
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}
