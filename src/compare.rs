//! Structural markup comparison.
//!
//! This is the tree-diff engine behind [`MarkupOutputChecker`]: both strings
//! are parsed into element trees and walked together, so attribute order,
//! inter-element whitespace, and self-closing tag style stop mattering.
//! Doctest conventions carry over into the tree walk: text nodes and
//! attribute values in the expected tree may use `...` wildcards, and runs of
//! whitespace compare as single spaces.
//!
//! [`MarkupOutputChecker`]: crate::MarkupOutputChecker

use std::collections::{HashMap, HashSet};

use ego_tree::NodeRef;
use scraper::{ElementRef, Node};
use thiserror::Error;

use crate::parse;
use crate::text::text_matches;

#[derive(Debug, Error)]
pub enum MarkupCompareError {
    #[error("Tag name mismatch. Expected: {expected}, Actual: {actual}")]
    TagMismatch { expected: String, actual: String },
    #[error("Attribute mismatch on <{tag}>. {detail}")]
    AttributeMismatch { tag: String, detail: String },
    #[error("Text content mismatch at position {position}. Expected: '{expected}', Actual: '{actual}'")]
    TextMismatch {
        position: usize,
        expected: String,
        actual: String,
    },
    #[error("Comment mismatch at position {position}. Expected: '{expected}', Actual: '{actual}'")]
    CommentMismatch {
        position: usize,
        expected: String,
        actual: String,
    },
    #[error("Child count mismatch under <{tag}>. Expected: {expected}, Actual: {actual}")]
    ChildCountMismatch {
        tag: String,
        expected: usize,
        actual: usize,
    },
    #[error("Node type mismatch at position {position}. Expected type: {expected:?}, Actual type: {actual:?}")]
    NodeTypeMismatch {
        position: usize,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("Markup is not well-formed: {0}")]
    Malformed(String),
}

/// Which parser the comparison runs through.
///
/// `Html` is the tolerant default: broken markup is repaired the way a
/// browser would repair it. `Xml` refuses input the parser had to fix up,
/// standing in for a strict well-formedness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupParser {
    Html,
    Xml,
}

/// Configuration for structural comparison.
#[derive(Debug, Clone)]
pub struct MarkupCompareOptions {
    /// Drop comment nodes before comparing (on by default).
    pub ignore_comments: bool,
    /// Attribute names excluded from comparison on every element.
    pub ignored_attributes: HashSet<String>,
}

impl Default for MarkupCompareOptions {
    fn default() -> Self {
        Self {
            ignore_comments: true,
            ignored_attributes: HashSet::new(),
        }
    }
}

fn node_type_name(node: &Node) -> &'static str {
    match node {
        Node::Text(_) => "Text",
        Node::Element(_) => "Element",
        Node::Comment(_) => "Comment",
        Node::ProcessingInstruction(_) => "ProcessingInstruction",
        Node::Doctype(_) => "Doctype",
        Node::Document => "Document",
        Node::Fragment => "Fragment",
    }
}

/// Compares two markup strings structurally.
#[derive(Debug, Default)]
pub struct MarkupComparer {
    options: MarkupCompareOptions,
}

impl MarkupComparer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: MarkupCompareOptions) -> Self {
        Self { options }
    }

    /// Parses both strings with the selected parser and walks the trees.
    /// `Ok(())` means the actual output satisfies the expected output.
    pub fn compare(
        &self,
        expected: &str,
        actual: &str,
        parser: MarkupParser,
    ) -> Result<(), MarkupCompareError> {
        let (expected_doc, actual_doc) = match parser {
            MarkupParser::Html => (parse::parse_markup(expected), parse::parse_markup(actual)),
            MarkupParser::Xml => (
                parse::parse_markup_strict(expected).map_err(MarkupCompareError::Malformed)?,
                parse::parse_markup_strict(actual).map_err(MarkupCompareError::Malformed)?,
            ),
        };

        let expected_root = parse::document_root(&expected_doc, expected);
        let actual_root = parse::document_root(&actual_doc, actual);

        self.compare_elements(expected_root, actual_root)
    }

    fn compare_elements(
        &self,
        expected: ElementRef,
        actual: ElementRef,
    ) -> Result<(), MarkupCompareError> {
        if expected.value().name() != actual.value().name() {
            return Err(MarkupCompareError::TagMismatch {
                expected: expected.value().name().to_string(),
                actual: actual.value().name().to_string(),
            });
        }

        self.compare_attributes(expected, actual)?;

        let expected_children: Vec<_> = expected
            .children()
            .filter(|n| self.should_include_node(n))
            .collect();
        let actual_children: Vec<_> = actual
            .children()
            .filter(|n| self.should_include_node(n))
            .collect();

        if expected_children.len() != actual_children.len() {
            return Err(MarkupCompareError::ChildCountMismatch {
                tag: expected.value().name().to_string(),
                expected: expected_children.len(),
                actual: actual_children.len(),
            });
        }

        for (position, (expected_child, actual_child)) in expected_children
            .iter()
            .zip(actual_children.iter())
            .enumerate()
        {
            match (expected_child.value(), actual_child.value()) {
                (Node::Text(expected_text), Node::Text(actual_text)) => {
                    // The expected side may carry ellipsis wildcards.
                    if !text_matches(expected_text, actual_text) {
                        return Err(MarkupCompareError::TextMismatch {
                            position,
                            expected: expected_text.trim().to_string(),
                            actual: actual_text.trim().to_string(),
                        });
                    }
                }
                (Node::Comment(expected_comment), Node::Comment(actual_comment)) => {
                    if expected_comment.trim() != actual_comment.trim() {
                        return Err(MarkupCompareError::CommentMismatch {
                            position,
                            expected: expected_comment.trim().to_string(),
                            actual: actual_comment.trim().to_string(),
                        });
                    }
                }
                (Node::Element(_), Node::Element(_)) => {
                    if let (Some(expected_el), Some(actual_el)) = (
                        ElementRef::wrap(*expected_child),
                        ElementRef::wrap(*actual_child),
                    ) {
                        self.compare_elements(expected_el, actual_el)?;
                    }
                }
                (expected, actual) => {
                    return Err(MarkupCompareError::NodeTypeMismatch {
                        position,
                        expected: node_type_name(expected),
                        actual: node_type_name(actual),
                    });
                }
            }
        }

        Ok(())
    }

    fn compare_attributes(
        &self,
        expected: ElementRef,
        actual: ElementRef,
    ) -> Result<(), MarkupCompareError> {
        let tag = expected.value().name().to_string();
        let ignored = &self.options.ignored_attributes;

        let expected_attrs: Vec<(&str, &str)> = expected
            .value()
            .attrs()
            .filter(|(name, _)| !ignored.contains(*name))
            .collect();
        let actual_attrs: HashMap<&str, &str> = actual
            .value()
            .attrs()
            .filter(|(name, _)| !ignored.contains(*name))
            .collect();

        if expected_attrs.len() != actual_attrs.len() {
            return Err(MarkupCompareError::AttributeMismatch {
                tag,
                detail: format!(
                    "Expected {} attributes, found {}",
                    expected_attrs.len(),
                    actual_attrs.len()
                ),
            });
        }

        for (name, expected_value) in expected_attrs {
            match actual_attrs.get(name) {
                None => {
                    return Err(MarkupCompareError::AttributeMismatch {
                        tag,
                        detail: format!("Missing attribute {name:?}"),
                    });
                }
                // Expected attribute values follow the same wildcard rules
                // as text nodes.
                Some(actual_value) if !text_matches(expected_value, actual_value) => {
                    return Err(MarkupCompareError::AttributeMismatch {
                        tag,
                        detail: format!(
                            "Attribute {name:?} mismatch. Expected: '{expected_value}', Actual: '{actual_value}'"
                        ),
                    });
                }
                Some(_) => {}
            }
        }

        Ok(())
    }

    fn should_include_node(&self, node: &NodeRef<Node>) -> bool {
        match node.value() {
            // Whitespace-only text never takes part in the comparison.
            Node::Text(text) => !text.trim().is_empty(),
            Node::Comment(_) => !self.options.ignore_comments,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compare(expected: &str, actual: &str) -> Result<(), MarkupCompareError> {
        MarkupComparer::new().compare(expected, actual, MarkupParser::Html)
    }

    #[test]
    fn identical_markup_matches() {
        assert!(compare("<div><p>Hello</p></div>", "<div><p>Hello</p></div>").is_ok());
    }

    #[test]
    fn inter_element_whitespace_is_ignored() {
        assert!(compare(
            "<div><p>Hello</p></div>",
            "<div>\n  <p>\n    Hello\n  </p>\n</div>"
        )
        .is_ok());
    }

    #[test]
    fn attribute_order_is_ignored() {
        assert!(compare(
            "<div class='test' id='1'>Test</div>",
            "<div id='1' class='test'>Test</div>"
        )
        .is_ok());
    }

    #[test]
    fn self_closing_style_is_ignored() {
        assert!(compare("<div><br/></div>", "<div><br></div>").is_ok());
        assert!(compare(
            "<div><img src='x.png'/></div>",
            "<div><img src='x.png'></div>"
        )
        .is_ok());
    }

    #[test]
    fn text_runs_of_whitespace_collapse() {
        assert!(compare("<p>Hello   World</p>", "<p>Hello World</p>").is_ok());
    }

    #[test]
    fn ellipsis_matches_inside_text_nodes() {
        assert!(compare("<p>foo ... bar</p>", "<p>foo anything bar</p>").is_ok());
        assert!(compare("<p>foo ... bar</p>", "<p>foo anything qux</p>").is_err());
    }

    #[test]
    fn ellipsis_matches_inside_attribute_values() {
        assert!(compare(
            "<a href='http://example.com/...'>x</a>",
            "<a href='http://example.com/some/long/path'>x</a>"
        )
        .is_ok());
    }

    #[test]
    fn attribute_value_mismatch_is_reported() {
        let err = compare(
            "<div class='test'>Content</div>",
            "<div class='different'>Content</div>",
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Attribute mismatch on <div>. Attribute \"class\" mismatch. Expected: 'test', Actual: 'different'"
        );
    }

    #[test]
    fn missing_attribute_is_reported() {
        let err = compare("<div class='a' id='b'>x</div>", "<div class='a'>x</div>").unwrap_err();
        assert!(matches!(err, MarkupCompareError::AttributeMismatch { .. }));
    }

    #[test]
    fn ignored_attributes_are_skipped() {
        let mut ignored = HashSet::new();
        ignored.insert("id".to_string());
        let comparer = MarkupComparer::with_options(MarkupCompareOptions {
            ignored_attributes: ignored,
            ..Default::default()
        });
        assert!(comparer
            .compare(
                "<h1 id='heading-1'>Title</h1>",
                "<h1 id='other'>Title</h1>",
                MarkupParser::Html
            )
            .is_ok());
    }

    #[test]
    fn tag_mismatch_is_reported() {
        let err = compare("<div>Test</div>", "<span>Test</span>").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Tag name mismatch. Expected: div, Actual: span"
        );
    }

    #[test]
    fn text_mismatch_is_reported() {
        let err = compare("<div>Hello</div>", "<div>World</div>").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Text content mismatch at position 0. Expected: 'Hello', Actual: 'World'"
        );
    }

    #[test]
    fn child_count_mismatch_is_reported() {
        let err = compare("<ul><li>a</li></ul>", "<ul><li>a</li><li>b</li></ul>").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Child count mismatch under <ul>. Expected: 1, Actual: 2"
        );
    }

    #[test]
    fn node_type_mismatch_is_reported() {
        let err = compare("<div><p>Text</p></div>", "<div>Text</div>").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Node type mismatch at position 0. Expected type: \"Element\", Actual type: \"Text\""
        );
    }

    #[test]
    fn comments_are_ignored_by_default() {
        assert!(compare(
            "<div><!-- note --><p>Test</p></div>",
            "<div><p>Test</p></div>"
        )
        .is_ok());
    }

    #[test]
    fn comments_compare_when_kept() {
        let comparer = MarkupComparer::with_options(MarkupCompareOptions {
            ignore_comments: false,
            ..Default::default()
        });
        assert!(comparer
            .compare(
                "<div><!-- same --><p>x</p></div>",
                "<div><!-- same --><p>x</p></div>",
                MarkupParser::Html
            )
            .is_ok());
        let err = comparer
            .compare(
                "<div><!-- one --><p>x</p></div>",
                "<div><!-- two --><p>x</p></div>",
                MarkupParser::Html
            )
            .unwrap_err();
        assert!(matches!(err, MarkupCompareError::CommentMismatch { .. }));
    }

    #[test]
    fn strict_mode_rejects_repaired_markup() {
        let comparer = MarkupComparer::new();
        let err = comparer
            .compare(
                "<root><item>A</item></root>",
                "<root></oops><item>A</item></root>",
                MarkupParser::Xml,
            )
            .unwrap_err();
        assert!(matches!(err, MarkupCompareError::Malformed(_)));
    }

    #[test]
    fn strict_mode_accepts_empty_element_tags() {
        let comparer = MarkupComparer::new();
        assert!(comparer
            .compare("<a><b/></a>", "<a><b></b></a>", MarkupParser::Xml)
            .is_ok());
        assert!(comparer
            .compare(
                "<root><item/><item>B</item></root>",
                "<root><item></item><item>B</item></root>",
                MarkupParser::Xml
            )
            .is_ok());
    }

    #[test]
    fn strict_mode_accepts_well_formed_markup() {
        let comparer = MarkupComparer::new();
        assert!(comparer
            .compare(
                "<root><item>A</item></root>",
                "<root><item>A</item></root>",
                MarkupParser::Xml
            )
            .is_ok());
    }

    #[test]
    fn full_documents_compare_from_the_html_element() {
        assert!(compare(
            "<html><body><p>hi</p></body></html>",
            "<html>\n<body>\n<p>hi</p>\n</body>\n</html>"
        )
        .is_ok());
    }
}
