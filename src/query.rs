//! A small path-query language for selecting elements out of a parsed tree.
//!
//! The supported subset is what markup-heavy tests actually reach for:
//!
//! - `.` selects the context element itself (the default query)
//! - `item` or `./item` selects child elements named `item`
//! - `/root` selects the document element, when it is named `root`
//! - `//item` selects `item` elements anywhere in the subtree, context included
//! - `*` matches any element name and can appear in any step
//!
//! Steps can be chained (`//list/item`, `./a/b`). A `xmlns:` prefix on a name
//! is accepted and stripped, so queries written against the XHTML default
//! namespace keep addressing plain HTML elements. Anything beyond this subset
//! (predicates, attributes, other axes) is reported as [`QueryError`] rather
//! than silently matching nothing.

use std::collections::HashSet;

use ego_tree::NodeId;
use scraper::ElementRef;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Unsupported path query {query:?}: {detail}")]
    Unsupported { query: String, detail: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NameTest {
    Any,
    Name(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    /// Tests the context node itself; only produced for the leading step of
    /// an absolute query, where the context is the document element.
    Document,
    Child,
    DescendantOrSelf,
}

#[derive(Debug, Clone)]
struct Step {
    axis: Axis,
    test: NameTest,
}

impl Step {
    fn matches(&self, element: ElementRef) -> bool {
        match &self.test {
            NameTest::Any => true,
            NameTest::Name(name) => element.value().name() == name,
        }
    }
}

/// A parsed path query, ready to be evaluated against a context element.
#[derive(Debug, Clone)]
pub(crate) struct PathQuery {
    steps: Vec<Step>,
}

impl PathQuery {
    pub(crate) fn parse(query: &str) -> Result<Self, QueryError> {
        let trimmed = query.trim();
        if trimmed.is_empty() || trimmed == "." {
            return Ok(Self { steps: Vec::new() });
        }

        // A leading "." marks the query as relative; "./a" and ".//a" behave
        // like "a" and "//a".
        let (mut rest, absolute) = match trimmed.strip_prefix('.') {
            Some(relative) if relative.starts_with('/') => (relative, false),
            Some(_) => {
                return Err(Self::unsupported(query, "expected '/' after '.'"));
            }
            None => (trimmed, trimmed.starts_with('/') && !trimmed.starts_with("//")),
        };

        let mut steps = Vec::new();
        let mut first = true;
        while !rest.is_empty() {
            let axis = if let Some(after) = rest.strip_prefix("//") {
                rest = after;
                Axis::DescendantOrSelf
            } else if let Some(after) = rest.strip_prefix('/') {
                rest = after;
                if first && absolute {
                    Axis::Document
                } else {
                    Axis::Child
                }
            } else if first {
                // Bare leading name, e.g. "item".
                Axis::Child
            } else {
                return Err(Self::unsupported(query, "expected '/' between steps"));
            };

            let end = rest.find('/').unwrap_or(rest.len());
            let (token, remainder) = rest.split_at(end);
            steps.push(Step {
                axis,
                test: Self::name_test(token, query)?,
            });
            rest = remainder;
            first = false;
        }

        Ok(Self { steps })
    }

    fn name_test(token: &str, query: &str) -> Result<NameTest, QueryError> {
        let token = token.strip_prefix("xmlns:").unwrap_or(token);
        if token == "*" {
            return Ok(NameTest::Any);
        }
        if token.is_empty() {
            return Err(Self::unsupported(query, "empty step"));
        }
        let valid = token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(Self::unsupported(
                query,
                &format!("step {token:?} is not a name test"),
            ));
        }
        Ok(NameTest::Name(token.to_ascii_lowercase()))
    }

    fn unsupported(query: &str, detail: &str) -> QueryError {
        QueryError::Unsupported {
            query: query.to_string(),
            detail: detail.to_string(),
        }
    }

    /// Evaluates the query against a context element, yielding matches in
    /// document order with duplicates removed.
    pub(crate) fn select<'a>(&self, context: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        let mut current = vec![context];
        for step in &self.steps {
            let mut seen: HashSet<NodeId> = HashSet::new();
            let mut next = Vec::new();
            for element in current {
                match step.axis {
                    Axis::Document => {
                        if step.matches(element) {
                            push_unique(&mut next, &mut seen, element);
                        }
                    }
                    Axis::Child => {
                        for child in element.children().filter_map(ElementRef::wrap) {
                            if step.matches(child) {
                                push_unique(&mut next, &mut seen, child);
                            }
                        }
                    }
                    Axis::DescendantOrSelf => {
                        for node in element.descendants().filter_map(ElementRef::wrap) {
                            if step.matches(node) {
                                push_unique(&mut next, &mut seen, node);
                            }
                        }
                    }
                }
            }
            current = next;
        }
        current
    }
}

fn push_unique<'a>(
    out: &mut Vec<ElementRef<'a>>,
    seen: &mut HashSet<NodeId>,
    element: ElementRef<'a>,
) {
    if seen.insert(element.id()) {
        out.push(element);
    }
}
