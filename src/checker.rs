//! The doctest output checker: decides whether a pair of outputs should be
//! compared as text or as parsed markup, and runs the comparison.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::compare::{MarkupCompareError, MarkupCompareOptions, MarkupComparer, MarkupParser};
use crate::text::{self, text_matches};

/// Pattern separating object representations from markup. Debugging output
/// is full of `<`-wrapped reprs such as `<MyClass instance>`, `<module 'x.y'>`,
/// `<thing at 0x7f..>`, and `<foo object ...>`. None of those should be fed
/// to a markup parser just because they open with an angle bracket.
static REPR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<([A-Z]|[^>]+ (at|object) |[a-z]+ '[A-Za-z0-9_.]+'>)")
        .expect("built-in repr pattern is valid")
});

/// Per-comparison option flags.
///
/// These replace the doctest-style global flag registry with a plain value:
/// construct them where the comparison happens and pass them in.
///
/// ```ignore
/// use markup_doctest_rs::{MarkupFlags, MarkupOutputChecker};
///
/// let checker = MarkupOutputChecker::new();
/// let flags = MarkupFlags { parse_xml: true, ..Default::default() };
/// assert!(checker.check_output(Some("<a><b/></a>"), Some("<a><b></b></a>"), flags));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkupFlags {
    /// Force the tolerant HTML parser.
    pub parse_html: bool,
    /// Force the strict XML parser.
    pub parse_xml: bool,
    /// Disable markup parsing entirely; compare as plain text. Overrides the
    /// other two flags.
    pub noparse_markup: bool,
}

/// Failure detail for a full [`MarkupOutputChecker::check_output_detailed`]
/// run; the boolean [`MarkupOutputChecker::check_output`] is derived from it.
#[derive(Debug, Error)]
pub enum CheckFailure {
    #[error("Text mismatch. Expected: '{expected}', Actual: '{actual}'")]
    Text { expected: String, actual: String },
    #[error(transparent)]
    Markup(#[from] MarkupCompareError),
}

/// A doctest-style output checker that recognizes markup.
///
/// Expected and actual output are compared structurally when both sides look
/// like markup (or when a flag forces a parser), and as ellipsis-and-
/// whitespace-tolerant text otherwise.
#[derive(Debug)]
pub struct MarkupOutputChecker {
    repr_pattern: Regex,
    options: MarkupCompareOptions,
}

impl Default for MarkupOutputChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkupOutputChecker {
    pub fn new() -> Self {
        Self::with_options(MarkupCompareOptions::default())
    }

    /// Creates a checker whose structural comparisons use `options`.
    pub fn with_options(options: MarkupCompareOptions) -> Self {
        Self {
            repr_pattern: REPR_PATTERN.clone(),
            options,
        }
    }

    /// Replaces the repr-detection pattern. Strings matching the pattern are
    /// never treated as markup, whatever they start with.
    pub fn with_repr_pattern(mut self, pattern: Regex) -> Self {
        self.repr_pattern = pattern;
        self
    }

    /// Heuristic markup sniffing: after dropping the `<BLANKLINE>` sentinel
    /// and surrounding whitespace, the string must open with `<` and must not
    /// look like an object representation.
    pub fn looks_like_markup(&self, s: &str) -> bool {
        let s = s.replace(text::BLANKLINE_MARKER, "\n");
        let s = s.trim();
        s.starts_with('<') && !self.repr_pattern.is_match(s)
    }

    /// The parser used when both sides merely look like markup and no flag
    /// says otherwise.
    pub fn default_parser(&self) -> MarkupParser {
        MarkupParser::Html
    }

    /// Chooses a parser for the pair, or `None` for plain-text comparison.
    ///
    /// Explicit flags always win over the content-based fallbacks, in this
    /// order: `noparse_markup`, `parse_html`, `parse_xml`, then an `<html`
    /// prefix on both sides, then the markup-sniffing heuristic.
    pub fn parser_for(&self, want: &str, got: &str, flags: MarkupFlags) -> Option<MarkupParser> {
        if flags.noparse_markup {
            return None;
        }
        if flags.parse_html {
            return Some(MarkupParser::Html);
        }
        if flags.parse_xml {
            return Some(MarkupParser::Xml);
        }
        if starts_with_html(want) && starts_with_html(got) {
            return Some(MarkupParser::Html);
        }
        if self.looks_like_markup(want) && self.looks_like_markup(got) {
            return Some(self.default_parser());
        }
        None
    }

    /// Plain-text comparison with doctest semantics: `...` wildcards and
    /// whitespace normalization are always active, and absent values compare
    /// as empty strings. `strip` is accepted for callers that distinguish
    /// stripped comparisons; the normalization applied here already subsumes
    /// stripping, so it does not change the result.
    pub fn text_compare(&self, want: Option<&str>, got: Option<&str>, strip: bool) -> bool {
        let _ = strip;
        text_matches(want.unwrap_or(""), got.unwrap_or(""))
    }

    /// Full comparison: select a parser, then either diff the parsed trees
    /// or fall back to [`text_compare`](Self::text_compare).
    pub fn check_output(&self, want: Option<&str>, got: Option<&str>, flags: MarkupFlags) -> bool {
        self.check_output_detailed(want, got, flags).is_ok()
    }

    /// Like [`check_output`](Self::check_output), but reports what went
    /// wrong. This is what the assertion macros print.
    pub fn check_output_detailed(
        &self,
        want: Option<&str>,
        got: Option<&str>,
        flags: MarkupFlags,
    ) -> Result<(), CheckFailure> {
        let want = want.unwrap_or("");
        let got = got.unwrap_or("");

        match self.parser_for(want, got, flags) {
            Some(parser) => {
                let comparer = MarkupComparer::with_options(self.options.clone());
                comparer.compare(want, got, parser)?;
                Ok(())
            }
            None => {
                if text_matches(want, got) {
                    Ok(())
                } else {
                    Err(CheckFailure::Text {
                        expected: want.to_string(),
                        actual: got.to_string(),
                    })
                }
            }
        }
    }
}

fn starts_with_html(s: &str) -> bool {
    s.trim()
        .get(..5)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("<html"))
}
