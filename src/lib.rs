//! Markup-aware output comparison for doctest-style tests.
//!
//! Documentation-style tests compare captured output against an expectation
//! written by a human, and markup is where that breaks down: attribute order,
//! inter-element whitespace, and self-closing tag style all vary without
//! changing meaning. This crate supplies an output checker that notices when
//! both sides of a comparison are markup and compares them as parsed trees
//! instead of text, while plain output keeps doctest's `...` wildcard and
//! whitespace-normalization semantics.
//!
//! # Example
//! ```ignore
//! use markup_doctest_rs::{MarkupFlags, MarkupOutputChecker};
//!
//! let checker = MarkupOutputChecker::new();
//! let flags = MarkupFlags::default();
//!
//! // Structurally equal markup passes, whatever the formatting.
//! assert!(checker.check_output(
//!     Some("<div class='a' id='b'><br/></div>"),
//!     Some("<div id='b' class='a'>\n  <br>\n</div>"),
//!     flags,
//! ));
//!
//! // Plain output still gets ellipsis matching.
//! assert!(checker.check_output(Some("took ... ms"), Some("took 42 ms"), flags));
//! ```
//!
//! For testing, the assertion macros panic with a description of the first
//! mismatch:
//! ```ignore
//! # use markup_doctest_rs::assert_markup_eq;
//! assert_markup_eq!(
//!     "<div><p>Hello</p></div>",
//!     "<div>\n  <p>Hello</p>\n</div>"
//! );
//! ```
//!
//! There is also [`render`], which invokes a view, extracts a subtree with a
//! small path-query language, and returns a pretty-printed serialization
//! suitable for use as an expectation.

/// Asserts that two output strings are equivalent under markup-aware
/// comparison.
///
/// An optional third argument supplies [`MarkupFlags`] to force or forbid
/// markup parsing.
///
/// # Examples
/// ```ignore
/// use markup_doctest_rs::{assert_markup_eq, MarkupFlags};
///
/// assert_markup_eq!(
///     "<div><p>Hello</p></div>",
///     "<div>\n  <p>Hello</p>\n</div>"
/// );
///
/// // Force strict XML parsing.
/// assert_markup_eq!(
///     "<root><item>A</item></root>",
///     "<root ><item >A</item></root>",
///     MarkupFlags { parse_xml: true, ..Default::default() }
/// );
/// ```
#[macro_export]
macro_rules! assert_markup_eq {
    ($want:expr, $got:expr $(,)?) => {
        $crate::assert_markup_eq!($want, $got, $crate::MarkupFlags::default())
    };
    ($want:expr, $got:expr, $flags:expr $(,)?) => {{
        match (&$want, &$got, &$flags) {
            (want_val, got_val, flags) => {
                let checker = $crate::MarkupOutputChecker::new();
                let outcome = checker.check_output_detailed(
                    Some(::core::convert::AsRef::<str>::as_ref(want_val)),
                    Some(::core::convert::AsRef::<str>::as_ref(got_val)),
                    *flags,
                );
                if let Err(err) = outcome {
                    panic!(
                        "\n\
                        Markup comparison failed:\n\
                        {}\n\n\
                        expected output:\n\
                        {}\n\n\
                        actual output:\n\
                        {}\n\n\
                        flags: {:?}\
                    ",
                        err, want_val, got_val, flags
                    );
                }
            }
        }
    }};
}

/// Asserts that two output strings are *not* equivalent under markup-aware
/// comparison.
///
/// # Examples
/// ```ignore
/// use markup_doctest_rs::assert_markup_ne;
///
/// assert_markup_ne!(
///     "<div><p>Hello</p></div>",
///     "<div><p>Different</p></div>"
/// );
/// ```
#[macro_export]
macro_rules! assert_markup_ne {
    ($want:expr, $got:expr $(,)?) => {
        $crate::assert_markup_ne!($want, $got, $crate::MarkupFlags::default())
    };
    ($want:expr, $got:expr, $flags:expr $(,)?) => {{
        match (&$want, &$got, &$flags) {
            (want_val, got_val, flags) => {
                let checker = $crate::MarkupOutputChecker::new();
                let matched = checker.check_output(
                    Some(::core::convert::AsRef::<str>::as_ref(want_val)),
                    Some(::core::convert::AsRef::<str>::as_ref(got_val)),
                    *flags,
                );
                if matched {
                    panic!(
                        "\n\
                        Outputs were equivalent but expected to differ:\n\n\
                        output:\n\
                        {}\n\n\
                        flags: {:?}\
                    ",
                        want_val, flags
                    );
                }
            }
        }
    }};
}

mod checker;
mod compare;
mod parse;
mod query;
mod render;
mod text;

pub use checker::{CheckFailure, MarkupFlags, MarkupOutputChecker};
pub use compare::{MarkupCompareError, MarkupCompareOptions, MarkupComparer, MarkupParser};
pub use query::QueryError;
pub use render::{render, RenderError, Renderable};
