//! Doctest-style text comparison: ellipsis wildcards, whitespace
//! normalization, and the `<BLANKLINE>` sentinel.

/// Wildcard marker accepted in expected output. A marker matches any run of
/// characters (including none) at the point it appears.
pub(crate) const ELLIPSIS_MARKER: &str = "...";

/// Sentinel representing an empty line in expected doctest output.
pub(crate) const BLANKLINE_MARKER: &str = "<BLANKLINE>";

/// Collapses every run of whitespace to a single space and drops leading and
/// trailing whitespace.
pub(crate) fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Replaces lines consisting of the `<BLANKLINE>` sentinel (optionally
/// followed by trailing whitespace) with empty lines.
pub(crate) fn substitute_blank_lines(s: &str) -> String {
    s.lines()
        .map(|line| match line.strip_prefix(BLANKLINE_MARKER) {
            Some(rest) if rest.trim().is_empty() => "",
            _ => line,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Compares expected against actual output with ellipsis and whitespace
/// normalization always in effect. The expected side additionally gets
/// `<BLANKLINE>` substitution, matching how doctest treats expected output.
pub(crate) fn text_matches(want: &str, got: &str) -> bool {
    let want = normalize_whitespace(&substitute_blank_lines(want));
    let got = normalize_whitespace(got);
    if want == got {
        return true;
    }
    ellipsis_match(&want, &got)
}

/// Matches `want` against `got` treating each `...` in `want` as a wildcard
/// for zero or more characters. Literal fragments between markers must appear
/// in order and must not overlap.
pub(crate) fn ellipsis_match(want: &str, got: &str) -> bool {
    if !want.contains(ELLIPSIS_MARKER) {
        return want == got;
    }

    let mut pieces: Vec<&str> = want.split(ELLIPSIS_MARKER).collect();
    let mut start = 0;
    let mut end = got.len();

    // A literal prefix must anchor at the start of the actual output.
    if !pieces[0].is_empty() {
        if !got.starts_with(pieces[0]) {
            return false;
        }
        start = pieces[0].len();
        pieces.remove(0);
    }

    // Likewise a literal suffix must anchor at the end.
    if let Some(last) = pieces.last().copied() {
        if !last.is_empty() {
            if !got.ends_with(last) || got.len() - last.len() < start {
                return false;
            }
            end = got.len() - last.len();
            pieces.pop();
        }
    }

    if start > end {
        return false;
    }

    for piece in pieces {
        match got[start..end].find(piece) {
            Some(offset) => start += offset + piece.len(),
            None => return false,
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_without_marker() {
        assert!(text_matches("foo bar", "foo bar"));
        assert!(!text_matches("foo bar", "foo baz"));
    }

    #[test]
    fn ellipsis_matches_middle() {
        assert!(text_matches("foo ... bar", "foo baz bar"));
        assert!(!text_matches("foo ... bar", "foo baz qux"));
    }

    #[test]
    fn ellipsis_can_match_nothing() {
        assert!(text_matches("foo ...bar", "foo bar"));
        // The literal fragments around the marker still need their own
        // characters; "foo ... bar" wants two spaces worth of text.
        assert!(!text_matches("foo ... bar", "foo bar"));
    }

    #[test]
    fn ellipsis_matches_everything() {
        assert!(ellipsis_match("...", ""));
        assert!(ellipsis_match("...", "anything at all"));
    }

    #[test]
    fn ellipsis_anchors_prefix_and_suffix() {
        assert!(ellipsis_match("start...", "start and more"));
        assert!(!ellipsis_match("start...", "not start"));
        assert!(ellipsis_match("...end", "the end"));
        assert!(!ellipsis_match("...end", "end not"));
    }

    #[test]
    fn ellipsis_fragments_must_be_ordered() {
        assert!(ellipsis_match("a...b...c", "a_x_b_y_c"));
        assert!(!ellipsis_match("a...c...b", "a_x_b_y_c"));
    }

    #[test]
    fn ellipsis_fragments_must_not_overlap() {
        // The suffix is consumed from the end, so the middle fragment has to
        // find a separate occurrence.
        assert!(!ellipsis_match("...abc...abc", "xabc"));
        assert!(ellipsis_match("...abc...abc", "xabcyabc"));
    }

    #[test]
    fn whitespace_runs_collapse() {
        assert!(text_matches("a   b", "a b"));
        assert!(text_matches("a\n  b", "a b"));
        assert!(!text_matches("ab", "a b"));
    }

    #[test]
    fn blankline_sentinel_is_substituted() {
        assert!(text_matches("a\n<BLANKLINE>\nb", "a\n\nb"));
        // Only a sentinel alone on its line counts.
        assert!(!text_matches("a <BLANKLINE> b", "a b"));
    }

    #[test]
    fn normalize_whitespace_trims() {
        assert_eq!(normalize_whitespace("  a \t b\n"), "a b");
        assert_eq!(normalize_whitespace(""), "");
    }
}
