//! Line-level diff between two blocks.
//!
//! Uses the `similar` crate (Myers diff algorithm) to produce a flat,
//! tagged listing of every line of both inputs. Replaced lines that are
//! near matches can additionally be annotated with [`LineTag::Hint`] lines
//! carrying an intraline alignment marker.

use serde::{Deserialize, Serialize};
use similar::{capture_diff_slices, Algorithm, DiffOp, DiffTag, TextDiff};

/// Minimum character similarity for a removed/added pair to get hints.
pub const HINT_CUTOFF: f32 = 0.75;

/// Classification of a single line in a diff listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineTag {
    /// Present unchanged in both inputs.
    Context,
    /// Present only in the original input.
    Removed,
    /// Present only in the new input.
    Added,
    /// Alignment marker for the preceding line; carries no content.
    Hint,
}

impl LineTag {
    /// Returns `true` for [`LineTag::Removed`] and [`LineTag::Added`].
    pub fn is_change(self) -> bool {
        matches!(self, Self::Removed | Self::Added)
    }

    /// The `ndiff`-style prefix character for this tag.
    pub fn prefix(self) -> char {
        match self {
            Self::Context => ' ',
            Self::Removed => '-',
            Self::Added => '+',
            Self::Hint => '?',
        }
    }
}

/// A single tagged line of a diff listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    pub tag: LineTag,
    pub text: String,
}

impl DiffLine {
    pub fn new(tag: LineTag, text: impl Into<String>) -> Self {
        Self {
            tag,
            text: text.into(),
        }
    }

    pub fn context(text: impl Into<String>) -> Self {
        Self::new(LineTag::Context, text)
    }

    pub fn removed(text: impl Into<String>) -> Self {
        Self::new(LineTag::Removed, text)
    }

    pub fn added(text: impl Into<String>) -> Self {
        Self::new(LineTag::Added, text)
    }

    pub fn hint(text: impl Into<String>) -> Self {
        Self::new(LineTag::Hint, text)
    }
}

impl std::fmt::Display for DiffLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.tag.prefix(), self.text)
    }
}

/// Options for [`diff_lines`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiffOptions {
    /// Emit [`LineTag::Hint`] lines for near-matching replacements.
    pub hints: bool,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self { hints: true }
    }
}

impl DiffOptions {
    /// Options that never emit hint lines.
    pub fn without_hints() -> Self {
        Self { hints: false }
    }
}

/// Per-listing line counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DiffStats {
    pub context: usize,
    pub additions: usize,
    pub deletions: usize,
    pub hints: usize,
}

impl DiffStats {
    pub fn of(lines: &[DiffLine]) -> Self {
        lines.iter().fold(Self::default(), |mut stats, line| {
            match line.tag {
                LineTag::Context => stats.context += 1,
                LineTag::Added => stats.additions += 1,
                LineTag::Removed => stats.deletions += 1,
                LineTag::Hint => stats.hints += 1,
            }
            stats
        })
    }

    /// Returns `true` if the listing contains any removed or added line.
    pub fn has_changes(&self) -> bool {
        self.additions + self.deletions > 0
    }
}

impl std::ops::AddAssign for DiffStats {
    fn add_assign(&mut self, other: Self) {
        self.context += other.context;
        self.additions += other.additions;
        self.deletions += other.deletions;
        self.hints += other.hints;
    }
}

/// Returns `true` if any line is [`LineTag::Removed`] or [`LineTag::Added`].
pub fn has_changes(lines: &[DiffLine]) -> bool {
    lines.iter().any(|l| l.tag.is_change())
}

/// Compute a tagged line listing between `original` and `new`.
///
/// Every original line appears exactly once as `Context` or `Removed`, every
/// new line exactly once as `Context` or `Added`. Within a replaced region
/// all removed lines come before the added lines. The result depends only
/// on the inputs.
pub fn diff_lines(original: &[&str], new: &[&str], options: DiffOptions) -> Vec<DiffLine> {
    let mut out = Vec::with_capacity(original.len().max(new.len()));

    for op in capture_diff_slices(Algorithm::Myers, original, new) {
        match op {
            DiffOp::Equal {
                old_index, len, ..
            } => {
                out.extend(
                    original[old_index..old_index + len]
                        .iter()
                        .map(|l| DiffLine::context(*l)),
                );
            }
            DiffOp::Delete {
                old_index, old_len, ..
            } => {
                out.extend(
                    original[old_index..old_index + old_len]
                        .iter()
                        .map(|l| DiffLine::removed(*l)),
                );
            }
            DiffOp::Insert {
                new_index, new_len, ..
            } => {
                out.extend(
                    new[new_index..new_index + new_len]
                        .iter()
                        .map(|l| DiffLine::added(*l)),
                );
            }
            DiffOp::Replace {
                old_index,
                old_len,
                new_index,
                new_len,
            } => {
                let removed = &original[old_index..old_index + old_len];
                let added = &new[new_index..new_index + new_len];
                push_replacement(&mut out, removed, added, options);
            }
        }
    }

    out
}

/// Convenience wrapper diffing two whole texts (see [`crate::split_lines`]).
pub fn diff_texts(original: &str, new: &str, options: DiffOptions) -> Vec<DiffLine> {
    let original = crate::split_lines(original);
    let new = crate::split_lines(new);
    diff_lines(&original, &new, options)
}

fn push_replacement(out: &mut Vec<DiffLine>, removed: &[&str], added: &[&str], options: DiffOptions) {
    let markers: Vec<Option<(String, String)>> = if options.hints {
        removed
            .iter()
            .zip(added)
            .map(|(old, new)| intraline_markers(old, new))
            .collect()
    } else {
        Vec::new()
    };

    for (i, line) in removed.iter().enumerate() {
        out.push(DiffLine::removed(*line));
        if let Some(Some((old_marker, _))) = markers.get(i) {
            if !old_marker.is_empty() {
                out.push(DiffLine::hint(old_marker.clone()));
            }
        }
    }
    for (i, line) in added.iter().enumerate() {
        out.push(DiffLine::added(*line));
        if let Some(Some((_, new_marker))) = markers.get(i) {
            if !new_marker.is_empty() {
                out.push(DiffLine::hint(new_marker.clone()));
            }
        }
    }
}

/// Marker rows for a near-matching pair, or `None` if the pair is too
/// dissimilar.
///
/// `-` marks a deleted char, `+` an inserted one, `^` a replaced one.
/// Trailing spaces are trimmed, so an empty row means "nothing to mark".
fn intraline_markers(old: &str, new: &str) -> Option<(String, String)> {
    let diff = TextDiff::from_chars(old, new);
    if diff.ratio() < HINT_CUTOFF {
        return None;
    }

    let mut old_marker = String::new();
    let mut new_marker = String::new();
    for op in diff.ops() {
        let old_len = op.old_range().len();
        let new_len = op.new_range().len();
        match op.tag() {
            DiffTag::Equal => {
                old_marker.extend(std::iter::repeat(' ').take(old_len));
                new_marker.extend(std::iter::repeat(' ').take(new_len));
            }
            DiffTag::Delete => old_marker.extend(std::iter::repeat('-').take(old_len)),
            DiffTag::Insert => new_marker.extend(std::iter::repeat('+').take(new_len)),
            DiffTag::Replace => {
                old_marker.extend(std::iter::repeat('^').take(old_len));
                new_marker.extend(std::iter::repeat('^').take(new_len));
            }
        }
    }

    Some((
        old_marker.trim_end().to_string(),
        new_marker.trim_end().to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn plain(original: &[&str], new: &[&str]) -> Vec<DiffLine> {
        diff_lines(original, new, DiffOptions::without_hints())
    }

    #[test]
    fn identical_inputs_are_all_context() {
        let lines = ["a", "b", "c"];
        let diff = plain(&lines, &lines);
        assert!(!has_changes(&diff));
        assert!(diff.iter().all(|l| l.tag == LineTag::Context));
        assert_eq!(diff.len(), 3);
    }

    #[test]
    fn replaced_line_lists_removed_before_added() {
        let diff = plain(&["def f():", "    return 1"], &["def f():", "    return 2"]);
        assert_eq!(
            diff,
            vec![
                DiffLine::context("def f():"),
                DiffLine::removed("    return 1"),
                DiffLine::added("    return 2"),
            ]
        );
    }

    #[test]
    fn pure_addition() {
        let diff = plain(&["a"], &["a", "b"]);
        assert_eq!(diff, vec![DiffLine::context("a"), DiffLine::added("b")]);
        let stats = DiffStats::of(&diff);
        assert_eq!(stats.additions, 1);
        assert_eq!(stats.deletions, 0);
    }

    #[test]
    fn pure_deletion() {
        let diff = plain(&["a", "b", "c"], &["a", "c"]);
        assert_eq!(
            diff,
            vec![
                DiffLine::context("a"),
                DiffLine::removed("b"),
                DiffLine::context("c"),
            ]
        );
    }

    #[test]
    fn empty_side_is_all_additions() {
        let diff = plain(&[], &["x", "y"]);
        assert_eq!(diff, vec![DiffLine::added("x"), DiffLine::added("y")]);
    }

    #[test]
    fn near_match_gets_hint_lines() {
        let diff = diff_lines(
            &["    return value + 1"],
            &["    return value + 2"],
            DiffOptions::default(),
        );
        let tags: Vec<_> = diff.iter().map(|l| l.tag).collect();
        assert_eq!(
            tags,
            vec![LineTag::Removed, LineTag::Hint, LineTag::Added, LineTag::Hint]
        );
        assert_eq!(diff[1].text, "                   ^");
        assert_eq!(diff[3].text, "                   ^");
    }

    #[test]
    fn insertion_inside_line_marks_only_new_side() {
        let diff = diff_lines(&["print(x)"], &["print(x, y)"], DiffOptions::default());
        let tags: Vec<_> = diff.iter().map(|l| l.tag).collect();
        assert_eq!(tags, vec![LineTag::Removed, LineTag::Added, LineTag::Hint]);
        assert_eq!(diff[2].text, "       +++");
    }

    #[test]
    fn dissimilar_lines_get_no_hints() {
        let diff = diff_lines(&["alpha"], &["zzzzzzzz"], DiffOptions::default());
        assert!(diff.iter().all(|l| l.tag != LineTag::Hint));
    }

    #[test]
    fn display_uses_ndiff_prefixes() {
        assert_eq!(DiffLine::removed("x").to_string(), "- x");
        assert_eq!(DiffLine::added("x").to_string(), "+ x");
        assert_eq!(DiffLine::context("x").to_string(), "  x");
        assert_eq!(DiffLine::hint("^").to_string(), "? ^");
    }

    #[test]
    fn diff_texts_splits_on_newlines() {
        let diff = diff_texts("a\nb", "a\nc", DiffOptions::without_hints());
        assert_eq!(
            diff,
            vec![
                DiffLine::context("a"),
                DiffLine::removed("b"),
                DiffLine::added("c"),
            ]
        );
    }

    #[test]
    fn stats_accumulate() {
        let mut total = DiffStats::default();
        total += DiffStats::of(&plain(&["a"], &["b"]));
        total += DiffStats::of(&plain(&["a"], &["a", "c"]));
        assert_eq!(total.additions, 2);
        assert_eq!(total.deletions, 1);
        assert_eq!(total.context, 1);
        assert!(total.has_changes());
    }

    fn side() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[abc]{0,3}", 0..12)
    }

    proptest! {
        #[test]
        fn every_line_is_tagged_exactly_once(a in side(), b in side(), hints in any::<bool>()) {
            let a: Vec<&str> = a.iter().map(String::as_str).collect();
            let b: Vec<&str> = b.iter().map(String::as_str).collect();
            let diff = diff_lines(&a, &b, DiffOptions { hints });

            let left: Vec<&str> = diff
                .iter()
                .filter(|l| matches!(l.tag, LineTag::Context | LineTag::Removed))
                .map(|l| l.text.as_str())
                .collect();
            let right: Vec<&str> = diff
                .iter()
                .filter(|l| matches!(l.tag, LineTag::Context | LineTag::Added))
                .map(|l| l.text.as_str())
                .collect();
            prop_assert_eq!(left, a.clone());
            prop_assert_eq!(right, b.clone());
        }

        #[test]
        fn diff_is_deterministic(a in side(), b in side()) {
            let a: Vec<&str> = a.iter().map(String::as_str).collect();
            let b: Vec<&str> = b.iter().map(String::as_str).collect();
            let opts = DiffOptions::default();
            prop_assert_eq!(diff_lines(&a, &b, opts), diff_lines(&a, &b, opts));
        }
    }
}
