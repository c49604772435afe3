//! The "accept one side, advance to the next conflict" algorithm.
//!
//! [`resolve`] walks the registry from a [`MergeCursor`], accepting context
//! lines and lines of the requested [`Side`], until it reaches a line of
//! the opposite side outside the hunk it is deciding, or runs out of
//! records.
//!
//! A hunk is a maximal run of non-context lines. The first hunk a call
//! reaches is the conflict that call decides: its opposite-side lines are
//! rejected instead of stopping the scan. Every call therefore consumes at
//! least one line, and any sequence of sides reaches the end of the
//! registry in at most [`DiffRegistry::total_lines`] calls.

use serde::{Deserialize, Serialize};
use splice_diff::LineTag;

use crate::registry::DiffRegistry;

/// Which document's lines to keep at a conflict.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// The original document (removed lines).
    Left,
    /// The new document (added lines).
    Right,
}

impl Side {
    /// The line tag this side accepts.
    pub fn tag(self) -> LineTag {
        match self {
            Self::Left => LineTag::Removed,
            Self::Right => LineTag::Added,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Left => f.write_str("left"),
            Self::Right => f.write_str("right"),
        }
    }
}

impl std::str::FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "l" | "x" | "original" => Ok(Self::Left),
            "right" | "r" | "y" | "new" => Ok(Self::Right),
            other => Err(format!("unknown side: {other}")),
        }
    }
}

/// Resolution progress: the record being resolved and the next line to scan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MergeCursor {
    pub diff_index: usize,
    pub line_index: usize,
}

impl MergeCursor {
    /// Returns `true` once every record has been consumed.
    pub fn is_done(&self, registry: &DiffRegistry) -> bool {
        self.diff_index >= registry.len()
    }
}

/// What a single [`resolve`] call did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Accepted line texts, in order.
    pub accepted: Vec<String>,
    /// Opposite-side lines dropped inside the decided hunk.
    pub rejected: usize,
    /// `true` if the scan stopped at an opposite-side line.
    pub parked: bool,
}

/// Accept `side` at the conflict under `cursor` and advance to the next one.
///
/// The cursor is left on the first opposite-side line past the decided
/// hunk, or at `(registry.len(), 0)` when nothing is left. Calling on a
/// finished cursor returns an empty [`Resolution`].
pub fn resolve(registry: &DiffRegistry, cursor: &mut MergeCursor, side: Side) -> Resolution {
    let mut resolution = Resolution::default();
    let mut deciding = true;
    let mut in_hunk = false;

    while let Some(record) = registry.get(cursor.diff_index) {
        for (i, line) in record.lines.iter().enumerate().skip(cursor.line_index) {
            match line.tag {
                LineTag::Hint => {}
                LineTag::Context => {
                    if in_hunk {
                        in_hunk = false;
                        deciding = false;
                    }
                    resolution.accepted.push(line.text.clone());
                }
                tag if tag == side.tag() => {
                    in_hunk = true;
                    resolution.accepted.push(line.text.clone());
                }
                _ if deciding => {
                    in_hunk = true;
                    resolution.rejected += 1;
                }
                _ => {
                    cursor.line_index = i;
                    resolution.parked = true;
                    return resolution;
                }
            }
        }

        // Record exhausted without a conflict for this side.
        if in_hunk {
            in_hunk = false;
            deciding = false;
        }
        cursor.diff_index += 1;
        cursor.line_index = 0;
    }

    resolution
}
