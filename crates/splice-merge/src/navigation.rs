//! Navigation: map conflicts to source line ranges, and keep viewer scroll
//! positions in step.

use serde::Serialize;
use splice_diff::LineSpan;

use crate::error::{MergeError, MergeResult};
use crate::registry::DiffRegistry;

/// Where a conflict lives in both source documents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NavTarget {
    /// Position of the record in the registry.
    pub index: usize,
    /// The record's key.
    pub key: String,
    /// Lines of the original block, `None` if the key is absent there.
    pub original: Option<LineSpan>,
    /// Lines of the new block, `None` if the key is absent there.
    pub new: Option<LineSpan>,
}

/// Look up the source spans of the record at `index`.
pub fn range_for(registry: &DiffRegistry, index: usize) -> MergeResult<NavTarget> {
    let record = registry.get(index).ok_or(MergeError::IndexOutOfRange {
        index,
        len: registry.len(),
    })?;
    Ok(NavTarget {
        index,
        key: record.key.clone(),
        original: record.original.as_ref().map(|b| b.span),
        new: record.new.as_ref().map(|b| b.span),
    })
}

/// One of the three synchronised viewers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Pane {
    Original,
    New,
    Result,
}

impl Pane {
    pub const ALL: [Pane; 3] = [Pane::Original, Pane::New, Pane::Result];

    fn slot(self) -> usize {
        match self {
            Self::Original => 0,
            Self::New => 1,
            Self::Result => 2,
        }
    }
}

/// A scroll position the host should apply to a pane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScrollUpdate {
    pub pane: Pane,
    pub position: usize,
}

/// Scroll synchronisation across the three panes.
///
/// A position reported by one pane is forwarded to the other two, never
/// back to its origin. Each pane's last known position is tracked, so the
/// change events a pane fires while the host applies a forwarded position
/// come back as no-ops instead of being re-broadcast.
#[derive(Clone, Debug, Default)]
pub struct ViewSync {
    positions: [usize; 3],
}

impl ViewSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self, pane: Pane) -> usize {
        self.positions[pane.slot()]
    }

    /// Record that `origin` scrolled to `position` and return the updates to
    /// apply to the other panes.
    pub fn scrolled(&mut self, origin: Pane, position: usize) -> Vec<ScrollUpdate> {
        if self.positions[origin.slot()] == position {
            return Vec::new();
        }
        self.positions[origin.slot()] = position;

        let mut updates = Vec::with_capacity(2);
        for pane in Pane::ALL {
            if pane == origin || self.positions[pane.slot()] == position {
                continue;
            }
            self.positions[pane.slot()] = position;
            updates.push(ScrollUpdate { pane, position });
        }
        updates
    }

    /// Forward the original and new spans of a conflict to their panes.
    pub fn focus(&mut self, target: &NavTarget) -> Vec<ScrollUpdate> {
        let mut updates = Vec::new();
        for (pane, span) in [(Pane::Original, target.original), (Pane::New, target.new)] {
            let Some(span) = span else { continue };
            let line = span.first_line();
            if self.positions[pane.slot()] != line {
                self.positions[pane.slot()] = line;
                updates.push(ScrollUpdate { pane, position: line });
            }
        }
        updates
    }
}
