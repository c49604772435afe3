//! A merge session: one registry, one cursor, one accumulated result.
//!
//! Sessions are plain values. Nothing is shared between them, and a host
//! that drives a session from several threads must serialise access itself.

use serde::Serialize;
use splice_diff::{extract, split_lines, LineTag};
use tracing::{debug, info};

use crate::config::{KeyOrder, SpliceConfig};
use crate::error::{MergeError, MergeResult};
use crate::navigation::{range_for, NavTarget};
use crate::registry::DiffRegistry;
use crate::resolver::{resolve, MergeCursor, Side};

/// Lifecycle of a [`MergeSession`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No diff has been computed yet.
    Idle,
    /// Conflicts remain under or after the cursor.
    Resolving,
    /// Every record has been consumed.
    Done,
}

/// Status reported by [`MergeSession::resolve_side`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveStatus {
    /// The cursor is parked on another conflict.
    ConflictsRemaining,
    /// This call consumed the last record.
    AllResolved,
    /// Nothing was left to resolve; the session is unchanged.
    NoMoreConflicts,
}

/// Result of one [`MergeSession::resolve_side`] call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolveOutcome {
    pub status: ResolveStatus,
    /// Text this call appended to the merge output.
    pub appended: String,
    /// Cursor position after the call.
    pub cursor: MergeCursor,
}

/// Interactive two-way merge over a block diff.
#[derive(Debug, Default)]
pub struct MergeSession {
    config: SpliceConfig,
    registry: Option<DiffRegistry>,
    cursor: MergeCursor,
    output: String,
}

impl MergeSession {
    /// Create an idle session. The configuration is validated first.
    pub fn new(config: SpliceConfig) -> MergeResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    pub fn config(&self) -> &SpliceConfig {
        &self.config
    }

    /// Replace the configuration; takes effect on the next
    /// [`compute`](Self::compute). An invalid configuration is rejected and
    /// the current one kept.
    pub fn set_config(&mut self, config: SpliceConfig) -> MergeResult<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn state(&self) -> SessionState {
        match &self.registry {
            None => SessionState::Idle,
            Some(registry) if self.cursor.is_done(registry) => SessionState::Done,
            Some(_) => SessionState::Resolving,
        }
    }

    pub fn registry(&self) -> Option<&DiffRegistry> {
        self.registry.as_ref()
    }

    pub fn cursor(&self) -> MergeCursor {
        self.cursor
    }

    /// Conflict labels in registry order; empty while idle.
    pub fn labels(&self) -> Vec<&str> {
        self.registry
            .as_ref()
            .map(DiffRegistry::labels)
            .unwrap_or_default()
    }

    /// The accumulated merge result.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Take the merge result, leaving the output empty.
    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    /// Discard the merge result without touching the cursor.
    pub fn clear_output(&mut self) {
        self.output.clear();
    }

    /// Diff two documents, discarding all previous session state.
    ///
    /// Resets the cursor and runs the auto-accept pass: the leading context
    /// lines of every record are appended to the (cleared) output. When
    /// the documents produce no conflicts the driving side's text is
    /// reproduced verbatim and the session is immediately done.
    pub fn compute(&mut self, original: &str, new: &str) -> SessionState {
        let left = extract(original, &self.config.boundary_tokens);
        let right = extract(new, &self.config.boundary_tokens);
        let registry = DiffRegistry::build(&left, &right, self.config.key_order, self.config.diff_options());

        self.output.clear();
        self.cursor = MergeCursor::default();

        if registry.is_empty() {
            let driver = match self.config.key_order {
                KeyOrder::Original => original,
                KeyOrder::New => new,
            };
            self.append_text(driver);
        } else {
            for record in &registry {
                let leading = record
                    .lines
                    .iter()
                    .take_while(|l| l.tag == LineTag::Context);
                for line in leading {
                    self.output.push_str(&line.text);
                    self.output.push_str(&self.config.line_terminator);
                }
            }
        }

        debug!(
            conflicts = registry.len(),
            auto_accepted = self.output.len(),
            "computed diff"
        );
        self.registry = Some(registry);
        self.state()
    }

    /// Append raw document text, lines joined by the session terminator.
    ///
    /// Uses the source lines rather than the block map, so blocks shadowed
    /// by a duplicate key are kept and a trailing newline is not doubled.
    fn append_text(&mut self, text: &str) {
        for (i, line) in split_lines(text).into_iter().enumerate() {
            if i > 0 {
                self.output.push_str(&self.config.line_terminator);
            }
            self.output.push_str(line);
        }
    }

    /// Accept `side` at the current conflict and advance to the next one.
    pub fn resolve_side(&mut self, side: Side) -> ResolveOutcome {
        let Some(registry) = self.registry.as_ref().filter(|r| !self.cursor.is_done(r)) else {
            debug!(%side, "no more conflicts");
            return ResolveOutcome {
                status: ResolveStatus::NoMoreConflicts,
                appended: String::new(),
                cursor: self.cursor,
            };
        };

        let resolution = resolve(registry, &mut self.cursor, side);
        let done = self.cursor.is_done(registry);

        let mut appended = String::new();
        for line in &resolution.accepted {
            appended.push_str(line);
            appended.push_str(&self.config.line_terminator);
        }
        self.output.push_str(&appended);

        debug!(
            %side,
            accepted = resolution.accepted.len(),
            rejected = resolution.rejected,
            diff_index = self.cursor.diff_index,
            line_index = self.cursor.line_index,
            "resolved conflict"
        );

        let status = if done {
            info!("all conflicts resolved");
            ResolveStatus::AllResolved
        } else {
            ResolveStatus::ConflictsRemaining
        };
        ResolveOutcome {
            status,
            appended,
            cursor: self.cursor,
        }
    }

    /// Keep accepting `side` until the session is done. Returns the number
    /// of resolve calls made.
    pub fn resolve_all(&mut self, side: Side) -> usize {
        let mut calls = 0;
        loop {
            match self.resolve_side(side).status {
                ResolveStatus::NoMoreConflicts => break,
                ResolveStatus::AllResolved => {
                    calls += 1;
                    break;
                }
                ResolveStatus::ConflictsRemaining => calls += 1,
            }
        }
        calls
    }

    // ---------------------------------------------------------------
    // Navigation
    // ---------------------------------------------------------------

    /// Source spans of the record at `index`.
    pub fn range_for(&self, index: usize) -> MergeResult<NavTarget> {
        match &self.registry {
            Some(registry) => range_for(registry, index),
            None => Err(MergeError::IndexOutOfRange { index, len: 0 }),
        }
    }

    /// Spans of the record under the cursor, `None` when idle or done.
    pub fn current_target(&self) -> Option<NavTarget> {
        self.range_for(self.cursor.diff_index).ok()
    }

    /// Move the cursor to the start of the conflict with this key.
    ///
    /// Scanning restarts from the record's first line; earlier progress
    /// inside that record is not kept. An unknown key leaves the cursor
    /// untouched.
    pub fn jump_to(&mut self, key: &str) -> MergeResult<NavTarget> {
        let index = self
            .registry
            .as_ref()
            .and_then(|r| r.index_of(key))
            .ok_or_else(|| MergeError::KeyNotFound(key.to_string()))?;
        self.jump_to_index(index)
    }

    /// Move the cursor to the start of the conflict at `index`.
    pub fn jump_to_index(&mut self, index: usize) -> MergeResult<NavTarget> {
        let target = self.range_for(index)?;
        self.cursor = MergeCursor {
            diff_index: index,
            line_index: 0,
        };
        debug!(index, key = %target.key, "jumped to conflict");
        Ok(target)
    }

    /// Step to the following conflict, if there is one.
    pub fn next_conflict(&mut self) -> Option<NavTarget> {
        let len = self.registry.as_ref().map_or(0, DiffRegistry::len);
        let next = self.cursor.diff_index + 1;
        if next >= len {
            return None;
        }
        self.jump_to_index(next).ok()
    }

    /// Step to the preceding conflict, if there is one.
    pub fn previous_conflict(&mut self) -> Option<NavTarget> {
        let previous = self.cursor.diff_index.checked_sub(1)?;
        self.jump_to_index(previous).ok()
    }
}
