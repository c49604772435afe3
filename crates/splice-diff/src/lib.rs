//! Block extraction and line diffing for the splice merge engine.
//!
//! Documents are split into keyed blocks by a small set of leading boundary
//! tokens, and blocks sharing a key are compared line by line. Neither step
//! can fail on arbitrary text.
//!
//! # Key Types
//!
//! - [`Block`] / [`BlockMap`] / [`LineSpan`] -- Keyed line ranges of a document
//! - [`BoundaryTokens`] -- Leading tokens that open a block
//! - [`DiffLine`] / [`LineTag`] -- Tagged line listing of a block pair
//! - [`DiffStats`] -- Line counts of a listing

pub mod block;
pub mod line_diff;

pub use block::{extract, split_lines, Block, BlockMap, BoundaryTokens, LineSpan, GLOBAL_KEY};
pub use line_diff::{
    diff_lines, diff_texts, has_changes, DiffLine, DiffOptions, DiffStats, LineTag, HINT_CUTOFF,
};
