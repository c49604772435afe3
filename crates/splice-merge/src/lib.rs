//! Merge engine for splice.
//!
//! Pairs the blocks of two documents by key, keeps the pairs that differ in
//! an ordered [`DiffRegistry`], and resolves them interactively one side at
//! a time through a [`MergeSession`].
//!
//! # Key Types
//!
//! - [`MergeSession`] -- Registry, cursor and merge output for one diff
//! - [`DiffRegistry`] / [`DiffRecord`] -- Ordered conflicts, keyed by block
//! - [`MergeCursor`] / [`Side`] -- Resolution position and side selection
//! - [`NavTarget`] / [`ViewSync`] -- Source line ranges and scroll sync
//! - [`SpliceConfig`] -- Boundary tokens, key order, line terminator

pub mod config;
pub mod error;
pub mod navigation;
pub mod registry;
pub mod resolver;
pub mod session;

pub use config::{KeyOrder, SpliceConfig};
pub use error::{MergeError, MergeResult};
pub use navigation::{range_for, NavTarget, Pane, ScrollUpdate, ViewSync};
pub use registry::{DiffRecord, DiffRegistry};
pub use resolver::{resolve, MergeCursor, Resolution, Side};
pub use session::{MergeSession, ResolveOutcome, ResolveStatus, SessionState};
