//! The ordered conflict registry.
//!
//! Records live in a flat arena indexed by position; a key lookup table is
//! built once alongside it. Both are immutable after [`DiffRegistry::build`].

use std::collections::HashMap;

use serde::Serialize;
use splice_diff::{diff_lines, extract, has_changes, Block, BlockMap, DiffLine, DiffOptions, DiffStats};
use tracing::debug;

use crate::config::{KeyOrder, SpliceConfig};

/// A block pair that differs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DiffRecord {
    /// The shared block key, also used as the conflict's label.
    pub key: String,
    /// The original side's block, `None` if the key is absent there.
    pub original: Option<Block>,
    /// The new side's block, `None` if the key is absent there.
    pub new: Option<Block>,
    /// Tagged line listing. Always contains a removed or added line.
    pub lines: Vec<DiffLine>,
}

impl DiffRecord {
    pub fn label(&self) -> &str {
        &self.key
    }

    pub fn stats(&self) -> DiffStats {
        DiffStats::of(&self.lines)
    }
}

/// Ordered mapping of block key to [`DiffRecord`], conflicts only.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiffRegistry {
    records: Vec<DiffRecord>,
    positions: HashMap<String, usize>,
    order: KeyOrder,
}

impl DiffRegistry {
    /// Pair blocks by key and keep those whose contents differ.
    ///
    /// Keys are visited in the block order of the side named by `order`; a
    /// block missing on the other side diffs against empty content.
    pub fn build(
        original: &BlockMap,
        new: &BlockMap,
        order: KeyOrder,
        options: DiffOptions,
    ) -> Self {
        let driver = match order {
            KeyOrder::Original => original,
            KeyOrder::New => new,
        };

        let mut registry = Self {
            order,
            ..Self::default()
        };

        for key in driver.keys() {
            let left = original.get(key);
            let right = new.get(key);
            let left_lines = left.map(Block::lines).unwrap_or_default();
            let right_lines = right.map(Block::lines).unwrap_or_default();

            let lines = diff_lines(&left_lines, &right_lines, options);
            if !has_changes(&lines) {
                continue;
            }

            registry.positions.insert(key.to_string(), registry.records.len());
            registry.records.push(DiffRecord {
                key: key.to_string(),
                original: left.cloned(),
                new: right.cloned(),
                lines,
            });
        }

        debug!(
            visited = driver.len(),
            conflicts = registry.records.len(),
            ?order,
            "built diff registry"
        );
        registry
    }

    /// Extract blocks from both texts and build the registry.
    pub fn from_texts(original: &str, new: &str, config: &SpliceConfig) -> Self {
        let left = extract(original, &config.boundary_tokens);
        let right = extract(new, &config.boundary_tokens);
        Self::build(&left, &right, config.key_order, config.diff_options())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn order(&self) -> KeyOrder {
        self.order
    }

    pub fn get(&self, index: usize) -> Option<&DiffRecord> {
        self.records.get(index)
    }

    pub fn get_by_key(&self, key: &str) -> Option<&DiffRecord> {
        self.index_of(key).map(|i| &self.records[i])
    }

    /// Position of the record with this key.
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.positions.get(key).copied()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DiffRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[DiffRecord] {
        &self.records
    }

    /// Human-readable labels in registry order.
    pub fn labels(&self) -> Vec<&str> {
        self.records.iter().map(DiffRecord::label).collect()
    }

    /// Summed line counts of every record.
    pub fn stats(&self) -> DiffStats {
        let mut total = DiffStats::default();
        for record in &self.records {
            total += record.stats();
        }
        total
    }

    /// Number of listing lines across all records.
    pub fn total_lines(&self) -> usize {
        self.records.iter().map(|r| r.lines.len()).sum()
    }
}

impl<'a> IntoIterator for &'a DiffRegistry {
    type Item = &'a DiffRecord;
    type IntoIter = std::slice::Iter<'a, DiffRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
