//! Block extraction: split a document into keyed, contiguous line ranges.
//!
//! A block starts at every line whose trimmed text begins with one of the
//! configured [`BoundaryTokens`] and runs until the next boundary or the end
//! of input. Content before the first boundary is stored under
//! [`GLOBAL_KEY`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Key of the leading block that precedes the first boundary line.
pub const GLOBAL_KEY: &str = "global";

/// Split text into lines on `'\n'`.
///
/// A trailing newline yields a trailing empty line. The empty string has
/// zero lines.
pub fn split_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        Vec::new()
    } else {
        text.split('\n').collect()
    }
}

/// The set of leading tokens that open a new block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoundaryTokens(Vec<String>);

impl Default for BoundaryTokens {
    fn default() -> Self {
        Self::new(["def", "class", "import"])
    }
}

impl BoundaryTokens {
    /// Build a token set from any list of strings.
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(tokens.into_iter().map(Into::into).collect())
    }

    /// Returns `true` if the trimmed line starts with any token.
    ///
    /// Matching is a plain prefix test, so `define` matches `def`.
    pub fn is_boundary(&self, line: &str) -> bool {
        let trimmed = line.trim();
        self.0.iter().any(|token| trimmed.starts_with(token.as_str()))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Half-open range `[start, end)` of 0-based source line indices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineSpan {
    pub start: usize,
    pub end: usize,
}

impl LineSpan {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "line span start after end");
        Self { start, end }
    }

    /// An empty span positioned at `at`.
    pub fn empty(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// First line of the span (0-based).
    pub fn first_line(&self) -> usize {
        self.start
    }

    /// Last line of the span, inclusive, or `None` for an empty span.
    pub fn last_line(&self) -> Option<usize> {
        if self.is_empty() {
            None
        } else {
            Some(self.end - 1)
        }
    }

    pub fn contains(&self, line: usize) -> bool {
        self.start <= line && line < self.end
    }
}

/// A keyed, contiguous line range of a document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// The trimmed boundary line, or [`GLOBAL_KEY`].
    pub key: String,
    /// The block's lines joined with `'\n'`.
    pub content: String,
    /// Source lines covered by this block.
    pub span: LineSpan,
}

impl Block {
    /// A block with no content, used for the side of a key that is absent.
    pub fn empty(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            content: String::new(),
            span: LineSpan::empty(0),
        }
    }

    fn from_lines(key: String, lines: &[&str], start: usize) -> Self {
        Self {
            key,
            content: lines.join("\n"),
            span: LineSpan::new(start, start + lines.len()),
        }
    }

    /// The block's content split back into lines.
    ///
    /// A block holding a single empty source line has one (empty) line; only
    /// an empty span has none.
    pub fn lines(&self) -> Vec<&str> {
        if self.span.is_empty() {
            Vec::new()
        } else {
            self.content.split('\n').collect()
        }
    }

    pub fn line_count(&self) -> usize {
        self.span.len()
    }
}

/// Ordered mapping from block key to [`Block`].
///
/// Keys are unique. Inserting a key that is already present replaces the
/// stored block in place: the key keeps its original position and the
/// earlier block's content is lost.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockMap {
    blocks: Vec<Block>,
    positions: HashMap<String, usize>,
}

impl BlockMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a block, returning the block it replaced, if any.
    pub fn insert(&mut self, block: Block) -> Option<Block> {
        match self.positions.get(&block.key) {
            Some(&pos) => Some(std::mem::replace(&mut self.blocks[pos], block)),
            None => {
                self.positions.insert(block.key.clone(), self.blocks.len());
                self.blocks.push(block);
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Block> {
        self.positions.get(key).map(|&pos| &self.blocks[pos])
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.positions.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Blocks in key order.
    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().map(|b| b.key.as_str())
    }
}

impl<'a> IntoIterator for &'a BlockMap {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Split `text` into an ordered [`BlockMap`].
///
/// Never fails. Empty input yields a single empty [`GLOBAL_KEY`] block; a
/// boundary on the very first line yields no global block at all.
pub fn extract(text: &str, tokens: &BoundaryTokens) -> BlockMap {
    let lines = split_lines(text);
    let mut blocks = BlockMap::new();

    if lines.is_empty() {
        blocks.insert(Block::empty(GLOBAL_KEY));
        return blocks;
    }

    let mut key = GLOBAL_KEY.to_string();
    let mut start = 0usize;

    for (i, line) in lines.iter().enumerate() {
        if !tokens.is_boundary(line) {
            continue;
        }
        if i > start {
            insert_block(&mut blocks, Block::from_lines(key, &lines[start..i], start));
        }
        key = line.trim().to_string();
        start = i;
    }
    insert_block(&mut blocks, Block::from_lines(key, &lines[start..], start));

    debug!(lines = lines.len(), blocks = blocks.len(), "extracted blocks");
    blocks
}

fn insert_block(blocks: &mut BlockMap, block: Block) {
    let first_line = block.span.first_line();
    if let Some(previous) = blocks.insert(block) {
        warn!(
            key = %previous.key,
            dropped_at = previous.span.first_line(),
            kept_at = first_line,
            "duplicate block key, earlier block overwritten"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tokens() -> BoundaryTokens {
        BoundaryTokens::default()
    }

    #[test]
    fn empty_input_yields_empty_global_block() {
        let blocks = extract("", &tokens());
        assert_eq!(blocks.len(), 1);
        let global = blocks.get(GLOBAL_KEY).unwrap();
        assert!(global.content.is_empty());
        assert!(global.span.is_empty());
        assert_eq!(global.span.first_line(), 0);
        assert_eq!(global.span.last_line(), None);
    }

    #[test]
    fn text_without_boundaries_is_one_global_block() {
        let blocks = extract("x = 1\ny = 2", &tokens());
        assert_eq!(blocks.len(), 1);
        let global = blocks.get(GLOBAL_KEY).unwrap();
        assert_eq!(global.content, "x = 1\ny = 2");
        assert_eq!(global.span, LineSpan::new(0, 2));
    }

    #[test]
    fn boundary_on_first_line_has_no_global_block() {
        let blocks = extract("def f():\n    return 1", &tokens());
        assert_eq!(blocks.len(), 1);
        assert!(!blocks.contains_key(GLOBAL_KEY));
        let f = blocks.get("def f():").unwrap();
        assert_eq!(f.content, "def f():\n    return 1");
        assert_eq!(f.span.first_line(), 0);
        assert_eq!(f.span.last_line(), Some(1));
    }

    #[test]
    fn blocks_follow_source_order() {
        let text = "import os\n\nclass A:\n    pass\ndef g():\n    pass";
        let blocks = extract(text, &tokens());
        let keys: Vec<_> = blocks.keys().collect();
        assert_eq!(keys, vec!["import os", "class A:", "def g():"]);
        assert_eq!(blocks.get("import os").unwrap().span, LineSpan::new(0, 2));
        assert_eq!(blocks.get("class A:").unwrap().span, LineSpan::new(2, 4));
        assert_eq!(blocks.get("def g():").unwrap().span, LineSpan::new(4, 6));
    }

    #[test]
    fn leading_content_goes_to_global() {
        let blocks = extract("# header\ndef f():\n    pass", &tokens());
        let keys: Vec<_> = blocks.keys().collect();
        assert_eq!(keys, vec![GLOBAL_KEY, "def f():"]);
        assert_eq!(blocks.get(GLOBAL_KEY).unwrap().content, "# header");
    }

    #[test]
    fn indented_boundary_key_is_trimmed() {
        let blocks = extract("class A:\n    def m(self):\n        pass", &tokens());
        assert!(blocks.contains_key("def m(self):"));
        assert_eq!(
            blocks.get("def m(self):").unwrap().content,
            "    def m(self):\n        pass"
        );
    }

    #[test]
    fn trailing_newline_is_an_empty_last_line() {
        let blocks = extract("def f():\n    pass\n", &tokens());
        let f = blocks.get("def f():").unwrap();
        assert_eq!(f.line_count(), 3);
        assert_eq!(f.lines(), vec!["def f():", "    pass", ""]);
    }

    #[test]
    fn duplicate_key_keeps_only_the_last_block() {
        let text = "def f():\n    return 1\ndef g():\n    pass\ndef f():\n    return 2";
        let blocks = extract(text, &tokens());
        assert_eq!(blocks.len(), 2);
        let keys: Vec<_> = blocks.keys().collect();
        assert_eq!(keys, vec!["def f():", "def g():"]);
        let f = blocks.get("def f():").unwrap();
        assert_eq!(f.content, "def f():\n    return 2");
        assert_eq!(f.span, LineSpan::new(4, 6));
    }

    #[test]
    fn prefix_match_is_not_word_bounded() {
        let blocks = extract("x\ndefine = 3", &tokens());
        assert!(blocks.contains_key("define = 3"));
    }

    #[test]
    fn custom_tokens() {
        let tokens = BoundaryTokens::new(["fn ", "impl "]);
        let blocks = extract("use std;\nfn main() {}\nimpl X {}", &tokens);
        let keys: Vec<_> = blocks.keys().collect();
        assert_eq!(keys, vec![GLOBAL_KEY, "fn main() {}", "impl X {}"]);
    }

    #[test]
    fn tokens_serialize_as_a_plain_list() {
        let json = serde_json::to_string(&BoundaryTokens::default()).unwrap();
        assert_eq!(json, r#"["def","class","import"]"#);
    }

    fn source_line() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-z ]{0,8}",
            "(def|class|import) [a-z]{1,3}[0-9]{0,4}",
        ]
    }

    proptest! {
        #[test]
        fn spans_cover_every_line_once(lines in prop::collection::vec(source_line(), 1..40)) {
            // Unique headers so no block is overwritten.
            let lines: Vec<String> = lines
                .into_iter()
                .enumerate()
                .map(|(i, l)| if tokens().is_boundary(&l) { format!("{l}_{i}") } else { l })
                .collect();
            let text = lines.join("\n");
            let blocks = extract(&text, &tokens());

            let mut next = 0usize;
            let mut rebuilt = Vec::new();
            for block in &blocks {
                prop_assert_eq!(block.span.start, next);
                next = block.span.end;
                prop_assert_eq!(block.lines().len(), block.line_count());
                rebuilt.extend(block.lines().into_iter().map(str::to_string));
            }
            prop_assert_eq!(next, split_lines(&text).len());
            prop_assert_eq!(rebuilt.join("\n"), text);
        }
    }
}
