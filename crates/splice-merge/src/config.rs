use serde::{Deserialize, Serialize};
use splice_diff::{BoundaryTokens, DiffOptions};

use crate::error::{MergeError, MergeResult};

/// Which document's block order drives registry construction.
///
/// Keys that exist only in the other document are never visited.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyOrder {
    /// Iterate the original (left) document's blocks.
    Original,
    /// Iterate the new (right) document's blocks.
    #[default]
    New,
}

/// Configuration for a merge session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpliceConfig {
    /// Leading tokens that open a new block.
    pub boundary_tokens: BoundaryTokens,
    /// Which side's block order drives the registry.
    pub key_order: KeyOrder,
    /// Appended after every line written to the merge output.
    pub line_terminator: String,
    /// Emit intraline hint lines in diff listings.
    pub hints: bool,
}

impl Default for SpliceConfig {
    fn default() -> Self {
        Self {
            boundary_tokens: BoundaryTokens::default(),
            key_order: KeyOrder::default(),
            line_terminator: "\n".to_string(),
            hints: true,
        }
    }
}

impl SpliceConfig {
    /// Parse a TOML document. Missing fields take their defaults.
    pub fn from_toml_str(s: &str) -> MergeResult<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> MergeResult<String> {
        Ok(toml::to_string(self)?)
    }

    /// Reject configurations the extractor or resolver cannot use.
    pub fn validate(&self) -> MergeResult<()> {
        if self.boundary_tokens.is_empty() {
            return Err(MergeError::Config("boundary_tokens must not be empty".into()));
        }
        if self.boundary_tokens.as_slice().iter().any(|t| t.trim().is_empty()) {
            // A blank token would match every line.
            return Err(MergeError::Config("boundary_tokens must not contain blank tokens".into()));
        }
        if self.line_terminator.is_empty() {
            return Err(MergeError::Config("line_terminator must not be empty".into()));
        }
        Ok(())
    }

    pub fn diff_options(&self) -> DiffOptions {
        DiffOptions { hints: self.hints }
    }
}
