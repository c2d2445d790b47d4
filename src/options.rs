//! # Compiler Options
//!
//! Knobs for text assembly and root selection. Options are plain data and
//! can be loaded from JSON; every field has a default.

use serde::{Deserialize, Serialize};

/// Compiler options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    /// One level of indentation in the generated script
    pub indent: String,

    /// Lines emitted after the import lines, before any compiled root
    pub prelude: Vec<String>,

    /// Property marking a block as a compilation root
    pub root_property: String,

    /// Property marking a root whose output must come last
    pub top_level_property: String,

    /// Upper bound on the length of a single statement sequence
    pub max_chain_length: usize,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            indent: "\t".to_string(),
            prelude: vec!["setThrowException(False)".to_string()],
            root_property: "is-root-block".to_string(),
            top_level_property: "yields-top-level-code".to_string(),
            max_chain_length: 10_000,
        }
    }
}

impl CompilerOptions {
    /// Options without any prelude lines
    pub fn bare() -> Self {
        Self {
            prelude: Vec::new(),
            ..Default::default()
        }
    }

    /// Options using `width` spaces per indentation level
    pub fn with_space_indent(width: usize) -> Self {
        Self {
            indent: " ".repeat(width),
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
