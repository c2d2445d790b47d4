//! # Errors
//!
//! Two families of errors exist:
//!
//! - [`CompileError`] - problems found while walking a block tree. These are
//!   *diagnostics*: the compiler records them, substitutes default text and
//!   keeps going, because half-edited programs are the normal state of a
//!   visual editor.
//! - [`GraphError`] - problems with a block document itself (bad JSON,
//!   duplicate ids). These are returned as `Err` by the loading functions.

use crate::graph::BlockId;
use thiserror::Error;

/// A problem encountered while compiling a block tree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// No rule is registered for the block's genus
    #[error("unsupported block genus '{genus}' (block {block})")]
    UnsupportedGenus { block: BlockId, genus: String },

    /// A socket or `next` link names the null id or a block that does not exist
    #[error("block {block} references unusable block id {target}")]
    MalformedReference { block: BlockId, target: BlockId },

    /// A block was reached again while it was still being compiled
    #[error("cyclic block structure detected at block {block}")]
    CyclicStructure { block: BlockId },

    /// A statement sequence is longer than `max_chain_length`; `block` is the first one dropped
    #[error("statement sequence exceeds {limit} blocks, cut at block {block}")]
    ChainTooLong { block: BlockId, limit: usize },
}

/// A problem with a block document
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("invalid block document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to access block document: {0}")]
    Io(#[from] std::io::Error),

    #[error("duplicate block id {0}")]
    DuplicateBlock(BlockId),

    #[error("block id {0} is reserved and cannot name a block")]
    ReservedId(BlockId),
}

pub type Result<T, E = GraphError> = std::result::Result<T, E>;
