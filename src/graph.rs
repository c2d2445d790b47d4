//! # Block Graph
//!
//! In-memory model of a visual block program.
//!
//! A program is a set of [`Block`]s addressed by [`BlockId`]. Blocks refer to
//! each other only by id:
//!
//! - each [`Socket`] may name the child block plugged into it
//! - `next` names the following statement in the same sequence
//!
//! The compiler never follows these ids blindly. [`BlockId::NULL`] is a
//! reserved id meaning "nothing here", and a lookup of an unknown id simply
//! yields `None`.
//!
//! ## Example
//!
//! ```rust
//! use blockscript::graph::{Block, GraphBuilder, Socket};
//!
//! let mut builder = GraphBuilder::new();
//! let target = builder.add(Block::new("string").with_label("button.png"));
//! let click = builder.add(Block::new("click").with_socket(Socket::any("target").connected_to(target)));
//! let graph = builder.build();
//!
//! assert_eq!(graph.get(click).map(|b| b.genus.as_str()), Some("click"));
//! ```

use crate::error::{GraphError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::path::Path;

/// Value of a boolean-like block property that counts as "set"
pub const PROPERTY_YES: &str = "yes";

/// Socket kind that links with any other kind
pub const ANY_KIND: &str = "any";

/// Stable identifier of a block inside one graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub u64);

impl BlockId {
    /// Reserved id that never names a block
    pub const NULL: BlockId = BlockId(0);

    pub fn is_null(self) -> bool {
        self == Self::NULL
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A typed connection point on a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Socket {
    #[serde(default)]
    pub name: String,

    #[serde(default = "default_kind")]
    pub kind: String,

    /// Block plugged into this socket, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<BlockId>,
}

fn default_kind() -> String {
    ANY_KIND.to_string()
}

impl Socket {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            block: None,
        }
    }

    /// An empty socket of kind `any`
    pub fn any(name: impl Into<String>) -> Self {
        Self::new(name, ANY_KIND)
    }

    pub fn connected_to(mut self, block: BlockId) -> Self {
        self.block = Some(block);
        self
    }

    /// True when the socket carries any id at all, even an unusable one
    pub fn has_block(&self) -> bool {
        self.block.is_some()
    }
}

/// One node of a block program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    #[serde(default = "null_id")]
    pub id: BlockId,

    /// Block kind; selects the compile rule
    pub genus: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,

    /// Ordered argument slots; position is meaning
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sockets: Vec<Socket>,

    /// Connector by which this block attaches to a parent socket
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plug: Option<Socket>,

    /// Following statement in the same sequence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<BlockId>,
}

fn null_id() -> BlockId {
    BlockId::NULL
}

impl Block {
    /// Create a block with no id yet (see [`GraphBuilder::add`])
    pub fn new(genus: impl Into<String>) -> Self {
        Self {
            id: BlockId::NULL,
            genus: genus.into(),
            label: None,
            properties: BTreeMap::new(),
            sockets: Vec::new(),
            plug: None,
            next: None,
        }
    }

    pub fn with_id(mut self, id: BlockId) -> Self {
        self.id = id;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_socket(mut self, socket: Socket) -> Self {
        self.sockets.push(socket);
        self
    }

    /// Append `count` empty `any` sockets
    pub fn with_empty_sockets(mut self, count: usize) -> Self {
        for index in 0..count {
            self.sockets.push(Socket::any(format!("arg{}", index)));
        }
        self
    }

    pub fn with_plug(mut self, plug: Socket) -> Self {
        self.plug = Some(plug);
        self
    }

    pub fn with_next(mut self, next: BlockId) -> Self {
        self.next = Some(next);
        self
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// True when `key` is present with the value `yes`
    pub fn flag(&self, key: &str) -> bool {
        self.property(key) == Some(PROPERTY_YES)
    }

    pub fn socket(&self, index: usize) -> Option<&Socket> {
        self.sockets.get(index)
    }

    /// Label with every whitespace character removed
    pub fn compact_label(&self) -> String {
        self.label
            .as_deref()
            .unwrap_or_default()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect()
    }
}

/// Read access to blocks by id
///
/// This is the only capability the compiler needs from whatever owns the
/// program. Callers must not mutate the graph while a compile pass runs.
pub trait BlockLookup {
    /// Resolve an id. Must return `None` for [`BlockId::NULL`].
    fn block(&self, id: BlockId) -> Option<&Block>;

    /// Whether `id` may be resolved
    fn is_valid_id(&self, id: BlockId) -> bool {
        !id.is_null() && self.block(id).is_some()
    }
}

/// Ordered arena of blocks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GraphDocument", into = "GraphDocument")]
pub struct BlockGraph {
    blocks: Vec<Block>,
    index: HashMap<BlockId, usize>,
}

/// On-disk shape of a block graph
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct GraphDocument {
    #[serde(default)]
    blocks: Vec<Block>,
}

impl TryFrom<GraphDocument> for BlockGraph {
    type Error = GraphError;

    fn try_from(document: GraphDocument) -> Result<Self> {
        BlockGraph::from_blocks(document.blocks)
    }
}

impl From<BlockGraph> for GraphDocument {
    fn from(graph: BlockGraph) -> Self {
        GraphDocument {
            blocks: graph.blocks,
        }
    }
}

impl BlockGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph, keeping the given order as document order
    pub fn from_blocks(blocks: impl IntoIterator<Item = Block>) -> Result<Self> {
        let mut graph = Self::new();
        for block in blocks {
            graph.insert(block)?;
        }
        Ok(graph)
    }

    /// Add a block at the end of document order
    pub fn insert(&mut self, block: Block) -> Result<()> {
        if block.id.is_null() {
            return Err(GraphError::ReservedId(block.id));
        }
        if self.index.contains_key(&block.id) {
            return Err(GraphError::DuplicateBlock(block.id));
        }
        self.index.insert(block.id, self.blocks.len());
        self.blocks.push(block);
        Ok(())
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.index.get(&id).map(|&position| &self.blocks[position])
    }

    /// Private so that a block's `id` always matches its index entry
    fn get_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        let position = *self.index.get(&id)?;
        self.blocks.get_mut(position)
    }

    /// Blocks in document order
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Ids that are the `next` target of some block
    pub fn successors(&self) -> HashSet<BlockId> {
        self.blocks
            .iter()
            .filter_map(|block| block.next)
            .filter(|id| !id.is_null())
            .collect()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a graph from a JSON document on disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("[BSC] Loading block document {}", path.display());
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }
}

impl BlockLookup for BlockGraph {
    fn block(&self, id: BlockId) -> Option<&Block> {
        if id.is_null() {
            return None;
        }
        self.get(id)
    }

    fn is_valid_id(&self, id: BlockId) -> bool {
        !id.is_null() && self.index.contains_key(&id)
    }
}

/// Convenience builder that hands out fresh ids
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: BlockGraph,
    last_id: u64,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `block` under a fresh id and return that id
    pub fn add(&mut self, mut block: Block) -> BlockId {
        self.last_id += 1;
        let id = BlockId(self.last_id);
        block.id = id;
        self.graph.index.insert(id, self.graph.blocks.len());
        self.graph.blocks.push(block);
        id
    }

    /// Plug `child` into socket `socket` of `parent`, growing the socket list if needed
    pub fn connect(&mut self, parent: BlockId, socket: usize, child: BlockId) -> &mut Self {
        if let Some(block) = self.graph.get_mut(parent) {
            while block.sockets.len() <= socket {
                let name = format!("arg{}", block.sockets.len());
                block.sockets.push(Socket::any(name));
            }
            block.sockets[socket].block = Some(child);
        }
        self
    }

    /// Link the given blocks into one statement sequence
    pub fn chain(&mut self, ids: &[BlockId]) -> &mut Self {
        for pair in ids.windows(2) {
            if let Some(block) = self.graph.get_mut(pair[0]) {
                block.next = Some(pair[1]);
            }
        }
        self
    }

    /// Replace the label of `id`
    pub fn set_label(&mut self, id: BlockId, label: impl Into<String>) -> &mut Self {
        if let Some(block) = self.graph.get_mut(id) {
            block.label = Some(label.into());
        }
        self
    }

    pub fn build(self) -> BlockGraph {
        self.graph
    }
}

/// Link rule for `any`-kind connectors
///
/// Two connectors may link when both are empty, exactly one of them is its
/// block's plug, and at least one of them has kind `any`.
pub fn can_link(a: &Block, a_connector: &Socket, b: &Block, b_connector: &Socket) -> bool {
    if a_connector.has_block() || b_connector.has_block() {
        return false;
    }

    let a_is_plug = a.plug.as_ref().is_some_and(|plug| std::ptr::eq(plug, a_connector));
    let b_is_plug = b.plug.as_ref().is_some_and(|plug| std::ptr::eq(plug, b_connector));
    if a_is_plug == b_is_plug {
        return false;
    }

    a_connector.kind == ANY_KIND || b_connector.kind == ANY_KIND
}
