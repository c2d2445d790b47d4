//! # Block Program Compiler
//!
//! Main entry points for compiling block programs to script text.
//!
//! A program is assembled from independently compiled *roots*: blocks that
//! carry the root property and are not the `next` of another block. Roots
//! that carry the top-level property (sequential top-level code such as
//! `runOnce`) are moved behind every other root, because top-level code may
//! call functions that the other roots define.

use crate::codegen::BlockCompiler;
use crate::error::CompileError;
use crate::graph::{BlockGraph, BlockId, BlockLookup};
use crate::options::CompilerOptions;
use crate::registry::GenusRegistry;
use std::collections::BTreeSet;

/// Output of compiling a single root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledScript {
    /// Compiled text, without import lines
    pub source: String,

    /// Modules the text needs, sorted
    pub required_modules: BTreeSet<String>,

    /// Problems that were worked around
    pub diagnostics: Vec<CompileError>,
}

impl CompiledScript {
    /// `import` lines followed by the compiled text
    pub fn to_script(&self) -> String {
        format!("{}{}", import_preamble(&self.required_modules), self.source)
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Fail with the first diagnostic, if any
    pub fn into_result(self) -> Result<Self, CompileError> {
        match self.diagnostics.first() {
            Some(error) => Err(error.clone()),
            None => Ok(self),
        }
    }
}

/// Roots of a program, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootSelection {
    pub ordinary: Vec<BlockId>,

    /// Top-level code roots, emitted after all ordinary roots
    pub deferred: Vec<BlockId>,
}

impl RootSelection {
    pub fn len(&self) -> usize {
        self.ordinary.len() + self.deferred.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ordinary roots first, then deferred ones
    pub fn in_output_order(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.ordinary.iter().chain(self.deferred.iter()).copied()
    }
}

/// Compilation statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileStats {
    /// Blocks in the input graph
    pub input_blocks: usize,

    /// Roots compiled, deferred ones included
    pub roots: usize,

    pub deferred_roots: usize,

    /// Blocks a rule was applied to
    pub blocks_compiled: usize,

    pub diagnostics: usize,

    /// Size of the assembled program in bytes
    pub generated_bytes: usize,
}

/// Output of compiling a whole program
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledProgram {
    /// Complete program: imports, prelude, then every root
    pub source: String,

    pub required_modules: BTreeSet<String>,

    pub diagnostics: Vec<CompileError>,

    pub stats: CompileStats,
}

/// Compile one root with the standard registry and default options
///
/// # Examples
///
/// ```rust
/// use blockscript::compile_block;
/// use blockscript::graph::{Block, GraphBuilder, Socket};
///
/// let mut builder = GraphBuilder::new();
/// let four = builder.add(Block::new("number").with_label("4"));
/// let root = builder.add(Block::new("sqrt").with_socket(Socket::any("x").connected_to(four)));
/// let graph = builder.build();
///
/// let script = compile_block(&graph, root);
/// assert_eq!(script.source, "math.sqrt(4)");
/// assert_eq!(script.to_script(), "import math\nmath.sqrt(4)");
/// ```
pub fn compile_block(graph: &dyn BlockLookup, root: BlockId) -> CompiledScript {
    compile_block_with(graph, root, GenusRegistry::standard(), &CompilerOptions::default())
}

/// Compile one root with an explicit registry and options
///
/// # Arguments
///
/// * `graph` - Lookup used to resolve child and `next` ids
/// * `root` - The block to compile
/// * `registry` - Rules for every genus the tree may contain
/// * `options` - Indentation and chain limits
///
/// # Returns
///
/// The compiled text without import lines, plus the modules it needs and any
/// diagnostics. Use [`CompiledScript::to_script`] to get runnable text.
pub fn compile_block_with(
    graph: &dyn BlockLookup,
    root: BlockId,
    registry: &GenusRegistry,
    options: &CompilerOptions,
) -> CompiledScript {
    let mut compiler = BlockCompiler::new(graph, registry, options);
    let source = compiler.compile_id(root);
    let (required_modules, diagnostics) = compiler.finish();

    CompiledScript {
        source,
        required_modules,
        diagnostics,
    }
}

/// Pick the roots of `graph` according to the properties named in `options`
pub fn select_roots(graph: &BlockGraph, options: &CompilerOptions) -> RootSelection {
    let successors = graph.successors();
    let mut selection = RootSelection::default();

    for block in graph.blocks() {
        if !block.flag(&options.root_property) || successors.contains(&block.id) {
            continue;
        }
        if block.flag(&options.top_level_property) {
            selection.deferred.push(block.id);
        } else {
            selection.ordinary.push(block.id);
        }
    }

    tracing::debug!(
        "[BSC] Selected {} roots ({} deferred top-level)",
        selection.len(),
        selection.deferred.len()
    );
    selection
}

/// Compile every root of `graph` into one program
///
/// # Examples
///
/// ```rust
/// use blockscript::compile_program;
/// use blockscript::graph::{Block, GraphBuilder};
///
/// let mut builder = GraphBuilder::new();
/// builder.add(Block::new("comment").with_label("hello").with_property("is-root-block", "yes"));
/// let graph = builder.build();
///
/// let program = compile_program(&graph);
/// assert_eq!(program.source, "setThrowException(False)\n\n# hello\n");
/// ```
pub fn compile_program(graph: &BlockGraph) -> CompiledProgram {
    compile_program_with_options(graph, &CompilerOptions::default())
}

/// Compile every root of `graph` with the standard registry and the given options
pub fn compile_program_with_options(graph: &BlockGraph, options: &CompilerOptions) -> CompiledProgram {
    compile_program_with(graph, GenusRegistry::standard(), options)
}

/// Compile every root of `graph` with an explicit registry and options
///
/// Roots are chosen with [`select_roots`] and compiled with [`compile_roots`].
///
/// # Arguments
///
/// * `graph` - The block program to compile
/// * `registry` - Rules for every genus; use [`GenusRegistry::standard`] for the built-in set
/// * `options` - Indentation, prelude and the property keys that mark roots
///
/// # Returns
///
/// The assembled program with its required modules, diagnostics and
/// statistics. Compilation never fails as a whole; problems are listed in
/// `diagnostics`.
pub fn compile_program_with(
    graph: &BlockGraph,
    registry: &GenusRegistry,
    options: &CompilerOptions,
) -> CompiledProgram {
    tracing::info!("[BSC] Starting block compilation ({} blocks)", graph.len());

    tracing::info!("[BSC] Phase 1: Selecting roots...");
    let roots = select_roots(graph, options);

    tracing::info!("[BSC] Phase 2: Generating script...");
    let mut program = compile_roots(graph, &roots, registry, options);
    program.stats.input_blocks = graph.len();
    program
}

/// Compile an explicit root selection over any block lookup
///
/// All roots share one pass, so required modules are collected once for the
/// whole program and imported once.
///
/// # Arguments
///
/// * `graph` - Lookup used to resolve every root and its children
/// * `roots` - Roots to compile; ordinary roots are emitted before deferred ones
/// * `registry` - Rules for every genus the roots may contain
/// * `options` - Indentation and prelude
///
/// # Returns
///
/// The program text (imports, prelude, then one section per root that
/// produced code), with modules, diagnostics and statistics. `input_blocks`
/// is left at zero since an arbitrary lookup cannot be counted.
pub fn compile_roots(
    graph: &dyn BlockLookup,
    roots: &RootSelection,
    registry: &GenusRegistry,
    options: &CompilerOptions,
) -> CompiledProgram {
    let mut compiler = BlockCompiler::new(graph, registry, options);

    let mut sections = Vec::with_capacity(roots.len());
    for root in roots.in_output_order() {
        let text = compiler.compile_id(root);
        let text = text.trim_end_matches('\n');
        if text.trim().is_empty() {
            tracing::debug!("[BSC] Root {} produced no code", root);
            continue;
        }
        sections.push(text.to_string());
    }

    let blocks_compiled = compiler.blocks_compiled();
    let (required_modules, diagnostics) = compiler.finish();

    let mut source = import_preamble(&required_modules);
    for line in &options.prelude {
        source.push_str(line);
        source.push('\n');
    }
    if !source.is_empty() && !sections.is_empty() {
        source.push('\n');
    }
    if !sections.is_empty() {
        source.push_str(&sections.join("\n\n"));
        source.push('\n');
    }

    if !diagnostics.is_empty() {
        tracing::warn!("[BSC] Compiled with {} diagnostics", diagnostics.len());
    }
    tracing::info!("[BSC] Code generation complete ({} bytes)", source.len());

    let stats = CompileStats {
        input_blocks: 0,
        roots: roots.len(),
        deferred_roots: roots.deferred.len(),
        blocks_compiled,
        diagnostics: diagnostics.len(),
        generated_bytes: source.len(),
    };

    CompiledProgram {
        source,
        required_modules,
        diagnostics,
        stats,
    }
}

/// One `import <module>` line per module
pub fn import_preamble(modules: &BTreeSet<String>) -> String {
    modules
        .iter()
        .map(|module| format!("import {}\n", module))
        .collect()
}
