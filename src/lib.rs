//! # Block Script Compiler (BSC)
//!
//! Compiler for turning visual block programs into Sikuli-style automation
//! scripts.
//!
//! A program is a graph of [`Block`]s. Blocks plug into the sockets of other
//! blocks and chain into statement sequences through their `next` link. The
//! compiler walks the trees hanging off each root block and emits script
//! text together with the set of modules the script must import.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use blockscript::{compile_program, BlockGraph};
//!
//! let graph = BlockGraph::load("program.json")?;
//! let program = compile_program(&graph);
//!
//! for problem in &program.diagnostics {
//!     eprintln!("warning: {}", problem);
//! }
//! std::fs::write("program.sikuli.py", &program.source)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! BSC compiles a program in four phases:
//!
//! 1. **Loading** - Read the block document ([`graph`])
//! 2. **Root Selection** - Find root blocks, deferring top-level code ([`compiler`])
//! 3. **Code Generation** - Apply the rule registered for each genus ([`codegen`], [`registry`])
//! 4. **Assembly** - Emit imports, prelude, then every root in order
//!
//! Compilation never aborts. Unknown genera, dangling ids and cyclic block
//! structures are reported as [`CompileError`] diagnostics while the rest of
//! the program still compiles.

pub mod codegen;
pub mod compiler;
pub mod error;
pub mod graph;
pub mod options;
pub mod registry;

// Re-export the main compilation API
pub use compiler::{
    compile_block,
    compile_block_with,
    compile_program,
    compile_program_with,
    compile_program_with_options,
    compile_roots,
    select_roots,
    CompileStats,
    CompiledProgram,
    CompiledScript,
    RootSelection,
};

// Re-export the block model
pub use graph::{Block, BlockGraph, BlockId, BlockLookup, GraphBuilder, Socket};

pub use error::{CompileError, GraphError};
pub use options::CompilerOptions;
pub use registry::{CompileRule, GenusRegistry, RegistryBuilder};
