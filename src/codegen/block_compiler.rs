//! # Block Compiler
//!
//! Walks one block tree and emits script text.
//!
//! The compiler is read-only over the graph. Every child id is checked with
//! [`BlockLookup::is_valid_id`] right before it is resolved; unusable ids are
//! reported as [`CompileError::MalformedReference`] and treated as an empty
//! socket. Nothing here aborts: problems become diagnostics and the rule's
//! default text is used instead.

use super::PASS;
use crate::error::CompileError;
use crate::graph::{Block, BlockId, BlockLookup};
use crate::options::CompilerOptions;
use crate::registry::{CompileRule, GenusRegistry};
use std::collections::{BTreeSet, HashSet};

/// One compile pass over a block graph
///
/// Required modules and diagnostics accumulate in the compiler itself, so a
/// fresh `BlockCompiler` is needed for every independent pass.
pub struct BlockCompiler<'a> {
    graph: &'a dyn BlockLookup,
    registry: &'a GenusRegistry,
    options: &'a CompilerOptions,
    required_modules: BTreeSet<String>,
    diagnostics: Vec<CompileError>,
    /// Blocks currently being compiled, innermost last
    active: HashSet<BlockId>,
    blocks_compiled: usize,
}

impl<'a> BlockCompiler<'a> {
    pub fn new(
        graph: &'a dyn BlockLookup,
        registry: &'a GenusRegistry,
        options: &'a CompilerOptions,
    ) -> Self {
        Self {
            graph,
            registry,
            options,
            required_modules: BTreeSet::new(),
            diagnostics: Vec::new(),
            active: HashSet::new(),
            blocks_compiled: 0,
        }
    }

    pub fn options(&self) -> &CompilerOptions {
        self.options
    }

    /// Compile the block named by `id`; unusable ids yield empty text
    pub fn compile_id(&mut self, id: BlockId) -> String {
        let graph = self.graph;
        if !graph.is_valid_id(id) {
            tracing::debug!("[BSC] Skipping unusable root id {}", id);
            return String::new();
        }
        self.compile_block(graph.block(id))
    }

    /// Compile a block with the rule registered for its genus
    ///
    /// `None` yields empty text so rules can recurse without checking first.
    pub fn compile_block(&mut self, block: Option<&Block>) -> String {
        let Some(block) = block else {
            return String::new();
        };

        if self.active.contains(&block.id) {
            tracing::warn!("[BSC] Block {} contains itself", block.id);
            self.report(CompileError::CyclicStructure { block: block.id });
            return String::new();
        }

        let registry = self.registry;
        let Some(rule) = registry.rule(&block.genus) else {
            tracing::warn!("[BSC] Unsupported block genus '{}' (block {})", block.genus, block.id);
            self.report(CompileError::UnsupportedGenus {
                block: block.id,
                genus: block.genus.clone(),
            });
            return String::new();
        };

        self.active.insert(block.id);
        let text = self.apply_rule(rule, block);
        self.active.remove(&block.id);
        self.blocks_compiled += 1;

        text
    }

    fn apply_rule(&mut self, rule: &CompileRule, block: &Block) -> String {
        match *rule {
            CompileRule::Constant { text, module } => {
                if let Some(module) = module {
                    self.require_module(module);
                }
                text.to_string()
            }
            CompileRule::Call {
                name,
                missing,
                sockets,
                module,
            } => {
                if let Some(module) = module {
                    self.require_module(module);
                }
                let slots: Vec<Option<usize>> = sockets.iter().copied().map(Some).collect();
                self.compile_function(name, missing, block, &slots)
            }
            CompileRule::Operator {
                token,
                missing,
                sockets,
            } => self.compile_operator(token, missing, block, sockets),
            CompileRule::Handler(handler) => handler(self, block),
        }
    }

    /// Resolve the child plugged into socket `index` of `block`
    ///
    /// Returns `None` for a missing socket, an empty socket, or an unusable id
    /// (the last one is also reported).
    pub fn child(&mut self, block: &Block, index: usize) -> Option<&'a Block> {
        let target = block.socket(index)?.block?;
        self.resolve(block.id, target)
    }

    fn resolve(&mut self, from: BlockId, target: BlockId) -> Option<&'a Block> {
        let graph = self.graph;
        if !graph.is_valid_id(target) {
            tracing::warn!("[BSC] Block {} references unusable block id {}", from, target);
            self.report(CompileError::MalformedReference { block: from, target });
            return None;
        }
        graph.block(target)
    }

    /// Compile the child in socket `index`, or `None` when there is none
    pub fn compile_socket(&mut self, block: &Block, index: usize) -> Option<String> {
        let child = self.child(block, index)?;
        Some(self.compile_block(Some(child)))
    }

    /// Compile the child in socket `index`, falling back to `default`
    pub fn compile_socket_or(&mut self, block: &Block, index: usize, default: &str) -> String {
        self.compile_socket(block, index)
            .unwrap_or_else(|| default.to_string())
    }

    /// Render `name(arg0,arg1,...)`
    ///
    /// Each slot names a socket of `block`. A `None` slot, or a slot past the
    /// end of the socket list, is left out entirely. A socket that exists but
    /// holds nothing renders as `missing`.
    pub fn compile_function(
        &mut self,
        name: &str,
        missing: &str,
        block: &Block,
        slots: &[Option<usize>],
    ) -> String {
        let mut arguments = Vec::with_capacity(slots.len());
        for &index in slots.iter().flatten() {
            if block.socket(index).is_none() {
                continue;
            }
            arguments.push(self.compile_socket_or(block, index, missing));
        }
        render_call(name, &arguments)
    }

    /// Render an operator over the given sockets
    ///
    /// Two operands give `a TOKEN b`, one gives `TOKEN a`. Empty operands are
    /// replaced by `missing`; any other operand count renders `missing` alone.
    pub fn compile_operator(
        &mut self,
        token: &str,
        missing: &str,
        block: &Block,
        sockets: &[usize],
    ) -> String {
        let operands: Vec<String> = sockets
            .iter()
            .map(|&index| self.compile_socket_or(block, index, missing))
            .collect();

        match operands.as_slice() {
            [operand] => format!("{} {}", token, operand),
            [left, right] => format!("{} {} {}", left, token, right),
            _ => missing.to_string(),
        }
    }

    /// Render a statement body
    ///
    /// Emits `header` (when given) on its own line, then every statement in
    /// the sequence starting at socket `index`, separated by blank lines. With
    /// `indent`, each child line is indented by one level and an empty body
    /// becomes a single `pass`.
    pub fn compile_children(
        &mut self,
        header: Option<&str>,
        block: &Block,
        index: usize,
        indent: bool,
    ) -> String {
        let mut code = String::new();
        if let Some(header) = header {
            code.push_str(header);
            code.push('\n');
        }

        let statements = match self.child(block, index) {
            Some(first) => self.compile_sequence(first),
            None => Vec::new(),
        };

        let rendered: Vec<String> = statements
            .iter()
            .filter(|text| !text.trim().is_empty())
            .map(|text| {
                if indent {
                    self.indent_lines(text)
                } else {
                    format!("{}\n", text.trim_end_matches('\n'))
                }
            })
            .collect();

        if rendered.is_empty() {
            if indent {
                code.push_str(&self.options.indent);
                code.push_str(PASS);
                code.push('\n');
            }
            return code;
        }

        code.push_str(&rendered.join("\n"));
        code
    }

    /// Compile `first` and every block reachable through its `next` links
    ///
    /// A `max_chain_length` of zero means no limit.
    pub fn compile_sequence(&mut self, first: &'a Block) -> Vec<String> {
        let limit = self.options.max_chain_length;
        let mut statements = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(first);

        while let Some(block) = current {
            if !seen.insert(block.id) {
                tracing::warn!("[BSC] Statement sequence loops back at block {}", block.id);
                self.report(CompileError::CyclicStructure { block: block.id });
                break;
            }
            if limit > 0 && statements.len() >= limit {
                tracing::warn!("[BSC] Statement sequence exceeds max_chain_length ({}) at block {}", limit, block.id);
                self.report(CompileError::ChainTooLong { block: block.id, limit });
                break;
            }

            tracing::trace!("[BSC] Compiling statement {} ({})", block.id, block.genus);
            statements.push(self.compile_block(Some(block)));

            current = match block.next {
                Some(next) if !next.is_null() => self.resolve(block.id, next),
                _ => None,
            };
        }

        statements
    }

    /// Prefix every non-empty line of `text` with one indent unit
    ///
    /// Empty lines stay empty; whitespace-only lines keep their content.
    pub fn indent_lines(&self, text: &str) -> String {
        let mut code = String::new();
        for line in text.trim_end_matches('\n').lines() {
            if !line.is_empty() {
                code.push_str(&self.options.indent);
                code.push_str(line);
            }
            code.push('\n');
        }
        code
    }

    /// Record a module the generated script must import
    pub fn require_module(&mut self, module: impl Into<String>) {
        let module = module.into();
        if !module.is_empty() {
            self.required_modules.insert(module);
        }
    }

    pub fn report(&mut self, error: CompileError) {
        self.diagnostics.push(error);
    }

    pub fn required_modules(&self) -> &BTreeSet<String> {
        &self.required_modules
    }

    pub fn diagnostics(&self) -> &[CompileError] {
        &self.diagnostics
    }

    pub fn blocks_compiled(&self) -> usize {
        self.blocks_compiled
    }

    /// Consume the pass, returning its modules and diagnostics
    pub fn finish(self) -> (BTreeSet<String>, Vec<CompileError>) {
        (self.required_modules, self.diagnostics)
    }
}

/// `name(a,b,c)` with commas only between arguments
pub fn render_call(name: &str, arguments: &[String]) -> String {
    format!("{}({})", name, arguments.join(","))
}

/// Render a string literal the way the `string` genus does
pub fn quote(text: &str) -> String {
    format!("{}{}{}", super::QUOTE, text, super::QUOTE)
}

/// Recover raw text from a compiled string literal
///
/// A compiled literal always starts and ends with [`super::QUOTE`]; exactly
/// those two characters are removed. Text that is not a quoted literal (for
/// example a variable plugged where a name was expected) is returned as is.
pub fn unquote(compiled: &str) -> &str {
    compiled
        .strip_prefix(super::QUOTE)
        .and_then(|rest| rest.strip_suffix(super::QUOTE))
        .unwrap_or(compiled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::EMPTY_STRING;
    use crate::graph::{GraphBuilder, Socket};

    fn string(builder: &mut GraphBuilder, text: &str) -> BlockId {
        builder.add(Block::new("string").with_label(text))
    }

    #[test]
    fn test_compile_function_skips_absent_slots_but_fills_empty_sockets() {
        let mut builder = GraphBuilder::new();
        let a = string(&mut builder, "a");
        let c = string(&mut builder, "c");
        let call = builder.add(
            Block::new("f")
                .with_socket(Socket::any("a").connected_to(a))
                .with_socket(Socket::any("b"))
                .with_socket(Socket::any("c").connected_to(c)),
        );
        let graph = builder.build();
        let options = CompilerOptions::default();
        let mut compiler = BlockCompiler::new(&graph, GenusRegistry::standard(), &options);
        let block = graph.get(call).unwrap();

        assert_eq!(
            compiler.compile_function("f", EMPTY_STRING, block, &[Some(0), None, Some(2)]),
            r#"f("a","c")"#
        );
        assert_eq!(
            compiler.compile_function("f", EMPTY_STRING, block, &[Some(0), Some(1), Some(2)]),
            r#"f("a","","c")"#
        );
        assert_eq!(compiler.compile_function("f", EMPTY_STRING, block, &[]), "f()");
        // past the end
        assert_eq!(
            compiler.compile_function("f", EMPTY_STRING, block, &[Some(7)]),
            "f()"
        );
    }

    #[test]
    fn test_compile_operator_shapes() {
        let mut builder = GraphBuilder::new();
        let x = builder.add(Block::new("variable").with_label("x"));
        let op = builder.add(
            Block::new("sum")
                .with_socket(Socket::any("a").connected_to(x))
                .with_socket(Socket::any("b")),
        );
        let graph = builder.build();
        let options = CompilerOptions::default();
        let mut compiler = BlockCompiler::new(&graph, GenusRegistry::standard(), &options);
        let block = graph.get(op).unwrap();

        assert_eq!(compiler.compile_operator("+", "0", block, &[0, 1]), "x + 0");
        assert_eq!(compiler.compile_operator("not", "True", block, &[1]), "not True");
        assert_eq!(compiler.compile_operator("?", "zero", block, &[]), "zero");
        assert_eq!(compiler.compile_operator("?", "many", block, &[0, 0, 0]), "many");
    }

    #[test]
    fn test_malformed_reference_is_treated_as_empty() {
        let mut builder = GraphBuilder::new();
        let op = builder.add(
            Block::new("sum")
                .with_socket(Socket::any("a").connected_to(BlockId::NULL))
                .with_socket(Socket::any("b").connected_to(BlockId(404))),
        );
        let graph = builder.build();
        let options = CompilerOptions::default();
        let mut compiler = BlockCompiler::new(&graph, GenusRegistry::standard(), &options);

        assert_eq!(compiler.compile_id(op), "0 + 0");
        assert_eq!(
            compiler.diagnostics(),
            &[
                CompileError::MalformedReference {
                    block: op,
                    target: BlockId::NULL
                },
                CompileError::MalformedReference {
                    block: op,
                    target: BlockId(404)
                },
            ]
        );
    }

    #[test]
    fn test_empty_and_unknown_roots_compile_to_nothing() {
        let graph = GraphBuilder::new().build();
        let options = CompilerOptions::default();
        let mut compiler = BlockCompiler::new(&graph, GenusRegistry::standard(), &options);

        assert_eq!(compiler.compile_block(None), "");
        assert_eq!(compiler.compile_id(BlockId::NULL), "");
        assert_eq!(compiler.compile_id(BlockId(3)), "");
        assert!(compiler.diagnostics().is_empty());
    }

    #[test]
    fn test_indent_lines_is_applied_once_per_call() {
        let graph = GraphBuilder::new().build();
        let options = CompilerOptions::with_space_indent(2);
        let compiler = BlockCompiler::new(&graph, GenusRegistry::standard(), &options);

        assert_eq!(compiler.indent_lines("a\n  b\n\nc\n\n"), "  a\n    b\n\n  c\n");
        assert_eq!(compiler.indent_lines("a\n   \nb"), "  a\n     \n  b\n");
    }

    #[test]
    fn test_whitespace_only_lines_survive_in_bodies() {
        let mut builder = GraphBuilder::new();
        let code = builder.add(Block::new("pythonStatement").with_label("s = '''a\n   \nb'''"));
        let if_block = builder.add(Block::new("if").with_empty_sockets(2));
        builder.connect(if_block, 1, code);
        let graph = builder.build();
        let options = CompilerOptions::default();
        let mut compiler = BlockCompiler::new(&graph, GenusRegistry::standard(), &options);

        assert_eq!(compiler.compile_id(if_block), "if True:\n\ts = '''a\n\t   \n\tb'''\n");
    }

    #[test]
    fn test_long_acyclic_chain_is_cut_at_limit() {
        let mut builder = GraphBuilder::new();
        let first = builder.add(Block::new("break"));
        let second = builder.add(Block::new("continue"));
        let third = builder.add(Block::new("break"));
        builder.chain(&[first, second, third]);
        let run_once = builder.add(Block::new("runOnce").with_empty_sockets(1));
        builder.connect(run_once, 0, first);
        let graph = builder.build();

        let options = CompilerOptions {
            max_chain_length: 2,
            ..CompilerOptions::default()
        };
        let mut compiler = BlockCompiler::new(&graph, GenusRegistry::standard(), &options);
        assert_eq!(compiler.compile_id(run_once), "break\n\ncontinue\n");
        assert_eq!(
            compiler.diagnostics(),
            &[CompileError::ChainTooLong {
                block: third,
                limit: 2
            }]
        );

        // zero disables the limit
        let unbounded = CompilerOptions {
            max_chain_length: 0,
            ..CompilerOptions::default()
        };
        let mut compiler = BlockCompiler::new(&graph, GenusRegistry::standard(), &unbounded);
        assert_eq!(compiler.compile_id(run_once), "break\n\ncontinue\n\nbreak\n");
        assert!(compiler.diagnostics().is_empty());
    }

    #[test]
    fn test_dangling_next_link_ends_the_sequence() {
        let mut builder = GraphBuilder::new();
        let first = builder.add(Block::new("break"));
        let last = builder.add(Block::new("continue").with_next(BlockId(404)));
        builder.chain(&[first, last]);
        let ended = builder.add(Block::new("break").with_next(BlockId::NULL));
        let run_once = builder.add(Block::new("runOnce").with_empty_sockets(1));
        builder.connect(run_once, 0, first);
        let sentinel = builder.add(Block::new("runOnce").with_empty_sockets(1));
        builder.connect(sentinel, 0, ended);
        let graph = builder.build();
        let options = CompilerOptions::default();

        let mut compiler = BlockCompiler::new(&graph, GenusRegistry::standard(), &options);
        assert_eq!(compiler.compile_id(run_once), "break\n\ncontinue\n");
        assert_eq!(
            compiler.diagnostics(),
            &[CompileError::MalformedReference {
                block: last,
                target: BlockId(404)
            }]
        );

        // the null id marks the end of a sequence
        let mut compiler = BlockCompiler::new(&graph, GenusRegistry::standard(), &options);
        assert_eq!(compiler.compile_id(sentinel), "break\n");
        assert!(compiler.diagnostics().is_empty());
    }

    #[test]
    fn test_quote_and_unquote_are_inverse() {
        assert_eq!(quote("foo"), "\"foo\"");
        assert_eq!(unquote(&quote("foo")), "foo");
        assert_eq!(unquote(&quote("")), "");
        assert_eq!(unquote("bare_name"), "bare_name");
        assert_eq!(unquote("\""), "\"");
    }
}
