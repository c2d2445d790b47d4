//! # Function Rules
//!
//! User-defined functions and inline script.
//!
//! Call and definition blocks name their function with a string literal in
//! socket 0. The literal is compiled like any other block and the quotes are
//! removed again with [`unquote`], which relies on `string` blocks always
//! compiling to [`quote`](super::quote)d text.

use super::block_compiler::{render_call, unquote};
use super::{BlockCompiler, NONE};
use crate::graph::Block;
use crate::registry::{CompileRule, RegistryBuilder};
use std::ops::Range;

const IMPORT_PREFIX: &str = "import ";

pub(super) fn register(builder: &mut RegistryBuilder) {
    builder
        .handler("callFunction", compile_call)
        .handler("callFunctionImport", compile_call_with_import)
        .handler("defineFunction", compile_define_function)
        .register("return", CompileRule::operator("return", NONE, &[0]))
        .handler("pythonExpression", compile_inline_code)
        .handler("pythonStatement", compile_inline_code);
}

fn compile_call(compiler: &mut BlockCompiler<'_>, block: &Block) -> String {
    let name = compile_name(compiler, block, 0);
    let arguments = compile_present(compiler, block, 1..block.sockets.len());
    render_call(&name, &arguments)
}

/// Call whose socket 1 names a module to import
///
/// An unqualified function name is qualified with that module.
fn compile_call_with_import(compiler: &mut BlockCompiler<'_>, block: &Block) -> String {
    let mut name = compile_name(compiler, block, 0);

    let raw_module = compile_name(compiler, block, 1);
    let module = raw_module.strip_prefix(IMPORT_PREFIX).unwrap_or(&raw_module).trim();
    if !module.is_empty() {
        if !name.contains('.') {
            name = format!("{}.{}", module, name);
        }
        compiler.require_module(module);
    }

    let arguments = compile_present(compiler, block, 2..block.sockets.len());
    render_call(&name, &arguments)
}

/// `def name(params):` followed by the body held in the last socket
fn compile_define_function(compiler: &mut BlockCompiler<'_>, block: &Block) -> String {
    let name = compile_name(compiler, block, 0);

    // socket 0 is the name, so a body needs at least two sockets
    let count = block.sockets.len();
    let body = if count >= 2 { count - 1 } else { count };
    let parameters = compile_present(compiler, block, 1..body);

    let header = format!("def {}:", render_call(&name, &parameters));
    compiler.compile_children(Some(&header), block, body, true)
}

/// Compile a name socket and strip the literal's quotes
fn compile_name(compiler: &mut BlockCompiler<'_>, block: &Block, index: usize) -> String {
    let compiled = compiler.compile_socket(block, index).unwrap_or_default();
    unquote(&compiled).to_string()
}

/// Compile the sockets in `range` that hold a block, skipping the rest
fn compile_present(compiler: &mut BlockCompiler<'_>, block: &Block, range: Range<usize>) -> Vec<String> {
    range
        .filter_map(|index| compiler.compile_socket(block, index))
        .collect()
}

/// Label used as a template; `$n` is replaced by the child in socket `n - 1`
fn compile_inline_code(compiler: &mut BlockCompiler<'_>, block: &Block) -> String {
    let Some(template) = block.label.as_deref() else {
        return String::new();
    };

    let values: Vec<Option<String>> = (0..block.sockets.len())
        .map(|index| compiler.compile_socket(block, index))
        .collect();

    substitute_placeholders(template, |position| values.get(position).cloned().flatten())
}

/// Replace `$1`, `$2`, ... in `template`
///
/// A placeholder is a `$` followed by the longest run of digits, so `$10`
/// always means position 10 and never `$1` followed by `0`. `value` receives
/// the zero-based position; placeholders it has no value for are kept
/// verbatim, as is `$0`.
pub fn substitute_placeholders(template: &str, mut value: impl FnMut(usize) -> Option<String>) -> String {
    let mut code = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(dollar) = rest.find('$') {
        code.push_str(&rest[..dollar]);
        let after = &rest[dollar + 1..];
        let digits = after.bytes().take_while(|b| b.is_ascii_digit()).count();
        let token = &after[..digits];

        let replacement = token
            .parse::<usize>()
            .ok()
            .filter(|&number| number >= 1)
            .and_then(|number| value(number - 1));

        match replacement {
            Some(text) => code.push_str(&text),
            None => {
                code.push('$');
                code.push_str(token);
            }
        }
        rest = &after[digits..];
    }

    code.push_str(rest);
    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::quote;
    use crate::codegen::test_support::{compile, compile_text};
    use crate::graph::{BlockId, GraphBuilder, Socket};
    use indoc::indoc;

    fn literal(name: &str) -> Block {
        Block::new("string").with_label(name)
    }

    fn call(builder: &mut GraphBuilder, genus: &str, sockets: &[Option<BlockId>]) -> BlockId {
        let mut block = Block::new(genus);
        for (index, child) in sockets.iter().enumerate() {
            let mut socket = Socket::any(format!("arg{}", index));
            socket.block = *child;
            block = block.with_socket(socket);
        }
        builder.add(block)
    }

    #[test]
    fn test_call_name_is_unquoted() {
        let mut builder = GraphBuilder::new();
        let name = builder.add(literal("foo"));
        let one = builder.add(Block::new("number").with_label("1"));
        let block = call(&mut builder, "callFunction", &[Some(name), Some(one)]);
        let graph = builder.build();

        assert_eq!(compile_text(&graph, block), "foo(1)");
    }

    #[test]
    fn test_call_skips_empty_argument_slots() {
        let mut builder = GraphBuilder::new();
        let name = builder.add(literal("f"));
        let a = builder.add(Block::new("variable").with_label("a"));
        let c = builder.add(Block::new("variable").with_label("c"));
        let block = call(&mut builder, "callFunction", &[Some(name), Some(a), None, Some(c), None]);
        let bare = call(&mut builder, "callFunction", &[Some(name)]);
        let graph = builder.build();

        assert_eq!(compile_text(&graph, block), "f(a,c)");
        assert_eq!(compile_text(&graph, bare), "f()");
    }

    #[test]
    fn test_call_with_import_qualifies_and_requires_module() {
        let mut builder = GraphBuilder::new();
        let name = builder.add(literal("getcwd"));
        let module = builder.add(literal("import os"));
        let block = call(&mut builder, "callFunctionImport", &[Some(name), Some(module)]);

        let qualified = builder.add(literal("os.path.exists"));
        let path = builder.add(literal("/tmp"));
        let other = call(
            &mut builder,
            "callFunctionImport",
            &[Some(qualified), Some(module), Some(path)],
        );
        let graph = builder.build();

        let output = compile(&graph, block);
        assert_eq!(output.text, "os.getcwd()");
        assert_eq!(output.modules.into_iter().collect::<Vec<_>>(), vec!["os"]);

        assert_eq!(compile_text(&graph, other), "os.path.exists(\"/tmp\")");
    }

    #[test]
    fn test_call_with_empty_import_socket() {
        let mut builder = GraphBuilder::new();
        let name = builder.add(literal("run"));
        let block = call(&mut builder, "callFunctionImport", &[Some(name), None]);
        let graph = builder.build();

        let output = compile(&graph, block);
        assert_eq!(output.text, "run()");
        assert!(output.modules.is_empty());
    }

    #[test]
    fn test_define_function() {
        let mut builder = GraphBuilder::new();
        let name = builder.add(literal("greet"));
        let who = builder.add(Block::new("argument").with_label("who"));
        let who_ref = builder.add(Block::new("argument").with_label("who"));
        let print = builder.add(Block::new("print").with_socket(Socket::any("value").connected_to(who_ref)));
        let ret = builder.add(Block::new("return").with_socket(Socket::any("value")));
        builder.chain(&[print, ret]);
        let block = call(&mut builder, "defineFunction", &[Some(name), Some(who), None, Some(print)]);
        let graph = builder.build();

        let expected = indoc! {"
            def greet(who):
            \tprint(who)

            \treturn None
        "};
        assert_eq!(compile_text(&graph, block), expected);
    }

    #[test]
    fn test_define_function_without_body_socket() {
        let mut builder = GraphBuilder::new();
        let name = builder.add(literal("noop"));
        let only_name = call(&mut builder, "defineFunction", &[Some(name)]);
        let empty_body = call(&mut builder, "defineFunction", &[Some(name), None]);
        let graph = builder.build();

        assert_eq!(compile_text(&graph, only_name), "def noop():\n\tpass\n");
        assert_eq!(compile_text(&graph, empty_body), "def noop():\n\tpass\n");
    }

    #[test]
    fn test_return_value() {
        let mut builder = GraphBuilder::new();
        let x = builder.add(Block::new("variable").with_label("x"));
        let block = call(&mut builder, "return", &[Some(x)]);
        let graph = builder.build();

        assert_eq!(compile_text(&graph, block), "return x");
    }

    #[test]
    fn test_inline_code_substitutes_by_index() {
        let mut builder = GraphBuilder::new();
        let a = builder.add(Block::new("variable").with_label("a"));
        let b = builder.add(Block::new("variable").with_label("b"));
        let expression = call(&mut builder, "pythonExpression", &[Some(a), None, Some(b)]);
        builder.set_label(expression, "max($1, $3) + $2 + $1");
        let untemplated = builder.add(Block::new("pythonStatement"));
        let graph = builder.build();

        assert_eq!(compile_text(&graph, expression), "max(a, b) + $2 + a");
        assert_eq!(compile_text(&graph, untemplated), "");
    }

    #[test]
    fn test_placeholders_use_longest_digit_run() {
        let values: Vec<String> = (1..=10).map(|n| format!("v{}", n)).collect();
        let lookup = |position: usize| values.get(position).cloned();

        assert_eq!(substitute_placeholders("$1 $10", lookup), "v1 v10");
        assert_eq!(substitute_placeholders("$11 $0 $ $x", lookup), "$11 $0 $ $x");
        assert_eq!(substitute_placeholders("cost: $$1", lookup), "cost: $v1");
        assert_eq!(substitute_placeholders("no placeholders", lookup), "no placeholders");
    }

    #[test]
    fn test_substituted_text_is_not_rescanned() {
        let result = substitute_placeholders("$1-$2", |position| match position {
            0 => Some("$2".to_string()),
            1 => Some("two".to_string()),
            _ => None,
        });
        assert_eq!(result, "$2-two");
    }

    #[test]
    fn test_name_literal_contract() {
        let compiled = quote("foo");
        assert!(compiled.starts_with(crate::codegen::QUOTE));
        assert!(compiled.ends_with(crate::codegen::QUOTE));
        assert_eq!(unquote(&compiled), "foo");

        let mut builder = GraphBuilder::new();
        let block = builder.add(literal("foo"));
        let graph = builder.build();
        assert_eq!(compile_text(&graph, block), compiled);
    }
}
