//! # Statement Rules
//!
//! Control flow, event handlers and comments. Bodies are compiled with
//! [`BlockCompiler::compile_children`], which indents each nested body by
//! exactly one level; a nested block's own output is already indented
//! relative to itself, so depth accumulates one unit per enclosing block.
//!
//! ## Example
//!
//! A `while` containing an `if` containing a `click`:
//!
//! ```text
//! while exists("a.png"):
//!     if True:
//!         click("a.png")
//! ```

use super::{BlockCompiler, TRUE};
use crate::graph::Block;
use crate::registry::{CompileRule, RegistryBuilder};

pub(super) fn register(builder: &mut RegistryBuilder) {
    builder
        .handler("runOnce", compile_run_once)
        .handler("if", compile_if)
        .handler("ifelse", compile_if_else)
        .handler("repeat", compile_repeat)
        .handler("while", compile_while)
        .register("break", CompileRule::constant("break"))
        .register("continue", CompileRule::constant("continue"))
        .handler("on-appear-procedure", compile_on_appear)
        .handler("on-vanish-procedure", compile_on_vanish)
        .handler("on-change-procedure", compile_on_change)
        .handler("comment", compile_comment);
}

/// Top-level sequence: children at column zero, no header
fn compile_run_once(compiler: &mut BlockCompiler<'_>, block: &Block) -> String {
    compiler.compile_children(None, block, 0, false)
}

fn compile_if(compiler: &mut BlockCompiler<'_>, block: &Block) -> String {
    let test = compiler.compile_socket_or(block, 0, TRUE);
    compiler.compile_children(Some(&format!("if {}:", test)), block, 1, true)
}

fn compile_if_else(compiler: &mut BlockCompiler<'_>, block: &Block) -> String {
    let mut code = compile_if(compiler, block);
    code.push_str(&compiler.compile_children(Some("else:"), block, 2, true));
    code
}

fn compile_repeat(compiler: &mut BlockCompiler<'_>, block: &Block) -> String {
    let times = compiler.compile_socket_or(block, 0, "1");
    compiler.compile_children(Some(&format!("for i in range({}):", times)), block, 1, true)
}

fn compile_while(compiler: &mut BlockCompiler<'_>, block: &Block) -> String {
    let test = compiler.compile_socket_or(block, 0, TRUE);
    compiler.compile_children(Some(&format!("while {}:", test)), block, 1, true)
}

fn compile_on_appear(compiler: &mut BlockCompiler<'_>, block: &Block) -> String {
    compile_event_handler(compiler, "onAppear", block)
}

fn compile_on_vanish(compiler: &mut BlockCompiler<'_>, block: &Block) -> String {
    compile_event_handler(compiler, "onVanish", block)
}

fn compile_on_change(compiler: &mut BlockCompiler<'_>, block: &Block) -> String {
    compile_event_handler(compiler, "onChange", block)
}

/// Define `<label>(event)` from socket 1, then register it for the pattern in socket 0
///
/// Labels are unique per program (the editor enforces it), so the label
/// without whitespace is used as the procedure name.
fn compile_event_handler(compiler: &mut BlockCompiler<'_>, register: &str, block: &Block) -> String {
    let procedure = block.compact_label();
    let mut code = compiler.compile_children(Some(&format!("def {}(event):", procedure)), block, 1, true);

    let pattern = compiler.compile_socket(block, 0).unwrap_or_default();
    code.push_str(&format!("{}({}, {})", register, pattern, procedure));
    code
}

fn compile_comment(_compiler: &mut BlockCompiler<'_>, block: &Block) -> String {
    let Some(label) = block.label.as_deref().filter(|label| !label.is_empty()) else {
        return String::new();
    };
    label
        .lines()
        .map(|line| format!("# {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}
