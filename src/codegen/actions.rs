//! # Action Rules
//!
//! Commands that map onto one call of the scripting API, e.g.
//! `click(target)` or `popup(text,title)`. Empty sockets become `""`.

use crate::registry::{CompileRule, RegistryBuilder};

/// (genus, function, sockets)
const ACTIONS: &[(&str, &str, &[usize])] = &[
    ("wait", "wait", &[0]),
    ("click", "click", &[0]),
    ("doubleClick", "doubleClick", &[0]),
    ("rightClick", "rightClick", &[0]),
    ("hover", "hover", &[0]),
    ("dragDrop", "dragDrop", &[0, 1]),
    ("type", "type", &[0]),
    ("typeIn", "type", &[0, 1]),
    ("typeModifiers", "type", &[0, 1]),
    ("paste", "paste", &[0]),
    ("pasteIn", "paste", &[0, 1]),
    ("exists", "exists", &[0]),
    ("observe", "observe", &[0, 1]),
    ("print", "print", &[0]),
    ("assert", "assert", &[0]),
    ("openApp", "openApp", &[0]),
    ("switchApp", "switchApp", &[0]),
    ("closeApp", "closeApp", &[0]),
    ("runCommand", "run", &[0]),
    ("popup", "popup", &[0, 1]),
    ("input", "input", &[0, 1]),
];

pub(super) fn register(builder: &mut RegistryBuilder) {
    for &(genus, function, sockets) in ACTIONS {
        builder.register(genus, CompileRule::call(function, sockets));
    }
}

#[cfg(test)]
mod tests {
    use crate::codegen::test_support::compile_text;
    use crate::graph::{Block, GraphBuilder, Socket};

    #[test]
    fn test_single_target_actions() {
        let mut builder = GraphBuilder::new();
        let shot = builder.add(Block::new("screenshot").with_property("screenshot-path", "ok.png"));
        let click = builder.add(Block::new("click").with_socket(Socket::new("target", "screenshot").connected_to(shot)));
        let empty = builder.add(Block::new("wait").with_socket(Socket::new("target", "screenshot")));
        let command = builder.add(Block::new("runCommand").with_socket(Socket::any("cmd")));
        let graph = builder.build();

        assert_eq!(compile_text(&graph, click), "click(\"ok.png\")");
        assert_eq!(compile_text(&graph, empty), "wait(\"\")");
        assert_eq!(compile_text(&graph, command), "run(\"\")");
    }

    #[test]
    fn test_drag_drop_uses_both_sockets() {
        let mut builder = GraphBuilder::new();
        let from = builder.add(Block::new("string").with_label("a.png"));
        let to = builder.add(Block::new("string").with_label("b.png"));
        let drag = builder.add(
            Block::new("dragDrop")
                .with_socket(Socket::any("from").connected_to(from))
                .with_socket(Socket::any("to").connected_to(to)),
        );
        let graph = builder.build();

        assert_eq!(compile_text(&graph, drag), "dragDrop(\"a.png\",\"b.png\")");
    }

    #[test]
    fn test_two_argument_actions() {
        let mut builder = GraphBuilder::new();
        let text = builder.add(Block::new("string").with_label("hello"));
        let ctrl = builder.add(Block::new("controlKey"));
        let modifiers = builder.add(
            Block::new("typeModifiers")
                .with_socket(Socket::any("text").connected_to(text))
                .with_socket(Socket::any("modifiers").connected_to(ctrl)),
        );
        let paste_in = builder.add(Block::new("pasteIn").with_empty_sockets(2));
        let graph = builder.build();

        assert_eq!(compile_text(&graph, modifiers), "type(\"hello\",KeyModifier.CTRL)");
        assert_eq!(compile_text(&graph, paste_in), "paste(\"\",\"\")");
    }

    #[test]
    fn test_block_with_fewer_sockets_than_rule() {
        let mut builder = GraphBuilder::new();
        let popup = builder.add(Block::new("popup").with_empty_sockets(1));
        let graph = builder.build();

        assert_eq!(compile_text(&graph, popup), "popup(\"\")");
    }
}
