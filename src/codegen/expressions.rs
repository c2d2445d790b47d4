//! # Expression Rules
//!
//! Genera that produce a single-line value: literals, operators, math,
//! variable access and key constants.
//!
//! Math rules register the module that backs them (`math`, `random`) so the
//! program preamble can import it.

use super::block_compiler::quote;
use super::{BlockCompiler, EMPTY_STRING, FALSE, NONE, TRUE};
use crate::graph::Block;
use crate::registry::{CompileRule, RegistryBuilder};

/// Property holding the image path of a screenshot block
pub const SCREENSHOT_PATH: &str = "screenshot-path";

const KEY_CONSTANTS: &[(&str, &str)] = &[
    ("controlKey", "KeyModifier.CTRL"),
    ("shiftKey", "KeyModifier.SHIFT"),
    ("altKey", "KeyModifier.ALT"),
    ("metaKey", "KeyModifier.META"),
    ("commandKey", "KeyModifier.CMD"),
    ("windowsKey", "KeyModifier.WIN"),
    ("enterKey", "Key.ENTER"),
    ("tabKey", "Key.TAB"),
    ("escapeKey", "Key.ESCAPE"),
    ("backspaceKey", "Key.BACKSPACE"),
    ("deleteKey", "Key.DELETE"),
    ("insertKey", "Key.INSERT"),
    ("spaceKey", "Key.SPACE"),
    ("homeKey", "Key.HOME"),
    ("endKey", "Key.END"),
    ("leftKey", "Key.LEFT"),
    ("rightKey", "Key.RIGHT"),
    ("downKey", "Key.DOWN"),
    ("upKey", "Key.UP"),
    ("pageUpKey", "Key.PAGE_UP"),
    ("pageDownKey", "Key.PAGE_DOWN"),
];

/// Comparison and logic operators; empty operands become `True`
const BOOLEAN_OPERATORS: &[(&str, &str)] = &[
    ("and", "and"),
    ("or", "or"),
    ("string-equals", "=="),
    ("number-equals", "=="),
    ("string-not-equals", "!="),
    ("number-not-equals", "!="),
    ("less-than", "<"),
    ("greater-than", ">"),
    ("less-than-or-equal-to", "<="),
    ("greater-than-or-equal-to", ">="),
];

/// (genus, function, placeholder) for one-argument math functions
const MATH_FUNCTIONS: &[(&str, &str, &str)] = &[
    ("sqrt", "math.sqrt", "0"),
    ("sin", "math.sin", "0"),
    ("cos", "math.cos", "0"),
    ("tan", "math.tan", "0"),
    ("asin", "math.asin", "0"),
    ("acos", "math.acos", "0"),
    ("log", "math.log10", "1"),
    ("ln", "math.log", "1"),
];

pub(super) fn register(builder: &mut RegistryBuilder) {
    // literals
    builder
        .handler("string", compile_string)
        .handler("number", compile_number)
        .handler("screenshot", compile_screenshot)
        .register("true", CompileRule::constant(TRUE))
        .register("false", CompileRule::constant(FALSE))
        .register("pi", CompileRule::constant("math.pi").with_module("math"))
        .register("e", CompileRule::constant("math.e").with_module("math"));

    // operators
    for &(genus, token) in BOOLEAN_OPERATORS {
        builder.register(genus, CompileRule::operator(token, TRUE, &[0, 1]));
    }
    builder
        .register("not", CompileRule::operator("not", TRUE, &[0]))
        .register("appendString", CompileRule::operator("+", "", &[0, 1]))
        .register("sum", CompileRule::operator("+", "0", &[0, 1]))
        .register("difference", CompileRule::operator("-", "0", &[0, 1]))
        .register("product", CompileRule::operator("*", "1", &[0, 1]))
        .register("quotient", CompileRule::operator("/", "1", &[0, 1]))
        .register("remainder", CompileRule::operator("%", "1", &[0, 1]));

    // math
    for &(genus, function, missing) in MATH_FUNCTIONS {
        builder.register(
            genus,
            CompileRule::call(function, &[0])
                .with_missing(missing)
                .with_module("math"),
        );
    }
    builder
        .register(
            "power",
            CompileRule::call("math.pow", &[0, 1])
                .with_missing("1")
                .with_module("math"),
        )
        // atan2 takes y first; socket 0 is x
        .register(
            "atan",
            CompileRule::call("math.atan2", &[1, 0])
                .with_missing("0")
                .with_module("math"),
        )
        .register(
            "random",
            CompileRule::call("random.randint", &[0, 1])
                .with_missing("0")
                .with_module("random"),
        )
        .register("round", CompileRule::call("round", &[0]).with_missing("0"))
        .register("int", CompileRule::call("int", &[0]).with_missing("0"))
        .register("abs", CompileRule::call("abs", &[0]).with_missing("0"))
        .register("min", CompileRule::call("min", &[0, 1]).with_missing("0"))
        .register("max", CompileRule::call("max", &[0, 1]).with_missing("0"))
        .register("number-to-string", CompileRule::call("str", &[0]));

    // variables
    builder
        .handler("variable", compile_variable)
        .handler("argument", compile_variable);
    for genus in [
        "getScreenshot",
        "getString",
        "getNumber",
        "getBoolean",
        "getVariable",
        "getArgument",
    ] {
        builder.handler(genus, compile_getter);
    }
    for genus in [
        "setScreenshot",
        "setString",
        "setNumber",
        "setBoolean",
        "setVariable",
    ] {
        builder.register(genus, CompileRule::operator("=", NONE, &[0, 1]));
    }

    // keys
    for &(genus, constant) in KEY_CONSTANTS {
        builder.register(genus, CompileRule::constant(constant));
    }
    builder.handler("functionKey", compile_function_key);
}

/// Label quoted verbatim; no escaping is applied
fn compile_string(_compiler: &mut BlockCompiler<'_>, block: &Block) -> String {
    match &block.label {
        Some(label) => quote(label),
        None => EMPTY_STRING.to_string(),
    }
}

fn compile_number(_compiler: &mut BlockCompiler<'_>, block: &Block) -> String {
    block.label.clone().unwrap_or_else(|| NONE.to_string())
}

fn compile_screenshot(_compiler: &mut BlockCompiler<'_>, block: &Block) -> String {
    match block.property(SCREENSHOT_PATH) {
        Some(path) => quote(path),
        None => EMPTY_STRING.to_string(),
    }
}

fn compile_variable(_compiler: &mut BlockCompiler<'_>, block: &Block) -> String {
    block.label.clone().unwrap_or_else(|| NONE.to_string())
}

fn compile_getter(compiler: &mut BlockCompiler<'_>, block: &Block) -> String {
    compiler.compile_socket_or(block, 0, NONE)
}

/// `Key.F<n>`; `n` defaults to 1
fn compile_function_key(compiler: &mut BlockCompiler<'_>, block: &Block) -> String {
    let number = compiler
        .compile_socket(block, 0)
        .filter(|number| !number.is_empty() && number != NONE)
        .unwrap_or_else(|| "1".to_string());
    format!("Key.F{}", number)
}
