//! # Script Code Generation
//!
//! Turns block trees into script text.
//!
//! [`BlockCompiler`] does the walking; the rules for each family of genera
//! live in their own module and are registered into a
//! [`RegistryBuilder`](crate::registry::RegistryBuilder):
//!
//! - `expressions` - literals, operators, math, variables, key constants
//! - `actions` - one-call commands such as `click(...)` and `wait(...)`
//! - `statements` - conditionals, loops, event handlers, comments
//! - `functions` - function calls and definitions, `return`, inline script
//!
//! Expressions render as a single line with no trailing newline. Compound
//! statements end with a newline.

mod actions;
mod block_compiler;
mod expressions;
mod functions;
mod statements;

pub use block_compiler::{quote, render_call, unquote, BlockCompiler};
pub use functions::substitute_placeholders;

use crate::registry::RegistryBuilder;

/// Quote character of string literals in the generated script
pub const QUOTE: char = '"';

/// An empty string literal
pub const EMPTY_STRING: &str = "\"\"";

pub const NONE: &str = "None";
pub const TRUE: &str = "True";
pub const FALSE: &str = "False";

/// Statement used for empty indented bodies
pub const PASS: &str = "pass";

/// Register every built-in genus
pub fn register_standard_rules(builder: &mut RegistryBuilder) {
    expressions::register(builder);
    actions::register(builder);
    statements::register(builder);
    functions::register(builder);
}
