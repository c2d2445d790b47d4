//! # Genus Registry
//!
//! Maps a block genus to the rule that compiles it.
//!
//! Most genera are described by data alone: a fixed constant, a call of a
//! named function over some sockets, or an infix/prefix operator. The rest
//! use a [`RuleHandler`] function. A registry is assembled with a
//! [`RegistryBuilder`] and never changes afterwards, so one instance can be
//! shared by any number of compile passes.
//!
//! ```rust
//! use blockscript::registry::{CompileRule, GenusRegistry, RegistryBuilder};
//!
//! let mut builder = RegistryBuilder::standard();
//! builder.register("beep", CompileRule::call("beep", &[]));
//! let registry: GenusRegistry = builder.build();
//!
//! assert!(registry.contains("beep"));
//! assert!(registry.contains("click"));
//! ```

use crate::codegen::{self, BlockCompiler};
use crate::graph::Block;
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// Hand-written compile rule
pub type RuleHandler = fn(&mut BlockCompiler<'_>, &Block) -> String;

/// How one genus is turned into text
#[derive(Clone, Copy)]
pub enum CompileRule {
    /// Fixed text; `module` is registered as required when present
    Constant {
        text: &'static str,
        module: Option<&'static str>,
    },

    /// `name(arg,...)` over the listed socket indices
    Call {
        name: &'static str,
        missing: &'static str,
        sockets: &'static [usize],
        module: Option<&'static str>,
    },

    /// `a TOKEN b` for two sockets, `TOKEN a` for one
    Operator {
        token: &'static str,
        missing: &'static str,
        sockets: &'static [usize],
    },

    Handler(RuleHandler),
}

impl CompileRule {
    pub const fn constant(text: &'static str) -> Self {
        Self::Constant { text, module: None }
    }

    /// Call rule whose empty sockets render as an empty string literal
    pub const fn call(name: &'static str, sockets: &'static [usize]) -> Self {
        Self::Call {
            name,
            missing: codegen::EMPTY_STRING,
            sockets,
            module: None,
        }
    }

    pub const fn operator(token: &'static str, missing: &'static str, sockets: &'static [usize]) -> Self {
        Self::Operator {
            token,
            missing,
            sockets,
        }
    }

    /// Replace the placeholder used for empty sockets
    pub fn with_missing(self, placeholder: &'static str) -> Self {
        match self {
            Self::Call {
                name,
                sockets,
                module,
                ..
            } => Self::Call {
                name,
                missing: placeholder,
                sockets,
                module,
            },
            Self::Operator { token, sockets, .. } => Self::Operator {
                token,
                missing: placeholder,
                sockets,
            },
            other => other,
        }
    }

    /// Require `module` whenever this rule is used
    pub fn with_module(self, required: &'static str) -> Self {
        match self {
            Self::Constant { text, .. } => Self::Constant {
                text,
                module: Some(required),
            },
            Self::Call {
                name,
                missing,
                sockets,
                ..
            } => Self::Call {
                name,
                missing,
                sockets,
                module: Some(required),
            },
            other => other,
        }
    }
}

impl fmt::Debug for CompileRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant { text, module } => f
                .debug_struct("Constant")
                .field("text", text)
                .field("module", module)
                .finish(),
            Self::Call {
                name,
                missing,
                sockets,
                module,
            } => f
                .debug_struct("Call")
                .field("name", name)
                .field("missing", missing)
                .field("sockets", sockets)
                .field("module", module)
                .finish(),
            Self::Operator {
                token,
                missing,
                sockets,
            } => f
                .debug_struct("Operator")
                .field("token", token)
                .field("missing", missing)
                .field("sockets", sockets)
                .finish(),
            Self::Handler(_) => f.write_str("Handler(..)"),
        }
    }
}

/// Immutable genus → rule table
#[derive(Debug, Clone, Default)]
pub struct GenusRegistry {
    rules: HashMap<String, CompileRule>,
}

static STANDARD_REGISTRY: OnceLock<GenusRegistry> = OnceLock::new();

impl GenusRegistry {
    /// Shared registry holding every built-in genus, built on first use
    pub fn standard() -> &'static GenusRegistry {
        STANDARD_REGISTRY.get_or_init(|| {
            let registry = RegistryBuilder::standard().build();
            tracing::debug!("[BSC] Built standard registry with {} genera", registry.len());
            registry
        })
    }

    pub fn rule(&self, genus: &str) -> Option<&CompileRule> {
        self.rules.get(genus)
    }

    pub fn contains(&self, genus: &str) -> bool {
        self.rules.contains_key(genus)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Registered genera in sorted order
    pub fn genera(&self) -> Vec<&str> {
        let mut genera: Vec<_> = self.rules.keys().map(String::as_str).collect();
        genera.sort_unstable();
        genera
    }
}

/// Collects rules before freezing them into a [`GenusRegistry`]
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    rules: HashMap<String, CompileRule>,
}

impl RegistryBuilder {
    /// Builder with no rules at all
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pre-loaded with every built-in genus
    pub fn standard() -> Self {
        let mut builder = Self::new();
        codegen::register_standard_rules(&mut builder);
        builder
    }

    /// Add or replace the rule for `genus`
    pub fn register(&mut self, genus: impl Into<String>, rule: CompileRule) -> &mut Self {
        self.rules.insert(genus.into(), rule);
        self
    }

    pub fn handler(&mut self, genus: impl Into<String>, handler: RuleHandler) -> &mut Self {
        self.register(genus, CompileRule::Handler(handler))
    }

    pub fn build(self) -> GenusRegistry {
        GenusRegistry { rules: self.rules }
    }
}
