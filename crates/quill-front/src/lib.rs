//! Quill front end: parsing, name resolution and binding of scripts
//! against a [`quill_runtime::ScriptRuntime`].

pub mod bind;
pub mod compile;
pub mod flags;
pub mod resolver;
pub mod syntax;

#[cfg(test)]
mod testing;

pub use bind::{Binder, BoundExpr, BoundKind};
pub use compile::{CompileOptions, CompileOutput, ParameterSpec, compile};
pub use flags::{FlagsGuard, ScopeFlagStack, ScopeFlags};
pub use resolver::{ExtensionMethodGroup, NameResolver};
pub use syntax::{SyntaxError, parse_expression, parse_script};
