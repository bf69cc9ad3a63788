//! Lyra compiler frontend
//!
//! Pipeline stages, in order: `lexer` and `parser` build the AST,
//! `compiler` drives module resolution and the semantic passes (`env`,
//! linking, `typecheck`) over the shared `scope` and `types` arenas, and
//! `diagnostics` collects everything the passes report.

pub mod ast;
pub mod compiler;
pub mod diagnostics;
pub mod env;
pub mod lexer;
pub mod modules;
pub mod parser;
pub mod scope;
pub mod typecheck;
pub mod types;
pub mod unit;
