#![forbid(unsafe_code)]
//! Lyra Programming Language Compiler
//!
//! This crate provides the Lyra compiler frontend: lexing, parsing,
//! module resolution with export/import linking, scoped symbol binding,
//! and a two-pass type checker with per-call-site generic specialization.
//!
//! ## Panic Policy
//!
//! Production code uses `Result` with `?`; `.unwrap()` and `.expect()`
//! are acceptable in tests only.

pub mod cli;
pub mod frontend;

pub use frontend::ast;
pub use frontend::compiler::Compiler;
pub use frontend::diagnostics;
pub use frontend::diagnostics::CompileError;
pub use frontend::lexer;
pub use frontend::parser;
pub use frontend::types;
