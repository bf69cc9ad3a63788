//! Diagnostic reporting for the Lyra compiler
//!
//! Every diagnostic kind has a stable numeric code, a message template with
//! positional `{0}`-style substitution, and a fixed suggestion line. The
//! [`Reporter`] accumulates diagnostics across a pass; pass boundaries call
//! [`Reporter::kill_if_errors`], which converts a non-empty list into a
//! single fatal [`CompileError::Compiler`].

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::frontend::ast::Position;

/// Stable diagnostic codes. Values are part of the tooling contract; do
/// not renumber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    BadAssignment = 1,
    CannotApplyOperator = 2,
    CannotPostfix = 3,
    ExternalNotFound = 4,
    FieldNotPresent = 5,
    FunctionSignatureMismatch = 6,
    IdentifierNotFound = 7,
    ImplementationRestriction = 8,
    ListLiteralIncomplete = 9,
    ListTypeMismatch = 10,
    MatchCoverage = 11,
    MethodNotFound = 12,
    ModuleNotFound = 13,
    MutabilityViolation = 14,
    NotIterable = 15,
    ParameterTypeMismatch = 16,
    ReservedWord = 17,
    Redeclaration = 18,
    Syntax = 19,
    ReturnTypeMismatch = 20,
    TypeNotResolved = 21,
    Unreachable = 22,
    VoidUsage = 23,
}

impl ErrorCode {
    pub fn name(self) -> &'static str {
        match self {
            ErrorCode::BadAssignment => "BadAssignment",
            ErrorCode::CannotApplyOperator => "CannotApplyOperator",
            ErrorCode::CannotPostfix => "CannotPostfix",
            ErrorCode::ExternalNotFound => "ExternalNotFound",
            ErrorCode::FieldNotPresent => "FieldNotPresent",
            ErrorCode::FunctionSignatureMismatch => "FunctionSignatureMismatch",
            ErrorCode::IdentifierNotFound => "IdentifierNotFound",
            ErrorCode::ImplementationRestriction => "ImplementationRestriction",
            ErrorCode::ListLiteralIncomplete => "ListLiteralIncomplete",
            ErrorCode::ListTypeMismatch => "ListTypeMismatch",
            ErrorCode::MatchCoverage => "MatchCoverage",
            ErrorCode::MethodNotFound => "MethodNotFound",
            ErrorCode::ModuleNotFound => "ModuleNotFound",
            ErrorCode::MutabilityViolation => "MutabilityViolation",
            ErrorCode::NotIterable => "NotIterable",
            ErrorCode::ParameterTypeMismatch => "ParameterTypeMismatch",
            ErrorCode::ReservedWord => "ReservedWord",
            ErrorCode::Redeclaration => "Redeclaration",
            ErrorCode::Syntax => "Syntax",
            ErrorCode::ReturnTypeMismatch => "ReturnTypeMismatch",
            ErrorCode::TypeNotResolved => "TypeNotResolved",
            ErrorCode::Unreachable => "Unreachable",
            ErrorCode::VoidUsage => "VoidUsage",
        }
    }

    pub fn template(self) -> &'static str {
        match self {
            ErrorCode::BadAssignment => {
                "Variable `{0}` of type `{1}` cannot accept assignment of type `{2}`."
            }
            ErrorCode::CannotApplyOperator => {
                "Operator `{0}` cannot be applied to types `{1}` and `{2}`."
            }
            ErrorCode::CannotPostfix => "Operator `{0}` cannot be applied to type `{1}`.",
            ErrorCode::ExternalNotFound => "External object `{0}` not found.",
            ErrorCode::FieldNotPresent => "Field `{0}` is not present on type `{1}`.",
            ErrorCode::FunctionSignatureMismatch => {
                "No function overloads exist on `{0}` that match the parameters `{1}`."
            }
            ErrorCode::IdentifierNotFound => "Identifier `{0}` not found.",
            ErrorCode::ImplementationRestriction => "{0}",
            ErrorCode::ListLiteralIncomplete => "List literals must have one or more elements.",
            ErrorCode::ListTypeMismatch => {
                "Expression of type `{0}` cannot be added to list of inferred type `{1}`."
            }
            ErrorCode::MatchCoverage => {
                "Not all entries in union `{0}` are covered by this match statement. Add cases for {1}."
            }
            ErrorCode::MethodNotFound => "`{0}` is not callable.",
            ErrorCode::ModuleNotFound => "Module `{0}` is not found.",
            ErrorCode::MutabilityViolation => {
                "Variable `{0}` is immutable and cannot receive assignment."
            }
            ErrorCode::NotIterable => "Expression of type `{0}` is not iterable.",
            ErrorCode::ParameterTypeMismatch => {
                "Argument of type `{0}` does not match expected parameter type `{1}`."
            }
            ErrorCode::ReservedWord => "`{0}` is a reserved word and cannot be used here.",
            ErrorCode::Redeclaration => "Redeclaration of variable `{0}`.",
            ErrorCode::Syntax => "{0}",
            ErrorCode::ReturnTypeMismatch => {
                "Function `{0}` has return type of `{1}`. Cannot have another return statement with type `{2}`."
            }
            ErrorCode::TypeNotResolved => "Variable `{0}` cannot be resolved to a type.",
            ErrorCode::Unreachable => "Unreachable code after a return statement.",
            ErrorCode::VoidUsage => "Cannot use the result of a void function in an expression.",
        }
    }

    pub fn suggestion(self) -> &'static str {
        match self {
            ErrorCode::BadAssignment => {
                "Check that both sides of the assignment have the same type."
            }
            ErrorCode::CannotApplyOperator => {
                "Check that the operator is defined for both operand types."
            }
            ErrorCode::CannotPostfix => "Postfix operators only apply to numeric variables.",
            ErrorCode::ExternalNotFound => {
                "Ensure the external type you are referencing actually exists."
            }
            ErrorCode::FieldNotPresent => "Check the field names of the struct being accessed.",
            ErrorCode::FunctionSignatureMismatch => {
                "Check the parameter positions and types of the called function."
            }
            ErrorCode::IdentifierNotFound => {
                "Make sure that all identifiers are defined, builtin or imported."
            }
            ErrorCode::ImplementationRestriction => {
                "This construct is not supported by the compiler yet."
            }
            ErrorCode::ListLiteralIncomplete => "To create an empty list do `type[]`.",
            ErrorCode::ListTypeMismatch => "Lists may only contain elements of the same type.",
            ErrorCode::MatchCoverage => "All possible values of a union type must be handled.",
            ErrorCode::MethodNotFound => "Only functions and struct constructors can be called.",
            ErrorCode::ModuleNotFound => "Is the module misspelled?",
            ErrorCode::MutabilityViolation => {
                "Declare a variable with the `mut` keyword to allow mutability."
            }
            ErrorCode::NotIterable => "Check to be sure the type is iterable, like a list.",
            ErrorCode::ParameterTypeMismatch => {
                "Check the types of the arguments at the call site."
            }
            ErrorCode::ReservedWord => "Pick a different name.",
            ErrorCode::Redeclaration => "You cannot redeclare variables.",
            ErrorCode::Syntax => "Correct the syntax and recompile.",
            ErrorCode::ReturnTypeMismatch => {
                "Make sure all return statements in your function are returning the same type."
            }
            ErrorCode::TypeNotResolved => "Make sure all variables are properly spelled etc.",
            ErrorCode::Unreachable => "Remove the statements after the return.",
            ErrorCode::VoidUsage => {
                "Functions returning `void` don't have any result so there is no return type to use."
            }
        }
    }
}

/// A rendered, source-anchored compiler error. Append-only; never mutated
/// after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub code: u16,
    pub message: String,
    pub line: usize,
    pub col: usize,
}

/// Fatal compilation failures surfaced to callers of `compile`.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("file not found: {path}")]
    NotFound { path: String },
    #[error("{message} ({} error(s))", diagnostics.len())]
    Compiler {
        message: String,
        diagnostics: Vec<Diagnostic>,
    },
}

/// Accumulates diagnostics for one compilation run.
#[derive(Debug, Default)]
pub struct Reporter {
    diagnostics: Vec<Diagnostic>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// Render and record one diagnostic: header, substituted message, a
    /// 3-line source snippet with a caret under the failing column, and
    /// the code's fixed suggestion.
    pub fn report(&mut self, code: ErrorCode, file: &Path, pos: Position, args: &[&str]) {
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.display().to_string());

        let mut message = format!(
            "[{}] in {}[{}:{}]\n{}\n",
            code.name(),
            file_name,
            pos.line,
            pos.col,
            substitute(code.template(), args)
        );
        message.push_str(&render_snippet(file, pos));
        message.push('\n');
        message.push_str(code.suggestion());

        self.diagnostics.push(Diagnostic {
            code: code as u16,
            message,
            line: pos.line,
            col: pos.col,
        });
    }

    /// Fold another reporter's diagnostics into this one, preserving their
    /// order. Passes accumulate into their own reporter; the driver merges
    /// at the end of each analysis step.
    pub fn merge(&mut self, other: Reporter) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// Pass boundary: if anything was recorded, print every diagnostic and
    /// fail with a single aggregate error carrying the full list.
    pub fn kill_if_errors(&self, message: &str) -> Result<(), CompileError> {
        if self.diagnostics.is_empty() {
            return Ok(());
        }
        for d in &self.diagnostics {
            eprintln!("{}\n", d.message);
        }
        Err(CompileError::Compiler {
            message: message.to_string(),
            diagnostics: self.diagnostics.clone(),
        })
    }
}

/// Replace `{0}`, `{1}`, ... in `template` with the positional arguments.
fn substitute(template: &str, args: &[&str]) -> String {
    let mut out = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        out = out.replace(&format!("{{{i}}}"), arg);
    }
    out
}

/// Read up to 3 lines of source context starting 2 lines above the failing
/// position, with right-padded line numbers and a caret run under the
/// failing column. Missing or unreadable files yield an empty snippet so a
/// rendering problem never masks the diagnostic itself.
fn render_snippet(file: &Path, pos: Position) -> String {
    let source = match fs::read_to_string(file) {
        Ok(s) => s,
        Err(_) => return String::new(),
    };

    let start_line = pos.line.saturating_sub(2).max(1);
    let limit = 3;
    let end_line = start_line + limit - 1;
    let padding = end_line.to_string().len() + 1;

    let mut out = Vec::new();
    for (offset, text) in source
        .lines()
        .skip(start_line - 1)
        .take(limit)
        .enumerate()
    {
        let line_number = start_line + offset;
        let label = format!("{line_number}:");
        let mut rendered = format!("{label:>padding$} {text}");
        if line_number == pos.line {
            rendered.push('\n');
            rendered.push_str(&"^".repeat(pos.col + padding));
        }
        out.push(rendered);
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_source(contents: &str) -> std::path::PathBuf {
        let pid = std::process::id();
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let path = std::env::temp_dir().join(format!("lyra_diag_test_{pid}_{ts}.lyr"));
        let mut f = fs::File::create(&path).unwrap();
        write!(f, "{contents}").unwrap();
        path
    }

    #[test]
    fn substitutes_positional_arguments() {
        assert_eq!(
            substitute("Variable `{0}` of type `{1}`.", &["x", "int"]),
            "Variable `x` of type `int`."
        );
    }

    #[test]
    fn report_renders_header_snippet_and_suggestion() {
        let path = temp_source("let a = 1\nlet a = 2\nlet b = 3\n");
        let mut reporter = Reporter::new();
        reporter.report(
            ErrorCode::Redeclaration,
            &path,
            Position::new(2, 5),
            &["a"],
        );

        let d = &reporter.diagnostics()[0];
        assert_eq!(d.code, 18);
        assert_eq!((d.line, d.col), (2, 5));
        assert!(d.message.starts_with("[Redeclaration] in"));
        assert!(d.message.contains("Redeclaration of variable `a`."));
        assert!(d.message.contains("2: let a = 2"));
        assert!(d.message.contains('^'));
        assert!(d.message.ends_with("You cannot redeclare variables."));

        fs::remove_file(path).unwrap();
    }

    #[test]
    fn snippet_window_starts_two_lines_above() {
        let path = temp_source("l1\nl2\nl3\nl4\nl5\n");
        let snippet = render_snippet(&path, Position::new(4, 1));
        assert!(snippet.contains("2: l2"));
        assert!(snippet.contains("3: l3"));
        assert!(snippet.contains("4: l4"));
        assert!(!snippet.contains("5: l5"));
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn kill_if_errors_is_a_noop_when_clean() {
        let reporter = Reporter::new();
        assert!(reporter.kill_if_errors("should not fire").is_ok());
    }

    #[test]
    fn kill_if_errors_carries_every_diagnostic() {
        let path = temp_source("let a = 1\n");
        let mut reporter = Reporter::new();
        reporter.report(ErrorCode::Redeclaration, &path, Position::new(1, 1), &["a"]);
        reporter.report(
            ErrorCode::IdentifierNotFound,
            &path,
            Position::new(1, 9),
            &["b"],
        );

        match reporter.kill_if_errors("stop") {
            Err(CompileError::Compiler { diagnostics, .. }) => {
                assert_eq!(diagnostics.len(), 2)
            }
            other => panic!("expected compiler error, got {other:?}"),
        }
        fs::remove_file(path).unwrap();
    }
}
