//! CLI module for the Lyra compiler
//!
//! ## Commands
//!
//! - `build <file>` - Compile a project and print the output unit name
//! - `check <file>` - Run the full pipeline without producing output
//!
//! The CLI uses clap for argument parsing with derive macros. Errors are
//! surfaced as miette reports from the top-level `run()`; nothing below
//! it calls `process::exit`.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::IntoDiagnostic;

use crate::frontend::compiler::Compiler;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The Lyra programming language compiler
#[derive(Parser, Debug)]
#[command(name = "lyra")]
#[command(version = VERSION)]
#[command(about = "The Lyra programming language compiler", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile a project starting from the given entry file
    Build {
        /// Entry source file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Type-check a project without producing output
    Check {
        /// Entry source file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

pub fn run() -> miette::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Build { file } => {
            let output = compile(&file)?;
            println!("{output}");
            Ok(())
        }
        Command::Check { file } => {
            compile(&file)?;
            println!("ok");
            Ok(())
        }
    }
}

/// Run the full pipeline over the project containing `file`. The project
/// root is the entry file's directory; imports resolve against it.
fn compile(file: &Path) -> miette::Result<String> {
    let project_root = match file.parent() {
        Some(parent) if parent != Path::new("") => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let entry = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| miette::miette!("not a source file: {}", file.display()))?;

    Compiler::new()
        .compile(&project_root, &entry)
        .into_diagnostic()
}
