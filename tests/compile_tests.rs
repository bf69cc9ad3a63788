//! End-to-end pipeline tests
//!
//! Each test lays out a small project in a unique temp directory, runs the
//! full compile pipeline over it, and inspects the resulting unit set,
//! scopes, and diagnostics.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use lyra::diagnostics::CompileError;
use lyra::types::{Builtin, Type};
use lyra::Compiler;

static COUNTER: AtomicU64 = AtomicU64::new(0);

fn temp_project() -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "lyra_e2e_{}_{}_{}",
        std::process::id(),
        nanos,
        COUNTER.fetch_add(1, Ordering::SeqCst)
    ));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_source(root: &Path, relative: &str, contents: &str) {
    let path = root.join(format!("{relative}.lyr"));
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn compile(root: &Path, entry: &str) -> (Compiler, Result<String, CompileError>) {
    let mut compiler = Compiler::new();
    let result = compiler.compile(root, entry);
    (compiler, result)
}

fn failure_codes(result: &Result<String, CompileError>) -> Vec<u16> {
    match result {
        Err(CompileError::Compiler { diagnostics, .. }) => {
            diagnostics.iter().map(|d| d.code).collect()
        }
        other => panic!("expected compiler diagnostics, got {other:?}"),
    }
}

#[test]
fn clean_project_compiles_and_publishes_exports() {
    let root = temp_project();
    write_source(
        &root,
        "main",
        "pub def add(a: int, b: int) -> int { return a + b }\nlet three = add(1, 2)\n",
    );

    let (compiler, result) = compile(&root, "main");
    assert_eq!(result.unwrap(), "main");
    assert!(compiler.reporter.diagnostics().is_empty());

    let (_, unit) = compiler.units.iter().next().unwrap();
    assert_eq!(unit.exports.len(), 1);
    assert_eq!(unit.exports[0].0, "add");
    assert!(matches!(unit.exports[0].1, Type::Function(_)));

    fs::remove_dir_all(root).unwrap();
}

#[test]
fn nested_entry_path_is_dotted() {
    let root = temp_project();
    write_source(&root, "app/main", "let x = 1\n");

    let (_, result) = compile(&root, "app/main");
    assert_eq!(result.unwrap(), "app.main");

    fs::remove_dir_all(root).unwrap();
}

#[test]
fn missing_entry_file_is_a_not_found_error() {
    let root = temp_project();
    let (_, result) = compile(&root, "main");
    assert!(matches!(result, Err(CompileError::NotFound { .. })));
    fs::remove_dir_all(root).unwrap();
}

#[test]
fn missing_module_stops_before_later_passes() {
    let root = temp_project();
    // The type error on the second line would normally be reported too,
    // but the pipeline halts at the parse boundary.
    write_source(&root, "main", "use \"nowhere\"\nlet x = true + 1\n");

    let (_, result) = compile(&root, "main");
    assert_eq!(failure_codes(&result), [13]); // ModuleNotFound

    fs::remove_dir_all(root).unwrap();
}

#[test]
fn syntax_errors_halt_at_the_parse_boundary() {
    let root = temp_project();
    write_source(&root, "main", "def (broken\n");

    let (_, result) = compile(&root, "main");
    let codes = failure_codes(&result);
    assert!(!codes.is_empty());
    assert!(codes.iter().all(|&c| c == 19)); // Syntax

    fs::remove_dir_all(root).unwrap();
}

#[test]
fn redeclaration_is_reported_from_the_environment_pass() {
    let root = temp_project();
    write_source(&root, "main", "let x = 1\nlet x = 2\n");

    let (_, result) = compile(&root, "main");
    assert_eq!(failure_codes(&result), [18]); // Redeclaration

    fs::remove_dir_all(root).unwrap();
}

#[test]
fn return_type_mismatch_is_reported_from_the_type_pass() {
    let root = temp_project();
    write_source(&root, "main", "def f() -> int { return \"no\" }\n");

    let (_, result) = compile(&root, "main");
    assert_eq!(failure_codes(&result), [20]); // ReturnTypeMismatch

    fs::remove_dir_all(root).unwrap();
}

#[test]
fn imports_link_under_qualified_names() {
    let root = temp_project();
    write_source(
        &root,
        "lib",
        "pub def greet(name: string) -> string { return name }\n",
    );
    write_source(
        &root,
        "main",
        "use \"lib\"\nlet g = lib::greet(\"hi\")\n",
    );

    let (compiler, result) = compile(&root, "main");
    assert!(result.is_ok(), "expected clean compile: {result:?}");

    let (main_id, lib_id) = {
        let mut main = None;
        let mut lib = None;
        for (id, unit) in compiler.units.iter() {
            match unit.name.as_str() {
                "main" => main = Some(id),
                "lib" => lib = Some(id),
                other => panic!("unexpected unit {other}"),
            }
        }
        (main.unwrap(), lib.unwrap())
    };

    let main_root = compiler.units.get(main_id).root_scope;
    // The export is visible only under its qualified name.
    let Some(Type::Function(func_id)) = compiler.scopes.lookup(main_root, "lib::greet") else {
        panic!("lib::greet should be linked into main's root scope");
    };
    assert!(compiler.scopes.lookup(main_root, "greet").is_none());
    // Linked functions remember their defining unit.
    assert_eq!(compiler.types.func(*func_id).external, Some(lib_id));

    fs::remove_dir_all(root).unwrap();
}

#[test]
fn imported_types_appear_in_signatures() {
    let root = temp_project();
    write_source(&root, "lib", "pub type Point = struct { x: int, y: int }\n");
    write_source(
        &root,
        "main",
        "use \"lib\"\ndef get_x(p: lib::Point) -> int { return p.x }\nlet x = get_x(lib::Point(1, 2))\n",
    );

    let (compiler, result) = compile(&root, "main");
    assert!(result.is_ok(), "expected clean compile: {result:?}");

    let main_root = compiler
        .units
        .iter()
        .find(|(_, unit)| unit.name == "main")
        .map(|(_, unit)| unit.root_scope)
        .unwrap();
    // The linked struct type flows through the signature to the call site.
    assert_eq!(
        compiler.scopes.lookup(main_root, "x"),
        Some(&Type::Builtin(Builtin::Int))
    );

    fs::remove_dir_all(root).unwrap();
}

#[test]
fn shared_imports_parse_once() {
    let root = temp_project();
    write_source(&root, "shared", "pub let answer = 42\n");
    write_source(&root, "a", "use \"shared\"\npub let a = shared::answer\n");
    write_source(&root, "b", "use \"shared\"\npub let b = shared::answer\n");
    write_source(&root, "main", "use \"a\"\nuse \"b\"\nlet total = a::a + b::b\n");

    let (compiler, result) = compile(&root, "main");
    assert!(result.is_ok(), "expected clean compile: {result:?}");
    assert_eq!(compiler.units.len(), 4);

    fs::remove_dir_all(root).unwrap();
}

#[test]
fn builtin_modules_need_no_files() {
    let root = temp_project();
    write_source(&root, "main", "use \"prelude\"\nprintln(\"hello\")\n");

    let (compiler, result) = compile(&root, "main");
    assert!(result.is_ok(), "expected clean compile: {result:?}");
    assert_eq!(compiler.units.len(), 1);

    fs::remove_dir_all(root).unwrap();
}

#[test]
fn generic_specializations_accumulate_across_units() {
    let root = temp_project();
    write_source(&root, "util", "pub def id[T](x: T) -> T { return x }\n");
    write_source(
        &root,
        "main",
        "use \"util\"\nlet a = util::id(1)\nlet s = util::id(\"s\")\n",
    );

    let (compiler, result) = compile(&root, "main");
    assert!(result.is_ok(), "expected clean compile: {result:?}");

    let main_root = compiler
        .units
        .iter()
        .find(|(_, u)| u.name == "main")
        .map(|(_, u)| u.root_scope)
        .unwrap();
    assert_eq!(
        compiler.scopes.lookup(main_root, "a"),
        Some(&Type::Builtin(Builtin::Int))
    );
    assert_eq!(
        compiler.scopes.lookup(main_root, "s"),
        Some(&Type::Builtin(Builtin::Str))
    );

    let Some(Type::Function(func_id)) = compiler.scopes.lookup(main_root, "util::id") else {
        panic!("util::id should be linked");
    };
    let func = compiler.types.func(*func_id);
    assert_eq!(func.specializations.len(), 2);
    assert_eq!(
        func.specializations[0].get("T"),
        Some(&Type::Builtin(Builtin::Int))
    );
    assert_eq!(
        func.specializations[1].get("T"),
        Some(&Type::Builtin(Builtin::Str))
    );

    fs::remove_dir_all(root).unwrap();
}

#[test]
fn circular_imports_do_not_recurse_forever() {
    let root = temp_project();
    write_source(&root, "a", "use \"b\"\npub let x = 1\n");
    write_source(&root, "b", "use \"a\"\npub let y = 2\n");

    let (compiler, result) = compile(&root, "a");
    assert!(result.is_ok(), "expected clean compile: {result:?}");
    assert_eq!(compiler.units.len(), 2);

    fs::remove_dir_all(root).unwrap();
}

#[test]
fn diagnostics_render_source_context() {
    let root = temp_project();
    write_source(&root, "main", "let x = 1\nlet x = 2\n");

    let (_, result) = compile(&root, "main");
    let Err(CompileError::Compiler { diagnostics, .. }) = result else {
        panic!("expected compiler diagnostics");
    };
    let message = &diagnostics[0].message;
    assert!(message.starts_with("[Redeclaration] in main.lyr[2:"));
    assert!(message.contains("Redeclaration of variable `x`."));
    assert!(message.contains("2: let x = 2"));
    assert!(message.contains('^'));
    assert!(message.contains("You cannot redeclare variables."));

    fs::remove_dir_all(root).unwrap();
}
