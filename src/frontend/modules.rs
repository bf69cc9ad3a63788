//! Builtin modules
//!
//! A small set of module names resolve against the host runtime instead of
//! the project tree. `use "prelude"` and `use "io"` bind their exports
//! directly into the importing unit's root scope, unqualified.

use crate::frontend::types::{Builtin, FunctionType, Type, TypeArena};

pub const BUILTIN_MODULES: [&str; 2] = ["prelude", "io"];

pub fn is_builtin(name: &str) -> bool {
    BUILTIN_MODULES.contains(&name)
}

/// Materialize a builtin module's exports into the arena. Returns `None`
/// for names that are not builtin modules.
pub fn builtin_exports(name: &str, types: &mut TypeArena) -> Option<Vec<(String, Type)>> {
    let signatures: &[(&str, &[Builtin], Builtin)] = match name {
        "prelude" => &[
            ("println", &[Builtin::Any], Builtin::Void),
            ("print", &[Builtin::Any], Builtin::Void),
            ("input", &[Builtin::Str], Builtin::Str),
        ],
        "io" => &[
            ("read_file", &[Builtin::Str], Builtin::Str),
            ("write_file", &[Builtin::Str, Builtin::Str], Builtin::Void),
        ],
        _ => return None,
    };

    let exports = signatures
        .iter()
        .map(|(func_name, params, ret)| {
            let params = params
                .iter()
                .enumerate()
                .map(|(i, b)| (format!("arg{i}"), Type::Builtin(*b)))
                .collect();
            let mut func = FunctionType::new(*func_name, params, Vec::new());
            func.return_type = Type::Builtin(*ret);
            let id = types.add_func(func);
            (func_name.to_string(), Type::Function(id))
        })
        .collect();
    Some(exports)
}
