//! Compilation driver
//!
//! Owns the reporter, the unit set, and the two arenas, and runs the
//! pipeline over them: parse the entry unit and everything it transitively
//! imports, run the environment pass and harvest exports, link imports
//! into each unit's root scope under qualified names, then type-check.
//! Each stage ends with a hard boundary; diagnostics from one stage stop
//! the pipeline before the next runs, so later passes can trust the
//! structures the earlier ones built.

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::frontend::ast::Stmt;
use crate::frontend::diagnostics::{CompileError, ErrorCode, Reporter};
use crate::frontend::env::EnvPass;
use crate::frontend::modules::is_builtin;
use crate::frontend::parser::parse;
use crate::frontend::scope::ScopeArena;
use crate::frontend::typecheck::TypeCheck;
use crate::frontend::types::{Type, TypeArena};
use crate::frontend::unit::{CompilationSet, SourceUnit, UnitId};

pub const SOURCE_EXTENSION: &str = "lyr";

#[derive(Debug, Default)]
pub struct Compiler {
    pub reporter: Reporter,
    pub units: CompilationSet,
    pub scopes: ScopeArena,
    pub types: TypeArena,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile the project rooted at `project_root`, starting from `entry`
    /// (a root-relative path, with or without the source extension).
    /// Returns the entry unit's dotted output path on success.
    pub fn compile(&mut self, project_root: &Path, entry: &str) -> Result<String, CompileError> {
        let relative = entry
            .trim_end_matches(&format!(".{SOURCE_EXTENSION}"))
            .replace('\\', "/");
        let entry_path = normalize(&project_root.join(format!("{relative}.{SOURCE_EXTENSION}")));
        if !entry_path.is_file() {
            return Err(CompileError::NotFound {
                path: entry_path.display().to_string(),
            });
        }

        let entry_id = self.parse_unit(project_root, entry_path, relative)?;
        self.reporter
            .kill_if_errors("Correct parser errors before continuing.")?;

        self.run_env_pass();
        self.harvest_exports();
        self.reporter
            .kill_if_errors("Correct environment errors before continuing.")?;

        self.link_imports();

        self.run_typecheck_pass();
        self.reporter
            .kill_if_errors("Correct type errors before continuing.")?;

        Ok(self.units.get(entry_id).dotted_path())
    }

    /// Parse one unit and queue everything it imports. The unit registers
    /// into the set *before* its imports are scanned, so circular and
    /// repeated imports resolve to the existing entry instead of parsing
    /// the same file twice.
    fn parse_unit(
        &mut self,
        project_root: &Path,
        path: PathBuf,
        relative: String,
    ) -> Result<UnitId, CompileError> {
        debug!(path = %path.display(), "parsing unit");
        let source = fs::read_to_string(&path).map_err(|_| CompileError::NotFound {
            path: path.display().to_string(),
        })?;

        let root_scope = self.scopes.new_root();
        let id = self.units.add(SourceUnit::new(path.clone(), relative, root_scope));

        let (statements, errors) = parse(&source);
        for error in &errors {
            self.reporter
                .report(ErrorCode::Syntax, &path, error.pos, &[&error.message]);
        }

        let importing_dir = match path.parent() {
            Some(parent) => parent.to_path_buf(),
            None => project_root.to_path_buf(),
        };
        let mut imports = Vec::new();
        for stmt in &statements {
            let Stmt::Use { pos, target } = stmt else {
                continue;
            };
            // Targets resolve relative to the importing file; a real file
            // wins over a builtin module of the same name.
            let target_relative = target.replace('\\', "/");
            let target_path =
                normalize(&importing_dir.join(format!("{target_relative}.{SOURCE_EXTENSION}")));
            let import_id = if let Some(existing) = self.units.lookup(&target_path) {
                existing
            } else if target_path.is_file() {
                let unit_relative = target_path
                    .strip_prefix(project_root)
                    .ok()
                    .map(|p| p.with_extension(""))
                    .map(|p| p.to_string_lossy().replace('\\', "/"))
                    .unwrap_or_else(|| target_relative.clone());
                self.parse_unit(project_root, target_path, unit_relative)?
            } else if is_builtin(target) {
                continue;
            } else {
                self.reporter
                    .report(ErrorCode::ModuleNotFound, &path, *pos, &[target]);
                continue;
            };
            let import_name = self.units.get(import_id).name.clone();
            imports.push((import_name, import_id));
        }

        let unit = self.units.get_mut(id);
        unit.statements = statements;
        unit.imports = imports;
        Ok(id)
    }

    fn run_env_pass(&mut self) {
        for id in self.unit_ids() {
            let (path, relative, root) = {
                let unit = self.units.get(id);
                (unit.path.clone(), unit.relative_path.clone(), unit.root_scope)
            };
            debug!(unit = %relative, "environment pass");
            let mut statements = std::mem::take(&mut self.units.get_mut(id).statements);
            let mut diagnostics = Reporter::new();
            EnvPass {
                scopes: &mut self.scopes,
                types: &mut self.types,
                reporter: &mut diagnostics,
                file: &path,
                relative_path: &relative,
            }
            .run(&mut statements, root);
            self.reporter.merge(diagnostics);
            self.units.get_mut(id).statements = statements;
        }
    }

    /// Record each unit's `pub` declarations, in declaration order, with
    /// the types the environment pass resolved for them.
    fn harvest_exports(&mut self) {
        for id in self.unit_ids() {
            let unit = self.units.get(id);
            let root = unit.root_scope;
            let names: Vec<String> = unit
                .statements
                .iter()
                .filter_map(|stmt| match stmt {
                    Stmt::Export { stmt, .. } => stmt.declared_name().map(String::from),
                    _ => None,
                })
                .collect();

            let mut exports = Vec::new();
            for name in names {
                if let Some(ty) = self.scopes.lookup(root, &name) {
                    exports.push((name, ty.clone()));
                }
            }
            debug!(unit = %self.units.get(id).relative_path, count = exports.len(), "harvested exports");
            self.units.get_mut(id).exports = exports;
        }
    }

    /// Bind every import's exports into the importing unit's root scope
    /// under `unitName::exportedName`. Imported functions are marked with
    /// their defining unit so backends can emit cross-unit references.
    fn link_imports(&mut self) {
        for id in self.unit_ids() {
            let imports = self.units.get(id).imports.clone();
            let root = self.units.get(id).root_scope;
            for (import_name, import_id) in imports {
                let exports = self.units.get(import_id).exports.clone();
                for (export_name, ty) in exports {
                    if let Type::Function(func_id) = &ty {
                        self.types.func_mut(*func_id).external = Some(import_id);
                    }
                    let qualified = format!("{import_name}::{export_name}");
                    debug!(unit = %self.units.get(id).relative_path, name = %qualified, "linking import");
                    self.scopes.declare(root, qualified, ty);
                }
            }
        }
    }

    fn run_typecheck_pass(&mut self) {
        for id in self.unit_ids() {
            let (path, root) = {
                let unit = self.units.get(id);
                (unit.path.clone(), unit.root_scope)
            };
            debug!(unit = %self.units.get(id).relative_path, "type-check pass");
            let mut statements = std::mem::take(&mut self.units.get_mut(id).statements);
            let mut diagnostics = Reporter::new();
            TypeCheck::new(&mut self.scopes, &mut self.types, &mut diagnostics, &path)
                .run(&mut statements, root);
            self.reporter.merge(diagnostics);
            self.units.get_mut(id).statements = statements;
        }
    }

    fn unit_ids(&self) -> Vec<UnitId> {
        self.units.ids().collect()
    }
}

/// Textual path normalization: drops `.` components and resolves `..`
/// against the path itself, without touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component.as_os_str());
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_resolves_dot_segments() {
        assert_eq!(
            normalize(Path::new("/p/util/../main.lyr")),
            PathBuf::from("/p/main.lyr")
        );
        assert_eq!(
            normalize(Path::new("/p/./lib/math.lyr")),
            PathBuf::from("/p/lib/math.lyr")
        );
    }
}
