//! Compilation units and the set that owns them
//!
//! A [`SourceUnit`] is one parsed `.lyr` file plus the per-unit state the
//! passes fill in: its root scope, the exports it publishes, and the units
//! it imports. The [`CompilationSet`] registers units by normalized path,
//! keeps them in first-seen order, and hands out stable [`UnitId`]s so
//! later passes can reference units without borrowing them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::frontend::ast::Stmt;
use crate::frontend::scope::ScopeId;
use crate::frontend::types::Type;

/// Stable index of a unit inside a [`CompilationSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnitId(pub usize);

#[derive(Debug)]
pub struct SourceUnit {
    /// Normalized absolute path of the source file.
    pub path: PathBuf,
    /// Bare unit name, the file stem. Qualified imports use this prefix.
    pub name: String,
    /// Path relative to the project root, without the extension. Forward
    /// slashes regardless of platform.
    pub relative_path: String,
    pub statements: Vec<Stmt>,
    pub root_scope: ScopeId,
    /// Publicly visible bindings, harvested after the environment pass.
    /// Insertion order follows declaration order in the file.
    pub exports: Vec<(String, Type)>,
    /// Units named by `use` statements, in source order.
    pub imports: Vec<(String, UnitId)>,
}

impl SourceUnit {
    pub fn new(path: PathBuf, relative_path: String, root_scope: ScopeId) -> Self {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path,
            name,
            relative_path,
            statements: Vec::new(),
            root_scope,
            exports: Vec::new(),
            imports: Vec::new(),
        }
    }

    /// Relative path with directory separators replaced by dots, the shape
    /// downstream backends expect for emitted artifact names.
    pub fn dotted_path(&self) -> String {
        self.relative_path.replace('/', ".")
    }
}

/// All units of a compilation, keyed by normalized path. Registration
/// happens before a unit's imports are scanned, so import cycles resolve
/// to the already-registered entry instead of recursing forever.
#[derive(Debug, Default)]
pub struct CompilationSet {
    units: Vec<SourceUnit>,
    by_path: HashMap<PathBuf, UnitId>,
}

impl CompilationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, unit: SourceUnit) -> UnitId {
        let id = UnitId(self.units.len());
        self.by_path.insert(unit.path.clone(), id);
        self.units.push(unit);
        id
    }

    pub fn lookup(&self, path: &Path) -> Option<UnitId> {
        self.by_path.get(path).copied()
    }

    pub fn get(&self, id: UnitId) -> &SourceUnit {
        &self.units[id.0]
    }

    pub fn get_mut(&mut self, id: UnitId) -> &mut SourceUnit {
        &mut self.units[id.0]
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Units in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (UnitId, &SourceUnit)> {
        self.units.iter().enumerate().map(|(i, u)| (UnitId(i), u))
    }

    pub fn ids(&self) -> impl Iterator<Item = UnitId> {
        (0..self.units.len()).map(UnitId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(path: &str, rel: &str) -> SourceUnit {
        SourceUnit::new(PathBuf::from(path), rel.to_string(), ScopeId(0))
    }

    #[test]
    fn registration_order_is_preserved() {
        let mut set = CompilationSet::new();
        set.add(unit("/p/main.lyr", "main"));
        set.add(unit("/p/util/math.lyr", "util/math"));

        let names: Vec<_> = set.iter().map(|(_, u)| u.name.as_str()).collect();
        assert_eq!(names, ["main", "math"]);
    }

    #[test]
    fn lookup_by_normalized_path() {
        let mut set = CompilationSet::new();
        let id = set.add(unit("/p/main.lyr", "main"));
        assert_eq!(set.lookup(Path::new("/p/main.lyr")), Some(id));
        assert_eq!(set.lookup(Path::new("/p/other.lyr")), None);
    }

    #[test]
    fn dotted_path_swaps_separators() {
        let u = unit("/p/util/math.lyr", "util/math");
        assert_eq!(u.dotted_path(), "util.math");
    }
}
