//! Scoped symbol environment
//!
//! Scopes live in an arena and reference their parent by index; lookup
//! walks the chain root-ward. Each scope keeps an insertion-ordered
//! name→type table plus a parallel mutability table. Redeclaration is
//! rejected against the *entire* visible chain - Lyra has no shadowing.

use crate::frontend::ast::Position;
use crate::frontend::diagnostics::{ErrorCode, Reporter};
use crate::frontend::types::Type;
use std::path::Path;

/// Handle into [`ScopeArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutability {
    Immutable,
    Mutable,
}

/// One lexical scope. Entries stay in declaration order so pass output is
/// deterministic.
#[derive(Debug)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    entries: Vec<(String, Type)>,
    mutability: Vec<(String, Mutability)>,
}

impl Scope {
    fn new(parent: Option<ScopeId>) -> Self {
        Self {
            parent,
            entries: Vec::new(),
            mutability: Vec::new(),
        }
    }

    fn get(&self, name: &str) -> Option<&Type> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, t)| t)
    }

    fn get_mutability(&self, name: &str) -> Option<Mutability> {
        self.mutability
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, m)| *m)
    }
}

/// Arena owning every scope of one compilation.
#[derive(Debug, Default)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
}

impl ScopeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh root scope (used once per source unit).
    pub fn new_root(&mut self) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope::new(None));
        id
    }

    /// Allocate a child scope under `parent`.
    pub fn new_child(&mut self, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope::new(Some(parent)));
        id
    }

    /// Unconditional insert into `scope`'s own table; mutability defaults
    /// to immutable.
    pub fn declare(&mut self, scope: ScopeId, name: impl Into<String>, ty: Type) {
        let name = name.into();
        let s = &mut self.scopes[scope.0];
        s.entries.push((name.clone(), ty));
        s.mutability.push((name, Mutability::Immutable));
    }

    /// Declare `name` unless it is already visible anywhere in the chain,
    /// in which case a redeclaration diagnostic is reported and the scope
    /// is left unchanged. Returns whether the declaration happened.
    pub fn declare_or_error(
        &mut self,
        scope: ScopeId,
        name: &str,
        ty: Type,
        reporter: &mut Reporter,
        file: &Path,
        pos: Position,
    ) -> bool {
        if self.lookup(scope, name).is_some() {
            reporter.report(ErrorCode::Redeclaration, file, pos, &[name]);
            false
        } else {
            self.declare(scope, name, ty);
            true
        }
    }

    /// Chain-walking lookup from `scope` toward the root.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<&Type> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = &self.scopes[id.0];
            if let Some(ty) = s.get(name) {
                return Some(ty);
            }
            current = s.parent;
        }
        None
    }

    /// Chain-walking mutability lookup, same shape as [`Self::lookup`].
    pub fn lookup_mutability(&self, scope: ScopeId, name: &str) -> Option<Mutability> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = &self.scopes[id.0];
            if let Some(m) = s.get_mutability(name) {
                return Some(m);
            }
            current = s.parent;
        }
        None
    }

    /// Overwrite the mutability of a name declared in *this* scope's own
    /// table; no chain walk, silently ignored when absent.
    pub fn set_mutability(&mut self, scope: ScopeId, name: &str, m: Mutability) {
        let s = &mut self.scopes[scope.0];
        if let Some(entry) = s.mutability.iter_mut().find(|(n, _)| n == name) {
            entry.1 = m;
        }
    }

    /// Overwrite the type of a name declared in *this* scope's own table;
    /// used to upgrade a binding after inference. No chain walk.
    pub fn set_type(&mut self, scope: ScopeId, name: &str, ty: Type) {
        let s = &mut self.scopes[scope.0];
        if let Some(entry) = s.entries.iter_mut().find(|(n, _)| n == name) {
            entry.1 = ty;
        }
    }

    /// Ordered view of a scope's own entries (export harvesting).
    pub fn entries(&self, scope: ScopeId) -> &[(String, Type)] {
        &self.scopes[scope.0].entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::types::Builtin;

    const INT: Type = Type::Builtin(Builtin::Int);
    const STR: Type = Type::Builtin(Builtin::Str);

    #[test]
    fn lookup_walks_the_chain() {
        let mut scopes = ScopeArena::new();
        let root = scopes.new_root();
        let child = scopes.new_child(root);

        scopes.declare(root, "x", INT);
        assert_eq!(scopes.lookup(child, "x"), Some(&INT));
        assert_eq!(scopes.lookup(root, "x"), Some(&INT));
        assert_eq!(scopes.lookup(child, "y"), None);
    }

    #[test]
    fn declare_is_unconditional_and_immutable_by_default() {
        let mut scopes = ScopeArena::new();
        let root = scopes.new_root();
        scopes.declare(root, "x", INT);
        assert_eq!(
            scopes.lookup_mutability(root, "x"),
            Some(Mutability::Immutable)
        );
    }

    #[test]
    fn redeclaration_in_ancestor_scope_is_rejected() {
        let mut scopes = ScopeArena::new();
        let root = scopes.new_root();
        let child = scopes.new_child(root);
        scopes.declare(root, "x", INT);

        let mut reporter = Reporter::new();
        scopes.declare_or_error(
            child,
            "x",
            STR,
            &mut reporter,
            Path::new("test.lyr"),
            Position::new(1, 1),
        );

        assert_eq!(reporter.diagnostics().len(), 1);
        assert_eq!(
            reporter.diagnostics()[0].code,
            ErrorCode::Redeclaration as u16
        );
        // The child's own table is untouched; lookup still sees the root's.
        assert_eq!(scopes.lookup(child, "x"), Some(&INT));
        assert!(scopes.entries(child).is_empty());
    }

    #[test]
    fn set_type_only_touches_own_table() {
        let mut scopes = ScopeArena::new();
        let root = scopes.new_root();
        let child = scopes.new_child(root);
        scopes.declare(root, "x", INT);

        // No chain walk: the child does not own `x`, so nothing changes.
        scopes.set_type(child, "x", STR);
        assert_eq!(scopes.lookup(child, "x"), Some(&INT));

        scopes.set_type(root, "x", STR);
        assert_eq!(scopes.lookup(child, "x"), Some(&STR));
    }

    #[test]
    fn set_mutability_upgrades_declared_binding() {
        let mut scopes = ScopeArena::new();
        let root = scopes.new_root();
        scopes.declare(root, "x", INT);
        scopes.set_mutability(root, "x", Mutability::Mutable);
        assert_eq!(
            scopes.lookup_mutability(root, "x"),
            Some(Mutability::Mutable)
        );
    }
}
