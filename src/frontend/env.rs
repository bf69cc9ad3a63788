//! Environment pass
//!
//! First semantic pass over a parsed unit. Declares every binding into the
//! scope chain, allocates a scope for each block and records its handle on
//! the block, materializes struct and function types into the arena, and
//! enforces the purely structural rules: no redeclaration anywhere in the
//! visible chain, no reserved words as field names, no assignment to
//! immutable bindings, no statements after a `return`.
//!
//! Expression types are mostly left for the type-check pass; only literal
//! initializers are inferred here so exports harvested between the passes
//! carry usable types.

use std::path::Path;

use crate::frontend::ast::{Block, Expr, ExprKind, Stmt, TypeExpr};
use crate::frontend::diagnostics::{ErrorCode, Reporter};
use crate::frontend::lexer::is_keyword;
use crate::frontend::modules::builtin_exports;
use crate::frontend::scope::{Mutability, ScopeArena, ScopeId};
use crate::frontend::types::{Builtin, FunctionType, StructType, Type, TypeArena};

pub struct EnvPass<'a> {
    pub scopes: &'a mut ScopeArena,
    pub types: &'a mut TypeArena,
    pub reporter: &'a mut Reporter,
    pub file: &'a Path,
    pub relative_path: &'a str,
}

impl EnvPass<'_> {
    pub fn run(&mut self, statements: &mut [Stmt], root: ScopeId) {
        self.walk_stmts(statements, root);
    }

    fn walk_stmts(&mut self, statements: &mut [Stmt], scope: ScopeId) {
        let mut returned = false;
        for stmt in statements.iter_mut() {
            if returned {
                self.reporter
                    .report(ErrorCode::Unreachable, self.file, stmt.pos(), &[]);
                returned = false; // one diagnostic per dead region
            }
            if matches!(stmt, Stmt::Return { .. }) {
                returned = true;
            }
            self.walk_stmt(stmt, scope);
        }
    }

    fn walk_stmt(&mut self, stmt: &mut Stmt, scope: ScopeId) {
        match stmt {
            Stmt::Use { target, .. } => {
                // Builtin modules bind their exports directly; project
                // modules are wired up by the import and link machinery.
                if let Some(exports) = builtin_exports(target, self.types) {
                    for (name, ty) in exports {
                        self.scopes.declare(scope, name, ty);
                    }
                }
            }
            Stmt::Export { stmt, .. } => self.walk_stmt(stmt, scope),
            Stmt::Let {
                pos,
                name,
                mutable,
                value,
            } => {
                self.check_mutations(value, scope);
                let ty = self.literal_type(value, scope);
                let declared = self
                    .scopes
                    .declare_or_error(scope, name, ty, self.reporter, self.file, *pos);
                // A rejected redeclaration must not touch the original
                // binding's mutability.
                if *mutable && declared {
                    self.scopes.set_mutability(scope, name, Mutability::Mutable);
                }
            }
            Stmt::Def {
                pos,
                name,
                generics,
                params,
                return_type,
                body,
            } => {
                let param_types: Vec<(String, Type)> = params
                    .iter()
                    .map(|p| (p.name.clone(), self.resolve_type(&p.ty, generics, scope)))
                    .collect();
                let mut func = FunctionType::new(name.clone(), param_types.clone(), generics.clone());
                if let Some(ret) = return_type {
                    func.return_type = self.resolve_type(ret, generics, scope);
                }
                let id = self.types.add_func(func);
                self.scopes.declare_or_error(
                    scope,
                    name,
                    Type::Function(id),
                    self.reporter,
                    self.file,
                    *pos,
                );

                let body_scope = self.scopes.new_child(scope);
                body.scope = Some(body_scope);
                for (param, (_, ty)) in params.iter().zip(param_types) {
                    self.scopes.declare_or_error(
                        body_scope,
                        &param.name,
                        ty,
                        self.reporter,
                        self.file,
                        param.pos,
                    );
                }
                self.walk_stmts(&mut body.statements, body_scope);
            }
            Stmt::Struct {
                pos,
                name,
                generics,
                fields,
            } => {
                let mut field_types = Vec::new();
                for field in fields.iter() {
                    if is_keyword(&field.name) {
                        self.reporter.report(
                            ErrorCode::ReservedWord,
                            self.file,
                            field.pos,
                            &[&field.name],
                        );
                    }
                    field_types.push((
                        field.name.clone(),
                        self.resolve_type(&field.ty, generics, scope),
                    ));
                }
                let id = self.types.add_struct(StructType {
                    name: name.clone(),
                    qualified_name: format!("{}${}", self.relative_path, name),
                    fields: field_types,
                    generics: generics.clone(),
                });
                self.scopes.declare_or_error(
                    scope,
                    name,
                    Type::Struct(id),
                    self.reporter,
                    self.file,
                    *pos,
                );
            }
            Stmt::Enum {
                pos,
                name,
                variants,
            } => {
                // Enums are structs whose variants are int-valued fields,
                // so `E.A` resolves through ordinary property access.
                let fields = variants
                    .iter()
                    .map(|v| (v.clone(), Type::Builtin(Builtin::Int)))
                    .collect();
                let id = self.types.add_struct(StructType {
                    name: name.clone(),
                    qualified_name: format!("{}${}", self.relative_path, name),
                    fields,
                    generics: Vec::new(),
                });
                self.scopes.declare_or_error(
                    scope,
                    name,
                    Type::Struct(id),
                    self.reporter,
                    self.file,
                    *pos,
                );
            }
            Stmt::TypeAlias { pos, name, ty } => {
                let resolved = self.resolve_type(ty, &[], scope);
                self.scopes
                    .declare_or_error(scope, name, resolved, self.reporter, self.file, *pos);
            }
            Stmt::If {
                condition,
                then_block,
                else_branch,
                ..
            } => {
                self.check_mutations(condition, scope);
                self.walk_block(then_block, scope);
                if let Some(else_branch) = else_branch {
                    self.walk_stmt(else_branch, scope);
                }
            }
            Stmt::While {
                condition, body, ..
            } => {
                self.check_mutations(condition, scope);
                self.walk_block(body, scope);
            }
            Stmt::For {
                name,
                iterable,
                body,
                ..
            } => {
                self.check_mutations(iterable, scope);
                let body_scope = self.scopes.new_child(scope);
                body.scope = Some(body_scope);
                // The loop variable's type is pinned by the type-check
                // pass once the iterable's element type is known.
                self.scopes.declare(body_scope, name.clone(), Type::UNKNOWN);
                self.walk_stmts(&mut body.statements, body_scope);
            }
            Stmt::Match {
                scrutinee, cases, ..
            } => {
                self.check_mutations(scrutinee, scope);
                for case in cases.iter_mut() {
                    let case_ty = self.resolve_type(&case.ty, &[], scope);
                    let case_scope = self.scopes.new_child(scope);
                    case.body.scope = Some(case_scope);
                    self.scopes.declare(case_scope, case.binding.clone(), case_ty);
                    self.walk_stmts(&mut case.body.statements, case_scope);
                }
            }
            Stmt::Return { value, .. } => {
                if let Some(value) = value {
                    self.check_mutations(value, scope);
                }
            }
            Stmt::Block(block) => self.walk_block(block, scope),
            Stmt::ExprStmt { expr, .. } => self.check_mutations(expr, scope),
        }
    }

    fn walk_block(&mut self, block: &mut Block, parent: ScopeId) {
        let scope = self.scopes.new_child(parent);
        block.scope = Some(scope);
        self.walk_stmts(&mut block.statements, scope);
    }

    /// Resolve a written type against builtins, the generic parameters in
    /// force, and names visible in the scope chain. Unresolvable names stay
    /// as named unknowns for the type-check pass to retry or diagnose.
    fn resolve_type(&mut self, ty: &TypeExpr, generics: &[String], scope: ScopeId) -> Type {
        match ty {
            TypeExpr::Name { name, list, .. } => {
                let base = if generics.iter().any(|g| g == name) {
                    Type::Generic(name.clone())
                } else if let Some(builtin) = Builtin::from_name(name) {
                    Type::Builtin(builtin)
                } else if let Some(found) = self.scopes.lookup(scope, name) {
                    found.clone()
                } else {
                    Type::named_unknown(name.clone())
                };
                if *list {
                    Type::List(Box::new(base))
                } else {
                    base
                }
            }
            TypeExpr::Union { members, .. } => Type::Union(
                members
                    .iter()
                    .map(|m| self.resolve_type(m, generics, scope))
                    .collect(),
            ),
        }
    }

    /// Infer the type of a literal initializer. Anything that needs name
    /// resolution or operator rules is left unknown for the next pass.
    fn literal_type(&mut self, expr: &Expr, scope: ScopeId) -> Type {
        match &expr.kind {
            ExprKind::Int(_) => Type::Builtin(Builtin::Int),
            ExprKind::Float(_) => Type::Builtin(Builtin::Float),
            ExprKind::Double(_) => Type::Builtin(Builtin::Double),
            ExprKind::Str(_) => Type::Builtin(Builtin::Str),
            ExprKind::Char(_) => Type::Builtin(Builtin::Char),
            ExprKind::Bool(_) => Type::Builtin(Builtin::Bool),
            ExprKind::List(elements) => match elements.first() {
                Some(first) => {
                    let elem = self.literal_type(first, scope);
                    Type::List(Box::new(elem))
                }
                None => Type::UNKNOWN,
            },
            ExprKind::EmptyList { elem } => {
                let base = Builtin::from_name(elem)
                    .map(Type::Builtin)
                    .or_else(|| self.scopes.lookup(scope, elem).cloned())
                    .unwrap_or_else(|| Type::named_unknown(elem.clone()));
                Type::List(Box::new(base))
            }
            ExprKind::Unary { operand, .. } => self.literal_type(operand, scope),
            ExprKind::Grouping(inner) => self.literal_type(inner, scope),
            _ => Type::UNKNOWN,
        }
    }

    /// Find assignments buried in an expression and reject writes to
    /// immutable bindings. Unknown targets are left for identifier
    /// resolution to report.
    fn check_mutations(&mut self, expr: &Expr, scope: ScopeId) {
        match &expr.kind {
            ExprKind::Assign { target, value } => {
                if let ExprKind::Ident(name) = &target.kind {
                    if self.scopes.lookup_mutability(scope, name) == Some(Mutability::Immutable) {
                        self.reporter.report(
                            ErrorCode::MutabilityViolation,
                            self.file,
                            target.pos,
                            &[name],
                        );
                    }
                }
                self.check_mutations(value, scope);
            }
            ExprKind::Binary { lhs, rhs, .. } => {
                self.check_mutations(lhs, scope);
                self.check_mutations(rhs, scope);
            }
            ExprKind::Unary { operand, .. } | ExprKind::Postfix { operand, .. } => {
                self.check_mutations(operand, scope);
            }
            ExprKind::Call { callee, args } => {
                self.check_mutations(callee, scope);
                for arg in args {
                    self.check_mutations(arg, scope);
                }
            }
            ExprKind::Property { object, .. } => self.check_mutations(object, scope),
            ExprKind::List(elements) => {
                for element in elements {
                    self.check_mutations(element, scope);
                }
            }
            ExprKind::Grouping(inner) => self.check_mutations(inner, scope),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parser::parse;
    use std::path::PathBuf;

    struct Fixture {
        scopes: ScopeArena,
        types: TypeArena,
        reporter: Reporter,
        statements: Vec<Stmt>,
        root: ScopeId,
    }

    fn run(source: &str) -> Fixture {
        let (mut statements, errors) = parse(source);
        assert!(errors.is_empty(), "unexpected parse errors: {errors:?}");
        let mut scopes = ScopeArena::new();
        let mut types = TypeArena::new();
        let mut reporter = Reporter::new();
        let root = scopes.new_root();
        let file = PathBuf::from("test.lyr");
        EnvPass {
            scopes: &mut scopes,
            types: &mut types,
            reporter: &mut reporter,
            file: &file,
            relative_path: "test",
        }
        .run(&mut statements, root);
        Fixture {
            scopes,
            types,
            reporter,
            statements,
            root,
        }
    }

    fn codes(fixture: &Fixture) -> Vec<u16> {
        fixture
            .reporter
            .diagnostics()
            .iter()
            .map(|d| d.code)
            .collect()
    }

    #[test]
    fn declares_let_with_literal_type() {
        let f = run("let x = 3\nlet s = \"hi\"");
        assert_eq!(
            f.scopes.lookup(f.root, "x"),
            Some(&Type::Builtin(Builtin::Int))
        );
        assert_eq!(
            f.scopes.lookup(f.root, "s"),
            Some(&Type::Builtin(Builtin::Str))
        );
        assert!(codes(&f).is_empty());
    }

    #[test]
    fn rejects_redeclaration_at_top_level() {
        let f = run("let x = 1\nlet x = 2");
        assert_eq!(codes(&f), [ErrorCode::Redeclaration as u16]);
    }

    #[test]
    fn rejected_mut_redeclaration_leaves_the_original_immutable() {
        let f = run("let x = 1\nmut x = 2");
        assert_eq!(codes(&f), [ErrorCode::Redeclaration as u16]);
        assert_eq!(
            f.scopes.lookup_mutability(f.root, "x"),
            Some(Mutability::Immutable)
        );
    }

    #[test]
    fn function_params_become_generics() {
        let f = run("def id[T](x: T) -> T { return x }");
        let Some(Type::Function(id)) = f.scopes.lookup(f.root, "id") else {
            panic!("id should be a function");
        };
        let func = f.types.func(*id);
        assert_eq!(func.params[0].1, Type::Generic("T".to_string()));
        assert_eq!(func.return_type, Type::Generic("T".to_string()));
    }

    #[test]
    fn blocks_receive_scope_handles() {
        let f = run("def main() { let y = 1 }");
        match &f.statements[0] {
            Stmt::Def { body, .. } => {
                let scope = body.scope.unwrap();
                assert!(f.scopes.lookup(scope, "y").is_some());
                assert!(f.scopes.lookup(f.root, "y").is_none());
            }
            other => panic!("expected def, got {other:?}"),
        }
    }

    #[test]
    fn struct_fields_may_not_be_reserved_words() {
        let f = run("type Bad = struct { match: int }");
        assert_eq!(codes(&f), [ErrorCode::ReservedWord as u16]);
    }

    #[test]
    fn enums_expose_int_variants() {
        let f = run("type Color = enum { Red, Green }");
        let Some(Type::Struct(id)) = f.scopes.lookup(f.root, "Color") else {
            panic!("Color should resolve to a type");
        };
        let st = f.types.struct_(*id);
        assert_eq!(st.field("Red"), Some(&Type::Builtin(Builtin::Int)));
        assert_eq!(st.qualified_name, "test$Color");
    }

    #[test]
    fn assignment_to_immutable_binding_is_rejected() {
        let f = run("let x = 1\nx = 2");
        assert_eq!(codes(&f), [ErrorCode::MutabilityViolation as u16]);
    }

    #[test]
    fn mut_binding_accepts_assignment() {
        let f = run("mut x = 1\nx = 2");
        assert!(codes(&f).is_empty());
    }

    #[test]
    fn statements_after_return_are_unreachable() {
        let f = run("def f() -> int { return 1\nlet dead = 2 }");
        assert_eq!(codes(&f), [ErrorCode::Unreachable as u16]);
    }

    #[test]
    fn builtin_use_binds_exports_unqualified() {
        let f = run("use \"prelude\"");
        assert!(matches!(
            f.scopes.lookup(f.root, "println"),
            Some(Type::Function(_))
        ));
    }
}
