//! Type-check pass
//!
//! Second semantic pass. Re-enters the scopes the environment pass
//! allocated, resolves every identifier, assigns a type to every
//! expression, and enforces the operator, call, assignment, return, loop,
//! and match rules. Generic functions collect one specialization per call
//! site, in discovery order, for downstream backends.
//!
//! Unknown types deliberately short-circuit most checks: a name that
//! already produced a diagnostic should not cascade into a wall of
//! follow-on errors.

use std::path::Path;

use crate::frontend::ast::{BinOp, Expr, ExprKind, MatchCase, Position, Stmt, UnOp};
use crate::frontend::diagnostics::{ErrorCode, Reporter};
use crate::frontend::scope::{ScopeArena, ScopeId};
use crate::frontend::types::{
    types_match, widen, Builtin, FuncId, Type, TypeArena,
};

pub struct TypeCheck<'a> {
    scopes: &'a mut ScopeArena,
    types: &'a mut TypeArena,
    reporter: &'a mut Reporter,
    file: &'a Path,
    func_stack: Vec<FuncId>,
}

impl<'a> TypeCheck<'a> {
    pub fn new(
        scopes: &'a mut ScopeArena,
        types: &'a mut TypeArena,
        reporter: &'a mut Reporter,
        file: &'a Path,
    ) -> Self {
        Self {
            scopes,
            types,
            reporter,
            file,
            func_stack: Vec::new(),
        }
    }

    pub fn run(&mut self, statements: &mut [Stmt], root: ScopeId) {
        self.walk_stmts(statements, root);
    }

    fn walk_stmts(&mut self, statements: &mut [Stmt], scope: ScopeId) {
        for stmt in statements.iter_mut() {
            self.walk_stmt(stmt, scope);
        }
    }

    fn walk_stmt(&mut self, stmt: &mut Stmt, scope: ScopeId) {
        match stmt {
            Stmt::Use { .. } => {}
            Stmt::Export { stmt, .. } => self.walk_stmt(stmt, scope),
            Stmt::Let { name, value, .. } => {
                let value_ty = self.check_expr(value, scope);
                // Bindings the environment pass could not type from a
                // literal are pinned now.
                let needs_refinement = matches!(
                    self.scopes.lookup(scope, name),
                    Some(Type::Unknown(_))
                );
                if needs_refinement && !matches!(value_ty, Type::Unknown(_)) {
                    self.scopes.set_type(scope, name, value_ty);
                }
            }
            Stmt::Def { name, body, .. } => {
                let func_id = match self.scopes.lookup(scope, name) {
                    Some(Type::Function(id)) => Some(*id),
                    _ => None,
                };
                let body_scope = body.scope.unwrap_or(scope);
                if let Some(id) = func_id {
                    self.refresh_signature(id, scope, body_scope);
                    self.func_stack.push(id);
                }
                self.walk_stmts(&mut body.statements, body_scope);
                if func_id.is_some() {
                    self.func_stack.pop();
                }
            }
            Stmt::Struct { .. } | Stmt::Enum { .. } | Stmt::TypeAlias { .. } => {}
            Stmt::If {
                condition,
                then_block,
                else_branch,
                ..
            } => {
                self.check_expr(condition, scope);
                let then_scope = then_block.scope.unwrap_or(scope);
                self.walk_stmts(&mut then_block.statements, then_scope);
                if let Some(else_branch) = else_branch {
                    self.walk_stmt(else_branch, scope);
                }
            }
            Stmt::While {
                condition, body, ..
            } => {
                self.check_expr(condition, scope);
                let body_scope = body.scope.unwrap_or(scope);
                self.walk_stmts(&mut body.statements, body_scope);
            }
            Stmt::For {
                name,
                iterable,
                body,
                ..
            } => {
                let iterable_ty = self.check_expr(iterable, scope);
                let body_scope = body.scope.unwrap_or(scope);
                match self.resolve_deferred(iterable_ty, scope) {
                    Type::List(elem) => {
                        self.scopes.set_type(body_scope, name, *elem);
                    }
                    Type::Unknown(_) => {}
                    other => {
                        let shown = other.name(self.types);
                        self.reporter.report(
                            ErrorCode::NotIterable,
                            self.file,
                            iterable.pos,
                            &[&shown],
                        );
                    }
                }
                self.walk_stmts(&mut body.statements, body_scope);
            }
            Stmt::Match {
                pos,
                scrutinee,
                cases,
            } => {
                self.check_match(*pos, scrutinee, cases, scope);
            }
            Stmt::Return { pos, value } => self.check_return(*pos, value.as_mut(), scope),
            Stmt::Block(block) => {
                let block_scope = block.scope.unwrap_or(scope);
                self.walk_stmts(&mut block.statements, block_scope);
            }
            Stmt::ExprStmt { expr, .. } => {
                self.check_expr(expr, scope);
            }
        }
    }

    fn check_match(
        &mut self,
        pos: Position,
        scrutinee: &mut Expr,
        cases: &mut [MatchCase],
        scope: ScopeId,
    ) {
        let scrutinee_ty = self.check_expr(scrutinee, scope);
        let scrutinee_ty = self.resolve_deferred(scrutinee_ty, scope);

        match &scrutinee_ty {
            Type::Union(members) => {
                let mut covered: Vec<Type> = Vec::new();
                for case in cases.iter() {
                    if let Some(case_scope) = case.body.scope {
                        if let Some(ty) = self.scopes.lookup(case_scope, &case.binding) {
                            covered.push(ty.clone());
                        }
                    }
                }
                let missing: Vec<String> = members
                    .iter()
                    .filter(|m| !covered.contains(m))
                    .map(|m| m.name(self.types))
                    .collect();
                if !missing.is_empty() {
                    let union_name = scrutinee_ty.name(self.types);
                    let missing = missing.join(", ");
                    self.reporter.report(
                        ErrorCode::MatchCoverage,
                        self.file,
                        pos,
                        &[&union_name, &missing],
                    );
                }
            }
            Type::Unknown(_) => {}
            _ => {
                let shown = match &scrutinee.kind {
                    ExprKind::Ident(name) => name.clone(),
                    _ => scrutinee_ty.name(self.types),
                };
                self.reporter
                    .report(ErrorCode::TypeNotResolved, self.file, scrutinee.pos, &[&shown]);
            }
        }

        for case in cases.iter_mut() {
            let case_scope = case.body.scope.unwrap_or(scope);
            self.walk_stmts(&mut case.body.statements, case_scope);
        }
    }

    /// Signatures naming a type declared later in the file, or linked in
    /// from an import, are still unresolved after the environment pass.
    /// A second lookup before the body is checked pins them down, both on
    /// the arena function and on the parameter bindings in the body scope.
    fn refresh_signature(&mut self, id: FuncId, scope: ScopeId, body_scope: ScopeId) {
        let func = self.types.func(id).clone();
        let params: Vec<(String, Type)> = func
            .params
            .into_iter()
            .map(|(name, ty)| {
                let ty = self.resolve_deferred(ty, scope);
                (name, ty)
            })
            .collect();
        let return_type = self.resolve_deferred(func.return_type, scope);
        for (name, ty) in &params {
            let stale = matches!(
                self.scopes.lookup(body_scope, name),
                Some(Type::Unknown(_))
            );
            if stale && !matches!(ty, Type::Unknown(_)) {
                self.scopes.set_type(body_scope, name, ty.clone());
            }
        }
        let func = self.types.func_mut(id);
        func.params = params;
        func.return_type = return_type;
    }

    fn check_return(&mut self, pos: Position, value: Option<&mut Expr>, scope: ScopeId) {
        let func_id = match self.func_stack.last() {
            Some(id) => *id,
            None => return,
        };
        let func = self.types.func(func_id).clone();
        let expected = func.return_type.clone();

        match value {
            None => {
                if !expected.is_void() {
                    let expected_name = expected.name(self.types);
                    self.reporter.report(
                        ErrorCode::ReturnTypeMismatch,
                        self.file,
                        pos,
                        &[&func.name, &expected_name, "void"],
                    );
                }
            }
            Some(value) => {
                let actual = self.check_expr(value, scope);
                let actual = self.resolve_deferred(actual, scope);
                if matches!(actual, Type::Unknown(_)) {
                    return;
                }
                if actual.is_void() {
                    self.reporter
                        .report(ErrorCode::VoidUsage, self.file, value.pos, &[]);
                } else if !types_match(&expected, &actual) {
                    let expected_name = expected.name(self.types);
                    let actual_name = actual.name(self.types);
                    self.reporter.report(
                        ErrorCode::ReturnTypeMismatch,
                        self.file,
                        pos,
                        &[&func.name, &expected_name, &actual_name],
                    );
                }
            }
        }
    }

    fn check_expr(&mut self, expr: &mut Expr, scope: ScopeId) -> Type {
        let ty = self.infer_expr(expr, scope);
        expr.ty = Some(ty.clone());
        ty
    }

    fn infer_expr(&mut self, expr: &mut Expr, scope: ScopeId) -> Type {
        let pos = expr.pos;
        match &mut expr.kind {
            ExprKind::Int(_) => Type::Builtin(Builtin::Int),
            ExprKind::Float(_) => Type::Builtin(Builtin::Float),
            ExprKind::Double(_) => Type::Builtin(Builtin::Double),
            ExprKind::Str(_) => Type::Builtin(Builtin::Str),
            ExprKind::Char(_) => Type::Builtin(Builtin::Char),
            ExprKind::Bool(_) => Type::Builtin(Builtin::Bool),
            ExprKind::Ident(name) => match self.scopes.lookup(scope, name) {
                Some(ty) => {
                    let ty = ty.clone();
                    self.resolve_deferred(ty, scope)
                }
                None => {
                    let name = name.clone();
                    self.reporter
                        .report(ErrorCode::IdentifierNotFound, self.file, pos, &[&name]);
                    Type::UNKNOWN
                }
            },
            ExprKind::Binary { .. } => self.check_binary(expr, scope),
            ExprKind::Unary { .. } => self.check_unary(expr, scope),
            ExprKind::Postfix { .. } => self.check_postfix(expr, scope),
            ExprKind::Call { .. } => self.check_call(expr, scope),
            ExprKind::Property { .. } => self.check_property(expr, scope),
            ExprKind::List(_) => self.check_list(expr, scope),
            ExprKind::EmptyList { elem } => {
                let elem = elem.clone();
                let base = Builtin::from_name(&elem)
                    .map(Type::Builtin)
                    .or_else(|| self.scopes.lookup(scope, &elem).cloned());
                match base {
                    Some(base) => Type::List(Box::new(base)),
                    None => {
                        self.reporter
                            .report(ErrorCode::TypeNotResolved, self.file, pos, &[&elem]);
                        Type::UNKNOWN
                    }
                }
            }
            ExprKind::Assign { .. } => self.check_assign(expr, scope),
            ExprKind::Grouping(inner) => self.check_expr(inner, scope),
        }
    }

    fn check_binary(&mut self, expr: &mut Expr, scope: ScopeId) -> Type {
        let pos = expr.pos;
        let ExprKind::Binary { op, lhs, rhs } = &mut expr.kind else {
            return Type::UNKNOWN;
        };
        let op = *op;
        let lt = {
            let ty = self.infer_into(lhs, scope);
            self.resolve_deferred(ty, scope)
        };
        let rt = {
            let ty = self.infer_into(rhs, scope);
            self.resolve_deferred(ty, scope)
        };
        if matches!(lt, Type::Unknown(_)) || matches!(rt, Type::Unknown(_)) {
            return Type::UNKNOWN;
        }

        if op.is_arithmetic() {
            if let (Type::Builtin(a), Type::Builtin(b)) = (&lt, &rt) {
                if a.priority().is_some() && b.priority().is_some() {
                    return Type::Builtin(widen(*a, *b));
                }
            }
            self.report_operator(op.symbol(), &lt, &rt, pos);
            return Type::UNKNOWN;
        }

        if op.is_comparison() {
            let ok = match op {
                BinOp::Eq | BinOp::Ne => {
                    types_match(&lt, &rt)
                        || types_match(&rt, &lt)
                        || (lt.is_numeric() && rt.is_numeric())
                }
                // Ordering comparisons only make sense on numbers.
                _ => lt.is_numeric() && rt.is_numeric(),
            };
            if !ok {
                self.report_operator(op.symbol(), &lt, &rt, pos);
            }
            return Type::Builtin(Builtin::Bool);
        }

        // Logical operators
        let bool_ty = Type::Builtin(Builtin::Bool);
        if lt != bool_ty || rt != bool_ty {
            self.report_operator(op.symbol(), &lt, &rt, pos);
        }
        bool_ty
    }

    fn report_operator(&mut self, symbol: &str, lt: &Type, rt: &Type, pos: Position) {
        let a = lt.name(self.types);
        let b = rt.name(self.types);
        self.reporter.report(
            ErrorCode::CannotApplyOperator,
            self.file,
            pos,
            &[symbol, &a, &b],
        );
    }

    fn check_unary(&mut self, expr: &mut Expr, scope: ScopeId) -> Type {
        let pos = expr.pos;
        let ExprKind::Unary { op, operand } = &mut expr.kind else {
            return Type::UNKNOWN;
        };
        let op = *op;
        let ty = {
            let ty = self.infer_into(operand, scope);
            self.resolve_deferred(ty, scope)
        };
        if matches!(ty, Type::Unknown(_)) {
            return Type::UNKNOWN;
        }
        match op {
            UnOp::Not => {
                if ty != Type::Builtin(Builtin::Bool) {
                    self.report_operator("!", &ty, &ty, pos);
                }
                Type::Builtin(Builtin::Bool)
            }
            UnOp::Neg => {
                if !ty.is_numeric() {
                    self.report_operator("-", &ty, &ty, pos);
                    return Type::UNKNOWN;
                }
                ty
            }
        }
    }

    fn check_postfix(&mut self, expr: &mut Expr, scope: ScopeId) -> Type {
        let pos = expr.pos;
        let ExprKind::Postfix { op, operand } = &mut expr.kind else {
            return Type::UNKNOWN;
        };
        let op = *op;
        let ty = {
            let ty = self.infer_into(operand, scope);
            self.resolve_deferred(ty, scope)
        };
        if matches!(ty, Type::Unknown(_)) {
            return Type::UNKNOWN;
        }
        if !ty.is_numeric() {
            let shown = ty.name(self.types);
            self.reporter.report(
                ErrorCode::CannotPostfix,
                self.file,
                pos,
                &[op.symbol(), &shown],
            );
            return Type::UNKNOWN;
        }
        ty
    }

    fn check_call(&mut self, expr: &mut Expr, scope: ScopeId) -> Type {
        let pos = expr.pos;
        let ExprKind::Call { callee, args } = &mut expr.kind else {
            return Type::UNKNOWN;
        };
        let callee_name = match &callee.kind {
            ExprKind::Ident(name) => name.clone(),
            ExprKind::Property { fields, .. } => fields
                .last()
                .map(|(n, _)| n.clone())
                .unwrap_or_else(|| "expression".to_string()),
            _ => "expression".to_string(),
        };
        let callee_ty = {
            let ty = self.infer_into(callee, scope);
            self.resolve_deferred(ty, scope)
        };

        let mut arg_types = Vec::with_capacity(args.len());
        let mut arg_positions = Vec::with_capacity(args.len());
        for arg in args.iter_mut() {
            arg_positions.push(arg.pos);
            let ty = self.infer_into(arg, scope);
            arg_types.push(self.resolve_deferred(ty, scope));
        }
        for (ty, arg_pos) in arg_types.iter().zip(&arg_positions) {
            if ty.is_void() {
                self.reporter
                    .report(ErrorCode::VoidUsage, self.file, *arg_pos, &[]);
            }
        }

        match callee_ty {
            Type::Function(id) => {
                let func = self.types.func(id).clone();
                if func.params.len() != arg_types.len() {
                    let shown = format!("{callee_name}({})", func.signature(self.types));
                    let rendered = self.render_types(&arg_types);
                    self.reporter.report(
                        ErrorCode::FunctionSignatureMismatch,
                        self.file,
                        pos,
                        &[&shown, &rendered],
                    );
                    return func.return_type;
                }
                for ((_, param_ty), (arg_ty, arg_pos)) in
                    func.params.iter().zip(arg_types.iter().zip(&arg_positions))
                {
                    // Imported signatures may still carry deferred names.
                    let param_ty = self.resolve_deferred(param_ty.clone(), scope);
                    // Void arguments were already diagnosed above.
                    if matches!(param_ty, Type::Generic(_))
                        || matches!(param_ty, Type::Unknown(_))
                        || matches!(arg_ty, Type::Unknown(_))
                        || arg_ty.is_void()
                    {
                        continue;
                    }
                    if !types_match(&param_ty, arg_ty) {
                        let actual = arg_ty.name(self.types);
                        let expected = param_ty.name(self.types);
                        self.reporter.report(
                            ErrorCode::ParameterTypeMismatch,
                            self.file,
                            *arg_pos,
                            &[&actual, &expected],
                        );
                    }
                }
                if func.has_generics() {
                    let specialization = func.build_specialization(&arg_types);
                    let return_type = match &func.return_type {
                        Type::Generic(key) => specialization
                            .get(key)
                            .cloned()
                            .unwrap_or_else(|| func.return_type.clone()),
                        other => other.clone(),
                    };
                    self.types.func_mut(id).specializations.push(specialization);
                    return return_type;
                }
                func.return_type
            }
            Type::Struct(id) => {
                let st = self.types.struct_(id).clone();
                if st.fields.len() != arg_types.len() {
                    let rendered = self.render_types(&arg_types);
                    self.reporter.report(
                        ErrorCode::FunctionSignatureMismatch,
                        self.file,
                        pos,
                        &[&st.name, &rendered],
                    );
                    return Type::Struct(id);
                }
                for ((_, field_ty), (arg_ty, arg_pos)) in
                    st.fields.iter().zip(arg_types.iter().zip(&arg_positions))
                {
                    let field_ty = self.resolve_deferred(field_ty.clone(), scope);
                    if matches!(field_ty, Type::Generic(_))
                        || matches!(field_ty, Type::Unknown(_))
                        || matches!(arg_ty, Type::Unknown(_))
                        || arg_ty.is_void()
                    {
                        continue;
                    }
                    if !types_match(&field_ty, arg_ty) {
                        let actual = arg_ty.name(self.types);
                        let expected = field_ty.name(self.types);
                        self.reporter.report(
                            ErrorCode::ParameterTypeMismatch,
                            self.file,
                            *arg_pos,
                            &[&actual, &expected],
                        );
                    }
                }
                Type::Struct(id)
            }
            Type::Unknown(_) => Type::UNKNOWN,
            _ => {
                self.reporter
                    .report(ErrorCode::MethodNotFound, self.file, pos, &[&callee_name]);
                Type::UNKNOWN
            }
        }
    }

    fn check_property(&mut self, expr: &mut Expr, scope: ScopeId) -> Type {
        let ExprKind::Property { object, fields } = &mut expr.kind else {
            return Type::UNKNOWN;
        };
        let fields = fields.clone();
        let mut current = {
            let ty = self.infer_into(object, scope);
            self.resolve_deferred(ty, scope)
        };
        for (field, field_pos) in &fields {
            current = match current {
                Type::Struct(id) => match self.types.struct_(id).field(field) {
                    Some(ty) => ty.clone(),
                    None => {
                        let owner = self.types.struct_(id).name.clone();
                        self.reporter.report(
                            ErrorCode::FieldNotPresent,
                            self.file,
                            *field_pos,
                            &[field, &owner],
                        );
                        return Type::UNKNOWN;
                    }
                },
                Type::Unknown(_) => return Type::UNKNOWN,
                other => {
                    let shown = other.name(self.types);
                    self.reporter.report(
                        ErrorCode::FieldNotPresent,
                        self.file,
                        *field_pos,
                        &[field, &shown],
                    );
                    return Type::UNKNOWN;
                }
            };
        }
        current
    }

    fn check_list(&mut self, expr: &mut Expr, scope: ScopeId) -> Type {
        let pos = expr.pos;
        let ExprKind::List(elements) = &mut expr.kind else {
            return Type::UNKNOWN;
        };
        if elements.is_empty() {
            self.reporter
                .report(ErrorCode::ListLiteralIncomplete, self.file, pos, &[]);
            return Type::UNKNOWN;
        }

        let mut inferred: Option<Type> = None;
        let mut mismatches: Vec<(Type, Position)> = Vec::new();
        for element in elements.iter_mut() {
            let element_pos = element.pos;
            let ty = self.infer_into(element, scope);
            let ty = self.resolve_deferred(ty, scope);
            match &inferred {
                None => inferred = Some(ty),
                Some(first) => {
                    if !matches!(ty, Type::Unknown(_)) && !types_match(first, &ty) {
                        mismatches.push((ty, element_pos));
                    }
                }
            }
        }
        let first = inferred.unwrap_or(Type::UNKNOWN);
        for (ty, element_pos) in mismatches {
            let actual = ty.name(self.types);
            let expected = first.name(self.types);
            self.reporter.report(
                ErrorCode::ListTypeMismatch,
                self.file,
                element_pos,
                &[&actual, &expected],
            );
        }
        Type::List(Box::new(first))
    }

    fn check_assign(&mut self, expr: &mut Expr, scope: ScopeId) -> Type {
        let ExprKind::Assign { target, value } = &mut expr.kind else {
            return Type::UNKNOWN;
        };
        let target_pos = target.pos;
        let target_name = match &target.kind {
            ExprKind::Ident(name) => name.clone(),
            ExprKind::Property { fields, .. } => fields
                .last()
                .map(|(n, _)| n.clone())
                .unwrap_or_else(|| "expression".to_string()),
            _ => "expression".to_string(),
        };
        let target_ty = {
            let ty = self.infer_into(target, scope);
            self.resolve_deferred(ty, scope)
        };
        let value_ty = {
            let ty = self.infer_into(value, scope);
            self.resolve_deferred(ty, scope)
        };
        if !matches!(target_ty, Type::Unknown(_))
            && !matches!(value_ty, Type::Unknown(_))
            && !types_match(&target_ty, &value_ty)
        {
            let expected = target_ty.name(self.types);
            let actual = value_ty.name(self.types);
            self.reporter.report(
                ErrorCode::BadAssignment,
                self.file,
                target_pos,
                &[&target_name, &expected, &actual],
            );
        }
        target_ty
    }

    /// Check a boxed subexpression and stamp its type, same contract as
    /// [`Self::check_expr`].
    fn infer_into(&mut self, expr: &mut Expr, scope: ScopeId) -> Type {
        self.check_expr(expr, scope)
    }

    /// Retry resolution of a named unknown. Aliases and forward-declared
    /// types become visible between the passes, so a second lookup often
    /// succeeds where the environment pass could not.
    fn resolve_deferred(&self, ty: Type, scope: ScopeId) -> Type {
        match ty {
            Type::Unknown(Some(name)) => {
                if let Some(builtin) = Builtin::from_name(&name) {
                    return Type::Builtin(builtin);
                }
                match self.scopes.lookup(scope, &name) {
                    Some(found) => found.clone(),
                    None => Type::Unknown(Some(name)),
                }
            }
            other => other,
        }
    }

    fn render_types(&self, types: &[Type]) -> String {
        types
            .iter()
            .map(|t| t.name(self.types))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
