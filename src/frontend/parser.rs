//! Recursive-descent parser for Lyra
//!
//! Consumes the token stream and produces a statement list plus any syntax
//! errors encountered. The parser never aborts on a bad token; it records
//! the error, synchronizes to the next statement boundary, and keeps going
//! so one pass reports as many syntax problems as possible.

use crate::frontend::ast::{
    BinOp, Block, Expr, ExprKind, MatchCase, Param, PostfixOp, Position, Stmt, TypeExpr, UnOp,
};
use crate::frontend::lexer::{is_keyword, lex, Token, TokenKind};

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub pos: Position,
}

/// Parse a whole source buffer into top-level statements. Lexer errors are
/// folded into the returned error list.
pub fn parse(source: &str) -> (Vec<Stmt>, Vec<ParseError>) {
    let (tokens, lex_errors) = lex(source);
    let mut errors: Vec<ParseError> = lex_errors
        .into_iter()
        .map(|e| ParseError {
            message: e.message,
            pos: e.pos,
        })
        .collect();

    let mut parser = Parser {
        tokens,
        index: 0,
        errors: Vec::new(),
    };
    let statements = parser.program();
    errors.extend(parser.errors);
    (statements, errors)
}

struct Parser {
    tokens: Vec<Token>,
    index: usize,
    errors: Vec<ParseError>,
}

impl Parser {
    fn program(&mut self) -> Vec<Stmt> {
        let mut statements = Vec::new();
        while !self.at(TokenKind::Eof) {
            match self.statement() {
                Some(stmt) => statements.push(stmt),
                None => self.synchronize(),
            }
        }
        statements
    }

    // Token plumbing

    fn peek(&self) -> &Token {
        &self.tokens[self.index]
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn bump(&mut self) -> Token {
        let token = self.tokens[self.index].clone();
        if self.index + 1 < self.tokens.len() {
            self.index += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Option<Token> {
        if self.at(kind) {
            Some(self.bump())
        } else {
            let found = self.peek().clone();
            self.error(
                format!("expected {what}, found `{}`", describe(&found)),
                found.pos,
            );
            None
        }
    }

    fn error(&mut self, message: String, pos: Position) {
        self.errors.push(ParseError { message, pos });
    }

    fn name_like(&mut self, what: &str) -> Option<Token> {
        let token = self.peek().clone();
        if token.kind == TokenKind::Ident || is_keyword(&token.text) {
            Some(self.bump())
        } else {
            self.error(
                format!("expected {what}, found `{}`", describe(&token)),
                token.pos,
            );
            None
        }
    }

    /// Skip forward to a plausible statement start so one mistake doesn't
    /// cascade into a wall of follow-on errors.
    fn synchronize(&mut self) {
        while !self.at(TokenKind::Eof) {
            if self.eat(TokenKind::Semi) {
                return;
            }
            match self.peek().kind {
                TokenKind::Use
                | TokenKind::Pub
                | TokenKind::Let
                | TokenKind::Mut
                | TokenKind::Def
                | TokenKind::Type
                | TokenKind::If
                | TokenKind::While
                | TokenKind::For
                | TokenKind::Match
                | TokenKind::Return
                | TokenKind::RBrace => return,
                _ => {
                    self.bump();
                }
            }
        }
    }

    // Statements

    fn statement(&mut self) -> Option<Stmt> {
        match self.peek().kind {
            TokenKind::Use => self.use_stmt(),
            TokenKind::Pub => self.export_stmt(),
            TokenKind::Let | TokenKind::Mut => self.let_stmt(),
            TokenKind::Def => self.def_stmt(),
            TokenKind::Type => self.type_stmt(),
            TokenKind::If => self.if_stmt(),
            TokenKind::While => self.while_stmt(),
            TokenKind::For => self.for_stmt(),
            TokenKind::Match => self.match_stmt(),
            TokenKind::Return => self.return_stmt(),
            TokenKind::LBrace => self.block().map(Stmt::Block),
            _ => self.expr_stmt(),
        }
    }

    fn use_stmt(&mut self) -> Option<Stmt> {
        let pos = self.bump().pos;
        let target = self.expect(TokenKind::Str, "a quoted module path after `use`")?;
        self.eat(TokenKind::Semi);
        Some(Stmt::Use {
            pos,
            target: target.text,
        })
    }

    fn export_stmt(&mut self) -> Option<Stmt> {
        let pos = self.bump().pos;
        let inner = match self.peek().kind {
            TokenKind::Let | TokenKind::Mut | TokenKind::Def | TokenKind::Type => {
                self.statement()?
            }
            _ => {
                let found = self.peek().clone();
                self.error(
                    "`pub` must be followed by a `let`, `mut`, `def` or `type` declaration"
                        .to_string(),
                    found.pos,
                );
                return None;
            }
        };
        Some(Stmt::Export {
            pos,
            stmt: Box::new(inner),
        })
    }

    fn let_stmt(&mut self) -> Option<Stmt> {
        let keyword = self.bump();
        let mutable = keyword.kind == TokenKind::Mut;
        let name = self.expect(TokenKind::Ident, "a variable name")?;
        self.expect(TokenKind::Assign, "`=` after the variable name")?;
        let value = self.expression()?;
        self.eat(TokenKind::Semi);
        Some(Stmt::Let {
            pos: keyword.pos,
            name: name.text,
            mutable,
            value,
        })
    }

    fn def_stmt(&mut self) -> Option<Stmt> {
        let pos = self.bump().pos;
        let name = self.expect(TokenKind::Ident, "a function name")?;
        let generics = self.generic_list();

        self.expect(TokenKind::LParen, "`(` to open the parameter list")?;
        let mut params = Vec::new();
        while !self.at(TokenKind::RParen) && !self.at(TokenKind::Eof) {
            params.push(self.param()?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen, "`)` to close the parameter list")?;

        let return_type = if self.eat(TokenKind::Arrow) {
            Some(self.type_expr()?)
        } else {
            None
        };
        let body = self.block()?;
        Some(Stmt::Def {
            pos,
            name: name.text,
            generics,
            params,
            return_type,
            body,
        })
    }

    /// Optional `[T, U]` generic parameter list.
    fn generic_list(&mut self) -> Vec<String> {
        let mut generics = Vec::new();
        if self.eat(TokenKind::LBrack) {
            while !self.at(TokenKind::RBrack) && !self.at(TokenKind::Eof) {
                if let Some(name) = self.expect(TokenKind::Ident, "a generic parameter name") {
                    generics.push(name.text);
                } else {
                    break;
                }
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RBrack, "`]` to close the generic list");
        }
        generics
    }

    fn param(&mut self) -> Option<Param> {
        // Keywords are accepted here so the semantic passes can reject
        // reserved field names with a proper diagnostic.
        let name = self.name_like("a parameter name")?;
        self.expect(TokenKind::Colon, "`:` between name and type")?;
        let ty = self.type_expr()?;
        Some(Param {
            pos: name.pos,
            name: name.text,
            ty,
        })
    }

    fn type_stmt(&mut self) -> Option<Stmt> {
        let pos = self.bump().pos;
        let name = self.expect(TokenKind::Ident, "a type name")?;
        self.expect(TokenKind::Assign, "`=` after the type name")?;

        match self.peek().kind {
            TokenKind::Struct => {
                self.bump();
                let generics = self.generic_list();
                self.expect(TokenKind::LBrace, "`{` to open the struct body")?;
                let mut fields = Vec::new();
                while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
                    fields.push(self.param()?);
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::RBrace, "`}` to close the struct body")?;
                Some(Stmt::Struct {
                    pos,
                    name: name.text,
                    generics,
                    fields,
                })
            }
            TokenKind::Enum => {
                self.bump();
                self.expect(TokenKind::LBrace, "`{` to open the enum body")?;
                let mut variants = Vec::new();
                while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
                    if let Some(v) = self.expect(TokenKind::Ident, "an enum variant name") {
                        variants.push(v.text);
                    } else {
                        break;
                    }
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::RBrace, "`}` to close the enum body")?;
                Some(Stmt::Enum {
                    pos,
                    name: name.text,
                    variants,
                })
            }
            _ => {
                let ty = self.type_expr()?;
                self.eat(TokenKind::Semi);
                Some(Stmt::TypeAlias {
                    pos,
                    name: name.text,
                    ty,
                })
            }
        }
    }

    /// `name`, `name[]`, or a `|`-joined union of those.
    fn type_expr(&mut self) -> Option<TypeExpr> {
        let first = self.type_name()?;
        if !self.at(TokenKind::Pipe) {
            return Some(first);
        }
        let pos = first.pos();
        let mut members = vec![first];
        while self.eat(TokenKind::Pipe) {
            members.push(self.type_name()?);
        }
        Some(TypeExpr::Union { pos, members })
    }

    fn type_name(&mut self) -> Option<TypeExpr> {
        let first = self.expect(TokenKind::Ident, "a type name")?;
        let pos = first.pos;
        let mut name = first.text;
        // Imported types are named `unit::Type`, same folding as in
        // expression position.
        while self.eat(TokenKind::ColonColon) {
            let part = self.expect(TokenKind::Ident, "a name after `::`")?;
            name.push_str("::");
            name.push_str(&part.text);
        }
        let list = if self.at(TokenKind::LBrack) {
            self.bump();
            self.expect(TokenKind::RBrack, "`]` after `[` in a list type")?;
            true
        } else {
            false
        };
        Some(TypeExpr::Name { pos, name, list })
    }

    fn if_stmt(&mut self) -> Option<Stmt> {
        let pos = self.bump().pos;
        let condition = self.expression()?;
        let then_block = self.block()?;
        let else_branch = if self.eat(TokenKind::Else) {
            if self.at(TokenKind::If) {
                Some(Box::new(self.if_stmt()?))
            } else {
                Some(Box::new(Stmt::Block(self.block()?)))
            }
        } else {
            None
        };
        Some(Stmt::If {
            pos,
            condition,
            then_block,
            else_branch,
        })
    }

    fn while_stmt(&mut self) -> Option<Stmt> {
        let pos = self.bump().pos;
        let condition = self.expression()?;
        let body = self.block()?;
        Some(Stmt::While {
            pos,
            condition,
            body,
        })
    }

    fn for_stmt(&mut self) -> Option<Stmt> {
        let pos = self.bump().pos;
        let name = self.expect(TokenKind::Ident, "a loop variable name")?;
        self.expect(TokenKind::In, "`in` after the loop variable")?;
        let iterable = self.expression()?;
        let body = self.block()?;
        Some(Stmt::For {
            pos,
            name: name.text,
            iterable,
            body,
        })
    }

    fn match_stmt(&mut self) -> Option<Stmt> {
        let pos = self.bump().pos;
        let scrutinee = self.expression()?;
        self.expect(TokenKind::LBrace, "`{` to open the match body")?;
        let mut cases = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            let ty = self.type_expr()?;
            let binding = self.expect(TokenKind::Ident, "a binding name in the match case")?;
            self.expect(TokenKind::FatArrow, "`=>` before the case body")?;
            let body = self.block()?;
            cases.push(MatchCase {
                pos: ty.pos(),
                ty,
                binding: binding.text,
                body,
            });
            self.eat(TokenKind::Comma);
        }
        self.expect(TokenKind::RBrace, "`}` to close the match body")?;
        Some(Stmt::Match {
            pos,
            scrutinee,
            cases,
        })
    }

    fn return_stmt(&mut self) -> Option<Stmt> {
        let pos = self.bump().pos;
        let value = if self.at(TokenKind::Semi)
            || self.at(TokenKind::RBrace)
            || self.at(TokenKind::Eof)
        {
            None
        } else {
            Some(self.expression()?)
        };
        self.eat(TokenKind::Semi);
        Some(Stmt::Return { pos, value })
    }

    fn expr_stmt(&mut self) -> Option<Stmt> {
        let expr = self.expression()?;
        self.eat(TokenKind::Semi);
        Some(Stmt::ExprStmt {
            pos: expr.pos,
            expr,
        })
    }

    fn block(&mut self) -> Option<Block> {
        let open = self.expect(TokenKind::LBrace, "`{` to open a block")?;
        let mut statements = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            match self.statement() {
                Some(stmt) => statements.push(stmt),
                None => self.synchronize(),
            }
        }
        self.expect(TokenKind::RBrace, "`}` to close the block")?;
        Some(Block::new(open.pos, statements))
    }

    // Expressions, lowest precedence first

    fn expression(&mut self) -> Option<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> Option<Expr> {
        let target = self.or_expr()?;
        if self.eat(TokenKind::Assign) {
            let value = self.assignment()?;
            let pos = target.pos;
            return Some(Expr::new(
                pos,
                ExprKind::Assign {
                    target: Box::new(target),
                    value: Box::new(value),
                },
            ));
        }
        Some(target)
    }

    fn or_expr(&mut self) -> Option<Expr> {
        let mut lhs = self.and_expr()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::OrOr => BinOp::Or,
                TokenKind::Caret => BinOp::Xor,
                _ => break,
            };
            self.bump();
            let rhs = self.and_expr()?;
            lhs = binary(lhs, op, rhs);
        }
        Some(lhs)
    }

    fn and_expr(&mut self) -> Option<Expr> {
        let mut lhs = self.equality()?;
        while self.eat(TokenKind::AndAnd) {
            let rhs = self.equality()?;
            lhs = binary(lhs, BinOp::And, rhs);
        }
        Some(lhs)
    }

    fn equality(&mut self) -> Option<Expr> {
        let mut lhs = self.comparison()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::NotEq => BinOp::Ne,
                _ => break,
            };
            self.bump();
            let rhs = self.comparison()?;
            lhs = binary(lhs, op, rhs);
        }
        Some(lhs)
    }

    fn comparison(&mut self) -> Option<Expr> {
        let mut lhs = self.additive()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Lt => BinOp::Lt,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::Le => BinOp::Le,
                TokenKind::Ge => BinOp::Ge,
                _ => break,
            };
            self.bump();
            let rhs = self.additive()?;
            lhs = binary(lhs, op, rhs);
        }
        Some(lhs)
    }

    fn additive(&mut self) -> Option<Expr> {
        let mut lhs = self.multiplicative()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.bump();
            let rhs = self.multiplicative()?;
            lhs = binary(lhs, op, rhs);
        }
        Some(lhs)
    }

    fn multiplicative(&mut self) -> Option<Expr> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            self.bump();
            let rhs = self.unary()?;
            lhs = binary(lhs, op, rhs);
        }
        Some(lhs)
    }

    fn unary(&mut self) -> Option<Expr> {
        let op = match self.peek().kind {
            TokenKind::Not => Some(UnOp::Not),
            TokenKind::Minus => Some(UnOp::Neg),
            _ => None,
        };
        if let Some(op) = op {
            let pos = self.bump().pos;
            let operand = self.unary()?;
            return Some(Expr::new(
                pos,
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
            ));
        }
        self.postfix()
    }

    /// Calls, property chains, and `++`/`--`.
    fn postfix(&mut self) -> Option<Expr> {
        let mut expr = self.primary()?;
        loop {
            match self.peek().kind {
                TokenKind::LParen => {
                    self.bump();
                    let mut args = Vec::new();
                    while !self.at(TokenKind::RParen) && !self.at(TokenKind::Eof) {
                        args.push(self.expression()?);
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect(TokenKind::RParen, "`)` to close the argument list")?;
                    let pos = expr.pos;
                    expr = Expr::new(
                        pos,
                        ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                    );
                }
                TokenKind::Dot => {
                    self.bump();
                    let field = self.expect(TokenKind::Ident, "a field name after `.`")?;
                    expr = match expr.kind {
                        // Consecutive accesses fold into one chain.
                        ExprKind::Property { object, mut fields } => {
                            fields.push((field.text, field.pos));
                            Expr::new(expr.pos, ExprKind::Property { object, fields })
                        }
                        _ => {
                            let pos = expr.pos;
                            Expr::new(
                                pos,
                                ExprKind::Property {
                                    object: Box::new(expr),
                                    fields: vec![(field.text, field.pos)],
                                },
                            )
                        }
                    };
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    let op = if self.bump().kind == TokenKind::PlusPlus {
                        PostfixOp::Increment
                    } else {
                        PostfixOp::Decrement
                    };
                    let pos = expr.pos;
                    expr = Expr::new(
                        pos,
                        ExprKind::Postfix {
                            op,
                            operand: Box::new(expr),
                        },
                    );
                }
                _ => break,
            }
        }
        Some(expr)
    }

    fn primary(&mut self) -> Option<Expr> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Int => {
                self.bump();
                match token.text.parse::<i64>() {
                    Ok(v) => Some(Expr::new(token.pos, ExprKind::Int(v))),
                    Err(_) => {
                        self.error(format!("integer literal `{}` is too large", token.text), token.pos);
                        None
                    }
                }
            }
            TokenKind::Float => {
                self.bump();
                let v = token.text.parse::<f64>().unwrap_or(0.0);
                Some(Expr::new(token.pos, ExprKind::Float(v)))
            }
            TokenKind::Double => {
                self.bump();
                let v = token.text.parse::<f64>().unwrap_or(0.0);
                Some(Expr::new(token.pos, ExprKind::Double(v)))
            }
            TokenKind::Str => {
                self.bump();
                Some(Expr::new(token.pos, ExprKind::Str(token.text)))
            }
            TokenKind::Char => {
                self.bump();
                let c = token.text.chars().next().unwrap_or('\0');
                Some(Expr::new(token.pos, ExprKind::Char(c)))
            }
            TokenKind::True => {
                self.bump();
                Some(Expr::new(token.pos, ExprKind::Bool(true)))
            }
            TokenKind::False => {
                self.bump();
                Some(Expr::new(token.pos, ExprKind::Bool(false)))
            }
            TokenKind::Ident => {
                self.bump();
                // `int[]` is a typed empty-list constructor.
                if self.at(TokenKind::LBrack)
                    && self.tokens.get(self.index + 1).map(|t| t.kind) == Some(TokenKind::RBrack)
                {
                    self.bump();
                    self.bump();
                    return Some(Expr::new(
                        token.pos,
                        ExprKind::EmptyList { elem: token.text },
                    ));
                }
                let mut name = token.text;
                while self.eat(TokenKind::ColonColon) {
                    let part = self.expect(TokenKind::Ident, "a name after `::`")?;
                    name.push_str("::");
                    name.push_str(&part.text);
                }
                Some(Expr::new(token.pos, ExprKind::Ident(name)))
            }
            TokenKind::LBrack => {
                self.bump();
                let mut elements = Vec::new();
                while !self.at(TokenKind::RBrack) && !self.at(TokenKind::Eof) {
                    elements.push(self.expression()?);
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::RBrack, "`]` to close the list literal")?;
                Some(Expr::new(token.pos, ExprKind::List(elements)))
            }
            TokenKind::LParen => {
                self.bump();
                let inner = self.expression()?;
                self.expect(TokenKind::RParen, "`)` to close the grouping")?;
                Some(Expr::new(token.pos, ExprKind::Grouping(Box::new(inner))))
            }
            _ => {
                self.error(
                    format!("expected an expression, found `{}`", describe(&token)),
                    token.pos,
                );
                self.bump();
                None
            }
        }
    }
}

fn binary(lhs: Expr, op: BinOp, rhs: Expr) -> Expr {
    let pos = lhs.pos;
    Expr::new(
        pos,
        ExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
    )
}

fn describe(token: &Token) -> String {
    if token.kind == TokenKind::Eof {
        "end of file".to_string()
    } else {
        token.text.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> Vec<Stmt> {
        let (statements, errors) = parse(source);
        assert!(errors.is_empty(), "unexpected parse errors: {errors:?}");
        statements
    }

    #[test]
    fn parses_function_with_generics() {
        let statements = parse_ok("def first[T](items: T[]) -> T { return items }");
        match &statements[0] {
            Stmt::Def {
                name,
                generics,
                params,
                return_type,
                ..
            } => {
                assert_eq!(name, "first");
                assert_eq!(generics, &["T".to_string()]);
                assert_eq!(params.len(), 1);
                assert!(matches!(
                    params[0].ty,
                    TypeExpr::Name { list: true, .. }
                ));
                assert!(return_type.is_some());
            }
            other => panic!("expected def, got {other:?}"),
        }
    }

    #[test]
    fn parses_export_wrapper() {
        let statements = parse_ok("pub let version = 3");
        match &statements[0] {
            Stmt::Export { stmt, .. } => {
                assert_eq!(stmt.declared_name(), Some("version"))
            }
            other => panic!("expected export, got {other:?}"),
        }
    }

    #[test]
    fn parses_union_type_alias() {
        let statements = parse_ok("type Num = int | double");
        match &statements[0] {
            Stmt::TypeAlias { name, ty, .. } => {
                assert_eq!(name, "Num");
                assert!(matches!(ty, TypeExpr::Union { members, .. } if members.len() == 2));
            }
            other => panic!("expected alias, got {other:?}"),
        }
    }

    #[test]
    fn parses_struct_with_generic_field() {
        let statements = parse_ok("type Box = struct [T] { value: T }");
        match &statements[0] {
            Stmt::Struct {
                name,
                generics,
                fields,
                ..
            } => {
                assert_eq!(name, "Box");
                assert_eq!(generics, &["T".to_string()]);
                assert_eq!(fields[0].name, "value");
            }
            other => panic!("expected struct, got {other:?}"),
        }
    }

    #[test]
    fn parses_qualified_names_in_type_position() {
        let statements = parse_ok("def get_x(p: lib::Point) -> lib::Point { return p }");
        match &statements[0] {
            Stmt::Def {
                params,
                return_type,
                ..
            } => {
                assert!(matches!(
                    &params[0].ty,
                    TypeExpr::Name { name, list: false, .. } if name == "lib::Point"
                ));
                assert!(matches!(
                    return_type.as_ref().unwrap(),
                    TypeExpr::Name { name, .. } if name == "lib::Point"
                ));
            }
            other => panic!("expected def, got {other:?}"),
        }
    }

    #[test]
    fn folds_qualified_names_into_one_identifier() {
        let statements = parse_ok("util::helper(1)");
        match &statements[0] {
            Stmt::ExprStmt { expr, .. } => match &expr.kind {
                ExprKind::Call { callee, args } => {
                    assert!(matches!(&callee.kind, ExprKind::Ident(n) if n == "util::helper"));
                    assert_eq!(args.len(), 1);
                }
                other => panic!("expected call, got {other:?}"),
            },
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    #[test]
    fn folds_property_chain() {
        let statements = parse_ok("p.inner.x");
        match &statements[0] {
            Stmt::ExprStmt { expr, .. } => match &expr.kind {
                ExprKind::Property { fields, .. } => {
                    let names: Vec<_> = fields.iter().map(|(n, _)| n.as_str()).collect();
                    assert_eq!(names, ["inner", "x"]);
                }
                other => panic!("expected property access, got {other:?}"),
            },
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    #[test]
    fn parses_typed_empty_list() {
        let statements = parse_ok("let xs = int[]");
        match &statements[0] {
            Stmt::Let { value, .. } => {
                assert!(matches!(&value.kind, ExprKind::EmptyList { elem } if elem == "int"))
            }
            other => panic!("expected let, got {other:?}"),
        }
    }

    #[test]
    fn parses_match_with_binding() {
        let statements = parse_ok("match v { int n => { n } string s => { s } }");
        match &statements[0] {
            Stmt::Match { cases, .. } => {
                assert_eq!(cases.len(), 2);
                assert_eq!(cases[0].binding, "n");
            }
            other => panic!("expected match, got {other:?}"),
        }
    }

    #[test]
    fn respects_arithmetic_precedence() {
        let statements = parse_ok("1 + 2 * 3");
        match &statements[0] {
            Stmt::ExprStmt { expr, .. } => match &expr.kind {
                ExprKind::Binary { op, rhs, .. } => {
                    assert_eq!(*op, BinOp::Add);
                    assert!(matches!(
                        &rhs.kind,
                        ExprKind::Binary { op: BinOp::Mul, .. }
                    ));
                }
                other => panic!("expected binary expression, got {other:?}"),
            },
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    #[test]
    fn recovers_after_a_bad_statement() {
        let (statements, errors) = parse("let = 5\nlet ok = 1");
        assert!(!errors.is_empty());
        assert!(statements
            .iter()
            .any(|s| s.declared_name() == Some("ok")));
    }

    #[test]
    fn reports_missing_use_target() {
        let (_, errors) = parse("use prelude");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("quoted module path"));
    }
}
