//! Abstract syntax tree for Lyra
//!
//! The parser produces an ordered sequence of statements; the semantic
//! passes annotate expressions with resolved types and blocks with their
//! scope handles in place.

use crate::frontend::scope::ScopeId;
use crate::frontend::types::Type;

/// Source location (1-based line and column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// A braced statement sequence. The environment pass allocates a scope for
/// every block and records its handle here so the type-check pass re-enters
/// the same scope.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub pos: Position,
    pub statements: Vec<Stmt>,
    pub scope: Option<ScopeId>,
}

impl Block {
    pub fn new(pos: Position, statements: Vec<Stmt>) -> Self {
        Self {
            pos,
            statements,
            scope: None,
        }
    }
}

/// A function parameter or struct field: `name: type`
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub pos: Position,
    pub name: String,
    pub ty: TypeExpr,
}

/// One arm of a `match` statement: `type binding => { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCase {
    pub pos: Position,
    pub ty: TypeExpr,
    pub binding: String,
    pub body: Block,
}

/// A type as written in source, before resolution
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// `int`, `Point`, optionally `int[]` for list types
    Name {
        pos: Position,
        name: String,
        list: bool,
    },
    /// `A | B | C`
    Union { pos: Position, members: Vec<TypeExpr> },
}

impl TypeExpr {
    pub fn pos(&self) -> Position {
        match self {
            TypeExpr::Name { pos, .. } => *pos,
            TypeExpr::Union { pos, .. } => *pos,
        }
    }
}

/// Statements
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `use "lib/util"` or `use "prelude"`
    Use { pos: Position, target: String },
    /// `pub <decl>` - marks a top-level declaration for export
    Export { pos: Position, stmt: Box<Stmt> },
    /// `let x = e` / `mut x = e`
    Let {
        pos: Position,
        name: String,
        mutable: bool,
        value: Expr,
    },
    /// `def name[T](a: int, b: T) -> T { ... }`
    Def {
        pos: Position,
        name: String,
        generics: Vec<String>,
        params: Vec<Param>,
        return_type: Option<TypeExpr>,
        body: Block,
    },
    /// `type Name = struct [T] { field: ty, ... }`
    Struct {
        pos: Position,
        name: String,
        generics: Vec<String>,
        fields: Vec<Param>,
    },
    /// `type Name = enum { A, B }`
    Enum {
        pos: Position,
        name: String,
        variants: Vec<String>,
    },
    /// `type Name = A | B`
    TypeAlias {
        pos: Position,
        name: String,
        ty: TypeExpr,
    },
    If {
        pos: Position,
        condition: Expr,
        then_block: Block,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        pos: Position,
        condition: Expr,
        body: Block,
    },
    /// `for x in e { ... }`
    For {
        pos: Position,
        name: String,
        iterable: Expr,
        body: Block,
    },
    /// `match e { ty name => { ... } ... }`
    Match {
        pos: Position,
        scrutinee: Expr,
        cases: Vec<MatchCase>,
    },
    Return {
        pos: Position,
        value: Option<Expr>,
    },
    Block(Block),
    ExprStmt { pos: Position, expr: Expr },
}

impl Stmt {
    pub fn pos(&self) -> Position {
        match self {
            Stmt::Use { pos, .. }
            | Stmt::Export { pos, .. }
            | Stmt::Let { pos, .. }
            | Stmt::Def { pos, .. }
            | Stmt::Struct { pos, .. }
            | Stmt::Enum { pos, .. }
            | Stmt::TypeAlias { pos, .. }
            | Stmt::If { pos, .. }
            | Stmt::While { pos, .. }
            | Stmt::For { pos, .. }
            | Stmt::Match { pos, .. }
            | Stmt::Return { pos, .. }
            | Stmt::ExprStmt { pos, .. } => *pos,
            Stmt::Block(block) => block.pos,
        }
    }

    /// The identifier a `pub` declaration exports, if it is exportable.
    pub fn declared_name(&self) -> Option<&str> {
        match self {
            Stmt::Let { name, .. }
            | Stmt::Def { name, .. }
            | Stmt::Struct { name, .. }
            | Stmt::Enum { name, .. }
            | Stmt::TypeAlias { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// An expression node. `ty` starts out empty and is filled in by the
/// semantic passes; after a clean type-check pass every expression carries
/// exactly one resolved type.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub pos: Position,
    pub kind: ExprKind,
    pub ty: Option<Type>,
}

impl Expr {
    pub fn new(pos: Position, kind: ExprKind) -> Self {
        Self {
            pos,
            kind,
            ty: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Int(i64),
    Float(f64),
    Double(f64),
    Str(String),
    Char(char),
    Bool(bool),
    /// Plain or qualified identifier (`x`, `util::helper`)
    Ident(String),
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// `!e`, `-e`
    Unary { op: UnOp, operand: Box<Expr> },
    /// `e++`, `e--`
    Postfix { op: PostfixOp, operand: Box<Expr> },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    /// `a.b.c` - field chain on a struct value
    Property {
        object: Box<Expr>,
        fields: Vec<(String, Position)>,
    },
    /// `[a, b, c]`
    List(Vec<Expr>),
    /// `int[]` - typed empty list constructor
    EmptyList { elem: String },
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Grouping(Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
    Xor,
}

impl BinOp {
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod
        )
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinOp::And | BinOp::Or | BinOp::Xor)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Le => "<=",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
            BinOp::Xor => "^",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostfixOp {
    Increment,
    Decrement,
}

impl PostfixOp {
    pub fn symbol(self) -> &'static str {
        match self {
            PostfixOp::Increment => "++",
            PostfixOp::Decrement => "--",
        }
    }
}
