//! Tokenizer for Lyra source files
//!
//! Hand-written single-pass lexer tracking 1-based line/column positions.
//! Errors are collected, not thrown; the parser turns them into syntax
//! diagnostics alongside its own.

use crate::frontend::ast::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Keywords
    Use,
    Pub,
    Let,
    Mut,
    Def,
    Type,
    Struct,
    Enum,
    If,
    Else,
    While,
    For,
    In,
    Match,
    Return,
    True,
    False,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBrack,
    RBrack,
    Comma,
    Dot,
    Colon,
    ColonColon,
    Arrow,    // ->
    FatArrow, // =>
    Pipe,     // |
    Semi,

    // Operators
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    EqEq,
    NotEq,
    Lt,
    Gt,
    Le,
    Ge,
    AndAnd,
    OrOr,
    Not,
    PlusPlus,
    MinusMinus,

    // Literals
    Ident,
    Int,
    Float,
    Double,
    Str,
    Char,

    Eof,
}

impl TokenKind {
    fn keyword(text: &str) -> Option<TokenKind> {
        Some(match text {
            "use" => TokenKind::Use,
            "pub" => TokenKind::Pub,
            "let" => TokenKind::Let,
            "mut" => TokenKind::Mut,
            "def" => TokenKind::Def,
            "type" => TokenKind::Type,
            "struct" => TokenKind::Struct,
            "enum" => TokenKind::Enum,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "for" => TokenKind::For,
            "in" => TokenKind::In,
            "match" => TokenKind::Match,
            "return" => TokenKind::Return,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            _ => return None,
        })
    }
}

/// Reserved words may not be used as identifiers (struct fields etc.)
pub fn is_keyword(text: &str) -> bool {
    TokenKind::keyword(text).is_some()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub message: String,
    pub pos: Position,
}

/// Tokenize a whole source buffer. The trailing `Eof` token is always
/// present, so the parser never runs off the end.
pub fn lex(source: &str) -> (Vec<Token>, Vec<LexError>) {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    col: usize,
    tokens: Vec<Token>,
    errors: Vec<LexError>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            col: 1,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn run(mut self) -> (Vec<Token>, Vec<LexError>) {
        while let Some(c) = self.peek() {
            let pos = Position::new(self.line, self.col);
            match c {
                ' ' | '\t' | '\r' | '\n' => {
                    self.bump();
                }
                '#' => self.skip_line_comment(),
                '0'..='9' => self.number(pos),
                'a'..='z' | 'A'..='Z' | '_' => self.identifier(pos),
                '"' => self.string(pos),
                '\'' => self.char_literal(pos),
                _ => self.punct(pos),
            }
        }
        let pos = Position::new(self.line, self.col);
        self.push(TokenKind::Eof, String::new(), pos);
        (self.tokens, self.errors)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn push(&mut self, kind: TokenKind, text: String, pos: Position) {
        self.tokens.push(Token { kind, text, pos });
    }

    fn error(&mut self, message: impl Into<String>, pos: Position) {
        self.errors.push(LexError {
            message: message.into(),
            pos,
        });
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
    }

    fn number(&mut self, pos: Position) {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }

        let mut is_decimal = false;
        if self.peek() == Some('.') {
            // Only consume the dot when a digit follows, so ranges and
            // property access after a number stay intact for the parser.
            let mut lookahead = self.chars.clone();
            lookahead.next();
            if lookahead.peek().is_some_and(|c| c.is_ascii_digit()) {
                is_decimal = true;
                text.push('.');
                self.bump();
                while let Some(c) = self.peek() {
                    if c.is_ascii_digit() {
                        text.push(c);
                        self.bump();
                    } else {
                        break;
                    }
                }
            }
        }

        if is_decimal {
            // Suffix-free decimal literals are doubles; `f` narrows to float.
            if self.eat('f') {
                self.push(TokenKind::Float, text, pos);
            } else {
                self.push(TokenKind::Double, text, pos);
            }
        } else {
            self.push(TokenKind::Int, text, pos);
        }
    }

    fn identifier(&mut self, pos: Position) {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        match TokenKind::keyword(&text) {
            Some(kind) => self.push(kind, text, pos),
            None => self.push(TokenKind::Ident, text, pos),
        }
    }

    fn string(&mut self, pos: Position) {
        self.bump(); // opening quote
        let mut text = String::new();
        loop {
            match self.bump() {
                Some('"') => break,
                Some('\\') => match self.bump() {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some('\\') => text.push('\\'),
                    Some('"') => text.push('"'),
                    Some(other) => {
                        let here = Position::new(self.line, self.col);
                        self.error(format!("unknown escape `\\{other}`"), here);
                    }
                    None => {
                        self.error("unterminated string literal", pos);
                        break;
                    }
                },
                Some(c) => text.push(c),
                None => {
                    self.error("unterminated string literal", pos);
                    break;
                }
            }
        }
        self.push(TokenKind::Str, text, pos);
    }

    fn char_literal(&mut self, pos: Position) {
        self.bump(); // opening quote
        let c = match self.bump() {
            Some('\\') => match self.bump() {
                Some('n') => '\n',
                Some('t') => '\t',
                Some('\\') => '\\',
                Some('\'') => '\'',
                _ => {
                    self.error("invalid character escape", pos);
                    '\0'
                }
            },
            Some(c) => c,
            None => {
                self.error("unterminated character literal", pos);
                '\0'
            }
        };
        if !self.eat('\'') {
            self.error("unterminated character literal", pos);
        }
        self.push(TokenKind::Char, c.to_string(), pos);
    }

    fn punct(&mut self, pos: Position) {
        let c = match self.bump() {
            Some(c) => c,
            None => return,
        };
        let kind = match c {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBrack,
            ']' => TokenKind::RBrack,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            ';' => TokenKind::Semi,
            '^' => TokenKind::Caret,
            '%' => TokenKind::Percent,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            ':' => {
                if self.eat(':') {
                    TokenKind::ColonColon
                } else {
                    TokenKind::Colon
                }
            }
            '+' => {
                if self.eat('+') {
                    TokenKind::PlusPlus
                } else {
                    TokenKind::Plus
                }
            }
            '-' => {
                if self.eat('-') {
                    TokenKind::MinusMinus
                } else if self.eat('>') {
                    TokenKind::Arrow
                } else {
                    TokenKind::Minus
                }
            }
            '=' => {
                if self.eat('=') {
                    TokenKind::EqEq
                } else if self.eat('>') {
                    TokenKind::FatArrow
                } else {
                    TokenKind::Assign
                }
            }
            '!' => {
                if self.eat('=') {
                    TokenKind::NotEq
                } else {
                    TokenKind::Not
                }
            }
            '<' => {
                if self.eat('=') {
                    TokenKind::Le
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.eat('=') {
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            '&' => {
                if self.eat('&') {
                    TokenKind::AndAnd
                } else {
                    self.error("expected `&&`", pos);
                    return;
                }
            }
            '|' => {
                if self.eat('|') {
                    TokenKind::OrOr
                } else {
                    TokenKind::Pipe
                }
            }
            other => {
                self.error(format!("unexpected character `{other}`"), pos);
                return;
            }
        };
        self.push(kind, c.to_string(), pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let (tokens, errors) = lex(source);
        assert!(errors.is_empty(), "unexpected lex errors: {errors:?}");
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_function_header() {
        assert_eq!(
            kinds("pub def add(a: int) -> int"),
            vec![
                TokenKind::Pub,
                TokenKind::Def,
                TokenKind::Ident,
                TokenKind::LParen,
                TokenKind::Ident,
                TokenKind::Colon,
                TokenKind::Ident,
                TokenKind::RParen,
                TokenKind::Arrow,
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_numeric_literals() {
        let (tokens, _) = lex("1 2.5 3.5f");
        assert_eq!(tokens[0].kind, TokenKind::Int);
        assert_eq!(tokens[1].kind, TokenKind::Double);
        assert_eq!(tokens[2].kind, TokenKind::Float);
        assert_eq!(tokens[2].text, "3.5");
    }

    #[test]
    fn lexes_qualified_name() {
        let (tokens, _) = lex("util::helper");
        assert_eq!(tokens[1].kind, TokenKind::ColonColon);
    }

    #[test]
    fn tracks_positions_across_lines() {
        let (tokens, _) = lex("let x\nmut y");
        assert_eq!(tokens[0].pos, Position::new(1, 1));
        assert_eq!(tokens[2].pos, Position::new(2, 1));
        assert_eq!(tokens[3].pos, Position::new(2, 5));
    }

    #[test]
    fn reports_unterminated_string() {
        let (_, errors) = lex("\"oops");
        assert_eq!(errors.len(), 1);
    }
}
