//! Command token definitions
//!
//! Tokens carry their kind and the exact source text. Keywords are not a
//! separate kind; the parser classifies identifiers by uppercased text.

use std::fmt;

/// Token kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Word starting with a letter (also keywords)
    Identifier,
    /// Digits with at most one decimal point
    Number,
    /// Double-quoted text, quotes stripped
    StringLiteral,
    /// Single punctuation character or two-character comparison
    Symbol,
    /// End of input
    End,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::Number => "NUMBER",
            TokenKind::StringLiteral => "STRING_LITERAL",
            TokenKind::Symbol => "SYMBOL",
            TokenKind::End => "END",
        };
        write!(f, "{}", name)
    }
}

/// A lexed token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// The end marker
    pub fn end() -> Self {
        Self::new(TokenKind::End, "")
    }

    /// Check if this token is the given keyword (case-insensitive)
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Identifier && self.text.eq_ignore_ascii_case(keyword)
    }

    /// Check if this token is the given symbol
    pub fn is_symbol(&self, symbol: &str) -> bool {
        self.kind == TokenKind::Symbol && self.text == symbol
    }

    /// Check if this token is the end marker
    pub fn is_end(&self) -> bool {
        self.kind == TokenKind::End
    }

    /// Check if this token can stand for a value (number, string or bare word)
    pub fn is_value(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Number | TokenKind::StringLiteral | TokenKind::Identifier
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::End => write!(f, "end of input"),
            TokenKind::StringLiteral => write!(f, "\"{}\"", self.text),
            _ => write!(f, "'{}'", self.text),
        }
    }
}
