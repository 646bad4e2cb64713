//! Command lexer (tokenizer)
//!
//! This module converts a command line into a stream of tokens. Lexing never
//! fails: stray characters become single-character symbols and the parser
//! decides what to reject.

use super::token::{Token, TokenKind};

/// Command lexer
pub struct Lexer {
    /// Input characters
    input: Vec<char>,
    /// Current position in input
    position: usize,
}

impl Lexer {
    /// Create a new lexer for the given input
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Tokenize the entire input; the last token is always the end marker
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.is_end();
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let ch = match self.current_char() {
            Some(ch) => ch,
            None => return Token::end(),
        };

        if ch.is_ascii_alphabetic() {
            return self.read_identifier();
        }
        if ch.is_ascii_digit() {
            return self.read_number();
        }
        if ch == '"' {
            return self.read_string();
        }

        self.advance();
        if matches!(ch, '=' | '!' | '<' | '>') && self.current_char() == Some('=') {
            self.advance();
            return Token::new(TokenKind::Symbol, format!("{}=", ch));
        }
        Token::new(TokenKind::Symbol, ch.to_string())
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.current_char(), Some(ch) if ch.is_whitespace()) {
            self.advance();
        }
    }

    /// Read an identifier or keyword
    fn read_identifier(&mut self) -> Token {
        let start = self.position;
        while matches!(self.current_char(), Some(ch) if ch.is_ascii_alphanumeric() || ch == '_') {
            self.advance();
        }
        Token::new(TokenKind::Identifier, self.slice(start))
    }

    /// Read a number: digits with at most one decimal point
    fn read_number(&mut self) -> Token {
        let start = self.position;
        let mut seen_dot = false;
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                self.advance();
            } else if ch == '.' && !seen_dot {
                seen_dot = true;
                self.advance();
            } else {
                break;
            }
        }
        Token::new(TokenKind::Number, self.slice(start))
    }

    /// Read a double-quoted string; an unterminated literal runs to end of input
    fn read_string(&mut self) -> Token {
        self.advance(); // opening quote
        let start = self.position;
        while matches!(self.current_char(), Some(ch) if ch != '"') {
            self.advance();
        }
        let text = self.slice(start);
        if self.current_char().is_some() {
            self.advance(); // closing quote
        }
        Token::new(TokenKind::StringLiteral, text)
    }

    fn slice(&self, start: usize) -> String {
        self.input[start..self.position].iter().collect()
    }
}

/// Tokenize a command line
pub fn tokenize(input: &str) -> Vec<Token> {
    Lexer::new(input).tokenize()
}
