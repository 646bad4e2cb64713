//! Command language module
//!
//! This module contains the lexer, statement definitions and the positional
//! parser for the command language.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::{CompareOp, Condition, Statement};
pub use lexer::Lexer;
pub use parser::Parser;
pub use token::{Token, TokenKind};
