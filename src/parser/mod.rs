//! SQL parser: tokenization, AST and the CREATE TABLE grammar

pub mod ast;
pub mod grammar;
pub mod tokenizer;

pub use ast::*;
pub use grammar::{parse, parse_prefix, Parser};
pub use tokenizer::{tokenize, Token, TokenKind, Tokenizer};
