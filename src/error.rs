//! Error types and Result aliases for the DDL parser

use std::fmt;

/// Error classification
///
/// A successful parse (or empty input) is `Ok`; these are the two ways a
/// parse can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Input does not conform to the CREATE TABLE grammar
    Syntax,
    /// Valid SQLite DDL using a construct this parser does not implement
    /// (`CREATE TABLE ... AS`, CHECK, parenthesized DEFAULT, other statements)
    Unsupported,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Syntax => "syntax error",
            ErrorCode::Unsupported => "unsupported SQL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct Error {
    code: ErrorCode,
    message: String,
    line: u32,
    column: u32,
}

impl Error {
    /// Create an error anchored at a 1-based line and column
    pub fn at(code: ErrorCode, message: impl Into<String>, line: u32, column: u32) -> Self {
        Error {
            code,
            message: format!("{} at line {}, column {}", message.into(), line, column),
            line,
            column,
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Line of the offending token
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Column of the offending token
    pub fn column(&self) -> u32 {
        self.column
    }

    pub fn is_syntax(&self) -> bool {
        self.code == ErrorCode::Syntax
    }

    pub fn is_unsupported(&self) -> bool {
        self.code == ErrorCode::Unsupported
    }
}

/// Result type alias for parser operations
pub type Result<T> = std::result::Result<T, Error>;
