//! SQL tokenization
//!
//! Implements the tokenizer for CREATE TABLE statements following SQLite's
//! lexical rules: keywords, plain and quoted identifiers, numeric literals,
//! punctuation and comments. Tokens are produced lazily from the current
//! cursor position; `peek_token` scans the next token on a copy of the
//! cursor so it never moves the real one.

use std::borrow::Cow;

// ============================================================================
// Token Types
// ============================================================================

/// Token kind enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Identifiers and literals
    Identifier,
    Number,

    // Keywords (alphabetical)
    Abort,
    Action,
    As,
    Asc,
    Autoincrement,
    Cascade,
    Check,
    Collate,
    Conflict,
    Constraint,
    Create,
    Default,
    Deferrable,
    Deferred,
    Delete,
    Desc,
    Exists,
    Fail,
    Foreign,
    If,
    Ignore,
    Immediate,
    Initially,
    Key,
    Match,
    No,
    Not,
    Null,
    On,
    Primary,
    References,
    Replace,
    Restrict,
    Rollback,
    Rowid,
    Set,
    Table,
    /// TEMP or TEMPORARY
    Temp,
    Unique,
    Update,
    Without,

    // Punctuation
    LParen,    // (
    RParen,    // )
    Comma,     // ,
    Semicolon, // ;
    Dot,       // .

    // Special
    Eof,
    /// Unrecognized character, unterminated quote or unterminated comment
    Error,
}

impl TokenKind {
    /// Human readable form used in error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Identifier => "identifier",
            TokenKind::Number => "number",
            TokenKind::Abort => "ABORT",
            TokenKind::Action => "ACTION",
            TokenKind::As => "AS",
            TokenKind::Asc => "ASC",
            TokenKind::Autoincrement => "AUTOINCREMENT",
            TokenKind::Cascade => "CASCADE",
            TokenKind::Check => "CHECK",
            TokenKind::Collate => "COLLATE",
            TokenKind::Conflict => "CONFLICT",
            TokenKind::Constraint => "CONSTRAINT",
            TokenKind::Create => "CREATE",
            TokenKind::Default => "DEFAULT",
            TokenKind::Deferrable => "DEFERRABLE",
            TokenKind::Deferred => "DEFERRED",
            TokenKind::Delete => "DELETE",
            TokenKind::Desc => "DESC",
            TokenKind::Exists => "EXISTS",
            TokenKind::Fail => "FAIL",
            TokenKind::Foreign => "FOREIGN",
            TokenKind::If => "IF",
            TokenKind::Ignore => "IGNORE",
            TokenKind::Immediate => "IMMEDIATE",
            TokenKind::Initially => "INITIALLY",
            TokenKind::Key => "KEY",
            TokenKind::Match => "MATCH",
            TokenKind::No => "NO",
            TokenKind::Not => "NOT",
            TokenKind::Null => "NULL",
            TokenKind::On => "ON",
            TokenKind::Primary => "PRIMARY",
            TokenKind::References => "REFERENCES",
            TokenKind::Replace => "REPLACE",
            TokenKind::Restrict => "RESTRICT",
            TokenKind::Rollback => "ROLLBACK",
            TokenKind::Rowid => "ROWID",
            TokenKind::Set => "SET",
            TokenKind::Table => "TABLE",
            TokenKind::Temp => "TEMP",
            TokenKind::Unique => "UNIQUE",
            TokenKind::Update => "UPDATE",
            TokenKind::Without => "WITHOUT",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::Dot => ".",
            TokenKind::Eof => "end of input",
            TokenKind::Error => "invalid token",
        }
    }
}

// ============================================================================
// Token
// ============================================================================

/// A token from the SQL source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    /// Token type
    pub kind: TokenKind,
    /// Token text; for quoted identifiers the unquoted, unescaped content
    pub text: Cow<'a, str>,
    /// Start byte offset in source
    pub start: usize,
    /// End byte offset in source (exclusive)
    pub end: usize,
    /// Line number (1-based)
    pub line: u32,
    /// Column number (1-based, in characters)
    pub column: u32,
}

impl<'a> Token<'a> {
    /// Get the raw source text of this token, quotes included
    pub fn raw<'s>(&self, source: &'s str) -> &'s str {
        &source[self.start..self.end]
    }

    /// Get the length of this token in bytes
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Check if the token is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// Tokenizer
// ============================================================================

/// Scan position: byte offset plus line/column bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pos: usize,
    line: u32,
    column: u32,
}

/// SQL tokenizer
#[derive(Debug, Clone, Copy)]
pub struct Tokenizer<'a> {
    source: &'a str,
    cursor: Cursor,
}

impl<'a> Tokenizer<'a> {
    /// Create a new tokenizer
    pub fn new(source: &'a str) -> Self {
        Tokenizer {
            source,
            cursor: Cursor {
                pos: 0,
                line: 1,
                column: 1,
            },
        }
    }

    /// Tokenize the entire source, up to and including `Eof` or the first
    /// `Error` token
    pub fn tokenize(&mut self) -> Vec<Token<'a>> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token();
            let last = matches!(token.kind, TokenKind::Eof | TokenKind::Error);
            tokens.push(token);
            if last {
                break;
            }
        }

        tokens
    }

    /// Get the next token and advance past it
    pub fn next_token(&mut self) -> Token<'a> {
        if let Err(start) = self.skip_whitespace_and_comments() {
            return self.token_from(TokenKind::Error, start, None);
        }

        let start = self.cursor;
        let c = match self.current() {
            Some(c) => c,
            None => return self.token_from(TokenKind::Eof, start, None),
        };

        // Identifiers and keywords
        if c.is_alphabetic() || c == '_' {
            return self.scan_identifier(start);
        }

        // Quoted identifiers ("foo", `foo`, 'foo' or [foo])
        if matches!(c, '"' | '`' | '\'' | '[') {
            return self.scan_quoted_identifier(start, c);
        }

        // Numbers, optionally signed
        let signed = matches!(c, '+' | '-') && self.peek().is_some_and(|n| n.is_ascii_digit());
        if c.is_ascii_digit() || signed {
            return self.scan_number(start);
        }

        self.advance();
        let kind = match c {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '.' => TokenKind::Dot,
            _ => TokenKind::Error,
        };
        self.token_from(kind, start, None)
    }

    /// Get the next token without advancing
    pub fn peek_token(&self) -> Token<'a> {
        let mut probe = *self;
        probe.next_token()
    }

    /// Snapshot the scan position
    pub fn save(&self) -> Cursor {
        self.cursor
    }

    /// Rewind to a position returned by `save`
    pub fn restore(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }

    /// Consume raw characters up to and including `close`, returning the
    /// text in between. Returns `None` when input ends first.
    pub fn scan_raw_until(&mut self, close: char) -> Option<&'a str> {
        let start = self.cursor.pos;
        while let Some(c) = self.current() {
            if c == close {
                let text = &self.source[start..self.cursor.pos];
                self.advance();
                return Some(text);
            }
            self.advance();
        }
        None
    }

    /// Scan an identifier or keyword
    fn scan_identifier(&mut self, start: Cursor) -> Token<'a> {
        while let Some(c) = self.current() {
            if c.is_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let text = &self.source[start.pos..self.cursor.pos];
        self.token_from(keyword_or_identifier(text), start, None)
    }

    /// Scan a quoted identifier; a doubled closing quote stands for one
    fn scan_quoted_identifier(&mut self, start: Cursor, quote: char) -> Token<'a> {
        let close = if quote == '[' { ']' } else { quote };
        self.advance();
        let content_start = self.cursor.pos;
        let mut escaped = false;

        loop {
            match self.current() {
                None => return self.token_from(TokenKind::Error, start, None),
                Some(c) if c == close => {
                    if quote != '[' && self.peek() == Some(close) {
                        escaped = true;
                        self.advance();
                        self.advance();
                    } else {
                        break;
                    }
                }
                Some(_) => self.advance(),
            }
        }

        let content = &self.source[content_start..self.cursor.pos];
        self.advance(); // closing quote

        let text = if escaped {
            let single = close.to_string();
            Cow::Owned(content.replace(&single.repeat(2), &single))
        } else {
            Cow::Borrowed(content)
        };
        self.token_from(TokenKind::Identifier, start, Some(text))
    }

    /// Scan a number: optional sign, decimal or hex integer, optional
    /// fraction and exponent
    fn scan_number(&mut self, start: Cursor) -> Token<'a> {
        if matches!(self.current(), Some('+' | '-')) {
            self.advance();
        }

        // Hex integer
        if self.current() == Some('0') && matches!(self.peek(), Some('x' | 'X')) {
            self.advance();
            self.advance();
            let digits = self.cursor.pos;
            self.skip_while(|c| c.is_ascii_hexdigit());
            if self.cursor.pos == digits {
                return self.finish_number(start, TokenKind::Error);
            }
            return self.finish_number(start, TokenKind::Number);
        }

        // Integer part
        self.skip_while(|c| c.is_ascii_digit());

        // Fraction
        if self.current() == Some('.') {
            self.advance();
            self.skip_while(|c| c.is_ascii_digit());
        }

        // Exponent
        if matches!(self.current(), Some('e' | 'E')) {
            let saved = self.cursor;
            self.advance();
            if matches!(self.current(), Some('+' | '-')) {
                self.advance();
            }
            if self.current().is_some_and(|c| c.is_ascii_digit()) {
                self.skip_while(|c| c.is_ascii_digit());
            } else {
                // Not a valid exponent, restore position
                self.cursor = saved;
            }
        }

        self.finish_number(start, TokenKind::Number)
    }

    /// A number running straight into identifier characters (`12ab`) is
    /// not a token SQLite accepts
    fn finish_number(&mut self, start: Cursor, kind: TokenKind) -> Token<'a> {
        if self.current().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.skip_while(|c| c.is_alphanumeric() || c == '_');
            return self.token_from(TokenKind::Error, start, None);
        }
        self.token_from(kind, start, None)
    }

    /// Skip whitespace and comments. Fails with the comment's start
    /// position when a block comment is left open.
    fn skip_whitespace_and_comments(&mut self) -> Result<(), Cursor> {
        loop {
            self.skip_while(is_space);

            // Skip -- comments, up to the newline or end of input
            if self.current() == Some('-') && self.peek() == Some('-') {
                self.skip_while(|c| c != '\n' && c != '\r');
                continue;
            }

            // Skip /* */ comments
            if self.current() == Some('/') && self.peek() == Some('*') {
                let start = self.cursor;
                self.advance();
                self.advance();
                loop {
                    match self.current() {
                        None => return Err(start),
                        Some('*') if self.peek() == Some('/') => {
                            self.advance();
                            self.advance();
                            break;
                        }
                        Some(_) => self.advance(),
                    }
                }
                continue;
            }

            return Ok(());
        }
    }

    fn token_from(&self, kind: TokenKind, start: Cursor, text: Option<Cow<'a, str>>) -> Token<'a> {
        Token {
            kind,
            text: text.unwrap_or(Cow::Borrowed(&self.source[start.pos..self.cursor.pos])),
            start: start.pos,
            end: self.cursor.pos,
            line: start.line,
            column: start.column,
        }
    }

    fn skip_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.current() {
            if !pred(c) {
                break;
            }
            self.advance();
        }
    }

    /// Get current character
    fn current(&self) -> Option<char> {
        self.source[self.cursor.pos..].chars().next()
    }

    /// Peek at the character after the current one
    fn peek(&self) -> Option<char> {
        let mut chars = self.source[self.cursor.pos..].chars();
        chars.next();
        chars.next()
    }

    /// Advance to next character
    fn advance(&mut self) {
        if let Some(c) = self.current() {
            self.cursor.pos += c.len_utf8();
            if c == '\n' {
                self.cursor.line += 1;
                self.cursor.column = 1;
            } else {
                self.cursor.column += 1;
            }
        }
    }
}

/// Insignificant whitespace and newlines
fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0B' | '\x0C' | '\n' | '\r')
}

// ============================================================================
// Keyword Recognition
// ============================================================================

/// Map a text to a keyword or identifier token
fn keyword_or_identifier(text: &str) -> TokenKind {
    // The longest keyword is AUTOINCREMENT
    if text.len() > 13 {
        return TokenKind::Identifier;
    }

    // ASCII case-insensitive keyword matching
    match text.to_ascii_uppercase().as_str() {
        "ABORT" => TokenKind::Abort,
        "ACTION" => TokenKind::Action,
        "AS" => TokenKind::As,
        "ASC" => TokenKind::Asc,
        "AUTOINCREMENT" => TokenKind::Autoincrement,
        "CASCADE" => TokenKind::Cascade,
        "CHECK" => TokenKind::Check,
        "COLLATE" => TokenKind::Collate,
        "CONFLICT" => TokenKind::Conflict,
        "CONSTRAINT" => TokenKind::Constraint,
        "CREATE" => TokenKind::Create,
        "DEFAULT" => TokenKind::Default,
        "DEFERRABLE" => TokenKind::Deferrable,
        "DEFERRED" => TokenKind::Deferred,
        "DELETE" => TokenKind::Delete,
        "DESC" => TokenKind::Desc,
        "EXISTS" => TokenKind::Exists,
        "FAIL" => TokenKind::Fail,
        "FOREIGN" => TokenKind::Foreign,
        "IF" => TokenKind::If,
        "IGNORE" => TokenKind::Ignore,
        "IMMEDIATE" => TokenKind::Immediate,
        "INITIALLY" => TokenKind::Initially,
        "KEY" => TokenKind::Key,
        "MATCH" => TokenKind::Match,
        "NO" => TokenKind::No,
        "NOT" => TokenKind::Not,
        "NULL" => TokenKind::Null,
        "ON" => TokenKind::On,
        "PRIMARY" => TokenKind::Primary,
        "REFERENCES" => TokenKind::References,
        "REPLACE" => TokenKind::Replace,
        "RESTRICT" => TokenKind::Restrict,
        "ROLLBACK" => TokenKind::Rollback,
        "ROWID" => TokenKind::Rowid,
        "SET" => TokenKind::Set,
        "TABLE" => TokenKind::Table,
        "TEMP" | "TEMPORARY" => TokenKind::Temp,
        "UNIQUE" => TokenKind::Unique,
        "UPDATE" => TokenKind::Update,
        "WITHOUT" => TokenKind::Without,
        _ => TokenKind::Identifier,
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Tokenize a SQL string
pub fn tokenize(source: &str) -> Vec<Token<'_>> {
    let mut tokenizer = Tokenizer::new(source);
    tokenizer.tokenize()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_tokenize_keywords() {
        let tokens = tokenize("CREATE TABLE IF NOT EXISTS");
        assert_eq!(tokens.len(), 6);
        assert_eq!(tokens[0].kind, TokenKind::Create);
        assert_eq!(tokens[1].kind, TokenKind::Table);
        assert_eq!(tokens[2].kind, TokenKind::If);
        assert_eq!(tokens[3].kind, TokenKind::Not);
        assert_eq!(tokens[4].kind, TokenKind::Exists);
        assert_eq!(tokens[5].kind, TokenKind::Eof);
    }

    #[test]
    fn test_tokenize_case_insensitive() {
        assert_eq!(
            kinds("create Table pRiMaRy"),
            vec![TokenKind::Create, TokenKind::Table, TokenKind::Primary, TokenKind::Eof]
        );
    }

    #[test]
    fn test_temp_and_temporary() {
        assert_eq!(kinds("TEMP temporary"), vec![TokenKind::Temp, TokenKind::Temp, TokenKind::Eof]);
    }

    #[test]
    fn test_tokenize_identifiers() {
        let tokens = tokenize("foo bar123 _baz données");
        assert!(tokens[..4].iter().all(|t| t.kind == TokenKind::Identifier));
        assert_eq!(tokens[1].text, "bar123");
        assert_eq!(tokens[3].text, "données");
    }

    #[test]
    fn test_keyword_prefix_is_identifier() {
        let tokens = tokenize("tables keys");
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
    }

    #[test]
    fn test_tokenize_quoted_identifier() {
        let tokens = tokenize("\"my table\" `another` [bracketed] 'single'");
        assert!(tokens[..4].iter().all(|t| t.kind == TokenKind::Identifier));
        assert_eq!(tokens[0].text, "my table");
        assert_eq!(tokens[1].text, "another");
        assert_eq!(tokens[2].text, "bracketed");
        assert_eq!(tokens[3].text, "single");
        assert_eq!(tokens[0].raw("\"my table\""), "\"my table\"");
    }

    #[test]
    fn test_quoted_keyword_is_identifier() {
        let tokens = tokenize("\"table\" [primary]");
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].text, "table");
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
    }

    #[test]
    fn test_doubled_quote_escape() {
        let tokens = tokenize("\"a\"\"b\" 'it''s' [x]]");
        assert_eq!(tokens[0].text, "a\"b");
        assert_eq!(tokens[1].text, "it's");
        // brackets have no escape: `[x]` then a stray `]`
        assert_eq!(tokens[2].text, "x");
        assert_eq!(tokens[3].kind, TokenKind::Error);
    }

    #[test]
    fn test_unterminated_quote() {
        let tokens = tokenize("\"abc");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Error);
        assert_eq!(tokens[0].text, "\"abc");
    }

    #[test]
    fn test_tokenize_numbers() {
        let tokens = tokenize("42 3.14 1e10 0x1F -7 +2.5");
        assert!(tokens[..6].iter().all(|t| t.kind == TokenKind::Number));
        assert_eq!(tokens[4].text, "-7");
        assert_eq!(tokens[5].text, "+2.5");
    }

    #[test]
    fn test_number_followed_by_letters() {
        assert_eq!(kinds("12ab")[0], TokenKind::Error);
        assert_eq!(kinds("0x")[0], TokenKind::Error);
    }

    #[test]
    fn test_tokenize_punctuation() {
        assert_eq!(
            kinds("( ) , ; ."),
            vec![
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::Comma,
                TokenKind::Semicolon,
                TokenKind::Dot,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unrecognized_character() {
        let tokens = tokenize("a = b");
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[1].kind, TokenKind::Error);
        assert_eq!(tokens[1].text, "=");
    }

    #[test]
    fn test_tokenize_comments() {
        assert_eq!(
            kinds("CREATE -- comment\nTABLE"),
            vec![TokenKind::Create, TokenKind::Table, TokenKind::Eof]
        );
    }

    #[test]
    fn test_unterminated_line_comment() {
        assert_eq!(kinds("TABLE -- trailing"), vec![TokenKind::Table, TokenKind::Eof]);
    }

    #[test]
    fn test_tokenize_block_comment() {
        assert_eq!(
            kinds("CREATE /* multi\nline ** */ TABLE"),
            vec![TokenKind::Create, TokenKind::Table, TokenKind::Eof]
        );
    }

    #[test]
    fn test_unterminated_block_comment() {
        let tokens = tokenize("CREATE /* never closed");
        assert_eq!(tokens[0].kind, TokenKind::Create);
        assert_eq!(tokens[1].kind, TokenKind::Error);
        assert_eq!(tokens[1].column, 8);
    }

    #[test]
    fn test_peek_does_not_advance() {
        let mut tokenizer = Tokenizer::new("CREATE TABLE");
        assert_eq!(tokenizer.peek_token().kind, TokenKind::Create);
        assert_eq!(tokenizer.peek_token().kind, TokenKind::Create);
        assert_eq!(tokenizer.next_token().kind, TokenKind::Create);
        assert_eq!(tokenizer.peek_token().kind, TokenKind::Table);
        assert_eq!(tokenizer.next_token().kind, TokenKind::Table);
        assert_eq!(tokenizer.next_token().kind, TokenKind::Eof);
        assert_eq!(tokenizer.next_token().kind, TokenKind::Eof);
    }

    #[test]
    fn test_save_restore() {
        let mut tokenizer = Tokenizer::new("NOT NULL");
        let saved = tokenizer.save();
        assert_eq!(tokenizer.next_token().kind, TokenKind::Not);
        tokenizer.restore(saved);
        assert_eq!(tokenizer.next_token().kind, TokenKind::Not);
        assert_eq!(tokenizer.next_token().kind, TokenKind::Null);
    }

    #[test]
    fn test_scan_raw_until() {
        let mut tokenizer = Tokenizer::new("(10, 2) NOT");
        assert_eq!(tokenizer.next_token().kind, TokenKind::LParen);
        assert_eq!(tokenizer.scan_raw_until(')'), Some("10, 2"));
        assert_eq!(tokenizer.next_token().kind, TokenKind::Not);

        let mut tokenizer = Tokenizer::new("(10");
        tokenizer.next_token();
        assert_eq!(tokenizer.scan_raw_until(')'), None);
    }

    #[test]
    fn test_token_position() {
        let tokens = tokenize("CREATE\n  TABLE");
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[1].line, tokens[1].column), (2, 3));
        assert_eq!(tokens[1].start, 9);
        assert_eq!(tokens[1].len(), 5);
    }
}
