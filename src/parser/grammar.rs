//! SQL Grammar/Parser
//!
//! A recursive descent parser for SQLite's CREATE TABLE statement. Reads
//! tokens lazily from the tokenizer with a single token of lookahead (two
//! after NOT in a REFERENCES clause) and builds a [`Table`] according to
//! the grammar:
//!
//! ```text
//! CREATE [TEMP|TEMPORARY] TABLE [IF NOT EXISTS] [schema.]name
//!     ( column-def [, column-def]* [, table-constraint]* )
//!     [table-option [, table-option]*] [;]
//! ```
//!
//! Every rule fails on the first token it cannot accept. Constructs that
//! are valid SQLite but deliberately not implemented (`AS select`, CHECK,
//! parenthesized DEFAULT) fail with [`ErrorCode::Unsupported`] rather than
//! [`ErrorCode::Syntax`].

use crate::error::{Error, ErrorCode, Result};
use crate::parser::ast::*;
use crate::parser::tokenizer::{Token, TokenKind, Tokenizer};

// ============================================================================
// Parser
// ============================================================================

/// CREATE TABLE parser
///
/// All scan state lives here, so a parser is good for exactly one
/// statement and independent parsers never share anything.
pub struct Parser<'a> {
    source: &'a str,
    tokenizer: Tokenizer<'a>,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given SQL source
    pub fn new(source: &'a str) -> Self {
        Parser {
            source,
            tokenizer: Tokenizer::new(source),
        }
    }

    /// Parse a complete CREATE TABLE statement
    pub fn parse_create_table(&mut self) -> Result<Table> {
        let token = self.advance();
        if token.kind != TokenKind::Create {
            return Err(self.unsupported_at(&token, "only CREATE TABLE statements are supported"));
        }

        let mut table = Table::default();

        let mut token = self.advance();
        if token.kind == TokenKind::Temp {
            table.temporary = true;
            token = self.advance();
        }

        if token.kind != TokenKind::Table {
            return Err(self.unsupported_at(&token, "only CREATE TABLE statements are supported"));
        }

        if self.match_token(TokenKind::If) {
            self.expect(TokenKind::Not)?;
            self.expect(TokenKind::Exists)?;
            table.if_not_exists = true;
        }

        self.parse_table_name(&mut table)?;

        let token = self.peek();
        if token.kind == TokenKind::As {
            return Err(self.unsupported_at(&token, "CREATE TABLE ... AS SELECT is not supported"));
        }

        self.expect(TokenKind::LParen)?;
        self.parse_table_body(&mut table)?;
        self.expect(TokenKind::RParen)?;

        self.parse_table_options(&mut table)?;

        // Text after the optional `;` is not examined
        self.match_token(TokenKind::Semicolon);

        Ok(table)
    }

    // ========================================================================
    // Statement Parts
    // ========================================================================

    fn parse_table_name(&mut self, table: &mut Table) -> Result<()> {
        let first = self.expect_name("table name")?;

        let name = if self.match_token(TokenKind::Dot) {
            table.schema = Some(first.text.into_owned());
            self.expect_name("table name")?
        } else {
            first
        };

        if name.text.is_empty() {
            return Err(self.error_at(&name, "table name must not be empty"));
        }
        table.name = name.text.into_owned();
        Ok(())
    }

    /// Column definitions followed by table constraints. Once a comma is
    /// followed by a table constraint keyword, only constraints may follow.
    fn parse_table_body(&mut self, table: &mut Table) -> Result<()> {
        loop {
            table.columns.push(self.parse_column_def()?);

            if !self.match_token(TokenKind::Comma) {
                return Ok(());
            }
            if self.is_table_constraint_start() {
                break;
            }
        }

        loop {
            table.constraints.push(self.parse_table_constraint()?);

            if !self.match_token(TokenKind::Comma) {
                return Ok(());
            }
            if !self.is_table_constraint_start() {
                let token = self.peek();
                return Err(self.error_at(&token, "expected table constraint"));
            }
        }
    }

    fn is_table_constraint_start(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::Constraint
                | TokenKind::Primary
                | TokenKind::Unique
                | TokenKind::Check
                | TokenKind::Foreign
        )
    }

    /// `WITHOUT ROWID` and `STRICT`, comma separated
    fn parse_table_options(&mut self, table: &mut Table) -> Result<()> {
        if !self.is_table_option_start() {
            return Ok(());
        }

        loop {
            let token = self.advance();
            match token.kind {
                TokenKind::Without => {
                    self.expect(TokenKind::Rowid)?;
                    table.without_rowid = true;
                }
                TokenKind::Identifier if token.text.eq_ignore_ascii_case("STRICT") => {
                    table.strict = true;
                }
                _ => return Err(self.error_at(&token, "expected WITHOUT ROWID or STRICT")),
            }

            if !self.match_token(TokenKind::Comma) {
                return Ok(());
            }
        }
    }

    fn is_table_option_start(&self) -> bool {
        let token = self.peek();
        match token.kind {
            TokenKind::Without => true,
            TokenKind::Identifier => token.text.eq_ignore_ascii_case("STRICT"),
            _ => false,
        }
    }

    // ========================================================================
    // Column Definitions
    // ========================================================================

    fn parse_column_def(&mut self) -> Result<Column> {
        let name = self.expect_name("column name")?;
        let mut column = Column::new(name.text);

        if self.check(TokenKind::Identifier) {
            self.parse_type_name(&mut column)?;
        }

        self.parse_column_constraints(&mut column)?;

        Ok(column)
    }

    /// One or more identifiers (`UNSIGNED BIG INT`) and an optional
    /// parenthesized length kept as raw text
    fn parse_type_name(&mut self, column: &mut Column) -> Result<()> {
        let first = self.advance();
        let mut end = first.end;
        let mut words = 1;

        while self.check(TokenKind::Identifier) {
            end = self.advance().end;
            words += 1;
        }

        column.type_name = Some(if words == 1 {
            first.text.into_owned()
        } else {
            self.source[first.start..end].to_string()
        });

        if self.check(TokenKind::LParen) {
            let open = self.advance();
            match self.tokenizer.scan_raw_until(')') {
                Some(length) => column.length = Some(length.to_string()),
                None => return Err(self.error_at(&open, "unterminated type length")),
            }
        }

        Ok(())
    }

    fn is_column_constraint_start(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::Constraint
                | TokenKind::Primary
                | TokenKind::Not
                | TokenKind::Unique
                | TokenKind::Check
                | TokenKind::Default
                | TokenKind::Collate
                | TokenKind::References
        )
    }

    fn parse_column_constraints(&mut self, column: &mut Column) -> Result<()> {
        while self.is_column_constraint_start() {
            let mut token = self.advance();

            if token.kind == TokenKind::Constraint {
                column.constraint_name = self.expect_name("constraint name")?.text.into_owned();
                token = self.advance();
            }

            match token.kind {
                TokenKind::Primary => {
                    self.expect(TokenKind::Key)?;
                    column.primary_key = true;
                    column.pk_order = self.parse_sort_order();
                    column.pk_conflict = self.parse_conflict_clause()?;
                    column.autoincrement = self.match_token(TokenKind::Autoincrement);
                }
                TokenKind::Not => {
                    self.expect(TokenKind::Null)?;
                    column.not_null = true;
                    column.not_null_conflict = self.parse_conflict_clause()?;
                }
                TokenKind::Unique => {
                    column.unique = true;
                    column.unique_conflict = self.parse_conflict_clause()?;
                }
                TokenKind::Check => {
                    return Err(self.unsupported_at(&token, "CHECK constraints are not supported"));
                }
                TokenKind::Default => {
                    column.default = Some(self.parse_default_value()?);
                }
                TokenKind::Collate => {
                    column.collation = Some(self.expect_name("collation name")?.text.into_owned());
                }
                TokenKind::References => {
                    column.foreign_key = Some(self.parse_foreign_key_clause()?);
                }
                _ => {
                    return Err(self.error_at(&token, "expected column constraint"));
                }
            }
        }

        Ok(())
    }

    /// DEFAULT accepts a single literal; expressions are not supported
    fn parse_default_value(&mut self) -> Result<String> {
        let token = self.advance();
        match token.kind {
            TokenKind::Identifier | TokenKind::Number | TokenKind::Null => {
                Ok(token.text.into_owned())
            }
            TokenKind::LParen => {
                Err(self.unsupported_at(&token, "DEFAULT expressions are not supported"))
            }
            _ => Err(self.error_at(&token, "expected literal value after DEFAULT")),
        }
    }

    // ========================================================================
    // Foreign Key Clause
    // ========================================================================

    /// REFERENCES clause, after the REFERENCES keyword
    ///
    /// A NOT is read together with the token after it (two tokens of
    /// lookahead, the only such place in the grammar) and handed back
    /// unless that token is DEFERRABLE.
    fn parse_foreign_key_clause(&mut self) -> Result<ForeignKey> {
        let table = self.expect_name("referenced table name")?;
        let mut clause = ForeignKey::new(table.text);

        if self.match_token(TokenKind::LParen) {
            clause.columns = self.parse_identifier_list()?;
            self.expect(TokenKind::RParen)?;
        }

        // ON / MATCH / DEFERRABLE in any order; a repeated clause overwrites
        loop {
            match self.peek_kind() {
                TokenKind::On => {
                    self.advance();
                    let token = self.advance();
                    match token.kind {
                        TokenKind::Delete => clause.on_delete = self.parse_foreign_key_action()?,
                        TokenKind::Update => clause.on_update = self.parse_foreign_key_action()?,
                        _ => {
                            return Err(self.error_at(&token, "expected DELETE or UPDATE after ON"))
                        }
                    }
                }
                TokenKind::Match => {
                    self.advance();
                    clause.match_name = Some(self.expect_name("MATCH name")?.text.into_owned());
                }
                TokenKind::Not => {
                    // NOT NULL after a column's REFERENCES clause belongs to
                    // the column, so only NOT DEFERRABLE is taken here. This
                    // is the one place the parser looks two tokens ahead.
                    let saved = self.tokenizer.save();
                    self.advance();
                    if !self.match_token(TokenKind::Deferrable) {
                        self.tokenizer.restore(saved);
                        break;
                    }
                    clause.deferrable = self.parse_deferrable(true)?;
                }
                TokenKind::Deferrable => {
                    self.advance();
                    clause.deferrable = self.parse_deferrable(false)?;
                }
                _ => break,
            }
        }

        Ok(clause)
    }

    fn parse_foreign_key_action(&mut self) -> Result<FkAction> {
        let token = self.advance();
        match token.kind {
            TokenKind::Set => {
                let token = self.advance();
                match token.kind {
                    TokenKind::Null => Ok(FkAction::SetNull),
                    TokenKind::Default => Ok(FkAction::SetDefault),
                    _ => Err(self.error_at(&token, "expected NULL or DEFAULT after SET")),
                }
            }
            TokenKind::Cascade => Ok(FkAction::Cascade),
            TokenKind::Restrict => Ok(FkAction::Restrict),
            TokenKind::No => {
                self.expect(TokenKind::Action)?;
                Ok(FkAction::NoAction)
            }
            _ => Err(self.error_at(
                &token,
                "expected SET NULL, SET DEFAULT, CASCADE, RESTRICT, or NO ACTION",
            )),
        }
    }

    /// Called after `[NOT] DEFERRABLE` has been consumed
    fn parse_deferrable(&mut self, not: bool) -> Result<Deferrable> {
        if !self.match_token(TokenKind::Initially) {
            return Ok(if not {
                Deferrable::NotDeferrable
            } else {
                Deferrable::Deferrable
            });
        }

        let token = self.advance();
        match (token.kind, not) {
            (TokenKind::Deferred, false) => Ok(Deferrable::DeferrableInitiallyDeferred),
            (TokenKind::Immediate, false) => Ok(Deferrable::DeferrableInitiallyImmediate),
            (TokenKind::Deferred, true) => Ok(Deferrable::NotDeferrableInitiallyDeferred),
            (TokenKind::Immediate, true) => Ok(Deferrable::NotDeferrableInitiallyImmediate),
            _ => Err(self.error_at(&token, "expected DEFERRED or IMMEDIATE after INITIALLY")),
        }
    }

    // ========================================================================
    // Table Constraints
    // ========================================================================

    fn parse_table_constraint(&mut self) -> Result<TableConstraint> {
        let name = if self.match_token(TokenKind::Constraint) {
            self.expect_name("constraint name")?.text.into_owned()
        } else {
            String::new()
        };

        let token = self.advance();
        let kind = match token.kind {
            TokenKind::Primary => {
                self.expect(TokenKind::Key)?;
                self.expect(TokenKind::LParen)?;
                let columns = self.parse_indexed_columns()?;
                self.expect(TokenKind::RParen)?;
                let conflict = self.parse_conflict_clause()?;
                TableConstraintKind::PrimaryKey { columns, conflict }
            }
            TokenKind::Unique => {
                self.expect(TokenKind::LParen)?;
                let columns = self.parse_indexed_columns()?;
                self.expect(TokenKind::RParen)?;
                let conflict = self.parse_conflict_clause()?;
                TableConstraintKind::Unique { columns, conflict }
            }
            TokenKind::Check => {
                return Err(self.unsupported_at(&token, "CHECK constraints are not supported"));
            }
            TokenKind::Foreign => {
                self.expect(TokenKind::Key)?;
                self.expect(TokenKind::LParen)?;
                let columns = self.parse_identifier_list()?;
                self.expect(TokenKind::RParen)?;
                self.expect(TokenKind::References)?;
                let clause = self.parse_foreign_key_clause()?;
                TableConstraintKind::ForeignKey { columns, clause }
            }
            _ => {
                return Err(self.error_at(
                    &token,
                    "expected PRIMARY KEY, UNIQUE, CHECK, or FOREIGN KEY",
                ));
            }
        };

        Ok(TableConstraint { name, kind })
    }

    fn parse_indexed_columns(&mut self) -> Result<Vec<IdxColumn>> {
        let mut columns = vec![self.parse_indexed_column()?];
        while self.match_token(TokenKind::Comma) {
            columns.push(self.parse_indexed_column()?);
        }
        Ok(columns)
    }

    fn parse_indexed_column(&mut self) -> Result<IdxColumn> {
        let mut column = IdxColumn::new(self.expect_name("column name")?.text);

        if self.match_token(TokenKind::Collate) {
            column.collation = Some(self.expect_name("collation name")?.text.into_owned());
        }

        column.order = self.parse_sort_order();

        Ok(column)
    }

    // ========================================================================
    // Shared Clauses
    // ========================================================================

    fn parse_sort_order(&mut self) -> SortOrder {
        if self.match_token(TokenKind::Asc) {
            SortOrder::Asc
        } else if self.match_token(TokenKind::Desc) {
            SortOrder::Desc
        } else {
            SortOrder::None
        }
    }

    fn parse_conflict_clause(&mut self) -> Result<ConflictAction> {
        if !self.match_token(TokenKind::On) {
            return Ok(ConflictAction::None);
        }
        self.expect(TokenKind::Conflict)?;

        let token = self.advance();
        match token.kind {
            TokenKind::Rollback => Ok(ConflictAction::Rollback),
            TokenKind::Abort => Ok(ConflictAction::Abort),
            TokenKind::Fail => Ok(ConflictAction::Fail),
            TokenKind::Ignore => Ok(ConflictAction::Ignore),
            TokenKind::Replace => Ok(ConflictAction::Replace),
            _ => Err(self.error_at(&token, "expected ROLLBACK, ABORT, FAIL, IGNORE, or REPLACE")),
        }
    }

    fn parse_identifier_list(&mut self) -> Result<Vec<String>> {
        let mut names = vec![self.expect_name("column name")?.text.into_owned()];
        while self.match_token(TokenKind::Comma) {
            names.push(self.expect_name("column name")?.text.into_owned());
        }
        Ok(names)
    }

    // ========================================================================
    // Helper Methods
    // ========================================================================

    fn peek(&self) -> Token<'a> {
        self.tokenizer.peek_token()
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn advance(&mut self) -> Token<'a> {
        let token = self.tokenizer.next_token();
        log::trace!(
            "token {:?} {:?} at line {}, column {}",
            token.kind,
            token.text,
            token.line,
            token.column
        );
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token<'a>> {
        let token = self.advance();
        if token.kind == kind {
            Ok(token)
        } else {
            Err(self.error_at(&token, &format!("expected {}", kind.as_str())))
        }
    }

    /// Consume an identifier (plain or quoted); `what` names it in errors
    fn expect_name(&mut self, what: &str) -> Result<Token<'a>> {
        let token = self.advance();
        if token.kind == TokenKind::Identifier {
            Ok(token)
        } else {
            Err(self.error_at(&token, &format!("expected {}", what)))
        }
    }

    fn error_at(&self, token: &Token<'a>, msg: &str) -> Error {
        let found = match token.kind {
            TokenKind::Eof => "end of input".to_string(),
            _ => format!("\"{}\"", token.raw(self.source)),
        };
        Error::at(
            ErrorCode::Syntax,
            format!("{}, found {}", msg, found),
            token.line,
            token.column,
        )
    }

    fn unsupported_at(&self, token: &Token<'a>, msg: &str) -> Error {
        Error::at(ErrorCode::Unsupported, msg, token.line, token.column)
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Parse a CREATE TABLE statement
///
/// Returns `Ok(None)` for empty input.
pub fn parse(sql: &str) -> Result<Option<Table>> {
    parse_prefix(sql, 0)
}

/// Parse the first `len` characters of `sql` as a CREATE TABLE statement
///
/// A non-positive `len` means the whole text; a `len` past the end is
/// clamped. Returns `Ok(None)` when the resolved text is empty.
pub fn parse_prefix(sql: &str, len: isize) -> Result<Option<Table>> {
    let source = if len <= 0 {
        sql
    } else {
        match sql.char_indices().nth(len as usize) {
            Some((end, _)) => &sql[..end],
            None => sql,
        }
    };

    if source.is_empty() {
        return Ok(None);
    }

    log::debug!("parsing CREATE TABLE ({} bytes)", source.len());

    let mut parser = Parser::new(source);
    match parser.parse_create_table() {
        Ok(table) => {
            log::debug!(
                "parsed table {} with {} columns and {} constraints",
                table.qualified_name(),
                table.columns.len(),
                table.constraints.len()
            );
            Ok(Some(table))
        }
        Err(err) => {
            log::debug!("CREATE TABLE parse failed: {}", err);
            Err(err)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
