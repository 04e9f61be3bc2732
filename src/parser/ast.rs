//! Abstract Syntax Tree
//!
//! Defines the structured description of a CREATE TABLE statement:
//! the table, its columns with their column-level constraints, the
//! table-level constraints and foreign-key clauses. Every enumerated
//! clause carries an explicit `None` variant for "clause absent".

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Clause Enumerations
// ============================================================================

/// Sort order of a PRIMARY KEY column or an indexed column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SortOrder {
    #[default]
    None,
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::None => "",
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Conflict resolution action (ON CONFLICT ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ConflictAction {
    #[default]
    None,
    Rollback,
    Abort,
    Fail,
    Ignore,
    Replace,
}

impl ConflictAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictAction::None => "",
            ConflictAction::Rollback => "ROLLBACK",
            ConflictAction::Abort => "ABORT",
            ConflictAction::Fail => "FAIL",
            ConflictAction::Ignore => "IGNORE",
            ConflictAction::Replace => "REPLACE",
        }
    }
}

/// Foreign key action (ON DELETE / ON UPDATE)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FkAction {
    #[default]
    None,
    SetNull,
    SetDefault,
    Cascade,
    Restrict,
    NoAction,
}

impl FkAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            FkAction::None => "",
            FkAction::SetNull => "SET NULL",
            FkAction::SetDefault => "SET DEFAULT",
            FkAction::Cascade => "CASCADE",
            FkAction::Restrict => "RESTRICT",
            FkAction::NoAction => "NO ACTION",
        }
    }
}

/// Deferrability of a foreign key
///
/// `[NOT] DEFERRABLE [INITIALLY DEFERRED | INITIALLY IMMEDIATE]` folded
/// into a single classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Deferrable {
    #[default]
    None,
    Deferrable,
    DeferrableInitiallyDeferred,
    DeferrableInitiallyImmediate,
    NotDeferrable,
    NotDeferrableInitiallyDeferred,
    NotDeferrableInitiallyImmediate,
}

impl Deferrable {
    pub fn as_str(&self) -> &'static str {
        match self {
            Deferrable::None => "",
            Deferrable::Deferrable => "DEFERRABLE",
            Deferrable::DeferrableInitiallyDeferred => "DEFERRABLE INITIALLY DEFERRED",
            Deferrable::DeferrableInitiallyImmediate => "DEFERRABLE INITIALLY IMMEDIATE",
            Deferrable::NotDeferrable => "NOT DEFERRABLE",
            Deferrable::NotDeferrableInitiallyDeferred => "NOT DEFERRABLE INITIALLY DEFERRED",
            Deferrable::NotDeferrableInitiallyImmediate => "NOT DEFERRABLE INITIALLY IMMEDIATE",
        }
    }

    /// True when constraint checking is postponed to COMMIT by default
    pub fn is_initially_deferred(&self) -> bool {
        matches!(self, Deferrable::DeferrableInitiallyDeferred)
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )*
    };
}

display_as_str!(SortOrder, ConflictAction, FkAction, Deferrable);

// ============================================================================
// Foreign Key Clause
// ============================================================================

/// REFERENCES clause, shared by column and table constraints
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ForeignKey {
    /// Referenced table
    pub table: String,
    /// Referenced columns (empty = the parent's primary key)
    pub columns: Vec<String>,
    pub on_delete: FkAction,
    pub on_update: FkAction,
    /// MATCH name
    pub match_name: Option<String>,
    pub deferrable: Deferrable,
}

impl ForeignKey {
    pub fn new(table: impl Into<String>) -> Self {
        ForeignKey {
            table: table.into(),
            ..Default::default()
        }
    }
}

// ============================================================================
// Column Definition
// ============================================================================

/// Column definition with its column-level constraints
///
/// There is no CHECK field: a CHECK constraint fails the parse.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Column {
    pub name: String,
    /// Declared type, as written
    pub type_name: Option<String>,
    /// Text between the parentheses after the type, e.g. `10, 2`
    pub length: Option<String>,
    /// Name given by `CONSTRAINT <name>` (empty when unnamed)
    pub constraint_name: String,

    pub primary_key: bool,
    pub pk_order: SortOrder,
    pub pk_conflict: ConflictAction,
    pub autoincrement: bool,

    pub not_null: bool,
    pub not_null_conflict: ConflictAction,

    pub unique: bool,
    pub unique_conflict: ConflictAction,

    /// DEFAULT literal, as text
    pub default: Option<String>,
    /// COLLATE name
    pub collation: Option<String>,
    /// Inline REFERENCES clause
    pub foreign_key: Option<ForeignKey>,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Column {
            name: name.into(),
            ..Default::default()
        }
    }
}

// ============================================================================
// Table Constraints
// ============================================================================

/// Column reference inside a PRIMARY KEY or UNIQUE table constraint
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IdxColumn {
    pub name: String,
    pub collation: Option<String>,
    pub order: SortOrder,
}

impl IdxColumn {
    pub fn new(name: impl Into<String>) -> Self {
        IdxColumn {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Table constraint
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TableConstraint {
    /// Name given by `CONSTRAINT <name>` (empty when unnamed)
    pub name: String,
    pub kind: TableConstraintKind,
}

/// Table constraint kind
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TableConstraintKind {
    PrimaryKey {
        columns: Vec<IdxColumn>,
        conflict: ConflictAction,
    },
    Unique {
        columns: Vec<IdxColumn>,
        conflict: ConflictAction,
    },
    /// CHECK bodies are not captured
    Check,
    ForeignKey {
        columns: Vec<String>,
        clause: ForeignKey,
    },
}

impl TableConstraint {
    /// Indexed columns of a PRIMARY KEY or UNIQUE constraint
    pub fn indexed_columns(&self) -> &[IdxColumn] {
        match &self.kind {
            TableConstraintKind::PrimaryKey { columns, .. }
            | TableConstraintKind::Unique { columns, .. } => columns,
            _ => &[],
        }
    }

    pub fn is_primary_key(&self) -> bool {
        matches!(self.kind, TableConstraintKind::PrimaryKey { .. })
    }

    pub fn is_foreign_key(&self) -> bool {
        matches!(self.kind, TableConstraintKind::ForeignKey { .. })
    }
}

// ============================================================================
// CREATE TABLE
// ============================================================================

/// Parsed CREATE TABLE statement
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Table {
    pub name: String,
    /// Schema qualifier of `schema.name`
    pub schema: Option<String>,
    pub temporary: bool,
    pub if_not_exists: bool,
    pub without_rowid: bool,
    pub strict: bool,
    pub columns: Vec<Column>,
    pub constraints: Vec<TableConstraint>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Table {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Look up a column by name (ASCII case-insensitive, like SQLite)
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Names of the primary key columns, in key order
    ///
    /// A table-level PRIMARY KEY wins over column-level flags; a table
    /// without either has an implicit rowid key and yields an empty list.
    pub fn primary_key(&self) -> Vec<&str> {
        if let Some(pk) = self.constraints.iter().find(|c| c.is_primary_key()) {
            return pk.indexed_columns().iter().map(|c| c.name.as_str()).collect();
        }
        self.columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Every foreign key of the table as (child columns, clause)
    ///
    /// Column-level REFERENCES clauses come first, in column order,
    /// followed by table-level FOREIGN KEY constraints.
    pub fn foreign_keys(&self) -> Vec<(Vec<&str>, &ForeignKey)> {
        let inline = self.columns.iter().filter_map(|c| {
            c.foreign_key
                .as_ref()
                .map(|fk| (vec![c.name.as_str()], fk))
        });
        let declared = self.constraints.iter().filter_map(|c| match &c.kind {
            TableConstraintKind::ForeignKey { columns, clause } => {
                Some((columns.iter().map(String::as_str).collect(), clause))
            }
            _ => None,
        });
        inline.chain(declared).collect()
    }

    /// Name as written, with the schema prefix if present
    pub fn qualified_name(&self) -> String {
        match self.schema {
            Some(ref schema) => format!("{}.{}", schema, self.name),
            None => self.name.clone(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let mut table = Table::new("orders");
        let mut id = Column::new("id");
        id.type_name = Some("INTEGER".to_string());
        id.primary_key = true;
        let mut customer = Column::new("customer_id");
        customer.foreign_key = Some(ForeignKey::new("customers"));
        table.columns = vec![id, customer];
        table.constraints.push(TableConstraint {
            name: String::new(),
            kind: TableConstraintKind::ForeignKey {
                columns: vec!["customer_id".to_string()],
                clause: ForeignKey::new("accounts"),
            },
        });
        table
    }

    #[test]
    fn test_enum_defaults_are_none() {
        assert_eq!(SortOrder::default(), SortOrder::None);
        assert_eq!(ConflictAction::default(), ConflictAction::None);
        assert_eq!(FkAction::default(), FkAction::None);
        assert_eq!(Deferrable::default(), Deferrable::None);
    }

    #[test]
    fn test_enum_display() {
        assert_eq!(FkAction::SetNull.to_string(), "SET NULL");
        assert_eq!(ConflictAction::Replace.to_string(), "REPLACE");
        assert_eq!(
            Deferrable::NotDeferrableInitiallyImmediate.to_string(),
            "NOT DEFERRABLE INITIALLY IMMEDIATE"
        );
        assert_eq!(SortOrder::None.to_string(), "");
    }

    #[test]
    fn test_column_lookup() {
        let table = sample();
        assert!(table.column("ID").is_some());
        assert!(table.column("missing").is_none());
    }

    #[test]
    fn test_primary_key_from_columns() {
        let table = sample();
        assert_eq!(table.primary_key(), vec!["id"]);
    }

    #[test]
    fn test_primary_key_prefers_table_constraint() {
        let mut table = sample();
        table.constraints.push(TableConstraint {
            name: "pk".to_string(),
            kind: TableConstraintKind::PrimaryKey {
                columns: vec![IdxColumn::new("customer_id"), IdxColumn::new("id")],
                conflict: ConflictAction::None,
            },
        });
        assert_eq!(table.primary_key(), vec!["customer_id", "id"]);
    }

    #[test]
    fn test_foreign_keys_inline_first() {
        let table = sample();
        let fks = table.foreign_keys();
        assert_eq!(fks.len(), 2);
        assert_eq!(fks[0].0, vec!["customer_id"]);
        assert_eq!(fks[0].1.table, "customers");
        assert_eq!(fks[1].1.table, "accounts");
    }

    #[test]
    fn test_qualified_name() {
        let mut table = Table::new("users");
        assert_eq!(table.qualified_name(), "users");
        table.schema = Some("main".to_string());
        assert_eq!(table.qualified_name(), "main.users");
    }

    #[test]
    fn test_indexed_columns_of_check_is_empty() {
        let check = TableConstraint {
            name: String::new(),
            kind: TableConstraintKind::Check,
        };
        assert!(check.indexed_columns().is_empty());
        assert!(!check.is_primary_key());
    }
}
