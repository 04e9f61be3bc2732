//! RustQL DDL - SQLite CREATE TABLE parser
//!
//! Turns the text of a single `CREATE TABLE` statement into a [`Table`]
//! describing its columns, column constraints, table constraints and table
//! options.
//!
//! ```
//! let table = rustql_ddl::parse("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)")
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(table.name, "t");
//! assert_eq!(table.primary_key(), vec!["id"]);
//! ```

pub mod error;
pub mod parser;

// Re-export main public types
pub use error::{Error, ErrorCode, Result};
pub use parser::ast::{
    Column, ConflictAction, Deferrable, FkAction, ForeignKey, IdxColumn, SortOrder, Table,
    TableConstraint, TableConstraintKind,
};
pub use parser::grammar::{parse, parse_prefix, Parser};
