//! SQL statement gate for LLM-generated queries.
//!
//! Validates SQL before it is executed against the table derived from an
//! uploaded spreadsheet. The policy is allowlist-first: only `SELECT` and
//! `WITH` (CTE) queries are admitted at all, a denylist of write/DDL/command
//! keywords hard-fails regardless of context, and stacked statements are
//! rejected by a quote-aware semicolon scan. This is deliberately a
//! pattern-based gate, not a SQL parser: false positives are tolerated,
//! false negatives are not.

mod config;
mod validator;

pub use config::SqlValidatorConfig;
pub use validator::{
    validate_sql, SqlQueryMetadata, SqlValidationResult, SqlValidator,
};

use thiserror::Error;

/// Reasons a query is structurally unsafe to execute.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SqlValidationError {
    #[error("Empty SQL query")]
    Empty,

    #[error("Forbidden SQL operation detected: {0}. Only SELECT queries are allowed")]
    ForbiddenOperation(String),

    #[error("No allowed SQL operation found. Allowed: SELECT, WITH")]
    NoAllowedOperation,

    #[error("Multiple SQL statements detected. Only single queries are allowed")]
    MultipleStatements,

    #[error("SQL comments (--) not allowed in strict mode")]
    LineCommentNotAllowed,

    #[error("Multi-line comments (/* */) not allowed in strict mode")]
    BlockCommentNotAllowed,
}
