//! Output sanitization for query results and error messages.
//!
//! Everything rendered back to a user originates from untrusted input
//! (spreadsheet cells, LLM-generated SQL, error text), so it is neutralized
//! here before display: markup in cells and column names is escaped,
//! oversized output is truncated, credential-like substrings are redacted,
//! and error messages are mapped to a role-aware vocabulary that never
//! leaks filesystem paths, IP addresses, or secret tokens. These are pure
//! transforms that always degrade gracefully instead of failing.

mod config;
mod response;
mod sanitizer;
mod table;

pub use config::OutputSanitizerConfig;
pub use response::{ErrorKind, ErrorResponse};
pub use sanitizer::{safe_error_message, sanitize_sql, OutputSanitizer};
pub use table::{Cell, Table};
