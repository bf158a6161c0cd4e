//! # SheetGuard - Request Validation Pipeline
//!
//! Security guardrails for an "ask your spreadsheet in natural language"
//! feature: an LLM turns user questions into SQL that runs against a table
//! derived from an uploaded spreadsheet. Both the SQL text and the rendered
//! results originate from untrusted input, so every request passes through
//! independent, order-composable defenses before anything reaches storage,
//! execution, or a browser.
//!
//! ## Validators
//!
//! - **SQL gate** ([`sql`]): admits only read-only queries (SELECT/WITH),
//!   rejects dangerous operations and stacked statements, flags suspicious
//!   constructs.
//! - **Upload validator** ([`file`]): verifies true content type from byte
//!   signatures, sanitizes filenames, detects embedded macros.
//! - **Output sanitizer** ([`output`]): neutralizes markup injection in
//!   tabular results, redacts credentials from SQL text, produces role-aware
//!   error messages that never leak paths, IPs, or tokens.
//! - **Rate limiter** ([`rate_limit`]): role-based sliding-window quotas
//!   keyed by caller identity.
//!
//! ## Example Usage
//!
//! ```
//! use sheetguard::sql::SqlValidator;
//!
//! let validator = SqlValidator::default();
//! let result = validator.validate("SELECT name, total FROM sheet WHERE total > 100")?;
//! assert!(result.valid);
//! # Ok::<(), sheetguard::sql::SqlValidationError>(())
//! ```

pub mod config;
pub mod file;
pub mod output;
pub mod rate_limit;
pub mod sql;

// Re-export key types explicitly to avoid ambiguity
pub use config::Config;
pub use file::{validate_upload, FileValidationError, FileValidator};
pub use output::{safe_error_message, sanitize_sql, OutputSanitizer, Table};
pub use rate_limit::{RateLimitError, RateLimiter, Role};
pub use sql::{validate_sql, SqlValidationError, SqlValidator};
