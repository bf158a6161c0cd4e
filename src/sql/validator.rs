use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{SqlValidationError, SqlValidatorConfig};

/// Write, DDL, and command-execution keywords. Any whole-word match fails
/// validation regardless of surrounding context, even inside a string
/// literal. False-positive-tolerant by design.
const FORBIDDEN_OPERATIONS: &[&str] = &[
    "DROP", "DELETE", "UPDATE", "INSERT", "ALTER", "CREATE", "TRUNCATE", "REPLACE", "MERGE",
    "EXECUTE", "EXEC", "CALL", "GRANT", "REVOKE", "PRAGMA",
];

/// Read-only operations a query must contain at least one of.
const ALLOWED_OPERATIONS: &[&str] = &["SELECT", "WITH"];

const MAX_SUBQUERIES: usize = 5;
const MAX_JOINS: usize = 10;
const MAX_UNIONS: usize = 3;

static FORBIDDEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\b({})\b", FORBIDDEN_OPERATIONS.join("|")))
        .expect("Invalid forbidden-operation regex")
});

static ALLOWED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\b({})\b", ALLOWED_OPERATIONS.join("|")))
        .expect("Invalid allowed-operation regex")
});

/// Patterns that do not fail validation on their own but are worth
/// surfacing to the caller's logs.
static SUSPICIOUS_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"--", "--"),
        (r"(?s)/\*.*?\*/", "/* */"),
        (r"(?i)xp_cmdshell", "xp_cmdshell"),
        (r"(?i)into\s+outfile", "into outfile"),
        (r"(?i)load_file", "load_file"),
        (r"(?i)char\(", "char("),
        (r"(?i)concat\s*\(", "concat("),
    ]
    .into_iter()
    .map(|(pattern, label)| {
        (
            Regex::new(pattern).expect("Invalid suspicious-pattern regex"),
            label,
        )
    })
    .collect()
});

static LINE_COMMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"--[^\n]*").expect("Invalid line-comment regex"));

static BLOCK_COMMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("Invalid block-comment regex"));

static NESTED_SELECT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\(\s*SELECT\b").expect("Invalid nested-select regex"));

/// Extracted query shape, attached to a successful validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlQueryMetadata {
    /// First allowed keyword the query starts with, else "UNKNOWN"
    pub operation: String,
    pub has_joins: bool,
    pub has_subqueries: bool,
}

/// Outcome of a successful validation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlValidationResult {
    pub valid: bool,
    /// Non-fatal findings (suspicious patterns, complexity)
    pub warnings: Vec<String>,
    /// Comment-stripped, whitespace-normalized query
    pub sanitized_query: String,
    pub metadata: SqlQueryMetadata,
}

/// Validates SQL queries for structural read-only safety.
#[derive(Debug, Clone, Default)]
pub struct SqlValidator {
    config: SqlValidatorConfig,
}

impl SqlValidator {
    pub fn new(config: SqlValidatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SqlValidatorConfig {
        &self.config
    }

    /// Validate a SQL query.
    ///
    /// Returns the sanitized query plus warnings on success; fails with
    /// [`SqlValidationError`] when the query is structurally unsafe.
    pub fn validate(&self, sql: &str) -> Result<SqlValidationResult, SqlValidationError> {
        let normalized = sql.trim();

        if normalized.is_empty() {
            return Err(SqlValidationError::Empty);
        }

        self.check_forbidden_operations(normalized)?;
        self.check_allowed_operations(normalized)?;
        self.check_multiple_statements(normalized)?;

        let mut warnings = self.scan_suspicious_patterns(normalized);
        warnings.extend(self.check_complexity(normalized));

        if self.config.strict_mode && !self.config.allow_comments {
            self.check_comments(normalized)?;
        }

        let sql_upper = normalized.to_uppercase();

        Ok(SqlValidationResult {
            valid: true,
            warnings,
            sanitized_query: self.sanitize_query(normalized),
            metadata: SqlQueryMetadata {
                operation: self.extract_operation(&sql_upper),
                has_joins: sql_upper.contains("JOIN"),
                has_subqueries: NESTED_SELECT_RE.is_match(normalized),
            },
        })
    }

    fn check_forbidden_operations(&self, sql: &str) -> Result<(), SqlValidationError> {
        if let Some(found) = FORBIDDEN_RE.find(sql) {
            return Err(SqlValidationError::ForbiddenOperation(
                found.as_str().to_uppercase(),
            ));
        }
        Ok(())
    }

    fn check_allowed_operations(&self, sql: &str) -> Result<(), SqlValidationError> {
        if !ALLOWED_RE.is_match(sql) {
            return Err(SqlValidationError::NoAllowedOperation);
        }
        Ok(())
    }

    /// Count semicolons outside string literals; more than one fails. One
    /// separator is tolerated wherever it sits, so `";;"` fails while a
    /// mid-query `";"` passes and the keyword gate covers what follows it.
    fn check_multiple_statements(&self, sql: &str) -> Result<(), SqlValidationError> {
        let mut in_string = false;
        let mut quote_char = '\0';
        let mut prev = '\0';
        let mut semicolons = 0usize;

        for c in sql.chars() {
            if c == '\'' || c == '"' {
                if !in_string {
                    in_string = true;
                    quote_char = c;
                } else if c == quote_char && prev != '\\' {
                    in_string = false;
                }
            }

            if c == ';' && !in_string {
                semicolons += 1;
            }

            prev = c;
        }

        if semicolons > 1 {
            return Err(SqlValidationError::MultipleStatements);
        }
        Ok(())
    }

    fn scan_suspicious_patterns(&self, sql: &str) -> Vec<String> {
        SUSPICIOUS_PATTERNS
            .iter()
            .filter(|(re, _)| re.is_match(sql))
            .map(|(_, label)| format!("Suspicious pattern detected: {label}"))
            .collect()
    }

    fn check_complexity(&self, sql: &str) -> Vec<String> {
        let mut warnings = Vec::new();
        let sql_upper = sql.to_uppercase();

        // Parenthesis + SELECT counts approximate subquery depth. SELECT
        // is counted case-sensitively here, unlike the keyword gates.
        let subquery_count =
            (sql.matches('(').count() + sql.matches("SELECT").count()).saturating_sub(1);
        if subquery_count > MAX_SUBQUERIES {
            warnings.push(format!(
                "High subquery count: {subquery_count} (max recommended: {MAX_SUBQUERIES})"
            ));
        }

        let join_count = sql_upper.matches("JOIN").count();
        if join_count > MAX_JOINS {
            warnings.push(format!(
                "High JOIN count: {join_count} (max recommended: {MAX_JOINS})"
            ));
        }

        let union_count = sql_upper.matches("UNION").count();
        if union_count > MAX_UNIONS {
            warnings.push(format!(
                "High UNION count: {union_count} (max recommended: {MAX_UNIONS})"
            ));
        }

        warnings
    }

    /// Comments are a classic injection-hiding vector, so their mere
    /// presence fails validation in strict mode even though the sanitizer
    /// would strip them.
    fn check_comments(&self, sql: &str) -> Result<(), SqlValidationError> {
        if sql.contains("--") {
            return Err(SqlValidationError::LineCommentNotAllowed);
        }
        if sql.contains("/*") || sql.contains("*/") {
            return Err(SqlValidationError::BlockCommentNotAllowed);
        }
        Ok(())
    }

    fn extract_operation(&self, sql_upper: &str) -> String {
        let trimmed = sql_upper.trim_start();
        for op in ALLOWED_OPERATIONS {
            if trimmed.starts_with(op) {
                return (*op).to_string();
            }
        }
        "UNKNOWN".to_string()
    }

    fn sanitize_query(&self, sql: &str) -> String {
        let without_line = LINE_COMMENT_RE.replace_all(sql, "");
        let without_block = BLOCK_COMMENT_RE.replace_all(&without_line, "");
        without_block
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Validate a SQL query (convenience wrapper).
pub fn validate_sql(
    sql: &str,
    strict_mode: bool,
    allow_comments: bool,
) -> Result<SqlValidationResult, SqlValidationError> {
    SqlValidator::new(SqlValidatorConfig {
        strict_mode,
        allow_comments,
    })
    .validate(sql)
}
