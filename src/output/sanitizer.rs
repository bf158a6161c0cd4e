use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use super::response::ErrorKind;
use super::table::{Cell, Table};
use super::OutputSanitizerConfig;
use crate::rate_limit::Role;

const MAX_COLUMN_NAME_LENGTH: usize = 100;
const MAX_SQL_LENGTH: usize = 5000;
const SQL_TRUNCATION_MARK: &str = "\n... (truncated)";
const DETAIL_TRUNCATION_MARK: &str = "... (truncated)";
const MAX_DETAIL_LENGTH: usize = 500;

static COLUMN_CHAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9_\- ]").expect("Invalid column-name regex"));

/// Scheme prefixes that stay dangerous as attribute values even after HTML
/// escaping; the colon is neutralized separately.
static URI_SCHEME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(javascript|data):").expect("Invalid uri-scheme regex"));

/// Credential-shaped assignments redacted from displayed SQL
static SENSITIVE_SQL_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (
            r#"(?i)(password|passwd|pwd)\s*=\s*['"][^'"]+['"]"#,
            "${1}=***",
        ),
        (r#"(?i)(secret|token|key)\s*=\s*['"][^'"]+['"]"#, "${1}=***"),
        (r#"(?i)(api[_-]?key)\s*=\s*['"][^'"]+['"]"#, "${1}=***"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| {
        (
            Regex::new(pattern).expect("Invalid sensitive-sql regex"),
            replacement,
        )
    })
    .collect()
});

static PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(/[a-zA-Z0-9_\-./]+)").expect("Invalid path regex"));

static IP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}\b").expect("Invalid ip regex")
});

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(gsk_|sk-)[a-zA-Z0-9]{20,}").expect("Invalid token regex"));

/// Sanitizes tabular results, SQL text, and error messages for display.
#[derive(Debug, Clone, Default)]
pub struct OutputSanitizer {
    config: OutputSanitizerConfig,
}

impl OutputSanitizer {
    pub fn new(config: OutputSanitizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OutputSanitizerConfig {
        &self.config
    }

    /// Produce a safe-to-render copy of a result table.
    ///
    /// Rows beyond the configured maximum are dropped (with a warning
    /// string reporting original vs. truncated counts), column names are
    /// rewritten to a safe alphabet, string cells are HTML-escaped and
    /// length-capped, and non-finite numerics become display tokens.
    pub fn sanitize_table(
        &self,
        table: &Table,
        escape_markup: bool,
        truncate: bool,
    ) -> (Table, Option<String>) {
        let original_rows = table.row_count();
        let mut warning = None;

        let keep = if truncate && original_rows > self.config.max_rows {
            warning = Some(format!(
                "Results truncated to {} rows (original: {} rows)",
                self.config.max_rows, original_rows
            ));
            warn!(
                original_rows,
                max_rows = self.config.max_rows,
                "result table truncated"
            );
            self.config.max_rows
        } else {
            original_rows
        };

        let columns = self.sanitize_column_names(&table.columns);
        let rows = table
            .rows
            .iter()
            .take(keep)
            .map(|row| {
                row.iter()
                    .map(|cell| self.sanitize_cell(cell, escape_markup))
                    .collect()
            })
            .collect();

        (Table::new(columns, rows), warning)
    }

    fn sanitize_column_names(&self, columns: &[String]) -> Vec<String> {
        let mut safe_columns: Vec<String> = Vec::with_capacity(columns.len());

        for col in columns {
            let mut safe = COLUMN_CHAR_RE.replace_all(col, "_").trim().to_string();

            if safe.len() > MAX_COLUMN_NAME_LENGTH {
                safe.truncate(MAX_COLUMN_NAME_LENGTH);
                safe.push_str("...");
            }

            if safe.is_empty() {
                safe = format!("column_{}", safe_columns.len());
            }

            // Positional suffix keeps rewritten names unique
            if safe_columns.contains(&safe) {
                safe = format!("{}_{}", safe, safe_columns.len());
                while safe_columns.contains(&safe) {
                    safe.push('_');
                }
            }

            safe_columns.push(safe);
        }

        safe_columns
    }

    fn sanitize_cell(&self, cell: &Cell, escape_markup: bool) -> Cell {
        match cell {
            Cell::Null => Cell::Text("N/A".to_string()),
            Cell::Float(f) if f.is_nan() => Cell::Text("N/A".to_string()),
            Cell::Float(f) if f.is_infinite() => {
                Cell::Text(if *f > 0.0 { "∞" } else { "-∞" }.to_string())
            }
            Cell::Text(s) if escape_markup => Cell::Text(self.escape_text(s)),
            other => other.clone(),
        }
    }

    fn escape_text(&self, value: &str) -> String {
        let truncated: String = if value.chars().count() > self.config.max_cell_length {
            let mut t: String = value.chars().take(self.config.max_cell_length).collect();
            t.push_str("...");
            t
        } else {
            value.to_string()
        };

        let escaped = escape_html(&truncated);
        URI_SCHEME_RE.replace_all(&escaped, "${1}&#58;").into_owned()
    }

    /// Sanitize SQL text for display: credential-shaped assignments are
    /// redacted to `key=***` and over-long queries are truncated.
    /// Idempotent, so already-sanitized text passes through unchanged.
    pub fn sanitize_sql_query(&self, sql: &str, hide_sensitive: bool) -> String {
        if sql.is_empty() {
            return String::new();
        }

        let mut sanitized = sql.trim().to_string();

        if hide_sensitive {
            for (re, replacement) in SENSITIVE_SQL_PATTERNS.iter() {
                sanitized = re.replace_all(&sanitized, *replacement).into_owned();
            }
        }

        if sanitized.chars().count() > MAX_SQL_LENGTH && !sanitized.ends_with(SQL_TRUNCATION_MARK)
        {
            sanitized = sanitized
                .chars()
                .take(MAX_SQL_LENGTH)
                .collect::<String>()
                + SQL_TRUNCATION_MARK;
        }

        sanitized
    }

    /// Render an error for display.
    ///
    /// `user_facing` selects a fixed generic vocabulary keyed on the error
    /// kind, never echoing raw detail. The privileged view keeps the detail
    /// but redacts filesystem paths, IPv4 addresses, and credential-shaped
    /// tokens, capped at 500 characters.
    pub fn sanitize_error_message(
        &self,
        kind: &ErrorKind,
        detail: &str,
        user_facing: bool,
        include_type: bool,
    ) -> String {
        if user_facing {
            let message = kind.user_message();
            if include_type {
                return format!("{}: {}", kind.name(), message);
            }
            return message.to_string();
        }

        let mut sanitized = PATH_RE.replace_all(detail, "[PATH]").into_owned();
        sanitized = IP_RE.replace_all(&sanitized, "[IP]").into_owned();
        sanitized = TOKEN_RE.replace_all(&sanitized, "${1}***").into_owned();

        if sanitized.chars().count() > MAX_DETAIL_LENGTH {
            sanitized = sanitized
                .chars()
                .take(MAX_DETAIL_LENGTH)
                .collect::<String>()
                + DETAIL_TRUNCATION_MARK;
        }

        format!("{}: {}", kind.name(), sanitized)
    }
}

/// HTML-entity encode the characters dangerous in markup contexts.
/// Ampersand first so existing entities are not double-escaped twice over.
fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Sanitize SQL text for display (convenience wrapper).
pub fn sanitize_sql(sql: &str) -> String {
    OutputSanitizer::default().sanitize_sql_query(sql, true)
}

/// Role-aware safe error message (convenience wrapper).
pub fn safe_error_message(kind: &ErrorKind, detail: &str, role: &Role) -> String {
    OutputSanitizer::default().sanitize_error_message(kind, detail, !role.is_admin(), false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sanitizer() -> OutputSanitizer {
        OutputSanitizer::default()
    }

    fn one_cell_table(value: &str) -> Table {
        Table::new(
            vec!["value".to_string()],
            vec![vec![Cell::from(value)]],
        )
    }

    fn first_cell(table: &Table) -> &str {
        table.rows[0][0].as_text().unwrap()
    }

    #[test]
    fn test_xss_script_tag_escaped() {
        let (safe, _) = sanitizer().sanitize_table(
            &one_cell_table(r#"<script>alert("XSS")</script>"#),
            true,
            true,
        );
        let cell = first_cell(&safe);
        assert!(!cell.contains('<'));
        assert!(!cell.contains('>'));
        assert!(cell.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_xss_img_tag_escaped() {
        let (safe, _) =
            sanitizer().sanitize_table(&one_cell_table("<img src=x onerror=alert(1)>"), true, true);
        assert!(!first_cell(&safe).contains('<'));
    }

    #[test]
    fn test_javascript_protocol_neutralized() {
        let (safe, _) =
            sanitizer().sanitize_table(&one_cell_table("javascript:alert(1)"), true, true);
        assert_eq!(first_cell(&safe), "javascript&#58;alert(1)");

        let (safe, _) =
            sanitizer().sanitize_table(&one_cell_table("JaVaScRiPt:alert(1)"), true, true);
        assert!(first_cell(&safe).contains("&#58;"));
    }

    #[test]
    fn test_data_uri_neutralized() {
        let (safe, _) = sanitizer().sanitize_table(
            &one_cell_table("data:text/html;base64,PHNjcmlwdD4="),
            true,
            true,
        );
        assert!(first_cell(&safe).starts_with("data&#58;"));
    }

    #[test]
    fn test_quotes_and_ampersands_escaped() {
        let (safe, _) = sanitizer().sanitize_table(
            &one_cell_table(r#"O'Brien & "sons" <ltd>"#),
            true,
            true,
        );
        let cell = first_cell(&safe);
        assert!(cell.contains("&#x27;"));
        assert!(cell.contains("&amp;"));
        assert!(cell.contains("&quot;"));
        assert!(!cell.contains(" & "));
    }

    #[test]
    fn test_escape_markup_disabled_leaves_text() {
        let (safe, _) = sanitizer().sanitize_table(&one_cell_table("<b>bold</b>"), false, true);
        assert_eq!(first_cell(&safe), "<b>bold</b>");
    }

    #[test]
    fn test_special_chars_in_column_names() {
        let table = Table::new(
            vec![
                "user@email!".to_string(),
                "price ($)".to_string(),
                "normal_col".to_string(),
            ],
            vec![],
        );
        let (safe, _) = sanitizer().sanitize_table(&table, true, true);
        assert_eq!(safe.columns[0], "user_email_");
        assert_eq!(safe.columns[1], "price ___");
        assert_eq!(safe.columns[2], "normal_col");
    }

    #[test]
    fn test_very_long_column_names_truncated() {
        let table = Table::new(vec!["c".repeat(150)], vec![]);
        let (safe, _) = sanitizer().sanitize_table(&table, true, true);
        assert_eq!(safe.columns[0].len(), 103);
        assert!(safe.columns[0].ends_with("..."));
    }

    #[test]
    fn test_empty_column_name_gets_placeholder() {
        let table = Table::new(vec!["".to_string(), "  ".to_string()], vec![]);
        let (safe, _) = sanitizer().sanitize_table(&table, true, true);
        assert_eq!(safe.columns[0], "column_0");
        assert_eq!(safe.columns[1], "column_1");
    }

    #[test]
    fn test_duplicate_column_names_disambiguated() {
        let table = Table::new(
            vec!["name".to_string(), "name".to_string(), "name".to_string()],
            vec![],
        );
        let (safe, _) = sanitizer().sanitize_table(&table, true, true);
        assert_eq!(safe.columns[0], "name");
        assert_eq!(safe.columns[1], "name_1");
        assert_eq!(safe.columns[2], "name_2");
    }

    #[test]
    fn test_truncate_large_results() {
        let rows: Vec<Vec<Cell>> = (0..2000).map(|i| vec![Cell::Int(i)]).collect();
        let table = Table::new(vec!["n".to_string()], rows);

        let (safe, warning) = sanitizer().sanitize_table(&table, true, true);
        assert_eq!(safe.row_count(), 1000);
        let warning = warning.unwrap();
        assert!(warning.contains("1000"));
        assert!(warning.contains("2000"));
    }

    #[test]
    fn test_small_results_not_truncated() {
        let rows: Vec<Vec<Cell>> = (0..3).map(|i| vec![Cell::Int(i)]).collect();
        let table = Table::new(vec!["n".to_string()], rows);

        let (safe, warning) = sanitizer().sanitize_table(&table, true, true);
        assert_eq!(safe.row_count(), 3);
        assert!(warning.is_none());
    }

    #[test]
    fn test_truncate_disabled() {
        let rows: Vec<Vec<Cell>> = (0..5).map(|i| vec![Cell::Int(i)]).collect();
        let table = Table::new(vec!["n".to_string()], rows);
        let small = OutputSanitizer::new(OutputSanitizerConfig::new().with_max_rows(2));

        let (safe, warning) = small.sanitize_table(&table, true, false);
        assert_eq!(safe.row_count(), 5);
        assert!(warning.is_none());
    }

    #[test]
    fn test_null_and_nan_become_na() {
        let table = Table::new(
            vec!["v".to_string()],
            vec![vec![Cell::Null], vec![Cell::Float(f64::NAN)]],
        );
        let (safe, _) = sanitizer().sanitize_table(&table, true, true);
        assert_eq!(safe.rows[0][0], Cell::Text("N/A".to_string()));
        assert_eq!(safe.rows[1][0], Cell::Text("N/A".to_string()));
    }

    #[test]
    fn test_infinity_tokens() {
        let table = Table::new(
            vec!["v".to_string()],
            vec![
                vec![Cell::Float(f64::INFINITY)],
                vec![Cell::Float(f64::NEG_INFINITY)],
            ],
        );
        let (safe, _) = sanitizer().sanitize_table(&table, true, true);
        assert_eq!(safe.rows[0][0], Cell::Text("∞".to_string()));
        assert_eq!(safe.rows[1][0], Cell::Text("-∞".to_string()));
    }

    #[test]
    fn test_finite_numbers_kept_typed() {
        let table = Table::new(
            vec!["v".to_string()],
            vec![vec![Cell::Int(7)], vec![Cell::Float(1.5)]],
        );
        let (safe, _) = sanitizer().sanitize_table(&table, true, true);
        assert_eq!(safe.rows[0][0], Cell::Int(7));
        assert_eq!(safe.rows[1][0], Cell::Float(1.5));
    }

    #[test]
    fn test_long_cell_values_truncated() {
        let long = "A".repeat(2000);
        let small = OutputSanitizer::new(OutputSanitizerConfig::new().with_max_cell_length(100));
        let (safe, _) = small.sanitize_table(&one_cell_table(&long), true, true);
        let cell = first_cell(&safe);
        assert_eq!(cell.len(), 103);
        assert!(cell.ends_with("..."));
    }

    #[test]
    fn test_original_table_untouched() {
        let table = one_cell_table("<script>");
        let (_, _) = sanitizer().sanitize_table(&table, true, true);
        assert_eq!(first_cell(&table), "<script>");
    }

    #[test]
    fn test_sql_password_redacted() {
        let out = sanitize_sql("SELECT * FROM users WHERE password='secret123'");
        assert!(out.contains("password=***"));
        assert!(!out.contains("secret123"));
    }

    #[test]
    fn test_sql_api_key_and_token_redacted() {
        let out = sanitize_sql("SELECT 1 WHERE api_key='gsk_abc123xyz' AND token = 'tok_55'");
        assert!(out.contains("=***"));
        assert!(!out.contains("gsk_abc123xyz"));
        assert!(!out.contains("tok_55"));
    }

    #[test]
    fn test_sql_truncated() {
        let long = format!("SELECT '{}'", "x".repeat(6000));
        let out = sanitize_sql(&long);
        assert!(out.ends_with("... (truncated)"));
        assert!(out.chars().count() < 6000);
    }

    #[test]
    fn test_sanitize_sql_idempotent() {
        let inputs = vec![
            "SELECT * FROM t".to_string(),
            "SELECT * FROM users WHERE password='hunter2'".to_string(),
            format!("SELECT '{}'", "y".repeat(7000)),
            String::new(),
            "   padded   ".to_string(),
        ];
        for input in &inputs {
            let once = sanitize_sql(input);
            assert_eq!(sanitize_sql(&once), once);
        }
    }

    #[test]
    fn test_user_facing_messages_are_generic() {
        let msg = sanitizer().sanitize_error_message(
            &ErrorKind::FileNotFound,
            "/srv/uploads/tenant-7/data.xlsx missing",
            true,
            false,
        );
        assert_eq!(msg, "File not found. Please upload again.");
        assert!(!msg.contains("/srv"));

        let msg = sanitizer().sanitize_error_message(
            &ErrorKind::Other("WeirdInternalFault".to_string()),
            "stack trace here",
            true,
            false,
        );
        assert_eq!(msg, "An error occurred. Please try again or contact support.");
    }

    #[test]
    fn test_user_facing_with_type_prefix() {
        let msg =
            sanitizer().sanitize_error_message(&ErrorKind::Timeout, "deadline", true, true);
        assert_eq!(msg, "Timeout: Request timed out. Please try again.");
    }

    #[test]
    fn test_admin_messages_redact_paths() {
        let msg = sanitizer().sanitize_error_message(
            &ErrorKind::FileNotFound,
            "/etc/passwd not found",
            false,
            true,
        );
        assert_eq!(msg, "FileNotFound: [PATH] not found");
    }

    #[test]
    fn test_admin_messages_redact_ips() {
        let msg = sanitizer().sanitize_error_message(
            &ErrorKind::ConnectionFailed,
            "connect to 192.168.1.100 failed",
            false,
            true,
        );
        assert!(msg.contains("[IP]"));
        assert!(!msg.contains("192.168.1.100"));
    }

    #[test]
    fn test_admin_messages_redact_tokens() {
        let msg = sanitizer().sanitize_error_message(
            &ErrorKind::InvalidInput,
            "bad key gsk_abcdefghijklmnopqrstuvwx",
            false,
            true,
        );
        assert!(msg.contains("gsk_***"));
        assert!(!msg.contains("abcdefghijklmnopqrstuvwx"));

        let msg = sanitizer().sanitize_error_message(
            &ErrorKind::InvalidInput,
            "sk-ABCDEFGHIJKLMNOPQRSTUV123",
            false,
            false,
        );
        assert!(msg.contains("sk-***"));
    }

    #[test]
    fn test_admin_detail_capped() {
        let msg = sanitizer().sanitize_error_message(
            &ErrorKind::InvalidInput,
            &"z".repeat(900),
            false,
            true,
        );
        assert!(msg.ends_with("... (truncated)"));
    }

    #[test]
    fn test_safe_error_message_by_role() {
        let user_msg = safe_error_message(&ErrorKind::OutOfMemory, "at 10.0.0.7", &Role::User);
        assert_eq!(user_msg, "File too large to process. Maximum size: 50MB.");

        let admin_msg = safe_error_message(&ErrorKind::OutOfMemory, "at 10.0.0.7", &Role::Admin);
        assert!(admin_msg.contains("[IP]"));
    }
}
