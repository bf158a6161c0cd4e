use once_cell::sync::Lazy;
use regex::Regex;

use super::FileValidationError;

/// Patterns never tolerated in a claimed filename, checked against the
/// original (pre-sanitized) name. Sanitization would strip most of these,
/// but their presence at all marks the upload as hostile.
static FORBIDDEN_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\.\.",          // parent directory traversal
        r#"[<>:"|?*]"#,   // reserved characters
        r"[\x00-\x1f]",   // control characters
        r"^\.",           // hidden files
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).expect("Invalid forbidden-filename regex"))
    .collect()
});

/// Reject filenames containing traversal sequences, reserved characters,
/// control characters, or leading dots.
pub(super) fn check_forbidden_patterns(filename: &str) -> Result<(), FileValidationError> {
    if FORBIDDEN_PATTERNS.iter().any(|re| re.is_match(filename)) {
        return Err(FileValidationError::ForbiddenPattern);
    }
    Ok(())
}

const MAX_FILENAME_LENGTH: usize = 255;
// Room left for the extension when truncating an over-long name
const TRUNCATED_STEM_LENGTH: usize = 250;

/// Derive a filesystem-safe name from an untrusted filename.
///
/// Conservative allowlist transform: directory components are stripped,
/// non-ASCII is dropped, whitespace runs become underscores, and only
/// `[A-Za-z0-9._-]` survives. Returns `None` when nothing safe remains.
pub fn sanitize_filename(filename: &str) -> Option<String> {
    // Strip directory components, both separator styles
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);

    // ASCII-fold by dropping anything outside the safe set, mapping
    // whitespace runs to single underscores
    let mut safe = String::with_capacity(base.len());
    let mut pending_separator = false;
    for c in base.chars() {
        if c.is_whitespace() {
            pending_separator = !safe.is_empty();
            continue;
        }
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            if pending_separator {
                safe.push('_');
                pending_separator = false;
            }
            safe.push(c);
        }
    }

    let safe = safe.trim_matches(['.', '_']).to_string();
    if safe.is_empty() {
        return None;
    }

    if safe.len() > MAX_FILENAME_LENGTH {
        // Truncate the stem, preserve the extension
        let mut truncated = match safe.rfind('.') {
            Some(dot) => {
                let (stem, ext) = safe.split_at(dot);
                let cut = stem.len().min(TRUNCATED_STEM_LENGTH);
                format!("{}{}", &stem[..cut], ext)
            }
            None => safe,
        };
        // Degenerate extensions can still blow the cap
        truncated.truncate(MAX_FILENAME_LENGTH);
        return Some(truncated);
    }

    Some(safe)
}
