use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

use super::filename::{check_forbidden_patterns, sanitize_filename};
use super::{FileValidationError, FileValidatorConfig};

/// Leading bytes inspected for the content-type signature. OOXML
/// detection walks zip entry headers, so it needs more than a few bytes.
const SNIFF_LENGTH: usize = 8192;

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// MIME types an upload may sniff as
const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/vnd.ms-excel",
    XLSX_MIME,
    "text/csv",
    "text/plain",
];

/// Claimed extensions an upload may carry (defense in depth, enforced
/// independently of the sniffed type)
const ALLOWED_EXTENSIONS: &[&str] = &[".xlsx", ".xls", ".csv"];

/// Details recorded for an accepted upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub original_filename: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub size_mb: f64,
    pub extension: String,
    pub validated_at: DateTime<Utc>,
}

/// Outcome of a successful upload validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileValidationResult {
    pub safe_filename: String,
    pub metadata: FileMetadata,
}

/// Validates spreadsheet uploads with security checks.
#[derive(Debug, Clone, Default)]
pub struct FileValidator {
    config: FileValidatorConfig,
}

impl FileValidator {
    pub fn new(config: FileValidatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FileValidatorConfig {
        &self.config
    }

    /// Validate raw upload bytes against a claimed filename.
    ///
    /// Checks run in order and short-circuit on the first failure: size
    /// bounds, content-type sniffing, extension allowlist, filename
    /// sanitization, forbidden-pattern scan, macro detection.
    pub fn validate(
        &self,
        data: &[u8],
        filename: &str,
    ) -> Result<FileValidationResult, FileValidationError> {
        let size = data.len() as u64;
        if size == 0 {
            return Err(FileValidationError::Empty);
        }
        if size > self.config.max_size {
            return Err(FileValidationError::TooLarge {
                size,
                max: self.config.max_size,
            });
        }

        let mime_type = detect_mime_type(data)?;
        if !ALLOWED_MIME_TYPES.contains(&mime_type.as_str()) {
            return Err(FileValidationError::DisallowedType(mime_type));
        }

        let extension = extract_extension(filename);
        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(FileValidationError::DisallowedExtension(extension));
        }

        let safe_filename =
            sanitize_filename(filename).ok_or(FileValidationError::UnsafeFilename)?;

        check_forbidden_patterns(filename)?;

        if mime_type == XLSX_MIME && has_macros(data) {
            return Err(FileValidationError::MacrosDetected);
        }

        Ok(FileValidationResult {
            safe_filename,
            metadata: FileMetadata {
                original_filename: filename.to_string(),
                mime_type,
                size_bytes: size,
                size_mb: (size as f64 / 1024.0 / 1024.0 * 100.0).round() / 100.0,
                extension,
                validated_at: Utc::now(),
            },
        })
    }
}

/// Sniff the MIME type from the leading bytes, never from the extension.
///
/// `infer` covers the binary signatures (OOXML, OLE compound). It has no
/// text matcher, so signature-less buffers that read as clean UTF-8 text
/// are classified as csv/plain here; anything else is a detection failure.
fn detect_mime_type(data: &[u8]) -> Result<String, FileValidationError> {
    let head = &data[..data.len().min(SNIFF_LENGTH)];

    if let Some(kind) = infer::get(head) {
        return Ok(kind.mime_type().to_string());
    }

    if let Ok(text) = std::str::from_utf8(head) {
        let clean = !text
            .chars()
            .any(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t'));
        if clean {
            let delimited = text
                .lines()
                .next()
                .is_some_and(|line| line.contains(',') || line.contains(';'));
            return Ok(if delimited { "text/csv" } else { "text/plain" }.to_string());
        }
    }

    Err(FileValidationError::TypeDetectionFailed)
}

fn extract_extension(filename: &str) -> String {
    match filename.rfind('.') {
        Some(dot) => filename[dot..].to_lowercase(),
        None => String::new(),
    }
}

/// XLSX files are zip containers; macros live in `xl/vbaProject.bin`.
/// Non-zip or corrupt input is treated as macro-free: the container scan
/// blocks the specific macro signature, it is not an archive integrity
/// check.
fn has_macros(data: &[u8]) -> bool {
    match zip::ZipArchive::new(Cursor::new(data)) {
        Ok(archive) => archive.file_names().any(|name| {
            let lower = name.to_lowercase();
            lower.contains("vbaproject.bin") || lower.contains("vba")
        }),
        Err(_) => false,
    }
}

/// Validate a file upload (convenience wrapper).
pub fn validate_upload(
    data: &[u8],
    filename: &str,
    max_size: Option<u64>,
) -> Result<FileValidationResult, FileValidationError> {
    let config = match max_size {
        Some(bytes) => FileValidatorConfig::new().with_max_size(bytes),
        None => FileValidatorConfig::default(),
    };
    FileValidator::new(config).validate(data, filename)
}
