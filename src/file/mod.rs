//! Upload validator for spreadsheet files.
//!
//! Verifies true content type from byte signatures rather than trusting the
//! claimed filename, enforces size bounds, sanitizes filenames against path
//! traversal and control-character tricks, and scans Office Open XML
//! containers for embedded VBA macros. Checks short-circuit in order; the
//! first failure wins.

mod config;
mod filename;
mod validator;

pub use config::FileValidatorConfig;
pub use filename::sanitize_filename;
pub use validator::{validate_upload, FileMetadata, FileValidationResult, FileValidator};

use thiserror::Error;

/// Reasons an upload is unsafe to persist or parse.
#[derive(Debug, Error, PartialEq)]
pub enum FileValidationError {
    #[error("Empty file not allowed")]
    Empty,

    #[error(
        "File too large: {:.1}MB (max: {:.0}MB)",
        *size as f64 / 1024.0 / 1024.0,
        *max as f64 / 1024.0 / 1024.0
    )]
    TooLarge { size: u64, max: u64 },

    #[error("Failed to detect file type from content")]
    TypeDetectionFailed,

    #[error("Invalid file type: {0}. Allowed: Excel (.xlsx, .xls) or CSV only")]
    DisallowedType(String),

    #[error("Invalid file extension: {0}. Allowed: .xlsx, .xls, .csv")]
    DisallowedExtension(String),

    #[error("Invalid filename. Use only alphanumeric characters, dots, underscores, and hyphens")]
    UnsafeFilename,

    #[error("Forbidden character pattern detected in filename")]
    ForbiddenPattern,

    #[error(
        "Macro-enabled Excel files (.xlsm) not allowed for security. \
         Please save as .xlsx without macros"
    )]
    MacrosDetected,
}
