use serde::{Deserialize, Serialize};

/// Default maximum upload size: 50 MiB
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// File validator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileValidatorConfig {
    /// Maximum upload size in bytes
    pub max_size: u64,
}

impl Default for FileValidatorConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl FileValidatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the maximum upload size
    pub fn with_max_size(mut self, bytes: u64) -> Self {
        self.max_size = bytes;
        self
    }
}
