use serde::{Deserialize, Serialize};

/// Output sanitizer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSanitizerConfig {
    /// Maximum rows returned to a renderer
    pub max_rows: usize,
    /// Maximum characters per string cell
    pub max_cell_length: usize,
}

impl Default for OutputSanitizerConfig {
    fn default() -> Self {
        Self {
            max_rows: 1000,
            max_cell_length: 1000,
        }
    }
}

impl OutputSanitizerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_rows(mut self, rows: usize) -> Self {
        self.max_rows = rows;
        self
    }

    pub fn with_max_cell_length(mut self, chars: usize) -> Self {
        self.max_cell_length = chars;
        self
    }
}
