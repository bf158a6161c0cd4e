use serde::{Deserialize, Serialize};

/// SQL validator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlValidatorConfig {
    /// Enable strict validation rules (comment rejection)
    pub strict_mode: bool,
    /// Allow SQL comments (less secure)
    pub allow_comments: bool,
}

impl Default for SqlValidatorConfig {
    fn default() -> Self {
        Self {
            strict_mode: true,
            allow_comments: false,
        }
    }
}

impl SqlValidatorConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable/disable strict mode
    pub fn with_strict_mode(mut self, enabled: bool) -> Self {
        self.strict_mode = enabled;
        self
    }

    /// Allow/disallow SQL comments
    pub fn with_allow_comments(mut self, enabled: bool) -> Self {
        self.allow_comments = enabled;
        self
    }
}
