//! Share token configuration

use serde::{Deserialize, Serialize};

/// Smallest token length accepted by validation
pub const MIN_TOKEN_LENGTH: usize = 8;

/// Share token issuance settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SharingConfig {
    /// Number of characters in a generated token value
    pub token_length: usize,

    /// Attempts at issuing when the store reports a token value collision
    pub issue_attempts: u32,

    /// Largest accepted `days_valid`
    pub max_days_valid: u32,
}

impl Default for SharingConfig {
    fn default() -> Self {
        Self {
            token_length: 12,
            issue_attempts: 3,
            max_days_valid: 365,
        }
    }
}
