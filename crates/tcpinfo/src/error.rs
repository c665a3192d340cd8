//! Error types for decoding TCP information.

/// Result type for tcpinfo operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving, decoding or encoding TCP
/// information.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The platform, option kind or algorithm has no registered handling.
    #[error("operation not supported: {0}")]
    NotSupported(String),

    /// The buffer does not cover the mandatory prefix of the structure.
    #[error("buffer too short: need {needed} bytes, have {have}")]
    BufferTooShort {
        /// Minimum number of bytes required.
        needed: usize,
        /// Bytes actually supplied.
        have: usize,
    },

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a "not supported" error with context.
    pub fn not_supported(what: impl Into<String>) -> Self {
        Self::NotSupported(what.into())
    }

    /// Fail unless `data` holds at least `needed` bytes.
    pub(crate) fn check_len(data: &[u8], needed: usize) -> Result<()> {
        if data.len() < needed {
            return Err(Self::BufferTooShort {
                needed,
                have: data.len(),
            });
        }
        Ok(())
    }

    /// Check if this is an "operation not supported" error.
    pub fn is_not_supported(&self) -> bool {
        matches!(self, Self::NotSupported(_))
    }

    /// Check if this is a truncated input error.
    pub fn is_buffer_too_short(&self) -> bool {
        matches!(self, Self::BufferTooShort { .. })
    }
}
