use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to read {length} bytes at address {address:#x}")]
    MemoryReadFailed { address: u64, length: usize },

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error is a transient read failure, i.e. one the caller
    /// may recover from by retrying on a later tick.
    pub fn is_read_failure(&self) -> bool {
        matches!(self, Error::MemoryReadFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_read_failure() {
        let err = Error::MemoryReadFailed {
            address: 0x1000,
            length: 8,
        };
        assert!(err.is_read_failure());

        let err2 = Error::InvalidPattern("empty".to_string());
        assert!(!err2.is_read_failure());
    }

    #[test]
    fn test_read_failure_message_includes_address() {
        let err = Error::MemoryReadFailed {
            address: 0xDEAD_BEEF,
            length: 4,
        };
        let message = err.to_string();
        assert!(message.contains("0xdeadbeef"));
        assert!(message.contains("4 bytes"));
    }
}
