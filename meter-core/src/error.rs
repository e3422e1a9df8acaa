use thiserror::Error;

/// Errors raised along the read → decrypt → decode → assemble pipeline
#[derive(Error, Debug)]
pub enum MeterError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame boundary lost; the reader discards the bytes and reads again
    #[error("Incomplete message received, synchronizing: {0}")]
    Sync(String),

    /// Frame header or declared lengths are structurally invalid
    #[error("Frame format error: {0}")]
    Format(String),

    /// AEAD tag verification failed (wrong key or corrupted ciphertext)
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Decode error: {0}")]
    Decode(String),

    /// Not exactly the full tracked field set was recovered
    #[error("Only {found} values found in message{}", format_found(.fields))]
    Incomplete { found: usize, fields: Vec<String> },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

fn format_found(fields: &[String]) -> String {
    if fields.is_empty() {
        String::new()
    } else {
        format!(": {}", fields.join(","))
    }
}

impl MeterError {
    /// Whether this failure counts towards the error breaker.
    ///
    /// Losing frame sync is steady-state line noise and is not counted.
    pub fn is_counted(&self) -> bool {
        !matches!(self, MeterError::Sync(_))
    }
}

/// Result type alias for meter readout operations
pub type MeterResult<T> = Result<T, MeterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incomplete_lists_found_fields() {
        let err = MeterError::Incomplete {
            found: 2,
            fields: vec!["VoltageL1".to_string(), "CurrentL1".to_string()],
        };
        assert_eq!(err.to_string(), "Only 2 values found in message: VoltageL1,CurrentL1");

        let empty = MeterError::Incomplete { found: 0, fields: Vec::new() };
        assert_eq!(empty.to_string(), "Only 0 values found in message");
    }

    #[test]
    fn test_sync_is_not_counted() {
        assert!(!MeterError::Sync("short read".into()).is_counted());
        assert!(MeterError::Auth("tag mismatch".into()).is_counted());
        assert!(MeterError::Format("zero length".into()).is_counted());
    }
}
