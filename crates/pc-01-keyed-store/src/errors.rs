use thiserror::Error;

/// Storage failures.
///
/// Every variant is treated as fatal when it surfaces during block
/// acceptance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DbError {
    #[error("Database I/O error: {message}")]
    Io { message: String },

    #[error("Database closed")]
    Closed,

    #[error("Corrupted record under key {key}: {reason}")]
    Corrupted { key: String, reason: String },
}

impl DbError {
    pub fn io(message: impl Into<String>) -> Self {
        DbError::Io {
            message: message.into(),
        }
    }

    pub fn corrupted(key: &[u8], reason: impl Into<String>) -> Self {
        DbError::Corrupted {
            key: hex::encode(key),
            reason: reason.into(),
        }
    }
}
