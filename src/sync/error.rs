use thiserror::Error;

use crate::database::StoreError;

/// Failure of a synchronizer operation
#[derive(Debug, Error)]
pub enum SyncError {
    /// Malformed input such as a bad external UUID or unknown stream role
    #[error("{0}")]
    Validation(String),

    /// Referenced resource, stream, project or role is absent
    #[error("{0}")]
    NotFound(String),

    /// Uniqueness violation or unresolvable role
    #[error("{0}")]
    Conflict(String),

    /// Underlying write or transaction failure
    #[error("storage failure: {0}")]
    Storage(StoreError),
}

impl SyncError {
    pub fn validation(message: impl Into<String>) -> Self {
        SyncError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        SyncError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        SyncError::Conflict(message.into())
    }

    /// Stable kind name for logs and clients
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Validation(_) => "ValidationError",
            SyncError::NotFound(_) => "NotFoundError",
            SyncError::Conflict(_) => "ConflictError",
            SyncError::Storage(_) => "StorageError",
        }
    }
}

impl From<StoreError> for SyncError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(key) => SyncError::Conflict(format!("Duplicate value for {}", key)),
            other => SyncError::Storage(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_key_becomes_conflict() {
        let err = SyncError::from(StoreError::Duplicate("email".into()));
        assert_eq!(err.kind(), "ConflictError");
        assert_eq!(err.to_string(), "Duplicate value for email");
    }

    #[test]
    fn other_store_errors_stay_storage() {
        let err = SyncError::from(StoreError::Fault("insert_team"));
        assert_eq!(err.kind(), "StorageError");
    }
}
