//! Error types for policy restriction runs

use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while restricting bucket policies
///
/// A missing bucket policy is not an error: [`PolicyStore::get_policy`](crate::PolicyStore::get_policy)
/// reports it as `Ok(None)` and callers substitute an empty document.
#[derive(Error, Debug)]
pub enum Error {
    /// A required setting is missing or invalid
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The address-range directory could not be fetched or is malformed
    #[error("Address range resolution failed: {0}")]
    Resolution(String),

    /// Tag-based discovery of managed buckets failed
    #[error("Bucket discovery failed: {0}")]
    Discovery(String),

    /// Storage API call failed (anything other than "no policy attached")
    #[error("Storage error during {operation} on bucket {bucket}: {message}")]
    Storage {
        bucket: String,
        operation: &'static str,
        message: String,
    },

    /// The triggering event could not be decoded
    #[error("Invalid trigger event: {0}")]
    Event(String),

    /// Sending the lifecycle outcome to the provisioning system failed
    #[error("Lifecycle callback failed: {0}")]
    Callback(String),

    /// Policy document (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Build a storage error for `operation` on `bucket`
    pub fn storage(bucket: &str, operation: &'static str, message: impl Into<String>) -> Self {
        Error::Storage {
            bucket: bucket.to_string(),
            operation,
            message: message.into(),
        }
    }
}
