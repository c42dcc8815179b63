//! Error types for `RustKey`
//!
//! This module defines the error taxonomy for password lookups: transport
//! failures wrapped with the protocol step that produced them, cardinality
//! violations, exhausted backend candidates, and the permanent
//! unsupported-operation cases of individual backends.

use thiserror::Error;

/// Errors produced while locating, unlocking, or reading a stored secret
#[derive(Debug, Error)]
pub enum KeyringError {
    /// Failed to reach the bus or the secret store service
    #[error("Failed to connect to secret store: {0}")]
    Connection(#[source] zbus::Error),

    /// Failed to open a session with the secret service
    #[error("Failed to open secret service session: {0}")]
    Session(#[source] zbus::Error),

    /// Searching for matching items failed
    #[error("Searching items failed: {0}")]
    Search(#[source] zbus::Error),

    /// Unlocking the matched item failed
    #[error("Unlocking item failed: {0}")]
    Unlock(#[source] zbus::Error),

    /// Reading the secret value failed
    #[error("Getting secret failed: {0}")]
    GetSecret(#[source] zbus::Error),

    /// The service raised an unlock prompt and the user dismissed it
    #[error("The unlock prompt was dismissed")]
    PromptDismissed,

    /// The search matched a number of items other than exactly one
    #[error("Found {count} items instead of 1")]
    Cardinality {
        /// Combined number of unlocked and locked matches
        count: usize,
    },

    /// Every allowed backend was unavailable or failed to open
    #[error("No usable secret store backend found")]
    NoBackend,

    /// The backend cannot perform this operation, permanently
    #[error("Operation '{operation}' is not supported by this backend")]
    Unsupported {
        /// The operation that was attempted
        operation: &'static str,
    },

    /// Metadata on this backend requires an authenticated session to read
    #[error("Reading metadata requires authenticated credentials on this backend")]
    MetadataNeedsCredentials,

    /// A native platform credential API call failed
    #[error("Platform secret store error: {0}")]
    Platform(String),

    /// The stored secret is not valid UTF-8 where a string was requested
    #[error("Stored secret is not valid UTF-8")]
    InvalidSecret,
}

/// Result type alias for keyring operations
pub type KeyringResult<T> = std::result::Result<T, KeyringError>;
