//! Secret backend trait definition
//!
//! This module defines the `Keyring` trait that all secret store
//! implementations must implement, together with the item and metadata
//! types lookups return.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::KeyringResult;

/// A secret stored under a key
///
/// Returned data is owned by the caller; no backend retains a reference
/// to it after the call completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// The key the secret was stored under
    pub key: String,
    /// Raw secret bytes
    pub data: Vec<u8>,
}

/// Descriptive information about a stored secret
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    /// When the secret was last written, if the backend tracks it
    pub modification_time: Option<DateTime<Utc>>,
    /// Human-readable label attached to the stored item
    pub label: Option<String>,
}

/// Abstraction over secret store backends
///
/// Backends that cannot perform an operation return
/// [`KeyringError::Unsupported`](crate::error::KeyringError::Unsupported)
/// rather than silently succeeding, so callers can tell a permanent
/// limitation from a transient failure.
#[async_trait]
pub trait Keyring: Send + Sync {
    /// Retrieves the secret stored under `key`
    ///
    /// # Errors
    /// Returns `KeyringError` if the lookup fails or does not match
    /// exactly one stored item
    async fn get(&self, key: &str) -> KeyringResult<Item>;

    /// Retrieves descriptive metadata for the secret stored under `key`
    ///
    /// # Errors
    /// Returns `KeyringError` if the backend cannot read metadata
    async fn get_metadata(&self, key: &str) -> KeyringResult<Metadata>;

    /// Stores a secret
    ///
    /// # Errors
    /// Returns `KeyringError::Unsupported` on read-only backends
    async fn set(&self, item: Item) -> KeyringResult<()>;

    /// Removes the secret stored under `key`
    ///
    /// # Errors
    /// Returns `KeyringError::Unsupported` on read-only backends
    async fn remove(&self, key: &str) -> KeyringResult<()>;

    /// Lists all keys known to this backend
    ///
    /// # Errors
    /// Returns `KeyringError::Unsupported` on backends that cannot
    /// enumerate their items
    async fn keys(&self) -> KeyringResult<Vec<String>>;

    /// Returns the backend identifier (e.g., "secret_service", "kwallet")
    fn backend_id(&self) -> &'static str;

    /// Returns a human-readable name for this backend
    fn display_name(&self) -> &'static str;
}
