//! macOS Keychain backend
//!
//! Thin call-through to the Security framework's generic password
//! lookup. The framework call can block on the user's keychain unlock
//! dialog, so it runs on the blocking thread pool.

use async_trait::async_trait;
use security_framework::os::macos::passwords::find_generic_password;

use crate::error::{KeyringError, KeyringResult};

use super::backend::{Item, Keyring, Metadata};

/// macOS Keychain backend handle
pub struct KeychainKeyring {
    service: String,
}

impl KeychainKeyring {
    /// Creates a backend reading generic passwords stored under `service`
    #[must_use]
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }
}

#[async_trait]
impl Keyring for KeychainKeyring {
    async fn get(&self, key: &str) -> KeyringResult<Item> {
        let service = self.service.clone();
        let account = key.to_string();
        let data = tokio::task::spawn_blocking(move || {
            find_generic_password(None, &service, &account)
                .map(|(password, _item)| password.to_vec())
        })
        .await
        .map_err(|e| KeyringError::Platform(format!("keychain task failed: {e}")))?
        .map_err(|e| KeyringError::Platform(format!("keychain lookup failed: {e}")))?;

        Ok(Item {
            key: key.to_string(),
            data,
        })
    }

    async fn get_metadata(&self, _key: &str) -> KeyringResult<Metadata> {
        Err(KeyringError::Unsupported {
            operation: "get_metadata",
        })
    }

    async fn set(&self, _item: Item) -> KeyringResult<()> {
        Err(KeyringError::Unsupported { operation: "set" })
    }

    async fn remove(&self, _key: &str) -> KeyringResult<()> {
        Err(KeyringError::Unsupported {
            operation: "remove",
        })
    }

    async fn keys(&self) -> KeyringResult<Vec<String>> {
        Err(KeyringError::Unsupported { operation: "keys" })
    }

    fn backend_id(&self) -> &'static str {
        "keychain"
    }

    fn display_name(&self) -> &'static str {
        "macOS Keychain"
    }
}
