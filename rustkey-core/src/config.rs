//! Backend identifiers and per-lookup configuration
//!
//! A [`Config`] carries the application identity used to namespace lookups
//! together with the ordered list of backends the lookup may try. It is
//! built once per request and never mutated afterwards.

use serde::{Deserialize, Serialize};

/// Identifies one secret store backend family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendType {
    /// Freedesktop Secret Service on the session bus (GNOME Keyring and compatible)
    SecretService,
    /// KDE Wallet daemon
    KWallet,
    /// Windows Credential Manager
    WinCred,
    /// macOS Keychain
    Keychain,
}

impl BackendType {
    /// Returns the stable identifier string for this backend type
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::SecretService => "secret_service",
            Self::KWallet => "kwallet",
            Self::WinCred => "wincred",
            Self::Keychain => "keychain",
        }
    }
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Application identity and backend preferences for one lookup
///
/// `app_name` namespaces the search in attribute-based stores, while
/// `display_name` is what KWallet shows to the user as the requesting
/// application. `allowed_backends` is tried strictly in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application name used to namespace lookups
    pub app_name: String,
    /// Human-readable application name (the KWallet application id)
    pub display_name: String,
    /// Ordered list of backends this lookup may try
    pub allowed_backends: Vec<BackendType>,
}

impl Config {
    /// Creates a configuration with an empty backend list
    #[must_use]
    pub fn new(app_name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            display_name: display_name.into(),
            allowed_backends: Vec::new(),
        }
    }

    /// Replaces the ordered list of allowed backends
    #[must_use]
    pub fn with_allowed_backends(mut self, backends: Vec<BackendType>) -> Self {
        self.allowed_backends = backends;
        self
    }
}
