//! Backend registry and candidate iteration
//!
//! The registry is built once by an explicit detection step and is
//! immutable afterwards. A backend whose runtime prerequisite is missing
//! (no session bus, wrong platform) is simply absent from the table, and
//! absence is never an error on its own: only exhausting every allowed
//! candidate fails the lookup.

use std::collections::HashMap;

use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::config::{BackendType, Config};
use crate::error::{KeyringError, KeyringResult};

use super::backend::Keyring;

/// Constructor producing a live backend handle for one backend type
type Opener =
    Box<dyn Fn(Config) -> BoxFuture<'static, KeyringResult<Box<dyn Keyring>>> + Send + Sync>;

/// Table of backends usable on this host
pub struct BackendRegistry {
    openers: HashMap<BackendType, Opener>,
}

impl BackendRegistry {
    /// Detects which backends are usable and builds their opener table
    ///
    /// On Unix-like systems this probes the session bus once; the
    /// resulting connection is shared by the openers of both bus-based
    /// backends. The handles they construct still own their own service
    /// sessions. Native platform backends register under their target-os
    /// builds without any probing.
    pub async fn detect() -> Self {
        let mut openers: HashMap<BackendType, Opener> = HashMap::new();

        #[cfg(all(unix, not(target_os = "macos")))]
        match zbus::Connection::session().await {
            Ok(connection) => {
                let bus = connection.clone();
                openers.insert(
                    BackendType::SecretService,
                    Box::new(move |config: Config| {
                        let bus = bus.clone();
                        Box::pin(async move {
                            let ring = super::secret_service::SecretServiceKeyring::connect(
                                bus,
                                config.app_name,
                            )
                            .await?;
                            Ok(Box::new(ring) as Box<dyn Keyring>)
                        })
                    }),
                );

                let bus = connection;
                openers.insert(
                    BackendType::KWallet,
                    Box::new(move |config: Config| {
                        let bus = bus.clone();
                        Box::pin(async move {
                            let ring = super::kwallet::KWalletKeyring::connect(
                                bus,
                                config.app_name,
                                config.display_name,
                            )
                            .await?;
                            Ok(Box::new(ring) as Box<dyn Keyring>)
                        })
                    }),
                );
            }
            Err(e) => debug!(error = %e, "Session bus unavailable, skipping bus backends"),
        }

        #[cfg(target_os = "macos")]
        openers.insert(
            BackendType::Keychain,
            Box::new(|config: Config| {
                Box::pin(async move {
                    let ring = super::keychain::KeychainKeyring::new(config.app_name);
                    Ok(Box::new(ring) as Box<dyn Keyring>)
                })
            }),
        );

        #[cfg(target_os = "windows")]
        openers.insert(
            BackendType::WinCred,
            Box::new(|_config: Config| {
                Box::pin(async move {
                    let ring = super::wincred::WinCredKeyring::new();
                    Ok(Box::new(ring) as Box<dyn Keyring>)
                })
            }),
        );

        Self { openers }
    }

    /// Creates a registry with no backends
    #[must_use]
    pub fn empty() -> Self {
        Self {
            openers: HashMap::new(),
        }
    }

    /// Returns whether a backend type was detected on this host
    #[must_use]
    pub fn contains(&self, backend: BackendType) -> bool {
        self.openers.contains_key(&backend)
    }

    /// Returns the detected backend types, in no particular order
    #[must_use]
    pub fn backend_types(&self) -> Vec<BackendType> {
        self.openers.keys().copied().collect()
    }

    /// Opens the first usable backend from the config's candidate list
    ///
    /// Candidates are tried strictly in order. Types absent from the
    /// registry are skipped; a present opener that fails is logged and
    /// the next candidate is tried. The returned handle owns its
    /// connection and session and is not pooled across calls.
    ///
    /// # Errors
    /// Returns `KeyringError::NoBackend` when every candidate was absent
    /// or failed to open
    pub async fn open(&self, config: &Config) -> KeyringResult<Box<dyn Keyring>> {
        for candidate in &config.allowed_backends {
            let Some(opener) = self.openers.get(candidate) else {
                debug!(backend = %candidate, "Backend not detected, skipping");
                continue;
            };
            match opener(config.clone()).await {
                Ok(ring) => {
                    debug!(backend = %candidate, "Opened secret store backend");
                    return Ok(ring);
                }
                Err(e) => warn!(backend = %candidate, error = %e, "Backend failed to open"),
            }
        }
        Err(KeyringError::NoBackend)
    }
}
