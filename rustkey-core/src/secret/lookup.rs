//! Password lookup entry point
//!
//! Builds the per-call configuration, resolves the backend candidate
//! order for the current platform, and delegates the lookup to the first
//! usable backend.

use secrecy::SecretString;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::config::Config;
use crate::error::{KeyringError, KeyringResult};

use super::registry::BackendRegistry;
use super::selector::{desktop_hint, select_candidates};

/// Process-wide registry, populated once before first use
static REGISTRY: OnceCell<BackendRegistry> = OnceCell::const_new();

async fn shared_registry() -> &'static BackendRegistry {
    REGISTRY.get_or_init(BackendRegistry::detect).await
}

/// Reads a password written by `app_name` through qtkeychain
///
/// Backend candidates come from the platform policy in
/// [`select_candidates`]; detection of usable backends happens once per
/// process. The call may block for as long as the chosen backend keeps
/// an unlock dialog open.
///
/// # Errors
/// Returns `KeyringError` if no backend is usable, the key does not
/// match exactly one stored item, or the backend exchange fails
#[tracing::instrument(skip_all, fields(app = %app_name))]
pub async fn read_password(
    app_name: &str,
    app_display_name: &str,
    key: &str,
) -> KeyringResult<SecretString> {
    let candidates = select_candidates(std::env::consts::OS, desktop_hint().as_deref());
    let config =
        Config::new(app_name, app_display_name).with_allowed_backends(candidates);
    let registry = shared_registry().await;
    read_password_with(registry, &config, key).await
}

/// Reads a password through an explicitly provided registry
///
/// # Errors
/// Returns `KeyringError` if no allowed backend opens or the lookup
/// fails
pub async fn read_password_with(
    registry: &BackendRegistry,
    config: &Config,
    key: &str,
) -> KeyringResult<SecretString> {
    let keyring = registry.open(config).await?;
    debug!(backend = keyring.backend_id(), "Using secret store backend");
    let item = keyring.get(key).await?;
    let secret = String::from_utf8(item.data).map_err(|_| KeyringError::InvalidSecret)?;
    Ok(SecretString::from(secret))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendType;

    #[tokio::test]
    async fn test_read_password_with_empty_registry_fails() {
        let registry = BackendRegistry::empty();
        let config = Config::new("restic", "Restic")
            .with_allowed_backends(vec![BackendType::SecretService, BackendType::KWallet]);

        let err = read_password_with(&registry, &config, "repo-password")
            .await
            .unwrap_err();
        assert!(matches!(err, KeyringError::NoBackend));
    }
}
