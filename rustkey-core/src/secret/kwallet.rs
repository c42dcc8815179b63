//! KDE Wallet backend
//!
//! Thin call-through to the kwalletd daemon on the session bus, reading
//! entries the way qtkeychain writes them: the lookup folder is the
//! application name and the wallet sees the configured display name as
//! the requesting application id.

use async_trait::async_trait;
use tracing::debug;
use zbus::Connection;

use crate::error::{KeyringError, KeyringResult};

use super::backend::{Item, Keyring, Metadata};

#[zbus::proxy(
    interface = "org.kde.KWallet",
    default_service = "org.kde.kwalletd5",
    default_path = "/modules/kwalletd5",
    gen_blocking = false
)]
trait KWallet {
    #[zbus(name = "networkWallet")]
    fn network_wallet(&self) -> zbus::Result<String>;

    #[zbus(name = "open")]
    fn open(&self, wallet: &str, w_id: i64, appid: &str) -> zbus::Result<i32>;

    #[zbus(name = "hasEntry")]
    fn has_entry(&self, handle: i32, folder: &str, key: &str, appid: &str) -> zbus::Result<bool>;

    #[zbus(name = "readPassword")]
    fn read_password(
        &self,
        handle: i32,
        folder: &str,
        key: &str,
        appid: &str,
    ) -> zbus::Result<String>;
}

/// KDE Wallet backend handle
///
/// Holds the wallet handle returned by the daemon's open call. Opening
/// may raise the daemon's own unlock dialog; this side imposes no
/// timeout on it.
pub struct KWalletKeyring {
    folder: String,
    appid: String,
    handle: i32,
    wallet: KWalletProxy<'static>,
}

impl KWalletKeyring {
    /// Connects to kwalletd and opens the network wallet
    ///
    /// # Errors
    /// Returns `KeyringError::Connection` if the daemon is unreachable
    /// and `KeyringError::Platform` if it refuses to open the wallet
    pub async fn connect(
        connection: Connection,
        app_name: impl Into<String> + Send,
        display_name: impl Into<String> + Send,
    ) -> KeyringResult<Self> {
        let appid = display_name.into();
        let wallet = KWalletProxy::new(&connection)
            .await
            .map_err(KeyringError::Connection)?;
        let name = wallet
            .network_wallet()
            .await
            .map_err(KeyringError::Connection)?;
        let handle = wallet
            .open(&name, 0, &appid)
            .await
            .map_err(KeyringError::Connection)?;
        if handle < 0 {
            return Err(KeyringError::Platform(format!(
                "kwallet refused to open wallet '{name}'"
            )));
        }
        debug!(wallet = %name, "Opened KDE wallet");
        Ok(Self {
            folder: app_name.into(),
            appid,
            handle,
            wallet,
        })
    }
}

#[async_trait]
impl Keyring for KWalletKeyring {
    async fn get(&self, key: &str) -> KeyringResult<Item> {
        let present = self
            .wallet
            .has_entry(self.handle, &self.folder, key, &self.appid)
            .await
            .map_err(|e| KeyringError::Platform(format!("kwallet entry check failed: {e}")))?;
        if !present {
            return Err(KeyringError::Platform(format!(
                "no kwallet entry for key '{key}'"
            )));
        }

        let password = self
            .wallet
            .read_password(self.handle, &self.folder, key, &self.appid)
            .await
            .map_err(|e| KeyringError::Platform(format!("kwallet read failed: {e}")))?;
        Ok(Item {
            key: key.to_string(),
            data: password.into_bytes(),
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
        "kwallet"
    }

    fn display_name(&self) -> &'static str {
        "KDE Wallet"
    }
}
