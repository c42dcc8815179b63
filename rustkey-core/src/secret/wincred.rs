//! Windows Credential Manager backend
//!
//! Thin call-through to `CredReadW`. qtkeychain stores generic
//! credentials under the bare key, so the target name is the key passed
//! through unprefixed.
#![allow(unsafe_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use windows_sys::Win32::Security::Credentials::{
    CredFree, CredReadW, CREDENTIALW, CRED_TYPE_GENERIC,
};

use crate::error::{KeyringError, KeyringResult};

use super::backend::{Item, Keyring, Metadata};

/// Seconds between the Windows FILETIME epoch (1601) and the Unix epoch
const FILETIME_UNIX_OFFSET_SECS: i64 = 11_644_473_600;
/// FILETIME ticks per second (100ns resolution)
const FILETIME_TICKS_PER_SEC: i64 = 10_000_000;

/// Windows Credential Manager backend handle
pub struct WinCredKeyring;

impl WinCredKeyring {
    /// Creates a backend reading generic credentials
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for WinCredKeyring {
    fn default() -> Self {
        Self::new()
    }
}

/// One credential read out of the manager
struct ReadCredential {
    data: Vec<u8>,
    last_written: Option<DateTime<Utc>>,
}

/// Reads a generic credential, copying everything out before CredFree
fn read_credential(target: &str) -> KeyringResult<ReadCredential> {
    let wide: Vec<u16> = target.encode_utf16().chain(std::iter::once(0)).collect();
    let mut credential: *mut CREDENTIALW = std::ptr::null_mut();

    // SAFETY: `wide` is NUL-terminated and outlives the call; the out
    // pointer is only dereferenced after a successful return and freed
    // with CredFree exactly once.
    unsafe {
        if CredReadW(wide.as_ptr(), CRED_TYPE_GENERIC, 0, &mut credential) == 0 {
            return Err(KeyringError::Platform(format!(
                "CredRead failed for '{target}': {}",
                std::io::Error::last_os_error()
            )));
        }
        let cred = &*credential;
        let data = if cred.CredentialBlob.is_null() || cred.CredentialBlobSize == 0 {
            Vec::new()
        } else {
            std::slice::from_raw_parts(cred.CredentialBlob, cred.CredentialBlobSize as usize)
                .to_vec()
        };
        let ticks = (i64::from(cred.LastWritten.dwHighDateTime) << 32)
            | i64::from(cred.LastWritten.dwLowDateTime);
        CredFree(credential.cast());

        let secs = ticks / FILETIME_TICKS_PER_SEC - FILETIME_UNIX_OFFSET_SECS;
        let nanos = u32::try_from((ticks % FILETIME_TICKS_PER_SEC) * 100).unwrap_or(0);
        Ok(ReadCredential {
            data,
            last_written: DateTime::from_timestamp(secs, nanos),
        })
    }
}

#[async_trait]
impl Keyring for WinCredKeyring {
    async fn get(&self, key: &str) -> KeyringResult<Item> {
        let target = key.to_string();
        let credential =
            tokio::task::spawn_blocking(move || read_credential(&target))
                .await
                .map_err(|e| KeyringError::Platform(format!("credential task failed: {e}")))??;
        Ok(Item {
            key: key.to_string(),
            data: credential.data,
        })
    }

    async fn get_metadata(&self, key: &str) -> KeyringResult<Metadata> {
        let target = key.to_string();
        let credential =
            tokio::task::spawn_blocking(move || read_credential(&target))
                .await
                .map_err(|e| KeyringError::Platform(format!("credential task failed: {e}")))??;
        Ok(Metadata {
            modification_time: credential.last_written,
            label: None,
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
        "wincred"
    }

    fn display_name(&self) -> &'static str {
        "Windows Credential Manager"
    }
}
