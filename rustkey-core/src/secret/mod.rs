//! Secret store access for `RustKey`
//!
//! This module locates and reads stored passwords through multiple
//! backends:
//! - freedesktop Secret Service over the session bus (GNOME Keyring and
//!   compatible daemons)
//! - KDE Wallet daemon (fallback on Unix-like systems, preferred on KDE)
//! - Windows Credential Manager and macOS Keychain as native call-throughs
//!
//! [`BackendRegistry`] discovers which backends are usable on this host,
//! and [`read_password`] resolves a key through the first usable backend
//! in platform-preference order.

mod backend;
mod kwallet;
mod lookup;
mod registry;
mod secret_service;
mod selector;

#[cfg(target_os = "macos")]
mod keychain;
#[cfg(target_os = "windows")]
mod wincred;

pub use backend::{Item, Keyring, Metadata};
pub use kwallet::KWalletKeyring;
pub use lookup::{read_password, read_password_with};
pub use registry::BackendRegistry;
pub use secret_service::{decode_keyring_string, SecretServiceKeyring};
pub use selector::{desktop_hint, select_candidates};

#[cfg(target_os = "macos")]
pub use keychain::KeychainKeyring;
#[cfg(target_os = "windows")]
pub use wincred::WinCredKeyring;
