//! `RustKey` Core Library
//!
//! This crate reads passwords previously stored by qtkeychain-compatible
//! applications from whichever OS-native secret store is usable on the
//! running host: the freedesktop Secret Service and KDE Wallet on Unix-like
//! systems, the Credential Manager on Windows, and the Keychain on macOS.

pub mod config;
pub mod error;
pub mod secret;

pub use config::{BackendType, Config};
pub use error::{KeyringError, KeyringResult};
pub use secret::{
    read_password, read_password_with, BackendRegistry, Item, Keyring, Metadata,
};
