//! Backend candidate selection policy
//!
//! Computes the ordered list of backends a lookup should try for a given
//! platform and desktop session. This is a pure priority decision: no
//! probing happens here, and candidates that turn out to be unavailable
//! are skipped later during registry iteration.

use crate::config::BackendType;

/// `XDG_CURRENT_DESKTOP` value that promotes the wallet backend
const WALLET_DESKTOP: &str = "KDE";

/// Computes the ordered backend candidates for a platform
///
/// `os` takes the values of [`std::env::consts::OS`]. Windows and macOS
/// each map to their single native store; every other platform is treated
/// as Unix-like and tries the Secret Service before KWallet, unless the
/// desktop hint names KDE, in which case the two are swapped. An empty or
/// unrecognized hint leaves the default order unchanged.
#[must_use]
pub fn select_candidates(os: &str, desktop_hint: Option<&str>) -> Vec<BackendType> {
    match os {
        "windows" => vec![BackendType::WinCred],
        "macos" => vec![BackendType::Keychain],
        _ => {
            let mut candidates = vec![BackendType::SecretService, BackendType::KWallet];
            if desktop_hint == Some(WALLET_DESKTOP) {
                candidates.swap(0, 1);
            }
            candidates
        }
    }
}

/// Reads the desktop session hint from the environment
#[must_use]
pub fn desktop_hint() -> Option<String> {
    std::env::var("XDG_CURRENT_DESKTOP").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_uses_credential_manager_only() {
        assert_eq!(
            select_candidates("windows", None),
            vec![BackendType::WinCred]
        );
    }

    #[test]
    fn test_macos_uses_keychain_only() {
        assert_eq!(
            select_candidates("macos", Some("KDE")),
            vec![BackendType::Keychain]
        );
    }

    #[test]
    fn test_unix_default_order() {
        assert_eq!(
            select_candidates("linux", None),
            vec![BackendType::SecretService, BackendType::KWallet]
        );
    }

    #[test]
    fn test_kde_hint_promotes_wallet() {
        assert_eq!(
            select_candidates("linux", Some("KDE")),
            vec![BackendType::KWallet, BackendType::SecretService]
        );
    }

    #[test]
    fn test_unrecognized_hint_keeps_default_order() {
        assert_eq!(
            select_candidates("linux", Some("GNOME")),
            vec![BackendType::SecretService, BackendType::KWallet]
        );
        assert_eq!(
            select_candidates("linux", Some("")),
            vec![BackendType::SecretService, BackendType::KWallet]
        );
        // The hint match is exact; lowercase does not count
        assert_eq!(
            select_candidates("linux", Some("kde")),
            vec![BackendType::SecretService, BackendType::KWallet]
        );
    }

    #[test]
    fn test_unknown_platform_treated_as_unix() {
        assert_eq!(
            select_candidates("freebsd", None),
            vec![BackendType::SecretService, BackendType::KWallet]
        );
    }
}
