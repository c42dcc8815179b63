//! Property-based tests for backend candidate selection

use proptest::prelude::*;
use rustkey_core::secret::select_candidates;
use rustkey_core::BackendType;

// ========== Generators ==========

/// Strategy for generating platform strings, weighted towards real ones
fn arb_os() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("windows".to_string()),
        Just("macos".to_string()),
        Just("linux".to_string()),
        Just("freebsd".to_string()),
        "[a-z]{2,10}".prop_map(String::from),
    ]
}

/// Strategy for generating desktop hints
fn arb_hint() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("KDE".to_string())),
        Just(Some("GNOME".to_string())),
        Just(Some(String::new())),
        "[A-Za-z:]{1,20}".prop_map(Some),
    ]
}

// ========== Property Tests ==========

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every platform yields a non-empty candidate list
    #[test]
    fn prop_candidates_never_empty(os in arb_os(), hint in arb_hint()) {
        let candidates = select_candidates(&os, hint.as_deref());
        prop_assert!(!candidates.is_empty());
    }

    /// Candidates are valid for the platform they were selected for
    #[test]
    fn prop_candidates_valid_for_platform(os in arb_os(), hint in arb_hint()) {
        let candidates = select_candidates(&os, hint.as_deref());
        match os.as_str() {
            "windows" => prop_assert_eq!(candidates, vec![BackendType::WinCred]),
            "macos" => prop_assert_eq!(candidates, vec![BackendType::Keychain]),
            _ => {
                prop_assert_eq!(candidates.len(), 2);
                prop_assert!(candidates.contains(&BackendType::SecretService));
                prop_assert!(candidates.contains(&BackendType::KWallet));
            }
        }
    }

    /// The KDE hint, and only the KDE hint, promotes the wallet backend
    #[test]
    fn prop_wallet_order_follows_kde_hint(hint in arb_hint()) {
        let candidates = select_candidates("linux", hint.as_deref());
        if hint.as_deref() == Some("KDE") {
            prop_assert_eq!(
                candidates,
                vec![BackendType::KWallet, BackendType::SecretService]
            );
        } else {
            prop_assert_eq!(
                candidates,
                vec![BackendType::SecretService, BackendType::KWallet]
            );
        }
    }

    /// Selection never produces duplicate candidates
    #[test]
    fn prop_candidates_unique(os in arb_os(), hint in arb_hint()) {
        let candidates = select_candidates(&os, hint.as_deref());
        let mut seen = candidates.clone();
        seen.sort_by_key(|b| b.id());
        seen.dedup();
        prop_assert_eq!(seen.len(), candidates.len());
    }
}
