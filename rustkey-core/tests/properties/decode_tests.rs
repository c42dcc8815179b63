//! Property-based tests for the keyring name unescaping helper

use proptest::prelude::*;
use rustkey_core::secret::decode_keyring_string;

/// Encodes a byte string the way bus-path-safe item names are built:
/// identifier characters pass through, everything else becomes `_XX`
fn encode_keyring_string(src: &[u8]) -> String {
    let mut out = String::new();
    for &b in src {
        if b.is_ascii_alphanumeric() {
            out.push(char::from(b));
        } else {
            out.push_str(&format!("_{b:02x}"));
        }
    }
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Decoding an encoded ASCII string restores the original
    #[test]
    fn prop_decode_restores_encoded_input(src in "[ -~]{0,40}") {
        let encoded = encode_keyring_string(src.as_bytes());
        prop_assert_eq!(decode_keyring_string(&encoded), src);
    }

    /// Strings without underscores pass through untouched
    #[test]
    fn prop_no_escape_is_identity(src in "[a-zA-Z0-9/.:-]{0,40}") {
        prop_assert_eq!(decode_keyring_string(&src), src);
    }

    /// Decoding never panics and always yields some string, however
    /// malformed the input
    #[test]
    fn prop_decode_total(src in "\\PC{0,40}") {
        let _ = decode_keyring_string(&src);
    }
}

#[test]
fn test_decode_underscore_escape_and_truncation() {
    assert_eq!(decode_keyring_string("abc_5f"), "abc_");
    assert_eq!(decode_keyring_string("abc_"), "abc_");
}
