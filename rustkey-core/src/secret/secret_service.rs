//! Freedesktop Secret Service client
//!
//! Implements the lookup exchange against `org.freedesktop.secrets` over
//! the session bus: search for items matching the application name and
//! key, unlock the single match if it is locked (driving the service's
//! prompt when one is raised), and read the secret value through the
//! session opened at connection time.
//!
//! This backend is read-only: writing, removal, and enumeration are
//! explicit unsupported operations, and metadata reads fail with a
//! dedicated error because the attribute system requires an authenticated
//! session to read reliably.

use std::collections::HashMap;

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::debug;
use zbus::zvariant::{ObjectPath, OwnedObjectPath, OwnedValue, Type, Value};
use zbus::Connection;

use crate::error::{KeyringError, KeyringResult};

use super::backend::{Item, Keyring, Metadata};

/// Session algorithm transmitting secrets in the clear over the bus
const ALGORITHM_PLAIN: &str = "plain";

/// Attribute carrying the application namespace
const ATTR_SERVER: &str = "server";
/// Attribute carrying the lookup key
const ATTR_USER: &str = "user";

/// Path the service returns in place of a prompt when none is needed
const NO_PROMPT: &str = "/";

/// Wire representation of a secret value
///
/// Fields deserialize positionally; only the value itself is consumed.
#[allow(dead_code)]
#[derive(Debug, Serialize, Deserialize, Type)]
struct SecretValue {
    /// Session the value is bound to
    session: OwnedObjectPath,
    /// Algorithm parameters (empty for plain sessions)
    parameters: Vec<u8>,
    /// The secret bytes
    value: Vec<u8>,
    /// MIME content type of the value
    content_type: String,
}

#[zbus::proxy(
    interface = "org.freedesktop.Secret.Service",
    default_service = "org.freedesktop.secrets",
    default_path = "/org/freedesktop/secrets",
    gen_blocking = false
)]
trait Service {
    fn open_session(
        &self,
        algorithm: &str,
        input: &Value<'_>,
    ) -> zbus::Result<(OwnedValue, OwnedObjectPath)>;

    fn search_items(
        &self,
        attributes: HashMap<&str, &str>,
    ) -> zbus::Result<(Vec<OwnedObjectPath>, Vec<OwnedObjectPath>)>;

    fn unlock(
        &self,
        objects: &[&ObjectPath<'_>],
    ) -> zbus::Result<(Vec<OwnedObjectPath>, OwnedObjectPath)>;
}

#[zbus::proxy(
    interface = "org.freedesktop.Secret.Item",
    default_service = "org.freedesktop.secrets",
    gen_blocking = false
)]
trait SecretItem {
    fn get_secret(&self, session: &ObjectPath<'_>) -> zbus::Result<SecretValue>;
}

#[zbus::proxy(
    interface = "org.freedesktop.Secret.Prompt",
    default_service = "org.freedesktop.secrets",
    gen_blocking = false
)]
trait Prompt {
    fn prompt(&self, window_id: &str) -> zbus::Result<()>;

    #[zbus(signal)]
    fn completed(&self, dismissed: bool, result: Value<'_>) -> zbus::Result<()>;
}

/// Protocol operations the lookup state machine is driven through
///
/// The bus-backed implementation is the production path; tests drive the
/// state machine with a recording double instead of a live service.
#[async_trait]
trait ServiceOps: Send + Sync {
    async fn search(
        &self,
        attributes: HashMap<String, String>,
    ) -> KeyringResult<(Vec<OwnedObjectPath>, Vec<OwnedObjectPath>)>;

    async fn unlock(&self, item: &OwnedObjectPath) -> KeyringResult<()>;

    async fn get_secret(
        &self,
        item: &OwnedObjectPath,
        session: &OwnedObjectPath,
    ) -> KeyringResult<Vec<u8>>;
}

/// Bus-backed protocol operations
struct BusOps {
    connection: Connection,
    service: ServiceProxy<'static>,
}

#[async_trait]
impl ServiceOps for BusOps {
    async fn search(
        &self,
        attributes: HashMap<String, String>,
    ) -> KeyringResult<(Vec<OwnedObjectPath>, Vec<OwnedObjectPath>)> {
        let attributes: HashMap<&str, &str> = attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        self.service
            .search_items(attributes)
            .await
            .map_err(KeyringError::Search)
    }

    async fn unlock(&self, item: &OwnedObjectPath) -> KeyringResult<()> {
        let path: &ObjectPath<'_> = item;
        let (unlocked, prompt_path) = self
            .service
            .unlock(&[path])
            .await
            .map_err(KeyringError::Unlock)?;
        if prompt_path.as_str() == NO_PROMPT {
            if unlocked.is_empty() {
                return Err(KeyringError::Unlock(zbus::Error::Failure(
                    "service reported neither an unlocked item nor a prompt".into(),
                )));
            }
            return Ok(());
        }
        self.drive_prompt(&prompt_path).await
    }

    async fn get_secret(
        &self,
        item: &OwnedObjectPath,
        session: &OwnedObjectPath,
    ) -> KeyringResult<Vec<u8>> {
        let proxy = SecretItemProxy::builder(&self.connection)
            .path(item.as_str())
            .map_err(KeyringError::GetSecret)?
            .build()
            .await
            .map_err(KeyringError::GetSecret)?;
        let secret = proxy
            .get_secret(session)
            .await
            .map_err(KeyringError::GetSecret)?;
        Ok(secret.value)
    }
}

impl BusOps {
    /// Drives the service's unlock prompt to completion
    ///
    /// Blocks until the user answers the prompt; the service owns the
    /// dialog, so there is no timeout on this side.
    async fn drive_prompt(&self, path: &OwnedObjectPath) -> KeyringResult<()> {
        let prompt = PromptProxy::builder(&self.connection)
            .path(path.as_str())
            .map_err(KeyringError::Unlock)?
            .build()
            .await
            .map_err(KeyringError::Unlock)?;

        // Subscribe before prompting so the Completed signal cannot be missed
        let mut completed = prompt
            .receive_completed()
            .await
            .map_err(KeyringError::Unlock)?;
        prompt.prompt("").await.map_err(KeyringError::Unlock)?;

        let Some(signal) = completed.next().await else {
            return Err(KeyringError::Unlock(zbus::Error::Failure(
                "prompt closed without completing".into(),
            )));
        };
        let args = signal.args().map_err(KeyringError::Unlock)?;
        if *args.dismissed() {
            return Err(KeyringError::PromptDismissed);
        }
        Ok(())
    }
}

/// Secret Service backend
///
/// Owns one service session, opened at connection time and required to
/// read any secret value. The session is not shared between instances and
/// is released when the owning bus connection closes. One instance is
/// meant for sequential use; unlock and read are stateful interactions
/// with the server-side session.
pub struct SecretServiceKeyring {
    /// Application name bound to the `server` search attribute
    name: String,
    /// Session handle obtained from OpenSession
    session_path: OwnedObjectPath,
    ops: Box<dyn ServiceOps>,
}

impl SecretServiceKeyring {
    /// Connects to the secret service and opens a plain session
    ///
    /// # Errors
    /// Returns `KeyringError::Connection` if the service proxy cannot be
    /// created and `KeyringError::Session` if OpenSession fails
    pub async fn connect(
        connection: Connection,
        app_name: impl Into<String> + Send,
    ) -> KeyringResult<Self> {
        let service = ServiceProxy::new(&connection)
            .await
            .map_err(KeyringError::Connection)?;
        let (_output, session_path) = service
            .open_session(ALGORITHM_PLAIN, &Value::from(""))
            .await
            .map_err(KeyringError::Session)?;
        Ok(Self {
            name: app_name.into(),
            session_path,
            ops: Box::new(BusOps {
                connection,
                service,
            }),
        })
    }

    #[cfg(test)]
    fn with_ops(name: &str, session_path: OwnedObjectPath, ops: Box<dyn ServiceOps>) -> Self {
        Self {
            name: name.to_string(),
            session_path,
            ops,
        }
    }
}

#[async_trait]
impl Keyring for SecretServiceKeyring {
    async fn get(&self, key: &str) -> KeyringResult<Item> {
        let attributes = HashMap::from([
            (ATTR_SERVER.to_string(), self.name.clone()),
            (ATTR_USER.to_string(), key.to_string()),
        ]);
        let (unlocked, locked) = self.ops.search(attributes).await?;
        let (path, needs_unlock) = single_match(unlocked, locked)?;
        debug!(
            item = %decode_keyring_string(path.as_str()),
            locked = needs_unlock,
            "Matched secret service item"
        );

        if needs_unlock {
            self.ops.unlock(&path).await?;
        }

        let data = self.ops.get_secret(&path, &self.session_path).await?;
        Ok(Item {
            key: key.to_string(),
            data,
        })
    }

    // The secret service keeps a metadata-bearing attribute system, but
    // reading it reliably requires an authenticated session we do not
    // maintain, so the operation fails loudly instead of returning an
    // empty value.
    async fn get_metadata(&self, _key: &str) -> KeyringResult<Metadata> {
        Err(KeyringError::MetadataNeedsCredentials)
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
        "secret_service"
    }

    fn display_name(&self) -> &'static str {
        "Secret Service"
    }
}

/// Reduces a search result to the one item the lookup may use
///
/// Returns the item path and whether it still needs unlocking. Any
/// combined match count other than one is a cardinality error; no
/// tie-break is applied.
fn single_match(
    unlocked: Vec<OwnedObjectPath>,
    locked: Vec<OwnedObjectPath>,
) -> KeyringResult<(OwnedObjectPath, bool)> {
    let count = unlocked.len() + locked.len();
    if count != 1 {
        return Err(KeyringError::Cardinality { count });
    }
    if let Some(path) = unlocked.into_iter().next() {
        return Ok((path, false));
    }
    locked
        .into_iter()
        .next()
        .map(|path| (path, true))
        .ok_or(KeyringError::Cardinality { count: 0 })
}

/// Decodes the `_XX` hex escapes some services use in bus-path-safe
/// collection and item names
///
/// This is a best-effort decode for diagnostic display only: a truncated
/// escape or invalid hex digits return the input unchanged rather than
/// failing, since a garbled label must never abort a lookup.
#[must_use]
pub fn decode_keyring_string(src: &str) -> String {
    let bytes = src.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'_' {
            decoded.push(bytes[i]);
            i += 1;
            continue;
        }
        if i + 3 > bytes.len() {
            return src.to_string();
        }
        let (hi, lo) = (bytes[i + 1], bytes[i + 2]);
        if !hi.is_ascii_hexdigit() || !lo.is_ascii_hexdigit() {
            return src.to_string();
        }
        let Ok(hex) = std::str::from_utf8(&bytes[i + 1..i + 3]) else {
            return src.to_string();
        };
        let Ok(byte) = u8::from_str_radix(hex, 16) else {
            return src.to_string();
        };
        decoded.push(byte);
        i += 3;
    }
    String::from_utf8(decoded).unwrap_or_else(|_| src.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    fn path(p: &str) -> OwnedObjectPath {
        OwnedObjectPath::try_from(p).unwrap()
    }

    /// Recording double standing in for the bus-backed operations
    struct MockOps {
        unlocked: Vec<OwnedObjectPath>,
        locked: Vec<OwnedObjectPath>,
        secret: Vec<u8>,
        unlock_calls: Arc<AtomicUsize>,
        secret_calls: Arc<AtomicUsize>,
    }

    impl MockOps {
        fn new(unlocked: &[&str], locked: &[&str]) -> Self {
            Self {
                unlocked: unlocked.iter().map(|p| path(p)).collect(),
                locked: locked.iter().map(|p| path(p)).collect(),
                secret: b"hunter2".to_vec(),
                unlock_calls: Arc::new(AtomicUsize::new(0)),
                secret_calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl ServiceOps for MockOps {
        async fn search(
            &self,
            attributes: HashMap<String, String>,
        ) -> KeyringResult<(Vec<OwnedObjectPath>, Vec<OwnedObjectPath>)> {
            assert!(attributes.contains_key("server"));
            assert!(attributes.contains_key("user"));
            Ok((self.unlocked.clone(), self.locked.clone()))
        }

        async fn unlock(&self, _item: &OwnedObjectPath) -> KeyringResult<()> {
            self.unlock_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn get_secret(
            &self,
            _item: &OwnedObjectPath,
            session: &OwnedObjectPath,
        ) -> KeyringResult<Vec<u8>> {
            assert_eq!(session.as_str(), "/org/freedesktop/secrets/session/s1");
            self.secret_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.secret.clone())
        }
    }

    fn ring_with(ops: MockOps) -> (SecretServiceKeyring, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let unlock_calls = Arc::clone(&ops.unlock_calls);
        let secret_calls = Arc::clone(&ops.secret_calls);
        let ring = SecretServiceKeyring::with_ops(
            "restic",
            path("/org/freedesktop/secrets/session/s1"),
            Box::new(ops),
        );
        (ring, unlock_calls, secret_calls)
    }

    #[tokio::test]
    async fn test_get_unlocked_item_skips_unlock() {
        let ops = MockOps::new(&["/org/freedesktop/secrets/collection/login/1"], &[]);
        let (ring, unlock_calls, secret_calls) = ring_with(ops);

        let item = ring.get("repo-password").await.unwrap();
        assert_eq!(item.key, "repo-password");
        assert_eq!(item.data, b"hunter2");
        assert_eq!(unlock_calls.load(Ordering::SeqCst), 0);
        assert_eq!(secret_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_locked_item_unlocks_once() {
        let ops = MockOps::new(&[], &["/org/freedesktop/secrets/collection/login/1"]);
        let (ring, unlock_calls, secret_calls) = ring_with(ops);

        let item = ring.get("repo-password").await.unwrap();
        assert_eq!(item.data, b"hunter2");
        assert_eq!(unlock_calls.load(Ordering::SeqCst), 1);
        assert_eq!(secret_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_no_match_is_cardinality_error() {
        let ops = MockOps::new(&[], &[]);
        let (ring, unlock_calls, secret_calls) = ring_with(ops);

        let err = ring.get("missing").await.unwrap_err();
        assert!(matches!(err, KeyringError::Cardinality { count: 0 }));
        assert_eq!(unlock_calls.load(Ordering::SeqCst), 0);
        assert_eq!(secret_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_get_multiple_matches_is_cardinality_error() {
        let ops = MockOps::new(
            &["/org/freedesktop/secrets/collection/login/1"],
            &["/org/freedesktop/secrets/collection/login/2"],
        );
        let (ring, unlock_calls, secret_calls) = ring_with(ops);

        let err = ring.get("ambiguous").await.unwrap_err();
        assert!(matches!(err, KeyringError::Cardinality { count: 2 }));
        assert_eq!(unlock_calls.load(Ordering::SeqCst), 0);
        assert_eq!(secret_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_get_metadata_always_needs_credentials() {
        let ops = MockOps::new(&["/org/freedesktop/secrets/collection/login/1"], &[]);
        let (ring, _, _) = ring_with(ops);

        for key in ["repo-password", "", "anything"] {
            let err = ring.get_metadata(key).await.unwrap_err();
            assert!(matches!(err, KeyringError::MetadataNeedsCredentials));
        }
    }

    #[tokio::test]
    async fn test_write_operations_are_unsupported() {
        let ops = MockOps::new(&[], &[]);
        let (ring, _, _) = ring_with(ops);

        let err = ring
            .set(Item {
                key: "k".to_string(),
                data: b"v".to_vec(),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            KeyringError::Unsupported { operation: "set" }
        ));
        assert!(matches!(
            ring.remove("k").await.unwrap_err(),
            KeyringError::Unsupported {
                operation: "remove"
            }
        ));
        assert!(matches!(
            ring.keys().await.unwrap_err(),
            KeyringError::Unsupported { operation: "keys" }
        ));
    }

    #[test]
    fn test_single_match_prefers_present_set() {
        let (p, needs_unlock) =
            single_match(vec![path("/a/1")], vec![]).unwrap();
        assert_eq!(p.as_str(), "/a/1");
        assert!(!needs_unlock);

        let (p, needs_unlock) =
            single_match(vec![], vec![path("/a/2")]).unwrap();
        assert_eq!(p.as_str(), "/a/2");
        assert!(needs_unlock);
    }

    #[test]
    fn test_decode_keyring_string_escape() {
        assert_eq!(decode_keyring_string("abc_5f"), "abc_");
        assert_eq!(decode_keyring_string("foo_2fbar"), "foo/bar");
        assert_eq!(decode_keyring_string("plain"), "plain");
    }

    #[test]
    fn test_decode_keyring_string_malformed_is_lenient() {
        // Truncated escape
        assert_eq!(decode_keyring_string("abc_"), "abc_");
        assert_eq!(decode_keyring_string("abc_5"), "abc_5");
        // Invalid hex digits
        assert_eq!(decode_keyring_string("abc_zz"), "abc_zz");
        // A sign is not a hex digit even though the parser would take it
        assert_eq!(decode_keyring_string("abc_+5"), "abc_+5");
    }
}
