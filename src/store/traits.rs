//! `CredentialStore` trait — read-only access to the persisted bearer token.

use secrecy::SecretString;

/// Host key-value storage holding the credential written by device linking.
///
/// Lookups are synchronous and never mutate the store. The relay has no
/// authority over the credential's lifecycle.
pub trait CredentialStore: Send + Sync {
    /// Raw stored value for `key`, or `None` if it was never stored.
    ///
    /// The value may still carry the store's own quoting; see [`normalize_token`].
    fn get_token(&self, key: &str) -> Option<String>;
}

/// Turn a raw stored value into a usable bearer token.
///
/// Strips surrounding whitespace and wrapping `"` characters. Returns `None`
/// when nothing is left.
pub fn normalize_token(raw: &str) -> Option<SecretString> {
    let token = raw.trim().trim_matches('"').trim();
    if token.is_empty() {
        None
    } else {
        Some(SecretString::from(token.to_string()))
    }
}
