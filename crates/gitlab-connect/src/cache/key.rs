//! Cache key derivation

use std::fmt;

use sha2::{Digest, Sha256};

use crate::descriptor::RepositoryDescriptor;

/// Key identifying one cached connection
///
/// Derived from the repository URL, the username and a SHA-256 digest of the
/// password. Changing any of the three yields a different key; the password
/// itself never appears in the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    url: String,
    username: String,
    password_hash: String,
}

impl CacheKey {
    #[must_use]
    pub fn new(url: &str, username: &str, password: &str) -> Self {
        Self {
            url: url.to_string(),
            username: username.to_string(),
            password_hash: hash_password(password),
        }
    }

    #[must_use]
    pub fn for_descriptor(descriptor: &RepositoryDescriptor) -> Self {
        Self::new(
            descriptor.url(),
            descriptor.username(),
            descriptor.password(),
        )
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Full key string, `url?username=..&password_hash=..`
    #[must_use]
    pub fn to_key_string(&self) -> String {
        format!(
            "{}?username={}&password_hash={}",
            self.url, self.username, self.password_hash
        )
    }
}

/// Omits the password hash so keys can go into logs
impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}?username={}", self.url, self.username)
    }
}

fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}
