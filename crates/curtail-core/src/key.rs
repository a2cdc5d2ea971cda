use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// The lookup key of a shortened URL.
///
/// Keys are opaque identifiers: lookups and deletions match them byte for
/// byte, and a key that was never issued simply resolves to nothing, so no
/// validation is applied here. Fixed length is a policy of the generator
/// that produced the key, not of this type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShortKey(String);

impl ShortKey {
    /// Wraps a string value as a short key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Builds the full shortened URL for this key under the given base host.
    pub fn to_url(&self, base: &str) -> String {
        format!("{}/{}", base.trim_end_matches('/'), self.0)
    }
}

impl Display for ShortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
