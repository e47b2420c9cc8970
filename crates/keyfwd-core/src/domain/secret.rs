//! The shared secret both ends of a relay are configured with.

use std::fmt;

use serde::Deserialize;

/// Opaque byte string shared out-of-band between one client and its server.
///
/// Never transmitted and never logged: `Debug` only reveals the length.
/// An empty secret still derives a key but provides no confidentiality; the
/// relays warn about it at startup.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub struct SharedSecret(Vec<u8>);

impl SharedSecret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for SharedSecret {
    fn from(value: String) -> Self {
        Self(value.into_bytes())
    }
}

impl From<&str> for SharedSecret {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedSecret(<{} bytes redacted>)", self.0.len())
    }
}
