//! Peer identity.
//!
//! Peer ids are generated locally and are not globally coordinated. They only
//! have to distinguish self-authored messages from foreign ones on a shared
//! channel, so probabilistic uniqueness is enough.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for one connection on a channel.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
    /// Generate a random peer id.
    pub fn random() -> Self {
        use rand::Rng;
        let mut entropy = [0u8; 6];
        rand::thread_rng().fill(&mut entropy[..]);
        Self(format!("peer-{}", hex::encode(entropy)))
    }

    /// Create a peer id from an explicit name.
    ///
    /// Intended for deterministic tests; production connections should use
    /// [`PeerId::random`].
    pub fn named(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerId({})", self.0)
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PeerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for PeerId {
    fn from(name: String) -> Self {
        Self(name)
    }
}
