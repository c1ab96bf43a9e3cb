//! Identifier types.

use serde::{Deserialize, Serialize};

/// Seed of a playthrough. All world determinism is anchored to it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldSeed(u32);

impl WorldSeed {
    /// Creates a world seed from a raw value.
    #[must_use]
    pub const fn new(seed: u32) -> Self {
        Self(seed)
    }

    /// Returns the raw seed value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for WorldSeed {
    fn from(seed: u32) -> Self {
        Self(seed)
    }
}

impl std::fmt::Display for WorldSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
