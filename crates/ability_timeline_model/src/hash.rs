// SPDX-License-Identifier: MIT OR Apache-2.0
//! Stable 32-bit name hashing.
//!
//! Ability ids, event names and resource names are addressed at runtime by
//! FNV-1a hashes of their authored strings. The empty string hashes to `0`,
//! which is reserved for "none".

use serde::{Deserialize, Serialize};
use std::fmt;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Hash a name with 32-bit FNV-1a. Returns `0` for an empty name.
pub fn hash_name(name: &str) -> u32 {
    if name.is_empty() {
        return 0;
    }
    name.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Identifier of an ability definition (hash of its string id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct AbilityId(pub u32);

impl AbilityId {
    /// The "no ability" id
    pub const NONE: Self = Self(0);

    /// Hash a string id
    pub fn from_name(name: &str) -> Self {
        Self(hash_name(name))
    }

    /// Whether this is the "no ability" id
    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl From<&str> for AbilityId {
    fn from(name: &str) -> Self {
        Self::from_name(name)
    }
}

impl fmt::Display for AbilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08x}", self.0)
    }
}

/// An authored name together with its precomputed hash.
///
/// Serializes as the bare string; the hash is recomputed on load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct NameRef {
    name: String,
    hash: u32,
}

impl NameRef {
    /// Create from a name
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let hash = hash_name(&name);
        Self { name, hash }
    }

    /// The authored name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name hash (`0` when empty)
    pub fn hash(&self) -> u32 {
        self.hash
    }

    /// Whether no name was authored
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

impl From<String> for NameRef {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<&str> for NameRef {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<NameRef> for String {
    fn from(name: NameRef) -> Self {
        name.name
    }
}

impl fmt::Display for NameRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
