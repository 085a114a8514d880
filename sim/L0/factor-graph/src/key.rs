//! Variable keys.
//!
//! A [`Key`] is an opaque 64-bit identifier. [`Symbol`] is the generic
//! packing used by this crate: an 8-bit character tag in the top byte and a
//! 56-bit index below it.

use std::collections::BTreeSet;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of bits used by the tag character.
pub const TAG_BITS: u32 = 8;

/// Number of bits below the tag.
pub const INDEX_BITS: u32 = 64 - TAG_BITS;

const INDEX_MASK: u64 = (1 << INDEX_BITS) - 1;

/// Unique identifier of a variable in a factor graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Key(pub u64);

impl Key {
    /// Create a key from its raw value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw 64-bit value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Tag character stored in the top byte.
    #[must_use]
    pub const fn tag(self) -> u8 {
        (self.0 >> INDEX_BITS) as u8
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = self.tag();
        if tag.is_ascii_alphabetic() {
            write!(f, "{}{}", tag as char, self.0 & INDEX_MASK)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl From<u64> for Key {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Ordered set of keys.
pub type KeySet = BTreeSet<Key>;

/// Character-tagged key, e.g. `x3` or `M0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Symbol {
    /// Tag character.
    pub chr: u8,
    /// Index below the tag; truncated to 56 bits when packed.
    pub index: u64,
}

impl Symbol {
    /// Create a symbol.
    #[must_use]
    pub const fn new(chr: u8, index: u64) -> Self {
        Self { chr, index }
    }

    /// Pack into a key.
    #[must_use]
    pub const fn key(self) -> Key {
        Key(((self.chr as u64) << INDEX_BITS) | (self.index & INDEX_MASK))
    }

    /// Unpack a key.
    #[must_use]
    pub const fn from_key(key: Key) -> Self {
        Self {
            chr: key.tag(),
            index: key.0 & INDEX_MASK,
        }
    }
}

impl From<Symbol> for Key {
    fn from(symbol: Symbol) -> Self {
        symbol.key()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.chr as char, self.index)
    }
}
