/// Behavior flags stored as a compact bitset.
///
/// Bits are addressed by position. Positions past the width of the set are
/// ignored on write and read back as clear, so a stale flag table can never
/// corrupt neighboring bits.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of addressable flag positions.
pub const FLAG_BITS: u32 = u64::BITS;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Flags {
    bits: u64,
}

impl Flags {
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    /// Rebuild a set from its stored word.
    pub const fn from_bits(bits: u64) -> Self {
        Self { bits }
    }

    pub const fn bits(&self) -> u64 {
        self.bits
    }

    /// Set a flag. Returns true if it was newly set.
    #[inline]
    pub fn set(&mut self, bit: u32) -> bool {
        let Some(mask) = mask(bit) else {
            return false;
        };
        if self.bits & mask != 0 {
            return false;
        }
        self.bits |= mask;
        true
    }

    /// Clear a flag. Returns true if it was previously set.
    #[inline]
    pub fn clear(&mut self, bit: u32) -> bool {
        let Some(mask) = mask(bit) else {
            return false;
        };
        let was_set = self.bits & mask != 0;
        self.bits &= !mask;
        was_set
    }

    /// Flip a flag and return its new state.
    #[inline]
    pub fn toggle(&mut self, bit: u32) -> bool {
        let Some(mask) = mask(bit) else {
            return false;
        };
        self.bits ^= mask;
        self.bits & mask != 0
    }

    #[inline]
    pub fn test(&self, bit: u32) -> bool {
        mask(bit).is_some_and(|mask| self.bits & mask != 0)
    }

    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Positions of all set flags, lowest first.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        (0..FLAG_BITS).filter(|bit| self.test(*bit))
    }

    /// Render set flags as a space separated list of names from `table`.
    /// Bits with no name in the table are skipped.
    pub fn to_names(&self, table: &[Lookup]) -> String {
        self.iter()
            .filter_map(|bit| lookup_name(table, bit))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Parse a space separated list of flag names against `table`.
    pub fn from_names(names: &str, table: &[Lookup]) -> Result<Self, FlagError> {
        let mut flags = Self::empty();
        for name in names.split_whitespace() {
            let bit = lookup_bit(table, name).ok_or_else(|| FlagError::Unknown(name.to_string()))?;
            flags.set(bit);
        }
        Ok(flags)
    }
}

#[inline]
fn mask(bit: u32) -> Option<u64> {
    1u64.checked_shl(bit)
}

/// One entry of a flag name table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookup {
    pub name: &'static str,
    pub bit: u32,
}

/// Resolve a flag name (case-insensitive) to its bit position.
pub fn lookup_bit(table: &[Lookup], name: &str) -> Option<u32> {
    table
        .iter()
        .find(|entry| entry.name.eq_ignore_ascii_case(name))
        .map(|entry| entry.bit)
}

pub fn lookup_name(table: &[Lookup], bit: u32) -> Option<&'static str> {
    table.iter().find(|entry| entry.bit == bit).map(|entry| entry.name)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlagError {
    #[error("unknown flag: {0}")]
    Unknown(String),
}

/// Flags controlling account behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum AccountFlag {
    /// The account's connection should not be sent color codes.
    ColorOff = 0,
}

impl AccountFlag {
    pub const fn bit(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for AccountFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = lookup_name(ACCOUNT_FLAGS, self.bit()).unwrap_or("unknown");
        f.write_str(name)
    }
}

/// Name table for [`AccountFlag`].
pub const ACCOUNT_FLAGS: &[Lookup] = &[Lookup {
    name: "coloroff",
    bit: AccountFlag::ColorOff as u32,
}];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_operations() {
        let mut flags = Flags::empty();
        assert!(flags.is_empty());

        assert!(flags.set(3));
        assert!(!flags.set(3)); // already set
        assert!(flags.test(3));
        assert!(!flags.test(2));

        assert!(flags.clear(3));
        assert!(!flags.clear(3));
        assert!(flags.is_empty());

        assert!(flags.toggle(5));
        assert!(!flags.toggle(5));
    }

    #[test]
    fn test_out_of_range_bits_are_ignored() {
        let mut flags = Flags::empty();
        assert!(!flags.set(FLAG_BITS));
        assert!(!flags.test(FLAG_BITS));
        assert!(flags.is_empty());

        assert!(flags.set(FLAG_BITS - 1));
        assert_eq!(flags.bits(), 1u64 << 63);
        assert_eq!(Flags::from_bits(flags.bits()), flags);
    }

    #[test]
    fn test_names() {
        let mut flags = Flags::empty();
        assert_eq!(flags.to_names(ACCOUNT_FLAGS), "");

        flags.set(AccountFlag::ColorOff.bit());
        assert_eq!(flags.to_names(ACCOUNT_FLAGS), "coloroff");
        assert_eq!(AccountFlag::ColorOff.to_string(), "coloroff");

        let parsed = Flags::from_names("  ColorOff ", ACCOUNT_FLAGS).unwrap();
        assert_eq!(parsed, flags);

        assert_eq!(
            Flags::from_names("coloroff blink", ACCOUNT_FLAGS),
            Err(FlagError::Unknown("blink".into()))
        );
    }
}
