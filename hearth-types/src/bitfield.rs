//! Typed flag bitfields.
//!
//! A [`BitField`] is an integer interpreted as a set of named boolean flags.
//! The name to bit mapping lives on a zero-sized marker type implementing
//! [`FlagSet`], so an `InviteFlags` value can never be confused with a
//! `UserFlags` value even though both are a `u64` underneath.
//!
//! Flag inputs are accepted in any [`Resolvable`] form: a flag name, a raw bit
//! value, a list of either, or nothing at all. Names that are not part of the
//! mapping fail with [`Error::InvalidFlag`] instead of being silently dropped.
//!
//! `BitField` has value semantics: it is `Copy`, and [`BitField::add`] /
//! [`BitField::remove`] return a new value rather than mutating in place.

use crate::{Error, Result};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::{BitAnd, BitOr};

/// Static name to bit mapping for one kind of bitfield.
pub trait FlagSet: 'static {
    /// Human readable name of the flag set, used in errors and `Debug`.
    const KIND: &'static str;

    /// Every known flag with its bit value. Each value is a distinct power of two.
    const FLAGS: &'static [(&'static str, u64)];

    /// Looks up the bit value for a flag name.
    fn value_of(name: &str) -> Option<u64> {
        Self::FLAGS
            .iter()
            .find(|(flag, _)| *flag == name)
            .map(|(_, bit)| *bit)
    }

    /// Looks up the flag name for a single bit value.
    fn name_of(bit: u64) -> Option<&'static str> {
        Self::FLAGS
            .iter()
            .find(|(_, value)| *value == bit)
            .map(|(flag, _)| *flag)
    }
}

/// Any input accepted by flag operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolvable<'a> {
    /// No flags.
    Empty,
    /// Raw bit value.
    Bits(u64),
    /// Flag name, or a decimal string holding a raw bit value.
    Name(&'a str),
    /// Union of several resolvables.
    Many(Vec<Resolvable<'a>>),
}

impl Resolvable<'_> {
    /// Resolves to a bit value against the mapping of `F`.
    ///
    /// Pure: the same input always yields the same bits or the same error.
    pub fn resolve<F: FlagSet>(&self) -> Result<u64> {
        match self {
            Self::Empty => Ok(0),
            Self::Bits(bits) => Ok(*bits),
            Self::Name(name) => F::value_of(name)
                .or_else(|| name.parse::<u64>().ok())
                .ok_or_else(|| Error::InvalidFlag {
                    kind: F::KIND,
                    flag: (*name).to_string(),
                }),
            Self::Many(items) => items
                .iter()
                .try_fold(0, |acc, item| Ok(acc | item.resolve::<F>()?)),
        }
    }
}

impl From<()> for Resolvable<'_> {
    fn from(_: ()) -> Self {
        Self::Empty
    }
}

impl From<u64> for Resolvable<'_> {
    fn from(bits: u64) -> Self {
        Self::Bits(bits)
    }
}

impl<'a> From<&'a str> for Resolvable<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}

impl<'a> From<&'a String> for Resolvable<'a> {
    fn from(name: &'a String) -> Self {
        Self::Name(name.as_str())
    }
}

impl<F: FlagSet> From<BitField<F>> for Resolvable<'_> {
    fn from(field: BitField<F>) -> Self {
        Self::Bits(field.bits)
    }
}

impl<'a, T: Into<Resolvable<'a>>> From<Vec<T>> for Resolvable<'a> {
    fn from(items: Vec<T>) -> Self {
        Self::Many(items.into_iter().map(Into::into).collect())
    }
}

impl<'a, T: Into<Resolvable<'a>>, const N: usize> From<[T; N]> for Resolvable<'a> {
    fn from(items: [T; N]) -> Self {
        Self::Many(items.into_iter().map(Into::into).collect())
    }
}

impl<'a, T: Into<Resolvable<'a>>> From<Option<T>> for Resolvable<'a> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Empty, Into::into)
    }
}

/// A set of named flags of kind `F` packed into a `u64`.
pub struct BitField<F: FlagSet> {
    bits: u64,
    kind: PhantomData<fn() -> F>,
}

impl<F: FlagSet> BitField<F> {
    /// Wraps a raw bit value.
    #[must_use]
    pub const fn new(bits: u64) -> Self {
        Self {
            bits,
            kind: PhantomData,
        }
    }

    /// A bitfield with no flags set.
    #[must_use]
    pub const fn empty() -> Self {
        Self::new(0)
    }

    /// A bitfield with every known flag set.
    #[must_use]
    pub const fn all() -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < F::FLAGS.len() {
            bits |= F::FLAGS[i].1;
            i += 1;
        }
        Self::new(bits)
    }

    /// Returns the packed value.
    #[must_use]
    pub const fn bits(&self) -> u64 {
        self.bits
    }

    /// Returns true when no bit is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Resolves any flag input to its bit value.
    pub fn resolve<'a>(flags: impl Into<Resolvable<'a>>) -> Result<u64> {
        flags.into().resolve::<F>()
    }

    /// Builds a bitfield from any flag input.
    pub fn from_flags<'a>(flags: impl Into<Resolvable<'a>>) -> Result<Self> {
        Self::resolve(flags).map(Self::new)
    }

    /// Builds a bitfield from a sequence of flag names.
    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names.into_iter().try_fold(Self::empty(), |field, name| {
            Ok(Self::new(field.bits | Self::resolve(name.as_ref())?))
        })
    }

    /// True iff every resolved bit is set.
    pub fn has<'a>(&self, flags: impl Into<Resolvable<'a>>) -> Result<bool> {
        let bits = Self::resolve(flags)?;
        Ok(self.bits & bits == bits)
    }

    /// True iff at least one resolved bit is set.
    pub fn any<'a>(&self, flags: impl Into<Resolvable<'a>>) -> Result<bool> {
        let bits = Self::resolve(flags)?;
        Ok(self.bits & bits != 0)
    }

    /// Names of the resolved flags that are not set, in ascending bit order.
    pub fn missing<'a>(&self, flags: impl Into<Resolvable<'a>>) -> Result<Vec<&'static str>> {
        let bits = Self::resolve(flags)?;
        Ok(Self::new(bits & !self.bits).to_array().collect())
    }

    /// True iff the resolved value equals this bitfield exactly.
    pub fn equals<'a>(&self, flags: impl Into<Resolvable<'a>>) -> Result<bool> {
        Ok(self.bits == Self::resolve(flags)?)
    }

    /// Returns a copy with the resolved bits set.
    pub fn add<'a>(self, flags: impl Into<Resolvable<'a>>) -> Result<Self> {
        Ok(Self::new(self.bits | Self::resolve(flags)?))
    }

    /// Returns a copy with the resolved bits cleared.
    pub fn remove<'a>(self, flags: impl Into<Resolvable<'a>>) -> Result<Self> {
        Ok(Self::new(self.bits & !Self::resolve(flags)?))
    }

    /// Infallible typed check against another bitfield of the same kind.
    #[must_use]
    pub const fn contains(&self, other: Self) -> bool {
        self.bits & other.bits == other.bits
    }

    /// Names of the set flags in ascending bit order.
    ///
    /// Recomputed on every call; bits without a name are skipped.
    pub fn to_array(&self) -> impl Iterator<Item = &'static str> + use<F> {
        let bits = self.bits;
        (0..u64::BITS)
            .map(|shift| 1u64 << shift)
            .filter(move |bit| bits & bit != 0)
            .filter_map(F::name_of)
    }

    /// Every known flag name mapped to whether it is set.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<&'static str, bool> {
        F::FLAGS
            .iter()
            .map(|(name, bit)| (*name, self.bits & bit == *bit))
            .collect()
    }
}

impl<F: FlagSet> Clone for BitField<F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<F: FlagSet> Copy for BitField<F> {}

impl<F: FlagSet> PartialEq for BitField<F> {
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
    }
}

impl<F: FlagSet> Eq for BitField<F> {}

impl<F: FlagSet> Hash for BitField<F> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits.hash(state);
    }
}

impl<F: FlagSet> Default for BitField<F> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<F: FlagSet> fmt::Debug for BitField<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(F::KIND)
            .field("bits", &self.bits)
            .field("flags", &self.to_array().collect::<Vec<_>>())
            .finish()
    }
}

impl<F: FlagSet> From<BitField<F>> for u64 {
    fn from(field: BitField<F>) -> Self {
        field.bits
    }
}

impl<F: FlagSet> BitOr for BitField<F> {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self::new(self.bits | rhs.bits)
    }
}

impl<F: FlagSet> BitAnd for BitField<F> {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self::new(self.bits & rhs.bits)
    }
}

impl<F: FlagSet> Serialize for BitField<F> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.bits)
    }
}

impl<'de, F: FlagSet> Deserialize<'de> for BitField<F> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct BitsVisitor<F>(PhantomData<fn() -> F>);

        impl<F: FlagSet> Visitor<'_> for BitsVisitor<F> {
            type Value = BitField<F>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} as an unsigned integer or decimal string", F::KIND)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Self::Value, E> {
                Ok(BitField::new(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Self::Value, E> {
                u64::try_from(v)
                    .map(BitField::new)
                    .map_err(|_| E::custom(format!("negative {} value: {v}", F::KIND)))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
                v.parse::<u64>().map(BitField::new).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(BitsVisitor(PhantomData))
    }
}
