//! Core type definitions for hearth.
//!
//! This crate defines the small, dependency-light value types shared by every
//! other hearth crate:
//! - [`Snowflake`] identifiers for users, channels, guilds and calls
//! - [`BitField`], a typed set of named boolean flags packed into an integer
//! - Concrete flag sets ([`InviteFlags`], [`UserFlags`], [`ChannelFlags`])
//!
//! Capability checks anywhere in hearth go through [`BitField`], never through
//! raw integer comparison.

mod bitfield;
mod flags;
mod ids;

pub use bitfield::{BitField, FlagSet, Resolvable};
pub use flags::{ChannelFlag, ChannelFlags, InviteFlag, InviteFlags, UserFlag, UserFlags};
pub use ids::Snowflake;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A flag name was not found in the flag set's mapping.
    #[error("invalid {kind} flag: {flag}")]
    InvalidFlag { kind: &'static str, flag: String },

    #[error("invalid snowflake: {0}")]
    InvalidSnowflake(String),
}
