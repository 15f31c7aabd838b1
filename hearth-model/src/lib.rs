//! Cached entity model for hearth.
//!
//! Keeps a local mirror of remote state consistent with a stream of partial
//! update documents:
//! - [`PatchDocument`]: an opaque key/value update payload
//! - [`Patchable`]: the contract every synchronized entity implements
//! - [`Cache`]: an ID-keyed store applying patches atomically
//! - [`Lookup`]: the read-only capability entities use to resolve references
//! - Entities: [`User`], [`Channel`], [`Invite`], [`CallState`]
//!
//! Cross-cache references are stored as IDs and resolved through a
//! [`Lookup`] at read time, never materialized at patch time.

mod api;
mod cache;
mod call;
mod channel;
mod error;
mod invite;
mod patch;
mod user;

pub use api::CallApi;
pub use cache::{Cache, Lookup, Upsert};
pub use call::{Call, CallState};
pub use channel::{Channel, ChannelKind};
pub use error::{ModelError, ModelResult};
pub use invite::Invite;
pub use patch::{PatchDocument, Patchable};
pub use user::User;
