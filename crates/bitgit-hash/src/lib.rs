//! Object identity for the bitgit object store.
//!
//! Provides [`ObjectId`] (a 20-byte SHA-1 digest), hex encoding/decoding,
//! and the streaming [`hasher::Hasher`] that produces identifiers from
//! object envelopes.

mod error;
pub mod hasher;
pub mod hex;
mod oid;

pub use error::HashError;
pub use oid::ObjectId;

/// Length of a raw object identifier in bytes.
pub const OID_LEN: usize = 20;

/// Length of a hex-rendered object identifier.
pub const OID_HEX_LEN: usize = OID_LEN * 2;
