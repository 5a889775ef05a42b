//! Integrity primitives for Attesta certificates.
//!
//! A certificate fingerprint is the SHA-256 digest of the RFC 8785 (JCS)
//! canonical JSON encoding of the certificate's identifying fields. Because
//! the encoding is structural rather than a delimited string join, no choice
//! of field values can make two distinct certificates canonicalize to the
//! same bytes.
//!
//! This crate is pure: no I/O, no clocks, no database. Everything here is
//! deterministic and safe to call from servers, CLIs, and tests alike.

pub mod fingerprint;
pub mod hash;
pub mod jcs;
pub mod types;

pub use fingerprint::{fingerprint, matches_fingerprint};
pub use hash::sha256_hex;
pub use jcs::canonical_bytes;
pub use types::FingerprintInput;
