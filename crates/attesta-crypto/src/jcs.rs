// RFC 8785 (JCS) canonical JSON encoding

use anyhow::Result;
use serde::Serialize;

/// Serializes `value` to RFC 8785 canonical JSON and returns the UTF-8 bytes.
///
/// Canonical JSON sorts object keys lexicographically, emits no whitespace,
/// and encodes numbers deterministically. Two values canonicalize to the same
/// bytes exactly when they are structurally equal, which is what makes the
/// encoding safe to hash: field contents can never masquerade as field
/// boundaries the way they can in a delimiter-joined string.
pub fn canonical_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let canonical = serde_jcs::to_string(value)?;
    Ok(canonical.into_bytes())
}
