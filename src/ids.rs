//! Canonical form for processor-issued identifiers.
//!
//! Processor order ids and public ids are UUID-like strings on the wire but
//! are stored hex-packed (hyphens stripped, 16 raw bytes) so the uniqueness
//! indexes stay compact. Every write and every lookup goes through `pack`;
//! rows read back out go through `unpack`.

use uuid::Uuid;

use crate::error::{AppError, Result};

/// Pack a dashed or undashed UUID-like identifier into its 16-byte form.
pub fn pack(id: &str) -> Result<[u8; 16]> {
    let uuid = Uuid::try_parse(id.trim())
        .map_err(|_| AppError::BadRequest(format!("invalid order identifier: {}", id)))?;
    Ok(*uuid.as_bytes())
}

/// Restore the dashed string form of a packed identifier.
pub fn unpack(bytes: &[u8]) -> Result<String> {
    let uuid = Uuid::from_slice(bytes)
        .map_err(|_| AppError::Internal("malformed packed identifier in store".to_string()))?;
    Ok(uuid.hyphenated().to_string())
}
