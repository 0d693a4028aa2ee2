// src/core/fingerprint.rs

use log::trace;

const HASH_TRUNCATE_LENGTH: usize = 16; // 16 bytes = 32 hex characters

/// Computes a short, stable fingerprint of a script's contents (blake3, truncated).
///
/// Two reads of the same bytes always produce the same fingerprint, which lets
/// the watcher recognise change events that did not actually alter a script.
pub fn content_fingerprint(content: &[u8]) -> String {
    let hash = blake3::hash(content);
    let bytes = hash.as_bytes();
    let fingerprint = hex::encode(bytes.get(..HASH_TRUNCATE_LENGTH).unwrap_or(bytes));
    trace!("Fingerprint of {} bytes: {}", content.len(), fingerprint);
    fingerprint
}
