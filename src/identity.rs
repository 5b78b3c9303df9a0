//! Deterministic content-based identity for measurements.

use sha1::{Digest, Sha1};

/// Separator between device and timestamp in the digest preimage.
const ID_SEPARATOR: char = '|';

/// Derive the storage key for a (device, timestamp) pair.
///
/// Returns `None` if the device is empty or the timestamp is absent;
/// otherwise the lowercase-hex SHA-1 digest of the UTF-8 bytes of
/// `"{device}|{seconds}"`.
///
/// The key is a content digest rather than a generated id so that any two
/// processes ingesting the same logical reading converge on the same key:
/// the store's unique `_id` index then rejects the second write, which is
/// the entire deduplication mechanism.
pub fn build_id(device: &str, epoch_seconds: Option<i64>) -> Option<String> {
    if device.is_empty() {
        return None;
    }
    let seconds = epoch_seconds?;
    let mut hasher = Sha1::new();
    hasher.update(format!("{device}{ID_SEPARATOR}{seconds}").as_bytes());
    Some(format!("{:x}", hasher.finalize()))
}
