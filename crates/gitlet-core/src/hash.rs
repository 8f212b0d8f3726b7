//! Content hashing using SHA-1.
//!
//! Object ids are 160-bit hex strings computed over a sequence of parts.
//! Every part is framed with a big-endian u64 length prefix before being
//! fed to the digest, so no part boundary can collide with field content.

use sha1::{Digest, Sha1};

/// Length of a full object id in hex characters.
pub const ID_LEN: usize = 40;

/// Compute the id of an ordered sequence of byte parts.
pub fn hash_parts(parts: &[&[u8]]) -> String {
    let mut hasher = Sha1::new();
    for part in parts {
        hasher.update((part.len() as u64).to_be_bytes());
        hasher.update(part);
    }
    hex_encode(&hasher.finalize())
}

/// Encode raw bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
