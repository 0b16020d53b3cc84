//! Stable identifier derivation for tenders and vector points.
//!
//! Every artifact produced for one tender (uploaded files, vector chunks,
//! criterion lookups) is correlated through a single *document id* derived
//! from the tender's source URL. Deriving instead of storing means the id
//! can be recomputed anywhere the URL is known, including across runs.

use blake3::Hasher;

/// Hex length of a document id (first 16 bytes of the BLAKE3 hash).
pub const DOCUMENT_ID_LEN: usize = 32;

/// Derives the stable document id for a tender from its source URL.
///
/// 128 bits of BLAKE3 output, hex-encoded. Collisions at realistic tender
/// volumes (thousands per run) are negligible, and a collision degrades to
/// two tenders sharing a vector namespace, not data corruption.
#[inline]
pub fn document_id(url: &str) -> String {
    let hash = blake3::hash(url.trim().as_bytes());
    let mut out = String::with_capacity(DOCUMENT_ID_LEN);
    for byte in &hash.as_bytes()[0..DOCUMENT_ID_LEN / 2] {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

/// Computes a 64-bit point id for one chunk of one document.
///
/// The separator byte keeps `("ab", 1)` and `("a", 11)` style inputs from
/// colliding.
#[inline]
pub fn chunk_point_id(document_id: &str, chunk_index: usize) -> u64 {
    let mut hasher = Hasher::new();
    hasher.update(document_id.as_bytes());
    hasher.update(b"|");
    hasher.update(&(chunk_index as u64).to_le_bytes());

    let hash = hasher.finalize();
    let bytes: [u8; 8] = hash.as_bytes()[0..8]
        .try_into()
        .expect("BLAKE3 always produces at least 8 bytes");
    u64::from_le_bytes(bytes)
}

/// Computes a 64-bit hash of arbitrary bytes, truncated from 256 bits.
#[inline]
pub fn hash_to_u64(data: &[u8]) -> u64 {
    let hash = blake3::hash(data);
    let bytes: [u8; 8] = hash.as_bytes()[0..8]
        .try_into()
        .expect("BLAKE3 always produces at least 8 bytes");
    u64::from_le_bytes(bytes)
}
