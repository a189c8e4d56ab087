//! # kiln-hash
//!
//! Content addressing for the Kiln repository.
//!
//! Every artifact key in the store is the BLAKE3 digest of the artifact's
//! bytes, rendered as a lowercase hex string. Identical content always maps
//! to the same key, so the addresses double as deduplication handles.
//!
//! Deployable contract code carries a compiler-appended metadata suffix
//! (auxdata). The base code and the full code (base plus auxdata) are
//! addressed separately; [`split_auxdata`] recovers the two halves from code
//! as it went on chain.

/// Compute the content address of a byte sequence.
pub fn content_address(data: &[u8]) -> String {
    hex::encode(blake3::hash(data).as_bytes())
}

/// Content address of base code with an auxdata suffix appended.
///
/// Equal to `content_address` of the concatenation; the two inputs are
/// hashed without any separator so the address can be re-derived from code
/// as deployed.
pub fn content_address_with_auxdata(base: &[u8], auxdata: &[u8]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(base);
    hasher.update(auxdata);
    hex::encode(hasher.finalize().as_bytes())
}

/// Split deployable code into base code and the compiler auxdata suffix.
///
/// The final two bytes of the suffix encode the suffix length (big-endian,
/// excluding the two length bytes themselves). Code too short for the
/// encoded length is treated as all base with no suffix.
pub fn split_auxdata(code: &[u8]) -> (&[u8], &[u8]) {
    if code.len() < 2 {
        return (code, &[]);
    }
    let n = u16::from_be_bytes([code[code.len() - 2], code[code.len() - 1]]) as usize;
    let suffix_len = n + 2;
    if suffix_len > code.len() {
        return (code, &[]);
    }
    code.split_at(code.len() - suffix_len)
}
