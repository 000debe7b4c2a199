//! Personalized Blake2b hashing: header/nonce absorption and per-index digest derivation.

use blake2b_simd::{Hash as Blake2bHash, Params as Blake2bParams, State as Blake2bState};
use tracing::trace;

use crate::params::Params;
use crate::Error;

/// Initializes Blake2b with the Equihash personalization layout:
/// `person (8 bytes) || LE32(n) || LE32(k)`, and the parameter-dependent digest length.
pub(crate) fn initialise_state(params: &Params) -> Blake2bState {
    let mut personalization = [0u8; 16];
    personalization[..8].copy_from_slice(params.person());
    personalization[8..12].copy_from_slice(&params.n().to_le_bytes());
    personalization[12..16].copy_from_slice(&params.k().to_le_bytes());

    Blake2bParams::new()
        .hash_length(params.digest_len() as usize)
        .personal(&personalization)
        .to_state()
}

/// Resolves the 32-byte nonce used for hashing, either from the caller-supplied value or by
/// extracting and byte-reversing `header[108..140]`.
pub(crate) fn resolve_nonce(header: &[u8], nonce: Option<[u8; 32]>) -> Result<[u8; 32], Error> {
    if let Some(n) = nonce {
        return Ok(n);
    }
    if header.len() < 140 {
        return Err(Error::HeaderMissingNonce);
    }
    let mut n = [0u8; 32];
    n.copy_from_slice(&header[108..140]);
    n.reverse();
    Ok(n)
}

/// Absorbs the header prefix and nonce into the seeded state, per the mandatory absorption
/// order: first the 108-byte header prefix, then the nonce's eight 32-bit words, each read
/// big-endian and re-absorbed little-endian, fed in reverse word order.
pub(crate) fn absorb_header_and_nonce(state: &mut Blake2bState, header: &[u8], nonce: &[u8; 32]) {
    state.update(&header[..108]);
    for i in (0..8).rev() {
        let word = u32::from_be_bytes(nonce[4 * i..4 * i + 4].try_into().unwrap());
        state.update(&word.to_le_bytes());
    }
    trace!("seeded Blake2b state with header prefix and nonce");
}

/// Computes the group digest for index `i`'s group (`hash_xi`): clones the seeded state and
/// absorbs the group index as a little-endian 32-bit integer.
pub(crate) fn generate_hash(base_state: &Blake2bState, group: u32) -> Blake2bHash {
    let mut state = base_state.clone();
    state.update(&group.to_le_bytes());
    state.finalize()
}
