//! Equihash parameter sets `(n, k, person)` and the quantities derived from them.

use crate::Error;

/// Equihash parameters.
///
/// - `n`: number of bits per leaf hash fragment.
/// - `k`: number of reduction rounds; a solution has `2^k` indices.
/// - `person`: 8-byte Blake2b personalization tag (e.g. `b"ZcashPoW"`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Params {
    n: u32,
    k: u32,
    person: [u8; 8],
}

/// Minimum collision length in bits, per the `bit_len >= 8` BitPacker precondition.
const MIN_COLLISION_BITS: u32 = 8;
/// Maximum collision length in bits. `bitpack::indices_from_minimal` calls `expand_array` with
/// `bit_len = collision_bit_length() + 1`, and the BitPacker's own precondition caps that value
/// at 25, so `collision_bit_length()` itself must not exceed 24.
const MAX_COLLISION_BITS: u32 = 24;
/// Degenerate single-round trees are rejected; every real Equihash parameter set uses k >= 3.
const MIN_ROUNDS: u32 = 3;

impl Params {
    /// Constructs validated parameters for an arbitrary `(n, k, person)` triple.
    ///
    /// Returns `Error::InvalidParams` if any of the following fail:
    /// - `k < n` and `k >= 3`,
    /// - `n/(k+1) + 1 < 32`,
    /// - the derived `collision_length` lies in `[8, 24]` (capped at 24, not 25: BitPacker's
    ///   `expand_array` is called with `bit_len = collision_length + 1`, and its own precondition
    ///   requires that value to stay `<= 25`),
    /// - `n` divides evenly by `8` (so the leaf hash slice `n/8` is exact, not floored),
    /// - `n` divides evenly by `k+1` (so `collision_length` is exact, not floored).
    ///
    /// Note `n` need NOT divide 512 evenly: both shipped presets (Zcash's `n=200` and Bitcoin
    /// Gold's `n=144`) leave a remainder (`512 % 200 == 112`, `512 % 144 == 80`). `digest_len`
    /// (`indices_per_hash_output() * (n/8)`) is exactly the Blake2b output length actually
    /// configured, so there is no leftover digest tail to reconcile; `indices_per_hash_output`
    /// and `n/8` already agree with `digest_len` by construction, for every `n`, not just ones
    /// that divide 512 (see DESIGN.md's Open Question resolution).
    pub fn new(n: u32, k: u32, person: [u8; 8]) -> Result<Self, Error> {
        if k < MIN_ROUNDS || k >= n {
            return Err(Error::InvalidParams);
        }
        if !n.is_multiple_of(8) {
            return Err(Error::InvalidParams);
        }
        if !n.is_multiple_of(k + 1) {
            return Err(Error::InvalidParams);
        }
        let collision_length = n / (k + 1);
        if collision_length + 1 >= 32 {
            return Err(Error::InvalidParams);
        }
        if !(MIN_COLLISION_BITS..=MAX_COLLISION_BITS).contains(&collision_length) {
            return Err(Error::InvalidParams);
        }
        Ok(Self { n, k, person })
    }

    /// The Zcash mainnet/testnet parameter set, `(n=200, k=9, "ZcashPoW")`.
    pub fn zcash() -> Self {
        Self::new(200, 9, *b"ZcashPoW").expect("built-in Zcash parameters are always valid")
    }

    /// The Bitcoin Gold parameter set, `(n=144, k=5, "BgoldPoW")`.
    pub fn bitcoin_gold() -> Self {
        Self::new(144, 5, *b"BgoldPoW").expect("built-in Bitcoin Gold parameters are always valid")
    }

    pub fn n(&self) -> u32 {
        self.n
    }

    pub fn k(&self) -> u32 {
        self.k
    }

    pub fn person(&self) -> &[u8; 8] {
        &self.person
    }

    /// Number of indices represented per Blake2b digest output (`512 / n`).
    pub fn indices_per_hash_output(&self) -> u32 {
        512 / self.n
    }

    /// Blake2b digest length in bytes used for this parameter set.
    pub fn digest_len(&self) -> u8 {
        (self.indices_per_hash_output() * (self.n / 8)) as u8
    }

    /// Collision length in bits: the number of bits that must match between sibling rows at
    /// each reduction round.
    pub fn collision_bit_length(&self) -> usize {
        (self.n / (self.k + 1)) as usize
    }

    /// Collision length rounded up to whole bytes.
    pub fn collision_byte_length(&self) -> usize {
        self.collision_bit_length().div_ceil(8)
    }

    /// Bytes per expanded step row: `(k+1) * collision_byte_length`.
    pub fn hash_length(&self) -> usize {
        (self.k as usize + 1) * self.collision_byte_length()
    }

    /// Number of indices in a solution: `2^k`.
    pub fn num_indices(&self) -> usize {
        1usize << self.k
    }

    /// Compact (minimal) solution width in bytes.
    pub fn solution_width(&self) -> usize {
        (self.num_indices() * (self.collision_bit_length() + 1)) / 8
    }
}
