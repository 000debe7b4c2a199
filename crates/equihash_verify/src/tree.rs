//! The k-round collision/XOR/union reduction tree (the "GBP checker").

use blake2b_simd::State as Blake2bState;
use tracing::trace;

use crate::bitpack::expand_array;
use crate::hasher::generate_hash;
use crate::params::Params;
use crate::{Error, Kind};

/// A step row: the reduced hash buffer plus the ordered set of leaf indices it was built from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Node {
    hash: Vec<u8>,
    indices: Vec<u32>,
}

impl Node {
    /// Builds a leaf row for index `i`: selects the `n`-bit slice of its group's digest and
    /// expands it to one byte per `collision_bit_length`-bit slot.
    pub(crate) fn leaf(params: &Params, state: &Blake2bState, i: u32) -> Self {
        let per_hash = params.indices_per_hash_output();
        let hash = generate_hash(state, i / per_hash);
        let slice_bytes = (params.n() / 8) as usize;
        let start = (i % per_hash) as usize * slice_bytes;
        let end = start + slice_bytes;
        Node {
            hash: expand_array(&hash.as_bytes()[start..end], params.collision_bit_length(), 0),
            indices: vec![i],
        }
    }

    /// Combines two validated sibling rows: XORs the bytes past the confirmed-equal collision
    /// prefix, and concatenates index sets with the lexicographically earlier subtree first.
    fn merge(a: Node, b: Node, trim: usize) -> Self {
        let hash = a
            .hash
            .iter()
            .zip(b.hash.iter())
            .skip(trim)
            .map(|(x, y)| x ^ y)
            .collect();
        let indices = if a.precedes(&b) {
            let mut v = a.indices;
            v.extend(b.indices.iter());
            v
        } else {
            let mut v = b.indices;
            v.extend(a.indices.iter());
            v
        };
        Node { hash, indices }
    }

    /// The ordering check's canonical representative: the first index is the minimum index in
    /// the subtree.
    fn precedes(&self, other: &Node) -> bool {
        self.indices[0] < other.indices[0]
    }

    /// Counts leading zero bits of the hash buffer, padding each byte to exactly 8 bits before
    /// counting (avoids the reference's known `count_zeroes` bug of dropping per-byte leading
    /// zeros before re-padding).
    fn leading_zero_bits(&self) -> usize {
        let mut count = 0;
        for byte in &self.hash {
            if *byte == 0 {
                count += 8;
            } else {
                count += byte.leading_zeros() as usize;
                break;
            }
        }
        count
    }

    fn bit_len(&self) -> usize {
        self.hash.len() * 8
    }
}

/// Checks that the leading `len` bytes of two sibling rows are byte-equal.
fn has_collision(a: &Node, b: &Node, len: usize) -> bool {
    a.hash.iter().zip(b.hash.iter()).take(len).all(|(x, y)| x == y)
}

/// Checks that two sibling rows' index sets are disjoint.
fn distinct_indices(a: &Node, b: &Node) -> bool {
    for i in &a.indices {
        for j in &b.indices {
            if i == j {
                return false;
            }
        }
    }
    true
}

/// Validates the three sibling constraints (collision, ordering, distinctness), in that order,
/// matching the reference's error-precedence.
fn validate_siblings(params: &Params, a: &Node, b: &Node) -> Result<(), Kind> {
    if !has_collision(a, b, params.collision_byte_length()) {
        Err(Kind::Collision)
    } else if b.precedes(a) {
        Err(Kind::OutOfOrder)
    } else if !distinct_indices(a, b) {
        Err(Kind::DuplicateIdxs)
    } else {
        Ok(())
    }
}

/// Recursively builds and validates the merge tree over `indices`, returning the root row.
pub(crate) fn tree_validator(
    params: &Params,
    state: &Blake2bState,
    indices: &[u32],
) -> Result<Node, Error> {
    if indices.len() > 1 {
        if !indices.len().is_multiple_of(2) {
            return Err(Error::Tree(Kind::OddRowCount(indices.len())));
        }
        let mid = indices.len() / 2;
        let a = tree_validator(params, state, &indices[..mid])?;
        let b = tree_validator(params, state, &indices[mid..])?;
        validate_siblings(params, &a, &b).map_err(Error::Tree)?;
        Ok(Node::merge(a, b, params.collision_byte_length()))
    } else {
        Ok(Node::leaf(params, state, indices[0]))
    }
}

/// Checks the root row's final all-zero condition, reporting the observed zero-bit count on
/// failure.
pub(crate) fn check_root_is_zero(root: &Node) -> Result<(), Error> {
    let zeros = root.leading_zero_bits();
    let needed = root.bit_len();
    trace!(zeros, needed, "final root zero-bit check");
    if zeros == needed {
        Ok(())
    } else {
        Err(Error::Tree(Kind::NonZeroRootHash(zeros)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(hash: &[u8], indices: &[u32]) -> Node {
        Node {
            hash: hash.to_vec(),
            indices: indices.to_vec(),
        }
    }

    #[test]
    fn merge_xors_past_collision_prefix_and_orders_indices() {
        let a = node(&[0xAA, 0x01, 0x02], &[5]);
        let b = node(&[0xAA, 0x03, 0x06], &[2]);
        let merged = Node::merge(a, b, 1);
        assert_eq!(merged.hash, vec![0x01 ^ 0x03, 0x02 ^ 0x06]);
        // index 2 < index 5, so b's indices come first.
        assert_eq!(merged.indices, vec![2, 5]);
    }

    #[test]
    fn valid_two_leaf_tree_reduces_to_all_zero_root() {
        // Hand-constructed: equal first byte (the collision prefix), and the remaining bytes
        // are each other's XOR-complement so the merged row is entirely zero.
        let a = node(&[0x7F, 0x10, 0x20], &[3]);
        let b = node(&[0x7F, 0x10, 0x20], &[9]);
        assert!(has_collision(&a, &b, 1));
        assert!(a.precedes(&b));
        assert!(distinct_indices(&a, &b));
        let merged = Node::merge(a, b, 1);
        assert_eq!(merged.hash, vec![0, 0]);
        assert_eq!(merged.leading_zero_bits(), merged.bit_len());
    }

    #[test]
    fn swapped_sibling_order_is_rejected() {
        let params = Params::bitcoin_gold();
        let a = node(&[0x7F, 0x10, 0x20, 0x00], &[9]);
        let b = node(&[0x7F, 0x10, 0x20, 0x00], &[3]);
        // a.indices[0]=9, b.indices[0]=3: b actually precedes a, so validation must fail.
        assert_eq!(
            validate_siblings(&params, &a, &b).unwrap_err(),
            Kind::OutOfOrder
        );
    }

    #[test]
    fn duplicate_index_is_rejected() {
        let params = Params::bitcoin_gold();
        let a = node(&[0x7F, 0x10, 0x20, 0x00], &[3, 9]);
        let b = node(&[0x7F, 0x10, 0x20, 0x00], &[9, 20]);
        assert_eq!(
            validate_siblings(&params, &a, &b).unwrap_err(),
            Kind::DuplicateIdxs
        );
    }

    #[test]
    fn mismatched_collision_prefix_is_rejected() {
        let params = Params::bitcoin_gold();
        let a = node(&[0x7F, 0x10, 0x20, 0x00], &[3]);
        let b = node(&[0x80, 0x10, 0x20, 0x00], &[9]);
        assert_eq!(
            validate_siblings(&params, &a, &b).unwrap_err(),
            Kind::Collision
        );
    }

    #[test]
    fn nonzero_root_is_rejected_with_observed_count() {
        let root = node(&[0x00, 0x08], &[1, 2]);
        let err = check_root_is_zero(&root).unwrap_err();
        // 0x00 contributes 8 zero bits, 0x08 = 0b0000_1000 contributes 4 more before the set bit.
        assert_eq!(err, Error::Tree(Kind::NonZeroRootHash(12)));
    }
}
