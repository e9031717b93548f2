//! Merkle tree construction, proof extraction, and proof validation.
//!
//! The tree is a sequence of levels stored as contiguous arrays rather
//! than a pointer graph; ascending a level is `idx >> 1`. Level 0 holds
//! the hashed leaves in input order.

use thiserror::Error;

use crate::hash::{keccak256, keccak256_concat, Hash};

/// Merkle engine errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MerkleError {
    /// A tree cannot be built over zero leaves.
    #[error("no leaves provided")]
    Empty,
}

/// A Merkle tree as layered arrays of node hashes.
///
/// `levels[0]` is the leaf level; the last level holds the single root.
/// A one-leaf tree is legal here (its root is the leaf hash and every
/// proof is empty); callers that require at least two leaves enforce
/// that at their own boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    levels: Vec<Vec<Hash>>,
}

/// Hash a pair commutatively: keccak256 of the byte-lexicographically
/// sorted concatenation. This is what makes proofs match on-chain
/// verifiers that also sort pairs.
fn hash_sorted_pair(a: &Hash, b: &Hash) -> Hash {
    if a <= b {
        keccak256_concat(&[a.as_slice(), b.as_slice()])
    } else {
        keccak256_concat(&[b.as_slice(), a.as_slice()])
    }
}

impl Tree {
    /// Build a tree over the given leaves.
    ///
    /// Leaves are hashed verbatim and kept in input order; they are not
    /// sorted and not deduplicated. An odd trailing node at any level is
    /// promoted unchanged to the next level.
    pub fn build<L: AsRef<[u8]>>(leaves: &[L]) -> Result<Self, MerkleError> {
        if leaves.is_empty() {
            return Err(MerkleError::Empty);
        }

        let mut current: Vec<Hash> = leaves.iter().map(|l| keccak256(l.as_ref())).collect();
        let mut levels = Vec::new();
        while current.len() > 1 {
            let next = current
                .chunks(2)
                .map(|pair| match pair {
                    [a, b] => hash_sorted_pair(a, b),
                    [odd] => *odd,
                    _ => unreachable!("chunks(2) yields 1 or 2 nodes"),
                })
                .collect();
            levels.push(current);
            current = next;
        }
        levels.push(current);

        Ok(Self { levels })
    }

    /// The 32-byte root, the tree's content address.
    pub fn root(&self) -> Hash {
        self.levels[self.levels.len() - 1][0]
    }

    /// Number of leaves the tree was built over.
    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    /// Inclusion proof for the leaf at `index`: the sibling hashes from
    /// the leaf level up to (but excluding) the root level, leaf-adjacent
    /// sibling first. A level where the node has no sibling (promoted odd
    /// node) contributes nothing. An out-of-range index yields an empty
    /// proof.
    pub fn proof(&self, index: usize) -> Vec<Hash> {
        if index >= self.leaf_count() {
            return Vec::new();
        }
        let mut proof = Vec::new();
        let mut idx = index;
        for level in &self.levels[..self.levels.len() - 1] {
            let sibling = idx ^ 1;
            if sibling < level.len() {
                proof.push(level[sibling]);
            }
            idx /= 2;
        }
        proof
    }

    /// Inclusion proof for an unhashed leaf, located by hashing it and
    /// scanning the leaf level for the first match. An absent leaf yields
    /// an empty proof; callers treat empty as not-found for trees of two
    /// or more leaves.
    pub fn proof_for_leaf(&self, leaf: &[u8]) -> Vec<Hash> {
        let target = keccak256(leaf);
        match self.levels[0].iter().position(|h| *h == target) {
            Some(index) => self.proof(index),
            None => Vec::new(),
        }
    }

    /// One proof per leaf, in original leaf order.
    pub fn proofs(&self) -> Vec<Vec<Hash>> {
        (0..self.leaf_count()).map(|i| self.proof(i)).collect()
    }
}

/// Check that `proof` connects `leaf` to `root`.
///
/// Folds sorted-pair keccak from the leaf hash through each proof node
/// and byte-compares the result to the root.
pub fn validate(root: &Hash, proof: &[Hash], leaf: &[u8]) -> bool {
    let mut acc = keccak256(leaf);
    for node in proof {
        acc = hash_sorted_pair(&acc, node);
    }
    acc == *root
}

/// Content address of a proof path: keccak256 of the concatenated proof
/// nodes. Powers the reverse proof → root index.
pub fn proof_hash(proof: &[Hash]) -> Hash {
    let parts: Vec<&[u8]> = proof.iter().map(|h| h.as_slice()).collect();
    keccak256_concat(&parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address_leaves(n: u8) -> Vec<Vec<u8>> {
        (1..=n)
            .map(|i| {
                let mut addr = vec![0u8; 20];
                addr[19] = i;
                addr
            })
            .collect()
    }

    #[test]
    fn five_address_root() {
        let tree = Tree::build(&address_leaves(5)).unwrap();
        assert_eq!(
            hex::encode(tree.root()),
            "a7a6b1cb6d12308ec4818baac3413fafa9e8b52cdcd79252fa9e29c9a2f8aff1"
        );
    }

    #[test]
    fn six_letter_root() {
        let leaves: Vec<&[u8]> = vec![b"a", b"b", b"c", b"d", b"e", b"f"];
        let tree = Tree::build(&leaves).unwrap();
        assert_eq!(
            hex::encode(tree.root()),
            "1b404f199ea828ec5771fb30139c222d8417a82175fefad5cd42bc3a189bd8d5"
        );
    }

    #[test]
    fn every_proof_validates() {
        for n in 1..=8u8 {
            let leaves = address_leaves(n);
            let tree = Tree::build(&leaves).unwrap();
            let root = tree.root();
            for (i, leaf) in leaves.iter().enumerate() {
                let proof = tree.proof(i);
                assert!(
                    validate(&root, &proof, leaf),
                    "proof for leaf {i} of {n} failed"
                );
            }
        }
    }

    #[test]
    fn first_leaf_proof_reduces_to_root() {
        let leaves = address_leaves(5);
        let tree = Tree::build(&leaves).unwrap();
        let proof = tree.proof_for_leaf(&leaves[0]);
        assert!(!proof.is_empty());
        assert!(validate(&tree.root(), &proof, &leaves[0]));
    }

    #[test]
    fn build_is_deterministic() {
        let leaves = address_leaves(7);
        let a = Tree::build(&leaves).unwrap();
        let b = Tree::build(&leaves).unwrap();
        assert_eq!(a.root(), b.root());
    }

    #[test]
    fn leaf_order_matters() {
        let mut leaves = address_leaves(4);
        let root = Tree::build(&leaves).unwrap().root();
        leaves.swap(0, 3);
        let swapped = Tree::build(&leaves).unwrap().root();
        assert_ne!(root, swapped);
    }

    #[test]
    fn power_of_two_proof_lengths() {
        let leaves = address_leaves(8);
        let tree = Tree::build(&leaves).unwrap();
        for i in 0..8 {
            assert_eq!(tree.proof(i).len(), 3);
        }
    }

    #[test]
    fn promoted_node_has_short_proof() {
        // Five leaves: index 4 is promoted through two levels and only
        // meets a sibling at the level below the root.
        let leaves = address_leaves(5);
        let tree = Tree::build(&leaves).unwrap();
        assert_eq!(tree.proof(4).len(), 1);
        assert!(validate(&tree.root(), &tree.proof(4), &leaves[4]));
    }

    #[test]
    fn single_leaf_tree() {
        let leaves: Vec<&[u8]> = vec![b"only"];
        let tree = Tree::build(&leaves).unwrap();
        assert_eq!(tree.root(), keccak256(b"only"));
        assert!(tree.proof(0).is_empty());
        assert!(validate(&tree.root(), &[], b"only"));
    }

    #[test]
    fn empty_leaves_rejected() {
        let leaves: Vec<&[u8]> = vec![];
        assert_eq!(Tree::build(&leaves).unwrap_err(), MerkleError::Empty);
    }

    #[test]
    fn absent_leaf_yields_empty_proof() {
        let tree = Tree::build(&address_leaves(4)).unwrap();
        assert!(tree.proof_for_leaf(b"not a member").is_empty());
    }

    #[test]
    fn proofs_match_per_index_proofs() {
        let leaves = address_leaves(6);
        let tree = Tree::build(&leaves).unwrap();
        let all = tree.proofs();
        assert_eq!(all.len(), 6);
        for (i, p) in all.iter().enumerate() {
            assert_eq!(*p, tree.proof(i));
        }
    }

    #[test]
    fn proof_hash_distinguishes_paths() {
        let tree = Tree::build(&address_leaves(4)).unwrap();
        let h0 = proof_hash(&tree.proof(0));
        let h2 = proof_hash(&tree.proof(2));
        assert_ne!(h0, h2);
        assert_eq!(proof_hash(&[]), keccak256(b""));
    }

    #[test]
    fn duplicate_leaves_kept() {
        let leaves: Vec<&[u8]> = vec![b"dup", b"dup", b"other"];
        let tree = Tree::build(&leaves).unwrap();
        assert_eq!(tree.leaf_count(), 3);
        // proof_for_leaf resolves to the first occurrence.
        assert_eq!(tree.proof_for_leaf(b"dup"), tree.proof(0));
    }
}
