//! # Commitment Trees
//!
//! Binary tree composition of many commitments into a single root, used to
//! summarize a batch of entity verifications in one value.
//!
//! Levels are folded left to right with [`combine`]. An unpaired trailing
//! node is promoted to the next level unchanged. The empty tree has root
//! `commit(&[])`.

use crate::commitment::{combine, commit, Commitment};

/// A fully materialized commitment tree.
#[derive(Debug, Clone)]
pub struct CommitmentTree {
    levels: Vec<Vec<Commitment>>,
}

impl CommitmentTree {
    /// Build the tree over `leaves` in order.
    pub fn build(leaves: &[Commitment]) -> Self {
        let mut levels = vec![leaves.to_vec()];
        while levels.last().map_or(0, Vec::len) > 1 {
            let next = levels
                .last()
                .map(|level| next_level(level))
                .unwrap_or_default();
            levels.push(next);
        }
        Self { levels }
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.levels.first().map_or(0, Vec::len)
    }

    /// The root commitment.
    pub fn root(&self) -> Commitment {
        self.levels
            .last()
            .and_then(|top| top.first().copied())
            .unwrap_or_else(|| commit(&[]))
    }
}

fn next_level(level: &[Commitment]) -> Vec<Commitment> {
    level
        .chunks(2)
        .map(|pair| match pair {
            [left, right] => combine(left, right),
            [single] => *single,
            _ => commit(&[]),
        })
        .collect()
}

/// Root over `leaves` without keeping intermediate levels.
pub(crate) fn fold_root(leaves: &[Commitment]) -> Commitment {
    if leaves.is_empty() {
        return commit(&[]);
    }
    let mut level = leaves.to_vec();
    while level.len() > 1 {
        level = next_level(&level);
    }
    level[0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pret_core::encoding::FieldElement;

    fn leaf(n: u32) -> Commitment {
        commit(&[FieldElement::from(n)])
    }

    #[test]
    fn test_empty_tree_root() {
        let tree = CommitmentTree::build(&[]);
        assert_eq!(tree.root(), commit(&[]));
        assert_eq!(tree.leaf_count(), 0);
    }

    #[test]
    fn test_single_leaf_is_root() {
        let tree = CommitmentTree::build(&[leaf(1)]);
        assert_eq!(tree.root(), leaf(1));
    }

    #[test]
    fn test_three_leaves_promote_last() {
        let (a, b, c) = (leaf(1), leaf(2), leaf(3));
        let tree = CommitmentTree::build(&[a, b, c]);
        assert_eq!(tree.root(), combine(&combine(&a, &b), &c));
        assert_eq!(fold_root(&[a, b, c]), tree.root());
    }

    #[test]
    fn test_build_matches_fold_for_every_size() {
        for size in 1..=9u32 {
            let leaves: Vec<Commitment> = (0..size).map(leaf).collect();
            let tree = CommitmentTree::build(&leaves);
            assert_eq!(tree.leaf_count(), size as usize);
            assert_eq!(tree.root(), fold_root(&leaves), "size {size}");
        }
    }
}
