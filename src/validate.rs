//! Structural invariant checker.
//!
//! Walks the whole tree and reports the first broken invariant. Used by the
//! test suites after every mutation and exposed through
//! `RbHashMap::validate` for callers who want to assert on it.

use crate::hash_fn::HashFn;
use crate::node::{Color, NodeKey, Side};
use crate::tree::RawTree;
use core::fmt;
use core::hash::Hash;

/// A broken structural invariant, naming the offending node by its hash.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum InvariantViolation {
    RedRoot {
        hash: i64,
    },
    RedRedEdge {
        hash: i64,
    },
    BlackHeightMismatch {
        hash: i64,
        left: usize,
        right: usize,
    },
    OutOfOrder {
        hash: i64,
    },
    /// A node's primary key is repeated in its collision map.
    DuplicateKey {
        hash: i64,
    },
    /// A stored key no longer hashes to the node holding it.
    MisplacedKey {
        node_hash: i64,
        key_hash: i64,
    },
    BrokenParentLink {
        hash: i64,
    },
    LengthMismatch {
        recorded: usize,
        counted: usize,
    },
    /// Arena slots that are not reachable from the root.
    LeakedNodes {
        reachable: usize,
        allocated: usize,
    },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RedRoot { hash } => write!(f, "root node {hash} is red"),
            Self::RedRedEdge { hash } => {
                write!(f, "red node {hash} has a red parent")
            }
            Self::BlackHeightMismatch { hash, left, right } => write!(
                f,
                "node {hash} has black-height {left} on the left and {right} on the right"
            ),
            Self::OutOfOrder { hash } => {
                write!(f, "node {hash} violates hash ordering")
            }
            Self::DuplicateKey { hash } => {
                write!(f, "node {hash} stores its primary key twice")
            }
            Self::MisplacedKey {
                node_hash,
                key_hash,
            } => write!(f, "key hashing to {key_hash} is stored in node {node_hash}"),
            Self::BrokenParentLink { hash } => {
                write!(f, "node {hash} does not point back to its parent")
            }
            Self::LengthMismatch { recorded, counted } => write!(
                f,
                "map records {recorded} entries but holds {counted}"
            ),
            Self::LeakedNodes {
                reachable,
                allocated,
            } => write!(
                f,
                "{reachable} nodes reachable from the root but {allocated} allocated"
            ),
        }
    }
}

impl std::error::Error for InvariantViolation {}

struct Tally {
    nodes: usize,
    entries: usize,
}

/// Check every tree invariant; returns the number of stored entries.
pub(crate) fn check_tree<K, V, H>(
    tree: &RawTree<K, V>,
    hash_fn: &H,
) -> Result<usize, InvariantViolation>
where
    K: Eq + Hash,
    H: HashFn<K> + ?Sized,
{
    let allocated = tree.node_count();
    let Some(root) = tree.root() else {
        if allocated != 0 {
            return Err(InvariantViolation::LeakedNodes {
                reachable: 0,
                allocated,
            });
        }
        return Ok(0);
    };

    let r = tree.node(root);
    if r.parent.is_some() {
        return Err(InvariantViolation::BrokenParentLink { hash: r.hash });
    }
    if r.color == Color::Red {
        return Err(InvariantViolation::RedRoot { hash: r.hash });
    }

    let mut tally = Tally {
        nodes: 0,
        entries: 0,
    };
    check_subtree(tree, hash_fn, root, None, None, &mut tally)?;
    if tally.nodes != allocated {
        return Err(InvariantViolation::LeakedNodes {
            reachable: tally.nodes,
            allocated,
        });
    }
    Ok(tally.entries)
}

/// Returns the black-height of the subtree, counting the sentinel as one.
fn check_subtree<K, V, H>(
    tree: &RawTree<K, V>,
    hash_fn: &H,
    key: NodeKey,
    lo: Option<i64>,
    hi: Option<i64>,
    tally: &mut Tally,
) -> Result<usize, InvariantViolation>
where
    K: Eq + Hash,
    H: HashFn<K> + ?Sized,
{
    let node = tree.node(key);
    let hash = node.hash;
    if lo.is_some_and(|lo| hash <= lo) || hi.is_some_and(|hi| hash >= hi) {
        return Err(InvariantViolation::OutOfOrder { hash });
    }

    for side in [Side::Left, Side::Right] {
        if let Some(c) = node.child(side) {
            let child = tree.node(c);
            if child.parent != Some(key) {
                return Err(InvariantViolation::BrokenParentLink { hash: child.hash });
            }
            if node.color == Color::Red && child.color == Color::Red {
                return Err(InvariantViolation::RedRedEdge { hash: child.hash });
            }
        }
    }

    if node.bucket.primary_shadowed() {
        return Err(InvariantViolation::DuplicateKey { hash });
    }
    for k in node.bucket.keys() {
        let key_hash = hash_fn.hash_key(k);
        if key_hash != hash {
            return Err(InvariantViolation::MisplacedKey {
                node_hash: hash,
                key_hash,
            });
        }
    }
    tally.nodes += 1;
    tally.entries += node.bucket.len();

    let left = match node.left {
        Some(l) => check_subtree(tree, hash_fn, l, lo, Some(hash), tally)?,
        None => 1,
    };
    let right = match node.right {
        Some(r) => check_subtree(tree, hash_fn, r, Some(hash), hi, tally)?,
        None => 1,
    };
    if left != right {
        return Err(InvariantViolation::BlackHeightMismatch { hash, left, right });
    }
    Ok(left + usize::from(node.color == Color::Black))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_node() {
        let e = InvariantViolation::BlackHeightMismatch {
            hash: -4,
            left: 2,
            right: 3,
        };
        assert_eq!(
            e.to_string(),
            "node -4 has black-height 2 on the left and 3 on the right"
        );
        let boxed: Box<dyn std::error::Error> = Box::new(InvariantViolation::RedRoot { hash: 1 });
        assert_eq!(boxed.to_string(), "root node 1 is red");
    }

    #[test]
    fn empty_tree_is_valid() {
        let t: RawTree<u8, ()> = RawTree::new();
        assert_eq!(check_tree(&t, &|k: &u8| i64::from(*k)), Ok(0));
    }
}
