//! rb-hashmap: a single-threaded map kept in a red-black tree that is
//! ordered by a caller-supplied `i64` hash of each key, with per-node
//! buckets for keys whose hashes collide.
//!
//! ```
//! use rb_hashmap::RbHashMap;
//!
//! // Every non-zero multiple of five collides with its predecessor.
//! let mut m = RbHashMap::new(|v: &i64| if *v != 0 && *v % 5 == 0 { *v - 1 } else { *v });
//! m.insert(4, "four");
//! m.insert(5, "five");
//! assert_eq!(m.get(&4), Some(&"four"));
//! assert_eq!(m.get(&5), Some(&"five"));
//! assert!(m.remove(&4));
//! assert_eq!(m.get(&4), None);
//! assert_eq!(m.get(&5), Some(&"five"));
//! ```
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a map whose balance depends only on the spread of the supplied
//!   hash, with collisions absorbed by the node that owns the hash.
//! - Layers:
//!   - RawTree<K, V>: the balancing engine. Nodes sit in a `SlotMap` arena
//!     and link to each other by generational `NodeKey`s; a `None` child is
//!     the black sentinel leaf. It orders by hash only and never calls
//!     user code.
//!   - Bucket<K, V>: the collision resolver. The first key for a hash is
//!     stored inline; later keys with the same hash go to a `hashbrown`
//!     map. Removing the inline key promotes one of the others.
//!   - RbHashMap<K, V, H>: public API. Hashes once per call, asks the tree
//!     for the node, resolves the key in its bucket, and only touches the
//!     tree's shape when a hash appears or disappears.
//!
//! Constraints
//! - Single-threaded, no internal locking. The map is `Send` when its
//!   parts are, so a caller can put it behind a `Mutex`.
//! - Infallible operations: "absent" is `None` / `false`.
//! - No iteration or ordered traversal, no rehashing. The hash function is
//!   fixed at construction.
//!
//! Tree invariants (checked by `RbHashMap::validate`)
//! - The root is black; no red node has a red child.
//! - Every root-to-sentinel path carries the same number of black nodes.
//! - Left subtree hashes < node hash < right subtree hashes, so each hash
//!   owns at most one node.
//! - Every key in a node's bucket hashes to that node's hash, and no key
//!   appears twice in one bucket.
//!
//! Removal
//! - A node whose bucket still has other keys stays where it is.
//! - Otherwise the in-order successor (or predecessor, or the node itself
//!   when it has no children) is spliced out after its hash and bucket move
//!   into the removed node's slot; the freed arena slot is released.
//!
//! Reentrancy policy
//! - Public methods run user code (`H`, `K: Eq`, `K: Hash`) while holding a
//!   debug-only guard. Re-entering the same map from that code panics in
//!   debug builds; release builds carry no guard state.

mod bucket;
mod hash_fn;
mod node;
mod rb_hash_map;
mod rb_hash_map_proptest;
mod reentrancy;
mod tree;
mod validate;

// Public surface
pub use hash_fn::{BuildHasherFn, HashFn};
pub use rb_hash_map::RbHashMap;
pub use validate::InvariantViolation;
