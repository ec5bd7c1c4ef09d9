//! RbHashMap: the public map layered over the hash-ordered tree.
//!
//! Each operation hashes the key once with the configured `HashFn`, lets the
//! tree find the node for that hash, then resolves the key inside the node's
//! collision bucket. Only inserting a new hash or removing a bucket's last
//! entry changes the tree's shape.

use crate::bucket::{Bucket, Take};
use crate::hash_fn::{BuildHasherFn, HashFn};
use crate::reentrancy::DebugReentrancy;
use crate::tree::{Probe, RawTree};
use crate::validate::{check_tree, InvariantViolation};
use core::fmt;
use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;

/// A map ordered by a caller-supplied `i64` hash of its keys.
///
/// Keys with distinct hashes occupy distinct nodes of a red-black tree, so
/// lookups cost `O(log n)` hash comparisons. Keys that share a hash share a
/// node and are told apart by `K: Eq` in that node's collision bucket.
pub struct RbHashMap<K, V, H = BuildHasherFn<RandomState>> {
    hash_fn: H,
    tree: RawTree<K, V>,
    len: usize,
    reentrancy: DebugReentrancy,
}

impl<K, V, F> RbHashMap<K, V, F>
where
    K: Eq + Hash,
    F: Fn(&K) -> i64,
{
    /// Create an empty map ordered by `hash_fn`.
    ///
    /// `hash_fn` must return the same value for equal keys. It does not have
    /// to be collision-free.
    pub fn new(hash_fn: F) -> Self {
        Self::from_parts(hash_fn, RawTree::new())
    }

    /// Like `new`, with room for `capacity` distinct hashes before the node
    /// arena reallocates.
    pub fn with_capacity(hash_fn: F, capacity: usize) -> Self {
        Self::from_parts(hash_fn, RawTree::with_capacity(capacity))
    }
}

impl<K, V, S> RbHashMap<K, V, BuildHasherFn<S>>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Create an empty map whose tree hash comes from `build`.
    pub fn with_hasher(build: S) -> Self {
        Self::from_parts(BuildHasherFn::new(build), RawTree::new())
    }
}

impl<K, V> Default for RbHashMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::with_hasher(RandomState::new())
    }
}

impl<K, V, H> RbHashMap<K, V, H>
where
    K: Eq + Hash,
    H: HashFn<K>,
{
    fn from_parts(hash_fn: H, tree: RawTree<K, V>) -> Self {
        Self {
            hash_fn,
            tree,
            len: 0,
            reentrancy: DebugReentrancy::new(),
        }
    }

    /// Number of entries, counting every key in every collision bucket.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn hash_fn(&self) -> &H {
        &self.hash_fn
    }

    /// Insert `key -> value`, returning the value it replaced.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let _g = self.reentrancy.enter("insert");
        let hash = self.hash_fn.hash_key(&key);
        match self.tree.probe(hash) {
            Probe::Occupied(node) => {
                let prev = self.tree.bucket_mut(node).insert(key, value);
                if prev.is_none() {
                    self.len += 1;
                }
                prev
            }
            Probe::Vacant { parent, side } => {
                self.tree
                    .attach(parent, side, hash, Bucket::new(key, value));
                self.len += 1;
                None
            }
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        let _g = self.reentrancy.enter("get");
        let node = self.tree.find(self.hash_fn.hash_key(key))?;
        self.tree.node(node).bucket.get(key)
    }

    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        let _g = self.reentrancy.enter("get_key_value");
        let node = self.tree.find(self.hash_fn.hash_key(key))?;
        self.tree.node(node).bucket.get_key_value(key)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let _g = self.reentrancy.enter("get_mut");
        let node = self.tree.find(self.hash_fn.hash_key(key))?;
        self.tree.bucket_mut(node).get_mut(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Remove `key`; returns whether it was present.
    pub fn remove(&mut self, key: &K) -> bool {
        self.remove_entry(key).is_some()
    }

    /// Remove `key` and return the stored entry.
    ///
    /// When other keys share the hash, only the bucket changes. Taking the
    /// last key of a hash unlinks its node and rebalances the tree.
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        let _g = self.reentrancy.enter("remove");
        let node = self.tree.find(self.hash_fn.hash_key(key))?;
        let entry = match self.tree.bucket_mut(node).take(key) {
            Take::Taken(k, v) => (k, v),
            Take::Last => self.tree.unlink(node).into_entry(),
            Take::Missing => return None,
        };
        self.len -= 1;
        Some(entry)
    }

    pub fn clear(&mut self) {
        let _g = self.reentrancy.enter("clear");
        self.tree.clear();
        self.len = 0;
    }

    /// Check every structural invariant of the tree and its buckets.
    ///
    /// This walks the whole map and calls the hash function on every stored
    /// key, so it is meant for tests and debugging.
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        let _g = self.reentrancy.enter("validate");
        let counted = check_tree(&self.tree, &self.hash_fn)?;
        if counted != self.len {
            return Err(InvariantViolation::LengthMismatch {
                recorded: self.len,
                counted,
            });
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn tree_node_count(&self) -> usize {
        self.tree.node_count()
    }
}

impl<K, V, H> fmt::Debug for RbHashMap<K, V, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RbHashMap")
            .field("len", &self.len)
            .field("nodes", &self.tree.node_count())
            .finish_non_exhaustive()
    }
}
