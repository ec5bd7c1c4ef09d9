//! Key hashing: the `i64` sort key that places a node in the tree.

use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;

/// Maps a key to the signed 64-bit hash that orders the tree.
///
/// Implementations must be deterministic and return the same hash for equal
/// keys. They need not be collision-free; keys sharing a hash are kept in
/// the same node's collision bucket.
pub trait HashFn<K: ?Sized> {
    fn hash_key(&self, key: &K) -> i64;
}

impl<K: ?Sized, F> HashFn<K> for F
where
    F: Fn(&K) -> i64,
{
    #[inline]
    fn hash_key(&self, key: &K) -> i64 {
        self(key)
    }
}

/// Adapts a `BuildHasher` into a `HashFn` by reinterpreting its `u64`
/// output as `i64`.
#[derive(Clone, Debug, Default)]
pub struct BuildHasherFn<S = RandomState> {
    build: S,
}

impl<S> BuildHasherFn<S> {
    pub fn new(build: S) -> Self {
        Self { build }
    }

    pub fn build_hasher(&self) -> &S {
        &self.build
    }
}

impl<K, S> HashFn<K> for BuildHasherFn<S>
where
    K: ?Sized + Hash,
    S: BuildHasher,
{
    #[inline]
    fn hash_key(&self, key: &K) -> i64 {
        self.build.hash_one(key) as i64
    }
}
