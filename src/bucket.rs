//! Collision bucket: every entry whose key shares one node's hash.
//!
//! The first key to arrive for a hash is the primary entry and is stored
//! inline. Later keys with the same hash go to the `overflow` map. A bucket
//! is never empty; taking its last entry is left to the tree, which must
//! unlink the node.

use core::hash::Hash;
use hashbrown::HashMap;

#[derive(Debug)]
pub(crate) struct Bucket<K, V> {
    key: K,
    value: V,
    overflow: HashMap<K, V>,
}

/// Outcome of `Bucket::take`.
#[derive(Debug)]
pub(crate) enum Take<K, V> {
    /// The entry was removed and the bucket still holds at least one entry.
    Taken(K, V),
    /// `key` is the only entry left; the node has to be unlinked.
    Last,
    Missing,
}

impl<K, V> Bucket<K, V>
where
    K: Eq + Hash,
{
    pub(crate) fn new(key: K, value: V) -> Self {
        Self {
            key,
            value,
            overflow: HashMap::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        1 + self.overflow.len()
    }

    pub(crate) fn get(&self, key: &K) -> Option<&V> {
        self.get_key_value(key).map(|(_, v)| v)
    }

    pub(crate) fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        if self.key == *key {
            Some((&self.key, &self.value))
        } else {
            self.overflow.get_key_value(key)
        }
    }

    pub(crate) fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        if self.key == *key {
            Some(&mut self.value)
        } else {
            self.overflow.get_mut(key)
        }
    }

    /// Insert or overwrite; returns the replaced value.
    pub(crate) fn insert(&mut self, key: K, value: V) -> Option<V> {
        if self.key == key {
            Some(core::mem::replace(&mut self.value, value))
        } else {
            self.overflow.insert(key, value)
        }
    }

    /// Remove `key` unless it is the bucket's last entry.
    ///
    /// Removing the primary key promotes an arbitrary overflow entry into
    /// the primary slot.
    pub(crate) fn take(&mut self, key: &K) -> Take<K, V> {
        if self.key != *key {
            return match self.overflow.remove_entry(key) {
                Some((k, v)) => Take::Taken(k, v),
                None => Take::Missing,
            };
        }
        let mut pick = true;
        let promoted = self
            .overflow
            .extract_if(|_, _| core::mem::take(&mut pick))
            .next();
        match promoted {
            Some((k, v)) => {
                let old_key = core::mem::replace(&mut self.key, k);
                let old_value = core::mem::replace(&mut self.value, v);
                Take::Taken(old_key, old_value)
            }
            None => Take::Last,
        }
    }

    pub(crate) fn into_entry(self) -> (K, V) {
        debug_assert!(self.overflow.is_empty());
        (self.key, self.value)
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = &K> {
        core::iter::once(&self.key).chain(self.overflow.keys())
    }

    /// True when the primary key also appears in the overflow map.
    pub(crate) fn primary_shadowed(&self) -> bool {
        self.overflow.contains_key(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant: the first key is primary; a second key lands in overflow and
    /// both stay reachable.
    #[test]
    fn second_key_goes_to_overflow() {
        let mut b = Bucket::new("a", 1);
        assert_eq!(b.insert("b", 2), None);
        assert_eq!(b.len(), 2);
        assert_eq!(b.get(&"a"), Some(&1));
        assert_eq!(b.get(&"b"), Some(&2));
        assert_eq!(b.get(&"c"), None);
        assert!(!b.primary_shadowed());
    }

    /// Invariant: inserting an existing key overwrites in place, primary or not.
    #[test]
    fn overwrite_returns_previous_value() {
        let mut b = Bucket::new("a", 1);
        b.insert("b", 2);
        assert_eq!(b.insert("a", 10), Some(1));
        assert_eq!(b.insert("b", 20), Some(2));
        assert_eq!(b.len(), 2);
        assert_eq!(b.get(&"a"), Some(&10));
        assert_eq!(b.get(&"b"), Some(&20));
    }

    /// Invariant: taking the primary key promotes an overflow entry so the bucket
    /// stays populated.
    #[test]
    fn taking_primary_promotes_overflow_entry() {
        let mut b = Bucket::new("a", 1);
        b.insert("b", 2);
        b.insert("c", 3);
        match b.take(&"a") {
            Take::Taken(k, v) => assert_eq!((k, v), ("a", 1)),
            other => panic!("unexpected take result: {:?}", other),
        }
        assert_eq!(b.len(), 2);
        assert_eq!(b.get(&"a"), None);
        assert_eq!(b.get(&"b"), Some(&2));
        assert_eq!(b.get(&"c"), Some(&3));
        assert!(!b.primary_shadowed());
    }

    #[test]
    fn take_overflow_and_missing() {
        let mut b = Bucket::new("a", 1);
        b.insert("b", 2);
        assert!(matches!(b.take(&"b"), Take::Taken("b", 2)));
        assert!(matches!(b.take(&"b"), Take::Missing));
        assert!(matches!(b.take(&"zzz"), Take::Missing));
        assert_eq!(b.len(), 1);
    }

    /// Invariant: the last entry is never taken by the bucket itself.
    #[test]
    fn last_entry_is_left_for_the_tree() {
        let mut b = Bucket::new("a", 1);
        assert!(matches!(b.take(&"a"), Take::Last));
        assert_eq!(b.get(&"a"), Some(&1));
        assert_eq!(b.into_entry(), ("a", 1));
    }

    #[test]
    fn get_mut_and_keys() {
        let mut b = Bucket::new(1u8, "x".to_string());
        b.insert(2, "y".to_string());
        b.get_mut(&2).unwrap().push('!');
        assert_eq!(b.get(&2).map(String::as_str), Some("y!"));
        let mut keys: Vec<u8> = b.keys().copied().collect();
        keys.sort();
        assert_eq!(keys, vec![1, 2]);
        assert_eq!(b.get_key_value(&1), Some((&1, &"x".to_string())));
    }
}
