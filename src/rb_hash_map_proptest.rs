#![cfg(test)]

// Property tests for RbHashMap kept inside the crate so they can look at
// the node arena as well as the public surface.

use crate::rb_hash_map::RbHashMap;
use proptest::prelude::*;
use std::collections::HashMap;

// Pool-indexed operations: indices shrink toward earlier keys and op lists
// shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    Remove(usize),
    Get(usize),
    Mutate(usize, i32),
    Clear,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<i64>, Vec<OpI>)> {
    proptest::collection::vec(-500i64..500, 1..=24).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            8 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            5 => idx.clone().prop_map(OpI::Remove),
            3 => idx.clone().prop_map(OpI::Get),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => Just(OpI::Clear),
        ];
        proptest::collection::vec(op, 1..120).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Runs `ops` against both the map and a std HashMap model. After every step:
// - the tree passes `validate` (red-black shape, hash order, buckets, len);
// - `len`/`is_empty` match the model;
// - the number of nodes equals the number of distinct hashes in the model.
fn run_state_machine<F>(hash_fn: F, pool: &[i64], ops: Vec<OpI>) -> Result<(), TestCaseError>
where
    F: Fn(&i64) -> i64,
{
    let mut sut = RbHashMap::new(&hash_fn);
    let mut model: HashMap<i64, i32> = HashMap::new();

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = pool[i];
                prop_assert_eq!(sut.insert(k, v), model.insert(k, v));
            }
            OpI::Remove(i) => {
                let k = pool[i];
                prop_assert_eq!(sut.remove_entry(&k), model.remove_entry(&k));
            }
            OpI::Get(i) => {
                let k = pool[i];
                prop_assert_eq!(sut.get(&k), model.get(&k));
                prop_assert_eq!(sut.contains_key(&k), model.contains_key(&k));
            }
            OpI::Mutate(i, d) => {
                let k = pool[i];
                match (sut.get_mut(&k), model.get_mut(&k)) {
                    (Some(s), Some(m)) => {
                        *s = s.wrapping_add(d);
                        *m = m.wrapping_add(d);
                    }
                    (None, None) => {}
                    (s, m) => {
                        prop_assert!(false, "get_mut disagrees: {:?} vs {:?}", s, m);
                    }
                }
            }
            OpI::Clear => {
                sut.clear();
                model.clear();
            }
        }

        if let Err(e) = sut.validate() {
            return Err(TestCaseError::fail(format!("invariant broken: {e}")));
        }
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        let mut hashes: Vec<i64> = model.keys().map(|k| hash_fn(k)).collect();
        hashes.sort_unstable();
        hashes.dedup();
        prop_assert_eq!(sut.tree_node_count(), hashes.len());
    }

    for (k, v) in &model {
        prop_assert_eq!(sut.get(k), Some(v));
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

    // Property: state-machine equivalence with nearly unique hashes, so the
    // workload is dominated by rotations and node splices.
    #[test]
    fn prop_state_machine_spread((pool, ops) in arb_scenario()) {
        run_state_machine(|k: &i64| k.wrapping_mul(0x9E37_79B9_7F4A_7C15u64 as i64), &pool, ops)?;
    }

    // Property: state-machine equivalence when many keys share a hash, so
    // bucket promotion and unlinking the last key of a hash interleave.
    #[test]
    fn prop_state_machine_colliding((pool, ops) in arb_scenario()) {
        run_state_machine(|k: &i64| k.div_euclid(7), &pool, ops)?;
    }

    // Property: inserting a set of keys and then removing all of them in a
    // shuffled order leaves an empty tree with every lookup missing.
    #[test]
    fn prop_remove_all_in_any_order(
        keys in proptest::collection::hash_set(-10_000i64..10_000, 0..300)
            .prop_map(|s| s.into_iter().collect::<Vec<_>>())
            .prop_shuffle()
    ) {
        let mut m = RbHashMap::new(|k: &i64| k / 3);
        for &k in &keys {
            m.insert(k, k.to_string());
        }
        prop_assert_eq!(m.len(), keys.len());
        m.validate().map_err(|e| TestCaseError::fail(e.to_string()))?;

        let mut removal = keys.clone();
        removal.reverse();
        removal.rotate_left(keys.len() / 2);
        for (n, k) in removal.iter().enumerate() {
            prop_assert_eq!(m.remove_entry(k), Some((*k, k.to_string())));
            prop_assert!(!m.remove(k));
            prop_assert_eq!(m.len(), keys.len() - n - 1);
            m.validate().map_err(|e| TestCaseError::fail(e.to_string()))?;
        }
        prop_assert_eq!(m.tree_node_count(), 0);
        for k in &keys {
            prop_assert_eq!(m.get(k), None);
        }
    }
}
