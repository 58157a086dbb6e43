#![cfg(test)]

// Property tests for OpenHashMap kept inside the crate so they can assert
// internal accounting (raw_slot_count) alongside the public surface.

use crate::open_hash_map::OpenHashMap;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hasher};

// Pool-indexed operations to improve shrinking: indices shrink to earlier
// keys, pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    Remove(usize),
    Find(usize),
    Contains(String),
    Mutate(usize, i32),
    Rehash(bool),
    Clear,
    Iterate,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            2 => idx.clone().prop_map(OpI::Remove),
            2 => idx.clone().prop_map(OpI::Find),
            1 => prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => any::<bool>().prop_map(OpI::Rehash),
            1 => Just(OpI::Clear),
            1 => Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

// State-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - Round-trip: `find` returns the latest inserted value per key; inserting
//   an existing key updates in place without changing `len`.
// - `remove` returns exactly what the model removes; absent keys are `None`.
// - `iter` yields each live entry exactly once, equal to the model contents.
// - After each op: `len`/`is_empty` parity with the model, power-of-two
//   capacity at or above the 128 floor, `raw_slot_count >= len`, and the
//   load-factor bound `raw_slot_count * 100 < capacity * 70`.
// - After `rehash` (either flavor): all tombstones reclaimed.
fn run_scenario<S>(
    sut: &mut OpenHashMap<String, i32, S>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError>
where
    S: BuildHasher,
{
    let mut model: HashMap<String, i32> = HashMap::new();

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = pool[i].clone();
                let stored = sut.insert(k.clone(), v);
                prop_assert_eq!(*stored, v);
                model.insert(k, v);
            }
            OpI::Remove(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.remove(k), model.remove(k));
                prop_assert!(sut.find(k).is_none());
            }
            OpI::Find(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.find(k), model.get(k));
                prop_assert_eq!(sut.contains_key(k), model.contains_key(k));
            }
            OpI::Contains(s) => {
                // Borrowed query: store String, look up &str.
                prop_assert_eq!(sut.contains_key(s.as_str()), model.contains_key(&s));
            }
            OpI::Mutate(i, d) => {
                let k = &pool[i];
                match (sut.find_mut(k), model.get_mut(k)) {
                    (Some(sv), Some(mv)) => {
                        *sv = sv.saturating_add(d);
                        *mv = mv.saturating_add(d);
                    }
                    (None, None) => {}
                    _ => prop_assert!(false, "find_mut disagrees with model"),
                }
            }
            OpI::Rehash(force) => {
                let cap = sut.capacity();
                sut.rehash(force);
                prop_assert_eq!(sut.capacity(), if force { cap * 2 } else { cap });
                prop_assert_eq!(sut.raw_slot_count(), sut.len(), "rehash must reclaim all tombstones");
            }
            OpI::Clear => {
                let cap = sut.capacity();
                sut.clear();
                model.clear();
                prop_assert_eq!(sut.capacity(), cap);
                prop_assert_eq!(sut.raw_slot_count(), 0);
            }
            OpI::Iterate => {
                let s_entries: BTreeMap<String, i32> =
                    sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                let m_entries: BTreeMap<String, i32> =
                    model.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(s_entries, m_entries);
            }
        }

        // Post-conditions after each op
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert!(sut.capacity().is_power_of_two());
        prop_assert!(sut.raw_slot_count() >= sut.len());
        prop_assert!(
            sut.raw_slot_count() * 100 < sut.capacity() * 70,
            "load-factor bound violated: {} written slots at capacity {}",
            sut.raw_slot_count(),
            sut.capacity()
        );
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let mut sut: OpenHashMap<String, i32> = OpenHashMap::new();
        prop_assert!(sut.capacity() >= 128);
        run_scenario(&mut sut, &pool, ops)?;
    }
}

// Collision variant using a constant hasher: every key lands on the same
// home slot, so the whole table is one probe chain. This stresses equality
// probing, tombstone skipping, and tombstone reuse.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        let mut sut: OpenHashMap<String, i32, ConstBuildHasher> =
            OpenHashMap::with_hasher(ConstBuildHasher);
        run_scenario(&mut sut, &pool, ops)?;
    }
}
