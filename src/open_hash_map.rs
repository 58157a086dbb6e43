//! OpenHashMap: probing, growth, and tombstone accounting over `BucketArray`.

use crate::bucket::{Bucket, BucketArray, Slot};
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use core::mem;
use std::collections::hash_map::RandomState;

/// Table policy, fixed at construction time.
///
/// `load_factor_percent` is the growth threshold: an insert that would bring
/// written slots (live + tombstones) to or past this share of capacity grows
/// the table first. `min_capacity` is the floor the bucket array never sits
/// below; it is rounded up to a power of two.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    pub load_factor_percent: usize,
    pub min_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            load_factor_percent: 70,
            min_capacity: 128,
        }
    }
}

/// An associative container using open addressing with linear probing.
///
/// All entries live in one contiguous power-of-two bucket array. Collisions
/// resolve by walking forward (with wraparound) from the home slot. Removal
/// leaves a tombstone; the slot stays allocated until the next rehash
/// reclaims it. Growth swaps in a fresh array and reinserts live entries by
/// their stored hashes, so user `Hash` code never runs during a rehash.
///
/// References returned by `insert`/`find`/`find_mut` borrow from the map, so
/// the borrow checker enforces that they die before the next structural
/// mutation (which may reallocate the bucket array).
pub struct OpenHashMap<K, V, S = RandomState> {
    hasher: S,
    buckets: BucketArray<K, V>,
    // Slots written since the last rehash, live and tombstoned alike.
    occupied: usize,
    tombstones: usize,
    load_factor_percent: usize,
    min_capacity: usize,
}

/// Where an insert probe landed.
enum InsertSlot {
    /// An occupied bucket already holds this key; overwrite in place.
    Existing(usize),
    /// No live entry for the key anywhere along the probe chain; claim this
    /// slot (the first tombstone seen, or the terminating free bucket).
    Vacant { idx: usize, reclaims_tombstone: bool },
}

impl<K, V> OpenHashMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(RandomState::default())
    }

    /// Create a table sized for `capacity` slots up front (rounded up to a
    /// power of two, clamped to the configured floor).
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, RandomState::default())
    }
}

impl<K, V> Default for OpenHashMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> OpenHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_capacity_and_hasher(0, hasher)
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self::with_config_and_hasher(capacity, Config::default(), hasher)
    }

    /// Construct with explicit policy. Panics on a nonsensical `Config`
    /// (load factor outside `1..=99`, zero floor); bad policy is
    /// construction-time misuse, not a runtime condition.
    pub fn with_config_and_hasher(capacity: usize, config: Config, hasher: S) -> Self {
        assert!(
            (1..=99).contains(&config.load_factor_percent),
            "load_factor_percent must be within 1..=99"
        );
        assert!(config.min_capacity > 0, "min_capacity must be nonzero");

        let floor = config.min_capacity.next_power_of_two();
        let capacity = capacity.max(floor).next_power_of_two();
        Self {
            hasher,
            buckets: BucketArray::new(capacity),
            occupied: 0,
            tombstones: 0,
            load_factor_percent: config.load_factor_percent,
            min_capacity: floor,
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.occupied - self.tombstones
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of slots written since the last rehash: live entries plus
    /// tombstones awaiting reclamation.
    pub fn raw_slot_count(&self) -> usize {
        self.occupied
    }

    /// Current bucket array length. Always a power of two, never below the
    /// configured floor.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    /// Would writing one more slot reach the load-factor threshold?
    fn should_grow(&self) -> bool {
        (self.occupied + 1) * 100 >= self.buckets.len() * self.load_factor_percent
    }

    /// Insert or overwrite `key`, returning a borrow of the stored value.
    /// The borrow ends before any later structural mutation can run.
    pub fn insert(&mut self, key: K, value: V) -> &mut V {
        if self.should_grow() {
            self.grow();
        }

        let hash = self.make_hash(&key);
        let idx = match self.probe_for_insert(hash, &key) {
            InsertSlot::Existing(idx) => {
                match self.buckets.get_mut(idx) {
                    Bucket::Occupied(slot) => slot.value = value,
                    _ => unreachable!("insert probe resolved to a non-occupied slot"),
                }
                idx
            }
            InsertSlot::Vacant {
                idx,
                reclaims_tombstone,
            } => {
                let prev = self.buckets.replace(idx, Bucket::Occupied(Slot { key, value, hash }));
                if reclaims_tombstone {
                    debug_assert!(matches!(prev, Bucket::Tombstone));
                    // The slot was already counted in `occupied`.
                    self.tombstones -= 1;
                } else {
                    debug_assert!(matches!(prev, Bucket::Free));
                    self.occupied += 1;
                }
                idx
            }
        };

        match self.buckets.get_mut(idx) {
            Bucket::Occupied(slot) => &mut slot.value,
            _ => unreachable!("slot just written by insert must be occupied"),
        }
    }

    /// Probe for the slot an insert of `key` should write.
    ///
    /// The scan must not stop at the first tombstone: a live entry for the
    /// same key may sit further along the chain, and claiming the tombstone
    /// early would shadow it with a duplicate. Instead the first reusable
    /// slot is remembered and only claimed once a free bucket proves no live
    /// match exists.
    fn probe_for_insert(&self, hash: u64, key: &K) -> InsertSlot {
        let mut reusable: Option<usize> = None;
        for idx in self.buckets.probe(hash) {
            match self.buckets.get(idx) {
                Bucket::Free => {
                    return match reusable {
                        Some(idx) => InsertSlot::Vacant {
                            idx,
                            reclaims_tombstone: true,
                        },
                        None => InsertSlot::Vacant {
                            idx,
                            reclaims_tombstone: false,
                        },
                    };
                }
                Bucket::Tombstone => {
                    if reusable.is_none() {
                        reusable = Some(idx);
                    }
                }
                Bucket::Occupied(slot) => {
                    if slot.key == *key {
                        return InsertSlot::Existing(idx);
                    }
                }
            }
        }
        // Unreachable while growth precedes every threshold-crossing insert.
        panic!("insert probe wrapped around without a free bucket; load-factor growth invariant violated");
    }

    /// Walk the probe chain for `q`; tombstones are skipped, a free bucket
    /// (or full wraparound) means not present.
    fn lookup_index<Q>(&self, hash: u64, q: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        for idx in self.buckets.probe(hash) {
            match self.buckets.get(idx) {
                Bucket::Free => return None,
                Bucket::Tombstone => {}
                Bucket::Occupied(slot) => {
                    if slot.key.borrow() == q {
                        return Some(idx);
                    }
                }
            }
        }
        None
    }

    pub fn find<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let idx = self.lookup_index(self.make_hash(q), q)?;
        match self.buckets.get(idx) {
            Bucket::Occupied(slot) => Some(&slot.value),
            _ => unreachable!("lookup resolved to a non-occupied slot"),
        }
    }

    pub fn find_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let idx = self.lookup_index(self.make_hash(q), q)?;
        match self.buckets.get_mut(idx) {
            Bucket::Occupied(slot) => Some(&mut slot.value),
            _ => unreachable!("lookup resolved to a non-occupied slot"),
        }
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(q).is_some()
    }

    /// Remove `q`, returning the owned entry. Absent key is a soft negative,
    /// not an error. The slot becomes a tombstone and stays allocated (still
    /// counted by `raw_slot_count`) until a rehash reclaims it.
    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let idx = self.lookup_index(self.make_hash(q), q)?;
        match self.buckets.replace(idx, Bucket::Tombstone) {
            Bucket::Occupied(slot) => {
                self.tombstones += 1;
                Some((slot.key, slot.value))
            }
            _ => unreachable!("lookup resolved to a non-occupied slot"),
        }
    }

    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(q).map(|(_, v)| v)
    }

    /// Rehash every live entry into a fresh bucket array, discarding
    /// tombstones. With `force_growth` the capacity doubles; without it the
    /// capacity is kept and the rehash purely reclaims tombstoned slots.
    pub fn rehash(&mut self, force_growth: bool) {
        let target = if force_growth {
            self.buckets.len() * 2
        } else {
            self.buckets.len()
        };
        self.resize_rehash(target);
    }

    fn grow(&mut self) {
        // One doubling is not always enough: at a low threshold on a small
        // table (e.g. 1% of 16 slots), `capacity * load_factor < 100` can
        // survive a single doubling. Pick the smallest power of two that
        // clears the growth predicate for the prospective write.
        let mut target = self.buckets.len() * 2;
        while (self.occupied + 1) * 100 >= target * self.load_factor_percent {
            target *= 2;
        }
        self.resize_rehash(target);
    }

    fn resize_rehash(&mut self, new_capacity: usize) {
        debug_assert!(new_capacity.is_power_of_two());
        debug_assert!(new_capacity >= self.min_capacity);

        let old = mem::replace(&mut self.buckets, BucketArray::new(new_capacity));
        self.occupied = 0;
        self.tombstones = 0;
        for bucket in old {
            if let Bucket::Occupied(slot) = bucket {
                // Stored hash; no user code runs here. The fresh array holds
                // no tombstones and no duplicate keys, so the first free
                // bucket on the chain is the entry's slot.
                let idx = self.first_free_slot(slot.hash);
                self.buckets.replace(idx, Bucket::Occupied(slot));
                self.occupied += 1;
            }
        }
    }

    fn first_free_slot(&self, hash: u64) -> usize {
        for idx in self.buckets.probe(hash) {
            if matches!(self.buckets.get(idx), Bucket::Free) {
                return idx;
            }
        }
        panic!("rehash probe wrapped around without a free bucket; load-factor growth invariant violated");
    }

    /// Reset every bucket to free and the counters to zero. Capacity is
    /// unchanged; no reallocation happens.
    pub fn clear(&mut self) {
        self.buckets.reset();
        self.occupied = 0;
        self.tombstones = 0;
    }

    /// Iterate live entries in bucket-array physical order (not insertion
    /// order). A fresh call restarts the traversal.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.buckets.as_slice().iter(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            inner: self.buckets.as_mut_slice().iter_mut(),
        }
    }

    /// Run `f` on every live entry; convenience wrapper over `iter`.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V),
    {
        for (k, v) in self.iter() {
            f(k, v);
        }
    }
}

/// Iterator over live entries in bucket-array physical order.
pub struct Iter<'a, K, V> {
    inner: core::slice::Iter<'a, Bucket<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Bucket::Occupied(slot) => return Some((&slot.key, &slot.value)),
                Bucket::Free | Bucket::Tombstone => {}
            }
        }
    }
}

/// Iterator over live entries yielding mutable value borrows.
pub struct IterMut<'a, K, V> {
    inner: core::slice::IterMut<'a, Bucket<K, V>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Bucket::Occupied(slot) => return Some((&slot.key, &mut slot.value)),
                Bucket::Free | Bucket::Tombstone => {}
            }
        }
    }
}
