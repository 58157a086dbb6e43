//! Bucket storage: the contiguous power-of-two array underneath `OpenHashMap`.
//!
//! `BucketArray` owns its slots exclusively; the map layer above decides what
//! goes where. Every slot carries a three-way state tag: `Free` (never
//! written since the last rehash), `Occupied` (live entry), `Tombstone`
//! (logically removed, physically allocated until a rehash reclaims it).
//! `ProbeSeq` walks the linear probe order for a hash: home slot from the low
//! hash bits, +1 step with wraparound, each index visited exactly once.

use core::mem;

/// A live entry together with its precomputed hash. Growth rehashing indexes
/// by the stored hash, so `K: Hash` is never invoked after insertion.
#[derive(Debug)]
pub(crate) struct Slot<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) hash: u64,
}

#[derive(Debug)]
pub(crate) enum Bucket<K, V> {
    Free,
    Tombstone,
    Occupied(Slot<K, V>),
}

/// Linear probe order over a power-of-two array: start at `hash & mask`,
/// advance by +1 with wraparound. Yields every index exactly once, so
/// exhaustion means the probe wrapped fully around to its start.
pub(crate) struct ProbeSeq {
    pos: usize,
    mask: usize,
    remaining: usize,
}

impl Iterator for ProbeSeq {
    type Item = usize;
    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let idx = self.pos;
        self.pos = (self.pos + 1) & self.mask;
        self.remaining -= 1;
        Some(idx)
    }
}

/// Exclusively-owned bucket storage of fixed power-of-two length. Allocated
/// all-`Free`; replaced wholesale on growth.
pub(crate) struct BucketArray<K, V> {
    slots: Box<[Bucket<K, V>]>,
}

impl<K, V> BucketArray<K, V> {
    pub(crate) fn new(capacity: usize) -> Self {
        debug_assert!(capacity.is_power_of_two());
        Self {
            slots: (0..capacity).map(|_| Bucket::Free).collect(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    fn mask(&self) -> usize {
        // Power-of-two length makes the mask equivalent to `hash % len`.
        self.slots.len() - 1
    }

    #[inline]
    pub(crate) fn probe(&self, hash: u64) -> ProbeSeq {
        ProbeSeq {
            pos: (hash as usize) & self.mask(),
            mask: self.mask(),
            remaining: self.slots.len(),
        }
    }

    #[inline]
    pub(crate) fn get(&self, idx: usize) -> &Bucket<K, V> {
        &self.slots[idx]
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, idx: usize) -> &mut Bucket<K, V> {
        &mut self.slots[idx]
    }

    /// Swap a new bucket into `idx`, returning what was there.
    pub(crate) fn replace(&mut self, idx: usize, bucket: Bucket<K, V>) -> Bucket<K, V> {
        mem::replace(&mut self.slots[idx], bucket)
    }

    /// Reset every slot to `Free`, dropping stored entries in place. Length
    /// is unchanged.
    pub(crate) fn reset(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = Bucket::Free;
        }
    }

    pub(crate) fn as_slice(&self) -> &[Bucket<K, V>] {
        &self.slots
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [Bucket<K, V>] {
        &mut self.slots
    }
}

impl<K, V> IntoIterator for BucketArray<K, V> {
    type Item = Bucket<K, V>;
    type IntoIter = std::vec::IntoIter<Bucket<K, V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.into_vec().into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant: a probe starts at the masked home slot and visits every
    /// index exactly once, wrapping around to the slots before the start.
    #[test]
    fn probe_visits_each_index_once_with_wraparound() {
        let arr: BucketArray<u32, u32> = BucketArray::new(8);
        let order: Vec<usize> = arr.probe(5).collect();
        assert_eq!(order, vec![5, 6, 7, 0, 1, 2, 3, 4]);
    }

    /// Invariant: the home slot is `hash & (len - 1)`, never `hash % (len - 1)`.
    #[test]
    fn home_slot_uses_bitmask_of_full_length() {
        let arr: BucketArray<u32, u32> = BucketArray::new(8);
        // 15 & 7 == 7; a mod-(len-1) reduction would start at 15 % 7 == 1.
        assert_eq!(arr.probe(15).next(), Some(7));
        // High bits beyond the mask are ignored.
        assert_eq!(arr.probe(8).next(), Some(0));
    }

    /// Invariant: a fresh array is all-`Free`, and `reset` returns a written
    /// array to that state without changing its length.
    #[test]
    fn new_and_reset_leave_all_slots_free() {
        let mut arr: BucketArray<u32, u32> = BucketArray::new(4);
        assert!(arr.as_slice().iter().all(|b| matches!(b, Bucket::Free)));

        arr.replace(
            2,
            Bucket::Occupied(Slot {
                key: 1,
                value: 2,
                hash: 3,
            }),
        );
        arr.replace(3, Bucket::Tombstone);
        arr.reset();
        assert_eq!(arr.len(), 4);
        assert!(arr.as_slice().iter().all(|b| matches!(b, Bucket::Free)));
    }
}
