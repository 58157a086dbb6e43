//! open-hashmap: an associative container built on open addressing with
//! linear probing and tombstone-based deletion.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: keep the whole table in one contiguous bucket array and make every
//!   layer small enough to reason about independently.
//! - Layers:
//!   - `bucket::BucketArray<K, V>`: exclusively-owned power-of-two storage;
//!     each slot is `Free`, `Occupied`, or `Tombstone`. Also owns the linear
//!     probe order (`ProbeSeq`): home slot from `hash & (capacity - 1)`,
//!     +1 step, wraparound, every index visited exactly once.
//!   - `OpenHashMap<K, V, S>`: public API; decides what goes in which slot,
//!     tracks occupancy, and replaces the array wholesale on growth.
//!
//! Invariants
//! - Capacity is always a power of two and never below the configured floor
//!   (default 128).
//! - `raw_slot_count()` counts slots written since the last rehash, live and
//!   tombstoned alike; `len()` is that minus tombstones. Growth runs before
//!   any insert that would bring the written share to or past the load
//!   factor threshold (default 70%), so after every insert
//!   `raw_slot_count * 100 < capacity * load_factor` holds. A full probe
//!   wraparound during insert is therefore a defect, not a runtime condition.
//! - An insert probe never claims a tombstone before the chain has been
//!   scanned to a free bucket: a live entry for the same key further along
//!   the chain must be found and updated, never shadowed by a duplicate.
//! - Each occupied bucket stores its precomputed `u64` hash and rehashing
//!   indexes by it, so `K: Hash` is never invoked after insertion.
//!
//! Deletion
//! - `remove` flips the bucket to `Tombstone` and leaves the slot allocated;
//!   lookups probe through tombstones. Reclamation is deferred to the next
//!   rehash (growth, or `rehash(false)` for same-capacity compaction).
//!
//! Borrowing and invalidation
//! - `insert`/`find`/`find_mut` return borrows into the bucket array. Growth
//!   and rehash reallocate that array, but both need `&mut self`, so the
//!   borrow checker statically rules out a stale reference or iterator
//!   surviving a structural mutation.
//!
//! Hasher policy
//! - Pluggable via `S: BuildHasher` (default `RandomState`), injected with
//!   `with_hasher`; lookups accept borrowed key forms via `K: Borrow<Q>`.
//!
//! Notes and non-goals
//! - Single-threaded data structure: no internal locking; wrap it externally
//!   for concurrent use.
//! - No persistence or serialization; no chaining; no immediate slot
//!   reclamation on delete.
//! - Load factor and capacity floor are fixed at construction (`Config`).

mod bucket;
mod open_hash_map;
mod open_hash_map_proptest;

// Public surface
pub use open_hash_map::{Config, Iter, IterMut, OpenHashMap};
