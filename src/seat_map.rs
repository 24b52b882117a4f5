//! Fixed-capacity, chained-hash seat map with per-seat locking.
//!
//! Ported from `examples/original_source/src/hashtable.c`: the capacity is
//! fixed at construction (no rehashing), buckets are chains of entries, and
//! each entry carries its own lock. The Rust shape follows the teacher's
//! `resource/resource_store.rs` / `reservation/reservation_store.rs`: a
//! cheap `Clone`-able handle around `Arc<Inner>`, with a `RwLock` per bucket
//! guarding the chain's structure and a `Mutex` per entry guarding payload
//! mutation.
//!
//! Rust has no equivalent of `seat_map_lock`/`seat_map_unlock` returning a
//! bare success flag while leaving a lock held across an arbitrary later
//! call — that pattern relies on the caller remembering to unlock, which is
//! exactly the class of bug the borrow checker exists to prevent. Instead,
//! [`SeatMap::with_seat`] takes the per-entry lock for the duration of a
//! closure and releases it on return, which is the RAII-safe equivalent of
//! the C API's lock/mutate/unlock sequence.

use std::sync::{Arc, Mutex, RwLock};

use crate::hash::mix_key;
use crate::seat::{Seat, SeatStatus};

struct SeatEntry {
    event_id: String,
    seat_id: String,
    seat: Mutex<Seat>,
}

impl SeatEntry {
    fn matches(&self, event_id: &str, seat_id: &str) -> bool {
        self.event_id == event_id && self.seat_id == seat_id
    }
}

struct Inner {
    capacity: usize,
    buckets: Vec<RwLock<Vec<Arc<SeatEntry>>>>,
}

/// A concurrent map from `(event_id, seat_id)` to [`Seat`].
///
/// Cheap to clone: clones share the same underlying table via `Arc`.
#[derive(Clone)]
pub struct SeatMap {
    inner: Arc<Inner>,
}

impl SeatMap {
    /// Creates a seat map with the given bucket count. The capacity never
    /// changes; it is the caller's responsibility to size it for the
    /// expected seat count (see `EngineConfig::seat_map_capacity`).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut buckets = Vec::with_capacity(capacity);
        for _ in 0..capacity {
            buckets.push(RwLock::new(Vec::new()));
        }
        SeatMap { inner: Arc::new(Inner { capacity, buckets }) }
    }

    fn bucket_index(&self, event_id: &str, seat_id: &str) -> usize {
        (mix_key(event_id, seat_id) as usize) % self.inner.capacity
    }

    /// Locks a single entry's seat, recovering rather than panicking if a
    /// prior holder of this mutex panicked mid-mutation — a poisoned entry
    /// lock must not take down every other seat's callers.
    fn lock_entry(entry: &Arc<SeatEntry>) -> std::sync::MutexGuard<'_, Seat> {
        entry.seat.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    /// Inserts a new seat, or overwrites an existing one with the same key
    /// in place (preserving the existing entry's mutex identity — the same
    /// guarantee the C implementation's `seat_map_put` makes by mutating
    /// `curr->seat` rather than relinking).
    ///
    /// New entries are prepended to their bucket's chain, matching the
    /// original's insertion-order-reversed tie-break.
    pub fn put(&self, seat: Seat) {
        let idx = self.bucket_index(&seat.event_id, &seat.seat_id);
        let bucket = &self.inner.buckets[idx];

        // Fast path: existing entry, payload-only mutation under its own
        // mutex while only holding a read lock on the bucket's structure.
        {
            let chain = bucket.read().unwrap_or_else(|poison| poison.into_inner());
            if let Some(entry) = chain.iter().find(|e| e.matches(&seat.event_id, &seat.seat_id)) {
                *Self::lock_entry(entry) = seat;
                return;
            }
        }

        // Slow path: no existing entry. Re-check under the write lock in
        // case another thread inserted the same key concurrently (seeding
        // is expected to be single-threaded, but this keeps `put` correct
        // even if called concurrently with itself).
        let mut chain = bucket.write().unwrap_or_else(|poison| poison.into_inner());
        if let Some(entry) = chain.iter().find(|e| e.matches(&seat.event_id, &seat.seat_id)) {
            *Self::lock_entry(entry) = seat;
            return;
        }
        let entry = Arc::new(SeatEntry { event_id: seat.event_id.clone(), seat_id: seat.seat_id.clone(), seat: Mutex::new(seat) });
        chain.insert(0, entry);
    }

    /// Copies out the seat's current record, if present.
    pub fn get(&self, event_id: &str, seat_id: &str) -> Option<Seat> {
        let idx = self.bucket_index(event_id, seat_id);
        let chain = self.inner.buckets[idx].read().unwrap_or_else(|poison| poison.into_inner());
        chain.iter().find(|e| e.matches(event_id, seat_id)).map(|e| Self::lock_entry(e).clone())
    }

    /// Removes a seat entirely. Returns `true` if it was present.
    pub fn delete(&self, event_id: &str, seat_id: &str) -> bool {
        let idx = self.bucket_index(event_id, seat_id);
        let mut chain = self.inner.buckets[idx].write().unwrap_or_else(|poison| poison.into_inner());
        let before = chain.len();
        chain.retain(|e| !e.matches(event_id, seat_id));
        chain.len() != before
    }

    /// Acquires the per-seat lock and runs `f` against the seat record,
    /// writing back whatever `f` leaves in place. Returns `None` if no seat
    /// exists for this key (the Rust equivalent of `seat_map_lock` failing
    /// because the entry is absent).
    ///
    /// This is the single place all engine operations mutate a seat through
    /// — it closes the TOCTOU window between reading a seat and acting on
    /// it, because the lock is held for the entire closure.
    pub fn with_seat<R>(&self, event_id: &str, seat_id: &str, f: impl FnOnce(&mut Seat) -> R) -> Option<R> {
        let idx = self.bucket_index(event_id, seat_id);
        let entry = {
            let chain = self.inner.buckets[idx].read().unwrap_or_else(|poison| poison.into_inner());
            chain.iter().find(|e| e.matches(event_id, seat_id)).cloned()
        }?;
        let mut guard = Self::lock_entry(&entry);
        Some(f(&mut guard))
    }

    /// Linear scan over every bucket for a `Held` seat whose token matches.
    /// Unsynchronized against concurrent mutation by design (see
    /// SPEC_FULL.md §9): callers must re-validate under
    /// [`SeatMap::with_seat`] before acting on the result.
    pub fn find_by_token(&self, token: &[u8]) -> Option<Seat> {
        if token.is_empty() {
            return None;
        }
        for bucket in &self.inner.buckets {
            let chain = bucket.read().unwrap_or_else(|poison| poison.into_inner());
            for entry in chain.iter() {
                let seat = Self::lock_entry(entry);
                if seat.status == SeatStatus::Held && seat.hold_token == token {
                    return Some(seat.clone());
                }
            }
        }
        None
    }

    /// Number of buckets this map was created with.
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn put_then_get_round_trips() {
        let map = SeatMap::new(16);
        map.put(Seat::new("EV1", "S01", 2500));
        let seat = map.get("EV1", "S01").expect("seat present");
        assert_eq!(seat.price_cents, 2500);
    }

    #[test]
    fn get_missing_seat_is_none() {
        let map = SeatMap::new(16);
        assert!(map.get("EV1", "S01").is_none());
    }

    #[test]
    fn put_overwrites_existing_entry() {
        let map = SeatMap::new(16);
        map.put(Seat::new("EV1", "S01", 2500));
        map.put(Seat::new("EV1", "S01", 3000));
        assert_eq!(map.get("EV1", "S01").unwrap().price_cents, 3000);
    }

    #[test]
    fn delete_removes_entry() {
        let map = SeatMap::new(16);
        map.put(Seat::new("EV1", "S01", 2500));
        assert!(map.delete("EV1", "S01"));
        assert!(map.get("EV1", "S01").is_none());
        assert!(!map.delete("EV1", "S01"));
    }

    #[test]
    fn with_seat_on_missing_key_is_none() {
        let map = SeatMap::new(16);
        assert!(map.with_seat("EV1", "S01", |s| s.price_cents).is_none());
    }

    #[test]
    fn find_by_token_matches_held_seat_only() {
        let map = SeatMap::new(16);
        let mut seat = Seat::new("EV1", "S01", 2500);
        seat.status = SeatStatus::Held;
        seat.hold_token = vec![7u8; 32];
        map.put(seat);
        assert!(map.find_by_token(&[7u8; 32]).is_some());
        assert!(map.find_by_token(&[8u8; 32]).is_none());
    }

    #[test]
    fn find_by_token_ignores_non_held_seats_with_stale_token() {
        let map = SeatMap::new(16);
        let mut seat = Seat::new("EV1", "S01", 2500);
        seat.hold_token = vec![7u8; 32]; // leftover bytes, status not Held
        map.put(seat);
        assert!(map.find_by_token(&[7u8; 32]).is_none());
    }

    #[test]
    fn distinct_keys_hash_into_independent_buckets_eventually() {
        // Not a strict invariant (collisions are fine), but a basic spread
        // sanity check: inserting many distinct seats should not all land in
        // bucket 0.
        let map = SeatMap::new(64);
        for i in 0..200 {
            map.put(Seat::new("EV1", format!("S{i}"), 1000));
        }
        let idx0 = map.bucket_index("EV1", "S0");
        let idx1 = map.bucket_index("EV1", "S1");
        assert!(idx0 != idx1 || map.capacity() == 1);
    }

    /// Four threads hammer the same seat's `price_cents` through
    /// `with_seat`, 10,000 increments each. If the per-entry mutex actually
    /// serializes payload mutation, the final value is exact.
    #[test]
    fn concurrent_increments_under_per_seat_lock_are_not_lost() {
        let map = SeatMap::new(16);
        map.put(Seat::new("EV4", "S04", 0));

        const THREADS: usize = 4;
        const ITERS: usize = 10_000;
        let barrier = Arc::new(Barrier::new(THREADS));

        thread::scope(|scope| {
            for _ in 0..THREADS {
                let map = map.clone();
                let barrier = barrier.clone();
                scope.spawn(move || {
                    barrier.wait();
                    for _ in 0..ITERS {
                        map.with_seat("EV4", "S04", |s| {
                            s.price_cents += 1;
                        });
                    }
                });
            }
        });

        assert_eq!(map.get("EV4", "S04").unwrap().price_cents, (THREADS * ITERS) as i32);
    }
}
