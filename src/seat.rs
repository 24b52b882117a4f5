//! The seat record and its public, read-only projection.

use std::time::{SystemTime, UNIX_EPOCH};

/// Lifecycle state of a seat. See SPEC_FULL.md §3 / §4.2 for the full
/// transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatStatus {
    Available,
    Held,
    Sold,
    /// Distinct from `Available` for auditing; produced only when
    /// [`crate::config::EngineConfig::refund_marks_refunded`] is set, or
    /// when a seat is seeded directly into this state.
    Refunded,
}

/// Composite key identifying a seat: `(event_id, seat_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeatKey {
    pub event_id: String,
    pub seat_id: String,
}

impl SeatKey {
    pub fn new(event_id: impl Into<String>, seat_id: impl Into<String>) -> Self {
        SeatKey { event_id: event_id.into(), seat_id: seat_id.into() }
    }
}

/// The seat record stored in the seat map.
///
/// Invariants (enforced by [`crate::engine::ReservationEngine`], not by this
/// type itself — a bare `Seat` can be constructed in any combination of
/// fields, e.g. for seeding or for tests):
///
/// 1. Exactly one seat record exists per `(event_id, seat_id)` in the map.
/// 2. `status == Held` ⇒ `holder_user_id` non-empty, `hold_token` non-empty,
///    `hold_expires_unix > 0`.
/// 3. `status` ∈ `{Available, Sold, Refunded}` ⇒ `holder_user_id` empty,
///    `hold_token` empty, `hold_expires_unix == 0`.
/// 4. `status == Sold` ⇒ `last_order_id` non-empty.
/// 5. A hold token is unique across all `Held` seats.
/// 6. `version` strictly increases per seat across all successful mutations.
#[derive(Debug, Clone, PartialEq)]
pub struct Seat {
    pub event_id: String,
    pub seat_id: String,

    /// Cached UI hint; authoritative price is resolved at confirm time via
    /// [`crate::price::PriceSource`].
    pub price_cents: i32,

    pub status: SeatStatus,

    /// Non-empty iff `status == Held`.
    pub holder_user_id: String,
    /// `> 0` iff `status == Held`.
    pub hold_expires_unix: i64,
    /// Non-empty iff `status == Held`.
    pub hold_token: Vec<u8>,

    /// Set on successful confirm; preserved through refund.
    pub last_order_id: String,

    /// Monotonic counter, incremented on every mutation.
    pub version: u64,
    /// Epoch seconds of the last in-memory mutation.
    pub updated_unix: i64,
}

impl Seat {
    /// A freshly seeded, available seat with no holder, no order, version 0.
    pub fn new(event_id: impl Into<String>, seat_id: impl Into<String>, price_cents: i32) -> Self {
        Seat {
            event_id: event_id.into(),
            seat_id: seat_id.into(),
            price_cents,
            status: SeatStatus::Available,
            holder_user_id: String::new(),
            hold_expires_unix: 0,
            hold_token: Vec::new(),
            last_order_id: String::new(),
            version: 0,
            updated_unix: now_unix(),
        }
    }

    pub fn key(&self) -> SeatKey {
        SeatKey::new(self.event_id.clone(), self.seat_id.clone())
    }

    /// Clears every hold-specific field. Does not touch `status`.
    pub fn clear_hold_fields(&mut self) {
        self.holder_user_id.clear();
        self.hold_token.clear();
        self.hold_expires_unix = 0;
    }

    /// `true` iff this seat is currently held and the hold has expired as of
    /// `now`.
    pub fn hold_expired(&self, now: i64) -> bool {
        self.status == SeatStatus::Held && self.hold_expires_unix > 0 && now >= self.hold_expires_unix
    }

    /// Bumps `version` and stamps `updated_unix`. Call after every mutation
    /// that is written back into the seat map.
    pub fn touch(&mut self, now: i64) {
        self.version += 1;
        self.updated_unix = now;
    }

    pub fn to_view(&self) -> SeatView {
        SeatView {
            event_id: self.event_id.clone(),
            seat_id: self.seat_id.clone(),
            price_cents: self.price_cents,
            status: self.status,
            holder_user_id: if self.status == SeatStatus::Held { Some(self.holder_user_id.clone()) } else { None },
            hold_expires_unix: if self.status == SeatStatus::Held { Some(self.hold_expires_unix) } else { None },
        }
    }
}

/// Read-only projection returned to callers by
/// [`crate::engine::ReservationEngine::seat_get`]. Holder and expiry are only
/// populated while `status == Held`.
#[derive(Debug, Clone, PartialEq)]
pub struct SeatView {
    pub event_id: String,
    pub seat_id: String,
    pub price_cents: i32,
    pub status: SeatStatus,
    pub holder_user_id: Option<String>,
    pub hold_expires_unix: Option<i64>,
}

/// Current epoch seconds. Centralized here so `engine.rs`/`seat_map.rs` never
/// reach for `SystemTime` directly.
pub fn now_unix() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_seat_is_available_with_no_hold() {
        let s = Seat::new("EV1", "S01", 2500);
        assert_eq!(s.status, SeatStatus::Available);
        assert!(s.holder_user_id.is_empty());
        assert_eq!(s.hold_expires_unix, 0);
        assert_eq!(s.version, 0);
    }

    #[test]
    fn hold_expired_is_false_outside_held() {
        let s = Seat::new("EV1", "S01", 2500);
        assert!(!s.hold_expired(now_unix() + 1000));
    }

    #[test]
    fn hold_expired_true_past_expiry() {
        let mut s = Seat::new("EV1", "S01", 2500);
        s.status = SeatStatus::Held;
        s.hold_expires_unix = 100;
        assert!(s.hold_expired(100));
        assert!(s.hold_expired(200));
        assert!(!s.hold_expired(99));
    }

    #[test]
    fn to_view_hides_holder_unless_held() {
        let mut s = Seat::new("EV1", "S01", 2500);
        s.holder_user_id = "U1".to_string();
        let v = s.to_view();
        assert!(v.holder_user_id.is_none());

        s.status = SeatStatus::Held;
        let v = s.to_view();
        assert_eq!(v.holder_user_id.as_deref(), Some("U1"));
    }

    #[test]
    fn touch_increments_version() {
        let mut s = Seat::new("EV1", "S01", 2500);
        s.touch(123);
        assert_eq!(s.version, 1);
        assert_eq!(s.updated_unix, 123);
        s.touch(124);
        assert_eq!(s.version, 2);
    }
}
