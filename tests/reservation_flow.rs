//! End-to-end scenarios against the public crate surface (SPEC_FULL.md §8).

use std::sync::{Arc, Barrier};
use std::thread;

use reservation_core::{EngineConfig, InMemoryOrderStore, NullPriceSource, ResCode, ReservationEngine, Seat, SeatStatus};

fn engine() -> ReservationEngine {
    ReservationEngine::new(EngineConfig::default(), Arc::new(InMemoryOrderStore::new()), Arc::new(NullPriceSource))
}

#[test]
fn full_lifecycle_hold_confirm_refund() {
    let engine = engine();
    engine.seed_seat(Seat::new("CONCERT", "A1", 8000));

    let hold = engine.place_hold("alice", "CONCERT", "A1");
    assert_eq!(hold.code, ResCode::Ok);
    assert!(!hold.hold_token.is_empty());

    let confirmed = engine.confirm_reservation(&hold.hold_token, hold.price_cents);
    assert_eq!(confirmed.code, ResCode::Ok);

    let view = engine.seat_get("CONCERT", "A1").unwrap();
    assert_eq!(view.status, SeatStatus::Sold);
    assert!(view.holder_user_id.is_none());

    assert_eq!(engine.refund("alice", &confirmed.order_id), ResCode::Ok);
    let view = engine.seat_get("CONCERT", "A1").unwrap();
    assert_eq!(view.status, SeatStatus::Available);
}

#[test]
fn second_user_cannot_hold_or_confirm_a_held_seat() {
    let engine = engine();
    engine.seed_seat(Seat::new("CONCERT", "A2", 5000));

    let hold = engine.place_hold("alice", "CONCERT", "A2");
    assert_eq!(hold.code, ResCode::Ok);

    assert_eq!(engine.place_hold("bob", "CONCERT", "A2").code, ResCode::HeldByOther);
    assert_eq!(engine.cancel_hold("bob", "CONCERT", "A2"), ResCode::HeldByOther);

    // Bob never held a valid token for this seat; confirming with garbage
    // bytes must not succeed no matter who asks.
    let forged = engine.confirm_reservation(&vec![0u8; 32], hold.price_cents);
    assert_eq!(forged.code, ResCode::InvalidToken);
}

#[test]
fn exactly_one_of_many_concurrent_holders_wins() {
    let engine = engine();
    engine.seed_seat(Seat::new("CONCERT", "A3", 100));

    const N: usize = 64;
    let barrier = Arc::new(Barrier::new(N));
    let codes: Vec<ResCode> = thread::scope(|scope| {
        let handles: Vec<_> = (0..N)
            .map(|i| {
                let engine = engine.clone();
                let barrier = barrier.clone();
                scope.spawn(move || {
                    barrier.wait();
                    engine.place_hold(&format!("user-{i}"), "CONCERT", "A3").code
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(codes.iter().filter(|&&c| c == ResCode::Ok).count(), 1);
    assert_eq!(codes.iter().filter(|&&c| c == ResCode::HeldByOther).count(), N - 1);
}

#[test]
fn cancelled_hold_closes_the_confirm_toctou_window() {
    let engine = engine();
    engine.seed_seat(Seat::new("CONCERT", "A4", 1500));

    let hold = engine.place_hold("alice", "CONCERT", "A4");
    assert_eq!(engine.cancel_hold("alice", "CONCERT", "A4"), ResCode::Ok);

    let confirmed = engine.confirm_reservation(&hold.hold_token, hold.price_cents);
    assert_eq!(confirmed.code, ResCode::InvalidToken);
    assert_eq!(engine.seat_get("CONCERT", "A4").unwrap().status, SeatStatus::Available);
}

#[test]
fn confirming_twice_with_the_same_token_is_idempotent() {
    let engine = engine();
    engine.seed_seat(Seat::new("CONCERT", "A5", 2000));

    let hold = engine.place_hold("alice", "CONCERT", "A5");
    let first = engine.confirm_reservation(&hold.hold_token, 2000);
    let second = engine.confirm_reservation(&hold.hold_token, 2000);

    assert_eq!(first.code, ResCode::Ok);
    assert_eq!(second.code, ResCode::Ok);
    assert_eq!(first.order_id, second.order_id);
}

#[test]
fn wrong_payment_amount_is_rejected_without_mutating_the_seat() {
    let engine = engine();
    engine.seed_seat(Seat::new("CONCERT", "A6", 3000));

    let hold = engine.place_hold("alice", "CONCERT", "A6");
    let result = engine.confirm_reservation(&hold.hold_token, 1);
    assert_eq!(result.code, ResCode::InternalErr);

    let view = engine.seat_get("CONCERT", "A6").unwrap();
    assert_eq!(view.status, SeatStatus::Held);
}

#[test]
fn seat_get_lazily_expires_a_stale_hold() {
    let engine = engine();
    let mut expired = Seat::new("CONCERT", "A7", 1200);
    expired.status = SeatStatus::Held;
    expired.holder_user_id = "alice".to_string();
    expired.hold_token = vec![5u8; 32];
    expired.hold_expires_unix = 1; // long past
    engine.seed_seat(expired);

    let view = engine.seat_get("CONCERT", "A7").unwrap();
    assert_eq!(view.status, SeatStatus::Available);
    assert!(view.holder_user_id.is_none());
}

#[test]
fn operations_on_an_unseeded_seat_report_not_found() {
    let engine = engine();
    assert_eq!(engine.place_hold("alice", "NOPE", "NOPE").code, ResCode::NotFound);
    assert_eq!(engine.cancel_hold("alice", "NOPE", "NOPE"), ResCode::NotFound);
    assert!(engine.seat_get("NOPE", "NOPE").is_none());
}

#[test]
fn refund_is_scoped_to_the_owning_user() {
    let engine = engine();
    engine.seed_seat(Seat::new("CONCERT", "A8", 4200));

    let hold = engine.place_hold("alice", "CONCERT", "A8");
    let confirmed = engine.confirm_reservation(&hold.hold_token, 4200);

    assert_eq!(engine.refund("mallory", &confirmed.order_id), ResCode::NotFound);
    assert_eq!(engine.seat_get("CONCERT", "A8").unwrap().status, SeatStatus::Sold);
    assert_eq!(engine.refund("alice", &confirmed.order_id), ResCode::Ok);
}
