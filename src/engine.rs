//! The reservation engine: the state-machine logic tying the seat map to
//! the order-store and price-source collaborators.
//!
//! Ported operation-by-operation from
//! `examples/original_source/src/reservation.c`
//! (`place_hold`, `confirm_reservation`, `cancel_hold`, `seat_get`,
//! `refund`). The orchestrating-struct shape (an owned value holding
//! `Arc`-backed collaborators, logging each transition) follows the
//! teacher's `domain/vrm_system_model/vrm_manager.rs`.

use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use crate::config::EngineConfig;
use crate::error::Error;
use crate::price::PriceSource;
use crate::random::generate_token;
use crate::result::{ConfirmResult, HoldResult, ResCode};
use crate::seat::{Seat, SeatStatus, SeatView, now_unix};
use crate::seat_map::SeatMap;
use crate::store::OrderStore;

/// The process-wide reservation core, collapsed per SPEC_FULL.md §9 from a
/// global-init/shutdown singleton into a constructed, owned value.
///
/// Cheap to clone: every field is `Arc`-backed or `Copy`, so clones share
/// the same seat map, collaborators, live-token set, and hold length.
#[derive(Clone)]
pub struct ReservationEngine {
    map: SeatMap,
    store: Arc<dyn OrderStore>,
    price_source: Arc<dyn PriceSource>,
    hold_length_secs: Arc<AtomicI64>,
    config: EngineConfig,
    /// Hold tokens currently bound to a live `Held` seat, used to detect and
    /// regenerate on collision (SPEC_FULL.md §4.3). Kept separate from the
    /// seat map itself so minting a token never needs to scan — and
    /// therefore never needs to lock — the very seat entry `place_hold` is
    /// already holding.
    live_tokens: Arc<Mutex<HashSet<Vec<u8>>>>,
}

impl ReservationEngine {
    pub fn new(config: EngineConfig, store: Arc<dyn OrderStore>, price_source: Arc<dyn PriceSource>) -> Self {
        ReservationEngine {
            map: SeatMap::new(config.seat_map_capacity),
            store,
            price_source,
            hold_length_secs: Arc::new(AtomicI64::new(config.hold_length_secs)),
            config,
            live_tokens: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Inserts or replaces a seat. External collaborator concern in
    /// production (seats are normally seeded from store-backed event
    /// configuration at startup) — exposed here because the core owns the
    /// seat map and tests need a way to populate it.
    pub fn seed_seat(&self, seat: Seat) {
        log::debug!("seed_seat: {}/{} status={:?}", seat.event_id, seat.seat_id, seat.status);
        if seat.status == SeatStatus::Held && !seat.hold_token.is_empty() {
            self.lock_tokens().insert(seat.hold_token.clone());
        }
        self.map.put(seat);
    }

    /// Adjusts the default hold length. Racy by design — intended for test
    /// seeding, not production tuning (SPEC_FULL.md §5).
    pub fn set_hold_length_secs(&self, secs: i64) {
        self.hold_length_secs.store(secs.max(0), Ordering::Relaxed);
    }

    fn lock_tokens(&self) -> std::sync::MutexGuard<'_, HashSet<Vec<u8>>> {
        self.live_tokens.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    fn mint_token(&self) -> Vec<u8> {
        let mut tokens = self.lock_tokens();
        loop {
            let candidate = generate_token(self.config.hold_token_len);
            if tokens.insert(candidate.clone()) {
                return candidate;
            }
            log::warn!("mint_token: hold token collision, regenerating");
        }
    }

    fn release_token(&self, token: &[u8]) {
        if token.is_empty() {
            return;
        }
        self.lock_tokens().remove(token);
    }

    fn valid_id(&self, s: &str) -> bool {
        !s.is_empty() && s.len() <= self.config.max_id_len
    }

    fn store_err_code(err: &Error) -> ResCode {
        match err {
            Error::Invariant(_) => ResCode::InternalErr,
            _ => ResCode::DbError,
        }
    }

    /// §4.2.1 place_hold(user_id, event_id, seat_id).
    pub fn place_hold(&self, user_id: &str, event_id: &str, seat_id: &str) -> HoldResult {
        if !self.valid_id(user_id) || !self.valid_id(event_id) || !self.valid_id(seat_id) {
            log::warn!("place_hold: rejected invalid identifier(s)");
            return HoldResult::failure(ResCode::NotFound);
        }
        log::debug!("place_hold: user={user_id} event={event_id} seat={seat_id}");

        let now = now_unix();
        let hold_length = self.hold_length_secs.load(Ordering::Relaxed);

        let outcome = self.map.with_seat(event_id, seat_id, |seat| {
            if seat.status == SeatStatus::Sold {
                return HoldResult::failure(ResCode::AlreadySold);
            }
            if seat.status == SeatStatus::Held && !seat.hold_expired(now) {
                return if seat.holder_user_id == user_id {
                    HoldResult {
                        code: ResCode::HoldExistsSameUser,
                        price_cents: seat.price_cents,
                        expires_unix: seat.hold_expires_unix,
                        hold_token: seat.hold_token.clone(),
                    }
                } else {
                    HoldResult::failure(ResCode::HeldByOther)
                };
            }

            // AVAILABLE, REFUNDED, or an expired HELD hold: take a fresh one.
            if seat.status == SeatStatus::Held {
                self.release_token(&seat.hold_token);
            }
            let token = self.mint_token();
            seat.status = SeatStatus::Held;
            seat.holder_user_id = user_id.to_string();
            seat.hold_expires_unix = now + hold_length;
            seat.hold_token = token.clone();
            seat.touch(now);

            HoldResult { code: ResCode::Ok, price_cents: seat.price_cents, expires_unix: seat.hold_expires_unix, hold_token: token }
        });

        match outcome {
            Some(result) => {
                match result.code {
                    ResCode::Ok => log::info!("place_hold: {user_id} now holds {event_id}/{seat_id} until {}", result.expires_unix),
                    ResCode::HoldExistsSameUser => log::debug!("place_hold: {user_id} already holds {event_id}/{seat_id}"),
                    ResCode::AlreadySold => log::info!("place_hold: {event_id}/{seat_id} already sold"),
                    ResCode::HeldByOther => log::info!("place_hold: {event_id}/{seat_id} held by another user"),
                    _ => {}
                }
                result
            }
            None => {
                log::info!("place_hold: seat {event_id}/{seat_id} not found");
                HoldResult::failure(ResCode::NotFound)
            }
        }
    }

    /// §4.2.2 confirm_reservation(token, amount_paid_cents).
    pub fn confirm_reservation(&self, hold_token: &[u8], amount_paid_cents: i32) -> ConfirmResult {
        if hold_token.is_empty() || hold_token.len() > self.config.hold_token_len {
            log::warn!("confirm_reservation: invalid token length {}", hold_token.len());
            return ConfirmResult::failure(ResCode::InvalidToken);
        }

        // Idempotency: a prior confirm of this exact token returns the same order.
        match self.store.order_find_by_token(hold_token) {
            Ok(Some(existing)) => {
                log::info!("confirm_reservation: idempotent replay of order {}", existing.order_id);
                return ConfirmResult { code: ResCode::Ok, order_id: existing.order_id, price_cents: existing.price_cents };
            }
            Ok(None) => {}
            Err(e) => {
                log::error!("confirm_reservation: idempotency lookup failed: {e}");
                return ConfirmResult::failure(ResCode::DbError);
            }
        }

        // Resolve the seat by an unsynchronized scan; re-validated below under
        // the per-seat lock, which is held continuously from there through
        // the final in-memory write so nothing else can touch the seat
        // in between (SPEC_FULL.md §4.2.2 steps 4-12).
        let candidate = match self.map.find_by_token(hold_token) {
            Some(seat) => seat,
            None => {
                log::info!("confirm_reservation: unknown hold token");
                return ConfirmResult::failure(ResCode::InvalidToken);
            }
        };
        let event_id = candidate.event_id;
        let seat_id = candidate.seat_id;

        enum Outcome {
            Invalid,
            Expired,
            Failed(ResCode),
            Confirmed(ConfirmResult),
        }

        let now = now_unix();
        let outcome = self.map.with_seat(&event_id, &seat_id, |seat| {
            if seat.status != SeatStatus::Held || seat.hold_token != hold_token {
                return Outcome::Invalid;
            }
            if seat.hold_expired(now) {
                self.release_token(&seat.hold_token);
                seat.status = SeatStatus::Available;
                seat.clear_hold_fields();
                seat.touch(now);
                return Outcome::Expired;
            }

            let holder = seat.holder_user_id.clone();
            let cached_price = seat.price_cents;

            let price = match self.price_source.authoritative_price(&event_id, &seat_id) {
                Ok(Some(p)) => p,
                Ok(None) => cached_price,
                Err(e) => {
                    log::error!("confirm_reservation: price source failed: {e}");
                    return Outcome::Failed(ResCode::DbError);
                }
            };

            if amount_paid_cents != price {
                log::warn!("confirm_reservation: payment mismatch for {event_id}/{seat_id}: paid {amount_paid_cents}, price {price}");
                return Outcome::Failed(ResCode::InternalErr);
            }

            let txn = match self.store.txn_begin() {
                Ok(t) => t,
                Err(e) => {
                    log::error!("confirm_reservation: txn_begin failed: {e}");
                    return Outcome::Failed(ResCode::DbError);
                }
            };

            let order_id = match self.store.order_create(&txn, &holder, &event_id, &seat_id, price, hold_token) {
                Ok(id) => id,
                Err(e) => {
                    let code = Self::store_err_code(&e);
                    self.store.txn_rollback(txn);
                    log::error!("confirm_reservation: order_create failed: {e}");
                    return Outcome::Failed(code);
                }
            };

            if let Err(e) = self.store.seat_mark_sold(&txn, &event_id, &seat_id, &order_id) {
                let code = Self::store_err_code(&e);
                self.store.txn_rollback(txn);
                log::error!("confirm_reservation: seat_mark_sold failed: {e}");
                return Outcome::Failed(code);
            }

            if let Err(e) = self.store.txn_commit(txn) {
                log::error!("confirm_reservation: txn_commit failed: {e}");
                return Outcome::Failed(ResCode::DbError);
            }

            // Durable write committed — still holding the same per-seat lock
            // acquired above, so the seat cannot have changed underneath us.
            self.release_token(hold_token);
            seat.status = SeatStatus::Sold;
            seat.last_order_id = order_id.clone();
            seat.clear_hold_fields();
            seat.touch(now_unix());

            log::info!("confirm_reservation: {event_id}/{seat_id} sold as order {order_id} for {price}");
            Outcome::Confirmed(ConfirmResult { code: ResCode::Ok, order_id, price_cents: price })
        });

        match outcome {
            None => {
                log::warn!("confirm_reservation: seat {event_id}/{seat_id} vanished between lookup and lock");
                ConfirmResult::failure(ResCode::NotFound)
            }
            Some(Outcome::Invalid) => {
                log::info!("confirm_reservation: token no longer valid for {event_id}/{seat_id}");
                ConfirmResult::failure(ResCode::InvalidToken)
            }
            Some(Outcome::Expired) => {
                log::info!("confirm_reservation: hold on {event_id}/{seat_id} expired");
                ConfirmResult::failure(ResCode::HoldExpired)
            }
            Some(Outcome::Failed(code)) => ConfirmResult::failure(code),
            Some(Outcome::Confirmed(result)) => result,
        }
    }

    /// §4.2.3 cancel_hold(user_id, event_id, seat_id).
    pub fn cancel_hold(&self, user_id: &str, event_id: &str, seat_id: &str) -> ResCode {
        if !self.valid_id(user_id) || !self.valid_id(event_id) || !self.valid_id(seat_id) {
            return ResCode::NotFound;
        }
        let now = now_unix();

        let outcome = self.map.with_seat(event_id, seat_id, |seat| match seat.status {
            SeatStatus::Sold => ResCode::AlreadySold,
            SeatStatus::Held if seat.holder_user_id == user_id => {
                self.release_token(&seat.hold_token);
                seat.status = SeatStatus::Available;
                seat.clear_hold_fields();
                seat.touch(now);
                ResCode::Ok
            }
            SeatStatus::Held => ResCode::HeldByOther,
            SeatStatus::Available | SeatStatus::Refunded => ResCode::NotFound,
        });

        match outcome {
            Some(code) => {
                match code {
                    ResCode::Ok => log::info!("cancel_hold: {user_id} released {event_id}/{seat_id}"),
                    ResCode::AlreadySold => log::info!("cancel_hold: {event_id}/{seat_id} already sold"),
                    ResCode::HeldByOther => log::info!("cancel_hold: {event_id}/{seat_id} held by another user"),
                    _ => {}
                }
                code
            }
            None => ResCode::NotFound,
        }
    }

    /// §4.2.4 seat_get(event_id, seat_id).
    pub fn seat_get(&self, event_id: &str, seat_id: &str) -> Option<SeatView> {
        let now = now_unix();
        self.map.with_seat(event_id, seat_id, |seat| {
            if seat.hold_expired(now) {
                self.release_token(&seat.hold_token);
                seat.status = SeatStatus::Available;
                seat.clear_hold_fields();
                seat.touch(now);
                log::info!("seat_get: lazily expired hold on {event_id}/{seat_id}");
            }
            seat.to_view()
        })
    }

    /// §4.2.5 refund(user_id, order_id).
    pub fn refund(&self, user_id: &str, order_id: &str) -> ResCode {
        if !self.valid_id(user_id) || !self.valid_id(order_id) {
            return ResCode::NotFound;
        }

        let order = match self.store.order_find_by_id(order_id) {
            Ok(Some(order)) => order,
            Ok(None) => return ResCode::NotFound,
            Err(e) => {
                log::error!("refund: order lookup failed: {e}");
                return ResCode::DbError;
            }
        };

        if order.user_id != user_id {
            // Do not leak order existence to a non-owner.
            log::warn!("refund: requester does not own order {order_id}");
            return ResCode::NotFound;
        }

        let txn = match self.store.txn_begin() {
            Ok(t) => t,
            Err(e) => {
                log::error!("refund: txn_begin failed: {e}");
                return ResCode::DbError;
            }
        };

        if let Err(e) = self.store.refund_create(&txn, user_id, order_id, order.price_cents) {
            let code = Self::store_err_code(&e);
            self.store.txn_rollback(txn);
            log::error!("refund: refund_create failed: {e}");
            return code;
        }

        if let Err(e) = self.store.txn_commit(txn) {
            log::error!("refund: txn_commit failed: {e}");
            return ResCode::DbError;
        }

        // Best-effort in-memory fixup; failures here are non-fatal, the
        // durable refund already committed.
        let target_status = if self.config.refund_marks_refunded { SeatStatus::Refunded } else { SeatStatus::Available };
        let now = now_unix();
        let fixed = self.map.with_seat(&order.event_id, &order.seat_id, |seat| {
            if seat.status == SeatStatus::Sold {
                seat.status = target_status;
                seat.clear_hold_fields();
                seat.touch(now);
            }
        });
        if fixed.is_none() {
            log::warn!(
                "refund: seat {}/{} absent from the map during best-effort fixup for order {order_id}",
                order.event_id,
                order.seat_id
            );
        }

        log::info!("refund: order {order_id} refunded for {}", order.price_cents);
        ResCode::Ok
    }
}
