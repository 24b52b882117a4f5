//! The order-store collaborator contract.
//!
//! Ported from `include/db_interface.h`. The durable order store itself is
//! explicitly out of scope for this crate (SPEC_FULL.md §1); [`OrderStore`]
//! is the seam a real transactional store plugs into, and
//! [`InMemoryOrderStore`] is the reference collaborator used by tests and
//! the demo binary — not part of the core.

use std::sync::Mutex;

use slotmap::{SlotMap, new_key_type};

use crate::error::{Error, Result};

new_key_type! {
    struct OrderSlot;
}

/// Opaque transaction handle. The in-memory reference store treats this as
/// pure bookkeeping, matching the original stub (`db_txn_t` wraps a single
/// dummy field and every operation inside the "transaction" actually takes
/// effect immediately).
#[derive(Debug)]
pub struct Txn(u64);

/// A durable order row as seen by callers of [`OrderStore::order_find_by_id`]
/// / [`OrderStore::order_find_by_token`].
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub order_id: String,
    pub user_id: String,
    pub event_id: String,
    pub seat_id: String,
    pub price_cents: i32,
}

/// The durable order store contract. See SPEC_FULL.md §6.
pub trait OrderStore: Send + Sync {
    fn txn_begin(&self) -> Result<Txn>;
    fn txn_commit(&self, txn: Txn) -> Result<()>;
    fn txn_rollback(&self, txn: Txn);

    /// Idempotency lookup: an order already bound to this hold token, if any.
    fn order_find_by_token(&self, hold_token: &[u8]) -> Result<Option<OrderRecord>>;

    fn order_find_by_id(&self, order_id: &str) -> Result<Option<OrderRecord>>;

    /// Creates an order row within `txn`. Returns the newly minted order id.
    fn order_create(
        &self,
        txn: &Txn,
        user_id: &str,
        event_id: &str,
        seat_id: &str,
        price_cents: i32,
        hold_token: &[u8],
    ) -> Result<String>;

    /// Marks the durable seat row sold and links it to `order_id`. Call
    /// within the same `txn` as `order_create`.
    fn seat_mark_sold(&self, txn: &Txn, event_id: &str, seat_id: &str, order_id: &str) -> Result<()>;

    /// Records a refund for `order_id`.
    fn refund_create(&self, txn: &Txn, user_id: &str, order_id: &str, amount_cents: i32) -> Result<()>;
}

struct OrderRow {
    order_id: String,
    user_id: String,
    event_id: String,
    seat_id: String,
    price_cents: i32,
    hold_token: Vec<u8>,
}

struct StoreInner {
    orders: SlotMap<OrderSlot, OrderRow>,
    next_seq: u64,
    next_txn: u64,
}

/// Non-transactional in-memory stand-in for a real order store. Thread-safe
/// via a single mutex, matching the original source's `db_interface.c`
/// stub (a single `pthread_mutex_t` guarding a linked list of order rows).
///
/// Reference collaborator only — production deployments supply their own
/// [`OrderStore`] backed by an actual transactional database.
pub struct InMemoryOrderStore {
    inner: Mutex<StoreInner>,
}

impl Default for InMemoryOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        InMemoryOrderStore { inner: Mutex::new(StoreInner { orders: SlotMap::with_key(), next_seq: 1, next_txn: 1 }) }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(|poison| poison.into_inner())
    }
}

impl OrderStore for InMemoryOrderStore {
    fn txn_begin(&self) -> Result<Txn> {
        let mut guard = self.lock();
        let id = guard.next_txn;
        guard.next_txn += 1;
        Ok(Txn(id))
    }

    fn txn_commit(&self, _txn: Txn) -> Result<()> {
        Ok(())
    }

    fn txn_rollback(&self, _txn: Txn) {}

    fn order_find_by_token(&self, hold_token: &[u8]) -> Result<Option<OrderRecord>> {
        if hold_token.is_empty() {
            return Ok(None);
        }
        let guard = self.lock();
        Ok(guard.orders.values().find(|row| row.hold_token == hold_token).map(|row| OrderRecord {
            order_id: row.order_id.clone(),
            user_id: row.user_id.clone(),
            event_id: row.event_id.clone(),
            seat_id: row.seat_id.clone(),
            price_cents: row.price_cents,
        }))
    }

    fn order_find_by_id(&self, order_id: &str) -> Result<Option<OrderRecord>> {
        let guard = self.lock();
        Ok(guard.orders.values().find(|row| row.order_id == order_id).map(|row| OrderRecord {
            order_id: row.order_id.clone(),
            user_id: row.user_id.clone(),
            event_id: row.event_id.clone(),
            seat_id: row.seat_id.clone(),
            price_cents: row.price_cents,
        }))
    }

    fn order_create(
        &self,
        _txn: &Txn,
        user_id: &str,
        event_id: &str,
        seat_id: &str,
        price_cents: i32,
        hold_token: &[u8],
    ) -> Result<String> {
        if user_id.is_empty() || event_id.is_empty() || seat_id.is_empty() || hold_token.is_empty() {
            return Err(Error::Invariant("order_create called with an empty identifier or token".to_string()));
        }
        let mut guard = self.lock();
        let seq = guard.next_seq;
        guard.next_seq += 1;
        let order_id = format!("ORD-{seq}");
        guard.orders.insert(OrderRow {
            order_id: order_id.clone(),
            user_id: user_id.to_string(),
            event_id: event_id.to_string(),
            seat_id: seat_id.to_string(),
            price_cents,
            hold_token: hold_token.to_vec(),
        });
        Ok(order_id)
    }

    fn seat_mark_sold(&self, _txn: &Txn, _event_id: &str, _seat_id: &str, _order_id: &str) -> Result<()> {
        // Nothing to do in the reference stub: the durable "seat row" this
        // would flip doesn't exist outside of the order rows themselves.
        Ok(())
    }

    fn refund_create(&self, _txn: &Txn, _user_id: &str, _order_id: &str, _amount_cents: i32) -> Result<()> {
        Ok(())
    }
}
