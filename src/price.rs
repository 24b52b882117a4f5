//! The authoritative-price collaborator contract.
//!
//! Ported from `include/db_interface.h::db_authoritative_price`.

use crate::error::Result;

/// A seat's authoritative price, answered by an external pricing source.
/// `Ok(None)` means the source has no opinion — the caller falls back to
/// the in-memory cached price (SPEC_FULL.md §4.2.2 step 7).
pub trait PriceSource: Send + Sync {
    fn authoritative_price(&self, event_id: &str, seat_id: &str) -> Result<Option<i32>>;
}

/// Reference collaborator that never has an opinion, matching the original
/// stub's `db_authoritative_price` (always `RES_NOT_FOUND`, so the engine's
/// price-override branch is only weakly exercised — see SPEC_FULL.md §9).
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPriceSource;

impl PriceSource for NullPriceSource {
    fn authoritative_price(&self, _event_id: &str, _seat_id: &str) -> Result<Option<i32>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_price_source_always_defers() {
        let src = NullPriceSource;
        assert_eq!(src.authoritative_price("EV1", "S01").unwrap(), None);
    }
}
