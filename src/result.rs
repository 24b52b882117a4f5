//! Discriminated results returned by the public reservation API.
//!
//! Ported from `include/reservation.h` (`res_code_t`, `hold_result_t`,
//! `confirm_result_t`). See SPEC_FULL.md §7 for the propagation policy.

/// Error/status taxonomy shared by every reservation operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResCode {
    Ok,
    NotFound,
    AlreadySold,
    HeldByOther,
    HoldExistsSameUser,
    HoldExpired,
    InvalidToken,
    DbError,
    InternalErr,
}

/// Result of [`crate::engine::ReservationEngine::place_hold`].
#[derive(Debug, Clone, PartialEq)]
pub struct HoldResult {
    pub code: ResCode,
    pub price_cents: i32,
    pub expires_unix: i64,
    pub hold_token: Vec<u8>,
}

impl HoldResult {
    pub fn failure(code: ResCode) -> Self {
        HoldResult { code, price_cents: 0, expires_unix: 0, hold_token: Vec::new() }
    }
}

/// Result of [`crate::engine::ReservationEngine::confirm_reservation`].
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmResult {
    pub code: ResCode,
    pub order_id: String,
    pub price_cents: i32,
}

impl ConfirmResult {
    pub fn failure(code: ResCode) -> Self {
        ConfirmResult { code, order_id: String::new(), price_cents: 0 }
    }
}
