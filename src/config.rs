use serde::Deserialize;
use std::fs;

use crate::error::{Error, Result};

/// Tunables for a [`crate::engine::ReservationEngine`].
///
/// Defaults mirror the original C implementation's compile-time constants
/// (`CONFIG_SEATMAP_INITIAL_CAPACITY`, `g_hold_length_secs`, `RES_TOKEN_LEN`,
/// `RES_ID_LEN`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Bucket count of the seat map. Fixed at construction; no rehashing.
    pub seat_map_capacity: usize,

    /// Time-to-live, in seconds, of a freshly placed hold.
    pub hold_length_secs: i64,

    /// Bytes of randomness per hold token.
    pub hold_token_len: usize,

    /// Max byte length of event/seat/user/order identifiers.
    pub max_id_len: usize,

    /// When `true`, a successful [`crate::engine::ReservationEngine::refund`]
    /// leaves the seat in [`crate::seat::SeatStatus::Refunded`] instead of
    /// [`crate::seat::SeatStatus::Available`]. See SPEC_FULL.md §9.
    pub refund_marks_refunded: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            seat_map_capacity: 16384,
            hold_length_secs: 300,
            hold_token_len: 32,
            max_id_len: 32,
            refund_marks_refunded: false,
        }
    }
}

impl EngineConfig {
    /// Loads a config from a JSON file, falling back to [`Default::default`]
    /// field-by-field for anything the file omits.
    pub fn from_json_file(file_path: &str) -> Result<Self> {
        let data = fs::read_to_string(file_path).map_err(Error::IoError)?;
        let config: EngineConfig = serde_json::from_str(&data).map_err(Error::DeserializationError)?;
        Ok(config)
    }

    /// Applies `TICKETBOOK_*` environment variable overrides on top of `self`.
    ///
    /// Malformed values are ignored (the existing field is kept) rather than
    /// failing construction — this mirrors the original source's
    /// `reservation_set_hold_length_seconds`, which clamps instead of
    /// rejecting bad input.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = std::env::var("TICKETBOOK_SEAT_MAP_CAPACITY") {
            if let Ok(v) = v.parse() {
                self.seat_map_capacity = v;
            }
        }
        if let Ok(v) = std::env::var("TICKETBOOK_HOLD_LENGTH_SECS") {
            if let Ok(v) = v.parse() {
                self.hold_length_secs = v;
            }
        }
        if let Ok(v) = std::env::var("TICKETBOOK_HOLD_TOKEN_LEN") {
            if let Ok(v) = v.parse() {
                self.hold_token_len = v;
            }
        }
        if let Ok(v) = std::env::var("TICKETBOOK_MAX_ID_LEN") {
            if let Ok(v) = v.parse() {
                self.max_id_len = v;
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.seat_map_capacity, 16384);
        assert_eq!(cfg.hold_length_secs, 300);
        assert_eq!(cfg.hold_token_len, 32);
        assert_eq!(cfg.max_id_len, 32);
        assert!(!cfg.refund_marks_refunded);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let json = r#"{"hold_length_secs": 1}"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.hold_length_secs, 1);
        assert_eq!(config.seat_map_capacity, 16384);
    }
}
