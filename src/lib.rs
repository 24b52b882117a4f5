pub mod config;
pub mod engine;
pub mod error;
pub mod hash;
pub mod logger;
pub mod price;
pub mod random;
pub mod result;
pub mod seat;
pub mod seat_map;
pub mod store;

pub use config::EngineConfig;
pub use engine::ReservationEngine;
pub use error::{Error, Result};
pub use price::{NullPriceSource, PriceSource};
pub use result::{ConfirmResult, HoldResult, ResCode};
pub use seat::{Seat, SeatKey, SeatStatus, SeatView};
pub use seat_map::SeatMap;
pub use store::{InMemoryOrderStore, OrderRecord, OrderStore, Txn};
