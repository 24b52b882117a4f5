mod config;
mod engine;
mod error;
mod hash;
mod logger;
mod price;
mod random;
mod result;
mod seat;
mod seat_map;
mod store;

use std::sync::Arc;

use config::EngineConfig;
use engine::ReservationEngine;
use price::NullPriceSource;
use seat::Seat;
use store::InMemoryOrderStore;

fn main() {
    logger::init();
    log::info!("Logger initialized. Starting reservation core demo.");

    let config = EngineConfig::default().with_env_overrides();
    let engine = ReservationEngine::new(config, Arc::new(InMemoryOrderStore::new()), Arc::new(NullPriceSource));

    engine.seed_seat(Seat::new("EV1", "A1", 4500));
    engine.seed_seat(Seat::new("EV1", "A2", 4500));

    let hold = engine.place_hold("demo-user", "EV1", "A1");
    log::info!("place_hold -> {:?}", hold.code);

    let confirm = engine.confirm_reservation(&hold.hold_token, hold.price_cents);
    log::info!("confirm_reservation -> {:?} (order {})", confirm.code, confirm.order_id);

    if let Some(view) = engine.seat_get("EV1", "A1") {
        log::info!("seat_get EV1/A1 -> status={:?}", view.status);
    }

    let refund_code = engine.refund("demo-user", &confirm.order_id);
    log::info!("refund -> {:?}", refund_code);

    if let Some(view) = engine.seat_get("EV1", "A1") {
        log::info!("seat_get EV1/A1 -> status={:?}", view.status);
    }
}
