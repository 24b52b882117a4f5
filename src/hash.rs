//! Composite-key mixing hash for `(event_id, seat_id)` pairs.
//!
//! Ported from the original source's `tb_hash_key_fast` / `splitmix64`
//! (`examples/original_source/src/utils.c`). No property of the output is
//! relied upon beyond uniformity modulo the seat map's bucket count; the
//! engine never exposes this hash to callers.

const GOLDEN_GAMMA: u64 = 0x9e3779b97f4a7c15;

#[inline]
fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(GOLDEN_GAMMA);
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d049bb133111eb);
    x ^ (x >> 31)
}

/// Mixes `event_id` and `seat_id` into a single 64-bit hash.
///
/// Each string feeds its own `splitmix64` accumulator byte-by-byte, and the
/// two substreams are combined with an xor-plus-rotate step — identical in
/// shape to the C implementation's `h1 ^ (h2 + GOLDEN + (h1<<6) + (h1>>2))`.
pub fn mix_key(event_id: &str, seat_id: &str) -> u64 {
    let mut h1: u64 = 0x1234567890abcdef;
    for &b in event_id.as_bytes() {
        h1 = splitmix64(h1 ^ b as u64);
    }
    let mut h2: u64 = 0x0fedcba987654321;
    for &b in seat_id.as_bytes() {
        h2 = splitmix64(h2 ^ b as u64);
    }
    h1 ^ (h2.wrapping_add(GOLDEN_GAMMA).wrapping_add(h1 << 6).wrapping_add(h1 >> 2))
}
