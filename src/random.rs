//! Hold-token generation.
//!
//! Tokens are opaque random byte strings: they must never be interpreted as
//! integers, checksums, or anything seat-derivable, so forging one requires
//! brute-forcing the full entropy. See SPEC_FULL.md §4.3.

use rand::RngCore;

/// Fills a freshly minted hold token of `len` bytes from rand's thread-local
/// CSPRNG (ChaCha-based, reseeded from OS entropy) — `OsRng` itself only
/// implements rand 0.9's fallible `TryRngCore`, so `rng()` is the infallible
/// entry point for "give me cryptographically suitable random bytes".
pub fn generate_token(len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    rand::rng().fill_bytes(&mut buf);
    buf
}
