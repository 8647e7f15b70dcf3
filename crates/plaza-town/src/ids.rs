//! Random identifier generation.
//!
//! Town IDs, player IDs, and update passwords are all unguessable hex
//! strings; knowing one is a capability. Session tokens use the same
//! scheme but are generated by the session layer.

use rand::Rng;

/// Generates `bytes` random bytes formatted as lowercase hex
/// (two characters per byte).
pub(crate) fn random_hex(bytes: usize) -> String {
    let mut rng = rand::rng();
    (0..bytes)
        .map(|_| format!("{:02x}", rng.random::<u8>()))
        .collect()
}
