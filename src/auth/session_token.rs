use base64::Engine;
use rand::RngCore;

/// Generates a cryptographically random 256-bit opaque token, base64url
/// encoded. Resolves the Open Question in spec.md §9 — token encoding is
/// unconstrained beyond opacity and a ≥128-bit length (ambient component A7).
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}
