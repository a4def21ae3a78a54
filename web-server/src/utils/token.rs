// web-server/src/utils/token.rs
use rand::RngCore;

// Bytes of entropy in a session id
const SESSION_ID_BYTES: usize = 32;

/// Generate an opaque, unguessable session id (hex encoded)
pub fn create_session_id() -> String {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
