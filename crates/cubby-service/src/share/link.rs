//! Share id generation.

/// Prefix of every share id.
pub const SHARE_ID_PREFIX: &str = "sid-";

/// A fresh share id: the prefix plus 32 random bytes in hex.
pub fn generate_share_id() -> String {
    let bytes: [u8; 32] = rand::random();
    let mut id = String::with_capacity(SHARE_ID_PREFIX.len() + 64);
    id.push_str(SHARE_ID_PREFIX);
    for b in bytes {
        id.push_str(&format!("{b:02x}"));
    }
    id
}
