// src/common/id_generator.rs
//! Identifier and random token generation
//!
//! Entity ids are prefixed Crockford Base32 strings, e.g. `P_K7NP3XQ2`.
//! The alphabet has no ambiguous characters (I, L, O, U) so ids are easy
//! to read back from a URL.
//!
//! Opaque tokens (login state, nonce, transaction ids) are URL-safe base64
//! over bytes from the thread-local CSPRNG.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::{Rng, RngCore};

/// Crockford Base32 alphabet (excludes I, L, O, U to avoid confusion)
const CROCKFORD_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

const ID_LENGTH: usize = 8;

/// Entity type prefixes for ID generation
#[derive(Debug, Clone, Copy)]
pub enum EntityPrefix {
    /// Account (U_)
    User,
    /// Post (P_)
    Post,
    /// Category (C_)
    Category,
}

impl EntityPrefix {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityPrefix::User => "U",
            EntityPrefix::Post => "P",
            EntityPrefix::Category => "C",
        }
    }
}

fn generate_crockford_string(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..32);
            CROCKFORD_ALPHABET[idx] as char
        })
        .collect()
}

/// Generate a prefixed ID, e.g. `generate_id(EntityPrefix::Post)` -> `"P_8MWQT2KD"`
pub fn generate_id(prefix: EntityPrefix) -> String {
    format!("{}_{}", prefix.as_str(), generate_crockford_string(ID_LENGTH))
}

pub fn generate_user_id() -> String {
    generate_id(EntityPrefix::User)
}

pub fn generate_post_id() -> String {
    generate_id(EntityPrefix::Post)
}

pub fn generate_category_id() -> String {
    generate_id(EntityPrefix::Category)
}

/// Lowercase hex string built from `bytes` random bytes (`2 * bytes` characters)
pub fn random_hex(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill_bytes(&mut buf);
    buf.iter().map(|b| format!("{:02x}", b)).collect()
}

/// URL-safe, unpadded base64 token over `bytes` random bytes
pub fn random_url_token(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill_bytes(&mut buf);
    URL_SAFE_NO_PAD.encode(buf)
}
