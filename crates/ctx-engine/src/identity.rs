//! Anonymous user identity.
//!
//! Ratings are keyed by a SHA-256 hash so the store never sees who rated
//! what. The hash seeds from `CLAUDE_CTX_USER_ID` when set, otherwise from
//! a stable machine-level identifier.

use sha2::{Digest, Sha256};

use ctx_core::ENV_USER_ID;

/// Derive the anonymous user hash.
pub fn user_hash() -> String {
    let seed = match std::env::var(ENV_USER_ID) {
        Ok(id) if !id.is_empty() => id,
        _ => machine_identity(),
    };
    hex::encode(Sha256::digest(seed.as_bytes()))
}

/// Best-effort stable identifier for this machine and user.
fn machine_identity() -> String {
    if let Ok(id) = std::fs::read_to_string("/etc/machine-id") {
        let id = id.trim();
        if !id.is_empty() {
            return id.to_string();
        }
    }
    if let Ok(host) = std::fs::read_to_string("/etc/hostname") {
        let host = host.trim();
        if !host.is_empty() {
            return format!("{host}:{}", home_tag());
        }
    }
    home_tag()
}

fn home_tag() -> String {
    dirs::home_dir()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| "anonymous".to_string())
}
