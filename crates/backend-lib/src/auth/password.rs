// ============================
// mdwiki-backend-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
//!
//! The scheme is deliberately deterministic: the salts are derived from the
//! plaintext itself (its base-16/32/64/85 encodings), so equal passwords
//! always produce equal hashes and verification is a string comparison.
//! Every hash carries a leading `$N$` version tag.
use base64::{engine::general_purpose::STANDARD, Engine as _};
use data_encoding::{BASE32, HEXLOWER, HEXUPPER};
use regex::Regex;
use sha2::{Digest, Sha512};
use std::sync::LazyLock;

/// Number of stretching rounds applied to every password
pub const STRETCH_COUNT: usize = 10_000;

/// Version tag of the current scheme
const VERSION_TAG: &str = "$1$";

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$(\d+)\$.+").expect("static version regex"));

/// Hash a plaintext password.
///
/// Four salt variants come from encoding the plaintext; each round picks one
/// round-robin, interleaves it with the running digest three times and
/// re-hashes with SHA-512.
pub fn compute_hash(plain: &str) -> String {
    let bytes = plain.as_bytes();
    let salts = [
        HEXUPPER.encode(bytes),
        BASE32.encode(bytes),
        STANDARD.encode(bytes),
        base85::encode(bytes),
    ];

    let mut data = plain.to_string();
    for i in 0..STRETCH_COUNT {
        let salt = salts[i % salts.len()].as_bytes();
        let mut hasher = Sha512::new();
        hasher.update(data.as_bytes());
        hasher.update(salt);
        hasher.update(data.as_bytes());
        hasher.update(salt);
        hasher.update(data.as_bytes());
        hasher.update(salt);
        data = HEXLOWER.encode(&hasher.finalize());
    }

    format!("{VERSION_TAG}{data}")
}

/// Parse the `$N$` version tag of a hash; `None` when absent or malformed.
///
/// Callers that accept a password value must check this before hashing so an
/// already-hashed value is never hashed twice.
pub fn hash_version(hash: &str) -> Option<String> {
    VERSION_RE
        .captures(hash)
        .map(|caps| caps[1].to_string())
}

/// Hash `value` unless it already carries a version tag
pub fn hash_if_plain(value: &str) -> String {
    if hash_version(value).is_some() {
        value.to_string()
    } else {
        compute_hash(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_versioned_and_deterministic() {
        let hash = compute_hash("correct horse battery staple");
        assert!(hash.starts_with("$1$"));
        assert_eq!(hash_version(&hash).as_deref(), Some("1"));
        assert_eq!(hash, compute_hash("correct horse battery staple"));
        assert_ne!(hash, compute_hash("correct horse battery stapl"));
    }

    #[test]
    fn version_rejects_plaintext_and_malformed_tags() {
        assert_eq!(hash_version("hunter2"), None);
        assert_eq!(hash_version("$$abc"), None);
        assert_eq!(hash_version("$1$"), None);
        assert_eq!(hash_version("$12$deadbeef").as_deref(), Some("12"));
    }

    #[test]
    fn hash_if_plain_is_idempotent() {
        let once = hash_if_plain("secret");
        let twice = hash_if_plain(&once);
        assert_eq!(once, twice);
    }
}
