// ============================
// mdwiki-backend-lib/src/auth/session.rs
// ============================
//! Session lifecycle: login, validation with sliding expiry, logout.
//!
//! Each account has at most one valid nonce at a time, the nonce-of-record.
//! A fresh login rotates it, which invalidates every other carrier still
//! holding the old nonce. The registry lives in process memory: it does not
//! survive a restart and is not shared between server instances, so a
//! multi-instance deployment needs an external registry behind the same
//! interface.
use crate::auth::carrier::{keys, SessionCarrier, LIMIT_FORMAT};
use crate::auth::password::compute_hash;
use crate::metrics as metric_keys;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{Duration, NaiveDateTime, Utc};
use dashmap::DashMap;
use metrics::counter;
use rand::{rngs::OsRng, RngCore};
use std::sync::Arc;

/// Bytes of OS entropy behind each session nonce
const NONCE_SEED_BYTES: usize = 32;

/// Nonce-of-record map: account id to the single currently valid nonce
#[derive(Default)]
pub struct SessionRegistry {
    nonces: DashMap<String, String>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, uid: &str, nonce: String) {
        self.nonces.insert(uid.to_string(), nonce);
    }

    fn matches(&self, uid: &str, nonce: &str) -> bool {
        self.nonces
            .get(uid)
            .map(|entry| entry.value() == nonce)
            .unwrap_or(false)
    }

    /// Drop the record only while `nonce` is still current. A stale carrier
    /// being logged out must not revoke a successor session's nonce.
    fn forget_if_current(&self, uid: &str, nonce: &str) {
        self.nonces
            .remove_if(uid, |_, current| current.as_str() == nonce);
    }

    pub fn len(&self) -> usize {
        self.nonces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nonces.is_empty()
    }
}

/// Session/auth manager operating on externally supplied carriers
#[derive(Clone)]
pub struct SessionManager {
    registry: Arc<SessionRegistry>,
    window: Duration,
}

impl SessionManager {
    pub fn new(registry: Arc<SessionRegistry>, window_hours: i64) -> Self {
        Self {
            registry,
            window: Duration::hours(window_hours),
        }
    }

    /// Transition the carrier to Authenticated: set identity, expiry and
    /// timezone, and rotate the account's nonce-of-record.
    pub fn login(&self, carrier: &SessionCarrier, uid: &str, tz_name: &str) -> bool {
        let nonce = fresh_nonce();
        carrier.set(keys::ID, uid);
        carrier.set(
            keys::LIMIT,
            (Utc::now() + self.window).format(LIMIT_FORMAT).to_string(),
        );
        carrier.set(keys::TIMEZONE, tz_name);
        carrier.set(keys::NONCE, nonce.clone());
        self.registry.record(uid, nonce);
        counter!(metric_keys::SESSION_LOGIN).increment(1);
        true
    }

    /// Validate the carrier. Any failure forces a logout and returns false;
    /// success renews the session (sliding expiry) and rotates the nonce.
    pub fn check(&self, carrier: &SessionCarrier) -> bool {
        let (Some(uid), Some(limit)) = (carrier.get(keys::ID), carrier.get(keys::LIMIT)) else {
            self.logout(carrier);
            return false;
        };

        let nonce = carrier.get(keys::NONCE).unwrap_or_default();
        if !self.registry.matches(&uid, &nonce) {
            tracing::warn!(%uid, "session nonce mismatch, forcing logout");
            self.logout(carrier);
            return false;
        }

        let expired = match NaiveDateTime::parse_from_str(&limit, LIMIT_FORMAT) {
            Ok(limit) => limit.and_utc() <= Utc::now(),
            // An unreadable expiry is treated as already elapsed
            Err(_) => true,
        };
        if expired {
            counter!(metric_keys::SESSION_EXPIRED).increment(1);
            self.logout(carrier);
            return false;
        }

        let tz = carrier.get(keys::TIMEZONE).unwrap_or_default();
        self.login(carrier, &uid, &tz)
    }

    /// Clear the carrier and the account's nonce-of-record. Idempotent.
    pub fn logout(&self, carrier: &SessionCarrier) -> bool {
        if let Some(uid) = carrier.remove(keys::ID) {
            let nonce = carrier.get(keys::NONCE).unwrap_or_default();
            self.registry.forget_if_current(&uid, &nonce);
            tracing::debug!(%uid, "session cleared");
        }
        carrier.remove(keys::LIMIT);
        carrier.remove(keys::TIMEZONE);
        carrier.remove(keys::NONCE);
        true
    }

    /// The authenticated account id, or `None` when validation fails
    pub fn user_id(&self, carrier: &SessionCarrier) -> Option<String> {
        if self.check(carrier) {
            carrier.get(keys::ID)
        } else {
            None
        }
    }
}

/// High-entropy nonce: an OS-random seed run through the same stretched
/// hash primitive as the credential store
fn fresh_nonce() -> String {
    let mut seed = [0u8; NONCE_SEED_BYTES];
    OsRng.fill_bytes(&mut seed);
    compute_hash(&URL_SAFE_NO_PAD.encode(seed))
}
