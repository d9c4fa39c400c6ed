// ============================
// mdwiki-backend-lib/src/auth/carrier.rs
// ============================
//! Session carrier handling.
//!
//! A carrier is the mutable key/value store scoped to one browser session.
//! The web layer owns a [`CarrierStore`] keyed by an opaque cookie token and
//! hands individual carriers to the session manager, which only ever reads
//! and writes the four keys in [`keys`].
use chrono::{NaiveDateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Keys the session manager uses on a carrier
pub mod keys {
    pub const ID: &str = "id";
    pub const LIMIT: &str = "limit";
    pub const TIMEZONE: &str = "timezone";
    pub const NONCE: &str = "nonce";
}

/// Format of the expiry value stored under [`keys::LIMIT`]
pub const LIMIT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Mutable key/value store scoped to one browser session
#[derive(Clone, Default, Debug)]
pub struct SessionCarrier {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl SessionCarrier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    pub fn set(&self, key: &str, value: impl Into<String>) {
        self.values.lock().insert(key.to_string(), value.into());
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        self.values.lock().remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.lock().is_empty()
    }

    /// True when the stored expiry is absent, unparsable or in the past
    pub fn is_expired(&self) -> bool {
        let Some(limit) = self.get(keys::LIMIT) else {
            return true;
        };
        match NaiveDateTime::parse_from_str(&limit, LIMIT_FORMAT) {
            Ok(limit) => limit.and_utc() <= Utc::now(),
            Err(_) => true,
        }
    }
}

/// Token-keyed store of all live carriers
pub struct CarrierStore {
    carriers: DashMap<String, SessionCarrier>,
}

impl CarrierStore {
    pub fn new() -> Self {
        Self {
            carriers: DashMap::new(),
        }
    }

    /// Mint a fresh carrier under a new opaque token
    pub fn create(&self) -> (String, SessionCarrier) {
        let token = Uuid::new_v4().to_string();
        let carrier = SessionCarrier::new();
        self.carriers.insert(token.clone(), carrier.clone());
        (token, carrier)
    }

    pub fn get(&self, token: &str) -> Option<SessionCarrier> {
        self.carriers.get(token).map(|entry| entry.value().clone())
    }

    /// Drop a carrier entirely (logout path)
    pub fn discard(&self, token: &str) {
        self.carriers.remove(token);
    }

    /// Remove carriers that are empty (logged out) or past their expiry.
    /// Returns the number removed.
    pub fn sweep(&self) -> usize {
        let before = self.carriers.len();
        self.carriers
            .retain(|_, carrier| !carrier.is_empty() && !carrier.is_expired());
        before - self.carriers.len()
    }

    pub fn len(&self) -> usize {
        self.carriers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.carriers.is_empty()
    }
}

impl Default for CarrierStore {
    fn default() -> Self {
        Self::new()
    }
}
