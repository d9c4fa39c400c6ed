// ============================
// mdwiki-backend-lib/src/lib.rs
// ============================
//! Core backend-lib functionality for the mdwiki server.

pub mod archive;
pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod pages;
pub mod pdf;
pub mod render;
pub mod routes;
pub mod search;
pub mod store;
pub mod users;
pub mod validation;

use crate::archive::ArchiveStore;
use crate::auth::{AuthRateLimiter, CarrierStore, SessionManager, SessionRegistry};
use crate::config::Settings;
use crate::pages::PageStore;
use crate::pdf::{PdfRenderer, WkhtmltopdfRenderer};
use crate::render::{MarkdownRenderer, Renderer};
use crate::search::SearchEngine;
use crate::store::Storage;
use crate::users::UserDirectory;
use std::sync::Arc;
use std::time::Duration;

/// Application state shared across all handlers
pub struct AppState<S> {
    /// Settings manager
    pub settings: Arc<Settings>,
    /// Storage backend
    pub storage: S,
    /// Nonce-of-record registry
    pub registry: Arc<SessionRegistry>,
    /// Session/auth manager
    pub sessions: SessionManager,
    /// Live session carriers, keyed by cookie token
    pub carriers: Arc<CarrierStore>,
    /// Login rate limiter
    pub login_limiter: Arc<AuthRateLimiter>,
    /// Markup renderer
    pub renderer: Arc<dyn Renderer>,
    /// PDF renderer
    pub pdf: Arc<dyn PdfRenderer>,
}

impl<S: Storage> AppState<S> {
    /// Create a new application state
    pub fn new(storage: S, settings: Settings) -> Self {
        let registry = Arc::new(SessionRegistry::new());
        let sessions = SessionManager::new(registry.clone(), settings.session.window_hours);
        let login_limiter = Arc::new(AuthRateLimiter::new(
            settings.login_rate_limit.max_attempts,
            Duration::from_secs(settings.login_rate_limit.lockout_secs),
        ));

        Self {
            settings: Arc::new(settings),
            storage,
            registry,
            sessions,
            carriers: Arc::new(CarrierStore::new()),
            login_limiter,
            renderer: Arc::new(MarkdownRenderer),
            pdf: Arc::new(WkhtmltopdfRenderer::new()),
        }
    }

    /// Page facade over the configured storage
    pub fn pages(&self) -> PageStore {
        PageStore::new(&self.storage, self.settings.wiki.clone())
    }

    /// Account directory over the configured storage
    pub fn users(&self) -> UserDirectory {
        UserDirectory::new(&self.storage)
    }

    /// Archive facade over the configured storage
    pub fn archive(&self) -> ArchiveStore {
        ArchiveStore::new(&self.storage)
    }

    /// Ranking engine configured from settings
    pub fn search_engine(&self) -> SearchEngine {
        SearchEngine::new(&self.settings.search)
    }
}
