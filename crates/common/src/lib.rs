// ================
// common/src/lib.rs
// ================
//! Common types and structures
//! shared between the mdwiki backend library and binary.
//! This module defines the stored document shapes and the HTTP payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Access level of a wiki account
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    /// May read pages and archives
    Viewer,
    /// May also create and edit pages
    Writer,
}

impl AccessLevel {
    /// Parse the wire form (`"viewer"` / `"writer"`).
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "viewer" => Some(AccessLevel::Viewer),
            "writer" => Some(AccessLevel::Writer),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AccessLevel::Viewer => "viewer",
            AccessLevel::Writer => "writer",
        }
    }
}

/// Author/time stamp attached to page creation and every update
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Stamp {
    /// Account id of the author
    pub by: String,
    /// UTC time of the action
    pub date: DateTime<Utc>,
}

/// A stored wiki page
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Page {
    /// Primary key; either a generated token or the title itself,
    /// depending on configuration
    pub id: String,
    pub title: String,
    /// Markup source text
    pub content: String,
    /// Last update stamp
    pub update: Stamp,
    /// Creation stamp; never changes after insert
    pub create: Stamp,
}

/// A stored wiki account
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    /// Primary key, an email-like string
    pub id: String,
    /// Display name
    pub name: String,
    /// Versioned password hash (`$1$...`), never plaintext
    pub password: String,
    pub level: AccessLevel,
}

/// Immutable snapshot of a page taken before an update overwrote it
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ArchiveEntry {
    /// Generated archive id
    pub id: String,
    /// UTC time the snapshot was taken
    pub date: DateTime<Utc>,
    /// The pre-update page document
    pub data: Page,
    /// Id of the page the snapshot came from
    pub page_id: String,
}

/// Per-field set-or-leave-unchanged patch applied by a page update
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct PagePatch {
    /// New title, or `None` to keep the current one
    pub title: Option<String>,
    /// New content, or `None` to keep the current one
    pub content: Option<String>,
}

impl PagePatch {
    pub fn title(value: impl Into<String>) -> Self {
        Self {
            title: Some(value.into()),
            content: None,
        }
    }

    pub fn content(value: impl Into<String>) -> Self {
        Self {
            title: None,
            content: Some(value.into()),
        }
    }
}

/// Body of `POST /login`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// IANA timezone name reported by the browser, echoed back on reads
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

/// Body of `POST /pages`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PageCreateRequest {
    pub title: String,
    pub content: String,
}

/// Body of `PUT /pages/{id}`; omitted fields keep their current value
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PageUpdateRequest {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Body of `POST /users`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserCreateRequest {
    pub email: String,
    pub name: String,
    pub password: String,
    pub password_confirm: String,
    /// Defaults to `writer`, matching the provisioning form
    pub level: Option<String>,
}

/// Body of `PUT /users/me`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserUpdateRequest {
    pub password: String,
    pub password_confirm: String,
}

/// Body of `DELETE /archives`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ArchivePurgeRequest {
    pub archive_ids: Vec<String>,
}

/// Listing form of a page (index and latest-pages views)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PageSummary {
    pub id: String,
    pub title: String,
    pub update: Stamp,
}

impl From<&Page> for PageSummary {
    fn from(page: &Page) -> Self {
        Self {
            id: page.id.clone(),
            title: page.title.clone(),
            update: page.update.clone(),
        }
    }
}

/// A page as returned to clients, with the rendered HTML fragment
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PageView {
    pub id: String,
    pub title: String,
    pub content: String,
    pub html: String,
    pub update: Stamp,
    pub create: Stamp,
    /// Display name of the last updater
    pub author_name: String,
}

/// One ranked search result
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SearchHit {
    pub id: String,
    pub title: String,
    /// Final relevance points after the AND/OR/NOT stages
    pub points: i64,
}

/// Response of `GET /search`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
    pub count: usize,
    /// Wall-clock seconds the scoring took
    pub seconds: f64,
    /// The raw query as submitted
    pub query: String,
}
