// ============================
// mdwiki-backend-lib/src/archive.rs
// ============================
//! Append-only page snapshots.
//!
//! An entry is written before every page update overwrites a document.
//! Entries are never mutated; they leave the store only through an explicit
//! purge.
use crate::error::AppError;
use crate::metrics as metric_keys;
use crate::store::{Collection, Filter, Storage};
use chrono::Utc;
use mdwiki_common::{ArchiveEntry, Page};
use metrics::counter;
use std::sync::Arc;
use uuid::Uuid;

pub struct ArchiveStore {
    col: Arc<dyn Collection>,
}

impl ArchiveStore {
    pub fn new<S: Storage>(storage: &S) -> Self {
        Self {
            col: storage.archive(),
        }
    }

    /// Snapshot a page document as it is right now
    pub async fn add(&self, page: &Page) -> Result<String, AppError> {
        let entry = ArchiveEntry {
            id: Uuid::new_v4().to_string(),
            date: Utc::now(),
            data: page.clone(),
            page_id: page.id.clone(),
        };
        let aid = entry.id.clone();
        self.col.insert_one(serde_json::to_value(entry)?).await?;
        counter!(metric_keys::PAGE_ARCHIVED).increment(1);
        Ok(aid)
    }

    pub async fn get(&self, aid: &str) -> Result<Option<ArchiveEntry>, AppError> {
        match self.col.find_one(&Filter::id(aid)).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Every snapshot taken from one page, in archival order
    pub async fn get_by_page(&self, pid: &str) -> Result<Vec<ArchiveEntry>, AppError> {
        self.col
            .find_many(&Filter::page_id(pid))
            .await?
            .into_iter()
            .map(|value| serde_json::from_value(value).map_err(AppError::from))
            .collect()
    }

    /// Explicit purge of one entry
    pub async fn remove(&self, aid: &str) -> Result<(), AppError> {
        self.col.delete_one(&Filter::id(aid)).await
    }

    /// Explicit purge of several entries at once
    pub async fn remove_many(&self, aids: &[String]) -> Result<(), AppError> {
        let filters: Vec<Filter> = aids.iter().map(|aid| Filter::id(aid.as_str())).collect();
        self.col.delete_many(&filters).await
    }
}
