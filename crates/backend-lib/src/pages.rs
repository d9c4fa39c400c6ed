// ============================
// mdwiki-backend-lib/src/pages.rs
// ============================
//! Page facade: CRUD with identity/title invariants and pre-update archival.
use crate::archive::ArchiveStore;
use crate::config::WikiSettings;
use crate::error::AppError;
use crate::metrics as metric_keys;
use crate::store::{Collection, Filter, Storage};
use chrono::Utc;
use mdwiki_common::{Page, PagePatch, Stamp};
use metrics::counter;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

pub struct PageStore {
    col: Arc<dyn Collection>,
    archive: ArchiveStore,
    opts: WikiSettings,
}

impl PageStore {
    pub fn new<S: Storage>(storage: &S, opts: WikiSettings) -> Self {
        Self {
            col: storage.pages(),
            archive: ArchiveStore::new(storage),
            opts,
        }
    }

    /// Create a page. The id is a generated token, or the title itself when
    /// titles double as ids. Returns `None` on an id collision.
    pub async fn add(
        &self,
        title: &str,
        content: &str,
        author: &str,
    ) -> Result<Option<String>, AppError> {
        let page_id = if self.opts.separate_page_title_and_id {
            Uuid::new_v4().to_string()
        } else {
            title.to_string()
        };
        if self.col.count(&Filter::id(page_id.as_str())).await? > 0 {
            return Ok(None);
        }

        let stamp = Stamp {
            by: author.to_string(),
            date: Utc::now(),
        };
        let page = Page {
            id: page_id.clone(),
            title: title.to_string(),
            content: content.to_string(),
            update: stamp.clone(),
            create: stamp,
        };
        self.col.insert_one(serde_json::to_value(page)?).await?;
        counter!(metric_keys::PAGE_CREATED).increment(1);
        Ok(Some(page_id))
    }

    /// Apply a patch to an existing page. Returns the (possibly new) page id,
    /// or `None` when the page does not exist.
    ///
    /// The pre-update document is archived first when archiving is enabled.
    /// When titles double as ids and the title changes, the record moves to
    /// the new id via delete-then-reinsert; there is a window in which
    /// neither id resolves, and a crash between archive and upsert leaves
    /// only the snapshot behind.
    pub async fn update(
        &self,
        pid: &str,
        author: &str,
        patch: &PagePatch,
    ) -> Result<Option<String>, AppError> {
        let Some(value) = self.col.find_one(&Filter::id(pid)).await? else {
            return Ok(None);
        };
        let mut page: Page = serde_json::from_value(value)?;

        if self.opts.save_to_archive {
            self.archive.add(&page).await?;
        }

        let mut pid = pid.to_string();
        if !self.opts.separate_page_title_and_id {
            if let Some(title) = &patch.title {
                if *title != pid {
                    self.col.delete_one(&Filter::id(pid.as_str())).await?;
                    pid = title.clone();
                }
            }
        }

        page.id = pid.clone();
        if let Some(title) = &patch.title {
            page.title = title.clone();
        }
        if let Some(content) = &patch.content {
            page.content = content.clone();
        }
        page.update = Stamp {
            by: author.to_string(),
            date: Utc::now(),
        };

        self.col
            .update_one(&Filter::id(pid.as_str()), serde_json::to_value(page)?, true)
            .await?;
        counter!(metric_keys::PAGE_UPDATED).increment(1);
        Ok(Some(pid))
    }

    pub async fn get(&self, pid: &str) -> Result<Option<Page>, AppError> {
        match self.col.find_one(&Filter::id(pid)).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub async fn get_all(&self) -> Result<Vec<Page>, AppError> {
        self.col
            .find_all()
            .await?
            .into_iter()
            .map(|value| serde_json::from_value(value).map_err(AppError::from))
            .collect()
    }

    /// The `n` most recently updated pages, newest first
    pub async fn get_latest(&self, n: usize) -> Result<Vec<Page>, AppError> {
        let mut pages = self.get_all().await?;
        pages.sort_by(|a, b| b.update.date.cmp(&a.update.date));
        pages.truncate(n);
        Ok(pages)
    }

    /// All pages grouped by the uppercased first character of their title,
    /// keys ascending, store order within a bucket
    pub async fn get_all_as_index(&self) -> Result<BTreeMap<String, Vec<Page>>, AppError> {
        let mut index: BTreeMap<String, Vec<Page>> = BTreeMap::new();
        for page in self.get_all().await? {
            let key = page
                .title
                .chars()
                .next()
                .map(|c| c.to_uppercase().to_string())
                .unwrap_or_default();
            index.entry(key).or_default().push(page);
        }
        Ok(index)
    }
}
