// ============================
// mdwiki-backend-lib/src/store.rs
// ============================
//! Storage abstraction with flat-file and in-memory implementations.
//!
//! Documents are schemaless JSON objects; filtering is exact-match on the
//! indexed fields (`id`, `page_id`). Concurrent updates to the same document
//! race at this layer and the last writer wins.
use crate::error::AppError;
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::{fs, io::ErrorKind};
use tokio::fs as tokio_fs;
use tokio::sync::RwLock;

/// Exact-match filter on a single indexed field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub field: &'static str,
    pub value: String,
}

impl Filter {
    /// Filter on the primary key field
    pub fn id(value: impl Into<String>) -> Self {
        Self {
            field: "id",
            value: value.into(),
        }
    }

    /// Filter on the originating-page field of archive entries
    pub fn page_id(value: impl Into<String>) -> Self {
        Self {
            field: "page_id",
            value: value.into(),
        }
    }

    fn matches(&self, doc: &Value) -> bool {
        doc.get(self.field).and_then(Value::as_str) == Some(self.value.as_str())
    }
}

/// Trait for a single document collection
#[async_trait]
pub trait Collection: Send + Sync {
    /// First document matching the filter, in insertion order
    async fn find_one(&self, filter: &Filter) -> Result<Option<Value>, AppError>;

    /// All documents matching the filter, in insertion order
    async fn find_many(&self, filter: &Filter) -> Result<Vec<Value>, AppError>;

    /// Every document in the collection, in insertion order
    async fn find_all(&self) -> Result<Vec<Value>, AppError>;

    /// Append a document
    async fn insert_one(&self, doc: Value) -> Result<(), AppError>;

    /// Replace the first matching document; with `upsert`, append when
    /// nothing matches
    async fn update_one(&self, filter: &Filter, doc: Value, upsert: bool) -> Result<(), AppError>;

    /// Remove the first matching document
    async fn delete_one(&self, filter: &Filter) -> Result<(), AppError>;

    /// Remove every document matching any of the filters
    async fn delete_many(&self, filters: &[Filter]) -> Result<(), AppError>;

    /// Number of documents matching the filter
    async fn count(&self, filter: &Filter) -> Result<usize, AppError>;
}

/// Handles to the three wiki collections
pub trait Storage: Send + Sync + Clone {
    fn pages(&self) -> Arc<dyn Collection>;
    fn users(&self) -> Arc<dyn Collection>;
    fn archive(&self) -> Arc<dyn Collection>;
}

/// Flat-file implementation: one JSON array file per collection
pub struct FlatFileCollection {
    path: PathBuf,
    // Guards the read-modify-write cycle against concurrent mutators;
    // the file on disk is only ever written under the write half.
    docs: RwLock<Vec<Value>>,
}

impl FlatFileCollection {
    /// Open (or create) the collection file under `root`
    pub fn open<P: AsRef<Path>>(root: P, name: &str) -> Result<Self, AppError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        let path = root.join(format!("{name}.json"));
        let docs = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            docs: RwLock::new(docs),
        })
    }

    async fn persist(&self, docs: &[Value]) -> Result<(), AppError> {
        let json = serde_json::to_string_pretty(docs)?;
        tokio_fs::write(&self.path, json).await?;
        Ok(())
    }
}

#[async_trait]
impl Collection for FlatFileCollection {
    async fn find_one(&self, filter: &Filter) -> Result<Option<Value>, AppError> {
        let docs = self.docs.read().await;
        Ok(docs.iter().find(|d| filter.matches(d)).cloned())
    }

    async fn find_many(&self, filter: &Filter) -> Result<Vec<Value>, AppError> {
        let docs = self.docs.read().await;
        Ok(docs.iter().filter(|d| filter.matches(d)).cloned().collect())
    }

    async fn find_all(&self) -> Result<Vec<Value>, AppError> {
        let docs = self.docs.read().await;
        Ok(docs.clone())
    }

    async fn insert_one(&self, doc: Value) -> Result<(), AppError> {
        let mut docs = self.docs.write().await;
        docs.push(doc);
        self.persist(&docs).await
    }

    async fn update_one(&self, filter: &Filter, doc: Value, upsert: bool) -> Result<(), AppError> {
        let mut docs = self.docs.write().await;
        match docs.iter_mut().find(|d| filter.matches(d)) {
            Some(slot) => *slot = doc,
            None if upsert => docs.push(doc),
            None => return Ok(()),
        }
        self.persist(&docs).await
    }

    async fn delete_one(&self, filter: &Filter) -> Result<(), AppError> {
        let mut docs = self.docs.write().await;
        if let Some(pos) = docs.iter().position(|d| filter.matches(d)) {
            docs.remove(pos);
            self.persist(&docs).await?;
        }
        Ok(())
    }

    async fn delete_many(&self, filters: &[Filter]) -> Result<(), AppError> {
        let mut docs = self.docs.write().await;
        let before = docs.len();
        docs.retain(|d| !filters.iter().any(|f| f.matches(d)));
        if docs.len() != before {
            self.persist(&docs).await?;
        }
        Ok(())
    }

    async fn count(&self, filter: &Filter) -> Result<usize, AppError> {
        let docs = self.docs.read().await;
        Ok(docs.iter().filter(|d| filter.matches(d)).count())
    }
}

/// Flat-file implementation of [`Storage`]
#[derive(Clone)]
pub struct FlatFileStorage {
    pages: Arc<FlatFileCollection>,
    users: Arc<FlatFileCollection>,
    archive: Arc<FlatFileCollection>,
}

impl FlatFileStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, AppError> {
        let root = root.as_ref();
        Ok(Self {
            pages: Arc::new(FlatFileCollection::open(root, "pages")?),
            users: Arc::new(FlatFileCollection::open(root, "users")?),
            archive: Arc::new(FlatFileCollection::open(root, "archive")?),
        })
    }
}

impl Storage for FlatFileStorage {
    fn pages(&self) -> Arc<dyn Collection> {
        self.pages.clone()
    }

    fn users(&self) -> Arc<dyn Collection> {
        self.users.clone()
    }

    fn archive(&self) -> Arc<dyn Collection> {
        self.archive.clone()
    }
}

/// In-memory implementation, used by tests and available as a backend
#[derive(Default)]
pub struct MemoryCollection {
    docs: parking_lot::RwLock<Vec<Value>>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Collection for MemoryCollection {
    async fn find_one(&self, filter: &Filter) -> Result<Option<Value>, AppError> {
        Ok(self.docs.read().iter().find(|d| filter.matches(d)).cloned())
    }

    async fn find_many(&self, filter: &Filter) -> Result<Vec<Value>, AppError> {
        Ok(self
            .docs
            .read()
            .iter()
            .filter(|d| filter.matches(d))
            .cloned()
            .collect())
    }

    async fn find_all(&self) -> Result<Vec<Value>, AppError> {
        Ok(self.docs.read().clone())
    }

    async fn insert_one(&self, doc: Value) -> Result<(), AppError> {
        self.docs.write().push(doc);
        Ok(())
    }

    async fn update_one(&self, filter: &Filter, doc: Value, upsert: bool) -> Result<(), AppError> {
        let mut docs = self.docs.write();
        match docs.iter_mut().find(|d| filter.matches(d)) {
            Some(slot) => *slot = doc,
            None if upsert => docs.push(doc),
            None => {},
        }
        Ok(())
    }

    async fn delete_one(&self, filter: &Filter) -> Result<(), AppError> {
        let mut docs = self.docs.write();
        if let Some(pos) = docs.iter().position(|d| filter.matches(d)) {
            docs.remove(pos);
        }
        Ok(())
    }

    async fn delete_many(&self, filters: &[Filter]) -> Result<(), AppError> {
        self.docs
            .write()
            .retain(|d| !filters.iter().any(|f| f.matches(d)));
        Ok(())
    }

    async fn count(&self, filter: &Filter) -> Result<usize, AppError> {
        Ok(self.docs.read().iter().filter(|d| filter.matches(d)).count())
    }
}

/// In-memory implementation of [`Storage`]
#[derive(Clone, Default)]
pub struct MemoryStorage {
    pages: Arc<MemoryCollection>,
    users: Arc<MemoryCollection>,
    archive: Arc<MemoryCollection>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn pages(&self) -> Arc<dyn Collection> {
        self.pages.clone()
    }

    fn users(&self) -> Arc<dyn Collection> {
        self.users.clone()
    }

    fn archive(&self) -> Arc<dyn Collection> {
        self.archive.clone()
    }
}
