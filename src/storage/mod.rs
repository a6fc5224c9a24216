//! Storage layer for Course Market.
//!
//! Route logic talks to a [`CatalogStore`] trait object; the persistence
//! strategy (memory, JSON documents, SQLite) is chosen once at startup.

mod json_file;
mod memory;
mod models;
mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::domain::{Course, CoursePatch, CredentialRecord, Role};
use crate::error::MarketResult;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Available persistence strategies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Process-local collections, lost on restart.
    #[default]
    Memory,
    /// One JSON document per collection, rewritten on every mutation.
    JsonFile,
    /// SQLite database via sqlx.
    Sqlite,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Memory => write!(f, "memory"),
            StorageBackend::JsonFile => write!(f, "json_file"),
            StorageBackend::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Result of recording a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseOutcome {
    /// The pair was appended.
    Recorded,
    /// The user already owned the course; nothing changed.
    AlreadyOwned,
}

/// Persistence operations used by the auth gate and route handlers.
///
/// Every method is atomic from the caller's point of view.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Which strategy backs this store.
    fn backend(&self) -> StorageBackend;

    /// Look up a credential record in `role`'s store.
    async fn find_credential(
        &self,
        role: Role,
        username: &str,
    ) -> MarketResult<Option<CredentialRecord>>;

    /// Insert a credential record; `Conflict` if the username is taken in that role.
    async fn insert_credential(&self, role: Role, record: CredentialRecord) -> MarketResult<()>;

    /// Persist a new course.
    async fn insert_course(&self, course: &Course) -> MarketResult<()>;

    /// Apply `patch` to a course owned by `author` and return the result.
    ///
    /// `NotFound` if the course does not exist or belongs to someone else.
    async fn update_course(
        &self,
        id: Uuid,
        author: &str,
        patch: &CoursePatch,
    ) -> MarketResult<Course>;

    /// List courses in creation order, optionally only those by `author`.
    async fn list_courses(&self, author: Option<&str>) -> MarketResult<Vec<Course>>;

    /// Record that `username` bought `course_id`, at most once.
    ///
    /// `NotFound` if the user or the course does not exist.
    async fn record_purchase(
        &self,
        username: &str,
        course_id: Uuid,
    ) -> MarketResult<PurchaseOutcome>;

    /// Courses bought by `username`, in purchase order.
    async fn list_purchases(&self, username: &str) -> MarketResult<Vec<Course>>;
}

/// Build the store selected by configuration.
pub async fn open_store(config: &StorageConfig) -> MarketResult<Arc<dyn CatalogStore>> {
    let store: Arc<dyn CatalogStore> = match config.backend {
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
        StorageBackend::JsonFile => Arc::new(JsonFileStore::open(&config.data_dir).await?),
        StorageBackend::Sqlite => {
            let store = SqliteStore::connect(&config.database_url).await?;
            store.init_schema().await?;
            Arc::new(store)
        }
    };

    tracing::info!(backend = %store.backend(), "Catalog store ready");

    Ok(store)
}
