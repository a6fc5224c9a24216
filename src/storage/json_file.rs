//! Flat JSON document store.
//!
//! Three documents (`admins.json`, `users.json`, `courses.json`) each hold an
//! array of records and are rewritten wholesale on every mutation. Mutations
//! are serialized through one writer lock, and each rewrite lands in a
//! temporary file that is renamed over the document.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::{Course, CoursePatch, CredentialRecord, Role};
use crate::error::{MarketError, MarketResult};
use crate::storage::{CatalogStore, PurchaseOutcome, StorageBackend};

const COURSES_DOCUMENT: &str = "courses";

/// On-disk shape of an account; users carry their purchased course ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AccountDocument {
    username: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    courses: Vec<Uuid>,
}

impl From<AccountDocument> for CredentialRecord {
    fn from(doc: AccountDocument) -> Self {
        CredentialRecord {
            username: doc.username,
            password_hash: doc.password_hash,
            created_at: doc.created_at,
        }
    }
}

impl From<CredentialRecord> for AccountDocument {
    fn from(record: CredentialRecord) -> Self {
        AccountDocument {
            username: record.username,
            password_hash: record.password_hash,
            created_at: record.created_at,
            courses: Vec::new(),
        }
    }
}

/// Store persisting each collection as one JSON document.
pub struct JsonFileStore {
    dir: PathBuf,
    writer: Mutex<()>,
}

impl JsonFileStore {
    /// Open (creating if needed) the data directory.
    pub async fn open(dir: impl AsRef<Path>) -> MarketResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;

        tracing::debug!(dir = %dir.display(), "Opened JSON document store");

        Ok(Self {
            dir,
            writer: Mutex::new(()),
        })
    }

    fn document_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }

    /// Read a whole document. A missing document is an empty collection.
    async fn read_document<T: DeserializeOwned>(&self, name: &str) -> MarketResult<Vec<T>> {
        let path = self.document_path(name);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace a whole document. Callers must hold the writer lock.
    async fn write_document<T: Serialize>(&self, name: &str, records: &[T]) -> MarketResult<()> {
        let path = self.document_path(name);
        let staging = self.dir.join(format!(".{}.json.tmp", name));

        let bytes = serde_json::to_vec_pretty(records)?;

        // The staged bytes must be durable before the rename publishes them.
        let mut file = tokio::fs::File::create(&staging).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&staging, &path).await?;

        Ok(())
    }
}

#[async_trait]
impl CatalogStore for JsonFileStore {
    fn backend(&self) -> StorageBackend {
        StorageBackend::JsonFile
    }

    async fn find_credential(
        &self,
        role: Role,
        username: &str,
    ) -> MarketResult<Option<CredentialRecord>> {
        let accounts: Vec<AccountDocument> = self.read_document(role.store_name()).await?;
        Ok(accounts
            .into_iter()
            .find(|a| a.username == username)
            .map(Into::into))
    }

    async fn insert_credential(&self, role: Role, record: CredentialRecord) -> MarketResult<()> {
        let _guard = self.writer.lock().await;
        let mut accounts: Vec<AccountDocument> = self.read_document(role.store_name()).await?;

        if accounts.iter().any(|a| a.username == record.username) {
            return Err(MarketError::Conflict(format!(
                "Username {} already exists",
                record.username
            )));
        }
        accounts.push(record.into());

        self.write_document(role.store_name(), &accounts).await
    }

    async fn insert_course(&self, course: &Course) -> MarketResult<()> {
        let _guard = self.writer.lock().await;
        let mut courses: Vec<Course> = self.read_document(COURSES_DOCUMENT).await?;
        courses.push(course.clone());
        self.write_document(COURSES_DOCUMENT, &courses).await
    }

    async fn update_course(
        &self,
        id: Uuid,
        author: &str,
        patch: &CoursePatch,
    ) -> MarketResult<Course> {
        let _guard = self.writer.lock().await;
        let mut courses: Vec<Course> = self.read_document(COURSES_DOCUMENT).await?;

        let course = courses
            .iter_mut()
            .find(|c| c.id == id && c.is_owned_by(author))
            .ok_or_else(|| MarketError::NotFound(format!("Course {} not found", id)))?;
        patch.apply(course);
        let updated = course.clone();

        self.write_document(COURSES_DOCUMENT, &courses).await?;

        Ok(updated)
    }

    async fn list_courses(&self, author: Option<&str>) -> MarketResult<Vec<Course>> {
        let courses: Vec<Course> = self.read_document(COURSES_DOCUMENT).await?;
        Ok(courses
            .into_iter()
            .filter(|c| author.map_or(true, |a| c.is_owned_by(a)))
            .collect())
    }

    async fn record_purchase(
        &self,
        username: &str,
        course_id: Uuid,
    ) -> MarketResult<PurchaseOutcome> {
        let _guard = self.writer.lock().await;
        let users_document = Role::User.store_name();

        let courses: Vec<Course> = self.read_document(COURSES_DOCUMENT).await?;
        if !courses.iter().any(|c| c.id == course_id) {
            return Err(MarketError::NotFound(format!(
                "Course {} not found",
                course_id
            )));
        }

        let mut users: Vec<AccountDocument> = self.read_document(users_document).await?;
        let user = users
            .iter_mut()
            .find(|u| u.username == username)
            .ok_or_else(|| MarketError::NotFound(format!("User {} not found", username)))?;

        if user.courses.contains(&course_id) {
            return Ok(PurchaseOutcome::AlreadyOwned);
        }
        user.courses.push(course_id);

        self.write_document(users_document, &users).await?;

        Ok(PurchaseOutcome::Recorded)
    }

    async fn list_purchases(&self, username: &str) -> MarketResult<Vec<Course>> {
        let users: Vec<AccountDocument> = self.read_document(Role::User.store_name()).await?;
        let Some(user) = users.into_iter().find(|u| u.username == username) else {
            return Ok(Vec::new());
        };

        let courses: Vec<Course> = self.read_document(COURSES_DOCUMENT).await?;
        Ok(user
            .courses
            .iter()
            .filter_map(|id| courses.iter().find(|c| c.id == *id).cloned())
            .collect())
    }
}
