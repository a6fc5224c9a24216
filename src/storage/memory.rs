//! In-memory catalog store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{Course, CoursePatch, CredentialRecord, Role};
use crate::error::{MarketError, MarketResult};
use crate::storage::{CatalogStore, PurchaseOutcome, StorageBackend};

#[derive(Default)]
struct Collections {
    admins: HashMap<String, CredentialRecord>,
    users: HashMap<String, CredentialRecord>,
    /// Insertion order is creation order.
    courses: Vec<Course>,
    purchases: HashMap<String, Vec<Uuid>>,
}

impl Collections {
    fn credentials(&self, role: Role) -> &HashMap<String, CredentialRecord> {
        match role {
            Role::Admin => &self.admins,
            Role::User => &self.users,
        }
    }

    fn credentials_mut(&mut self, role: Role) -> &mut HashMap<String, CredentialRecord> {
        match role {
            Role::Admin => &mut self.admins,
            Role::User => &mut self.users,
        }
    }

    fn course(&self, id: Uuid) -> Option<&Course> {
        self.courses.iter().find(|c| c.id == id)
    }
}

/// Store keeping every collection behind a single lock.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    fn backend(&self) -> StorageBackend {
        StorageBackend::Memory
    }

    async fn find_credential(
        &self,
        role: Role,
        username: &str,
    ) -> MarketResult<Option<CredentialRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.credentials(role).get(username).cloned())
    }

    async fn insert_credential(&self, role: Role, record: CredentialRecord) -> MarketResult<()> {
        let mut inner = self.inner.write().await;
        let store = inner.credentials_mut(role);

        if store.contains_key(&record.username) {
            return Err(MarketError::Conflict(format!(
                "Username {} already exists",
                record.username
            )));
        }
        store.insert(record.username.clone(), record);

        Ok(())
    }

    async fn insert_course(&self, course: &Course) -> MarketResult<()> {
        let mut inner = self.inner.write().await;
        inner.courses.push(course.clone());
        Ok(())
    }

    async fn update_course(
        &self,
        id: Uuid,
        author: &str,
        patch: &CoursePatch,
    ) -> MarketResult<Course> {
        let mut inner = self.inner.write().await;
        let course = inner
            .courses
            .iter_mut()
            .find(|c| c.id == id && c.is_owned_by(author))
            .ok_or_else(|| MarketError::NotFound(format!("Course {} not found", id)))?;

        patch.apply(course);

        Ok(course.clone())
    }

    async fn list_courses(&self, author: Option<&str>) -> MarketResult<Vec<Course>> {
        let inner = self.inner.read().await;
        Ok(inner
            .courses
            .iter()
            .filter(|c| author.map_or(true, |a| c.is_owned_by(a)))
            .cloned()
            .collect())
    }

    async fn record_purchase(
        &self,
        username: &str,
        course_id: Uuid,
    ) -> MarketResult<PurchaseOutcome> {
        let mut inner = self.inner.write().await;

        if !inner.users.contains_key(username) {
            return Err(MarketError::NotFound(format!("User {} not found", username)));
        }
        if inner.course(course_id).is_none() {
            return Err(MarketError::NotFound(format!(
                "Course {} not found",
                course_id
            )));
        }

        let owned = inner.purchases.entry(username.to_string()).or_default();
        if owned.contains(&course_id) {
            return Ok(PurchaseOutcome::AlreadyOwned);
        }
        owned.push(course_id);

        Ok(PurchaseOutcome::Recorded)
    }

    async fn list_purchases(&self, username: &str) -> MarketResult<Vec<Course>> {
        let inner = self.inner.read().await;
        let Some(owned) = inner.purchases.get(username) else {
            return Ok(Vec::new());
        };

        Ok(owned
            .iter()
            .filter_map(|id| inner.course(*id).cloned())
            .collect())
    }
}
