//! SQLite catalog store.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use uuid::Uuid;

use crate::domain::{Course, CoursePatch, CredentialRecord, Role};
use crate::error::{MarketError, MarketResult};
use crate::storage::models::{CourseRow, CredentialRow};
use crate::storage::{CatalogStore, PurchaseOutcome, StorageBackend};

/// How long a connection waits for another writer before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens a write transaction; read-then-write operations must not start deferred.
const BEGIN_WRITE: &str = "BEGIN IMMEDIATE";

/// Repository for all Course Market database operations.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new store with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to `url`, creating the database file if needed.
    pub async fn connect(url: &str) -> MarketResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);

        // Every connection to `:memory:` is its own database.
        let pool = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        Ok(Self::new(pool))
    }

    /// Initialize the database schema.
    pub async fn init_schema(&self) -> MarketResult<()> {
        for role in [Role::Admin, Role::User] {
            sqlx::query(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS {} (
                    username TEXT PRIMARY KEY,
                    password_hash TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );
                "#,
                role.store_name()
            ))
            .execute(&self.pool)
            .await?;
        }

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS courses (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                price REAL NOT NULL,
                image_link TEXT NOT NULL,
                published INTEGER NOT NULL DEFAULT 0,
                author TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_courses_author ON courses(author);
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS purchases (
                username TEXT NOT NULL,
                course_id TEXT NOT NULL,
                purchased_at TEXT NOT NULL,
                PRIMARY KEY (username, course_id),
                FOREIGN KEY (username) REFERENCES users(username),
                FOREIGN KEY (course_id) REFERENCES courses(id)
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl CatalogStore for SqliteStore {
    fn backend(&self) -> StorageBackend {
        StorageBackend::Sqlite
    }

    async fn find_credential(
        &self,
        role: Role,
        username: &str,
    ) -> MarketResult<Option<CredentialRecord>> {
        let row: Option<CredentialRow> = sqlx::query_as(&format!(
            "SELECT username, password_hash, created_at FROM {} WHERE username = ?",
            role.store_name()
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn insert_credential(&self, role: Role, record: CredentialRecord) -> MarketResult<()> {
        let result = sqlx::query(&format!(
            "INSERT INTO {} (username, password_hash, created_at) VALUES (?, ?, ?)",
            role.store_name()
        ))
        .bind(&record.username)
        .bind(&record.password_hash)
        .bind(record.created_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(
                MarketError::Conflict(format!("Username {} already exists", record.username)),
            ),
            Err(e) => Err(e.into()),
        }
    }

    async fn insert_course(&self, course: &Course) -> MarketResult<()> {
        sqlx::query(
            r#"
            INSERT INTO courses (id, title, description, price, image_link, published, author, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(course.id.to_string())
        .bind(&course.title)
        .bind(&course.description)
        .bind(course.price)
        .bind(&course.image_link)
        .bind(course.published)
        .bind(&course.author)
        .bind(course.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_course(
        &self,
        id: Uuid,
        author: &str,
        patch: &CoursePatch,
    ) -> MarketResult<Course> {
        let mut tx = self.pool.begin_with(BEGIN_WRITE).await?;

        let row: CourseRow = sqlx::query_as("SELECT * FROM courses WHERE id = ? AND author = ?")
            .bind(id.to_string())
            .bind(author)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| MarketError::NotFound(format!("Course {} not found", id)))?;

        let mut course: Course = row.try_into()?;
        patch.apply(&mut course);

        sqlx::query(
            r#"
            UPDATE courses
            SET title = ?, description = ?, price = ?, image_link = ?, published = ?
            WHERE id = ?
            "#,
        )
        .bind(&course.title)
        .bind(&course.description)
        .bind(course.price)
        .bind(&course.image_link)
        .bind(course.published)
        .bind(id.to_string())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(course)
    }

    async fn list_courses(&self, author: Option<&str>) -> MarketResult<Vec<Course>> {
        let rows: Vec<CourseRow> = match author {
            Some(author) => {
                sqlx::query_as("SELECT * FROM courses WHERE author = ? ORDER BY rowid ASC")
                    .bind(author)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_as("SELECT * FROM courses ORDER BY rowid ASC")
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn record_purchase(
        &self,
        username: &str,
        course_id: Uuid,
    ) -> MarketResult<PurchaseOutcome> {
        let mut tx = self.pool.begin_with(BEGIN_WRITE).await?;

        let user: Option<(String,)> = sqlx::query_as("SELECT username FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&mut *tx)
            .await?;
        if user.is_none() {
            return Err(MarketError::NotFound(format!("User {} not found", username)));
        }

        let course: Option<(String,)> = sqlx::query_as("SELECT id FROM courses WHERE id = ?")
            .bind(course_id.to_string())
            .fetch_optional(&mut *tx)
            .await?;
        if course.is_none() {
            return Err(MarketError::NotFound(format!(
                "Course {} not found",
                course_id
            )));
        }

        let result = sqlx::query(
            "INSERT OR IGNORE INTO purchases (username, course_id, purchased_at) VALUES (?, ?, ?)",
        )
        .bind(username)
        .bind(course_id.to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        if result.rows_affected() == 0 {
            Ok(PurchaseOutcome::AlreadyOwned)
        } else {
            Ok(PurchaseOutcome::Recorded)
        }
    }

    async fn list_purchases(&self, username: &str) -> MarketResult<Vec<Course>> {
        let rows: Vec<CourseRow> = sqlx::query_as(
            r#"
            SELECT c.* FROM courses c
            JOIN purchases p ON c.id = p.course_id
            WHERE p.username = ?
            ORDER BY p.rowid ASC
            "#,
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
