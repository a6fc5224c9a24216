//! Database models for Course Market.
//!
//! These are the row types returned by SQLx queries.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::{Course, CredentialRecord};
use crate::error::MarketError;

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, MarketError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| MarketError::Internal(e.to_string()))
}

/// Database row for the admins and users tables.
#[derive(Debug, Clone, FromRow)]
pub struct CredentialRow {
    pub username: String,
    pub password_hash: String,
    pub created_at: String,
}

impl TryFrom<CredentialRow> for CredentialRecord {
    type Error = MarketError;

    fn try_from(row: CredentialRow) -> Result<Self, Self::Error> {
        Ok(CredentialRecord {
            username: row.username,
            password_hash: row.password_hash,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

/// Database row for the courses table.
#[derive(Debug, Clone, FromRow)]
pub struct CourseRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub image_link: String,
    pub published: bool,
    pub author: String,
    pub created_at: String,
}

impl TryFrom<CourseRow> for Course {
    type Error = MarketError;

    fn try_from(row: CourseRow) -> Result<Self, Self::Error> {
        Ok(Course {
            id: Uuid::parse_str(&row.id).map_err(|e| MarketError::Internal(e.to_string()))?,
            title: row.title,
            description: row.description,
            price: row.price,
            image_link: row.image_link,
            published: row.published,
            author: row.author,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}
