//! Course domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{MarketError, MarketResult};

/// A course in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Course {
    /// Unique identifier.
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// Price in the catalog currency. Always positive.
    pub price: f64,
    /// Reference to the course cover image.
    pub image_link: String,
    /// Whether the course has been published.
    pub published: bool,
    /// Username of the owning administrator.
    pub author: String,
    /// When the course was created.
    pub created_at: DateTime<Utc>,
}

impl Course {
    /// Create an unpublished course owned by `author`.
    pub fn new(author: impl Into<String>, draft: CourseDraft) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: draft.title,
            description: draft.description,
            price: draft.price,
            image_link: draft.image_link,
            published: false,
            author: author.into(),
            created_at: Utc::now(),
        }
    }

    /// Whether `username` may edit this course.
    pub fn is_owned_by(&self, username: &str) -> bool {
        self.author == username
    }
}

/// Validated fields for a new course.
#[derive(Debug, Clone)]
pub struct CourseDraft {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub image_link: String,
}

impl CourseDraft {
    /// Build a draft, requiring every field.
    pub fn new(
        title: Option<String>,
        description: Option<String>,
        price: Option<f64>,
        image_link: Option<String>,
    ) -> MarketResult<Self> {
        let (Some(title), Some(description), Some(price), Some(image_link)) =
            (title, description, price, image_link)
        else {
            return Err(MarketError::Validation(
                "title, description, price and image_link are all required".to_string(),
            ));
        };

        let draft = Self {
            title: required_text("title", title)?,
            description: required_text("description", description)?,
            price: valid_price(price)?,
            image_link: required_text("image_link", image_link)?,
        };

        Ok(draft)
    }
}

/// Partial update of a course. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CoursePatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default, alias = "imageLink")]
    pub image_link: Option<String>,
    #[serde(default)]
    pub published: Option<bool>,
}

impl CoursePatch {
    /// Patch that only flips the course to published.
    pub fn publish() -> Self {
        Self {
            published: Some(true),
            ..Self::default()
        }
    }

    /// Check every supplied field.
    pub fn validate(&self) -> MarketResult<()> {
        if let Some(title) = &self.title {
            required_text("title", title.clone())?;
        }
        if let Some(description) = &self.description {
            required_text("description", description.clone())?;
        }
        if let Some(image_link) = &self.image_link {
            required_text("image_link", image_link.clone())?;
        }
        if let Some(price) = self.price {
            valid_price(price)?;
        }
        Ok(())
    }

    /// Apply supplied fields to `course`.
    pub fn apply(&self, course: &mut Course) {
        if let Some(title) = &self.title {
            course.title = title.trim().to_string();
        }
        if let Some(description) = &self.description {
            course.description = description.trim().to_string();
        }
        if let Some(price) = self.price {
            course.price = price;
        }
        if let Some(image_link) = &self.image_link {
            course.image_link = image_link.trim().to_string();
        }
        if let Some(published) = self.published {
            course.published = published;
        }
    }
}

fn required_text(field: &str, value: String) -> MarketResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(MarketError::Validation(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

fn valid_price(price: f64) -> MarketResult<f64> {
    if !price.is_finite() || price <= 0.0 {
        return Err(MarketError::Validation(format!(
            "price must be a positive number, got {}",
            price
        )));
    }
    Ok(price)
}
