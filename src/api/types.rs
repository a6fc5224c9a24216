//! API request and response types.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{Course, CourseDraft};
use crate::error::MarketResult;

// ==================== Accounts ====================

/// Signup or login credential pair.
///
/// Fields are optional so a missing one is reported as a validation error.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Generic acknowledgement.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Login response.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub message: String,
    /// Signed session token.
    pub token: String,
    /// Token lifetime in seconds.
    pub expires_in: i64,
}

// ==================== Courses ====================

/// Request to create a course.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCourseRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default, alias = "imageLink")]
    pub image_link: Option<String>,
}

impl CreateCourseRequest {
    pub fn into_draft(self) -> MarketResult<CourseDraft> {
        CourseDraft::new(self.title, self.description, self.price, self.image_link)
    }
}

/// Response after creating a course.
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateCourseResponse {
    pub message: String,
    pub course_id: Uuid,
}

/// A list of courses.
#[derive(Debug, Serialize, ToSchema)]
pub struct CourseListResponse {
    pub courses: Vec<Course>,
}

/// Response after a purchase.
#[derive(Debug, Serialize, ToSchema)]
pub struct PurchaseResponse {
    pub message: String,
    pub course_id: Uuid,
}

/// Courses bought by the caller.
#[derive(Debug, Serialize, ToSchema)]
pub struct PurchasedCoursesResponse {
    pub purchased_courses: Vec<Course>,
}

// ==================== Health ====================

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Active storage backend.
    pub storage: String,
    /// Timestamp.
    pub timestamp: String,
}
