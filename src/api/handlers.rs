//! HTTP request handlers.

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use uuid::Uuid;

use crate::api::types::*;
use crate::auth::{RoleGate, PASSWORD_HEADER, TOKEN_LIFETIME_SECS, USERNAME_HEADER};
use crate::domain::{Course, CoursePatch, Identity, Role};
use crate::error::{MarketError, MarketResult};
use crate::storage::PurchaseOutcome;
use crate::AppState;

impl CredentialsRequest {
    /// Both halves, trimmed and non-empty.
    fn into_pair(self) -> MarketResult<(String, String)> {
        let username = self.username.map(|u| u.trim().to_string());
        let password = self.password;

        match (username, password) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => Ok((u, p)),
            _ => Err(MarketError::Validation(
                "Username and password are required".to_string(),
            )),
        }
    }
}

/// Read a login pair from the `username`/`password` headers, falling back to a JSON body.
fn login_pair(headers: &HeaderMap, body: &[u8]) -> MarketResult<(String, String)> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    };

    let mut request = CredentialsRequest {
        username: header(USERNAME_HEADER),
        password: header(PASSWORD_HEADER),
    };

    if request.username.is_none() && request.password.is_none() && !body.is_empty() {
        request = serde_json::from_slice(body)
            .map_err(|e| MarketError::Validation(format!("Invalid credentials body: {}", e)))?;
    }

    request.into_pair()
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::Admin => "Admin",
        Role::User => "User",
    }
}

async fn signup(
    gate: &RoleGate,
    request: CredentialsRequest,
) -> MarketResult<(StatusCode, Json<MessageResponse>)> {
    let (username, password) = request.into_pair()?;

    gate.register(&username, &password).await.map_err(|e| {
        if matches!(e, MarketError::Conflict(_)) {
            tracing::warn!(role = %gate.role(), username = %username, "Signup for existing username");
        }
        e
    })?;

    tracing::info!(role = %gate.role(), username = %username, "Account created");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: format!("{} signed up successfully", role_label(gate.role())),
        }),
    ))
}

async fn login(gate: &RoleGate, headers: &HeaderMap, body: &[u8]) -> MarketResult<Json<LoginResponse>> {
    let (username, password) = login_pair(headers, body)?;

    let token = gate.login(&username, &password).await.map_err(|e| {
        if matches!(e, MarketError::InvalidCredential) {
            tracing::warn!(role = %gate.role(), username = %username, "Failed login attempt");
        }
        e
    })?;

    tracing::info!(role = %gate.role(), username = %username, "Logged in");

    Ok(Json(LoginResponse {
        message: format!("{} logged in successfully", role_label(gate.role())),
        token,
        expires_in: TOKEN_LIFETIME_SECS,
    }))
}

// ==================== Health ====================

/// Health check endpoint.
///
/// GET /health
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        storage: state.store.backend().to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

// ==================== Admin Endpoints ====================

/// Create an administrator account.
///
/// POST /admin/signup
#[utoipa::path(
    post,
    path = "/admin/signup",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "Admin created", body = MessageResponse),
        (status = 400, description = "Username or password missing"),
        (status = 409, description = "Username already exists")
    ),
    tag = "admin"
)]
pub async fn admin_signup(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> MarketResult<(StatusCode, Json<MessageResponse>)> {
    let Json(request) = payload?;
    signup(&state.admin_gate, request).await
}

/// Log in as an administrator.
///
/// POST /admin/login
#[utoipa::path(
    post,
    path = "/admin/login",
    params(
        ("username" = Option<String>, Header, description = "Admin username"),
        ("password" = Option<String>, Header, description = "Admin password")
    ),
    request_body(content = CredentialsRequest, description = "Used when the headers are absent"),
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Username or password missing"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "admin"
)]
pub async fn admin_login(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> MarketResult<Json<LoginResponse>> {
    login(&state.admin_gate, &headers, &body).await
}

/// Create a course owned by the caller.
///
/// POST /admin/courses
#[utoipa::path(
    post,
    path = "/admin/courses",
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Course created", body = CreateCourseResponse),
        (status = 400, description = "Missing or invalid fields"),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn create_course(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<CreateCourseRequest>, JsonRejection>,
) -> MarketResult<(StatusCode, Json<CreateCourseResponse>)> {
    let Json(request) = payload?;
    let draft = request.into_draft()?;
    let course = Course::new(identity.username.as_str(), draft);

    state.store.insert_course(&course).await?;

    tracing::info!(
        course_id = %course.id,
        author = %course.author,
        title = %course.title,
        "Course created"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateCourseResponse {
            message: "Course created successfully".to_string(),
            course_id: course.id,
        }),
    ))
}

/// Update the supplied fields of a course owned by the caller.
///
/// PUT /admin/courses/{id}
#[utoipa::path(
    put,
    path = "/admin/courses/{id}",
    params(
        ("id" = Uuid, Path, description = "Course ID")
    ),
    request_body = CoursePatch,
    responses(
        (status = 200, description = "Course updated", body = Course),
        (status = 400, description = "Invalid field value"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Course not found")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn update_course(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    payload: Result<Json<CoursePatch>, JsonRejection>,
) -> MarketResult<Json<Course>> {
    let Json(patch) = payload?;
    patch.validate()?;

    let course = state
        .store
        .update_course(id, &identity.username, &patch)
        .await?;

    tracing::info!(course_id = %id, author = %identity.username, "Course updated");

    Ok(Json(course))
}

/// Publish a course owned by the caller.
///
/// PUT /admin/courses/{id}/publish
#[utoipa::path(
    put,
    path = "/admin/courses/{id}/publish",
    params(
        ("id" = Uuid, Path, description = "Course ID")
    ),
    responses(
        (status = 200, description = "Course published", body = Course),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Course not found")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn publish_course(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> MarketResult<Json<Course>> {
    let course = state
        .store
        .update_course(id, &identity.username, &CoursePatch::publish())
        .await?;

    tracing::info!(course_id = %id, author = %identity.username, "Course published");

    Ok(Json(course))
}

/// List the caller's courses.
///
/// GET /admin/courses
#[utoipa::path(
    get,
    path = "/admin/courses",
    responses(
        (status = 200, description = "Courses authored by the caller", body = CourseListResponse),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn list_admin_courses(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> MarketResult<Json<CourseListResponse>> {
    let courses = state.store.list_courses(Some(&identity.username)).await?;
    Ok(Json(CourseListResponse { courses }))
}

// ==================== User Endpoints ====================

/// Create a user account.
///
/// POST /users/signup
#[utoipa::path(
    post,
    path = "/users/signup",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "User created", body = MessageResponse),
        (status = 400, description = "Username or password missing"),
        (status = 409, description = "Username already exists")
    ),
    tag = "users"
)]
pub async fn user_signup(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> MarketResult<(StatusCode, Json<MessageResponse>)> {
    let Json(request) = payload?;
    signup(&state.user_gate, request).await
}

/// Log in as a user.
///
/// POST /users/login
#[utoipa::path(
    post,
    path = "/users/login",
    params(
        ("username" = Option<String>, Header, description = "Username"),
        ("password" = Option<String>, Header, description = "Password")
    ),
    request_body(content = CredentialsRequest, description = "Used when the headers are absent"),
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Username or password missing"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "users"
)]
pub async fn user_login(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> MarketResult<Json<LoginResponse>> {
    login(&state.user_gate, &headers, &body).await
}

/// List every course in the catalog.
///
/// GET /users/courses
#[utoipa::path(
    get,
    path = "/users/courses",
    responses(
        (status = 200, description = "All courses", body = CourseListResponse),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn list_courses(State(state): State<AppState>) -> MarketResult<Json<CourseListResponse>> {
    let courses = state.store.list_courses(None).await?;
    Ok(Json(CourseListResponse { courses }))
}

/// Purchase a course.
///
/// POST /users/courses/{id}
#[utoipa::path(
    post,
    path = "/users/courses/{id}",
    params(
        ("id" = Uuid, Path, description = "Course ID")
    ),
    responses(
        (status = 200, description = "Course purchased", body = PurchaseResponse),
        (status = 400, description = "Course already purchased"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Course not found")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn purchase_course(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> MarketResult<Json<PurchaseResponse>> {
    match state.store.record_purchase(&identity.username, id).await? {
        PurchaseOutcome::Recorded => {
            tracing::info!(course_id = %id, username = %identity.username, "Course purchased");
            Ok(Json(PurchaseResponse {
                message: "Course purchased successfully".to_string(),
                course_id: id,
            }))
        }
        PurchaseOutcome::AlreadyOwned => {
            tracing::debug!(course_id = %id, username = %identity.username, "Duplicate purchase");
            Err(MarketError::DuplicatePurchase(id))
        }
    }
}

/// List the caller's purchased courses.
///
/// GET /users/purchasedCourses
#[utoipa::path(
    get,
    path = "/users/purchasedCourses",
    responses(
        (status = 200, description = "Purchased courses", body = PurchasedCoursesResponse),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn purchased_courses(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> MarketResult<Json<PurchasedCoursesResponse>> {
    let purchased_courses = state.store.list_purchases(&identity.username).await?;
    Ok(Json(PurchasedCoursesResponse { purchased_courses }))
}
