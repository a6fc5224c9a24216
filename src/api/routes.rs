//! Route definitions for the API.

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::handlers;
use crate::auth::require_identity;
use crate::AppState;

/// Security scheme modifier for OpenAPI.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health_check,
        handlers::admin_signup,
        handlers::admin_login,
        handlers::create_course,
        handlers::update_course,
        handlers::publish_course,
        handlers::list_admin_courses,
        handlers::user_signup,
        handlers::user_login,
        handlers::list_courses,
        handlers::purchase_course,
        handlers::purchased_courses,
    ),
    components(schemas(
        crate::api::types::CredentialsRequest,
        crate::api::types::MessageResponse,
        crate::api::types::LoginResponse,
        crate::api::types::CreateCourseRequest,
        crate::api::types::CreateCourseResponse,
        crate::api::types::CourseListResponse,
        crate::api::types::PurchaseResponse,
        crate::api::types::PurchasedCoursesResponse,
        crate::api::types::HealthResponse,
        crate::domain::Course,
        crate::domain::CoursePatch,
        crate::error::ErrorResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "admin", description = "Administrator accounts and course management"),
        (name = "users", description = "User accounts, browsing and purchases"),
        (name = "health", description = "Health and status endpoints")
    ),
    info(
        title = "Course Market API",
        version = "0.1.0",
        description = "Course marketplace - administrators publish courses, users purchase them",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Build the API router.
///
/// Administrator and user routes each sit behind their role's gate.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let admin_routes = Router::new()
        .route(
            "/admin/courses",
            post(handlers::create_course).get(handlers::list_admin_courses),
        )
        .route("/admin/courses/:id", put(handlers::update_course))
        .route("/admin/courses/:id/publish", put(handlers::publish_course))
        .route_layer(middleware::from_fn_with_state(
            state.admin_gate.clone(),
            require_identity,
        ));

    let user_routes = Router::new()
        .route("/users/courses", get(handlers::list_courses))
        .route("/users/courses/:id", post(handlers::purchase_course))
        .route("/users/purchasedCourses", get(handlers::purchased_courses))
        .route_layer(middleware::from_fn_with_state(
            state.user_gate.clone(),
            require_identity,
        ));

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/admin/signup", post(handlers::admin_signup))
        .route("/admin/login", post(handlers::admin_login))
        .route("/users/signup", post(handlers::user_signup))
        .route("/users/login", post(handlers::user_login));

    Router::new()
        .merge(admin_routes)
        .merge(user_routes)
        .merge(public_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
