//! Authentication middleware for axum.

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::{AuthError, RoleGate};

/// Run the role's gate and attach the verified identity to the request.
///
/// Handlers read it with `Extension<Identity>`.
pub async fn require_identity(
    State(gate): State<RoleGate>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let identity = gate
        .authenticate(request.headers())
        .await
        .map_err(|e| {
            tracing::warn!(
                role = %gate.role(),
                strategy = %gate.strategy(),
                path = %request.uri().path(),
                code = e.code(),
                "Request rejected by auth gate"
            );
            e
        })?;

    tracing::debug!(role = %identity.role, username = %identity.username, "Authenticated");

    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}
