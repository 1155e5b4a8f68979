//! Request identity.
//!
//! Authentication itself lives outside this service. Whatever sits in front
//! of it is expected to leave an [`AuthenticatedUser`] in the request
//! extensions; [`identity_from_header`] does so from the `X-User-Id` header
//! forwarded by the auth proxy.

use axum::{extract::Request, middleware::Next, response::Response};

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub String);

impl AuthenticatedUser {
    pub fn id(&self) -> &str {
        &self.0
    }
}

/// Copies a non-empty `X-User-Id` header into the request extensions.
pub async fn identity_from_header(mut request: Request, next: Next) -> Response {
    let user = request
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| AuthenticatedUser(id.to_string()));

    if let Some(user) = user {
        request.extensions_mut().insert(user);
    }

    next.run(request).await
}
