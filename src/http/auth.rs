//! Bearer token authentication.

use crate::core::error::CoursekitError;
use crate::http::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use tracing::debug;

/// The user a request's bearer token resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser(pub String);

/// Reject requests without a known bearer token; otherwise attach [`AuthUser`].
pub async fn require_user(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, CoursekitError> {
    let Some(TypedHeader(Authorization(bearer))) = bearer else {
        debug!("missing bearer token");
        return Err(CoursekitError::Unauthorized);
    };
    let Some(user) = state.tokens.get(bearer.token()) else {
        debug!("unknown bearer token");
        return Err(CoursekitError::Unauthorized);
    };

    request.extensions_mut().insert(AuthUser(user.clone()));
    Ok(next.run(request).await)
}
