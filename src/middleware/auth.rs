use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::app::AppState;
use crate::auth::{validate_jwt, Claims};
use crate::error::ApiError;

/// Authenticated user context extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub username: String,
    pub nome: Option<String>,
    pub user_id: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            username: claims.username,
            nome: claims.nome,
            user_id: claims.user_id,
        }
    }
}

/// Rejects with 401 when no token is sent and 403 when it does not verify.
/// Runs before any handler, so rejected requests never reach the repository.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(&headers).ok_or_else(|| ApiError::unauthorized("Token não fornecido"))?;

    let claims = validate_jwt(token, &state.config.security.jwt_secret).map_err(|e| {
        debug!(error = %e, "Rejected token");
        ApiError::forbidden("Token inválido")
    })?;

    request.extensions_mut().insert(AuthUser::from(claims));
    Ok(next.run(request).await)
}

/// Second whitespace-separated part of `Authorization: <scheme> <token>`
fn extract_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .split_whitespace()
        .nth(1)
}
