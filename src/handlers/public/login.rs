// handlers/public/login.rs - POST /api/login handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::app::AppState;
use crate::auth::{generate_jwt, verify_password, Claims};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub nome: Option<String>,
}

/// POST /api/login - exchange viewer credentials for a signed token
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = payload.map_err(|_| ApiError::bad_request("Usuário e senha são obrigatórios"))?;

    let (username, password) = match (present(request.username), present(request.password)) {
        (Some(username), Some(password)) => (username, password),
        _ => return Err(ApiError::bad_request("Usuário e senha são obrigatórios")),
    };

    let Some(user) = state.repository.find_login_user(&username).await? else {
        info!(%username, "Login rejected: unknown or inactive user");
        return Err(ApiError::unauthorized("Credenciais inválidas"));
    };

    if !verify_password(&password, &user.password) {
        warn!(%username, "Login rejected: wrong password");
        return Err(ApiError::unauthorized("Credenciais inválidas"));
    }

    let claims = Claims::new(
        user.username.clone(),
        user.nome.clone(),
        user.id_string(),
        state.config.security.jwt_expiry_hours,
    );
    let token = generate_jwt(&claims, &state.config.security.jwt_secret)?;

    info!(%username, "Login succeeded");
    Ok(Json(LoginResponse {
        token,
        username: user.username,
        nome: user.nome,
    }))
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
