// handlers/protected/arquivos.rs - GET /api/arquivos listing

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::database::models::arquivo::STORAGE_FOLDER;
use crate::error::ApiError;
use crate::storage::ObjectSummary;

#[derive(Debug, Default, Deserialize)]
pub struct ArquivosQuery {
    pub prefix: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ArquivosResponse {
    pub data: Vec<ObjectSummary>,
}

/// Objects under `arquivos/<prefix>`
pub async fn list_arquivos(
    State(state): State<AppState>,
    query: Result<Query<ArquivosQuery>, QueryRejection>,
) -> Result<Json<ArquivosResponse>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let prefix = format!(
        "{}/{}",
        STORAGE_FOLDER,
        query.prefix.as_deref().unwrap_or_default().trim_start_matches('/')
    );

    let data = state.storage.list_objects(&prefix).await?;
    Ok(Json(ArquivosResponse { data }))
}
