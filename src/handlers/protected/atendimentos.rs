// handlers/protected/atendimentos.rs - single record and its messages

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use serde_json::{Map, Value};
use tracing::debug;

use crate::api::format::document_to_json;
use crate::api::{PageParams, PageRequest, Paginated};
use crate::app::AppState;
use crate::database::RecordId;
use crate::error::ApiError;
use crate::services::enrich_mensagens;

pub const MENSAGENS_DEFAULT_LIMIT: u64 = 100;

/// GET /api/atendimentos/:id - full service record
pub async fn get_atendimento(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Map<String, Value>>, ApiError> {
    let id = RecordId::parse(&id);
    let record = state
        .repository
        .find_atendimento(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Atendimento não encontrado"))?;

    Ok(Json(document_to_json(record)))
}

/// GET /api/atendimentos/:id/mensagens - messages oldest first, enriched with
/// attendant names and media attachments
pub async fn list_mensagens(
    State(state): State<AppState>,
    Path(id): Path<String>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> Result<Paginated<Map<String, Value>>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let page = PageRequest::from_params(params, MENSAGENS_DEFAULT_LIMIT, state.config.pagination.max_limit);
    let id = RecordId::parse(&id);

    let result = state.repository.list_mensagens(&id, page).await?;
    debug!(atendimento = %id, total = result.total, returned = result.items.len(), "Listed messages");

    let data = enrich_mensagens(state.repository.as_ref(), result.items).await;
    Ok(Paginated::new(data, page, result.total))
}
