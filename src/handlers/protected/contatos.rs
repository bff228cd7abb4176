// handlers/protected/contatos.rs - contact list and per-contact history

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Extension,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::api::format::document_to_json;
use crate::api::{PageRequest, Paginated};
use crate::app::AppState;
use crate::database::models::Contato;
use crate::error::ApiError;
use crate::filter::{ContactSearch, HistoryFilter};
use crate::middleware::AuthUser;

pub const CONTATOS_DEFAULT_LIMIT: u64 = 50;
pub const HISTORY_DEFAULT_LIMIT: u64 = 20;

#[derive(Debug, Default, Deserialize)]
pub struct ContatosQuery {
    pub search: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub protocolo: Option<String>,
    pub data_inicio: Option<String>,
    pub data_fim: Option<String>,
}

/// GET /api/contatos - one entry per customer channel, most recent first
pub async fn list_contatos(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    query: Result<Query<ContatosQuery>, QueryRejection>,
) -> Result<Paginated<Contato>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let page = PageRequest::new(
        query.page,
        query.limit,
        CONTATOS_DEFAULT_LIMIT,
        state.config.pagination.max_limit,
    );
    let search = query.search.as_deref().map(str::trim).and_then(ContactSearch::parse);

    debug!(user = %user.username, search = ?search, page = page.page, "Listing contacts");
    let result = state.repository.list_contatos(search.as_ref(), page).await?;

    Ok(Paginated::new(result.items, page, result.total))
}

/// GET /api/contatos/:canal_cliente/atendimentos - service history, newest first
pub async fn list_atendimentos(
    State(state): State<AppState>,
    Path(canal_cliente): Path<String>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Paginated<Map<String, Value>>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let page = PageRequest::new(
        query.page,
        query.limit,
        HISTORY_DEFAULT_LIMIT,
        state.config.pagination.max_limit,
    );
    let filter = HistoryFilter::new(
        canal_cliente,
        query.protocolo.as_deref(),
        query.data_inicio.as_deref(),
        query.data_fim.as_deref(),
    )?;

    let result = state.repository.list_atendimentos(&filter, page).await?;
    let data = result.items.into_iter().map(document_to_json).collect();

    Ok(Paginated::new(data, page, result.total))
}
