// handlers/public/files.rs - GET /arquivos/*path handler

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use futures::TryStreamExt;
use tracing::{debug, error};

use crate::app::AppState;
use crate::database::models::arquivo::STORAGE_FOLDER;
use crate::error::ApiError;
use crate::storage::content_type_for;

/// GET /arquivos/*path - stream an object from `arquivos/<path>`.
///
/// A missing key is answered with 404 before headers go out. Once streaming
/// has started an error can only cut the connection.
pub async fn get_file(State(state): State<AppState>, Path(path): Path<String>) -> Result<Response, ApiError> {
    let key = format!("{}/{}", STORAGE_FOLDER, path.trim_start_matches('/'));
    debug!(%key, endpoint = state.storage.endpoint(), "Fetching file");

    let object = state.storage.get_object(&key).await?;

    let stream_key = object.key.clone();
    let body = Body::from_stream(object.body.inspect_err(move |e| {
        error!(key = %stream_key, error = %e, "File stream aborted");
    }));

    let mut response = body.into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type_for(&key)));
    if let Some(length) = object.content_length {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    }

    Ok(response)
}
