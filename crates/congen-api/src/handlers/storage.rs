use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, rejection::QueryRejection, Multipart, Query, RawQuery, State},
    http::header,
    response::IntoResponse,
    Json,
};
use congen_core::models::{SaveFileResponse, ServiceListResponse};
use congen_core::AppError;
use serde::Deserialize;

use crate::auth::CallerContext;
use crate::error::HttpAppError;
use crate::state::AppState;
use crate::utils::{query::repeated_values, upload::extract_first_file};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetFileParams {
    #[serde(default, alias = "filename", alias = "FileName")]
    pub file_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ServiceParams {
    #[serde(default, rename = "type", alias = "Type")]
    pub service_type: Option<String>,
}

/// `GET /storage/get-file?fileName=` — raw object bytes.
#[tracing::instrument(skip_all, fields(partition = %caller.partition, operation = "get_file"))]
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    caller: CallerContext,
    query: Result<Query<GetFileParams>, QueryRejection>,
) -> Result<impl IntoResponse, HttpAppError> {
    let Query(params) = query?;
    let data = state
        .orchestrator
        .get_file(&caller, params.file_name.as_deref())
        .await?;

    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], data))
}

/// `GET /storage/get-files?fileNames=a&fileNames=b` — one slot per requested name.
#[tracing::instrument(skip_all, fields(partition = %caller.partition, operation = "get_files"))]
pub async fn get_files(
    State(state): State<Arc<AppState>>,
    caller: CallerContext,
    RawQuery(query): RawQuery,
) -> Result<impl IntoResponse, HttpAppError> {
    let file_names = repeated_values(query.as_deref(), "fileNames");
    let slots = state.orchestrator.get_files(&caller, &file_names).await;
    Ok(Json(slots))
}

/// `POST /storage/save-file` — multipart, first file part is stored.
#[tracing::instrument(skip_all, fields(partition = %caller.partition, operation = "save_file"))]
pub async fn save_file(
    State(state): State<Arc<AppState>>,
    caller: CallerContext,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, HttpAppError> {
    // A body that is not a multipart form carries no file.
    let upload = match multipart {
        Ok(multipart) => extract_first_file(multipart).await?,
        Err(_) => None,
    };

    let file_name = state.orchestrator.save_file(&caller, upload).await?;
    Ok(Json(SaveFileResponse::saved(file_name)))
}

/// `GET /storage/service?type=` — catalog entries of one service type.
pub async fn list_services(
    State(state): State<Arc<AppState>>,
    _caller: CallerContext,
    query: Result<Query<ServiceParams>, QueryRejection>,
) -> Result<impl IntoResponse, HttpAppError> {
    let Query(params) = query?;
    let service_type = match params.service_type.as_deref().map(str::trim) {
        Some(raw) => Some(raw.parse::<i64>().map_err(|_| {
            AppError::BadRequest("BAD REQUEST: INVALID SERVICE TYPE!".to_string())
        })?),
        None => None,
    };

    let entries = state.orchestrator.list_services(service_type)?;
    Ok(Json(ServiceListResponse::listed(entries)))
}
