use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, rejection::QueryRejection, Multipart, Query, State},
    response::IntoResponse,
    Json,
};
use congen_core::models::{
    GenerateFileParams, GeneratePromptRequest, ResponseBase, SaveFileResponse,
};

use crate::auth::CallerContext;
use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;
use crate::utils::upload::extract_first_file;

/// `POST /generate/file?tone=&videoName=&audioName=` — store the file, then dispatch a job.
#[tracing::instrument(skip_all, fields(identity = %caller.identity, operation = "generate_file"))]
pub async fn generate_from_file(
    State(state): State<Arc<AppState>>,
    caller: CallerContext,
    query: Result<Query<GenerateFileParams>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, HttpAppError> {
    let Query(params) = query?;
    let upload = match multipart {
        Ok(multipart) => extract_first_file(multipart).await?,
        Err(_) => None,
    };

    let file_name = state
        .orchestrator
        .generate_from_file(&caller, params, upload)
        .await?;
    Ok(Json(SaveFileResponse::saved(file_name)))
}

/// `POST /generate/prompt` — dispatch a prompt-driven job.
#[tracing::instrument(skip_all, fields(identity = %caller.identity, operation = "generate_prompt"))]
pub async fn generate_from_prompt(
    State(state): State<Arc<AppState>>,
    caller: CallerContext,
    ValidatedJson(request): ValidatedJson<GeneratePromptRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    state
        .orchestrator
        .generate_from_prompt(&caller, request)
        .await?;
    Ok(Json(ResponseBase::success()))
}
