//! Request orchestration.
//!
//! Each operation validates its input completely before touching the object store
//! or the bus, then runs store → publish in that order. The caller has already been
//! resolved by the auth middleware. A publish that fails after a successful store
//! leaves the stored object in place and fails the request.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use serde::Serialize;

use congen_core::models::{
    ErrorCode, GenerateFileParams, GeneratePromptRequest, GenerationJob, ServiceEntry,
    ServiceType, Tone,
};
use congen_core::{AppError, ErrorMetadata};
use congen_dispatch::DispatchPublisher;
use congen_storage::{ObjectGateway, StorageBackend};

use crate::auth::CallerContext;
use crate::services::ServiceCatalog;

const MISSING_FILE: &str = "BAD REQUEST: INCLUDE FILE IN FORM REQUEST!";
const MISSING_EXTENSION: &str = "BAD REQUEST: INCLUDE FILE EXTENSION IN FILE NAME!";
const MISSING_FILE_NAME: &str = "BAD REQUEST: INCLUDE FILE NAME!";
const MISSING_PROMPT: &str = "BAD REQUEST: INCLUDE PROMPT!";
const INVALID_TONE: &str = "BAD REQUEST: INVALID TONE VALUE!";
const INVALID_SERVICE_TYPE: &str = "BAD REQUEST: INVALID SERVICE TYPE!";

/// First file part of a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub data: Bytes,
}

impl UploadedFile {
    /// Text after the last `.` of the client file name.
    pub fn extension(&self) -> Result<&str, AppError> {
        self.file_name
            .as_deref()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, extension)| extension)
            .filter(|extension| !extension.is_empty())
            .ok_or_else(|| AppError::BadRequest(MISSING_EXTENSION.to_string()))
    }
}

/// One slot of a `get-files` response, aligned with the requested names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSlot {
    pub file_name: String,
    /// Base64 content, `null` when the fetch failed.
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
}

/// Parse a tone given as its integer wire value.
pub fn parse_tone(raw: Option<&str>) -> Result<Tone, AppError> {
    raw.map(str::trim)
        .and_then(|value| value.parse::<i64>().ok())
        .and_then(Tone::from_value)
        .ok_or_else(|| AppError::BadRequest(INVALID_TONE.to_string()))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Clone)]
pub struct Orchestrator {
    gateway: ObjectGateway,
    publisher: DispatchPublisher,
    catalog: Arc<ServiceCatalog>,
}

impl Orchestrator {
    pub fn new(
        gateway: ObjectGateway,
        publisher: DispatchPublisher,
        catalog: Arc<ServiceCatalog>,
    ) -> Self {
        Self {
            gateway,
            publisher,
            catalog,
        }
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.gateway.backend_type()
    }

    /// Store an uploaded file in the caller's partition and return its generated name.
    #[tracing::instrument(skip_all, fields(partition = %caller.partition))]
    pub async fn save_file(
        &self,
        caller: &CallerContext,
        upload: Option<UploadedFile>,
    ) -> Result<String, AppError> {
        let upload = upload.ok_or_else(|| AppError::BadRequest(MISSING_FILE.to_string()))?;
        let extension = upload.extension()?.to_string();

        self.store(caller, upload.data, &extension).await
    }

    pub async fn get_file(
        &self,
        caller: &CallerContext,
        file_name: Option<&str>,
    ) -> Result<Bytes, AppError> {
        let file_name = file_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| AppError::BadRequest(MISSING_FILE_NAME.to_string()))?;

        Ok(self.gateway.get(&caller.partition, file_name).await?)
    }

    /// Fetch several files. A failed slot is reported in place and never fails the batch.
    pub async fn get_files(&self, caller: &CallerContext, file_names: &[String]) -> Vec<FileSlot> {
        let results = self.gateway.get_many(&caller.partition, file_names).await;

        file_names
            .iter()
            .zip(results)
            .map(|(file_name, result)| match result {
                Ok(data) => FileSlot {
                    file_name: file_name.clone(),
                    content: Some(STANDARD.encode(&data)),
                    error_code: None,
                },
                Err(e) => {
                    let error = AppError::from(e);
                    tracing::debug!(
                        partition = %caller.partition,
                        file_name = %file_name,
                        error = %error,
                        "File slot unavailable"
                    );
                    FileSlot {
                        file_name: file_name.clone(),
                        content: None,
                        error_code: Some(error.error_code()),
                    }
                }
            })
            .collect()
    }

    /// Store the uploaded source file, then dispatch a job referencing it.
    #[tracing::instrument(skip_all, fields(identity = %caller.identity, partition = %caller.partition))]
    pub async fn generate_from_file(
        &self,
        caller: &CallerContext,
        params: GenerateFileParams,
        upload: Option<UploadedFile>,
    ) -> Result<String, AppError> {
        let tone = parse_tone(params.tone.as_deref())?;
        let upload = upload.ok_or_else(|| AppError::BadRequest(MISSING_FILE.to_string()))?;
        let extension = upload.extension()?.to_string();

        let file_name = self.store(caller, upload.data, &extension).await?;

        let job = GenerationJob::from_file(
            tone,
            non_empty(params.video_name),
            non_empty(params.audio_name),
            file_name.clone(),
            caller.credential.clone(),
            caller.identity.clone(),
        );
        self.publish(caller, &job).await?;

        Ok(file_name)
    }

    /// Dispatch a prompt-driven job. Nothing is stored.
    #[tracing::instrument(skip_all, fields(identity = %caller.identity))]
    pub async fn generate_from_prompt(
        &self,
        caller: &CallerContext,
        request: GeneratePromptRequest,
    ) -> Result<(), AppError> {
        let tone = Tone::from_value(request.tone)
            .ok_or_else(|| AppError::BadRequest(INVALID_TONE.to_string()))?;
        if request.prompt.trim().is_empty() {
            return Err(AppError::BadRequest(MISSING_PROMPT.to_string()));
        }

        let job = GenerationJob::from_prompt(
            tone,
            non_empty(request.video),
            non_empty(request.audio),
            request.prompt,
            caller.credential.clone(),
            caller.identity.clone(),
        );
        self.publish(caller, &job).await
    }

    pub fn list_services(&self, service_type: Option<i64>) -> Result<Vec<ServiceEntry>, AppError> {
        let service_type = service_type
            .and_then(ServiceType::from_value)
            .ok_or_else(|| AppError::BadRequest(INVALID_SERVICE_TYPE.to_string()))?;
        Ok(self.catalog.entries_for(service_type))
    }

    async fn store(
        &self,
        caller: &CallerContext,
        data: Bytes,
        extension: &str,
    ) -> Result<String, AppError> {
        let size_bytes = data.len();
        let name = self.gateway.put(&caller.partition, data, extension).await?;

        tracing::info!(
            partition = %caller.partition,
            file_name = %name,
            size_bytes = size_bytes,
            "File stored"
        );
        Ok(name)
    }

    async fn publish(&self, caller: &CallerContext, job: &GenerationJob) -> Result<(), AppError> {
        if let Err(e) = self.publisher.publish_job(job, &caller.identity).await {
            if let Some(file_name) = &job.file_name {
                tracing::warn!(
                    partition = %caller.partition,
                    file_name = %file_name,
                    "Job not dispatched; stored file left orphaned"
                );
            }
            return Err(e.into());
        }

        tracing::info!(
            identity = %caller.identity,
            tone = %job.tone,
            "Generation job dispatched"
        );
        Ok(())
    }
}
