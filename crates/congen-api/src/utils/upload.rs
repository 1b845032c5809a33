//! Multipart upload extraction

use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::StatusCode;
use congen_core::AppError;

use crate::services::UploadedFile;

const UPLOAD_TOO_LARGE: &str = "PAYLOAD TOO LARGE: FILE EXCEEDS THE UPLOAD SIZE LIMIT!";

/// Read the first file part of a multipart form. Other parts are skipped.
pub async fn extract_first_file(mut multipart: Multipart) -> Result<Option<UploadedFile>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, "Failed to read multipart"))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };

        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, "Failed to read file data"))?;

        return Ok(Some(UploadedFile {
            file_name: Some(file_name),
            data,
        }));
    }

    Ok(None)
}

/// A body cut off by the request size limit is reported as 413, anything else as 400.
fn multipart_error(err: MultipartError, context: &str) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(UPLOAD_TOO_LARGE.to_string())
    } else {
        AppError::BadRequest(format!("{}: {}", context, err.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HttpAppError;
    use axum::{
        body::{to_bytes, Body},
        extract::DefaultBodyLimit,
        http::{header, Request},
        routing::post,
        Json, Router,
    };
    use tower::ServiceExt;

    const BOUNDARY: &str = "congen-boundary";

    async fn upload(multipart: Multipart) -> Result<Json<Option<String>>, HttpAppError> {
        let file = extract_first_file(multipart).await?;
        Ok(Json(file.and_then(|f| f.file_name)))
    }

    fn app(limit: usize) -> Router {
        Router::new()
            .route("/upload", post(upload))
            .layer(DefaultBodyLimit::max(limit))
    }

    fn multipart_request(parts: &[(&str, Option<&str>, Vec<u8>)]) -> Request<Body> {
        let mut body = Vec::new();
        for (name, file_name, data) in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            let disposition = match file_name {
                Some(file_name) => format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    name, file_name
                ),
                None => format!("Content-Disposition: form-data; name=\"{}\"\r\n", name),
            };
            body.extend_from_slice(disposition.as_bytes());
            body.extend_from_slice(b"\r\n");
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_first_file_part_wins() {
        let request = multipart_request(&[
            ("note", None, b"plain field".to_vec()),
            ("file", Some("clip.mp4"), b"video".to_vec()),
            ("other", Some("second.mp3"), b"audio".to_vec()),
        ]);
        let response = app(1024 * 1024).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], br#""clip.mp4""#);
    }

    #[tokio::test]
    async fn test_oversized_upload_is_payload_too_large() {
        let request = multipart_request(&[("file", Some("big.bin"), vec![7u8; 8 * 1024])]);
        let response = app(512).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let envelope: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(envelope["isSuccessful"], false);
        assert_eq!(envelope["errorMessage"], UPLOAD_TOO_LARGE);
    }
}
