// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Diagnosis submission and history routes (authenticated).

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::Diagnosis;
use crate::services::UploadedImage;
use crate::AppState;
use axum::{
    extract::{
        multipart::{Field, MultipartRejection},
        DefaultBodyLimit, Multipart, State,
    },
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Multipart field names accepted for the uploaded image.
const IMAGE_FIELDS: [&str; 2] = ["plantImage", "image"];

const NO_IMAGE: &str = "No image file uploaded.";

/// Diagnosis routes. The auth middleware is applied in routes/mod.rs.
pub fn routes(max_upload_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/diagnose",
            post(diagnose).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/api/history", get(history))
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "frontend/src/generated/")
)]
pub struct DiagnoseResponse {
    pub success: bool,
    pub diagnosis: Diagnosis,
    /// Identification response, verbatim
    #[cfg_attr(feature = "binding-generation", ts(type = "unknown"))]
    pub ai_result: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "frontend/src/generated/")
)]
pub struct HistoryResponse {
    pub success: bool,
    pub message: String,
    pub data: Vec<Diagnosis>,
}

async fn diagnose(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<DiagnoseResponse>> {
    let image = read_image(multipart?).await?;
    let outcome = state.diagnoses.submit(user.id, image).await?;

    Ok(Json(DiagnoseResponse {
        success: true,
        diagnosis: outcome.diagnosis,
        ai_result: outcome.ai_result,
    }))
}

async fn history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<HistoryResponse>> {
    let data = state.diagnoses.history(user.id).await?;
    tracing::debug!(username = %user.username, count = data.len(), "History listed");
    Ok(Json(HistoryResponse {
        success: true,
        message: "Diagnosis history retrieved successfully.".to_string(),
        data,
    }))
}

/// Pull exactly one image file out of the form. Other fields are ignored.
async fn read_image(mut multipart: Multipart) -> Result<UploadedImage> {
    let mut image = None;

    while let Some(field) = multipart.next_field().await? {
        if !field.name().is_some_and(|n| IMAGE_FIELDS.contains(&n)) {
            continue;
        }
        if image.is_some() {
            return Err(AppError::BadRequest(
                "Only one image may be uploaded.".to_string(),
            ));
        }
        image = Some(read_image_field(field).await?);
    }

    image.ok_or_else(|| AppError::BadRequest(NO_IMAGE.to_string()))
}

async fn read_image_field(field: Field<'_>) -> Result<UploadedImage> {
    let filename = field.file_name().unwrap_or("upload").to_string();
    let content_type = field
        .content_type()
        .filter(|ct| ct.starts_with("image/"))
        .map(str::to_string)
        .ok_or_else(|| AppError::BadRequest("Uploaded file must be an image.".to_string()))?;

    let bytes = field.bytes().await?;
    if bytes.is_empty() {
        return Err(AppError::BadRequest(NO_IMAGE.to_string()));
    }

    Ok(UploadedImage {
        filename,
        content_type,
        bytes: bytes.to_vec(),
    })
}
