// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Public disease library routes.

use crate::error::Result;
use crate::models::DiseaseReference;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/public/disease", get(list_diseases))
        .route("/api/public/disease/{crop_type}", get(list_diseases_by_crop))
        .route("/api/public/disease/details/{id}", get(get_disease))
}

/// `{success, data}` envelope used by the library endpoints.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "frontend/src/generated/")
)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

async fn list_diseases(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DataResponse<Vec<DiseaseReference>>>> {
    Ok(DataResponse::ok(state.diseases.list_all().await?))
}

/// Empty list, not 404, when nothing matches.
async fn list_diseases_by_crop(
    State(state): State<Arc<AppState>>,
    Path(crop_type): Path<String>,
) -> Result<Json<DataResponse<Vec<DiseaseReference>>>> {
    Ok(DataResponse::ok(
        state.diseases.list_by_crop_type(&crop_type).await?,
    ))
}

async fn get_disease(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<DiseaseReference>>> {
    Ok(DataResponse::ok(state.diseases.get_by_id(&id).await?))
}
