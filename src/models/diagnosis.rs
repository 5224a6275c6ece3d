// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Diagnosis model for storage and API.

use crate::models::identification::TopPredictions;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;

/// Result of one successful identification call. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "frontend/src/generated/")
)]
pub struct Diagnosis {
    /// Generated diagnosis ID (also used as document ID)
    pub id: Uuid,
    /// Owning user, when submitted through an authenticated session
    pub user: Option<Uuid>,
    /// Original filename of the uploaded image
    pub submitted_image: String,
    pub crop_name: String,
    pub crop_probability: f64,
    pub disease_name: String,
    pub disease_probability: f64,
    /// Upstream response, verbatim
    pub full_response: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Diagnosis {
    /// Build a diagnosis from an identification response and its extracted top predictions.
    pub fn from_identification(
        user: Option<Uuid>,
        submitted_image: String,
        top: TopPredictions,
        full_response: serde_json::Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user,
            submitted_image,
            crop_name: top.crop.name,
            crop_probability: top.crop.probability,
            disease_name: top.disease.name,
            disease_probability: top.disease.probability,
            full_response,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Newest first; ties broken by ID so listings are stable.
pub fn sort_newest_first(diagnoses: &mut [Diagnosis]) {
    diagnoses.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}
