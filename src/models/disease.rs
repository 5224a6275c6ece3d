// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Disease reference library model.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;

/// Reference entry describing one crop disease. Read-only at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "frontend/src/generated/")
)]
pub struct DiseaseReference {
    /// Document ID
    pub id: Uuid,
    /// Crop this disease affects (e.g., "tomato"), stored lowercase by convention
    pub crop_type: String,
    pub image_url: String,
    pub symptoms: String,
    pub cause: String,
    pub prevention: String,
    pub treatment: String,
    /// Unique across the library
    pub disease_name: String,
}

/// Seed-file entry; the ID is assigned when absent.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDiseaseReference {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub crop_type: String,
    pub image_url: String,
    pub symptoms: String,
    pub cause: String,
    pub prevention: String,
    pub treatment: String,
    pub disease_name: String,
}

impl From<NewDiseaseReference> for DiseaseReference {
    fn from(entry: NewDiseaseReference) -> Self {
        Self {
            id: entry.id.unwrap_or_else(Uuid::new_v4),
            crop_type: entry.crop_type.trim().to_string(),
            image_url: entry.image_url,
            symptoms: entry.symptoms,
            cause: entry.cause,
            prevention: entry.prevention,
            treatment: entry.treatment,
            disease_name: entry.disease_name.trim().to_string(),
        }
    }
}
