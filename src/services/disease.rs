// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Disease reference library.
//!
//! Read-only at request time. Entries arrive through [`DiseaseLibrary::seed`],
//! normally from the JSON file named by `DISEASE_SEED_PATH` at startup.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{DiseaseReference, NewDiseaseReference};
use futures_util::{stream, StreamExt};
use std::path::Path;
use uuid::Uuid;

/// Maximum concurrent writes while seeding.
const MAX_CONCURRENT_SEED_WRITES: usize = 8;

#[derive(Clone)]
pub struct DiseaseLibrary {
    db: FirestoreDb,
}

impl DiseaseLibrary {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Every entry, ordered by crop type then disease name.
    pub async fn list_all(&self) -> Result<Vec<DiseaseReference>, AppError> {
        let mut diseases = self.db.list_disease_references().await?;
        sort_for_listing(&mut diseases);
        Ok(diseases)
    }

    /// Entries for one crop. Exact match on the stored value; no case folding.
    pub async fn list_by_crop_type(
        &self,
        crop_type: &str,
    ) -> Result<Vec<DiseaseReference>, AppError> {
        let mut diseases = self.db.list_disease_references_by_crop(crop_type).await?;
        sort_for_listing(&mut diseases);
        Ok(diseases)
    }

    /// Look up one entry by its identifier as received in a URL.
    pub async fn get_by_id(&self, id: &str) -> Result<DiseaseReference, AppError> {
        let id = Uuid::parse_str(id.trim())
            .map_err(|_| AppError::BadRequest("Invalid disease id".to_string()))?;
        self.db
            .get_disease_reference(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Disease record not found".to_string()))
    }

    /// Parse a seed file: a JSON array of disease entries.
    pub fn load_seed_file(path: &Path) -> anyhow::Result<Vec<NewDiseaseReference>> {
        let content = std::fs::read_to_string(path)?;
        let entries: Vec<NewDiseaseReference> = serde_json::from_str(&content)?;
        Ok(entries)
    }

    /// Insert entries whose disease name and id are not already present.
    ///
    /// Returns how many were inserted; running it twice inserts nothing the second time.
    pub async fn seed(&self, entries: Vec<NewDiseaseReference>) -> Result<usize, AppError> {
        let total = entries.len();
        let db = &self.db;

        let results = stream::iter(entries)
            .map(|entry| async move {
                let disease = DiseaseReference::from(entry);
                if disease.disease_name.is_empty() {
                    return Err(AppError::Validation(
                        "Disease entry is missing diseaseName".to_string(),
                    ));
                }
                db.create_disease_reference(&disease).await
            })
            .buffer_unordered(MAX_CONCURRENT_SEED_WRITES)
            .collect::<Vec<Result<bool, AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<bool>, AppError>>()?;

        let inserted = results.into_iter().filter(|inserted| *inserted).count();
        tracing::info!(inserted, skipped = total - inserted, "Disease library seeded");
        Ok(inserted)
    }
}

fn sort_for_listing(diseases: &mut [DiseaseReference]) {
    diseases.sort_by(|a, b| {
        a.crop_type
            .cmp(&b.crop_type)
            .then_with(|| a.disease_name.cmp(&b.disease_name))
    });
}
