// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Diagnosis workflow: identify an uploaded image and record the result.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::identification::TopPredictions;
use crate::models::Diagnosis;
use crate::services::kindwise::KindwiseClient;
use uuid::Uuid;

/// Image received from the client.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    /// Original filename as sent by the client
    pub filename: String,
    /// Declared media type, e.g. `image/jpeg`
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Stored diagnosis together with the raw identification response.
#[derive(Debug, Clone)]
pub struct DiagnosisOutcome {
    pub diagnosis: Diagnosis,
    pub ai_result: serde_json::Value,
}

#[derive(Clone)]
pub struct DiagnosisService {
    db: FirestoreDb,
    kindwise: KindwiseClient,
}

impl DiagnosisService {
    pub fn new(db: FirestoreDb, kindwise: KindwiseClient) -> Self {
        Self { db, kindwise }
    }

    /// Run one identification for `user_id` and store it.
    ///
    /// Nothing is written unless the response yields both a top crop and a
    /// top disease suggestion.
    pub async fn submit(
        &self,
        user_id: Uuid,
        image: UploadedImage,
    ) -> Result<DiagnosisOutcome, AppError> {
        tracing::debug!(
            user_id = %user_id,
            filename = %image.filename,
            bytes = image.bytes.len(),
            "Submitting image for identification"
        );

        let ai_result = self
            .kindwise
            .identify(&image.content_type, &image.bytes)
            .await?;

        let top = TopPredictions::from_response(&ai_result)
            .map_err(|e| AppError::upstream(e.to_string()))?;

        let diagnosis =
            Diagnosis::from_identification(Some(user_id), image.filename, top, ai_result.clone());
        self.db.record_diagnosis(&diagnosis).await?;

        tracing::info!(
            user_id = %user_id,
            diagnosis_id = %diagnosis.id,
            crop = %diagnosis.crop_name,
            disease = %diagnosis.disease_name,
            "Diagnosis stored"
        );

        Ok(DiagnosisOutcome {
            diagnosis,
            ai_result,
        })
    }

    /// The user's diagnoses, newest first. Empty is not an error.
    pub async fn history(&self, user_id: Uuid) -> Result<Vec<Diagnosis>, AppError> {
        self.db.list_diagnoses_for_user(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::{routing::post, Json, Router};
    use serde_json::{json, Value};

    async fn service_with_upstream(response: Value) -> (DiagnosisService, FirestoreDb) {
        let router = Router::new().route(
            "/id",
            post(move || {
                let response = response.clone();
                async move { Json(response) }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let mut config = Config::test_default();
        config.kindwise_endpoint = format!("http://{}/id", addr);
        let db = FirestoreDb::new_in_memory();
        let kindwise = KindwiseClient::new(&config).unwrap();
        (DiagnosisService::new(db.clone(), kindwise), db)
    }

    fn image() -> UploadedImage {
        UploadedImage {
            filename: "leaf.jpg".into(),
            content_type: "image/jpeg".into(),
            bytes: vec![0xff, 0xd8, 0xff],
        }
    }

    #[tokio::test]
    async fn test_submit_stores_top_suggestions() {
        let payload = json!({
            "result": {
                "crop": { "suggestions": [
                    { "name": "potato", "probability": 0.93 },
                    { "name": "tomato", "probability": 0.05 }
                ]},
                "disease": { "suggestions": [
                    { "name": "late blight", "probability": 0.71 }
                ]}
            }
        });
        let (svc, db) = service_with_upstream(payload.clone()).await;
        let user = Uuid::new_v4();

        let outcome = svc.submit(user, image()).await.unwrap();
        assert_eq!(outcome.ai_result, payload);
        assert_eq!(outcome.diagnosis.crop_name, "potato");
        assert_eq!(outcome.diagnosis.crop_probability, 0.93);
        assert_eq!(outcome.diagnosis.disease_name, "late blight");
        assert_eq!(outcome.diagnosis.disease_probability, 0.71);
        assert_eq!(outcome.diagnosis.submitted_image, "leaf.jpg");

        let stored = db.get_diagnosis(outcome.diagnosis.id).await.unwrap().unwrap();
        assert_eq!(stored, outcome.diagnosis);
        assert_eq!(svc.history(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_disease_suggestions_stores_nothing() {
        let payload = json!({
            "result": {
                "crop": { "suggestions": [{ "name": "potato", "probability": 0.93 }] },
                "disease": { "suggestions": [] }
            }
        });
        let (svc, _db) = service_with_upstream(payload).await;
        let user = Uuid::new_v4();

        let err = svc.submit(user, image()).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream { .. }));
        assert!(svc.history(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_history_empty_for_new_user() {
        let (svc, _db) = service_with_upstream(json!({})).await;
        assert!(svc.history(Uuid::new_v4()).await.unwrap().is_empty());
    }
}
