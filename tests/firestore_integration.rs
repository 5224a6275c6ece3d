// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running, with
//! FIRESTORE_EMULATOR_HOST pointing at it. They are skipped otherwise.
//!
//! Every test uses fresh identifiers so runs against a shared emulator
//! do not interfere.

use cropdoc::error::AppError;
use cropdoc::models::identification::{Suggestion, TopPredictions};
use cropdoc::models::{Diagnosis, DiseaseReference, User};
use serde_json::json;
use uuid::Uuid;

mod common;
use common::test_db;

/// Unique email/username suffix for test isolation.
fn unique() -> String {
    Uuid::new_v4().simple().to_string()
}

fn test_user() -> User {
    let tag = unique();
    User::new(
        format!("grower-{}", tag),
        format!("grower-{}@example.com", tag),
        "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$aGFzaGhhc2hoYXNo".to_string(),
    )
}

fn test_diagnosis(owner: Uuid, filename: &str) -> Diagnosis {
    Diagnosis::from_identification(
        Some(owner),
        filename.to_string(),
        TopPredictions {
            crop: Suggestion {
                name: "tomato".into(),
                probability: 0.97,
            },
            disease: Suggestion {
                name: "early blight".into(),
                probability: 0.81,
            },
        },
        json!({
            "result": {
                "crop": { "suggestions": [{ "name": "tomato", "probability": 0.97 }] },
                "disease": { "suggestions": [{ "name": "early blight", "probability": 0.81,
                    "similar_images": [[{ "url": "https://example.com/a.jpg" }]] }] }
            }
        }),
    )
}

// ═══════════════════════════════════════════════════════════════════════════
// USER TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_new_user_creation() {
    require_emulator!();

    let db = test_db().await;
    let user = test_user();

    assert!(db.get_user(user.id).await.unwrap().is_none());
    db.create_user(&user).await.unwrap();

    let fetched = db.get_user(user.id).await.unwrap().unwrap();
    assert_eq!(fetched.username, user.username);
    assert_eq!(fetched.email, user.email);
    assert_eq!(fetched.password_hash, user.password_hash);

    let by_email = db.find_user_by_email(&user.email).await.unwrap().unwrap();
    assert_eq!(by_email.id, user.id);

    println!("✓ New user created and verified: id={}", user.id);
}

#[tokio::test]
async fn test_user_identity_projection() {
    require_emulator!();

    let db = test_db().await;
    let user = test_user();
    db.create_user(&user).await.unwrap();

    let identity = db.get_user_identity(user.id).await.unwrap().unwrap();
    assert_eq!(identity.id, user.id);
    assert_eq!(identity.username, user.username);
}

#[tokio::test]
async fn test_duplicate_email_is_conflict() {
    require_emulator!();

    let db = test_db().await;
    let first = test_user();
    db.create_user(&first).await.unwrap();

    let mut second = test_user();
    second.email = first.email.clone();
    let err = db.create_user(&second).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert!(db.get_user(second.id).await.unwrap().is_none());
}

// ═══════════════════════════════════════════════════════════════════════════
// DIAGNOSIS TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_diagnosis_history_round_trip() {
    require_emulator!();

    let db = test_db().await;
    let owner = Uuid::new_v4();

    let mut older = test_diagnosis(owner, "older.jpg");
    older.created_at -= chrono::Duration::minutes(10);
    let newer = test_diagnosis(owner, "newer.jpg");
    db.record_diagnosis(&older).await.unwrap();
    db.record_diagnosis(&newer).await.unwrap();

    let history = db.list_diagnoses_for_user(owner).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, newer.id);
    assert_eq!(history[1].id, older.id);
    // Nested arrays in the payload survive storage.
    assert_eq!(history[0].full_response, newer.full_response);
}

// ═══════════════════════════════════════════════════════════════════════════
// DISEASE REFERENCE TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_disease_reference_round_trip() {
    require_emulator!();

    let db = test_db().await;
    let crop = format!("crop-{}", unique());
    let disease = DiseaseReference {
        id: Uuid::new_v4(),
        crop_type: crop.clone(),
        image_url: "https://example.com/leaf.jpg".into(),
        symptoms: "Brown rings".into(),
        cause: "Alternaria solani".into(),
        prevention: "Rotation".into(),
        treatment: "Copper fungicide".into(),
        disease_name: format!("Early blight {}", unique()),
    };

    assert!(db.create_disease_reference(&disease).await.unwrap());
    assert!(!db.create_disease_reference(&disease).await.unwrap());

    let fetched = db.get_disease_reference(disease.id).await.unwrap().unwrap();
    assert_eq!(fetched, disease);

    let by_crop = db.list_disease_references_by_crop(&crop).await.unwrap();
    assert_eq!(by_crop, vec![disease]);
}
