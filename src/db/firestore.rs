// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (credential store, with email/username uniqueness claims)
//! - Diagnoses (one document per identification, queried by owner)
//! - Disease references (read-mostly library, seeded out of band)
//!
//! The same operations run against an in-memory store when the
//! configured `DATABASE_URL` is `memory://`.

use crate::config::DatabaseTarget;
use crate::db::collections;
use crate::db::memory::MemoryStore;
use crate::error::AppError;
use crate::models::diagnosis::sort_newest_first;
use crate::models::{Diagnosis, DiseaseReference, User, UserIdentity};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Marker document that reserves a unique value for one owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UniqueClaim {
    owner_id: Uuid,
}

/// Diagnosis as stored: the upstream payload is kept as an untyped JSON blob
/// so arbitrary nesting in the response never trips document-model limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredDiagnosis {
    id: Uuid,
    /// Owner ID as a string so it can be filtered on directly
    user: Option<String>,
    submitted_image: String,
    crop_name: String,
    crop_probability: f64,
    disease_name: String,
    disease_probability: f64,
    full_response: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StoredDiagnosis {
    fn from_diagnosis(d: &Diagnosis) -> Result<Self, AppError> {
        Ok(Self {
            id: d.id,
            user: d.user.map(|u| u.to_string()),
            submitted_image: d.submitted_image.clone(),
            crop_name: d.crop_name.clone(),
            crop_probability: d.crop_probability,
            disease_name: d.disease_name.clone(),
            disease_probability: d.disease_probability,
            full_response: serde_json::to_string(&d.full_response)
                .map_err(|e| AppError::Internal(e.into()))?,
            created_at: d.created_at,
            updated_at: d.updated_at,
        })
    }

    fn into_diagnosis(self) -> Result<Diagnosis, AppError> {
        let user = self
            .user
            .as_deref()
            .map(Uuid::parse_str)
            .transpose()
            .map_err(|e| AppError::Database(format!("Bad owner on diagnosis {}: {}", self.id, e)))?;
        let full_response = serde_json::from_str(&self.full_response).map_err(|e| {
            AppError::Database(format!("Bad stored payload on diagnosis {}: {}", self.id, e))
        })?;
        Ok(Diagnosis {
            id: self.id,
            user,
            submitted_image: self.submitted_image,
            crop_name: self.crop_name,
            crop_probability: self.crop_probability,
            disease_name: self.disease_name,
            disease_probability: self.disease_probability,
            full_response,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Clone)]
enum Backend {
    Firestore(firestore::FirestoreDb),
    Memory(Arc<MemoryStore>),
    /// Every operation fails; used to exercise error paths in tests.
    Offline,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    backend: Backend,
}

impl FirestoreDb {
    /// Connect to whatever `DATABASE_URL` pointed at.
    pub async fn connect(target: &DatabaseTarget) -> Result<Self, AppError> {
        match target {
            DatabaseTarget::Firestore { project_id } => Self::new(project_id).await,
            DatabaseTarget::Memory => {
                tracing::warn!("Using in-memory document store; data is lost on exit");
                Ok(Self::new_in_memory())
            }
        }
    }

    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator takes no credentials; skip the default token lookup.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Create a database backed by a fresh in-memory store.
    pub fn new_in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(MemoryStore::new())),
        }
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self {
            backend: Backend::Offline,
        }
    }

    // ─── Document Primitives ─────────────────────────────────────

    async fn get_doc<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .by_id_in(collection)
                .obj()
                .one(id)
                .await
                .map_err(|e| AppError::Database(e.to_string())),
            Backend::Memory(store) => store.get(collection, id).map(from_value).transpose(),
            Backend::Offline => Err(offline()),
        }
    }

    /// Fetch only `fields` of a document.
    async fn get_doc_fields<T>(
        &self,
        collection: &str,
        id: &str,
        fields: &[&str],
    ) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .fields(fields.iter().copied())
                .by_id_in(collection)
                .obj()
                .one(id)
                .await
                .map_err(|e| AppError::Database(e.to_string())),
            Backend::Memory(store) => store
                .get(collection, id)
                .map(|doc| from_value(project(doc, fields)))
                .transpose(),
            Backend::Offline => Err(offline()),
        }
    }

    /// Create or replace a document.
    async fn set_doc<T>(&self, collection: &str, id: &str, doc: &T) -> Result<(), AppError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
    {
        match &self.backend {
            Backend::Firestore(client) => {
                let _: T = client
                    .fluent()
                    .update()
                    .in_col(collection)
                    .document_id(id)
                    .object(doc)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(())
            }
            Backend::Memory(store) => {
                store.set(collection, id, to_value(doc)?);
                Ok(())
            }
            Backend::Offline => Err(offline()),
        }
    }

    /// Create a document only if its ID is unused. Returns `false` if it already existed.
    async fn insert_doc<T>(&self, collection: &str, id: &str, doc: &T) -> Result<bool, AppError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
    {
        match &self.backend {
            Backend::Firestore(client) => {
                let result: Result<T, _> = client
                    .fluent()
                    .insert()
                    .into(collection)
                    .document_id(id)
                    .object(doc)
                    .execute()
                    .await;
                match result {
                    Ok(_) => Ok(true),
                    Err(firestore::errors::FirestoreError::DataConflictError(_)) => Ok(false),
                    Err(e) => Err(AppError::Database(e.to_string())),
                }
            }
            Backend::Memory(store) => Ok(store.insert(collection, id, to_value(doc)?)),
            Backend::Offline => Err(offline()),
        }
    }

    async fn delete_doc(&self, collection: &str, id: &str) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .delete()
                .from(collection)
                .document_id(id)
                .execute()
                .await
                .map_err(|e| AppError::Database(e.to_string())),
            Backend::Memory(store) => {
                store.delete(collection, id);
                Ok(())
            }
            Backend::Offline => Err(offline()),
        }
    }

    /// All documents whose top-level string `field` equals `value` exactly.
    async fn query_eq<T>(&self, collection: &str, field: &str, value: &str) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .from(collection)
                .filter(|q| q.for_all([q.field(field).eq(value)]))
                .obj()
                .query()
                .await
                .map_err(|e| AppError::Database(e.to_string())),
            Backend::Memory(store) => store
                .query_eq(collection, field, value)
                .into_iter()
                .map(from_value)
                .collect(),
            Backend::Offline => Err(offline()),
        }
    }

    async fn list_docs<T>(&self, collection: &str) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .from(collection)
                .obj()
                .query()
                .await
                .map_err(|e| AppError::Database(e.to_string())),
            Backend::Memory(store) => store.list(collection).into_iter().map(from_value).collect(),
            Backend::Offline => Err(offline()),
        }
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by ID.
    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        self.get_doc(collections::USERS, &user_id.to_string()).await
    }

    /// Load a user's identity without reading the password hash.
    pub async fn get_user_identity(
        &self,
        user_id: Uuid,
    ) -> Result<Option<UserIdentity>, AppError> {
        self.get_doc_fields(
            collections::USERS,
            &user_id.to_string(),
            &UserIdentity::FIELDS,
        )
        .await
    }

    /// Look up a user by (already normalized) email.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let claim: Option<UniqueClaim> = self
            .get_doc(collections::USER_EMAILS, &claim_id(email))
            .await?;
        match claim {
            Some(claim) => self.get_user(claim.owner_id).await,
            None => Ok(None),
        }
    }

    /// Store a new user, reserving its email and username first.
    ///
    /// Fails with `Conflict` (and writes nothing) if either value is taken.
    pub async fn create_user(&self, user: &User) -> Result<(), AppError> {
        let claim = UniqueClaim { owner_id: user.id };
        let email_key = claim_id(&user.email);
        let username_key = claim_id(&user.username);

        if !self
            .insert_doc(collections::USER_EMAILS, &email_key, &claim)
            .await?
        {
            return Err(AppError::Conflict("User already exists".to_string()));
        }

        let username_claimed = match self
            .insert_doc(collections::USERNAMES, &username_key, &claim)
            .await
        {
            Ok(claimed) => claimed,
            Err(e) => {
                self.release_claim(collections::USER_EMAILS, &email_key).await;
                return Err(e);
            }
        };
        if !username_claimed {
            self.release_claim(collections::USER_EMAILS, &email_key).await;
            return Err(AppError::Conflict("Username is already taken".to_string()));
        }

        if let Err(e) = self
            .set_doc(collections::USERS, &user.id.to_string(), user)
            .await
        {
            self.release_claim(collections::USER_EMAILS, &email_key).await;
            self.release_claim(collections::USERNAMES, &username_key).await;
            return Err(e);
        }

        tracing::debug!(user_id = %user.id, "User document created");
        Ok(())
    }

    async fn release_claim(&self, collection: &str, key: &str) {
        if let Err(e) = self.delete_doc(collection, key).await {
            tracing::warn!(error = %e, collection, "Failed to release uniqueness claim");
        }
    }

    // ─── Diagnosis Operations ────────────────────────────────────

    /// Store a diagnosis. A single-document write, so it is all-or-nothing.
    pub async fn record_diagnosis(&self, diagnosis: &Diagnosis) -> Result<(), AppError> {
        let stored = StoredDiagnosis::from_diagnosis(diagnosis)?;
        self.set_doc(collections::DIAGNOSES, &diagnosis.id.to_string(), &stored)
            .await
    }

    /// Get a diagnosis by ID.
    pub async fn get_diagnosis(&self, diagnosis_id: Uuid) -> Result<Option<Diagnosis>, AppError> {
        let stored: Option<StoredDiagnosis> = self
            .get_doc(collections::DIAGNOSES, &diagnosis_id.to_string())
            .await?;
        stored.map(StoredDiagnosis::into_diagnosis).transpose()
    }

    /// All diagnoses owned by a user, newest first.
    pub async fn list_diagnoses_for_user(&self, user_id: Uuid) -> Result<Vec<Diagnosis>, AppError> {
        let stored: Vec<StoredDiagnosis> = self
            .query_eq(collections::DIAGNOSES, "user", &user_id.to_string())
            .await?;
        let mut diagnoses = stored
            .into_iter()
            .map(StoredDiagnosis::into_diagnosis)
            .collect::<Result<Vec<_>, _>>()?;
        sort_newest_first(&mut diagnoses);
        Ok(diagnoses)
    }

    // ─── Disease Reference Operations ────────────────────────────

    /// Add a disease reference. Returns `false` if the disease name is already present.
    pub async fn create_disease_reference(
        &self,
        disease: &DiseaseReference,
    ) -> Result<bool, AppError> {
        let name_key = claim_id(&disease.disease_name);
        let claim = UniqueClaim {
            owner_id: disease.id,
        };
        if !self
            .insert_doc(collections::DISEASE_NAMES, &name_key, &claim)
            .await?
        {
            return Ok(false);
        }

        // The reference itself is create-only too, so an explicit id never
        // replaces an existing record.
        match self
            .insert_doc(
                collections::DISEASE_REFERENCES,
                &disease.id.to_string(),
                disease,
            )
            .await
        {
            Ok(true) => Ok(true),
            Ok(false) => {
                tracing::warn!(
                    disease_id = %disease.id,
                    "Disease reference id already in use, skipping"
                );
                self.release_claim(collections::DISEASE_NAMES, &name_key).await;
                Ok(false)
            }
            Err(e) => {
                self.release_claim(collections::DISEASE_NAMES, &name_key).await;
                Err(e)
            }
        }
    }

    pub async fn get_disease_reference(
        &self,
        disease_id: Uuid,
    ) -> Result<Option<DiseaseReference>, AppError> {
        self.get_doc(collections::DISEASE_REFERENCES, &disease_id.to_string())
            .await
    }

    pub async fn list_disease_references(&self) -> Result<Vec<DiseaseReference>, AppError> {
        self.list_docs(collections::DISEASE_REFERENCES).await
    }

    /// Disease references whose crop type matches exactly (case as stored).
    pub async fn list_disease_references_by_crop(
        &self,
        crop_type: &str,
    ) -> Result<Vec<DiseaseReference>, AppError> {
        self.query_eq(collections::DISEASE_REFERENCES, "cropType", crop_type)
            .await
    }
}

/// Document ID for a uniqueness claim. Values may contain '/', which
/// Firestore does not allow in IDs.
fn claim_id(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

fn offline() -> AppError {
    AppError::Database("Database not connected (offline mode)".to_string())
}

fn to_value<T: Serialize>(doc: &T) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(doc).map_err(|e| AppError::Database(e.to_string()))
}

fn from_value<T: DeserializeOwned>(doc: serde_json::Value) -> Result<T, AppError> {
    serde_json::from_value(doc).map_err(|e| AppError::Database(e.to_string()))
}

/// Keep only the named top-level fields of a stored document.
fn project(doc: serde_json::Value, fields: &[&str]) -> serde_json::Value {
    match doc {
        serde_json::Value::Object(map) => map
            .into_iter()
            .filter(|(key, _)| fields.contains(&key.as_str()))
            .collect(),
        other => other,
    }
}
