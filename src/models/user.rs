// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;

/// User account stored in Firestore.
///
/// Only ever leaves the server as a [`PublicUser`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Generated user ID (also used as document ID)
    pub id: Uuid,
    /// Unique display name, trimmed
    pub username: String,
    /// Unique email, trimmed and lowercased
    pub email: String,
    /// Argon2 PHC string; never the raw password
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build a new account from already-normalized fields and a finished hash.
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }

    /// Public projection, with the user's diagnosis history (newest first).
    pub fn to_public(&self, diagnoses: Vec<Uuid>) -> PublicUser {
        PublicUser {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            diagnoses,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Identity fields of a stored user, loaded as a projection without the hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub id: Uuid,
    pub username: String,
}

impl UserIdentity {
    /// Stored field names making up the projection.
    pub const FIELDS: [&'static str; 2] = ["id", "username"];
}

/// User as returned to clients. Has no password field at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "frontend/src/generated/")
)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// Diagnosis IDs owned by this user, newest first
    #[serde(default)]
    pub diagnoses: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
