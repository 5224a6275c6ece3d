//! Database layer (Firestore, with an in-memory backend for development and tests).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Uniqueness claims keyed by url-encoded email
    pub const USER_EMAILS: &str = "user_emails";
    /// Uniqueness claims keyed by url-encoded username
    pub const USERNAMES: &str = "usernames";
    pub const DIAGNOSES: &str = "diagnoses";
    pub const DISEASE_REFERENCES: &str = "DiseaseReferences";
    /// Uniqueness claims keyed by url-encoded disease name
    pub const DISEASE_NAMES: &str = "disease_names";
}
