// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Cropdoc: crop disease diagnosis backend
//!
//! This crate provides the backend API that authenticates growers, forwards
//! crop photos to the Kindwise identification API, records each diagnosis,
//! and serves a reference library of crop diseases. The `client` module is
//! a typed client for the same API with a persisted session.

pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::FirestoreDb;
use error::AppError;
use services::{AccountService, DiagnosisService, DiseaseLibrary, KindwiseClient, TokenService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub tokens: TokenService,
    pub accounts: AccountService,
    pub diagnoses: DiagnosisService,
    pub diseases: DiseaseLibrary,
}

impl AppState {
    /// Wire up services from configuration and an open database.
    pub fn new(config: Config, db: FirestoreDb) -> Result<Self, AppError> {
        let tokens = TokenService::new(&config.jwt_secret);
        let kindwise = KindwiseClient::new(&config)?;

        Ok(Self {
            accounts: AccountService::new(db.clone(), tokens.clone()),
            diagnoses: DiagnosisService::new(db.clone(), kindwise),
            diseases: DiseaseLibrary::new(db.clone()),
            tokens,
            db,
            config,
        })
    }
}
