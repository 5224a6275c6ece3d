// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod diagnosis;
pub mod disease;
pub mod identification;
pub mod user;

pub use diagnosis::Diagnosis;
pub use disease::{DiseaseReference, NewDiseaseReference};
pub use identification::{Suggestion, TopPredictions};
pub use user::{PublicUser, User, UserIdentity};
