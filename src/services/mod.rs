// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod accounts;
pub mod diagnosis;
pub mod disease;
pub mod kindwise;
pub mod password;
pub mod token;

pub use accounts::{AccountService, AuthSession, LoginRequest, RegisterRequest};
pub use diagnosis::{DiagnosisOutcome, DiagnosisService, UploadedImage};
pub use disease::DiseaseLibrary;
pub use kindwise::KindwiseClient;
pub use token::{TokenError, TokenService};
