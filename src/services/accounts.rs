// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account registration and login.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{PublicUser, User};
use crate::services::password::{hash_password_blocking, verify_password_blocking};
use crate::services::token::TokenService;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::{Validate, ValidationErrors};

/// Registration body. Missing fields deserialize as empty and are rejected below.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Please enter a username"))]
    pub username: String,
    #[serde(default)]
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Successful register/login result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "frontend/src/generated/")
)]
pub struct AuthSession {
    pub user: PublicUser,
    pub token: String,
}

/// Registration and login against the credential store.
#[derive(Clone)]
pub struct AccountService {
    db: FirestoreDb,
    tokens: TokenService,
}

impl AccountService {
    pub fn new(db: FirestoreDb, tokens: TokenService) -> Self {
        Self { db, tokens }
    }

    /// Create an account and sign it in.
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthSession, AppError> {
        let request = RegisterRequest {
            username: request.username.trim().to_string(),
            email: normalize_email(&request.email),
            password: request.password,
        };

        if request.email.is_empty() {
            return Err(AppError::Validation(
                "Please enter an email address".to_string(),
            ));
        }
        if request.password.is_empty() {
            return Err(AppError::Validation("Please enter a password".to_string()));
        }
        request
            .validate()
            .map_err(|e| AppError::Validation(first_message(&e)))?;

        if self.db.find_user_by_email(&request.email).await?.is_some() {
            return Err(AppError::Conflict("User already exists".to_string()));
        }

        let password_hash = hash_password_blocking(request.password).await?;
        let user = User::new(request.username, request.email, password_hash);
        // The store re-checks both unique fields; a racing registration loses here.
        self.db.create_user(&user).await?;

        tracing::info!(user_id = %user.id, "User registered");
        self.session_for(&user, Vec::new())
    }

    /// Check credentials and sign in.
    ///
    /// Unknown email and wrong password fail identically.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthSession, AppError> {
        let email = normalize_email(&request.email);
        if email.is_empty() || request.password.is_empty() {
            return Err(AppError::Validation(
                "Please provide email and password".to_string(),
            ));
        }

        let Some(user) = self.db.find_user_by_email(&email).await? else {
            tracing::debug!("Login for unknown email");
            return Err(AppError::InvalidCredentials);
        };

        if !verify_password_blocking(request.password, user.password_hash.clone()).await? {
            tracing::warn!(user_id = %user.id, "Login with wrong password");
            return Err(AppError::InvalidCredentials);
        }

        let history = self
            .db
            .list_diagnoses_for_user(user.id)
            .await?
            .into_iter()
            .map(|d| d.id)
            .collect();

        tracing::info!(user_id = %user.id, "User logged in");
        self.session_for(&user, history)
    }

    fn session_for(&self, user: &User, history: Vec<uuid::Uuid>) -> Result<AuthSession, AppError> {
        let token = self.tokens.issue(user.id)?;
        Ok(AuthSession {
            user: user.to_public(history),
            token,
        })
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// First validation message, in field-name order so the result is deterministic.
fn first_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    fields
        .into_iter()
        .flat_map(|(_, errs)| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| errors.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AccountService {
        AccountService::new(
            FirestoreDb::new_in_memory(),
            TokenService::new(b"test_jwt_key_32_bytes_minimum!!"),
        )
    }

    fn register_request(username: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn test_register_normalizes_and_hides_password() {
        let svc = service();
        let session = svc
            .register(register_request("  farmer ", " Farmer@Example.COM ", "secret123"))
            .await
            .unwrap();

        assert_eq!(session.user.username, "farmer");
        assert_eq!(session.user.email, "farmer@example.com");
        assert!(session.user.diagnoses.is_empty());
        assert!(!session.token.is_empty());
        let json = serde_json::to_string(&session.user).unwrap();
        assert!(!json.contains("secret123"));
        assert!(!json.contains("password"));
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let svc = service();
        let registered = svc
            .register(register_request("farmer", "farmer@example.com", "secret123"))
            .await
            .unwrap();

        let session = svc
            .login(LoginRequest {
                email: "FARMER@example.com".into(),
                password: "secret123".into(),
            })
            .await
            .unwrap();
        assert_eq!(session.user.id, registered.user.id);
    }

    #[tokio::test]
    async fn test_register_validation_messages() {
        let svc = service();
        let cases = [
            (register_request("", "a@b.io", "secret123"), "Please enter a username"),
            (register_request("u", "", "secret123"), "Please enter an email address"),
            (register_request("u", "a@b.io", ""), "Please enter a password"),
            (
                register_request("u", "not-an-email", "secret123"),
                "Please enter a valid email address",
            ),
            (
                register_request("u", "a@b.io", "12345"),
                "Password must be at least 6 characters long",
            ),
        ];
        for (request, expected) in cases {
            match svc.register(request).await {
                Err(AppError::Validation(msg)) => assert_eq!(msg, expected),
                other => panic!("expected validation error, got {:?}", other.map(|_| ())),
            }
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let svc = service();
        svc.register(register_request("one", "dup@example.com", "secret123"))
            .await
            .unwrap();
        let err = svc
            .register(register_request("two", "DUP@example.com", "secret123"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m == "User already exists"));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let svc = service();
        svc.register(register_request("farmer", "farmer@example.com", "secret123"))
            .await
            .unwrap();

        let unknown = svc
            .login(LoginRequest {
                email: "nobody@example.com".into(),
                password: "secret123".into(),
            })
            .await
            .unwrap_err();
        let wrong = svc
            .login(LoginRequest {
                email: "farmer@example.com".into(),
                password: "wrong-password".into(),
            })
            .await
            .unwrap_err();

        assert_eq!(unknown.to_string(), wrong.to_string());
        assert!(matches!(unknown, AppError::InvalidCredentials));
        assert!(matches!(wrong, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_missing_fields() {
        let err = service()
            .login(LoginRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
