// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bearer token authentication middleware.

use crate::error::AppError;
use crate::services::TokenError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use uuid::Uuid;

/// Authenticated user resolved from the bearer token. Carries no password hash.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
}

/// Middleware that requires a valid bearer token for an existing user.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthenticated(AppError::NO_TOKEN.to_string()))?;

    let user_id = state.tokens.verify(token).map_err(|e| {
        match e {
            TokenError::Expired => tracing::debug!("Rejected expired token"),
            TokenError::InvalidToken => tracing::warn!("Rejected invalid token"),
        }
        AppError::Unauthenticated(AppError::TOKEN_FAILED.to_string())
    })?;

    let Some(user) = state.db.get_user_identity(user_id).await? else {
        tracing::warn!(user_id = %user_id, "Token for missing user");
        return Err(AppError::Unauthenticated(
            AppError::USER_NOT_FOUND.to_string(),
        ));
    };

    request.extensions_mut().insert(AuthUser {
        id: user.id,
        username: user.username,
    });

    Ok(next.run(request).await)
}
