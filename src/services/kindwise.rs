// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Kindwise crop.health identification client.
//!
//! Sends one image per request as a base64 data URI and returns the
//! response body untouched. Callers decide what to extract from it.

use crate::config::Config;
use crate::error::AppError;
use base64::Engine;
use serde::Serialize;
use std::time::Duration;

#[derive(Serialize)]
struct IdentificationRequest {
    images: Vec<String>,
}

/// Identification API client.
#[derive(Clone)]
pub struct KindwiseClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl KindwiseClient {
    /// Create a client with the configured endpoint, key and timeout.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.upstream_timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(e.into()))?;
        Ok(Self {
            http,
            endpoint: config.kindwise_endpoint.clone(),
            api_key: config.kindwise_api_key.clone(),
        })
    }

    /// Identify crop and disease in an image.
    ///
    /// Non-2xx responses, network failures, timeouts and non-JSON bodies all
    /// become `AppError::Upstream`; an upstream error body is kept as details.
    pub async fn identify(
        &self,
        content_type: &str,
        image: &[u8],
    ) -> Result<serde_json::Value, AppError> {
        let body = IdentificationRequest {
            images: vec![data_uri(content_type, image)],
        };

        let response = self
            .http
            .post(&self.endpoint)
            .header("Api-Key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::upstream("Identification request timed out")
                } else {
                    AppError::upstream(format!("Identification request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let details = serde_json::from_str(&text)
                .unwrap_or(serde_json::Value::String(text));
            return Err(AppError::Upstream {
                status: Some(status.as_u16()),
                message: format!("HTTP {}", status),
                details: Some(details),
            });
        }

        response
            .json()
            .await
            .map_err(|e| AppError::upstream(format!("JSON parse error: {}", e)))
    }
}

/// `data:<mime>;base64,<payload>`
pub fn data_uri(content_type: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        content_type,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}
