// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identification API payload handling.
//!
//! The response is kept as an opaque JSON document. Only the two ranked
//! suggestion lists under `result.crop` and `result.disease` are checked,
//! because those are the fields a stored diagnosis is built from.

use serde::Deserialize;
use serde_json::Value;

/// One ranked guess from the identification API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Suggestion {
    pub name: String,
    pub probability: f64,
}

#[derive(Deserialize)]
struct Payload {
    result: PayloadResult,
}

#[derive(Deserialize)]
struct PayloadResult {
    crop: Ranked,
    disease: Ranked,
}

#[derive(Deserialize)]
struct Ranked {
    suggestions: Vec<Suggestion>,
}

/// First-ranked crop and disease suggestion of a response.
#[derive(Debug, Clone, PartialEq)]
pub struct TopPredictions {
    pub crop: Suggestion,
    pub disease: Suggestion,
}

/// Why a response could not be turned into a diagnosis.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PayloadError {
    #[error("Malformed identification response: {0}")]
    Malformed(String),

    #[error("Identification response has no {0} suggestions")]
    NoSuggestions(&'static str),

    #[error("Identification response has invalid {0} probability")]
    BadProbability(&'static str),
}

impl TopPredictions {
    /// Extract `result.crop.suggestions[0]` and `result.disease.suggestions[0]`.
    pub fn from_response(response: &Value) -> Result<Self, PayloadError> {
        let payload = Payload::deserialize(response)
            .map_err(|e| PayloadError::Malformed(e.to_string()))?;

        let crop = first("crop", payload.result.crop)?;
        let disease = first("disease", payload.result.disease)?;

        Ok(Self { crop, disease })
    }
}

fn first(kind: &'static str, ranked: Ranked) -> Result<Suggestion, PayloadError> {
    let top = ranked
        .suggestions
        .into_iter()
        .next()
        .ok_or(PayloadError::NoSuggestions(kind))?;
    if !(0.0..=1.0).contains(&top.probability) {
        return Err(PayloadError::BadProbability(kind));
    }
    Ok(top)
}
