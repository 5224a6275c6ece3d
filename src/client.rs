// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Typed API client with a persisted session.
//!
//! [`SessionStore`] keeps the signed-in user's token and profile in a JSON
//! file so a session survives restarts. [`ApiClient`] attaches the stored
//! token to authenticated calls and updates the store on login and logout.

use crate::models::{Diagnosis, DiseaseReference, PublicUser};
use crate::routes::auth::AuthResponse;
use crate::routes::diagnosis::{DiagnoseResponse, HistoryResponse};
use crate::routes::public::DataResponse;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The call needs a session and none is stored.
    #[error("Not signed in")]
    NotAuthenticated,

    /// The server answered with an error body; `message` is shown to the user as is.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Session file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Token plus the user it was issued for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: PublicUser,
}

/// Session persisted as JSON at a fixed path.
#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
    session: Option<Session>,
}

impl SessionStore {
    /// Restore the session saved at `path`, if any. A missing file means signed out.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ClientError> {
        let path = path.into();
        let session = match std::fs::read_to_string(&path) {
            Ok(content) => Some(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, session })
    }

    /// Replace the stored session and write it out.
    pub fn save(&mut self, session: Session) -> Result<(), ClientError> {
        std::fs::write(&self.path, serde_json::to_vec_pretty(&session)?)?;
        self.session = Some(session);
        Ok(())
    }

    /// Forget the session (logout).
    pub fn clear(&mut self) -> Result<(), ClientError> {
        self.session = None;
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn user(&self) -> Option<&PublicUser> {
        self.session.as_ref().map(|s| &s.user)
    }

    pub fn token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.token.as_str())
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Client for the diagnosis API.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: SessionStore,
}

impl ApiClient {
    /// `base_url` is the server root, e.g. `http://localhost:5000`.
    pub fn new(base_url: impl Into<String>, session: SessionStore) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub async fn register(
        &mut self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<PublicUser, ClientError> {
        let body = serde_json::json!({
            "username": username,
            "email": email,
            "password": password,
        });
        let response = self
            .http
            .post(self.url("/api/auth/register"))
            .json(&body)
            .send()
            .await?;
        let auth: AuthResponse = parse(response, "Registration failed due to server error.").await?;
        self.store(auth)
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<PublicUser, ClientError> {
        let body = serde_json::json!({ "email": email, "password": password });
        let response = self
            .http
            .post(self.url("/api/auth/login"))
            .json(&body)
            .send()
            .await?;
        let auth: AuthResponse = parse(response, "Login failed due to server error.").await?;
        self.store(auth)
    }

    /// Drop the local session. Tokens are stateless, so the server is not called.
    pub fn logout(&mut self) -> Result<(), ClientError> {
        self.session.clear()
    }

    /// Upload one image for diagnosis.
    pub async fn diagnose(
        &self,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<DiagnoseResponse, ClientError> {
        let token = self.token()?;
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(content_type)?;
        let form = reqwest::multipart::Form::new().part("plantImage", part);

        let response = self
            .http
            .post(self.url("/api/diagnose"))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;
        parse(response, "Diagnosis failed due to server error.").await
    }

    pub async fn history(&self) -> Result<Vec<Diagnosis>, ClientError> {
        let token = self.token()?;
        let response = self
            .http
            .get(self.url("/api/history"))
            .bearer_auth(token)
            .send()
            .await?;
        let history: HistoryResponse = parse(response, "Failed to load history.").await?;
        Ok(history.data)
    }

    pub async fn diseases(&self) -> Result<Vec<DiseaseReference>, ClientError> {
        self.get_data("/api/public/disease".to_string()).await
    }

    /// Diseases for a crop. The crop type is lowercased to match stored values.
    pub async fn diseases_by_crop(
        &self,
        crop_type: &str,
    ) -> Result<Vec<DiseaseReference>, ClientError> {
        let crop = urlencoding::encode(&crop_type.trim().to_lowercase()).into_owned();
        self.get_data(format!("/api/public/disease/{}", crop)).await
    }

    pub async fn disease(&self, id: &str) -> Result<DiseaseReference, ClientError> {
        let id = urlencoding::encode(id).into_owned();
        self.get_data(format!("/api/public/disease/details/{}", id))
            .await
    }

    async fn get_data<T: DeserializeOwned>(&self, path: String) -> Result<T, ClientError> {
        let response = self.http.get(self.url(&path)).send().await?;
        let body: DataResponse<T> =
            parse(response, "Failed to load disease library.").await?;
        Ok(body.data)
    }

    fn store(&mut self, auth: AuthResponse) -> Result<PublicUser, ClientError> {
        let user = auth.user.clone();
        self.session.save(Session {
            token: auth.token,
            user: auth.user,
        })?;
        Ok(user)
    }

    fn token(&self) -> Result<&str, ClientError> {
        self.session.token().ok_or(ClientError::NotAuthenticated)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Decode a success body, or turn an error body into `ClientError::Api`.
async fn parse<T: DeserializeOwned>(
    response: reqwest::Response,
    fallback: &str,
) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| fallback.to_string());
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}
