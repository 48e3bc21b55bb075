//! Email/password sign-in over `POST /auth/v1/token?grant_type=password`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use domains::{AppError, AuthProvider, Result, Session};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use storage_adapters::http::gateway_error;
use tracing::{info, warn};

const TOKEN_PATH: &str = "auth/v1/token";

pub struct PasswordAuth {
    http: reqwest::Client,
    base_url: String,
    anon_key: SecretString,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    user: Option<TokenUser>,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl PasswordAuth {
    /// # Errors
    ///
    /// Returns an internal error if the HTTP client cannot be built.
    pub fn new(base_url: &str, anon_key: SecretString, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("http client build failed: {e}")))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_string(), anon_key })
    }
}

#[async_trait]
impl AuthProvider for PasswordAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let url = format!("{}/{TOKEN_PATH}", self.base_url);
        let response = self
            .http
            .post(&url)
            .query(&[("grant_type", "password")])
            .header("apikey", self.anon_key.expose_secret())
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("sign-in: {e}")))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::Internal(format!("sign-in: {e}")))?;

        if status == 400 || status == 401 {
            warn!(email, status, "sign-in rejected");
            return Err(AppError::Unauthorized(gateway_error(status, &text).user_message()));
        }
        if !(200..300).contains(&status) {
            return Err(gateway_error(status, &text));
        }

        let session = session_from_response(&text)?;
        info!(user_id = %session.user_id, "signed in");
        Ok(session)
    }
}

fn session_from_response(text: &str) -> Result<Session> {
    let token: TokenResponse = serde_json::from_str(text).map_err(|e| AppError::malformed("token response", e))?;

    let mut user_id = token.user.as_ref().map(|u| u.id.clone());
    let mut email = token.user.and_then(|u| u.email);
    let mut expires_at = token.expires_in.map(|secs| Utc::now() + TimeDelta::seconds(secs));

    #[cfg(feature = "auth-jwt")]
    if user_id.is_none() || expires_at.is_none() {
        if let Ok(claims) = crate::claims::read_claims(&token.access_token) {
            expires_at = expires_at.or(claims.expires_at());
            email = email.or(claims.email);
            user_id = user_id.or(Some(claims.sub));
        }
    }

    let user_id = user_id.ok_or_else(|| AppError::malformed("token response", "no user id"))?;
    Ok(Session { user_id, email, access_token: SecretString::from(token.access_token), expires_at })
}
