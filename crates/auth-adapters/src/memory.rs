//! Fixed in-memory accounts.

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use dashmap::DashMap;
use domains::{AppError, AuthProvider, Result, Session};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

const SESSION_TTL_SECS: i64 = 3600;

struct Account {
    user_id: String,
    password: SecretString,
}

#[derive(Default)]
pub struct MemoryAuth {
    accounts: DashMap<String, Account>,
}

impl MemoryAuth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(self, email: &str, password: &str, user_id: &str) -> Self {
        self.accounts.insert(
            email.to_ascii_lowercase(),
            Account { user_id: user_id.to_string(), password: SecretString::from(password.to_string()) },
        );
        self
    }
}

#[async_trait]
impl AuthProvider for MemoryAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let key = email.to_ascii_lowercase();
        let account = self
            .accounts
            .get(&key)
            .filter(|a| a.password.expose_secret() == password)
            .ok_or_else(|| AppError::Unauthorized("Invalid login credentials".into()))?;

        debug!(user_id = %account.user_id, "memory sign-in");
        Ok(Session {
            user_id: account.user_id.clone(),
            email: Some(key.clone()),
            access_token: SecretString::from(format!("memory-{}", account.user_id)),
            expires_at: Some(Utc::now() + TimeDelta::seconds(SESSION_TTL_SECS)),
        })
    }
}
