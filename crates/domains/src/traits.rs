//! # Core Traits (Ports)
//!
//! Every gateway adapter implements these traits. Services only ever see the
//! ports, so the hosted backend can be swapped for the in-memory adapter in
//! tests and offline runs.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::Result;
use crate::models::Session;
use crate::query::{Filter, Query};

/// Row persistence: query, insert, update and delete against named tables.
///
/// Rows cross this boundary as loose JSON objects; the fetchers in `services`
/// map them into typed records.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait RowStore: Send + Sync {
    async fn select(&self, query: &Query) -> Result<Vec<Value>>;

    /// Inserts one row and returns it as stored (with generated columns).
    async fn insert(&self, table: &str, row: Value) -> Result<Value>;

    /// Applies `patch` to every row matching `filters`; returns the updated rows.
    async fn update(&self, table: &str, filters: &[Filter], patch: Value) -> Result<Vec<Value>>;

    /// Deletes every row matching `filters`; returns how many went.
    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<usize>;
}

/// Object storage for uploaded media.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Stores `body` under `path` in `bucket`.
    async fn upload(&self, bucket: &str, path: &str, body: Bytes, content_type: &str) -> Result<()>;

    /// Returns the public URL for an object. Does not check existence.
    async fn public_url(&self, bucket: &str, path: &str) -> Result<String>;
}

/// Identity contract.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Exchanges email and password for a session.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;
}

/// Wall clock, injected so storage keys and cache-busters are testable.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The real clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
