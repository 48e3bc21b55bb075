//! # HttpGateway
//!
//! `RowStore` and `MediaStore` over the hosted backend's REST dialect:
//! PostgREST-style row endpoints under `/rest/v1` and object storage under
//! `/storage/v1`.
//!
//! Requests carry the project's anon key as `apikey`. The bearer token is the
//! signed-in session's access token when one was attached with
//! [`HttpGateway::with_session`], otherwise the anon key.
//!
//! Query translation is kept in pure functions ([`query_params`],
//! [`filter_params`]) so it can be tested without a server.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use domains::{AppError, Filter, MediaStore, Query, Result, RowStore, Session};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, warn};

const REST_PATH: &str = "rest/v1";
const STORAGE_PATH: &str = "storage/v1/object";

/// Connection settings for [`HttpGateway`].
#[derive(Debug)]
pub struct GatewaySettings {
    /// Project URL, e.g. `https://abc.backend.example`.
    pub base_url: String,
    pub anon_key: SecretString,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

pub struct HttpGateway {
    http: reqwest::Client,
    base_url: String,
    anon_key: SecretString,
    session: Option<Arc<Session>>,
}

impl HttpGateway {
    /// # Errors
    ///
    /// Returns an internal error if the HTTP client cannot be built.
    pub fn new(settings: GatewaySettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("http client build failed: {e}")))?;
        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            anon_key: settings.anon_key,
            session: None,
        })
    }

    /// Sends the session's access token instead of the anon key.
    pub fn with_session(mut self, session: Arc<Session>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn bearer(&self) -> &str {
        match &self.session {
            Some(session) => session.access_token.expose_secret(),
            None => self.anon_key.expose_secret(),
        }
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/{REST_PATH}/{table}", self.base_url)
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", self.anon_key.expose_secret())
            .bearer_auth(self.bearer())
    }

    async fn send_json(&self, builder: reqwest::RequestBuilder, what: &str) -> Result<Value> {
        let response = builder
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("{what}: {e}")))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::Internal(format!("{what}: {e}")))?;

        if !(200..300).contains(&status) {
            warn!(what, status, "gateway returned an error status");
            return Err(gateway_error(status, &text));
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| AppError::malformed("response", e))
    }
}

/// Builds an [`AppError::Gateway`] from an error response body, preferring the
/// backend's own message fields.
pub fn gateway_error(status: u16, body: &str) -> AppError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            ["message", "error_description", "msg", "error"]
                .iter()
                .find_map(|key| v.get(*key).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| body.trim().to_string());
    AppError::Gateway { status, message }
}

fn expect_rows(value: Value) -> Result<Vec<Value>> {
    match value {
        Value::Array(rows) => Ok(rows),
        Value::Null => Ok(Vec::new()),
        other => Err(AppError::malformed("response", format!("expected an array of rows, got {other}"))),
    }
}

/// Renders a filter value the way the row endpoint expects it.
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Values inside `in.(...)` lists are quoted when they contain reserved
/// characters.
fn render_list_item(value: &Value) -> String {
    let raw = render_value(value);
    if raw.contains([',', '(', ')', '"', ' ']) {
        format!("\"{}\"", raw.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        raw
    }
}

pub fn filter_params(filters: &[Filter]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|f| match f {
            Filter::Eq(column, value) => (column.clone(), format!("eq.{}", render_value(value))),
            Filter::In(column, values) => {
                let items: Vec<String> = values.iter().map(render_list_item).collect();
                (column.clone(), format!("in.({})", items.join(",")))
            }
        })
        .collect()
}

pub fn query_params(query: &Query) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), query.column_list())];
    params.extend(filter_params(&query.filters));
    if let Some(order) = &query.order {
        let dir = if order.ascending { "asc" } else { "desc" };
        params.push(("order".to_string(), format!("{}.{dir}", order.column)));
    }
    if let Some(range) = query.range {
        params.push(("offset".to_string(), range.offset.to_string()));
        params.push(("limit".to_string(), range.limit.to_string()));
    }
    params
}

#[async_trait]
impl RowStore for HttpGateway {
    async fn select(&self, query: &Query) -> Result<Vec<Value>> {
        let url = self.rest_url(&query.table);
        let params = query_params(query);
        debug!(table = %query.table, ?params, "select");
        let builder = self.request(reqwest::Method::GET, &url).query(&params);
        expect_rows(self.send_json(builder, "select").await?)
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value> {
        let url = self.rest_url(table);
        debug!(table, "insert");
        let builder = self
            .request(reqwest::Method::POST, &url)
            .header("Prefer", "return=representation")
            .json(&row);
        expect_rows(self.send_json(builder, "insert").await?)?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::malformed("response", "insert returned no row"))
    }

    async fn update(&self, table: &str, filters: &[Filter], patch: Value) -> Result<Vec<Value>> {
        if filters.is_empty() {
            return Err(AppError::ValidationError("refusing to update without a filter".into()));
        }
        let url = self.rest_url(table);
        let params = filter_params(filters);
        debug!(table, ?params, "update");
        let builder = self
            .request(reqwest::Method::PATCH, &url)
            .query(&params)
            .header("Prefer", "return=representation")
            .json(&patch);
        expect_rows(self.send_json(builder, "update").await?)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<usize> {
        if filters.is_empty() {
            return Err(AppError::ValidationError("refusing to delete without a filter".into()));
        }
        let url = self.rest_url(table);
        let params = filter_params(filters);
        debug!(table, ?params, "delete");
        let builder = self
            .request(reqwest::Method::DELETE, &url)
            .query(&params)
            .header("Prefer", "return=representation");
        Ok(expect_rows(self.send_json(builder, "delete").await?)?.len())
    }
}

#[async_trait]
impl MediaStore for HttpGateway {
    async fn upload(&self, bucket: &str, path: &str, body: Bytes, content_type: &str) -> Result<()> {
        let url = format!("{}/{STORAGE_PATH}/{bucket}/{path}", self.base_url);
        debug!(bucket, path, size = body.len(), "object upload");
        let builder = self
            .request(reqwest::Method::POST, &url)
            .header("Content-Type", content_type)
            .header("Cache-Control", "max-age=3600")
            .body(body);
        self.send_json(builder, "upload").await.map(|_| ())
    }

    async fn public_url(&self, bucket: &str, path: &str) -> Result<String> {
        Ok(format!("{}/{STORAGE_PATH}/public/{bucket}/{path}", self.base_url))
    }
}
