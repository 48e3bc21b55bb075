//! # configs
//!
//! Layered settings for the Quire binary:
//!
//! 1. built-in defaults,
//! 2. an optional TOML file (`quire.toml` in the working directory, the path
//!    in `QUIRE_CONFIG`, or an explicit path from the caller),
//! 3. `QUIRE__<SECTION>__<KEY>` environment variables, after `.env` has been
//!    loaded with `dotenvy`.
//!
//! Secrets are read as plain strings and wrapped in `SecretString` before
//! they leave this crate.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_BUCKET: &str = "blog-images";

const DEFAULTS: &str = r#"
[gateway]
url = ""
anon_key = ""
request_timeout_secs = 30
connect_timeout_secs = 10

[storage]
bucket = "blog-images"
folder = "covers"

[pagination]
page_size = 10

[auth]

[log]
filter = "info"
format = "pretty"
"#;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Deserialize)]
struct RawSettings {
    gateway: RawGateway,
    storage: StorageSettings,
    pagination: PaginationSettings,
    auth: RawAuth,
    log: LogSettings,
}

#[derive(Debug, Deserialize)]
struct RawGateway {
    url: String,
    anon_key: String,
    request_timeout_secs: u64,
    connect_timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
struct RawAuth {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageSettings {
    pub bucket: String,
    pub folder: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaginationSettings {
    pub page_size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogSettings {
    pub filter: String,
    pub format: LogFormat,
}

#[derive(Debug)]
pub struct GatewaySettings {
    /// Empty when no hosted backend is configured.
    pub url: String,
    pub anon_key: SecretString,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl GatewaySettings {
    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

#[derive(Debug)]
pub struct AuthSettings {
    pub email: Option<String>,
    pub password: Option<SecretString>,
}

#[derive(Debug)]
pub struct Settings {
    pub gateway: GatewaySettings,
    pub storage: StorageSettings,
    pub pagination: PaginationSettings,
    pub auth: AuthSettings,
    pub log: LogSettings,
    /// The `.env` file that was loaded, if any. Logging is not up yet while
    /// settings load, so the caller reports it.
    pub env_file: Option<PathBuf>,
}

impl Settings {
    /// Loads `.env`, then the layered sources described in the crate docs.
    /// An explicit `file` must exist; the implicit ones are optional.
    ///
    /// # Errors
    ///
    /// Returns an error when a source cannot be parsed or a value is invalid.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let env_file = dotenvy::dotenv().ok();
        let (file, required) = match file {
            Some(path) => (path.to_string_lossy().into_owned(), true),
            None => (std::env::var("QUIRE_CONFIG").unwrap_or_else(|_| "quire.toml".to_string()), false),
        };
        let builder = Config::builder()
            .add_source(File::from_str(DEFAULTS, FileFormat::Toml))
            .add_source(File::new(&file, FileFormat::Toml).required(required))
            .add_source(Environment::with_prefix("QUIRE").prefix_separator("__").separator("__"));
        let mut settings = Self::from_config(builder.build()?)?;
        settings.env_file = env_file;
        Ok(settings)
    }

    /// Builds settings from TOML text layered over the defaults. No
    /// environment variables are read.
    ///
    /// # Errors
    ///
    /// Returns an error when the text cannot be parsed or a value is invalid.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from_str(DEFAULTS, FileFormat::Toml))
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?;
        Self::from_config(config)
    }

    fn from_config(config: Config) -> Result<Self, ConfigError> {
        let raw: RawSettings = config.try_deserialize()?;

        if raw.pagination.page_size == 0 {
            return Err(ConfigError::Invalid("pagination.page_size must be greater than zero".into()));
        }
        if raw.storage.bucket.trim().is_empty() {
            return Err(ConfigError::Invalid("storage.bucket must not be empty".into()));
        }
        let url = raw.gateway.url.trim().trim_end_matches('/').to_string();
        if !url.is_empty() && !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!("gateway.url must be an http(s) URL, got {url}")));
        }
        if !url.is_empty() && raw.gateway.anon_key.trim().is_empty() {
            return Err(ConfigError::Invalid("gateway.anon_key is required when gateway.url is set".into()));
        }

        Ok(Self {
            gateway: GatewaySettings {
                url,
                anon_key: SecretString::from(raw.gateway.anon_key),
                request_timeout: Duration::from_secs(raw.gateway.request_timeout_secs),
                connect_timeout: Duration::from_secs(raw.gateway.connect_timeout_secs),
            },
            storage: raw.storage,
            pagination: raw.pagination,
            auth: AuthSettings {
                email: raw.auth.email.filter(|e| !e.trim().is_empty()),
                password: raw.auth.password.map(SecretString::from),
            },
            log: raw.log,
            env_file: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn defaults_apply_without_overrides() {
        let s = Settings::from_toml("").unwrap();
        assert!(!s.gateway.is_configured());
        assert_eq!(s.pagination.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(s.storage.bucket, DEFAULT_BUCKET);
        assert_eq!(s.storage.folder.as_deref(), Some("covers"));
        assert_eq!(s.log.format, LogFormat::Pretty);
        assert_eq!(s.gateway.request_timeout, Duration::from_secs(30));
        assert!(s.auth.password.is_none());
        assert!(s.env_file.is_none());
    }

    #[test]
    fn file_values_override_defaults() {
        let s = Settings::from_toml(
            r#"
            [gateway]
            url = "https://proj.backend.example/"
            anon_key = "anon"
            [pagination]
            page_size = 25
            [auth]
            email = "ops@example.com"
            password = "hunter2"
            [log]
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(s.gateway.url, "https://proj.backend.example");
        assert_eq!(s.gateway.anon_key.expose_secret(), "anon");
        assert_eq!(s.pagination.page_size, 25);
        assert_eq!(s.auth.password.as_ref().map(|p| p.expose_secret().to_string()).as_deref(), Some("hunter2"));
        assert_eq!(s.log.format, LogFormat::Json);
    }

    #[test]
    fn zero_page_size_is_invalid() {
        let err = Settings::from_toml("[pagination]\npage_size = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn url_without_key_is_invalid() {
        let err = Settings::from_toml("[gateway]\nurl = \"https://x.example\"").unwrap_err();
        assert!(err.to_string().contains("anon_key"));
    }

    #[test]
    fn non_http_url_is_invalid() {
        let err = Settings::from_toml("[gateway]\nurl = \"ftp://x\"\nanon_key = \"k\"").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn explicit_file_loads_and_reports_no_env_file() {
        let path = std::env::temp_dir().join(format!("quire-settings-{}.toml", std::process::id()));
        std::fs::write(&path, "[pagination]\npage_size = 7\n").unwrap();
        let s = Settings::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(s.pagination.page_size, 7);
        // No `.env` sits next to this crate's manifest.
        assert!(s.env_file.is_none());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = Settings::load(Some(Path::new("/nonexistent/quire.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }

    #[test]
    fn secrets_are_redacted_in_debug_output() {
        let s = Settings::from_toml("[gateway]\nurl = \"https://x.example\"\nanon_key = \"very-secret\"").unwrap();
        assert!(!format!("{s:?}").contains("very-secret"));
    }
}
