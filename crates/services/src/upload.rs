//! # Upload Controller
//!
//! Drives one image upload at a time: validate, push the bytes to the
//! [`MediaStore`], resolve the public URL and hand a cache-busted copy of it
//! to the caller.
//!
//! While the store call is outstanding a synthetic progress ramp (see
//! [`crate::progress`]) runs alongside it. The ramp is cosmetic only.
//!
//! Object keys embed a timestamp and a random suffix, so keys are never
//! reused. The `?t=` cache-buster on the published URL is still the only
//! thing standing between a reused key and a stale cached image.

use std::sync::Arc;
use std::time::Duration;

use domains::{AppError, Clock, MediaStore, Result, UploadFile, MAX_UPLOAD_BYTES};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::progress::{estimate_progress, random_step};
use crate::utils::{cache_bust, storage_key};

const DEFAULT_TICK: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadPhase {
    #[default]
    Idle,
    Uploading,
    Success,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadState {
    pub phase: UploadPhase,
    /// Synthetic percentage; only meaningful while uploading.
    pub progress: u8,
    pub preview_url: Option<String>,
    pub error: Option<String>,
}

type UploadedFn = Box<dyn Fn(&str) + Send + Sync>;
type ClearedFn = Box<dyn Fn() + Send + Sync>;

pub struct UploadController {
    media: Arc<dyn MediaStore>,
    clock: Arc<dyn Clock>,
    bucket: String,
    folder: Option<String>,
    tick: Duration,
    state: Mutex<UploadState>,
    on_uploaded: UploadedFn,
    on_cleared: ClearedFn,
}

impl UploadController {
    pub fn new(media: Arc<dyn MediaStore>, clock: Arc<dyn Clock>, bucket: impl Into<String>) -> Self {
        Self {
            media,
            clock,
            bucket: bucket.into(),
            folder: None,
            tick: DEFAULT_TICK,
            state: Mutex::new(UploadState::default()),
            on_uploaded: Box::new(|_| {}),
            on_cleared: Box::new(|| {}),
        }
    }

    /// Prefix object keys with `folder/`.
    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into().trim_matches('/').to_string());
        self
    }

    /// Interval between synthetic progress steps.
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    pub fn on_uploaded(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_uploaded = Box::new(f);
        self
    }

    pub fn on_cleared(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_cleared = Box::new(f);
        self
    }

    pub async fn state(&self) -> UploadState {
        self.state.lock().await.clone()
    }

    /// Checks that `file` is an image no larger than 6 MiB. A rejected file
    /// moves the controller into the error phase with the reason.
    ///
    /// # Errors
    ///
    /// Returns a validation error describing why the file was refused.
    pub async fn select(&self, file: &UploadFile) -> Result<()> {
        match validate(file) {
            Ok(()) => {
                let mut state = self.state.lock().await;
                *state = UploadState { preview_url: state.preview_url.take(), ..UploadState::default() };
                Ok(())
            }
            Err(e) => {
                debug!(name = %file.name, content_type = %file.content_type, size = file.size(), "upload rejected");
                let mut state = self.state.lock().await;
                *state = UploadState { phase: UploadPhase::Error, error: Some(e.user_message()), ..UploadState::default() };
                Err(e)
            }
        }
    }

    /// Validates and uploads `file`, returning the cache-busted public URL.
    ///
    /// # Errors
    ///
    /// Returns the validation error, or the media store error that ended the
    /// upload. Either way the controller is left in the error phase.
    pub async fn upload(&self, file: &UploadFile) -> Result<String> {
        self.select(file).await?;

        let key = self.object_key(file);
        {
            let mut state = self.state.lock().await;
            state.phase = UploadPhase::Uploading;
            state.progress = 0;
            state.error = None;
        }
        debug!(bucket = %self.bucket, key = %key, size = file.size(), "upload started");

        let transfer = self.transfer(file, &key);
        tokio::pin!(transfer);
        let mut ticker = tokio::time::interval(self.tick.max(Duration::from_millis(1)));
        ticker.tick().await;

        let result = loop {
            tokio::select! {
                result = &mut transfer => break result,
                _ = ticker.tick() => {
                    let mut state = self.state.lock().await;
                    state.progress = estimate_progress(state.progress, random_step());
                }
            }
        };

        match result {
            Ok(public_url) => {
                let url = cache_bust(&public_url, self.clock.now());
                {
                    let mut state = self.state.lock().await;
                    *state = UploadState {
                        phase: UploadPhase::Success,
                        progress: 100,
                        preview_url: Some(url.clone()),
                        error: None,
                    };
                }
                info!(bucket = %self.bucket, key = %key, "upload finished");
                (self.on_uploaded)(&url);
                Ok(url)
            }
            Err(e) => {
                warn!(bucket = %self.bucket, key = %key, error = %e, "upload failed");
                let mut state = self.state.lock().await;
                state.phase = UploadPhase::Error;
                state.progress = 0;
                state.error = Some(e.user_message());
                Err(e)
            }
        }
    }

    /// Back to idle, forgetting any preview.
    pub async fn clear(&self) {
        *self.state.lock().await = UploadState::default();
        (self.on_cleared)();
    }

    async fn transfer(&self, file: &UploadFile, key: &str) -> Result<String> {
        self.media.upload(&self.bucket, key, file.bytes.clone(), &file.content_type).await?;
        self.media.public_url(&self.bucket, key).await
    }

    fn object_key(&self, file: &UploadFile) -> String {
        let ext = file.extension().unwrap_or_else(|| extension_for(&file.content_type));
        let key = storage_key(self.clock.now(), &ext);
        match &self.folder {
            Some(folder) if !folder.is_empty() => format!("{folder}/{key}"),
            _ => key,
        }
    }
}

fn validate(file: &UploadFile) -> Result<()> {
    if !file.content_type.contains("image/") {
        return Err(AppError::ValidationError(format!(
            "please choose an image file (got {})",
            if file.content_type.is_empty() { "unknown type" } else { &file.content_type }
        )));
    }
    if file.size() > MAX_UPLOAD_BYTES {
        return Err(AppError::ValidationError("image must be 6 MB or smaller".into()));
    }
    Ok(())
}

/// Extension for a name-less upload, from its MIME type.
fn extension_for(content_type: &str) -> String {
    let Ok(parsed) = content_type.parse::<mime::Mime>() else {
        return "bin".to_string();
    };
    let common = match (parsed.type_(), parsed.subtype()) {
        (mime::IMAGE, mime::PNG) => Some("png"),
        (mime::IMAGE, mime::JPEG) => Some("jpg"),
        (mime::IMAGE, mime::GIF) => Some("gif"),
        (mime::IMAGE, mime::BMP) => Some("bmp"),
        (mime::IMAGE, mime::SVG) => Some("svg"),
        _ => None,
    };
    common
        .or_else(|| mime_guess::get_mime_extensions(&parsed).and_then(|exts| exts.first().copied()))
        .unwrap_or("bin")
        .to_string()
}
