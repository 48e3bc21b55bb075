//! # Domain Models
//!
//! Explicit record types for every row shape the admin screens read from the
//! backend. Rows are mapped into these at the gateway boundary; anything that
//! does not fit is rejected as `AppError::Malformed`.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Largest image the upload controller accepts (6 MiB).
pub const MAX_UPLOAD_BYTES: usize = 6 * 1024 * 1024;

const MAX_EXTENSION_LEN: usize = 8;

/// A blog article as stored in the `blogs` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blog {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    pub author_id: String,
    #[serde(default)]
    pub published: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Writable subset of a [`Blog`]. Used as the full payload on create and as a
/// sparse patch on update: `None` fields are left out of the request body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlogDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
}

/// Which kind of forum item a report points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Thread,
    Post,
}

impl ItemType {
    /// Backing table holding the reported item itself.
    pub fn table(self) -> &'static str {
        match self {
            ItemType::Thread => "threads",
            ItemType::Post => "posts",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ItemType::Thread => "thread",
            ItemType::Post => "post",
        }
    }
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Raw row from `thread_reports`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadReport {
    pub id: String,
    pub thread_id: String,
    #[serde(default)]
    pub reporter_id: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Raw row from `post_reports`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostReport {
    pub id: String,
    pub post_id: String,
    #[serde(default)]
    pub reporter_id: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The columns of a reported thread the moderation table needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadSummary {
    pub id: String,
    pub title: String,
    pub is_active: bool,
}

/// The columns of a reported post the moderation table needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: String,
    pub content: String,
    pub is_active: bool,
}

/// One reported target with its report rows folded together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportedItem {
    pub item_id: String,
    pub title: String,
    pub total_reports: u32,
    pub is_active: bool,
    pub latest_reason: Option<String>,
    pub last_reported_at: DateTime<Utc>,
}

/// A row of the moderation table. `display_id` is positional and only
/// meaningful for the list it was built in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportAggregate {
    pub display_id: usize,
    pub item_id: String,
    pub item_type: ItemType,
    pub title: String,
    pub total_reports: u32,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Member,
    Moderator,
    Admin,
}

/// Public profile row from `profiles`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub role: Role,
}

/// An authenticated session. Passed explicitly to the adapters that need it.
#[derive(Debug)]
pub struct Session {
    pub user_id: String,
    pub email: Option<String>,
    pub access_token: SecretString,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// A file picked for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    /// Original file name, used only for its extension.
    pub name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self { name: name.into(), content_type: content_type.into(), bytes: bytes.into() }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Lower-cased extension of the original name. Only 1 to 8 ASCII
    /// alphanumerics count; anything else is treated as no extension.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() || ext.len() > MAX_EXTENSION_LEN {
            return None;
        }
        if !ext.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn blog_row_tolerates_missing_optional_columns() {
        let row = serde_json::json!({
            "id": "b1",
            "title": "Hello",
            "content": "World",
            "author_id": "u1",
            "created_at": "2026-03-01T10:00:00Z"
        });
        let blog: Blog = serde_json::from_value(row).unwrap();
        assert_eq!(blog.category, None);
        assert!(!blog.published);
    }

    #[test]
    fn draft_patch_skips_unset_fields() {
        let draft = BlogDraft { title: Some("New".into()), ..Default::default() };
        assert_eq!(serde_json::to_value(&draft).unwrap(), serde_json::json!({ "title": "New" }));
    }

    #[test]
    fn upload_extension_is_lowercased() {
        let file = UploadFile::new("Cover.PNG", "image/png", vec![1, 2, 3]);
        assert_eq!(file.extension().as_deref(), Some("png"));
        assert_eq!(file.size(), 3);
        assert_eq!(UploadFile::new(".env", "text/plain", vec![]).extension(), None);
        assert_eq!(UploadFile::new("noext", "image/png", vec![]).extension(), None);
    }

    #[test]
    fn unsafe_extensions_are_ignored() {
        for name in ["cover.png#x", "cover.a/../../etc", "cover.p?t=1", "cover.verylongext", "cover.pn g"] {
            assert_eq!(UploadFile::new(name, "image/png", vec![]).extension(), None, "{name}");
        }
        assert_eq!(UploadFile::new("photo.webp", "image/webp", vec![]).extension().as_deref(), Some("webp"));
    }

    #[test]
    fn session_expiry() {
        let now = Utc::now();
        let session = Session {
            user_id: "u1".into(),
            email: None,
            access_token: SecretString::from("tok".to_string()),
            expires_at: Some(now - Duration::seconds(1)),
        };
        assert!(session.is_expired(now));
    }
}
