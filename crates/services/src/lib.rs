//! # services
//!
//! Resource fetchers and the controllers behind the admin screens: blog
//! pagination, cover image upload and the report moderation table. Only the
//! ports from `domains` are used here; adapters are wired in by the binary.

pub mod blogs;
pub mod moderation;
pub mod pagination;
pub mod profiles;
pub mod progress;
pub mod reports;
pub mod upload;
pub mod utils;

pub use blogs::{BlogPage, BlogPages, BlogService};
pub use moderation::{ReportAggregationView, ReportTable};
pub use pagination::{ListState, PageSource, PaginatedList};
pub use profiles::ProfileService;
pub use reports::{PostScope, ReportService};
pub use upload::{UploadController, UploadPhase, UploadState};
