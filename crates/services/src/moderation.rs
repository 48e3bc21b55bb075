//! # Report Aggregation View
//!
//! The moderator's combined table of reported threads and posts.
//!
//! `fetch_all` runs both report fetches concurrently and waits for both to
//! settle. A side that fails contributes no rows; its error is logged and a
//! single combined notice is set. Which side failed is not surfaced in the
//! notice (only in the log).

use domains::{ItemType, ReportAggregate, ReportedItem};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::reports::{PostScope, ReportService};

/// Notice shown when either report source could not be loaded.
pub const FETCH_NOTICE: &str = "Failed to load reports";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportTable {
    pub rows: Vec<ReportAggregate>,
    pub loading: bool,
    pub error: Option<String>,
}

pub struct ReportAggregationView {
    reports: ReportService,
    table: Mutex<ReportTable>,
}

impl ReportAggregationView {
    pub fn new(reports: ReportService) -> Self {
        Self { reports, table: Mutex::new(ReportTable::default()) }
    }

    pub async fn table(&self) -> ReportTable {
        self.table.lock().await.clone()
    }

    /// Reloads both report sources and rebuilds the table.
    pub async fn fetch_all(&self) -> ReportTable {
        self.table.lock().await.loading = true;

        let (threads, posts) = tokio::join!(
            self.reports.get_reported_threads(),
            self.reports.get_reports_by_post_id(PostScope::All),
        );

        let mut failed = false;
        let mut side = |item_type: ItemType, env: domains::Envelope<Vec<ReportedItem>>| {
            if env.success {
                env.data.unwrap_or_default()
            } else {
                warn!(%item_type, error = env.failure_message(), "report source failed; showing it as empty");
                failed = true;
                Vec::new()
            }
        };
        let threads = side(ItemType::Thread, threads);
        let posts = side(ItemType::Post, posts);

        let rows = build_rows(threads, posts);
        info!(rows = rows.len(), failed, "report table loaded");

        let mut table = self.table.lock().await;
        *table = ReportTable { rows, loading: false, error: failed.then(|| FETCH_NOTICE.to_string()) };
        table.clone()
    }

    /// Flips `is_active` on the item behind `row`, then reloads everything.
    /// On failure the table is left as is apart from the error notice.
    pub async fn toggle_status(&self, row: &ReportAggregate) -> ReportTable {
        let env = self.reports.set_item_active(row.item_type, &row.item_id, !row.is_active).await;
        if env.success {
            return self.fetch_all().await;
        }
        let mut table = self.table.lock().await;
        table.error = Some(env.failure_message().to_string());
        table.clone()
    }

    /// Looks a row up by the number shown in the table.
    pub async fn row(&self, display_id: usize) -> Option<ReportAggregate> {
        self.table.lock().await.rows.iter().find(|r| r.display_id == display_id).cloned()
    }
}

/// Tags each item with its source, threads first, and numbers them from 1.
pub fn build_rows(threads: Vec<ReportedItem>, posts: Vec<ReportedItem>) -> Vec<ReportAggregate> {
    let tagged = threads
        .into_iter()
        .map(|item| (ItemType::Thread, item))
        .chain(posts.into_iter().map(|item| (ItemType::Post, item)));

    tagged
        .enumerate()
        .map(|(i, (item_type, item))| ReportAggregate {
            display_id: i + 1,
            item_id: item.item_id,
            item_type,
            title: item.title,
            total_reports: item.total_reports,
            is_active: item.is_active,
        })
        .collect()
}
