//! # Report fetchers
//!
//! Reads raw report rows, folds them per reported target, and joins in the
//! target's title and `is_active` flag. Also flips that flag for moderators.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use domains::{
    AppError, Envelope, Filter, ItemType, PostReport, PostSummary, Query, ReportedItem, Result, RowStore,
    ThreadReport, ThreadSummary,
};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::utils::{map_rows, title_from};

const THREAD_REPORTS: &str = "thread_reports";
const POST_REPORTS: &str = "post_reports";
const POST_TITLE_CHARS: usize = 80;
const DELETED_TITLE: &str = "[deleted]";

/// Which post reports to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostScope {
    All,
    Id(String),
}

#[derive(Clone)]
pub struct ReportService {
    rows: Arc<dyn RowStore>,
}

impl ReportService {
    pub fn new(rows: Arc<dyn RowStore>) -> Self {
        Self { rows }
    }

    /// Every reported thread with its report count.
    pub async fn get_reported_threads(&self) -> Envelope<Vec<ReportedItem>> {
        envelope("get_reported_threads", self.reported_threads().await)
    }

    /// Reported posts: all of them, or just the one named by `scope`.
    pub async fn get_reports_by_post_id(&self, scope: PostScope) -> Envelope<Vec<ReportedItem>> {
        envelope("get_reports_by_post_id", self.reported_posts(&scope).await)
    }

    /// Sets `is_active` on the thread or post behind a report.
    pub async fn set_item_active(&self, item_type: ItemType, item_id: &str, active: bool) -> Envelope<()> {
        let filters = [Filter::Eq("id".into(), Value::from(item_id))];
        let result = self.rows.update(item_type.table(), &filters, json!({ "is_active": active })).await;
        match result {
            Ok(updated) if updated.is_empty() => {
                let err = AppError::NotFound(capitalized(item_type), item_id.to_string());
                warn!(%item_type, item_id, "status toggle matched no row");
                Envelope::fail(err.user_message())
            }
            Ok(_) => {
                info!(%item_type, item_id, active, "item status changed");
                Envelope::ok(())
            }
            Err(e) => {
                warn!(%item_type, item_id, error = %e, "status toggle failed");
                Envelope::fail(e.user_message())
            }
        }
    }

    async fn reported_threads(&self) -> Result<Vec<ReportedItem>> {
        let query = Query::table(THREAD_REPORTS).order_by("created_at", false);
        let reports = map_rows::<ThreadReport>("thread report", self.rows.select(&query).await?)?;
        let tallies = tally(reports.iter().map(|r| (&r.thread_id, &r.reason, r.created_at)));
        if tallies.is_empty() {
            return Ok(Vec::new());
        }

        let query = Query::table("threads")
            .select(&["id", "title", "is_active"])
            .is_in("id", tallies.keys().cloned());
        let targets: HashMap<String, ThreadSummary> =
            map_rows::<ThreadSummary>("thread", self.rows.select(&query).await?)?
                .into_iter()
                .map(|t| (t.id.clone(), t))
                .collect();

        let items = tallies
            .into_iter()
            .map(|(id, tally)| {
                let (title, is_active) = match targets.get(&id) {
                    Some(t) => (t.title.clone(), t.is_active),
                    None => (DELETED_TITLE.to_string(), false),
                };
                tally.into_item(id, title, is_active)
            })
            .collect();
        Ok(sorted(items))
    }

    async fn reported_posts(&self, scope: &PostScope) -> Result<Vec<ReportedItem>> {
        let mut query = Query::table(POST_REPORTS);
        if let PostScope::Id(post_id) = scope {
            query = query.eq("post_id", post_id.as_str());
        }
        let query = query.order_by("created_at", false);
        let reports = map_rows::<PostReport>("post report", self.rows.select(&query).await?)?;
        let tallies = tally(reports.iter().map(|r| (&r.post_id, &r.reason, r.created_at)));
        if tallies.is_empty() {
            return Ok(Vec::new());
        }

        let query = Query::table("posts")
            .select(&["id", "content", "is_active"])
            .is_in("id", tallies.keys().cloned());
        let targets: HashMap<String, PostSummary> = map_rows::<PostSummary>("post", self.rows.select(&query).await?)?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

        let items = tallies
            .into_iter()
            .map(|(id, tally)| {
                let (title, is_active) = match targets.get(&id) {
                    Some(p) => (title_from(&p.content, POST_TITLE_CHARS), p.is_active),
                    None => (DELETED_TITLE.to_string(), false),
                };
                tally.into_item(id, title, is_active)
            })
            .collect();
        Ok(sorted(items))
    }
}

struct Tally {
    count: u32,
    latest_reason: Option<String>,
    last_reported_at: DateTime<Utc>,
}

impl Tally {
    fn into_item(self, item_id: String, title: String, is_active: bool) -> ReportedItem {
        ReportedItem {
            item_id,
            title,
            total_reports: self.count,
            is_active,
            latest_reason: self.latest_reason,
            last_reported_at: self.last_reported_at,
        }
    }
}

fn tally<'a>(
    rows: impl Iterator<Item = (&'a String, &'a Option<String>, DateTime<Utc>)>,
) -> HashMap<String, Tally> {
    let mut tallies: HashMap<String, Tally> = HashMap::new();
    for (target, reason, at) in rows {
        let entry = tallies.entry(target.clone()).or_insert_with(|| Tally {
            count: 0,
            latest_reason: None,
            last_reported_at: at,
        });
        entry.count += 1;
        if at >= entry.last_reported_at {
            entry.last_reported_at = at;
            if reason.is_some() {
                entry.latest_reason = reason.clone();
            }
        }
    }
    tallies
}

/// Most reported first; ties broken by recency, then id.
fn sorted(mut items: Vec<ReportedItem>) -> Vec<ReportedItem> {
    items.sort_by(|a, b| {
        b.total_reports
            .cmp(&a.total_reports)
            .then(b.last_reported_at.cmp(&a.last_reported_at))
            .then_with(|| a.item_id.cmp(&b.item_id))
    });
    items
}

fn capitalized(item_type: ItemType) -> String {
    match item_type {
        ItemType::Thread => "Thread".into(),
        ItemType::Post => "Post".into(),
    }
}

fn envelope(op: &'static str, result: Result<Vec<ReportedItem>>) -> Envelope<Vec<ReportedItem>> {
    match result {
        Ok(items) => {
            debug!(op, count = items.len(), "fetched reported items");
            Envelope::ok(items)
        }
        Err(e) => {
            warn!(op, error = %e, "report request failed");
            Envelope::fail(e.user_message())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::MockRowStore;

    fn report(id: &str, target_col: &str, target: &str, at: &str, reason: Option<&str>) -> Value {
        json!({ "id": id, target_col: target, "reason": reason, "created_at": at })
    }

    #[tokio::test]
    async fn thread_reports_are_grouped_and_joined() {
        let mut rows = MockRowStore::new();
        rows.expect_select().withf(|q| q.table == THREAD_REPORTS).returning(|_| {
            Ok(vec![
                report("r1", "thread_id", "t1", "2026-02-01T00:00:00Z", Some("spam")),
                report("r2", "thread_id", "t2", "2026-02-02T00:00:00Z", None),
                report("r3", "thread_id", "t1", "2026-02-03T00:00:00Z", Some("abuse")),
            ])
        });
        rows.expect_select().withf(|q| q.table == "threads").returning(|q| {
            assert!(matches!(&q.filters[0], Filter::In(col, ids) if col == "id" && ids.len() == 2));
            Ok(vec![
                json!({ "id": "t1", "title": "Buy now", "is_active": true }),
                json!({ "id": "t2", "title": "Hello", "is_active": false }),
            ])
        });

        let items = ReportService::new(Arc::new(rows)).get_reported_threads().await.into_data().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].item_id, "t1");
        assert_eq!(items[0].total_reports, 2);
        assert_eq!(items[0].latest_reason.as_deref(), Some("abuse"));
        assert_eq!(items[1].title, "Hello");
        assert!(!items[1].is_active);
    }

    #[tokio::test]
    async fn no_reports_skips_target_lookup() {
        let mut rows = MockRowStore::new();
        rows.expect_select().times(1).returning(|_| Ok(vec![]));

        let env = ReportService::new(Arc::new(rows)).get_reports_by_post_id(PostScope::All).await;
        assert_eq!(env.data, Some(vec![]));
    }

    #[tokio::test]
    async fn single_post_scope_filters_by_post_id() {
        let mut rows = MockRowStore::new();
        rows.expect_select()
            .withf(|q| q.table == POST_REPORTS)
            .returning(|q| {
                assert_eq!(q.filters, vec![Filter::Eq("post_id".into(), json!("p9"))]);
                Ok(vec![report("r1", "post_id", "p9", "2026-02-01T00:00:00Z", None)])
            });
        rows.expect_select()
            .withf(|q| q.table == "posts")
            .returning(|_| Ok(vec![json!({ "id": "p9", "content": "\nfirst line\nsecond", "is_active": true })]));

        let items = ReportService::new(Arc::new(rows))
            .get_reports_by_post_id(PostScope::Id("p9".into()))
            .await
            .into_data()
            .unwrap();
        assert_eq!(items[0].title, "first line");
    }

    #[tokio::test]
    async fn missing_target_is_listed_as_deleted() {
        let mut rows = MockRowStore::new();
        rows.expect_select()
            .withf(|q| q.table == POST_REPORTS)
            .returning(|_| Ok(vec![report("r1", "post_id", "p1", "2026-02-01T00:00:00Z", None)]));
        rows.expect_select().withf(|q| q.table == "posts").returning(|_| Ok(vec![]));

        let items = ReportService::new(Arc::new(rows))
            .get_reports_by_post_id(PostScope::All)
            .await
            .into_data()
            .unwrap();
        assert_eq!(items[0].title, DELETED_TITLE);
        assert!(!items[0].is_active);
    }

    #[tokio::test]
    async fn toggle_targets_the_backing_table() {
        let mut rows = MockRowStore::new();
        rows.expect_update()
            .withf(|table, filters, patch| {
                table == "posts"
                    && filters == [Filter::Eq("id".into(), json!("p1"))]
                    && *patch == json!({ "is_active": false })
            })
            .times(1)
            .returning(|_, _, patch| Ok(vec![patch]));

        let env = ReportService::new(Arc::new(rows)).set_item_active(ItemType::Post, "p1", false).await;
        assert!(env.success);
    }

    #[tokio::test]
    async fn toggle_of_unknown_item_fails() {
        let mut rows = MockRowStore::new();
        rows.expect_update().returning(|_, _, _| Ok(vec![]));

        let env = ReportService::new(Arc::new(rows)).set_item_active(ItemType::Thread, "t0", true).await;
        assert_eq!(env.failure_message(), "Thread not found with ID t0");
    }
}
