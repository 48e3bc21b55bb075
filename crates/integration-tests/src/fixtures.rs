use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use domains::Clock;
use serde_json::{json, Value};
use storage_adapters::MemoryGateway;

/// 2026-01-01T00:00:00Z
pub fn epoch() -> DateTime<Utc> {
    Utc.timestamp_opt(1_767_225_600, 0).single().unwrap_or_default()
}

/// A clock that moves forward one millisecond on every read.
pub struct StepClock {
    millis: AtomicI64,
}

impl StepClock {
    pub fn starting_at(start: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self { millis: AtomicI64::new(start.timestamp_millis()) })
    }
}

impl Clock for StepClock {
    fn now(&self) -> DateTime<Utc> {
        let millis = self.millis.fetch_add(1, Ordering::SeqCst);
        Utc.timestamp_millis_opt(millis).single().unwrap_or_default()
    }
}

/// A blog row `n` minutes after [`epoch`], so higher `n` is newer.
pub fn blog_row(n: usize, author_id: &str, category: Option<&str>) -> Value {
    let created_at = epoch() + TimeDelta::minutes(n as i64);
    json!({
        "id": format!("blog-{n:03}"),
        "title": format!("Post number {n}"),
        "content": format!("Body of post {n}"),
        "category": category,
        "author_id": author_id,
        "published": n % 2 == 0,
        "created_at": created_at.to_rfc3339(),
    })
}

/// Gateway holding `count` blogs by `author_id` and a few by someone else.
pub fn gateway_with_blogs(author_id: &str, count: usize) -> Arc<MemoryGateway> {
    let gateway = Arc::new(MemoryGateway::default());
    gateway.seed("blogs", (1..=count).map(|n| blog_row(n, author_id, None)));
    gateway.seed("blogs", (1..=3).map(|n| blog_row(100 + n, "someone-else", None)));
    gateway
}

fn report(id: &str, column: &str, target: &str, minutes: i64, reason: &str) -> Value {
    json!({
        "id": id,
        column: target,
        "reporter_id": "member-1",
        "reason": reason,
        "created_at": (epoch() + TimeDelta::minutes(minutes)).to_rfc3339(),
    })
}

/// Thread `t1` (two reports), thread `t2` (one) and post `p1` (one).
pub fn gateway_with_reports() -> Arc<MemoryGateway> {
    let gateway = Arc::new(MemoryGateway::default());
    gateway.seed(
        "threads",
        [
            json!({ "id": "t1", "title": "Cheap watches", "is_active": true }),
            json!({ "id": "t2", "title": "Rules discussion", "is_active": true }),
        ],
    );
    gateway.seed("posts", [json!({ "id": "p1", "content": "you are all wrong\nand more", "is_active": true })]);
    gateway.seed(
        "thread_reports",
        [
            report("tr1", "thread_id", "t1", 1, "spam"),
            report("tr2", "thread_id", "t1", 5, "spam again"),
            report("tr3", "thread_id", "t2", 3, "off topic"),
        ],
    );
    gateway.seed("post_reports", [report("pr1", "post_id", "p1", 2, "rude")]);
    gateway
}
