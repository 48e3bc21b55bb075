//! Demo data for `--offline`.

use chrono::{Duration, Utc};
use serde_json::{json, Value};
use storage_adapters::MemoryGateway;

pub const DEMO_EMAIL: &str = "admin@quire.local";
pub const DEMO_PASSWORD: &str = "quire";
pub const DEMO_USER_ID: &str = "demo-admin";

const CATEGORIES: [&str; 3] = ["news", "guides", "releases"];

fn at(hours_ago: i64) -> String {
    (Utc::now() - Duration::hours(hours_ago)).to_rfc3339()
}

fn report(id: usize, column: &str, target: &str, hours_ago: i64, reason: &str) -> Value {
    json!({
        "id": format!("r{id}"),
        column: target,
        "reporter_id": "member-7",
        "reason": reason,
        "created_at": at(hours_ago),
    })
}

pub fn populate(gateway: &MemoryGateway) {
    gateway.seed(
        "profiles",
        [json!({ "id": DEMO_USER_ID, "username": "demo", "role": "admin" })],
    );

    gateway.seed(
        "blogs",
        (1..=23i64).map(|n| {
            json!({
                "id": format!("blog-{n:02}"),
                "title": format!("Field notes, part {n}"),
                "content": format!("Entry {n} of the demo journal."),
                "excerpt": format!("Part {n}"),
                "category": CATEGORIES[(n as usize) % CATEGORIES.len()],
                "author_id": DEMO_USER_ID,
                "published": n % 4 != 0,
                "created_at": at(24 * (24 - n)),
            })
        }),
    );

    gateway.seed(
        "threads",
        [
            json!({ "id": "thread-1", "title": "Discount watches, DM me", "is_active": true }),
            json!({ "id": "thread-2", "title": "Weekly off-topic", "is_active": true }),
        ],
    );
    gateway.seed(
        "posts",
        [
            json!({ "id": "post-1", "content": "This whole forum is a joke\n(rest of rant)", "is_active": true }),
            json!({ "id": "post-2", "content": "Click here for free stuff", "is_active": false }),
        ],
    );
    gateway.seed(
        "thread_reports",
        [
            report(1, "thread_id", "thread-1", 5, "spam"),
            report(2, "thread_id", "thread-1", 3, "spam"),
            report(3, "thread_id", "thread-2", 9, "off topic"),
        ],
    );
    gateway.seed(
        "post_reports",
        [
            report(4, "post_id", "post-1", 2, "harassment"),
            report(5, "post_id", "post-2", 30, "spam"),
            report(6, "post_id", "post-2", 28, "spam"),
            report(7, "post_id", "post-gone", 40, "spam"),
        ],
    );
}
