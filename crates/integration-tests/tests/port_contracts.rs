//! Behaviour every `RowStore`/`MediaStore`/`AuthProvider` implementation is
//! expected to share, checked against the in-memory adapters, plus the
//! services' handling of port failures via mocks.

use std::sync::Arc;

use auth_adapters::MemoryAuth;
use bytes::Bytes;
use domains::{AppError, AuthProvider, Filter, MediaStore, MockRowStore, Query, RowStore};
use integration_tests::fixtures::{epoch, gateway_with_blogs, StepClock};
use mockall::predicate::function;
use serde_json::json;
use services::{BlogService, ProfileService};
use storage_adapters::MemoryGateway;
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn select_window_is_offset_then_limit() {
    let gateway = gateway_with_blogs("a", 5);
    let query = Query::table("blogs").eq("author_id", "a").order_by("created_at", true).range(3, 10);
    let rows = assert_ok!(gateway.select(&query).await);
    let ids: Vec<&str> = rows.iter().filter_map(|r| r["id"].as_str()).collect();
    assert_eq!(ids, vec!["blog-004", "blog-005"]);
}

#[tokio::test]
async fn update_returns_only_changed_rows() {
    let gateway = gateway_with_blogs("a", 2);
    let rows = assert_ok!(
        gateway
            .update("blogs", &[Filter::Eq("id".into(), json!("blog-001"))], json!({ "published": true }))
            .await
    );
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["published"], true);
}

#[tokio::test]
async fn unfiltered_writes_are_refused() {
    let gateway = gateway_with_blogs("a", 2);
    assert_err!(gateway.delete("blogs", &[]).await);
    assert_err!(gateway.update("blogs", &[], json!({ "published": false })).await);
    assert!(gateway.rows("blogs").iter().any(|r| r["published"] == true));
    assert_eq!(gateway.rows("blogs").len(), 5);
}

#[tokio::test]
async fn media_public_url_points_at_the_object() {
    let gateway = MemoryGateway::new("https://cdn.test");
    assert_ok!(gateway.upload("b", "k.png", Bytes::from_static(b"x"), "image/png").await);
    assert_eq!(assert_ok!(gateway.public_url("b", "k.png").await), "https://cdn.test/b/k.png");
}

#[tokio::test]
async fn sign_in_yields_a_live_session() {
    let auth = MemoryAuth::new().with_account("mod@example.com", "secret", "u-mod");
    let session = assert_ok!(auth.sign_in("mod@example.com", "secret").await);
    assert_eq!(session.user_id, "u-mod");
    assert!(!session.is_expired(chrono::Utc::now()));

    let err = assert_err!(auth.sign_in("mod@example.com", "guess").await);
    assert!(matches!(err, AppError::Unauthorized(_)));
}

#[tokio::test]
async fn transport_errors_become_generic_failure_envelopes() {
    let mut rows = MockRowStore::new();
    rows.expect_select()
        .with(function(|q: &Query| q.table == "blogs" && q.range.is_some_and(|r| r.limit == 10)))
        .times(1)
        .returning(|_| Err(AppError::Gateway { status: 500, message: String::new() }));

    let service = BlogService::new(Arc::new(rows), StepClock::starting_at(epoch()));
    let env = service.get_blogs(0, 10, "a").await;
    assert!(!env.success);
    assert_eq!(env.failure_message(), domains::GENERIC_FAILURE);
}

#[tokio::test]
async fn malformed_rows_are_reported_not_panicked_on() {
    let mut rows = MockRowStore::new();
    rows.expect_select().returning(|_| Ok(vec![json!({ "id": 7 })]));

    let env = ProfileService::new(Arc::new(rows)).get_profile("u1").await;
    assert!(!env.success);
    assert!(env.failure_message().starts_with("malformed profile row"));
}
