use std::sync::Arc;

use domains::BlogDraft;
use integration_tests::fixtures::{epoch, StepClock};
use services::BlogService;
use storage_adapters::MemoryGateway;

fn draft(title: &str) -> BlogDraft {
    BlogDraft {
        title: Some(title.into()),
        content: Some("Some words".into()),
        author_id: Some("author-1".into()),
        category: Some("news".into()),
        ..BlogDraft::default()
    }
}

#[tokio::test]
async fn create_read_update_delete() -> anyhow::Result<()> {
    let gateway = Arc::new(MemoryGateway::default());
    let service = BlogService::new(gateway.clone(), StepClock::starting_at(epoch()));

    let created = service.create_blog(draft("Hello")).await;
    assert_eq!(created.message.as_deref(), Some("Blog created"));
    let blog = created.into_data().ok_or_else(|| anyhow::anyhow!("no blog returned"))?;

    let fetched = service.get_blog_by_id(&blog.id).await.into_data();
    assert_eq!(fetched.as_ref().map(|b| b.title.as_str()), Some("Hello"));

    let patch = BlogDraft { title: Some("Hello again".into()), ..BlogDraft::default() };
    let updated = service.update_blog(&blog.id, patch).await.into_data();
    let updated = updated.ok_or_else(|| anyhow::anyhow!("update failed"))?;
    assert_eq!(updated.title, "Hello again");
    assert_eq!(updated.content, "Some words");
    assert!(updated.updated_at.is_some());

    assert!(service.delete_blog(&blog.id).await.success);
    assert!(gateway.rows("blogs").is_empty());

    let again = service.delete_blog(&blog.id).await;
    assert_eq!(again.failure_message(), format!("Blog not found with ID {}", blog.id));
    Ok(())
}

#[tokio::test]
async fn invalid_drafts_never_reach_the_gateway() {
    let gateway = Arc::new(MemoryGateway::default());
    let service = BlogService::new(gateway.clone(), StepClock::starting_at(epoch()));

    let env = service.create_blog(BlogDraft { content: None, ..draft("x") }).await;
    assert!(!env.success);
    assert_eq!(env.failure_message(), "validation error: content is required");
    assert!(gateway.rows("blogs").is_empty());
}

#[tokio::test]
async fn missing_blog_is_reported_by_id() {
    let service = BlogService::new(Arc::new(MemoryGateway::default()), StepClock::starting_at(epoch()));
    let env = service.get_blog_by_id("nope").await;
    assert_eq!(env.failure_message(), "Blog not found with ID nope");

    let listed = service.get_blogs(0, 10, "author-1").await;
    assert!(listed.success);
    assert_eq!(listed.data.map(|p| p.blogs.len()), Some(0));
}
