//! # Blog fetchers
//!
//! Thin wrappers over the [`RowStore`] port for the blog CMS screens. Every
//! call returns an [`Envelope`]; gateway failures are logged and folded into
//! `success: false`.

use std::sync::Arc;

use async_trait::async_trait;
use domains::{AppError, Blog, BlogDraft, Clock, Envelope, Filter, Query, Result, RowStore};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::pagination::PageSource;
use crate::utils::{map_row, map_rows};

const TABLE: &str = "blogs";

/// Payload of a blog listing call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogPage {
    pub blogs: Vec<Blog>,
}

#[derive(Clone)]
pub struct BlogService {
    rows: Arc<dyn RowStore>,
    clock: Arc<dyn Clock>,
}

impl BlogService {
    pub fn new(rows: Arc<dyn RowStore>, clock: Arc<dyn Clock>) -> Self {
        Self { rows, clock }
    }

    /// One page of an author's blogs, newest first.
    pub async fn get_blogs(&self, offset: usize, limit: usize, author_id: &str) -> Envelope<BlogPage> {
        self.get_blogs_filtered(offset, limit, author_id, None).await
    }

    /// Same as [`get_blogs`](Self::get_blogs), narrowed to one category.
    pub async fn get_blogs_filtered(
        &self,
        offset: usize,
        limit: usize,
        author_id: &str,
        category: Option<&str>,
    ) -> Envelope<BlogPage> {
        let mut query = Query::table(TABLE).eq("author_id", author_id);
        if let Some(category) = category {
            query = query.eq("category", category);
        }
        let query = query.order_by("created_at", false).range(offset, limit);

        let result = async {
            let rows = self.rows.select(&query).await?;
            map_rows::<Blog>("blog", rows)
        }
        .await;

        match result {
            Ok(blogs) => {
                debug!(author_id, offset, limit, count = blogs.len(), "fetched blog page");
                Envelope::ok(BlogPage { blogs })
            }
            Err(e) => fail("get_blogs", e),
        }
    }

    pub async fn get_blog_by_id(&self, id: &str) -> Envelope<Blog> {
        let query = Query::table(TABLE).eq("id", id).range(0, 1);
        let result = async {
            let row = self.rows.select(&query).await?.into_iter().next();
            let row = row.ok_or_else(|| AppError::NotFound("Blog".into(), id.to_string()))?;
            map_row::<Blog>("blog", row)
        }
        .await;
        result.map_or_else(|e| fail("get_blog_by_id", e), Envelope::ok)
    }

    pub async fn create_blog(&self, draft: BlogDraft) -> Envelope<Blog> {
        let result = async {
            validate_new(&draft)?;
            let row = serde_json::to_value(&draft).map_err(|e| AppError::Internal(e.to_string()))?;
            let stored = self.rows.insert(TABLE, row).await?;
            map_row::<Blog>("blog", stored)
        }
        .await;

        match result {
            Ok(blog) => {
                info!(blog_id = %blog.id, author_id = %blog.author_id, "blog created");
                Envelope::ok_with_message(blog, "Blog created")
            }
            Err(e) => fail("create_blog", e),
        }
    }

    /// Applies the set fields of `draft` and stamps `updated_at`.
    pub async fn update_blog(&self, id: &str, draft: BlogDraft) -> Envelope<Blog> {
        let result = async {
            if draft == BlogDraft::default() {
                return Err(AppError::ValidationError("nothing to update".into()));
            }
            if draft.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
                return Err(AppError::ValidationError("title cannot be empty".into()));
            }
            let mut patch = serde_json::to_value(&draft).map_err(|e| AppError::Internal(e.to_string()))?;
            if let Value::Object(map) = &mut patch {
                map.insert("updated_at".into(), Value::String(self.clock.now().to_rfc3339()));
            }
            let filters = [Filter::Eq("id".into(), Value::from(id))];
            let updated = self.rows.update(TABLE, &filters, patch).await?;
            let row = updated
                .into_iter()
                .next()
                .ok_or_else(|| AppError::NotFound("Blog".into(), id.to_string()))?;
            map_row::<Blog>("blog", row)
        }
        .await;

        match result {
            Ok(blog) => {
                info!(blog_id = %blog.id, "blog updated");
                Envelope::ok_with_message(blog, "Blog updated")
            }
            Err(e) => fail("update_blog", e),
        }
    }

    pub async fn delete_blog(&self, id: &str) -> Envelope<()> {
        let filters = [Filter::Eq("id".into(), Value::from(id))];
        match self.rows.delete(TABLE, &filters).await {
            Ok(0) => fail("delete_blog", AppError::NotFound("Blog".into(), id.to_string())),
            Ok(_) => {
                info!(blog_id = id, "blog deleted");
                Envelope::ok_with_message((), "Blog deleted")
            }
            Err(e) => fail("delete_blog", e),
        }
    }
}

fn validate_new(draft: &BlogDraft) -> Result<()> {
    let blank = |field: &Option<String>| field.as_deref().is_none_or(|v| v.trim().is_empty());
    if blank(&draft.title) {
        return Err(AppError::ValidationError("title is required".into()));
    }
    if blank(&draft.content) {
        return Err(AppError::ValidationError("content is required".into()));
    }
    if blank(&draft.author_id) {
        return Err(AppError::ValidationError("author is required".into()));
    }
    Ok(())
}

fn fail<T>(op: &'static str, e: AppError) -> Envelope<T> {
    warn!(op, error = %e, "blog request failed");
    Envelope::fail(e.user_message())
}

/// Feeds a [`PaginatedList`](crate::pagination::PaginatedList) with an
/// author's blogs, optionally restricted to one category.
#[derive(Clone)]
pub struct BlogPages {
    service: BlogService,
    category: Option<String>,
}

impl BlogPages {
    pub fn new(service: BlogService) -> Self {
        Self { service, category: None }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

#[async_trait]
impl PageSource for BlogPages {
    type Item = Blog;

    async fn fetch_page(&self, owner_id: &str, offset: usize, limit: usize) -> Envelope<Vec<Blog>> {
        self.service
            .get_blogs_filtered(offset, limit, owner_id, self.category.as_deref())
            .await
            .map(|page| page.blogs)
    }
}
