//! Plain-text output for the CLI.

use std::fmt::Write;

use domains::{Blog, Profile, ReportAggregate};
use services::ReportTable;

const TITLE_WIDTH: usize = 48;

fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

pub fn blog_list(blogs: &[Blog], has_more: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<38} {:<10} {:<12} {}", "ID", "STATUS", "CREATED", "TITLE");
    for blog in blogs {
        let status = if blog.published { "published" } else { "draft" };
        let _ = writeln!(
            out,
            "{:<38} {:<10} {:<12} {}",
            blog.id,
            status,
            blog.created_at.format("%Y-%m-%d"),
            clip(&blog.title, TITLE_WIDTH)
        );
    }
    let _ = writeln!(out, "{} blog(s){}", blogs.len(), if has_more { ", more available" } else { "" });
    out
}

pub fn blog(blog: &Blog) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", blog.title);
    let _ = writeln!(out, "id:        {}", blog.id);
    let _ = writeln!(out, "author:    {}", blog.author_id);
    let _ = writeln!(out, "category:  {}", blog.category.as_deref().unwrap_or("-"));
    let _ = writeln!(out, "published: {}", blog.published);
    let _ = writeln!(out, "created:   {}", blog.created_at.to_rfc3339());
    if let Some(updated) = blog.updated_at {
        let _ = writeln!(out, "updated:   {}", updated.to_rfc3339());
    }
    if let Some(cover) = &blog.cover_image_url {
        let _ = writeln!(out, "cover:     {cover}");
    }
    if let Some(excerpt) = &blog.excerpt {
        let _ = writeln!(out, "\n{excerpt}");
    }
    let _ = writeln!(out, "\n{}", blog.content);
    out
}

fn report_row(out: &mut String, row: &ReportAggregate) {
    let status = if row.is_active { "active" } else { "hidden" };
    let _ = writeln!(
        out,
        "{:>4}  {:<6} {:>7}  {:<6}  {}",
        row.display_id,
        row.item_type,
        row.total_reports,
        status,
        clip(&row.title, TITLE_WIDTH)
    );
}

pub fn report_table(table: &ReportTable) -> String {
    let mut out = String::new();
    if let Some(error) = &table.error {
        let _ = writeln!(out, "! {error}");
    }
    if table.rows.is_empty() {
        let _ = writeln!(out, "No reported items.");
        return out;
    }
    let _ = writeln!(out, "{:>4}  {:<6} {:>7}  {:<6}  {}", "#", "TYPE", "REPORTS", "STATUS", "TITLE");
    for row in &table.rows {
        report_row(&mut out, row);
    }
    out
}

pub fn profile(profile: &Profile) -> String {
    format!("{} ({:?})\nid: {}\n", profile.username, profile.role, profile.id)
}
