//! Round-table gallery repository
//!
//! Gallery items are photos attached to events. The public gallery only
//! shows photos of published events.

use crate::db::DbPool;
use crate::models::{EventGalleryItem, GalleryEntry};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

#[async_trait]
pub trait GalleryRepository: Send + Sync {
    async fn create(&self, item: &EventGalleryItem) -> Result<EventGalleryItem>;
    async fn get_by_id(&self, id: i64) -> Result<Option<GalleryEntry>>;
    async fn list_by_event(&self, event_id: i64) -> Result<Vec<EventGalleryItem>>;
    /// Every item with its event, newest event first
    async fn list_all(&self) -> Result<Vec<GalleryEntry>>;
    /// Items of published events, newest event first
    async fn list_published(&self) -> Result<Vec<GalleryEntry>>;
    async fn update(&self, item: &EventGalleryItem) -> Result<EventGalleryItem>;
    async fn delete(&self, id: i64) -> Result<()>;
}

pub struct SqlxGalleryRepository {
    pool: DbPool,
}

impl SqlxGalleryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn GalleryRepository> {
        Arc::new(Self::new(pool))
    }

    async fn list_entries(&self, published_only: bool) -> Result<Vec<GalleryEntry>> {
        let sql = format!(
            "SELECT g.id, g.event_id, g.image_url, g.caption, g.sort_order, g.created_at, \
                    e.title AS event_title, e.slug AS event_slug \
             FROM event_gallery_items g JOIN events e ON e.id = g.event_id \
             {} ORDER BY e.start_at DESC, g.sort_order ASC, g.id ASC",
            if published_only { "WHERE e.status = 'published'" } else { "" }
        );
        let rows = sqlx::query(&sql)
            .fetch_all(self.pool.pool())
            .await
            .context("Failed to list gallery items")?;
        Ok(rows.iter().map(row_to_entry).collect())
    }
}

#[async_trait]
impl GalleryRepository for SqlxGalleryRepository {
    async fn create(&self, item: &EventGalleryItem) -> Result<EventGalleryItem> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO event_gallery_items (event_id, image_url, caption, sort_order, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(item.event_id)
        .bind(&item.image_url)
        .bind(&item.caption)
        .bind(item.sort_order)
        .bind(now)
        .execute(self.pool.pool())
        .await
        .context("Failed to create gallery item")?;

        Ok(EventGalleryItem {
            id: result.last_insert_rowid(),
            created_at: now,
            ..item.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<GalleryEntry>> {
        let row = sqlx::query(
            "SELECT g.id, g.event_id, g.image_url, g.caption, g.sort_order, g.created_at, \
                    e.title AS event_title, e.slug AS event_slug \
             FROM event_gallery_items g JOIN events e ON e.id = g.event_id \
             WHERE g.id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool.pool())
        .await
        .context("Failed to get gallery item")?;
        Ok(row.map(|r| row_to_entry(&r)))
    }

    async fn list_by_event(&self, event_id: i64) -> Result<Vec<EventGalleryItem>> {
        let rows = sqlx::query(
            "SELECT id, event_id, image_url, caption, sort_order, created_at \
             FROM event_gallery_items WHERE event_id = ? ORDER BY sort_order ASC, id ASC",
        )
        .bind(event_id)
        .fetch_all(self.pool.pool())
        .await
        .context("Failed to list event gallery")?;
        Ok(rows.iter().map(row_to_item).collect())
    }

    async fn list_all(&self) -> Result<Vec<GalleryEntry>> {
        self.list_entries(false).await
    }

    async fn list_published(&self) -> Result<Vec<GalleryEntry>> {
        self.list_entries(true).await
    }

    async fn update(&self, item: &EventGalleryItem) -> Result<EventGalleryItem> {
        sqlx::query(
            "UPDATE event_gallery_items SET event_id = ?, image_url = ?, caption = ?, sort_order = ? WHERE id = ?",
        )
        .bind(item.event_id)
        .bind(&item.image_url)
        .bind(&item.caption)
        .bind(item.sort_order)
        .bind(item.id)
        .execute(self.pool.pool())
        .await
        .context("Failed to update gallery item")?;

        self.get_by_id(item.id)
            .await?
            .map(|entry| entry.item)
            .ok_or_else(|| anyhow::anyhow!("Gallery item not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM event_gallery_items WHERE id = ?")
            .bind(id)
            .execute(self.pool.pool())
            .await
            .context("Failed to delete gallery item")?;
        Ok(())
    }
}

fn row_to_item(row: &sqlx::sqlite::SqliteRow) -> EventGalleryItem {
    EventGalleryItem {
        id: row.get("id"),
        event_id: row.get("event_id"),
        image_url: row.get("image_url"),
        caption: row.get("caption"),
        sort_order: row.get("sort_order"),
        created_at: row.get("created_at"),
    }
}

fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> GalleryEntry {
    GalleryEntry {
        item: row_to_item(row),
        event_title: row.get("event_title"),
        event_slug: row.get("event_slug"),
    }
}
