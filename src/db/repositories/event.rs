//! Event repository

use crate::db::DbPool;
use crate::models::{Event, EventFilter, EventStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite};
use std::str::FromStr;
use std::sync::Arc;

const EVENT_COLUMNS: &str = "id, title, slug, description, location, cover_image, start_at, end_at, status, is_featured, organization_unit_id, created_at, updated_at";

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn create(&self, event: &Event) -> Result<Event>;
    async fn get_by_id(&self, id: i64) -> Result<Option<Event>>;
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Event>>;
    /// Events matching the status, featured and unit filters, by start time.
    /// The `upcoming` filter is time-relative and left to the caller.
    async fn list(&self, filter: &EventFilter) -> Result<Vec<Event>>;
    async fn update(&self, event: &Event) -> Result<Event>;
    async fn delete(&self, id: i64) -> Result<()>;
    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;
    async fn count(&self) -> Result<i64>;
}

pub struct SqlxEventRepository {
    pool: DbPool,
}

impl SqlxEventRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn EventRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl EventRepository for SqlxEventRepository {
    async fn create(&self, event: &Event) -> Result<Event> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO events (title, slug, description, location, cover_image, start_at, end_at,
                                status, is_featured, organization_unit_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&event.title)
        .bind(&event.slug)
        .bind(&event.description)
        .bind(&event.location)
        .bind(&event.cover_image)
        .bind(event.start_at)
        .bind(event.end_at)
        .bind(event.status.to_string())
        .bind(event.is_featured)
        .bind(event.organization_unit_id)
        .bind(now)
        .bind(now)
        .execute(self.pool.pool())
        .await
        .context("Failed to create event")?;

        Ok(Event {
            id: result.last_insert_rowid(),
            created_at: now,
            updated_at: now,
            ..event.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Event>> {
        let row = sqlx::query(&format!("SELECT {} FROM events WHERE id = ?", EVENT_COLUMNS))
            .bind(id)
            .fetch_optional(self.pool.pool())
            .await
            .context("Failed to get event")?;
        Ok(row.map(|r| row_to_event(&r)))
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Event>> {
        let row = sqlx::query(&format!("SELECT {} FROM events WHERE slug = ?", EVENT_COLUMNS))
            .bind(slug)
            .fetch_optional(self.pool.pool())
            .await
            .context("Failed to get event by slug")?;
        Ok(row.map(|r| row_to_event(&r)))
    }

    async fn list(&self, filter: &EventFilter) -> Result<Vec<Event>> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM events WHERE 1 = 1", EVENT_COLUMNS));

        if let Some(status) = filter.status {
            query.push(" AND status = ");
            query.push_bind(status.to_string());
        }
        if let Some(featured) = filter.featured {
            query.push(" AND is_featured = ");
            query.push_bind(featured);
        }
        if let Some(unit_id) = filter.organization_unit_id {
            query.push(" AND organization_unit_id = ");
            query.push_bind(unit_id);
        }
        query.push(" ORDER BY start_at ASC, id ASC");

        let rows = query
            .build()
            .fetch_all(self.pool.pool())
            .await
            .context("Failed to list events")?;
        Ok(rows.iter().map(row_to_event).collect())
    }

    async fn update(&self, event: &Event) -> Result<Event> {
        sqlx::query(
            r#"
            UPDATE events
            SET title = ?, slug = ?, description = ?, location = ?, cover_image = ?, start_at = ?,
                end_at = ?, status = ?, is_featured = ?, organization_unit_id = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&event.title)
        .bind(&event.slug)
        .bind(&event.description)
        .bind(&event.location)
        .bind(&event.cover_image)
        .bind(event.start_at)
        .bind(event.end_at)
        .bind(event.status.to_string())
        .bind(event.is_featured)
        .bind(event.organization_unit_id)
        .bind(Utc::now())
        .bind(event.id)
        .execute(self.pool.pool())
        .await
        .context("Failed to update event")?;

        self.get_by_id(event.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Event not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM events WHERE id = ?")
            .bind(id)
            .execute(self.pool.pool())
            .await
            .context("Failed to delete event")?;
        Ok(())
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM events WHERE slug = ?")
            .bind(slug)
            .fetch_one(self.pool.pool())
            .await?;
        Ok(row.get::<i64, _>("count") > 0)
    }

    async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM events")
            .fetch_one(self.pool.pool())
            .await
            .context("Failed to count events")?;
        Ok(row.get("count"))
    }
}

fn row_to_event(row: &sqlx::sqlite::SqliteRow) -> Event {
    let status_str: String = row.get("status");
    Event {
        id: row.get("id"),
        title: row.get("title"),
        slug: row.get("slug"),
        description: row.get("description"),
        location: row.get("location"),
        cover_image: row.get("cover_image"),
        start_at: row.get("start_at"),
        end_at: row.get("end_at"),
        status: EventStatus::from_str(&status_str).unwrap_or_default(),
        is_featured: row.get("is_featured"),
        organization_unit_id: row.get("organization_unit_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
