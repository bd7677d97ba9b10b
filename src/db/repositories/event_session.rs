//! Event session (agenda) repository

use crate::db::DbPool;
use crate::models::EventSession;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row;
use std::sync::Arc;

const SESSION_COLUMNS: &str =
    "id, event_id, title, description, start_at, end_at, location, sort_order";

#[async_trait]
pub trait EventSessionRepository: Send + Sync {
    async fn create(&self, session: &EventSession) -> Result<EventSession>;
    async fn get_by_id(&self, id: i64) -> Result<Option<EventSession>>;
    /// Agenda of one event, by sort order then start time
    async fn list_by_event(&self, event_id: i64) -> Result<Vec<EventSession>>;
    async fn update(&self, session: &EventSession) -> Result<EventSession>;
    async fn delete(&self, id: i64) -> Result<()>;
}

pub struct SqlxEventSessionRepository {
    pool: DbPool,
}

impl SqlxEventSessionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn EventSessionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl EventSessionRepository for SqlxEventSessionRepository {
    async fn create(&self, session: &EventSession) -> Result<EventSession> {
        let result = sqlx::query(
            "INSERT INTO event_sessions (event_id, title, description, start_at, end_at, location, sort_order) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(session.event_id)
        .bind(&session.title)
        .bind(&session.description)
        .bind(session.start_at)
        .bind(session.end_at)
        .bind(&session.location)
        .bind(session.sort_order)
        .execute(self.pool.pool())
        .await
        .context("Failed to create event session")?;

        Ok(EventSession {
            id: result.last_insert_rowid(),
            ..session.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<EventSession>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM event_sessions WHERE id = ?",
            SESSION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool.pool())
        .await
        .context("Failed to get event session")?;
        Ok(row.map(|r| row_to_session(&r)))
    }

    async fn list_by_event(&self, event_id: i64) -> Result<Vec<EventSession>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM event_sessions WHERE event_id = ? ORDER BY sort_order ASC, start_at ASC, id ASC",
            SESSION_COLUMNS
        ))
        .bind(event_id)
        .fetch_all(self.pool.pool())
        .await
        .context("Failed to list event sessions")?;
        Ok(rows.iter().map(row_to_session).collect())
    }

    async fn update(&self, session: &EventSession) -> Result<EventSession> {
        sqlx::query(
            "UPDATE event_sessions SET title = ?, description = ?, start_at = ?, end_at = ?, location = ?, sort_order = ? WHERE id = ?",
        )
        .bind(&session.title)
        .bind(&session.description)
        .bind(session.start_at)
        .bind(session.end_at)
        .bind(&session.location)
        .bind(session.sort_order)
        .bind(session.id)
        .execute(self.pool.pool())
        .await
        .context("Failed to update event session")?;

        self.get_by_id(session.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Event session not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM event_sessions WHERE id = ?")
            .bind(id)
            .execute(self.pool.pool())
            .await
            .context("Failed to delete event session")?;
        Ok(())
    }
}

fn row_to_session(row: &sqlx::sqlite::SqliteRow) -> EventSession {
    EventSession {
        id: row.get("id"),
        event_id: row.get("event_id"),
        title: row.get("title"),
        description: row.get("description"),
        start_at: row.get("start_at"),
        end_at: row.get("end_at"),
        location: row.get("location"),
        sort_order: row.get("sort_order"),
    }
}
