//! Hero announcement repository

use crate::db::DbPool;
use crate::models::HeroAnnouncement;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

const HERO_COLUMNS: &str = "id, title, subtitle, image_url, link_url, link_label, is_active, sort_order, starts_at, ends_at, created_at, updated_at";

#[async_trait]
pub trait HeroRepository: Send + Sync {
    async fn create(&self, hero: &HeroAnnouncement) -> Result<HeroAnnouncement>;
    async fn get_by_id(&self, id: i64) -> Result<Option<HeroAnnouncement>>;
    /// All announcements by sort order
    async fn list(&self) -> Result<Vec<HeroAnnouncement>>;
    /// Active announcements by sort order; windows are checked by the caller
    async fn list_active(&self) -> Result<Vec<HeroAnnouncement>>;
    async fn update(&self, hero: &HeroAnnouncement) -> Result<HeroAnnouncement>;
    async fn delete(&self, id: i64) -> Result<()>;
}

pub struct SqlxHeroRepository {
    pool: DbPool,
}

impl SqlxHeroRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn HeroRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl HeroRepository for SqlxHeroRepository {
    async fn create(&self, hero: &HeroAnnouncement) -> Result<HeroAnnouncement> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO hero_announcements (title, subtitle, image_url, link_url, link_label, is_active,
                                            sort_order, starts_at, ends_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&hero.title)
        .bind(&hero.subtitle)
        .bind(&hero.image_url)
        .bind(&hero.link_url)
        .bind(&hero.link_label)
        .bind(hero.is_active)
        .bind(hero.sort_order)
        .bind(hero.starts_at)
        .bind(hero.ends_at)
        .bind(now)
        .bind(now)
        .execute(self.pool.pool())
        .await
        .context("Failed to create hero announcement")?;

        Ok(HeroAnnouncement {
            id: result.last_insert_rowid(),
            created_at: now,
            updated_at: now,
            ..hero.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<HeroAnnouncement>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM hero_announcements WHERE id = ?",
            HERO_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool.pool())
        .await
        .context("Failed to get hero announcement")?;
        Ok(row.map(|r| row_to_hero(&r)))
    }

    async fn list(&self) -> Result<Vec<HeroAnnouncement>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM hero_announcements ORDER BY sort_order ASC, id ASC",
            HERO_COLUMNS
        ))
        .fetch_all(self.pool.pool())
        .await
        .context("Failed to list hero announcements")?;
        Ok(rows.iter().map(row_to_hero).collect())
    }

    async fn list_active(&self) -> Result<Vec<HeroAnnouncement>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM hero_announcements WHERE is_active = 1 ORDER BY sort_order ASC, id ASC",
            HERO_COLUMNS
        ))
        .fetch_all(self.pool.pool())
        .await
        .context("Failed to list active hero announcements")?;
        Ok(rows.iter().map(row_to_hero).collect())
    }

    async fn update(&self, hero: &HeroAnnouncement) -> Result<HeroAnnouncement> {
        sqlx::query(
            r#"
            UPDATE hero_announcements
            SET title = ?, subtitle = ?, image_url = ?, link_url = ?, link_label = ?, is_active = ?,
                sort_order = ?, starts_at = ?, ends_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&hero.title)
        .bind(&hero.subtitle)
        .bind(&hero.image_url)
        .bind(&hero.link_url)
        .bind(&hero.link_label)
        .bind(hero.is_active)
        .bind(hero.sort_order)
        .bind(hero.starts_at)
        .bind(hero.ends_at)
        .bind(Utc::now())
        .bind(hero.id)
        .execute(self.pool.pool())
        .await
        .context("Failed to update hero announcement")?;

        self.get_by_id(hero.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Hero announcement not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM hero_announcements WHERE id = ?")
            .bind(id)
            .execute(self.pool.pool())
            .await
            .context("Failed to delete hero announcement")?;
        Ok(())
    }
}

fn row_to_hero(row: &sqlx::sqlite::SqliteRow) -> HeroAnnouncement {
    HeroAnnouncement {
        id: row.get("id"),
        title: row.get("title"),
        subtitle: row.get("subtitle"),
        image_url: row.get("image_url"),
        link_url: row.get("link_url"),
        link_label: row.get("link_label"),
        is_active: row.get("is_active"),
        sort_order: row.get("sort_order"),
        starts_at: row.get("starts_at"),
        ends_at: row.get("ends_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
