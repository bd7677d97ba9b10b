//! Organization unit repository

use crate::db::DbPool;
use crate::models::OrganizationUnit;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

const UNIT_COLUMNS: &str =
    "id, name, slug, description, logo_url, sort_order, created_at, updated_at";

#[async_trait]
pub trait OrganizationUnitRepository: Send + Sync {
    async fn create(&self, unit: &OrganizationUnit) -> Result<OrganizationUnit>;
    async fn get_by_id(&self, id: i64) -> Result<Option<OrganizationUnit>>;
    async fn get_by_slug(&self, slug: &str) -> Result<Option<OrganizationUnit>>;
    /// All units ordered by `sort_order`, then name
    async fn list(&self) -> Result<Vec<OrganizationUnit>>;
    async fn update(&self, unit: &OrganizationUnit) -> Result<OrganizationUnit>;
    async fn delete(&self, id: i64) -> Result<()>;
    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;
}

pub struct SqlxOrganizationUnitRepository {
    pool: DbPool,
}

impl SqlxOrganizationUnitRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn OrganizationUnitRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl OrganizationUnitRepository for SqlxOrganizationUnitRepository {
    async fn create(&self, unit: &OrganizationUnit) -> Result<OrganizationUnit> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO organization_units (name, slug, description, logo_url, sort_order, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&unit.name)
        .bind(&unit.slug)
        .bind(&unit.description)
        .bind(&unit.logo_url)
        .bind(unit.sort_order)
        .bind(now)
        .bind(now)
        .execute(self.pool.pool())
        .await
        .context("Failed to create organization unit")?;

        Ok(OrganizationUnit {
            id: result.last_insert_rowid(),
            created_at: now,
            updated_at: now,
            ..unit.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<OrganizationUnit>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM organization_units WHERE id = ?",
            UNIT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool.pool())
        .await
        .context("Failed to get organization unit")?;
        Ok(row.map(|r| row_to_unit(&r)))
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<OrganizationUnit>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM organization_units WHERE slug = ?",
            UNIT_COLUMNS
        ))
        .bind(slug)
        .fetch_optional(self.pool.pool())
        .await
        .context("Failed to get organization unit by slug")?;
        Ok(row.map(|r| row_to_unit(&r)))
    }

    async fn list(&self) -> Result<Vec<OrganizationUnit>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM organization_units ORDER BY sort_order ASC, name ASC",
            UNIT_COLUMNS
        ))
        .fetch_all(self.pool.pool())
        .await
        .context("Failed to list organization units")?;
        Ok(rows.iter().map(row_to_unit).collect())
    }

    async fn update(&self, unit: &OrganizationUnit) -> Result<OrganizationUnit> {
        sqlx::query(
            "UPDATE organization_units SET name = ?, slug = ?, description = ?, logo_url = ?, sort_order = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&unit.name)
        .bind(&unit.slug)
        .bind(&unit.description)
        .bind(&unit.logo_url)
        .bind(unit.sort_order)
        .bind(Utc::now())
        .bind(unit.id)
        .execute(self.pool.pool())
        .await
        .context("Failed to update organization unit")?;

        self.get_by_id(unit.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Organization unit not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM organization_units WHERE id = ?")
            .bind(id)
            .execute(self.pool.pool())
            .await
            .context("Failed to delete organization unit")?;
        Ok(())
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM organization_units WHERE slug = ?")
            .bind(slug)
            .fetch_one(self.pool.pool())
            .await?;
        Ok(row.get::<i64, _>("count") > 0)
    }
}

fn row_to_unit(row: &sqlx::sqlite::SqliteRow) -> OrganizationUnit {
    OrganizationUnit {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
        description: row.get("description"),
        logo_url: row.get("logo_url"),
        sort_order: row.get("sort_order"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
