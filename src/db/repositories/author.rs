//! Author repository

use crate::db::DbPool;
use crate::models::Author;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite};
use std::sync::Arc;

const AUTHOR_COLUMNS: &str = "id, name, slug, bio, avatar_url, email, created_at, updated_at";

#[async_trait]
pub trait AuthorRepository: Send + Sync {
    async fn create(&self, author: &Author) -> Result<Author>;
    async fn get_by_id(&self, id: i64) -> Result<Option<Author>>;
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Author>>;
    /// Authors with the given ids, in no particular order
    async fn get_by_ids(&self, ids: &[i64]) -> Result<Vec<Author>>;
    /// All authors ordered by name
    async fn list(&self) -> Result<Vec<Author>>;
    async fn update(&self, author: &Author) -> Result<Author>;
    /// Delete an author. Bylines on posts go with it.
    async fn delete(&self, id: i64) -> Result<()>;
    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;
}

pub struct SqlxAuthorRepository {
    pool: DbPool,
}

impl SqlxAuthorRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn AuthorRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl AuthorRepository for SqlxAuthorRepository {
    async fn create(&self, author: &Author) -> Result<Author> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO authors (name, slug, bio, avatar_url, email, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&author.name)
        .bind(&author.slug)
        .bind(&author.bio)
        .bind(&author.avatar_url)
        .bind(&author.email)
        .bind(now)
        .bind(now)
        .execute(self.pool.pool())
        .await
        .context("Failed to create author")?;

        Ok(Author {
            id: result.last_insert_rowid(),
            created_at: now,
            updated_at: now,
            ..author.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Author>> {
        let row = sqlx::query(&format!("SELECT {} FROM authors WHERE id = ?", AUTHOR_COLUMNS))
            .bind(id)
            .fetch_optional(self.pool.pool())
            .await
            .context("Failed to get author")?;
        Ok(row.map(|r| row_to_author(&r)))
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Author>> {
        let row = sqlx::query(&format!("SELECT {} FROM authors WHERE slug = ?", AUTHOR_COLUMNS))
            .bind(slug)
            .fetch_optional(self.pool.pool())
            .await
            .context("Failed to get author by slug")?;
        Ok(row.map(|r| row_to_author(&r)))
    }

    async fn get_by_ids(&self, ids: &[i64]) -> Result<Vec<Author>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM authors WHERE id IN (", AUTHOR_COLUMNS));
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let rows = builder
            .build()
            .fetch_all(self.pool.pool())
            .await
            .context("Failed to get authors by ids")?;
        Ok(rows.iter().map(row_to_author).collect())
    }

    async fn list(&self) -> Result<Vec<Author>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM authors ORDER BY name ASC, id ASC",
            AUTHOR_COLUMNS
        ))
        .fetch_all(self.pool.pool())
        .await
        .context("Failed to list authors")?;
        Ok(rows.iter().map(row_to_author).collect())
    }

    async fn update(&self, author: &Author) -> Result<Author> {
        sqlx::query(
            "UPDATE authors SET name = ?, slug = ?, bio = ?, avatar_url = ?, email = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&author.name)
        .bind(&author.slug)
        .bind(&author.bio)
        .bind(&author.avatar_url)
        .bind(&author.email)
        .bind(Utc::now())
        .bind(author.id)
        .execute(self.pool.pool())
        .await
        .context("Failed to update author")?;

        self.get_by_id(author.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Author not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM authors WHERE id = ?")
            .bind(id)
            .execute(self.pool.pool())
            .await
            .context("Failed to delete author")?;
        Ok(())
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM authors WHERE slug = ?")
            .bind(slug)
            .fetch_one(self.pool.pool())
            .await?;
        Ok(row.get::<i64, _>("count") > 0)
    }
}

fn row_to_author(row: &sqlx::sqlite::SqliteRow) -> Author {
    Author {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
        bio: row.get("bio"),
        avatar_url: row.get("avatar_url"),
        email: row.get("email"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
