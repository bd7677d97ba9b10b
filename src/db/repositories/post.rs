//! Post repository
//!
//! Posts carry their tags as a JSON array column and their bylines through
//! the `post_authors` join table. Bylines are loaded in one batch per
//! listing.

use crate::db::DbPool;
use crate::models::{AuthorRef, ListParams, Post, PostFilter, PostStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

const POST_COLUMNS: &str = "id, slug, title, excerpt, content, content_html, cover_image, status, tags, published_at, created_at, updated_at";

#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert a post with its bylines, in order
    async fn create(&self, post: &Post, author_ids: &[i64]) -> Result<Post>;
    async fn get_by_id(&self, id: i64) -> Result<Option<Post>>;
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>>;
    /// One page of posts matching `filter`, newest first, plus the total count
    async fn list(&self, filter: &PostFilter, params: &ListParams) -> Result<(Vec<Post>, i64)>;
    /// Update a post. Bylines are replaced only when `author_ids` is given.
    async fn update(&self, post: &Post, author_ids: Option<&[i64]>) -> Result<Post>;
    async fn delete(&self, id: i64) -> Result<()>;
    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;
    async fn count_by_status(&self, status: PostStatus) -> Result<i64>;
}

pub struct SqlxPostRepository {
    pool: DbPool,
}

impl SqlxPostRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool))
    }

    /// Attach bylines to `posts` with a single query
    async fn load_authors(&self, posts: &mut [Post]) -> Result<()> {
        if posts.is_empty() {
            return Ok(());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT pa.post_id, a.id, a.name, a.slug, a.avatar_url \
             FROM post_authors pa JOIN authors a ON a.id = pa.author_id \
             WHERE pa.post_id IN (",
        );
        let mut separated = builder.separated(", ");
        for post in posts.iter() {
            separated.push_bind(post.id);
        }
        separated.push_unseparated(") ORDER BY pa.post_id, pa.position");

        let rows = builder
            .build()
            .fetch_all(self.pool.pool())
            .await
            .context("Failed to load post authors")?;

        let mut by_post: HashMap<i64, Vec<AuthorRef>> = HashMap::new();
        for row in rows {
            by_post
                .entry(row.get("post_id"))
                .or_default()
                .push(AuthorRef {
                    id: row.get("id"),
                    name: row.get("name"),
                    slug: row.get("slug"),
                    avatar_url: row.get("avatar_url"),
                });
        }

        for post in posts.iter_mut() {
            post.authors = by_post.remove(&post.id).unwrap_or_default();
        }
        Ok(())
    }

    async fn with_authors(&self, row: Option<sqlx::sqlite::SqliteRow>) -> Result<Option<Post>> {
        let Some(row) = row else {
            return Ok(None);
        };
        let mut posts = vec![row_to_post(&row)?];
        self.load_authors(&mut posts).await?;
        Ok(posts.pop())
    }
}

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn create(&self, post: &Post, author_ids: &[i64]) -> Result<Post> {
        let now = Utc::now();
        let tags = serde_json::to_string(&post.tags).context("Failed to encode tags")?;
        let mut tx = self.pool.pool().begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO posts (slug, title, excerpt, content, content_html, cover_image, status, tags, published_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&post.slug)
        .bind(&post.title)
        .bind(&post.excerpt)
        .bind(&post.content)
        .bind(&post.content_html)
        .bind(&post.cover_image)
        .bind(post.status.to_string())
        .bind(tags)
        .bind(post.published_at)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .context("Failed to create post")?;

        let id = result.last_insert_rowid();
        replace_authors(&mut tx, id, author_ids).await?;
        tx.commit().await?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Post not found after create"))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Post>> {
        let row = sqlx::query(&format!("SELECT {} FROM posts WHERE id = ?", POST_COLUMNS))
            .bind(id)
            .fetch_optional(self.pool.pool())
            .await
            .context("Failed to get post")?;
        self.with_authors(row).await
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        let row = sqlx::query(&format!("SELECT {} FROM posts WHERE slug = ?", POST_COLUMNS))
            .bind(slug)
            .fetch_optional(self.pool.pool())
            .await
            .context("Failed to get post by slug")?;
        self.with_authors(row).await
    }

    async fn list(&self, filter: &PostFilter, params: &ListParams) -> Result<(Vec<Post>, i64)> {
        let mut count_query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) as count FROM posts");
        push_filter(&mut count_query, filter);
        let total: i64 = count_query
            .build()
            .fetch_one(self.pool.pool())
            .await
            .context("Failed to count posts")?
            .get("count");

        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM posts", POST_COLUMNS));
        push_filter(&mut query, filter);
        query.push(" ORDER BY COALESCE(published_at, created_at) DESC, id DESC LIMIT ");
        query.push_bind(params.limit());
        query.push(" OFFSET ");
        query.push_bind(params.offset());

        let rows = query
            .build()
            .fetch_all(self.pool.pool())
            .await
            .context("Failed to list posts")?;

        let mut posts = rows.iter().map(row_to_post).collect::<Result<Vec<_>>>()?;
        self.load_authors(&mut posts).await?;
        Ok((posts, total))
    }

    async fn update(&self, post: &Post, author_ids: Option<&[i64]>) -> Result<Post> {
        let tags = serde_json::to_string(&post.tags).context("Failed to encode tags")?;
        let mut tx = self.pool.pool().begin().await?;

        sqlx::query(
            r#"
            UPDATE posts
            SET slug = ?, title = ?, excerpt = ?, content = ?, content_html = ?, cover_image = ?,
                status = ?, tags = ?, published_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&post.slug)
        .bind(&post.title)
        .bind(&post.excerpt)
        .bind(&post.content)
        .bind(&post.content_html)
        .bind(&post.cover_image)
        .bind(post.status.to_string())
        .bind(tags)
        .bind(post.published_at)
        .bind(Utc::now())
        .bind(post.id)
        .execute(&mut *tx)
        .await
        .context("Failed to update post")?;

        if let Some(ids) = author_ids {
            replace_authors(&mut tx, post.id, ids).await?;
        }
        tx.commit().await?;

        self.get_by_id(post.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Post not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(self.pool.pool())
            .await
            .context("Failed to delete post")?;
        Ok(())
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM posts WHERE slug = ?")
            .bind(slug)
            .fetch_one(self.pool.pool())
            .await?;
        Ok(row.get::<i64, _>("count") > 0)
    }

    async fn count_by_status(&self, status: PostStatus) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM posts WHERE status = ?")
            .bind(status.to_string())
            .fetch_one(self.pool.pool())
            .await
            .context("Failed to count posts")?;
        Ok(row.get("count"))
    }
}

fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &PostFilter) {
    let mut has_where = false;
    let mut clause = |builder: &mut QueryBuilder<'_, Sqlite>| {
        builder.push(if has_where { " AND " } else { " WHERE " });
        has_where = true;
    };

    if let Some(status) = filter.status {
        clause(builder);
        builder.push("status = ");
        builder.push_bind(status.to_string());
    }
    if let Some(author_id) = filter.author_id {
        clause(builder);
        builder.push("EXISTS (SELECT 1 FROM post_authors pa WHERE pa.post_id = posts.id AND pa.author_id = ");
        builder.push_bind(author_id);
        builder.push(")");
    }
    if let Some(tag) = &filter.tag {
        clause(builder);
        builder.push("EXISTS (SELECT 1 FROM json_each(posts.tags) WHERE json_each.value = ");
        builder.push_bind(tag.clone());
        builder.push(")");
    }
}

async fn replace_authors(conn: &mut SqliteConnection, post_id: i64, author_ids: &[i64]) -> Result<()> {
    sqlx::query("DELETE FROM post_authors WHERE post_id = ?")
        .bind(post_id)
        .execute(&mut *conn)
        .await
        .context("Failed to clear post authors")?;

    for (position, author_id) in author_ids.iter().enumerate() {
        sqlx::query("INSERT INTO post_authors (post_id, author_id, position) VALUES (?, ?, ?)")
            .bind(post_id)
            .bind(*author_id)
            .bind(position as i64)
            .execute(&mut *conn)
            .await
            .context("Failed to attach post author")?;
    }
    Ok(())
}

fn row_to_post(row: &sqlx::sqlite::SqliteRow) -> Result<Post> {
    let status_str: String = row.get("status");
    let tags_json: String = row.get("tags");
    let tags: Vec<String> = serde_json::from_str(&tags_json)
        .with_context(|| format!("Invalid tags in database: {}", tags_json))?;

    Ok(Post {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        excerpt: row.get("excerpt"),
        content: row.get("content"),
        content_html: row.get("content_html"),
        cover_image: row.get("cover_image"),
        status: PostStatus::from_str(&status_str).unwrap_or_default(),
        tags,
        authors: Vec::new(),
        published_at: row.get("published_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
