//! Post service
//!
//! Blog posts: slug generation, markdown rendering, publish timestamps,
//! tag normalization and byline validation.

use crate::db::repositories::{AuthorRepository, PostRepository};
use crate::models::{
    CreatePostInput, ListParams, PagedResult, Post, PostFilter, PostStatus, UpdatePostInput,
};
use crate::services::slug::{generate_slug, resolve_slug};
use crate::services::{merge_text, optional_text, required_text, MarkdownRenderer};
use crate::services::{ServiceError, ServiceResult};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;

/// Length of excerpts derived from the post body
const EXCERPT_LENGTH: usize = 200;

pub struct PostService {
    post_repo: Arc<dyn PostRepository>,
    author_repo: Arc<dyn AuthorRepository>,
    renderer: MarkdownRenderer,
}

impl PostService {
    pub fn new(post_repo: Arc<dyn PostRepository>, author_repo: Arc<dyn AuthorRepository>) -> Self {
        Self {
            post_repo,
            author_repo,
            renderer: MarkdownRenderer::new(),
        }
    }

    /// Posts in any status, for the dashboard
    pub async fn list(&self, filter: &PostFilter, params: &ListParams) -> ServiceResult<PagedResult<Post>> {
        let (items, total) = self.post_repo.list(filter, params).await?;
        Ok(PagedResult::new(items, total, params))
    }

    /// Published posts only, for the public site
    pub async fn list_published(
        &self,
        author_id: Option<i64>,
        tag: Option<String>,
        params: &ListParams,
    ) -> ServiceResult<PagedResult<Post>> {
        let filter = PostFilter {
            status: Some(PostStatus::Published),
            author_id,
            tag,
        };
        self.list(&filter, params).await
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Post> {
        self.post_repo
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("Post"))
    }

    /// A published post by slug. Drafts and archived posts are hidden.
    pub async fn get_published(&self, slug: &str) -> ServiceResult<Post> {
        self.post_repo
            .get_by_slug(slug)
            .await?
            .filter(Post::is_published)
            .ok_or(ServiceError::NotFound("Post"))
    }

    pub async fn create(&self, input: CreatePostInput) -> ServiceResult<Post> {
        let title = required_text(&input.title, "Title")?;
        let slug = self.slug_for(input.slug.as_deref(), &title).await?;
        let author_ids = self.checked_author_ids(&input.author_ids).await?;

        let content_html = self.renderer.render(&input.content);
        let mut post = Post::new(slug, title, input.content, content_html);
        post.excerpt = optional_text(input.excerpt).or_else(|| self.derive_excerpt(&post.content));
        post.cover_image = optional_text(input.cover_image);
        post.tags = normalize_tags(input.tags);
        post.status = input.status.unwrap_or_default();
        if post.is_published() {
            post.published_at = Some(Utc::now());
        }

        let created = self.post_repo.create(&post, &author_ids).await?;
        tracing::info!("Created post {} ({}) as {}", created.id, created.slug, created.status);
        Ok(created)
    }

    pub async fn update(&self, id: i64, input: UpdatePostInput) -> ServiceResult<Post> {
        let mut post = self.get(id).await?;

        if let Some(title) = input.title {
            post.title = required_text(&title, "Title")?;
        }
        if let Some(slug) = input.slug.filter(|s| !s.trim().is_empty()) {
            if generate_slug(&slug) != post.slug {
                post.slug = self.slug_for(Some(&slug), &post.title).await?;
            }
        }
        if let Some(content) = input.content {
            post.content_html = self.renderer.render(&content);
            post.content = content;
        }
        post.excerpt = merge_text(post.excerpt, input.excerpt);
        if post.excerpt.is_none() {
            post.excerpt = self.derive_excerpt(&post.content);
        }
        post.cover_image = merge_text(post.cover_image, input.cover_image);
        if let Some(tags) = input.tags {
            post.tags = normalize_tags(tags);
        }
        if let Some(status) = input.status {
            post.status = status;
        }
        if post.is_published() && post.published_at.is_none() {
            post.published_at = Some(Utc::now());
        }

        let author_ids = match input.author_ids {
            Some(ids) => Some(self.checked_author_ids(&ids).await?),
            None => None,
        };

        Ok(self.post_repo.update(&post, author_ids.as_deref()).await?)
    }

    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        self.get(id).await?;
        self.post_repo.delete(id).await?;
        tracing::info!("Deleted post {}", id);
        Ok(())
    }

    pub async fn count_by_status(&self, status: PostStatus) -> ServiceResult<i64> {
        Ok(self.post_repo.count_by_status(status).await?)
    }

    fn derive_excerpt(&self, content: &str) -> Option<String> {
        let excerpt = self.renderer.excerpt(content, EXCERPT_LENGTH);
        (!excerpt.is_empty()).then_some(excerpt)
    }

    /// Deduplicate `ids` (keeping order) and make sure every author exists
    async fn checked_author_ids(&self, ids: &[i64]) -> ServiceResult<Vec<i64>> {
        let mut seen = HashSet::new();
        let ids: Vec<i64> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();

        let found: HashSet<i64> = self
            .author_repo
            .get_by_ids(&ids)
            .await?
            .into_iter()
            .map(|author| author.id)
            .collect();
        let missing: Vec<String> = ids
            .iter()
            .filter(|id| !found.contains(id))
            .map(|id| id.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(ServiceError::Validation(format!(
                "Unknown author id(s): {}",
                missing.join(", ")
            )));
        }
        Ok(ids)
    }

    async fn slug_for(&self, explicit: Option<&str>, title: &str) -> ServiceResult<String> {
        resolve_slug(explicit, title, "post", |slug| {
            let repo = self.post_repo.clone();
            async move { repo.exists_by_slug(&slug).await }
        })
        .await
    }
}

/// Trim tags, dropping blanks and repeats
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty() && seen.insert(tag.to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxAuthorRepository, SqlxPostRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::Author;

    async fn setup() -> (PostService, Arc<dyn AuthorRepository>) {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        let authors = SqlxAuthorRepository::boxed(pool.clone());
        let service = PostService::new(SqlxPostRepository::boxed(pool), authors.clone());
        (service, authors)
    }

    fn input(title: &str) -> CreatePostInput {
        CreatePostInput {
            title: title.to_string(),
            slug: None,
            excerpt: None,
            content: "Hello **world**".to_string(),
            cover_image: None,
            status: None,
            tags: Vec::new(),
            author_ids: Vec::new(),
        }
    }

    #[test]
    fn test_normalize_tags() {
        let tags = vec![" news ".into(), "".into(), "News".into(), "events".into()];
        assert_eq!(normalize_tags(tags), vec!["news", "events"]);
    }

    #[tokio::test]
    async fn test_create_defaults_to_draft_with_rendered_html() {
        let (service, _) = setup().await;
        let post = service.create(input("First Post")).await.unwrap();

        assert_eq!(post.slug, "first-post");
        assert_eq!(post.status, PostStatus::Draft);
        assert!(post.published_at.is_none());
        assert!(post.tags.is_empty());
        assert!(post.content_html.contains("<strong>world</strong>"));
        assert_eq!(post.excerpt.as_deref(), Some("Hello world"));
    }

    #[tokio::test]
    async fn test_publishing_sets_published_at_once() {
        let (service, _) = setup().await;
        let post = service.create(input("Draft")).await.unwrap();

        let published = service
            .update(
                post.id,
                UpdatePostInput {
                    status: Some(PostStatus::Published),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let first_published_at = published.published_at.unwrap();

        let archived = service
            .update(
                post.id,
                UpdatePostInput {
                    status: Some(PostStatus::Archived),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let republished = service
            .update(
                archived.id,
                UpdatePostInput {
                    status: Some(PostStatus::Published),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(republished.published_at, Some(first_published_at));
    }

    #[tokio::test]
    async fn test_slug_uniqueness() {
        let (service, _) = setup().await;
        service.create(input("Same Title")).await.unwrap();
        let second = service.create(input("Same Title")).await.unwrap();
        assert_eq!(second.slug, "same-title-2");

        let mut explicit = input("Other");
        explicit.slug = Some("same-title".into());
        let err = service.create(explicit).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_unknown_author_rejected() {
        let (service, authors) = setup().await;
        let author = authors.create(&Author::new("Ana".into(), "ana".into())).await.unwrap();

        let mut with_authors = input("Bylined");
        with_authors.author_ids = vec![author.id, author.id];
        let post = service.create(with_authors).await.unwrap();
        assert_eq!(post.author_ids(), vec![author.id]);

        let mut bad = input("Ghost");
        bad.author_ids = vec![author.id, 999];
        let err = service.create(bad).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(msg) if msg.contains("999")));
    }

    #[tokio::test]
    async fn test_public_views_hide_drafts() {
        let (service, _) = setup().await;
        service.create(input("Hidden")).await.unwrap();
        let mut live = input("Live");
        live.status = Some(PostStatus::Published);
        live.tags = vec!["news".into()];
        service.create(live).await.unwrap();

        let page = service
            .list_published(None, None, &ListParams::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].slug, "live");

        assert!(service.get_published("live").await.is_ok());
        assert!(matches!(
            service.get_published("hidden").await,
            Err(ServiceError::NotFound(_))
        ));

        let tagged = service
            .list_published(None, Some("news".into()), &ListParams::default())
            .await
            .unwrap();
        assert_eq!(tagged.total, 1);
    }

    #[tokio::test]
    async fn test_update_content_rerenders() {
        let (service, _) = setup().await;
        let post = service.create(input("Doc")).await.unwrap();
        let updated = service
            .update(
                post.id,
                UpdatePostInput {
                    content: Some("# New".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.content_html.contains("<h1>New</h1>"));
    }
}
