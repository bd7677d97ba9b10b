//! Author service

use crate::db::repositories::AuthorRepository;
use crate::models::{Author, CreateAuthorInput, UpdateAuthorInput};
use crate::services::slug::{generate_slug, resolve_slug};
use crate::services::{merge_text, normalize_email, optional_text, required_text};
use crate::services::{ServiceError, ServiceResult};
use std::sync::Arc;

pub struct AuthorService {
    repo: Arc<dyn AuthorRepository>,
}

impl AuthorService {
    pub fn new(repo: Arc<dyn AuthorRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> ServiceResult<Vec<Author>> {
        Ok(self.repo.list().await?)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Author> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("Author"))
    }

    pub async fn create(&self, input: CreateAuthorInput) -> ServiceResult<Author> {
        let name = required_text(&input.name, "Name")?;
        let slug = self.slug_for(input.slug.as_deref(), &name).await?;

        let mut author = Author::new(name, slug);
        author.bio = optional_text(input.bio);
        author.avatar_url = optional_text(input.avatar_url);
        author.email = optional_text(input.email)
            .map(|email| normalize_email(&email))
            .transpose()?;

        let created = self.repo.create(&author).await?;
        tracing::info!("Created author {} ({})", created.id, created.slug);
        Ok(created)
    }

    pub async fn update(&self, id: i64, input: UpdateAuthorInput) -> ServiceResult<Author> {
        let mut author = self.get(id).await?;

        if let Some(name) = input.name {
            author.name = required_text(&name, "Name")?;
        }
        if let Some(slug) = input.slug.filter(|s| !s.trim().is_empty()) {
            if generate_slug(&slug) != author.slug {
                author.slug = self.slug_for(Some(&slug), &author.name).await?;
            }
        }
        author.bio = merge_text(author.bio, input.bio);
        author.avatar_url = merge_text(author.avatar_url, input.avatar_url);
        author.email = merge_text(author.email, input.email)
            .map(|email| normalize_email(&email))
            .transpose()?;

        Ok(self.repo.update(&author).await?)
    }

    /// Delete an author; their bylines disappear from posts
    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        self.get(id).await?;
        self.repo.delete(id).await?;
        tracing::info!("Deleted author {}", id);
        Ok(())
    }

    async fn slug_for(&self, explicit: Option<&str>, name: &str) -> ServiceResult<String> {
        resolve_slug(explicit, name, "author", |slug| {
            let repo = self.repo.clone();
            async move { repo.exists_by_slug(&slug).await }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxAuthorRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> AuthorService {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        AuthorService::new(SqlxAuthorRepository::boxed(pool))
    }

    fn input(name: &str, slug: Option<&str>) -> CreateAuthorInput {
        CreateAuthorInput {
            name: name.to_string(),
            slug: slug.map(String::from),
            bio: None,
            avatar_url: None,
            email: None,
        }
    }

    #[tokio::test]
    async fn test_generated_slugs_are_unique() {
        let service = setup().await;
        let first = service.create(input("Dana Putri", None)).await.unwrap();
        let second = service.create(input("Dana Putri", None)).await.unwrap();
        assert_eq!(first.slug, "dana-putri");
        assert_eq!(second.slug, "dana-putri-2");
    }

    #[tokio::test]
    async fn test_explicit_duplicate_slug_conflicts() {
        let service = setup().await;
        service.create(input("A", Some("writer"))).await.unwrap();
        let err = service.create(input("B", Some("writer"))).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_and_clear_fields() {
        let service = setup().await;
        let mut create = input("Eko", None);
        create.bio = Some("Photographer".into());
        create.email = Some("Eko@Example.com".into());
        let author = service.create(create).await.unwrap();
        assert_eq!(author.email.as_deref(), Some("eko@example.com"));

        let updated = service
            .update(
                author.id,
                UpdateAuthorInput {
                    bio: Some(String::new()),
                    slug: Some("eko-s".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.bio.is_none());
        assert_eq!(updated.slug, "eko-s");
        assert_eq!(updated.name, "Eko");
    }

    #[tokio::test]
    async fn test_missing_author_not_found() {
        let service = setup().await;
        assert!(matches!(service.get(42).await, Err(ServiceError::NotFound("Author"))));
        assert!(matches!(service.delete(42).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let service = setup().await;
        let err = service.create(input("  ", None)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }
}
