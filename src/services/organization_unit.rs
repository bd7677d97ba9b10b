//! Organization unit service

use crate::db::repositories::OrganizationUnitRepository;
use crate::models::{CreateOrganizationUnitInput, OrganizationUnit, UpdateOrganizationUnitInput};
use crate::services::slug::{generate_slug, resolve_slug};
use crate::services::{merge_text, optional_text, required_text, ServiceError, ServiceResult};
use std::sync::Arc;

pub struct OrganizationUnitService {
    repo: Arc<dyn OrganizationUnitRepository>,
}

impl OrganizationUnitService {
    pub fn new(repo: Arc<dyn OrganizationUnitRepository>) -> Self {
        Self { repo }
    }

    /// All units ordered by `sort_order`, then name
    pub async fn list(&self) -> ServiceResult<Vec<OrganizationUnit>> {
        Ok(self.repo.list().await?)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<OrganizationUnit> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("Organization unit"))
    }

    pub async fn get_by_slug(&self, slug: &str) -> ServiceResult<OrganizationUnit> {
        self.repo
            .get_by_slug(slug)
            .await?
            .ok_or(ServiceError::NotFound("Organization unit"))
    }

    pub async fn create(&self, input: CreateOrganizationUnitInput) -> ServiceResult<OrganizationUnit> {
        let name = required_text(&input.name, "Name")?;
        let slug = self.slug_for(input.slug.as_deref(), &name).await?;

        let mut unit = OrganizationUnit::new(name, slug);
        unit.description = optional_text(input.description);
        unit.logo_url = optional_text(input.logo_url);
        unit.sort_order = input.sort_order.unwrap_or(0);

        let created = self.repo.create(&unit).await?;
        tracing::info!("Created organization unit {} ({})", created.id, created.slug);
        Ok(created)
    }

    pub async fn update(
        &self,
        id: i64,
        input: UpdateOrganizationUnitInput,
    ) -> ServiceResult<OrganizationUnit> {
        let mut unit = self.get(id).await?;

        if let Some(name) = input.name {
            unit.name = required_text(&name, "Name")?;
        }
        if let Some(slug) = input.slug.filter(|s| !s.trim().is_empty()) {
            if generate_slug(&slug) != unit.slug {
                unit.slug = self.slug_for(Some(&slug), &unit.name).await?;
            }
        }
        unit.description = merge_text(unit.description, input.description);
        unit.logo_url = merge_text(unit.logo_url, input.logo_url);
        if let Some(sort_order) = input.sort_order {
            unit.sort_order = sort_order;
        }

        Ok(self.repo.update(&unit).await?)
    }

    /// Delete a unit. Its events stay, without a unit.
    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        self.get(id).await?;
        self.repo.delete(id).await?;
        tracing::info!("Deleted organization unit {}", id);
        Ok(())
    }

    async fn slug_for(&self, explicit: Option<&str>, name: &str) -> ServiceResult<String> {
        resolve_slug(explicit, name, "unit", |slug| {
            let repo = self.repo.clone();
            async move { repo.exists_by_slug(&slug).await }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxOrganizationUnitRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> OrganizationUnitService {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        OrganizationUnitService::new(SqlxOrganizationUnitRepository::boxed(pool))
    }

    fn input(name: &str, sort_order: Option<i32>) -> CreateOrganizationUnitInput {
        CreateOrganizationUnitInput {
            name: name.to_string(),
            slug: None,
            description: None,
            logo_url: None,
            sort_order,
        }
    }

    #[tokio::test]
    async fn test_create_defaults_and_ordering() {
        let service = setup().await;
        let research = service.create(input("Research & Development", None)).await.unwrap();
        assert_eq!(research.slug, "research-development");
        assert_eq!(research.sort_order, 0);

        service.create(input("Media", Some(-1))).await.unwrap();
        let names: Vec<_> = service.list().await.unwrap().into_iter().map(|u| u.name).collect();
        assert_eq!(names, vec!["Media", "Research & Development"]);
    }

    #[tokio::test]
    async fn test_update_slug_conflict() {
        let service = setup().await;
        service.create(input("Media", None)).await.unwrap();
        let other = service.create(input("Outreach", None)).await.unwrap();

        let err = service
            .update(
                other.id,
                UpdateOrganizationUnitInput {
                    slug: Some("media".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let same = service
            .update(
                other.id,
                UpdateOrganizationUnitInput {
                    slug: Some("outreach".into()),
                    sort_order: Some(5),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(same.sort_order, 5);
        assert_eq!(service.get_by_slug("outreach").await.unwrap().id, other.id);
    }
}
