//! Hero announcement service

use crate::db::repositories::HeroRepository;
use crate::models::{CreateHeroInput, HeroAnnouncement, UpdateHeroInput};
use crate::services::{merge_text, optional_text, required_text, ServiceError, ServiceResult};
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub struct HeroService {
    repo: Arc<dyn HeroRepository>,
}

impl HeroService {
    pub fn new(repo: Arc<dyn HeroRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> ServiceResult<Vec<HeroAnnouncement>> {
        Ok(self.repo.list().await?)
    }

    /// Banners for the landing page right now
    pub async fn list_visible(&self) -> ServiceResult<Vec<HeroAnnouncement>> {
        let now = Utc::now();
        Ok(self
            .repo
            .list_active()
            .await?
            .into_iter()
            .filter(|hero| hero.is_visible_at(now))
            .collect())
    }

    pub async fn get(&self, id: i64) -> ServiceResult<HeroAnnouncement> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("Hero announcement"))
    }

    pub async fn create(&self, input: CreateHeroInput) -> ServiceResult<HeroAnnouncement> {
        let title = required_text(&input.title, "Title")?;
        validate_window(input.starts_at, input.ends_at)?;

        let mut hero = HeroAnnouncement::new(title);
        hero.subtitle = optional_text(input.subtitle);
        hero.image_url = optional_text(input.image_url);
        hero.link_url = optional_text(input.link_url);
        hero.link_label = optional_text(input.link_label);
        hero.is_active = input.is_active.unwrap_or(true);
        hero.sort_order = input.sort_order.unwrap_or(0);
        hero.starts_at = input.starts_at;
        hero.ends_at = input.ends_at;

        Ok(self.repo.create(&hero).await?)
    }

    pub async fn update(&self, id: i64, input: UpdateHeroInput) -> ServiceResult<HeroAnnouncement> {
        let mut hero = self.get(id).await?;

        if let Some(title) = input.title {
            hero.title = required_text(&title, "Title")?;
        }
        hero.subtitle = merge_text(hero.subtitle, input.subtitle);
        hero.image_url = merge_text(hero.image_url, input.image_url);
        hero.link_url = merge_text(hero.link_url, input.link_url);
        hero.link_label = merge_text(hero.link_label, input.link_label);
        if let Some(active) = input.is_active {
            hero.is_active = active;
        }
        if let Some(sort_order) = input.sort_order {
            hero.sort_order = sort_order;
        }
        if input.starts_at.is_some() {
            hero.starts_at = input.starts_at;
        }
        if input.ends_at.is_some() {
            hero.ends_at = input.ends_at;
        }
        validate_window(hero.starts_at, hero.ends_at)?;

        Ok(self.repo.update(&hero).await?)
    }

    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        self.get(id).await?;
        self.repo.delete(id).await?;
        Ok(())
    }
}

fn validate_window(
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
) -> ServiceResult<()> {
    match (starts_at, ends_at) {
        (Some(start), Some(end)) if end < start => Err(ServiceError::Validation(
            "End time must not be before start time".to_string(),
        )),
        _ => Ok(()),
    }
}
