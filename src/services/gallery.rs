//! Round-table gallery service
//!
//! Photos are attached to events. The public gallery shows photos of
//! published events only, newest event first.

use crate::db::repositories::{EventRepository, GalleryRepository};
use crate::models::{
    CreateGalleryItemInput, EventGalleryItem, GalleryEntry, UpdateGalleryItemInput,
};
use crate::services::{merge_text, optional_text, required_text, ServiceError, ServiceResult};
use chrono::Utc;
use std::sync::Arc;

pub struct GalleryService {
    gallery_repo: Arc<dyn GalleryRepository>,
    event_repo: Arc<dyn EventRepository>,
}

impl GalleryService {
    pub fn new(gallery_repo: Arc<dyn GalleryRepository>, event_repo: Arc<dyn EventRepository>) -> Self {
        Self {
            gallery_repo,
            event_repo,
        }
    }

    pub async fn list_public(&self) -> ServiceResult<Vec<GalleryEntry>> {
        Ok(self.gallery_repo.list_published().await?)
    }

    pub async fn list_all(&self) -> ServiceResult<Vec<GalleryEntry>> {
        Ok(self.gallery_repo.list_all().await?)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<GalleryEntry> {
        self.gallery_repo
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("Gallery item"))
    }

    pub async fn create(&self, input: CreateGalleryItemInput) -> ServiceResult<EventGalleryItem> {
        let image_url = required_text(&input.image_url, "Image URL")?;
        self.check_event(input.event_id).await?;

        let item = EventGalleryItem {
            id: 0,
            event_id: input.event_id,
            image_url,
            caption: optional_text(input.caption),
            sort_order: input.sort_order.unwrap_or(0),
            created_at: Utc::now(),
        };
        let created = self.gallery_repo.create(&item).await?;
        tracing::info!("Added gallery item {} to event {}", created.id, created.event_id);
        Ok(created)
    }

    pub async fn update(
        &self,
        id: i64,
        input: UpdateGalleryItemInput,
    ) -> ServiceResult<EventGalleryItem> {
        let mut item = self.get(id).await?.item;

        if let Some(event_id) = input.event_id {
            self.check_event(event_id).await?;
            item.event_id = event_id;
        }
        if let Some(image_url) = input.image_url {
            item.image_url = required_text(&image_url, "Image URL")?;
        }
        item.caption = merge_text(item.caption, input.caption);
        if let Some(sort_order) = input.sort_order {
            item.sort_order = sort_order;
        }

        Ok(self.gallery_repo.update(&item).await?)
    }

    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        self.get(id).await?;
        self.gallery_repo.delete(id).await?;
        Ok(())
    }

    async fn check_event(&self, event_id: i64) -> ServiceResult<()> {
        if self.event_repo.get_by_id(event_id).await?.is_none() {
            return Err(ServiceError::Validation(format!(
                "Event {} does not exist",
                event_id
            )));
        }
        Ok(())
    }
}
