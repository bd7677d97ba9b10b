//! Event service
//!
//! Events with their agenda sessions. Public listings only ever include
//! published events; the `upcoming` filter is evaluated against the
//! current time.

use crate::db::repositories::{
    EventRepository, EventSessionRepository, GalleryRepository, OrganizationUnitRepository,
};
use crate::models::{
    CreateEventInput, CreateEventSessionInput, Event, EventDetail, EventFilter, EventSession,
    EventStatus, UpdateEventInput, UpdateEventSessionInput,
};
use crate::services::slug::{generate_slug, resolve_slug};
use crate::services::{merge_text, optional_text, required_text, ServiceError, ServiceResult};
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub struct EventService {
    event_repo: Arc<dyn EventRepository>,
    session_repo: Arc<dyn EventSessionRepository>,
    gallery_repo: Arc<dyn GalleryRepository>,
    unit_repo: Arc<dyn OrganizationUnitRepository>,
}

impl EventService {
    pub fn new(
        event_repo: Arc<dyn EventRepository>,
        session_repo: Arc<dyn EventSessionRepository>,
        gallery_repo: Arc<dyn GalleryRepository>,
        unit_repo: Arc<dyn OrganizationUnitRepository>,
    ) -> Self {
        Self {
            event_repo,
            session_repo,
            gallery_repo,
            unit_repo,
        }
    }

    /// Events matching `filter`, ordered by start time
    pub async fn list(&self, filter: &EventFilter) -> ServiceResult<Vec<Event>> {
        self.list_at(filter, Utc::now()).await
    }

    /// Published events only
    pub async fn list_public(&self, filter: &EventFilter) -> ServiceResult<Vec<Event>> {
        let filter = EventFilter {
            status: Some(EventStatus::Published),
            ..filter.clone()
        };
        self.list(&filter).await
    }

    async fn list_at(&self, filter: &EventFilter, now: DateTime<Utc>) -> ServiceResult<Vec<Event>> {
        let events = self.event_repo.list(filter).await?;
        Ok(match filter.upcoming {
            Some(upcoming) => events
                .into_iter()
                .filter(|event| event.is_upcoming_at(now) == upcoming)
                .collect(),
            None => events,
        })
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Event> {
        self.event_repo
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("Event"))
    }

    /// Event with its unit, agenda and photos
    pub async fn get_detail(&self, id: i64) -> ServiceResult<EventDetail> {
        let event = self.get(id).await?;
        self.detail(event).await
    }

    /// Public event page by slug. Drafts are hidden.
    pub async fn get_published_detail(&self, slug: &str) -> ServiceResult<EventDetail> {
        let event = self
            .event_repo
            .get_by_slug(slug)
            .await?
            .filter(Event::is_published)
            .ok_or(ServiceError::NotFound("Event"))?;
        self.detail(event).await
    }

    pub async fn create(&self, input: CreateEventInput) -> ServiceResult<Event> {
        let title = required_text(&input.title, "Title")?;
        validate_window(input.start_at, input.end_at)?;
        self.check_unit(input.organization_unit_id).await?;
        let slug = self.slug_for(input.slug.as_deref(), &title).await?;

        let mut event = Event::new(title, slug, input.start_at);
        event.description = optional_text(input.description);
        event.location = optional_text(input.location);
        event.cover_image = optional_text(input.cover_image);
        event.end_at = input.end_at;
        event.status = input.status.unwrap_or_default();
        event.is_featured = input.is_featured.unwrap_or(false);
        event.organization_unit_id = input.organization_unit_id;

        let created = self.event_repo.create(&event).await?;
        tracing::info!("Created event {} ({})", created.id, created.slug);
        Ok(created)
    }

    pub async fn update(&self, id: i64, input: UpdateEventInput) -> ServiceResult<Event> {
        let mut event = self.get(id).await?;

        if let Some(title) = input.title {
            event.title = required_text(&title, "Title")?;
        }
        if let Some(slug) = input.slug.filter(|s| !s.trim().is_empty()) {
            if generate_slug(&slug) != event.slug {
                event.slug = self.slug_for(Some(&slug), &event.title).await?;
            }
        }
        event.description = merge_text(event.description, input.description);
        event.location = merge_text(event.location, input.location);
        event.cover_image = merge_text(event.cover_image, input.cover_image);
        if let Some(start_at) = input.start_at {
            event.start_at = start_at;
        }
        if input.end_at.is_some() {
            event.end_at = input.end_at;
        }
        validate_window(event.start_at, event.end_at)?;
        if let Some(status) = input.status {
            event.status = status;
        }
        if let Some(featured) = input.is_featured {
            event.is_featured = featured;
        }
        if input.organization_unit_id.is_some() {
            self.check_unit(input.organization_unit_id).await?;
            event.organization_unit_id = input.organization_unit_id;
        }

        Ok(self.event_repo.update(&event).await?)
    }

    /// Delete an event with its sessions and photos
    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        self.get(id).await?;
        self.event_repo.delete(id).await?;
        tracing::info!("Deleted event {}", id);
        Ok(())
    }

    pub async fn count(&self) -> ServiceResult<i64> {
        Ok(self.event_repo.count().await?)
    }

    pub async fn list_sessions(&self, event_id: i64) -> ServiceResult<Vec<EventSession>> {
        self.get(event_id).await?;
        Ok(self.session_repo.list_by_event(event_id).await?)
    }

    pub async fn get_session(&self, event_id: i64, session_id: i64) -> ServiceResult<EventSession> {
        self.session_repo
            .get_by_id(session_id)
            .await?
            .filter(|session| session.event_id == event_id)
            .ok_or(ServiceError::NotFound("Event session"))
    }

    pub async fn create_session(
        &self,
        event_id: i64,
        input: CreateEventSessionInput,
    ) -> ServiceResult<EventSession> {
        self.get(event_id).await?;
        let title = required_text(&input.title, "Title")?;
        validate_window(input.start_at, input.end_at)?;

        let session = EventSession {
            id: 0,
            event_id,
            title,
            description: optional_text(input.description),
            start_at: input.start_at,
            end_at: input.end_at,
            location: optional_text(input.location),
            sort_order: input.sort_order.unwrap_or(0),
        };
        Ok(self.session_repo.create(&session).await?)
    }

    pub async fn update_session(
        &self,
        event_id: i64,
        session_id: i64,
        input: UpdateEventSessionInput,
    ) -> ServiceResult<EventSession> {
        let mut session = self.get_session(event_id, session_id).await?;

        if let Some(title) = input.title {
            session.title = required_text(&title, "Title")?;
        }
        session.description = merge_text(session.description, input.description);
        session.location = merge_text(session.location, input.location);
        if let Some(start_at) = input.start_at {
            session.start_at = start_at;
        }
        if input.end_at.is_some() {
            session.end_at = input.end_at;
        }
        validate_window(session.start_at, session.end_at)?;
        if let Some(sort_order) = input.sort_order {
            session.sort_order = sort_order;
        }

        Ok(self.session_repo.update(&session).await?)
    }

    pub async fn delete_session(&self, event_id: i64, session_id: i64) -> ServiceResult<()> {
        self.get_session(event_id, session_id).await?;
        self.session_repo.delete(session_id).await?;
        Ok(())
    }

    async fn detail(&self, event: Event) -> ServiceResult<EventDetail> {
        let organization_unit = match event.organization_unit_id {
            Some(unit_id) => self.unit_repo.get_by_id(unit_id).await?,
            None => None,
        };
        let sessions = self.session_repo.list_by_event(event.id).await?;
        let gallery = self.gallery_repo.list_by_event(event.id).await?;

        Ok(EventDetail {
            event,
            organization_unit,
            sessions,
            gallery,
        })
    }

    async fn check_unit(&self, unit_id: Option<i64>) -> ServiceResult<()> {
        if let Some(unit_id) = unit_id {
            if self.unit_repo.get_by_id(unit_id).await?.is_none() {
                return Err(ServiceError::Validation(format!(
                    "Organization unit {} does not exist",
                    unit_id
                )));
            }
        }
        Ok(())
    }

    async fn slug_for(&self, explicit: Option<&str>, title: &str) -> ServiceResult<String> {
        resolve_slug(explicit, title, "event", |slug| {
            let repo = self.event_repo.clone();
            async move { repo.exists_by_slug(&slug).await }
        })
        .await
    }
}

/// An end time, when present, may not precede the start time
fn validate_window(start_at: DateTime<Utc>, end_at: Option<DateTime<Utc>>) -> ServiceResult<()> {
    match end_at {
        Some(end_at) if end_at < start_at => Err(ServiceError::Validation(
            "End time must not be before start time".to_string(),
        )),
        _ => Ok(()),
    }
}
