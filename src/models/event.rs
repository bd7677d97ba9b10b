//! Event model
//!
//! Events belong optionally to an organization unit and own their agenda
//! sessions and gallery photos. Gallery photos of published events make up
//! the public "round table" gallery.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::OrganizationUnit;

/// Event status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Draft,
    Published,
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventStatus::Draft => write!(f, "draft"),
            EventStatus::Published => write!(f, "published"),
        }
    }
}

impl FromStr for EventStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(EventStatus::Draft),
            "published" => Ok(EventStatus::Published),
            _ => Err(anyhow::anyhow!("Invalid event status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub cover_image: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    pub status: EventStatus,
    /// Shown in the landing-page carousel
    pub is_featured: bool,
    pub organization_unit_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn new(title: String, slug: String, start_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            title,
            slug,
            description: None,
            location: None,
            cover_image: None,
            start_at,
            end_at: None,
            status: EventStatus::Draft,
            is_featured: false,
            organization_unit_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_published(&self) -> bool {
        self.status == EventStatus::Published
    }

    /// An event is upcoming until it has finished. Without an end time it
    /// finishes when it starts.
    pub fn is_upcoming_at(&self, now: DateTime<Utc>) -> bool {
        self.end_at.unwrap_or(self.start_at) >= now
    }
}

/// Agenda item within an event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSession {
    pub id: i64,
    pub event_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub sort_order: i32,
}

/// Photo attached to an event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventGalleryItem {
    pub id: i64,
    pub event_id: i64,
    pub image_url: String,
    pub caption: Option<String>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

/// Gallery photo with the event it was taken at
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryEntry {
    #[serde(flatten)]
    pub item: EventGalleryItem,
    pub event_title: String,
    pub event_slug: String,
}

/// Public event page
#[derive(Debug, Clone, Serialize)]
pub struct EventDetail {
    #[serde(flatten)]
    pub event: Event,
    pub organization_unit: Option<OrganizationUnit>,
    pub sessions: Vec<EventSession>,
    pub gallery: Vec<EventGalleryItem>,
}

/// Filters for event listings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventFilter {
    #[serde(default)]
    pub status: Option<EventStatus>,
    #[serde(default)]
    pub featured: Option<bool>,
    #[serde(default)]
    pub upcoming: Option<bool>,
    #[serde(default)]
    pub organization_unit_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEventInput {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    pub start_at: DateTime<Utc>,
    #[serde(default)]
    pub end_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<EventStatus>,
    #[serde(default)]
    pub is_featured: Option<bool>,
    #[serde(default)]
    pub organization_unit_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEventInput {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub cover_image: Option<String>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub status: Option<EventStatus>,
    pub is_featured: Option<bool>,
    pub organization_unit_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEventSessionInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_at: DateTime<Utc>,
    #[serde(default)]
    pub end_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEventSessionInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateGalleryItemInput {
    pub event_id: i64,
    pub image_url: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateGalleryItemInput {
    pub event_id: Option<i64>,
    pub image_url: Option<String>,
    pub caption: Option<String>,
    pub sort_order: Option<i32>,
}
