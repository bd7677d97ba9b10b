//! Common API utilities and shared types

use serde::Deserialize;

use crate::models::{ListParams, PostStatus};

/// Default page number (1-indexed)
pub fn default_page() -> u32 {
    1
}

/// Default page size for public listings
pub fn default_page_size() -> u32 {
    10
}

/// Default page size for admin listings
pub fn default_per_page() -> u32 {
    20
}

/// Query parameters for public post listings
#[derive(Debug, Deserialize)]
pub struct PublicPostQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub per_page: u32,
    pub author: Option<i64>,
    pub tag: Option<String>,
}

impl PublicPostQuery {
    pub fn params(&self) -> ListParams {
        ListParams::new(self.page, self.per_page)
    }
}

/// Query parameters for admin post listings
#[derive(Debug, Deserialize)]
pub struct AdminPostQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    pub status: Option<PostStatus>,
    pub author: Option<i64>,
    pub tag: Option<String>,
}

impl AdminPostQuery {
    pub fn params(&self) -> ListParams {
        ListParams::new(self.page, self.per_page)
    }
}
