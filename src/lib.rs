//! orgsite - content management and landing-page backend for a student organization
//!
//! This library provides the core functionality behind the public landing page
//! and the admin dashboard API.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod routing;
pub mod services;
