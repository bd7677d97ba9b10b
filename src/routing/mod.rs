//! Role-based route authorization
//!
//! [`RouteMatcher`] compiles path patterns with `:name` parameters and
//! reports which roles may access a concrete path. [`admin_routes`] is the
//! table the admin API is guarded with.

mod matcher;
mod table;

pub use matcher::{RouteDefinition, RouteError, RouteMatch, RouteMatcher};
pub use table::{admin_routes, ADMIN_PREFIX};
