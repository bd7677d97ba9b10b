//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod author;
pub mod event;
pub mod event_session;
pub mod gallery;
pub mod hero;
pub mod invitation;
pub mod organization_unit;
pub mod post;
pub mod session;
pub mod user;

pub use author::{AuthorRepository, SqlxAuthorRepository};
pub use event::{EventRepository, SqlxEventRepository};
pub use event_session::{EventSessionRepository, SqlxEventSessionRepository};
pub use gallery::{GalleryRepository, SqlxGalleryRepository};
pub use hero::{HeroRepository, SqlxHeroRepository};
pub use invitation::{InvitationRepository, SqlxInvitationRepository};
pub use organization_unit::{OrganizationUnitRepository, SqlxOrganizationUnitRepository};
pub use post::{PostRepository, SqlxPostRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use user::{SqlxUserRepository, UserRepository};
