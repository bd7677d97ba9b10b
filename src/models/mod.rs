//! Data models
//!
//! Database entities, their status and role enums, and the create/update
//! inputs accepted by the admin API.

mod author;
mod event;
mod hero;
mod invitation;
mod organization_unit;
mod post;
mod session;
mod user;

pub use author::{Author, AuthorRef, CreateAuthorInput, UpdateAuthorInput};
pub use event::{
    CreateEventInput, CreateEventSessionInput, CreateGalleryItemInput, Event, EventDetail,
    EventFilter, EventGalleryItem, EventSession, EventStatus, GalleryEntry, UpdateEventInput,
    UpdateEventSessionInput, UpdateGalleryItemInput,
};
pub use hero::{CreateHeroInput, HeroAnnouncement, UpdateHeroInput};
pub use invitation::{
    AcceptInvitationInput, CreateInvitationInput, InvitationStatus, InvitationView,
    UserInvitation,
};
pub use organization_unit::{
    CreateOrganizationUnitInput, OrganizationUnit, UpdateOrganizationUnitInput,
};
pub use post::{
    CreatePostInput, ListParams, PagedResult, Post, PostFilter, PostStatus, UpdatePostInput,
};
pub use session::Session;
pub use user::{UpdateUserInput, User, UserRole, UserStatus};
