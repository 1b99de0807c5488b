mod repository;
mod service;

pub use repository::{PgInviteRepository, PgMembershipRepository, PgOrgRepository};
pub use service::{InviteServiceImpl, OrgServiceImpl};
