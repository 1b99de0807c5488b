pub mod extractors;
pub mod roles;

pub use extractors::{AuthUser, OrgContext, RequireOrgRole, RequireSuperAdmin};
pub use roles::{
    AdminRole, DeveloperRole, OrgRole, OrgRoleMarker, OwnerRole, SystemRole, ViewerRole,
};
