use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of a member inside an organization
///
/// Authority is compared through the power table, never through
/// inheritance: an actor passes a check iff `power(actor) >= power(required)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrgRole {
    Viewer,
    Developer,
    Admin,
    Owner,
}

impl OrgRole {
    /// Numeric power level used for authority comparison
    pub fn power(&self) -> u8 {
        match self {
            OrgRole::Viewer => 1,
            OrgRole::Developer => 2,
            OrgRole::Admin => 3,
            OrgRole::Owner => 4,
        }
    }

    /// True iff this role has at least the authority of `required`
    pub fn has_permission(&self, required: OrgRole) -> bool {
        self.power() >= required.power()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrgRole::Viewer => "viewer",
            OrgRole::Developer => "developer",
            OrgRole::Admin => "admin",
            OrgRole::Owner => "owner",
        }
    }
}

impl fmt::Display for OrgRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrgRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "viewer" => Ok(OrgRole::Viewer),
            "developer" => Ok(OrgRole::Developer),
            "admin" => Ok(OrgRole::Admin),
            "owner" => Ok(OrgRole::Owner),
            other => Err(format!("unknown org role: {}", other)),
        }
    }
}

/// System-level roles attached to a principal (not org-scoped)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemRole {
    User,
    SuperAdmin,
}

impl SystemRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SystemRole::User => "user",
            SystemRole::SuperAdmin => "super_admin",
        }
    }
}

/// Marker trait binding a required org role to an extractor type
pub trait OrgRoleMarker {
    fn required() -> OrgRole;
}

#[derive(Debug)]
pub struct ViewerRole;
impl OrgRoleMarker for ViewerRole {
    fn required() -> OrgRole {
        OrgRole::Viewer
    }
}

#[derive(Debug)]
pub struct DeveloperRole;
impl OrgRoleMarker for DeveloperRole {
    fn required() -> OrgRole {
        OrgRole::Developer
    }
}

#[derive(Debug)]
pub struct AdminRole;
impl OrgRoleMarker for AdminRole {
    fn required() -> OrgRole {
        OrgRole::Admin
    }
}

#[derive(Debug)]
pub struct OwnerRole;
impl OrgRoleMarker for OwnerRole {
    fn required() -> OrgRole {
        OrgRole::Owner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_ordering() {
        assert!(OrgRole::Owner.power() > OrgRole::Admin.power());
        assert!(OrgRole::Admin.power() > OrgRole::Developer.power());
        assert!(OrgRole::Developer.power() > OrgRole::Viewer.power());
    }

    #[test]
    fn test_has_permission_is_at_least() {
        assert!(OrgRole::Owner.has_permission(OrgRole::Viewer));
        assert!(OrgRole::Admin.has_permission(OrgRole::Admin));
        assert!(!OrgRole::Viewer.has_permission(OrgRole::Developer));
        assert!(!OrgRole::Admin.has_permission(OrgRole::Owner));
    }

    #[test]
    fn test_round_trip_strings() {
        for role in [
            OrgRole::Viewer,
            OrgRole::Developer,
            OrgRole::Admin,
            OrgRole::Owner,
        ] {
            assert_eq!(role.as_str().parse::<OrgRole>().unwrap(), role);
        }
        assert!("superuser".parse::<OrgRole>().is_err());
    }
}
