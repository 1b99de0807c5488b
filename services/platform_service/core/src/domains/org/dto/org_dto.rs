use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_auth::OrgRole;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::super::domain::model::{Invite, MemberRecord, Org, OrgWithRole};

/// Create an org
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateOrgReq {
    #[validate(length(min = 1, max = 120, message = "name is required"))]
    pub name: String,

    /// Optional explicit slug; derived from the name when absent
    #[validate(length(min = 1, max = 63, message = "slug must not be empty"))]
    pub slug: Option<String>,
}

/// Update an org
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateOrgReq {
    #[validate(length(min = 1, max = 120, message = "name must not be empty"))]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrgResp {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Org> for OrgResp {
    fn from(org: &Org) -> Self {
        Self {
            id: org.org_id,
            name: org.name.clone(),
            slug: org.slug.clone(),
            created_at: org.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrgWithRoleResp {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    #[schema(value_type = String)]
    pub role: OrgRole,
    pub created_at: DateTime<Utc>,
}

impl From<&OrgWithRole> for OrgWithRoleResp {
    fn from(org: &OrgWithRole) -> Self {
        Self {
            id: org.org_id,
            name: org.name.clone(),
            slug: org.slug.clone(),
            role: org.role,
            created_at: org.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MemberResp {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    #[schema(value_type = String)]
    pub role: OrgRole,
    pub joined_at: DateTime<Utc>,
}

impl From<&MemberRecord> for MemberResp {
    fn from(member: &MemberRecord) -> Self {
        Self {
            user_id: member.user_id,
            email: member.email.clone(),
            name: member.name.clone(),
            role: member.role,
            joined_at: member.created_at,
        }
    }
}

/// Change a member's role
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateMemberReq {
    #[schema(value_type = String)]
    pub role: OrgRole,
}

/// Invite a member by email
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateInviteReq {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,

    #[schema(value_type = String)]
    pub role: OrgRole,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InviteResp {
    pub id: Uuid,
    pub email: String,
    #[schema(value_type = String)]
    pub role: OrgRole,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<&Invite> for InviteResp {
    fn from(invite: &Invite) -> Self {
        Self {
            id: invite.invite_id,
            email: invite.email.clone(),
            role: invite.role,
            expires_at: invite.expires_at,
            created_at: invite.created_at,
        }
    }
}

/// Result of accepting an invite
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AcceptInviteResp {
    pub org_id: Uuid,
    #[schema(value_type = String)]
    pub role: OrgRole,
}
