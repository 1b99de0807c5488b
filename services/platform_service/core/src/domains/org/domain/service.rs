use async_trait::async_trait;
use shared_auth::OrgRole;
use shared_error::ApiError;
use uuid::Uuid;

use super::model::{Invite, MemberRecord, Membership, Org, OrgWithRole};
use crate::domains::org::dto::org_dto::{CreateInviteReq, CreateOrgReq, UpdateOrgReq};

/// Org lifecycle and membership management
#[async_trait]
pub trait OrgService: Send + Sync {
    /// Create an org with the caller as owner
    async fn create_org(&self, owner_id: Uuid, req: CreateOrgReq) -> Result<Org, ApiError>;

    async fn list_orgs_for_user(&self, user_id: Uuid) -> Result<Vec<OrgWithRole>, ApiError>;

    async fn get_org(&self, org_id: Uuid) -> Result<Org, ApiError>;

    async fn update_org(&self, org_id: Uuid, req: UpdateOrgReq) -> Result<Org, ApiError>;

    async fn delete_org(&self, org_id: Uuid) -> Result<(), ApiError>;

    async fn list_members(&self, org_id: Uuid) -> Result<Vec<MemberRecord>, ApiError>;

    /// Change a member's role; demoting the last owner is a conflict
    async fn update_member_role(
        &self,
        org_id: Uuid,
        target_user_id: Uuid,
        role: OrgRole,
    ) -> Result<Membership, ApiError>;

    /// Remove a member; removing the last owner is a conflict
    async fn remove_member(&self, org_id: Uuid, target_user_id: Uuid) -> Result<(), ApiError>;
}

/// Invitation flow
#[async_trait]
pub trait InviteService: Send + Sync {
    /// Create an invite and return it with the raw token (emailed once,
    /// never stored)
    async fn create_invite(
        &self,
        org_id: Uuid,
        invited_by: Uuid,
        req: CreateInviteReq,
    ) -> Result<(Invite, String), ApiError>;

    async fn list_invites(&self, org_id: Uuid) -> Result<Vec<Invite>, ApiError>;

    async fn revoke_invite(&self, org_id: Uuid, invite_id: Uuid) -> Result<(), ApiError>;

    /// Accept by raw token for the calling principal
    async fn accept_invite(
        &self,
        raw_token: &str,
        user_id: Uuid,
        user_email: &str,
    ) -> Result<Membership, ApiError>;
}
