use async_trait::async_trait;
use shared_auth::OrgRole;
use shared_error::ApiError;
use uuid::Uuid;

use super::model::{Invite, MemberRecord, Membership, Org, OrgWithRole};

/// Org repository
#[async_trait]
pub trait OrgRepository: Send + Sync {
    /// Create the org and its owner membership in one transaction; an org
    /// without an owner must never exist
    async fn create_with_owner(&self, org: &Org, owner_id: Uuid) -> Result<Org, ApiError>;

    async fn find_by_id(&self, org_id: Uuid) -> Result<Option<Org>, ApiError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Org>, ApiError>;

    async fn slug_exists(&self, slug: &str) -> Result<bool, ApiError>;

    async fn update(&self, org: &Org) -> Result<Org, ApiError>;

    async fn soft_delete(&self, org_id: Uuid) -> Result<bool, ApiError>;
}

/// Membership repository
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// The tenancy-resolution lookup: exact `(org_id, user_id)` hit or None
    async fn find(&self, org_id: Uuid, user_id: Uuid) -> Result<Option<Membership>, ApiError>;

    async fn create(&self, membership: &Membership) -> Result<Membership, ApiError>;

    async fn list_for_org(&self, org_id: Uuid) -> Result<Vec<MemberRecord>, ApiError>;

    async fn list_orgs_for_user(&self, user_id: Uuid) -> Result<Vec<OrgWithRole>, ApiError>;

    async fn count_for_org(&self, org_id: Uuid) -> Result<i64, ApiError>;

    async fn count_owners(&self, org_id: Uuid) -> Result<i64, ApiError>;

    async fn update_role(
        &self,
        org_id: Uuid,
        user_id: Uuid,
        role: OrgRole,
    ) -> Result<Option<Membership>, ApiError>;

    async fn remove(&self, org_id: Uuid, user_id: Uuid) -> Result<bool, ApiError>;
}

/// Invite repository
#[async_trait]
pub trait InviteRepository: Send + Sync {
    async fn create(&self, invite: &Invite) -> Result<Invite, ApiError>;

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<Invite>, ApiError>;

    async fn list_for_org(&self, org_id: Uuid) -> Result<Vec<Invite>, ApiError>;

    async fn pending_exists(&self, org_id: Uuid, email: &str) -> Result<bool, ApiError>;

    async fn delete(&self, org_id: Uuid, invite_id: Uuid) -> Result<bool, ApiError>;

    /// One transaction: mark the invite accepted and create the membership
    async fn accept(&self, invite_id: Uuid, user_id: Uuid) -> Result<Membership, ApiError>;
}
