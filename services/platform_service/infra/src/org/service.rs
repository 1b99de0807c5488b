use async_trait::async_trait;
use chrono::{Duration, Utc};
use platform_service_core::domains::auth::domain::repository::UserRepository;
use platform_service_core::domains::auth::utils::token_utils::{
    generate_credential_token, sha256_hex,
};
use platform_service_core::domains::org::{
    domain::{
        model::{Invite, MemberRecord, Membership, Org, OrgWithRole},
        repository::{InviteRepository, MembershipRepository, OrgRepository},
        service::{InviteService, OrgService},
    },
    dto::org_dto::{CreateInviteReq, CreateOrgReq, UpdateOrgReq},
    utils::generate_slug,
};
use shared_auth::OrgRole;
use shared_error::ApiError;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{EmailMessage, EmailSender};

const INVITE_TTL_HOURS: i64 = 7 * 24;

/// Org lifecycle implementation
pub struct OrgServiceImpl<OR, MR>
where
    OR: OrgRepository,
    MR: MembershipRepository,
{
    org_repo: OR,
    membership_repo: MR,
}

impl<OR, MR> OrgServiceImpl<OR, MR>
where
    OR: OrgRepository,
    MR: MembershipRepository,
{
    pub fn new(org_repo: OR, membership_repo: MR) -> Self {
        Self {
            org_repo,
            membership_repo,
        }
    }
}

#[async_trait]
impl<OR, MR> OrgService for OrgServiceImpl<OR, MR>
where
    OR: OrgRepository + Send + Sync,
    MR: MembershipRepository + Send + Sync,
{
    async fn create_org(&self, owner_id: Uuid, req: CreateOrgReq) -> Result<Org, ApiError> {
        let slug = match req.slug {
            Some(slug) => generate_slug(&slug).ok_or_else(|| {
                ApiError::validation(
                    "Invalid slug",
                    serde_json::json!({"slug": "must contain alphanumeric characters"}),
                )
            })?,
            None => generate_slug(&req.name).ok_or_else(|| {
                ApiError::validation(
                    "Invalid name",
                    serde_json::json!({"name": "must contain alphanumeric characters"}),
                )
            })?,
        };

        if self.org_repo.slug_exists(&slug).await? {
            return Err(ApiError::conflict("an organization with this slug exists"));
        }

        let now = Utc::now();
        let org = Org {
            org_id: Uuid::now_v7(),
            name: req.name,
            slug,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        // Org + owner membership commit together
        let created = self.org_repo.create_with_owner(&org, owner_id).await?;
        tracing::info!(org_id = %created.org_id, owner_id = %owner_id, "org created");
        Ok(created)
    }

    async fn list_orgs_for_user(&self, user_id: Uuid) -> Result<Vec<OrgWithRole>, ApiError> {
        self.membership_repo.list_orgs_for_user(user_id).await
    }

    async fn get_org(&self, org_id: Uuid) -> Result<Org, ApiError> {
        self.org_repo
            .find_by_id(org_id)
            .await?
            .ok_or_else(|| ApiError::not_found("organization not found"))
    }

    async fn update_org(&self, org_id: Uuid, req: UpdateOrgReq) -> Result<Org, ApiError> {
        let mut org = self.get_org(org_id).await?;
        if let Some(name) = req.name {
            org.name = name;
        }
        self.org_repo.update(&org).await
    }

    async fn delete_org(&self, org_id: Uuid) -> Result<(), ApiError> {
        let removed = self.org_repo.soft_delete(org_id).await?;
        if !removed {
            return Err(ApiError::not_found("organization not found"));
        }
        Ok(())
    }

    async fn list_members(&self, org_id: Uuid) -> Result<Vec<MemberRecord>, ApiError> {
        self.membership_repo.list_for_org(org_id).await
    }

    async fn update_member_role(
        &self,
        org_id: Uuid,
        target_user_id: Uuid,
        role: OrgRole,
    ) -> Result<Membership, ApiError> {
        let current = self
            .membership_repo
            .find(org_id, target_user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("membership not found"))?;

        // An org must always keep at least one owner
        if current.role == OrgRole::Owner
            && role != OrgRole::Owner
            && self.membership_repo.count_owners(org_id).await? <= 1
        {
            return Err(ApiError::conflict("cannot demote the last owner"));
        }

        self.membership_repo
            .update_role(org_id, target_user_id, role)
            .await?
            .ok_or_else(|| ApiError::not_found("membership not found"))
    }

    async fn remove_member(&self, org_id: Uuid, target_user_id: Uuid) -> Result<(), ApiError> {
        let current = self
            .membership_repo
            .find(org_id, target_user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("membership not found"))?;

        if current.role == OrgRole::Owner
            && self.membership_repo.count_owners(org_id).await? <= 1
        {
            return Err(ApiError::conflict("cannot remove the last owner"));
        }

        self.membership_repo.remove(org_id, target_user_id).await?;
        Ok(())
    }
}

/// Invitation flow implementation
pub struct InviteServiceImpl<IR, MR, UR>
where
    IR: InviteRepository,
    MR: MembershipRepository,
    UR: UserRepository,
{
    invite_repo: IR,
    membership_repo: MR,
    user_repo: UR,
    sender: Arc<dyn EmailSender>,
    frontend_url: String,
}

impl<IR, MR, UR> InviteServiceImpl<IR, MR, UR>
where
    IR: InviteRepository,
    MR: MembershipRepository,
    UR: UserRepository,
{
    pub fn new(
        invite_repo: IR,
        membership_repo: MR,
        user_repo: UR,
        sender: Arc<dyn EmailSender>,
        frontend_url: String,
    ) -> Self {
        Self {
            invite_repo,
            membership_repo,
            user_repo,
            sender,
            frontend_url,
        }
    }
}

#[async_trait]
impl<IR, MR, UR> InviteService for InviteServiceImpl<IR, MR, UR>
where
    IR: InviteRepository + Send + Sync,
    MR: MembershipRepository + Send + Sync,
    UR: UserRepository + Send + Sync,
{
    async fn create_invite(
        &self,
        org_id: Uuid,
        invited_by: Uuid,
        req: CreateInviteReq,
    ) -> Result<(Invite, String), ApiError> {
        // Owners are appointed by role change, not by invite
        if req.role == OrgRole::Owner {
            return Err(ApiError::forbidden("cannot invite with owner role"));
        }

        if let Some(user) = self.user_repo.find_by_email(&req.email).await? {
            if self
                .membership_repo
                .find(org_id, user.user_id)
                .await?
                .is_some()
            {
                return Err(ApiError::conflict("already a member of this organization"));
            }
        }

        if self.invite_repo.pending_exists(org_id, &req.email).await? {
            return Err(ApiError::conflict("an invite for this email is pending"));
        }

        let (raw, digest) = generate_credential_token();
        let now = Utc::now();
        let invite = Invite {
            invite_id: Uuid::now_v7(),
            org_id,
            email: req.email.clone(),
            role: req.role,
            token_hash: digest,
            invited_by,
            expires_at: now + Duration::hours(INVITE_TTL_HOURS),
            accepted_at: None,
            created_at: now,
        };
        let created = self.invite_repo.create(&invite).await?;

        let link = format!(
            "{}/invites/{}/accept",
            self.frontend_url.trim_end_matches('/'),
            raw
        );
        let message = EmailMessage {
            to: req.email.clone(),
            subject: "You have been invited to an organization".to_string(),
            html_body: format!(
                "<p>You were invited to join an organization. \
                 <a href=\"{link}\">Accept the invitation</a> within 7 days.</p>"
            ),
            text_body: format!(
                "You were invited to join an organization. Open {link} within 7 days to accept."
            ),
        };
        if let Err(e) = self.sender.send(message).await {
            tracing::warn!(email = %req.email, error = %e, "invite email not sent");
        }

        Ok((created, raw))
    }

    async fn list_invites(&self, org_id: Uuid) -> Result<Vec<Invite>, ApiError> {
        self.invite_repo.list_for_org(org_id).await
    }

    async fn revoke_invite(&self, org_id: Uuid, invite_id: Uuid) -> Result<(), ApiError> {
        let removed = self.invite_repo.delete(org_id, invite_id).await?;
        if !removed {
            return Err(ApiError::not_found("invite not found"));
        }
        Ok(())
    }

    async fn accept_invite(
        &self,
        raw_token: &str,
        user_id: Uuid,
        user_email: &str,
    ) -> Result<Membership, ApiError> {
        let digest = sha256_hex(raw_token);
        let invite = self
            .invite_repo
            .find_by_hash(&digest)
            .await?
            .ok_or_else(|| ApiError::bad_request("invalid_or_expired"))?;

        if !invite.is_valid() {
            return Err(ApiError::bad_request("invalid_or_expired"));
        }

        // The invite is bound to the address it was sent to
        if !invite.email.eq_ignore_ascii_case(user_email) {
            return Err(ApiError::forbidden(
                "invite was issued to a different email address",
            ));
        }

        if self
            .membership_repo
            .find(invite.org_id, user_id)
            .await?
            .is_some()
        {
            return Err(ApiError::conflict("already a member of this organization"));
        }

        self.invite_repo.accept(invite.invite_id, user_id).await
    }
}
