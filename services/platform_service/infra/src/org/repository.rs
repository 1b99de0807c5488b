use async_trait::async_trait;
use chrono::Utc;
use platform_service_core::domains::org::domain::{
    model::{Invite, MemberRecord, Membership, Org, OrgWithRole},
    repository::{InviteRepository, MembershipRepository, OrgRepository},
};
use shared_auth::OrgRole;
use shared_error::ApiError;
use sqlx::PgPool;
use uuid::Uuid;

/// PostgreSQL implementation of OrgRepository
#[derive(Clone)]
pub struct PgOrgRepository {
    pool: PgPool,
}

impl PgOrgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrgRepository for PgOrgRepository {
    async fn create_with_owner(&self, org: &Org, owner_id: Uuid) -> Result<Org, ApiError> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Org>(
            r#"
            INSERT INTO orgs (org_id, name, slug, created_at, updated_at, deleted_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(org.org_id)
        .bind(&org.name)
        .bind(&org.slug)
        .bind(org.created_at)
        .bind(org.updated_at)
        .bind(org.deleted_at)
        .fetch_one(&mut *tx)
        .await?;

        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO memberships (membership_id, org_id, user_id, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(created.org_id)
        .bind(owner_id)
        .bind(OrgRole::Owner)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn find_by_id(&self, org_id: Uuid) -> Result<Option<Org>, ApiError> {
        let org =
            sqlx::query_as::<_, Org>("SELECT * FROM orgs WHERE org_id = $1 AND deleted_at IS NULL")
                .bind(org_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(org)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Org>, ApiError> {
        let org =
            sqlx::query_as::<_, Org>("SELECT * FROM orgs WHERE slug = $1 AND deleted_at IS NULL")
                .bind(slug)
                .fetch_optional(&self.pool)
                .await?;

        Ok(org)
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, ApiError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM orgs WHERE slug = $1)")
            .bind(slug)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    async fn update(&self, org: &Org) -> Result<Org, ApiError> {
        let org = sqlx::query_as::<_, Org>(
            r#"
            UPDATE orgs
            SET name = $2, updated_at = NOW()
            WHERE org_id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(org.org_id)
        .bind(&org.name)
        .fetch_one(&self.pool)
        .await?;

        Ok(org)
    }

    async fn soft_delete(&self, org_id: Uuid) -> Result<bool, ApiError> {
        let result = sqlx::query(
            "UPDATE orgs SET deleted_at = NOW(), updated_at = NOW()
             WHERE org_id = $1 AND deleted_at IS NULL",
        )
        .bind(org_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// PostgreSQL implementation of MembershipRepository
#[derive(Clone)]
pub struct PgMembershipRepository {
    pool: PgPool,
}

impl PgMembershipRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipRepository for PgMembershipRepository {
    async fn find(&self, org_id: Uuid, user_id: Uuid) -> Result<Option<Membership>, ApiError> {
        let membership = sqlx::query_as::<_, Membership>(
            "SELECT * FROM memberships WHERE org_id = $1 AND user_id = $2",
        )
        .bind(org_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(membership)
    }

    async fn create(&self, membership: &Membership) -> Result<Membership, ApiError> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO memberships (membership_id, org_id, user_id, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(membership.membership_id)
        .bind(membership.org_id)
        .bind(membership.user_id)
        .bind(membership.role)
        .bind(membership.created_at)
        .bind(membership.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(membership)
    }

    async fn list_for_org(&self, org_id: Uuid) -> Result<Vec<MemberRecord>, ApiError> {
        let members = sqlx::query_as::<_, MemberRecord>(
            r#"
            SELECT m.membership_id, m.user_id, u.email, u.name, m.role, m.created_at
            FROM memberships m
            JOIN users u ON u.user_id = m.user_id
            WHERE m.org_id = $1 AND u.deleted_at IS NULL
            ORDER BY m.created_at
            "#,
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    async fn list_orgs_for_user(&self, user_id: Uuid) -> Result<Vec<OrgWithRole>, ApiError> {
        let orgs = sqlx::query_as::<_, OrgWithRole>(
            r#"
            SELECT o.org_id, o.name, o.slug, m.role, o.created_at
            FROM memberships m
            JOIN orgs o ON o.org_id = m.org_id
            WHERE m.user_id = $1 AND o.deleted_at IS NULL
            ORDER BY o.created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orgs)
    }

    async fn count_for_org(&self, org_id: Uuid) -> Result<i64, ApiError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM memberships WHERE org_id = $1")
            .bind(org_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn count_owners(&self, org_id: Uuid) -> Result<i64, ApiError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM memberships WHERE org_id = $1 AND role = 'owner'",
        )
        .bind(org_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn update_role(
        &self,
        org_id: Uuid,
        user_id: Uuid,
        role: OrgRole,
    ) -> Result<Option<Membership>, ApiError> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            UPDATE memberships
            SET role = $3, updated_at = NOW()
            WHERE org_id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(org_id)
        .bind(user_id)
        .bind(role)
        .fetch_optional(&self.pool)
        .await?;

        Ok(membership)
    }

    async fn remove(&self, org_id: Uuid, user_id: Uuid) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM memberships WHERE org_id = $1 AND user_id = $2")
            .bind(org_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// PostgreSQL implementation of InviteRepository
#[derive(Clone)]
pub struct PgInviteRepository {
    pool: PgPool,
}

impl PgInviteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InviteRepository for PgInviteRepository {
    async fn create(&self, invite: &Invite) -> Result<Invite, ApiError> {
        let invite = sqlx::query_as::<_, Invite>(
            r#"
            INSERT INTO invites (
                invite_id, org_id, email, role, token_hash, invited_by,
                expires_at, accepted_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(invite.invite_id)
        .bind(invite.org_id)
        .bind(&invite.email)
        .bind(invite.role)
        .bind(&invite.token_hash)
        .bind(invite.invited_by)
        .bind(invite.expires_at)
        .bind(invite.accepted_at)
        .bind(invite.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(invite)
    }

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<Invite>, ApiError> {
        let invite = sqlx::query_as::<_, Invite>("SELECT * FROM invites WHERE token_hash = $1")
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await?;

        Ok(invite)
    }

    async fn list_for_org(&self, org_id: Uuid) -> Result<Vec<Invite>, ApiError> {
        let invites = sqlx::query_as::<_, Invite>(
            r#"
            SELECT * FROM invites
            WHERE org_id = $1 AND accepted_at IS NULL AND expires_at > NOW()
            ORDER BY created_at DESC
            "#,
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(invites)
    }

    async fn pending_exists(&self, org_id: Uuid, email: &str) -> Result<bool, ApiError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM invites
                WHERE org_id = $1 AND email = $2
                  AND accepted_at IS NULL AND expires_at > NOW()
            )
            "#,
        )
        .bind(org_id)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn delete(&self, org_id: Uuid, invite_id: Uuid) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM invites WHERE org_id = $1 AND invite_id = $2")
            .bind(org_id)
            .bind(invite_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn accept(&self, invite_id: Uuid, user_id: Uuid) -> Result<Membership, ApiError> {
        let mut tx = self.pool.begin().await?;

        // Claim the invite; one-shot under concurrent acceptors
        let invite: Option<Invite> = sqlx::query_as(
            r#"
            UPDATE invites
            SET accepted_at = NOW()
            WHERE invite_id = $1 AND accepted_at IS NULL AND expires_at > NOW()
            RETURNING *
            "#,
        )
        .bind(invite_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(invite) = invite else {
            tx.rollback().await?;
            return Err(ApiError::bad_request("invalid_or_expired"));
        };

        let now = Utc::now();
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO memberships (membership_id, org_id, user_id, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(invite.org_id)
        .bind(user_id)
        .bind(invite.role)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(membership)
    }
}
