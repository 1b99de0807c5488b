use chrono::{DateTime, Utc};
use shared_auth::OrgRole;
use sqlx::FromRow;
use uuid::Uuid;

/// Tenant entity
///
/// All domain data is scoped to exactly one org.
#[derive(Debug, Clone, FromRow)]
pub struct Org {
    pub org_id: Uuid,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Membership of a principal in an org
///
/// `(org_id, user_id)` is unique. The row is an arena binding with two
/// non-owning references; its lifetime ends with whichever side goes first.
#[derive(Debug, Clone, FromRow)]
pub struct Membership {
    pub membership_id: Uuid,
    pub org_id: Uuid,
    pub user_id: Uuid,
    pub role: OrgRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Membership joined with the member's identity, for listings
#[derive(Debug, Clone, FromRow)]
pub struct MemberRecord {
    pub membership_id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: OrgRole,
    pub created_at: DateTime<Utc>,
}

/// Org joined with the caller's role in it
#[derive(Debug, Clone, FromRow)]
pub struct OrgWithRole {
    pub org_id: Uuid,
    pub name: String,
    pub slug: String,
    pub role: OrgRole,
    pub created_at: DateTime<Utc>,
}

/// Pending invitation into an org
///
/// Token is hash-at-rest; valid while unaccepted and unexpired.
#[derive(Debug, Clone, FromRow)]
pub struct Invite {
    pub invite_id: Uuid,
    pub org_id: Uuid,
    pub email: String,
    pub role: OrgRole,
    pub token_hash: String,
    pub invited_by: Uuid,
    pub expires_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Invite {
    pub fn is_valid(&self) -> bool {
        self.accepted_at.is_none() && Utc::now() < self.expires_at
    }
}
