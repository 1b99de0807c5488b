use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::domains::auth::domain::model::User;

/// Registration request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterReq {
    #[validate(length(min = 1, max = 120, message = "name is required"))]
    pub name: String,

    #[validate(email(message = "must be a valid email address"))]
    pub email: String,

    /// Checked against the password policy, not by the validator derive
    pub password: String,
}

/// Login request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginReq {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,

    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Refresh request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RefreshReq {
    #[validate(length(min = 1, message = "refresh_token is required"))]
    pub refresh_token: String,
}

/// Principal projection returned by auth endpoints
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserInfo {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub email_verified: bool,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl UserInfo {
    pub fn from_user(user: &User, roles: Vec<String>) -> Self {
        Self {
            id: user.user_id,
            email: user.email.clone(),
            name: user.name.clone(),
            avatar_url: user.avatar_url.clone(),
            email_verified: user.email_verified,
            roles,
            created_at: user.created_at,
        }
    }
}

/// Access+refresh pair plus the principal projection
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthResp {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserInfo,
}

/// Generic acknowledgement body
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageResp {
    pub message: String,
}

impl MessageResp {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
