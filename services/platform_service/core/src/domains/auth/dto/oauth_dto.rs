use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domains::auth::domain::model::OAuthAccount;

/// Query parameters on the provider callback
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Normalized profile returned by an OAuth provider
///
/// This is the only provider data that crosses into the federation service;
/// raw provider payloads stay inside the client.
#[derive(Debug, Clone)]
pub struct FederatedProfile {
    pub provider: String,
    pub provider_user_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Linked-account projection for the profile endpoints
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OAuthAccountResp {
    pub provider: String,
    pub email: Option<String>,
    pub linked_at: DateTime<Utc>,
}

impl From<&OAuthAccount> for OAuthAccountResp {
    fn from(account: &OAuthAccount) -> Self {
        Self {
            provider: account.provider.clone(),
            email: account.email.clone(),
            linked_at: account.created_at,
        }
    }
}
