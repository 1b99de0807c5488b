//! Webhook signature verification and IdP user sync

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use platform_service_core::domains::auth::domain::{
    model::User,
    repository::{RoleRepository, UserRepository},
};
use serde::Deserialize;
use sha2::Sha256;
use shared_error::ApiError;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Verify a hex HMAC-SHA256 signature over the raw body
///
/// `Mac::verify_slice` compares in constant time.
pub fn verify_hmac_signature(secret: &str, body: &[u8], signature_hex: &str) -> bool {
    let Ok(expected) = hex::decode(signature_hex) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Constant-time equality for shared callback tokens
pub fn verify_callback_token(expected: &str, presented: &str) -> bool {
    let expected = expected.as_bytes();
    let presented = presented.as_bytes();

    // Fold over the longer input so length differences do not short-circuit
    let mut diff = expected.len() ^ presented.len();
    for i in 0..expected.len().max(presented.len()) {
        let a = expected.get(i).copied().unwrap_or(0);
        let b = presented.get(i).copied().unwrap_or(0);
        diff |= (a ^ b) as usize;
    }
    diff == 0
}

/// User row as the IdP webhook delivers it
#[derive(Debug, Clone, Deserialize)]
pub struct IdpUserRecord {
    pub id: String,
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
    pub email_confirmed_at: Option<DateTime<Utc>>,
}

impl IdpUserRecord {
    fn display_name(&self) -> String {
        self.user_metadata
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    }
}

/// INSERT/UPDATE/DELETE event over `auth.users`
#[derive(Debug, Clone, Deserialize)]
pub struct IdpUserEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub record: IdpUserRecord,
}

/// Mirrors IdP user changes into the local principal table
pub struct IdpSyncService<UR, RoR>
where
    UR: UserRepository,
    RoR: RoleRepository,
{
    user_repo: UR,
    role_repo: RoR,
}

impl<UR, RoR> IdpSyncService<UR, RoR>
where
    UR: UserRepository,
    RoR: RoleRepository,
{
    pub fn new(user_repo: UR, role_repo: RoR) -> Self {
        Self {
            user_repo,
            role_repo,
        }
    }

    pub async fn apply(&self, event: IdpUserEvent) -> Result<(), ApiError> {
        let user_id = Uuid::parse_str(&event.record.id)
            .map_err(|_| ApiError::bad_request("record id is not a UUID"))?;

        match event.event_type.as_str() {
            "INSERT" => self.apply_insert(user_id, &event.record).await,
            "UPDATE" => self.apply_update(user_id, &event.record).await,
            "DELETE" => self.apply_delete(user_id).await,
            other => Err(ApiError::bad_request(format!(
                "unknown webhook event type: {}",
                other
            ))),
        }
    }

    async fn apply_insert(&self, user_id: Uuid, record: &IdpUserRecord) -> Result<(), ApiError> {
        if self.user_repo.find_by_id(user_id).await?.is_some() {
            // Replayed insert; nothing to do
            return Ok(());
        }

        let email = record
            .email
            .clone()
            .ok_or_else(|| ApiError::bad_request("insert record without email"))?;

        let now = Utc::now();
        let user = User {
            user_id,
            email,
            name: record.display_name(),
            password_hash: None,
            avatar_url: None,
            email_verified: record.email_confirmed_at.is_some(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let created = self.user_repo.create(&user).await?;
        self.role_repo.assign_role(created.user_id, "user").await?;
        tracing::info!(user_id = %user_id, "idp user mirrored");
        Ok(())
    }

    async fn apply_update(&self, user_id: Uuid, record: &IdpUserRecord) -> Result<(), ApiError> {
        let Some(mut user) = self.user_repo.find_by_id(user_id).await? else {
            // Out-of-order delivery: treat as insert
            return self.apply_insert(user_id, record).await;
        };

        if let Some(email) = &record.email {
            user.email = email.clone();
        }
        let name = record.display_name();
        if !name.is_empty() {
            user.name = name;
        }
        user.email_verified = record.email_confirmed_at.is_some();
        self.user_repo.update(&user).await?;
        Ok(())
    }

    async fn apply_delete(&self, user_id: Uuid) -> Result<(), ApiError> {
        let removed = self.user_repo.soft_delete(user_id).await?;
        if !removed {
            tracing::debug!(user_id = %user_id, "delete webhook for unknown user");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hmac_round_trip() {
        let secret = "webhook-secret";
        let body = br#"{"type":"INSERT","record":{"id":"x"}}"#;

        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        let signature = hex::encode(mac.finalize().into_bytes());

        assert!(verify_hmac_signature(secret, body, &signature));
        assert!(!verify_hmac_signature("other-secret", body, &signature));
        assert!(!verify_hmac_signature(secret, b"tampered", &signature));
        assert!(!verify_hmac_signature(secret, body, "not-hex"));
    }

    #[test]
    fn test_callback_token_compare() {
        assert!(verify_callback_token("tok123", "tok123"));
        assert!(!verify_callback_token("tok123", "tok124"));
        assert!(!verify_callback_token("tok123", "tok12"));
        assert!(!verify_callback_token("tok123", ""));
    }

    #[test]
    fn test_event_parses() {
        let event: IdpUserEvent = serde_json::from_str(
            r#"{
                "type": "INSERT",
                "record": {
                    "id": "7e57d004-2b97-44e7-8f6c-f25cf8b8d1a9",
                    "email": "ada@x.io",
                    "user_metadata": {"name": "Ada"},
                    "email_confirmed_at": null
                }
            }"#,
        )
        .unwrap();

        assert_eq!(event.event_type, "INSERT");
        assert_eq!(event.record.display_name(), "Ada");
    }
}
