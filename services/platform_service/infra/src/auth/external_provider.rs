use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use platform_service_core::domains::auth::{
    domain::service::AuthProvider,
    dto::auth_dto::{AuthResp, LoginReq, RegisterReq, UserInfo},
};
use serde::Deserialize;
use shared_error::ApiError;
use shared_jwt::AccessClaims;
use uuid::Uuid;

use super::idp_client::{IdpClient, IdpTokenBundle, IdpUser};

/// Provider claims, parsed as a closed record
///
/// Only these fields cross the boundary; the raw provider payload never
/// leaves this module.
#[derive(Debug, Deserialize)]
struct IdpClaims {
    sub: String,
    #[serde(default)]
    iat: i64,
    exp: i64,
    jti: Option<String>,
    email: Option<String>,
    role: Option<String>,
    user_metadata: Option<serde_json::Value>,
    app_metadata: Option<serde_json::Value>,
}

/// Auth provider backed by a hosted identity service
///
/// Register/login/refresh are proxied to the provider's REST API; access
/// tokens are validated locally against the shared HS256 secret so the
/// middleware never blocks on the provider.
pub struct ExternalIdpProvider {
    client: IdpClient,
    jwt_secret: String,
}

impl ExternalIdpProvider {
    pub fn new(client: IdpClient, jwt_secret: String) -> Self {
        Self { client, jwt_secret }
    }

    fn map_bundle(bundle: IdpTokenBundle) -> Result<AuthResp, ApiError> {
        let user = Self::map_user(&bundle.user)?;
        Ok(AuthResp {
            access_token: bundle.access_token,
            refresh_token: bundle.refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: bundle.expires_in,
            user,
        })
    }

    fn map_user(user: &IdpUser) -> Result<UserInfo, ApiError> {
        let id = Uuid::parse_str(&user.id)
            .map_err(|_| ApiError::internal("identity provider returned a non-UUID user id"))?;

        Ok(UserInfo {
            id,
            email: user.email.clone().unwrap_or_default(),
            name: user.display_name(),
            avatar_url: user.avatar_url(),
            email_verified: user.email_confirmed_at.is_some(),
            roles: vec![user.role.clone().unwrap_or_else(|| "user".to_string())],
            created_at: user.created_at.unwrap_or_else(Utc::now),
        })
    }

    fn map_claims(&self, claims: IdpClaims) -> Result<AccessClaims, ApiError> {
        // The subject must be a principal id
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ApiError::unauthorized("invalid_token"))?;

        let name = claims
            .user_metadata
            .as_ref()
            .and_then(|m| m.get("name"))
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        let mut roles: Vec<String> = Vec::new();
        if let Some(role) = claims.role {
            roles.push(role);
        }
        if let Some(extra) = claims
            .app_metadata
            .as_ref()
            .and_then(|m| m.get("roles"))
            .and_then(|v| v.as_array())
        {
            for role in extra.iter().filter_map(|v| v.as_str()) {
                if !roles.iter().any(|r| r == role) {
                    roles.push(role.to_string());
                }
            }
        }

        Ok(AccessClaims {
            sub: user_id,
            iat: claims.iat,
            exp: claims.exp,
            jti: claims.jti.unwrap_or_default(),
            user_id,
            email: claims.email.unwrap_or_default(),
            name,
            roles,
        })
    }
}

#[async_trait]
impl AuthProvider for ExternalIdpProvider {
    async fn register(&self, req: RegisterReq) -> Result<AuthResp, ApiError> {
        let bundle = self
            .client
            .sign_up(&req.email, &req.password, &req.name)
            .await?;
        Self::map_bundle(bundle)
    }

    async fn login(&self, req: LoginReq) -> Result<AuthResp, ApiError> {
        let bundle = self
            .client
            .sign_in_with_password(&req.email, &req.password)
            .await?;
        Self::map_bundle(bundle)
    }

    async fn validate_token(&self, token: &str) -> Result<AccessClaims, ApiError> {
        let key = DecodingKey::from_secret(self.jwt_secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        // Provider tokens carry an audience we do not assert on
        validation.validate_aud = false;

        let claims = decode::<IdpClaims>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    ApiError::unauthorized("expired_token")
                }
                _ => ApiError::unauthorized("invalid_token"),
            })?;

        self.map_claims(claims)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthResp, ApiError> {
        let bundle = self.client.refresh(refresh_token).await?;
        Self::map_bundle(bundle)
    }

    async fn logout(&self, user_id: Uuid) -> Result<(), ApiError> {
        self.client.admin_logout(&user_id.to_string()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &str = "shared-idp-secret";

    fn provider() -> ExternalIdpProvider {
        let client = IdpClient::new(super::super::idp_client::IdpConfig {
            base_url: "http://idp.invalid".to_string(),
            api_key: "k".to_string(),
        })
        .unwrap();
        ExternalIdpProvider::new(client, SECRET.to_string())
    }

    fn sign(claims: &serde_json::Value) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn valid_exp() -> i64 {
        Utc::now().timestamp() + 900
    }

    #[tokio::test]
    async fn test_validate_maps_provider_claims() {
        let user_id = Uuid::new_v4();
        let token = sign(&json!({
            "sub": user_id.to_string(),
            "exp": valid_exp(),
            "email": "ada@x.io",
            "role": "user",
            "user_metadata": { "name": "Ada" },
            "app_metadata": { "roles": ["super_admin", "user"] }
        }));

        let claims = provider().validate_token(&token).await.unwrap();
        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.email, "ada@x.io");
        assert_eq!(claims.name, "Ada");
        assert_eq!(
            claims.roles,
            vec!["user".to_string(), "super_admin".to_string()]
        );
    }

    #[tokio::test]
    async fn test_validate_rejects_non_uuid_subject() {
        let token = sign(&json!({
            "sub": "service-role-key",
            "exp": valid_exp(),
        }));

        let err = provider().validate_token(&token).await.unwrap_err();
        assert_eq!(err.message(), "invalid_token");
    }

    #[tokio::test]
    async fn test_validate_maps_expiry() {
        let token = sign(&json!({
            "sub": Uuid::new_v4().to_string(),
            "exp": Utc::now().timestamp() - 3600,
        }));

        let err = provider().validate_token(&token).await.unwrap_err();
        assert_eq!(err.message(), "expired_token");
    }

    #[tokio::test]
    async fn test_validate_rejects_foreign_signature() {
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &json!({ "sub": Uuid::new_v4().to_string(), "exp": valid_exp() }),
            &EncodingKey::from_secret(b"some-other-secret"),
        )
        .unwrap();

        let err = provider().validate_token(&token).await.unwrap_err();
        assert_eq!(err.message(), "invalid_token");
    }
}
